use anyhow::{anyhow, Context};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use contractsim::{
    create_encoder, ArtifactStore, EncoderBackend, EncoderOptions, IndexBuilder, ModelHandle,
    RestApi, DEFAULT_FASTEMBED_MODEL, DEFAULT_HASHING_DIM, DEFAULT_NEIGHBORS,
};
use rand::seq::IndexedRandom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Find the smart contracts most similar to a given one
#[derive(Parser, Debug)]
#[command(name = "contractsim")]
#[command(about = "Find the smart contracts most similar to a given one", long_about = None)]
struct Args {
    /// Log level
    #[arg(long, global = true, default_value = "info", env = "CONTRACTSIM_LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Embed a contract corpus and write the model artifact
    Build(BuildArgs),
    /// Print the contracts most similar to one contract file
    Query(QueryArgs),
    /// Serve similarity queries over HTTP
    Serve(ServeArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum EncoderKind {
    Hashing,
    Fastembed,
}

impl From<EncoderKind> for EncoderBackend {
    fn from(kind: EncoderKind) -> Self {
        match kind {
            EncoderKind::Hashing => EncoderBackend::Hashing,
            EncoderKind::Fastembed => EncoderBackend::FastEmbed,
        }
    }
}

#[derive(ClapArgs, Debug)]
struct BuildArgs {
    /// Corpus root: one folder per category, contract files inside
    #[arg(short, long, default_value = "contracts", env = "CONTRACTSIM_CORPUS")]
    corpus: PathBuf,

    /// Where to write the model artifact
    #[arg(short, long, default_value = "model/contracts.bin", env = "CONTRACTSIM_MODEL_PATH")]
    output: PathBuf,

    /// Embedding backend
    #[arg(long, value_enum, default_value_t = EncoderKind::Hashing)]
    encoder: EncoderKind,

    /// Sentence-transformer model (fastembed backend)
    #[arg(long, default_value = DEFAULT_FASTEMBED_MODEL)]
    model: String,

    /// Vector width (hashing backend)
    #[arg(long, default_value_t = DEFAULT_HASHING_DIM)]
    dimensions: usize,

    /// Neighbor count the index is fitted with
    #[arg(long, default_value_t = DEFAULT_NEIGHBORS)]
    neighbors: usize,

    /// Model download cache
    #[arg(long, default_value = ".cache/contractsim", env = "CONTRACTSIM_CACHE_DIR")]
    cache_dir: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct QueryArgs {
    /// Model artifact written by `build`
    #[arg(short, long, default_value = "model/contracts.bin", env = "CONTRACTSIM_MODEL_PATH")]
    model_path: PathBuf,

    /// Contract to look up; a random corpus contract when omitted
    file: Option<PathBuf>,

    /// Corpus to pick a random contract from
    #[arg(short, long, default_value = "contracts", env = "CONTRACTSIM_CORPUS")]
    corpus: PathBuf,

    /// Number of similar contracts (defaults to the fitted neighbor count)
    #[arg(short, long)]
    k: Option<usize>,

    /// Print names and distances alongside the bodies
    #[arg(short, long)]
    verbose: bool,

    /// Query a running `serve` instance (e.g. http://localhost:4500) instead of loading the artifact
    #[arg(long, env = "CONTRACTSIM_URL", conflicts_with = "verbose")]
    url: Option<String>,

    /// Model download cache
    #[arg(long, default_value = ".cache/contractsim", env = "CONTRACTSIM_CACHE_DIR")]
    cache_dir: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct ServeArgs {
    /// Model artifact written by `build`
    #[arg(short, long, default_value = "model/contracts.bin", env = "CONTRACTSIM_MODEL_PATH")]
    model_path: PathBuf,

    /// HTTP API port
    #[arg(long, default_value_t = 4500, env = "CONTRACTSIM_PORT")]
    port: u16,

    /// Model download cache
    #[arg(long, default_value = ".cache/contractsim", env = "CONTRACTSIM_CACHE_DIR")]
    cache_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Build(build) => tokio::task::spawn_blocking(move || run_build(build)).await?,
        Command::Query(query) => run_query(query).await,
        Command::Serve(serve) => run_serve(serve).await,
    }
}

fn run_build(args: BuildArgs) -> anyhow::Result<()> {
    info!("Building similarity index from {:?}", args.corpus);

    let options = EncoderOptions {
        cache_dir: args.cache_dir,
    };
    let encoder = create_encoder(args.encoder.into(), &args.model, args.dimensions, &options)
        .context("failed to create encoder")?;

    let artifact = IndexBuilder::new(encoder)
        .with_neighbors(args.neighbors)
        .build(&args.corpus)
        .with_context(|| format!("failed to build index from {:?}", args.corpus))?;

    ArtifactStore::new(&args.output)
        .save(&artifact)
        .with_context(|| format!("failed to write artifact {:?}", args.output))?;

    info!("Wrote {} contracts to {:?}", artifact.len(), args.output);
    Ok(())
}

async fn run_query(args: QueryArgs) -> anyhow::Result<()> {
    let contract_path = match args.file.clone() {
        Some(path) => path,
        None => {
            let path = random_contract(&args.corpus)?;
            println!("Selected input contract: {}", path.display());
            path
        }
    };
    let contract_code = std::fs::read_to_string(&contract_path)
        .with_context(|| format!("failed to read {:?}", contract_path))?;

    let output = if let Some(url) = args.url.clone() {
        let bodies = query_service(&url, &contract_code, args.k).await?;
        serde_json::to_string_pretty(&bodies)?
    } else {
        tokio::task::spawn_blocking(move || query_local(&args, &contract_code)).await??
    };
    println!("{}", output);
    Ok(())
}

fn query_local(args: &QueryArgs, contract_code: &str) -> anyhow::Result<String> {
    let options = EncoderOptions {
        cache_dir: args.cache_dir.clone(),
    };
    let artifact = ArtifactStore::new(&args.model_path)
        .load(&options)
        .with_context(|| format!("failed to load artifact {:?}", args.model_path))?;

    let k = args.k.unwrap_or_else(|| artifact.index().n_neighbors());
    let output = if args.verbose {
        serde_json::to_string_pretty(&artifact.query_neighbors(contract_code, k)?)?
    } else {
        serde_json::to_string_pretty(&artifact.query(contract_code, k)?)?
    };
    Ok(output)
}

/// Ask a running `serve` instance for the contracts nearest to `contract_code`.
async fn query_service(
    base_url: &str,
    contract_code: &str,
    k: Option<usize>,
) -> anyhow::Result<Vec<String>> {
    let url = format!("{}/find_similar_contracts", base_url.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(&url)
        .json(&serde_json::json!({ "contract_code": contract_code, "k": k }))
        .send()
        .await
        .with_context(|| format!("failed to reach {}", url))?;

    let status = response.status();
    if !status.is_success() {
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        return Err(anyhow!(
            "{} answered {}: {}",
            url,
            status,
            body["error"].as_str().unwrap_or("no error message")
        ));
    }

    response
        .json()
        .await
        .with_context(|| format!("unexpected response from {}", url))
}

/// Pick a random category, then a random file inside it.
fn random_contract(corpus: &Path) -> anyhow::Result<PathBuf> {
    let mut rng = rand::rng();

    let categories = list_dir(corpus, |p| p.is_dir())?;
    let category = categories
        .choose(&mut rng)
        .ok_or_else(|| anyhow!("no category folders under {:?}", corpus))?;

    let files = list_dir(category, |p| p.is_file())?;
    files
        .choose(&mut rng)
        .cloned()
        .ok_or_else(|| anyhow!("no contract files under {:?}", category))
}

fn list_dir(dir: &Path, keep: impl Fn(&Path) -> bool) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("cannot list {:?}", dir))? {
        let path = entry?.path();
        if keep(&path) {
            paths.push(path);
        }
    }
    Ok(paths)
}

async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    info!("Starting contractsim v{}", env!("CARGO_PKG_VERSION"));
    info!("Model artifact: {:?}", args.model_path);

    let options = EncoderOptions {
        cache_dir: args.cache_dir,
    };
    let store = ArtifactStore::new(&args.model_path);
    let model = tokio::task::spawn_blocking(move || ModelHandle::open(store, options))
        .await?
        .with_context(|| format!("failed to load artifact {:?}", args.model_path))?;
    let model = Arc::new(model);
    info!("Model loaded: {} contracts", model.current().len());

    serve_model(model, args.port).await
}

/// Run the HTTP API until ctrl-c; a server that fails to start is an error.
async fn serve_model(model: Arc<ModelHandle>, port: u16) -> anyhow::Result<()> {
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", port);
        let sys = actix_web::rt::System::new();
        sys.block_on(RestApi::start(model, port))
    });

    info!("HTTP API: http://localhost:{}/find_similar_contracts", port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        joined = tokio::task::spawn_blocking(move || http_handle.join()) => {
            joined?
                .map_err(|_| anyhow!("HTTP server thread panicked"))?
                .with_context(|| format!("HTTP server on port {} failed", port))?;
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
