use actix_cors::Cors;
use actix_web::{http::StatusCode, web, App, HttpResponse, HttpServer, Result as ActixResult};
use contractsim_core::{EncoderDescriptor, Error};
use contractsim_storage::ModelHandle;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Deserialize)]
struct FindSimilarRequest {
    contract_code: Option<String>,
    k: Option<usize>,
}

#[derive(Serialize)]
struct ModelInfo {
    contracts: usize,
    dimensions: usize,
    neighbors: usize,
    encoder: EncoderDescriptor,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(model: Arc<ModelHandle>, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(model.clone()))
                .configure(Self::configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }

    /// Register the routes; expects `web::Data<Arc<ModelHandle>>` app data.
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.route("/find_similar_contracts", web::post().to(find_similar_contracts))
            .route("/health", web::get().to(health))
            .route("/model", web::get().to(model_info))
            .route("/model/reload", web::post().to(reload_model))
            .default_service(web::to(not_found));
    }
}

fn error_response(err: &Error) -> HttpResponse {
    let status = match err {
        Error::InsufficientCorpus { .. } | Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        Error::Encoding(_) | Error::InvalidDimension { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Corpus(_) | Error::Artifact(_) | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    HttpResponse::build(status).json(serde_json::json!({
        "error": err.to_string(),
        "stage": err.stage(),
    }))
}

async fn find_similar_contracts(
    model: web::Data<Arc<ModelHandle>>,
    req: web::Json<FindSimilarRequest>,
) -> ActixResult<HttpResponse> {
    let FindSimilarRequest { contract_code, k } = req.into_inner();

    let contract_code = match contract_code {
        Some(code) => code,
        None => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": "No contract code provided",
                "stage": "request",
            })));
        }
    };

    let artifact = model.current();
    let k = k.unwrap_or_else(|| artifact.index().n_neighbors());

    let result = web::block(move || artifact.query(&contract_code, k)).await?;
    match result {
        Ok(bodies) => Ok(HttpResponse::Ok().json(bodies)),
        Err(e) => {
            warn!("Similarity query failed: {}", e);
            Ok(error_response(&e))
        }
    }
}

async fn not_found() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::NotFound().json(serde_json::json!({
        "error": "Resource not found",
        "stage": "request",
    })))
}

async fn health() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

async fn model_info(model: web::Data<Arc<ModelHandle>>) -> ActixResult<HttpResponse> {
    let artifact = model.current();
    Ok(HttpResponse::Ok().json(ModelInfo {
        contracts: artifact.len(),
        dimensions: artifact.index().dim(),
        neighbors: artifact.index().n_neighbors(),
        encoder: artifact.encoder().descriptor(),
    }))
}

async fn reload_model(model: web::Data<Arc<ModelHandle>>) -> ActixResult<HttpResponse> {
    let handle = model.get_ref().clone();
    let result = web::block(move || handle.reload()).await?;
    match result {
        Ok(artifact) => {
            info!("Reloaded model via API: {} contracts", artifact.len());
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "result": true,
                "contracts": artifact.len(),
            })))
        }
        Err(e) => {
            warn!("Model reload failed: {}", e);
            Ok(error_response(&e))
        }
    }
}
