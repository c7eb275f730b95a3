//! Corpus enumeration.
//!
//! A corpus is two levels deep: `<root>/<category>/<contract file>`. The
//! order produced here (categories sorted, then files sorted, both by file
//! name) is what ties a position in the index to a contract name and body,
//! so every consumer must enumerate through [`collect_corpus`].

use crate::{Error, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A contract source file read from the corpus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    /// Path relative to the corpus root, `/`-separated
    pub name: String,
    /// Raw source text
    pub code: String,
}

/// Read every contract under `root` in canonical order.
///
/// Loose files directly under the root, nested directories inside a category,
/// and files that cannot be read are skipped with a warning. A file that is
/// not valid UTF-8 fails the whole walk with [`Error::Encoding`].
pub fn collect_corpus<P: AsRef<Path>>(root: P) -> Result<Vec<Contract>> {
    let root = root.as_ref();
    if !root.exists() {
        return Err(Error::Corpus(format!(
            "corpus root {:?} does not exist",
            root
        )));
    }
    if !root.is_dir() {
        return Err(Error::Corpus(format!(
            "corpus root {:?} is not a directory",
            root
        )));
    }

    let mut contracts = Vec::new();
    for (category, category_path) in sorted_entries(root)? {
        if !category_path.is_dir() {
            warn!("Skipping {:?}: not inside a category folder", category_path);
            continue;
        }
        let category = category.to_string_lossy().into_owned();
        info!("Reading category {}", category);

        for (file_name, file_path) in sorted_entries(&category_path)? {
            if !file_path.is_file() {
                warn!("Skipping {:?}: not a regular file", file_path);
                continue;
            }
            let name = format!("{}/{}", category, file_name.to_string_lossy());

            let bytes = match fs::read(&file_path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Skipping unreadable contract {}: {}", name, e);
                    continue;
                }
            };
            let code = String::from_utf8(bytes).map_err(|_| {
                Error::Encoding(format!("{} is not valid UTF-8 text", name))
            })?;

            debug!("Read contract {} ({} bytes)", name, code.len());
            contracts.push(Contract { name, code });
        }
    }

    if contracts.is_empty() {
        return Err(Error::Corpus(format!(
            "corpus root {:?} contains no readable contract files",
            root
        )));
    }

    Ok(contracts)
}

/// Directory entries sorted by file name
fn sorted_entries(dir: &Path) -> Result<Vec<(OsString, PathBuf)>> {
    let read_dir = fs::read_dir(dir)
        .map_err(|e| Error::Corpus(format!("cannot list {:?}: {}", dir, e)))?;

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry =
            entry.map_err(|e| Error::Corpus(format!("cannot list {:?}: {}", dir, e)))?;
        entries.push((entry.file_name(), entry.path()));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}
