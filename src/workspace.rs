//! Background workspace walk started by `initialize`
//!
//! The walk never reports back through shared state: it finishes by pushing
//! a log message to the client, and its failures are logged only.

use std::path::{Path, PathBuf};

use tokio::task::JoinHandle;
use tower_lsp::lsp_types::{MessageType, Url};
use tracing::{error, info, warn};

use crate::lsp::client::Client;
use crate::parser::LanguageKind;

/// Recursively collects the files under `root` that have a supported
/// grammar, as paths relative to `root`, sorted for determinism.
/// Directories named in `exclude_dirs` are not entered.
pub fn discover_files(root: &Path, exclude_dirs: &[String]) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    discover_recursive(root, root, exclude_dirs, &mut files)?;
    files.sort();
    Ok(files)
}

fn discover_recursive(
    root: &Path,
    dir: &Path,
    exclude_dirs: &[String],
    files: &mut Vec<PathBuf>,
) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let entry_path = entry.path();
        // does not follow symlinks, so link cycles cannot recurse forever
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            let name = entry.file_name();
            if exclude_dirs.iter().any(|excluded| name.as_os_str() == excluded.as_str()) {
                continue;
            }
            discover_recursive(root, &entry_path, exclude_dirs, files)?;
        } else if file_type.is_file() && is_supported(&entry_path) {
            let relative = entry_path
                .strip_prefix(root)
                .unwrap_or(&entry_path)
                .to_path_buf();
            files.push(relative);
        }
    }
    Ok(())
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(LanguageKind::from_extension)
        .is_some()
}

/// Walks the workspace on a blocking thread and reports the outcome to the
/// client. Fire-and-forget: callers may drop the handle.
pub fn spawn_walk(root: Url, exclude_dirs: Vec<String>, client: Client) -> JoinHandle<()> {
    tokio::spawn(async move {
        let Ok(path) = root.to_file_path() else {
            warn!("Workspace root {} is not a file URI, skipping walk", root);
            client.log_message(
                MessageType::WARNING,
                format!("workspace root {} is not a local directory, skipping indexing", root),
            );
            return;
        };

        let walk = tokio::task::spawn_blocking(move || discover_files(&path, &exclude_dirs));
        match walk.await {
            Ok(Ok(files)) => {
                info!("Indexed {} files under {}", files.len(), root);
                client.log_message(
                    MessageType::INFO,
                    format!("indexed {} files under {}", files.len(), root),
                );
            }
            Ok(Err(e)) => {
                error!("Workspace walk of {} failed: {}", root, e);
                client.log_message(
                    MessageType::WARNING,
                    format!("workspace walk of {} failed: {}", root, e),
                );
            }
            Err(e) => {
                error!("Workspace walk task for {} failed: {}", root, e);
                client.log_message(
                    MessageType::WARNING,
                    format!("workspace walk of {} was aborted", root),
                );
            }
        }
    })
}
