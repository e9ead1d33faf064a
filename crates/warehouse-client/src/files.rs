//! Publish attachments built from local files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{WarehouseError, WarehouseResult};
use crate::types::Attachment;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// `sha256-<base64>` digest of file content.
pub fn attachment_digest(content: &[u8]) -> String {
    format!("sha256-{}", BASE64.encode(Sha256::digest(content)))
}

/// Content type from a file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("js" | "mjs" | "cjs") => "application/javascript",
        Some("json" | "map") => "application/json",
        Some("css") => "text/css",
        Some("html" | "htm") => "text/html",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("xml") => "application/xml",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("wasm") => "application/wasm",
        Some("gz" | "tgz") => "application/gzip",
        Some("yaml" | "yml") => "application/yaml",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// A file read from disk.
#[derive(Debug, Clone)]
pub struct FileContent {
    /// Path the content was actually read from.
    pub path: PathBuf,
    pub data: Vec<u8>,
}

/// Reads files for publish attachments.
#[derive(Debug, Clone)]
pub struct Files {
    root: PathBuf,
}

impl Default for Files {
    fn default() -> Self {
        Self {
            root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl Files {
    /// Resolve relative paths that cannot be read as-is against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read one file, falling back to resolving it against the root.
    pub async fn read_one(&self, file: impl AsRef<Path>) -> WarehouseResult<FileContent> {
        let file = file.as_ref();
        match tokio::fs::read(file).await {
            Ok(data) => {
                return Ok(FileContent {
                    path: file.to_path_buf(),
                    data,
                })
            }
            Err(e) => debug!(
                file = %file.display(),
                root = %self.root.display(),
                error = %e,
                "unable to read file, resolving from root"
            ),
        }

        let resolved = self.root.join(file);
        let data = tokio::fs::read(&resolved)
            .await
            .map_err(|e| WarehouseError::Io {
                path: resolved.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(FileContent {
            path: resolved,
            data,
        })
    }

    /// Read every file, in order.
    pub async fn read<P: AsRef<Path>>(&self, files: &[P]) -> WarehouseResult<Vec<FileContent>> {
        let mut out = Vec::with_capacity(files.len());
        for file in files {
            out.push(self.read_one(file).await?);
        }
        Ok(out)
    }

    /// Build the attachment map keyed by file basename.
    pub async fn attachments<P: AsRef<Path>>(
        &self,
        files: &[P],
    ) -> WarehouseResult<BTreeMap<String, Attachment>> {
        let mut attachments = BTreeMap::new();
        for file in files {
            let file = file.as_ref();
            let content = self.read_one(file).await?;
            let basename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string());

            attachments.insert(
                basename,
                Attachment {
                    length: content.data.len(),
                    data: String::from_utf8_lossy(&content.data).into_owned(),
                    content_type: content_type_for(file).to_string(),
                    digest: attachment_digest(&content.data),
                },
            );
        }
        Ok(attachments)
    }
}
