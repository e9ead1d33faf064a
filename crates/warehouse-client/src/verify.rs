//! Verify that every file of the current head builds is served by the CDN.

use reqwest::StatusCode;
use tracing::{debug, info};

use crate::builds::Builds;
use crate::client::helpers::resolve_artifact_url;
use crate::client::http::HttpBackend;
use crate::error::WarehouseResult;
use crate::params::HeadParams;
use crate::pool::map_limit;
use crate::types::BuildHead;

/// Options for a verify run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyOptions {
    pub pkg: String,
    pub env: Option<String>,
    /// List heads but fetch nothing; nothing is reported as failed.
    pub dry: bool,
    /// Expected number of files per head.
    pub num_files: Option<usize>,
    /// Heads (and files per head) checked concurrently; defaults to the client config.
    pub concurrency: Option<usize>,
}

impl VerifyOptions {
    pub fn new(pkg: impl Into<String>) -> Self {
        Self {
            pkg: pkg.into(),
            ..Default::default()
        }
    }

    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    pub fn dry(mut self, dry: bool) -> Self {
        self.dry = dry;
        self
    }

    pub fn num_files(mut self, num_files: usize) -> Self {
        self.num_files = Some(num_files);
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }
}

/// URLs to check for a head: `recommended` when present, otherwise `artifacts`.
pub fn head_urls(head: &BuildHead) -> Vec<String> {
    let files = if head.recommended.is_empty() {
        &head.artifacts
    } else {
        &head.recommended
    };
    files
        .iter()
        .map(|file| resolve_artifact_url(&head.cdn_url, file))
        .collect()
}

/// Placeholder reported when a head has fewer files than expected.
pub fn missing_file_url(build_id: &str) -> String {
    format!("https://{}/missingfile", build_id)
}

async fn verify_head(
    http: HttpBackend,
    head: BuildHead,
    dry: bool,
    num_files: Option<usize>,
    limit: usize,
) -> Vec<String> {
    let urls = head_urls(&head);

    if dry {
        debug!(build_id = %head.build_id, "dry run, skipping asset verification");
        return Vec::new();
    }

    if let Some(expected) = num_files {
        debug!(
            build_id = %head.build_id,
            files = urls.len(),
            expected,
            "checking number of files in head"
        );
        if expected > urls.len() {
            return vec![missing_file_url(&head.build_id)];
        }
    }

    let checks = map_limit(urls.into_iter().enumerate(), limit, |(idx, url)| {
        let http = http.clone();
        let build_id = head.build_id.clone();
        async move {
            match http.probe(&url).await {
                Ok(status) if status == StatusCode::OK => None,
                Ok(status) => {
                    debug!(
                        build_id = %build_id,
                        url = %url,
                        status = status.as_u16(),
                        "asset check failed"
                    );
                    Some((idx, url))
                }
                Err(e) => {
                    debug!(build_id = %build_id, url = %url, error = %e, "asset check failed");
                    Some((idx, url))
                }
            }
        }
    })
    .await;

    let mut failed: Vec<(usize, String)> = checks.into_iter().flatten().collect();
    failed.sort_by_key(|(idx, _)| *idx);
    failed.into_iter().map(|(_, url)| url).collect()
}

/// The verify workflow.
#[derive(Debug, Clone, Copy)]
pub struct Verify<'a> {
    pub(crate) builds: &'a Builds,
    pub(crate) http: &'a HttpBackend,
}

impl Verify<'_> {
    fn limit(&self, options: &VerifyOptions) -> usize {
        options
            .concurrency
            .unwrap_or(self.http.config.verify_concurrency)
    }

    /// List the heads for `{pkg, env}` and verify all of them.
    ///
    /// Returns every URL that failed; an empty list means all files are served.
    pub async fn execute(&self, options: &VerifyOptions) -> WarehouseResult<Vec<String>> {
        let mut params = HeadParams::new(options.pkg.as_str());
        params.env = options.env.clone();

        debug!(pkg = %options.pkg, env = ?options.env, "listing build heads");
        let heads = self.builds.heads(&params).await?;

        let failed = self.verify_builds(options, heads).await;
        info!(pkg = %options.pkg, failed = failed.len(), "verify complete");
        Ok(failed)
    }

    /// Verify a given set of heads.
    pub async fn verify_builds(
        &self,
        options: &VerifyOptions,
        heads: Vec<BuildHead>,
    ) -> Vec<String> {
        let limit = self.limit(options);
        let mut sets = map_limit(heads.into_iter().enumerate(), limit, |(idx, head)| {
            let http = self.http.clone();
            let (dry, num_files) = (options.dry, options.num_files);
            async move { (idx, verify_head(http, head, dry, num_files, limit).await) }
        })
        .await;

        sets.sort_by_key(|(idx, _)| *idx);
        sets.into_iter().flat_map(|(_, failed)| failed).collect()
    }

    /// Verify a single head.
    pub async fn verify_one(&self, options: &VerifyOptions, head: &BuildHead) -> Vec<String> {
        verify_head(
            self.http.clone(),
            head.clone(),
            options.dry,
            options.num_files,
            self.limit(options),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(recommended: &[&str], artifacts: &[&str]) -> BuildHead {
        BuildHead {
            build_id: "pkg!prod!1.0.0!en-US".into(),
            cdn_url: "https://cdn.example/builds/abc/".into(),
            recommended: recommended.iter().map(|s| s.to_string()).collect(),
            artifacts: artifacts.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_head_urls_prefer_recommended() {
        let urls = head_urls(&head(&["min.js"], &["a.js", "b.js"]));
        assert_eq!(urls, vec!["https://cdn.example/builds/abc/min.js"]);
    }

    #[test]
    fn test_head_urls_fall_back_to_artifacts() {
        let urls = head_urls(&head(&[], &["a.js", "b.js"]));
        assert_eq!(
            urls,
            vec![
                "https://cdn.example/builds/abc/a.js",
                "https://cdn.example/builds/abc/b.js"
            ]
        );
    }

    #[test]
    fn test_missing_file_url() {
        assert_eq!(
            missing_file_url("pkg!prod!1.0.0!en-US"),
            "https://pkg!prod!1.0.0!en-US/missingfile"
        );
    }
}
