//! Repository Host port (§4.2 "Repository fetch", §6) and its GitHub adapter.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{IndexerError, IndexerResult};

/// The `{owner, repo}` pair extracted from a repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub repo: String,
}

/// Parse a repository URL of the form `https://github.com/<owner>/<repo>[.git]`
/// or `git@github.com:<owner>/<repo>.git` (§4.2).
///
/// # Errors
/// Returns [`IndexerError::InvalidRepositoryUrl`] for any other form.
pub fn parse_repository_url(url: &str) -> IndexerResult<RepositoryRef> {
    let trimmed = url.trim();

    let path = if let Some(rest) = trimmed.strip_prefix("https://github.com/") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("http://github.com/") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("git@github.com:") {
        rest
    } else {
        return Err(IndexerError::InvalidRepositoryUrl(url.to_string()));
    };

    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let owner = segments.next();
    let repo = segments.next();
    let extra = segments.next();

    match (owner, repo, extra) {
        (Some(owner), Some(repo), None) => Ok(RepositoryRef {
            owner: owner.to_string(),
            repo: repo.to_string(),
        }),
        _ => Err(IndexerError::InvalidRepositoryUrl(url.to_string())),
    }
}

/// One node of a repository tree listing (§4.2).
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub sha: String,
    pub size: Option<u64>,
}

impl TreeEntry {
    /// Only `blob` entries participate in indexing (§4.2).
    #[must_use]
    pub fn is_blob(&self) -> bool {
        self.entry_type == "blob"
    }
}

/// Abstraction over the repository host so tests can substitute a fixture
/// tree without network access (§6).
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Resolve `branch` to its latest commit SHA.
    ///
    /// # Errors
    /// Returns [`IndexerError::NotFound`] if the repository or branch does
    /// not exist, [`IndexerError::Unauthorized`] if the credential is
    /// rejected, or [`IndexerError::HostUnavailable`] on a transient failure.
    async fn resolve_branch(
        &self,
        repo: &RepositoryRef,
        branch: &str,
        access_token: Option<&str>,
    ) -> IndexerResult<String>;

    /// Fetch the full recursive tree listing for `commit_sha`.
    ///
    /// # Errors
    /// See [`RepositoryHost::resolve_branch`].
    async fn fetch_tree(
        &self,
        repo: &RepositoryRef,
        commit_sha: &str,
        access_token: Option<&str>,
    ) -> IndexerResult<Vec<TreeEntry>>;

    /// Fetch the raw content of a single blob.
    ///
    /// # Errors
    /// See [`RepositoryHost::resolve_branch`]. Per-file failures during a
    /// batch are logged and skipped by the caller rather than propagated.
    async fn fetch_content(
        &self,
        repo: &RepositoryRef,
        sha: &str,
        access_token: Option<&str>,
    ) -> IndexerResult<Vec<u8>>;

    /// Byte count per detected language, used to seed `CodebaseProject.languages`.
    ///
    /// # Errors
    /// See [`RepositoryHost::resolve_branch`].
    async fn fetch_languages(
        &self,
        repo: &RepositoryRef,
        access_token: Option<&str>,
    ) -> IndexerResult<std::collections::HashMap<String, u64>>;
}

#[derive(Debug, Deserialize)]
struct GitHubBranch {
    commit: GitHubCommitRef,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitHubTreeResponse {
    tree: Vec<TreeEntry>,
    truncated: bool,
}

/// `RepositoryHost` backed by the GitHub REST API.
pub struct GitHubRepositoryHost {
    client: reqwest::Client,
    api_base: String,
}

impl GitHubRepositoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::with_api_base("https://api.github.com".to_string())
    }

    /// Construct pointed at an alternate base URL (GitHub Enterprise, or a
    /// test fixture server).
    #[must_use]
    pub fn with_api_base(api_base: String) -> Self {
        Self { client: reqwest::Client::new(), api_base }
    }

    fn auth(request: reqwest::RequestBuilder, access_token: Option<&str>) -> reqwest::RequestBuilder {
        match access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
        .header("User-Agent", "prd-generator-indexer")
    }

    fn map_status(status: reqwest::StatusCode, body: String) -> IndexerError {
        match status.as_u16() {
            401 | 403 => IndexerError::Unauthorized(body),
            404 => IndexerError::NotFound(body),
            429 | 500..=599 => IndexerError::HostUnavailable(body),
            _ => IndexerError::Other(format!("unexpected status {status}: {body}")),
        }
    }
}

impl Default for GitHubRepositoryHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RepositoryHost for GitHubRepositoryHost {
    #[tracing::instrument(skip(self, access_token), fields(owner = %repo.owner, repo = %repo.repo))]
    async fn resolve_branch(
        &self,
        repo: &RepositoryRef,
        branch: &str,
        access_token: Option<&str>,
    ) -> IndexerResult<String> {
        let url = format!(
            "{}/repos/{}/{}/branches/{}",
            self.api_base, repo.owner, repo.repo, branch
        );
        let request = Self::auth(self.client.get(&url), access_token);
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status, body));
        }

        let parsed: GitHubBranch = response.json().await?;
        Ok(parsed.commit.sha)
    }

    #[tracing::instrument(skip(self, access_token), fields(owner = %repo.owner, repo = %repo.repo))]
    async fn fetch_tree(
        &self,
        repo: &RepositoryRef,
        commit_sha: &str,
        access_token: Option<&str>,
    ) -> IndexerResult<Vec<TreeEntry>> {
        let url = format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.api_base, repo.owner, repo.repo, commit_sha
        );
        let request = Self::auth(self.client.get(&url), access_token);
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status, body));
        }

        let parsed: GitHubTreeResponse = response.json().await?;
        if parsed.truncated {
            tracing::warn!(owner = %repo.owner, repo = %repo.repo, "tree listing truncated by upstream");
        }
        Ok(parsed.tree)
    }

    #[tracing::instrument(skip(self, access_token), fields(owner = %repo.owner, repo = %repo.repo, sha = %sha))]
    async fn fetch_content(
        &self,
        repo: &RepositoryRef,
        sha: &str,
        access_token: Option<&str>,
    ) -> IndexerResult<Vec<u8>> {
        let url = format!("{}/repos/{}/{}/git/blobs/{}", self.api_base, repo.owner, repo.repo, sha);
        let request = Self::auth(
            self.client.get(&url).header("Accept", "application/vnd.github.raw"),
            access_token,
        );
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status, body));
        }

        Ok(response.bytes().await?.to_vec())
    }

    #[tracing::instrument(skip(self, access_token), fields(owner = %repo.owner, repo = %repo.repo))]
    async fn fetch_languages(
        &self,
        repo: &RepositoryRef,
        access_token: Option<&str>,
    ) -> IndexerResult<std::collections::HashMap<String, u64>> {
        let url = format!("{}/repos/{}/{}/languages", self.api_base, repo.owner, repo.repo);
        let request = Self::auth(self.client.get(&url), access_token);
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status, body));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_https_url_with_git_suffix() {
        let parsed = parse_repository_url("https://github.com/acme/widgets.git").unwrap();
        assert_eq!(parsed.owner, "acme");
        assert_eq!(parsed.repo, "widgets");
    }

    #[test]
    fn parses_https_url_without_git_suffix() {
        let parsed = parse_repository_url("https://github.com/acme/widgets").unwrap();
        assert_eq!(parsed.owner, "acme");
        assert_eq!(parsed.repo, "widgets");
    }

    #[test]
    fn parses_ssh_url() {
        let parsed = parse_repository_url("git@github.com:acme/widgets.git").unwrap();
        assert_eq!(parsed.owner, "acme");
        assert_eq!(parsed.repo, "widgets");
    }

    #[test]
    fn rejects_non_github_url() {
        let err = parse_repository_url("https://gitlab.com/acme/widgets").unwrap_err();
        assert!(matches!(err, IndexerError::InvalidRepositoryUrl(_)));
    }

    #[test]
    fn rejects_url_missing_repo_segment() {
        let err = parse_repository_url("https://github.com/acme").unwrap_err();
        assert!(matches!(err, IndexerError::InvalidRepositoryUrl(_)));
    }

    #[test]
    fn rejects_url_with_extra_segments() {
        let err = parse_repository_url("https://github.com/acme/widgets/extra").unwrap_err();
        assert!(matches!(err, IndexerError::InvalidRepositoryUrl(_)));
    }

    #[test]
    fn is_blob_distinguishes_tree_entries() {
        let blob = TreeEntry {
            path: "src/main.rs".into(),
            mode: "100644".into(),
            entry_type: "blob".into(),
            sha: "abc".into(),
            size: Some(10),
        };
        let tree = TreeEntry { entry_type: "tree".into(), ..blob.clone() };
        assert!(blob.is_blob());
        assert!(!tree.is_blob());
    }
}
