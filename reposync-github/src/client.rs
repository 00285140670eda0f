//! GitHub REST client and its [`ContentStore`] implementation.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, info, warn};
use url::Url;

use reposync_core::{
    BypassReason, ContentStore, ExistingFileHandle, FileWriteRequest, Lookup, PlaceholderId,
    PutOutcome, RepoPath, RepoRef, StoreError, VersionToken,
};

use crate::error::{GithubError, Result};
use crate::token::Token;
use crate::wire::{
    ApiErrorBody, BypassBody, ContentItem, DispatchBody, NewRepository, PutContentBody,
    PutContentResponse, Repository, User,
};

const API_VERSION: &str = "2022-11-28";
const ACCEPT: &str = "application/vnd.github+json";

/// Client for the subset of the GitHub REST API reposync needs.
///
/// # Example
///
/// ```ignore
/// use reposync_github::{GithubClient, Token};
///
/// let token = Token::parse(&std::env::var("GITHUB_TOKEN")?)?;
/// let client = GithubClient::new(reposync_github::DEFAULT_API_URL, token)?;
/// let me = client.authenticated_user().await?;
/// println!("authenticated as {}", me.login);
/// ```
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    base_url: Url,
    token: Token,
}

impl GithubClient {
    /// Create a client against `base_url` (`https://api.github.com`, a GHE
    /// `/api/v3` root, or a test server).
    pub fn new(base_url: &str, token: Token) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(GithubError::InvalidUrl("URL cannot be empty".into()));
        }
        if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
            return Err(GithubError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }
        let base_url =
            Url::parse(trimmed).map_err(|e| GithubError::InvalidUrl(format!("{trimmed}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GithubError::InvalidUrl(trimmed.to_string()));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("reposync/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    // -------------------------------------------------------------------------
    // Request plumbing
    // -------------------------------------------------------------------------

    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejected cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn contents_url(&self, repo: &RepoRef, path: &RepoPath) -> Url {
        let base = ["repos", repo.owner.as_str(), repo.name.as_str(), "contents"];
        self.url(base.into_iter().chain(path.as_str().split('/')))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(self.token.expose())
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn api_error(response: Response) -> GithubError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .map(|b| b.message)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or(text);
        GithubError::Api { status, message }
    }

    // -------------------------------------------------------------------------
    // Account and repository operations
    // -------------------------------------------------------------------------

    /// `GET /user`: also the cheapest way to check a token works.
    pub async fn authenticated_user(&self) -> Result<User> {
        let response = self.request(Method::GET, self.url(["user"])).send().await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        let user: User = response
            .json()
            .await
            .map_err(|e| GithubError::Parse(format!("user: {e}")))?;
        debug!(login = %user.login, token = %self.token, "authenticated");
        Ok(user)
    }

    /// `POST /user/repos`
    pub async fn create_repository(&self, spec: &NewRepository) -> Result<Repository> {
        let response = self
            .request(Method::POST, self.url(["user", "repos"]))
            .json(spec)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        let repo: Repository = response
            .json()
            .await
            .map_err(|e| GithubError::Parse(format!("repository: {e}")))?;
        info!(repo = %repo.full_name, private = repo.private, "created repository");
        Ok(repo)
    }

    /// `POST /repos/{o}/{r}/dispatches`: fires a `repository_dispatch` event.
    pub async fn dispatch(
        &self,
        repo: &RepoRef,
        event_type: &str,
        client_payload: &serde_json::Value,
    ) -> Result<()> {
        let url = self.url(["repos", repo.owner.as_str(), repo.name.as_str(), "dispatches"]);
        let response = self
            .request(Method::POST, url)
            .json(&DispatchBody {
                event_type,
                client_payload,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        info!(repo = %repo, event_type, "dispatched repository event");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Contents
    // -------------------------------------------------------------------------

    async fn lookup(&self, repo: &RepoRef, path: &RepoPath, branch: Option<&str>) -> Result<Lookup> {
        let mut url = self.contents_url(repo, path);
        if let Some(branch) = branch {
            url.query_pairs_mut().append_pair("ref", branch);
        }
        debug!(repo = %repo, path = %path, "looking up remote file");

        let response = self.request(Method::GET, url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Lookup::NotFound);
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GithubError::Parse(format!("contents: {e}")))?;
        if value.is_array() {
            return Err(GithubError::Parse(format!("'{path}' is a directory")));
        }
        let item: ContentItem = serde_json::from_value(value)
            .map_err(|e| GithubError::Parse(format!("contents: {e}")))?;
        if item.kind.as_deref().is_some_and(|k| k != "file") {
            return Err(GithubError::Parse(format!(
                "'{}' is not a regular file",
                item.path
            )));
        }
        Ok(Lookup::Found(ExistingFileHandle {
            path: path.clone(),
            version: VersionToken(item.sha),
        }))
    }

    async fn write(
        &self,
        request: &FileWriteRequest,
        expected: Option<&VersionToken>,
    ) -> Result<PutOutcome> {
        let body = PutContentBody {
            message: &request.message,
            content: BASE64.encode(&request.content),
            sha: expected.map(|t| t.0.as_str()),
            branch: request.branch.as_deref(),
        };
        let response = self
            .request(Method::PUT, self.contents_url(&request.repo, &request.path))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let parsed: PutContentResponse = response
                .json()
                .await
                .map_err(|e| GithubError::Parse(format!("put contents: {e}")))?;
            let sha = parsed
                .content
                .map(|c| c.sha)
                .ok_or_else(|| GithubError::Parse("put contents: missing content.sha".into()))?;
            return Ok(PutOutcome::Written {
                version: VersionToken(sha),
            });
        }

        let text = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ApiErrorBody>(&text).unwrap_or_default();
        let policy_status = matches!(
            status,
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY
        );
        if policy_status && parsed.is_secret_block() {
            let placeholders = parsed.into_placeholders();
            warn!(
                repo = %request.repo,
                path = %request.path,
                placeholders = placeholders.len(),
                "write blocked by secret scanning"
            );
            return Ok(PutOutcome::PolicyRejected { placeholders });
        }

        let message = if parsed.message.is_empty() {
            text
        } else {
            parsed.message
        };
        Err(GithubError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn bypass(
        &self,
        repo: &RepoRef,
        placeholder: &PlaceholderId,
        reason: BypassReason,
    ) -> Result<()> {
        let url = self.url([
            "repos",
            repo.owner.as_str(),
            repo.name.as_str(),
            "secret-scanning",
            "push-protection-bypasses",
        ]);
        let response = self
            .request(Method::POST, url)
            .json(&BypassBody {
                reason: reason.as_str(),
                placeholder_id: &placeholder.0,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        info!(repo = %repo, placeholder = %placeholder, reason = %reason, "bypass authorized");
        Ok(())
    }
}

#[async_trait]
impl ContentStore for GithubClient {
    async fn get_file(
        &self,
        repo: &RepoRef,
        path: &RepoPath,
        branch: Option<&str>,
    ) -> std::result::Result<Lookup, StoreError> {
        Ok(self.lookup(repo, path, branch).await?)
    }

    async fn put_file(
        &self,
        request: &FileWriteRequest,
        expected: Option<&VersionToken>,
    ) -> std::result::Result<PutOutcome, StoreError> {
        Ok(self.write(request, expected).await?)
    }

    async fn authorize_bypass(
        &self,
        repo: &RepoRef,
        placeholder: &PlaceholderId,
        reason: BypassReason,
    ) -> std::result::Result<(), StoreError> {
        Ok(self.bypass(repo, placeholder, reason).await?)
    }
}
