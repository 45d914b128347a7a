use async_trait::async_trait;
use derive_builder::Builder;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = concat!("neethub/", env!("CARGO_PKG_VERSION"));
pub const GITHUB_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
pub const REPOSITORY_DESCRIPTION: &str = "My NeetCode Solutions (Managed by NeetHub Extension)";

/// `<owner>/<name>`, as stored under `selectedRepo`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoName {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(Error::InvalidRepository(s.to_string())),
        }
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Whether a file is already present at the target path, and its blob sha.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteFileState {
    pub exists: bool,
    pub sha: Option<String>,
}

impl RemoteFileState {
    pub fn found(sha: impl Into<String>) -> Self {
        Self {
            exists: true,
            sha: Some(sha.into()),
        }
    }
}

/// Body of `PUT /repos/{owner}/{repo}/contents/{path}`. Without a `sha` the
/// call creates the file; with one it updates it in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PutContents {
    pub message: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PutContentsResponse {
    #[serde(default)]
    pub content: Option<CommittedFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommittedFile {
    #[serde(default)]
    pub html_url: Option<String>,
}

impl PutContentsResponse {
    pub fn html_url(&self) -> Option<&str> {
        self.content.as_ref()?.html_url.as_deref()
    }
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    sha: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    message: Option<String>,
}

/// The authenticated user, kept whole under `githubUser`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubUser {
    pub login: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub full_name: String,
    #[serde(default)]
    pub private: bool,
}

#[derive(Debug, Serialize)]
struct NewRepository<'a> {
    name: &'a str,
    private: bool,
    description: &'a str,
    auto_init: bool,
}

/// The two Contents API calls a push needs.
#[async_trait]
pub trait ContentsApi: Send + Sync {
    /// `GET contents/{path}`. A 404 is reported as a missing file, not as an
    /// error.
    async fn get_contents(&self, token: &str, repo: &RepoName, path: &str)
        -> Result<RemoteFileState>;

    async fn put_contents(
        &self,
        token: &str,
        repo: &RepoName,
        path: &str,
        body: &PutContents,
    ) -> Result<PutContentsResponse>;
}

#[async_trait]
impl<T: ContentsApi + ?Sized> ContentsApi for Arc<T> {
    async fn get_contents(
        &self,
        token: &str,
        repo: &RepoName,
        path: &str,
    ) -> Result<RemoteFileState> {
        (**self).get_contents(token, repo, path).await
    }

    async fn put_contents(
        &self,
        token: &str,
        repo: &RepoName,
        path: &str,
        body: &PutContents,
    ) -> Result<PutContentsResponse> {
        (**self).put_contents(token, repo, path, body).await
    }
}

/// GitHub REST client. Requests carry no timeout.
#[derive(Debug, Clone, Builder)]
pub struct GithubClient {
    #[builder(setter(into), default = "DEFAULT_API_BASE.to_string()")]
    api_base: String,
    #[builder(setter(into), default = "DEFAULT_USER_AGENT.to_string()")]
    user_agent: String,
    #[builder(setter(skip), default = "reqwest::Client::new()")]
    http: reqwest::Client,
}

impl GithubClient {
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = Url::parse(&self.api_base)?;
        url.path_segments_mut()
            .map_err(|_| Error::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn contents_url(&self, repo: &RepoName, path: &str) -> Result<Url> {
        self.endpoint(
            ["repos", repo.owner.as_str(), repo.name.as_str(), "contents"]
                .into_iter()
                .chain(path.split('/')),
        )
    }

    fn request(&self, method: Method, url: Url, token: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(token)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .header(USER_AGENT, &self.user_agent)
    }

    /// `GET /user`
    pub async fn current_user(&self, token: &str) -> Result<GithubUser> {
        let url = self.endpoint(["user"])?;
        let response = self.request(Method::GET, url, token).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response, "Failed to fetch user info.").await);
        }
        Ok(response.json().await?)
    }

    /// `GET /user/repos`, most recently updated first, first 100 only.
    pub async fn list_repositories(&self, token: &str) -> Result<Vec<Repository>> {
        let mut url = self.endpoint(["user", "repos"])?;
        url.query_pairs_mut()
            .append_pair("sort", "updated")
            .append_pair("per_page", "100");
        let response = self.request(Method::GET, url, token).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response, "Failed to fetch repositories.").await);
        }
        Ok(response.json().await?)
    }

    /// `POST /user/repos`, initialised with a README so the first push has a
    /// branch to land on.
    pub async fn create_repository(
        &self,
        token: &str,
        name: &str,
        private: bool,
    ) -> Result<Repository> {
        let url = self.endpoint(["user", "repos"])?;
        let body = NewRepository {
            name,
            private,
            description: REPOSITORY_DESCRIPTION,
            auto_init: true,
        };
        let response = self
            .request(Method::POST, url, token)
            .json(&body)
            .send()
            .await?;
        if response.status() != StatusCode::CREATED {
            return Err(api_error(response, "Failed to create repo.").await);
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ContentsApi for GithubClient {
    async fn get_contents(
        &self,
        token: &str,
        repo: &RepoName,
        path: &str,
    ) -> Result<RemoteFileState> {
        let url = self.contents_url(repo, path)?;
        tracing::debug!(%url, "checking file");
        let response = self.request(Method::GET, url, token).send().await?;
        let status = response.status();
        if status.is_success() {
            let info: FileInfo = response.json().await?;
            Ok(RemoteFileState::found(info.sha))
        } else if status == StatusCode::NOT_FOUND {
            Ok(RemoteFileState::default())
        } else {
            Err(Error::Api {
                status: status.as_u16(),
                message: format!(
                    "error checking file: {}",
                    status.canonical_reason().unwrap_or("unexpected status")
                ),
            })
        }
    }

    async fn put_contents(
        &self,
        token: &str,
        repo: &RepoName,
        path: &str,
        body: &PutContents,
    ) -> Result<PutContentsResponse> {
        let url = self.contents_url(repo, path)?;
        tracing::debug!(%url, update = body.sha.is_some(), "writing file");
        let response = self
            .request(Method::PUT, url, token)
            .json(body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response, "Failed to push file.").await);
        }
        Ok(response.json().await?)
    }
}

/// Turn a non-success response into [`Error::Api`], preferring GitHub's own
/// `message` over `fallback`.
async fn api_error(response: Response, fallback: &str) -> Error {
    let status = response.status().as_u16();
    let body: ApiMessage = response.json().await.unwrap_or_default();
    Error::Api {
        status,
        message: body
            .message
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| fallback.to_string()),
    }
}
