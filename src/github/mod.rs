pub mod types;

pub use types::{Comment, Issue};
#[cfg(test)]
pub use types::IssueState;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

pub const API_BASE: &str = "https://api.github.com";

/// GitHub caps `per_page` at 100.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Error returned by a [`PageSource`] when a request cannot be completed.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("Invalid repository target {target:?}: {reason}")]
    Configuration { target: String, reason: String },

    #[error("Request for {resource} (page {page}) failed: {source}")]
    Network {
        resource: &'static str,
        page: usize,
        #[source]
        source: TransportError,
    },

    #[error("Failed to decode {resource} (page {page}): {source}")]
    Decode {
        resource: &'static str,
        page: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// A collection endpoint below `/repos/{org}/{repo}` whose pages decode into `Self`.
pub trait Resource: Serialize + DeserializeOwned + Send {
    /// Name used in logs and as the cache key
    const NAME: &'static str;
    /// Path segments appended to the repository URL
    const PATH: &'static [&'static str];
}

impl Resource for Issue {
    const NAME: &'static str = "issues";
    const PATH: &'static [&'static str] = &["issues"];
}

impl Resource for Comment {
    const NAME: &'static str = "comments";
    const PATH: &'static [&'static str] = &["issues", "comments"];
}

/// The `{org}/{repo}` pair every request is made against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub org: String,
    pub repo: String,
}

impl Repository {
    pub fn new(org: &str, repo: &str) -> Result<Self, GitHubError> {
        let target = format!("{}/{}", org, repo);
        for segment in [org, repo] {
            if segment.is_empty() {
                return Err(GitHubError::Configuration {
                    target,
                    reason: "organization and repository must not be empty".to_string(),
                });
            }
            if segment.contains(['/', '?', '#']) || segment.chars().any(char::is_whitespace) {
                return Err(GitHubError::Configuration {
                    target,
                    reason: format!("{:?} is not a valid path segment", segment),
                });
            }
        }
        Ok(Self {
            org: org.to_string(),
            repo: repo.to_string(),
        })
    }

    /// Parse `org/repo`, with or without a leading slash.
    pub fn parse(path: &str) -> Result<Self, GitHubError> {
        let segments: Vec<_> = path.trim_matches('/').split('/').collect();
        match segments.as_slice() {
            [org, repo] => Self::new(org, repo),
            _ => Err(GitHubError::Configuration {
                target: path.to_string(),
                reason: "expected the form org/repo".to_string(),
            }),
        }
    }

    /// Collection URL for `R` under `api_base`, without any query string.
    pub fn endpoint<R: Resource>(&self, api_base: &str) -> Result<Url, GitHubError> {
        let invalid = |reason: &str| GitHubError::Configuration {
            target: api_base.to_string(),
            reason: reason.to_string(),
        };
        let mut url = Url::parse(api_base).map_err(|e| invalid(&e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("base URL cannot carry a path"))?
            .pop_if_empty()
            .push("repos")
            .push(&self.org)
            .push(&self.repo)
            .extend(R::PATH);
        Ok(url)
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.org, self.repo)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StateFilter {
    #[default]
    Open,
    Closed,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortKey {
    #[default]
    Created,
    Updated,
    Comments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

impl StateFilter {
    fn as_str(self) -> &'static str {
        match self {
            StateFilter::Open => "open",
            StateFilter::Closed => "closed",
            StateFilter::All => "all",
        }
    }
}

impl SortKey {
    fn as_str(self) -> &'static str {
        match self {
            SortKey::Created => "created",
            SortKey::Updated => "updated",
            SortKey::Comments => "comments",
        }
    }
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// Server-side filters shared by every page of one fetch.
#[derive(Debug, Clone, Default)]
pub struct IssueQuery {
    pub state: StateFilter,
    pub sort: SortKey,
    pub direction: Direction,
    /// ISO 8601 timestamp, passed through untouched
    pub since: Option<String>,
    pub labels: Vec<String>,
}

impl IssueQuery {
    /// Query pairs in request order. Labels are sent as repeated `labels` parameters.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("state", self.state.as_str().to_string()),
            ("sort", self.sort.as_str().to_string()),
            ("direction", self.direction.as_str().to_string()),
        ];
        if let Some(since) = &self.since {
            pairs.push(("since", since.clone()));
        }
        for label in &self.labels {
            pairs.push(("labels", label.clone()));
        }
        pairs
    }
}

/// Transport seam: returns the raw body of one page request.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn get(&self, url: &Url) -> Result<String, TransportError>;
}

/// [`PageSource`] backed by reqwest, authenticating every request when a token is set.
pub struct HttpPageSource {
    client: reqwest::Client,
    token: Option<String>,
}

impl HttpPageSource {
    pub fn new(token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
        }
    }

    fn authorization(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("token {}", token))
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn get(&self, url: &Url) -> Result<String, TransportError> {
        let mut request = self
            .client
            .get(url.clone())
            .header(USER_AGENT, "issue-report")
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(value) = self.authorization() {
            request = request.header(AUTHORIZATION, value);
        }

        let body = request.send().await?.error_for_status()?.text().await?;
        Ok(body)
    }
}

/// Walks a paginated collection one page at a time.
pub struct Fetcher<S> {
    source: S,
    repository: Repository,
    api_base: String,
    page_size: usize,
}

impl<S: PageSource> Fetcher<S> {
    pub fn new(source: S, repository: Repository) -> Self {
        Self {
            source,
            repository,
            api_base: API_BASE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Point the fetcher at another REST root, e.g. a GitHub Enterprise host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, DEFAULT_PAGE_SIZE);
        self
    }

    /// Fetch `R` with the given filters.
    ///
    /// With `exhaustive` set, page N+1 is requested only when page N came back
    /// with exactly `page_size` entries. A collection whose size is an exact
    /// multiple of the page size therefore costs one trailing empty request.
    /// Any page failing fails the whole fetch.
    #[instrument(skip(self, query), fields(resource = R::NAME, repository = %self.repository))]
    pub async fn fetch<R: Resource>(
        &self,
        query: &IssueQuery,
        exhaustive: bool,
    ) -> Result<Vec<R>, GitHubError> {
        let endpoint = self.repository.endpoint::<R>(&self.api_base)?;
        let filters = query.to_pairs();
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let url = self.page_url(&endpoint, &filters, page);
            debug!(page, url = %url, "requesting page");

            let body = self
                .source
                .get(&url)
                .await
                .map_err(|source| GitHubError::Network {
                    resource: R::NAME,
                    page,
                    source,
                })?;
            let batch: Vec<R> =
                serde_json::from_str(&body).map_err(|source| GitHubError::Decode {
                    resource: R::NAME,
                    page,
                    source,
                })?;

            let full_page = batch.len() == self.page_size;
            debug!(page, received = batch.len(), "decoded page");
            items.extend(batch);

            if !exhaustive || !full_page {
                break;
            }
            page += 1;
        }

        info!(count = items.len(), pages = page, "retrieved {}", R::NAME);
        Ok(items)
    }

    /// Build the request URL for one page from scratch so `page` never repeats.
    fn page_url(&self, endpoint: &Url, filters: &[(&'static str, String)], page: usize) -> Url {
        let mut url = endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (key, value) in filters {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("per_page", &self.page_size.to_string());
            if page > 1 {
                pairs.append_pair("page", &page.to_string());
            }
        }
        url
    }
}
