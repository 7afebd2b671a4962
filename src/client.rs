use crate::config::ActiveContext;
use crate::models::{DashboardEnvelope, DataSource, Org, SaveDashboard};
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderValue, USER_AGENT};
use reqwest::{Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

const ORG_HEADER: &str = "X-Grafana-Org-Id";

#[derive(Debug, Clone)]
pub struct ResponseData {
    pub status: u16,
    pub body: String,
    pub json: Option<Value>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{action} failed: {status} {body}")]
    Status {
        action: String,
        status: u16,
        body: String,
    },
    #[error("{kind} `{key}` not found")]
    NotFound { kind: &'static str, key: String },
}

impl ResponseData {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn ensure_success(self, action: &str) -> Result<Self, ApiError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::Status {
                action: action.to_string(),
                status: self.status,
                body: self.body,
            })
        }
    }

    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).context("parsing response body")
    }
}

/// Lookup of the data sources visible in the active organization.
pub trait DatasourceCatalog {
    fn datasources(&self) -> Result<Vec<DataSource>>;
}

/// Where dashboards are read from and written to.
pub trait DashboardStore {
    fn dashboard(&self, uid: &str) -> Result<DashboardEnvelope>;
    /// Returns the raw response whatever its status; callers decide what a
    /// rejection means.
    fn save_dashboard(&self, payload: &SaveDashboard) -> Result<ResponseData>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: Client,
    user: String,
    pass: String,
    org_id: Option<String>,
}

impl ApiClient {
    pub fn new(ctx: &ActiveContext) -> Result<Self> {
        // A trailing slash keeps `join` from dropping a sub-path like `/grafana`.
        let parsed = Url::parse(&format!("{}/", ctx.profile.url.trim_end_matches('/')))
            .context("parsing profile URL")?;
        let http = Client::builder()
            .user_agent(HeaderValue::from_static("grafctl/0.1"))
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            base_url: parsed,
            http,
            user: ctx.profile.user.clone(),
            pass: ctx.profile.pass.clone(),
            org_id: ctx.org_id.clone(),
        })
    }

    /// Same credentials, no organization header. Org management endpoints are
    /// server-wide and must not depend on a possibly stale active org.
    pub fn unscoped(&self) -> Self {
        Self {
            org_id: None,
            ..self.clone()
        }
    }

    pub fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ResponseData> {
        self.request(Method::GET, path, query, Option::<&Value>::None)
    }

    pub fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ResponseData> {
        self.request(Method::POST, path, &[], Some(body))
    }

    pub fn put_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ResponseData> {
        self.request(Method::PUT, path, &[], Some(body))
    }

    pub fn delete(&self, path: &str) -> Result<ResponseData> {
        self.request(Method::DELETE, path, &[], Option::<&Value>::None)
    }

    pub fn send<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&T>,
    ) -> Result<ResponseData> {
        self.request(method, path, &[], body)
    }

    pub fn orgs(&self) -> Result<Vec<Org>> {
        self.unscoped()
            .get("/api/orgs", &[])?
            .ensure_success("listing organizations")?
            .parse()
    }

    pub fn find_org(&self, id_or_name: &str) -> Result<Org> {
        self.orgs()?
            .into_iter()
            .find(|o| o.matches(id_or_name))
            .ok_or_else(|| {
                ApiError::NotFound {
                    kind: "organization",
                    key: id_or_name.to_string(),
                }
                .into()
            })
    }

    pub fn find_datasource(&self, id_or_name: &str) -> Result<DataSource> {
        self.datasources()?
            .into_iter()
            .find(|d| d.matches(id_or_name))
            .ok_or_else(|| {
                ApiError::NotFound {
                    kind: "datasource",
                    key: id_or_name.to_string(),
                }
                .into()
            })
    }

    fn request<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&T>,
    ) -> Result<ResponseData> {
        let normalized = path.trim_start_matches('/');
        let url = self
            .base_url
            .join(normalized)
            .with_context(|| format!("joining path `{}` to base URL", path))?;

        tracing::debug!(%method, %url, org = ?self.org_id, "sending request");

        let mut request = self
            .http
            .request(method, url.clone())
            .basic_auth(&self.user, Some(&self.pass))
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(USER_AGENT, HeaderValue::from_static("grafctl/0.1"));

        if let Some(org) = &self.org_id {
            request = request.header(ORG_HEADER, org);
        }

        if !query.is_empty() {
            request = request.query(query);
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status().as_u16();
        let text = response.text().context("reading response body")?;
        let json = serde_json::from_str(&text).ok();
        tracing::debug!(status, bytes = text.len(), "received response");

        Ok(ResponseData {
            status,
            body: text,
            json,
        })
    }
}

impl DatasourceCatalog for ApiClient {
    fn datasources(&self) -> Result<Vec<DataSource>> {
        self.get("/api/datasources", &[])?
            .ensure_success("listing datasources")?
            .parse()
    }
}

impl DashboardStore for ApiClient {
    fn dashboard(&self, uid: &str) -> Result<DashboardEnvelope> {
        self.get(&format!("/api/dashboards/uid/{uid}"), &[])?
            .ensure_success("reading dashboard")?
            .parse()
            .context("dashboard response is not a dashboard envelope")
    }

    fn save_dashboard(&self, payload: &SaveDashboard) -> Result<ResponseData> {
        self.post_json("/api/dashboards/db", payload)
    }
}
