use crate::config::Settings;
use crate::error::ServiceError;
use crate::service::{Backlink, DiscussionThread, DocumentService, EditPage, EditSubmission};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

/// Marker the wiki puts in the edit `status` field when the account may not
/// edit the document.
pub const PERMISSION_DENIED_MARKER: &str = "때문에 편집 권한이 부족합니다.";

#[derive(Deserialize)]
struct BacklinkResponse {
    #[serde(default)]
    backlinks: Vec<Backlink>,
}

#[derive(Deserialize)]
struct EditResponse {
    #[serde(default)]
    text: String,
    #[serde(default)]
    token: String,
    #[serde(default)]
    status: String,
}

/// [`DocumentService`] backed by the wiki's bearer-authenticated JSON API.
pub struct HttpDocumentService {
    http: Client,
    /// Root every `api/...` path hangs off, normally `https://{domain}/`.
    base: Url,
    token: String,
}

impl HttpDocumentService {
    pub fn new(settings: &Settings) -> Result<Self, ServiceError> {
        Self::with_base_url(settings, base_url(&settings.domain)?)
    }

    /// Talk to `base` instead of the configured domain.
    pub fn with_base_url(settings: &Settings, base: Url) -> Result<Self, ServiceError> {
        let http = Client::builder().timeout(settings.request_timeout).build()?;
        Ok(Self {
            http,
            base,
            token: settings.token.clone(),
        })
    }

    fn url(&self, endpoint: &str, title: &str) -> Result<Url, ServiceError> {
        endpoint_url(&self.base, endpoint, title)
    }

    /// GET a URL and return the status and raw body.
    async fn get(&self, url: Url) -> Result<(StatusCode, String), ServiceError> {
        let response = self.http.get(url).bearer_auth(&self.token).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

pub fn base_url(domain: &str) -> Result<Url, ServiceError> {
    Url::parse(&format!("https://{}/", domain))
        .map_err(|e| ServiceError::InvalidUrl(format!("{}: {}", domain, e)))
}

/// Build `{base}api/{endpoint}/{title}`. The title is encoded as a single
/// path segment, so a `/` inside it is escaped.
pub fn endpoint_url(base: &Url, endpoint: &str, title: &str) -> Result<Url, ServiceError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ServiceError::InvalidUrl(base.to_string()))?
        .clear()
        .extend(["api", endpoint, title]);
    Ok(url)
}

fn ensure_success(endpoint: &str, status: StatusCode, body: &str) -> Result<(), ServiceError> {
    if status.is_success() {
        return Ok(());
    }
    Err(ServiceError::Status {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body: body.chars().take(200).collect(),
    })
}

fn decode<'a, T: Deserialize<'a>>(endpoint: &str, body: &'a str) -> Result<T, ServiceError> {
    serde_json::from_str(body).map_err(|source| ServiceError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

pub fn parse_backlinks(status: StatusCode, body: &str) -> Result<Vec<Backlink>, ServiceError> {
    ensure_success("backlink", status, body)?;
    let response: BacklinkResponse = decode("backlink", body)?;
    Ok(response.backlinks)
}

pub fn parse_discussions(status: StatusCode, body: &str) -> Result<Vec<DiscussionThread>, ServiceError> {
    ensure_success("discuss", status, body)?;
    decode("discuss", body)
}

/// Interpret a `GET edit/{title}` response.
///
/// The permission marker is checked before the HTTP status, since the wiki
/// may pair it with an error code.
pub fn parse_edit_page(document: &str, status: StatusCode, body: &str) -> Result<EditPage, ServiceError> {
    let parsed: Result<EditResponse, ServiceError> = decode("edit", body);
    if let Ok(response) = &parsed {
        if response.status.contains(PERMISSION_DENIED_MARKER) {
            return Err(ServiceError::PermissionDenied {
                document: document.to_string(),
            });
        }
    }
    ensure_success("edit", status, body)?;
    let response = parsed?;
    Ok(EditPage {
        text: response.text,
        token: response.token,
    })
}

#[async_trait]
impl DocumentService for HttpDocumentService {
    async fn backlinks(&self, title: &str, namespace: &str) -> Result<Vec<Backlink>, ServiceError> {
        let mut url = self.url("backlink", title)?;
        url.query_pairs_mut().append_pair("namespace", namespace);
        let (status, body) = self.get(url).await?;
        parse_backlinks(status, &body)
    }

    async fn discussions(&self, title: &str) -> Result<Vec<DiscussionThread>, ServiceError> {
        let url = self.url("discuss", title)?;
        let (status, body) = self.get(url).await?;
        parse_discussions(status, &body)
    }

    async fn fetch_edit(&self, title: &str) -> Result<EditPage, ServiceError> {
        let url = self.url("edit", title)?;
        let (status, body) = self.get(url).await?;
        parse_edit_page(title, status, &body)
    }

    async fn submit_edit(&self, title: &str, edit: &EditSubmission) -> Result<(), ServiceError> {
        let url = self.url("edit", title)?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(edit)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        ensure_success("edit", status, &body)
    }
}
