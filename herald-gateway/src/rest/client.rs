//! Notification REST API client.

use async_trait::async_trait;
use herald_core::data::{Notification, NotificationPage, PageMeta};
use herald_core::error::{ApiError, NetworkError};
use herald_core::types::NotificationId;
use reqwest::{Client, Method, Response, header};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::config::RestConfig;
use super::session::SessionProvider;

/// The authoritative notification store on the server.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Fetches one page, newest first. Pages are 1-based.
    async fn list(&self, page: u32, page_size: u32) -> Result<NotificationPage, ApiError>;

    /// Marks one notification read.
    async fn mark_read(&self, id: &NotificationId) -> Result<(), ApiError>;

    /// Marks every notification read.
    async fn mark_all_read(&self) -> Result<(), ApiError>;

    /// Deletes one notification.
    async fn delete(&self, id: &NotificationId) -> Result<(), ApiError>;
}

/// `reqwest` implementation of [`NotificationApi`].
///
/// Every request carries the provider's current token as a bearer
/// credential; a missing token fails fast with `ApiError::Unauthenticated`.
pub struct RestNotificationApi {
    config: RestConfig,
    http_client: Client,
    session: Arc<dyn SessionProvider>,
}

/// Listing responses come either bare or wrapped in `{"data": ...}`, and
/// older servers send a plain array.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody {
    Wrapped { data: Box<ListBody> },
    Page(NotificationPage),
    Items(Vec<Notification>),
}

impl ListBody {
    fn into_page(self) -> NotificationPage {
        match self {
            Self::Wrapped { data } => data.into_page(),
            Self::Page(page) => page,
            Self::Items(items) => NotificationPage {
                meta: PageMeta {
                    page: 1,
                    page_size: u32::try_from(items.len()).unwrap_or(u32::MAX),
                    total: items.len() as u64,
                    unread_count: None,
                },
                items,
            },
        }
    }
}

impl RestNotificationApi {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if a configured header is invalid or the HTTP
    /// client cannot be created.
    pub fn new(config: RestConfig, session: Arc<dyn SessionProvider>) -> Result<Self, NetworkError> {
        let mut headers = header::HeaderMap::new();

        headers.insert(
            header::USER_AGENT,
            config
                .user_agent
                .parse()
                .map_err(|_| NetworkError::ConnectionFailed {
                    reason: "Invalid user agent".to_string(),
                })?,
        );
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        for (key, value) in &config.headers {
            headers.insert(
                header::HeaderName::try_from(key.as_str()).map_err(|_| {
                    NetworkError::ConnectionFailed {
                        reason: format!("Invalid header name: {key}"),
                    }
                })?,
                value.parse().map_err(|_| NetworkError::ConnectionFailed {
                    reason: format!("Invalid header value for {key}"),
                })?,
            );
        }

        let http_client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| NetworkError::ConnectionFailed {
                reason: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            config,
            http_client,
            session,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    /// Builds the full URL for a path.
    #[must_use]
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
        }
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Response, ApiError> {
        let token = self
            .session
            .access_token()
            .ok_or(ApiError::Unauthenticated)?;
        let url = self.build_url(path);

        debug!(method = %method, url = %url, "Sending request");

        let mut request = self.http_client.request(method, &url).bearer_auth(token);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                NetworkError::Timeout {
                    timeout_ms: u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX),
                }
            } else if e.is_connect() {
                NetworkError::ConnectionFailed {
                    reason: e.to_string(),
                }
            } else {
                NetworkError::Http {
                    status_code: e.status().map_or(0, |s| s.as_u16()),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: path.to_string(),
                status_code: status.as_u16(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl NotificationApi for RestNotificationApi {
    async fn list(&self, page: u32, page_size: u32) -> Result<NotificationPage, ApiError> {
        const PATH: &str = "/notifications";
        let response = self
            .execute(
                Method::GET,
                PATH,
                &[("page", page.to_string()), ("pageSize", page_size.to_string())],
            )
            .await?;

        let body: ListBody = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse {
                endpoint: PATH.to_string(),
                reason: e.to_string(),
            })?;
        let page = body.into_page();
        debug!(items = page.items.len(), total = page.meta.total, "Fetched notifications");
        Ok(page)
    }

    async fn mark_read(&self, id: &NotificationId) -> Result<(), ApiError> {
        let path = format!("/notifications/{}/read", id.as_str());
        self.execute(Method::PATCH, &path, &[]).await.map(drop)
    }

    async fn mark_all_read(&self) -> Result<(), ApiError> {
        self.execute(Method::POST, "/notifications/mark-all-read", &[])
            .await
            .map(drop)
    }

    async fn delete(&self, id: &NotificationId) -> Result<(), ApiError> {
        let path = format!("/notifications/{}", id.as_str());
        self.execute(Method::DELETE, &path, &[]).await.map(drop)
    }
}
