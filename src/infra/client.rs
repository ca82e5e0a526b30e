use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::domain::notification::{
    to_view_model, NewNotification, Notification, NotificationId, WireNotification,
};
use crate::infra::api::{ApiError, NotificationApi, PageEnvelope, PageRequest, UnreadCountBody};

/// reqwest-backed [`NotificationApi`].
///
/// All paths are relative to `base_url` (for example `https://hr.example.com/api`).
#[derive(Clone)]
pub struct HttpNotificationApi {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpNotificationApi {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url)?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            token: token.filter(|token| !token.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(resp: Response) -> Result<Response, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            let code = status.as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Server { status: code, message: body });
        }
        Ok(resp)
    }

    async fn parse<R: DeserializeOwned>(resp: Response) -> Result<R, ApiError> {
        let resp = Self::check(resp).await?;
        resp.json::<R>()
            .await
            .map_err(|err| ApiError::Decode(format!("response body: {}", err)))
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn list(&self, request: PageRequest) -> Result<Vec<Notification>, ApiError> {
        let url = self.url(&format!(
            "/notifications?page={}&size={}&sortBy=id&sortDir=desc",
            request.page, request.size
        ));
        let resp = self.authed(self.http.get(&url)).send().await?;
        let envelope: Option<PageEnvelope> = Self::parse(resp).await?;
        let items: Vec<Notification> = envelope
            .map(PageEnvelope::into_items)
            .unwrap_or_default()
            .into_iter()
            .map(to_view_model)
            .collect();
        debug!(page = request.page, size = request.size, returned = items.len(), "fetched notification page");
        Ok(items)
    }

    async fn unread_count(&self) -> Result<u64, ApiError> {
        let resp = self
            .authed(self.http.get(&self.url("/notifications/unread-count")))
            .send()
            .await?;
        let body: Option<UnreadCountBody> = Self::parse(resp).await?;
        Ok(body.and_then(|body| body.unread_count).unwrap_or(0))
    }

    async fn create(&self, request: &NewNotification) -> Result<Notification, ApiError> {
        let resp = self
            .authed(self.http.post(&self.url("/notifications")).json(request))
            .send()
            .await?;
        let created: WireNotification = Self::parse(resp).await?;
        Ok(to_view_model(created))
    }

    async fn mark_read(&self, id: NotificationId) -> Result<(), ApiError> {
        let url = self.url(&format!("/notifications/{}/read", id));
        let resp = self.authed(self.http.put(&url)).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn mark_all_read(&self) -> Result<(), ApiError> {
        let resp = self
            .authed(self.http.put(&self.url("/notifications/mark-all-read")))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn delete(&self, id: NotificationId) -> Result<(), ApiError> {
        let url = self.url(&format!("/notifications/{}", id));
        let resp = self.authed(self.http.delete(&url)).send().await?;
        Self::check(resp).await?;
        Ok(())
    }
}
