//! `reqwest` transport for the assistant endpoints.
//!
//! Mirrors the browser transport: the Flask session cookie and a `Referer`
//! on the server's origin stand in for same-origin credentials, and the chat
//! body is decoded regardless of status.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use devwell_assistant::config::WidgetConfig;
use devwell_assistant::net::api::AssistantApi;
use devwell_assistant::net::types::{ApiError, ChatReply, ChatRequest, ReindexReply};
use reqwest::header::{COOKIE, HeaderMap, HeaderValue, REFERER};

use crate::CliError;

pub struct ReqwestApi {
    client: reqwest::Client,
    reindex_url: String,
    chat_url: String,
    csrf_header: String,
}

impl ReqwestApi {
    pub fn new(base_url: &str, session_cookie: Option<&str>, config: &WidgetConfig) -> Result<Self, CliError> {
        let base = normalize_base_url(base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_str(&format!("{base}/"))?);
        if let Some(cookie) = session_cookie {
            headers.insert(COOKIE, HeaderValue::from_str(&format!("session={cookie}"))?);
        }
        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            reindex_url: endpoint_url(&base, &config.reindex_endpoint),
            chat_url: endpoint_url(&base, &config.chat_endpoint),
            csrf_header: config.csrf_header.clone(),
        })
    }
}

impl AssistantApi for ReqwestApi {
    async fn reindex(&self, csrf_token: &str) -> Result<ReindexReply, ApiError> {
        let resp = self
            .client
            .post(&self.reindex_url)
            .header(self.csrf_header.as_str(), csrf_token)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status { status: status.as_u16() });
        }
        Ok(resp.json::<ReindexReply>().await.unwrap_or_default())
    }

    async fn chat(&self, csrf_token: &str, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        let resp = self
            .client
            .post(&self.chat_url)
            .header(self.csrf_header.as_str(), csrf_token)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), url = %self.chat_url, "chat endpoint returned error status");
        }
        resp.json::<ChatReply>()
            .await
            .map_err(|e| ApiError::Parse(format!("status {}: {e}", status.as_u16())))
    }
}

fn normalize_base_url(raw: &str) -> Result<String, CliError> {
    let base = raw.trim().trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        Ok(base.to_owned())
    } else {
        Err(CliError::InvalidBaseUrl(raw.to_owned()))
    }
}

fn endpoint_url(base: &str, path: &str) -> String {
    format!("{base}/{}", path.trim_start_matches('/'))
}
