//! Async HTTP client wrapping reqwest.
//!
//! One shared connection pool, three header profiles (listing page, asset,
//! fallback) and per-request timeouts. Retry policy lives with the callers;
//! this layer only sends one request and classifies what went wrong.

use std::time::Duration;

use crate::config::{IconConfig, GENERIC_USER_AGENT};
use crate::types::{IconError, IconResult};

const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Response from an HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Original requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Which set of request headers to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderProfile {
    /// Top-level browser navigation to a listing page.
    Page,
    /// Image sub-resource loaded from the listing page.
    Asset,
    /// Plain download from the fallback source.
    Fallback,
}

/// HTTP client for icon retrieval.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    user_agent: String,
    referer: String,
}

impl HttpClient {
    /// Create a client from the shared configuration.
    ///
    /// Compression is negotiated by reqwest, which sets `Accept-Encoding`
    /// itself and decodes gzip, deflate and brotli bodies.
    pub fn new(config: &IconConfig) -> Self {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .unwrap_or_default();

        Self {
            client,
            user_agent: config.user_agent.clone(),
            referer: config.primary_referer(),
        }
    }

    /// Header pairs sent for `profile`.
    pub fn headers(&self, profile: HeaderProfile) -> Vec<(&'static str, String)> {
        let ua = self.user_agent.clone();
        match profile {
            HeaderProfile::Page => vec![
                ("User-Agent", ua),
                (
                    "Accept",
                    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,\
                     image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7"
                        .to_string(),
                ),
                ("Accept-Language", ACCEPT_LANGUAGE.to_string()),
                ("DNT", "1".to_string()),
                ("Connection", "keep-alive".to_string()),
                ("Upgrade-Insecure-Requests", "1".to_string()),
                ("Sec-Fetch-Dest", "document".to_string()),
                ("Sec-Fetch-Mode", "navigate".to_string()),
                ("Sec-Fetch-Site", "none".to_string()),
                ("Sec-Fetch-User", "?1".to_string()),
                ("Cache-Control", "max-age=0".to_string()),
            ],
            HeaderProfile::Asset => vec![
                ("User-Agent", ua),
                ("Accept", "image/svg+xml,image/*,*/*;q=0.8".to_string()),
                ("Accept-Language", ACCEPT_LANGUAGE.to_string()),
                ("Referer", self.referer.clone()),
                ("DNT", "1".to_string()),
                ("Connection", "keep-alive".to_string()),
                ("Sec-Fetch-Dest", "image".to_string()),
                ("Sec-Fetch-Mode", "no-cors".to_string()),
                ("Sec-Fetch-Site", "same-origin".to_string()),
            ],
            HeaderProfile::Fallback => vec![
                ("User-Agent", GENERIC_USER_AGENT.to_string()),
                ("Accept", "image/svg+xml,*/*".to_string()),
            ],
        }
    }

    /// Perform a single GET. Never retries and never inspects the status.
    pub async fn get(
        &self,
        url: &str,
        profile: HeaderProfile,
        timeout_ms: u64,
    ) -> IconResult<HttpResponse> {
        let mut builder = self
            .client
            .get(url)
            .timeout(Duration::from_millis(timeout_ms));

        for (name, value) in self.headers(profile) {
            builder = builder.header(name, value);
        }

        let r = builder.send().await.map_err(IconError::from_reqwest)?;
        let status = r.status().as_u16();
        let final_url = r.url().to_string();
        let body = r.text().await.map_err(IconError::from_reqwest)?;

        Ok(HttpResponse {
            url: url.to_string(),
            final_url,
            status,
            body,
        })
    }
}
