//! # Figma REST client
//!
//! Implements [`DesignSource`] over `GET /v1/files/{key}` with the
//! `X-Figma-Token` header. Transport problems, timeouts and non-success
//! statuses are mapped onto the core error taxonomy; status messages come
//! from the fixed table in `figma_rag_core::error`.

use async_trait::async_trait;
use figma_rag_core::config::FigmaSettings;
use figma_rag_core::contract::DesignSource;
use figma_rag_core::error::Error;
use figma_rag_core::node::DesignFile;
use reqwest::header::ACCEPT;
use std::time::Duration;

pub struct FigmaClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    timeout: Duration,
}

impl FigmaClient {
    pub fn new(settings: &FigmaSettings, token: String) -> anyhow::Result<Self> {
        let timeout = settings.timeout();
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        tracing::info!(
            base_url = %settings.base_url,
            timeout_secs = settings.timeout_secs,
            "Initialized Figma client"
        );
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token,
            timeout,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(self.timeout)
        } else {
            Error::Transport(format!("Failed to fetch data from Figma: {e}"))
        }
    }
}

#[async_trait]
impl DesignSource for FigmaClient {
    async fn fetch_file(&self, file_key: &str) -> Result<DesignFile, Error> {
        let url = format!("{}/v1/files/{}", self.base_url, file_key);
        tracing::info!(url = %url, "Fetching Figma file");

        let response = self
            .http
            .get(&url)
            .header("X-Figma-Token", &self.token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, url = %url, "Failed to reach Figma API");
                self.transport_error(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok();
            tracing::error!(
                status = %status,
                url = %url,
                body = body.as_deref().unwrap_or("<unreadable>"),
                "Figma API returned error"
            );
            return Err(Error::remote(status.as_u16(), body));
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::error!(error = ?e, url = %url, "Failed to read Figma response");
            self.transport_error(e)
        })?;
        let file = DesignFile::from_slice(&body).map_err(|e| {
            tracing::error!(error = ?e, url = %url, "Failed to decode Figma response");
            Error::InvalidResponse(format!("Figma response is not a valid file: {e}"))
        })?;

        tracing::info!(
            file_key,
            name = file.name.as_deref().unwrap_or(""),
            has_document = file.document.is_some(),
            "Fetched Figma file"
        );
        Ok(file)
    }
}
