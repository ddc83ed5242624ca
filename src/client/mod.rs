/*
 * HTTP client for subgraph query endpoints
 */

use crate::models::{Result, SpyglassError};
use crate::query::QueryDocument;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

pub struct SubgraphClient {
    client: Client,
    url: Url,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl SubgraphClient {
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| SpyglassError::ConfigError(format!("Invalid subgraph URL {url}: {e}")))?;
        Ok(Self {
            client: Client::new(),
            url,
        })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Submits a query document and decodes the `data` payload into `T`.
    pub async fn query<T: DeserializeOwned>(&self, document: &QueryDocument) -> Result<T> {
        debug!("Submitting subgraph query to {}", self.url);

        let response = self
            .client
            .post(self.url.clone())
            .json(&serde_json::json!({ "query": document.as_str() }))
            .send()
            .await?
            .error_for_status()?
            .json::<GraphQlResponse<T>>()
            .await
            .map_err(|e| {
                SpyglassError::SubgraphError(format!("Failed to decode subgraph response: {e}"))
            })?;

        if let Some(errors) = response.errors {
            if !errors.is_empty() {
                let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
                return Err(SpyglassError::SubgraphError(messages.join("; ")));
            }
        }

        response
            .data
            .ok_or_else(|| SpyglassError::SubgraphError("Response contained no data".to_string()))
    }
}
