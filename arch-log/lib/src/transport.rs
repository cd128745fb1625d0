//! Outbound HTTP with status classification.
//!
//! Every upstream request goes through [`Transport`], which turns the raw
//! response into one of three outcomes:
//!
//! - 2xx: the response is handed back
//! - 404: [`LookupError::NotFound`]
//! - any other status >= 300, or a connection failure: [`FetchError`]
//!
//! There are no retries and no explicit timeout.

use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ConfigError, FetchError, Lookup, LookupError};

/// User agent sent with every request. GitHub rejects requests without one.
const USER_AGENT: &str = concat!("arch-log/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client used by all providers.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
}

impl Transport {
    /// Creates a transport with a fresh connection pool.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::Client`] if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, ConfigError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(ConfigError::Client)?;
        Ok(Self { client })
    }

    /// Starts a GET request.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    /// Starts a POST request.
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// Sends the request and classifies the response status.
    pub async fn execute(&self, request: RequestBuilder) -> Lookup<Response> {
        let request = request.build().map_err(FetchError::Request)?;
        let url = request.url().to_string();

        debug!(%url, method = %request.method(), "Sending request");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|source| FetchError::Network {
                url: url.clone(),
                source,
            })?;

        classify(url, response)
    }

    /// Sends the request and returns the whole body.
    pub async fn get_bytes(&self, request: RequestBuilder) -> Lookup<Bytes> {
        let response = self.execute(request).await?;
        read_body(response).await
    }

    /// Sends the request and decodes a JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Lookup<T> {
        let response = self.execute(request).await?;
        decode_json(response).await
    }

    /// Sends the request and decodes an XML body.
    pub async fn get_xml<T: DeserializeOwned>(&self, request: RequestBuilder) -> Lookup<T> {
        let response = self.execute(request).await?;
        let url = response.url().to_string();
        let body = read_body(response).await?;

        quick_xml::de::from_reader(body.as_ref()).map_err(|e| {
            FetchError::Decode {
                url,
                message: e.to_string(),
            }
            .into()
        })
    }
}

/// Decodes a JSON body of an already classified response.
pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> Lookup<T> {
    let url = response.url().to_string();
    let body = read_body(response).await?;

    serde_json::from_slice(&body).map_err(|e| {
        FetchError::Decode {
            url,
            message: e.to_string(),
        }
        .into()
    })
}

async fn read_body(response: Response) -> Lookup<Bytes> {
    let url = response.url().to_string();
    let body = response
        .bytes()
        .await
        .map_err(|source| FetchError::Network { url: url.clone(), source })?;

    debug!(%url, bytes = body.len(), "Fetching successful");
    Ok(body)
}

fn classify(url: String, response: Response) -> Lookup<Response> {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        debug!(%url, "Server reported 404");
        return Err(LookupError::NotFound);
    }

    if status.as_u16() >= 300 {
        return Err(FetchError::Status { url, status }.into());
    }

    Ok(response)
}
