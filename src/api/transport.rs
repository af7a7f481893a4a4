use reqwest::{
    blocking::{self, Client},
    header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE},
    StatusCode,
};
use serde_json::Value;
use url::Url;

use super::errors::ApiClientError;

/// Status and raw body of an HTTP exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// The HTTP capability the client needs.
///
/// Transport errors (timeouts, resets) are returned as-is; nothing is
/// retried at this level.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// # Errors
    ///
    /// On network failure.
    fn get(&self, url: &Url) -> Result<HttpResponse, ApiClientError>;

    /// # Errors
    ///
    /// On network failure.
    fn post_json(&self, url: &Url, body: &Value) -> Result<HttpResponse, ApiClientError>;

    /// # Errors
    ///
    /// On network failure.
    fn put_zip(&self, url: &Url, body: Vec<u8>) -> Result<HttpResponse, ApiClientError>;
}

/// [`Transport`] over a blocking `reqwest` client.
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: blocking::Client::new(),
        }
    }

    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn read(response: blocking::Response) -> Result<HttpResponse, ApiClientError> {
    let status = response.status();
    let body = response.text()?;
    log::debug!("Raw API Response ({status}): {body}");
    Ok(HttpResponse { status, body })
}

impl Transport for HttpTransport {
    fn get(&self, url: &Url) -> Result<HttpResponse, ApiClientError> {
        log::debug!("GET {url}");
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .header(ACCEPT_LANGUAGE, "en_US")
            .send()?;
        read(response)
    }

    fn post_json(&self, url: &Url, body: &Value) -> Result<HttpResponse, ApiClientError> {
        log::debug!("POST {url}");
        let response = self
            .client
            .post(url.clone())
            .header(ACCEPT, "application/json")
            .header(ACCEPT_LANGUAGE, "en_US")
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(body)?)
            .send()?;
        read(response)
    }

    fn put_zip(&self, url: &Url, body: Vec<u8>) -> Result<HttpResponse, ApiClientError> {
        log::debug!("PUT {url} ({} bytes)", body.len());
        let response = self
            .client
            .put(url.clone())
            .header(CONTENT_TYPE, "application/zip")
            .body(body)
            .send()?;
        read(response)
    }
}
