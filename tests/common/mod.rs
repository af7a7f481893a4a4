#![allow(dead_code)]

use reqwest::StatusCode;
use serde_json::{json, Value};
use smile_id_core::api::{ApiClient, ApiClientError, ClientConfig, HttpResponse, PollPolicy, Transport};
use smile_id_core::server::Server;
use smile_id_core::signature::{Credentials, Signer};
use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    time::Duration,
};
use url::Url;

pub const PARTNER_ID: &str = "001";
pub const API_KEY: &str = "secret-api-key";
pub const CALLBACK: &str = "https://example.com/callback";
pub const UPLOAD_URL: &str = "https://uploads.example.com/bucket/selfie.zip";

#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: &'static str,
    pub url: Url,
    pub json: Option<Value>,
    pub bytes: Option<Vec<u8>>,
}

/// Answers requests from per-path queues and records every request.
#[derive(Default)]
pub struct FakeTransport {
    responses: RefCell<HashMap<String, VecDeque<HttpResponse>>>,
    requests: RefCell<Vec<Recorded>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path: &str, status: StatusCode, body: impl Into<String>) -> &Self {
        self.responses
            .borrow_mut()
            .entry(path.to_owned())
            .or_default()
            .push_back(HttpResponse::new(status, body));
        self
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.url.path() == path)
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    fn answer(&self, recorded: Recorded) -> Result<HttpResponse, ApiClientError> {
        let path = recorded.url.path().to_owned();
        self.requests.borrow_mut().push(recorded);
        Ok(self
            .responses
            .borrow_mut()
            .get_mut(&path)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| HttpResponse::new(StatusCode::NOT_FOUND, "no scripted response")))
    }
}

impl Transport for FakeTransport {
    fn get(&self, url: &Url) -> Result<HttpResponse, ApiClientError> {
        self.answer(Recorded {
            method: "GET",
            url: url.clone(),
            json: None,
            bytes: None,
        })
    }

    fn post_json(&self, url: &Url, body: &Value) -> Result<HttpResponse, ApiClientError> {
        self.answer(Recorded {
            method: "POST",
            url: url.clone(),
            json: Some(body.clone()),
            bytes: None,
        })
    }

    fn put_zip(&self, url: &Url, body: Vec<u8>) -> Result<HttpResponse, ApiClientError> {
        self.answer(Recorded {
            method: "PUT",
            url: url.clone(),
            json: None,
            bytes: Some(body),
        })
    }
}

pub fn fast_polling() -> PollPolicy {
    PollPolicy {
        unit: Duration::from_millis(1),
        ..PollPolicy::default()
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::new(Credentials::new(PARTNER_ID, API_KEY).unwrap(), Server::Sandbox)
        .with_callback_url(Url::parse(CALLBACK).unwrap())
        .with_poll_policy(fast_polling())
}

pub fn client(transport: FakeTransport) -> ApiClient<FakeTransport> {
    ApiClient::with_transport(config(), transport).unwrap()
}

/// A job status body signed the way the server signs it.
pub fn job_status_body(signer: &Signer, complete: bool) -> String {
    let signature = signer
        .sign(Some("2024-01-01T12:00:00.000000+00:00"))
        .unwrap();
    json!({
        "job_complete": complete,
        "job_success": complete,
        "code": if complete { "2302" } else { "2314" },
        "result": {"ResultText": if complete { "Enroll User" } else { "Pending" }},
        "timestamp": signature.timestamp(),
        "signature": signature.value(),
    })
    .to_string()
}

pub fn prep_upload_body() -> String {
    json!({"upload_url": UPLOAD_URL, "smile_job_id": "0000000001"}).to_string()
}
