use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use super::polling::PollOutcome;

/// Answer to the pre-upload request.
#[derive(Debug, Deserialize)]
pub struct PrepUploadResponse {
    pub upload_url: String,
    pub smile_job_id: String,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Supported countries and id types, with the fields each id type requires.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicesCatalog {
    /// country -> id type -> required fields
    #[serde(default)]
    pub id_types: HashMap<String, HashMap<String, Vec<String>>>,
}

impl ServicesCatalog {
    pub fn required_fields(&self, country: &str, id_type: &str) -> Option<&[String]> {
        self.id_types
            .get(country)
            .and_then(|types| types.get(id_type))
            .map(Vec::as_slice)
    }
}

/// Job status as reported by the server.
///
/// `timestamp` and `signature` are the server's own signature over the
/// response and are checked before the response is trusted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    #[serde(default)]
    pub job_complete: bool,
    #[serde(default)]
    pub job_success: bool,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub signature: String,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl JobStatusResponse {
    pub fn code(&self) -> Option<&Value> {
        self.rest.get("code")
    }

    pub fn result(&self) -> Option<&Value> {
        self.rest.get("result")
    }

    pub fn history(&self) -> Option<&Value> {
        self.rest.get("history")
    }

    pub fn image_links(&self) -> Option<&Value> {
        self.rest.get("image_links")
    }
}

/// Result of [`crate::api::ApiClient::submit_job`].
#[derive(Clone, Debug, PartialEq)]
pub enum JobOutcome {
    /// Synchronous lookup result, returned as the server sent it.
    Lookup(Value),
    /// Upload accepted; the result goes to the callback.
    Submitted { smile_job_id: String },
    /// Upload accepted and the job status was polled.
    Polled(PollOutcome),
}

impl JobOutcome {
    pub fn to_json(&self) -> Value {
        match self {
            Self::Lookup(value) => value.clone(),
            Self::Submitted { smile_job_id } => {
                json!({"success": true, "smile_job_id": smile_job_id})
            }
            Self::Polled(outcome) => {
                serde_json::to_value(outcome.response()).unwrap_or(Value::Null)
            }
        }
    }
}
