use reqwest::StatusCode;
use std::fmt::{self, Formatter};
use thiserror::Error;
use url::Url;

/// A non-2xx answer from one of the API endpoints.
///
/// Keeps the endpoint, the status and the raw response body so that the
/// caller can report exactly what the server said.
#[derive(Debug, Error)]
pub struct RequestFailure {
    pub url: Url,
    pub status: StatusCode,
    pub msg: String,
}

impl RequestFailure {
    pub fn new(url: Url, status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            url,
            status,
            msg: msg.into(),
        }
    }

    pub const fn error_code(&self) -> &'static str {
        "E002"
    }

    fn suggestions(&self) -> Vec<&'static str> {
        match self.status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => vec![
                "Check that the partner id and api key belong to the selected server",
                "Sandbox and production keys are not interchangeable",
                "Make sure the system clock is correct, signatures are time bound",
            ],
            StatusCode::BAD_REQUEST => vec![
                "Check the job parameters against the API documentation",
                "Verify that the id_type is supported for the selected country",
            ],
            StatusCode::NOT_FOUND => vec![
                "Check that the URL is correct",
                "Verify that the server flag points to the intended environment",
            ],
            StatusCode::TOO_MANY_REQUESTS => vec![
                "Wait a moment before retrying",
                "Consider reducing request frequency",
            ],
            status if status.is_server_error() => vec![
                "The service may be temporarily unavailable",
                "Try again later",
            ],
            _ => vec!["Inspect the server response above for details"],
        }
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(
            formatter,
            "[{}] Failed to post entity to {}, status={}, response={}",
            self.error_code(),
            self.url,
            self.status.as_u16(),
            self.msg
        )?;

        write!(formatter, "\n\nSuggestions:")?;
        for suggestion in self.suggestions() {
            write!(formatter, "\n  • {suggestion}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://testapi.smileidentity.com/v1/id_verification").unwrap()
    }

    #[test]
    fn test_display_embeds_endpoint_status_and_body() {
        let failure = RequestFailure::new(
            url(),
            StatusCode::BAD_REQUEST,
            r#"{"code":"2204","error":"unauthorized"}"#,
        );
        let message = failure.to_string();

        assert!(message.contains("[E002]"));
        assert!(message.contains("https://testapi.smileidentity.com/v1/id_verification"));
        assert!(message.contains("status=400"));
        assert!(message.contains(r#"{"code":"2204","error":"unauthorized"}"#));
    }

    #[test]
    fn test_status_specific_suggestions() {
        let unauthorized = RequestFailure::new(url(), StatusCode::UNAUTHORIZED, "nope");
        assert!(unauthorized.to_string().contains("signatures are time bound"));

        let throttled = RequestFailure::new(url(), StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(throttled.to_string().contains("reducing request frequency"));

        let unavailable = RequestFailure::new(url(), StatusCode::BAD_GATEWAY, "");
        assert!(unavailable.to_string().contains("Try again later"));
    }
}
