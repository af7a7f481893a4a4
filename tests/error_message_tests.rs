#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::json;
use smile_id_core::api::ApiClientError;
use smile_id_core::errors::RequestFailure;
use smile_id_core::params::{Options, PartnerParams};
use smile_id_core::server::Server;
use smile_id_core::signature::{Credentials, SignatureError, SignatureKind, Signer};
use smile_id_core::validation::ValidationError;
use url::Url;

#[test]
fn test_request_failure_error_with_status_specific_suggestions() {
    let url = Url::parse("https://testapi.smileidentity.com/v1/upload").unwrap();

    let not_found = RequestFailure::new(url.clone(), StatusCode::NOT_FOUND, "Resource not found");
    let error_message = format!("{not_found}");

    assert!(error_message.contains("[E002]"));
    assert!(error_message.contains("status=404"));
    assert!(error_message.contains("response=Resource not found"));
    assert!(error_message.contains("Check that the URL is correct"));

    let rate_limited = RequestFailure::new(url, StatusCode::TOO_MANY_REQUESTS, "Rate limited");
    let rate_limit_message = format!("{rate_limited}");
    assert!(rate_limit_message.contains("Wait a moment before retrying"));
    assert!(rate_limit_message.contains("reducing request frequency"));
}

#[test]
fn test_credential_errors() {
    let err = Credentials::new("", "key").unwrap_err();
    assert_eq!(err.error_code(), "E010");
    assert!(err.to_string().contains("partner_id cannot be null or empty"));

    let err = Credentials::new("001", "   ").unwrap_err();
    assert_eq!(err.error_code(), "E011");
    assert!(err.to_string().contains("SMILE_API_KEY"));
}

#[test]
fn test_sec_key_needs_public_key() {
    let credentials = Credentials::new("001", "not a key").unwrap();
    let err = Signer::new(credentials, SignatureKind::SecKey).unwrap_err();

    assert!(matches!(err, SignatureError::InvalidKey(_)));
    assert!(err.to_string().contains("[E012]"));
    assert!(err.to_string().contains("base64 encoded RSA public key"));
}

#[test]
fn test_partner_params_errors_name_the_field() {
    let err = PartnerParams::from_value(&json!({"user_id": "u1", "job_type": 1})).unwrap_err();
    assert_eq!(err.field(), Some("job_id"));
    assert_eq!(err.error_code(), "E001");

    let err = PartnerParams::from_value(&json!({})).unwrap_err();
    assert!(matches!(err, ValidationError::InvalidArgument { .. }));
}

#[test]
fn test_options_error() {
    let err = Options::from_value(&json!({"return_images": 1})).unwrap_err();
    assert_eq!(format!("{err}"), "[E001] return_images needs to be a boolean");
}

#[test]
fn test_server_error_message() {
    let err = "ftp//nowhere".parse::<Server>().unwrap_err();
    let error_message = format!("{err}");

    assert!(error_message.contains("[E009]"));
    assert!(error_message.contains("Use 0 for the sandbox or 1 for production"));
}

#[test]
fn test_api_client_error_codes() {
    let url = Url::parse("https://testapi.smileidentity.com/v1/job_status").unwrap();

    let unverified = ApiClientError::UnverifiedResponse {
        url: url.clone(),
        status: StatusCode::OK,
        body: "{}".to_owned(),
    };
    assert_eq!(unverified.error_code(), "E004");
    assert!(unverified.is_server_error());
    assert!(unverified
        .to_string()
        .contains("Unable to confirm validity of the job_status response"));

    let cancelled = ApiClientError::Cancelled("j1".to_owned());
    assert_eq!(cancelled.error_code(), "E005");
    assert!(!cancelled.is_server_error());

    let failure = ApiClientError::from(RequestFailure::new(url, StatusCode::BAD_REQUEST, "bad"));
    assert_eq!(failure.error_code(), "E002");
    assert!(failure.is_server_error());

    let invalid = ApiClientError::from(ValidationError::invalid("images", "no images"));
    assert!(invalid.is_invalid_argument());
    assert_eq!(invalid.error_code(), "E001");
}
