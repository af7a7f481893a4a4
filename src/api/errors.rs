use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::errors::RequestFailure;
use crate::signature::SignatureError;
use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("[E006] Invalid base URL: {0}\n\nSuggestions:\n  • Provide a valid HTTP or HTTPS URL\n  • Example: https://testapi.smileidentity.com/v1\n  • Ensure the URL includes the protocol (http:// or https://)")]
    CannotBeBase(Url),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Failure(#[from] RequestFailure),

    #[error("[E004] Unable to confirm validity of the job_status response from {url}, status={}, response={body}\n\nSuggestions:\n  • The response may have been tampered with or routed to the wrong partner\n  • Check that the api key matches the partner id", .status.as_u16())]
    UnverifiedResponse {
        url: Url,
        status: StatusCode,
        body: String,
    },

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error("[E005] Polling of job '{0}' was cancelled")]
    Cancelled(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error("[E009] Invalid URL format: {0}\n\nSuggestions:\n  • Check the URL format is correct\n  • Ensure proper encoding of special characters\n  • Use absolute URLs with protocol (http:// or https://)")]
    UrlCannotBeBase(#[from] url::ParseError),
}

impl ApiClientError {
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::CannotBeBase(_) => "E006",
            Self::Reqwest(_) | Self::IoError(_) | Self::Json(_) | Self::Zip(_) => "E999",
            Self::Failure(f) => f.error_code(),
            Self::UnverifiedResponse { .. } => "E004",
            Self::Invalid(v) => v.error_code(),
            Self::Signature(s) => s.error_code(),
            Self::Cancelled(_) => "E005",
            Self::UrlCannotBeBase(_) => "E009",
        }
    }

    /// The server answered with an error or could not be trusted.
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Failure(_) | Self::UnverifiedResponse { .. })
    }

    /// Rejected before any request was made.
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::Invalid(ValidationError::InvalidArgument { .. })
                | Self::Signature(
                    SignatureError::EmptyPartnerId
                        | SignatureError::EmptyApiKey
                        | SignatureError::InvalidKey(_)
                        | SignatureError::NonNumericPartnerId(_)
                )
        )
    }

    pub const fn is_file_not_found(&self) -> bool {
        matches!(self, Self::Invalid(ValidationError::FileNotFound(_)))
    }
}
