//! # Smile ID Core
//!
//! A Rust client for the Smile ID identity verification API.
//! It signs requests, validates job parameters, uploads selfie and ID
//! images as a zip bundle and polls jobs until they complete.
//!
//! ## Features
//!
//! - **Request Signing**: HMAC-SHA256 signatures, plus the legacy RSA `sec_key`
//! - **Validation**: Job parameters are checked before any network call
//! - **Job Submission**: ID lookups, business verification and image uploads
//! - **Status Polling**: Bounded, cancellable polling with verified responses
//! - **Error Handling**: Comprehensive error types with actionable suggestions
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use smile_id_core::{
//!     api::{ApiClient, ClientConfig},
//!     params::{IdInfo, PartnerParams},
//!     server::Server,
//!     signature::Credentials,
//!     types::JobType,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Credentials::new("001", "api-key")?;
//! let client = ApiClient::new(ClientConfig::new(credentials, Server::Sandbox))?;
//!
//! let partner_params = PartnerParams::new("user-1", "job-1", JobType::EnhancedKyc)?;
//! let id_info = IdInfo::new()
//!     .with("country", "NG")
//!     .with("id_type", "BVN")
//!     .with("id_number", "00000000000")
//!     .with("entered", true);
//!
//! let result = client.submit_id_verification(&partner_params, &id_info)?;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```

/// API client, transport, payloads and status polling
pub mod api;

/// Error types with actionable suggestions
pub mod errors;

/// Partner params, id info, images and options of a job
pub mod params;

/// API deployment selection
pub mod server;

/// Credentials and request signatures
pub mod signature;

/// Job and image type codes
pub mod types;

/// Checks run on job parameters before any request
pub mod validation;
