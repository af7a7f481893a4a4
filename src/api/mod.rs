// Re-export the API module components
pub use self::{
    client::{ApiClient, ClientConfig},
    errors::ApiClientError,
    models::{JobOutcome, JobStatusResponse, PrepUploadResponse, ServicesCatalog},
    polling::{poll_job_status, CancelToken, PollOutcome, PollPolicy, PollSchedule, MAX_POLL_ATTEMPTS},
    transport::{HttpResponse, HttpTransport, Transport},
};

// Module declarations
pub mod bundle;
mod client;
mod errors;
mod models;
pub mod payload;
mod polling;
mod transport;
