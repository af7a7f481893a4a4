use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::{fs, io, path::PathBuf, time::Duration};
use thiserror::Error;
use url::Url;

use smile_id_core::{
    api::{ClientConfig, PollPolicy},
    params::{IdInfo, ImageParams, Options, PartnerParams},
    server::Server,
    signature::{Credentials, SignatureError, SignatureKind},
};

fn get_product_validation_regex() -> Result<&'static Regex, String> {
    lazy_static! {
        static ref VALID_PRODUCT_REGEX: Result<Regex, regex::Error> = Regex::new(r"^[a-z][a-z_]*$");
    }

    match VALID_PRODUCT_REGEX.as_ref() {
        Ok(regex) => Ok(regex),
        Err(_) => Err("Internal regex compilation error".to_string()),
    }
}

/// A job read from a JSON file.
#[derive(Clone, Debug, Deserialize)]
pub struct JobFile {
    pub partner_params: PartnerParams,
    #[serde(default)]
    pub id_info: IdInfo,
    #[serde(default)]
    pub images: Vec<ImageParams>,
    #[serde(default)]
    pub options: Option<Options>,
}

#[derive(Error, Debug)]
pub enum JobFileError {
    #[error("[E030] Failed to read job file {path}\n\nSuggestions:\n  • Check that the file exists\n  • Check file permissions")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("[E031] Job file {path} is not valid: {source}\n\nSuggestions:\n  • The file must be a JSON object with partner_params, id_info, images and options\n  • partner_params needs user_id, job_id and job_type")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads a job file. Relative image paths are taken relative to the file.
pub fn job_file_value_parser(raw: &str) -> Result<JobFile, JobFileError> {
    let path = PathBuf::from(raw);
    let contents = fs::read_to_string(&path).map_err(|source| JobFileError::Io {
        path: path.clone(),
        source,
    })?;
    let mut job: JobFile =
        serde_json::from_str(&contents).map_err(|source| JobFileError::Json {
            path: path.clone(),
            source,
        })?;

    if let Some(dir) = path.parent() {
        for image in &mut job.images {
            if let Some(file) = image.file_name.as_mut() {
                if file.is_relative() && !file.as_os_str().is_empty() {
                    *file = dir.join(&*file);
                }
            }
        }
    }

    Ok(job)
}

fn id_value_parser(id: &str) -> Result<String, String> {
    if id.trim().is_empty() {
        return Err("Id cannot be empty".to_string());
    }
    Ok(id.to_string())
}

fn product_value_parser(product: &str) -> Result<String, String> {
    let regex = get_product_validation_regex()?;
    if !regex.is_match(product) {
        return Err(format!(
            "Unrecognized product: {product}, products are lowercase words such as biometric_kyc"
        ));
    }
    Ok(product.to_string())
}

#[derive(clap::Parser)]
#[command(name = "smile-id")]
#[command(author = "Smile ID")]
#[command(version)]
#[command(about = "Submit and track Smile ID identity verification jobs")]
#[command(long_about = "
A command-line tool for the Smile ID identity verification API.

Credentials are read from flags or from the SMILE_PARTNER_ID and
SMILE_API_KEY environment variables. The server defaults to the sandbox.

Examples:
  # Submit a job described in a JSON file and wait for the result
  smile-id submit job.json

  # Check the status of a job
  smile-id status --user-id user-1 --job-id job-1

  # List supported countries and id types on production
  smile-id --server 1 services

  # Request a web token
  smile-id token --user-id user-1 --job-id job-1 --product biometric_kyc
")]
pub struct Args {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    /// Partner id issued by Smile ID
    #[arg(long, global = true, env = "SMILE_PARTNER_ID", value_parser = id_value_parser)]
    pub partner_id: Option<String>,

    /// API key, or the partner public key with --sec-key
    #[arg(long, global = true, env = "SMILE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// 0 for the sandbox, 1 for production, or a full API URL
    #[arg(long, global = true, env = "SMILE_SERVER", default_value = "0")]
    pub server: Server,

    /// Where the server posts job results
    #[arg(long, global = true, env = "SMILE_CALLBACK_URL", value_hint = clap::ValueHint::Url)]
    pub callback_url: Option<Url>,

    /// Sign requests with the legacy sec_key
    #[arg(long, global = true, default_value_t = false)]
    pub sec_key: bool,

    /// Check id info against the services catalog before submitting
    #[arg(long, global = true, default_value_t = false)]
    pub use_validation_api: bool,

    /// Stop polling after this many seconds
    #[arg(long, global = true, value_name = "SECONDS")]
    pub poll_deadline: Option<u64>,
}

impl ConfigArgs {
    pub fn client_config(&self) -> Result<ClientConfig, SignatureError> {
        let credentials = Credentials::new(
            self.partner_id.clone().unwrap_or_default(),
            self.api_key.clone().unwrap_or_default(),
        )?;
        let kind = if self.sec_key {
            SignatureKind::SecKey
        } else {
            SignatureKind::Signature
        };
        let poll_policy = PollPolicy {
            deadline: self.poll_deadline.map(Duration::from_secs),
            ..PollPolicy::default()
        };

        let mut config = ClientConfig::new(credentials, self.server.clone())
            .with_signature_kind(kind)
            .with_validation_api(self.use_validation_api)
            .with_poll_policy(poll_policy);
        if let Some(callback_url) = &self.callback_url {
            config = config.with_callback_url(callback_url.clone());
        }
        Ok(config)
    }
}

#[derive(clap::Subcommand)]
#[allow(clippy::large_enum_variant)]
pub enum Commands {
    /// Submit a job described by a JSON file
    ///
    /// The file holds `partner_params`, and optionally `id_info`, `images`
    /// and `options`. Enhanced KYC (5) and business verification (7) jobs
    /// return the lookup result. Other jobs upload their images and wait
    /// for the result unless `options.return_job_status` is false.
    ///
    /// Examples:
    ///   smile-id submit job.json
    Submit(SubmitArgs),

    /// Query the status of a job
    ///
    /// Examples:
    ///   smile-id status --user-id user-1 --job-id job-1 --history
    Status(StatusArgs),

    /// List supported countries and id types
    Services,

    /// Request a token for the hosted web integration
    ///
    /// Examples:
    ///   smile-id token --user-id user-1 --job-id job-1 --product biometric_kyc
    Token(TokenArgs),
}

#[derive(clap::Args)]
pub struct SubmitArgs {
    /// JSON job file
    #[arg(
        value_name = "FILE",
        value_hint = clap::ValueHint::FilePath,
        value_parser = job_file_value_parser
    )]
    pub job: JobFile,
}

#[derive(clap::Args)]
pub struct StatusArgs {
    #[arg(long, value_parser = id_value_parser)]
    pub user_id: String,

    #[arg(long, value_parser = id_value_parser)]
    pub job_id: String,

    /// Include the job history
    #[arg(long, default_value_t = false)]
    pub history: bool,

    /// Include links to the job images
    #[arg(long, default_value_t = false)]
    pub images: bool,

    /// Poll until the job completes
    #[arg(long, default_value_t = false)]
    pub watch: bool,
}

impl StatusArgs {
    pub fn options(&self) -> Options {
        Options {
            return_job_status: true,
            return_history: self.history,
            return_images: self.images,
            ..Options::default()
        }
    }
}

#[derive(clap::Args)]
pub struct TokenArgs {
    #[arg(long, value_parser = id_value_parser)]
    pub user_id: String,

    #[arg(long, value_parser = id_value_parser)]
    pub job_id: String,

    /// Product the token is for, e.g. biometric_kyc or doc_verification
    #[arg(long, value_parser = product_value_parser)]
    pub product: String,
}
