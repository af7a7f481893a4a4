mod args;
mod progress;

use crate::args::{Args, Commands, JobFile, StatusArgs, TokenArgs};
use crate::progress::ApiProgress;

use clap::Parser;
use serde_json::Value;
use thiserror::Error;

use smile_id_core::{
    api::{poll_job_status, ApiClient, ApiClientError, CancelToken, JobOutcome, PollOutcome},
    signature::SignatureError,
};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiClientError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let Args { config, command } = Args::parse();
    let client = ApiClient::new(config.client_config().map_err(CliError::from)?)?;

    match &command {
        Commands::Submit(args) => {
            let outcome = submit(&client, &args.job)?;
            print_json(&outcome.to_json())?;
            if let JobOutcome::Polled(PollOutcome::GaveUp(_)) = outcome {
                println!("[WARNING] Job did not complete before polling stopped");
            }
        }
        Commands::Status(args) => {
            let status = status(&client, args)?;
            print_json(&status)?;
        }
        Commands::Services => {
            let progress = ApiProgress::new_request("Fetching services...");
            let services = client.get_services();
            progress.finish_and_clear();
            print_json(&serde_json::to_value(services?)?)?;
        }
        Commands::Token(args) => {
            let token = token(&client, args)?;
            print_json(&token)?;
        }
    }
    Ok(())
}

fn print_json(value: &Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn submit(client: &ApiClient, job: &JobFile) -> Result<JobOutcome, CliError> {
    let progress = ApiProgress::new_submit(&job.partner_params.job_id);
    let outcome = client.submit_job(
        &job.partner_params,
        &job.images,
        &job.id_info,
        job.options.as_ref(),
    );

    match &outcome {
        Ok(JobOutcome::Polled(PollOutcome::GaveUp(_))) => {
            progress.finish_with_message("Job still in progress");
        }
        Ok(_) => progress.finish_with_message("✅ Done"),
        Err(_) => progress.finish_and_clear(),
    }
    outcome.map_err(CliError::from)
}

fn status(client: &ApiClient, args: &StatusArgs) -> Result<Value, CliError> {
    let options = args.options();

    if !args.watch {
        let status = client.get_job_status(&args.user_id, &args.job_id, &options, None)?;
        return Ok(serde_json::to_value(status)?);
    }

    let signature = client.signer().sign(None)?;
    let progress = ApiProgress::new_polling(&args.job_id);
    let outcome = poll_job_status(
        client,
        &args.user_id,
        &args.job_id,
        &options,
        &signature,
        &CancelToken::new(),
    );
    progress.finish_and_clear();

    Ok(serde_json::to_value(outcome?.into_response())?)
}

fn token(client: &ApiClient, args: &TokenArgs) -> Result<Value, CliError> {
    let progress = ApiProgress::new_request("Requesting web token...");
    let token = client.get_web_token(&args.user_id, &args.job_id, &args.product, None, None);
    progress.finish_and_clear();
    Ok(token?)
}
