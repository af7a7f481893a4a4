use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::errors::RequestFailure;
use crate::params::{IdInfo, ImageParams, Options, PartnerParams};
use crate::server::Server;
use crate::signature::{Credentials, SignatureKind, SignatureParams, Signer};
use crate::types::JobType;
use crate::validation::{self, ValidationError};

use super::bundle;
use super::errors::ApiClientError;
use super::models::{JobOutcome, JobStatusResponse, PrepUploadResponse, ServicesCatalog};
use super::payload;
use super::polling::{poll_job_status, CancelToken, PollPolicy};
use super::transport::{HttpResponse, HttpTransport, Transport};

/// Everything an [`ApiClient`] needs to talk to one partner account.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub credentials: Credentials,
    /// Defaults to the sandbox.
    pub server: Server,
    /// Where the server posts job results. Optional if jobs are polled.
    pub callback_url: Option<Url>,
    pub signature_kind: SignatureKind,
    /// Check id info against the services catalog before submitting.
    /// Costs one extra request per job.
    pub use_validation_api: bool,
    pub poll_policy: PollPolicy,
}

impl ClientConfig {
    pub fn new(credentials: Credentials, server: Server) -> Self {
        Self {
            credentials,
            server,
            callback_url: None,
            signature_kind: SignatureKind::default(),
            use_validation_api: false,
            poll_policy: PollPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_callback_url(mut self, callback_url: Url) -> Self {
        self.callback_url = Some(callback_url);
        self
    }

    #[must_use]
    pub const fn with_signature_kind(mut self, kind: SignatureKind) -> Self {
        self.signature_kind = kind;
        self
    }

    #[must_use]
    pub const fn with_validation_api(mut self, enabled: bool) -> Self {
        self.use_validation_api = enabled;
        self
    }

    #[must_use]
    pub fn with_poll_policy(mut self, poll_policy: PollPolicy) -> Self {
        self.poll_policy = poll_policy;
        self
    }
}

/// Submits jobs and queries their status.
///
/// Holds no per-request state: every call signs afresh and the signature
/// is passed along explicitly, so one client can be shared between
/// submissions.
#[derive(Clone, Debug)]
pub struct ApiClient<T = HttpTransport> {
    base: Url,
    signer: Signer,
    callback_url: Option<Url>,
    use_validation_api: bool,
    poll_policy: PollPolicy,
    transport: T,
}

impl ApiClient {
    /// # Errors
    ///
    /// Fails if the server URL cannot be a base or the credentials do not
    /// fit the signature kind.
    pub fn new(config: ClientConfig) -> Result<Self, ApiClientError> {
        Self::with_transport(config, HttpTransport::new())
    }
}

impl<T: Transport> ApiClient<T> {
    /// # Errors
    ///
    /// Fails if the server URL cannot be a base. We rely on that invariant
    /// in other methods.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, ApiClientError> {
        let base = config.server.url();
        // Test here so that we are sure path_segments_mut succeeds
        if base.cannot_be_a_base() {
            return Err(ApiClientError::CannotBeBase(base));
        }

        Ok(Self {
            base,
            signer: Signer::new(config.credentials, config.signature_kind)?,
            callback_url: config.callback_url,
            use_validation_api: config.use_validation_api,
            poll_policy: config.poll_policy,
            transport,
        })
    }

    pub const fn base(&self) -> &Url {
        &self.base
    }

    pub const fn signer(&self) -> &Signer {
        &self.signer
    }

    pub fn partner_id(&self) -> &str {
        self.signer.partner_id()
    }

    pub const fn poll_policy(&self) -> &PollPolicy {
        &self.poll_policy
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// # Errors
    ///
    /// Will return `Err` if the URL cannot be a base.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, ApiClientError> {
        let mut url = self.base.clone();
        let url_clone = url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiClientError::CannotBeBase(url_clone))?
            .pop_if_empty()
            .push(endpoint);
        Ok(url)
    }

    fn check(url: &Url, response: HttpResponse) -> Result<HttpResponse, ApiClientError> {
        if response.is_success() {
            return Ok(response);
        }
        log::error!("{url} answered {}", response.status);
        Err(ApiClientError::from(RequestFailure::new(
            url.clone(),
            response.status,
            response.body,
        )))
    }

    fn parse<R: DeserializeOwned>(url: &Url, response: &HttpResponse) -> Result<R, ApiClientError> {
        serde_json::from_str(&response.body).map_err(|e| {
            log::error!("Failed to parse JSON response: {e}");
            log::error!("Response text: {}", response.body);
            ApiClientError::from(RequestFailure::new(
                url.clone(),
                response.status,
                format!("Failed to parse JSON response: {e}"),
            ))
        })
    }

    fn post(&self, url: &Url, payload: &Value) -> Result<HttpResponse, ApiClientError> {
        let response = self.transport.post_json(url, payload)?;
        Self::check(url, response)
    }

    /// Supported countries and id types.
    ///
    /// # Errors
    ///
    /// Will return `Err` on network error or a non-2xx answer.
    pub fn get_services(&self) -> Result<ServicesCatalog, ApiClientError> {
        let url = self.endpoint_url("services")?;
        let response = Self::check(&url, self.transport.get(&url)?)?;
        Self::parse(&url, &response)
    }

    /// Token for the hosted web integration.
    ///
    /// Falls back to the configured callback URL when none is given.
    ///
    /// # Errors
    ///
    /// Will return `Err` on network error or a non-2xx answer.
    pub fn get_web_token(
        &self,
        user_id: &str,
        job_id: &str,
        product: &str,
        timestamp: Option<&str>,
        callback_url: Option<&str>,
    ) -> Result<Value, ApiClientError> {
        let callback_url = callback_url.or_else(|| self.callback_url.as_ref().map(Url::as_str));
        let signature = self.signer.sign(timestamp)?;
        let url = self.endpoint_url("token")?;
        let payload = payload::web_token(
            self.partner_id(),
            user_id,
            job_id,
            product,
            callback_url,
            &signature,
        )?;
        let response = self.post(&url, &payload)?;
        Self::parse(&url, &response)
    }

    /// One verified job status query, signing afresh unless a signature is
    /// given.
    ///
    /// # Errors
    ///
    /// Will return `Err` on network error, a non-2xx answer or a response
    /// whose signature does not verify.
    pub fn get_job_status(
        &self,
        user_id: &str,
        job_id: &str,
        options: &Options,
        signature: Option<SignatureParams>,
    ) -> Result<JobStatusResponse, ApiClientError> {
        if user_id.is_empty() {
            return Err(ValidationError::invalid("user_id", "Please make sure that user_id is included").into());
        }
        if job_id.is_empty() {
            return Err(ValidationError::invalid("job_id", "Please make sure that job_id is included").into());
        }
        let signature = match signature {
            Some(signature) => signature,
            None => self.signer.sign(None)?,
        };
        self.query_job_status(user_id, job_id, options, &signature)
    }

    /// # Errors
    ///
    /// Will return `Err` on network error, a non-2xx answer or a response
    /// whose signature does not verify.
    pub fn query_job_status(
        &self,
        user_id: &str,
        job_id: &str,
        options: &Options,
        signature: &SignatureParams,
    ) -> Result<JobStatusResponse, ApiClientError> {
        let url = self.endpoint_url("job_status")?;
        let payload = payload::job_status(
            self.partner_id(),
            user_id,
            job_id,
            options.return_images,
            options.return_history,
            signature,
        )?;
        let response = self.post(&url, &payload)?;
        let status: JobStatusResponse = Self::parse(&url, &response)?;

        let claimed = if status.signature.is_empty() {
            status
                .rest
                .get("sec_key")
                .and_then(Value::as_str)
                .unwrap_or_default()
        } else {
            status.signature.as_str()
        };
        if !self.signer.verify(&status.timestamp, claimed) {
            log::error!("Unable to confirm validity of the job_status response for job {job_id}");
            return Err(ApiClientError::UnverifiedResponse {
                url,
                status: response.status,
                body: response.body,
            });
        }

        log::debug!(
            "Job {job_id}: job_complete={}, job_success={}",
            status.job_complete,
            status.job_success
        );
        Ok(status)
    }

    /// Submits one job, routed by its job type.
    ///
    /// Enhanced KYC and business verification are synchronous lookups.
    /// Every other job type uploads a bundle and, when
    /// `return_job_status` is set, polls until the job completes. Upload
    /// jobs without options poll.
    ///
    /// # Errors
    ///
    /// Will return `Err` on invalid input, before any request is made, or
    /// on network error, a non-2xx answer or an unverifiable job status.
    pub fn submit_job(
        &self,
        partner_params: &PartnerParams,
        images: &[ImageParams],
        id_info: &IdInfo,
        options: Option<&Options>,
    ) -> Result<JobOutcome, ApiClientError> {
        self.submit_job_with_cancel(
            partner_params,
            images,
            id_info,
            options,
            &CancelToken::new(),
        )
    }

    /// [`Self::submit_job`], with a token that stops the status polling.
    ///
    /// # Errors
    ///
    /// As [`Self::submit_job`], and when cancelled while polling.
    pub fn submit_job_with_cancel(
        &self,
        partner_params: &PartnerParams,
        images: &[ImageParams],
        id_info: &IdInfo,
        options: Option<&Options>,
        cancel: &CancelToken,
    ) -> Result<JobOutcome, ApiClientError> {
        log::info!(
            "Submitting job {} for user {} ({})",
            partner_params.job_id,
            partner_params.user_id,
            partner_params.job_type
        );

        if !partner_params.job_type.is_lookup() {
            return self.submit_upload(partner_params, images, id_info, options, cancel);
        }
        let response = if partner_params.job_type == JobType::BusinessVerification {
            self.submit_business_verification(partner_params, id_info)?
        } else {
            self.submit_id_verification(partner_params, id_info)?
        };
        Ok(JobOutcome::Lookup(response))
    }

    /// Synchronous ID lookup.
    ///
    /// # Errors
    ///
    /// Fails unless the job type is enhanced KYC and the id info is
    /// present and valid, or on network error or a non-2xx answer.
    pub fn submit_id_verification(
        &self,
        partner_params: &PartnerParams,
        id_info: &IdInfo,
    ) -> Result<Value, ApiClientError> {
        self.submit_lookup(partner_params, id_info, JobType::EnhancedKyc, "id_verification")
    }

    /// Synchronous business registration lookup.
    ///
    /// # Errors
    ///
    /// Fails unless the job type is business verification and the id info
    /// is present and valid, or on network error or a non-2xx answer.
    pub fn submit_business_verification(
        &self,
        partner_params: &PartnerParams,
        id_info: &IdInfo,
    ) -> Result<Value, ApiClientError> {
        self.submit_lookup(
            partner_params,
            id_info,
            JobType::BusinessVerification,
            "business_verification",
        )
    }

    fn submit_lookup(
        &self,
        partner_params: &PartnerParams,
        id_info: &IdInfo,
        expected: JobType,
        endpoint: &str,
    ) -> Result<Value, ApiClientError> {
        if partner_params.job_type != expected {
            return Err(ValidationError::invalid(
                "job_type",
                format!(
                    "Please ensure that you are setting your job_type to {} for {endpoint}",
                    expected.code()
                ),
            )
            .into());
        }
        if id_info.is_empty() {
            return Err(ValidationError::invalid(
                "id_info",
                format!(
                    "id_info cannot be null or empty for job_type: {}",
                    expected.code()
                ),
            )
            .into());
        }
        self.validate_id_info(id_info, partner_params)?;

        let signature = self.signer.sign(None)?;
        let url = self.endpoint_url(endpoint)?;
        let payload = payload::id_verification(self.partner_id(), partner_params, id_info, &signature)?;
        let response = self.post(&url, &payload)?;
        log::info!("Job {} answered by {url}", partner_params.job_id);
        Self::parse(&url, &response)
    }

    fn submit_upload(
        &self,
        partner_params: &PartnerParams,
        images: &[ImageParams],
        id_info: &IdInfo,
        options: Option<&Options>,
        cancel: &CancelToken,
    ) -> Result<JobOutcome, ApiClientError> {
        let options = options.cloned().unwrap_or_else(Options::synchronous);
        let id_info = if id_info.is_empty() && partner_params.job_type == JobType::BiometricKyc {
            IdInfo::biometric_placeholder()
        } else {
            id_info.clone()
        };

        validation::validate_images(images, options.use_enrolled_image, partner_params.job_type)?;
        let callback_url = self.callback_for(&options)?;
        validation::validate_return_data(callback_url.as_ref(), &options)?;
        self.validate_id_info(&id_info, partner_params)?;

        let signature = self.signer.sign(None)?;

        let prep_url = self.endpoint_url("upload")?;
        let payload = payload::prep_upload(
            self.partner_id(),
            partner_params,
            callback_url.as_ref(),
            options.use_enrolled_image,
            &signature,
        )?;
        let response = self.post(&prep_url, &payload)?;
        let prep: PrepUploadResponse = Self::parse(&prep_url, &response)?;
        log::info!(
            "Job {} registered as {}",
            partner_params.job_id,
            prep.smile_job_id
        );

        let upload_url = Url::parse(&prep.upload_url)?;
        let manifest = payload::manifest(
            self.partner_id(),
            partner_params,
            callback_url.as_ref(),
            &upload_url,
            &id_info,
            images,
            &signature,
        )?;
        let bundle = bundle::build_zip(&manifest, images)?;
        Self::check(&upload_url, self.transport.put_zip(&upload_url, bundle)?)?;
        log::info!("Job {} uploaded", partner_params.job_id);

        if !options.return_job_status {
            return Ok(JobOutcome::Submitted {
                smile_job_id: prep.smile_job_id,
            });
        }

        poll_job_status(
            self,
            &partner_params.user_id,
            &partner_params.job_id,
            &options,
            &signature,
            cancel,
        )
        .map(JobOutcome::Polled)
    }

    fn validate_id_info(
        &self,
        id_info: &IdInfo,
        partner_params: &PartnerParams,
    ) -> Result<(), ApiClientError> {
        validation::validate_id_info_params(id_info, partner_params)?;

        if self.use_validation_api
            && (partner_params.job_type.is_document_verification() || id_info.entered())
        {
            let catalog = self.get_services()?;
            validation::validate_id_info_against_catalog(&catalog, id_info, partner_params)?;
        }
        Ok(())
    }

    fn callback_for(&self, options: &Options) -> Result<Option<Url>, ApiClientError> {
        match options.optional_callback.as_deref() {
            Some(raw) => Url::parse(raw).map(Some).map_err(|_| {
                ApiClientError::from(ValidationError::invalid(
                    "optional_callback",
                    format!("optional_callback {raw} is not a valid URL"),
                ))
            }),
            None => Ok(self.callback_url.clone()),
        }
    }
}
