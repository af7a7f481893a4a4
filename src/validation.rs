//! Checks run on job parameters before anything is signed or sent.
//!
//! Every function here is pure apart from [`validate_images`], which looks
//! for image files on disk. Failures name the first offending field.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::{collections::HashSet, path::PathBuf};
use thiserror::Error;
use url::Url;

use crate::api::payload::{basename, MANIFEST_FILE_NAME};
use crate::api::ServicesCatalog;
use crate::params::{IdInfo, ImagePayload, ImageParams, Options, PartnerParams};
use crate::signature::SignatureParams;
use crate::types::JobType;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("[E001] {message}")]
    InvalidArgument { field: String, message: String },

    #[error("[E003] No such file or directory {}\n\nSuggestions:\n  • Check the image path, relative paths resolve from the working directory\n  • Use a base64 image type to send the image inline", .0.display())]
    FileNotFound(PathBuf),
}

impl ValidationError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The rejected field, if the error is about one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidArgument { field, .. } => Some(field),
            Self::FileNotFound(_) => None,
        }
    }

    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "E001",
            Self::FileNotFound(_) => "E003",
        }
    }
}

lazy_static! {
    static ref COUNTRY_CODE_REGEX: Result<Regex, regex::Error> = Regex::new(r"^[A-Z]{2}$");
}

fn is_country_code(raw: &str) -> bool {
    COUNTRY_CODE_REGEX
        .as_ref()
        .map_or(false, |regex| regex.is_match(raw))
}

/// Null, empty strings and empty collections count as missing.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(Value::Bool(_) | Value::Number(_)) => false,
    }
}

/// # Errors
///
/// Rejects empty input, a missing `user_id`, `job_id` or `job_type`,
/// non-string ids and a `job_type` that is not a known integer code.
pub fn validate_partner_params(partner_params: &Value) -> Result<(), ValidationError> {
    let Some(map) = partner_params.as_object().filter(|map| !map.is_empty()) else {
        return Err(ValidationError::invalid(
            "partner_params",
            "Please ensure that you send through partner params",
        ));
    };

    for key in ["user_id", "job_id", "job_type"] {
        if is_blank(map.get(key)) {
            return Err(ValidationError::invalid(
                key,
                format!("Partner Parameter Arguments may not be null or empty, missing {key}"),
            ));
        }
    }

    for key in ["user_id", "job_id"] {
        if !map.get(key).map_or(false, Value::is_string) {
            return Err(ValidationError::invalid(
                key,
                format!("Please ensure {key} is a string"),
            ));
        }
    }

    let job_type = map.get("job_type").and_then(Value::as_u64).ok_or_else(|| {
        ValidationError::invalid("job_type", "Please ensure job_type is a number")
    })?;
    if JobType::from_code(job_type).is_none() {
        return Err(ValidationError::invalid(
            "job_type",
            format!("job_type {job_type} is not a supported job type"),
        ));
    }

    Ok(())
}

/// # Errors
///
/// Document verification jobs always need `country` and `id_type`. Any
/// other job is only checked when `entered` is set, and then needs
/// `country`, `id_type` and `id_number`. The country must be an ISO 3166-1
/// alpha-2 code.
pub fn validate_id_info_params(
    id_info: &IdInfo,
    partner_params: &PartnerParams,
) -> Result<(), ValidationError> {
    let required: &[&str] = if partner_params.job_type.is_document_verification() {
        &["country", "id_type"]
    } else if id_info.entered() {
        &["country", "id_type", "id_number"]
    } else {
        return Ok(());
    };

    for key in required {
        if is_blank(id_info.get(key)) {
            return Err(ValidationError::invalid(
                *key,
                format!("key {key} cannot be empty"),
            ));
        }
    }

    if !id_info.get_str("country").map_or(false, is_country_code) {
        return Err(ValidationError::invalid(
            "country",
            "key country must be a valid 2-letter ISO 3166-1 alpha-2 country code.",
        ));
    }

    Ok(())
}

/// Cross-checks the id info against the supported services catalog.
///
/// # Errors
///
/// Fails if the country or the id type is not offered, or if a field the
/// catalog requires is absent from both the id info and the partner params
/// or is empty.
pub fn validate_id_info_against_catalog(
    catalog: &ServicesCatalog,
    id_info: &IdInfo,
    partner_params: &PartnerParams,
) -> Result<(), ValidationError> {
    let country = id_info.get_str("country").unwrap_or_default();
    let id_types = catalog.id_types.get(country).ok_or_else(|| {
        ValidationError::invalid("country", format!("country {country} is invalid"))
    })?;

    let id_type = id_info.get_str("id_type").unwrap_or_default();
    let fields = id_types.get(id_type).ok_or_else(|| {
        ValidationError::invalid("id_type", format!("id_type {id_type} is invalid"))
    })?;

    for field in fields {
        let value = id_info
            .get(field)
            .cloned()
            .or_else(|| partner_params.lookup(field));
        match value {
            None => {
                return Err(ValidationError::invalid(
                    field.as_str(),
                    format!("key {field} is required"),
                ))
            }
            Some(value) if is_blank(Some(&value)) => {
                return Err(ValidationError::invalid(
                    field.as_str(),
                    format!("key {field} cannot be empty"),
                ))
            }
            Some(_) => {}
        }
    }

    Ok(())
}

/// # Errors
///
/// Each image needs exactly one representation, matching its type, and
/// file paths must exist. File names must be unique within the job and
/// cannot clash with the bundle manifest. Document verification needs an
/// ID card image.
/// A selfie is needed unless the job is a document verification using the
/// enrolled image.
pub fn validate_images(
    images: &[ImageParams],
    use_enrolled_image: bool,
    job_type: JobType,
) -> Result<(), ValidationError> {
    if images.is_empty() {
        return Err(ValidationError::invalid(
            "images",
            "Please ensure that you send through image details",
        ));
    }

    let mut has_id_image = false;
    let mut has_selfie = false;
    let mut bundled = HashSet::from([MANIFEST_FILE_NAME]);

    for (index, image) in images.iter().enumerate() {
        let field = format!("images[{index}]");
        let has_inline = image.image.as_deref().map_or(false, |s| !s.is_empty());
        let has_file = image
            .file_name
            .as_deref()
            .map_or(false, |p| !p.as_os_str().is_empty());

        if has_inline && has_file {
            return Err(ValidationError::invalid(
                field,
                "image and file_name both can't exist",
            ));
        }

        match image.payload() {
            None => {
                return Err(ValidationError::invalid(
                    field,
                    "image or file_name keys both can't be empty",
                ))
            }
            Some(ImagePayload::Inline(_)) if image.image_type_id.is_file() => {
                return Err(ValidationError::invalid(
                    field,
                    "check for image_type_id and image file mismatch",
                ))
            }
            Some(ImagePayload::File(_)) if image.image_type_id.is_inline() => {
                return Err(ValidationError::invalid(
                    field,
                    "check for image_type_id and base64 image mismatch",
                ))
            }
            Some(ImagePayload::File(path)) if !path.exists() => {
                return Err(ValidationError::FileNotFound(path.to_path_buf()))
            }
            Some(ImagePayload::File(path)) => {
                let name = basename(path)?;
                if !bundled.insert(name) {
                    return Err(ValidationError::invalid(
                        field,
                        format!("file name {name} is already used in this job, rename the file"),
                    ));
                }
            }
            Some(ImagePayload::Inline(_)) => {}
        }

        has_id_image |= image.image_type_id.is_id_card();
        has_selfie |= image.image_type_id.is_selfie();
    }

    let is_docv_job = job_type.is_document_verification();
    if is_docv_job && !has_id_image {
        return Err(ValidationError::invalid(
            "images",
            "You are attempting to complete a Document Verification job without providing an id card image.",
        ));
    }

    if !(has_selfie || (is_docv_job && use_enrolled_image)) {
        return Err(ValidationError::invalid(
            "images",
            "You need to send through at least one selfie image.",
        ));
    }

    Ok(())
}

/// # Errors
///
/// Every option except `optional_callback` must be a boolean.
pub fn validate_options(options: &Value) -> Result<(), ValidationError> {
    let Some(map) = options.as_object() else {
        return Err(ValidationError::invalid(
            "options",
            "Please ensure options are sent as an object",
        ));
    };

    for (key, value) in map {
        if key == "optional_callback" {
            if !(value.is_null() || value.is_string()) {
                return Err(ValidationError::invalid(
                    key.as_str(),
                    "optional_callback needs to be a string",
                ));
            }
            continue;
        }
        if !value.is_boolean() {
            return Err(ValidationError::invalid(
                key.as_str(),
                format!("{key} needs to be a boolean"),
            ));
        }
    }

    Ok(())
}

/// # Errors
///
/// The caller needs a callback URL or a synchronous job status to ever see
/// the result.
pub fn validate_return_data(
    callback_url: Option<&Url>,
    options: &Options,
) -> Result<(), ValidationError> {
    if callback_url.is_none() && !options.return_job_status {
        return Err(ValidationError::invalid(
            "callback_url",
            "Please choose to either get your response via the callback or job status query",
        ));
    }
    Ok(())
}

/// # Errors
///
/// Both the signature and its timestamp must be present.
pub fn validate_signature_params(signature: &SignatureParams) -> Result<(), ValidationError> {
    if signature.value().is_empty() {
        return Err(ValidationError::invalid(
            signature.field_name(),
            format!(
                "Missing key, must provide a '{}' field",
                signature.field_name()
            ),
        ));
    }
    if signature.timestamp().is_empty() {
        return Err(ValidationError::invalid(
            "timestamp",
            "Missing 'timestamp' field",
        ));
    }
    Ok(())
}
