use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::types::{ImageType, JobType};
use crate::validation::{self, ValidationError};

/// Identifies one job: who it is for, its partner-side id and the product.
///
/// Extra keys are passed through to the server untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct PartnerParams {
    pub user_id: String,
    pub job_id: String,
    pub job_type: JobType,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PartnerParams {
    /// # Errors
    ///
    /// Fails if `user_id` or `job_id` is empty.
    pub fn new(
        user_id: impl Into<String>,
        job_id: impl Into<String>,
        job_type: JobType,
    ) -> Result<Self, ValidationError> {
        Self::from_value(&serde_json::json!({
            "user_id": user_id.into(),
            "job_id": job_id.into(),
            "job_type": job_type,
        }))
    }

    /// Parses loosely typed partner params, e.g. from a job file.
    ///
    /// # Errors
    ///
    /// See [`validation::validate_partner_params`].
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        validation::validate_partner_params(value)?;

        let mut map = value.as_object().cloned().unwrap_or_default();
        let user_id = take_string(&mut map, "user_id");
        let job_id = take_string(&mut map, "job_id");
        let job_type = map
            .remove("job_type")
            .and_then(|v| v.as_u64())
            .and_then(JobType::from_code)
            .ok_or_else(|| ValidationError::invalid("job_type", "Please ensure job_type is a number"))?;

        Ok(Self {
            user_id,
            job_id,
            job_type,
            extra: map,
        })
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Looks a key up the way the server sees the serialized params.
    pub fn lookup(&self, key: &str) -> Option<Value> {
        match key {
            "user_id" => Some(Value::from(self.user_id.as_str())),
            "job_id" => Some(Value::from(self.job_id.as_str())),
            "job_type" => Some(Value::from(self.job_type.code())),
            _ => self.extra.get(key).cloned(),
        }
    }
}

impl TryFrom<Value> for PartnerParams {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> String {
    match map.remove(key) {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}

/// Free-form identity fields (country, id_type, id_number, names, dob, ...).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdInfo(Map<String, Value>);

impl IdInfo {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Whether the caller asked for the ID fields to be checked.
    ///
    /// Accepts `true`, a non-zero number or the string `"true"` in any case.
    pub fn entered(&self) -> bool {
        match self.0.get("entered") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            Some(Value::Number(n)) => n.as_f64().map_or(false, |n| n != 0.0),
            _ => false,
        }
    }

    /// Id info sent with a biometric KYC job that carries none.
    pub fn biometric_placeholder() -> Self {
        let mut info = Self::new();
        for key in [
            "first_name",
            "middle_name",
            "last_name",
            "country",
            "id_type",
            "id_number",
            "dob",
            "phone_number",
        ] {
            info.insert(key, Value::Null);
        }
        info.with("entered", false)
    }
}

impl From<Map<String, Value>> for IdInfo {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// One image of a job. Exactly one of `image` and `file_name` must be set,
/// see [`validation::validate_images`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageParams {
    pub image_type_id: ImageType,
    /// Base64 encoded image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImagePayload<'a> {
    File(&'a Path),
    Inline(&'a str),
}

impl ImageParams {
    pub fn file(image_type_id: ImageType, path: impl Into<PathBuf>) -> Self {
        Self {
            image_type_id,
            image: None,
            file_name: Some(path.into()),
        }
    }

    pub fn inline(image_type_id: ImageType, base64: impl Into<String>) -> Self {
        Self {
            image_type_id,
            image: Some(base64.into()),
            file_name: None,
        }
    }

    /// The representation in use, ignoring empty values. A file path wins
    /// if both are set; validation rejects that case before it matters.
    pub fn payload(&self) -> Option<ImagePayload<'_>> {
        if let Some(path) = self.file_name.as_deref() {
            if !path.as_os_str().is_empty() {
                return Some(ImagePayload::File(path));
            }
        }
        self.image
            .as_deref()
            .filter(|data| !data.is_empty())
            .map(ImagePayload::Inline)
    }
}

/// Response shape and delivery options of a job.
///
/// Defaults are all `false`. [`Options::synchronous`] is what upload jobs use
/// when the caller does not pass any options.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct Options {
    pub return_job_status: bool,
    pub return_history: bool,
    pub return_images: bool,
    pub use_enrolled_image: bool,
    /// Callback URL for this job only, overrides the client's callback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional_callback: Option<String>,
}

impl Options {
    /// Waits for the job result by polling the job status endpoint.
    pub fn synchronous() -> Self {
        Self {
            return_job_status: true,
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// See [`validation::validate_options`].
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        validation::validate_options(value)?;

        let flag = |key: &str| value.get(key).and_then(Value::as_bool).unwrap_or(false);
        Ok(Self {
            return_job_status: flag("return_job_status"),
            return_history: flag("return_history"),
            return_images: flag("return_images"),
            use_enrolled_image: flag("use_enrolled_image"),
            optional_callback: value
                .get("optional_callback")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
        })
    }
}

impl TryFrom<Value> for Options {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partner_params_keep_extra_keys() {
        let params = PartnerParams::from_value(&json!({
            "user_id": "u1",
            "job_id": "j1",
            "job_type": 1,
            "company": "ACME",
        }))
        .unwrap();

        assert_eq!(params.job_type, JobType::BiometricKyc);
        assert_eq!(params.lookup("company"), Some(json!("ACME")));
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"user_id": "u1", "job_id": "j1", "job_type": 1, "company": "ACME"})
        );
    }

    #[test]
    fn test_partner_params_deserialize_validates() {
        let err = serde_json::from_value::<PartnerParams>(json!({
            "user_id": "u1",
            "job_id": "",
            "job_type": 1,
        }));
        assert!(err.is_err());

        let ok: PartnerParams = serde_json::from_value(json!({
            "user_id": "u1",
            "job_id": "j1",
            "job_type": 5,
        }))
        .unwrap();
        assert_eq!(ok.job_type, JobType::EnhancedKyc);
    }

    #[test]
    fn test_partner_params_new_rejects_empty_ids() {
        assert!(PartnerParams::new("", "j1", JobType::EnhancedKyc).is_err());
        assert!(PartnerParams::new("u1", "j1", JobType::EnhancedKyc).is_ok());
    }

    #[test]
    fn test_entered_flag_is_boolean_like() {
        assert!(IdInfo::new().with("entered", true).entered());
        assert!(IdInfo::new().with("entered", "TRUE").entered());
        assert!(IdInfo::new().with("entered", 1).entered());
        assert!(!IdInfo::new().with("entered", "false").entered());
        assert!(!IdInfo::new().with("entered", false).entered());
        assert!(!IdInfo::new().entered());
    }

    #[test]
    fn test_biometric_placeholder_is_not_entered() {
        let info = IdInfo::biometric_placeholder();
        assert!(!info.entered());
        assert_eq!(info.get("country"), Some(&Value::Null));
        assert_eq!(info.as_map().len(), 9);
    }

    #[test]
    fn test_image_payload_ignores_empty_values() {
        let image = ImageParams {
            image_type_id: ImageType::SelfieBase64,
            image: Some("aGVsbG8=".to_owned()),
            file_name: Some(PathBuf::new()),
        };
        assert_eq!(image.payload(), Some(ImagePayload::Inline("aGVsbG8=")));

        let image = ImageParams::file(ImageType::SelfieFile, "selfie.jpg");
        assert_eq!(
            image.payload(),
            Some(ImagePayload::File(Path::new("selfie.jpg")))
        );
    }

    #[test]
    fn test_options_from_value() {
        let options = Options::from_value(&json!({
            "return_job_status": true,
            "return_images": true,
            "optional_callback": "https://example.com/hook",
        }))
        .unwrap();

        assert!(options.return_job_status);
        assert!(options.return_images);
        assert!(!options.return_history);
        assert_eq!(
            options.optional_callback.as_deref(),
            Some("https://example.com/hook")
        );
    }

    #[test]
    fn test_options_reject_non_boolean_flags() {
        let err = Options::from_value(&json!({"return_history": "yes"})).unwrap_err();
        assert_eq!(err.field(), Some("return_history"));
        assert!(err.to_string().contains("return_history needs to be a boolean"));
    }
}
