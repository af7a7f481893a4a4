//! Wire payloads for each endpoint family.
//!
//! Builders are pure. Each one checks the signature it is given before
//! assembling anything.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::path::Path;
use url::Url;

use crate::params::{IdInfo, ImageParams, ImagePayload, PartnerParams};
use crate::signature::SignatureParams;
use crate::types::ImageType;
use crate::validation::{validate_signature_params, ValidationError};

use super::errors::ApiClientError;

pub const SOURCE_SDK: &str = "rust";
pub const SOURCE_SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the bundle announced in the pre-upload request and manifest.
pub const UPLOAD_FILE_NAME: &str = "selfie.zip";
/// Name of the manifest entry inside the bundle.
pub const MANIFEST_FILE_NAME: &str = "info.json";

#[derive(Serialize)]
struct LookupRequest<'a> {
    partner_id: &'a str,
    partner_params: &'a PartnerParams,
    source_sdk: &'static str,
    source_sdk_version: &'static str,
}

#[derive(Serialize)]
struct PrepUploadRequest<'a> {
    file_name: &'static str,
    smile_client_id: &'a str,
    partner_params: &'a PartnerParams,
    model_parameters: Map<String, Value>,
    callback_url: Option<&'a str>,
    use_enrolled_image: bool,
    source_sdk: &'static str,
    source_sdk_version: &'static str,
}

#[derive(Serialize)]
struct JobStatusRequest<'a> {
    partner_id: &'a str,
    job_id: &'a str,
    user_id: &'a str,
    image_links: bool,
    history: bool,
}

#[derive(Serialize)]
struct WebTokenRequest<'a> {
    user_id: &'a str,
    job_id: &'a str,
    product: &'a str,
    callback_url: Option<&'a str>,
    partner_id: &'a str,
}

#[derive(Serialize)]
struct ManifestImage<'a> {
    image_type_id: ImageType,
    image: &'a str,
    file_name: &'a str,
}

/// Serializes `body` and adds the signature fields next to its own.
fn signed<T: Serialize>(body: &T, signature: &SignatureParams) -> Result<Value, ApiClientError> {
    validate_signature_params(signature)?;
    let mut value = serde_json::to_value(body)?;
    if let Value::Object(map) = &mut value {
        insert_signature(map, signature);
    }
    Ok(value)
}

fn insert_signature(map: &mut Map<String, Value>, signature: &SignatureParams) {
    map.insert("timestamp".to_owned(), signature.timestamp().into());
    map.insert(signature.field_name().to_owned(), signature.value().into());
}

/// Body of an ID lookup or business verification request.
///
/// The id info fields sit at the top level, next to the partner params.
///
/// # Errors
///
/// Fails if the signature or its timestamp is missing.
pub fn id_verification(
    partner_id: &str,
    partner_params: &PartnerParams,
    id_info: &IdInfo,
    signature: &SignatureParams,
) -> Result<Value, ApiClientError> {
    let mut payload = signed(
        &LookupRequest {
            partner_id,
            partner_params,
            source_sdk: SOURCE_SDK,
            source_sdk_version: SOURCE_SDK_VERSION,
        },
        signature,
    )?;
    if let Value::Object(map) = &mut payload {
        for (key, value) in id_info.as_map() {
            map.insert(key.clone(), value.clone());
        }
    }
    Ok(payload)
}

/// Body of the request that reserves an upload URL.
///
/// # Errors
///
/// Fails if the signature or its timestamp is missing.
pub fn prep_upload(
    partner_id: &str,
    partner_params: &PartnerParams,
    callback_url: Option<&Url>,
    use_enrolled_image: bool,
    signature: &SignatureParams,
) -> Result<Value, ApiClientError> {
    signed(
        &PrepUploadRequest {
            file_name: UPLOAD_FILE_NAME,
            smile_client_id: partner_id,
            partner_params,
            model_parameters: Map::new(),
            callback_url: callback_url.map(Url::as_str),
            use_enrolled_image,
            source_sdk: SOURCE_SDK,
            source_sdk_version: SOURCE_SDK_VERSION,
        },
        signature,
    )
}

/// Body of one job status query.
///
/// # Errors
///
/// Fails if the signature or its timestamp is missing.
pub fn job_status(
    partner_id: &str,
    user_id: &str,
    job_id: &str,
    return_images: bool,
    return_history: bool,
    signature: &SignatureParams,
) -> Result<Value, ApiClientError> {
    signed(
        &JobStatusRequest {
            partner_id,
            job_id,
            user_id,
            image_links: return_images,
            history: return_history,
        },
        signature,
    )
}

/// Body of a web token request.
///
/// # Errors
///
/// Fails if the signature or its timestamp is missing.
pub fn web_token(
    partner_id: &str,
    user_id: &str,
    job_id: &str,
    product: &str,
    callback_url: Option<&str>,
    signature: &SignatureParams,
) -> Result<Value, ApiClientError> {
    signed(
        &WebTokenRequest {
            user_id,
            job_id,
            product,
            callback_url,
            partner_id,
        },
        signature,
    )
}

/// The `info.json` manifest packaged with the images.
///
/// File backed images are referenced by basename and travel as separate
/// entries. Inline images are embedded here.
///
/// # Errors
///
/// Fails if the signature or its timestamp is missing, or if an image has
/// no usable representation.
pub fn manifest(
    partner_id: &str,
    partner_params: &PartnerParams,
    callback_url: Option<&Url>,
    upload_url: &Url,
    id_info: &IdInfo,
    images: &[ImageParams],
    signature: &SignatureParams,
) -> Result<Value, ApiClientError> {
    validate_signature_params(signature)?;

    let images = images
        .iter()
        .enumerate()
        .map(|(index, image)| manifest_image(index, image))
        .collect::<Result<Vec<_>, _>>()?;

    let mut misc_information = json!({
        "retry": "false",
        "partner_params": partner_params,
        "file_name": UPLOAD_FILE_NAME,
        "smile_client_id": partner_id,
        "callback_url": callback_url.map(Url::as_str),
        "userData": {
            "isVerifiedProcess": false,
            "name": "",
            "fbUserID": "",
            "firstName": "",
            "lastName": "",
            "gender": "",
            "email": "",
            "phone": "",
            "countryCode": "+",
            "countryName": "",
        },
    });
    if let Value::Object(map) = &mut misc_information {
        insert_signature(map, signature);
    }

    Ok(json!({
        "package_information": {
            "apiVersion": {
                "buildNumber": 0,
                "majorVersion": 2,
                "minorVersion": 0,
            },
            "language": SOURCE_SDK,
        },
        "misc_information": misc_information,
        "id_info": id_info,
        "images": images,
        "server_information": upload_url.as_str(),
    }))
}

fn manifest_image(index: usize, image: &ImageParams) -> Result<ManifestImage<'_>, ValidationError> {
    match image.payload() {
        Some(ImagePayload::File(path)) => Ok(ManifestImage {
            image_type_id: image.image_type_id,
            image: "",
            file_name: basename(path)?,
        }),
        Some(ImagePayload::Inline(data)) => Ok(ManifestImage {
            image_type_id: image.image_type_id,
            image: data,
            file_name: "",
        }),
        None => Err(ValidationError::invalid(
            format!("images[{index}]"),
            "image or file_name keys both can't be empty",
        )),
    }
}

/// Name under which a file backed image is stored in the bundle.
///
/// # Errors
///
/// Fails if the path has no UTF-8 file name.
pub fn basename(path: &Path) -> Result<&str, ValidationError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            ValidationError::invalid(
                "file_name",
                format!("{} has no usable file name", path.display()),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{Credentials, Signer, SignatureKind};
    use crate::types::JobType;
    use pretty_assertions::assert_eq;

    const TIMESTAMP: &str = "2024-01-01T12:00:00.000000+00:00";

    fn signature() -> SignatureParams {
        let credentials = Credentials::new("001", "secret-api-key").unwrap();
        Signer::new(credentials, SignatureKind::Signature)
            .unwrap()
            .sign(Some(TIMESTAMP))
            .unwrap()
    }

    fn partner_params(job_type: JobType) -> PartnerParams {
        PartnerParams::new("u1", "j1", job_type).unwrap()
    }

    #[test]
    fn test_id_verification_merges_id_info_at_top_level() {
        let id_info = IdInfo::new()
            .with("country", "NG")
            .with("id_type", "BVN")
            .with("id_number", "00000000000");
        let payload = id_verification(
            "001",
            &partner_params(JobType::EnhancedKyc),
            &id_info,
            &signature(),
        )
        .unwrap();

        assert_eq!(payload["partner_id"], "001");
        assert_eq!(payload["country"], "NG");
        assert_eq!(payload["id_number"], "00000000000");
        assert_eq!(payload["timestamp"], TIMESTAMP);
        assert_eq!(payload["signature"], signature().value());
        assert_eq!(payload["partner_params"]["job_type"], 5);
        assert_eq!(payload["source_sdk"], SOURCE_SDK);
    }

    #[test]
    fn test_prep_upload_payload() {
        let callback = Url::parse("https://example.com/callback").unwrap();
        let payload = prep_upload(
            "001",
            &partner_params(JobType::BiometricKyc),
            Some(&callback),
            false,
            &signature(),
        )
        .unwrap();

        assert_eq!(payload["file_name"], "selfie.zip");
        assert_eq!(payload["smile_client_id"], "001");
        assert_eq!(payload["model_parameters"], json!({}));
        assert_eq!(payload["callback_url"], "https://example.com/callback");
        assert_eq!(payload["use_enrolled_image"], false);
        assert_eq!(payload["signature"], signature().value());
    }

    #[test]
    fn test_job_status_payload() {
        let payload = job_status("001", "u1", "j1", true, false, &signature()).unwrap();
        assert_eq!(
            payload,
            json!({
                "partner_id": "001",
                "user_id": "u1",
                "job_id": "j1",
                "image_links": true,
                "history": false,
                "timestamp": TIMESTAMP,
                "signature": signature().value(),
            })
        );
    }

    #[test]
    fn test_missing_signature_is_rejected() {
        let empty = SignatureParams::Signature {
            timestamp: TIMESTAMP.to_owned(),
            signature: String::new(),
        };
        let err = job_status("001", "u1", "j1", false, false, &empty).unwrap_err();
        assert!(err.is_invalid_argument());

        let no_timestamp = SignatureParams::SecKey {
            timestamp: String::new(),
            sec_key: "abc|def".to_owned(),
        };
        let err = web_token("001", "u1", "j1", "biometric_kyc", None, &no_timestamp).unwrap_err();
        assert!(err.to_string().contains("timestamp"));
    }

    #[test]
    fn test_manifest_images_by_representation() {
        let upload_url = Url::parse("https://uploads.example.com/bucket/selfie.zip").unwrap();
        let images = [
            ImageParams::file(ImageType::SelfieFile, "/tmp/photos/selfie.jpg"),
            ImageParams::inline(ImageType::IdCardBase64, "aWRjYXJk"),
        ];
        let manifest = manifest(
            "001",
            &partner_params(JobType::DocumentVerification),
            None,
            &upload_url,
            &IdInfo::new().with("country", "NG"),
            &images,
            &signature(),
        )
        .unwrap();

        assert_eq!(
            manifest["images"],
            json!([
                {"image_type_id": 0, "image": "", "file_name": "selfie.jpg"},
                {"image_type_id": 3, "image": "aWRjYXJk", "file_name": ""},
            ])
        );
        assert_eq!(
            manifest["server_information"],
            "https://uploads.example.com/bucket/selfie.zip"
        );
        assert_eq!(manifest["misc_information"]["retry"], "false");
        assert_eq!(manifest["misc_information"]["timestamp"], TIMESTAMP);
        assert_eq!(manifest["misc_information"]["userData"]["countryCode"], "+");
        assert_eq!(manifest["package_information"]["apiVersion"]["majorVersion"], 2);
        assert_eq!(manifest["id_info"], json!({"country": "NG"}));
    }

    #[test]
    fn test_web_token_payload() {
        let payload = web_token(
            "001",
            "u1",
            "j1",
            "biometric_kyc",
            Some("https://example.com/cb"),
            &signature(),
        )
        .unwrap();
        assert_eq!(payload["product"], "biometric_kyc");
        assert_eq!(payload["callback_url"], "https://example.com/cb");
        assert_eq!(payload["partner_id"], "001");
    }
}
