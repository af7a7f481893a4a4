use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use rsa::{
    pkcs1::DecodeRsaPublicKey, pkcs8::DecodePublicKey, traits::PublicKeyParts, Pkcs1v15Encrypt,
    RsaPublicKey,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Fixed suffix of the signed message, part of the wire contract.
const SIGNATURE_SUFFIX: &[u8] = b"sid_request";

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("[E010] partner_id cannot be null or empty\n\nSuggestions:\n  • Copy the partner id from the Smile ID portal\n  • Keep leading zeros, the id is a string")]
    EmptyPartnerId,

    #[error("[E011] api_key cannot be null or empty\n\nSuggestions:\n  • Generate an api key in the Smile ID portal\n  • Check that the SMILE_API_KEY environment variable is set")]
    EmptyApiKey,

    #[error("[E012] Invalid api key: {0}\n\nSuggestions:\n  • sec_key signing expects a base64 encoded RSA public key\n  • Use the default signature strategy with a plain api key")]
    InvalidKey(String),

    #[error("[E013] partner_id {0} is not numeric, sec_key signing requires a numeric partner id")]
    NonNumericPartnerId(String),

    #[error("[E014] Failed to encrypt sec_key: {0}")]
    Encryption(#[from] rsa::errors::Error),
}

impl SignatureError {
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyPartnerId => "E010",
            Self::EmptyApiKey => "E011",
            Self::InvalidKey(_) => "E012",
            Self::NonNumericPartnerId(_) => "E013",
            Self::Encryption(_) => "E014",
        }
    }
}

/// Long-term partner credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    partner_id: String,
    api_key: String,
}

impl Credentials {
    /// # Errors
    ///
    /// Fails if either value is empty.
    pub fn new(
        partner_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, SignatureError> {
        let partner_id = partner_id.into();
        let api_key = api_key.into();

        if partner_id.trim().is_empty() {
            return Err(SignatureError::EmptyPartnerId);
        }
        if api_key.trim().is_empty() {
            return Err(SignatureError::EmptyApiKey);
        }

        Ok(Self {
            partner_id,
            api_key,
        })
    }

    pub fn partner_id(&self) -> &str {
        &self.partner_id
    }
}

// Never print the key.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("partner_id", &self.partner_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Which authentication token the client attaches to requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SignatureKind {
    /// HMAC-SHA256 `signature` field.
    #[default]
    Signature,
    /// Legacy RSA encrypted `sec_key` field.
    SecKey,
}

/// Time-bound authentication token, flattened into every request body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignatureParams {
    Signature { timestamp: String, signature: String },
    SecKey { timestamp: String, sec_key: String },
}

impl SignatureParams {
    pub fn timestamp(&self) -> &str {
        match self {
            Self::Signature { timestamp, .. } | Self::SecKey { timestamp, .. } => timestamp,
        }
    }

    /// The signature or sec_key value.
    pub fn value(&self) -> &str {
        match self {
            Self::Signature { signature, .. } => signature,
            Self::SecKey { sec_key, .. } => sec_key,
        }
    }

    /// Name of the wire field carrying [`Self::value`].
    pub const fn field_name(&self) -> &'static str {
        match self {
            Self::Signature { .. } => "signature",
            Self::SecKey { .. } => "sec_key",
        }
    }
}

/// Current UTC time in ISO-8601, the format the API expects.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Produces and checks authentication tokens.
///
/// Signing is stateless: every call returns a fresh [`SignatureParams`] and
/// nothing is cached on the signer, so one signer can serve any number of
/// submissions.
#[derive(Clone, Debug)]
pub enum Signer {
    Hmac(Credentials),
    SecKey {
        credentials: Credentials,
        public_key: RsaPublicKey,
    },
}

impl Signer {
    /// # Errors
    ///
    /// For [`SignatureKind::SecKey`] the api key must decode to an RSA
    /// public key (base64 DER, SPKI or PKCS#1, or PEM).
    pub fn new(credentials: Credentials, kind: SignatureKind) -> Result<Self, SignatureError> {
        match kind {
            SignatureKind::Signature => Ok(Self::Hmac(credentials)),
            SignatureKind::SecKey => {
                let public_key = parse_public_key(&credentials.api_key)?;
                Ok(Self::SecKey {
                    credentials,
                    public_key,
                })
            }
        }
    }

    pub const fn credentials(&self) -> &Credentials {
        match self {
            Self::Hmac(credentials) | Self::SecKey { credentials, .. } => credentials,
        }
    }

    pub fn partner_id(&self) -> &str {
        self.credentials().partner_id()
    }

    pub const fn kind(&self) -> SignatureKind {
        match self {
            Self::Hmac(_) => SignatureKind::Signature,
            Self::SecKey { .. } => SignatureKind::SecKey,
        }
    }

    /// # Errors
    ///
    /// Fails only for `sec_key` signing, when the partner id is not
    /// numeric or the encryption fails.
    pub fn sign(&self, timestamp: Option<&str>) -> Result<SignatureParams, SignatureError> {
        let timestamp = timestamp.map_or_else(now_iso8601, str::to_owned);

        match self {
            Self::Hmac(credentials) => {
                let mac = hmac_for(credentials, &timestamp)?;
                Ok(SignatureParams::Signature {
                    signature: STANDARD.encode(mac.finalize().into_bytes()),
                    timestamp,
                })
            }
            Self::SecKey {
                credentials,
                public_key,
            } => {
                let hashed = sec_key_hash(credentials.partner_id(), &timestamp)?;
                let encrypted = public_key.encrypt(
                    &mut rand::thread_rng(),
                    Pkcs1v15Encrypt,
                    hashed.as_bytes(),
                )?;
                Ok(SignatureParams::SecKey {
                    sec_key: format!("{}|{hashed}", STANDARD.encode(encrypted)),
                    timestamp,
                })
            }
        }
    }

    /// Checks a token returned by the server for `timestamp`.
    ///
    /// HMAC signatures are recomputed and compared in constant time. A
    /// `sec_key` can only be checked partially: its plaintext hash half must
    /// match the local hash and its ciphertext half must have the key's
    /// length. The ciphertext itself cannot be decrypted without the private
    /// key.
    pub fn verify(&self, timestamp: &str, claimed: &str) -> bool {
        match self {
            Self::Hmac(credentials) => {
                let Ok(decoded) = STANDARD.decode(claimed) else {
                    return false;
                };
                hmac_for(credentials, timestamp)
                    .map(|mac| mac.verify_slice(&decoded).is_ok())
                    .unwrap_or(false)
            }
            Self::SecKey {
                credentials,
                public_key,
            } => {
                let Some((encrypted, hashed)) = claimed.split_once('|') else {
                    return false;
                };
                let Ok(local) = sec_key_hash(credentials.partner_id(), timestamp) else {
                    return false;
                };
                let ciphertext_ok = STANDARD
                    .decode(encrypted)
                    .map(|bytes| bytes.len() == public_key.size())
                    .unwrap_or(false);

                log::warn!("sec_key ciphertext cannot be verified without the private key, checking hash only");
                ciphertext_ok && hashed == local
            }
        }
    }
}

fn hmac_for(credentials: &Credentials, timestamp: &str) -> Result<HmacSha256, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(credentials.api_key.as_bytes())
        .map_err(|e| SignatureError::InvalidKey(e.to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(credentials.partner_id.as_bytes());
    mac.update(SIGNATURE_SUFFIX);
    Ok(mac)
}

fn sec_key_hash(partner_id: &str, timestamp: &str) -> Result<String, SignatureError> {
    let numeric: u64 = partner_id
        .parse()
        .map_err(|_| SignatureError::NonNumericPartnerId(partner_id.to_owned()))?;
    Ok(hex::encode(Sha256::digest(
        format!("{numeric}:{timestamp}").as_bytes(),
    )))
}

fn parse_public_key(api_key: &str) -> Result<RsaPublicKey, SignatureError> {
    let trimmed = api_key.trim();
    if trimmed.starts_with("-----BEGIN") {
        return RsaPublicKey::from_public_key_pem(trimmed)
            .map_err(|e| e.to_string())
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(trimmed).map_err(|e| e.to_string()))
            .map_err(SignatureError::InvalidKey);
    }

    let der = STANDARD
        .decode(trimmed)
        .map_err(|e| SignatureError::InvalidKey(e.to_string()))?;

    RsaPublicKey::from_public_key_der(&der)
        .map_err(|e| e.to_string())
        .or_else(|_| RsaPublicKey::from_pkcs1_der(&der).map_err(|e| e.to_string()))
        .map_err(SignatureError::InvalidKey)
}
