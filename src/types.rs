use serde_repr::{Deserialize_repr, Serialize_repr};
use std::fmt::Display;

/// Product codes understood by the API.
#[derive(Clone, Copy, Debug, Deserialize_repr, Eq, Hash, PartialEq, Serialize_repr)]
#[repr(u8)]
pub enum JobType {
    /// Verifies ID information using facial biometrics.
    BiometricKyc = 1,
    /// Compares a selfie to the selfie on file.
    SmartSelfieAuthentication = 2,
    /// Enrolls a user with a selfie.
    SmartSelfieRegistration = 4,
    /// Queries the ID authority by id number. Also known as basic KYC.
    EnhancedKyc = 5,
    /// Checks the authenticity of an ID document.
    DocumentVerification = 6,
    /// Business registration and tax lookups.
    BusinessVerification = 7,
    UpdatePhoto = 8,
    CompareUserInfo = 9,
    /// Document verification backed by an ID authority lookup.
    EnhancedDocumentVerification = 11,
}

impl JobType {
    /// Basic KYC shares its code with enhanced KYC.
    pub const BASIC_KYC: Self = Self::EnhancedKyc;

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_code(code: u64) -> Option<Self> {
        match code {
            1 => Some(Self::BiometricKyc),
            2 => Some(Self::SmartSelfieAuthentication),
            4 => Some(Self::SmartSelfieRegistration),
            5 => Some(Self::EnhancedKyc),
            6 => Some(Self::DocumentVerification),
            7 => Some(Self::BusinessVerification),
            8 => Some(Self::UpdatePhoto),
            9 => Some(Self::CompareUserInfo),
            11 => Some(Self::EnhancedDocumentVerification),
            _ => None,
        }
    }

    pub const fn is_document_verification(self) -> bool {
        matches!(
            self,
            Self::DocumentVerification | Self::EnhancedDocumentVerification
        )
    }

    /// Jobs answered synchronously by a plain JSON endpoint, no image upload.
    pub const fn is_lookup(self) -> bool {
        matches!(self, Self::EnhancedKyc | Self::BusinessVerification)
    }
}

impl Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BiometricKyc => write!(f, "BiometricKyc"),
            Self::SmartSelfieAuthentication => write!(f, "SmartSelfieAuthentication"),
            Self::SmartSelfieRegistration => write!(f, "SmartSelfieRegistration"),
            Self::EnhancedKyc => write!(f, "EnhancedKyc"),
            Self::DocumentVerification => write!(f, "DocumentVerification"),
            Self::BusinessVerification => write!(f, "BusinessVerification"),
            Self::UpdatePhoto => write!(f, "UpdatePhoto"),
            Self::CompareUserInfo => write!(f, "CompareUserInfo"),
            Self::EnhancedDocumentVerification => write!(f, "EnhancedDocumentVerification"),
        }
    }
}

/// Image type codes. Even/odd pairs split file uploads from base64 strings.
#[derive(Clone, Copy, Debug, Deserialize_repr, Eq, Hash, PartialEq, Serialize_repr)]
#[repr(u8)]
pub enum ImageType {
    SelfieFile = 0,
    IdCardFile = 1,
    SelfieBase64 = 2,
    IdCardBase64 = 3,
    LivenessFile = 4,
    IdCardBackFile = 5,
    LivenessBase64 = 6,
    IdCardBackBase64 = 7,
}

impl ImageType {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::SelfieFile),
            1 => Some(Self::IdCardFile),
            2 => Some(Self::SelfieBase64),
            3 => Some(Self::IdCardBase64),
            4 => Some(Self::LivenessFile),
            5 => Some(Self::IdCardBackFile),
            6 => Some(Self::LivenessBase64),
            7 => Some(Self::IdCardBackBase64),
            _ => None,
        }
    }

    /// Whether the image is expected as a path on disk.
    pub const fn is_file(self) -> bool {
        matches!(
            self,
            Self::SelfieFile | Self::IdCardFile | Self::LivenessFile | Self::IdCardBackFile
        )
    }

    pub const fn is_inline(self) -> bool {
        !self.is_file()
    }

    pub const fn is_selfie(self) -> bool {
        matches!(self, Self::SelfieFile | Self::SelfieBase64)
    }

    /// Front of an ID card. Backs do not count towards document jobs.
    pub const fn is_id_card(self) -> bool {
        matches!(self, Self::IdCardFile | Self::IdCardBase64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_type_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&JobType::BiometricKyc).unwrap(), "1");
        assert_eq!(
            serde_json::from_str::<JobType>("11").unwrap(),
            JobType::EnhancedDocumentVerification
        );
        assert!(serde_json::from_str::<JobType>("3").is_err());
    }

    #[test]
    fn test_basic_kyc_is_enhanced_kyc() {
        assert_eq!(JobType::BASIC_KYC.code(), 5);
        assert_eq!(JobType::from_code(5), Some(JobType::BASIC_KYC));
    }

    #[test]
    fn test_only_lookup_jobs_skip_upload() {
        let lookups: Vec<_> = (0..16)
            .filter_map(JobType::from_code)
            .filter(|job_type| job_type.is_lookup())
            .collect();
        assert_eq!(
            lookups,
            vec![JobType::EnhancedKyc, JobType::BusinessVerification]
        );
    }

    #[test]
    fn test_from_code_matches_repr() {
        for code in 0..16 {
            if let Some(job_type) = JobType::from_code(code) {
                assert_eq!(u64::from(job_type.code()), code);
            }
            if let Some(image_type) = ImageType::from_code(code) {
                assert_eq!(u64::from(image_type.code()), code);
            }
        }
    }

    #[test]
    fn test_image_kinds_are_disjoint() {
        for code in 0..8 {
            let image_type = ImageType::from_code(code).unwrap();
            assert_ne!(image_type.is_file(), image_type.is_inline());
        }
        assert!(ImageType::SelfieBase64.is_selfie());
        assert!(ImageType::IdCardFile.is_id_card());
        assert!(!ImageType::IdCardBackFile.is_id_card());
    }
}
