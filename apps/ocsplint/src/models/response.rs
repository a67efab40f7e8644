//! Decoded OCSP response (RFC 6960 BasicOCSPResponse, first SingleResponse).

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use super::Certificate;

/// Certificate status reported by the responder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "status")]
pub enum CertStatus {
    Good,
    Revoked {
        revoked_at: DateTime<Utc>,
        reason: Option<u8>,
    },
    Unknown,
}

impl CertStatus {
    pub fn name(&self) -> &'static str {
        match self {
            CertStatus::Good => "good",
            CertStatus::Revoked { .. } => "revoked",
            CertStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the response names its signer. Exactly one form is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderId {
    /// Raw DER of the responder's distinguished name
    Name(Vec<u8>),
    /// SHA-1 hash of the responder's public key
    KeyHash(Vec<u8>),
}

/// Signature algorithms an OCSP response may be signed with.
///
/// The SHA-1 family is listed explicitly so the rejection list stays a
/// closed decision rather than something inferred from OID text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    Sha1WithRsa,
    DsaWithSha1,
    EcdsaWithSha1,
    Sha256WithRsa,
    Sha384WithRsa,
    Sha512WithRsa,
    RsaPss,
    EcdsaWithSha256,
    EcdsaWithSha384,
    EcdsaWithSha512,
    Ed25519,
    Other(String),
}

impl SignatureAlgorithm {
    pub fn from_oid(oid: &str) -> Self {
        match oid {
            "1.2.840.113549.1.1.5" => Self::Sha1WithRsa,
            "1.2.840.10040.4.3" => Self::DsaWithSha1,
            "1.2.840.10045.4.1" => Self::EcdsaWithSha1,
            "1.2.840.113549.1.1.11" => Self::Sha256WithRsa,
            "1.2.840.113549.1.1.12" => Self::Sha384WithRsa,
            "1.2.840.113549.1.1.13" => Self::Sha512WithRsa,
            "1.2.840.113549.1.1.10" => Self::RsaPss,
            "1.2.840.10045.4.3.2" => Self::EcdsaWithSha256,
            "1.2.840.10045.4.3.3" => Self::EcdsaWithSha384,
            "1.2.840.10045.4.3.4" => Self::EcdsaWithSha512,
            "1.3.101.112" => Self::Ed25519,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn oid(&self) -> &str {
        match self {
            Self::Sha1WithRsa => "1.2.840.113549.1.1.5",
            Self::DsaWithSha1 => "1.2.840.10040.4.3",
            Self::EcdsaWithSha1 => "1.2.840.10045.4.1",
            Self::Sha256WithRsa => "1.2.840.113549.1.1.11",
            Self::Sha384WithRsa => "1.2.840.113549.1.1.12",
            Self::Sha512WithRsa => "1.2.840.113549.1.1.13",
            Self::RsaPss => "1.2.840.113549.1.1.10",
            Self::EcdsaWithSha256 => "1.2.840.10045.4.3.2",
            Self::EcdsaWithSha384 => "1.2.840.10045.4.3.3",
            Self::EcdsaWithSha512 => "1.2.840.10045.4.3.4",
            Self::Ed25519 => "1.3.101.112",
            Self::Other(oid) => oid,
        }
    }

    pub fn uses_sha1(&self) -> bool {
        matches!(
            self,
            Self::Sha1WithRsa | Self::DsaWithSha1 | Self::EcdsaWithSha1
        )
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1WithRsa => f.write_str("SHA1-RSA"),
            Self::DsaWithSha1 => f.write_str("DSA-SHA1"),
            Self::EcdsaWithSha1 => f.write_str("ECDSA-SHA1"),
            Self::Sha256WithRsa => f.write_str("SHA256-RSA"),
            Self::Sha384WithRsa => f.write_str("SHA384-RSA"),
            Self::Sha512WithRsa => f.write_str("SHA512-RSA"),
            Self::RsaPss => f.write_str("RSA-PSS"),
            Self::EcdsaWithSha256 => f.write_str("ECDSA-SHA256"),
            Self::EcdsaWithSha384 => f.write_str("ECDSA-SHA384"),
            Self::EcdsaWithSha512 => f.write_str("ECDSA-SHA512"),
            Self::Ed25519 => f.write_str("Ed25519"),
            Self::Other(oid) => write!(f, "unknown algorithm {}", oid),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OcspResponse {
    pub cert_status: CertStatus,
    /// Serial number from the SingleResponse CertID
    pub serial: Vec<u8>,
    pub produced_at: DateTime<Utc>,
    pub this_update: DateTime<Utc>,
    pub next_update: Option<DateTime<Utc>>,
    pub responder_id: ResponderId,
    pub signature_algorithm: SignatureAlgorithm,
    pub signature: Vec<u8>,
    /// Delegated responder certificate, when the response embeds one
    pub responder_cert: Option<Certificate>,
    /// DER of ResponseData, the signed portion
    pub tbs_response_data: Vec<u8>,
    /// Complete DER as received, kept for persistence
    pub raw: Vec<u8>,
}
