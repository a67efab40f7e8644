//! Lint options threaded through every rule.
//!
//! Built once per run from CLI flags and the config file; rules only read it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Class of the certificate whose status the response describes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertClass {
    #[default]
    Subscriber,
    Ca,
}

impl CertClass {
    /// Wording used in rule messages.
    pub fn describe(&self) -> &'static str {
        match self {
            CertClass::Subscriber => "subscriber certificate",
            CertClass::Ca => "subordinate CA certificate",
        }
    }
}

impl FromStr for CertClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "subscriber" => Ok(CertClass::Subscriber),
            "ca" => Ok(CertClass::Ca),
            other => Err(other.to_string()),
        }
    }
}

/// Status the caller expects the responder to report.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedStatus {
    Good,
    Revoked,
    #[default]
    Unspecified,
}

impl fmt::Display for ExpectedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExpectedStatus::Good => "good",
            ExpectedStatus::Revoked => "revoked",
            ExpectedStatus::Unspecified => "unspecified",
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LintOptions {
    pub cert_class: CertClass,
    /// The certificate was never issued by the issuer.
    pub non_issued: bool,
    pub expected_status: ExpectedStatus,
}
