//! Shared data models: decoded responses and certificates, lint options,
//! and lint output structs.

pub mod cert;
pub mod policy;
pub mod response;

pub use cert::{Certificate, PublicKey};
pub use policy::{CertClass, ExpectedStatus, LintOptions};
pub use response::{CertStatus, OcspResponse, ResponderId, SignatureAlgorithm};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single lint, ordered worst-first (`Error < Failed < Unknown < Passed`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LintStatus {
    /// The rule's own policy constant is malformed
    Error,
    Failed,
    /// Cannot be decided from the available inputs
    Unknown,
    Passed,
}

impl fmt::Display for LintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LintStatus::Error => "ERROR",
            LintStatus::Failed => "FAILED",
            LintStatus::Unknown => "UNKNOWN",
            LintStatus::Passed => "PASSED",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A single lint verdict with the rule that produced it.
pub struct LintResult {
    pub rule: &'static str,
    pub source: &'static str,
    pub status: LintStatus,
    pub message: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
/// Per-status counts used by printers.
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub unknown: usize,
    pub errors: usize,
}

impl Summary {
    pub fn from_results(results: &[LintResult]) -> Self {
        let mut s = Summary::default();
        for r in results {
            match r.status {
                LintStatus::Passed => s.passed += 1,
                LintStatus::Failed => s.failed += 1,
                LintStatus::Unknown => s.unknown += 1,
                LintStatus::Error => s.errors += 1,
            }
        }
        s
    }
}

/// Digest used to build the CertID of an OCSP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha256,
    Sha1,
}

impl HashAlgorithm {
    pub fn oid(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "1.3.14.3.2.26",
            HashAlgorithm::Sha256 => "2.16.840.1.101.3.4.2.1",
        }
    }

    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        use sha1::Digest;
        match self {
            HashAlgorithm::Sha1 => sha1::Sha1::digest(data).to_vec(),
            HashAlgorithm::Sha256 => sha2::Sha256::digest(data).to_vec(),
        }
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "sha1" | "sha-1" => Ok(HashAlgorithm::Sha1),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HashAlgorithm::Sha1 => "SHA-1",
            HashAlgorithm::Sha256 => "SHA-256",
        })
    }
}
