//! Error types for decoding, acquisition, configuration and rule registration.

use crate::models::HashAlgorithm;
use std::path::PathBuf;
use std::time::Duration;

/// Errors raised while decoding OCSP responses or certificates
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Structurally invalid DER
    #[error("malformed DER: {0}")]
    Malformed(String),

    /// The responder answered with a non-successful responseStatus
    #[error("OCSP responder returned status {0}")]
    Unsuccessful(&'static str),

    /// responseType other than id-pkix-ocsp-basic
    #[error("unsupported OCSP response type {0}")]
    UnsupportedResponseType(String),

    /// Timestamp could not be interpreted
    #[error("invalid GeneralizedTime '{0}'")]
    InvalidTime(String),

    /// Certificate parsing failed
    #[error("certificate parse error: {0}")]
    Certificate(String),

    /// Signature did not verify against the expected signer
    #[error("OCSP response signature invalid: {0}")]
    BadSignature(String),
}

/// Errors raised while acquiring a response for one target
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("certificate has no issuing certificate URL; pass --issuer")]
    NoIssuerUrl,

    #[error("certificate has no OCSP responder URL; pass --ocsp-url")]
    NoOcspUrl,

    #[error("failed to connect to {server}: {source}")]
    Connect {
        server: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS handshake with {server} failed: {details}")]
    Handshake { server: String, details: String },

    #[error("{server} presented a root certificate only; no issuer to check against")]
    ShortChain { server: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP request timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Decode(#[from] CodecError),

    #[error("OCSP response is for serial {got}, expected {expected}")]
    SerialMismatch { expected: String, got: String },

    #[error("failed to write OCSP response to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{primary} request failed ({primary_error}); {fallback} retry failed")]
    FallbackExhausted {
        primary: HashAlgorithm,
        primary_error: String,
        fallback: HashAlgorithm,
        #[source]
        source: Box<AcquireError>,
    },
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Rule registration errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("lint rule '{0}' registered twice")]
    DuplicateRule(String),
}

/// Render an error with its `source()` chain, outermost first.
pub fn chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(e) = cur {
        out.push_str(": ");
        out.push_str(&e.to_string());
        cur = e.source();
    }
    out
}
