//! Responder identity: is the OCSP signer authorised to speak for the issuer?
//!
//! Decision order, first match wins:
//! 1. no issuer certificate: `Unknown`
//! 2. responder named by key hash: SHA-1 over the issuer key's canonical
//!    encoding (`Unknown` for key types without one)
//! 3. responder named by subject: byte comparison with the issuer subject
//! 4. delegated responder: embedded certificate must verify under the
//!    issuer key; missing certificate fails

use crate::codec::verify_issued_by;
use crate::models::{Certificate, HashAlgorithm, LintStatus, OcspResponse, ResponderId};
use tracing::debug;

pub const IS_ISSUING_CA: &str = "OCSP Responder is the Issuing CA";
pub const ISSUED_BY_ISSUING_CA: &str = "OCSP Responder is issued by the Issuing CA";
pub const NOT_ISSUED_BY_ISSUING_CA: &str = "OCSP Responder is not issued by the Issuing CA";
pub const MISSING_DELEGATE: &str =
    "Unknown OCSP responder: delegated responder did not provide its certificate in OCSP response";

pub fn check_responder(
    response: &OcspResponse,
    issuer: Option<&Certificate>,
) -> (LintStatus, String) {
    let Some(issuer) = issuer else {
        return (
            LintStatus::Unknown,
            "Issuer certificate not provided; cannot check OCSP responder".to_string(),
        );
    };

    match &response.responder_id {
        ResponderId::KeyHash(hash) => {
            let Some(key) = issuer.public_key.canonical_bytes() else {
                return (
                    LintStatus::Unknown,
                    format!(
                        "Responder key hash check not implemented for {} keys",
                        issuer.public_key.kind()
                    ),
                );
            };
            if HashAlgorithm::Sha1.digest(&key) == *hash {
                return (LintStatus::Passed, IS_ISSUING_CA.to_string());
            }
            debug!("responder key hash does not match issuer key");
        }
        ResponderId::Name(name) => {
            if *name == issuer.raw_subject {
                return (LintStatus::Passed, IS_ISSUING_CA.to_string());
            }
            debug!("responder name does not match issuer subject");
        }
    }

    let Some(delegate) = &response.responder_cert else {
        return (LintStatus::Failed, MISSING_DELEGATE.to_string());
    };
    match verify_issued_by(delegate, issuer) {
        Ok(()) => (LintStatus::Passed, ISSUED_BY_ISSUING_CA.to_string()),
        Err(e) => {
            debug!(error = %e, "delegated responder certificate rejected");
            (LintStatus::Failed, NOT_ISSUED_BY_ISSUING_CA.to_string())
        }
    }
}
