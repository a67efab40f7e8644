//! Wire codecs: a small DER toolkit, OCSP request/response handling and
//! X.509 certificate decoding.

pub mod cert;
pub mod der;
pub mod ocsp;

#[cfg(test)]
pub(crate) mod testing;

pub use cert::{parse_certificate, verify_issued_by};
pub use ocsp::{build_request, parse_response, verify_response};
