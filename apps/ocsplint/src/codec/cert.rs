//! X.509 certificate decoding via `x509-parser`.

use crate::error::CodecError;
use crate::models::{Certificate, PublicKey};
use x509_parser::prelude::*;

const OID_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
const OID_EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";
const OID_AD_OCSP: &str = "1.3.6.1.5.5.7.48.1";
const OID_AD_CA_ISSUERS: &str = "1.3.6.1.5.5.7.48.2";

/// Parse a certificate from DER, or from PEM when the input looks like PEM.
pub fn parse_certificate(input: &[u8]) -> Result<Certificate, CodecError> {
    if input.starts_with(b"-----BEGIN") {
        let (_, pem) = x509_parser::pem::parse_x509_pem(input)
            .map_err(|e| CodecError::Certificate(format!("invalid PEM: {:?}", e)))?;
        return parse_der_certificate(&pem.contents);
    }
    parse_der_certificate(input)
}

pub fn parse_der_certificate(der: &[u8]) -> Result<Certificate, CodecError> {
    let (_, cert) = X509Certificate::from_der(der)
        .map_err(|e| CodecError::Certificate(format!("{:?}", e)))?;

    let spki = cert.public_key();
    let key_bits = spki.subject_public_key.data.to_vec();
    let public_key = match spki.algorithm.algorithm.to_id_string().as_str() {
        OID_RSA_ENCRYPTION => PublicKey::Rsa { pkcs1: key_bits },
        OID_EC_PUBLIC_KEY => PublicKey::Ec { point: key_bits },
        other => PublicKey::Unsupported {
            algorithm: other.to_string(),
        },
    };

    let is_ca = matches!(cert.basic_constraints(), Ok(Some(bc)) if bc.value.ca);

    let mut ocsp_urls = Vec::new();
    let mut issuer_urls = Vec::new();
    for ext in cert.extensions() {
        if let ParsedExtension::AuthorityInfoAccess(aia) = ext.parsed_extension() {
            for desc in &aia.accessdescs {
                let GeneralName::URI(uri) = &desc.access_location else {
                    continue;
                };
                match desc.access_method.to_id_string().as_str() {
                    OID_AD_OCSP => ocsp_urls.push(uri.to_string()),
                    OID_AD_CA_ISSUERS => issuer_urls.push(uri.to_string()),
                    _ => {}
                }
            }
        }
    }

    Ok(Certificate {
        der: der.to_vec(),
        raw_subject: cert.subject().as_raw().to_vec(),
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        serial: cert.raw_serial().to_vec(),
        is_ca,
        public_key,
        spki: spki.raw.to_vec(),
        ocsp_urls,
        issuer_urls,
    })
}

/// Check that `child` carries a valid signature made with `issuer`'s key.
pub fn verify_issued_by(child: &Certificate, issuer: &Certificate) -> Result<(), CodecError> {
    let (_, child_cert) = X509Certificate::from_der(&child.der)
        .map_err(|e| CodecError::Certificate(format!("{:?}", e)))?;
    let (_, issuer_cert) = X509Certificate::from_der(&issuer.der)
        .map_err(|e| CodecError::Certificate(format!("{:?}", e)))?;
    child_cert
        .verify_signature(Some(issuer_cert.public_key()))
        .map_err(|e| CodecError::BadSignature(format!("certificate signature: {:?}", e)))
}
