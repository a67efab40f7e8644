//! OCSP (RFC 6960) request encoding, response decoding and signature checks.
//!
//! ```asn1
//! OCSPResponse ::= SEQUENCE {
//!     responseStatus      OCSPResponseStatus,
//!     responseBytes       [0] EXPLICIT ResponseBytes OPTIONAL
//! }
//!
//! BasicOCSPResponse ::= SEQUENCE {
//!     tbsResponseData     ResponseData,
//!     signatureAlgorithm  AlgorithmIdentifier,
//!     signature           BIT STRING,
//!     certs               [0] EXPLICIT SEQUENCE OF Certificate OPTIONAL
//! }
//!
//! ResponseData ::= SEQUENCE {
//!     version             [0] EXPLICIT Version DEFAULT v1,
//!     responderID         ResponderID,
//!     producedAt          GeneralizedTime,
//!     responses           SEQUENCE OF SingleResponse,
//!     responseExtensions  [1] EXPLICIT Extensions OPTIONAL
//! }
//!
//! ResponderID ::= CHOICE {
//!     byName              [1] Name,
//!     byKey               [2] KeyHash
//! }
//!
//! SingleResponse ::= SEQUENCE {
//!     certID              CertID,
//!     certStatus          CertStatus,
//!     thisUpdate          GeneralizedTime,
//!     nextUpdate          [0] EXPLICIT GeneralizedTime OPTIONAL,
//!     singleExtensions    [1] EXPLICIT Extensions OPTIONAL
//! }
//! ```
//!
//! Only the first SingleResponse is decoded; the linter evaluates one
//! certificate per response.

use super::cert::{parse_der_certificate, verify_issued_by};
use super::der::{self, Tlv};
use crate::error::CodecError;
use crate::models::{
    CertStatus, Certificate, HashAlgorithm, OcspResponse, PublicKey, ResponderId,
    SignatureAlgorithm,
};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use ring::signature;

const OID_PKIX_OCSP_BASIC: &str = "1.3.6.1.5.5.7.48.1.1";

fn response_status_name(code: u8) -> &'static str {
    match code {
        1 => "malformedRequest",
        2 => "internalError",
        3 => "tryLater",
        5 => "sigRequired",
        6 => "unauthorized",
        _ => "unrecognized",
    }
}

/// Decode a DER-encoded OCSPResponse.
///
/// Fails for any responseStatus other than `successful`, since there is
/// nothing to lint in that case.
pub fn parse_response(der_bytes: &[u8]) -> Result<OcspResponse, CodecError> {
    let outer = der::parse_single(der_bytes, "OCSPResponse")?.expect_tag(der::TAG_SEQUENCE, "OCSPResponse")?;
    let mut fields = outer.children();

    let status = fields
        .next_tlv("responseStatus")?
        .expect_tag(der::TAG_ENUMERATED, "responseStatus")?;
    let code = match status.value {
        [b] => *b,
        _ => return Err(CodecError::Malformed("responseStatus is not one octet".into())),
    };
    if code != 0 {
        return Err(CodecError::Unsuccessful(response_status_name(code)));
    }

    let bytes_tagged = fields.next_tlv("responseBytes")?;
    if bytes_tagged.context_tag() != Some(0) {
        return Err(CodecError::Malformed("missing responseBytes".into()));
    }
    let response_bytes = bytes_tagged
        .children()
        .next_tlv("ResponseBytes")?
        .expect_tag(der::TAG_SEQUENCE, "ResponseBytes")?;
    let mut rb = response_bytes.children();
    let response_type = rb.next_tlv("responseType")?.expect_tag(der::TAG_OID, "responseType")?;
    let response_type = der::oid_to_string(response_type.value)?;
    if response_type != OID_PKIX_OCSP_BASIC {
        return Err(CodecError::UnsupportedResponseType(response_type));
    }
    let basic_der = rb
        .next_tlv("response")?
        .expect_tag(der::TAG_OCTET_STRING, "response")?
        .value;

    let mut parsed = parse_basic_response(basic_der)?;
    parsed.raw = der_bytes.to_vec();
    Ok(parsed)
}

fn parse_basic_response(basic_der: &[u8]) -> Result<OcspResponse, CodecError> {
    let basic = der::parse_single(basic_der, "BasicOCSPResponse")?
        .expect_tag(der::TAG_SEQUENCE, "BasicOCSPResponse")?;
    let mut fields = basic.children();

    let tbs = fields
        .next_tlv("tbsResponseData")?
        .expect_tag(der::TAG_SEQUENCE, "tbsResponseData")?;
    let sig_alg = fields
        .next_tlv("signatureAlgorithm")?
        .expect_tag(der::TAG_SEQUENCE, "signatureAlgorithm")?;
    let sig_oid = sig_alg
        .children()
        .next_tlv("signatureAlgorithm.algorithm")?
        .expect_tag(der::TAG_OID, "signatureAlgorithm.algorithm")?;
    let signature_algorithm = SignatureAlgorithm::from_oid(&der::oid_to_string(sig_oid.value)?);
    let sig_bits = fields
        .next_tlv("signature")?
        .expect_tag(der::TAG_BIT_STRING, "signature")?;
    let signature = bit_string_bytes(sig_bits)?;

    let mut responder_cert = None;
    if let Some(certs) = fields.next_if(0xA0)? {
        let seq = certs
            .children()
            .next_tlv("certs")?
            .expect_tag(der::TAG_SEQUENCE, "certs")?;
        let mut list = seq.children();
        if !list.is_empty() {
            let first = list.next_tlv("certificate")?;
            responder_cert = Some(parse_der_certificate(first.raw)?);
        }
    }

    let mut data = tbs.children();
    data.next_if(0xA0)?;
    let responder = data.next_tlv("responderID")?;
    let responder_id = match responder.context_tag() {
        Some(1) => ResponderId::Name(responder.children().next_tlv("byName")?.raw.to_vec()),
        Some(2) => {
            let hash = responder
                .children()
                .next_tlv("byKey")?
                .expect_tag(der::TAG_OCTET_STRING, "byKey")?;
            ResponderId::KeyHash(hash.value.to_vec())
        }
        _ => {
            return Err(CodecError::Malformed(format!(
                "unexpected responderID tag 0x{:02x}",
                responder.tag
            )))
        }
    };
    let produced_at = parse_time(data.next_tlv("producedAt")?)?;
    let responses = data
        .next_tlv("responses")?
        .expect_tag(der::TAG_SEQUENCE, "responses")?;
    let mut list = responses.children();
    if list.is_empty() {
        return Err(CodecError::Malformed("no SingleResponse present".into()));
    }
    let single = list
        .next_tlv("SingleResponse")?
        .expect_tag(der::TAG_SEQUENCE, "SingleResponse")?;

    let mut sr = single.children();
    let cert_id = sr.next_tlv("certID")?.expect_tag(der::TAG_SEQUENCE, "certID")?;
    let mut cid = cert_id.children();
    cid.next_tlv("hashAlgorithm")?;
    cid.next_tlv("issuerNameHash")?;
    cid.next_tlv("issuerKeyHash")?;
    let serial = cid
        .next_tlv("serialNumber")?
        .expect_tag(der::TAG_INTEGER, "serialNumber")?
        .value
        .to_vec();

    let cert_status = parse_cert_status(sr.next_tlv("certStatus")?)?;
    let this_update = parse_time(sr.next_tlv("thisUpdate")?)?;
    let next_update = match sr.next_if(0xA0)? {
        Some(tagged) => Some(parse_time(tagged.children().next_tlv("nextUpdate")?)?),
        None => None,
    };

    Ok(OcspResponse {
        cert_status,
        serial,
        produced_at,
        this_update,
        next_update,
        responder_id,
        signature_algorithm,
        signature,
        responder_cert,
        tbs_response_data: tbs.raw.to_vec(),
        raw: Vec::new(),
    })
}

/// ```asn1
/// CertStatus ::= CHOICE {
///     good        [0] IMPLICIT NULL,
///     revoked     [1] IMPLICIT RevokedInfo,
///     unknown     [2] IMPLICIT UnknownInfo
/// }
/// ```
fn parse_cert_status(tlv: Tlv<'_>) -> Result<CertStatus, CodecError> {
    match tlv.tag {
        0x80 => Ok(CertStatus::Good),
        0xA1 => {
            let mut info = tlv.children();
            let revoked_at = parse_time(info.next_tlv("revocationTime")?)?;
            let reason = match info.next_if(0xA0)? {
                Some(tagged) => tagged
                    .children()
                    .next_tlv("revocationReason")?
                    .value
                    .first()
                    .copied(),
                None => None,
            };
            Ok(CertStatus::Revoked { revoked_at, reason })
        }
        0x82 => Ok(CertStatus::Unknown),
        other => Err(CodecError::Malformed(format!(
            "unknown CertStatus tag 0x{:02x}",
            other
        ))),
    }
}

/// Parse ASN.1 GeneralizedTime (`YYYYMMDDHHMMSS[.fff]Z`).
fn parse_time(tlv: Tlv<'_>) -> Result<DateTime<Utc>, CodecError> {
    let tlv = tlv.expect_tag(der::TAG_GENERALIZED_TIME, "GeneralizedTime")?;
    let text = std::str::from_utf8(tlv.value)
        .map_err(|_| CodecError::InvalidTime(String::from_utf8_lossy(tlv.value).into_owned()))?;
    let naive = NaiveDateTime::parse_from_str(text, "%Y%m%d%H%M%SZ")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y%m%d%H%M%S%.fZ"))
        .map_err(|_| CodecError::InvalidTime(text.to_string()))?;
    Ok(Utc.from_utc_datetime(&naive))
}

fn bit_string_bytes(tlv: Tlv<'_>) -> Result<Vec<u8>, CodecError> {
    match tlv.value.split_first() {
        Some((0, rest)) => Ok(rest.to_vec()),
        Some((_, _)) => Err(CodecError::Malformed(
            "BIT STRING with unused bits".into(),
        )),
        None => Ok(Vec::new()),
    }
}

/// The subjectPublicKey BIT STRING contents of a SubjectPublicKeyInfo.
fn spki_key_bits(spki: &[u8]) -> Result<Vec<u8>, CodecError> {
    let seq = der::parse_single(spki, "SubjectPublicKeyInfo")?
        .expect_tag(der::TAG_SEQUENCE, "SubjectPublicKeyInfo")?;
    let mut fields = seq.children();
    fields.next_tlv("algorithm")?;
    let bits = fields
        .next_tlv("subjectPublicKey")?
        .expect_tag(der::TAG_BIT_STRING, "subjectPublicKey")?;
    bit_string_bytes(bits)
}

/// Build a DER OCSPRequest for `leaf`, hashing the issuer with `hash`.
///
/// ```asn1
/// CertID ::= SEQUENCE {
///     hashAlgorithm       AlgorithmIdentifier,
///     issuerNameHash      OCTET STRING,
///     issuerKeyHash       OCTET STRING,
///     serialNumber        INTEGER
/// }
/// ```
///
/// The request is unsigned and carries no extensions.
pub fn build_request(
    leaf: &Certificate,
    issuer: &Certificate,
    hash: HashAlgorithm,
) -> Result<Vec<u8>, CodecError> {
    let key_bits = spki_key_bits(&issuer.spki)?;

    let mut alg = der::oid(hash.oid());
    alg.extend(der::null());

    let mut cert_id = der::sequence(&alg);
    cert_id.extend(der::octet_string(&hash.digest(&issuer.raw_subject)));
    cert_id.extend(der::octet_string(&hash.digest(&key_bits)));
    cert_id.extend(der::tlv(der::TAG_INTEGER, &leaf.serial));

    let request = der::sequence(&der::sequence(&cert_id));
    let request_list = der::sequence(&request);
    let tbs_request = der::sequence(&request_list);
    Ok(der::sequence(&tbs_request))
}

/// Verify the response signature against `issuer`.
///
/// When the response embeds a delegated responder certificate, that
/// certificate must be issued by `issuer` and is used as the signer.
pub fn verify_response(resp: &OcspResponse, issuer: &Certificate) -> Result<(), CodecError> {
    match &resp.responder_cert {
        Some(delegate) if delegate.der != issuer.der => {
            verify_issued_by(delegate, issuer)?;
            verify_signature(resp, delegate)
        }
        _ => verify_signature(resp, issuer),
    }
}

fn verify_signature(resp: &OcspResponse, signer: &Certificate) -> Result<(), CodecError> {
    use SignatureAlgorithm as Alg;

    let (algorithm, key): (&'static dyn signature::VerificationAlgorithm, &[u8]) =
        match (&resp.signature_algorithm, &signer.public_key) {
            (Alg::Sha1WithRsa, PublicKey::Rsa { pkcs1 }) => {
                (&signature::RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY, pkcs1)
            }
            (Alg::Sha256WithRsa, PublicKey::Rsa { pkcs1 }) => {
                (&signature::RSA_PKCS1_2048_8192_SHA256, pkcs1)
            }
            (Alg::Sha384WithRsa, PublicKey::Rsa { pkcs1 }) => {
                (&signature::RSA_PKCS1_2048_8192_SHA384, pkcs1)
            }
            (Alg::Sha512WithRsa, PublicKey::Rsa { pkcs1 }) => {
                (&signature::RSA_PKCS1_2048_8192_SHA512, pkcs1)
            }
            (Alg::EcdsaWithSha256, PublicKey::Ec { point }) if point.len() == 65 => {
                (&signature::ECDSA_P256_SHA256_ASN1, point)
            }
            (Alg::EcdsaWithSha256, PublicKey::Ec { point }) if point.len() == 97 => {
                (&signature::ECDSA_P384_SHA256_ASN1, point)
            }
            (Alg::EcdsaWithSha384, PublicKey::Ec { point }) if point.len() == 65 => {
                (&signature::ECDSA_P256_SHA384_ASN1, point)
            }
            (Alg::EcdsaWithSha384, PublicKey::Ec { point }) if point.len() == 97 => {
                (&signature::ECDSA_P384_SHA384_ASN1, point)
            }
            (alg, key) => {
                return Err(CodecError::BadSignature(format!(
                    "cannot verify {} with a {} key",
                    alg,
                    key.kind()
                )))
            }
        };

    signature::UnparsedPublicKey::new(algorithm, key)
        .verify(&resp.tbs_response_data, &resp.signature)
        .map_err(|_| {
            CodecError::BadSignature(format!("signature does not match {}", signer.subject))
        })
}
