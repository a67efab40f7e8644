//! In-process fixtures: P-256 and RSA keys, X.509 certificates and OCSP
//! responses.

use super::der;
use crate::models::{CertStatus, ResponderId};
use chrono::{DateTime, Duration, Utc};
use ring::rand::SystemRandom;
use ring::signature::{
    EcdsaKeyPair, KeyPair, RsaKeyPair, ECDSA_P256_SHA256_ASN1_SIGNING, RSA_PKCS1_SHA256,
};
use sha2::{Digest, Sha256};

/// 2048-bit RSA key, PKCS#8 DER. ring cannot generate RSA keys.
const RSA_2048_PKCS8: &[u8] = include_bytes!("testdata/rsa-2048.pk8");

const OID_ECDSA_SHA256: &str = "1.2.840.10045.4.3.2";
const OID_SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";
const OID_EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";
const OID_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
const OID_PRIME256V1: &str = "1.2.840.10045.3.1.7";
const OID_COMMON_NAME: &str = "2.5.4.3";
const OID_BASIC_CONSTRAINTS: &str = "2.5.29.19";
const OID_AIA: &str = "1.3.6.1.5.5.7.1.1";
const OID_AD_OCSP: &str = "1.3.6.1.5.5.7.48.1";
const OID_AD_CA_ISSUERS: &str = "1.3.6.1.5.5.7.48.2";
const OID_OCSP_BASIC: &str = "1.3.6.1.5.5.7.48.1.1";
const OID_SHA1: &str = "1.3.14.3.2.26";

pub(crate) struct CertSpec<'a> {
    pub cn: &'a str,
    pub is_ca: bool,
    pub ocsp_url: Option<&'a str>,
    pub issuer_url: Option<&'a str>,
}

impl<'a> CertSpec<'a> {
    pub fn leaf(cn: &'a str) -> Self {
        Self {
            cn,
            is_ca: false,
            ocsp_url: None,
            issuer_url: None,
        }
    }

    pub fn ca(cn: &'a str) -> Self {
        Self {
            is_ca: true,
            ..Self::leaf(cn)
        }
    }
}

enum Pair {
    Ec(EcdsaKeyPair),
    Rsa(RsaKeyPair),
}

pub(crate) struct TestKey {
    pair: Pair,
    rng: SystemRandom,
}

impl TestKey {
    /// Fresh P-256 key.
    pub fn generate() -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng).unwrap();
        let pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8.as_ref(), &rng)
                .unwrap();
        Self {
            pair: Pair::Ec(pair),
            rng,
        }
    }

    /// The checked-in RSA key; signs with sha256WithRSAEncryption.
    pub fn rsa() -> Self {
        let pair = RsaKeyPair::from_pkcs8(RSA_2048_PKCS8).unwrap();
        Self {
            pair: Pair::Rsa(pair),
            rng: SystemRandom::new(),
        }
    }

    /// subjectPublicKey contents: uncompressed SEC1 point or PKCS#1 RSAPublicKey.
    pub fn public_key_bits(&self) -> Vec<u8> {
        match &self.pair {
            Pair::Ec(pair) => pair.public_key().as_ref().to_vec(),
            Pair::Rsa(pair) => pair.public_key().as_ref().to_vec(),
        }
    }

    pub fn signature_oid(&self) -> &'static str {
        match self.pair {
            Pair::Ec(_) => OID_ECDSA_SHA256,
            Pair::Rsa(_) => OID_SHA256_WITH_RSA,
        }
    }

    /// AlgorithmIdentifier of this key's signatures. RSA carries NULL params.
    fn signature_algorithm(&self) -> Vec<u8> {
        let mut alg = der::oid(self.signature_oid());
        if let Pair::Rsa(_) = self.pair {
            alg.extend(der::null());
        }
        der::sequence(&alg)
    }

    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        match &self.pair {
            Pair::Ec(pair) => pair.sign(&self.rng, msg).unwrap().as_ref().to_vec(),
            Pair::Rsa(pair) => {
                let mut sig = vec![0; pair.public().modulus_len()];
                pair.sign(&RSA_PKCS1_SHA256, &self.rng, msg, &mut sig)
                    .unwrap();
                sig
            }
        }
    }

    fn spki(&self) -> Vec<u8> {
        let mut alg = match self.pair {
            Pair::Ec(_) => der::oid(OID_EC_PUBLIC_KEY),
            Pair::Rsa(_) => der::oid(OID_RSA_ENCRYPTION),
        };
        alg.extend(match self.pair {
            Pair::Ec(_) => der::oid(OID_PRIME256V1),
            Pair::Rsa(_) => der::null(),
        });
        let mut out = der::sequence(&alg);
        out.extend(bit_string(&self.public_key_bits()));
        der::sequence(&out)
    }

    pub fn self_signed(&self, spec: &CertSpec<'_>) -> Vec<u8> {
        self.issue(spec, spec.cn, self)
    }

    /// Certificate for `subject_key` described by `spec`, signed by this key.
    pub fn issue(&self, spec: &CertSpec<'_>, issuer_cn: &str, subject_key: &TestKey) -> Vec<u8> {
        let serial = Sha256::digest(spec.cn.as_bytes());
        let mut serial = serial[..8].to_vec();
        serial[0] &= 0x7F;

        let mut tbs = der::explicit(0, &der::integer(&[2]));
        tbs.extend(der::integer(&serial));
        tbs.extend(self.signature_algorithm());
        tbs.extend(name(issuer_cn));
        let mut validity = der::tlv(0x17, b"240101000000Z");
        validity.extend(der::tlv(0x17, b"491231235959Z"));
        tbs.extend(der::sequence(&validity));
        tbs.extend(name(spec.cn));
        tbs.extend(subject_key.spki());
        tbs.extend(der::explicit(3, &der::sequence(&extensions(spec))));
        let tbs = der::sequence(&tbs);

        let mut cert = tbs.clone();
        cert.extend(self.signature_algorithm());
        cert.extend(bit_string(&self.sign(&tbs)));
        der::sequence(&cert)
    }
}

/// DER Name holding a single commonName.
pub(crate) fn name(cn: &str) -> Vec<u8> {
    let mut atv = der::oid(OID_COMMON_NAME);
    atv.extend(der::tlv(0x0C, cn.as_bytes()));
    let rdn = der::tlv(0x31, &der::sequence(&atv));
    der::sequence(&rdn)
}

fn bit_string(bytes: &[u8]) -> Vec<u8> {
    let mut content = vec![0x00];
    content.extend_from_slice(bytes);
    der::tlv(der::TAG_BIT_STRING, &content)
}

fn extension(oid: &str, critical: bool, value: &[u8]) -> Vec<u8> {
    let mut ext = der::oid(oid);
    if critical {
        ext.extend([0x01, 0x01, 0xFF]);
    }
    ext.extend(der::octet_string(value));
    der::sequence(&ext)
}

fn extensions(spec: &CertSpec<'_>) -> Vec<u8> {
    let constraints = if spec.is_ca {
        der::sequence(&[0x01, 0x01, 0xFF])
    } else {
        der::sequence(&[])
    };
    let mut out = extension(OID_BASIC_CONSTRAINTS, true, &constraints);

    let mut descs = Vec::new();
    for (method, url) in [(OID_AD_OCSP, spec.ocsp_url), (OID_AD_CA_ISSUERS, spec.issuer_url)] {
        if let Some(url) = url {
            let mut desc = der::oid(method);
            desc.extend(der::tlv(0x86, url.as_bytes()));
            descs.extend(der::sequence(&desc));
        }
    }
    if !descs.is_empty() {
        out.extend(extension(OID_AIA, false, &der::sequence(&descs)));
    }
    out
}

/// Description of an OCSP response to encode.
pub(crate) struct ResponseSpec {
    pub status: CertStatus,
    pub produced_at: DateTime<Utc>,
    pub this_update: DateTime<Utc>,
    pub next_update: Option<DateTime<Utc>>,
    pub responder: ResponderId,
    pub signature_oid: &'static str,
    /// Encode an empty signature BIT STRING
    pub unsigned: bool,
    pub embedded_cert: Option<Vec<u8>>,
    pub serial: Vec<u8>,
}

impl ResponseSpec {
    /// A fresh Good response named by the "Issuing CA" subject.
    pub fn good() -> Self {
        let now = Utc::now();
        Self {
            status: CertStatus::Good,
            produced_at: now - Duration::hours(1),
            this_update: now - Duration::hours(1),
            next_update: Some(now + Duration::days(3)),
            responder: ResponderId::Name(name("Issuing CA")),
            signature_oid: OID_ECDSA_SHA256,
            unsigned: false,
            embedded_cert: None,
            serial: vec![0x01, 0x02],
        }
    }

    /// DER OCSPResponse. Without a signer the signature is placeholder bytes.
    pub fn encode(&self, signer: Option<&TestKey>) -> Vec<u8> {
        let mut hash_alg = der::oid(OID_SHA1);
        hash_alg.extend(der::null());
        let mut cert_id = der::sequence(&hash_alg);
        cert_id.extend(der::octet_string(&[0; 20]));
        cert_id.extend(der::octet_string(&[0; 20]));
        cert_id.extend(der::integer(&self.serial));

        let mut single = der::sequence(&cert_id);
        single.extend(match &self.status {
            CertStatus::Good => vec![0x80, 0x00],
            CertStatus::Revoked { revoked_at, reason } => {
                let mut info = generalized_time(*revoked_at);
                if let Some(r) = reason {
                    info.extend(der::explicit(0, &der::tlv(der::TAG_ENUMERATED, &[*r])));
                }
                der::tlv(0xA1, &info)
            }
            CertStatus::Unknown => vec![0x82, 0x00],
        });
        single.extend(generalized_time(self.this_update));
        if let Some(next) = self.next_update {
            single.extend(der::explicit(0, &generalized_time(next)));
        }

        let mut data = match &self.responder {
            ResponderId::Name(raw) => der::explicit(1, raw),
            ResponderId::KeyHash(hash) => der::explicit(2, &der::octet_string(hash)),
        };
        data.extend(generalized_time(self.produced_at));
        data.extend(der::sequence(&der::sequence(&single)));
        let tbs = der::sequence(&data);

        let signature = match (self.unsigned, signer) {
            (true, _) => Vec::new(),
            (false, Some(key)) => key.sign(&tbs),
            (false, None) => vec![0x30, 0x00],
        };

        let mut basic = tbs;
        basic.extend(der::sequence(&der::oid(self.signature_oid)));
        basic.extend(bit_string(&signature));
        if let Some(cert) = &self.embedded_cert {
            basic.extend(der::explicit(0, &der::sequence(cert)));
        }
        let basic = der::sequence(&basic);

        let mut bytes = der::oid(OID_OCSP_BASIC);
        bytes.extend(der::octet_string(&basic));
        let mut outer = der::tlv(der::TAG_ENUMERATED, &[0]);
        outer.extend(der::explicit(0, &der::sequence(&bytes)));
        der::sequence(&outer)
    }
}

fn generalized_time(t: DateTime<Utc>) -> Vec<u8> {
    der::tlv(
        der::TAG_GENERALIZED_TIME,
        t.format("%Y%m%d%H%M%SZ").to_string().as_bytes(),
    )
}
