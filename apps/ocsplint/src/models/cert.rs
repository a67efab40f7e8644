//! Owned certificate view used by the linter and the acquisition pipeline.

/// Issuer public key, restricted to the encodings the responder check knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    /// PKCS#1 RSAPublicKey DER
    Rsa { pkcs1: Vec<u8> },
    /// SEC1 point as carried in the SubjectPublicKeyInfo
    Ec { point: Vec<u8> },
    Unsupported { algorithm: String },
}

impl PublicKey {
    /// Canonical bytes hashed when matching a responder key hash.
    ///
    /// RSA keys use their PKCS#1 encoding and EC keys their compressed
    /// point. Other key types return `None`.
    pub fn canonical_bytes(&self) -> Option<Vec<u8>> {
        match self {
            PublicKey::Rsa { pkcs1 } => Some(pkcs1.clone()),
            PublicKey::Ec { point } => Some(compress_point(point)),
            PublicKey::Unsupported { .. } => None,
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            PublicKey::Rsa { .. } => "RSA",
            PublicKey::Ec { .. } => "EC",
            PublicKey::Unsupported { algorithm } => algorithm,
        }
    }
}

/// Convert an uncompressed SEC1 point (`04 || X || Y`) to compressed form.
/// Already-compressed or malformed input is returned unchanged.
fn compress_point(point: &[u8]) -> Vec<u8> {
    if point.first() != Some(&0x04) || point.len() % 2 == 0 {
        return point.to_vec();
    }
    let coord_len = (point.len() - 1) / 2;
    let x = &point[1..1 + coord_len];
    let y_last = point[point.len() - 1];
    let mut out = Vec::with_capacity(coord_len + 1);
    out.push(0x02 | (y_last & 1));
    out.extend_from_slice(x);
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub der: Vec<u8>,
    /// Raw DER of the subject Name
    pub raw_subject: Vec<u8>,
    pub subject: String,
    pub issuer: String,
    pub serial: Vec<u8>,
    pub is_ca: bool,
    pub public_key: PublicKey,
    /// DER of the SubjectPublicKeyInfo
    pub spki: Vec<u8>,
    pub ocsp_urls: Vec<String>,
    pub issuer_urls: Vec<String>,
}
