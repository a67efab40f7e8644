//! Response acquisition: turn a target into a parsed response plus the
//! certificates needed to lint it.
//!
//! Per target: resolve inputs, prefer a stapled response unless told not to,
//! otherwise request one with the configured digest and fall back from
//! SHA-256 to SHA-1 once. Latency over budget is recorded, never fatal.

use crate::codec::{
    build_request, parse_certificate, parse_response, verify_issued_by, verify_response,
};
use crate::error::{self, AcquireError};
use crate::models::{Certificate, HashAlgorithm, OcspResponse};
use crate::transport::{RequestMethod, Transport};
use crate::window::RESPONSE_TIME_LIMIT;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// One thing to lint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// DER OCSP response on disk
    ResponseFile(PathBuf),
    /// Certificate (DER or PEM) whose status is requested
    CertificateFile(PathBuf),
    /// `host[:port]` of a TLS server
    Server(String),
}

impl Target {
    pub fn label(&self) -> String {
        match self {
            Target::ResponseFile(p) | Target::CertificateFile(p) => p.display().to_string(),
            Target::Server(s) => s.clone(),
        }
    }

    /// File name stem used when persisting the response.
    fn file_stem(&self) -> String {
        let raw = match self {
            Target::ResponseFile(p) | Target::CertificateFile(p) => p
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "response".to_string()),
            Target::Server(s) => s.clone(),
        };
        raw.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    File,
    Stapled,
    Fetched,
}

#[derive(Debug, Clone)]
pub struct AcquireOptions {
    /// Issuer supplied by the caller; skips the issuer URL fetch
    pub issuer: Option<Certificate>,
    /// Responder URL override
    pub ocsp_url: Option<String>,
    pub method: RequestMethod,
    /// First digest to try
    pub hash: HashAlgorithm,
    /// Ignore a stapled response and always fetch
    pub no_staple: bool,
    /// Directory receiving `<target>.der`
    pub dir: Option<PathBuf>,
    pub latency_budget: Duration,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            issuer: None,
            ocsp_url: None,
            method: RequestMethod::default(),
            hash: HashAlgorithm::Sha256,
            no_staple: false,
            dir: None,
            latency_budget: RESPONSE_TIME_LIMIT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Acquisition {
    pub response: OcspResponse,
    pub leaf: Option<Certificate>,
    pub issuer: Option<Certificate>,
    pub source: ResponseSource,
    /// Digest used in the request that succeeded
    pub hash: Option<HashAlgorithm>,
    pub latency: Option<Duration>,
    /// Responder exceeded the latency budget
    pub latency_violation: bool,
    pub saved_to: Option<PathBuf>,
}

/// Primary digest and the single fallback tried after it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestPlan {
    pub primary: HashAlgorithm,
    pub fallback: Option<HashAlgorithm>,
}

impl DigestPlan {
    pub fn for_configured(hash: HashAlgorithm) -> Self {
        match hash {
            HashAlgorithm::Sha256 => DigestPlan {
                primary: HashAlgorithm::Sha256,
                fallback: Some(HashAlgorithm::Sha1),
            },
            HashAlgorithm::Sha1 => DigestPlan {
                primary: HashAlgorithm::Sha1,
                fallback: None,
            },
        }
    }
}

struct Fetched {
    response: OcspResponse,
    hash: HashAlgorithm,
    latency: Duration,
}

pub struct Pipeline<'a> {
    transport: &'a dyn Transport,
    options: &'a AcquireOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(transport: &'a dyn Transport, options: &'a AcquireOptions) -> Self {
        Self { transport, options }
    }

    pub fn acquire(&self, target: &Target) -> Result<Acquisition, AcquireError> {
        info!(label = %target.label(), "acquiring OCSP response");
        let mut acq = match target {
            Target::ResponseFile(path) => {
                let bytes = read(path)?;
                Acquisition {
                    response: parse_response(&bytes)?,
                    leaf: None,
                    issuer: self.options.issuer.clone(),
                    source: ResponseSource::File,
                    hash: None,
                    latency: None,
                    latency_violation: false,
                    saved_to: None,
                }
            }
            Target::CertificateFile(path) => {
                let leaf = parse_certificate(&read(path)?)?;
                let issuer = self.resolve_issuer(&leaf)?;
                let fetched = self.fetch_with_fallback(&leaf, &issuer)?;
                self.fetched(leaf, issuer, fetched)
            }
            Target::Server(server) => self.acquire_from_server(server)?,
        };

        if acq.source != ResponseSource::File {
            if let Some(dir) = &self.options.dir {
                acq.saved_to = Some(persist(dir, &target.file_stem(), &acq.response.raw)?);
            }
        }
        Ok(acq)
    }

    fn acquire_from_server(&self, server: &str) -> Result<Acquisition, AcquireError> {
        let handshake = self.transport.handshake(server)?;
        let short_chain = || AcquireError::ShortChain {
            server: server.to_string(),
        };
        let [leaf_der, presented @ ..] = handshake.chain.as_slice() else {
            return Err(short_chain());
        };
        let leaf = parse_certificate(leaf_der)?;
        if leaf.subject == leaf.issuer && verify_issued_by(&leaf, &leaf).is_ok() {
            return Err(short_chain());
        }
        let issuer = self.chain_issuer(server, &leaf, presented)?;

        match handshake.stapled {
            Some(stapled) if !self.options.no_staple => {
                info!(server, "using stapled OCSP response");
                let response = parse_response(&stapled)?;
                verify_response(&response, &issuer)?;
                check_serial(&response, &leaf)?;
                Ok(Acquisition {
                    response,
                    leaf: Some(leaf),
                    issuer: Some(issuer),
                    source: ResponseSource::Stapled,
                    hash: None,
                    latency: None,
                    latency_violation: false,
                    saved_to: None,
                })
            }
            stapled => {
                if stapled.is_some() {
                    info!(server, "ignoring stapled OCSP response");
                }
                let fetched = self.fetch_with_fallback(&leaf, &issuer)?;
                Ok(self.fetched(leaf, issuer, fetched))
            }
        }
    }

    fn fetched(&self, leaf: Certificate, issuer: Certificate, fetched: Fetched) -> Acquisition {
        let latency_violation = fetched.latency > self.options.latency_budget;
        if latency_violation {
            warn!(
                latency_ms = fetched.latency.as_millis() as u64,
                "Server took longer than {}s to respond",
                self.options.latency_budget.as_secs()
            );
        }
        Acquisition {
            response: fetched.response,
            leaf: Some(leaf),
            issuer: Some(issuer),
            source: ResponseSource::Fetched,
            hash: Some(fetched.hash),
            latency: Some(fetched.latency),
            latency_violation,
            saved_to: None,
        }
    }

    /// The certificate whose key signed `leaf`. Servers may send extra or
    /// unordered intermediates, or none at all; the first presented
    /// certificate that verifies the leaf wins, otherwise the issuer is
    /// resolved as for certificate files.
    fn chain_issuer(
        &self,
        server: &str,
        leaf: &Certificate,
        presented: &[Vec<u8>],
    ) -> Result<Certificate, AcquireError> {
        for der in presented {
            match parse_certificate(der) {
                Ok(candidate) if verify_issued_by(leaf, &candidate).is_ok() => {
                    return Ok(candidate)
                }
                Ok(candidate) => {
                    debug!(subject = %candidate.subject, "chain certificate did not issue the leaf")
                }
                Err(e) => debug!(error = %e, "skipping undecodable chain certificate"),
            }
        }
        info!(server, "issuer not presented by server, resolving from leaf");
        self.resolve_issuer(leaf)
    }

    fn resolve_issuer(&self, leaf: &Certificate) -> Result<Certificate, AcquireError> {
        if let Some(issuer) = &self.options.issuer {
            return Ok(issuer.clone());
        }
        let url = leaf.issuer_urls.first().ok_or(AcquireError::NoIssuerUrl)?;
        let der = self.transport.fetch_certificate(url)?;
        Ok(parse_certificate(&der)?)
    }

    fn fetch_with_fallback(
        &self,
        leaf: &Certificate,
        issuer: &Certificate,
    ) -> Result<Fetched, AcquireError> {
        let url = self
            .options
            .ocsp_url
            .as_ref()
            .or_else(|| leaf.ocsp_urls.first())
            .ok_or(AcquireError::NoOcspUrl)?;

        let plan = DigestPlan::for_configured(self.options.hash);
        let primary_err = match self.fetch_once(url, leaf, issuer, plan.primary) {
            Ok(fetched) => return Ok(fetched),
            Err(e) => e,
        };
        let Some(fallback) = plan.fallback else {
            return Err(primary_err);
        };

        info!(
            error = %error::chain(&primary_err),
            "{} OCSP request failed, retrying with {}",
            plan.primary,
            fallback
        );
        self.fetch_once(url, leaf, issuer, fallback)
            .map_err(|source| AcquireError::FallbackExhausted {
                primary: plan.primary,
                primary_error: error::chain(&primary_err),
                fallback,
                source: Box::new(source),
            })
    }

    fn fetch_once(
        &self,
        url: &str,
        leaf: &Certificate,
        issuer: &Certificate,
        hash: HashAlgorithm,
    ) -> Result<Fetched, AcquireError> {
        let request = build_request(leaf, issuer, hash)?;
        let started = Instant::now();
        let body = self
            .transport
            .send_request(url, self.options.method, &request)?;
        let latency = started.elapsed();
        let response = parse_response(&body)?;
        verify_response(&response, issuer)?;
        check_serial(&response, leaf)?;
        info!(url, %hash, latency_ms = latency.as_millis() as u64, "OCSP response received");
        Ok(Fetched {
            response,
            hash,
            latency,
        })
    }
}

fn read(path: &Path) -> Result<Vec<u8>, AcquireError> {
    fs::read(path).map_err(|source| AcquireError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn check_serial(response: &OcspResponse, leaf: &Certificate) -> Result<(), AcquireError> {
    if response.serial == leaf.serial {
        Ok(())
    } else {
        Err(AcquireError::SerialMismatch {
            expected: hex::encode(&leaf.serial),
            got: hex::encode(&response.serial),
        })
    }
}

fn persist(dir: &Path, stem: &str, raw: &[u8]) -> Result<PathBuf, AcquireError> {
    let path = dir.join(format!("{}.der", stem));
    let persist_err = |source| AcquireError::Persist {
        path: path.clone(),
        source,
    };
    fs::create_dir_all(dir).map_err(persist_err)?;
    fs::write(&path, raw).map_err(persist_err)?;
    info!(path = %path.display(), "saved OCSP response");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::der;
    use crate::codec::testing::{CertSpec, ResponseSpec, TestKey};
    use crate::transport::ServerHandshake;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    struct Fixture {
        ca_key: TestKey,
        issuer_der: Vec<u8>,
        leaf_der: Vec<u8>,
        leaf: Certificate,
    }

    impl Fixture {
        fn new() -> Self {
            let ca_key = TestKey::generate();
            let issuer_der = ca_key.self_signed(&CertSpec::ca("Issuing CA"));
            let leaf_key = TestKey::generate();
            let leaf_der = ca_key.issue(
                &CertSpec {
                    ocsp_url: Some("http://ocsp.example.test"),
                    issuer_url: Some("http://ca.example.test/issuer.der"),
                    ..CertSpec::leaf("www.example.test")
                },
                "Issuing CA",
                &leaf_key,
            );
            let leaf = parse_certificate(&leaf_der).unwrap();
            Self {
                ca_key,
                issuer_der,
                leaf_der,
                leaf,
            }
        }

        fn response(&self) -> Vec<u8> {
            ResponseSpec {
                serial: self.leaf.serial.clone(),
                ..ResponseSpec::good()
            }
            .encode(Some(&self.ca_key))
        }
    }

    #[derive(Default)]
    struct MockTransport {
        replies: RefCell<VecDeque<Result<Vec<u8>, AcquireError>>>,
        requests: RefCell<Vec<(String, RequestMethod, Vec<u8>)>>,
        certificates: RefCell<Vec<String>>,
        issuer: Vec<u8>,
        handshake: Option<ServerHandshake>,
        delay: Duration,
    }

    impl MockTransport {
        fn reply(self, r: Result<Vec<u8>, AcquireError>) -> Self {
            self.replies.borrow_mut().push_back(r);
            self
        }
    }

    impl Transport for MockTransport {
        fn fetch_certificate(&self, url: &str) -> Result<Vec<u8>, AcquireError> {
            self.certificates.borrow_mut().push(url.to_string());
            Ok(self.issuer.clone())
        }

        fn send_request(
            &self,
            url: &str,
            method: RequestMethod,
            request: &[u8],
        ) -> Result<Vec<u8>, AcquireError> {
            std::thread::sleep(self.delay);
            self.requests
                .borrow_mut()
                .push((url.to_string(), method, request.to_vec()));
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(AcquireError::Timeout(Duration::from_secs(20))))
        }

        fn handshake(&self, server: &str) -> Result<ServerHandshake, AcquireError> {
            self.handshake.clone().ok_or_else(|| AcquireError::Handshake {
                server: server.to_string(),
                details: "no handshake scripted".into(),
            })
        }
    }

    fn http_500() -> Result<Vec<u8>, AcquireError> {
        Err(AcquireError::HttpStatus {
            url: "http://ocsp.example.test".into(),
            status: 500,
        })
    }

    fn request_hash_oid(request: &[u8]) -> String {
        let outer = der::parse_single(request, "req").unwrap();
        let tbs = outer.children().next_tlv("tbs").unwrap();
        let list = tbs.children().next_tlv("list").unwrap();
        let req = list.children().next_tlv("req").unwrap();
        let cert_id = req.children().next_tlv("certid").unwrap();
        let alg = cert_id.children().next_tlv("alg").unwrap();
        let oid = alg.children().next_tlv("oid").unwrap();
        der::oid_to_string(oid.value).unwrap()
    }

    fn write_temp(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_sha256_http_error_falls_back_to_sha1() {
        let fx = Fixture::new();
        let transport = MockTransport {
            issuer: fx.issuer_der.clone(),
            ..Default::default()
        }
        .reply(http_500())
        .reply(Ok(fx.response()));
        let tmp = tempfile::tempdir().unwrap();
        let leaf = write_temp(tmp.path(), "leaf.der", &fx.leaf_der);

        let opts = AcquireOptions::default();
        let acq = Pipeline::new(&transport, &opts)
            .acquire(&Target::CertificateFile(leaf))
            .unwrap();

        assert_eq!(acq.source, ResponseSource::Fetched);
        assert_eq!(acq.hash, Some(HashAlgorithm::Sha1));
        let requests = transport.requests.borrow();
        assert_eq!(requests.len(), 2);
        assert_eq!(request_hash_oid(&requests[0].2), HashAlgorithm::Sha256.oid());
        assert_eq!(request_hash_oid(&requests[1].2), HashAlgorithm::Sha1.oid());
        assert_eq!(requests[0].0, "http://ocsp.example.test");
        assert_eq!(
            transport.certificates.borrow().as_slice(),
            ["http://ca.example.test/issuer.der".to_string()]
        );
    }

    #[test]
    fn test_both_digests_failing_keeps_cause_chain() {
        let fx = Fixture::new();
        let transport = MockTransport {
            issuer: fx.issuer_der.clone(),
            ..Default::default()
        }
        .reply(http_500())
        .reply(Ok(b"not der".to_vec()));
        let tmp = tempfile::tempdir().unwrap();
        let leaf = write_temp(tmp.path(), "leaf.der", &fx.leaf_der);

        let opts = AcquireOptions::default();
        let err = Pipeline::new(&transport, &opts)
            .acquire(&Target::CertificateFile(leaf))
            .unwrap_err();
        match &err {
            AcquireError::FallbackExhausted {
                primary,
                primary_error,
                fallback,
                source,
            } => {
                assert_eq!(*primary, HashAlgorithm::Sha256);
                assert_eq!(*fallback, HashAlgorithm::Sha1);
                assert!(primary_error.contains("HTTP 500"));
                assert!(matches!(**source, AcquireError::Decode(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(error::chain(&err).contains("malformed DER"));
    }

    #[test]
    fn test_configured_sha1_makes_a_single_attempt() {
        let fx = Fixture::new();
        let transport = MockTransport {
            issuer: fx.issuer_der.clone(),
            ..Default::default()
        }
        .reply(http_500());
        let tmp = tempfile::tempdir().unwrap();
        let leaf = write_temp(tmp.path(), "leaf.der", &fx.leaf_der);

        let opts = AcquireOptions {
            hash: HashAlgorithm::Sha1,
            method: RequestMethod::Get,
            ..AcquireOptions::default()
        };
        let err = Pipeline::new(&transport, &opts)
            .acquire(&Target::CertificateFile(leaf))
            .unwrap_err();
        assert!(matches!(err, AcquireError::HttpStatus { status: 500, .. }));
        let requests = transport.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1, RequestMethod::Get);
    }

    #[test]
    fn test_stapled_response_skips_network_fetch() {
        let fx = Fixture::new();
        let transport = MockTransport {
            handshake: Some(ServerHandshake {
                chain: vec![fx.leaf_der.clone(), fx.issuer_der.clone()],
                stapled: Some(fx.response()),
            }),
            ..Default::default()
        };
        let opts = AcquireOptions::default();
        let acq = Pipeline::new(&transport, &opts)
            .acquire(&Target::Server("www.example.test".into()))
            .unwrap();
        assert_eq!(acq.source, ResponseSource::Stapled);
        assert!(transport.requests.borrow().is_empty());
        assert_eq!(acq.leaf.as_ref().map(|c| &c.serial), Some(&fx.leaf.serial));
    }

    #[test]
    fn test_no_staple_forces_fetch() {
        let fx = Fixture::new();
        let transport = MockTransport {
            handshake: Some(ServerHandshake {
                chain: vec![fx.leaf_der.clone(), fx.issuer_der.clone()],
                stapled: Some(fx.response()),
            }),
            ..Default::default()
        }
        .reply(Ok(fx.response()));
        let opts = AcquireOptions {
            no_staple: true,
            ocsp_url: Some("http://override.example.test".into()),
            ..AcquireOptions::default()
        };
        let acq = Pipeline::new(&transport, &opts)
            .acquire(&Target::Server("www.example.test:443".into()))
            .unwrap();
        assert_eq!(acq.source, ResponseSource::Fetched);
        assert_eq!(acq.hash, Some(HashAlgorithm::Sha256));
        assert_eq!(transport.requests.borrow()[0].0, "http://override.example.test");
    }

    #[test]
    fn test_issuer_is_the_chain_certificate_that_signed_the_leaf() {
        let fx = Fixture::new();
        let cross = TestKey::generate().self_signed(&CertSpec::ca("Cross Root"));
        let transport = MockTransport {
            handshake: Some(ServerHandshake {
                chain: vec![fx.leaf_der.clone(), cross, fx.issuer_der.clone()],
                stapled: Some(fx.response()),
            }),
            ..Default::default()
        };
        let opts = AcquireOptions::default();
        let acq = Pipeline::new(&transport, &opts)
            .acquire(&Target::Server("www.example.test".into()))
            .unwrap();
        assert_eq!(acq.source, ResponseSource::Stapled);
        assert_eq!(
            acq.issuer.as_ref().map(|c| c.der.as_slice()),
            Some(fx.issuer_der.as_slice())
        );
    }

    #[test]
    fn test_leaf_only_chain_resolves_issuer_from_aia() {
        let fx = Fixture::new();
        let transport = MockTransport {
            issuer: fx.issuer_der.clone(),
            handshake: Some(ServerHandshake {
                chain: vec![fx.leaf_der.clone()],
                stapled: Some(fx.response()),
            }),
            ..Default::default()
        };
        let opts = AcquireOptions::default();
        let acq = Pipeline::new(&transport, &opts)
            .acquire(&Target::Server("www.example.test".into()))
            .unwrap();
        assert_eq!(acq.source, ResponseSource::Stapled);
        assert_eq!(
            transport.certificates.borrow().as_slice(),
            ["http://ca.example.test/issuer.der".to_string()]
        );
    }

    #[test]
    fn test_root_only_chain_is_rejected() {
        let fx = Fixture::new();
        let transport = MockTransport {
            handshake: Some(ServerHandshake {
                chain: vec![fx.issuer_der.clone()],
                stapled: None,
            }),
            ..Default::default()
        };
        let opts = AcquireOptions::default();
        let err = Pipeline::new(&transport, &opts)
            .acquire(&Target::Server("root.example.test".into()))
            .unwrap_err();
        assert!(matches!(err, AcquireError::ShortChain { .. }));
    }

    #[test]
    fn test_missing_urls() {
        let ca_key = TestKey::generate();
        let bare = ca_key.issue(&CertSpec::leaf("bare"), "Issuing CA", &TestKey::generate());
        let tmp = tempfile::tempdir().unwrap();
        let leaf = write_temp(tmp.path(), "bare.der", &bare);
        let transport = MockTransport::default();

        let opts = AcquireOptions::default();
        let err = Pipeline::new(&transport, &opts)
            .acquire(&Target::CertificateFile(leaf.clone()))
            .unwrap_err();
        assert!(matches!(err, AcquireError::NoIssuerUrl));

        let issuer = parse_certificate(&ca_key.self_signed(&CertSpec::ca("Issuing CA"))).unwrap();
        let opts = AcquireOptions {
            issuer: Some(issuer),
            ..AcquireOptions::default()
        };
        let err = Pipeline::new(&transport, &opts)
            .acquire(&Target::CertificateFile(leaf))
            .unwrap_err();
        assert!(matches!(err, AcquireError::NoOcspUrl));
    }

    #[test]
    fn test_response_file_and_persistence() {
        let fx = Fixture::new();
        let tmp = tempfile::tempdir().unwrap();
        let path = write_temp(tmp.path(), "resp.der", &fx.response());
        let transport = MockTransport::default();

        let opts = AcquireOptions {
            dir: Some(tmp.path().join("out")),
            ..AcquireOptions::default()
        };
        let acq = Pipeline::new(&transport, &opts)
            .acquire(&Target::ResponseFile(path))
            .unwrap();
        assert_eq!(acq.source, ResponseSource::File);
        assert!(acq.saved_to.is_none());

        let transport = MockTransport {
            handshake: Some(ServerHandshake {
                chain: vec![fx.leaf_der.clone(), fx.issuer_der.clone()],
                stapled: Some(fx.response()),
            }),
            ..Default::default()
        };
        let acq = Pipeline::new(&transport, &opts)
            .acquire(&Target::Server("www.example.test:443".into()))
            .unwrap();
        let saved = acq.saved_to.unwrap();
        assert_eq!(saved, tmp.path().join("out").join("www.example.test_443.der"));
        assert_eq!(fs::read(saved).unwrap(), acq.response.raw);
    }

    #[test]
    fn test_unreadable_file() {
        let transport = MockTransport::default();
        let opts = AcquireOptions::default();
        let err = Pipeline::new(&transport, &opts)
            .acquire(&Target::ResponseFile("/nonexistent/ocsplint/resp.der".into()))
            .unwrap_err();
        assert!(matches!(err, AcquireError::Read { .. }));
    }

    #[test]
    fn test_slow_responder_is_flagged_not_fatal() {
        let fx = Fixture::new();
        let transport = MockTransport {
            issuer: fx.issuer_der.clone(),
            delay: Duration::from_millis(20),
            ..Default::default()
        }
        .reply(Ok(fx.response()));
        let tmp = tempfile::tempdir().unwrap();
        let leaf = write_temp(tmp.path(), "leaf.der", &fx.leaf_der);

        let opts = AcquireOptions {
            latency_budget: Duration::from_millis(1),
            ..AcquireOptions::default()
        };
        let acq = Pipeline::new(&transport, &opts)
            .acquire(&Target::CertificateFile(leaf))
            .unwrap();
        assert!(acq.latency_violation);
        assert!(acq.latency.unwrap() >= Duration::from_millis(20));
    }

    #[test]
    fn test_serial_mismatch_is_rejected() {
        let fx = Fixture::new();
        let wrong = ResponseSpec {
            serial: vec![0x7f, 0x7f],
            ..ResponseSpec::good()
        }
        .encode(Some(&fx.ca_key));
        let transport = MockTransport {
            handshake: Some(ServerHandshake {
                chain: vec![fx.leaf_der.clone(), fx.issuer_der.clone()],
                stapled: Some(wrong),
            }),
            ..Default::default()
        };
        let opts = AcquireOptions::default();
        let err = Pipeline::new(&transport, &opts)
            .acquire(&Target::Server("www.example.test".into()))
            .unwrap_err();
        assert!(matches!(err, AcquireError::SerialMismatch { .. }));
    }
}
