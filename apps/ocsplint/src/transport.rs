//! Network collaborators for acquisition: HTTP fetches and TLS handshakes.
//!
//! `Transport` is the seam the acquisition pipeline talks to; `NetTransport`
//! is the blocking implementation built on `reqwest` and `rustls`.

use crate::error::AcquireError;
use base64::Engine;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, ClientConnection, DigitallySignedStruct, RootCertStore, SignatureScheme, StreamOwned};
use serde::{Deserialize, Serialize};
use std::net::{TcpStream, ToSocketAddrs};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

const OCSP_REQUEST_TYPE: &str = "application/ocsp-request";
const OCSP_RESPONSE_TYPE: &str = "application/ocsp-response";

/// HTTP method used to deliver an OCSP request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestMethod {
    Get,
    #[default]
    Post,
}

impl FromStr for RequestMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "get" => Ok(RequestMethod::Get),
            "post" => Ok(RequestMethod::Post),
            other => Err(other.to_string()),
        }
    }
}

/// What a TLS server presented during the handshake.
#[derive(Debug, Clone, Default)]
pub struct ServerHandshake {
    /// DER certificates, leaf first
    pub chain: Vec<Vec<u8>>,
    /// Stapled OCSP response, if the server sent one
    pub stapled: Option<Vec<u8>>,
}

pub trait Transport {
    /// Download a certificate (issuer URL from the AIA extension).
    fn fetch_certificate(&self, url: &str) -> Result<Vec<u8>, AcquireError>;

    /// Deliver a DER OCSP request and return the raw response body.
    fn send_request(
        &self,
        url: &str,
        method: RequestMethod,
        request: &[u8],
    ) -> Result<Vec<u8>, AcquireError>;

    /// Handshake with `server` (`host[:port]`) and capture chain and staple.
    fn handshake(&self, server: &str) -> Result<ServerHandshake, AcquireError>;
}

/// GET form of an OCSP request: URL-encoded base64 appended after `/`.
pub fn get_url(base: &str, request: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(request);
    let escaped = urlencoding::encode(&encoded);
    if base.ends_with('/') {
        format!("{}{}", base, escaped)
    } else {
        format!("{}/{}", base, escaped)
    }
}

/// Split `host[:port]` (optionally with an `https://` prefix and path).
pub fn split_host_port(server: &str) -> (String, u16) {
    let s = server
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let authority = s.split('/').next().unwrap_or(s);
    match authority.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && !host.contains(':') => match port.parse() {
            Ok(p) => (host.to_string(), p),
            Err(_) => (authority.to_string(), 443),
        },
        _ => (authority.to_string(), 443),
    }
}

pub struct NetTransport {
    http: reqwest::blocking::Client,
    timeout: Duration,
}

impl NetTransport {
    pub fn new(timeout: Duration) -> Result<Self, AcquireError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AcquireError::HttpClient)?;
        Ok(Self { http, timeout })
    }

    fn http_error(&self, url: &str, e: reqwest::Error) -> AcquireError {
        if e.is_timeout() {
            AcquireError::Timeout(self.timeout)
        } else {
            AcquireError::Http {
                url: url.to_string(),
                source: e,
            }
        }
    }

    fn read_body(&self, url: &str, resp: reqwest::blocking::Response) -> Result<Vec<u8>, AcquireError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(AcquireError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        resp.bytes()
            .map(|b| b.to_vec())
            .map_err(|e| self.http_error(url, e))
    }
}

impl Transport for NetTransport {
    fn fetch_certificate(&self, url: &str) -> Result<Vec<u8>, AcquireError> {
        info!(url, "fetching issuer certificate");
        let resp = self
            .http
            .get(url)
            .send()
            .map_err(|e| self.http_error(url, e))?;
        self.read_body(url, resp)
    }

    fn send_request(
        &self,
        url: &str,
        method: RequestMethod,
        request: &[u8],
    ) -> Result<Vec<u8>, AcquireError> {
        let builder = match method {
            RequestMethod::Get => self.http.get(get_url(url, request)),
            RequestMethod::Post => self.http.post(url).body(request.to_vec()),
        };
        info!(url, ?method, "sending OCSP request");
        let resp = builder
            .header(CONTENT_TYPE, OCSP_REQUEST_TYPE)
            .header(ACCEPT, OCSP_RESPONSE_TYPE)
            .send()
            .map_err(|e| self.http_error(url, e))?;
        self.read_body(url, resp)
    }

    fn handshake(&self, server: &str) -> Result<ServerHandshake, AcquireError> {
        let (host, port) = split_host_port(server);
        let handshake_err = |details: String| AcquireError::Handshake {
            server: server.to_string(),
            details,
        };

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let inner = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider.clone())
            .build()
            .map_err(|e| handshake_err(e.to_string()))?;
        let recorder = Arc::new(StapleRecorder {
            inner,
            stapled: Mutex::new(None),
        });

        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| handshake_err(e.to_string()))?
            .dangerous()
            .with_custom_certificate_verifier(recorder.clone())
            .with_no_client_auth();
        let name = ServerName::try_from(host.clone())
            .map_err(|_| handshake_err(format!("invalid server name '{}'", host)))?;
        let conn = ClientConnection::new(Arc::new(config), name)
            .map_err(|e| handshake_err(e.to_string()))?;

        let connect_err = |source: std::io::Error| AcquireError::Connect {
            server: server.to_string(),
            source,
        };
        let addr = (host.as_str(), port)
            .to_socket_addrs()
            .map_err(connect_err)?
            .next()
            .ok_or_else(|| {
                connect_err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no address resolved",
                ))
            })?;
        debug!(%addr, "connecting");
        let sock = TcpStream::connect_timeout(&addr, self.timeout).map_err(connect_err)?;
        sock.set_read_timeout(Some(self.timeout)).map_err(connect_err)?;
        sock.set_write_timeout(Some(self.timeout)).map_err(connect_err)?;

        let mut tls = StreamOwned::new(conn, sock);
        while tls.conn.is_handshaking() {
            tls.conn
                .complete_io(&mut tls.sock)
                .map_err(|e| handshake_err(e.to_string()))?;
        }

        let chain: Vec<Vec<u8>> = tls
            .conn
            .peer_certificates()
            .map(|certs| certs.iter().map(|c| c.as_ref().to_vec()).collect())
            .unwrap_or_default();
        tls.conn.send_close_notify();
        let _ = tls.conn.complete_io(&mut tls.sock);

        let stapled = recorder.stapled.lock().ok().and_then(|mut slot| slot.take());
        info!(
            server,
            chain_len = chain.len(),
            stapled = stapled.is_some(),
            "TLS handshake complete"
        );
        Ok(ServerHandshake { chain, stapled })
    }
}

/// Delegates to webpki verification and keeps the stapled OCSP bytes.
#[derive(Debug)]
struct StapleRecorder {
    inner: Arc<WebPkiServerVerifier>,
    stapled: Mutex<Option<Vec<u8>>>,
}

impl ServerCertVerifier for StapleRecorder {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        if !ocsp_response.is_empty() {
            if let Ok(mut slot) = self.stapled.lock() {
                *slot = Some(ocsp_response.to_vec());
            }
        }
        self.inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_url_escapes_base64() {
        // 0xfb 0xff 0xbe encodes to "+/++" in standard base64
        let url = get_url("http://ocsp.example.test", &[0xfb, 0xff, 0xbe]);
        assert_eq!(url, "http://ocsp.example.test/%2B%2F%2B%2B");
        let url = get_url("http://ocsp.example.test/", &[0x01]);
        assert_eq!(url, "http://ocsp.example.test/AQ%3D%3D");
    }

    #[test]
    fn test_split_host_port() {
        assert_eq!(split_host_port("example.com"), ("example.com".into(), 443));
        assert_eq!(split_host_port("example.com:8443"), ("example.com".into(), 8443));
        assert_eq!(
            split_host_port("https://example.com:444/path"),
            ("example.com".into(), 444)
        );
        assert_eq!(split_host_port("example.com:abc"), ("example.com:abc".into(), 443));
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("GET".parse::<RequestMethod>(), Ok(RequestMethod::Get));
        assert_eq!("post".parse::<RequestMethod>(), Ok(RequestMethod::Post));
        assert!("put".parse::<RequestMethod>().is_err());
    }
}
