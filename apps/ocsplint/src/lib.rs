//! ocsplint core library.
//!
//! This crate exposes programmatic APIs for linting OCSP responses against the
//! Apple Lints root-program policy and for acquiring those responses.
//!
//! High-level modules:
//! - `acquire`: Per-target acquisition with stapling and SHA-256 to SHA-1 fallback.
//! - `checks`: Rule bodies registered by `LintRegistry::apple_lints`.
//! - `cli`: CLI argument parsing (binary uses this).
//! - `codec`: DER toolkit, OCSP request/response codec, certificate decoding.
//! - `config`: Discovery and effective configuration resolution.
//! - `error`: Error types per concern.
//! - `lint`: Rule registry, engine and report.
//! - `models`: Responses, certificates, lint options and lint output structs.
//! - `output`: Human/JSON printers.
//! - `responder`: Responder identity decision tree.
//! - `transport`: HTTP and TLS collaborators behind the `Transport` trait.
//! - `window`: Policy time windows.
pub mod acquire;
pub mod checks;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod lint;
pub mod models;
pub mod output;
pub mod responder;
pub mod transport;
pub mod window;
