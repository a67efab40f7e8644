//! CLI argument parsing via `clap`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ocsplint",
    version,
    about = "Lint OCSP responses against the Apple Lints policy",
    long_about = "ocsplint validates OCSP responses read from disk, requested for a certificate, or stapled by a TLS server.\n\nConfiguration precedence: CLI > ocsplint.toml > defaults.",
    after_help = "Examples:\n  ocsplint resp response.der --issuer ca.pem\n  ocsplint cert leaf.pem --get --dir responses\n  ocsplint url example.com --no-staple --output json",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported input modes.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current ocsplint version.")]
    Version,
    /// Lint OCSP responses stored on disk
    #[command(
        about = "Lint OCSP response files",
        long_about = "Parse DER-encoded OCSP responses and run every lint. Responder checks need --issuer.",
        after_help = "Examples:\n  ocsplint resp out/*.der --issuer ca.pem\n  ocsplint resp resp.der --ca-cert -v"
    )]
    Resp {
        #[arg(required = true, help = "OCSP response files (glob patterns allowed)")]
        files: Vec<String>,
        #[arg(long, help = "Issuer certificate (DER or PEM)")]
        issuer: Option<PathBuf>,
        #[command(flatten)]
        lint: LintArgs,
    },
    /// Request OCSP responses for certificates
    #[command(
        about = "Lint responses fetched for certificates",
        long_about = "Build an OCSP request for each certificate, send it to its responder and lint the reply. The issuer is fetched from the certificate's AIA unless --issuer is given.",
        after_help = "Examples:\n  ocsplint cert leaf.pem\n  ocsplint cert leaf.der --issuer ca.der --ocsp-url http://ocsp.example.com --get"
    )]
    Cert {
        #[arg(required = true, help = "Certificate files, DER or PEM (glob patterns allowed)")]
        files: Vec<String>,
        #[arg(long, help = "Issuer certificate (DER or PEM)")]
        issuer: Option<PathBuf>,
        #[command(flatten)]
        fetch: FetchArgs,
        #[command(flatten)]
        lint: LintArgs,
    },
    /// Lint the response a TLS server staples or its responder returns
    #[command(
        about = "Lint responses for TLS servers",
        long_about = "Connect to each server, take the leaf and issuer from the presented chain and lint the stapled response, or fetch one when none is stapled or --no-staple is set.",
        after_help = "Examples:\n  ocsplint url example.com\n  ocsplint url example.com:8443 --no-staple --sha1"
    )]
    Url {
        #[arg(required = true, help = "Servers as HOST[:PORT]")]
        servers: Vec<String>,
        #[command(flatten)]
        fetch: FetchArgs,
        #[command(flatten)]
        lint: LintArgs,
    },
}

/// Options shared by every lint mode.
#[derive(Args, Debug, Default, Clone)]
pub struct LintArgs {
    #[arg(long, help = "Directory where config discovery starts (default: current dir)")]
    pub root: Option<PathBuf>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Certificate is a subordinate CA certificate")]
    pub ca_cert: bool,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Certificate was never issued by the issuer")]
    pub non_issued: bool,
    #[arg(long, action = clap::ArgAction::SetTrue, conflicts_with = "expect_revoked", help = "Expect status good")]
    pub expect_good: bool,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Expect status revoked")]
    pub expect_revoked: bool,
    #[arg(short, long, action = clap::ArgAction::SetTrue, help = "Also show passed lints")]
    pub verbose: bool,
    #[arg(long, help = "Output mode: human|json (default: human)")]
    pub output: Option<String>,
}

/// Options controlling how responses are requested.
#[derive(Args, Debug, Default, Clone)]
pub struct FetchArgs {
    #[arg(long, help = "OCSP responder URL overriding the certificate's AIA")]
    pub ocsp_url: Option<String>,
    #[arg(long, help = "Directory to save raw responses into")]
    pub dir: Option<PathBuf>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Send requests with HTTP GET instead of POST")]
    pub get: bool,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Hash CertID with SHA-1 only (no SHA-256 attempt)")]
    pub sha1: bool,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Ignore stapled responses and always fetch")]
    pub no_staple: bool,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Print a summary of the leaf and issuer certificates")]
    pub print: bool,
    #[arg(long, help = "Network timeout in seconds (default: 20)")]
    pub timeout: Option<u64>,
}
