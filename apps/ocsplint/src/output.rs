//! Output rendering for lint runs.
//!
//! Supports `human` (default) and `json` outputs. Human output is printed per
//! target as it completes; JSON is collected and printed once as a single
//! document with a top-level `all_passed`.

use crate::acquire::Acquisition;
use crate::config::OutputFormat;
use crate::lint::LintReport;
use crate::models::{Certificate, LintStatus};
use crate::window::RESPONSE_TIME_LIMIT;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::time::Duration;

pub const ALL_PASSED: &str = "OCSP Response passed all lints";

fn use_colors(output: OutputFormat) -> bool {
    output != OutputFormat::Json && std::env::var_os("NO_COLOR").is_none()
}

fn stderr_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if stderr_colors() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if stderr_colors() {
        "note:".cyan().bold().to_string()
    } else {
        "note:".to_string()
    }
}

/// Upper-case hex with `:` between bytes, as certificate viewers print serials.
fn colon_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| hex::encode_upper([*b]))
        .collect::<Vec<_>>()
        .join(":")
}

fn status_tag(status: LintStatus, color: bool) -> String {
    let tag = format!("⟦{}⟧", status);
    if !color {
        return tag;
    }
    match status {
        LintStatus::Error => tag.magenta().bold().to_string(),
        LintStatus::Failed => tag.red().bold().to_string(),
        LintStatus::Unknown => tag.yellow().bold().to_string(),
        LintStatus::Passed => tag.green().bold().to_string(),
    }
}

fn status_icon(status: LintStatus, color: bool) -> String {
    let icon = match status {
        LintStatus::Error => "✖",
        LintStatus::Failed => "✖",
        LintStatus::Unknown => "▲",
        LintStatus::Passed => "✔",
    };
    if !color {
        return icon.to_string();
    }
    match status {
        LintStatus::Error => icon.magenta().to_string(),
        LintStatus::Failed => icon.red().to_string(),
        LintStatus::Unknown => icon.yellow().to_string(),
        LintStatus::Passed => icon.green().to_string(),
    }
}

fn latency_warning(latency: Duration) -> String {
    format!(
        "Server took longer than {}s to respond ({:.1}s)",
        RESPONSE_TIME_LIMIT.as_secs(),
        latency.as_secs_f64()
    )
}

/// Print a certificate summary (`--print`).
pub fn print_certificate(role: &str, cert: &Certificate, output: OutputFormat) {
    let color = use_colors(output);
    let title = format!("{} certificate", role);
    if color {
        println!("{}", title.bold());
    } else {
        println!("{}", title);
    }
    println!("  Subject: {}", cert.subject);
    println!("  Issuer:  {}", cert.issuer);
    println!("  Serial:  {}", colon_hex(&cert.serial));
    println!("  CA:      {}", cert.is_ca);
    println!("  Key:     {}", cert.public_key.kind());
    for url in &cert.ocsp_urls {
        println!("  OCSP:    {}", url);
    }
    for url in &cert.issuer_urls {
        println!("  Issuer URL: {}", url);
    }
}

/// Print one target's lint report in human form.
pub fn print_human(label: &str, acq: &Acquisition, report: &LintReport, output: OutputFormat) {
    let color = use_colors(output);
    if color {
        println!("{}", label.bold());
    } else {
        println!("{}", label);
    }
    println!("OCSP Response status: {}", acq.response.cert_status);
    if acq.latency_violation {
        let line = latency_warning(acq.latency.unwrap_or_default());
        if color {
            println!("{} {}", "▲".yellow(), line.yellow());
        } else {
            println!("▲ {}", line);
        }
    }
    if let Some(path) = &acq.saved_to {
        println!("Saved response to {}", path.display());
    }
    for r in &report.results {
        println!(
            "{} {} {} ❲{}❳ — {}",
            status_icon(r.status, color),
            status_tag(r.status, color),
            r.rule,
            r.source,
            r.message
        );
    }
    if report.all_passed {
        if color {
            println!("{}", ALL_PASSED.green().bold());
        } else {
            println!("{}", ALL_PASSED);
        }
    } else {
        let s = &report.summary;
        let summary = format!(
            "— Summary — passed={} failed={} unknown={} errors={}",
            s.passed, s.failed, s.unknown, s.errors
        );
        if color {
            println!("{}", summary.bold());
        } else {
            println!("{}", summary);
        }
    }
}

fn certificate_json(cert: &Certificate) -> JsonVal {
    json!({
        "subject": cert.subject,
        "issuer": cert.issuer,
        "serial": colon_hex(&cert.serial),
        "is_ca": cert.is_ca,
        "key": cert.public_key.kind(),
        "ocsp_urls": cert.ocsp_urls,
        "issuer_urls": cert.issuer_urls,
    })
}

/// Compose one target's JSON object (pure) for testing/snapshot purposes.
pub fn compose_target_json(
    label: &str,
    acq: &Acquisition,
    report: &LintReport,
    with_certificates: bool,
) -> JsonVal {
    let mut out = json!({
        "target": label,
        "source": acq.source,
        "hash": acq.hash.map(|h| h.to_string()),
        "latency_ms": acq.latency.map(|l| l.as_millis() as u64),
        "latency_violation": acq.latency_violation,
        "saved_to": acq.saved_to.as_ref().map(|p| p.display().to_string()),
        "response_status": acq.response.cert_status.name(),
        "results": report.results,
        "all_passed": report.all_passed,
        "summary": report.summary,
    });
    if with_certificates {
        out["leaf"] = acq.leaf.as_ref().map(certificate_json).unwrap_or(JsonVal::Null);
        out["issuer"] = acq.issuer.as_ref().map(certificate_json).unwrap_or(JsonVal::Null);
    }
    out
}

pub fn compose_error_json(label: &str, error: &str) -> JsonVal {
    json!({ "target": label, "error": error })
}

/// Compose the whole-run JSON document.
pub fn compose_run_json(targets: Vec<JsonVal>, all_passed: bool) -> JsonVal {
    json!({ "targets": targets, "all_passed": all_passed })
}

pub fn print_json(doc: &JsonVal) {
    match serde_json::to_string_pretty(doc) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("{} failed to render JSON: {}", error_prefix(), e),
    }
}
