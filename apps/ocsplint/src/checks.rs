//! Rule bodies for the Apple Lints OCSP policy.
//!
//! Each rule is a plain function over `LintContext`; `APPLE_LINTS` lists them
//! in registration order.

use crate::lint::{LintContext, LintRule, Verdict};
use crate::models::{CertClass, CertStatus, ExpectedStatus, LintStatus};
use crate::responder;
use crate::window::{PolicyWindow, NEXT_UPDATE_VALIDITY};
use chrono::{DateTime, Utc};

pub const APPLE_LINTS: &[LintRule] = &[
    LintRule {
        name: "Check response signature",
        source: "Apple Lints 10 & 12",
        evaluate: check_signature,
    },
    LintRule {
        name: "Check OCSP responder",
        source: "Apple Lint 13",
        evaluate: check_responder,
    },
    LintRule {
        name: "Check response producedAt date",
        source: "Apple Lints 03 & 05",
        evaluate: check_produced_at,
    },
    LintRule {
        name: "Check response thisUpdate date",
        source: "Apple Lints 03 & 05",
        evaluate: check_this_update,
    },
    LintRule {
        name: "Check response nextUpdate date",
        source: "Apple Lint 04",
        evaluate: check_next_update,
    },
    LintRule {
        name: "Check status of non-issued certificate",
        source: "Apple Lint 06",
        evaluate: check_non_issued,
    },
    LintRule {
        name: "Check expected response status",
        source: "User expectation",
        evaluate: check_expected_status,
    },
];

fn fmt_time(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Response must be signed, and not with a SHA-1 based algorithm.
pub fn check_signature(ctx: &LintContext<'_>) -> Verdict {
    let resp = ctx.response;
    if resp.signature.is_empty() {
        return (LintStatus::Failed, "OCSP Response is not signed".into());
    }
    if resp.signature_algorithm.uses_sha1() {
        return (
            LintStatus::Failed,
            format!(
                "OCSP Response is signed with an algorithm that uses SHA1 ({})",
                resp.signature_algorithm
            ),
        );
    }
    (
        LintStatus::Passed,
        format!(
            "OCSP Response is signed with {}",
            resp.signature_algorithm
        ),
    )
}

pub fn check_responder(ctx: &LintContext<'_>) -> Verdict {
    responder::check_responder(ctx.response, ctx.issuer)
}

pub fn check_produced_at(ctx: &LintContext<'_>) -> Verdict {
    let window = PolicyWindow::freshness(ctx.options.cert_class);
    freshness(ctx, window, "producedAt", ctx.response.produced_at)
}

pub fn check_this_update(ctx: &LintContext<'_>) -> Verdict {
    let window = PolicyWindow::freshness(ctx.options.cert_class);
    freshness(ctx, window, "thisUpdate", ctx.response.this_update)
}

fn freshness(
    ctx: &LintContext<'_>,
    window: PolicyWindow,
    field: &str,
    at: DateTime<Utc>,
) -> Verdict {
    let class = ctx.options.cert_class;
    let limit = match window.duration() {
        Ok(d) => d,
        Err(e) => return (LintStatus::Error, e.to_string()),
    };
    let (status, relation) = if ctx.now - at > limit {
        (LintStatus::Failed, "more than")
    } else {
        (LintStatus::Passed, "within")
    };
    (
        status,
        format!(
            "OCSP Response {} date {} for {} is {} {} in the past",
            field,
            fmt_time(at),
            class.describe(),
            relation,
            window.display
        ),
    )
}

/// Subscriber responses may not span more than the validity window.
pub fn check_next_update(ctx: &LintContext<'_>) -> Verdict {
    next_update_within(ctx, NEXT_UPDATE_VALIDITY)
}

fn next_update_within(ctx: &LintContext<'_>, window: PolicyWindow) -> Verdict {
    if ctx.options.cert_class == CertClass::Ca {
        return (
            LintStatus::Passed,
            "OCSP Response nextUpdate lint not applicable to CA certificates".into(),
        );
    }
    let resp = ctx.response;
    let Some(next) = resp.next_update else {
        return (
            LintStatus::Passed,
            "OCSP Response does not set nextUpdate".into(),
        );
    };
    let limit = match window.duration() {
        Ok(d) => d,
        Err(e) => return (LintStatus::Error, e.to_string()),
    };
    let (status, relation) = if next - resp.this_update > limit {
        (LintStatus::Failed, "more than")
    } else {
        (LintStatus::Passed, "within")
    };
    (
        status,
        format!(
            "OCSP Response NextUpdate date {} is {} {} after ThisUpdate date {}",
            fmt_time(next),
            relation,
            window.display,
            fmt_time(resp.this_update)
        ),
    )
}

/// A certificate that was never issued must not be reported Good.
pub fn check_non_issued(ctx: &LintContext<'_>) -> Verdict {
    if !ctx.options.non_issued {
        return (
            LintStatus::Passed,
            "Certificate not marked as non-issued; lint not applicable".into(),
        );
    }
    match ctx.response.cert_status {
        CertStatus::Good => (
            LintStatus::Failed,
            "OCSP Response status for non-issued certificate is good".into(),
        ),
        ref other => (
            LintStatus::Passed,
            format!(
                "OCSP Response status for non-issued certificate is {}",
                other
            ),
        ),
    }
}

pub fn check_expected_status(ctx: &LintContext<'_>) -> Verdict {
    let observed = &ctx.response.cert_status;
    let matches = match ctx.options.expected_status {
        ExpectedStatus::Unspecified => {
            return (
                LintStatus::Passed,
                format!("OCSP Response status: {}", observed),
            )
        }
        ExpectedStatus::Good => matches!(observed, CertStatus::Good),
        ExpectedStatus::Revoked => matches!(observed, CertStatus::Revoked { .. }),
    };
    if matches {
        (
            LintStatus::Passed,
            format!("OCSP Response status is {} as expected", observed),
        )
    } else {
        (
            LintStatus::Failed,
            format!(
                "OCSP Response status is {}, expected {}",
                observed, ctx.options.expected_status
            ),
        )
    }
}
