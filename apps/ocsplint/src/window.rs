//! Policy windows: the time limits Apple Lints place on OCSP timestamps.
//!
//! Windows are kept in their textual duration form (`"96h"`) next to the
//! wording used in messages, and parsed on use. A window whose text does not
//! parse makes the rule report `Error` rather than abort the lint pass.

use crate::models::CertClass;
use chrono::Duration;
use regex::Regex;
use std::sync::LazyLock;

static WINDOW_TEXT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?:\d+[hms])+$").ok());
static WINDOW_PART: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d+)([hms])").ok());

/// A named duration limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyWindow {
    /// Duration text: one or more `<digits><h|m|s>` groups
    pub spec: &'static str,
    /// Human wording for messages
    pub display: &'static str,
}

/// producedAt / thisUpdate limit for subscriber certificates.
pub const SUBSCRIBER_FRESHNESS: PolicyWindow = PolicyWindow {
    spec: "96h",
    display: "4 days",
};

/// producedAt / thisUpdate limit for subordinate CA certificates.
pub const CA_FRESHNESS: PolicyWindow = PolicyWindow {
    spec: "8760h",
    display: "365 days",
};

/// Maximum nextUpdate - thisUpdate span for subscriber certificates.
pub const NEXT_UPDATE_VALIDITY: PolicyWindow = PolicyWindow {
    spec: "240h",
    display: "10 days",
};

/// Responder round-trip budget; exceeding it is a soft violation.
pub const RESPONSE_TIME_LIMIT: std::time::Duration = std::time::Duration::from_secs(10);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid policy window '{0}'")]
pub struct InvalidWindow(pub String);

impl PolicyWindow {
    /// Freshness window selected solely by certificate class.
    pub fn freshness(class: CertClass) -> PolicyWindow {
        match class {
            CertClass::Subscriber => SUBSCRIBER_FRESHNESS,
            CertClass::Ca => CA_FRESHNESS,
        }
    }

    pub fn duration(&self) -> Result<Duration, InvalidWindow> {
        parse_duration(self.spec)
    }
}

fn parse_duration(text: &str) -> Result<Duration, InvalidWindow> {
    let invalid = || InvalidWindow(text.to_string());
    let whole = WINDOW_TEXT.as_ref().ok_or_else(invalid)?;
    if !whole.is_match(text) {
        return Err(invalid());
    }
    let part = WINDOW_PART.as_ref().ok_or_else(invalid)?;
    let mut total = Duration::zero();
    for caps in part.captures_iter(text) {
        let n: i64 = caps[1].parse().map_err(|_| invalid())?;
        let unit = match &caps[2] {
            "h" => Duration::try_hours(n),
            "m" => Duration::try_minutes(n),
            _ => Duration::try_seconds(n),
        };
        total = unit
            .and_then(|d| total.checked_add(&d))
            .ok_or_else(invalid)?;
    }
    Ok(total)
}
