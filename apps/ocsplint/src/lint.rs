//! Lint registry and engine.
//!
//! The registry is an ordered, explicit list of rule descriptors built once
//! at startup and passed by reference into the engine. Evaluation runs every
//! rule; a rule that cannot decide reports `Unknown` or `Error` and the pass
//! continues. `report` turns the raw verdicts into what printers show.

use crate::checks;
use crate::error::RegistryError;
use crate::models::{Certificate, LintOptions, LintResult, LintStatus, OcspResponse, Summary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

/// Everything a rule may look at. Rules never see each other's results.
#[derive(Debug, Clone, Copy)]
pub struct LintContext<'a> {
    pub response: &'a OcspResponse,
    pub leaf: Option<&'a Certificate>,
    pub issuer: Option<&'a Certificate>,
    pub options: &'a LintOptions,
    /// Instant freshness is measured against
    pub now: DateTime<Utc>,
}

pub type Verdict = (LintStatus, String);

/// A stateless policy check with the citation it enforces.
#[derive(Clone, Copy)]
pub struct LintRule {
    pub name: &'static str,
    pub source: &'static str,
    pub evaluate: fn(&LintContext<'_>) -> Verdict,
}

impl std::fmt::Debug for LintRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LintRule")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct LintRegistry {
    rules: Vec<LintRule>,
}

impl LintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The Apple Lints rule set, in reporting tie-break order.
    pub fn apple_lints() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for rule in checks::APPLE_LINTS {
            registry.register(*rule)?;
        }
        Ok(registry)
    }

    /// Append a rule. Names must be unique.
    pub fn register(&mut self, rule: LintRule) -> Result<(), RegistryError> {
        if self.rules.iter().any(|r| r.name == rule.name) {
            return Err(RegistryError::DuplicateRule(rule.name.to_string()));
        }
        self.rules.push(rule);
        Ok(())
    }

    pub fn all(&self) -> &[LintRule] {
        &self.rules
    }
}

pub struct LintEngine<'r> {
    registry: &'r LintRegistry,
}

impl<'r> LintEngine<'r> {
    pub fn new(registry: &'r LintRegistry) -> Self {
        Self { registry }
    }

    /// Run every registered rule against `response` as of now.
    pub fn evaluate(
        &self,
        response: &OcspResponse,
        leaf: Option<&Certificate>,
        issuer: Option<&Certificate>,
        options: &LintOptions,
    ) -> Vec<LintResult> {
        self.evaluate_at(response, leaf, issuer, options, Utc::now())
    }

    pub fn evaluate_at(
        &self,
        response: &OcspResponse,
        leaf: Option<&Certificate>,
        issuer: Option<&Certificate>,
        options: &LintOptions,
        now: DateTime<Utc>,
    ) -> Vec<LintResult> {
        let ctx = LintContext {
            response,
            leaf,
            issuer,
            options,
            now,
        };
        self.registry
            .all()
            .iter()
            .map(|rule| {
                let (status, message) = (rule.evaluate)(&ctx);
                debug!(rule = rule.name, %status, "lint evaluated");
                LintResult {
                    rule: rule.name,
                    source: rule.source,
                    status,
                    message,
                }
            })
            .collect()
    }
}

/// Results prepared for printing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintReport {
    /// Worst first; passed results only in verbose mode
    pub results: Vec<LintResult>,
    pub all_passed: bool,
    pub summary: Summary,
}

/// Sort worst-first and filter for display.
///
/// The sort is stable, so registration order breaks ties. `all_passed` and
/// the summary always cover every result, shown or not.
pub fn report(results: &[LintResult], verbose: bool) -> LintReport {
    let mut sorted = results.to_vec();
    sorted.sort_by_key(|r| r.status);
    let all_passed = sorted.iter().all(|r| r.status == LintStatus::Passed);
    let summary = Summary::from_results(&sorted);
    sorted.retain(|r| verbose || r.status != LintStatus::Passed);
    LintReport {
        results: sorted,
        all_passed,
        summary,
    }
}
