//! ocsplint CLI binary entry point.
//! Resolves configuration, acquires a response per target and prints lint results.

use anyhow::Context;
use clap::Parser;
use ocsplint::acquire::{AcquireOptions, Pipeline, Target};
use ocsplint::cli::{Cli, Commands, FetchArgs, LintArgs};
use ocsplint::codec::parse_certificate;
use ocsplint::config::{self, OutputFormat, Overrides};
use ocsplint::error;
use ocsplint::lint::{report, LintEngine, LintRegistry};
use ocsplint::models::{CertClass, Certificate, ExpectedStatus, HashAlgorithm, LintOptions};
use ocsplint::output;
use ocsplint::transport::{NetTransport, RequestMethod};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

const EXIT_LINT_FAILED: i32 = 1;
const EXIT_ERROR: i32 = 2;

fn init_tracing() {
    // Logs go to stderr so JSON on stdout stays parseable
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<Level>().ok())
        .unwrap_or(Level::WARN);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let registry = match LintRegistry::apple_lints() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{} {}", output::error_prefix(), e);
            std::process::exit(EXIT_ERROR);
        }
    };

    let code = match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            0
        }
        Commands::Resp {
            files,
            issuer,
            lint,
        } => run(
            &registry,
            expand_files(&files, Target::ResponseFile),
            issuer.as_deref(),
            &FetchArgs::default(),
            &lint,
        ),
        Commands::Cert {
            files,
            issuer,
            fetch,
            lint,
        } => run(
            &registry,
            expand_files(&files, Target::CertificateFile),
            issuer.as_deref(),
            &fetch,
            &lint,
        ),
        Commands::Url {
            servers,
            fetch,
            lint,
        } => run(
            &registry,
            Ok(servers.into_iter().map(Target::Server).collect()),
            None,
            &fetch,
            &lint,
        ),
    };
    std::process::exit(code);
}

/// Expand glob patterns; a pattern matching nothing is kept as a literal
/// path so the read error names it.
fn expand_files(
    patterns: &[String],
    make: fn(PathBuf) -> Target,
) -> anyhow::Result<Vec<Target>> {
    let mut targets = Vec::new();
    for pattern in patterns {
        let mut matched = false;
        let entries =
            glob::glob(pattern).with_context(|| format!("invalid glob pattern '{}'", pattern))?;
        for entry in entries {
            let path = entry.with_context(|| format!("cannot read match of '{}'", pattern))?;
            targets.push(make(path));
            matched = true;
        }
        if !matched {
            targets.push(make(PathBuf::from(pattern)));
        }
    }
    Ok(targets)
}

fn overrides(fetch: &FetchArgs, lint: &LintArgs) -> anyhow::Result<Overrides> {
    let output = lint
        .output
        .as_deref()
        .map(|o| {
            o.parse::<OutputFormat>()
                .map_err(|v| anyhow::anyhow!("invalid --output '{}' (expected human|json)", v))
        })
        .transpose()?;
    Ok(Overrides {
        output,
        verbose: lint.verbose.then_some(true),
        cert_class: lint.ca_cert.then_some(CertClass::Ca),
        method: fetch.get.then_some(RequestMethod::Get),
        hash: fetch.sha1.then_some(HashAlgorithm::Sha1),
        ocsp_url: fetch.ocsp_url.clone(),
        dir: fetch.dir.clone(),
        no_staple: fetch.no_staple.then_some(true),
        timeout_secs: fetch.timeout,
    })
}

fn load_issuer(path: &Path) -> anyhow::Result<Certificate> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read issuer {}", path.display()))?;
    parse_certificate(&bytes).with_context(|| format!("invalid issuer {}", path.display()))
}

fn fail(err: &anyhow::Error) -> i32 {
    eprintln!("{} {:#}", output::error_prefix(), err);
    EXIT_ERROR
}

fn run(
    registry: &LintRegistry,
    targets: anyhow::Result<Vec<Target>>,
    issuer: Option<&Path>,
    fetch: &FetchArgs,
    lint: &LintArgs,
) -> i32 {
    let cli_overrides = match overrides(fetch, lint) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };
    let eff = match config::resolve_effective(lint.root.as_deref(), &cli_overrides) {
        Ok(eff) => eff,
        Err(e) => return fail(&e.into()),
    };
    if eff.config_file.is_none() && eff.verbose && eff.output == OutputFormat::Human {
        eprintln!(
            "{} No ocsplint.toml found; using defaults.",
            output::note_prefix()
        );
    }
    let targets = match targets {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };
    let issuer = match issuer.map(load_issuer).transpose() {
        Ok(i) => i,
        Err(e) => return fail(&e),
    };
    let transport = match NetTransport::new(eff.timeout) {
        Ok(t) => t,
        Err(e) => return fail(&e.into()),
    };

    let options = LintOptions {
        cert_class: eff.cert_class,
        non_issued: lint.non_issued,
        expected_status: if lint.expect_good {
            ExpectedStatus::Good
        } else if lint.expect_revoked {
            ExpectedStatus::Revoked
        } else {
            ExpectedStatus::Unspecified
        },
    };
    let acquire_options = AcquireOptions {
        issuer,
        ocsp_url: eff.ocsp_url.clone(),
        method: eff.method,
        hash: eff.hash,
        no_staple: eff.no_staple,
        dir: eff.dir.clone(),
        ..AcquireOptions::default()
    };
    let pipeline = Pipeline::new(&transport, &acquire_options);
    let engine = LintEngine::new(registry);

    let mut code = 0;
    let mut json_items = Vec::new();
    for (i, target) in targets.iter().enumerate() {
        let label = target.label();
        if eff.output == OutputFormat::Human && i > 0 {
            println!();
        }
        let acq = match pipeline.acquire(target) {
            Ok(acq) => acq,
            Err(e) => {
                code = EXIT_ERROR;
                let msg = error::chain(&e);
                match eff.output {
                    OutputFormat::Json => json_items.push(output::compose_error_json(&label, &msg)),
                    OutputFormat::Human => {
                        eprintln!("{} {}: {}", output::error_prefix(), label, msg)
                    }
                }
                continue;
            }
        };

        let results = engine.evaluate(
            &acq.response,
            acq.leaf.as_ref(),
            acq.issuer.as_ref(),
            &options,
        );
        let rep = report(&results, eff.verbose);
        if !rep.all_passed {
            code = code.max(EXIT_LINT_FAILED);
        }
        match eff.output {
            OutputFormat::Json => json_items.push(output::compose_target_json(
                &label,
                &acq,
                &rep,
                fetch.print,
            )),
            OutputFormat::Human => {
                if fetch.print {
                    if let Some(leaf) = &acq.leaf {
                        output::print_certificate("Leaf", leaf, eff.output);
                    }
                    if let Some(issuer) = &acq.issuer {
                        output::print_certificate("Issuer", issuer, eff.output);
                    }
                }
                output::print_human(&label, &acq, &rep, eff.output);
            }
        }
    }

    if eff.output == OutputFormat::Json {
        output::print_json(&output::compose_run_json(json_items, code == 0));
    }
    code
}
