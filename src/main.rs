//! Sanistor - Cluster Storage Device Sanitizer
//!
//! Entry-point glue around the sanitizer library: argument parsing, logging
//! setup, adapter wiring, and a run summary. The orchestration itself lives
//! in [`sanistor::sanitizer`].

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sanistor::adapters::{
    CephVolumeDiscovery, CryptsetupResolver, LvsPvLookup, SystemCommandExecutor,
};
use sanistor::{DiskSanitizer, SanitizeDataSource, SanitizeMethod, SanitizeSpec, SanitizerConfig};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Sanistor - secure erasure of decommissioned cluster storage devices
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Erasure method (quick, complete)
    #[arg(long, env = "SANITIZE_METHOD", default_value = "quick")]
    method: String,

    /// Pass-data source for the complete method (zero, random)
    #[arg(long, env = "SANITIZE_DATA_SOURCE", default_value = "zero")]
    data_source: String,

    /// Number of overwrite passes for the complete method
    #[arg(long, env = "SANITIZE_ITERATIONS", default_value = "1")]
    iterations: u32,

    /// Only sanitize units belonging to this cluster id
    #[arg(long, env = "CLUSTER_ID")]
    cluster_id: Option<String>,

    /// Log every command without executing it
    #[arg(long, env = "DRY_RUN")]
    dry_run: bool,

    /// Print the full run report as JSON on completion
    #[arg(long, env = "REPORT_JSON")]
    report_json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let method: SanitizeMethod = args
        .method
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("invalid --method")?;
    let data_source: SanitizeDataSource = args
        .data_source
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("invalid --data-source")?;
    anyhow::ensure!(args.iterations > 0, "--iterations must be positive");

    let spec = SanitizeSpec {
        method,
        data_source,
        iterations: args.iterations,
    };

    info!("Starting storage device sanitization");
    info!("  Method: {}", spec.method);
    info!("  Data source: {}", spec.data_source);
    info!("  Iterations: {}", spec.iterations);
    info!("  Dry-run mode: {}", args.dry_run);

    let executor = Arc::new(SystemCommandExecutor::new());
    let discovery = Arc::new(CephVolumeDiscovery::new(executor.clone(), args.cluster_id));
    let resolver = Arc::new(CryptsetupResolver::new(executor.clone()));
    let pv_lookup = Arc::new(LvsPvLookup::new(executor.clone()));

    let sanitizer = DiskSanitizer::new(
        SanitizerConfig {
            dry_run: args.dry_run,
        },
        spec,
        discovery,
        executor,
        resolver,
        pv_lookup,
    );

    let report = sanitizer.run().await;

    if args.report_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize run report")?
        );
    }

    // Best-effort semantics: failures are reported, not returned. Callers
    // inspect the report and logs to decide whether any device matters.
    if report.is_success() {
        info!(
            devices = report.per_device.len(),
            duration = ?report.duration,
            "all devices sanitized"
        );
    } else {
        warn!(
            failed = report.failed_devices().len(),
            skipped_backends = ?report.skipped_backends,
            duration = ?report.duration,
            "sanitization finished with failures"
        );
    }

    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}
