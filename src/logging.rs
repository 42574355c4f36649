use std::io;
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    prelude::*,
    EnvFilter,
};

/// Initialize tracing with colors on a TTY and `log` forwarding.
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let filter = if verbose {
        "debug,agency_portal=trace,actix_web=debug,reqwest=debug"
    } else {
        "info,agency_portal=info,actix_web=info"
    };

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(filter))?;

    let use_ansi = atty::is(atty::Stream::Stdout);
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_ansi(use_ansi)
        .with_writer(io::stdout);

    // actix's Logger middleware speaks `log`
    let _ = tracing_log::LogTracer::init();

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();

    tracing::info!("PID={} starting up", std::process::id());
    Ok(())
}

/// Print build and version information
pub fn print_build_info() {
    let name = env!("CARGO_PKG_NAME");
    let version = option_env!("APP_BUILD_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    let build_timestamp = option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown");
    let git_branch = option_env!("VERGEN_GIT_BRANCH").unwrap_or("no-git");
    let git_commit: String = option_env!("VERGEN_GIT_SHA")
        .unwrap_or("00000000")
        .chars()
        .take(8)
        .collect();
    let desc = option_env!("APP_PKG_DESCRIPTION").unwrap_or("");

    println!("{}", "═".repeat(60));
    println!("{} v{}", name, version);
    if !desc.is_empty() {
        println!("Description: {}", desc);
    }
    println!("{}", "─".repeat(60));
    println!("Build: {}", build_timestamp);
    println!("Git: {} ({})", git_branch, git_commit);
    println!("{}", "═".repeat(60));
    println!();
}

pub fn log_server_startup(host: &str, port: u16, api_base: &str) {
    tracing::info!("🚀 Portal listening on http://{}:{}", host, port);
    tracing::info!("🔐 Auth backend: {}", api_base);
}

pub fn log_command_start(command: &str, description: &str) {
    tracing::info!("⚡ Executing: {} ({})", command, description);
}

pub fn log_command_complete(command: &str, success: bool, duration: std::time::Duration) {
    if success {
        tracing::info!("✅ Command '{}' completed in {:.2?}", command, duration);
    } else {
        tracing::error!("❌ Command '{}' failed after {:.2?}", command, duration);
    }
}
