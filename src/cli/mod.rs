//! Command line interface for jarpack.
//!
//! Parses arguments, merges them over the configuration file, runs the
//! requested command and reports the result.

mod args;
mod config;
mod output;

pub use args::{AnalysisArgs, Args, Command, JdkArgs, ModulesArgs, PackageArgs};
pub use config::{DEFAULT_CONFIG_FILE, FileConfig, TimeoutConfig};
pub use output::OutputManager;

use crate::{
    bundler::{self, Bundler, PackagingRequest, RequestBuilder, toolchain::JdkLocator},
    error::{BundlerError, CliError, EXIT_SUCCESS, Result},
};

/// Main CLI entry point. Returns the process exit code for successful runs.
pub async fn run(args: Args) -> Result<i32> {
    let output = OutputManager::new(args.verbose, args.quiet);
    let config = FileConfig::discover(args.config.as_deref())?;

    match &args.command {
        Command::Package(package) => package_command(package, &config, &output).await,
        Command::Jdk(jdk) => jdk_command(jdk, &config, &output),
        Command::Modules(modules) => modules_command(modules, &config, &output).await,
    }
}

/// Validates the request; unusable values are argument errors.
fn build_request(builder: RequestBuilder) -> Result<PackagingRequest> {
    builder.build().map_err(|e| match e {
        bundler::Error::GenericError(reason) => {
            BundlerError::from(CliError::InvalidArguments { reason })
        }
        other => BundlerError::from(other),
    })
}

/// Completes on Ctrl-C, or on SIGTERM/SIGHUP on Unix.
async fn interrupted() {
    tokio::select! {
        _ = ctrl_c() => {}
        _ = termination() => {}
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn termination() {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut term, mut hup) = match (signal(SignalKind::terminate()), signal(SignalKind::hangup())) {
        (Ok(term), Ok(hup)) => (term, hup),
        (Err(e), _) | (_, Err(e)) => {
            log::warn!("Cannot listen for termination signals: {e}");
            return std::future::pending().await;
        }
    };
    tokio::select! {
        Some(()) = term.recv() => log::debug!("Received SIGTERM"),
        Some(()) = hup.recv() => log::debug!("Received SIGHUP"),
        else => std::future::pending().await,
    }
}

#[cfg(not(unix))]
async fn termination() {
    std::future::pending().await
}

async fn package_command(
    args: &PackageArgs,
    config: &FileConfig,
    output: &OutputManager,
) -> Result<i32> {
    let request = build_request(config.package_builder(args))?;
    output.section(&format!(
        "Packaging {} for {}",
        request.archive_file_name(),
        request.target_platform()
    ))?;
    output.verbose(&format!("Output: {}", request.output_path().display()))?;

    let artifact = Bundler::new(request).bundle_until(interrupted()).await?;

    output.success(&format!("Created {}", artifact.path.display()))?;
    output.indent(&format!("Size:     {} bytes", artifact.size))?;
    output.indent(&format!("SHA-256:  {}", artifact.sha256))?;
    output.indent(&format!("Modules:  {}", artifact.modules))?;
    output.indent(&format!(
        "JDK:      {} ({})",
        artifact.jdk_version,
        artifact.jdk_home.display()
    ))?;

    if let Some(report) = &args.report {
        let json = serde_json::to_string_pretty(&artifact)?;
        tokio::fs::write(report, json).await?;
        output.verbose(&format!("Report written to {}", report.display()))?;
    }
    Ok(EXIT_SUCCESS)
}

fn jdk_command(args: &JdkArgs, config: &FileConfig, output: &OutputManager) -> Result<i32> {
    let override_path = args.jdk.as_ref().or(config.jdk.as_ref());
    let jdk = JdkLocator::default().locate(override_path.map(|p| p.as_path()))?;

    output.result(&jdk.installation_path.display().to_string())?;
    output.indent(&format!("Version: {}", jdk.version))?;
    output.indent(&format!("jdeps:   {}", jdk.tool("jdeps").display()))?;
    output.indent(&format!("jlink:   {}", jdk.tool("jlink").display()))?;
    Ok(EXIT_SUCCESS)
}

async fn modules_command(
    args: &ModulesArgs,
    config: &FileConfig,
    output: &OutputManager,
) -> Result<i32> {
    let request = build_request(config.analysis_builder(&args.archive, &args.analysis))?;
    output.section(&format!("Modules required by {}", request.archive_file_name()))?;

    let (jdk, resolution) = Bundler::new(request)
        .resolve_modules_until(interrupted())
        .await?;
    output.verbose(&format!(
        "Analysed with JDK {} at {}",
        jdk.version,
        jdk.installation_path.display()
    ))?;
    for module in resolution.modules.iter() {
        output.result(module)?;
    }
    Ok(EXIT_SUCCESS)
}
