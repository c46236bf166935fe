//! jarpack - package a JAR or WAR into a single native executable.
//!
//! Exit codes distinguish failure categories so scripts can branch on them;
//! see `jarpack --help`.

use jarpack::cli::{self, Args, OutputManager};
use std::process;

#[tokio::main]
async fn main() {
    let args = Args::parse_args();

    // Initialize logging; RUST_LOG wins over --verbose/--quiet
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter()))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let output = OutputManager::new(args.verbose, args.quiet);
    let exit_code = match cli::run(args).await {
        Ok(code) => code,
        Err(e) => {
            let _ = output.error(&e.to_string());
            for suggestion in e.recovery_suggestions() {
                let _ = output.indent(&suggestion);
            }
            e.exit_code()
        }
    };

    process::exit(exit_code);
}
