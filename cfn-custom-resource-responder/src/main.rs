//! Prints the responder template to stdout.
//!
//! Takes no arguments and reads no configuration: the same binary always
//! prints the same document. Logs go to stderr, filtered by `RUST_LOG`.

use std::process::ExitCode;

use cfn_custom_resource_responder::{assemble, ResponderConfig, ResponderResult};

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match render() {
        Ok(document) => {
            println!("{}", document);
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!(error = %error, "Failed to generate template");
            ExitCode::FAILURE
        }
    }
}

fn render() -> ResponderResult<String> {
    let template = assemble(&ResponderConfig::default())?;
    template.to_json()
}
