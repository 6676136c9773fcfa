use std::process::ExitCode;

use facadex::dispatch::Dispatcher;
use facadex::settings::Settings;
use facadex::triplifier::TriplifierRegistry;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let settings = match Settings::load(None) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let locators: Vec<String> = std::env::args().skip(1).collect();
    if locators.is_empty() {
        eprintln!("usage: facadex LOCATOR...");
        return ExitCode::FAILURE;
    }
    let dispatcher = match Dispatcher::new(TriplifierRegistry::with_builtins(), settings) {
        Ok(dispatcher) => dispatcher,
        Err(e) => {
            error!(error = %e, "cannot start");
            return ExitCode::FAILURE;
        }
    };
    let context = dispatcher.context();
    let mut failed = false;
    for locator in &locators {
        match dispatcher.resolve(&context, locator).and_then(|dataset| dataset.quads()) {
            Ok(quads) => {
                info!(locator = locator.as_str(), quads = quads.len(), "resolved");
                for quad in quads {
                    println!("{quad}");
                }
            }
            Err(e) => {
                error!(locator = locator.as_str(), kind = ?e.kind(), error = %e, "cannot resolve");
                failed = true;
            }
        }
    }
    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
