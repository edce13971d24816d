use zwiftpower_scraper_lib::{input_loader, logger, output_writer, zwiftpower};
use zwiftpower_scraper_lib::{ensure_session, BatchRunner, FixedDelay, HttpTransport, SessionStore, Settings};

use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use log::{info, warn, error};

fn main() -> ExitCode {
    // .env first so RUST_LOG from it applies too
    let dotenv = dotenvy::dotenv();
    logger::init();
    info!("Starting ZwiftPower rider check...");
    if let Ok(path) = dotenv {
        info!("Loaded environment from {:?}", path);
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    // 1. Settings (credentials are required before any network activity)
    let mut settings = Settings::from_env()?;

    // Usage: zwiftpower_scraper [INPUT] [OUTPUT]
    let mut args = env::args().skip(1);
    if let Some(input) = args.next() {
        settings.input = PathBuf::from(input);
    }
    if let Some(output) = args.next() {
        settings.output = PathBuf::from(output);
    }

    // 2. Load Inputs
    let table = input_loader::load_table(&settings.input, zwiftpower::ID_COLUMN)?;
    if table.is_empty() {
        warn!("No rows found in {:?}. Writing headers only.", settings.input);
        output_writer::write_results_file(&settings.output, &table, &[])?;
        return Ok(());
    }

    // 3. Session: cached cookies or a fresh SSO login
    let transport = HttpTransport::new(settings.http_timeout)?;
    let store = SessionStore::new(&settings.cookie_file, settings.cookie_expiry);
    ensure_session(&transport, &store, &settings.credentials)?;

    // 4. Fetch every rider
    let runner = BatchRunner::new(FixedDelay::new(settings.request_delay));
    let records = runner.run(&transport, &table.identifiers());

    // 5. Write results
    output_writer::write_results_file(&settings.output, &table, &records)?;

    info!("Done! Results saved in {:?}", settings.output);
    Ok(())
}
