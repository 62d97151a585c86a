use clap::Parser;
use sat_search::SatSearch;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = SatSearch::parse();
    match args.run(true).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            ExitCode::FAILURE
        }
    }
}
