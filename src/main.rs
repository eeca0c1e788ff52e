mod api;
mod cli;
mod error;
mod history;
mod logging;
mod metrics;
mod model;
mod orchestrator;
mod storage;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use clap::Parser;
use time::UtcOffset;

fn main() {
    let args = cli::Cli::parse();

    // Must be read before any other thread exists; `time` refuses to query the
    // local offset from a multi-threaded process.
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };

    match runtime.block_on(cli::run(args, offset)) {
        // Exit explicitly so a lingering blocking stdin read cannot hold the process.
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}
