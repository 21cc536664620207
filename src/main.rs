use rust_tapeimg::cli::{Cli, Commands};
use rust_tapeimg::error::Result;
use rust_tapeimg::{commands, logger};
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse_args();

    // Initialize logging system
    logger::init(args.verbose)?;

    debug!("RustTapeImg CLI starting");

    match run(args).await {
        Ok(0) => {
            info!("Operation completed successfully");
            Ok(())
        }
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Operation failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run(args: Cli) -> Result<i32> {
    match args.command {
        Some(Commands::Dump { image, reverse }) => {
            commands::dump::execute(image, reverse).await?;
            Ok(0)
        }

        None => {
            let summary = commands::copy::execute(args.copy).await?;
            Ok(commands::copy::exit_code(&summary))
        }
    }
}
