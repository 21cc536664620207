use crate::error::Result;
use anyhow::Context;
use std::io;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. Output always goes to stderr because
/// stdout may be carrying the image itself.
pub fn init(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
