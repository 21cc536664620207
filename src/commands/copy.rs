//! Copy Command Handler
//!
//! Handles the default operation: image a tape (or replay an image) into
//! an output file or standard output.

use crate::cli::CopyArgs;
use crate::config::CopyPolicy;
use crate::copy::{CopyController, CopyOutcome, CopySummary};
use crate::display;
use crate::error::{Result, TapeImageError};
use crate::tape::{ImageSource, TapeDevice, TapeSource};
use anyhow::Context;
use std::fs::{File, OpenOptions};
use std::future::Future;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Exit status for a cancelled run
pub const EXIT_CANCELLED: i32 = 130;

pub async fn execute(args: CopyArgs) -> Result<CopySummary> {
    let device = args
        .device
        .clone()
        .ok_or_else(|| TapeImageError::parameter_validation("Usage: rusttapeimg <DEVICE> [OUTPUT]"))?;
    let policy = CopyPolicy::load(args.config.as_deref(), &args.overrides())?;
    debug!("Copy policy: {:?}", policy);

    info!(
        "Starting copy: {} -> {}",
        device,
        args.output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<stdout>".to_string())
    );

    let source = open_source(&device, args.replay)?;
    info!(
        "Tape drive: {}",
        source.drive_name().unwrap_or_else(|| "unknown".to_string())
    );

    let sink = open_sink(args.output.as_deref())?;

    let cancel = Arc::new(AtomicBool::new(false));
    let watcher = tokio::spawn(watch_interrupt(cancel.clone()));

    let flag = cancel.clone();
    let summary = tokio::task::spawn_blocking(move || {
        let mut controller = CopyController::new(source, sink, &policy);
        controller.run(&flag)
    })
    .await
    .map_err(|e| anyhow::anyhow!("Copy task failed: {}", e))?;

    watcher.abort();
    display::log_summary(&summary);
    Ok(summary)
}

pub fn exit_code(summary: &CopySummary) -> i32 {
    match summary.outcome {
        CopyOutcome::EndOfMedium => 0,
        CopyOutcome::Cancelled => EXIT_CANCELLED,
    }
}

fn open_source(device: &str, replay: bool) -> Result<Box<dyn TapeSource + Send>> {
    if replay {
        Ok(Box::new(ImageSource::open(device)?))
    } else {
        Ok(Box::new(TapeDevice::open(device)?))
    }
}

fn open_sink(output: Option<&Path>) -> Result<Box<dyn Write + Send>> {
    match output {
        Some(path) => {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)
                .with_context(|| format!("Couldn't open output {:?}", path))?;
            Ok(Box::new(file))
        }
        None => stdout_sink(),
    }
}

// Stdout is line buffered; write through a duplicate of the descriptor
// so every unit goes straight to the OS.
#[cfg(unix)]
fn stdout_sink() -> Result<Box<dyn Write + Send>> {
    use std::os::fd::AsFd;

    let fd = io::stdout().as_fd().try_clone_to_owned()?;
    Ok(Box::new(File::from(fd)))
}

#[cfg(not(unix))]
fn stdout_sink() -> Result<Box<dyn Write + Send>> {
    Ok(Box::new(io::stdout()))
}

async fn watch_interrupt(cancel: Arc<AtomicBool>) {
    watch_signals(cancel, tokio::signal::ctrl_c, || {
        std::process::exit(EXIT_CANCELLED);
    })
    .await
}

/// The first interrupt asks the copy to stop between reads; a second one
/// exits at once, for a copy stuck inside a blocking read.
async fn watch_signals<S, F>(cancel: Arc<AtomicBool>, mut next_signal: S, force_exit: impl FnOnce())
where
    S: FnMut() -> F,
    F: Future<Output = io::Result<()>>,
{
    if next_signal().await.is_err() {
        return;
    }
    warn!("Interrupt received; stopping after the current record");
    cancel.store(true, Ordering::Relaxed);

    if next_signal().await.is_ok() {
        warn!("Second interrupt received; exiting without closing the image");
        force_exit();
    }
}
