use crate::config::PolicyOverrides;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rusttapeimg")]
#[command(about = "Copy a magnetic tape into a self-describing tape image")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub copy: CopyArgs,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Arguments of the default copy operation
#[derive(Args, Debug, Clone, Default)]
pub struct CopyArgs {
    /// Tape device path (e.g. /dev/nst0)
    #[arg(value_name = "DEVICE")]
    pub device: Option<String>,

    /// Image file to write (standard output if omitted)
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Specify configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Treat DEVICE as an existing tape image and copy it. Reads past the
    /// end of the image fail with EIO, so the copy gains --max-errors error
    /// units before its end of medium
    #[arg(long)]
    pub replay: bool,

    /// Read errors written before guessing physical end of tape
    #[arg(long, value_name = "N")]
    pub max_errors: Option<u32>,

    /// Consecutive tape marks that close a cancelled image
    #[arg(long, value_name = "N")]
    pub eot_marks: Option<u32>,

    /// Largest tape record that can be read
    #[arg(long, value_name = "BYTES")]
    pub buffer_size: Option<usize>,
}

impl CopyArgs {
    pub fn overrides(&self) -> PolicyOverrides {
        PolicyOverrides {
            max_consecutive_errors: self.max_errors,
            end_of_tape_marks: self.eot_marks,
            record_buffer_size: self.buffer_size,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the units of a tape image
    Dump {
        /// Tape image path
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Walk the image from its end
        #[arg(short, long)]
        reverse: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
