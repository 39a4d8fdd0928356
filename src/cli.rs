use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use unifile::handlers::{OpenMode, TargetType};

#[derive(Parser, Debug)]
#[command(name = "unifile")]
#[command(about = "Read and write files through format handlers", long_about = None)]
pub struct Cli {
    /// Configuration file (overrides UNIFILE_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read one or more files concurrently and print one JSON line per file
    Read(ReadArgs),
    /// Write text content to a file
    Write(WriteArgs),
    /// List registered handlers in dispatch order
    Formats,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// What to read each file as
    #[arg(long, value_enum, default_value_t = Target::Opaque)]
    pub target: Target,

    /// Fail the whole batch if any file fails
    #[arg(long)]
    pub fail_fast: bool,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    pub path: PathBuf,

    pub content: String,

    #[arg(long, conflicts_with = "create_new")]
    pub append: bool,

    /// Refuse to overwrite an existing file
    #[arg(long)]
    pub create_new: bool,
}

impl WriteArgs {
    pub fn mode(&self) -> Option<OpenMode> {
        if self.append {
            Some(OpenMode::Append)
        } else if self.create_new {
            Some(OpenMode::CreateNew)
        } else {
            None
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Text,
    Object,
    Bytes,
    Opaque,
}

impl From<Target> for TargetType {
    fn from(target: Target) -> Self {
        match target {
            Target::Text => TargetType::Text,
            Target::Object => TargetType::Object("Value".to_string()),
            Target::Bytes => TargetType::Bytes,
            Target::Opaque => TargetType::Opaque,
        }
    }
}
