use std::path::PathBuf;

use clap::Parser;

use crate::application::data::LogLevel;

/// In-memory filesystem shell with a persistent snapshot
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// Directory holding treeshell.yaml and the default snapshot
    #[clap(long, short, default_value = ".")]
    pub root: PathBuf,

    /// Snapshot file to load and save, overriding the config
    #[clap(long, short)]
    pub snapshot: Option<PathBuf>,

    /// Ignore any existing snapshot and start with an empty tree
    #[clap(long)]
    pub fresh: bool,

    /// Do not write the snapshot on exit
    #[clap(long)]
    pub no_save: bool,
}
