use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::ShellConfig;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub root: PathBuf,
    pub snapshot: Option<PathBuf>,
    pub fresh: bool,
    pub save: bool,
}

impl RuntimeConfig {
    /// An explicit snapshot path wins over the configured one, which is
    /// taken relative to the root.
    pub fn snapshot_path(&self, config: &ShellConfig) -> PathBuf {
        match &self.snapshot {
            Some(path) => path.clone(),
            None => self.root.join(&config.snapshot),
        }
    }
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            root: cli.root,
            snapshot: cli.snapshot,
            fresh: cli.fresh,
            save: !cli.no_save,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime_config(snapshot: Option<&str>) -> RuntimeConfig {
        RuntimeConfig {
            root: PathBuf::from("/work"),
            snapshot: snapshot.map(PathBuf::from),
            fresh: false,
            save: true,
        }
    }

    #[test]
    fn configured_snapshot_is_relative_to_root() {
        let path = runtime_config(None).snapshot_path(&ShellConfig::default());
        assert_eq!(path, PathBuf::from("/work/file_system.bin"));
    }

    #[test]
    fn absolute_configured_snapshot_is_kept() {
        let config = ShellConfig {
            snapshot: PathBuf::from("/var/fs.bin"),
            ..ShellConfig::default()
        };
        assert_eq!(
            runtime_config(None).snapshot_path(&config),
            PathBuf::from("/var/fs.bin")
        );
    }

    #[test]
    fn explicit_snapshot_overrides_config() {
        let path = runtime_config(Some("other.bin")).snapshot_path(&ShellConfig::default());
        assert_eq!(path, PathBuf::from("other.bin"));
    }
}
