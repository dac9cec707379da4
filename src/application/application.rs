use std::io::{self, BufRead, Write};

use snafu::Snafu;
use snafu::prelude::*;
use supports_color::Stream;
use tracing::{debug, info};

use crate::application::RuntimeConfig;
use crate::config::{ShellConfig, ShellConfigError};
use crate::filesystem::Tree;
use crate::shell::{Shell, ShellError};
use crate::snapshot::{LoadOutcome, SnapshotError, SnapshotStore};

pub struct Application;

impl Application {
    /// Runs an interactive session on stdin and stdout.
    pub async fn run(app_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let app_config: RuntimeConfig = app_config.into();
        let config = ShellConfig::read(&app_config.root)
            .await
            .context(ConfigSnafu)?;
        debug!("Loaded config: {:?}", config);

        let color = config.color && supports_color::on(Stream::Stdout).is_some();
        colored::control::set_override(color);
        debug!("Colored output: {}", color);

        let stdin = io::stdin();
        Self::run_session(&app_config, &config, color, stdin.lock(), io::stdout()).await
    }

    /// Loads the tree, runs the shell over `input` until it ends, and saves
    /// the tree back unless saving is disabled.
    pub async fn run_session<R: BufRead, W: Write>(
        app_config: &RuntimeConfig,
        config: &ShellConfig,
        color: bool,
        input: R,
        mut output: W,
    ) -> Result<(), ApplicationError> {
        let store = SnapshotStore::new(
            app_config.snapshot_path(config),
            config.compression_level,
        );

        let tree = Self::load_tree(&store, app_config.fresh, &mut output).await?;

        let mut shell = Shell::new(tree, input, &mut output)
            .with_prompt(config.prompt.as_str())
            .with_color(color);
        shell.run().context(ShellRunSnafu)?;
        let tree = shell.into_tree();

        if app_config.save {
            store.save(&tree).await.context(SnapshotSaveSnafu)?;
            writeln!(output, "File system saved").context(OutputSnafu)?;
        } else {
            info!("Saving disabled, not writing {}", store.path().display());
        }

        Ok(())
    }

    async fn load_tree<W: Write>(
        store: &SnapshotStore,
        fresh: bool,
        output: &mut W,
    ) -> Result<Tree, ApplicationError> {
        let outcome = if fresh {
            info!("Ignoring existing snapshot as requested");
            LoadOutcome::Fresh(Tree::new())
        } else {
            store.load().await
        };

        let message = match outcome {
            LoadOutcome::Restored(_) => "File system loaded",
            LoadOutcome::Fresh(_) => "Creating a new file system",
        };
        writeln!(output, "{}", message).context(OutputSnafu)?;

        Ok(outcome.into_tree())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApplicationError {
    #[snafu(display("Failed to install the log subscriber"))]
    LoggingError {
        source: tracing::subscriber::SetGlobalDefaultError,
    },
    #[snafu(display("Critical failure encountered during configuration stage"))]
    ConfigError { source: ShellConfigError },
    #[snafu(display("Critical failure encountered while running the shell"))]
    ShellRunError { source: ShellError },
    #[snafu(display("Critical failure encountered while saving the snapshot"))]
    SnapshotSaveError { source: SnapshotError },
    #[snafu(display("Failed to write to the terminal"))]
    OutputError { source: io::Error },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn runtime_config(dir: &TempDir) -> RuntimeConfig {
        RuntimeConfig {
            root: dir.path().to_path_buf(),
            snapshot: None,
            fresh: false,
            save: true,
        }
    }

    async fn session(app_config: &RuntimeConfig, script: impl AsRef<[u8]>) -> String {
        let mut output = Vec::new();
        Application::run_session(
            app_config,
            &ShellConfig::default(),
            false,
            Cursor::new(script.as_ref()),
            &mut output,
        )
        .await
        .expect("Session failed");
        String::from_utf8(output).expect("Output is not UTF-8")
    }

    #[compio::test]
    async fn state_persists_between_sessions() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let app_config = runtime_config(&dir);

        let first = session(&app_config, "mkdir docs\ncd docs\ntouch readme\nquit\n").await;
        assert_eq!(first, "Creating a new file system\nFile system saved\n");

        let second = session(&app_config, "pwd\nls\ncd ..\ntree\n").await;
        assert_eq!(
            second,
            "File system loaded\n/docs/\nreadme\n\n  docs\n    readme\nFile system saved\n"
        );
    }

    #[compio::test]
    async fn garbled_input_still_saves_snapshot() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let app_config = runtime_config(&dir);

        let first = session(&app_config, b"mkdir important\nls \xff\n").await;
        assert!(first.ends_with("File system saved\n"));
        assert!(dir.path().join("file_system.bin").exists());

        let second = session(&app_config, "ls\n").await;
        assert_eq!(
            second,
            "File system loaded\nimportant <directory>\nFile system saved\n"
        );
    }

    #[compio::test]
    async fn fresh_ignores_saved_snapshot() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let mut app_config = runtime_config(&dir);
        session(&app_config, "mkdir docs\n").await;

        app_config.fresh = true;
        let output = session(&app_config, "ls\n").await;

        assert_eq!(output, "Creating a new file system\nFile system saved\n");
    }

    #[compio::test]
    async fn no_save_leaves_no_snapshot() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let mut app_config = runtime_config(&dir);
        app_config.save = false;

        let output = session(&app_config, "mkdir docs\n").await;

        assert_eq!(output, "Creating a new file system\n");
        assert!(!dir.path().join("file_system.bin").exists());
    }

    #[compio::test]
    async fn explicit_snapshot_path_is_used() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let mut app_config = runtime_config(&dir);
        let snapshot: PathBuf = dir.path().join("custom/state.bin");
        app_config.snapshot = Some(snapshot.clone());

        session(&app_config, "touch a\n").await;

        assert!(snapshot.exists());
        assert!(!dir.path().join("file_system.bin").exists());
    }
}
