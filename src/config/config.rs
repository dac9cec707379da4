use std::borrow::Cow;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use compio::fs;
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::debug;

const CONFIG_FILE_NAME: &str = "treeshell.yaml";
const DEFAULT_SNAPSHOT_FILE: &str = "file_system.bin";
const DEFAULT_COMPRESSION_LEVEL: i32 = 3;
const COMPRESSION_LEVELS: std::ops::RangeInclusive<i64> = 1..=22;

fn get_config_file_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Settings read from `treeshell.yaml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Snapshot location, relative to the project root unless absolute.
    pub snapshot: PathBuf,
    pub compression_level: i32,
    pub prompt: String,
    pub color: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            snapshot: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            prompt: String::new(),
            color: true,
        }
    }
}

impl ShellConfig {
    /// Reads the config from `root`, falling back to defaults when the file
    /// does not exist.
    pub async fn read(root: &Path) -> Result<Self, ShellConfigError> {
        match Self::from_path(get_config_file_path(root)).await {
            Err(ShellConfigError::ReadError { source, .. })
                if source.kind() == ErrorKind::NotFound =>
            {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub async fn from_path(path: PathBuf) -> Result<Self, ShellConfigError> {
        debug!("Reading config file: {}", path.display());
        let bytes = fs::read(&path).await.context(ReadSnafu {
            file_path: path.display().to_string(),
        })?;
        let contents = String::from_utf8(bytes).context(Utf8Snafu {
            file_path: path.display().to_string(),
        })?;
        contents.as_str().try_into()
    }

    fn apply(&mut self, top_level: &LinkedHashMap<Yaml, Yaml>) -> Result<(), ShellConfigError> {
        if let Some(value) = get_value(top_level, "snapshot") {
            self.snapshot = PathBuf::from(expect_string(value, "snapshot")?);
        }
        if let Some(value) = get_value(top_level, "compression_level") {
            self.compression_level = match value {
                Yaml::Value(Scalar::Integer(level)) if COMPRESSION_LEVELS.contains(level) => {
                    *level as i32
                }
                _ => return InvalidValueSnafu { key: "compression_level" }.fail(),
            };
        }
        if let Some(value) = get_value(top_level, "prompt") {
            self.prompt = expect_string(value, "prompt")?;
        }
        if let Some(value) = get_value(top_level, "color") {
            self.color = match value {
                Yaml::Value(Scalar::Boolean(color)) => *color,
                _ => return InvalidValueSnafu { key: "color" }.fail(),
            };
        }
        Ok(())
    }
}

fn get_value<'a, 'input>(
    top_level: &'a LinkedHashMap<Yaml<'input>, Yaml<'input>>,
    key: &'input str,
) -> Option<&'a Yaml<'input>> {
    top_level.get(&Yaml::Value(Scalar::String(Cow::Borrowed(key))))
}

fn expect_string(value: &Yaml, key: &str) -> Result<String, ShellConfigError> {
    match value {
        Yaml::Value(Scalar::String(text)) => Ok(text.to_string()),
        _ => InvalidValueSnafu { key }.fail(),
    }
}

impl TryFrom<&str> for ShellConfig {
    type Error = ShellConfigError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents = Yaml::load_from_str(contents).context(ParseSnafu)?;
        let mut config = Self::default();

        // An empty file (or one holding only comments) keeps the defaults
        let Some(document) = documents.first() else {
            return Ok(config);
        };
        let top_level = document
            .as_mapping()
            .ok_or(ShellConfigError::TopLevelNotMap)?;

        config.apply(top_level)?;
        Ok(config)
    }
}

#[derive(Debug, Snafu)]
pub enum ShellConfigError {
    #[snafu(display("Failed to read the config file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Config file is not valid UTF-8: {}", file_path))]
    Utf8Error {
        file_path: String,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the config file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Top level of config should be a map"))]
    TopLevelNotMap,
    #[snafu(display("Invalid value for '{}'", key))]
    InvalidValue { key: String },
}
