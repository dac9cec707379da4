mod application;
pub mod data;
mod logging;
mod runtime_config;

pub(crate) use application::LoggingSnafu;
pub use application::{Application, ApplicationError};
pub use logging::install_logging;
pub use runtime_config::RuntimeConfig;
