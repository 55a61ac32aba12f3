/*!
Command results.

Handlers return `Result<Outcome, CommandError>`; `main` owns terminal
rendering and maps both onto the process exit code (0 or 1, nothing else).
*/

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::connect::ConnectError;

/// Successful end states of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// An authorization link was produced but nobody could confirm it
    /// interactively. Not a failure: the caller re-runs after authorizing.
    AwaitingAuthorization,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("one of --generate-link, --execute-tool, --proxy-request or --get-tool is required")]
    NoOperation,

    #[error("--{arg} is required for --{mode}")]
    MissingArgument {
        arg: &'static str,
        mode: &'static str,
    },

    #[error("--{arg} is not valid JSON: {source}")]
    InvalidJson {
        arg: &'static str,
        source: serde_json::Error,
    },

    #[error("--{arg} must be a JSON object")]
    NotAnObject { arg: &'static str },

    #[error("--method {0:?} is not a valid HTTP method")]
    InvalidMethod(String),

    #[error("{0}")]
    Remote(#[from] ConnectError),

    /// The response body has already been printed under "Error response:".
    #[error("proxied request returned HTTP {status}")]
    ErrorResponse { status: u16 },

    #[error("interrupted")]
    Interrupted,

    #[error("failed to {action} {}: {source}", .path.display())]
    File {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CommandError {
    /// True when the error was detected before any call to the API client.
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            CommandError::NoOperation
                | CommandError::MissingArgument { .. }
                | CommandError::InvalidJson { .. }
                | CommandError::NotAnObject { .. }
                | CommandError::InvalidMethod(_)
        )
    }

    /// True when the handler already showed the failure to the operator,
    /// so only the exit code is left to report.
    pub fn is_reported(&self) -> bool {
        matches!(self, CommandError::ErrorResponse { .. })
    }
}
