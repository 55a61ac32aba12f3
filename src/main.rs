use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

mod cmd;
mod config;
mod connect;
mod utils;

use cmd::format::{Role, color, decorate};
use cmd::{
    CommandError, ModeFlags, OperationArgs, Outcome, Session, StdinOperator, StyleOptions,
    interruptible, print_banner, resolve, run,
};
use config::ConnectConfig;
use connect::HttpConnectClient;

const AFTER_HELP: &str = "\
Examples:
  # Generate authorization link for a connection
  connect-cli --generate-link --connection-name SLACK --identifier user_123

  # Execute a tool (will prompt for auth if not connected)
  connect-cli --execute-tool --tool-name slack_send_message \\
      --connection-name SLACK --identifier user_123 \\
      --tool-input '{\"channel\": \"#general\", \"text\": \"Hello!\"}'

  # Download a file through the proxy
  connect-cli --proxy-request --connection-name GOOGLE_DRIVE --identifier user_123 \\
      --path /drive/v3/files/FILE_ID/export \\
      --query-params '{\"mimeType\": \"text/plain\"}' --output-file out.txt

  # Fetch tool metadata by name, or by provider with pagination
  connect-cli --get-tool --tool-name googlesheets_get_values
  connect-cli --get-tool --provider GOOGLE --page-size 5
  connect-cli --get-tool --page-size 5 --page-token <token>

Required environment variables (a .env file in the working directory is honored):
  TOOL_CLIENT_ID      Scalekit OAuth client ID
  TOOL_CLIENT_SECRET  Scalekit OAuth client secret
  TOOL_ENV_URL        Scalekit environment URL";

/// Scalekit Connect CLI
///
/// Exactly one mode flag per invocation:
///   --generate-link   connected account + authorization link
///   --execute-tool    run a tool for a connected account
///   --proxy-request   raw HTTP through the connected account (binary safe)
///   --get-tool        tool metadata as JSON
///
/// Global flags / env:
///   -v / -vv        Increase log verbosity (stderr)
///   -q / --quiet    Errors only
///   RUST_LOG        Overrides the derived log filter
///   NO_COLOR        Disable ANSI colors; NO_EMOJI disables emoji
#[derive(Parser, Debug)]
#[command(
    name = "connect-cli",
    version,
    about = "Scalekit Connect CLI - generate auth links, execute tools, proxy requests and fetch tool metadata",
    after_help = AFTER_HELP
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(flatten)]
    modes: ModeFlags,

    #[command(flatten)]
    args: OperationArgs,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // usage errors exit 1, --help / --version exit 0
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let dotenv = config::load_dotenv();

    // Initialize logging
    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);
    if let Some(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let style = StyleOptions::detect();
    let mut stdout = std::io::stdout();

    match execute(cli, style, &mut stdout) {
        Ok(Outcome::Completed) => ExitCode::SUCCESS,
        Ok(Outcome::AwaitingAuthorization) => {
            tracing::info!("authorization pending, exiting without error");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!(argument_error = e.is_argument_error(), "command failed: {e:?}");
            if let Some(line) = error_line(&e, &style) {
                let _ = writeln!(stdout, "{line}");
            }
            let _ = stdout.flush();
            ExitCode::FAILURE
        }
    }
}

/// The red error line for `e`, unless the handler already printed the failure.
fn error_line(e: &CommandError, style: &StyleOptions) -> Option<String> {
    if e.is_reported() {
        return None;
    }
    Some(color(Role::Error, decorate("error", format!("Error: {e}"), style), style))
}

/// Config, banner, validation, then the selected operation on a
/// single-threaded runtime.
fn execute(cli: Cli, style: StyleOptions, out: &mut dyn Write) -> Result<Outcome, CommandError> {
    let config = ConnectConfig::from_env()?;
    tracing::debug!(?config, "configuration resolved");

    let mode = cli.modes.mode().ok_or(CommandError::NoOperation)?;
    print_banner(out, &style, &config, mode)?;

    let operation = resolve(mode, cli.args)?;
    tracing::debug!(?operation, "arguments validated");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    let client = HttpConnectClient::new(&config)?;
    let mut operator = StdinOperator;
    let mut session = Session::new(&client, &mut operator, out, style);

    // Ctrl-C at the confirmation prompt is handled by the operator (exit 0);
    // anywhere else it aborts the run.
    let result = runtime.block_on(interruptible(
        run(&operation, &mut session),
        tokio::signal::ctrl_c(),
    ));
    // a stdin read abandoned after Ctrl-C must not hold the process open
    runtime.shutdown_background();
    result
}
