/*!
shared.rs - pieces used by more than one command.

  - Session: the client, operator, output sink and style a handler runs with
  - print_banner: startup header
  - fetch_account: get-or-create + status report
  - request_authorization: link generation + operator confirmation
*/

use std::io::Write;

use super::confirm::{Confirmation, Operator};
use super::dispatch::Mode;
use super::error::CommandError;
use super::format::{Role, StyleOptions, color, decorate};
use crate::config::ConnectConfig;
use crate::connect::{ConnectClient, ConnectedAccount};

/// Everything a handler needs for one run.
pub struct Session<'a> {
    pub client: &'a dyn ConnectClient,
    pub operator: &'a mut dyn Operator,
    pub out: &'a mut dyn Write,
    pub style: StyleOptions,
}

impl<'a> Session<'a> {
    pub fn new(
        client: &'a dyn ConnectClient,
        operator: &'a mut dyn Operator,
        out: &'a mut dyn Write,
        style: StyleOptions,
    ) -> Self {
        Self {
            client,
            operator,
            out,
            style,
        }
    }
}

pub fn print_banner(
    out: &mut dyn Write,
    style: &StyleOptions,
    config: &ConnectConfig,
    mode: Mode,
) -> std::io::Result<()> {
    writeln!(out, "{}", decorate("rocket", "Scalekit Connect CLI", style))?;
    writeln!(out, "   Env URL: {}", config.base_url())?;
    writeln!(out, "   Client ID: {}...", config.client_id_prefix())?;
    writeln!(out, "   Operation: {}", mode.title())?;
    writeln!(out)
}

/* ---- Connected account flow ---- */

/// Fetch (or create) the connected account and report its id and status.
pub async fn fetch_account(
    session: &mut Session<'_>,
    connection_name: &str,
    identifier: &str,
) -> Result<ConnectedAccount, CommandError> {
    tracing::info!(connection_name, identifier, "resolving connected account");
    let account = session
        .client
        .get_or_create_connected_account(connection_name, identifier)
        .await?;
    writeln!(session.out, "   Connected Account ID: {}", account.id)?;
    writeln!(session.out, "   Status: {}", account.status)?;
    Ok(account)
}

/// Account is not active: request a link, show it, wait for the operator.
pub async fn request_authorization(
    session: &mut Session<'_>,
    connection_name: &str,
    identifier: &str,
    status: &str,
) -> Result<Confirmation, CommandError> {
    let style = session.style;
    let warning = format!("{connection_name} is not connected (status: {status})");
    writeln!(
        session.out,
        "\n{}",
        color(Role::Warning, decorate("warn", warning, &style), &style)
    )?;

    let link = session
        .client
        .get_authorization_link(connection_name, identifier)
        .await?;

    writeln!(
        session.out,
        "\n{}",
        decorate(
            "link",
            format!("Click the link to authorize {connection_name}:"),
            &style
        )
    )?;
    writeln!(session.out, "   {}", color(Role::Link, &link.link, &style))?;
    writeln!(session.out)?;
    write!(
        session.out,
        "{}",
        decorate(
            "prompt",
            format!("Press Enter after authorizing {connection_name}..."),
            &style
        )
    )?;
    session.out.flush()?;

    Ok(session.operator.confirm().await)
}

/// Notice printed when confirmation was impossible; `next_step` completes
/// "then re-run to ...".
pub fn non_interactive_notice(
    session: &mut Session<'_>,
    next_step: &str,
) -> Result<(), CommandError> {
    let style = session.style;
    writeln!(
        session.out,
        "\n{}",
        color(
            Role::Warning,
            format!("(Non-interactive mode — authorize the link above, then re-run to {next_step}.)"),
            &style
        )
    )?;
    Ok(())
}
