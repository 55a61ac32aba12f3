/*!
`generate_link.rs`

`--generate-link`: make sure a connected account exists for
(connection, identifier) and, unless it is already ACTIVE, print an
authorization link and wait for the operator to complete it.
*/

use super::confirm::Confirmation;
use super::error::{CommandError, Outcome};
use super::format::{Role, color, decorate};
use super::shared::{Session, fetch_account, non_interactive_notice, request_authorization};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateLinkArgs {
    pub connection_name: String,
    pub identifier: String,
}

pub async fn execute_generate_link(
    session: &mut Session<'_>,
    args: &GenerateLinkArgs,
) -> Result<Outcome, CommandError> {
    let style = session.style;
    writeln!(session.out, "   Connection: {}", args.connection_name)?;
    writeln!(session.out, "   Identifier: {}", args.identifier)?;
    writeln!(session.out)?;

    let account = fetch_account(session, &args.connection_name, &args.identifier).await?;

    if account.is_active() {
        let msg = format!("{} is already connected and active!", args.connection_name);
        writeln!(
            session.out,
            "\n{}",
            color(Role::Success, decorate("success", msg, &style), &style)
        )?;
        return Ok(Outcome::Completed);
    }

    match request_authorization(
        session,
        &args.connection_name,
        &args.identifier,
        &account.status,
    )
    .await?
    {
        Confirmation::Confirmed => {
            let msg = format!(
                "Done! You can now execute tools for {}.",
                args.connection_name
            );
            writeln!(
                session.out,
                "\n{}",
                color(Role::Success, decorate("success", msg, &style), &style)
            )?;
            Ok(Outcome::Completed)
        }
        Confirmation::Unavailable => {
            non_interactive_notice(session, "continue")?;
            Ok(Outcome::AwaitingAuthorization)
        }
    }
}
