/*!
`execute_tool.rs`

`--execute-tool`: run a named tool for a connected account.

Flow:
  1. get-or-create the account; if not ACTIVE, show a link and wait
  2. after confirmation, fetch the account again (status may have changed)
     and use the fresh account id
  3. execute and print the result (pretty JSON for objects/arrays, raw otherwise)
*/

use serde_json::Value;

use super::confirm::Confirmation;
use super::error::{CommandError, Outcome};
use super::format::{Role, color, decorate, pretty_json};
use super::shared::{Session, fetch_account, non_interactive_notice, request_authorization};
use crate::connect::ExecuteToolRequest;

#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteToolArgs {
    pub tool_name: String,
    pub connection_name: String,
    pub identifier: String,
    pub tool_input: Value,
}

pub async fn execute_execute_tool(
    session: &mut Session<'_>,
    args: &ExecuteToolArgs,
) -> Result<Outcome, CommandError> {
    let style = session.style;
    writeln!(session.out, "   Tool: {}", args.tool_name)?;
    writeln!(session.out, "   Connection: {}", args.connection_name)?;
    writeln!(session.out, "   Identifier: {}", args.identifier)?;
    writeln!(session.out, "   Input: {}", pretty_json(&args.tool_input))?;
    writeln!(session.out)?;

    let mut account = fetch_account(session, &args.connection_name, &args.identifier).await?;

    if !account.is_active() {
        let confirmation = request_authorization(
            session,
            &args.connection_name,
            &args.identifier,
            &account.status,
        )
        .await?;
        if confirmation == Confirmation::Unavailable {
            non_interactive_notice(session, "execute")?;
            return Ok(Outcome::AwaitingAuthorization);
        }

        account = session
            .client
            .get_or_create_connected_account(&args.connection_name, &args.identifier)
            .await?;
        tracing::info!(
            account_id = %account.id,
            status = %account.status,
            "connected account re-fetched after authorization"
        );
    }

    writeln!(
        session.out,
        "\n{}",
        decorate(
            "tool",
            format!("Executing tool: {}", color(Role::Bold, &args.tool_name, &style)),
            &style
        )
    )?;

    let request = ExecuteToolRequest {
        tool_name: args.tool_name.clone(),
        identifier: args.identifier.clone(),
        connected_account_id: account.id.clone(),
        tool_input: args.tool_input.clone(),
    };
    let output = session.client.execute_tool(&request).await?;

    writeln!(
        session.out,
        "\n{}",
        color(Role::Success, decorate("success", "Result:", &style), &style)
    )?;
    writeln!(session.out, "{}", output.render())?;
    Ok(Outcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::testing::{Call, FakeClient, ScriptedOperator, account, session, text};
    use serde_json::json;

    fn args() -> ExecuteToolArgs {
        ExecuteToolArgs {
            tool_name: "slack_send_message".into(),
            connection_name: "SLACK".into(),
            identifier: "user_123".into(),
            tool_input: json!({"channel": "#general", "text": "Hello!"}),
        }
    }

    fn executed(client: &FakeClient) -> Vec<ExecuteToolRequest> {
        client
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Execute(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn active_account_executes_directly() {
        let client = FakeClient::with_accounts([account("ca_active", "ACTIVE")]);
        let mut op = ScriptedOperator::default();
        let mut out = Vec::new();

        let outcome = execute_execute_tool(&mut session(&client, &mut op, &mut out), &args())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(op.asked, 0);
        assert_eq!(client.count(|c| matches!(c, Call::Link { .. })), 0);
        let runs = executed(&client);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].connected_account_id, "ca_active");
        assert_eq!(runs[0].tool_input, args().tool_input);
        assert!(text(&out).contains("\"ok\": true"));
    }

    #[tokio::test]
    async fn refetches_account_after_confirmation() {
        let client = FakeClient::with_accounts([
            account("ca_stale", "PENDING_AUTH"),
            account("ca_fresh", "ACTIVE"),
        ]);
        let mut op = ScriptedOperator::answering([Confirmation::Confirmed]);
        let mut out = Vec::new();

        execute_execute_tool(&mut session(&client, &mut op, &mut out), &args())
            .await
            .unwrap();

        assert_eq!(
            client.count(|c| matches!(c, Call::GetOrCreate { .. })),
            2,
            "account must be fetched again after authorization"
        );
        let runs = executed(&client);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].connected_account_id, "ca_fresh");

        // Order: fetch, link, fetch, execute.
        let calls = client.calls();
        assert!(matches!(calls[1], Call::Link { .. }));
        assert!(matches!(calls[2], Call::GetOrCreate { .. }));
        assert!(matches!(calls[3], Call::Execute(_)));
    }

    #[tokio::test]
    async fn unavailable_operator_stops_before_execution() {
        let client = FakeClient::with_accounts([account("ca_1", "PENDING_AUTH")]);
        let mut op = ScriptedOperator::answering([Confirmation::Unavailable]);
        let mut out = Vec::new();

        let outcome = execute_execute_tool(&mut session(&client, &mut op, &mut out), &args())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::AwaitingAuthorization);
        assert!(executed(&client).is_empty());
        assert!(text(&out).contains("re-run to execute."));
    }

    #[tokio::test]
    async fn scalar_result_printed_as_is() {
        let client = FakeClient {
            tool_output: json!("message sent"),
            ..FakeClient::with_accounts([account("ca_1", "ACTIVE")])
        };
        let mut op = ScriptedOperator::default();
        let mut out = Vec::new();

        execute_execute_tool(&mut session(&client, &mut op, &mut out), &args())
            .await
            .unwrap();

        let printed = text(&out);
        assert!(printed.contains("Result:\nmessage sent\n"));
        assert!(!printed.contains("\"message sent\""));
    }

    #[tokio::test]
    async fn execution_failure_is_remote_error() {
        let client = FakeClient {
            failure: Some("tool not found".into()),
            ..FakeClient::default()
        };
        let mut op = ScriptedOperator::default();
        let mut out = Vec::new();

        let err = execute_execute_tool(&mut session(&client, &mut op, &mut out), &args())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Remote(_)));
    }
}
