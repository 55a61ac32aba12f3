/*!
`get_tool.rs`

`--get-tool`: list tool metadata and print the response as JSON.

Filters (`--tool-name`, `--provider`) and paging (`--page-size`,
`--page-token`) are all optional. No connected account is involved.
*/

use super::error::{CommandError, Outcome};
use super::format::pretty_json;
use super::shared::Session;
use crate::connect::{ListToolsRequest, ToolFilter};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetToolArgs {
    pub tool_name: Option<String>,
    pub provider: Option<String>,
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
}

impl GetToolArgs {
    pub fn to_request(&self) -> ListToolsRequest {
        ListToolsRequest {
            filter: ToolFilter::new(self.tool_name.as_deref(), self.provider.as_deref()),
            page_size: self.page_size,
            page_token: self.page_token.clone(),
        }
    }
}

pub async fn execute_get_tool(
    session: &mut Session<'_>,
    args: &GetToolArgs,
) -> Result<Outcome, CommandError> {
    let request = args.to_request();
    tracing::debug!(?request, filtered = !request.filter.is_empty(), "listing tools");
    let response = session.client.list_tools(&request).await?;
    writeln!(session.out, "{}", pretty_json(&response))?;
    Ok(Outcome::Completed)
}
