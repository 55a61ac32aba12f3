/*!
`dispatch.rs`

Mode flags and per-mode argument validation.

The four mode flags form a required, mutually exclusive clap group, so a
missing or doubled mode fails at parse time. Everything else is optional at
parse time and validated here once the mode is known:

  --generate-link   connection-name, identifier
  --execute-tool    connection-name, identifier, tool-name, tool-input (JSON)
  --proxy-request   connection-name, identifier, path; method, query-params (JSON object),
                    body (JSON), output-file, input-file optional
  --get-tool        tool-name, provider, page-size, page-token (all optional)
*/

use std::future::Future;
use std::io;
use std::path::PathBuf;

use clap::Args;
use reqwest::Method;
use serde_json::Value;

use super::error::{CommandError, Outcome};
use super::execute_tool::{ExecuteToolArgs, execute_execute_tool};
use super::generate_link::{GenerateLinkArgs, execute_generate_link};
use super::get_tool::{GetToolArgs, execute_get_tool};
use super::proxy_request::{ProxyRequestArgs, execute_proxy_request};
use super::shared::Session;

#[derive(Args, Debug, Clone, Copy, Default)]
#[group(required = true, multiple = false)]
pub struct ModeFlags {
    /// Get or create a connected account and generate an authorization link if not active
    #[arg(long)]
    pub generate_link: bool,

    /// Execute a tool on behalf of a user (prompts for auth if not connected)
    #[arg(long)]
    pub execute_tool: bool,

    /// Fetch tool metadata and print it as JSON
    #[arg(long)]
    pub get_tool: bool,

    /// Make a proxied HTTP request (handles binary file responses)
    #[arg(long)]
    pub proxy_request: bool,
}

impl ModeFlags {
    pub fn mode(&self) -> Option<Mode> {
        match (
            self.generate_link,
            self.execute_tool,
            self.proxy_request,
            self.get_tool,
        ) {
            (true, false, false, false) => Some(Mode::GenerateLink),
            (false, true, false, false) => Some(Mode::ExecuteTool),
            (false, false, true, false) => Some(Mode::ProxyRequest),
            (false, false, false, true) => Some(Mode::GetTool),
            _ => None,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct OperationArgs {
    /// Connection name (e.g. SLACK, GMAIL); required for all modes except --get-tool
    #[arg(long, value_name = "NAME")]
    pub connection_name: Option<String>,

    /// Unique identifier for the connected account; required for all modes except --get-tool
    #[arg(long, value_name = "ID")]
    pub identifier: Option<String>,

    /// Tool to execute (required for --execute-tool) or to filter by (--get-tool)
    #[arg(long, value_name = "NAME")]
    pub tool_name: Option<String>,

    /// JSON object of tool input parameters (required for --execute-tool)
    #[arg(long, value_name = "JSON")]
    pub tool_input: Option<String>,

    /// API path to proxy, e.g. /drive/v3/files/FILE_ID/export (required for --proxy-request)
    #[arg(long)]
    pub path: Option<String>,

    /// HTTP method for --proxy-request
    #[arg(long, default_value = "GET")]
    pub method: String,

    /// JSON object of query parameters for --proxy-request
    #[arg(long, value_name = "JSON")]
    pub query_params: Option<String>,

    /// JSON request body for --proxy-request
    #[arg(long, value_name = "JSON")]
    pub body: Option<String>,

    /// Save the proxied response to this file
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Upload this file as the proxied request body
    #[arg(long, value_name = "PATH")]
    pub input_file: Option<PathBuf>,

    /// Filter tools by provider (e.g. GOOGLE, SLACK), used with --get-tool
    #[arg(long)]
    pub provider: Option<String>,

    /// Number of tools per page (--get-tool; API default when omitted)
    #[arg(long, value_name = "N")]
    pub page_size: Option<u32>,

    /// Pagination token from a previous --get-tool response
    #[arg(long, value_name = "TOKEN")]
    pub page_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    GenerateLink,
    ExecuteTool,
    ProxyRequest,
    GetTool,
}

impl Mode {
    /// Flag name without the leading dashes.
    pub fn flag(&self) -> &'static str {
        match self {
            Mode::GenerateLink => "generate-link",
            Mode::ExecuteTool => "execute-tool",
            Mode::ProxyRequest => "proxy-request",
            Mode::GetTool => "get-tool",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Mode::GenerateLink => "Generate Auth Link",
            Mode::ExecuteTool => "Execute Tool",
            Mode::ProxyRequest => "Proxy Request",
            Mode::GetTool => "Get Tool",
        }
    }
}

/// A fully validated command, ready to run.
#[derive(Debug, Clone)]
pub enum Operation {
    GenerateLink(GenerateLinkArgs),
    ExecuteTool(ExecuteToolArgs),
    ProxyRequest(ProxyRequestArgs),
    GetTool(GetToolArgs),
}

/// Validate mode-specific arguments. Makes no API calls.
pub fn resolve(mode: Mode, args: OperationArgs) -> Result<Operation, CommandError> {
    let required = |value: Option<String>, arg: &'static str| {
        value
            .filter(|v| !v.is_empty())
            .ok_or(CommandError::MissingArgument {
                arg,
                mode: mode.flag(),
            })
    };

    match mode {
        Mode::GenerateLink => Ok(Operation::GenerateLink(GenerateLinkArgs {
            connection_name: required(args.connection_name, "connection-name")?,
            identifier: required(args.identifier, "identifier")?,
        })),
        Mode::ExecuteTool => {
            let connection_name = required(args.connection_name, "connection-name")?;
            let identifier = required(args.identifier, "identifier")?;
            let tool_name = required(args.tool_name, "tool-name")?;
            let raw_input = required(args.tool_input, "tool-input")?;
            Ok(Operation::ExecuteTool(ExecuteToolArgs {
                tool_name,
                connection_name,
                identifier,
                tool_input: parse_json_arg("tool-input", &raw_input)?,
            }))
        }
        Mode::ProxyRequest => {
            let connection_name = required(args.connection_name, "connection-name")?;
            let identifier = required(args.identifier, "identifier")?;
            let path = required(args.path, "path")?;

            let query_params = match non_empty(args.query_params) {
                Some(raw) => match parse_json_arg("query-params", &raw)? {
                    Value::Object(map) => map,
                    _ => return Err(CommandError::NotAnObject { arg: "query-params" }),
                },
                None => serde_json::Map::new(),
            };
            let body = non_empty(args.body)
                .map(|raw| parse_json_arg("body", &raw))
                .transpose()?;

            Ok(Operation::ProxyRequest(ProxyRequestArgs {
                connection_name,
                identifier,
                path,
                method: parse_method(&args.method)?,
                query_params,
                body,
                output_file: args.output_file,
                input_file: args.input_file,
            }))
        }
        Mode::GetTool => Ok(Operation::GetTool(GetToolArgs {
            tool_name: non_empty(args.tool_name),
            provider: non_empty(args.provider),
            page_size: args.page_size,
            page_token: non_empty(args.page_token),
        })),
    }
}

pub async fn run(operation: &Operation, session: &mut Session<'_>) -> Result<Outcome, CommandError> {
    match operation {
        Operation::GenerateLink(args) => execute_generate_link(session, args).await,
        Operation::ExecuteTool(args) => execute_execute_tool(session, args).await,
        Operation::ProxyRequest(args) => execute_proxy_request(session, args).await,
        Operation::GetTool(args) => execute_get_tool(session, args).await,
    }
}

/// Run `operation` until it finishes or `interrupt` fires (Ctrl-C for the
/// real binary). The operation is polled first, so a confirmation prompt
/// that handles the same interrupt itself still ends with its own outcome.
pub async fn interruptible<F, I>(operation: F, interrupt: I) -> Result<Outcome, CommandError>
where
    F: Future<Output = Result<Outcome, CommandError>>,
    I: Future<Output = io::Result<()>>,
{
    tokio::pin!(operation);
    tokio::select! {
        biased;
        result = &mut operation => result,
        signal = interrupt => match signal {
            Ok(()) => {
                tracing::debug!("interrupted while running the operation");
                Err(CommandError::Interrupted)
            }
            Err(e) => {
                tracing::warn!("cannot listen for Ctrl-C: {e}");
                operation.await
            }
        },
    }
}

/// Parse a JSON-valued flag, naming the flag on failure.
pub fn parse_json_arg(arg: &'static str, raw: &str) -> Result<Value, CommandError> {
    serde_json::from_str(raw).map_err(|source| CommandError::InvalidJson { arg, source })
}

fn parse_method(raw: &str) -> Result<Method, CommandError> {
    let upper = raw.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return Ok(Method::GET);
    }
    Method::from_bytes(upper.as_bytes()).map_err(|_| CommandError::InvalidMethod(raw.to_string()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
