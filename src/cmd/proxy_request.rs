/*!
`proxy_request.rs`

`--proxy-request`: relay a raw HTTP call for a connected account. Exists
for payloads tool execution cannot carry (file uploads, binary exports).

Response handling, first match wins:
  status >= 400        print body (JSON if parseable, else text), fail
  --output-file        write raw bytes, report byte count
  application/json     pretty-print
  text/ prefix         print up to TEXT_PREVIEW_CHARS characters
  anything else        byte count + base64 preview
*/

use std::path::{Path, PathBuf};

use reqwest::Method;
use serde_json::{Map, Value};

use super::error::{CommandError, Outcome};
use super::format::{Role, base64_preview, color, decorate, pretty_json, truncate_chars};
use super::shared::Session;
use crate::connect::{ConnectError, FilePayload, OCTET_STREAM, ProxyRequest, ProxyResponse};

pub const TEXT_PREVIEW_CHARS: usize = 3000;
pub const BASE64_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct ProxyRequestArgs {
    pub connection_name: String,
    pub identifier: String,
    pub path: String,
    pub method: Method,
    pub query_params: Map<String, Value>,
    pub body: Option<Value>,
    pub output_file: Option<PathBuf>,
    pub input_file: Option<PathBuf>,
}

pub async fn execute_proxy_request(
    session: &mut Session<'_>,
    args: &ProxyRequestArgs,
) -> Result<Outcome, CommandError> {
    writeln!(session.out, "   Connection: {}", args.connection_name)?;
    writeln!(session.out, "   Identifier: {}", args.identifier)?;
    writeln!(session.out, "   Method: {}", args.method)?;
    writeln!(session.out, "   Path: {}", args.path)?;
    if !args.query_params.is_empty() {
        let query = Value::Object(args.query_params.clone());
        writeln!(session.out, "   Query Params: {}", pretty_json(&query))?;
    }
    if let Some(body) = &args.body {
        writeln!(session.out, "   Body: {}", pretty_json(body))?;
    }
    if let Some(input) = &args.input_file {
        writeln!(session.out, "   Input File: {}", input.display())?;
    }
    writeln!(session.out)?;

    let payload = match &args.input_file {
        Some(path) => {
            let payload = load_payload(path)?;
            writeln!(session.out, "   File size: {} bytes", payload.bytes.len())?;
            writeln!(session.out, "   File MIME: {}", payload.content_type)?;
            writeln!(session.out)?;
            Some(payload)
        }
        None => None,
    };

    let request = ProxyRequest {
        connection_name: args.connection_name.clone(),
        identifier: args.identifier.clone(),
        path: args.path.clone(),
        method: args.method.clone(),
        query_params: args.query_params.clone(),
        body: args.body.clone(),
        payload,
    };
    let response = session.client.proxy_request(&request).await?;

    writeln!(session.out, "   Status: {}", response.status)?;
    writeln!(session.out, "   Content-Type: {}", response.content_type())?;
    writeln!(session.out)?;

    render_response(session, &response, args.output_file.as_deref())
}

/// Read an upload file and guess its content type from the extension.
pub fn load_payload(path: &Path) -> Result<FilePayload, CommandError> {
    let bytes = std::fs::read(path).map_err(|source| CommandError::File {
        action: "read",
        path: path.to_path_buf(),
        source,
    })?;
    Ok(FilePayload {
        bytes,
        content_type: guess_content_type(path),
    })
}

pub fn guess_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(OCTET_STREAM)
        .to_string()
}

fn render_response(
    session: &mut Session<'_>,
    response: &ProxyResponse,
    output_file: Option<&Path>,
) -> Result<Outcome, CommandError> {
    let style = session.style;

    if response.is_error() {
        writeln!(
            session.out,
            "{}",
            color(Role::Error, decorate("error", "Error response:", &style), &style)
        )?;
        match response.json() {
            Some(v) => writeln!(session.out, "{}", pretty_json(&v))?,
            None => writeln!(session.out, "{}", response.text())?,
        }
        return Err(CommandError::ErrorResponse {
            status: response.status,
        });
    }

    if let Some(path) = output_file {
        std::fs::write(path, &response.body).map_err(|source| CommandError::File {
            action: "write",
            path: path.to_path_buf(),
            source,
        })?;
        let msg = format!(
            "Saved {} bytes to: {}",
            response.body.len(),
            path.display()
        );
        writeln!(
            session.out,
            "{}",
            color(Role::Success, decorate("success", msg, &style), &style)
        )?;
        return Ok(Outcome::Completed);
    }

    let content_type = response.content_type();
    if content_type.contains("application/json") {
        let value: Value = serde_json::from_slice(&response.body).map_err(|source| {
            ConnectError::Decode {
                endpoint: "proxy",
                source,
            }
        })?;
        writeln!(
            session.out,
            "{}",
            color(Role::Success, decorate("success", "Result:", &style), &style)
        )?;
        writeln!(session.out, "{}", pretty_json(&value))?;
        return Ok(Outcome::Completed);
    }

    if content_type.starts_with("text/") {
        let text = response.text();
        let total = text.chars().count();
        let (head, truncated) = truncate_chars(&text, TEXT_PREVIEW_CHARS);
        writeln!(
            session.out,
            "{}",
            color(
                Role::Success,
                decorate("success", format!("Result ({total} chars):"), &style),
                &style
            )
        )?;
        writeln!(session.out, "{head}")?;
        if truncated {
            writeln!(
                session.out,
                "\n{}",
                color(
                    Role::Warning,
                    format!("... (truncated, {total} total chars)"),
                    &style
                )
            )?;
        }
        return Ok(Outcome::Completed);
    }

    let msg = format!("Binary response ({} bytes)", response.body.len());
    writeln!(
        session.out,
        "{}",
        color(Role::Success, decorate("success", msg, &style), &style)
    )?;
    writeln!(
        session.out,
        "   Base64 preview: {}...",
        base64_preview(&response.body, BASE64_PREVIEW_CHARS)
    )?;
    writeln!(
        session.out,
        "\n{}",
        color(
            Role::Warning,
            "Tip: use --output-file <path> to save the file.",
            &style
        )
    )?;
    Ok(Outcome::Completed)
}
