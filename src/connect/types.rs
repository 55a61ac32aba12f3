/*!
Request / response entities exchanged with the connect API.

All of these are transient: built by a handler for a single invocation and
dropped when the command finishes.
*/

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status string the API reports for an account that is ready to use.
pub const ACTIVE_STATUS: &str = "ACTIVE";

/// Content type used for upload payloads whose extension is not recognized.
pub const OCTET_STREAM: &str = "application/octet-stream";

/* ---- Connected accounts ---- */

/// Link between an external identity and a third-party connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedAccount {
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, alias = "connector", skip_serializing_if = "Option::is_none")]
    pub connection_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

impl ConnectedAccount {
    pub fn is_active(&self) -> bool {
        self.status == ACTIVE_STATUS
    }
}

/// One-time URL a human follows to grant access.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthorizationLink {
    pub link: String,
    #[serde(default)]
    pub expiry: Option<String>,
}

/* ---- Tool execution ---- */

#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteToolRequest {
    pub tool_name: String,
    pub identifier: String,
    pub connected_account_id: String,
    /// Caller-supplied input, passed through unmodified.
    pub tool_input: Value,
}

/// Value produced by a tool run. Objects and arrays are structured; anything
/// else is treated as an opaque scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput(pub Value);

impl ToolOutput {
    pub fn is_structured(&self) -> bool {
        matches!(self.0, Value::Object(_) | Value::Array(_))
    }

    /// Human rendering: pretty JSON for structured values, the bare text for strings.
    pub fn render(&self) -> String {
        match &self.0 {
            Value::String(s) => s.clone(),
            v if self.is_structured() => {
                serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
            }
            v => v.to_string(),
        }
    }
}

/* ---- Proxy ---- */

/// Raw bytes uploaded as the proxied request body.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProxyRequest {
    pub connection_name: String,
    pub identifier: String,
    pub path: String,
    pub method: Method,
    pub query_params: Map<String, Value>,
    pub body: Option<Value>,
    pub payload: Option<FilePayload>,
}

#[derive(Debug, Clone, Default)]
pub struct ProxyResponse {
    pub status: u16,
    /// Header pairs as received (names lower-cased).
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ProxyResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> &str {
        self.header("content-type").unwrap_or("")
    }

    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/* ---- Tool metadata ---- */

/// Listing filter. Both fields are optional and independently combinable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolFilter {
    pub tool_name: Vec<String>,
    pub provider: Option<String>,
}

impl ToolFilter {
    pub fn new(tool_name: Option<&str>, provider: Option<&str>) -> Self {
        Self {
            tool_name: tool_name.map(|n| vec![n.to_string()]).unwrap_or_default(),
            provider: provider.map(str::to_string),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tool_name.is_empty() && self.provider.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListToolsRequest {
    pub filter: ToolFilter,
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
}

impl ListToolsRequest {
    /// Query pairs for the listing endpoint; empty parts are omitted.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for name in &self.filter.tool_name {
            pairs.push(("filter.tool_name".to_string(), name.clone()));
        }
        if let Some(p) = &self.filter.provider {
            pairs.push(("filter.provider".to_string(), p.clone()));
        }
        if let Some(size) = self.page_size {
            pairs.push(("page_size".to_string(), size.to_string()));
        }
        if let Some(token) = &self.page_token {
            pairs.push(("page_token".to_string(), token.clone()));
        }
        pairs
    }
}
