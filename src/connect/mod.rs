//! Connect API boundary.
//!
//! `ConnectClient` is the operation set the commands rely on:
//! fetch-or-create account / authorization link / tool execution /
//! HTTP proxy / tool listing. `HttpConnectClient` is the REST-backed
//! implementation; tests substitute an in-memory fake.

use async_trait::async_trait;

pub mod error;
pub mod http;
pub mod types;

pub use error::ConnectError;
pub use http::HttpConnectClient;
pub use types::{
    AuthorizationLink, ConnectedAccount, ExecuteToolRequest, FilePayload,
    ListToolsRequest, OCTET_STREAM, ProxyRequest, ProxyResponse, ToolFilter, ToolOutput,
};

#[async_trait]
pub trait ConnectClient: Send + Sync {
    /// Fetch the connected account for `(connection_name, identifier)`,
    /// creating it when it does not exist yet.
    async fn get_or_create_connected_account(
        &self,
        connection_name: &str,
        identifier: &str,
    ) -> Result<ConnectedAccount, ConnectError>;

    async fn get_authorization_link(
        &self,
        connection_name: &str,
        identifier: &str,
    ) -> Result<AuthorizationLink, ConnectError>;

    async fn execute_tool(&self, request: &ExecuteToolRequest)
    -> Result<ToolOutput, ConnectError>;

    /// Relay a raw HTTP call. HTTP error statuses come back as a response,
    /// only transport-level failures are errors.
    async fn proxy_request(&self, request: &ProxyRequest) -> Result<ProxyResponse, ConnectError>;

    /// List tool metadata; the response mapping keeps the API's field names.
    async fn list_tools(
        &self,
        request: &ListToolsRequest,
    ) -> Result<serde_json::Value, ConnectError>;
}
