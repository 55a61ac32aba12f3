/*!
`http.rs`

REST implementation of `ConnectClient`.

Auth: OAuth2 client-credentials against `{env}/oauth/token`; the bearer token
is fetched on first use and reused for the rest of the process.

Routes (relative to the environment URL):
  POST /api/v1/connected_accounts:getOrCreate     {connector, identifier}
  POST /api/v1/connected_accounts/magic_link      {connector, identifier}
  POST /api/v1/execute_tool                       {tool_name, identifier, connected_account_id, params}
  GET  /api/v1/tools                              ?filter.tool_name=..&filter.provider=..&page_size=..&page_token=..
  *    /api/v1/connected_accounts/proxy{path}     x-connection-name / x-identifier headers

No retries, no client-side timeouts beyond reqwest defaults.
*/

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use url::Url;

use super::error::extract_message;
use super::{
    AuthorizationLink, ConnectClient, ConnectError, ConnectedAccount, ExecuteToolRequest,
    ListToolsRequest, ProxyRequest, ProxyResponse, ToolOutput,
};
use crate::config::ConnectConfig;

const TOKEN_PATH: &str = "/oauth/token";
const GET_OR_CREATE_PATH: &str = "/api/v1/connected_accounts:getOrCreate";
const MAGIC_LINK_PATH: &str = "/api/v1/connected_accounts/magic_link";
const EXECUTE_TOOL_PATH: &str = "/api/v1/execute_tool";
const TOOLS_PATH: &str = "/api/v1/tools";
const PROXY_PATH: &str = "/api/v1/connected_accounts/proxy";

const CONNECTION_HEADER: HeaderName = HeaderName::from_static("x-connection-name");
const IDENTIFIER_HEADER: HeaderName = HeaderName::from_static("x-identifier");

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ConnectedAccountEnvelope {
    connected_account: ConnectedAccount,
}

pub struct HttpConnectClient {
    http: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    token: OnceCell<String>,
}

impl std::fmt::Debug for HttpConnectClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConnectClient")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl HttpConnectClient {
    pub fn new(config: &ConnectConfig) -> Result<Self, ConnectError> {
        let http = Client::builder()
            .user_agent(concat!("connect-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token: OnceCell::new(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, ConnectError> {
        Ok(Url::parse(&format!("{}{}", self.base_url, path))?)
    }

    async fn access_token(&self) -> Result<&str, ConnectError> {
        let token = self
            .token
            .get_or_try_init(|| async {
                tracing::debug!(client_id = %self.client_id, "requesting access token");
                let resp = self
                    .http
                    .post(self.url(TOKEN_PATH)?)
                    .form(&[
                        ("grant_type", "client_credentials"),
                        ("client_id", self.client_id.as_str()),
                        ("client_secret", self.client_secret.as_str()),
                    ])
                    .send()
                    .await?;
                let status = resp.status();
                let text = resp.text().await?;
                if !status.is_success() {
                    return Err(ConnectError::Auth {
                        status: status.as_u16(),
                        message: extract_message(&text),
                    });
                }
                let parsed: TokenResponse =
                    serde_json::from_str(&text).map_err(|source| ConnectError::Decode {
                        endpoint: TOKEN_PATH,
                        source,
                    })?;
                Ok::<String, ConnectError>(parsed.access_token)
            })
            .await?;
        Ok(token.as_str())
    }

    /// Send an authorized request and decode a JSON success body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        builder: RequestBuilder,
    ) -> Result<T, ConnectError> {
        let token = self.access_token().await?;
        let resp = builder.bearer_auth(token).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        tracing::debug!(endpoint, status = status.as_u16(), "connect API response");
        if !status.is_success() {
            return Err(ConnectError::from_body(status.as_u16(), &text));
        }
        serde_json::from_str(&text).map_err(|source| ConnectError::Decode { endpoint, source })
    }
}

#[async_trait]
impl ConnectClient for HttpConnectClient {
    async fn get_or_create_connected_account(
        &self,
        connection_name: &str,
        identifier: &str,
    ) -> Result<ConnectedAccount, ConnectError> {
        let builder = self
            .http
            .post(self.url(GET_OR_CREATE_PATH)?)
            .json(&json!({ "connector": connection_name, "identifier": identifier }));
        let envelope: ConnectedAccountEnvelope =
            self.send_json(GET_OR_CREATE_PATH, builder).await?;
        Ok(envelope.connected_account)
    }

    async fn get_authorization_link(
        &self,
        connection_name: &str,
        identifier: &str,
    ) -> Result<AuthorizationLink, ConnectError> {
        let builder = self
            .http
            .post(self.url(MAGIC_LINK_PATH)?)
            .json(&json!({ "connector": connection_name, "identifier": identifier }));
        self.send_json(MAGIC_LINK_PATH, builder).await
    }

    async fn execute_tool(
        &self,
        request: &ExecuteToolRequest,
    ) -> Result<ToolOutput, ConnectError> {
        let builder = self.http.post(self.url(EXECUTE_TOOL_PATH)?).json(&json!({
            "tool_name": request.tool_name,
            "identifier": request.identifier,
            "connected_account_id": request.connected_account_id,
            "params": request.tool_input,
        }));
        let value: Value = self.send_json(EXECUTE_TOOL_PATH, builder).await?;
        // Results are wrapped as {"data": ..., "execution_id": ...}.
        let data = match value {
            Value::Object(mut map) if map.contains_key("data") => {
                map.remove("data").unwrap_or(Value::Null)
            }
            other => other,
        };
        Ok(ToolOutput(data))
    }

    async fn proxy_request(&self, request: &ProxyRequest) -> Result<ProxyResponse, ConnectError> {
        let path = if request.path.starts_with('/') {
            request.path.clone()
        } else {
            format!("/{}", request.path)
        };
        let url = self.url(&format!("{PROXY_PATH}{path}"))?;

        let query: Vec<(String, String)> = request
            .query_params
            .iter()
            .map(|(k, v)| {
                let rendered = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                (k.clone(), rendered)
            })
            .collect();

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(CONNECTION_HEADER, header_value(&request.connection_name)?)
            .header(IDENTIFIER_HEADER, header_value(&request.identifier)?);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(payload) = &request.payload {
            if request.body.is_some() {
                tracing::warn!("both a file payload and a JSON body were given; sending the file");
            }
            builder = builder
                .header(CONTENT_TYPE, header_value(&payload.content_type)?)
                .body(payload.bytes.clone());
        } else if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let token = self.access_token().await?;
        tracing::debug!(method = %request.method, path = %path, "proxying request");
        let resp = builder.bearer_auth(token).send().await?;

        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = resp.bytes().await?.to_vec();
        Ok(ProxyResponse {
            status,
            headers,
            body,
        })
    }

    async fn list_tools(&self, request: &ListToolsRequest) -> Result<Value, ConnectError> {
        let mut builder = self.http.get(self.url(TOOLS_PATH)?);
        let pairs = request.query_pairs();
        if !pairs.is_empty() {
            builder = builder.query(&pairs);
        }
        self.send_json(TOOLS_PATH, builder).await
    }
}

fn header_value(raw: &str) -> Result<HeaderValue, ConnectError> {
    HeaderValue::from_str(raw).map_err(|_| ConnectError::Header(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect::{FilePayload, ToolFilter};
    use mockito::{Matcher, Server, ServerGuard};
    use reqwest::Method;

    fn config_for(server: &ServerGuard) -> ConnectConfig {
        ConnectConfig::from_lookup(|name| match name {
            "TOOL_CLIENT_ID" => Some("skc_test_client".to_string()),
            "TOOL_CLIENT_SECRET" => Some("shh".to_string()),
            "TOOL_ENV_URL" => Some(server.url()),
            _ => None,
        })
        .unwrap()
    }

    async fn mock_token(server: &mut ServerGuard) -> mockito::Mock {
        server
            .mock("POST", TOKEN_PATH)
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()),
                Matcher::UrlEncoded("client_id".into(), "skc_test_client".into()),
                Matcher::UrlEncoded("client_secret".into(), "shh".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"tok123","token_type":"Bearer","expires_in":3600}"#)
            .expect(1)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn token_fetched_once_and_reused() {
        let mut server = Server::new_async().await;
        let token = mock_token(&mut server).await;
        let account = server
            .mock("POST", GET_OR_CREATE_PATH)
            .match_header("authorization", "Bearer tok123")
            .match_body(Matcher::Json(
                json!({"connector":"SLACK","identifier":"user_1"}),
            ))
            .with_status(200)
            .with_body(r#"{"connected_account":{"id":"ca_1","status":"PENDING_AUTH"}}"#)
            .expect(2)
            .create_async()
            .await;

        let client = HttpConnectClient::new(&config_for(&server)).unwrap();
        let first = client
            .get_or_create_connected_account("SLACK", "user_1")
            .await
            .unwrap();
        let second = client
            .get_or_create_connected_account("SLACK", "user_1")
            .await
            .unwrap();

        assert_eq!(first.id, "ca_1");
        assert!(!second.is_active());
        token.assert_async().await;
        account.assert_async().await;
    }

    #[tokio::test]
    async fn token_rejection_is_auth_error() {
        let mut server = Server::new_async().await;
        let _token = server
            .mock("POST", TOKEN_PATH)
            .with_status(401)
            .with_body(r#"{"error":"invalid_client"}"#)
            .create_async()
            .await;

        let client = HttpConnectClient::new(&config_for(&server)).unwrap();
        let err = client
            .get_authorization_link("SLACK", "user_1")
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectError::Auth { status: 401, .. }));
        assert!(err.to_string().contains("invalid_client"));
    }

    #[tokio::test]
    async fn authorization_link_decoded() {
        let mut server = Server::new_async().await;
        let _token = mock_token(&mut server).await;
        let _link = server
            .mock("POST", MAGIC_LINK_PATH)
            .with_status(200)
            .with_body(r#"{"link":"https://auth.example/abc","expiry":"2026-10-20T00:00:00Z"}"#)
            .create_async()
            .await;

        let client = HttpConnectClient::new(&config_for(&server)).unwrap();
        let link = client
            .get_authorization_link("GMAIL", "user_2")
            .await
            .unwrap();
        assert_eq!(link.link, "https://auth.example/abc");
    }

    #[tokio::test]
    async fn execute_tool_unwraps_data() {
        let mut server = Server::new_async().await;
        let _token = mock_token(&mut server).await;
        let exec = server
            .mock("POST", EXECUTE_TOOL_PATH)
            .match_body(Matcher::Json(json!({
                "tool_name":"slack_send_message",
                "identifier":"user_1",
                "connected_account_id":"ca_9",
                "params":{"channel":"#general","text":"hi"}
            })))
            .with_status(200)
            .with_body(r#"{"data":{"ok":true,"ts":"1.2"},"execution_id":"ex_1"}"#)
            .create_async()
            .await;

        let client = HttpConnectClient::new(&config_for(&server)).unwrap();
        let out = client
            .execute_tool(&ExecuteToolRequest {
                tool_name: "slack_send_message".into(),
                identifier: "user_1".into(),
                connected_account_id: "ca_9".into(),
                tool_input: json!({"channel":"#general","text":"hi"}),
            })
            .await
            .unwrap();
        assert_eq!(out.0, json!({"ok":true,"ts":"1.2"}));
        exec.assert_async().await;
    }

    #[tokio::test]
    async fn api_error_carries_message() {
        let mut server = Server::new_async().await;
        let _token = mock_token(&mut server).await;
        let _exec = server
            .mock("POST", EXECUTE_TOOL_PATH)
            .with_status(404)
            .with_body(r#"{"code":5,"message":"tool not found"}"#)
            .create_async()
            .await;

        let client = HttpConnectClient::new(&config_for(&server)).unwrap();
        let err = client
            .execute_tool(&ExecuteToolRequest {
                tool_name: "nope".into(),
                identifier: "u".into(),
                connected_account_id: "ca".into(),
                tool_input: json!({}),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "API returned 404: tool not found");
    }

    #[tokio::test]
    async fn list_tools_sends_filter_query() {
        let mut server = Server::new_async().await;
        let _token = mock_token(&mut server).await;
        let list = server
            .mock("GET", TOOLS_PATH)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("filter.provider".into(), "GOOGLE".into()),
                Matcher::UrlEncoded("page_size".into(), "5".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"tools":[{"name":"googlesheets_get_values"}],"next_page_token":"n1"}"#)
            .create_async()
            .await;

        let client = HttpConnectClient::new(&config_for(&server)).unwrap();
        let value = client
            .list_tools(&ListToolsRequest {
                filter: ToolFilter::new(None, Some("GOOGLE")),
                page_size: Some(5),
                page_token: None,
            })
            .await
            .unwrap();
        assert_eq!(value["next_page_token"], "n1");
        list.assert_async().await;
    }

    #[tokio::test]
    async fn proxy_returns_error_status_as_response() {
        let mut server = Server::new_async().await;
        let _token = mock_token(&mut server).await;
        let proxied = server
            .mock("GET", "/api/v1/connected_accounts/proxy/drive/v3/files")
            .match_header("x-connection-name", "GOOGLE_DRIVE")
            .match_header("x-identifier", "user_1")
            .match_query(Matcher::UrlEncoded("pageSize".into(), "10".into()))
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"boom"}"#)
            .create_async()
            .await;

        let client = HttpConnectClient::new(&config_for(&server)).unwrap();
        let mut query = serde_json::Map::new();
        query.insert("pageSize".into(), json!(10));
        let resp = client
            .proxy_request(&ProxyRequest {
                connection_name: "GOOGLE_DRIVE".into(),
                identifier: "user_1".into(),
                path: "drive/v3/files".into(),
                method: Method::GET,
                query_params: query,
                body: None,
                payload: None,
            })
            .await
            .unwrap();
        assert_eq!(resp.status, 500);
        assert!(resp.is_error());
        assert_eq!(resp.content_type(), "application/json");
        proxied.assert_async().await;
    }

    #[tokio::test]
    async fn proxy_uploads_file_payload_with_its_content_type() {
        let mut server = Server::new_async().await;
        let _token = mock_token(&mut server).await;
        let upload = server
            .mock("POST", "/api/v1/connected_accounts/proxy/upload")
            .match_header("content-type", "image/png")
            .with_status(201)
            .with_body("created")
            .create_async()
            .await;

        let client = HttpConnectClient::new(&config_for(&server)).unwrap();
        let resp = client
            .proxy_request(&ProxyRequest {
                connection_name: "DRIVE".into(),
                identifier: "u".into(),
                path: "/upload".into(),
                method: Method::POST,
                query_params: serde_json::Map::new(),
                body: None,
                payload: Some(FilePayload {
                    bytes: vec![0x89, 0x50, 0x4e, 0x47],
                    content_type: "image/png".into(),
                }),
            })
            .await
            .unwrap();
        assert_eq!(resp.status, 201);
        assert_eq!(resp.text(), "created");
        upload.assert_async().await;
    }
}
