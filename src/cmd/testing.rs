//! In-memory doubles for command tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::confirm::{Confirmation, Operator};
use super::format::StyleOptions;
use super::shared::Session;
use crate::connect::{
    AuthorizationLink, ConnectClient, ConnectError, ConnectedAccount, ExecuteToolRequest,
    ListToolsRequest, ProxyRequest, ProxyResponse, ToolOutput,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetOrCreate { connection: String, identifier: String },
    Link { connection: String, identifier: String },
    Execute(ExecuteToolRequest),
    Proxy(ProxyRequest),
    ListTools(ListToolsRequest),
}

pub fn account(id: &str, status: &str) -> ConnectedAccount {
    ConnectedAccount {
        id: id.to_string(),
        status: status.to_string(),
        connection_name: None,
        identifier: None,
    }
}

/// Scripted `ConnectClient`. Each get-or-create pops the next account;
/// `failure` makes every call fail with that message.
pub struct FakeClient {
    pub accounts: Mutex<VecDeque<ConnectedAccount>>,
    pub link: String,
    pub tool_output: Value,
    pub proxy_response: ProxyResponse,
    pub tools: Value,
    pub failure: Option<String>,
    pub calls: Mutex<Vec<Call>>,
}

impl Default for FakeClient {
    fn default() -> Self {
        Self {
            accounts: Mutex::new(VecDeque::new()),
            link: "https://auth.example/link/abc".to_string(),
            tool_output: json!({"ok": true}),
            proxy_response: ProxyResponse::default(),
            tools: json!({"tools": []}),
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeClient {
    pub fn with_accounts(accounts: impl IntoIterator<Item = ConnectedAccount>) -> Self {
        Self {
            accounts: Mutex::new(accounts.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) -> Result<(), ConnectError> {
        self.calls.lock().unwrap().push(call);
        match &self.failure {
            Some(msg) => Err(ConnectError::Api {
                status: 503,
                message: msg.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ConnectClient for FakeClient {
    async fn get_or_create_connected_account(
        &self,
        connection_name: &str,
        identifier: &str,
    ) -> Result<ConnectedAccount, ConnectError> {
        self.record(Call::GetOrCreate {
            connection: connection_name.to_string(),
            identifier: identifier.to_string(),
        })?;
        self.accounts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ConnectError::Api {
                status: 404,
                message: "no scripted account".into(),
            })
    }

    async fn get_authorization_link(
        &self,
        connection_name: &str,
        identifier: &str,
    ) -> Result<AuthorizationLink, ConnectError> {
        self.record(Call::Link {
            connection: connection_name.to_string(),
            identifier: identifier.to_string(),
        })?;
        Ok(AuthorizationLink {
            link: self.link.clone(),
            expiry: None,
        })
    }

    async fn execute_tool(
        &self,
        request: &ExecuteToolRequest,
    ) -> Result<ToolOutput, ConnectError> {
        self.record(Call::Execute(request.clone()))?;
        Ok(ToolOutput(self.tool_output.clone()))
    }

    async fn proxy_request(&self, request: &ProxyRequest) -> Result<ProxyResponse, ConnectError> {
        self.record(Call::Proxy(request.clone()))?;
        Ok(self.proxy_response.clone())
    }

    async fn list_tools(&self, request: &ListToolsRequest) -> Result<Value, ConnectError> {
        self.record(Call::ListTools(request.clone()))?;
        Ok(self.tools.clone())
    }
}

/// Operator that answers from a fixed script; `Unavailable` once exhausted.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    answers: VecDeque<Confirmation>,
    pub asked: usize,
}

impl ScriptedOperator {
    pub fn answering(answers: impl IntoIterator<Item = Confirmation>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: 0,
        }
    }
}

#[async_trait]
impl Operator for ScriptedOperator {
    async fn confirm(&mut self) -> Confirmation {
        self.asked += 1;
        self.answers.pop_front().unwrap_or(Confirmation::Unavailable)
    }
}

/// Plain-style session writing into `out`.
pub fn session<'a>(
    client: &'a FakeClient,
    operator: &'a mut ScriptedOperator,
    out: &'a mut Vec<u8>,
) -> Session<'a> {
    Session::new(client, operator, out, StyleOptions::plain())
}

pub fn text(out: &[u8]) -> String {
    String::from_utf8_lossy(out).into_owned()
}
