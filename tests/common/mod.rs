#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use capability_agent::error::{CapabilityError, Result};
use capability_agent::interfaces::capabilities::{Action, Invocation, Workspace};
use capability_agent::interfaces::integrations::{
    IntegrationInvoker, IntegrationRequest, IntegrationResult,
};
use capability_agent::interfaces::plugins::Tool;
use capability_agent::interfaces::wallet::{Balance, ChainInfo, WalletClient};

/// Base58 of a 32-byte all-zero seed.
pub const ZERO_SEED: &str = "11111111111111111111111111111111";

/// Tool that records every argument payload and answers with a fixed outcome.
pub struct StaticTool {
    name: String,
    outcome: std::result::Result<Value, String>,
    pub calls: Mutex<Vec<Value>>,
}

impl StaticTool {
    pub fn ok(name: &str, output: Value) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            outcome: Ok(output),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Echoes the received arguments back as the result.
    pub fn echo(name: &str) -> Arc<Self> {
        Self::ok(name, Value::Null)
    }

    pub fn failing(name: &str, message: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            outcome: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn last_call(&self) -> Option<Value> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Tool for StaticTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "static test tool"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "to": { "type": "string" },
                "amount": { "type": "string" }
            }
        })
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        self.calls.lock().unwrap().push(params.clone());
        match &self.outcome {
            Ok(Value::Null) => Ok(params),
            Ok(value) => Ok(value.clone()),
            Err(message) => Err(CapabilityError::Runtime(message.clone())),
        }
    }
}

pub struct FakeWallet {
    pub address: String,
    pub balance: Balance,
    pub queried: Mutex<Vec<String>>,
}

impl FakeWallet {
    pub fn new(address: &str, value: &str, symbol: &str) -> Arc<Self> {
        Arc::new(Self {
            address: address.to_string(),
            balance: Balance {
                value: value.to_string(),
                symbol: symbol.to_string(),
            },
            queried: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl WalletClient for FakeWallet {
    fn address(&self) -> String {
        self.address.clone()
    }

    fn chain(&self) -> ChainInfo {
        ChainInfo {
            kind: "solana".to_string(),
            cluster: "devnet".to_string(),
        }
    }

    async fn balance_of(&self, address: &str) -> Result<Balance> {
        self.queried.lock().unwrap().push(address.to_string());
        Ok(self.balance.clone())
    }
}

/// Invoker that records requests and replays queued outcomes in order.
#[derive(Default)]
pub struct RecordingInvoker {
    pub requests: Mutex<Vec<IntegrationRequest>>,
    responses: Mutex<VecDeque<Result<IntegrationResult>>>,
}

impl RecordingInvoker {
    pub fn replying(responses: Vec<Result<IntegrationResult>>) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(responses.into()),
        })
    }

    pub fn requests(&self) -> Vec<IntegrationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl IntegrationInvoker for RecordingInvoker {
    async fn invoke(&self, request: IntegrationRequest) -> Result<IntegrationResult> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CapabilityError::Runtime("no queued response".to_string())))
    }
}

pub fn in_workspace(args: Value, workspace_id: u64) -> Invocation {
    Invocation::new(args).with_action(Action {
        kind: "do-task".to_string(),
        workspace: Workspace { id: workspace_id },
    })
}
