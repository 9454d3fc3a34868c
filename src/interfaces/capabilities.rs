use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Workspace {
    pub id: u64,
}

/// Task context attached by the host when a capability runs inside a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: String,
    pub workspace: Workspace,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Invocation {
    #[serde(default)]
    pub args: Value,
    #[serde(default)]
    pub action: Option<Action>,
}

impl Invocation {
    pub fn new(args: Value) -> Self {
        Self { args, action: None }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn workspace_id(&self) -> Option<u64> {
        self.action.as_ref().map(|action| action.workspace.id)
    }

    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(|v| v.as_str())
    }
}

/// A named operation exposed to the hosting runtime. `run` always resolves to text;
/// failures are rendered into the returned string.
#[async_trait]
pub trait Capability: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn schema(&self) -> Value;
    async fn run(&self, invocation: Invocation) -> String;
}
