use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::interfaces::capabilities::{Capability, Invocation};
use crate::interfaces::integrations::{IntegrationInvoker, IntegrationRequest, IntegrationResult};
use crate::normalize::{decode_envelope, normalize, Envelope, FailureContext};

pub const TWITTER_INTEGRATION: &str = "twitter-v2";
const USERS_ME: &str = "/2/users/me";
const TWEETS: &str = "/2/tweets";

const ACCOUNT_ERROR: &str =
    "Error: Unable to access Twitter account. Please check your Twitter integration permissions.";
const PERMISSIONS_OK: &str =
    "Twitter integration is properly configured with necessary permissions.";
const PERMISSIONS_MISSING: &str = "Twitter integration is missing required permissions. Please check your OpenServ Twitter integration settings.";

fn missing_workspace(action: &str) -> String {
    format!("Error: Unable to {action}. This capability must be invoked from a workspace task.")
}

fn empty_schema() -> Value {
    json!({"type": "object", "properties": {}, "additionalProperties": false})
}

pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn marketing_capabilities(invoker: Arc<dyn IntegrationInvoker>) -> Vec<Arc<dyn Capability>> {
    vec![
        Arc::new(GetTwitterAccount::new(invoker.clone())),
        Arc::new(CheckTwitterPermissions::new(invoker.clone())),
        Arc::new(SendMarketingTweet::new(invoker)),
        Arc::new(CreateSummaryDocument),
    ]
}

pub struct GetTwitterAccount {
    invoker: Arc<dyn IntegrationInvoker>,
}

impl GetTwitterAccount {
    pub fn new(invoker: Arc<dyn IntegrationInvoker>) -> Self {
        Self { invoker }
    }
}

#[async_trait]
impl Capability for GetTwitterAccount {
    fn name(&self) -> &str {
        "getTwitterAccount"
    }

    fn description(&self) -> &str {
        "Gets the Twitter account for the current user"
    }

    fn schema(&self) -> Value {
        empty_schema()
    }

    async fn run(&self, invocation: Invocation) -> String {
        info!(capability = self.name(), "capability called");
        let Some(workspace_id) = invocation.workspace_id() else {
            return missing_workspace("access Twitter account");
        };

        let request = IntegrationRequest::get(workspace_id, TWITTER_INTEGRATION, USERS_ME);
        match self.invoker.invoke(request).await {
            Ok(result) => match result.data_field("username").and_then(|v| v.as_str()) {
                Some(username) => username.to_string(),
                None => {
                    error!(capability = self.name(), "response carried no username");
                    ACCOUNT_ERROR.to_string()
                }
            },
            Err(err) => {
                error!(capability = self.name(), error = %err, "failed to get Twitter account");
                ACCOUNT_ERROR.to_string()
            }
        }
    }
}

/// The account name from a `users/me` reply. An error envelope or a reply without
/// a username yields the text to report instead.
fn account_username(
    result: &IntegrationResult,
    context: &FailureContext,
) -> std::result::Result<String, String> {
    if let Some(Envelope::Recognized(error)) = result.output.message.as_ref().map(decode_envelope)
    {
        return Err(error.render(context));
    }
    result
        .data_field("username")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| "No username in Twitter account response".to_string())
}

pub struct CheckTwitterPermissions {
    invoker: Arc<dyn IntegrationInvoker>,
    failure: FailureContext,
}

impl CheckTwitterPermissions {
    pub fn new(invoker: Arc<dyn IntegrationInvoker>) -> Self {
        Self {
            invoker,
            failure: FailureContext::new("Twitter", "check Twitter permissions"),
        }
    }
}

#[async_trait]
impl Capability for CheckTwitterPermissions {
    fn name(&self) -> &str {
        "checkTwitterPermissions"
    }

    fn description(&self) -> &str {
        "Checks if the Twitter integration has the necessary permissions"
    }

    fn schema(&self) -> Value {
        empty_schema()
    }

    async fn run(&self, invocation: Invocation) -> String {
        info!(capability = self.name(), "capability called");
        let Some(workspace_id) = invocation.workspace_id() else {
            return json!({
                "status": "error",
                "message": PERMISSIONS_MISSING,
                "error": "no workspace in invocation",
            })
            .to_string();
        };

        // The account lookup doubles as the permission probe.
        let request = IntegrationRequest::get(workspace_id, TWITTER_INTEGRATION, USERS_ME);
        let outcome = match self.invoker.invoke(request).await {
            Ok(result) => account_username(&result, &self.failure),
            Err(err) => Err(match err.message().trim() {
                "" => "Unknown error".to_string(),
                message => message.to_string(),
            }),
        };

        match outcome {
            Ok(username) => json!({
                "status": "success",
                "message": PERMISSIONS_OK,
                "username": username,
            })
            .to_string(),
            Err(detail) => {
                error!(capability = self.name(), error = %detail, "Twitter permission check failed");
                json!({
                    "status": "error",
                    "message": PERMISSIONS_MISSING,
                    "error": detail,
                })
                .to_string()
            }
        }
    }
}

pub struct SendMarketingTweet {
    invoker: Arc<dyn IntegrationInvoker>,
    timestamp: fn() -> String,
    failure: FailureContext,
}

impl SendMarketingTweet {
    pub fn new(invoker: Arc<dyn IntegrationInvoker>) -> Self {
        Self {
            invoker,
            timestamp: iso_timestamp,
            failure: FailureContext::new("Twitter", "send tweet")
                .with_consequence("The tweet was not posted.")
                .with_success_field("text"),
        }
    }

    /// Replaces the clock used for the uniqueness suffix.
    pub fn with_timestamp(mut self, timestamp: fn() -> String) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[async_trait]
impl Capability for SendMarketingTweet {
    fn name(&self) -> &str {
        "sendMarketingTweet"
    }

    fn description(&self) -> &str {
        "Sends a marketing tweet to Twitter"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "tweetText": { "type": "string" }
            },
            "required": ["tweetText"]
        })
    }

    async fn run(&self, invocation: Invocation) -> String {
        let action_type = invocation.action.as_ref().map(|action| action.kind.as_str());
        info!(capability = self.name(), action_type = ?action_type, "capability called");
        let Some(workspace_id) = invocation.workspace_id() else {
            return missing_workspace("send tweet");
        };

        // Twitter rejects duplicate statuses, so every post carries its send time.
        let text = invocation.arg_str("tweetText").unwrap_or_default();
        let unique_text = format!("{text} [{}]", (self.timestamp)());

        let request = IntegrationRequest::post(
            workspace_id,
            TWITTER_INTEGRATION,
            TWEETS,
            json!({ "text": unique_text }),
        );
        normalize(self.invoker.invoke(request).await, &self.failure)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CreateSummaryDocument;

#[async_trait]
impl Capability for CreateSummaryDocument {
    fn name(&self) -> &str {
        "createSummaryDocument"
    }

    fn description(&self) -> &str {
        "Creates a summary document based on the provided information"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "content": { "type": "string" },
                "format": { "type": "string", "enum": ["markdown", "text"], "default": "markdown" }
            },
            "required": ["content"]
        })
    }

    async fn run(&self, invocation: Invocation) -> String {
        let title = invocation
            .arg_str("title")
            .filter(|title| !title.is_empty())
            .unwrap_or("Summary Document");
        let content = invocation.arg_str("content").unwrap_or_default();

        match invocation.arg_str("format").unwrap_or("markdown") {
            "markdown" => format!("# {title}\n\n{content}"),
            _ => format!("{title}\n\n{content}"),
        }
    }
}
