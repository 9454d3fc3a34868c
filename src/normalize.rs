//! Reduces integration results and failures to the single string a capability returns.
//!
//! Three failure shapes are handled:
//!
//! - an error envelope carried in `output.message`, usually JSON encoded twice;
//! - an envelope with an explicit `status` (403 gets its own explanation);
//! - a failure of the integration call itself, matched on its message text.
//!
//! Nothing here returns an error. Every path ends in a rendered string.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{CapabilityError, Result};
use crate::interfaces::integrations::IntegrationResult;

const FORBIDDEN: u16 = 403;
const FIRST_FAILURE_STATUS: u16 = 400;
const FORBIDDEN_REASON: &str = "You are not permitted to perform this action";

/// Wording used when a call made on behalf of a capability fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureContext {
    /// Provider name as shown to the caller, e.g. `Twitter`.
    pub service: String,
    /// Verb phrase completing "Unable to ...", e.g. `send tweet`.
    pub action: String,
    pub hint: Option<String>,
    pub consequence: Option<String>,
    /// Field of `output.data` returned on success.
    pub success_field: String,
    /// Whether a failure message mentioning `403` counts as forbidden. Only
    /// integration failures carry status text in their message.
    pub status_in_message: bool,
}

impl FailureContext {
    pub fn new(service: &str, action: &str) -> Self {
        Self {
            service: service.to_string(),
            action: action.to_string(),
            hint: Some(format!(
                "Please check your {service} integration permissions."
            )),
            consequence: None,
            success_field: "text".to_string(),
            status_in_message: true,
        }
    }

    /// Context for a tool adapted into a capability.
    pub fn for_tool(tool_name: &str) -> Self {
        Self {
            service: tool_name.to_string(),
            action: format!("execute {tool_name}"),
            hint: None,
            consequence: None,
            success_field: "text".to_string(),
            status_in_message: false,
        }
    }

    pub fn with_hint(mut self, hint: &str) -> Self {
        self.hint = Some(hint.to_string());
        self
    }

    pub fn with_consequence(mut self, consequence: &str) -> Self {
        self.consequence = Some(consequence.to_string());
        self
    }

    pub fn with_success_field(mut self, field: &str) -> Self {
        self.success_field = field.to_string();
        self
    }

    fn forbidden(&self, reason: &str) -> String {
        let service = &self.service;
        let mut out = format!(
            "{service} API Error (403 Forbidden): {reason}. This is likely due to {service}'s API restrictions."
        );
        if let Some(consequence) = &self.consequence {
            out.push(' ');
            out.push_str(consequence);
        }
        out
    }

    fn generic(&self, details: &str) -> String {
        let mut out = format!("Error: Unable to {}.", self.action);
        if let Some(hint) = &self.hint {
            out.push(' ');
            out.push_str(hint);
        }
        out.push_str(" Details: ");
        out.push_str(details);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedError {
    pub status: Option<u16>,
    pub message: String,
    pub detail: Option<String>,
}

impl NormalizedError {
    /// Reads a provider error object. Objects without any error field are not errors.
    fn from_object(object: &Map<String, Value>) -> Option<Self> {
        let text = |key: &str| {
            object
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let status = object.get("status").and_then(|value| match value {
            Value::Number(number) => number.as_u64().and_then(|n| u16::try_from(n).ok()),
            Value::String(raw) => raw.trim().parse::<u16>().ok(),
            _ => None,
        });
        let message = text("message").or_else(|| text("title"));
        let detail = text("detail");

        if status.is_none() && message.is_none() && detail.is_none() {
            return None;
        }
        if status.is_some_and(|status| status < FIRST_FAILURE_STATUS) {
            return None;
        }

        Some(Self {
            status,
            message: message
                .or_else(|| detail.clone())
                .unwrap_or_else(|| "Unknown error".to_string()),
            detail,
        })
    }

    /// A failure status or a problem detail, as opposed to a bare provider message.
    fn is_explicit(&self) -> bool {
        self.status.is_some() || self.detail.is_some()
    }

    pub fn render(&self, context: &FailureContext) -> String {
        match self.status {
            Some(FORBIDDEN) => {
                context.forbidden(self.detail.as_deref().unwrap_or(&self.message))
            }
            Some(status) => format!("Error {status}: {}", self.message),
            None => format!("Error: {}", self.message),
        }
    }
}

/// Outcome of inspecting `output.message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    Recognized(NormalizedError),
    Unrecognized { raw: String },
}

type ParseAttempt = fn(&Value) -> Option<NormalizedError>;

/// Tried in order; the first one yielding an error wins.
const PARSE_CHAIN: [ParseAttempt; 3] = [double_encoded, single_encoded, inline_object];

fn parse_str(raw: &str) -> Option<Value> {
    serde_json::from_str::<Value>(raw).ok()
}

/// The shape the integration proxy uses for errors; any error field is enough.
fn double_encoded(message: &Value) -> Option<NormalizedError> {
    let Value::String(outer) = message else {
        return None;
    };
    match parse_str(outer)? {
        Value::String(inner) => match parse_str(&inner)? {
            Value::Object(object) => NormalizedError::from_object(&object),
            _ => None,
        },
        _ => None,
    }
}

/// Only a failure status or a detail marks a single-encoded object as an error.
fn single_encoded(message: &Value) -> Option<NormalizedError> {
    let Value::String(raw) = message else {
        return None;
    };
    match parse_str(raw)? {
        Value::Object(object) => {
            NormalizedError::from_object(&object).filter(NormalizedError::is_explicit)
        }
        _ => None,
    }
}

fn inline_object(message: &Value) -> Option<NormalizedError> {
    NormalizedError::from_object(message.as_object()?).filter(NormalizedError::is_explicit)
}

pub fn decode_envelope(message: &Value) -> Envelope {
    let decoded = PARSE_CHAIN.iter().find_map(|attempt| attempt(message));

    match decoded {
        Some(error) => Envelope::Recognized(error),
        None => Envelope::Unrecognized {
            raw: match message {
                Value::String(raw) => raw.clone(),
                other => other.to_string(),
            },
        },
    }
}

/// Text form of a tool or provider value: strings pass through, scalars use their
/// display form, everything else is indented JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn render_success(result: &IntegrationResult, context: &FailureContext) -> String {
    let Some(data) = result.output.data.as_ref() else {
        return format!("No data returned by {}.", context.service);
    };
    match data.get(&context.success_field) {
        Some(field) => render_value(field),
        None => render_value(data),
    }
}

/// Renders a completed integration call.
pub fn normalize_result(result: &IntegrationResult, context: &FailureContext) -> String {
    match result.output.message.as_ref().map(decode_envelope) {
        Some(Envelope::Recognized(error)) => {
            warn!(
                service = %context.service,
                status = ?error.status,
                message = %error.message,
                detail = ?error.detail,
                "integration returned an error envelope"
            );
            error.render(context)
        }
        Some(Envelope::Unrecognized { raw }) => {
            debug!(service = %context.service, message = %raw, "message is not an error envelope");
            render_success(result, context)
        }
        None => render_success(result, context),
    }
}

/// Renders a call that failed before producing a result.
pub fn normalize_failure(error: &CapabilityError, context: &FailureContext) -> String {
    let message = error.message().trim();
    let forbidden = error.status() == Some(FORBIDDEN)
        || (context.status_in_message && message.contains("403"));
    warn!(
        service = %context.service,
        status = ?error.status(),
        forbidden,
        error = %message,
        "integration call failed"
    );

    if forbidden {
        return context.forbidden(FORBIDDEN_REASON);
    }
    let details = if message.is_empty() {
        "Unknown error"
    } else {
        message
    };
    context.generic(details)
}

pub fn normalize(outcome: Result<IntegrationResult>, context: &FailureContext) -> String {
    match outcome {
        Ok(result) => normalize_result(&result, context),
        Err(error) => normalize_failure(&error, context),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::interfaces::integrations::IntegrationOutput;

    fn tweet_context() -> FailureContext {
        FailureContext::new("Twitter", "send tweet").with_consequence("The tweet was not posted.")
    }

    fn with_message(message: Value, data: Option<Value>) -> IntegrationResult {
        IntegrationResult {
            output: IntegrationOutput {
                data,
                message: Some(message),
            },
        }
    }

    fn double_encode(value: Value) -> Value {
        let once = serde_json::to_string(&value).unwrap();
        Value::String(serde_json::to_string(&once).unwrap())
    }

    #[test]
    fn double_encoded_forbidden_mentions_status_and_detail() {
        let result = with_message(double_encode(json!({"status": 403, "detail": "nope"})), None);
        let rendered = normalize_result(&result, &tweet_context());
        assert!(rendered.contains("403"), "{rendered}");
        assert!(rendered.contains("nope"), "{rendered}");
        assert!(rendered.ends_with("The tweet was not posted."));
    }

    #[test]
    fn forbidden_falls_back_to_message_without_detail() {
        let result = with_message(
            double_encode(json!({"status": 403, "message": "read-only app"})),
            None,
        );
        let rendered = normalize_result(&result, &tweet_context());
        assert!(rendered.contains("read-only app"));
    }

    #[test]
    fn other_status_uses_generic_format() {
        let result = with_message(
            double_encode(json!({"status": 429, "title": "Too Many Requests"})),
            None,
        );
        assert_eq!(
            normalize_result(&result, &tweet_context()),
            "Error 429: Too Many Requests"
        );
    }

    #[test]
    fn non_json_message_falls_through_to_data() {
        let result = with_message(
            json!("tweet created"),
            Some(json!({"id": "1", "text": "hello [2024]"})),
        );
        assert_eq!(normalize_result(&result, &tweet_context()), "hello [2024]");
    }

    #[test]
    fn single_encoded_envelope_is_recognized() {
        let message = Value::String(json!({"status": 401, "message": "Unauthorized"}).to_string());
        assert_eq!(
            decode_envelope(&message),
            Envelope::Recognized(NormalizedError {
                status: Some(401),
                message: "Unauthorized".to_string(),
                detail: None,
            })
        );
    }

    #[test]
    fn object_without_error_fields_is_unrecognized() {
        let message = double_encode(json!({"id": 7}));
        assert!(matches!(decode_envelope(&message), Envelope::Unrecognized { .. }));

        let result = with_message(message, Some(json!({"text": "ok"})));
        assert_eq!(normalize_result(&result, &tweet_context()), "ok");
    }

    #[test]
    fn missing_success_field_renders_data() {
        let result = IntegrationResult::with_data(json!({"id": "1"}));
        let rendered = normalize_result(&result, &tweet_context());
        assert!(rendered.contains("\"id\": \"1\""));

        let empty = IntegrationResult::default();
        assert_eq!(
            normalize_result(&empty, &tweet_context()),
            "No data returned by Twitter."
        );
    }

    #[test]
    fn thrown_forbidden_error_gets_specific_explanation() {
        let err = CapabilityError::Http("Request failed with status code 403".to_string());
        let rendered = normalize_failure(&err, &tweet_context());
        assert_eq!(
            rendered,
            "Twitter API Error (403 Forbidden): You are not permitted to perform this action. \
             This is likely due to Twitter's API restrictions. The tweet was not posted."
        );

        let err = CapabilityError::Integration {
            status: 403,
            message: "forbidden".to_string(),
        };
        assert!(normalize_failure(&err, &tweet_context()).contains("403 Forbidden"));
    }

    #[test]
    fn thrown_generic_error_keeps_details() {
        let err = CapabilityError::Http("connection reset".to_string());
        assert_eq!(
            normalize_failure(&err, &tweet_context()),
            "Error: Unable to send tweet. Please check your Twitter integration permissions. \
             Details: connection reset"
        );

        let err = CapabilityError::Runtime(String::new());
        assert!(normalize_failure(&err, &FailureContext::for_tool("transfer"))
            .ends_with("Details: Unknown error"));
    }

    #[test]
    fn render_value_matches_text_rules() {
        assert_eq!(render_value(&json!("plain")), "plain");
        assert_eq!(render_value(&json!(5)), "5");
        assert_eq!(render_value(&json!(true)), "true");
        assert_eq!(render_value(&json!({"a": 1})), "{\n  \"a\": 1\n}");
        assert_eq!(render_value(&Value::Null), "null");
    }
}
