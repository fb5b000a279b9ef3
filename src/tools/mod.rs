//! Tool definitions and the registry that dispatches them.
//!
//! Tools are a closed set of named, schema-typed capabilities. The registry
//! validates arguments against each tool's schema before execution; handler
//! failures are folded into the result text so the model can see and react
//! to them.

mod budget;
mod competitor;
mod roi;

pub use budget::AllocateBudget;
pub use competitor::CompetitorData;
pub use roi::CalculateRoi;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::llm::ToolSpec;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool already registered: {0}")]
    Duplicate(String),

    #[error("unknown tool: {0}")]
    Unknown(String),

    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },
}

/// A capability the model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must be unique within a registry).
    fn name(&self) -> &str;

    /// Human-readable description for the model.
    fn description(&self) -> &str;

    /// JSON schema for the tool's arguments.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, args: Value) -> anyhow::Result<String>;
}

/// Registry of available tools. Registration order is the order tools are
/// advertised to the completion service.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry preloaded with the built-in marketing tools.
    pub fn with_builtins() -> Result<Self, ToolError> {
        let mut registry = Self::new();
        registry.register(CalculateRoi)?;
        registry.register(AllocateBudget)?;
        registry.register(CompetitorData)?;
        Ok(registry)
    }

    /// Register a tool. Fails if a tool with the same name already exists.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<(), ToolError> {
        if self.tools.iter().any(|t| t.name() == tool.name()) {
            return Err(ToolError::Duplicate(tool.name().to_string()));
        }
        tracing::debug!("Registered tool: {}", tool.name());
        self.tools.push(Arc::new(tool));
        Ok(())
    }

    /// Look up a tool by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .cloned()
            .ok_or_else(|| ToolError::Unknown(name.to_string()))
    }

    /// Specs for every registered tool, in registration order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|t| ToolSpec {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }

    /// Validate arguments against the tool's schema and execute it.
    ///
    /// Handler-level failures are reported as result text rather than
    /// errors; the error path is reserved for registry-level problems
    /// (unknown tool, schema mismatch).
    pub async fn invoke(&self, name: &str, args: &Value) -> Result<String, ToolError> {
        let tool = self.resolve(name)?;
        validate_arguments(tool.name(), &tool.parameters_schema(), args)?;

        tracing::info!("Invoking tool: {} with args: {}", name, args);

        match tool.execute(args.clone()).await {
            Ok(result) => Ok(result),
            Err(e) => Ok(format!("Error: {}", e)),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Check argument presence and primitive types against a JSON schema.
fn validate_arguments(tool: &str, schema: &Value, args: &Value) -> Result<(), ToolError> {
    let object = args.as_object().ok_or_else(|| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason: "arguments must be a JSON object".to_string(),
    })?;

    if let Some(required) = schema["required"].as_array() {
        for key in required.iter().filter_map(Value::as_str) {
            if !object.contains_key(key) {
                return Err(ToolError::InvalidArguments {
                    tool: tool.to_string(),
                    reason: format!("missing required argument '{}'", key),
                });
            }
        }
    }

    if let Some(properties) = schema["properties"].as_object() {
        for (key, value) in object {
            let Some(declared) = properties.get(key) else {
                // Extra arguments are tolerated; the handler ignores them.
                continue;
            };
            let Some(expected) = declared["type"].as_str() else {
                continue;
            };
            let matches = match expected {
                "string" => value.is_string(),
                "number" => value.is_number(),
                "integer" => value.is_i64() || value.is_u64(),
                "boolean" => value.is_boolean(),
                "array" => value.is_array(),
                "object" => value.is_object(),
                _ => true,
            };
            if !matches {
                return Err(ToolError::InvalidArguments {
                    tool: tool.to_string(),
                    reason: format!("argument '{}' should be of type {}", key, expected),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the input back"
        }

        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string", "description": "Text to echo" }
                },
                "required": ["text"]
            })
        }

        async fn execute(&self, args: Value) -> anyhow::Result<String> {
            let text = args["text"]
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("Missing 'text' argument"))?;
            Ok(text.to_string())
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "failing"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        fn parameters_schema(&self) -> Value {
            json!({ "type": "object", "properties": {} })
        }

        async fn execute(&self, _args: Value) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("backend unavailable"))
        }
    }

    #[test]
    fn rejects_duplicate_registration() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).expect("first registration");

        let err = registry.register(EchoTool).expect_err("duplicate");
        assert!(matches!(err, ToolError::Duplicate(name) if name == "echo"));
    }

    #[test]
    fn resolve_unknown_tool_fails() {
        let registry = ToolRegistry::new();
        let err = registry.resolve("nope").err().expect("unknown");
        assert!(matches!(err, ToolError::Unknown(name) if name == "nope"));
    }

    #[test]
    fn specs_follow_registration_order() {
        let registry = ToolRegistry::with_builtins().expect("builtins");
        let names: Vec<String> = registry.specs().into_iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec!["calculate_roi", "allocate_budget", "get_competitor_data"]
        );
    }

    #[tokio::test]
    async fn invoke_validates_missing_required_argument() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).expect("register");

        let err = registry
            .invoke("echo", &json!({}))
            .await
            .expect_err("missing argument");
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn invoke_validates_argument_types() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).expect("register");

        let err = registry
            .invoke("echo", &json!({ "text": 42 }))
            .await
            .expect_err("wrong type");
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn invoke_rejects_non_object_arguments() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).expect("register");

        let err = registry
            .invoke("echo", &json!("just a string"))
            .await
            .expect_err("non-object");
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn invoke_runs_the_handler() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).expect("register");

        let result = registry
            .invoke("echo", &json!({ "text": "hi" }))
            .await
            .expect("invoke");
        assert_eq!(result, "hi");
    }

    #[tokio::test]
    async fn handler_failures_become_result_text() {
        let mut registry = ToolRegistry::new();
        registry.register(FailingTool).expect("register");

        let result = registry
            .invoke("failing", &json!({}))
            .await
            .expect("handler errors are data, not control flow");
        assert_eq!(result, "Error: backend unavailable");
    }
}
