//! Gemini completion client.
//!
//! Talks to the `generateContent` REST endpoint. Tool calls come back as
//! `functionCall` parts with no identifiers, so call ids are synthesized
//! here; tool results go back out as `functionResponse` parts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{CompletionClient, CompletionError, CompletionResult, Message, ToolCall, ToolSpec};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    system_instruction: String,
}

impl GeminiClient {
    pub fn new(
        api_key: &str,
        model: &str,
        system_instruction: &str,
    ) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            system_instruction: system_instruction.to_string(),
        })
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(
        &self,
        history: &[Message],
        tools: &[ToolSpec],
    ) -> Result<CompletionResult, CompletionError> {
        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::text(&self.system_instruction)],
            },
            contents: to_contents(history),
            tools: to_tool_decls(tools),
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        parse_response(parsed)
    }

    // Gemini rejects a request whose trailing content is a function
    // response, so the loop must follow tool results with a user turn.
    fn requires_user_turn_after_tool_result(&self) -> bool {
        true
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolDecls>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            function_call: None,
            function_response: None,
        }
    }

    fn function_call(name: &str, args: Value) -> Self {
        Self {
            text: None,
            function_call: Some(FunctionCall {
                name: name.to_string(),
                args,
            }),
            function_response: None,
        }
    }

    fn function_response(name: &str, result: &str) -> Self {
        Self {
            text: None,
            function_call: None,
            function_response: Some(FunctionResponse {
                name: name.to_string(),
                response: json!({ "result": result }),
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolDecls {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

fn to_tool_decls(tools: &[ToolSpec]) -> Vec<ToolDecls> {
    if tools.is_empty() {
        return Vec::new();
    }
    vec![ToolDecls {
        function_declarations: tools
            .iter()
            .map(|t| FunctionDeclaration {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.parameters.clone(),
            })
            .collect(),
    }]
}

fn to_contents(history: &[Message]) -> Vec<Content> {
    let mut contents: Vec<Content> = Vec::new();

    for message in history {
        match message {
            Message::User { text, .. } => contents.push(Content {
                role: Some("user".to_string()),
                parts: vec![Part::text(text)],
            }),
            Message::Assistant { text, tool_calls } => {
                let mut parts = Vec::new();
                if let Some(text) = text {
                    parts.push(Part::text(text));
                }
                for call in tool_calls {
                    parts.push(Part::function_call(&call.name, call.arguments.clone()));
                }
                contents.push(Content {
                    role: Some("model".to_string()),
                    parts,
                });
            }
            Message::ToolResult {
                tool_name, text, ..
            } => {
                let part = Part::function_response(tool_name, text);
                // All responses to one tool request must share a single turn.
                match contents.last_mut() {
                    Some(last)
                        if last.role.as_deref() == Some("user")
                            && last.parts.iter().all(|p| p.function_response.is_some()) =>
                    {
                        last.parts.push(part)
                    }
                    _ => contents.push(Content {
                        role: Some("user".to_string()),
                        parts: vec![part],
                    }),
                }
            }
        }
    }

    contents
}

fn parse_response(response: GenerateResponse) -> Result<CompletionResult, CompletionError> {
    let content = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .ok_or_else(|| CompletionError::MalformedResponse("no candidates".to_string()))?;

    let mut calls = Vec::new();
    let mut text = String::new();
    for part in content.parts {
        if let Some(call) = part.function_call {
            calls.push(ToolCall {
                id: Uuid::new_v4().to_string(),
                name: call.name,
                arguments: call.args,
            });
        } else if let Some(t) = part.text {
            text.push_str(&t);
        }
    }

    if !calls.is_empty() {
        Ok(CompletionResult::ToolRequest(calls))
    } else if !text.is_empty() {
        Ok(CompletionResult::FinalReply(text))
    } else {
        Err(CompletionError::MalformedResponse(
            "candidate had neither text nor function calls".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_history_to_contents() {
        let history = vec![
            Message::user("compare our ROI to competitor A"),
            Message::Assistant {
                text: None,
                tool_calls: vec![ToolCall {
                    id: "c1".to_string(),
                    name: "get_competitor_data".to_string(),
                    arguments: json!({ "competitor_name": "competitor A" }),
                }],
            },
            Message::ToolResult {
                call_id: "c1".to_string(),
                tool_name: "get_competitor_data".to_string(),
                text: "{}".to_string(),
            },
        ];

        let contents = to_contents(&history);
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0].role.as_deref(), Some("user"));
        assert!(contents[0].parts[0].text.is_some());
        assert_eq!(contents[1].role.as_deref(), Some("model"));
        assert!(contents[1].parts[0].function_call.is_some());
        assert_eq!(contents[2].role.as_deref(), Some("user"));
        assert!(contents[2].parts[0].function_response.is_some());
    }

    #[test]
    fn merges_consecutive_tool_results_into_one_turn() {
        let history = vec![
            Message::user("allocate and compute"),
            Message::Assistant {
                text: None,
                tool_calls: vec![
                    ToolCall {
                        id: "c1".to_string(),
                        name: "calculate_roi".to_string(),
                        arguments: json!({ "investment": 5000.0, "returns": 7000.0 }),
                    },
                    ToolCall {
                        id: "c2".to_string(),
                        name: "allocate_budget".to_string(),
                        arguments: json!({}),
                    },
                ],
            },
            Message::ToolResult {
                call_id: "c1".to_string(),
                tool_name: "calculate_roi".to_string(),
                text: "The ROI is: 40.00%".to_string(),
            },
            Message::ToolResult {
                call_id: "c2".to_string(),
                tool_name: "allocate_budget".to_string(),
                text: "{}".to_string(),
            },
        ];

        let contents = to_contents(&history);
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[2].parts.len(), 2);
        assert!(contents[2]
            .parts
            .iter()
            .all(|p| p.function_response.is_some()));
    }

    #[test]
    fn parses_function_call_into_tool_request() {
        let response = GenerateResponse {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: Some("model".to_string()),
                    parts: vec![Part::function_call(
                        "calculate_roi",
                        json!({ "investment": 5000.0, "returns": 7000.0 }),
                    )],
                }),
            }],
        };

        match parse_response(response).expect("parse") {
            CompletionResult::ToolRequest(calls) => {
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].name, "calculate_roi");
                assert!(!calls[0].id.is_empty());
            }
            other => panic!("expected tool request, got {:?}", other),
        }
    }

    #[test]
    fn parses_text_parts_into_final_reply() {
        let response = GenerateResponse {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: Some("model".to_string()),
                    parts: vec![Part::text("Your ROI "), Part::text("is 40%.")],
                }),
            }],
        };

        match parse_response(response).expect("parse") {
            CompletionResult::FinalReply(text) => assert_eq!(text, "Your ROI is 40%."),
            other => panic!("expected final reply, got {:?}", other),
        }
    }

    #[test]
    fn empty_candidates_are_malformed() {
        let response = GenerateResponse { candidates: vec![] };
        let err = parse_response(response).expect_err("no candidates");
        assert!(matches!(err, CompletionError::MalformedResponse(_)));
    }
}
