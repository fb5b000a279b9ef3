//! Budget allocation tool.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;

/// Fixed share of the budget per platform under the ROI-focused strategy.
/// Platforms outside this table are omitted from the allocation.
const ROI_WEIGHTS: &[(&str, f64)] = &[
    ("YouTube", 0.5),
    ("Facebook", 0.3),
    ("Instagram", 0.2),
];

/// Split a total budget across advertising platforms using a named strategy.
pub struct AllocateBudget;

#[async_trait]
impl Tool for AllocateBudget {
    fn name(&self) -> &str {
        "allocate_budget"
    }

    fn description(&self) -> &str {
        "Distributes a total budget across the given advertising platforms using a named strategy, e.g. 'equal distribution' or 'focus on ROI'. Returns the amount allocated to each platform."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "total_budget": {
                    "type": "number",
                    "description": "The total budget to be distributed"
                },
                "platforms": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Advertising platforms, e.g. 'Facebook', 'Instagram', 'YouTube'"
                },
                "strategy": {
                    "type": "string",
                    "description": "The distribution strategy, e.g. 'focus on ROI' or 'equal distribution'"
                }
            },
            "required": ["total_budget", "platforms", "strategy"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let total_budget = args["total_budget"]
            .as_f64()
            .ok_or_else(|| anyhow::anyhow!("Missing 'total_budget' argument"))?;
        let platforms: Vec<String> = args["platforms"]
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("Missing 'platforms' argument"))?
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        let strategy = args["strategy"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'strategy' argument"))?;

        let lowered = strategy.to_lowercase();
        let mut allocation = serde_json::Map::new();

        if lowered.contains("equal") || lowered.contains("distribution") {
            if platforms.is_empty() {
                return Ok(json!({ "error": "No platforms given to distribute across." }).to_string());
            }
            let share = total_budget / platforms.len() as f64;
            for platform in &platforms {
                allocation.insert(platform.clone(), Value::String(format!("${:.2}", share)));
            }
        } else if lowered.contains("roi") {
            for (platform, weight) in ROI_WEIGHTS {
                if platforms.iter().any(|p| p == platform) {
                    allocation.insert(
                        (*platform).to_string(),
                        Value::String(format!("${:.2}", total_budget * weight)),
                    );
                }
            }
        } else {
            return Ok(json!({ "error": "Unknown strategy provided." }).to_string());
        }

        Ok(Value::Object(allocation).to_string())
    }
}
