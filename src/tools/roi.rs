//! Return-on-investment calculation tool.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;

/// Compute ROI from an initial investment and total returns.
pub struct CalculateRoi;

#[async_trait]
impl Tool for CalculateRoi {
    fn name(&self) -> &str {
        "calculate_roi"
    }

    fn description(&self) -> &str {
        "Calculates the Return on Investment (ROI) given the initial investment and the total returns. Returns the ROI as a percentage."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "investment": {
                    "type": "number",
                    "description": "The initial amount of money invested"
                },
                "returns": {
                    "type": "number",
                    "description": "The total amount of money returned from the investment"
                }
            },
            "required": ["investment", "returns"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let investment = args["investment"]
            .as_f64()
            .ok_or_else(|| anyhow::anyhow!("Missing 'investment' argument"))?;
        let returns = args["returns"]
            .as_f64()
            .ok_or_else(|| anyhow::anyhow!("Missing 'returns' argument"))?;

        if investment == 0.0 {
            return Ok(
                "Investment cannot be zero. Please provide a valid investment amount.".to_string(),
            );
        }

        let roi = ((returns - investment) / investment) * 100.0;
        Ok(format!("The ROI is: {:.2}%", roi))
    }
}
