//! Competitor campaign lookup tool.
//!
//! Serves canned campaign metrics in place of a real competitor-intel API.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;

/// Fetch campaign data for a named competitor.
pub struct CompetitorData;

#[async_trait]
impl Tool for CompetitorData {
    fn name(&self) -> &str {
        "get_competitor_data"
    }

    fn description(&self) -> &str {
        "Fetches campaign data for a given competitor. Returns campaign metrics such as budget, platforms, and estimated ROI."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "competitor_name": {
                    "type": "string",
                    "description": "The name of the competitor"
                }
            },
            "required": ["competitor_name"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let competitor_name = args["competitor_name"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'competitor_name' argument"))?;

        let normalized = competitor_name.trim().to_lowercase().replace(' ', "_");
        let record = match normalized.as_str() {
            "competitor_a" => json!({
                "campaign_name": "Summer_Sales_2025",
                "budget": 250000,
                "platforms": ["Facebook", "Instagram", "Google Ads"],
                "estimated_roi": "150%",
                "top_performer": "Facebook"
            }),
            "competitor_b" => json!({
                "campaign_name": "Brand_Awareness_2025",
                "budget": 100000,
                "platforms": ["YouTube", "TikTok"],
                "estimated_roi": "80%",
                "top_performer": "YouTube"
            }),
            _ => json!({
                "error": format!("No data found for competitor: {}", competitor_name)
            }),
        };

        Ok(record.to_string())
    }
}
