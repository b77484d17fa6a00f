//! Card search tool backed by the librarian service

use super::Tool;
use crate::search::CardSearch;
use crate::transcript::ToolOutcome;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const DEFAULT_LIMIT: usize = 5;

pub struct SearchCardsTool {
    client: Arc<dyn CardSearch>,
}

impl SearchCardsTool {
    pub fn new(client: Arc<dyn CardSearch>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct SearchCardsInput {
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

#[async_trait]
impl Tool for SearchCardsTool {
    fn name(&self) -> &str {
        "search_cards"
    }

    fn description(&self) -> String {
        "Search the card database by name or rules text. Returns matching \
         cards with their type line and oracle text. Use this to confirm \
         what a card actually does before ruling on it."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["query"],
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Card name or rules text to search for"
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Maximum number of cards to return (default 5)"
                }
            }
        })
    }

    async fn run(&self, arguments: Value) -> ToolOutcome {
        let input: SearchCardsInput = match serde_json::from_value(arguments) {
            Ok(input) => input,
            Err(e) => return ToolOutcome::error(format!("Invalid arguments: {e}")),
        };

        let limit = input.limit.max(1);
        match self.client.search(&input.query, limit).await {
            Ok(hits) => match serde_json::to_value(&hits) {
                Ok(value) => ToolOutcome::ok(value),
                Err(e) => ToolOutcome::error(format!("Failed to encode results: {e}")),
            },
            Err(e) => ToolOutcome::error(e.to_string()),
        }
    }
}
