//! Job payload assembly.
//!
//! Pure mapping from an `IndexRequest` to the body the indexer job consumes.
//! Validation happens in the orchestrator before anything reaches this module.

use crate::model::{Configurable, IndexRequest, RunInput, RunPayload, RunSettings};

/// Build the `input` / `config.configurable` payload for one submission.
/// Documents are passed through untouched (no trimming).
pub fn build_payload(req: &IndexRequest) -> RunPayload {
    RunPayload {
        input: RunInput {
            docs: req.documents.clone(),
        },
        config: RunSettings {
            configurable: Configurable {
                user_id: req.user_id.clone(),
                retriever_provider: req.retriever_provider.clone(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_matches_wire_shape() {
        let req = IndexRequest {
            documents: "  hello world\n".into(),
            user_id: "alice".into(),
            retriever_provider: "elastic-local".into(),
        };
        let value = serde_json::to_value(build_payload(&req)).unwrap();
        assert_eq!(
            value,
            json!({
                "input": { "docs": "  hello world\n" },
                "config": {
                    "configurable": {
                        "user_id": "alice",
                        "retriever_provider": "elastic-local"
                    }
                }
            })
        );
    }
}
