//! Engine configuration: the two external collaborators are
//! addressed by endpoint/model name here; the collaborators themselves
//! are injected as trait objects, not constructed from this config.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub vector_store_endpoint: String,
    #[serde(default)]
    pub embedding_api_key: Option<String>,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vector_store_endpoint: String::new(),
            embedding_api_key: None,
            embedding_model: default_embedding_model(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_embedding_model_matches_spec() {
        assert_eq!(EngineConfig::default().embedding_model, "text-embedding-3-small");
    }

    #[test]
    fn deserializes_with_only_endpoint_present() {
        let json = r#"{"vectorStoreEndpoint":"https://store.example"}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.embedding_model, "text-embedding-3-small");
        assert_eq!(config.embedding_api_key, None);
    }
}
