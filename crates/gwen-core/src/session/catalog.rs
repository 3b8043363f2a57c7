//! Selectable model list.

use serde::{Deserialize, Serialize};

/// Model id pre-selected when present, and the single fallback entry.
pub const PREFERRED_MODEL: &str = "qwen2.5-coder:32b";

/// The models offered for chat, plus the current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCatalog {
    pub models: Vec<String>,
    pub selected: Option<String>,
}

impl ModelCatalog {
    /// Builds a catalog, selecting `preferred` when listed and the first
    /// model otherwise.
    pub fn from_models(models: Vec<String>, preferred: &str) -> Self {
        let selected = models
            .iter()
            .find(|m| m.as_str() == preferred)
            .or_else(|| models.first())
            .cloned();
        Self { models, selected }
    }

    /// The single-entry catalog used when loading fails.
    pub fn fallback(preferred: &str) -> Self {
        Self {
            models: vec![preferred.to_string()],
            selected: Some(preferred.to_string()),
        }
    }

    /// Selects a listed model. Returns `false` for unknown ids.
    pub fn select(&mut self, model: &str) -> bool {
        if self.models.iter().any(|m| m == model) {
            self.selected = Some(model.to_string());
            true
        } else {
            false
        }
    }
}
