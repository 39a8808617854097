//! Priority normalization shared by startups and tasks.
//!
//! Workflow definitions are authored by Portuguese- and English-speaking
//! users alike, so priority values arrive as `"alta"`, `"Média"`, `"low"`
//! and so on. Everything is folded into the canonical `low | medium | high`
//! set; unrecognised input maps to `medium`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical priority levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Return the wire-format string for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Normalize free-form text into a priority. Total: never fails.
    pub fn normalize(input: &str) -> Self {
        let folded = fold_accents(&input.trim().to_lowercase());
        match folded.as_str() {
            "low" | "baixa" | "baixo" => Self::Low,
            "high" | "alta" | "alto" => Self::High,
            _ => Self::Medium,
        }
    }

    /// Normalize a JSON value. Non-string values map to `medium`.
    pub fn from_value(value: &Value) -> Self {
        value.as_str().map(Self::normalize).unwrap_or_default()
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn fold_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}
