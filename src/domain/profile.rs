use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Static input data: who the client is and which market segments to work.
/// Loaded once at startup, immutable for the lifetime of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientProfile {
    pub client_name: String,
    pub website: String,
    pub core_strengths: Vec<String>,
    pub target_segments: Vec<SegmentProfile>,
}

/// One named target-market definition driving a pass of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentProfile {
    pub name: String,
    pub search_keywords: Vec<String>,
    pub geographic_focus: String,
    pub pain_point_hints: Vec<String>,
    pub product_focus: String,
    #[serde(default = "default_enable_review")]
    pub enable_review: bool,
}

fn default_enable_review() -> bool {
    true
}

impl ClientProfile {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read client profile at {}", path.display()))?;
        let profile: ClientProfile = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse client profile at {}", path.display()))?;
        Ok(profile)
    }

    pub fn strengths_summary(&self) -> String {
        self.core_strengths.join("; ")
    }

    pub fn segment(&self, name: &str) -> Option<&SegmentProfile> {
        self.target_segments.iter().find(|s| s.name == name)
    }
}

impl SegmentProfile {
    pub fn pain_hints_summary(&self) -> String {
        self.pain_point_hints.join("; ")
    }
}
