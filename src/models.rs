use serde::{Deserialize, Serialize};

fn default_min_width() -> u32 {
    400
}

fn default_min_height() -> u32 {
    300
}

fn default_max_results() -> usize {
    10
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    // Defaults to "" so a missing siteUrl takes the same bad-request
    // path as an empty one instead of a deserialization rejection.
    #[serde(default)]
    pub site_url: String,
    #[serde(default = "default_min_width")]
    pub min_width: u32,
    #[serde(default = "default_min_height")]
    pub min_height: u32,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

/// One discovered image reference. Built unscored by the extractor;
/// the pipeline fills in `relevance_score` and `is_likely_press` once.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ImageCandidate {
    pub source_url: String,
    pub alt_text: String,
    pub title_text: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub aspect_ratio: Option<String>,
    pub is_likely_press: bool,
    pub relevance_score: i32,
}

impl ImageCandidate {
    pub fn bare(source_url: String) -> Self {
        Self {
            source_url,
            alt_text: String::new(),
            title_text: String::new(),
            width: None,
            height: None,
            aspect_ratio: None,
            is_likely_press: false,
            relevance_score: 0,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResponse {
    pub success: bool,
    pub site_url: String,
    pub source: Option<String>,
    pub images: Vec<ImageCandidate>,
    pub total_found: usize,
    pub returned: usize,
    pub tried_pages: Vec<String>,
    pub failed_pages: Vec<String>,
    pub processing_time_ms: u64,
    pub rate_limit_remaining: u32,
}
