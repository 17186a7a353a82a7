use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::warn;

use crate::cache::flags::ForceRefresh;
use crate::cache::stage::{STAGE_ORDER, StageKind};

pub const DEFAULT_AREA_KEY: &str = "97067";
pub const DEFAULT_TTL_DAYS: u64 = 7;

/// Area keys are embedded in `<prefix>_<area>_<id>` file names, so they are
/// limited to ASCII letters, digits and `-`.
pub fn check_area_key(key: &str) -> Result<()> {
    if key.is_empty() {
        bail!("area key is empty");
    }
    if let Some(c) = key
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-'))
    {
        bail!("area key {:?} contains {:?}; use letters, digits or '-'", key, c);
    }
    Ok(())
}

/// Options read from `config.json`. Unknown keys are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub zipcode: String,
    #[serde(rename = "pipeline_cache_enabled")]
    pub cache_enabled: bool,
    #[serde(rename = "pipeline_cache_ttl_days")]
    pub ttl_days: u64,
    pub correlation_metrics: Vec<String>,
    pub max_fetch_attempts: u32,
    pub cascade_on_regeneration: bool,
    pub stages: Vec<StageKind>,
    pub stage_commands: BTreeMap<StageKind, Vec<String>>,

    pub force_refresh_search: bool,
    #[serde(alias = "force_refresh_scrape_airdna")]
    pub force_refresh_airdna: bool,
    pub force_refresh_reviews: bool,
    #[serde(alias = "force_refresh_scrape_details")]
    pub force_refresh_details: bool,
    pub force_refresh_aggregate_reviews: bool,
    pub force_refresh_aggregate_summaries: bool,
    pub force_refresh_build_details: bool,
    pub force_refresh_extract_data: bool,
    pub force_refresh_analyze_correlations: bool,
    pub force_refresh_analyze_descriptions: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            zipcode: DEFAULT_AREA_KEY.to_string(),
            cache_enabled: true,
            ttl_days: DEFAULT_TTL_DAYS,
            correlation_metrics: vec!["adr".to_string(), "occupancy".to_string()],
            max_fetch_attempts: 3,
            cascade_on_regeneration: false,
            stages: STAGE_ORDER.to_vec(),
            stage_commands: BTreeMap::new(),
            force_refresh_search: false,
            force_refresh_airdna: false,
            force_refresh_reviews: false,
            force_refresh_details: false,
            force_refresh_aggregate_reviews: false,
            force_refresh_aggregate_summaries: false,
            force_refresh_build_details: false,
            force_refresh_extract_data: false,
            force_refresh_analyze_correlations: false,
            force_refresh_analyze_descriptions: false,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Like [`load`](Self::load), but never fails: errors fall back to defaults.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %format!("{:#}", err),
                    "failed to load pipeline cache config, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Force-refresh flags exactly as configured, before any cascade.
    pub fn raw_force_refresh(&self) -> ForceRefresh {
        let configured = [
            (StageKind::Search, self.force_refresh_search),
            (StageKind::Airdna, self.force_refresh_airdna),
            (StageKind::Reviews, self.force_refresh_reviews),
            (StageKind::Details, self.force_refresh_details),
            (StageKind::AggregateReviews, self.force_refresh_aggregate_reviews),
            (StageKind::AggregateSummaries, self.force_refresh_aggregate_summaries),
            (StageKind::BuildDetails, self.force_refresh_build_details),
            (StageKind::ExtractData, self.force_refresh_extract_data),
            (StageKind::AnalyzeCorrelations, self.force_refresh_analyze_correlations),
            (StageKind::AnalyzeDescriptions, self.force_refresh_analyze_descriptions),
        ];
        ForceRefresh::from_stages(
            configured
                .into_iter()
                .filter(|(_, on)| *on)
                .map(|(stage, _)| stage),
        )
    }
}
