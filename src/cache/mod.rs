pub mod flags;
pub mod layout;
pub mod stage;

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::PipelineConfig;

pub use flags::ForceRefresh;
pub use layout::{OutputLayout, OutputTarget};
pub use stage::{STAGE_ORDER, StageKind};

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// What a stage runner should do for one area key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageAction {
    Skip,
    Resume,
    ClearAndRun,
}

impl StageAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Resume => "resume",
            Self::ClearAndRun => "clear_and_run",
        }
    }
}

impl fmt::Display for StageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageStatus {
    pub stage: StageKind,
    pub action: StageAction,
    pub force_refresh: bool,
    pub expected: usize,
    pub fresh: usize,
    /// Expected outputs that are not fresh; `expected - fresh` entries.
    pub missing: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub area_key: String,
    pub enabled: bool,
    pub ttl_hours: u64,
    pub stages: Vec<StageStatus>,
}

/// Decides, per stage and area key, whether pipeline outputs can be reused.
///
/// Freshness comes from file mtimes only; there is no side ledger. The
/// only state held is the effective force-refresh flag set.
#[derive(Debug, Clone)]
pub struct StageCacheManager {
    layout: OutputLayout,
    enabled: bool,
    ttl: Duration,
    flags: ForceRefresh,
}

impl StageCacheManager {
    pub fn new(root: impl Into<PathBuf>, config: &PipelineConfig) -> Self {
        let layout = OutputLayout::new(root, config.correlation_metrics.clone());
        let raw = config.raw_force_refresh();
        let flags = ForceRefresh::resolve(raw);
        let cascaded: Vec<&str> = flags
            .enabled()
            .filter(|stage| !raw.get(*stage))
            .map(|stage| stage.as_str())
            .collect();
        if !cascaded.is_empty() {
            info!(
                stages = %cascaded.join(", "),
                "init cascade: force_refresh set for downstream stages"
            );
        }
        Self {
            layout,
            enabled: config.cache_enabled,
            ttl: Duration::from_secs(config.ttl_days.saturating_mul(SECS_PER_DAY)),
            flags,
        }
    }

    /// Builds from a config file, falling back to defaults if it cannot be loaded.
    pub fn from_config_file(root: impl Into<PathBuf>, config_path: &Path) -> Self {
        Self::new(root, &PipelineConfig::load_or_default(config_path))
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn cache_enabled(&self) -> bool {
        self.enabled
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn force_refresh_flags(&self) -> ForceRefresh {
        self.flags
    }

    pub fn expected_targets(&self, stage: StageKind, area_key: &str) -> Vec<OutputTarget> {
        self.layout.targets(stage, area_key)
    }

    pub fn expected_outputs(&self, stage: StageKind, area_key: &str) -> Vec<PathBuf> {
        self.expected_targets(stage, area_key)
            .into_iter()
            .map(|t| t.path)
            .collect()
    }

    pub fn expected_outputs_named(&self, stage: &str, area_key: &str) -> Vec<PathBuf> {
        match stage.parse::<StageKind>() {
            Ok(stage) => self.expected_outputs(stage, area_key),
            Err(_) => Vec::new(),
        }
    }

    pub fn is_file_fresh(&self, stage: StageKind, path: &Path) -> bool {
        if !self.enabled || self.flags.get(stage) {
            return false;
        }
        self.within_ttl(path)
    }

    pub fn is_stage_fresh(&self, stage: StageKind, area_key: &str) -> bool {
        let expected = self.expected_outputs(stage, area_key);
        !expected.is_empty() && expected.iter().all(|p| self.is_file_fresh(stage, p))
    }

    /// Expected outputs that are missing or older than the TTL.
    ///
    /// Only mtimes are consulted, so with caching disabled a resumed stage
    /// still leaves recent per-listing files alone.
    pub fn missing_targets(&self, stage: StageKind, area_key: &str) -> Vec<OutputTarget> {
        self.expected_targets(stage, area_key)
            .into_iter()
            .filter(|t| !self.within_ttl(&t.path))
            .collect()
    }

    pub fn get_missing_outputs(&self, stage: StageKind, area_key: &str) -> Vec<PathBuf> {
        self.missing_targets(stage, area_key)
            .into_iter()
            .map(|t| t.path)
            .collect()
    }

    pub fn should_run_stage(&self, stage: StageKind, area_key: &str) -> StageAction {
        if !self.enabled {
            return StageAction::Resume;
        }
        if self.flags.get(stage) {
            info!(stage = %stage, "force refresh enabled");
            return StageAction::ClearAndRun;
        }
        if self.is_stage_fresh(stage, area_key) {
            return StageAction::Skip;
        }
        StageAction::Resume
    }

    /// Deletes this area's expected outputs for `stage`. Returns how many were removed.
    pub fn clear_stage_for_zipcode(&self, stage: StageKind, area_key: &str) -> usize {
        let mut removed = 0;
        for path in self.expected_outputs(stage, area_key) {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(
                        stage = %stage,
                        path = %path.display(),
                        error = %err,
                        "failed to remove cached output"
                    );
                }
            }
        }
        if removed > 0 {
            info!(stage = %stage, area = area_key, removed, "cleared cached outputs");
        }
        removed
    }

    pub fn cascade_force_refresh(&mut self, stage: StageKind) {
        let downstream = stage.downstream();
        if downstream.is_empty() {
            return;
        }
        self.flags = self.flags.cascaded_from(stage);
        let names: Vec<&str> = downstream.iter().map(|s| s.as_str()).collect();
        info!(
            stage = %stage,
            downstream = %names.join(", "),
            "cascading force_refresh"
        );
    }

    pub fn cascade_force_refresh_named(&mut self, stage: &str) {
        match stage.parse::<StageKind>() {
            Ok(stage) => self.cascade_force_refresh(stage),
            Err(_) => warn!(stage, "unknown stage, cascade skipped"),
        }
    }

    pub fn stage_status(&self, stage: StageKind, area_key: &str) -> StageStatus {
        let expected = self.expected_outputs(stage, area_key);
        let total = expected.len();
        let missing: Vec<PathBuf> = expected
            .into_iter()
            .filter(|p| !self.is_file_fresh(stage, p))
            .collect();
        StageStatus {
            stage,
            action: self.should_run_stage(stage, area_key),
            force_refresh: self.flags.get(stage),
            expected: total,
            fresh: total - missing.len(),
            missing,
        }
    }

    pub fn cache_status(&self, area_key: &str) -> CacheStatus {
        let stages = if self.enabled {
            STAGE_ORDER
                .iter()
                .map(|stage| self.stage_status(*stage, area_key))
                .collect()
        } else {
            Vec::new()
        };
        CacheStatus {
            area_key: area_key.to_string(),
            enabled: self.enabled,
            ttl_hours: self.ttl.as_secs() / 3600,
            stages,
        }
    }

    fn within_ttl(&self, path: &Path) -> bool {
        let Ok(modified) = fs::metadata(path).and_then(|m| m.modified()) else {
            return false;
        };
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        age < self.ttl
    }
}
