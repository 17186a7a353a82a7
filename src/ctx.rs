use std::path::PathBuf;

use serde::Serialize;

use crate::cache::{StageAction, StageCacheManager, StageKind};
use crate::config::PipelineConfig;

#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
    pub stage: StageKind,
    pub action: StageAction,
    pub cleared: usize,
    pub produced: usize,
    pub failed: usize,
}

/// State shared by every stage of one pipeline run for one area key.
#[derive(Debug)]
pub struct Ctx {
    pub area_key: String,
    pub root: PathBuf,
    pub config: PipelineConfig,
    pub cache: StageCacheManager,
    pub outcomes: Vec<StageOutcome>,
    pub warnings: Vec<String>,
}

impl Ctx {
    pub fn new(root: PathBuf, area_key: impl Into<String>, config: PipelineConfig) -> Self {
        let cache = StageCacheManager::new(root.clone(), &config);
        Self {
            area_key: area_key.into(),
            root,
            config,
            cache,
            outcomes: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn outcome(&self, stage: StageKind) -> Option<&StageOutcome> {
        self.outcomes.iter().find(|o| o.stage == stage)
    }
}
