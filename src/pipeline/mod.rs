use anyhow::Result;
use std::time::Instant;
use tracing::{info, warn};

use crate::cache::StageKind;
use crate::config::PipelineConfig;
use crate::ctx::Ctx;
use crate::producer::{CommandProducer, CompSetProducer, Producer};

pub mod cached;

pub use cached::CachedStage;

pub trait Stage {
    fn name(&self) -> &'static str;
    fn run(&self, ctx: &mut Ctx) -> Result<()>;
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Builds cached stages for every enabled stage that has a command configured.
    pub fn from_commands(config: &PipelineConfig) -> Result<Self> {
        let mut stages: Vec<Box<dyn Stage>> = Vec::new();
        let mut enabled = config.stages.clone();
        enabled.sort();
        enabled.dedup();
        for stage in enabled {
            let Some(argv) = config.stage_commands.get(&stage) else {
                warn!(stage = %stage, "no command configured, stage not scheduled");
                continue;
            };
            let command = CommandProducer::new(argv.clone())?;
            let producer: Box<dyn Producer> = if stage == StageKind::Airdna {
                Box::new(CompSetProducer::new(command))
            } else {
                Box::new(command)
            };
            stages.push(Box::new(CachedStage::new(stage, producer)));
        }
        Ok(Self::new(stages))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn run(&self, ctx: &mut Ctx) -> Result<()> {
        info!(
            area = %ctx.area_key,
            cache_enabled = ctx.cache.cache_enabled(),
            "pipeline started"
        );
        for stage in &self.stages {
            let start = Instant::now();
            info!(stage = stage.name(), "stage started");
            if let Err(err) = stage.run(ctx) {
                let elapsed_ms = start.elapsed().as_millis();
                warn!(
                    stage = stage.name(),
                    elapsed_ms = elapsed_ms as u64,
                    "stage failed"
                );
                return Err(err);
            }
            let elapsed_ms = start.elapsed().as_millis();
            info!(
                stage = stage.name(),
                elapsed_ms = elapsed_ms as u64,
                "stage finished"
            );
        }
        Ok(())
    }
}
