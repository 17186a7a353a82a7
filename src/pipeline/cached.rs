use anyhow::Result;
use tracing::{info, warn};

use crate::cache::{StageAction, StageKind};
use crate::ctx::{Ctx, StageOutcome};
use crate::io;
use crate::producer::{OutputRequest, Producer, produce_with_retry};

/// Runs one pipeline stage through the cache manager.
///
/// Skips fresh stages, wipes forced ones, and otherwise asks the producer
/// only for outputs that are missing or stale.
pub struct CachedStage {
    stage: StageKind,
    producer: Box<dyn Producer>,
}

impl CachedStage {
    pub fn new(stage: StageKind, producer: Box<dyn Producer>) -> Self {
        Self { stage, producer }
    }

    pub fn stage(&self) -> StageKind {
        self.stage
    }
}

impl super::Stage for CachedStage {
    fn name(&self) -> &'static str {
        self.stage.as_str()
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let stage = self.stage;
        let area_key = ctx.area_key.clone();
        let action = ctx.cache.should_run_stage(stage, &area_key);
        let mut outcome = StageOutcome {
            stage,
            action,
            cleared: 0,
            produced: 0,
            failed: 0,
        };

        if action == StageAction::Skip {
            info!(stage = %stage, area = %area_key, "cached outputs are fresh, stage skipped");
            ctx.outcomes.push(outcome);
            return Ok(());
        }
        if action == StageAction::ClearAndRun {
            outcome.cleared = ctx.cache.clear_stage_for_zipcode(stage, &area_key);
        }

        if ctx.cache.expected_targets(stage, &area_key).is_empty() {
            warn!(
                stage = %stage,
                area = %area_key,
                "expected outputs indeterminate, upstream not ready"
            );
            ctx.warnings.push(format!(
                "{}: upstream data for area {} not available",
                stage, area_key
            ));
            ctx.outcomes.push(outcome);
            return Ok(());
        }

        let missing = ctx.cache.missing_targets(stage, &area_key);
        info!(
            stage = %stage,
            area = %area_key,
            action = %action,
            missing = missing.len(),
            "producing outputs"
        );
        for target in &missing {
            let request = OutputRequest {
                stage,
                area_key: &area_key,
                root: &ctx.root,
                target,
            };
            let produced =
                produce_with_retry(self.producer.as_ref(), &request, ctx.config.max_fetch_attempts)
                    .and_then(|bytes| io::write_output(&target.path, &bytes));
            match produced {
                Ok(()) => outcome.produced += 1,
                Err(err) => {
                    outcome.failed += 1;
                    ctx.warnings.push(format!(
                        "{}: {} not produced: {:#}",
                        stage,
                        target.path.display(),
                        err
                    ));
                }
            }
        }

        let forced = ctx.cache.force_refresh_flags().get(stage);
        if forced || (ctx.config.cascade_on_regeneration && outcome.produced > 0) {
            ctx.cache.cascade_force_refresh(stage);
        }
        ctx.outcomes.push(outcome);
        Ok(())
    }
}
