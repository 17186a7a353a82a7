use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Result, bail};
use stagecache::cache::{StageAction, StageKind};
use stagecache::config::PipelineConfig;
use stagecache::ctx::Ctx;
use stagecache::pipeline::{CachedStage, Pipeline};
use stagecache::producer::{CompSetProducer, OutputRequest, Producer};
use tempfile::TempDir;

type Calls = Rc<RefCell<Vec<String>>>;

struct SearchFake {
    calls: Calls,
}

impl Producer for SearchFake {
    fn produce(&self, request: &OutputRequest<'_>) -> Result<Vec<u8>> {
        self.calls.borrow_mut().push(format!("search:{}", request.area_key));
        Ok(br#"[{"room_id": "111"}, {"room_id": "222"}]"#.to_vec())
    }
}

struct ListingFake {
    calls: Calls,
    fail: bool,
}

impl Producer for ListingFake {
    fn produce(&self, request: &OutputRequest<'_>) -> Result<Vec<u8>> {
        let listing = request.listing_id().unwrap_or("area").to_string();
        self.calls
            .borrow_mut()
            .push(format!("{}:{}", request.stage, listing));
        if self.fail {
            bail!("listing {} unavailable", listing);
        }
        Ok(format!("{{\"{}\": {{\"adr\": 100}}}}", listing).into_bytes())
    }
}

fn pipeline(calls: &Calls, fail_reviews: bool) -> Pipeline {
    Pipeline::new(vec![
        Box::new(CachedStage::new(
            StageKind::Search,
            Box::new(SearchFake {
                calls: calls.clone(),
            }),
        )),
        Box::new(CachedStage::new(
            StageKind::Reviews,
            Box::new(ListingFake {
                calls: calls.clone(),
                fail: fail_reviews,
            }),
        )),
    ])
}

fn run(root: &Path, config: PipelineConfig, calls: &Calls) -> Ctx {
    let mut ctx = Ctx::new(root.to_path_buf(), "97067", config);
    pipeline(calls, false).run(&mut ctx).unwrap();
    ctx
}

fn reviews_path(root: &Path, listing: &str) -> PathBuf {
    root.join(format!("outputs/03_reviews_scraped/reviews_97067_{}.json", listing))
}

#[test]
fn first_run_produces_then_second_run_skips() {
    let tmp = TempDir::new().unwrap();
    let calls: Calls = Rc::default();

    let ctx = run(tmp.path(), PipelineConfig::default(), &calls);
    let reviews = ctx.outcome(StageKind::Reviews).unwrap();
    assert_eq!(reviews.action, StageAction::Resume);
    assert_eq!(reviews.produced, 2);
    assert!(reviews_path(tmp.path(), "111").is_file());
    assert!(reviews_path(tmp.path(), "222").is_file());
    assert_eq!(calls.borrow().len(), 3);

    let ctx = run(tmp.path(), PipelineConfig::default(), &calls);
    assert_eq!(ctx.outcome(StageKind::Search).unwrap().action, StageAction::Skip);
    assert_eq!(ctx.outcome(StageKind::Reviews).unwrap().action, StageAction::Skip);
    assert_eq!(calls.borrow().len(), 3);
}

#[test]
fn resume_regenerates_only_the_missing_listing() {
    let tmp = TempDir::new().unwrap();
    let calls: Calls = Rc::default();
    run(tmp.path(), PipelineConfig::default(), &calls);
    fs::remove_file(reviews_path(tmp.path(), "222")).unwrap();
    calls.borrow_mut().clear();

    let ctx = run(tmp.path(), PipelineConfig::default(), &calls);
    let reviews = ctx.outcome(StageKind::Reviews).unwrap();
    assert_eq!(reviews.action, StageAction::Resume);
    assert_eq!(reviews.produced, 1);
    assert_eq!(*calls.borrow(), vec!["reviews:222".to_string()]);
}

#[test]
fn forced_stage_is_cleared_rerun_and_cascaded() {
    let tmp = TempDir::new().unwrap();
    let calls: Calls = Rc::default();
    run(tmp.path(), PipelineConfig::default(), &calls);
    calls.borrow_mut().clear();

    let mut config = PipelineConfig::default();
    config.force_refresh_reviews = true;
    let ctx = run(tmp.path(), config, &calls);

    assert_eq!(ctx.outcome(StageKind::Search).unwrap().action, StageAction::Skip);
    let reviews = ctx.outcome(StageKind::Reviews).unwrap();
    assert_eq!(reviews.action, StageAction::ClearAndRun);
    assert_eq!(reviews.cleared, 2);
    assert_eq!(reviews.produced, 2);
    assert_eq!(
        *calls.borrow(),
        vec!["reviews:111".to_string(), "reviews:222".to_string()]
    );
    let flags = ctx.cache.force_refresh_flags();
    assert!(flags.get(StageKind::AggregateReviews));
    assert!(!flags.get(StageKind::Airdna));
}

#[test]
fn disabled_cache_resumes_without_redoing_recent_files() {
    let tmp = TempDir::new().unwrap();
    let calls: Calls = Rc::default();
    run(tmp.path(), PipelineConfig::default(), &calls);
    calls.borrow_mut().clear();

    let mut config = PipelineConfig::default();
    config.cache_enabled = false;
    let ctx = run(tmp.path(), config, &calls);
    assert_eq!(ctx.outcome(StageKind::Reviews).unwrap().action, StageAction::Resume);
    assert!(calls.borrow().is_empty());
}

#[test]
fn producer_failures_are_recorded_not_fatal() {
    let tmp = TempDir::new().unwrap();
    let calls: Calls = Rc::default();
    let mut config = PipelineConfig::default();
    config.max_fetch_attempts = 2;
    let mut ctx = Ctx::new(tmp.path().to_path_buf(), "97067", config);

    pipeline(&calls, true).run(&mut ctx).unwrap();

    let reviews = ctx.outcome(StageKind::Reviews).unwrap();
    assert_eq!(reviews.failed, 2);
    assert_eq!(reviews.produced, 0);
    assert_eq!(ctx.warnings.len(), 2);
    assert_eq!(calls.borrow().len(), 1 + 2 * 2);
    assert!(!reviews_path(tmp.path(), "111").exists());
}

#[test]
fn per_listing_stage_without_search_results_is_indeterminate() {
    let tmp = TempDir::new().unwrap();
    let calls: Calls = Rc::default();
    let stage = CachedStage::new(
        StageKind::Details,
        Box::new(ListingFake {
            calls: calls.clone(),
            fail: false,
        }),
    );
    let mut ctx = Ctx::new(tmp.path().to_path_buf(), "97067", PipelineConfig::default());
    Pipeline::new(vec![Box::new(stage)]).run(&mut ctx).unwrap();

    assert_eq!(ctx.outcome(StageKind::Details).unwrap().produced, 0);
    assert_eq!(ctx.warnings.len(), 1);
    assert!(calls.borrow().is_empty());
}

#[test]
fn regeneration_cascades_when_enabled() {
    let tmp = TempDir::new().unwrap();
    let calls: Calls = Rc::default();
    let mut config = PipelineConfig::default();
    config.cascade_on_regeneration = true;
    let ctx = run(tmp.path(), config, &calls);

    let flags = ctx.cache.force_refresh_flags();
    assert!(!flags.get(StageKind::Search));
    assert!(flags.get(StageKind::Airdna));
    assert!(flags.get(StageKind::Details));
}

#[test]
fn airdna_compiles_comp_set_from_this_area_only() {
    let tmp = TempDir::new().unwrap();
    let calls: Calls = Rc::default();
    let other = tmp.path().join("outputs/02_comp_sets/listing_90210_999.json");
    fs::create_dir_all(other.parent().unwrap()).unwrap();
    fs::write(&other, r#"{"999": {"adr": 5}}"#).unwrap();

    let mut ctx = Ctx::new(tmp.path().to_path_buf(), "97067", PipelineConfig::default());
    Pipeline::new(vec![
        Box::new(CachedStage::new(
            StageKind::Search,
            Box::new(SearchFake {
                calls: calls.clone(),
            }),
        )),
        Box::new(CachedStage::new(
            StageKind::Airdna,
            Box::new(CompSetProducer::new(ListingFake {
                calls: calls.clone(),
                fail: false,
            })),
        )),
    ])
    .run(&mut ctx)
    .unwrap();

    assert_eq!(ctx.outcome(StageKind::Airdna).unwrap().produced, 3);
    let comp_set: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(tmp.path().join("outputs/02_comp_sets/comp_set_97067.json")).unwrap(),
    )
    .unwrap();
    let keys: Vec<&String> = comp_set.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["111", "222"]);
    assert!(ctx.cache.is_stage_fresh(StageKind::Airdna, "97067"));
}
