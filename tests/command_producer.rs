#![cfg(unix)]

use std::collections::BTreeMap;
use std::fs;

use stagecache::cache::StageKind;
use stagecache::config::PipelineConfig;
use stagecache::ctx::Ctx;
use stagecache::pipeline::Pipeline;
use tempfile::TempDir;

fn sh(script: &str) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script.to_string()]
}

#[test]
fn commands_fill_placeholders_and_capture_stdout() {
    let tmp = TempDir::new().unwrap();
    let mut config = PipelineConfig::default();
    config.stage_commands = BTreeMap::from([
        (StageKind::Search, sh(r#"printf '[{"room_id": "7"}]'"#)),
        (
            StageKind::Reviews,
            sh(r#"printf '{"listing": "{listing}", "area": "{area}"}'"#),
        ),
    ]);

    let pipeline = Pipeline::from_commands(&config).unwrap();
    assert_eq!(pipeline.len(), 2);
    let mut ctx = Ctx::new(tmp.path().to_path_buf(), "97067", config);
    pipeline.run(&mut ctx).unwrap();

    let review: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(tmp.path().join("outputs/03_reviews_scraped/reviews_97067_7.json"))
            .unwrap(),
    )
    .unwrap();
    assert_eq!(review["listing"], "7");
    assert_eq!(review["area"], "97067");
}

#[test]
fn failing_command_is_retried_and_reported() {
    let tmp = TempDir::new().unwrap();
    let counter = tmp.path().join("attempts");
    let mut config = PipelineConfig::default();
    config.max_fetch_attempts = 3;
    config.stage_commands = BTreeMap::from([(
        StageKind::ExtractData,
        sh(&format!("echo x >> {}; exit 1", counter.display())),
    )]);

    let mut ctx = Ctx::new(tmp.path().to_path_buf(), "97067", config.clone());
    Pipeline::from_commands(&config)
        .unwrap()
        .run(&mut ctx)
        .unwrap();

    assert_eq!(ctx.outcome(StageKind::ExtractData).unwrap().failed, 1);
    assert_eq!(fs::read_to_string(&counter).unwrap().lines().count(), 3);
    assert!(ctx.warnings[0].contains("area_data_97067.json"));
}
