use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stagecache::cache::{CacheStatus, StageCacheManager};
use stagecache::cli::{Cli, Commands, CommonArgs};
use stagecache::config::{PipelineConfig, check_area_key};
use stagecache::ctx::Ctx;
use stagecache::io;
use stagecache::pipeline::Pipeline;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Status(args) => {
            let (config, area) = load(&args.common)?;
            let cache = StageCacheManager::new(args.common.root.clone(), &config);
            print_status(&cache.cache_status(&area), args.json)?;
        }
        Commands::Clear(args) => {
            let (config, area) = load(&args.common)?;
            let cache = StageCacheManager::new(args.common.root.clone(), &config);
            let removed = cache.clear_stage_for_zipcode(args.stage, &area);
            println!("cleared {} file(s) for {} in stage {}", removed, area, args.stage);
        }
        Commands::Cascade(args) => {
            let (config, area) = load(&args.common)?;
            let mut cache = StageCacheManager::new(args.common.root.clone(), &config);
            cache.cascade_force_refresh(args.stage);
            print_status(&cache.cache_status(&area), args.json)?;
        }
        Commands::Run(args) => {
            let (config, area) = load(&args.common)?;
            let pipeline = Pipeline::from_commands(&config)?;
            if pipeline.is_empty() {
                anyhow::bail!("no stage_commands configured; nothing to run");
            }
            let mut ctx = Ctx::new(args.common.root.clone(), area, config);
            pipeline.run(&mut ctx)?;
            print!("{}", io::summary::format_run_summary(&ctx));
        }
    }

    Ok(())
}

fn load(common: &CommonArgs) -> Result<(PipelineConfig, String)> {
    let config = PipelineConfig::load_or_default(&common.config);
    let area = common
        .area
        .clone()
        .unwrap_or_else(|| config.zipcode.clone());
    check_area_key(&area)?;
    Ok((config, area))
}

fn print_status(status: &CacheStatus, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(status)?);
    } else {
        print!("{}", io::summary::format_status(status));
    }
    Ok(())
}
