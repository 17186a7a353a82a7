use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::cache::StageKind;
use crate::config::check_area_key;

#[derive(Debug, Parser)]
#[command(
    name = "stagecache",
    version,
    about = "Staged-cache manager for the rental review pipeline"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show, per stage, whether cached outputs would be reused
    Status(StatusArgs),
    /// Delete one stage's outputs for an area
    Clear(ClearArgs),
    /// Show the status after forcing every stage downstream of one stage
    Cascade(CascadeArgs),
    /// Run every stage that has a command configured
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct CommonArgs {
    #[arg(long, default_value = ".", help = "Directory holding outputs/ and reports/")]
    pub root: PathBuf,

    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,

    #[arg(
        long,
        value_parser = parse_area,
        help = "Area key (zip code); defaults to the config's zipcode"
    )]
    pub area: Option<String>,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ClearArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long, value_parser = parse_stage)]
    pub stage: StageKind,
}

#[derive(Debug, Args)]
pub struct CascadeArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long, value_parser = parse_stage)]
    pub stage: StageKind,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

fn parse_stage(s: &str) -> Result<StageKind, String> {
    s.parse::<StageKind>().map_err(|e| e.to_string())
}

fn parse_area(s: &str) -> Result<String, String> {
    check_area_key(s).map_err(|e| e.to_string())?;
    Ok(s.to_string())
}
