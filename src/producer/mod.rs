//! Collaborators that produce stage outputs: scrapers, summarizers,
//! analyzers. The pipeline only sees "produce the bytes for this file".

use std::path::Path;

use anyhow::Result;

use crate::cache::{OutputTarget, StageKind};

pub mod command;
pub mod comp_set;
pub mod retry;

pub use command::CommandProducer;
pub use comp_set::CompSetProducer;
pub use retry::produce_with_retry;

#[derive(Debug, Clone, Copy)]
pub struct OutputRequest<'a> {
    pub stage: StageKind,
    pub area_key: &'a str,
    pub root: &'a Path,
    pub target: &'a OutputTarget,
}

impl OutputRequest<'_> {
    pub fn listing_id(&self) -> Option<&str> {
        self.target.listing_id.as_deref()
    }
}

pub trait Producer {
    fn produce(&self, request: &OutputRequest<'_>) -> Result<Vec<u8>>;
}
