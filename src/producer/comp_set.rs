use anyhow::Result;

use crate::cache::StageKind;
use crate::io::comp_set::compile_comp_set;
use crate::io::to_json_bytes;
use crate::producer::{OutputRequest, Producer};

/// Market-data producer for the `airdna` stage.
///
/// Per-listing targets go to the wrapped scraper; the area-level comp set
/// is compiled from the per-listing files already on disk.
pub struct CompSetProducer<P> {
    inner: P,
}

impl<P: Producer> CompSetProducer<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: Producer> Producer for CompSetProducer<P> {
    fn produce(&self, request: &OutputRequest<'_>) -> Result<Vec<u8>> {
        if request.listing_id().is_some() {
            return self.inner.produce(request);
        }
        let dir = request.root.join(StageKind::Airdna.output_dir());
        let comp_set = compile_comp_set(&dir, request.area_key);
        to_json_bytes(&comp_set.listings)
    }
}
