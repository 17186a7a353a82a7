use anyhow::{Result, anyhow};
use tracing::warn;

use crate::producer::{OutputRequest, Producer};

/// Calls `producer` up to `max_attempts` times (at least once).
pub fn produce_with_retry(
    producer: &dyn Producer,
    request: &OutputRequest<'_>,
    max_attempts: u32,
) -> Result<Vec<u8>> {
    let attempts = max_attempts.max(1);
    let mut last_err = None;
    for attempt in 1..=attempts {
        match producer.produce(request) {
            Ok(bytes) => return Ok(bytes),
            Err(err) => {
                warn!(
                    stage = %request.stage,
                    path = %request.target.path.display(),
                    attempt,
                    attempts,
                    error = %format!("{:#}", err),
                    "producer attempt failed"
                );
                last_err = Some(err);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow!("producer never ran")))
}
