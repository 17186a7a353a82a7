use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::producer::{OutputRequest, Producer};

/// Runs an external command per output and captures its stdout.
///
/// Arguments may contain `{area}`, `{listing}` and `{output}`
/// placeholders. `{listing}` is empty for area-level outputs.
#[derive(Debug, Clone)]
pub struct CommandProducer {
    argv: Vec<String>,
}

impl CommandProducer {
    pub fn new(argv: Vec<String>) -> Result<Self> {
        if argv.is_empty() {
            bail!("stage command must not be empty");
        }
        Ok(Self { argv })
    }

    fn render(&self, request: &OutputRequest<'_>) -> Vec<String> {
        let output = request.target.path.display().to_string();
        self.argv
            .iter()
            .map(|arg| {
                arg.replace("{area}", request.area_key)
                    .replace("{listing}", request.listing_id().unwrap_or(""))
                    .replace("{output}", &output)
            })
            .collect()
    }
}

impl Producer for CommandProducer {
    fn produce(&self, request: &OutputRequest<'_>) -> Result<Vec<u8>> {
        let argv = self.render(request);
        debug!(stage = %request.stage, command = %argv.join(" "), "running stage command");
        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .current_dir(request.root)
            .output()
            .with_context(|| format!("failed to spawn '{}'", argv[0]))?;
        if !output.status.success() {
            bail!(
                "'{}' exited with {}: {}",
                argv.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output.stdout)
    }
}
