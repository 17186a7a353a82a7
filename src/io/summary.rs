use crate::cache::CacheStatus;
use crate::ctx::Ctx;

pub fn format_status(status: &CacheStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!("stagecache v{}\n", env!("CARGO_PKG_VERSION")));
    out.push_str(&format!("Area: {}\n", status.area_key));
    if !status.enabled {
        out.push_str("Cache: disabled (every stage resumes)\n");
        return out;
    }
    out.push_str(&format!("Cache: enabled, ttl={}h\n", status.ttl_hours));
    for stage in &status.stages {
        let forced = if stage.force_refresh { " (forced)" } else { "" };
        out.push_str(&format!(
            "{:<22}{:<15}{}/{} fresh{}\n",
            stage.stage.as_str(),
            stage.action.as_str(),
            stage.fresh,
            stage.expected,
            forced
        ));
    }
    out
}

pub fn format_run_summary(ctx: &Ctx) -> String {
    let mut out = String::new();
    out.push_str(&format!("Area: {}\n", ctx.area_key));
    for outcome in &ctx.outcomes {
        out.push_str(&format!(
            "{:<22}{:<15}produced={} failed={}\n",
            outcome.stage.as_str(),
            outcome.action.as_str(),
            outcome.produced,
            outcome.failed
        ));
    }
    if ctx.warnings.is_empty() {
        out.push_str("Warnings: none\n");
    } else {
        out.push_str("Warnings:\n");
        for warning in &ctx.warnings {
            out.push_str(&format!("- {}\n", warning));
        }
    }
    out
}
