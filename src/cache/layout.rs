use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cache::stage::StageKind;
use crate::io::listings;

const REPORTS_DIR: &str = "reports";

/// One expected output file and the listing it belongs to, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputTarget {
    pub path: PathBuf,
    pub listing_id: Option<String>,
}

impl OutputTarget {
    fn area(path: PathBuf) -> Self {
        Self {
            path,
            listing_id: None,
        }
    }

    fn listing(path: PathBuf, listing_id: &str) -> Self {
        Self {
            path,
            listing_id: Some(listing_id.to_string()),
        }
    }
}

/// File naming convention for every stage, rooted at `root`.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    correlation_metrics: Vec<String>,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, correlation_metrics: Vec<String>) -> Self {
        Self {
            root: root.into(),
            correlation_metrics,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stage_dir(&self, stage: StageKind) -> PathBuf {
        self.root.join(stage.output_dir())
    }

    pub fn search_results_path(&self, area_key: &str) -> PathBuf {
        self.stage_dir(StageKind::Search)
            .join(format!("search_results_{}.json", area_key))
    }

    pub fn comp_set_path(&self, area_key: &str) -> PathBuf {
        self.stage_dir(StageKind::Airdna)
            .join(format!("comp_set_{}.json", area_key))
    }

    /// Expected outputs of `stage` for `area_key`.
    ///
    /// Per-listing stages read upstream files already on disk and return
    /// nothing when those are missing. No files are written.
    pub fn targets(&self, stage: StageKind, area_key: &str) -> Vec<OutputTarget> {
        let dir = self.stage_dir(stage);
        let reports = self.root.join(REPORTS_DIR);
        match stage {
            StageKind::Search => vec![OutputTarget::area(self.search_results_path(area_key))],
            StageKind::Airdna => {
                let mut targets = self.per_listing(stage, "listing", area_key);
                if !targets.is_empty() {
                    targets.push(OutputTarget::area(self.comp_set_path(area_key)));
                }
                targets
            }
            StageKind::Reviews => self.per_listing(stage, "reviews", area_key),
            StageKind::Details => self.per_listing(stage, "property_details", area_key),
            StageKind::AggregateReviews => {
                let reviews_dir = self.stage_dir(StageKind::Reviews);
                listings::scan_listing_files(&reviews_dir, "reviews", area_key)
                    .iter()
                    .map(|id| {
                        OutputTarget::listing(
                            dir.join(format!("generated_summaries_{}_{}.json", area_key, id)),
                            id,
                        )
                    })
                    .collect()
            }
            StageKind::AggregateSummaries => vec![
                OutputTarget::area(reports.join(format!("area_summary_{}.json", area_key))),
                OutputTarget::area(reports.join(format!("area_summary_{}.md", area_key))),
            ],
            StageKind::BuildDetails => [
                format!("property_amenities_matrix_{}.csv", area_key),
                format!("property_amenities_matrix_cleaned_{}.csv", area_key),
                format!("house_rules_details_{}.json", area_key),
                format!("property_descriptions_{}.json", area_key),
                format!("neighborhood_highlights_{}.json", area_key),
            ]
            .into_iter()
            .map(|name| OutputTarget::area(dir.join(name)))
            .collect(),
            StageKind::ExtractData => vec![OutputTarget::area(
                dir.join(format!("area_data_{}.json", area_key)),
            )],
            StageKind::AnalyzeCorrelations => self
                .correlation_metrics
                .iter()
                .flat_map(|metric| {
                    [
                        OutputTarget::area(
                            dir.join(format!("correlation_stats_{}_{}.json", metric, area_key)),
                        ),
                        OutputTarget::area(reports.join(format!(
                            "correlation_insights_{}_{}.md",
                            metric, area_key
                        ))),
                    ]
                })
                .collect(),
            StageKind::AnalyzeDescriptions => vec![
                OutputTarget::area(
                    dir.join(format!("description_quality_stats_{}.json", area_key)),
                ),
                OutputTarget::area(reports.join(format!("description_quality_{}.md", area_key))),
            ],
        }
    }

    fn per_listing(&self, stage: StageKind, prefix: &str, area_key: &str) -> Vec<OutputTarget> {
        let dir = self.stage_dir(stage);
        listings::read_listing_ids(&self.search_results_path(area_key))
            .iter()
            .map(|id| {
                OutputTarget::listing(dir.join(format!("{}_{}_{}.json", prefix, area_key, id)), id)
            })
            .collect()
    }
}
