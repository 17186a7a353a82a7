use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Search,
    Airdna,
    Reviews,
    Details,
    AggregateReviews,
    AggregateSummaries,
    BuildDetails,
    ExtractData,
    AnalyzeCorrelations,
    AnalyzeDescriptions,
}

pub const STAGE_ORDER: [StageKind; 10] = [
    StageKind::Search,
    StageKind::Airdna,
    StageKind::Reviews,
    StageKind::Details,
    StageKind::AggregateReviews,
    StageKind::AggregateSummaries,
    StageKind::BuildDetails,
    StageKind::ExtractData,
    StageKind::AnalyzeCorrelations,
    StageKind::AnalyzeDescriptions,
];

impl StageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Airdna => "airdna",
            Self::Reviews => "reviews",
            Self::Details => "details",
            Self::AggregateReviews => "aggregate_reviews",
            Self::AggregateSummaries => "aggregate_summaries",
            Self::BuildDetails => "build_details",
            Self::ExtractData => "extract_data",
            Self::AnalyzeCorrelations => "analyze_correlations",
            Self::AnalyzeDescriptions => "analyze_descriptions",
        }
    }

    /// Position in [`STAGE_ORDER`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stages strictly after `self`.
    pub fn downstream(self) -> &'static [StageKind] {
        &STAGE_ORDER[self.index() + 1..]
    }

    /// Output directory relative to the output root.
    pub fn output_dir(self) -> &'static str {
        match self {
            Self::Search => "outputs/01_search_results",
            Self::Airdna => "outputs/02_comp_sets",
            Self::Reviews => "outputs/03_reviews_scraped",
            Self::Details => "outputs/04_details_scraped",
            Self::BuildDetails => "outputs/05_details_results",
            Self::AggregateReviews => "outputs/06_generated_summaries",
            Self::AggregateSummaries => "reports",
            Self::ExtractData => "outputs/07_extracted_data",
            Self::AnalyzeCorrelations => "outputs/08_correlation_results",
            Self::AnalyzeDescriptions => "outputs/09_description_analysis",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match STAGE_ORDER.iter().find(|stage| stage.as_str() == s) {
            Some(stage) => Ok(*stage),
            None => bail!("unknown pipeline stage '{}'", s),
        }
    }
}
