//! Deal analytics
//!
//! Aggregations behind the industries, insights, trends, startups and
//! overview pages. The [`Dataset`] is loaded once and shared read-only.

mod dataset;
mod reports;
mod types;

pub use dataset::{Dataset, DatasetError};
pub use reports::{
    format_crore, format_lakhs, industries, insights, overview, startups, trends, IndustryStats,
    Insights, Overview, Scalability, SeasonTrend, StartupCard,
};
pub use types::{Deal, DealStatus, SeasonFilter, Shark};

/// Report names accepted by the API and CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Overview,
    Industries,
    Insights,
    Trends,
    Startups,
}

impl Report {
    pub fn all() -> &'static [Report] {
        &[
            Report::Overview,
            Report::Industries,
            Report::Insights,
            Report::Trends,
            Report::Startups,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Report::Overview => "overview",
            Report::Industries => "industries",
            Report::Insights => "insights",
            Report::Trends => "trends",
            Report::Startups => "startups",
        }
    }

    /// Run the report, returning its JSON form
    pub fn run(
        &self,
        dataset: &Dataset,
        filter: SeasonFilter,
    ) -> serde_json::Result<serde_json::Value> {
        match self {
            Report::Overview => serde_json::to_value(overview(dataset, filter)),
            Report::Industries => serde_json::to_value(industries(dataset, filter)),
            Report::Insights => serde_json::to_value(insights(dataset, filter)),
            Report::Trends => serde_json::to_value(trends(dataset, filter)),
            Report::Startups => serde_json::to_value(startups(dataset, filter)),
        }
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Report {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Report::all()
            .iter()
            .find(|r| r.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown report: {}", s))
    }
}
