//! Deal and shark records

use serde::{Deserialize, Serialize};

/// Outcome of a pitch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStatus {
    Funded,
    NotFunded,
}

impl DealStatus {
    pub fn is_funded(&self) -> bool {
        matches!(self, DealStatus::Funded)
    }

    pub fn label(&self) -> &'static str {
        match self {
            DealStatus::Funded => "Funded",
            DealStatus::NotFunded => "Not Funded",
        }
    }
}

impl std::str::FromStr for DealStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "funded" => Ok(DealStatus::Funded),
            "not_funded" => Ok(DealStatus::NotFunded),
            other => Err(format!("unknown deal status: {}", other)),
        }
    }
}

/// One pitch from the show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub startup_name: String,
    pub industry: String,
    pub season: u32,
    /// Asked valuation in rupees
    pub valuation: f64,
    /// Closed deal amount in rupees
    #[serde(default)]
    pub deal_amount: Option<f64>,
    /// Amount invested in lakhs
    #[serde(default)]
    pub amount_invested_lakhs: Option<f64>,
    pub status: DealStatus,
    /// Investing sharks
    #[serde(default)]
    pub sharks: Vec<String>,
}

/// A panel investor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shark {
    pub name: String,
    pub company: String,
}

/// Season selector; `None` means every season
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonFilter(pub Option<u32>);

impl SeasonFilter {
    pub fn all() -> Self {
        Self(None)
    }

    pub fn season(season: u32) -> Self {
        Self(Some(season))
    }

    pub fn matches(&self, deal: &Deal) -> bool {
        self.0.map_or(true, |s| deal.season == s)
    }
}

impl From<Option<u32>> for SeasonFilter {
    fn from(season: Option<u32>) -> Self {
        Self(season)
    }
}
