//! Deals dataset
//!
//! Read-only deals and sharks, loaded once from CSV at startup.
//!
//! deals.csv:
//! `startup_name,industry,season,valuation,deal_amount,amount_invested_lakhs,status,sharks`
//! with `;`-separated sharks. sharks.csv: `name,company`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::types::{Deal, DealStatus, SeasonFilter, Shark};

/// Errors raised while loading the dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read {path}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("CSV error in {path}: {error}")]
    Csv { path: PathBuf, error: csv::Error },

    #[error("{path} line {line}: {reason}")]
    InvalidRow {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("dataset.{missing} is not set; deals_path and sharks_path must be configured together")]
    Incomplete { missing: &'static str },
}

#[derive(Debug, Deserialize)]
struct DealRow {
    startup_name: String,
    industry: String,
    season: u32,
    valuation: f64,
    #[serde(default)]
    deal_amount: Option<f64>,
    #[serde(default)]
    amount_invested_lakhs: Option<f64>,
    status: String,
    #[serde(default)]
    sharks: String,
}

impl DealRow {
    fn into_deal(self) -> Result<Deal, String> {
        if self.startup_name.trim().is_empty() {
            return Err("startup_name is empty".to_string());
        }
        let status: DealStatus = self.status.parse()?;
        let sharks = self
            .sharks
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Ok(Deal {
            startup_name: self.startup_name.trim().to_string(),
            industry: self.industry.trim().to_string(),
            season: self.season,
            valuation: self.valuation,
            deal_amount: self.deal_amount,
            amount_invested_lakhs: self.amount_invested_lakhs,
            status,
            sharks,
        })
    }
}

/// Deals and sharks available to the analytics reports
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    deals: Vec<Deal>,
    sharks: Vec<Shark>,
}

impl Dataset {
    pub fn new(deals: Vec<Deal>, sharks: Vec<Shark>) -> Self {
        Self { deals, sharks }
    }

    /// Load both CSV files
    pub fn load(deals_path: &Path, sharks_path: &Path) -> Result<Self, DatasetError> {
        let deals = load_deals(deals_path)?;
        let sharks = load_sharks(sharks_path)?;

        tracing::info!(
            deals = deals.len(),
            sharks = sharks.len(),
            path = %deals_path.display(),
            "Loaded deals dataset"
        );
        Ok(Self { deals, sharks })
    }

    /// Load from the configured paths, or use the built-in sample when neither is set
    ///
    /// Setting only one of the two paths is an error.
    pub fn load_or_sample(
        deals_path: Option<&Path>,
        sharks_path: Option<&Path>,
    ) -> Result<Self, DatasetError> {
        match (deals_path, sharks_path) {
            (Some(deals), Some(sharks)) => Self::load(deals, sharks),
            (Some(_), None) => Err(DatasetError::Incomplete {
                missing: "sharks_path",
            }),
            (None, Some(_)) => Err(DatasetError::Incomplete {
                missing: "deals_path",
            }),
            (None, None) => {
                tracing::info!("No dataset configured, using built-in sample");
                Ok(Self::sample())
            }
        }
    }

    pub fn deals(&self) -> &[Deal] {
        &self.deals
    }

    pub fn sharks(&self) -> &[Shark] {
        &self.sharks
    }

    /// Deals matching the season selector, in dataset order
    pub fn filtered(&self, filter: SeasonFilter) -> impl Iterator<Item = &Deal> {
        self.deals.iter().filter(move |d| filter.matches(d))
    }

    /// Seasons present in the dataset, ascending
    pub fn seasons(&self) -> Vec<u32> {
        let mut seasons: Vec<u32> = self.deals.iter().map(|d| d.season).collect();
        seasons.sort_unstable();
        seasons.dedup();
        seasons
    }

    /// A small built-in dataset
    pub fn sample() -> Self {
        fn deal(
            name: &str,
            industry: &str,
            season: u32,
            valuation: f64,
            deal_amount: Option<f64>,
            sharks: &[&str],
        ) -> Deal {
            Deal {
                startup_name: name.to_string(),
                industry: industry.to_string(),
                season,
                valuation,
                deal_amount,
                amount_invested_lakhs: deal_amount.map(|a| a / 100_000.0),
                status: if deal_amount.is_some() {
                    DealStatus::Funded
                } else {
                    DealStatus::NotFunded
                },
                sharks: sharks.iter().map(|s| s.to_string()).collect(),
            }
        }

        let deals = vec![
            deal(
                "BluePine Foods",
                "Food & Beverage",
                1,
                400_000_000.0,
                Some(7_500_000.0),
                &["Aman Gupta", "Peyush Bansal"],
            ),
            deal(
                "Booz Scooters",
                "Automobile",
                1,
                250_000_000.0,
                Some(4_000_000.0),
                &["Aman Gupta", "Vineeta Singh"],
            ),
            deal(
                "Heart Up My Sleeves",
                "Fashion",
                1,
                16_000_000.0,
                Some(2_500_000.0),
                &["Vineeta Singh", "Anupam Mittal"],
            ),
            deal(
                "Tagz Foods",
                "Food & Beverage",
                1,
                400_000_000.0,
                Some(7_000_000.0),
                &["Ashneer Grover"],
            ),
            deal("Head and Heart", "Education", 1, 200_000_000.0, None, &[]),
            deal(
                "Peeschute",
                "Healthcare",
                1,
                750_000_000.0,
                Some(7_500_000.0),
                &["Ashneer Grover"],
            ),
            deal(
                "Sippline",
                "Technology",
                2,
                60_000_000.0,
                Some(4_000_000.0),
                &["Aman Gupta", "Namita Thapar"],
            ),
            deal("Get A Whey", "Food & Beverage", 2, 160_000_000.0, None, &[]),
            deal(
                "Nuskha Kitchen",
                "Food & Beverage",
                2,
                100_000_000.0,
                Some(5_000_000.0),
                &["Amit Jain"],
            ),
            deal(
                "Ariro Toys",
                "Technology",
                3,
                120_000_000.0,
                Some(3_000_000.0),
                &["Radhika Gupta"],
            ),
            deal("Zoff Foods", "Food & Beverage", 3, 500_000_000.0, None, &[]),
            deal(
                "Kibo",
                "Technology",
                3,
                330_000_000.0,
                Some(6_000_000.0),
                &["Ritesh Agarwal", "Aman Gupta"],
            ),
        ];

        let sharks = [
            ("Aman Gupta", "boAt"),
            ("Anupam Mittal", "Shaadi.com"),
            ("Ashneer Grover", "BharatPe"),
            ("Namita Thapar", "Emcure Pharmaceuticals"),
            ("Peyush Bansal", "Lenskart"),
            ("Vineeta Singh", "SUGAR Cosmetics"),
            ("Amit Jain", "CarDekho"),
            ("Radhika Gupta", "Edelweiss MF"),
            ("Ritesh Agarwal", "OYO"),
        ]
        .into_iter()
        .map(|(name, company)| Shark {
            name: name.to_string(),
            company: company.to_string(),
        })
        .collect();

        Self { deals, sharks }
    }
}

fn reader(path: &Path) -> Result<csv::Reader<std::fs::File>, DatasetError> {
    let file = std::fs::File::open(path).map_err(|error| DatasetError::Io {
        path: path.to_path_buf(),
        error,
    })?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

fn load_deals(path: &Path) -> Result<Vec<Deal>, DatasetError> {
    let mut reader = reader(path)?;
    let mut deals = Vec::new();

    for (i, row) in reader.deserialize::<DealRow>().enumerate() {
        // Header is line 1
        let line = i + 2;
        let row = row.map_err(|error| DatasetError::Csv {
            path: path.to_path_buf(),
            error,
        })?;
        let deal = row.into_deal().map_err(|reason| DatasetError::InvalidRow {
            path: path.to_path_buf(),
            line,
            reason,
        })?;
        deals.push(deal);
    }

    Ok(deals)
}

fn load_sharks(path: &Path) -> Result<Vec<Shark>, DatasetError> {
    let mut reader = reader(path)?;
    reader
        .deserialize::<Shark>()
        .map(|row| {
            row.map_err(|error| DatasetError::Csv {
                path: path.to_path_buf(),
                error,
            })
        })
        .collect()
}
