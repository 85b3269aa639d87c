//! Analytics reports
//!
//! Pure aggregations over the deals dataset. Every report takes a
//! [`SeasonFilter`]; amounts are kept numeric and paired with a display
//! string.

use serde::Serialize;
use std::collections::BTreeMap;

use super::dataset::Dataset;
use super::types::{Deal, SeasonFilter};

const RUPEES_PER_CRORE: f64 = 10_000_000.0;
const LAKHS_PER_CRORE: f64 = 100.0;
const STARTUP_CARDS: usize = 20;
const FALLBACK_INDUSTRY: &str = "Technology";

/// `₹{x.x}Cr` from an amount in rupees
pub fn format_crore(rupees: f64) -> String {
    format!("₹{:.1}Cr", rupees / RUPEES_PER_CRORE)
}

/// `₹{x.x}L` from an amount in lakhs
pub fn format_lakhs(lakhs: f64) -> String {
    format!("₹{:.1}L", lakhs)
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Per-industry summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndustryStats {
    pub name: String,
    pub deals: usize,
    /// Sum of closed deal amounts (₹)
    pub total_investment: f64,
    pub total_investment_display: String,
    /// Mean asked valuation (₹)
    pub avg_valuation: f64,
    pub avg_valuation_display: String,
    /// Share of funded pitches, percent
    pub funded_ratio: f64,
}

/// Industries in order of first appearance
pub fn industries(dataset: &Dataset, filter: SeasonFilter) -> Vec<IndustryStats> {
    struct Acc {
        deals: usize,
        investment: f64,
        valuation: f64,
        funded: usize,
    }

    let mut order: Vec<String> = Vec::new();
    let mut groups: BTreeMap<String, Acc> = BTreeMap::new();

    for deal in dataset.filtered(filter) {
        let acc = groups.entry(deal.industry.clone()).or_insert_with(|| {
            order.push(deal.industry.clone());
            Acc {
                deals: 0,
                investment: 0.0,
                valuation: 0.0,
                funded: 0,
            }
        });
        acc.deals += 1;
        acc.investment += deal.deal_amount.unwrap_or(0.0);
        acc.valuation += deal.valuation;
        if deal.status.is_funded() {
            acc.funded += 1;
        }
    }

    order
        .into_iter()
        .filter_map(|name| {
            let acc = groups.remove(&name)?;
            let avg_valuation = acc.valuation / acc.deals as f64;
            Some(IndustryStats {
                deals: acc.deals,
                total_investment: acc.investment,
                total_investment_display: format_crore(acc.investment),
                avg_valuation,
                avg_valuation_display: format_crore(avg_valuation),
                funded_ratio: percent(acc.funded, acc.deals),
                name,
            })
        })
        .collect()
}

/// Scalability bucket derived from the success rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Scalability {
    High,
    Medium,
    Low,
}

impl Scalability {
    pub fn from_success_rate(rate: f64) -> Self {
        if rate > 70.0 {
            Scalability::High
        } else if rate > 50.0 {
            Scalability::Medium
        } else {
            Scalability::Low
        }
    }
}

/// Market insights
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    /// Mean closed amount over funded deals (₹)
    pub avg_deal_size: f64,
    pub avg_deal_size_display: String,
    pub top_industry: String,
    /// Funded pitches, percent
    pub success_rate: f64,
    /// Success rate + 15, clamped to 70..=95
    pub market_fit: f64,
    pub scalability: Scalability,
    pub team_experience: &'static str,
    pub preferred_stage: &'static str,
    pub equity_range: &'static str,
}

pub fn insights(dataset: &Dataset, filter: SeasonFilter) -> Insights {
    let deals: Vec<&Deal> = dataset.filtered(filter).collect();
    let funded: Vec<&&Deal> = deals.iter().filter(|d| d.status.is_funded()).collect();

    let avg_deal_size = if funded.is_empty() {
        0.0
    } else {
        funded
            .iter()
            .map(|d| d.deal_amount.unwrap_or(0.0))
            .sum::<f64>()
            / funded.len() as f64
    };

    // Ties go to the industry seen first
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for deal in &deals {
        match counts.iter_mut().find(|(name, _)| *name == deal.industry) {
            Some((_, n)) => *n += 1,
            None => counts.push((deal.industry.as_str(), 1)),
        }
    }
    let top_industry = counts
        .iter()
        .fold(None, |best: Option<(&str, usize)>, &(name, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((name, n)),
        })
        .map_or(FALLBACK_INDUSTRY, |(name, _)| name)
        .to_string();

    let success_rate = percent(funded.len(), deals.len());

    Insights {
        avg_deal_size,
        avg_deal_size_display: format_crore(avg_deal_size),
        top_industry,
        success_rate,
        market_fit: (success_rate + 15.0).clamp(70.0, 95.0),
        scalability: Scalability::from_success_rate(success_rate),
        team_experience: "6+ years",
        preferred_stage: "Growth",
        equity_range: "8-18%",
    }
}

/// One season's activity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonTrend {
    pub season: u32,
    pub label: String,
    pub deals: usize,
    /// Sum of closed deal amounts, in crore
    pub investment_crore: f64,
}

/// Per-season totals, ascending by season number
pub fn trends(dataset: &Dataset, filter: SeasonFilter) -> Vec<SeasonTrend> {
    let mut seasons: BTreeMap<u32, (usize, f64)> = BTreeMap::new();
    for deal in dataset.filtered(filter) {
        let entry = seasons.entry(deal.season).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += deal.deal_amount.unwrap_or(0.0);
    }

    seasons
        .into_iter()
        .map(|(season, (deals, investment))| SeasonTrend {
            season,
            label: format!("Season {}", season),
            deals,
            investment_crore: investment / RUPEES_PER_CRORE,
        })
        .collect()
}

/// Startup card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartupCard {
    pub name: String,
    pub industry: String,
    pub season: u32,
    pub valuation: f64,
    pub valuation_display: String,
    pub funded: bool,
    pub status: &'static str,
}

/// The first twenty deals as cards
pub fn startups(dataset: &Dataset, filter: SeasonFilter) -> Vec<StartupCard> {
    dataset
        .filtered(filter)
        .take(STARTUP_CARDS)
        .map(|deal| StartupCard {
            name: deal.startup_name.clone(),
            industry: deal.industry.clone(),
            season: deal.season,
            valuation: deal.valuation,
            valuation_display: format_crore(deal.valuation),
            funded: deal.status.is_funded(),
            status: deal.status.label(),
        })
        .collect()
}

/// Landing page stats
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_deals: usize,
    pub total_funding_lakhs: f64,
    pub total_funding_display: String,
    pub avg_deal_lakhs: f64,
    pub avg_deal_display: String,
    pub total_sharks: usize,
}

pub fn overview(dataset: &Dataset, filter: SeasonFilter) -> Overview {
    let (total_deals, total_funding_lakhs) = dataset
        .filtered(filter)
        .fold((0usize, 0.0f64), |(n, sum), deal| {
            (n + 1, sum + deal.amount_invested_lakhs.unwrap_or(0.0))
        });

    let avg_deal_lakhs = if total_deals == 0 {
        0.0
    } else {
        total_funding_lakhs / total_deals as f64
    };

    Overview {
        total_deals,
        total_funding_lakhs,
        total_funding_display: format!("₹{:.1}Cr", total_funding_lakhs / LAKHS_PER_CRORE),
        avg_deal_lakhs,
        avg_deal_display: format_lakhs(avg_deal_lakhs),
        total_sharks: dataset.sharks().len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::types::{DealStatus, Shark};

    fn deal(
        name: &str,
        industry: &str,
        season: u32,
        valuation: f64,
        deal_amount: Option<f64>,
        lakhs: Option<f64>,
    ) -> Deal {
        Deal {
            startup_name: name.to_string(),
            industry: industry.to_string(),
            season,
            valuation,
            deal_amount,
            amount_invested_lakhs: lakhs,
            status: if deal_amount.is_some() {
                DealStatus::Funded
            } else {
                DealStatus::NotFunded
            },
            sharks: Vec::new(),
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(
            vec![
                deal("A", "Food", 2, 100_000_000.0, Some(10_000_000.0), Some(100.0)),
                deal("B", "Tech", 10, 300_000_000.0, Some(20_000_000.0), Some(200.0)),
                deal("C", "Food", 1, 200_000_000.0, None, None),
                deal("D", "Tech", 2, 50_000_000.0, None, None),
                deal("E", "Food", 1, 50_000_000.0, Some(5_000_000.0), Some(50.0)),
            ],
            vec![Shark {
                name: "Aman Gupta".to_string(),
                company: "boAt".to_string(),
            }],
        )
    }

    #[test]
    fn test_money_formats() {
        assert_eq!(format_crore(75_000_000.0), "₹7.5Cr");
        assert_eq!(format_crore(0.0), "₹0.0Cr");
        assert_eq!(format_lakhs(70.0), "₹70.0L");
    }

    #[test]
    fn test_industries() {
        let report = industries(&dataset(), SeasonFilter::all());

        let names: Vec<_> = report.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Food", "Tech"]);

        let food = &report[0];
        assert_eq!(food.deals, 3);
        assert_eq!(food.total_investment, 15_000_000.0);
        assert_eq!(food.total_investment_display, "₹1.5Cr");
        assert_eq!(food.avg_valuation_display, "₹11.7Cr");
        assert!((food.funded_ratio - 66.666).abs() < 0.01);

        assert_eq!(report[1].funded_ratio, 50.0);
    }

    #[test]
    fn test_insights() {
        let insights = insights(&dataset(), SeasonFilter::all());

        assert_eq!(insights.avg_deal_size, 35_000_000.0 / 3.0);
        assert_eq!(insights.avg_deal_size_display, "₹1.2Cr");
        assert_eq!(insights.top_industry, "Food");
        assert_eq!(insights.success_rate, 60.0);
        assert_eq!(insights.market_fit, 75.0);
        assert_eq!(insights.scalability, Scalability::Medium);
    }

    #[test]
    fn test_insights_empty_dataset() {
        let insights = insights(&Dataset::default(), SeasonFilter::all());

        assert_eq!(insights.success_rate, 0.0);
        assert_eq!(insights.market_fit, 70.0);
        assert_eq!(insights.top_industry, "Technology");
        assert_eq!(insights.scalability, Scalability::Low);
        assert_eq!(insights.avg_deal_size, 0.0);
    }

    #[test]
    fn test_insights_top_industry_tie_keeps_first() {
        let insights = insights(&dataset(), SeasonFilter::season(2));
        assert_eq!(insights.top_industry, "Food");
    }

    #[test]
    fn test_trends_sorted_numerically() {
        let report = trends(&dataset(), SeasonFilter::all());

        let seasons: Vec<_> = report.iter().map(|t| t.season).collect();
        assert_eq!(seasons, vec![1, 2, 10]);
        assert_eq!(report[0].label, "Season 1");
        assert_eq!(report[0].deals, 2);
        assert_eq!(report[0].investment_crore, 0.5);
        assert_eq!(report[2].investment_crore, 2.0);
    }

    #[test]
    fn test_startups_capped() {
        let many = Dataset::new(
            (0..30)
                .map(|i| deal(&format!("S{}", i), "Tech", 1, 1.0, None, None))
                .collect(),
            Vec::new(),
        );
        let cards = startups(&many, SeasonFilter::all());
        assert_eq!(cards.len(), 20);
        assert_eq!(cards[0].name, "S0");
        assert_eq!(cards[0].status, "Not Funded");
    }

    #[test]
    fn test_overview() {
        let overview = overview(&dataset(), SeasonFilter::all());

        assert_eq!(overview.total_deals, 5);
        assert_eq!(overview.total_funding_lakhs, 350.0);
        assert_eq!(overview.total_funding_display, "₹3.5Cr");
        assert_eq!(overview.avg_deal_display, "₹70.0L");
        assert_eq!(overview.total_sharks, 1);
    }

    #[test]
    fn test_season_filter_applies() {
        let overview = overview(&dataset(), SeasonFilter::season(1));
        assert_eq!(overview.total_deals, 2);
        assert_eq!(overview.total_funding_lakhs, 50.0);
    }
}
