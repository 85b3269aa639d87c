//! Message timestamp display

use chrono::{DateTime, TimeZone};

/// Relative age label for a message timestamp
///
/// Buckets by calendar day in `now`'s time zone: today shows the time of
/// day, the previous day shows `Yesterday`, then `N days ago` up to a week,
/// then a short date. Timestamps after `now` count as today.
pub fn format_age<Tz: TimeZone>(timestamp: &DateTime<Tz>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let local = timestamp.with_timezone(&now.timezone());
    let days = (now.date_naive() - local.date_naive()).num_days();

    match days {
        d if d <= 0 => local.format("%I:%M %p").to_string(),
        1 => "Yesterday".to_string(),
        d if d < 7 => format!("{} days ago", d),
        _ => local.format("%b %-d").to_string(),
    }
}
