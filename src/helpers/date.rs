//! Date helper functions

use chrono::{DateTime, TimeZone};

/// Format a timestamp the way an en-US locale string reads
///
/// # Examples
/// ```ignore
/// locale_string(&date) // -> "1/15/2024, 10:30:00 AM"
/// ```
pub fn locale_string<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}

/// Format date in full format (like "January 1, 2024")
pub fn full_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%B %-d, %Y").to_string()
}

/// Generate a <time> HTML element showing the locale string
pub fn time_tag<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        r#"<time datetime="{}">{}</time>"#,
        date_xml(date),
        locale_string(date)
    )
}
