use chrono::{Datelike, Days, NaiveDate};
use satsearch::Item;
use std::collections::BTreeMap;

const MONTHS_PER_ROW: u32 = 3;
const WEEKS_PER_MONTH: u32 = 6;
const WEEKDAYS: &str = "Mo Tu We Th Fr Sa Su";
const MULTIPLE: &str = "Multiple";

/// Groups item dates by the value of a property.
///
/// A date with items that disagree on the property is labeled `Multiple`.
pub fn dates(items: &[Item], field: &str) -> BTreeMap<NaiveDate, String> {
    let mut dates = BTreeMap::new();
    for item in items {
        let Some(date) = satsearch_io::item_date(item) else {
            continue;
        };
        let label = satsearch_io::item_field(item, field).unwrap_or_else(|| "unknown".to_string());
        let _ = dates
            .entry(date)
            .and_modify(|existing: &mut String| {
                if *existing != label {
                    *existing = MULTIPLE.to_string();
                }
            })
            .or_insert(label);
    }
    dates
}

/// Renders a text calendar of every month between the first and last date.
///
/// Each date is colored by its label, and a legend with counts follows the
/// calendar.
pub fn render(dates: &BTreeMap<NaiveDate, String>) -> String {
    let (Some(first), Some(last)) = (dates.keys().next(), dates.keys().next_back()) else {
        return "0 total dates".to_string();
    };
    let mut colors: BTreeMap<&str, u8> = BTreeMap::new();
    for label in dates.values() {
        let next = 41 + (colors.len() % 7) as u8;
        let _ = colors.entry(label.as_str()).or_insert(next);
    }

    let mut out = String::new();
    for year in first.year()..=last.year() {
        let first_row = if year == first.year() {
            first.month0() / MONTHS_PER_ROW
        } else {
            0
        };
        let last_row = if year == last.year() {
            last.month0() / MONTHS_PER_ROW
        } else {
            12 / MONTHS_PER_ROW - 1
        };
        out.push_str(&format!("{year:^64}\n\n"));
        for row in first_row..=last_row {
            let months: Vec<NaiveDate> = (1..=MONTHS_PER_ROW)
                .filter_map(|column| NaiveDate::from_ymd_opt(year, row * MONTHS_PER_ROW + column, 1))
                .collect();
            for month in &months {
                out.push_str(&format!("{:^20}  ", month.format("%B").to_string()));
            }
            out.push('\n');
            for _ in &months {
                out.push_str(&format!("{WEEKDAYS:^20}  "));
            }
            out.push('\n');
            for week in 0..WEEKS_PER_MONTH {
                for month in &months {
                    let days: Vec<String> = (0..7)
                        .map(|weekday| cell(*month, week * 7 + weekday, dates, &colors))
                        .collect();
                    out.push_str(&days.join(" "));
                    out.push_str("  ");
                }
                out.push('\n');
            }
            out.push('\n');
        }
    }
    for (label, color) in &colors {
        let count = dates.values().filter(|value| value == label).count();
        out.push_str(&format!("\x1b[{color}m{label} ({count})\x1b[0m\n"));
    }
    out.push_str(&format!("{} total dates", dates.len()));
    out
}

fn cell(
    month: NaiveDate,
    index: u32,
    dates: &BTreeMap<NaiveDate, String>,
    colors: &BTreeMap<&str, u8>,
) -> String {
    let offset = month.weekday().num_days_from_monday();
    let Some(date) = index
        .checked_sub(offset)
        .and_then(|days| month.checked_add_days(Days::new(days.into())))
        .filter(|date| date.month() == month.month())
    else {
        return "  ".to_string();
    };
    match dates
        .get(&date)
        .and_then(|label| colors.get(label.as_str()))
    {
        Some(color) => format!("\x1b[{color}m{:>2}\x1b[0m", date.day()),
        None => format!("{:>2}", date.day()),
    }
}
