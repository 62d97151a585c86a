use chrono::{DateTime, Datelike, NaiveDate};
use satsearch::Item;
use serde_json::Value;
use std::{convert::Infallible, fmt::Display, str::FromStr};

/// The default filename template.
pub const DEFAULT_FILENAME_TEMPLATE: &str = "${collection}/${date}/${id}";

const UNKNOWN: &str = "unknown";

/// A filename pattern with `${key}` placeholders filled in from an item.
///
/// Supported keys are `id`, `collection`, `date`, `year`, `month`, `day`
/// (all from the item's `datetime`), and any key in the item's properties.
/// Keys that can't be found render as `unknown`.
///
/// # Examples
///
/// ```
/// use satsearch_io::FilenameTemplate;
/// use serde_json::json;
///
/// let item = json!({
///     "id": "an-id",
///     "collection": "sentinel-2",
///     "properties": {"datetime": "2020-01-02T10:00:00Z", "platform": "sentinel-2a"}
/// });
/// let template: FilenameTemplate = "${platform}/${year}/${id}".parse().unwrap();
/// assert_eq!(
///     template.render(item.as_object().unwrap()),
///     "sentinel-2a/2020/an-id"
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilenameTemplate(String);

impl FilenameTemplate {
    /// Renders this template for an item.
    pub fn render(&self, item: &Item) -> String {
        let mut rendered = String::with_capacity(self.0.len());
        let mut rest = self.0.as_str();
        while let Some(start) = rest.find("${") {
            let Some(len) = rest[start + 2..].find('}') else {
                break;
            };
            rendered.push_str(&rest[..start]);
            let key = &rest[start + 2..start + 2 + len];
            rendered.push_str(&item_field(item, key).unwrap_or_else(|| UNKNOWN.to_string()));
            rest = &rest[start + 3 + len..];
        }
        rendered.push_str(rest);
        rendered
    }
}

/// Returns a field of an item as a string.
///
/// `id` and `collection` come from the top level, `date`, `year`, `month`,
/// and `day` from the item's `datetime`, and any other key from its
/// properties.
///
/// # Examples
///
/// ```
/// use serde_json::json;
///
/// let item = json!({"id": "a", "properties": {"datetime": "2020-01-02T00:00:00Z"}});
/// let item = item.as_object().unwrap();
/// assert_eq!(satsearch_io::item_field(item, "month").unwrap(), "01");
/// assert!(satsearch_io::item_field(item, "platform").is_none());
/// ```
pub fn item_field(item: &Item, key: &str) -> Option<String> {
    match key {
        "id" | "collection" => item.get(key).and_then(Value::as_str).map(String::from),
        "date" => item_date(item).map(|date| date.format("%Y-%m-%d").to_string()),
        "year" => item_date(item).map(|date| date.year().to_string()),
        "month" => item_date(item).map(|date| format!("{:02}", date.month())),
        "day" => item_date(item).map(|date| format!("{:02}", date.day())),
        _ => match item.get("properties")?.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            value => Some(value.to_string()),
        },
    }
}

/// Returns the date of an item's `datetime` property.
pub fn item_date(item: &Item) -> Option<NaiveDate> {
    let datetime = item.get("properties")?.get("datetime")?.as_str()?;
    DateTime::parse_from_rfc3339(datetime)
        .map(|datetime| datetime.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(datetime.split('T').next()?, "%Y-%m-%d").ok())
}

impl Default for FilenameTemplate {
    fn default() -> Self {
        FilenameTemplate(DEFAULT_FILENAME_TEMPLATE.to_string())
    }
}

impl FromStr for FilenameTemplate {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FilenameTemplate(s.to_string()))
    }
}

impl Display for FilenameTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
