use satsearch::ResultSet;

const DEFAULT_FIELDS: [&str; 2] = ["date", "id"];

/// Renders one row per item with the requested fields, as fixed-width columns.
///
/// With no fields, prints each item's date and id.
pub fn render(result_set: &ResultSet, fields: &[String]) -> String {
    let fields: Vec<&str> = if fields.is_empty() {
        DEFAULT_FIELDS.to_vec()
    } else {
        fields.iter().map(String::as_str).collect()
    };
    let mut out = format!("Items ({}):\n", result_set.len());
    for field in &fields {
        out.push_str(&format!("{field:^20}"));
    }
    out.push('\n');
    for item in result_set.items() {
        for field in &fields {
            let value = satsearch_io::item_field(item, field).unwrap_or_default();
            out.push_str(&format!("{value:^20}"));
        }
        out.push('\n');
    }
    out
}
