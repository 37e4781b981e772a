//! Shopping list presenter.
//!
//! Turns an aggregated [`ShoppingList`] into display strings of the form
//! `"{total} {unit} {name}"`. Order follows the aggregator's first-seen order.

use crate::aggregation::{ShoppingEntry, ShoppingList};

/// Decimal places kept when printing a total
///
/// Rounding here stays inside `QUANTITY_EPSILON`, so a printed total parses
/// back to the same amount. Float noise such as `0.1 + 0.2` still prints as
/// `0.3`.
const DISPLAY_PRECISION: usize = 9;

/// Format a quantity without trailing zeros: `14`, `0.5`, `0.3`
pub fn format_quantity(quantity: f64) -> String {
    let fixed = format!("{:.*}", DISPLAY_PRECISION, quantity);
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Format one entry, omitting the unit when it is empty
pub fn format_entry(entry: &ShoppingEntry) -> String {
    let total = format_quantity(entry.total);
    if entry.key.unit.is_empty() {
        format!("{} {}", total, entry.key.name)
    } else {
        format!("{} {} {}", total, entry.key.unit, entry.key.name)
    }
}

/// Present every summed entry
pub fn present(list: &ShoppingList) -> Vec<String> {
    list.entries().iter().map(format_entry).collect()
}

/// Present the lines that could not be totalled, as written in the recipe
pub fn present_unquantified(list: &ShoppingList) -> Vec<String> {
    list.unquantified().iter().map(|line| line.raw.clone()).collect()
}

/// Render the whole list as a plain-text bullet list
pub fn render_text(list: &ShoppingList, untotalled_heading: &str) -> String {
    let mut output = String::new();
    for line in present(list) {
        output.push_str(&format!("• {}\n", line));
    }

    let unquantified = present_unquantified(list);
    if !unquantified.is_empty() {
        output.push_str(&format!("\n{}\n", untotalled_heading));
        for line in unquantified {
            output.push_str(&format!("• {}\n", line));
        }
    }

    output
}
