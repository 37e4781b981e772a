//! # Ingredient Line Parser
//!
//! This module turns free-text ingredient lines into [`IngredientLine`] values.
//!
//! A line is split on whitespace. With at least three tokens it is read as
//! `quantity unit name...`; the first token becomes the quantity when it is a
//! number, the second the unit, and the rest the name. Shorter lines are kept
//! as name-only entries so they can still be shown to the user, but they never
//! contribute to a numeric total.
//!
//! Parsing never fails: anything that does not look like a number simply
//! leaves the quantity absent.
//!
//! ## Usage
//!
//! ```rust
//! use msosihub::ingredient_parser::parse_ingredient_line;
//!
//! let line = parse_ingredient_line("2 cups sukuma wiki");
//! assert_eq!(line.quantity, Some(2.0));
//! assert_eq!(line.unit.as_deref(), Some("cups"));
//! assert_eq!(line.name, "sukuma wiki");
//! ```

use crate::ingredient_model::IngredientLine;
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

/// Minimum token count for the "quantity unit name..." shape
pub const MIN_STRUCTURED_TOKENS: usize = 3;

static QUANTITY_PATTERNS: LazyLock<QuantityPatterns> = LazyLock::new(QuantityPatterns::new);

/// Compiled regex patterns for quantity tokens
struct QuantityPatterns {
    /// Matches fractions: "1/2", "3⁄4"
    fraction: Regex,
    /// Matches vulgar fractions with an optional whole part: "½", "1½"
    vulgar: Regex,
}

impl QuantityPatterns {
    fn new() -> Self {
        Self {
            fraction: Regex::new(r"^(\d+)[⁄/](\d+)$").expect("fraction pattern should be valid"),
            vulgar: Regex::new(r"^(\d*)([½⅓⅔¼¾⅕⅖⅗⅘⅙⅚⅛⅜⅝⅞])$")
                .expect("vulgar fraction pattern should be valid"),
        }
    }
}

/// Parse a block of text, one ingredient per line
pub fn parse_ingredient_text(text: &str) -> Vec<IngredientLine> {
    parse_ingredient_list(text.lines())
}

/// Parse a sequence of raw ingredient lines, dropping empty ones
pub fn parse_ingredient_list<I, S>(lines: I) -> Vec<IngredientLine>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .map(|line| parse_ingredient_line(line.as_ref()))
        .filter(|line| !line.is_empty())
        .collect()
}

/// Parse a single ingredient line
pub fn parse_ingredient_line(line: &str) -> IngredientLine {
    let raw = line.trim();
    let tokens: Vec<&str> = raw.split_whitespace().collect();

    if tokens.len() < MIN_STRUCTURED_TOKENS {
        trace!(line = raw, tokens = tokens.len(), "Line is not quantity/unit/name shaped");
        return IngredientLine::named(&tokens.join(" ")).with_raw(raw);
    }

    let quantity = parse_quantity(tokens[0]);
    if quantity.is_none() {
        trace!(line = raw, token = tokens[0], "Leading token is not a number");
    }

    IngredientLine {
        quantity,
        unit: Some(tokens[1].to_string()),
        name: tokens[2..].join(" "),
        raw: raw.to_string(),
    }
}

/// Parse a quantity token into a non-negative finite number
pub fn parse_quantity(token: &str) -> Option<f64> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    if let Ok(amount) = token.parse::<f64>() {
        return non_negative(amount);
    }

    if let Some(captures) = QUANTITY_PATTERNS.fraction.captures(token) {
        let numerator: f64 = captures[1].parse().ok()?;
        let denominator: f64 = captures[2].parse().ok()?;
        if denominator == 0.0 {
            return None;
        }
        return non_negative(numerator / denominator);
    }

    if let Some(captures) = QUANTITY_PATTERNS.vulgar.captures(token) {
        let whole: f64 = match &captures[1] {
            "" => 0.0,
            digits => digits.parse().ok()?,
        };
        let fraction = vulgar_fraction_value(captures[2].chars().next()?)?;
        return non_negative(whole + fraction);
    }

    None
}

fn non_negative(amount: f64) -> Option<f64> {
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }
    // -0.0 would otherwise print as "-0"
    Some(if amount == 0.0 { 0.0 } else { amount })
}

fn vulgar_fraction_value(c: char) -> Option<f64> {
    let (numerator, denominator) = match c {
        '½' => (1.0, 2.0),
        '⅓' => (1.0, 3.0),
        '⅔' => (2.0, 3.0),
        '¼' => (1.0, 4.0),
        '¾' => (3.0, 4.0),
        '⅕' => (1.0, 5.0),
        '⅖' => (2.0, 5.0),
        '⅗' => (3.0, 5.0),
        '⅘' => (4.0, 5.0),
        '⅙' => (1.0, 6.0),
        '⅚' => (5.0, 6.0),
        '⅛' => (1.0, 8.0),
        '⅜' => (3.0, 8.0),
        '⅝' => (5.0, 8.0),
        '⅞' => (7.0, 8.0),
        _ => return None,
    };
    Some(numerator / denominator)
}
