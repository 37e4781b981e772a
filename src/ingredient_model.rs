//! # Ingredient Line Data Model
//!
//! This module defines the structured form of a single free-text ingredient
//! line as stored on a recipe (e.g. "2 cups sukuma wiki").
//!
//! ## Core Concepts
//!
//! - **Quantity**: the leading number, absent when it could not be read
//! - **Unit**: the second token, whatever it is ("cups", "bunch", "kg")
//! - **Name**: every remaining token joined by a single space
//! - **Raw**: the trimmed original line, kept so unsummable lines can still be shown
//!
//! ## Usage
//!
//! ```rust
//! use msosihub::ingredient_model::IngredientLine;
//!
//! let rice = IngredientLine::quantified(2.0, "cups", "rice");
//! assert!(rice.is_summable());
//!
//! let salt = IngredientLine::named("salt to taste");
//! assert!(!salt.is_summable());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed ingredient line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientLine {
    /// Leading numeric amount, if the first token was a number
    pub quantity: Option<f64>,

    /// Unit token (second token of a "quantity unit name..." line)
    pub unit: Option<String>,

    /// Remaining tokens joined by single spaces
    pub name: String,

    /// The trimmed input line
    pub raw: String,
}

impl IngredientLine {
    /// Create a line that only carries a name (no quantity, no unit)
    pub fn named(name: &str) -> Self {
        Self {
            quantity: None,
            unit: None,
            name: name.to_string(),
            raw: name.to_string(),
        }
    }

    /// Create a fully quantified line
    pub fn quantified(quantity: f64, unit: &str, name: &str) -> Self {
        Self {
            quantity: Some(quantity),
            unit: Some(unit.to_string()),
            name: name.to_string(),
            raw: format!("{} {} {}", quantity, unit, name),
        }
    }

    /// Override the raw text this line was parsed from
    pub fn with_raw(mut self, raw: &str) -> Self {
        self.raw = raw.to_string();
        self
    }

    /// Whether this line can contribute to a numeric total
    pub fn is_summable(&self) -> bool {
        self.quantity.is_some()
    }

    /// Whether the line carries no information at all
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.quantity.is_none() && self.unit.is_none()
    }

    /// Unit as a string slice, empty when absent
    pub fn unit_str(&self) -> &str {
        self.unit.as_deref().unwrap_or("")
    }
}

impl fmt::Display for IngredientLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quantity {
            Some(quantity) if self.unit_str().is_empty() => write!(f, "{} {}", quantity, self.name),
            Some(quantity) => write!(f, "{} {} {}", quantity, self.unit_str(), self.name),
            None => write!(f, "{}", self.raw),
        }
    }
}
