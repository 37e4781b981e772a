//! # Quantity Aggregator
//!
//! Folds parsed ingredient lines into a [`ShoppingList`], summing quantities
//! that share the same unit and name.
//!
//! Keys are compared after normalization: unit and name are lowercased, so
//! "2 Cups Rice" and "1 cups rice" land on the same entry. The spelling that
//! was seen first is the one kept for display.
//!
//! Lines without a numeric quantity cannot be summed. They are not counted in
//! any total, but they are kept in [`ShoppingList::unquantified`] so callers can
//! still show them and report how many ingredients could not be totalled.
//!
//! Totals are `f64`; compare them with [`approx_eq`].

use crate::ingredient_model::IngredientLine;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Absolute tolerance used when comparing aggregated quantities
pub const QUANTITY_EPSILON: f64 = 1e-9;

/// Compare two quantities within [`QUANTITY_EPSILON`]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= QUANTITY_EPSILON
}

/// Display form of a shopping-list key: `unit` and `name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ShoppingKey {
    pub unit: String,
    pub name: String,
}

impl ShoppingKey {
    pub fn new(unit: &str, name: &str) -> Self {
        Self {
            unit: unit.to_string(),
            name: name.to_string(),
        }
    }

    fn normalized(&self) -> NormalizedKey {
        NormalizedKey::new(&self.unit, &self.name)
    }
}

impl fmt::Display for ShoppingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.unit, self.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NormalizedKey {
    unit: String,
    name: String,
}

impl NormalizedKey {
    fn new(unit: &str, name: &str) -> Self {
        Self {
            unit: normalize_token(unit),
            name: normalize_token(name),
        }
    }
}

fn normalize_token(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// One consolidated shopping-list line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingEntry {
    pub key: ShoppingKey,
    pub total: f64,
    /// How many ingredient lines contributed to the total
    pub occurrences: usize,
}

/// Consolidated shopping list, in first-seen order
#[derive(Debug, Clone, Default, Serialize)]
pub struct ShoppingList {
    entries: Vec<ShoppingEntry>,
    #[serde(skip)]
    index: HashMap<NormalizedKey, usize>,
    unquantified: Vec<IngredientLine>,
}

impl ShoppingList {
    /// Create an empty shopping list
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one parsed line into the running totals
    pub fn add_line(&mut self, line: &IngredientLine) {
        match line.quantity {
            Some(quantity) => {
                let key = ShoppingKey::new(line.unit_str(), &line.name);
                self.add_amount(key, quantity, 1);
            }
            None if line.is_empty() => {}
            None => self.unquantified.push(line.clone()),
        }
    }

    /// Add an amount under a key, creating the entry at zero when new
    pub fn add_amount(&mut self, key: ShoppingKey, amount: f64, occurrences: usize) {
        let normalized = key.normalized();
        match self.index.get(&normalized) {
            Some(&position) => {
                let entry = &mut self.entries[position];
                entry.total += amount;
                entry.occurrences += occurrences;
            }
            None => {
                self.index.insert(normalized, self.entries.len());
                self.entries.push(ShoppingEntry {
                    key,
                    total: amount,
                    occurrences,
                });
            }
        }
    }

    /// Key-wise sum of another list into this one
    pub fn merge(&mut self, other: &ShoppingList) {
        for entry in &other.entries {
            self.add_amount(entry.key.clone(), entry.total, entry.occurrences);
        }
        self.unquantified.extend(other.unquantified.iter().cloned());
    }

    /// Total for a unit/name pair, compared after normalization
    pub fn total(&self, unit: &str, name: &str) -> Option<f64> {
        self.index
            .get(&NormalizedKey::new(unit, name))
            .map(|&position| self.entries[position].total)
    }

    /// Totals keyed by the displayed `"unit name"` string
    pub fn totals(&self) -> HashMap<String, f64> {
        self.entries
            .iter()
            .map(|entry| (entry.key.to_string(), entry.total))
            .collect()
    }

    pub fn entries(&self) -> &[ShoppingEntry] {
        &self.entries
    }

    /// Lines that could not be summed because their quantity was unreadable
    pub fn unquantified(&self) -> &[IngredientLine] {
        &self.unquantified
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether both lists hold the same totals, ignoring order
    pub fn same_totals(&self, other: &ShoppingList) -> bool {
        self.len() == other.len()
            && self.entries.iter().all(|entry| {
                other
                    .total(&entry.key.unit, &entry.key.name)
                    .is_some_and(|total| approx_eq(total, entry.total))
            })
    }
}

/// Aggregate parsed lines into a shopping list
pub fn aggregate<'a, I>(lines: I) -> ShoppingList
where
    I: IntoIterator<Item = &'a IngredientLine>,
{
    let mut list = ShoppingList::new();
    for line in lines {
        list.add_line(line);
    }
    list
}
