//! # Aggregation Tests
//!
//! Summing parsed ingredient lines into a shopping list and presenting it.

use msosihub::aggregation::{aggregate, approx_eq, ShoppingList};
use msosihub::ingredient_model::IngredientLine;
use msosihub::ingredient_parser::{parse_ingredient_line, parse_ingredient_text};
use msosihub::presenter::{format_entry, present};

fn week_of(lines: &[&str], days: usize) -> Vec<IngredientLine> {
    (0..days)
        .flat_map(|_| lines.iter().map(|line| parse_ingredient_line(line)))
        .collect()
}

#[test]
fn test_week_of_rice_and_water() {
    let lines = week_of(&["2 cups rice", "1 cup water"], 7);
    let list = aggregate(&lines);

    assert_eq!(list.len(), 2);
    let totals = list.totals();
    assert!(approx_eq(totals["cups rice"], 14.0));
    assert!(approx_eq(totals["cup water"], 7.0));
}

#[test]
fn test_aggregation_is_order_insensitive() {
    let mut lines = parse_ingredient_text(
        "2 cups rice\n0.5 kg beef\n1 cup water\n1.25 kg beef\n3 cups rice\nsalt to taste\n0.1 kg beef",
    );
    let forward = aggregate(&lines);

    lines.reverse();
    let backward = aggregate(&lines);
    assert!(forward.same_totals(&backward));

    lines.rotate_left(3);
    let rotated = aggregate(&lines);
    assert!(forward.same_totals(&rotated));
    assert!(approx_eq(rotated.total("kg", "beef").unwrap(), 1.85));
}

#[test]
fn test_aggregating_concatenation_equals_merging() {
    let first = parse_ingredient_text("2 cups rice\n1 bunch sukuma wiki\n0.5 kg beef");
    let second = parse_ingredient_text("1 cups rice\n2 bunch sukuma wiki\n1 tsp salt");

    let combined: Vec<IngredientLine> = first.iter().chain(second.iter()).cloned().collect();
    let together = aggregate(&combined);

    let mut merged = aggregate(&first);
    merged.merge(&aggregate(&second));

    assert!(together.same_totals(&merged));
    assert_eq!(merged.total("bunch", "sukuma wiki"), Some(3.0));
}

#[test]
fn test_keys_match_case_insensitively() {
    let list = aggregate(&parse_ingredient_text("2 Cups Rice\n1 cups rice"));
    assert_eq!(list.len(), 1);
    assert_eq!(present(&list), vec!["3 Cups Rice"]);
}

#[test]
fn test_different_units_stay_apart() {
    let list = aggregate(&parse_ingredient_text("1 cup water\n2 cups water\n500 ml water"));
    assert_eq!(list.len(), 3);
}

#[test]
fn test_unquantified_lines_are_kept_aside() {
    let list = aggregate(&parse_ingredient_text("2 cups rice\na pinch of salt\npepper"));
    assert_eq!(list.len(), 1);
    assert_eq!(list.unquantified().len(), 2);
    assert_eq!(list.unquantified()[0].raw, "a pinch of salt");
}

#[test]
fn test_presented_entries_round_trip() {
    let list = aggregate(&parse_ingredient_text(
        "0.1 kg sugar\n0.2 kg sugar\n1/3 cup milk\n1/3 cup milk\n⅓ cup honey\n0.00004 kg saffron\n2 bunch sukuma wiki",
    ));

    for entry in list.entries() {
        let reparsed = parse_ingredient_line(&format_entry(entry));
        assert!(
            approx_eq(reparsed.quantity.unwrap(), entry.total),
            "{} reparsed as {:?}",
            entry.total,
            reparsed.quantity
        );
        assert_eq!(reparsed.unit.as_deref(), Some(entry.key.unit.as_str()));
        assert_eq!(reparsed.name, entry.key.name);
    }
}

#[test]
fn test_empty_input() {
    let list: ShoppingList = aggregate(&Vec::<IngredientLine>::new());
    assert!(list.is_empty());
    assert!(present(&list).is_empty());
}
