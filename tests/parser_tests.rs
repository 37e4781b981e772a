//! # Ingredient Parser Tests
//!
//! Parsing of free-text recipe lines into quantity, unit and name.

use msosihub::ingredient_parser::{parse_ingredient_line, parse_ingredient_list, parse_quantity};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_lead_token_gives_quantity_and_name() {
        let cases = [
            ("2 cups sukuma wiki", 2.0, "cups", "sukuma wiki"),
            ("0.5 kg beef", 0.5, "kg", "beef"),
            ("3 tbsp cooking oil", 3.0, "tbsp", "cooking oil"),
            ("1 piece   red   onion", 1.0, "piece", "red onion"),
            ("250 ml coconut milk, tinned", 250.0, "ml", "coconut milk, tinned"),
        ];

        for (line, quantity, unit, name) in cases {
            let parsed = parse_ingredient_line(line);
            assert_eq!(parsed.quantity, Some(quantity), "quantity of {line:?}");
            assert_eq!(parsed.unit.as_deref(), Some(unit), "unit of {line:?}");
            assert_eq!(parsed.name, name, "name of {line:?}");
        }
    }

    #[test]
    fn test_fraction_quantities() {
        assert_eq!(parse_ingredient_line("1/2 cup sugar").quantity, Some(0.5));
        assert_eq!(parse_ingredient_line("½ tsp salt").quantity, Some(0.5));
        assert_eq!(parse_ingredient_line("1½ cups rice").quantity, Some(1.5));
        assert_eq!(parse_quantity("3/0"), None);
    }

    #[test]
    fn test_rejected_quantities() {
        assert_eq!(parse_quantity("-2"), None);
        assert_eq!(parse_quantity("NaN"), None);
        assert_eq!(parse_quantity("inf"), None);
        assert_eq!(parse_quantity("two"), None);
        assert_eq!(parse_quantity(""), None);
    }

    #[test]
    fn test_unreadable_quantity_keeps_name() {
        let parsed = parse_ingredient_line("some fresh dhania");
        assert_eq!(parsed.quantity, None);
        assert_eq!(parsed.unit.as_deref(), Some("fresh"));
        assert_eq!(parsed.name, "dhania");
        assert_eq!(parsed.raw, "some fresh dhania");
    }

    #[test]
    fn test_list_parsing_drops_empty_lines() {
        let parsed = parse_ingredient_list(["2 cups rice", "", "   ", "salt", "1 cup water"]);
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[1].name, "salt");
        assert!(!parsed[1].is_summable());
    }

    #[test]
    fn test_parser_is_deterministic() {
        let line = "2 cups maize flour";
        assert_eq!(parse_ingredient_line(line), parse_ingredient_line(line));
    }
}
