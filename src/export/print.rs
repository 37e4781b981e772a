//! Printable meal plan.
//!
//! Days appear in week order, each with its assigned meals as
//! `Category: Dish`. Days and slots with nothing assigned are left out.

use html_escape::encode_text;

use crate::meal_plan::MealPlan;

/// HTML document ready for a browser's print dialog
pub fn render_print_html(plan: &MealPlan, title: &str) -> String {
    let mut html = String::new();
    html.push_str(&format!("<h1>{}</h1>\n", encode_text(title)));

    for (day, meals) in plan.days() {
        html.push_str(&format!("<h2>{}</h2>\n<ul>\n", day));
        for (category, dish) in meals {
            html.push_str(&format!(
                "  <li>{}: {}</li>\n",
                category,
                encode_text(dish.as_str())
            ));
        }
        html.push_str("</ul>\n");
    }

    html
}

/// Plain-text variant for terminals and messages
pub fn render_print_text(plan: &MealPlan, title: &str) -> String {
    let mut text = format!("{}\n", title);

    for (day, meals) in plan.days() {
        text.push_str(&format!("\n{}\n", day));
        for (category, dish) in meals {
            text.push_str(&format!("  • {}: {}\n", category, dish));
        }
    }

    text
}
