//! # Meal Plan Model
//!
//! A meal plan maps each day of the week to at most one dish per meal
//! category. Day and category are closed enumerations; a slot either holds a
//! non-empty dish name or is absent.
//!
//! Plans arriving from outside (saved JSON, user files) go through
//! [`MealPlan::from_value_lenient`], which drops unknown keys and empty dishes
//! instead of failing the whole plan.
//!
//! ```rust
//! use msosihub::meal_plan::{DayOfWeek, DishName, MealCategory, MealPlan};
//!
//! let mut plan = MealPlan::new();
//! plan.assign(DayOfWeek::Monday, MealCategory::Breakfast, DishName::new("Ugali").unwrap());
//! assert_eq!(plan.filled_slots(), 1);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Days of the week, in canonical Monday-first order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    /// Position in the canonical week, Monday = 0
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayOfWeek {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DayOfWeek::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

/// Meal categories, in the order they are eaten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MealCategory {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealCategory {
    pub const ALL: [MealCategory; 4] = [
        MealCategory::Breakfast,
        MealCategory::Lunch,
        MealCategory::Dinner,
        MealCategory::Snack,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MealCategory::Breakfast => "Breakfast",
            MealCategory::Lunch => "Lunch",
            MealCategory::Dinner => "Dinner",
            MealCategory::Snack => "Snack",
        }
    }
}

impl fmt::Display for MealCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealCategory {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MealCategory::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

/// A day or category key outside the closed enumerations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKey(pub String);

impl fmt::Display for UnknownKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown meal plan key: {}", self.0)
    }
}

impl std::error::Error for UnknownKey {}

/// Name of a dish assigned to a slot; never empty
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DishName(String);

impl DishName {
    /// Create a dish name, rejecting empty or whitespace-only input
    pub fn new(name: &str) -> Result<Self, EmptyDishName> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(EmptyDishName);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DishName {
    type Error = EmptyDishName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DishName::new(&value)
    }
}

impl From<DishName> for String {
    fn from(value: DishName) -> Self {
        value.0
    }
}

impl fmt::Display for DishName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyDishName;

impl fmt::Display for EmptyDishName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dish name cannot be empty")
    }
}

impl std::error::Error for EmptyDishName {}

/// One (day, category) cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub day: DayOfWeek,
    pub category: MealCategory,
}

impl Slot {
    pub fn new(day: DayOfWeek, category: MealCategory) -> Self {
        Self { day, category }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day, self.category)
    }
}

/// A single-slot change to a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotEdit {
    Assign(Slot, DishName),
    Clear(Slot),
}

impl SlotEdit {
    pub fn slot(&self) -> Slot {
        match self {
            SlotEdit::Assign(slot, _) | SlotEdit::Clear(slot) => *slot,
        }
    }
}

/// Weekly meal plan: day -> category -> dish
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MealPlan {
    days: BTreeMap<DayOfWeek, BTreeMap<MealCategory, DishName>>,
}

impl MealPlan {
    /// Create an empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a dish in a slot, returning the dish it replaced
    pub fn assign(&mut self, day: DayOfWeek, category: MealCategory, dish: DishName) -> Option<DishName> {
        self.days.entry(day).or_default().insert(category, dish)
    }

    /// Empty a slot, returning the dish it held
    pub fn clear(&mut self, day: DayOfWeek, category: MealCategory) -> Option<DishName> {
        let meals = self.days.get_mut(&day)?;
        let removed = meals.remove(&category);
        if meals.is_empty() {
            self.days.remove(&day);
        }
        removed
    }

    /// Apply one edit, returning the dish the slot held before
    pub fn apply(&mut self, edit: SlotEdit) -> Option<DishName> {
        match edit {
            SlotEdit::Assign(slot, dish) => self.assign(slot.day, slot.category, dish),
            SlotEdit::Clear(slot) => self.clear(slot.day, slot.category),
        }
    }

    pub fn dish(&self, day: DayOfWeek, category: MealCategory) -> Option<&DishName> {
        self.days.get(&day)?.get(&category)
    }

    /// Populated slots in canonical day then category order
    pub fn slots(&self) -> impl Iterator<Item = (Slot, &DishName)> + '_ {
        self.days.iter().flat_map(|(&day, meals)| {
            meals
                .iter()
                .map(move |(&category, dish)| (Slot::new(day, category), dish))
        })
    }

    /// Days that have at least one dish, with their meals
    pub fn days(&self) -> impl Iterator<Item = (DayOfWeek, &BTreeMap<MealCategory, DishName>)> + '_ {
        self.days
            .iter()
            .filter(|(_, meals)| !meals.is_empty())
            .map(|(&day, meals)| (day, meals))
    }

    pub fn filled_slots(&self) -> usize {
        self.days.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.filled_slots() == 0
    }

    /// Decode a plan from untrusted JSON, dropping anything that does not fit
    ///
    /// Returns the plan and the paths of the keys that were ignored.
    pub fn from_value_lenient(value: &Value) -> (MealPlan, Vec<String>) {
        let mut plan = MealPlan::new();
        let mut ignored = Vec::new();

        let Some(days) = value.as_object() else {
            if !value.is_null() {
                ignored.push("<root>".to_string());
            }
            return (plan, ignored);
        };

        for (day_key, meals) in days {
            let Ok(day) = day_key.parse::<DayOfWeek>() else {
                ignored.push(day_key.clone());
                continue;
            };
            let Some(meals) = meals.as_object() else {
                if !meals.is_null() {
                    ignored.push(day_key.clone());
                }
                continue;
            };

            for (category_key, dish) in meals {
                let path = format!("{}.{}", day_key, category_key);
                let Ok(category) = category_key.parse::<MealCategory>() else {
                    ignored.push(path);
                    continue;
                };
                match dish.as_str().map(DishName::new) {
                    Some(Ok(dish)) => {
                        plan.assign(day, category, dish);
                    }
                    // An empty string is how a cleared slot is stored
                    Some(Err(_)) => {}
                    None if dish.is_null() => {}
                    None => ignored.push(path),
                }
            }
        }

        if !ignored.is_empty() {
            warn!(ignored = ?ignored, "Ignored unrecognized meal plan entries");
        }

        (plan, ignored)
    }

    /// Pretty JSON in the `{ "Monday": { "Breakfast": "Ugali" } }` shape
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// A plan as persisted for a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedMealPlan {
    pub id: i64,
    pub user_id: String,
    pub plan: MealPlan,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dish(name: &str) -> DishName {
        DishName::new(name).unwrap()
    }

    #[test]
    fn test_day_order_and_index() {
        assert_eq!(DayOfWeek::Monday.index(), 0);
        assert_eq!(DayOfWeek::Sunday.index(), 6);
        assert!(DayOfWeek::Monday < DayOfWeek::Tuesday);
        assert_eq!("friday".parse::<DayOfWeek>().unwrap(), DayOfWeek::Friday);
        assert!("Funday".parse::<DayOfWeek>().is_err());
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("Snack".parse::<MealCategory>().unwrap(), MealCategory::Snack);
        assert!("Brunch".parse::<MealCategory>().is_err());
    }

    #[test]
    fn test_dish_name_rejects_blank() {
        assert!(DishName::new("").is_err());
        assert!(DishName::new("   ").is_err());
        assert_eq!(dish("  Pilau ").as_str(), "Pilau");
    }

    #[test]
    fn test_assign_replaces_exactly_one_slot() {
        let mut plan = MealPlan::new();
        assert!(plan.assign(DayOfWeek::Monday, MealCategory::Lunch, dish("Githeri")).is_none());
        plan.assign(DayOfWeek::Monday, MealCategory::Dinner, dish("Ugali"));

        let previous = plan.assign(DayOfWeek::Monday, MealCategory::Lunch, dish("Pilau"));
        assert_eq!(previous, Some(dish("Githeri")));
        assert_eq!(plan.dish(DayOfWeek::Monday, MealCategory::Lunch), Some(&dish("Pilau")));
        assert_eq!(plan.dish(DayOfWeek::Monday, MealCategory::Dinner), Some(&dish("Ugali")));
        assert_eq!(plan.filled_slots(), 2);
    }

    #[test]
    fn test_clear_removes_empty_day() {
        let mut plan = MealPlan::new();
        plan.assign(DayOfWeek::Friday, MealCategory::Snack, dish("Mandazi"));
        assert_eq!(plan.clear(DayOfWeek::Friday, MealCategory::Snack), Some(dish("Mandazi")));
        assert!(plan.is_empty());
        assert_eq!(plan.to_json_pretty().unwrap(), "{}");
    }

    #[test]
    fn test_apply_edits_touch_one_slot() {
        let mut plan = MealPlan::new();
        plan.assign(DayOfWeek::Monday, MealCategory::Breakfast, dish("Uji"));

        let lunch = Slot::new(DayOfWeek::Monday, MealCategory::Lunch);
        assert_eq!(plan.apply(SlotEdit::Assign(lunch, dish("Githeri"))), None);
        assert_eq!(plan.apply(SlotEdit::Assign(lunch, dish("Pilau"))), Some(dish("Githeri")));
        assert_eq!(plan.apply(SlotEdit::Clear(lunch)), Some(dish("Pilau")));
        assert_eq!(plan.apply(SlotEdit::Clear(lunch)), None);

        assert_eq!(plan.filled_slots(), 1);
        assert_eq!(plan.dish(DayOfWeek::Monday, MealCategory::Breakfast), Some(&dish("Uji")));
        assert_eq!(SlotEdit::Clear(lunch).slot(), lunch);
    }

    #[test]
    fn test_editing_a_clone_leaves_the_source_alone() {
        let mut saved = MealPlan::new();
        saved.assign(DayOfWeek::Friday, MealCategory::Dinner, dish("Nyama Choma"));

        let mut draft = saved.clone();
        draft.apply(SlotEdit::Assign(
            Slot::new(DayOfWeek::Saturday, MealCategory::Snack),
            dish("Mandazi"),
        ));
        draft.apply(SlotEdit::Clear(Slot::new(DayOfWeek::Friday, MealCategory::Dinner)));

        assert_eq!(saved.filled_slots(), 1);
        assert_eq!(draft.filled_slots(), 1);
        assert!(draft.dish(DayOfWeek::Friday, MealCategory::Dinner).is_none());
    }

    #[test]
    fn test_slots_are_in_canonical_order() {
        let mut plan = MealPlan::new();
        plan.assign(DayOfWeek::Sunday, MealCategory::Breakfast, dish("Chai"));
        plan.assign(DayOfWeek::Monday, MealCategory::Dinner, dish("Ugali"));
        plan.assign(DayOfWeek::Monday, MealCategory::Breakfast, dish("Uji"));

        let order: Vec<Slot> = plan.slots().map(|(slot, _)| slot).collect();
        assert_eq!(
            order,
            vec![
                Slot::new(DayOfWeek::Monday, MealCategory::Breakfast),
                Slot::new(DayOfWeek::Monday, MealCategory::Dinner),
                Slot::new(DayOfWeek::Sunday, MealCategory::Breakfast),
            ]
        );
    }

    #[test]
    fn test_json_shape() {
        let mut plan = MealPlan::new();
        plan.assign(DayOfWeek::Monday, MealCategory::Breakfast, dish("Ugali"));

        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value, json!({ "Monday": { "Breakfast": "Ugali" } }));

        let decoded: MealPlan = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, plan);
    }

    #[test]
    fn test_strict_decoding_rejects_unknown_keys() {
        let result: Result<MealPlan, _> = serde_json::from_value(json!({ "Someday": {} }));
        assert!(result.is_err());
        let result: Result<MealPlan, _> = serde_json::from_value(json!({ "Monday": { "Lunch": "" } }));
        assert!(result.is_err());
    }

    #[test]
    fn test_lenient_decoding_ignores_unknown_keys() {
        let value = json!({
            "Monday": { "Breakfast": "Ugali", "Brunch": "Chapati", "Lunch": "" },
            "Someday": { "Dinner": "Nyama Choma" },
            "Tuesday": { "Dinner": 42, "Snack": null },
            "Wednesday": null
        });

        let (plan, ignored) = MealPlan::from_value_lenient(&value);
        assert_eq!(plan.filled_slots(), 1);
        assert_eq!(plan.dish(DayOfWeek::Monday, MealCategory::Breakfast), Some(&dish("Ugali")));
        assert!(ignored.contains(&"Monday.Brunch".to_string()));
        assert!(ignored.contains(&"Someday".to_string()));
        assert!(ignored.contains(&"Tuesday.Dinner".to_string()));
        assert_eq!(ignored.len(), 3);
    }
}
