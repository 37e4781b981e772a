//! # MsosiHub Meal Plan Engine
//!
//! Turns a weekly meal plan into a consolidated shopping list and into
//! calendar, printable and shareable documents.
//!
//! Dishes are resolved to their recipe's ingredient lines through an
//! [`resolver::IngredientResolver`] (recipe API, PostgreSQL or in-memory),
//! parsed into `quantity unit name` triples and summed per unit and name.

pub mod aggregation;
pub mod circuit_breaker;
pub mod config;
pub mod db;
pub mod errors;
pub mod export;
pub mod ingredient_model;
pub mod ingredient_parser;
pub mod localization;
pub mod meal_plan;
pub mod notification;
pub mod planner;
pub mod presenter;
pub mod resolver;
