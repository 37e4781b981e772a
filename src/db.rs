//! # Database Module
//!
//! PostgreSQL persistence for recipes and saved meal plans.
//!
//! Meal plans are stored as JSONB in the `{ "Monday": { "Breakfast": "Ugali" } }`
//! shape and decoded leniently on the way out, so a row written by an older
//! client with stray keys still loads.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use crate::errors::ResolveError;
use crate::meal_plan::{DishName, MealPlan, SavedMealPlan};
use crate::resolver::IngredientResolver;

/// A stored recipe's lookup fields
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: i64,
    pub recipe_name: String,
    pub category: Option<String>,
    pub ingredients: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS recipes (
            id BIGSERIAL PRIMARY KEY,
            recipe_name VARCHAR(255) NOT NULL UNIQUE,
            category VARCHAR(100),
            ingredients TEXT[] NOT NULL DEFAULT '{}',
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create recipes table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS meal_plans (
            id BIGSERIAL PRIMARY KEY,
            user_id VARCHAR(255) NOT NULL,
            meal_plan JSONB NOT NULL DEFAULT '{}',
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMPTZ
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create meal_plans table")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS meal_plans_user_created_idx
         ON meal_plans (user_id, created_at DESC)",
    )
    .execute(pool)
    .await
    .context("Failed to create meal_plans index")?;

    info!("Database schema initialized successfully");
    Ok(())
}

fn recipe_from_row(row: &PgRow) -> Result<Recipe> {
    Ok(Recipe {
        id: row.try_get("id")?,
        recipe_name: row.try_get("recipe_name")?,
        category: row.try_get("category")?,
        ingredients: row.try_get("ingredients")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Create a recipe, returning its ID
pub async fn create_recipe(
    pool: &PgPool,
    recipe_name: &str,
    category: Option<&str>,
    ingredients: &[String],
) -> Result<i64> {
    info!(recipe = recipe_name, ingredients = ingredients.len(), "Creating recipe");

    let row = sqlx::query(
        "INSERT INTO recipes (recipe_name, category, ingredients) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(recipe_name)
    .bind(category)
    .bind(ingredients)
    .fetch_one(pool)
    .await
    .with_context(|| format!("Failed to create recipe {recipe_name}"))?;

    Ok(row.get("id"))
}

/// Read a recipe by exact name
pub async fn read_recipe(pool: &PgPool, recipe_name: &str) -> Result<Option<Recipe>> {
    let row = sqlx::query(
        "SELECT id, recipe_name, category, ingredients, created_at FROM recipes WHERE recipe_name = $1",
    )
    .bind(recipe_name)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to read recipe {recipe_name}"))?;

    row.as_ref().map(recipe_from_row).transpose()
}

/// Recipes to choose a dish from, by name
///
/// `category` matches case-insensitively; `None` lists every recipe.
pub async fn list_recipes(pool: &PgPool, category: Option<&str>) -> Result<Vec<Recipe>> {
    let rows = sqlx::query(
        "SELECT id, recipe_name, category, ingredients, created_at FROM recipes
         WHERE $1::TEXT IS NULL OR LOWER(category) = LOWER($1)
         ORDER BY recipe_name",
    )
    .bind(category)
    .fetch_all(pool)
    .await
    .context("Failed to list recipes")?;

    debug!(category = category.unwrap_or("all"), count = rows.len(), "Listed recipes");
    rows.iter().map(recipe_from_row).collect()
}

/// Ingredient lines of the recipe with this exact name
pub async fn get_recipe_ingredients(pool: &PgPool, recipe_name: &str) -> Result<Option<Vec<String>>, sqlx::Error> {
    let row = sqlx::query("SELECT ingredients FROM recipes WHERE recipe_name = $1")
        .bind(recipe_name)
        .fetch_optional(pool)
        .await?;

    row.map(|row| row.try_get("ingredients")).transpose()
}

fn saved_plan_from_row(row: &PgRow) -> Result<SavedMealPlan> {
    let Json(value): Json<Value> = row.try_get("meal_plan")?;
    let (plan, _ignored) = MealPlan::from_value_lenient(&value);

    Ok(SavedMealPlan {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        plan,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Save a new meal plan for a user, returning its ID
pub async fn create_meal_plan(pool: &PgPool, user_id: &str, plan: &MealPlan) -> Result<i64> {
    info!(user_id, slots = plan.filled_slots(), "Saving meal plan");

    let row = sqlx::query("INSERT INTO meal_plans (user_id, meal_plan) VALUES ($1, $2) RETURNING id")
        .bind(user_id)
        .bind(Json(plan))
        .fetch_one(pool)
        .await
        .context("Failed to save meal plan")?;

    let id: i64 = row.get("id");
    debug!(id, "Meal plan saved");
    Ok(id)
}

/// A user's most recent plans, newest first
pub async fn list_recent_meal_plans(pool: &PgPool, user_id: &str, limit: i64) -> Result<Vec<SavedMealPlan>> {
    let rows = sqlx::query(
        "SELECT id, user_id, meal_plan, created_at, updated_at FROM meal_plans
         WHERE user_id = $1
         ORDER BY created_at DESC, id DESC
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit.max(0))
    .fetch_all(pool)
    .await
    .context("Failed to list meal plans")?;

    rows.iter().map(saved_plan_from_row).collect()
}

/// Read a meal plan by ID
pub async fn read_meal_plan(pool: &PgPool, plan_id: i64) -> Result<Option<SavedMealPlan>> {
    let row = sqlx::query(
        "SELECT id, user_id, meal_plan, created_at, updated_at FROM meal_plans WHERE id = $1",
    )
    .bind(plan_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read meal plan")?;

    row.as_ref().map(saved_plan_from_row).transpose()
}

/// Replace a plan owned by `user_id`
///
/// Returns `None` when no plan with that ID belongs to the user.
pub async fn update_meal_plan(
    pool: &PgPool,
    plan_id: i64,
    user_id: &str,
    plan: &MealPlan,
) -> Result<Option<SavedMealPlan>> {
    info!(plan_id, user_id, "Updating meal plan");

    let row = sqlx::query(
        "UPDATE meal_plans SET meal_plan = $1, updated_at = CURRENT_TIMESTAMP
         WHERE id = $2 AND user_id = $3
         RETURNING id, user_id, meal_plan, created_at, updated_at",
    )
    .bind(Json(plan))
    .bind(plan_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to update meal plan")?;

    row.as_ref().map(saved_plan_from_row).transpose()
}

/// Delete a plan owned by `user_id`
pub async fn delete_meal_plan(pool: &PgPool, plan_id: i64, user_id: &str) -> Result<bool> {
    info!(plan_id, user_id, "Deleting meal plan");

    let result = sqlx::query("DELETE FROM meal_plans WHERE id = $1 AND user_id = $2")
        .bind(plan_id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to delete meal plan")?;

    Ok(result.rows_affected() > 0)
}

/// Resolver reading the recipes table directly
#[derive(Debug, Clone)]
pub struct PgIngredientResolver {
    pool: PgPool,
}

impl PgIngredientResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IngredientResolver for PgIngredientResolver {
    async fn resolve_ingredients(&self, dish: &DishName) -> Result<Vec<String>, ResolveError> {
        get_recipe_ingredients(&self.pool, dish.as_str())
            .await?
            .ok_or_else(|| ResolveError::NotFound(dish.to_string()))
    }
}
