//! # Dish Ingredient Resolver
//!
//! Maps a dish name to the raw ingredient lines stored on its recipe. The
//! planner only sees the [`IngredientResolver`] trait; backends are:
//!
//! - [`InMemoryResolver`]: a fixed recipe table, for tests and offline use
//! - [`HttpIngredientResolver`]: the recipe API (`GET /api/recipes/ingredients`)
//! - `PgIngredientResolver` in [`crate::db`]: the recipes table directly
//!
//! Dish names match recipe names exactly.

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::config::RecoveryConfig;
use crate::errors::ResolveError;
use crate::meal_plan::DishName;

/// Source of ingredient lines for a dish
#[async_trait]
pub trait IngredientResolver: Send + Sync {
    /// Ordered raw ingredient lines, or `NotFound` when no recipe matches
    async fn resolve_ingredients(&self, dish: &DishName) -> Result<Vec<String>, ResolveError>;
}

/// Resolver backed by an in-memory recipe table
#[derive(Debug, Clone, Default)]
pub struct InMemoryResolver {
    recipes: HashMap<String, Vec<String>>,
}

impl InMemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a recipe
    pub fn with_recipe<S: AsRef<str>>(mut self, dish: &str, ingredients: &[S]) -> Self {
        self.insert(dish, ingredients);
        self
    }

    pub fn insert<S: AsRef<str>>(&mut self, dish: &str, ingredients: &[S]) {
        self.recipes.insert(
            dish.to_string(),
            ingredients.iter().map(|line| line.as_ref().to_string()).collect(),
        );
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

#[async_trait]
impl IngredientResolver for InMemoryResolver {
    async fn resolve_ingredients(&self, dish: &DishName) -> Result<Vec<String>, ResolveError> {
        self.recipes
            .get(dish.as_str())
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(dish.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct IngredientsResponse {
    #[serde(default)]
    ingredients: Option<Vec<String>>,
}

/// Interpret a response from the ingredients endpoint
///
/// A body without an `ingredients` field is an empty list.
pub fn parse_ingredients_response(dish: &str, status: u16, body: &str) -> Result<Vec<String>, ResolveError> {
    match status {
        404 => Err(ResolveError::NotFound(dish.to_string())),
        200..=299 => {
            let response: IngredientsResponse = serde_json::from_str(body)
                .map_err(|e| ResolveError::Decode(format!("{dish}: {e}")))?;
            Ok(response.ingredients.unwrap_or_default())
        }
        other => Err(ResolveError::Http(format!("{dish}: status {other}"))),
    }
}

/// Delay before retry number `attempt` (0-based): exponential, capped, with jitter
pub fn retry_delay(config: &RecoveryConfig, attempt: u32) -> Duration {
    let exponential = config
        .base_retry_delay_ms
        .saturating_mul(1u64 << attempt.min(16))
        .min(config.max_retry_delay_ms);
    let jitter_cap = config.base_retry_delay_ms / 2;
    let jitter = if jitter_cap > 0 {
        rand::thread_rng().gen_range(0..=jitter_cap)
    } else {
        0
    };
    Duration::from_millis(exponential.saturating_add(jitter).min(config.max_retry_delay_ms))
}

/// Resolver that calls the recipe API
pub struct HttpIngredientResolver {
    client: Client,
    endpoint: String,
    recovery: RecoveryConfig,
    breaker: CircuitBreaker,
}

impl HttpIngredientResolver {
    /// Create a resolver for the API at `api_url` (e.g. `http://localhost:5000`)
    pub fn new(api_url: &str, recovery: RecoveryConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(recovery.operation_timeout())
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/recipes/ingredients", api_url.trim_end_matches('/')),
            breaker: CircuitBreaker::new(&recovery),
            recovery,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_once(&self, dish: &DishName) -> Result<Vec<String>, ResolveError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("recipeName", dish.as_str())])
            .send()
            .await
            .map_err(|e| transport_error(dish, e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| transport_error(dish, e))?;
        parse_ingredients_response(dish.as_str(), status, &body)
    }
}

fn transport_error(dish: &DishName, err: reqwest::Error) -> ResolveError {
    if err.is_timeout() {
        ResolveError::Timeout(format!("{dish}: {err}"))
    } else {
        ResolveError::Http(format!("{dish}: {err}"))
    }
}

#[async_trait]
impl IngredientResolver for HttpIngredientResolver {
    async fn resolve_ingredients(&self, dish: &DishName) -> Result<Vec<String>, ResolveError> {
        if self.breaker.is_open() {
            warn!(dish = %dish, "Recipe API circuit is open, skipping lookup");
            return Err(ResolveError::CircuitOpen(dish.to_string()));
        }

        let mut attempt = 0;
        loop {
            match self.fetch_once(dish).await {
                Ok(lines) => {
                    self.breaker.record_success();
                    debug!(dish = %dish, lines = lines.len(), "Fetched ingredients");
                    return Ok(lines);
                }
                Err(err @ ResolveError::NotFound(_)) => {
                    self.breaker.record_success();
                    return Err(err);
                }
                Err(err) if err.is_transient() => {
                    self.breaker.record_failure();
                    if attempt >= self.recovery.max_retries || self.breaker.is_open() {
                        return Err(err);
                    }
                    let delay = retry_delay(&self.recovery, attempt);
                    warn!(dish = %dish, attempt = attempt + 1, delay_ms = delay.as_millis() as u64, error = %err, "Retrying ingredient lookup");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dish(name: &str) -> DishName {
        DishName::new(name).unwrap()
    }

    #[tokio::test]
    async fn test_in_memory_resolver() {
        let resolver = InMemoryResolver::new().with_recipe("Ugali", &["2 cups maize flour", "3 cups water"]);

        let lines = resolver.resolve_ingredients(&dish("Ugali")).await.unwrap();
        assert_eq!(lines, vec!["2 cups maize flour", "3 cups water"]);

        let missing = resolver.resolve_ingredients(&dish("ugali")).await;
        assert_eq!(missing, Err(ResolveError::NotFound("ugali".to_string())));
    }

    #[test]
    fn test_parse_ingredients_response() {
        let lines = parse_ingredients_response("Pilau", 200, r#"{"ingredients":["2 cups rice"]}"#).unwrap();
        assert_eq!(lines, vec!["2 cups rice"]);

        let lines = parse_ingredients_response("Pilau", 200, r#"{"message":"ok"}"#).unwrap();
        assert!(lines.is_empty());

        let lines = parse_ingredients_response("Pilau", 200, r#"{"ingredients":null}"#).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_parse_ingredients_response_errors() {
        assert_eq!(
            parse_ingredients_response("Pilau", 404, r#"{"message":"Recipe not found"}"#),
            Err(ResolveError::NotFound("Pilau".to_string()))
        );
        assert!(matches!(
            parse_ingredients_response("Pilau", 500, "oops"),
            Err(ResolveError::Http(_))
        ));
        assert!(matches!(
            parse_ingredients_response("Pilau", 200, "<html>"),
            Err(ResolveError::Decode(_))
        ));
    }

    #[test]
    fn test_retry_delay_is_bounded() {
        let config = RecoveryConfig {
            base_retry_delay_ms: 100,
            max_retry_delay_ms: 1000,
            ..Default::default()
        };
        for attempt in 0..20 {
            let delay = retry_delay(&config, attempt);
            assert!(delay <= Duration::from_millis(1000));
            assert!(delay >= Duration::from_millis(100));
        }
        assert!(retry_delay(&config, 0) <= Duration::from_millis(150));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let resolver = HttpIngredientResolver::new("http://localhost:5000/", RecoveryConfig::default()).unwrap();
        assert_eq!(resolver.endpoint(), "http://localhost:5000/api/recipes/ingredients");
    }
}
