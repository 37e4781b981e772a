//! # Error Types Module
//!
//! Error types for ingredient resolution and plan export. Neither kind of error
//! ever touches the meal plan itself: resolution failures cost one dish its
//! contribution, export failures cost one document.

/// Errors raised while fetching a dish's ingredient lines
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// No recipe matches the dish name
    NotFound(String),
    /// The lookup did not finish in time
    Timeout(String),
    /// Transport or non-success HTTP status
    Http(String),
    /// The backend answered with something that is not an ingredient list
    Decode(String),
    /// Database lookup failed
    Database(String),
    /// The circuit breaker is open and the lookup was not attempted
    CircuitOpen(String),
}

impl ResolveError {
    /// Whether retrying the same lookup could succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ResolveError::Timeout(_) | ResolveError::Http(_) | ResolveError::Database(_)
        )
    }
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::NotFound(dish) => write!(f, "Recipe not found: {dish}"),
            ResolveError::Timeout(msg) => write!(f, "Timeout error: {msg}"),
            ResolveError::Http(msg) => write!(f, "HTTP error: {msg}"),
            ResolveError::Decode(msg) => write!(f, "Decode error: {msg}"),
            ResolveError::Database(msg) => write!(f, "Database error: {msg}"),
            ResolveError::CircuitOpen(msg) => write!(f, "Circuit open: {msg}"),
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<sqlx::Error> for ResolveError {
    fn from(err: sqlx::Error) -> Self {
        ResolveError::Database(err.to_string())
    }
}

/// Errors raised while producing or writing an export document
#[derive(Debug)]
pub enum ExportError {
    /// Writing the document failed
    Io(std::io::Error),
    /// The plan could not be serialized
    Serialize(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(err) => write!(f, "Export I/O error: {err}"),
            ExportError::Serialize(msg) => write!(f, "Export serialization error: {msg}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Io(err) => Some(err),
            ExportError::Serialize(_) => None,
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serialize(err.to_string())
    }
}
