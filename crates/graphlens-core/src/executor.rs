//! # Store Executor
//!
//! The seam between the engine and the graph store. The engine treats a store
//! call as synchronous and blocking: one call per logical request phase, the
//! full result set materialized before projection starts.
//!
//! [`MemoryStore`] is a scripted executor: it answers registered query texts
//! with canned result sets and records every call it receives.

use crate::params::QueryParams;
use crate::{GraphLensError, ResultSet};
use serde_json::Value;
use std::sync::{Arc, Mutex};

// =============================================================================
// STORE EXECUTOR TRAIT
// =============================================================================

/// Runs query text with bound parameters against a graph store.
///
/// Implementations must support concurrent use; the engine shares one
/// executor across all requests.
pub trait StoreExecutor: Send + Sync {
    /// Execute `query` with `params`, returning every record and the column keys.
    ///
    /// Fails with `GraphLensError::Store` on connectivity, syntax or timeout errors.
    fn execute(&self, query: &str, params: &QueryParams) -> Result<ResultSet, GraphLensError>;
}

impl<T: StoreExecutor + ?Sized> StoreExecutor for Arc<T> {
    fn execute(&self, query: &str, params: &QueryParams) -> Result<ResultSet, GraphLensError> {
        (**self).execute(query, params)
    }
}

impl<T: StoreExecutor + ?Sized> StoreExecutor for &T {
    fn execute(&self, query: &str, params: &QueryParams) -> Result<ResultSet, GraphLensError> {
        (**self).execute(query, params)
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// A call received by a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedQuery {
    pub query: String,
    pub params: QueryParams,
}

#[derive(Debug)]
struct Script {
    query: String,
    when: Option<(String, Value)>,
    response: Result<ResultSet, String>,
}

impl Script {
    fn matches(&self, query: &str, params: &QueryParams) -> bool {
        self.query == query
            && self
                .when
                .as_ref()
                .is_none_or(|(key, value)| params.get(key) == Some(value))
    }
}

/// Scripted in-memory executor.
///
/// Query texts are compared after trimming surrounding whitespace. Scripts
/// conditioned on a parameter value take precedence over unconditioned ones
/// for the same query text; an unscripted query fails with a store error.
#[derive(Debug, Default)]
pub struct MemoryStore {
    scripts: Vec<Script>,
    calls: Mutex<Vec<ExecutedQuery>>,
}

impl MemoryStore {
    /// Create a store with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` with `result`.
    #[must_use]
    pub fn respond(mut self, query: &str, result: ResultSet) -> Self {
        self.scripts.push(Script {
            query: query.trim().to_string(),
            when: None,
            response: Ok(result),
        });
        self
    }

    /// Answer `query` with `result` only when parameter `key` equals `value`.
    #[must_use]
    pub fn respond_when(
        mut self,
        query: &str,
        key: &str,
        value: impl Into<Value>,
        result: ResultSet,
    ) -> Self {
        self.scripts.push(Script {
            query: query.trim().to_string(),
            when: Some((key.to_string(), value.into())),
            response: Ok(result),
        });
        self
    }

    /// Fail `query` with a store error carrying `message`.
    #[must_use]
    pub fn fail(mut self, query: &str, message: &str) -> Self {
        self.scripts.push(Script {
            query: query.trim().to_string(),
            when: None,
            response: Err(message.to_string()),
        });
        self
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ExecutedQuery> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of calls received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl StoreExecutor for MemoryStore {
    fn execute(&self, query: &str, params: &QueryParams) -> Result<ResultSet, GraphLensError> {
        let query = query.trim();
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ExecutedQuery {
                query: query.to_string(),
                params: params.clone(),
            });

        let conditioned = self
            .scripts
            .iter()
            .find(|s| s.when.is_some() && s.matches(query, params));
        let script = conditioned.or_else(|| {
            self.scripts
                .iter()
                .find(|s| s.when.is_none() && s.matches(query, params))
        });

        match script {
            Some(Script {
                response: Ok(result),
                ..
            }) => Ok(result.clone()),
            Some(Script {
                response: Err(message),
                ..
            }) => Err(GraphLensError::Store(message.clone())),
            None => Err(GraphLensError::Store(format!(
                "no scripted response for query: {}",
                query
            ))),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
