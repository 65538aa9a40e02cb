//! Target lookup.
//!
//! # Responsibilities
//! - Store the target → subject table
//! - Resolve a target to its destination subject
//! - Return an explicit no-route rather than an error
//!
//! # Design Decisions
//! - Immutable after construction (shared via Arc without locks)
//! - O(1) lookup via HashMap
//! - Exact, case-sensitive match on the target string

use std::collections::HashMap;

use crate::config::RouteConfig;

/// Static routing table mapping abstract targets to bus subjects.
#[derive(Debug, Clone, Default)]
pub struct Router {
    table: HashMap<String, String>,
}

impl Router {
    /// Build a router from explicit `(target, subject)` pairs.
    /// Later duplicates replace earlier ones; config validation rejects them upfront.
    pub fn new<I, T, S>(routes: I) -> Self
    where
        I: IntoIterator<Item = (T, S)>,
        T: Into<String>,
        S: Into<String>,
    {
        Self {
            table: routes
                .into_iter()
                .map(|(target, subject)| (target.into(), subject.into()))
                .collect(),
        }
    }

    /// Build a router from route configuration.
    pub fn from_config(routes: &[RouteConfig]) -> Self {
        Self::new(
            routes
                .iter()
                .map(|route| (route.target.clone(), route.subject.clone())),
        )
    }

    /// Resolve a target to its destination subject, or `None` on a route miss.
    pub fn resolve(&self, target: &str) -> Option<&str> {
        self.table.get(target).map(String::as_str)
    }

    /// All routes sorted by target.
    pub fn routes(&self) -> Vec<(&str, &str)> {
        let mut routes: Vec<_> = self
            .table
            .iter()
            .map(|(target, subject)| (target.as_str(), subject.as_str()))
            .collect();
        routes.sort_unstable();
        routes
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
