//! Duplicate-route detection run against the backend before a save.
//!
//! The verdict is advisory. A duplicate still lets the user save, and a
//! failed check leaves the verdict `Unknown` without blocking anything.

use std::sync::Arc;

use crate::{
    backend::{DuplicateStatus, RouteStore},
    notice::Notice,
};

pub const DUPLICATE_TITLE: &str = "Duplicate route";
pub const DUPLICATE_MESSAGE: &str = "A route with these pickup points already exists!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateCheckResult {
    #[default]
    Unknown,
    Duplicate,
    Unique,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateVerdict {
    pub result: DuplicateCheckResult,
    pub notice: Option<Notice>,
}

impl DuplicateVerdict {
    fn silent(result: DuplicateCheckResult) -> Self {
        Self { result, notice: None }
    }
}

pub struct DuplicateRouteChecker<S> {
    store: Arc<S>,
}

impl<S> Clone for DuplicateRouteChecker<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: RouteStore> DuplicateRouteChecker<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn check(&self, ids: &[String]) -> DuplicateVerdict {
        match self.store.check_duplicate(ids).await {
            Ok(DuplicateStatus::Unique) => {
                tracing::debug!(points = ids.len(), "route is unique");
                DuplicateVerdict::silent(DuplicateCheckResult::Unique)
            }
            Ok(DuplicateStatus::Conflict { message }) => {
                tracing::info!(points = ids.len(), %message, "route duplicates a saved route");
                DuplicateVerdict {
                    result: DuplicateCheckResult::Duplicate,
                    notice: Some(Notice::info(DUPLICATE_TITLE, DUPLICATE_MESSAGE)),
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "duplicate check failed, verdict unknown");
                DuplicateVerdict::silent(DuplicateCheckResult::Unknown)
            }
        }
    }
}
