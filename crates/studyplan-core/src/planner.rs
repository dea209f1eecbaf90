//! Catalog lookups, progress and what-if simulation by variant key.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::OnceMap;
use crate::catalog::{self, PROGRAMME_CODE};
use crate::error::Result;
use crate::model::{Course, ElectiveGroup, EntryType, ProgrammeVariant, VariantKey};
use crate::progress::{self, ProgressReport};
use crate::risk::{RiskEngine, StudentMetrics, WhatIfResult};

/// One row of the variant listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSummary {
    pub key: String,
    pub programme_code: String,
    pub intake_code: String,
    pub entry_type: EntryType,
}

/// Variant-keyed front door to the catalog, progress and risk engines.
///
/// Each variant is assembled once and shared afterwards.
#[derive(Default)]
pub struct CatalogService {
    variants: OnceMap<VariantKey, ProgrammeVariant>,
}

impl CatalogService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_variants(&self) -> Vec<VariantSummary> {
        catalog::variant_keys()
            .into_iter()
            .map(|key| VariantSummary {
                key: key.to_string(),
                programme_code: PROGRAMME_CODE.to_string(),
                intake_code: key.intake_code.clone(),
                entry_type: key.entry_type,
            })
            .collect()
    }

    /// The assembled variant for `key` (e.g. `"202301-normal"`).
    pub fn variant(&self, key: &str) -> Result<Arc<ProgrammeVariant>> {
        let key: VariantKey = key.parse()?;
        self.variants.get_or_try_init(&key, || {
            debug!(variant = %key, "assembling variant");
            catalog::build_variant(&key)
        })
    }

    /// Deduplicated course listing in catalog order.
    pub fn get_variant_courses(&self, key: &str) -> Result<Vec<Course>> {
        let variant = self.variant(key)?;
        Ok(variant.list_all_courses().into_iter().cloned().collect())
    }

    pub fn get_variant_electives(&self, key: &str) -> Result<Vec<ElectiveGroup>> {
        Ok(self.variant(key)?.elective_groups.clone())
    }

    pub fn compute_progress(&self, key: &str, completed: &HashSet<String>) -> Result<ProgressReport> {
        let variant = self.variant(key)?;
        Ok(progress::compute_progress(&variant, completed))
    }

    pub fn what_if(
        &self,
        key: &str,
        planned: &[String],
        completed: &HashSet<String>,
        metrics: &StudentMetrics,
    ) -> Result<WhatIfResult> {
        let variant = self.variant(key)?;
        Ok(RiskEngine::new(&variant).what_if(planned, metrics, completed))
    }

    /// Up to `limit` future courses considered, keeping those whose
    /// prerequisites are complete.
    pub fn recommend_courses(
        &self,
        key: &str,
        completed: &HashSet<String>,
        limit: usize,
    ) -> Result<Vec<Course>> {
        let variant = self.variant(key)?;
        Ok(progress::recommend_next_courses(&variant, completed, limit)
            .into_iter()
            .cloned()
            .collect())
    }
}
