// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Catalog behaviour settings
//!
//! Every field has a default so a settings section may be omitted entirely.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use shared_types::{DEFAULT_MAX_PAGE_LIMIT, PaginationWindow};

use crate::error::{CatalogError, CatalogResult};

/// Largest accepted population fan-out
pub const MAX_POPULATION_CONCURRENCY: usize = 64;

/// What a category listing does with codes that match no category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedCategoryPolicy {
    /// Skip them with a warning and report them next to the result
    #[default]
    Ignore,
    /// Fail the listing
    Reject,
}

/// What a draw does when fewer users than serie members are ranked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallPolicy {
    /// Record the surplus NFTs as unassigned
    #[default]
    LeaveUnassigned,
    /// Fail the draw
    Fail,
}

/// Distribution settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionSettings {
    /// Shortfall handling
    pub shortfall: ShortfallPolicy,
    /// Directory distribution files are written to
    pub output_dir: PathBuf,
}

impl Default for DistributionSettings {
    fn default() -> Self {
        Self {
            shortfall: ShortfallPolicy::default(),
            output_dir: PathBuf::from("distributions"),
        }
    }
}

/// Catalog settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Number of grouped NFTs populated at the same time
    pub population_concurrency: usize,
    /// Largest page size callers may request
    pub max_page_limit: u32,
    /// Handling of unknown category codes
    pub unresolved_categories: UnresolvedCategoryPolicy,
    /// Draw settings
    pub distribution: DistributionSettings,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            population_concurrency: 8,
            max_page_limit: DEFAULT_MAX_PAGE_LIMIT,
            unresolved_categories: UnresolvedCategoryPolicy::default(),
            distribution: DistributionSettings::default(),
        }
    }
}

impl CatalogSettings {
    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first offending field
    pub fn validate(&self) -> CatalogResult<()> {
        if !(1..=MAX_POPULATION_CONCURRENCY).contains(&self.population_concurrency) {
            return Err(CatalogError::validation(format!(
                "population_concurrency must be between 1 and {MAX_POPULATION_CONCURRENCY}, got {}",
                self.population_concurrency
            )));
        }
        if self.max_page_limit == 0 {
            return Err(CatalogError::validation(
                "max_page_limit must be at least 1",
            ));
        }
        if self.distribution.output_dir.as_os_str().is_empty() {
            return Err(CatalogError::validation(
                "distribution.output_dir cannot be empty",
            ));
        }
        Ok(())
    }

    /// Build a caller window bounded by `max_page_limit`
    ///
    /// # Errors
    ///
    /// Returns a validation error for page 0 or a limit outside `1..=max_page_limit`
    pub fn window(&self, page: u32, limit: u32) -> CatalogResult<PaginationWindow> {
        Ok(PaginationWindow::with_max_limit(
            page,
            limit,
            self.max_page_limit,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    #[test]
    fn defaults_are_valid() {
        let settings = CatalogSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.population_concurrency, 8);
        assert_eq!(settings.max_page_limit, 100);
        assert_eq!(
            settings.distribution.shortfall,
            ShortfallPolicy::LeaveUnassigned
        );
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let settings: CatalogSettings = serde_json::from_value(serde_json::json!({
            "unresolved_categories": "reject",
            "distribution": { "shortfall": "fail" }
        }))
        .unwrap();

        assert_eq!(
            settings.unresolved_categories,
            UnresolvedCategoryPolicy::Reject
        );
        assert_eq!(settings.distribution.shortfall, ShortfallPolicy::Fail);
        assert_eq!(
            settings.distribution.output_dir,
            PathBuf::from("distributions")
        );
        assert_eq!(settings.population_concurrency, 8);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let settings = CatalogSettings {
            population_concurrency: 0,
            ..CatalogSettings::default()
        };
        assert!(settings.validate().is_err());

        let settings = CatalogSettings {
            population_concurrency: MAX_POPULATION_CONCURRENCY + 1,
            ..CatalogSettings::default()
        };
        assert!(settings.validate().is_err());

        let settings = CatalogSettings {
            max_page_limit: 0,
            ..CatalogSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn window_respects_configured_limit() {
        let settings = CatalogSettings {
            max_page_limit: 20,
            ..CatalogSettings::default()
        };
        assert!(settings.window(1, 20).is_ok());
        assert_eq!(
            settings.window(1, 21).unwrap_err().kind(),
            FailureKind::InvalidInput
        );
        assert!(settings.window(0, 10).is_err());
    }
}
