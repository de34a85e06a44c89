//! Category registry: category code -> column index, per dataset kind.
//!
//! The registry is built once before any build starts and only handed out
//! by shared reference afterwards, so concurrent per-date tasks can read it
//! without synchronization.

use std::collections::{BTreeMap, HashSet};

use crate::domain::DatasetKind;
use crate::error::AppError;

pub mod tables;

pub use tables::{FLOW_EXPORT, FLOW_IMPORT};

/// One provider category (fuel type or flow direction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub code: String,
    pub description: String,
}

impl Category {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }
}

/// Ordered category list; a category's position is its column index.
///
/// Invariants (checked in `new`): non-empty, no duplicate codes. Indices are
/// positions, so they are contiguous from 0 by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    kind: DatasetKind,
    categories: Vec<Category>,
}

impl ColumnMapping {
    pub fn new(kind: DatasetKind, categories: Vec<Category>) -> Result<Self, AppError> {
        if categories.is_empty() {
            return Err(AppError::config(format!("Column mapping for {kind} is empty.")));
        }
        let mut seen = HashSet::new();
        for category in &categories {
            if !seen.insert(category.code.as_str()) {
                return Err(AppError::config(format!(
                    "Duplicate category code '{}' in column mapping for {kind}.",
                    category.code
                )));
            }
        }
        Ok(Self { kind, categories })
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn column_of(&self, code: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.code == code)
    }

    /// `(column, category)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Category)> {
        self.categories.iter().enumerate()
    }
}

/// Read-only set of column mappings, at most one per dataset kind.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    mappings: BTreeMap<DatasetKind, ColumnMapping>,
}

impl CategoryRegistry {
    /// Registry with the provider's standard layouts for every dataset kind.
    pub fn standard() -> Result<Self, AppError> {
        let all = tables::PRODUCTION_TYPES
            .iter()
            .map(|(code, name)| Category::new(*code, *name))
            .collect();

        let subset = tables::GENERATION_SUBSET
            .iter()
            .map(|code| {
                let name = tables::production_type_name(code).ok_or_else(|| {
                    AppError::config(format!("Unknown production type '{code}' in generation subset."))
                })?;
                Ok(Category::new(*code, name))
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        let flow = tables::FLOW_DIRECTIONS
            .iter()
            .map(|(code, name)| Category::new(*code, *name))
            .collect();

        Self::with_mappings([
            ColumnMapping::new(DatasetKind::GenerationAll, all)?,
            ColumnMapping::new(DatasetKind::GenerationSubset, subset)?,
            ColumnMapping::new(DatasetKind::Flow, flow)?,
        ])
    }

    pub fn with_mappings(mappings: impl IntoIterator<Item = ColumnMapping>) -> Result<Self, AppError> {
        let mut out = BTreeMap::new();
        for mapping in mappings {
            let kind = mapping.kind();
            if out.insert(kind, mapping).is_some() {
                return Err(AppError::config(format!("Dataset kind {kind} registered twice.")));
            }
        }
        Ok(Self { mappings: out })
    }

    /// Column layout for `kind`; a kind without a mapping is a
    /// configuration error.
    pub fn columns_for(&self, kind: DatasetKind) -> Result<&ColumnMapping, AppError> {
        self.mappings
            .get(&kind)
            .ok_or_else(|| AppError::config(format!("No column mapping registered for dataset kind {kind}.")))
    }

    pub fn kinds(&self) -> impl Iterator<Item = DatasetKind> + '_ {
        self.mappings.keys().copied()
    }
}
