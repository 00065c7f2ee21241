//! Query resolution for the story listing endpoint.
//!
//! Raw query parameters (`search`, `sort`/`sort_by`, `order`/`order_by`) are
//! resolved into a `StoryQuery` before any store is touched, so both backends
//! only ever see whitelisted sort fields.

use std::collections::HashMap;

use crate::error::QueryError;

/// Whitelisted sort fields, keyed by their public short tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Score,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn parse(token: &str) -> Result<Self, QueryError> {
        match token {
            "title" => Ok(SortField::Title),
            "score" => Ok(SortField::Score),
            "created" => Ok(SortField::CreatedAt),
            "modified" => Ok(SortField::UpdatedAt),
            _ => Err(QueryError::InvalidSortField),
        }
    }

    /// Underlying column name. Only these four strings can ever reach a
    /// SQL ORDER BY clause.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Score => "score",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn parse(token: &str) -> Result<Self, QueryError> {
        match token.to_lowercase().as_str() {
            "ascending" | "asc" => Ok(SortOrder::Ascending),
            "descending" | "desc" => Ok(SortOrder::Descending),
            _ => Err(QueryError::InvalidSortOrder),
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

/// A resolved listing query: optional title filter plus a validated ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryQuery {
    pub search: Option<String>,
    pub sort: SortField,
    pub order: SortOrder,
}

impl Default for StoryQuery {
    fn default() -> Self {
        Self {
            search: None,
            sort: SortField::CreatedAt,
            order: SortOrder::Ascending,
        }
    }
}

impl StoryQuery {
    /// Resolves raw query parameters. Both the short (`sort`, `order`) and
    /// long (`sort_by`, `order_by`) parameter names are accepted.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, QueryError> {
        let sort = match params.get("sort").or_else(|| params.get("sort_by")) {
            Some(token) => SortField::parse(token)?,
            None => SortField::CreatedAt,
        };
        let order = match params.get("order").or_else(|| params.get("order_by")) {
            Some(token) => SortOrder::parse(token)?,
            None => SortOrder::Ascending,
        };
        let search = params
            .get("search")
            .map(|s| s.to_string())
            .filter(|s| !s.is_empty());
        Ok(Self { search, sort, order })
    }
}
