//! Offset-window math for paginated listings.
//!
//! Listings are always ordered by the insertion sequence; the window only
//! chooses the direction and the slice.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub const DEFAULT_PAGE: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort order '{0}'")]
pub struct ParseSortOrderError(String);

impl FromStr for SortOrder {
    type Err = ParseSortOrderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "1" => Ok(SortOrder::Asc),
            "desc" | "-1" => Ok(SortOrder::Desc),
            other => Err(ParseSortOrderError(other.to_string())),
        }
    }
}

impl TryFrom<i64> for SortOrder {
    type Error = ParseSortOrderError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(SortOrder::Asc),
            -1 => Ok(SortOrder::Desc),
            other => Err(ParseSortOrderError(other.to_string())),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SortOrderRepr {
    Code(i64),
    Name(String),
}

impl<'de> Deserialize<'de> for SortOrder {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match SortOrderRepr::deserialize(deserializer)? {
            SortOrderRepr::Code(code) => SortOrder::try_from(code).map_err(serde::de::Error::custom),
            SortOrderRepr::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// The slice of a sorted collection a page request selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub skip: u64,
    pub limit: u64,
    pub order: SortOrder,
}

impl Window {
    /// Inclusive rank range `(start, stop)` for the window, or `None` when it
    /// selects nothing. Ranks are signed 64-bit, so a skip past `i64::MAX` is
    /// empty and `stop` is clamped to `i64::MAX`.
    pub fn rank_range(&self) -> Option<(i64, i64)> {
        if self.limit == 0 {
            return None;
        }
        let start = i64::try_from(self.skip).ok()?;
        let stop = self.skip.saturating_add(self.limit - 1).min(i64::MAX as u64) as i64;
        Some((start, stop))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("page size must be greater than zero")]
    ZeroPageSize,
}

/// Number of items to skip before `page_number`; pages at or below 1 start at 0.
#[inline]
pub fn pagination_skip(page_size: u64, page_number: i64) -> u64 {
    if page_number > 1 {
        page_size.saturating_mul((page_number - 1) as u64)
    } else {
        0
    }
}

/// Compute the window for a page request. A zero page size yields an empty window.
pub fn compute_window(page_size: u64, page_number: i64, order: SortOrder) -> Window {
    Window {
        skip: pagination_skip(page_size, page_number),
        limit: page_size,
        order,
    }
}

/// `ceil(item_total / page_size)`.
pub fn total_pages(item_total: u64, page_size: u64) -> Result<u64, PaginationError> {
    if page_size == 0 {
        return Err(PaginationError::ZeroPageSize);
    }
    Ok(item_total.div_ceil(page_size))
}
