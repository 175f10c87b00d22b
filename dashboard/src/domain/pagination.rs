//! Query parameters for paginated list endpoints.
//!
//! List endpoints accept Spring-style paging: zero-based `page`, `size`, and
//! `sort=field,direction`.

use std::collections::BTreeMap;

/// Default zero-based page index.
pub const DEFAULT_PAGE: u32 = 0;
/// Default page size.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Sort direction appended to the `sort` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Paging, sorting and filter parameters for a list request.
///
/// # Examples
/// ```
/// use dashboard::domain::{PageQuery, SortDirection};
///
/// let pairs = PageQuery::new()
///     .page(2)
///     .sort("lastName", Some(SortDirection::Desc))
///     .filter("status", "CONFIRMED")
///     .filter("doctorId", "")
///     .to_pairs();
/// assert_eq!(
///     pairs,
///     vec![
///         ("page".to_owned(), "2".to_owned()),
///         ("size".to_owned(), "10".to_owned()),
///         ("sort".to_owned(), "lastName,desc".to_owned()),
///         ("status".to_owned(), "CONFIRMED".to_owned()),
///     ]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    page: u32,
    size: u32,
    sort: Option<(String, Option<SortDirection>)>,
    filters: BTreeMap<String, String>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl PageQuery {
    /// First page with the default size and no sorting.
    pub fn new() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
            sort: None,
            filters: BTreeMap::new(),
        }
    }

    /// Set the zero-based page index.
    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Set the page size; zero falls back to the default.
    #[must_use]
    pub fn size(mut self, size: u32) -> Self {
        self.size = if size == 0 { DEFAULT_PAGE_SIZE } else { size };
        self
    }

    /// Sort by `field`, optionally in an explicit direction.
    #[must_use]
    pub fn sort(mut self, field: impl Into<String>, direction: Option<SortDirection>) -> Self {
        let field = field.into();
        self.sort = (!field.trim().is_empty()).then_some((field, direction));
        self
    }

    /// Add a filter. Blank values are dropped when rendering.
    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Render as ordered query pairs: `page`, `size`, `sort`, then filters.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_owned(), self.page.to_string()),
            ("size".to_owned(), self.size.to_string()),
        ];
        if let Some((field, direction)) = &self.sort {
            let value = match direction {
                Some(direction) => format!("{field},{}", direction.as_str()),
                None => field.clone(),
            };
            pairs.push(("sort".to_owned(), value));
        }
        pairs.extend(
            self.filters
                .iter()
                .filter(|(key, value)| !is_reserved(key) && !value.trim().is_empty())
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        pairs
    }
}

fn is_reserved(key: &str) -> bool {
    matches!(key, "page" | "size" | "sort")
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_render_page_and_size_only() {
        let pairs = PageQuery::new().to_pairs();
        assert_eq!(
            pairs,
            vec![
                ("page".to_owned(), "0".to_owned()),
                ("size".to_owned(), "10".to_owned()),
            ]
        );
    }

    #[rstest]
    #[case(None, "createdAt")]
    #[case(Some(SortDirection::Asc), "createdAt,asc")]
    fn sort_direction_is_optional(#[case] direction: Option<SortDirection>, #[case] expected: &str) {
        let pairs = PageQuery::new().sort("createdAt", direction).to_pairs();
        assert!(pairs.contains(&("sort".to_owned(), expected.to_owned())));
    }

    #[rstest]
    fn zero_size_falls_back_to_default_and_reserved_filters_are_ignored() {
        let pairs = PageQuery::new().size(0).filter("page", "9").to_pairs();
        assert_eq!(pairs.len(), 2);
        assert!(pairs.contains(&("page".to_owned(), "0".to_owned())));
        assert!(pairs.contains(&("size".to_owned(), DEFAULT_PAGE_SIZE.to_string())));
    }
}
