/// Pagination, sorting and substring search shared by every listing endpoint.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PER_PAGE: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than a case-insensitive `desc` sorts ascending.
    pub fn parse_lenient(value: &str) -> Self {
        if value.eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Raw listing parameters as supplied by a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
    pub search: Option<String>,
}

/// Normalized listing request handed to a store.
///
/// `sort_field` always comes from an allow-list, so stores may splice it
/// into SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: i64,
    pub per_page: i64,
    pub sort_field: &'static str,
    pub sort_order: SortOrder,
    pub search: Option<String>,
}

impl ListQuery {
    /// Rows to skip. Saturates instead of overflowing for huge pages.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

impl ListParams {
    /// Resolves client parameters against an allow-list of sort fields. The
    /// first allowed field is the default; unknown fields fall back to it.
    pub fn resolve(&self, allowed_sort_fields: &'static [&'static str]) -> ListQuery {
        let page = self.page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE);
        let per_page = self.per_page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PER_PAGE);

        let default_field = allowed_sort_fields.first().copied().unwrap_or("id");
        let sort_field = self
            .sort_field
            .as_deref()
            .and_then(|requested| allowed_sort_fields.iter().find(|f| **f == requested))
            .copied()
            .unwrap_or(default_field);

        let sort_order = self
            .sort_order
            .as_deref()
            .map(SortOrder::parse_lenient)
            .unwrap_or_default();

        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        ListQuery {
            page,
            per_page,
            sort_field,
            sort_order,
            search,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Unfiltered store cardinality
    pub total_count: i64,
    /// Cardinality after applying the search filter
    pub filtered_count: i64,
    pub page: i64,
    pub per_page: i64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            filtered_count: self.filtered_count,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// Case-insensitive substring match across several optional text fields,
/// OR-combined.
pub fn matches_search<'a>(needle: &str, haystacks: impl IntoIterator<Item = Option<&'a str>>) -> bool {
    let needle = needle.to_lowercase();
    haystacks
        .into_iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(&needle))
}

/// Escapes `%`, `_` and `\` and wraps the term for an `ILIKE` substring match.
pub fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
