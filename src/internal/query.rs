use jiff::civil::Date;
use std::fmt;
use strum_macros::Display;

/// Fixed page size of the article list.
pub const PER_PAGE: u32 = 12;

/// Filter dimensions the user can edit from the filter bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum FilterField {
    Category,
    Source,
    #[strum(to_string = "Date from")]
    DateFrom,
    #[strum(to_string = "Date to")]
    DateTo,
}

/// A single-field change passed to `QueryController::set_filter`.
/// `None` (or an empty string) clears the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterUpdate {
    Category(Option<String>),
    Source(Option<String>),
    DateFrom(Option<Date>),
    DateTo(Option<Date>),
}

impl FilterUpdate {
    pub fn field(&self) -> FilterField {
        match self {
            Self::Category(_) => FilterField::Category,
            Self::Source(_) => FilterField::Source,
            Self::DateFrom(_) => FilterField::DateFrom,
            Self::DateTo(_) => FilterField::DateTo,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub category: Option<String>,
    pub source: Option<String>,
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
    /// Free-typed search input. Never sent to the backend.
    pub keyword_draft: String,
    /// Keyword actually sent, updated only by an explicit search submit.
    pub keyword_committed: Option<String>,
}

impl FilterState {
    pub fn apply(&mut self, update: FilterUpdate) {
        match update {
            FilterUpdate::Category(value) => self.category = non_blank(value),
            FilterUpdate::Source(value) => self.source = non_blank(value),
            FilterUpdate::DateFrom(value) => self.date_from = value,
            FilterUpdate::DateTo(value) => self.date_to = value,
        }
    }

    /// Copy the draft into the committed keyword. Returns false when nothing changed.
    pub fn commit_keyword(&mut self) -> bool {
        let next = non_blank(Some(self.keyword_draft.clone()));
        if next == self.keyword_committed {
            return false;
        }
        self.keyword_committed = next;
        true
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub page: u32,
    pub total_pages: u32,
}

impl PaginationState {
    pub fn per_page(&self) -> u32 {
        PER_PAGE
    }

    pub fn contains(&self, page: u32) -> bool {
        (1..=self.total_pages).contains(&page)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            page: 1,
            total_pages: 1,
        }
    }
}

/// Canonical request parameters for `GET /articles/`.
///
/// Built from filter + pagination state, omitting every empty field, so two
/// states that normalize the same way always produce the same request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    pub page: u32,
    pub per_page: u32,
    pub category: Option<String>,
    pub source: Option<String>,
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
    pub keyword: Option<String>,
}

impl Query {
    pub fn derive(filters: &FilterState, pagination: &PaginationState) -> Self {
        Self {
            page: pagination.page,
            per_page: pagination.per_page(),
            category: non_blank(filters.category.clone()),
            source: non_blank(filters.source.clone()),
            date_from: filters.date_from,
            date_to: filters.date_to,
            keyword: non_blank(filters.keyword_committed.clone()),
        }
    }

    /// Wire parameters in a fixed order. Absent fields are never emitted.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        if let Some(category) = &self.category {
            params.push(("category", category.clone()));
        }
        if let Some(source) = &self.source {
            params.push(("source", source.clone()));
        }
        if let Some(date) = self.date_from {
            params.push(("date_from", date.to_string()));
        }
        if let Some(date) = self.date_to {
            params.push(("date_to", date.to_string()));
        }
        if let Some(keyword) = &self.keyword {
            params.push(("keyword", keyword.clone()));
        }
        params
    }
}

impl fmt::Display for Query {
    /// Unencoded `k=v&k=v` form, used for logs and the status bar.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .to_params()
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        f.write_str(&joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    #[test]
    fn default_state_yields_only_paging() {
        let query = Query::derive(&FilterState::default(), &PaginationState::default());
        insta::assert_snapshot!(query.to_string(), @"page=1&per_page=12");
    }

    #[test]
    fn hand_built_blank_fields_are_dropped() {
        let filters = FilterState {
            category: Some(String::new()),
            source: Some(" 의학신문 ".to_string()),
            keyword_committed: Some("  ".to_string()),
            ..Default::default()
        };
        let query = Query::derive(&filters, &PaginationState::default());
        insta::assert_snapshot!(query.to_string(), @"page=1&per_page=12&source=의학신문");

        let blank_only = FilterState {
            category: Some(String::new()),
            keyword_committed: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            Query::derive(&blank_only, &PaginationState::default()),
            Query::derive(&FilterState::default(), &PaginationState::default())
        );
    }

    #[test]
    fn all_fields_appear_in_fixed_order() {
        let filters = FilterState {
            category: Some("제약".to_string()),
            source: Some("의학신문".to_string()),
            date_from: Some(date(2024, 3, 1)),
            date_to: Some(date(2024, 3, 7)),
            keyword_draft: "ignored draft".to_string(),
            keyword_committed: Some("백신".to_string()),
        };
        let pagination = PaginationState {
            page: 2,
            total_pages: 4,
        };
        let query = Query::derive(&filters, &pagination);
        insta::assert_snapshot!(
            query.to_string(),
            @"page=2&per_page=12&category=제약&source=의학신문&date_from=2024-03-01&date_to=2024-03-07&keyword=백신"
        );
    }

    #[test]
    fn blank_values_clear_fields() {
        let mut filters = FilterState::default();
        filters.apply(FilterUpdate::Category(Some("병원".to_string())));
        assert_eq!(filters.category.as_deref(), Some("병원"));

        filters.apply(FilterUpdate::Category(Some("   ".to_string())));
        assert_eq!(filters.category, None);

        filters.apply(FilterUpdate::Source(Some(String::new())));
        assert_eq!(filters.source, None);
        assert!(filters.is_empty());
    }

    #[test]
    fn commit_keyword_reports_change() {
        let mut filters = FilterState {
            keyword_draft: "  암  ".to_string(),
            ..Default::default()
        };
        assert!(filters.commit_keyword());
        assert_eq!(filters.keyword_committed.as_deref(), Some("암"));
        assert!(!filters.commit_keyword());

        filters.keyword_draft.clear();
        assert!(filters.commit_keyword());
        assert_eq!(filters.keyword_committed, None);
    }

    #[test]
    fn pagination_bounds() {
        let pagination = PaginationState {
            page: 1,
            total_pages: 3,
        };
        assert!(pagination.contains(3));
        assert!(!pagination.contains(0));
        assert!(!pagination.contains(4));
        assert!(pagination.has_next());
        assert!(!pagination.has_prev());
    }

    #[test]
    fn filter_field_labels() {
        assert_eq!(FilterField::DateFrom.to_string(), "Date from");
        assert_eq!(FilterField::Category.to_string(), "Category");
    }
}
