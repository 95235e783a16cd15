//! Search, filter and sort over the course list.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::models::Course;

const ALL: &str = "all";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Exact(String),
}

impl From<&str> for CategoryFilter {
    fn from(value: &str) -> Self {
        if value.is_empty() || value == ALL {
            CategoryFilter::All
        } else {
            CategoryFilter::Exact(value.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Published,
    Draft,
}

impl From<&str> for StatusFilter {
    fn from(value: &str) -> Self {
        match value {
            "published" => StatusFilter::Published,
            "draft" => StatusFilter::Draft,
            _ => StatusFilter::All,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Title,
    Instructor,
    Category,
    Price,
    Rating,
    Students,
    Recent,
    /// Unrecognized key: input order is kept.
    Unsorted,
}

impl From<&str> for SortKey {
    fn from(value: &str) -> Self {
        match value {
            "title" => SortKey::Title,
            "instructor" => SortKey::Instructor,
            "category" => SortKey::Category,
            "price" => SortKey::Price,
            "rating" => SortKey::Rating,
            "students" => SortKey::Students,
            "recent" => SortKey::Recent,
            _ => SortKey::Unsorted,
        }
    }
}

/// Raw query-string parameters of `GET /courses`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseQueryParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseQuery {
    pub search: String,
    pub category: CategoryFilter,
    pub status: StatusFilter,
    pub sort: SortKey,
}

impl From<CourseQueryParams> for CourseQuery {
    fn from(params: CourseQueryParams) -> Self {
        Self {
            search: params.search.unwrap_or_default(),
            category: params.category.as_deref().map(CategoryFilter::from).unwrap_or_default(),
            status: params.status.as_deref().map(StatusFilter::from).unwrap_or_default(),
            sort: params.sort.as_deref().map(SortKey::from).unwrap_or_default(),
        }
    }
}

impl CourseQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    pub fn category(mut self, category: impl AsRef<str>) -> Self {
        self.category = CategoryFilter::from(category.as_ref());
        self
    }

    pub fn status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    pub fn matches(&self, course: &Course) -> bool {
        self.matches_search(course) && self.matches_category(course) && self.matches_status(course)
    }

    /// Filters then sorts. The sort is stable, so applying the same query
    /// to its own output returns it unchanged.
    pub fn apply(&self, courses: &[Course]) -> Vec<Course> {
        let mut filtered: Vec<Course> = courses
            .iter()
            .filter(|c| self.matches(c))
            .cloned()
            .collect();

        if self.sort != SortKey::Unsorted {
            filtered.sort_by(|a, b| compare(self.sort, a, b));
        }
        filtered
    }

    fn matches_search(&self, course: &Course) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        course.title.to_lowercase().contains(&needle)
            || course.instructor.to_lowercase().contains(&needle)
            || course.category.to_lowercase().contains(&needle)
    }

    fn matches_category(&self, course: &Course) -> bool {
        match &self.category {
            CategoryFilter::All => true,
            CategoryFilter::Exact(category) => &course.category == category,
        }
    }

    fn matches_status(&self, course: &Course) -> bool {
        match self.status {
            StatusFilter::All => true,
            StatusFilter::Published => course.is_published(),
            StatusFilter::Draft => !course.is_published(),
        }
    }
}

fn compare(key: SortKey, a: &Course, b: &Course) -> Ordering {
    match key {
        SortKey::Title => text_order(&a.title, &b.title),
        SortKey::Instructor => text_order(&a.instructor, &b.instructor),
        SortKey::Category => text_order(&a.category, &b.category),
        SortKey::Price => a.price.total_cmp(&b.price),
        SortKey::Rating => b.rating.total_cmp(&a.rating),
        SortKey::Students => b.students_or_zero().cmp(&a.students_or_zero()),
        SortKey::Recent => last_accessed_millis(b).cmp(&last_accessed_millis(a)),
        SortKey::Unsorted => Ordering::Equal,
    }
}

// Case-insensitive first, so "angular" sorts next to "Angular".
fn text_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Milliseconds since the epoch; missing or unparseable stamps count as 0.
pub fn last_accessed_millis(course: &Course) -> i64 {
    course
        .last_accessed
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(0)
}

fn parse_timestamp(raw: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}
