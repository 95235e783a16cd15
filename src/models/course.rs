use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    pub instructor: String,
    pub thumbnail: String,
    pub duration: String,
    pub lessons: u32,
    pub rating: f64,
    pub category: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub students: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<String>,
}

impl Course {
    /// A course is published once it carries a student count.
    pub fn is_published(&self) -> bool {
        self.students.is_some()
    }

    pub fn students_or_zero(&self) -> u64 {
        self.students.unwrap_or(0)
    }

    /// Price used for revenue figures: the list price when discounted.
    pub fn revenue_basis(&self) -> f64 {
        self.original_price.unwrap_or(self.price)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

/// Admin form for creating or editing a course.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseForm {
    pub title: String,
    pub instructor: String,
    pub thumbnail: String,
    pub duration: String,
    pub lessons: i64,
    pub rating: f64,
    pub category: String,
    pub price: f64,
    pub has_discount: bool,
    pub original_price: Option<f64>,
    pub discount: Option<f64>,
    pub is_published: bool,
    pub students: Option<i64>,
    pub level: Level,
    pub description: String,
}

/// Partition of the course list as shipped in the fixture file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseFixture {
    #[serde(default)]
    pub purchased_courses: Vec<Course>,
    #[serde(default)]
    pub available_courses: Vec<Course>,
}
