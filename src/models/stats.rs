use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePurchaseStats {
    pub course_id: String,
    pub title: String,
    pub instructor: String,
    pub students: u64,
    pub revenue: f64,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub total_courses: usize,
    pub total_students: u64,
    pub total_revenue: f64,
    /// `None` for an empty course list.
    pub average_rating: Option<f64>,
    pub most_purchased_courses: Vec<CoursePurchaseStats>,
}
