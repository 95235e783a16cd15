//! Admin dashboard aggregates over the course list.

use crate::models::{CollectionStats, Course, CoursePurchaseStats};

/// Number of entries in the most-purchased ranking.
pub const TOP_COURSES: usize = 5;

pub fn collection_stats(courses: &[Course]) -> CollectionStats {
    let total_courses = courses.len();
    let total_students = courses.iter().map(Course::students_or_zero).sum();
    let total_revenue = courses.iter().map(course_revenue).sum();

    let average_rating = if courses.is_empty() {
        None
    } else {
        let sum: f64 = courses.iter().map(|c| c.rating).sum();
        Some(sum / total_courses as f64)
    };

    CollectionStats {
        total_courses,
        total_students,
        total_revenue,
        average_rating,
        most_purchased_courses: most_purchased(courses, TOP_COURSES),
    }
}

pub fn course_revenue(course: &Course) -> f64 {
    course.revenue_basis() * course.students_or_zero() as f64
}

/// Courses with at least one student, highest enrollment first.
///
/// Equal student counts keep their input order.
pub fn most_purchased(courses: &[Course], limit: usize) -> Vec<CoursePurchaseStats> {
    let mut ranked: Vec<CoursePurchaseStats> = courses
        .iter()
        .filter(|c| c.students_or_zero() > 0)
        .map(|c| CoursePurchaseStats {
            course_id: c.id.clone(),
            title: c.title.clone(),
            instructor: c.instructor.clone(),
            students: c.students_or_zero(),
            revenue: course_revenue(c),
            rating: c.rating,
        })
        .collect();

    ranked.sort_by(|a, b| b.students.cmp(&a.students));
    ranked.truncate(limit);
    ranked
}
