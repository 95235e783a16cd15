use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub duration: String,
    pub completed: bool,
}

/// Lesson list of a course together with the derived progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonProgress {
    pub course_id: String,
    pub lessons: Vec<Lesson>,
    pub progress: u8,
}
