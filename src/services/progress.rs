//! Lesson lists of purchased courses and the completion percentage derived
//! from them.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::catalog::SharedCatalog;
use crate::error::AppError;
use crate::models::{Course, Lesson, LessonProgress};

const REACT_FUNDAMENTALS: &[&str] = &[
    "Introduction to React",
    "JSX Basics",
    "Components and Props",
    "State and Lifecycle",
    "Event Handling",
    "Conditional Rendering",
    "Lists and Keys",
    "Forms and Controlled Components",
    "Hooks Introduction",
    "useState Hook",
    "useEffect Hook",
    "Custom Hooks",
    "Context API",
    "Error Boundaries",
    "Performance Optimization",
    "Testing Basics",
    "Deployment",
    "Advanced Patterns",
    "State Management",
    "Routing",
    "API Integration",
    "Authentication",
    "Real-world Project",
    "Final Project",
];

const ADVANCED_TYPESCRIPT: &[&str] = &[
    "TypeScript Fundamentals Review",
    "Advanced Types",
    "Generics Deep Dive",
    "Utility Types",
    "Decorators",
    "Advanced Interfaces",
    "Type Guards",
    "Discriminated Unions",
    "Conditional Types",
    "Template Literal Types",
    "Mapped Types",
    "Infer Keyword",
    "Advanced Patterns",
    "Performance Optimization",
    "Testing with TypeScript",
    "Build Tools",
    "Module Systems",
    "Declaration Files",
    "Advanced Generics",
    "Type Inference",
    "Branded Types",
    "Exotic Types",
    "Advanced Decorators",
    "Metaprogramming",
    "Compiler API",
    "Performance Tips",
    "Best Practices",
    "Real-world Examples",
    "Advanced Projects",
    "TypeScript with React",
    "TypeScript with Node.js",
    "TypeScript with Angular",
    "TypeScript with Vue",
    "TypeScript with Express",
    "TypeScript with GraphQL",
    "TypeScript with Testing",
    "TypeScript with Build Tools",
];

fn lesson_name(course_title: &str, index: usize) -> String {
    let titles: &[&str] = match course_title {
        "React Fundamentals" => REACT_FUNDAMENTALS,
        "Advanced TypeScript" => ADVANCED_TYPESCRIPT,
        _ => &[],
    };
    titles
        .get(index)
        .map(|t| t.to_string())
        .unwrap_or_else(|| format!("Lesson {}", index + 1))
}

/// Builds the lesson list of a course from its lesson count and stored
/// progress. The first `floor(progress% * lessons)` lessons are completed.
pub fn generate_lessons(course: &Course) -> Vec<Lesson> {
    let total = course.lessons as u64;
    let progress = course.progress.unwrap_or(0).min(100) as u64;
    let completed = (progress * total / 100) as usize;

    (0..course.lessons as usize)
        .map(|index| Lesson {
            id: format!("{}-{}", course.id, index + 1),
            title: format!("Lesson {}: {}", index + 1, lesson_name(&course.title, index)),
            duration: format!("{} min", 10 + (index * 7) % 20),
            completed: index < completed,
        })
        .collect()
}

/// `round(completed / total * 100)`, 0 for an empty course.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    ((completed * 100 + total / 2) / total) as u8
}

pub fn completed_count(lessons: &[Lesson]) -> usize {
    lessons.iter().filter(|l| l.completed).count()
}

/// Marks one lesson complete and returns the new list with its progress.
///
/// Returns `None` for an unknown lesson id. Completing a lesson twice
/// yields the unchanged list.
pub fn complete_lesson(lessons: &[Lesson], lesson_id: &str) -> Option<(Vec<Lesson>, u8)> {
    let position = lessons.iter().position(|l| l.id == lesson_id)?;

    let mut updated = lessons.to_vec();
    updated[position].completed = true;
    let progress = progress_percent(completed_count(&updated), updated.len());
    Some((updated, progress))
}

/// Index after `current`, staying put on the last lesson.
pub fn next_index(len: usize, current: usize) -> usize {
    if current + 1 < len { current + 1 } else { current }
}

/// Index before `current`, staying put on the first lesson.
pub fn previous_index(current: usize) -> usize {
    current.saturating_sub(1)
}

pub struct ProgressTracker {
    catalog: SharedCatalog,
    lessons: RwLock<HashMap<String, Vec<Lesson>>>,
}

impl ProgressTracker {
    pub fn new(catalog: SharedCatalog) -> Self {
        Self {
            catalog,
            lessons: RwLock::new(HashMap::new()),
        }
    }

    pub async fn lessons(&self, course_id: &str) -> Result<LessonProgress, AppError> {
        let course = self.purchased_course(course_id).await?;
        let mut lessons = self.lessons.write().await;
        let list = self.lesson_list(&mut lessons, &course).await?;

        Ok(LessonProgress {
            course_id: course.id.clone(),
            progress: progress_percent(completed_count(list), list.len()),
            lessons: list.clone(),
        })
    }

    pub async fn complete(&self, course_id: &str, lesson_id: &str) -> Result<LessonProgress, AppError> {
        let course = self.purchased_course(course_id).await?;
        let mut lessons = self.lessons.write().await;
        let list = self.lesson_list(&mut lessons, &course).await?;

        let (updated, progress) = complete_lesson(list, lesson_id).ok_or(AppError::NotFound)?;
        if updated == *list {
            debug!("Lesson {} already completed", lesson_id);
        } else {
            *list = updated.clone();
            self.catalog
                .write()
                .await
                .set_progress(course_id, progress, Utc::now().to_rfc3339())?;
            info!("Completed lesson {} - course {} at {}%", lesson_id, course_id, progress);
        }

        Ok(LessonProgress {
            course_id: course.id,
            lessons: updated,
            progress,
        })
    }

    pub async fn next(&self, course_id: &str, lesson_id: &str) -> Result<Lesson, AppError> {
        self.step(course_id, lesson_id, |len, current| next_index(len, current)).await
    }

    pub async fn previous(&self, course_id: &str, lesson_id: &str) -> Result<Lesson, AppError> {
        self.step(course_id, lesson_id, |_, current| previous_index(current)).await
    }

    async fn step<F>(&self, course_id: &str, lesson_id: &str, advance: F) -> Result<Lesson, AppError>
    where
        F: Fn(usize, usize) -> usize,
    {
        let course = self.purchased_course(course_id).await?;
        let mut lessons = self.lessons.write().await;
        let list = self.lesson_list(&mut lessons, &course).await?;

        let current = list
            .iter()
            .position(|l| l.id == lesson_id)
            .ok_or(AppError::NotFound)?;
        Ok(list[advance(list.len(), current)].clone())
    }

    /// Drops the cached lessons of a removed course.
    pub async fn forget(&self, course_id: &str) -> bool {
        self.lessons.write().await.remove(course_id).is_some()
    }

    pub async fn is_cached(&self, course_id: &str) -> bool {
        self.lessons.read().await.contains_key(course_id)
    }

    // The stored percentage follows the lesson list, which can only
    // represent whole lessons.
    async fn lesson_list<'a>(
        &self,
        cache: &'a mut HashMap<String, Vec<Lesson>>,
        course: &Course,
    ) -> Result<&'a mut Vec<Lesson>, AppError> {
        let list = ensure_lessons(cache, course);
        let progress = progress_percent(completed_count(list), list.len());
        if course.progress != Some(progress) {
            let accessed_at = course
                .last_accessed
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339());
            self.catalog
                .write()
                .await
                .set_progress(&course.id, progress, accessed_at)?;
            debug!("Course {} progress aligned to {}%", course.id, progress);
        }
        Ok(list)
    }

    async fn purchased_course(&self, course_id: &str) -> Result<Course, AppError> {
        let catalog = self.catalog.read().await;
        let course = catalog.find(course_id).ok_or(AppError::NotFound)?;
        if !catalog.is_purchased(course_id) {
            return Err(AppError::Conflict(format!(
                "course {} has not been purchased",
                course_id
            )));
        }
        Ok(course.clone())
    }
}

// Lesson state is generated once per course; a changed lesson count
// invalidates it.
fn ensure_lessons<'a>(lessons: &'a mut HashMap<String, Vec<Lesson>>, course: &Course) -> &'a mut Vec<Lesson> {
    let entry = lessons
        .entry(course.id.clone())
        .or_insert_with(|| generate_lessons(course));
    if entry.len() != course.lessons as usize {
        *entry = generate_lessons(course);
    }
    entry
}
