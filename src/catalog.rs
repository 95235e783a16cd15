use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Course, CourseFixture, CourseForm};
use crate::validation::validate_course_form;

pub type SharedCatalog = Arc<RwLock<CourseCatalog>>;

/// Authoritative course list, split into the courses the user owns and the
/// ones still for sale. A course id lives in exactly one partition.
#[derive(Debug, Clone, Default)]
pub struct CourseCatalog {
    purchased: Vec<Course>,
    available: Vec<Course>,
}

impl CourseCatalog {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        let fixture: CourseFixture = serde_json::from_str(&raw)?;
        let catalog = Self::from_fixture(fixture)?;
        info!(
            "Loaded {} purchased and {} available courses from {}",
            catalog.purchased.len(),
            catalog.available.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn from_fixture(fixture: CourseFixture) -> Result<Self, AppError> {
        let mut seen = HashSet::new();
        for course in fixture.purchased_courses.iter().chain(&fixture.available_courses) {
            if !seen.insert(course.id.as_str()) {
                return Err(AppError::Fixture(format!("duplicate course id {}", course.id)));
            }
            check_course(course)?;
        }

        Ok(Self {
            purchased: fixture.purchased_courses,
            available: fixture.available_courses,
        })
    }

    pub fn into_shared(self) -> SharedCatalog {
        Arc::new(RwLock::new(self))
    }

    /// Purchased courses first, then available ones.
    pub fn all(&self) -> Vec<Course> {
        self.purchased.iter().chain(&self.available).cloned().collect()
    }

    pub fn purchased(&self) -> &[Course] {
        &self.purchased
    }

    pub fn available(&self) -> &[Course] {
        &self.available
    }

    pub fn len(&self) -> usize {
        self.purchased.len() + self.available.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, id: &str) -> Option<&Course> {
        self.purchased
            .iter()
            .chain(&self.available)
            .find(|c| c.id == id)
    }

    pub fn is_purchased(&self, id: &str) -> bool {
        self.purchased.iter().any(|c| c.id == id)
    }

    pub fn insert(&mut self, form: CourseForm) -> Result<Course, AppError> {
        validate_course_form(&form)?;
        let course = course_from_form(Uuid::new_v4().to_string(), form);
        info!("Added course {} ({})", course.title, course.id);
        self.available.push(course.clone());
        Ok(course)
    }

    /// Replaces the editable fields of a course; learner state
    /// (`progress`, `lastAccessed`) is kept.
    pub fn update(&mut self, id: &str, form: CourseForm) -> Result<Course, AppError> {
        validate_course_form(&form)?;
        let existing = self.find_mut(id).ok_or(AppError::NotFound)?;

        let mut updated = course_from_form(id.to_string(), form);
        updated.progress = existing.progress;
        updated.last_accessed = existing.last_accessed.take();
        *existing = updated.clone();
        Ok(updated)
    }

    pub fn remove(&mut self, id: &str) -> Option<Course> {
        if let Some(pos) = self.purchased.iter().position(|c| c.id == id) {
            return Some(self.purchased.remove(pos));
        }
        let pos = self.available.iter().position(|c| c.id == id)?;
        Some(self.available.remove(pos))
    }

    /// Moves a course from the available partition to the purchased one.
    pub fn record_purchase(&mut self, id: &str) -> Result<Course, AppError> {
        if self.is_purchased(id) {
            return Err(AppError::Conflict(format!("course {} already purchased", id)));
        }
        let pos = self
            .available
            .iter()
            .position(|c| c.id == id)
            .ok_or(AppError::NotFound)?;

        let mut course = self.available.remove(pos);
        course.progress = Some(0);
        course.last_accessed = Some(Utc::now().to_rfc3339());
        self.purchased.push(course.clone());
        Ok(course)
    }

    pub fn set_progress(&mut self, id: &str, progress: u8, accessed_at: String) -> Result<Course, AppError> {
        if progress > 100 {
            return Err(AppError::BadRequest(format!("progress {} out of range", progress)));
        }
        let course = self
            .purchased
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(AppError::NotFound)?;
        course.progress = Some(progress);
        course.last_accessed = Some(accessed_at);
        Ok(course.clone())
    }

    /// Distinct categories in use, sorted.
    pub fn category_options(&self) -> Vec<String> {
        self.purchased
            .iter()
            .chain(&self.available)
            .map(|c| c.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn count_in_category(&self, category: &str) -> usize {
        self.purchased
            .iter()
            .chain(&self.available)
            .filter(|c| c.category == category)
            .count()
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Course> {
        self.purchased
            .iter_mut()
            .chain(self.available.iter_mut())
            .find(|c| c.id == id)
    }
}

fn check_course(course: &Course) -> Result<(), AppError> {
    let fail = |reason: &str| Err(AppError::Fixture(format!("course {}: {}", course.id, reason)));

    if course.id.is_empty() {
        return fail("empty id");
    }
    if course.lessons == 0 {
        return fail("lesson count must be positive");
    }
    if !(0.0..=5.0).contains(&course.rating) {
        return fail("rating must be between 0 and 5");
    }
    if course.price.is_nan() || course.price < 0.0 {
        return fail("price must not be negative");
    }
    if let Some(original) = course.original_price {
        if original <= course.price {
            return fail("original price must exceed price");
        }
    }
    if course.progress.is_some_and(|p| p > 100) {
        return fail("progress must be between 0 and 100");
    }
    Ok(())
}

/// Expects a form that already passed validation.
fn course_from_form(id: String, form: CourseForm) -> Course {
    let (original_price, discount) = if form.has_discount {
        (form.original_price, form.discount)
    } else {
        (None, None)
    };
    let students = if form.is_published {
        Some(form.students.unwrap_or(0).max(0) as u64)
    } else {
        None
    };

    Course {
        id,
        title: form.title.trim().to_string(),
        instructor: form.instructor.trim().to_string(),
        thumbnail: form.thumbnail.trim().to_string(),
        duration: form.duration.trim().to_string(),
        lessons: u32::try_from(form.lessons).unwrap_or(u32::MAX),
        rating: form.rating,
        category: form.category,
        price: form.price,
        original_price,
        discount,
        students,
        level: Some(form.level),
        description: Some(form.description.trim().to_string()),
        progress: None,
        last_accessed: None,
    }
}
