use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::catalog::CourseCatalog;
use crate::error::AppError;
use crate::models::{Category, CategoryForm};
use crate::validation::{CATEGORY_COLORS, validate_category_form};

#[derive(Debug, Clone, Default)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
}

impl CategoryRegistry {
    /// One active category per name, colors assigned round-robin.
    pub fn seed(names: &[String]) -> Self {
        let now = Utc::now().to_rfc3339();
        let categories = names
            .iter()
            .enumerate()
            .map(|(i, name)| Category {
                id: Uuid::new_v4().to_string(),
                name: name.clone(),
                description: format!("{} courses", name),
                color: CATEGORY_COLORS[i % CATEGORY_COLORS.len()].to_string(),
                icon: "book-open".to_string(),
                course_count: 0,
                is_active: true,
                created_at: now.clone(),
                updated_at: now.clone(),
            })
            .collect();
        Self { categories }
    }

    /// Categories sorted by name with course counts taken from `catalog`.
    pub fn list(&self, catalog: &CourseCatalog) -> Vec<Category> {
        let mut categories: Vec<Category> = self
            .categories
            .iter()
            .cloned()
            .map(|mut c| {
                c.course_count = catalog.count_in_category(&c.name);
                c
            })
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        categories
    }

    pub fn create(&mut self, form: CategoryForm) -> Result<Category, AppError> {
        validate_category_form(&form)?;
        self.ensure_unique(&form.name, None)?;

        let now = Utc::now().to_rfc3339();
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: form.name.trim().to_string(),
            description: form.description.trim().to_string(),
            color: form.color,
            icon: form.icon,
            course_count: 0,
            is_active: form.is_active,
            created_at: now.clone(),
            updated_at: now,
        };
        info!("Created category {}", category.name);
        self.categories.push(category.clone());
        Ok(category)
    }

    pub fn update(&mut self, id: &str, form: CategoryForm) -> Result<Category, AppError> {
        validate_category_form(&form)?;
        self.ensure_unique(&form.name, Some(id))?;

        let category = self
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(AppError::NotFound)?;
        category.name = form.name.trim().to_string();
        category.description = form.description.trim().to_string();
        category.color = form.color;
        category.icon = form.icon;
        category.is_active = form.is_active;
        category.updated_at = Utc::now().to_rfc3339();
        Ok(category.clone())
    }

    pub fn remove(&mut self, id: &str) -> Option<Category> {
        let pos = self.categories.iter().position(|c| c.id == id)?;
        Some(self.categories.remove(pos))
    }

    fn ensure_unique(&self, name: &str, except_id: Option<&str>) -> Result<(), AppError> {
        let name = name.trim().to_lowercase();
        let taken = self
            .categories
            .iter()
            .any(|c| Some(c.id.as_str()) != except_id && c.name.to_lowercase() == name);
        if taken {
            return Err(AppError::Conflict(format!("category {} already exists", name)));
        }
        Ok(())
    }
}
