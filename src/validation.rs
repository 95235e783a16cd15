//! Form validation shared by the admin, checkout and login endpoints.
//!
//! Every validator collects all failing fields before returning, at most one
//! message per field, so clients can render the errors inline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{CategoryForm, CheckoutRequest, CourseForm, PaymentMethod};

pub const CATEGORY_COLORS: [&str; 12] = [
    "#3B82F6", "#10B981", "#8B5CF6", "#F59E0B", "#EF4444", "#06B6D4", "#84CC16", "#DC2626",
    "#7C3AED", "#059669", "#EA580C", "#BE185D",
];

pub const CATEGORY_ICONS: [&str; 16] = [
    "code",
    "server",
    "smartphone",
    "bar-chart-3",
    "palette",
    "languages",
    "settings",
    "shield",
    "database",
    "wrench",
    "book-open",
    "graduation-cap",
    "users",
    "globe",
    "cpu",
    "cloud",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error unless the field already has one.
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        if self.get(field).is_none() {
            self.errors.push(FieldError {
                field: field.to_string(),
                message: message.into(),
            });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn into_fields(self) -> Vec<FieldError> {
        self.errors
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn validate_course_form(form: &CourseForm) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if is_blank(&form.title) {
        errors.push("title", "Title is required");
    }
    if is_blank(&form.instructor) {
        errors.push("instructor", "Instructor is required");
    }
    if is_blank(&form.thumbnail) {
        errors.push("thumbnail", "Thumbnail URL is required");
    }
    if is_blank(&form.duration) {
        errors.push("duration", "Duration is required");
    }
    if form.lessons <= 0 {
        errors.push("lessons", "Number of lessons must be greater than 0");
    } else if u32::try_from(form.lessons).is_err() {
        errors.push("lessons", "Number of lessons is too large");
    }
    if !(0.0..=5.0).contains(&form.rating) {
        errors.push("rating", "Rating must be between 0 and 5");
    }
    if is_blank(&form.category) {
        errors.push("category", "Category is required");
    }
    if form.price.is_nan() || form.price <= 0.0 {
        errors.push("price", "Price must be greater than 0");
    }
    if form.has_discount {
        match form.original_price {
            Some(original) if original > form.price => {}
            _ => errors.push("originalPrice", "Original price must be greater than sale price"),
        }
        match form.discount {
            Some(discount) if discount > 0.0 => {}
            _ => errors.push("discount", "Discount must be greater than 0"),
        }
    }
    if form.is_published && form.students.is_some_and(|s| s < 0) {
        errors.push("students", "Students count cannot be negative");
    }
    if is_blank(&form.description) {
        errors.push("description", "Description is required");
    }

    errors.into_result()
}

pub fn validate_category_form(form: &CategoryForm) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if is_blank(&form.name) {
        errors.push("name", "Category name is required");
    }
    if is_blank(&form.description) {
        errors.push("description", "Description is required");
    }
    if form.color.is_empty() {
        errors.push("color", "Color is required");
    } else if !CATEGORY_COLORS.contains(&form.color.as_str()) {
        errors.push("color", "Unknown color");
    }
    if form.icon.is_empty() {
        errors.push("icon", "Icon is required");
    } else if !CATEGORY_ICONS.contains(&form.icon.as_str()) {
        errors.push("icon", "Unknown icon");
    }

    errors.into_result()
}

/// Gate for leaving `AwaitingPaymentDetails`.
pub fn validate_checkout(req: &CheckoutRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if !req.accept_terms {
        errors.push("acceptTerms", "Please accept the terms and conditions");
    }
    if req.payment_method == PaymentMethod::CreditCard {
        let card = &req.card;
        if is_blank(&card.cardholder_name) {
            errors.push("cardholderName", "Cardholder name is required");
        }
        if is_blank(&card.card_number) {
            errors.push("cardNumber", "Card number is required");
        }
        if is_blank(&card.expiry_date) {
            errors.push("expiryDate", "Expiry date is required");
        }
        if is_blank(&card.cvv) {
            errors.push("cvv", "CVV is required");
        }
    }

    errors.into_result()
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if is_blank(email) {
        errors.push("email", "Email is required");
    }
    if password.is_empty() {
        errors.push("password", "Password is required");
    }

    errors.into_result()
}
