mod common;

use common::{catalog, course, fixture};
use learnhub::catalog::CourseCatalog;
use learnhub::error::AppError;
use learnhub::models::{CategoryForm, CourseFixture, CourseForm, Level};
use learnhub::payment::{format_card_number, format_expiry_date};
use learnhub::services::CategoryRegistry;

fn valid_form() -> CourseForm {
    CourseForm {
        title: "Rust in Practice".to_string(),
        instructor: "Ferris".to_string(),
        thumbnail: "https://example.com/rust.png".to_string(),
        duration: "12h 30m".to_string(),
        lessons: 20,
        rating: 4.5,
        category: "Programming Languages".to_string(),
        price: 59.0,
        level: Level::Intermediate,
        description: "Ownership, traits and async".to_string(),
        ..CourseForm::default()
    }
}

#[test]
fn test_fixture_rejects_duplicate_ids() {
    let mut fixture = fixture();
    fixture.available_courses.push(course("p1"));

    let result = CourseCatalog::from_fixture(fixture);
    assert!(matches!(result, Err(AppError::Fixture(_))));
}

#[test]
fn test_fixture_rejects_invalid_courses() {
    let mut zero_lessons = course("x");
    zero_lessons.lessons = 0;
    let mut bad_rating = course("x");
    bad_rating.rating = 5.5;
    let mut bad_discount = course("x");
    bad_discount.original_price = Some(5.0);

    for invalid in [zero_lessons, bad_rating, bad_discount] {
        let fixture = CourseFixture {
            purchased_courses: Vec::new(),
            available_courses: vec![invalid],
        };
        assert!(CourseCatalog::from_fixture(fixture).is_err());
    }
}

#[test]
fn test_fixture_file_parses() {
    let raw = r#"{
        "purchasedCourses": [{
            "id": "1", "title": "React", "instructor": "Sarah", "thumbnail": "t.png",
            "duration": "8h", "lessons": 24, "rating": 4.8, "category": "Frontend Development",
            "price": 89.99, "progress": 75, "lastAccessed": "2024-01-15"
        }],
        "availableCourses": []
    }"#;
    let fixture: CourseFixture = serde_json::from_str(raw).expect("Failed to parse fixture");
    let catalog = CourseCatalog::from_fixture(fixture).expect("Failed to build catalog");

    let course = catalog.find("1").expect("course missing");
    assert_eq!(course.progress, Some(75));
    assert_eq!(course.last_accessed.as_deref(), Some("2024-01-15"));
    assert!(catalog.is_purchased("1"));
}

#[test]
fn test_insert_validates_and_assigns_id() {
    let mut catalog = catalog();
    let before = catalog.len();

    let course = catalog.insert(valid_form()).expect("Failed to insert course");

    assert!(!course.id.is_empty());
    assert_eq!(catalog.len(), before + 1);
    assert!(!catalog.is_purchased(&course.id));
    // unpublished drafts carry no student count
    assert!(!course.is_published());
    assert_eq!(course.original_price, None);
}

#[test]
fn test_invalid_form_reports_every_field() {
    let form = CourseForm {
        lessons: 0,
        rating: 7.0,
        price: 0.0,
        has_discount: true,
        original_price: Some(10.0),
        discount: Some(0.0),
        is_published: true,
        students: Some(-1),
        ..CourseForm::default()
    };

    let Err(AppError::Validation(errors)) = catalog().insert(form) else {
        panic!("expected a validation error");
    };
    for field in [
        "title",
        "instructor",
        "thumbnail",
        "duration",
        "lessons",
        "rating",
        "category",
        "price",
        "discount",
        "students",
        "description",
    ] {
        assert!(errors.get(field).is_some(), "no error for {}", field);
    }
    assert_eq!(errors.get("price"), Some("Price must be greater than 0"));
}

#[test]
fn test_discount_requires_higher_original_price() {
    let form = CourseForm {
        has_discount: true,
        original_price: Some(40.0),
        discount: Some(20.0),
        ..valid_form()
    };

    let Err(AppError::Validation(errors)) = catalog().insert(form) else {
        panic!("expected a validation error");
    };
    assert_eq!(errors.len(), 1);
    assert!(errors.get("originalPrice").is_some());
}

#[test]
fn test_published_discounted_course() {
    let form = CourseForm {
        has_discount: true,
        original_price: Some(99.0),
        discount: Some(40.0),
        is_published: true,
        students: Some(12),
        ..valid_form()
    };

    let course = catalog().insert(form).expect("Failed to insert course");
    assert_eq!(course.original_price, Some(99.0));
    assert_eq!(course.discount, Some(40.0));
    assert_eq!(course.students, Some(12));
    assert_eq!(course.revenue_basis(), 99.0);
}

#[test]
fn test_update_keeps_learner_state() {
    let mut catalog = catalog();

    let updated = catalog
        .update("p1", valid_form())
        .expect("Failed to update course");

    assert_eq!(updated.title, "Rust in Practice");
    assert_eq!(updated.progress, Some(25));
    assert_eq!(updated.last_accessed.as_deref(), Some("2024-01-15"));
    assert!(catalog.is_purchased("p1"));
}

#[test]
fn test_update_unknown_course() {
    let result = catalog().update("missing", valid_form());
    assert!(matches!(result, Err(AppError::NotFound)));
}

#[test]
fn test_remove_course() {
    let mut catalog = catalog();

    assert!(catalog.remove("a2").is_some());
    assert!(catalog.find("a2").is_none());
    assert!(catalog.remove("a2").is_none());
}

#[test]
fn test_record_purchase_moves_course() {
    let mut catalog = catalog();

    let course = catalog.record_purchase("a1").expect("Failed to record purchase");

    assert_eq!(course.progress, Some(0));
    assert!(course.last_accessed.is_some());
    assert!(catalog.is_purchased("a1"));
    assert!(catalog.available().iter().all(|c| c.id != "a1"));
    assert!(matches!(catalog.record_purchase("a1"), Err(AppError::Conflict(_))));
    assert!(matches!(catalog.record_purchase("nope"), Err(AppError::NotFound)));
}

#[test]
fn test_set_progress() {
    let mut catalog = catalog();

    let course = catalog
        .set_progress("p2", 40, "2024-03-01T10:00:00Z".to_string())
        .expect("Failed to set progress");
    assert_eq!(course.progress, Some(40));

    assert!(catalog.set_progress("p2", 101, String::new()).is_err());
    assert!(matches!(
        catalog.set_progress("a1", 10, String::new()),
        Err(AppError::NotFound)
    ));
}

#[test]
fn test_category_options_are_sorted_and_distinct() {
    let options = catalog().category_options();
    assert_eq!(
        options,
        vec![
            "Cybersecurity",
            "Data Science",
            "Design",
            "Frontend Development",
            "Programming Languages",
        ]
    );
}

#[test]
fn test_category_registry_lists_with_counts() {
    let catalog = catalog();
    let registry = CategoryRegistry::seed(&catalog.category_options());

    let categories = registry.list(&catalog);

    assert_eq!(categories.len(), 5);
    let design = categories
        .iter()
        .find(|c| c.name == "Design")
        .expect("Design category missing");
    assert_eq!(design.course_count, 1);
    assert!(categories.iter().all(|c| c.is_active));
}

#[test]
fn test_category_names_are_unique() {
    let mut registry = CategoryRegistry::seed(&["Design".to_string()]);

    let form = CategoryForm {
        name: "design".to_string(),
        description: "Duplicate".to_string(),
        ..CategoryForm::default()
    };
    assert!(matches!(registry.create(form), Err(AppError::Conflict(_))));

    let created = registry
        .create(CategoryForm {
            name: "DevOps".to_string(),
            description: "Pipelines and infrastructure".to_string(),
            icon: "cloud".to_string(),
            ..CategoryForm::default()
        })
        .expect("Failed to create category");
    assert_eq!(created.color, "#3B82F6");

    // renaming to its own name is fine
    let renamed = registry
        .update(
            &created.id,
            CategoryForm {
                name: "DevOps".to_string(),
                description: "CI/CD".to_string(),
                ..CategoryForm::default()
            },
        )
        .expect("Failed to update category");
    assert_eq!(renamed.description, "CI/CD");

    assert!(registry.remove(&created.id).is_some());
    assert!(registry.remove(&created.id).is_none());
}

#[test]
fn test_category_form_rejects_unknown_palette() {
    let mut registry = CategoryRegistry::default();
    let form = CategoryForm {
        name: "Music".to_string(),
        description: "Theory".to_string(),
        color: "#000000".to_string(),
        icon: "guitar".to_string(),
        is_active: true,
    };

    let Err(AppError::Validation(errors)) = registry.create(form) else {
        panic!("expected a validation error");
    };
    assert!(errors.get("color").is_some());
    assert!(errors.get("icon").is_some());
}

#[test]
fn test_card_input_formatting() {
    assert_eq!(format_card_number("4242424242424242"), "4242 4242 4242 4242");
    assert_eq!(format_card_number("4242-4242-42"), "4242 4242 42");
    assert_eq!(format_card_number("42"), "42");
    assert_eq!(format_card_number("42424242424242429999"), "4242 4242 4242 4242");

    assert_eq!(format_expiry_date("1225"), "12/25");
    assert_eq!(format_expiry_date("12/2"), "12/2");
    assert_eq!(format_expiry_date("1"), "1");
}
