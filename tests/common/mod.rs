#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use learnhub::catalog::CourseCatalog;
use learnhub::config::AppConfig;
use learnhub::db;
use learnhub::models::{Course, CourseFixture};
use learnhub::payment::{PaymentGateway, SimulatedGateway};
use learnhub::state::AppState;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

pub fn course(id: &str) -> Course {
    Course {
        id: id.to_string(),
        title: format!("Course {}", id),
        instructor: "Jane Doe".to_string(),
        thumbnail: "https://example.com/thumb.png".to_string(),
        duration: "2h 00m".to_string(),
        lessons: 4,
        rating: 4.0,
        category: "Design".to_string(),
        price: 10.0,
        original_price: None,
        discount: None,
        students: None,
        level: None,
        description: None,
        progress: None,
        last_accessed: None,
    }
}

/// Two purchased courses ("p1", "p2") and three for sale ("a1" .. "a3").
pub fn fixture() -> CourseFixture {
    let mut p1 = course("p1");
    p1.title = "React Fundamentals".to_string();
    p1.category = "Frontend Development".to_string();
    p1.progress = Some(25);
    p1.last_accessed = Some("2024-01-15".to_string());

    let mut p2 = course("p2");
    p2.title = "Advanced TypeScript".to_string();
    p2.category = "Programming Languages".to_string();
    p2.lessons = 10;
    p2.progress = Some(0);

    let mut a1 = course("a1");
    a1.title = "Python for Data Science".to_string();
    a1.category = "Data Science".to_string();
    a1.price = 99.0;
    a1.original_price = Some(149.0);
    a1.discount = Some(33.0);
    a1.students = Some(1000);

    let mut a2 = course("a2");
    a2.title = "UI Design".to_string();
    a2.price = 50.0;
    a2.students = Some(200);

    let mut a3 = course("a3");
    a3.title = "Ethical Hacking".to_string();
    a3.category = "Cybersecurity".to_string();
    a3.price = 80.0;

    CourseFixture {
        purchased_courses: vec![p1, p2],
        available_courses: vec![a1, a2, a3],
    }
}

pub fn catalog() -> CourseCatalog {
    CourseCatalog::from_fixture(fixture()).expect("Failed to build catalog")
}

pub async fn memory_pool() -> SqlitePool {
    // a single connection, otherwise every pooled connection gets its own
    // in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create database");
    db::migrate(&pool).await.expect("Failed to run migrations");
    pool
}

pub fn test_config() -> AppConfig {
    AppConfig {
        payment_latency: Duration::from_millis(10),
        delete_latency: Duration::ZERO,
        ..AppConfig::default()
    }
}

pub async fn app_state() -> AppState {
    let config = test_config();
    let gateway: Arc<dyn PaymentGateway> = Arc::new(
        SimulatedGateway::new(config.payment_latency).decline_card("4000 0000 0000 0002"),
    );
    AppState::build(config, memory_pool().await, catalog(), gateway)
        .await
        .expect("Failed to build app state")
}
