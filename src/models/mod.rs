pub mod category;
pub mod course;
pub mod lesson;
pub mod purchase;
pub mod stats;
pub mod user;

pub use category::{Category, CategoryForm};
pub use course::{Course, CourseFixture, CourseForm, Level};
pub use lesson::{Lesson, LessonProgress};
pub use purchase::{CardDetails, CheckoutRequest, PaymentMethod, PurchaseEvent, PurchaseRequest};
pub use stats::{CollectionStats, CoursePurchaseStats};
pub use user::{LoginRequest, User};
