pub mod categories;
pub mod progress;
pub mod purchase;
pub mod query;
pub mod session;
pub mod stats;

pub use categories::CategoryRegistry;
pub use progress::ProgressTracker;
pub use purchase::{PurchaseFlow, PurchaseService, PurchaseState};
pub use query::{CourseQuery, CourseQueryParams, SortKey, StatusFilter};
pub use session::SessionContext;
pub use stats::collection_stats;
