use axum::Json;
use axum::extract::{FromRequestParts, Path, Query};
use axum::http::request::Parts;
use axum::routing::{post, put};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::*;
use crate::services::{CourseQuery, CourseQueryParams, PurchaseFlow, collection_stats};
use crate::state::AppState;

/// The logged-in user; rejects the request with 401 when nobody is.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(_parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state.session.require_user().await.map(CurrentUser)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/courses", get(list_courses))
        .route("/courses/{id}", get(get_course))
        .route("/library", get(list_available))
        .route("/my/courses", get(list_purchased))
        .route("/my/courses/{id}/lessons", get(list_lessons))
        .route("/my/courses/{id}/lessons/{lesson_id}/complete", post(complete_lesson))
        .route("/my/courses/{id}/lessons/{lesson_id}/next", get(next_lesson))
        .route("/my/courses/{id}/lessons/{lesson_id}/previous", get(previous_lesson))
        .route("/admin/stats", get(admin_stats))
        .route("/admin/courses", post(create_course))
        .route("/admin/courses/{id}", put(update_course).delete(delete_course))
        .route("/admin/categories", get(list_categories).post(create_category))
        .route("/admin/categories/options", get(category_options))
        .route("/admin/categories/{id}", put(update_category).delete(delete_category))
        .route("/purchases", post(start_purchase))
        .route("/purchases/{id}", get(purchase_status))
        .route("/purchases/{id}/checkout", post(checkout))
        .route("/purchases/{id}/cancel", post(cancel_purchase))
        .route("/purchases/{id}/retry", post(retry_purchase))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<User>, AppError> {
    let user = state.session.login(&req).await?;
    Ok(Json(user))
}

async fn logout(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.session.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

async fn list_courses(
    State(state): State<AppState>,
    Query(params): Query<CourseQueryParams>,
) -> Result<Json<Vec<Course>>, AppError> {
    let query = CourseQuery::from(params);
    let courses = query.apply(&state.catalog.read().await.all());
    Ok(Json(courses))
}

async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Course>, AppError> {
    let catalog = state.catalog.read().await;
    let course = catalog.find(&id).cloned().ok_or(AppError::NotFound)?;
    Ok(Json(course))
}

async fn list_available(State(state): State<AppState>) -> Json<Vec<Course>> {
    Json(state.catalog.read().await.available().to_vec())
}

async fn list_purchased(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Json<Vec<Course>> {
    Json(state.catalog.read().await.purchased().to_vec())
}

async fn list_lessons(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<LessonProgress>, AppError> {
    let progress = state.progress.lessons(&id).await?;
    Ok(Json(progress))
}

async fn complete_lesson(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path((id, lesson_id)): Path<(String, String)>,
) -> Result<Json<LessonProgress>, AppError> {
    let progress = state.progress.complete(&id, &lesson_id).await?;
    Ok(Json(progress))
}

async fn next_lesson(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path((id, lesson_id)): Path<(String, String)>,
) -> Result<Json<Lesson>, AppError> {
    let lesson = state.progress.next(&id, &lesson_id).await?;
    Ok(Json(lesson))
}

async fn previous_lesson(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path((id, lesson_id)): Path<(String, String)>,
) -> Result<Json<Lesson>, AppError> {
    let lesson = state.progress.previous(&id, &lesson_id).await?;
    Ok(Json(lesson))
}

/// Aggregates over the courses matching the same filters as `GET /courses`.
async fn admin_stats(
    State(state): State<AppState>,
    Query(params): Query<CourseQueryParams>,
) -> Json<CollectionStats> {
    let courses = CourseQuery::from(params).apply(&state.catalog.read().await.all());
    Json(collection_stats(&courses))
}

async fn create_course(
    State(state): State<AppState>,
    Json(form): Json<CourseForm>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = state.catalog.write().await.insert(form)?;
    Ok((StatusCode::CREATED, Json(course)))
}

async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<CourseForm>,
) -> Result<Json<Course>, AppError> {
    let course = state.catalog.write().await.update(&id, form)?;
    Ok(Json(course))
}

async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    tokio::time::sleep(state.config.delete_latency).await;
    let removed = state.catalog.write().await.remove(&id);
    let course = removed.ok_or(AppError::NotFound)?;

    state.progress.forget(&course.id).await;
    let dropped = state.purchases.forget_course(&course.id).await;
    tracing::info!(
        "Deleted course {} ({}), dropped {} purchase sessions",
        course.title,
        course.id,
        dropped
    );
    Ok(StatusCode::NO_CONTENT)
}

async fn list_categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    let catalog = state.catalog.read().await;
    Json(state.categories.read().await.list(&catalog))
}

async fn category_options(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.catalog.read().await.category_options())
}

async fn create_category(
    State(state): State<AppState>,
    Json(form): Json<CategoryForm>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let category = state.categories.write().await.create(form)?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<CategoryForm>,
) -> Result<Json<Category>, AppError> {
    let category = state.categories.write().await.update(&id, form)?;
    Ok(Json(category))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.categories.write().await.remove(&id).is_some() {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

async fn start_purchase(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(req): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<PurchaseFlow>), AppError> {
    let flow = state.purchases.start(&req.course_id).await?;
    Ok((StatusCode::CREATED, Json(flow)))
}

async fn purchase_status(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PurchaseFlow>, AppError> {
    let flow = state.purchases.status(id).await?;
    Ok(Json(flow))
}

async fn checkout(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<PurchaseFlow>), AppError> {
    let flow = state.purchases.checkout(id, req).await?;
    Ok((StatusCode::ACCEPTED, Json(flow)))
}

async fn cancel_purchase(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PurchaseFlow>, AppError> {
    let flow = state.purchases.cancel(id).await?;
    Ok(Json(flow))
}

async fn retry_purchase(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PurchaseFlow>, AppError> {
    let flow = state.purchases.retry(id).await?;
    Ok(Json(flow))
}
