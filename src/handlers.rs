use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::{Json, http::StatusCode, response::IntoResponse};
use axum_extra::extract::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    AppState,
    auth::verify_token,
    error::ApiError,
    models::{
        Booking, BookingRequest, BookingStatus, ClassOccurrence, ClassRequest,
        ClassWithOccupancy, Occupancy, SchedulePreview,
    },
};

type BearerHeader = Option<TypedHeader<Authorization<Bearer>>>;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClassListQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingListQuery {
    pub status: Option<BookingStatus>,
    pub class_id: Option<String>,
    pub token: Option<String>,
}

fn authorize(state: &AppState, auth: BearerHeader, token: Option<&str>) -> Result<(), ApiError> {
    let auth_header = auth.map(|TypedHeader(a)| a);
    verify_token(&state.settings, auth_header, token)
}

fn today(state: &AppState) -> NaiveDate {
    state
        .clock
        .now()
        .with_timezone(&state.settings.timezone)
        .date_naive()
}

#[utoipa::path(get, path = "/", tag = "schedule")]
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Studio Schedule API",
        "endpoints": {
            "/schedule/preview": "Preview the dates of a class request",
            "/organisations/{organisation}/classes": "List or create classes",
            "/organisations/{organisation}/classes.ical": "Download the class schedule as iCal file",
            "/organisations/{organisation}/bookings": "List or create bookings"
        }
    }))
}

#[utoipa::path(get, path = "/healthz/live", tag = "schedule")]
pub async fn healthz_live() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(get, path = "/healthz/ready", tag = "schedule")]
pub async fn healthz_ready() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(
    post,
    path = "/schedule/preview",
    params(
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    request_body = ClassRequest,
    responses(
        (status = 200, description = "Dates the request would create", body = SchedulePreview),
        (status = 400, description = "Invalid class request"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "schedule"
)]
pub async fn preview_schedule(
    State(state): State<AppState>,
    auth: BearerHeader,
    Query(query): Query<TokenQuery>,
    body: Result<Json<ClassRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let Json(request) = body?;
    let occurrences = state.classes.preview(&request)?;
    Ok(Json(SchedulePreview { occurrences }))
}

#[utoipa::path(
    get,
    path = "/organisations/{organisation}/classes",
    params(
        ("organisation" = String, Path, description = "Organisation id"),
        ("from" = Option<String>, Query, description = "First date to include, YYYY-MM-DD (defaults to today)"),
        ("to" = Option<String>, Query, description = "Last date to include, YYYY-MM-DD"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Classes with their live booked count", body = [ClassWithOccupancy]),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "classes"
)]
pub async fn list_classes(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(organisation): Path<String>,
    Query(query): Query<ClassListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let from = query.from.unwrap_or_else(|| today(&state));
    let classes = state
        .classes
        .list_with_occupancy(&organisation, Some(from), query.to)
        .await?;
    Ok(Json(classes))
}

#[utoipa::path(
    post,
    path = "/organisations/{organisation}/classes",
    params(
        ("organisation" = String, Path, description = "Organisation id"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    request_body = ClassRequest,
    responses(
        (status = 201, description = "Created classes", body = [ClassOccurrence]),
        (status = 400, description = "Invalid class request"),
        (status = 401, description = "Invalid authentication token"),
        (status = 500, description = "Saving failed; some classes may have been created")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "classes"
)]
pub async fn create_classes(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(organisation): Path<String>,
    Query(query): Query<TokenQuery>,
    body: Result<Json<ClassRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let Json(request) = body?;
    let created = state.classes.create_classes(&organisation, &request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/organisations/{organisation}/classes/{id}",
    params(
        ("organisation" = String, Path, description = "Organisation id"),
        ("id" = String, Path, description = "Class id"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Class with its live booked count", body = ClassWithOccupancy),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Class not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "classes"
)]
pub async fn get_class(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path((organisation, id)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let class = state.classes.get_class(&organisation, &id).await?;
    let occupancy = state.classes.occupancy(&class).await?;
    Ok(Json(ClassWithOccupancy { class, occupancy }))
}

#[utoipa::path(
    delete,
    path = "/organisations/{organisation}/classes/{id}",
    params(
        ("organisation" = String, Path, description = "Organisation id"),
        ("id" = String, Path, description = "Class id"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 204, description = "Class deleted"),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Class not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "classes"
)]
pub async fn delete_class(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path((organisation, id)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    state.classes.delete_class(&organisation, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/organisations/{organisation}/classes/{id}/occupancy",
    params(
        ("organisation" = String, Path, description = "Organisation id"),
        ("id" = String, Path, description = "Class id"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Confirmed bookings against capacity", body = Occupancy),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Class not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "classes"
)]
pub async fn get_occupancy(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path((organisation, id)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let class = state.classes.get_class(&organisation, &id).await?;
    Ok(Json(state.classes.occupancy(&class).await?))
}

#[utoipa::path(
    get,
    path = "/organisations/{organisation}/classes.ical",
    params(
        ("organisation" = String, Path, description = "Organisation id"),
        ("from" = Option<String>, Query, description = "First date to include, YYYY-MM-DD (defaults to today)"),
        ("to" = Option<String>, Query, description = "Last date to include, YYYY-MM-DD"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "iCal file", content_type = "text/calendar"),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "No classes found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "classes"
)]
pub async fn get_ical(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(organisation): Path<String>,
    Query(query): Query<ClassListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let from = query.from.unwrap_or_else(|| today(&state));
    let classes = state
        .classes
        .list_classes(&organisation, Some(from), query.to)
        .await?;

    if classes.is_empty() {
        return Err(ApiError::NotFound("No classes found".into()));
    }

    let body = state.exporter.generate(&classes);
    Ok((
        StatusCode::OK,
        [
            ("content-type", "text/calendar"),
            (
                "content-disposition",
                "attachment; filename=class_schedule.ics",
            ),
        ],
        body,
    ))
}

#[utoipa::path(
    get,
    path = "/organisations/{organisation}/bookings",
    params(
        ("organisation" = String, Path, description = "Organisation id"),
        ("status" = Option<BookingStatus>, Query, description = "Only bookings with this status"),
        ("classId" = Option<String>, Query, description = "Only bookings for this class"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Bookings ordered by booking time", body = [Booking]),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "bookings"
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(organisation): Path<String>,
    Query(query): Query<BookingListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let bookings = state
        .bookings
        .list_bookings(&organisation, query.status, query.class_id.as_deref())
        .await?;
    Ok(Json(bookings))
}

#[utoipa::path(
    post,
    path = "/organisations/{organisation}/bookings",
    params(
        ("organisation" = String, Path, description = "Organisation id"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    request_body = BookingRequest,
    responses(
        (status = 201, description = "Confirmed booking", body = Booking),
        (status = 400, description = "Invalid booking request"),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Class not found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(organisation): Path<String>,
    Query(query): Query<TokenQuery>,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let Json(request) = body?;
    let booking = state.bookings.create_booking(&organisation, &request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

#[utoipa::path(
    post,
    path = "/organisations/{organisation}/bookings/{id}/cancel",
    params(
        ("organisation" = String, Path, description = "Organisation id"),
        ("id" = String, Path, description = "Booking id"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Cancelled booking", body = Booking),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is not confirmed")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "bookings"
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path((organisation, id)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let booking = state.bookings.cancel_booking(&organisation, &id).await?;
    Ok(Json(booking))
}
