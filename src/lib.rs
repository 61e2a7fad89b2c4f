pub mod auth;
pub mod bookings;
pub mod classes;
pub mod clock;
pub mod error;
pub mod handlers;
pub mod ical;
pub mod models;
pub mod openapi;
pub mod repository;
pub mod schedule;
pub mod settings;
pub mod store;
pub mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use handlers::{
    cancel_booking, create_booking, create_classes, delete_class, get_class, get_ical,
    get_occupancy, healthz_live, healthz_ready, list_bookings, list_classes, preview_schedule,
    root,
};
use tower_http::LatencyUnit;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::bookings::BookingService;
use crate::classes::ClassService;
use crate::clock::{Clock, SystemClock};
use crate::ical::ICalExporter;
use crate::openapi::ApiDoc;
use crate::settings::Settings;
use crate::store::{DocumentStore, MemoryStore};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub classes: Arc<ClassService>,
    pub bookings: Arc<BookingService>,
    pub exporter: Arc<ICalExporter>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(settings: Settings, store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            classes: Arc::new(ClassService::new(store.clone(), clock.clone())),
            bookings: Arc::new(BookingService::new(store, clock.clone())),
            exporter: Arc::new(ICalExporter::new(settings.calendar_name.clone())),
            settings,
            clock,
        }
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    let env_filter = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .without_time()
        .init();

    let state = AppState::new(
        settings,
        Arc::new(MemoryStore::new()),
        Arc::new(SystemClock),
    );

    let app = build_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.settings.port));
    info!(timezone = %state.settings.timezone, "Starting Studio Schedule API on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    let mut router = Router::new()
        .route("/", get(root))
        .route("/healthz/live", get(healthz_live))
        .route("/healthz/ready", get(healthz_ready))
        .route("/schedule/preview", post(preview_schedule))
        .route(
            "/organisations/{organisation}/classes",
            get(list_classes).post(create_classes),
        )
        .route("/organisations/{organisation}/classes.ical", get(get_ical))
        .route(
            "/organisations/{organisation}/classes/{id}",
            get(get_class).delete(delete_class),
        )
        .route(
            "/organisations/{organisation}/classes/{id}/occupancy",
            get(get_occupancy),
        )
        .route(
            "/organisations/{organisation}/bookings",
            get(list_bookings).post(create_booking),
        )
        .route(
            "/organisations/{organisation}/bookings/{id}/cancel",
            post(cancel_booking),
        )
        .with_state(state.clone());

    if state.settings.enable_swagger {
        let openapi = ApiDoc::openapi();
        let swagger = SwaggerUi::new("/docs").url("/openapi.json", openapi);
        router = router.merge(swagger);
    }

    router.layer(trace_layer).layer(CorsLayer::permissive())
}
