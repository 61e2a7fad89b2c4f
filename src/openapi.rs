use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::models::{
    Booking, BookingRequest, BookingStatus, ClassOccurrence, ClassRequest, ClassWithOccupancy,
    Occupancy, SchedulePreview,
};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
        components.add_security_scheme(
            "query_token",
            SecurityScheme::ApiKey(ApiKey::Query(ApiKeyValue::new("token"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz_live,
        crate::handlers::healthz_ready,
        crate::handlers::preview_schedule,
        crate::handlers::list_classes,
        crate::handlers::create_classes,
        crate::handlers::get_class,
        crate::handlers::delete_class,
        crate::handlers::get_occupancy,
        crate::handlers::get_ical,
        crate::handlers::list_bookings,
        crate::handlers::create_booking,
        crate::handlers::cancel_booking
    ),
    components(schemas(
        ClassOccurrence,
        ClassRequest,
        ClassWithOccupancy,
        Occupancy,
        SchedulePreview,
        Booking,
        BookingRequest,
        BookingStatus
    )),
    tags(
        (name = "schedule", description = "Service info and schedule previews"),
        (name = "classes", description = "Class occurrences and their occupancy"),
        (name = "bookings", description = "Bookings and cancellations")
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;
