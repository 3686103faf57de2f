use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::otp::send_otp,
        handlers::otp::verify_otp,
        handlers::session::get_session,
        handlers::health::health,
    ),
    components(
        schemas(
            SendOtpRequest,
            SendOtpResponse,
            VerifyOtpRequest,
            VerifyOtpResponse,
            SessionResponse,
            HealthResponse,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "otp", description = "Phone OTP authentication API"),
        (name = "session", description = "Session token API"),
        (name = "health", description = "Service health"),
    ),
    info(
        title = "South Bay Mart API",
        version = "1.0.0",
        description = "South Bay Mart backend REST API documentation",
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_otp_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/send-otp"));
        assert!(doc.paths.paths.contains_key("/api/verify-otp"));
        assert!(doc.paths.paths.contains_key("/api/session"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
