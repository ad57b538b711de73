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
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::user::get_profile,
        handlers::user::update_profile,
        handlers::user::dashboard,
        handlers::draw::list_draws,
        handlers::draw::past_draws,
        handlers::draw::get_draw,
        handlers::draw::create_draw,
        handlers::draw::update_draw,
        handlers::draw::delete_draw,
        handlers::participant::join_draw,
        handlers::participant::my_participation,
        handlers::winner::select_winner,
        handlers::winner::list_winners,
    ),
    components(
        schemas(
            UserRole,
            RegisterRequest,
            LoginRequest,
            RefreshRequest,
            UpdateProfileRequest,
            UserResponse,
            AuthResponse,
            CreateDrawRequest,
            UpdateDrawRequest,
            DrawResponse,
            DrawSummary,
            DrawDetailResponse,
            DashboardResponse,
            JoinDrawRequest,
            ParticipantResponse,
            WinnerResponse,
            WinnerSelectionResponse,
            WinnerRecordResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authentication API"),
        (name = "users", description = "User profile and dashboard API"),
        (name = "draws", description = "Draw lifecycle and participation API"),
        (name = "winners", description = "Winner selection API"),
    ),
    info(
        title = "Raffle Backend API",
        version = "1.0.0",
        description = "Raffle / lucky-draw management REST API documentation",
    ),
    servers(
        (url = "/api/v1", description = "Local server")
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
