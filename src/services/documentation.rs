use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Grid Duel Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::play::publish,
        crate::routes::poll::subscribe,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::action::PlayRequest,
            crate::dto::action::ActionRequest,
            crate::dto::action::ActionResponse,
            crate::dto::action::ActionStatus,
            crate::dto::poll::PollRequest,
            crate::dto::poll::PollResponse,
            crate::dto::game::GameView,
            crate::state::match_state::MatchPhase,
            crate::state::match_state::Token,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "play", description = "Action publishing and long-poll synchronization"),
    )
)]
pub struct ApiDoc;
