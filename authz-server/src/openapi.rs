use utoipa::OpenApi;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const CONNECT_TAG: &str = "Connect API";

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::health::health_check,
        crate::api::connect::authorize::authorize_query_handler,
        crate::api::connect::authorize::authorize_form_handler,
        crate::api::connect::token::token_handler,
    ),
    components(schemas(
        crate::api::health::Health,
        crate::api::connect::models::SignInResponse,
        crate::errors::ProblemDetails,
    )),
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = CONNECT_TAG, description = "OAuth2/OIDC authorization decision endpoints"),
    ),
    info(
        title = "Authorization Decision API",
        description = "Decides whether a signed-in user may be issued tokens for a client",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;
