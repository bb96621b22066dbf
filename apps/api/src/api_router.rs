use axum::Router;
use axum::middleware::from_fn;
use axum::routing::{get, post, put};
use tessera_core::AppError;
use tessera_domain::{Apis, MockServices, Services, TaskSprints};
use tower_http::trace::TraceLayer;

use crate::state::{AppState, ServedFamily};
use crate::{handlers, middleware};

mod cors;

pub fn build_router(app_state: AppState, frontend_url: Option<&str>) -> Result<Router, AppError> {
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .nest(family_prefix::<Apis>().as_str(), family_routes::<Apis>())
        .nest(family_prefix::<Services>().as_str(), family_routes::<Services>())
        .nest(
            family_prefix::<MockServices>().as_str(),
            family_routes::<MockServices>(),
        )
        .nest(
            family_prefix::<TaskSprints>().as_str(),
            family_routes::<TaskSprints>(),
        )
        .layer(TraceLayer::new_for_http());

    if let Some(frontend_url) = frontend_url {
        router = router.layer(cors::build_cors_layer(frontend_url)?);
    }

    Ok(router.with_state(app_state))
}

fn family_prefix<F: ServedFamily>() -> String {
    format!("/api/{}", F::PATH_SEGMENT)
}

fn family_routes<F: ServedFamily>() -> Router<AppState> {
    Router::new()
        .route(
            "/resources/{resource_id}/authorize",
            post(handlers::authorize_handler::<F>),
        )
        .route(
            "/authorize-batch",
            post(handlers::authorize_batch_handler::<F>),
        )
        .route(
            "/accessible",
            get(handlers::accessible_resources_handler::<F>),
        )
        .route(
            "/resources/{resource_id}/effective-permissions",
            get(handlers::effective_permissions_handler::<F>),
        )
        .route(
            "/resources/{resource_id}/grants",
            get(handlers::list_grants_handler::<F>).post(handlers::create_grant_handler::<F>),
        )
        .route(
            "/resources/{resource_id}/creator-grant",
            post(handlers::provision_creator_grant_handler::<F>),
        )
        .route(
            "/grants/{grant_id}",
            put(handlers::replace_grant_permissions_handler::<F>)
                .delete(handlers::revoke_grant_handler::<F>),
        )
        .route_layer(from_fn(middleware::require_caller))
}
