use std::sync::Arc;

use axum::{
    http::{header, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::login_service::LoginService;
use crate::auth::middleware::{authenticate, require_admin};
use crate::auth::token_service::SharedTokenService;
use crate::storage::repositories::UserRepository;

use super::handlers::{
    delete_user_handler, get_user_handler, health_handler, list_users_handler, login_handler,
    register_handler, update_user_handler,
};

#[derive(Clone)]
pub struct ApiState {
    pub tokens: SharedTokenService,
    pub users: Arc<dyn UserRepository>,
    pub login: Arc<LoginService>,
}

impl ApiState {
    /// Wire the login flow to the same repository and token service.
    pub fn new(tokens: SharedTokenService, users: Arc<dyn UserRepository>) -> Self {
        let login = Arc::new(LoginService::with_argon2(users.clone(), tokens.clone()));
        Self { tokens, users, login }
    }
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(300))
}

/// Public routes, then the authenticated group, then the admin group nested
/// inside it so role gating always runs after authentication.
pub fn build_router(state: ApiState) -> Router {
    let auth_layer = middleware::from_fn_with_state(state.tokens.clone(), authenticate);

    let admin_api = Router::new()
        .route("/users", get(list_users_handler))
        .route("/users/{id}", delete(delete_user_handler))
        .route_layer(middleware::from_fn(require_admin));

    let secured_api = Router::new()
        .route("/register", post(register_handler))
        .route("/users/{id}", get(get_user_handler).put(update_user_handler))
        .merge(admin_api)
        .route_layer(auth_layer);

    Router::new()
        .route("/health", get(health_handler))
        .route("/login", post(login_handler))
        .merge(secured_api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}
