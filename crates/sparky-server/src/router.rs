//! Router configuration and handlers.
//!
//! All routes live under `/api/v1`. Login, verification and the heartbeat
//! are public; everything else passes the bearer middleware.

use axum::{
    Form, Json, Router,
    extract::{FromRequest, Path, Query, Request, State},
    http::{
        HeaderValue, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    response::IntoResponse,
    routing::get,
};
use sparky_model::{NewUserDto, Realm, UserDto};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{Caller, require_bearer};
use crate::dto::{AuthenticationInfoDto, LoginRequest, VerifyQuery};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Prefix of all routes.
pub const API_PREFIX: &str = "/api/v1";

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/heartbeat", get(heartbeat))
        .route("/authenticate", axum::routing::post(authenticate))
        .route("/authenticate/verify", get(verify_token));

    let protected = Router::new()
        .route("/authenticate/check", get(check_authentication))
        .route(
            "/users",
            get(list_users).put(create_user).patch(edit_user),
        )
        .route("/users/{realm}", get(list_realm_users))
        .route("/users/{realm}/{username}", get(get_user).delete(delete_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    let cors = cors_layer(&state.config().server.cors_origins);

    Router::new()
        .nest(API_PREFIX, public.merge(protected))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([AUTHORIZATION]);

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

// ============================================================================
// Authentication Handlers
// ============================================================================

/// GET /api/v1/heartbeat
async fn heartbeat() -> StatusCode {
    StatusCode::OK
}

/// POST /api/v1/authenticate - Login with form or JSON credentials
async fn authenticate(State(state): State<AppState>, request: Request) -> ApiResult<impl IntoResponse> {
    let credentials = read_login_request(request).await?;

    let login = state.login.clone();
    let info = blocking(move || Ok(login.login(&credentials.username, &credentials.password)?)).await?;

    let header = HeaderValue::from_str(&format!("Bearer {}", info.token.token))
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(([(AUTHORIZATION, header)], Json(AuthenticationInfoDto::from(info))))
}

async fn read_login_request(request: Request) -> ApiResult<LoginRequest> {
    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    if is_json {
        let Json(body) = Json::<LoginRequest>::from_request(request, &())
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        Ok(body)
    } else {
        let Form(body) = Form::<LoginRequest>::from_request(request, &())
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        Ok(body)
    }
}

/// GET /api/v1/authenticate/check - Caller's user and token
async fn check_authentication(Caller(caller): Caller) -> Json<AuthenticationInfoDto> {
    Json(AuthenticationInfoDto {
        user: caller.user.to_dto(),
        token: caller.issued_token().into(),
    })
}

/// GET /api/v1/authenticate/verify?jwtToken=... - Verify a token
async fn verify_token(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> ApiResult<Json<AuthenticationInfoDto>> {
    let info = state.login.verify(&query.jwt_token)?;
    Ok(Json(info.into()))
}

// ============================================================================
// User Handlers
// ============================================================================

/// PUT /api/v1/users - Create a local user
async fn create_user(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<NewUserDto>,
) -> ApiResult<impl IntoResponse> {
    if request.username.is_empty() {
        return Err(ApiError::Validation("username cannot be empty".to_string()));
    }
    let users = state.users.clone();
    let user = blocking(move || Ok(users.create_local_user(&caller, &request)?)).await?;
    Ok((StatusCode::CREATED, Json(user.to_dto())))
}

/// PATCH /api/v1/users - Edit a user
async fn edit_user(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<UserDto>,
) -> ApiResult<Json<UserDto>> {
    if request.identity().is_none() {
        return Err(ApiError::BadRequest("username and realm are required".to_string()));
    }
    let users = state.users.clone();
    let user = blocking(move || Ok(users.edit(&caller, &request)?)).await?;
    Ok(Json(user.to_dto()))
}

/// GET /api/v1/users - All users from all realms
async fn list_users(State(state): State<AppState>, Caller(caller): Caller) -> ApiResult<Json<Vec<UserDto>>> {
    let users = state.users.list_all(&caller)?;
    Ok(Json(users.iter().map(|u| u.to_dto()).collect()))
}

/// GET /api/v1/users/{realm} - All users of one realm
async fn list_realm_users(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(realm): Path<String>,
) -> ApiResult<Json<Vec<UserDto>>> {
    let realm = parse_realm(&realm)?;
    let users = state.users.list_realm(&caller, realm)?;
    Ok(Json(users.iter().map(|u| u.to_dto()).collect()))
}

/// GET /api/v1/users/{realm}/{username} - A single user
async fn get_user(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path((realm, username)): Path<(String, String)>,
) -> ApiResult<Json<UserDto>> {
    let realm = parse_realm(&realm)?;
    let user = state.users.get_user(&caller, realm, &username)?;
    Ok(Json(user.to_dto()))
}

/// DELETE /api/v1/users/{realm}/{username} - Delete a user
async fn delete_user(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path((realm, username)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let realm = parse_realm(&realm)?;
    state.users.delete(&caller, realm, &username)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Runs password hashing and store writes off the async worker threads.
async fn blocking<T, F>(task: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))?
}

fn parse_realm(raw: &str) -> ApiResult<Realm> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("realm '{raw}'")))
}
