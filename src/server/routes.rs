use std::sync::Arc;

use axum::extract::{Path, Query};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{middleware, Extension, Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::AppConfig;
use crate::progression::auth::{AuthGate, AuthedServer};
use crate::progression::service::{ProgressionService, RoundService};
use crate::progression::storage::SyncStorage;
use crate::progression::types::RoundId;
use crate::progression::validation::{clamp_page, normalize_guid};

use super::auth::require_server_auth;
use super::dto::{
    ApiInfoResponse, CountResponse, CreateRoundBody, CreatedRoundResponse, FinalizeRoundBody,
    ModVersion, PageQuery, PlayerProfileResponse, ProgressionBody, RoundHistoryItem,
    SubmitResponse, SuccessResponse,
};
use super::error::ApiError;
use super::logging::log_requests;

const LOG_TARGET: &str = "server::routes";

/// Oldest game-mod version whose payloads this API still understands.
const MIN_MOD_VERSION: ModVersion = ModVersion {
    major: 3,
    minor: 0,
    patch: 0,
};

/// Shared per-process context injected into every handler. Holds the
/// injected storage handle and the stateless service facades; nothing in
/// here is mutated between requests.
pub struct AppContext {
    pub auth: AuthGate,
    pub progression: ProgressionService,
    pub rounds: RoundService,
    pub storage: Arc<dyn SyncStorage>,
    pub trust_proxy: bool,
    pub xp_multiplier: f64,
}

impl AppContext {
    pub fn new(storage: Arc<dyn SyncStorage>, config: &AppConfig) -> Self {
        Self {
            auth: AuthGate::new(Arc::clone(&storage)),
            progression: ProgressionService::new(
                Arc::clone(&storage),
                config.xp_anomaly_threshold,
            ),
            rounds: RoundService::new(Arc::clone(&storage)),
            storage,
            trust_proxy: config.trust_proxy,
            xp_multiplier: config.xp_multiplier,
        }
    }
}

/// Axum facade hosting the progression API.
pub struct ProgressionApiServer {
    router: Router,
}

impl ProgressionApiServer {
    pub fn new(context: Arc<AppContext>) -> Self {
        // Public read endpoints; community dashboards hit these directly.
        let public = Router::new()
            .route("/", get(get_info))
            .route("/servers", get(count_servers))
            .route("/players", get(count_players))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods([Method::GET]),
            );

        // Everything below requires the token + GUID header pair.
        let authed = Router::new()
            .route("/auth/check", get(auth_check))
            .route("/players/:guid", get(get_player).post(submit_progression))
            .route("/players/:guid/rounds", get(get_player_rounds))
            .route("/rounds", post(create_round))
            .route("/rounds/:id", patch(finalize_round))
            .route_layer(middleware::from_fn(require_server_auth));

        let router = Router::new()
            .merge(public)
            .merge(authed)
            .layer(middleware::from_fn(log_requests))
            .layer(Extension(context));

        Self { router }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

async fn get_info(Extension(ctx): Extension<Arc<AppContext>>) -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        name: env!("CARGO_PKG_NAME"),
        description: env!("CARGO_PKG_DESCRIPTION"),
        version: env!("CARGO_PKG_VERSION"),
        github: env!("CARGO_PKG_REPOSITORY"),
        min_mod_ver_supported: MIN_MOD_VERSION,
        xp_multiplier: ctx.xp_multiplier,
    })
}

async fn count_servers(
    Extension(ctx): Extension<Arc<AppContext>>,
) -> Result<Json<CountResponse>, ApiError> {
    let count = ctx.storage.count_servers().await?;
    Ok(Json(CountResponse { count }))
}

async fn count_players(
    Extension(ctx): Extension<Arc<AppContext>>,
) -> Result<Json<CountResponse>, ApiError> {
    let count = ctx.storage.count_players().await?;
    Ok(Json(CountResponse { count }))
}

async fn auth_check(
    Extension(ctx): Extension<Arc<AppContext>>,
    Extension(identity): Extension<AuthedServer>,
) -> Json<SuccessResponse> {
    info!(
        target: LOG_TARGET,
        owner = %identity.owner_name,
        server_id = identity.server_id,
        "server authenticated with the API"
    );
    // Bookkeeping happens off the response path.
    let ctx = Arc::clone(&ctx);
    let server_id = identity.server_id;
    tokio::spawn(async move { ctx.auth.record_auth_check(server_id).await });
    Json(SuccessResponse { success: true })
}

async fn get_player(
    Extension(ctx): Extension<Arc<AppContext>>,
    Extension(identity): Extension<AuthedServer>,
    Path(guid): Path<String>,
) -> Result<Response, ApiError> {
    let guid = normalize_guid(&guid);
    match ctx.storage.find_player_by_guid(&guid).await? {
        Some(profile) => {
            info!(
                target: LOG_TARGET,
                owner = %identity.owner_name,
                player = %profile.player.name,
                "requested player progression"
            );
            Ok(Json(PlayerProfileResponse::from(profile)).into_response())
        }
        None => {
            info!(
                target: LOG_TARGET,
                owner = %identity.owner_name,
                %guid,
                "requested non-existent player progression"
            );
            Ok(StatusCode::NO_CONTENT.into_response())
        }
    }
}

async fn submit_progression(
    Extension(ctx): Extension<Arc<AppContext>>,
    Extension(identity): Extension<AuthedServer>,
    Path(guid): Path<String>,
    body: Option<Json<ProgressionBody>>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Some(Json(body)) = body else {
        return Err(ApiError::InvalidBody);
    };
    let guid = normalize_guid(&guid);
    let submission = body.into_submission()?;
    let outcome = ctx.progression.submit(&identity, &guid, submission).await?;
    Ok(Json(SubmitResponse {
        success: true,
        new_player: outcome.new_player,
    }))
}

async fn get_player_rounds(
    Extension(ctx): Extension<Arc<AppContext>>,
    Extension(identity): Extension<AuthedServer>,
    Path(guid): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Response, ApiError> {
    let guid = normalize_guid(&guid);
    let Some(profile) = ctx.storage.find_player_by_guid(&guid).await? else {
        info!(
            target: LOG_TARGET,
            owner = %identity.owner_name,
            %guid,
            "requested round history for non-existent player"
        );
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let limit = clamp_page(page.limit, 10, 1, 100);
    let offset = clamp_page(page.offset, 0, 0, i64::MAX);
    let entries = ctx
        .storage
        .list_round_history(profile.player.id, limit, offset)
        .await?;
    let items: Vec<RoundHistoryItem> = entries.into_iter().map(RoundHistoryItem::from).collect();
    Ok(Json(items).into_response())
}

async fn create_round(
    Extension(ctx): Extension<Arc<AppContext>>,
    Extension(identity): Extension<AuthedServer>,
    body: Option<Json<CreateRoundBody>>,
) -> Result<Json<CreatedRoundResponse>, ApiError> {
    let Some(Json(body)) = body else {
        return Err(ApiError::InvalidBody);
    };
    let params = body.into_params()?;
    let id = ctx.rounds.create(&identity, params).await?;
    Ok(Json(CreatedRoundResponse { id }))
}

async fn finalize_round(
    Extension(ctx): Extension<Arc<AppContext>>,
    Extension(identity): Extension<AuthedServer>,
    Path(id): Path<RoundId>,
    body: Option<Json<FinalizeRoundBody>>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Some(Json(body)) = body else {
        return Err(ApiError::InvalidBody);
    };
    let finalization = body.into_finalization()?;
    ctx.rounds.finalize(&identity, id, finalization).await?;
    Ok(Json(SuccessResponse { success: true }))
}
