//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::{
    categories::available_categories,
    error::ManagerError,
    export::ExportDocument,
    manager::BulkAction,
    state::{AppState, HistoryItem, TimerDraft, DEFAULT_CATEGORIES},
};
use super::responses::{
    views, CategoriesResponse, CommandResponse, CreateTimerRequest, ErrorResponse, FilterBody,
    HealthResponse, StatusResponse, TimersQuery, TimersResponse,
};

type Reply = (StatusCode, Json<CommandResponse>);

/// Turn a manager command result into a response
///
/// A persistence failure is a 503, but the body still carries the in-memory
/// collection the change was applied to.
async fn command_reply(
    state: &AppState,
    action: &str,
    result: Result<bool, ManagerError>,
) -> Reply {
    let timers = state.manager.timers().await;
    match result {
        Ok(true) => {
            state.record_action(action).await;
            (
                StatusCode::OK,
                Json(CommandResponse::applied(format!("{} applied", action), timers)),
            )
        }
        Ok(false) => (
            StatusCode::OK,
            Json(CommandResponse::ignored(format!("{} had no effect", action), timers)),
        ),
        Err(e) => {
            error!("{} failed: {}", action, e);
            state.record_action(action).await;
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(CommandResponse::unsaved(e.to_string(), timers)),
            )
        }
    }
}

fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
}

fn storage_failure(message: impl Into<String>) -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorResponse::new(message))).into_response()
}

/// Handle GET /timers - filtered (and optionally grouped) collection
pub async fn list_timers_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TimersQuery>,
) -> Json<TimersResponse> {
    let filter = match query.category {
        Some(category) => category,
        None => state.storage().load_category_filter().await,
    };

    let groups = if query.grouped {
        Some(
            state
                .manager
                .grouped(&filter)
                .await
                .into_iter()
                .map(Into::into)
                .collect(),
        )
    } else {
        None
    };

    Json(TimersResponse {
        timers: views(state.manager.filtered(&filter).await),
        filter,
        groups,
    })
}

/// Handle POST /timers - create a stopped timer
pub async fn create_timer_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTimerRequest>,
) -> Response {
    let draft: TimerDraft = request.into();
    match state.manager.create_timer(&draft).await {
        Ok(timer) => {
            info!("Create endpoint called - '{}' added", timer.name);
            state.record_action("create").await;
            (
                StatusCode::CREATED,
                Json(CommandResponse::applied(
                    format!("Timer '{}' created", timer.name),
                    state.manager.timers().await,
                )),
            )
                .into_response()
        }
        Err(ManagerError::Invalid(e)) => {
            warn!("Rejected timer draft: {}", e);
            bad_request(e.to_string())
        }
        Err(e) => command_reply(&state, "create", Err(e)).await.into_response(),
    }
}

/// Handle POST /timers/:id/start
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Reply {
    let result = state.manager.start(&id).await;
    command_reply(&state, "start", result).await
}

/// Handle POST /timers/:id/pause
pub async fn pause_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Reply {
    let result = state.manager.pause(&id).await;
    command_reply(&state, "pause", result).await
}

/// Handle POST /timers/:id/reset
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Reply {
    let result = state.manager.reset(&id).await;
    command_reply(&state, "reset", result).await
}

/// Handle DELETE /timers/:id
pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Reply {
    let result = state.manager.delete(&id).await;
    command_reply(&state, "delete", result).await
}

/// Handle POST /categories/:category/:action - bulk start/pause/reset
pub async fn bulk_action_handler(
    State(state): State<Arc<AppState>>,
    Path((category, action)): Path<(String, String)>,
) -> Response {
    let action: BulkAction = match action.parse() {
        Ok(action) => action,
        Err(e) => return bad_request(e),
    };

    let label = format!("bulk {:?} on {}", action, category);
    let result = state
        .manager
        .bulk_action(&category, action)
        .await
        .map(|affected| affected > 0);
    command_reply(&state, &label, result).await.into_response()
}

/// Handle GET /categories
pub async fn categories_handler(State(state): State<Arc<AppState>>) -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        categories: available_categories(&state.manager.timers().await),
        presets: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
    })
}

/// Handle GET /filter
pub async fn get_filter_handler(State(state): State<Arc<AppState>>) -> Json<FilterBody> {
    Json(FilterBody {
        filter: state.storage().load_category_filter().await,
    })
}

/// Handle PUT /filter
pub async fn set_filter_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FilterBody>,
) -> Response {
    let filter = body.filter.trim().to_string();
    if filter.is_empty() {
        return bad_request("Filter must not be empty");
    }

    match state.storage().save_category_filter(&filter).await {
        Ok(()) => Json(FilterBody { filter }).into_response(),
        Err(e) => storage_failure(format!("Failed to save filter: {}", e)),
    }
}

/// Handle DELETE /filter - back to "All"
pub async fn clear_filter_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.storage().clear_category_filter().await {
        Ok(()) => Json(FilterBody {
            filter: state.storage().load_category_filter().await,
        })
        .into_response(),
        Err(e) => storage_failure(format!("Failed to clear filter: {}", e)),
    }
}

/// Handle GET /history - newest first
pub async fn history_handler(State(state): State<Arc<AppState>>) -> Json<Vec<HistoryItem>> {
    Json(state.storage().load_history().await)
}

/// Handle DELETE /history
pub async fn clear_history_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.manager.clear_history().await {
        Ok(()) => {
            info!("History cleared");
            state.record_action("clear history").await;
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => storage_failure(format!("Failed to clear history: {}", e)),
    }
}

/// Handle GET /history/export
pub async fn export_handler(State(state): State<Arc<AppState>>) -> Json<ExportDocument> {
    let history = state.storage().load_history().await;
    Json(ExportDocument::build(&history, Utc::now()))
}

/// Handle GET /status - counts, uptime and notification warning
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let timers = state.manager.timers().await;
    let notifications_enabled = state.manager.notification_permission().await;
    let (last_action, last_action_time) = state.last_action().await;

    Json(StatusResponse {
        timers: timers.len(),
        running: timers.iter().filter(|t| t.is_running()).count(),
        notifications_enabled,
        warning: (!notifications_enabled).then(|| {
            "Notifications are disabled; timers will not alert in the background".to_string()
        }),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
