//! Session Handlers - 会话与播放控制

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{
    CloseSession, ControlPlayback, GetSessionStatus, OpenSession, PlaybackAction,
    PlaybackSnapshot,
};
use crate::domain::book::PlaybackPosition;
use crate::infrastructure::http::dto::{
    ApiResponse, CloseSessionResponseDto, OpenSessionRequest, OpenSessionResponseDto, SeekRequest,
    SessionRequest, SetRateRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

type SnapshotResponse = Result<Json<ApiResponse<PlaybackSnapshot>>, ApiError>;

async fn control(state: &AppState, session_id: String, action: PlaybackAction) -> SnapshotResponse {
    let snapshot = state
        .control_playback_handler
        .handle(ControlPlayback { session_id, action })
        .await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

/// 打开会话（同一本书复用已有会话）
pub async fn open_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OpenSessionRequest>,
) -> Result<Json<ApiResponse<OpenSessionResponseDto>>, ApiError> {
    let result = state
        .open_session_handler
        .handle(OpenSession {
            book_id: req.book_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(OpenSessionResponseDto {
        session_id: result.session_id,
        reused: result.reused,
        status: result.snapshot,
    })))
}

pub async fn play(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> SnapshotResponse {
    control(&state, req.session_id, PlaybackAction::Play).await
}

pub async fn stop(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> SnapshotResponse {
    control(&state, req.session_id, PlaybackAction::Stop).await
}

pub async fn skip_forward(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> SnapshotResponse {
    control(&state, req.session_id, PlaybackAction::SkipForward).await
}

pub async fn skip_backward(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> SnapshotResponse {
    control(&state, req.session_id, PlaybackAction::SkipBackward).await
}

/// 跳转到指定章节/行，越界位置由控制器钳制
pub async fn seek(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SeekRequest>,
) -> SnapshotResponse {
    let position = PlaybackPosition::new(req.chapter_index, req.line_index);
    control(&state, req.session_id, PlaybackAction::SeekTo(position)).await
}

pub async fn set_rate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetRateRequest>,
) -> SnapshotResponse {
    control(&state, req.session_id, PlaybackAction::SetRate(req.rate)).await
}

pub async fn session_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> SnapshotResponse {
    let snapshot = state
        .get_session_status_handler
        .handle(GetSessionStatus {
            session_id: req.session_id,
        })
        .await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

/// 关闭会话：停止朗读并写入进度
pub async fn close_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<ApiResponse<CloseSessionResponseDto>>, ApiError> {
    let status = state
        .close_session_handler
        .handle(CloseSession {
            session_id: req.session_id.clone(),
        })
        .await?;

    Ok(Json(ApiResponse::success(CloseSessionResponseDto {
        session_id: req.session_id,
        status,
    })))
}
