//! WebSocket Handler - 会话事件与书库事件推送

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::ReaderEvent;
use crate::infrastructure::http::state::AppState;

/// Session WebSocket（播放状态、位置、朗读行）
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_session_socket(socket, session_id, state))
}

/// 全局 WebSocket（书籍导入/删除）
pub async fn global_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_global_socket(socket, state))
}

fn encode(event: &ReaderEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize event");
            None
        }
    }
}

async fn handle_session_socket(socket: WebSocket, session_id: String, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    if !state.session_manager.is_valid(&session_id) {
        tracing::warn!(session_id = %session_id, "WebSocket connection rejected: invalid session");
        let _ = sender.close().await;
        return;
    }

    let mut event_rx = state.event_publisher.register_session(&session_id);

    tracing::info!(session_id = %session_id, "WebSocket connected");

    let forward_session_id = session_id.clone();
    let mut forward_task = tokio::spawn(async move {
        loop {
            let event = match event_rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(session_id = %forward_session_id, skipped, "WebSocket subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            let closing = matches!(event, ReaderEvent::SessionClosed { .. });
            if let Some(msg) = encode(&event) {
                if let Err(e) = sender.send(msg).await {
                    tracing::debug!(
                        session_id = %forward_session_id,
                        error = %e,
                        "Failed to send WebSocket message"
                    );
                    break;
                }
            }
            if closing {
                let _ = sender.close().await;
                break;
            }
        }
    });

    // 任意客户端消息都视为活跃（心跳）
    let session_manager = state.session_manager.clone();
    let receive_session_id = session_id.clone();
    let mut receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!(session_id = %receive_session_id, "WebSocket closed by client");
                    break;
                }
                Ok(_) => session_manager.touch(&receive_session_id),
                Err(e) => {
                    tracing::debug!(session_id = %receive_session_id, error = %e, "WebSocket error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut forward_task => receive_task.abort(),
        _ = &mut receive_task => forward_task.abort(),
    }

    tracing::info!(session_id = %session_id, "WebSocket disconnected");
}

async fn handle_global_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut event_rx = state.event_publisher.subscribe_global();

    tracing::info!("Global WebSocket connected");

    let mut forward_task = tokio::spawn(async move {
        loop {
            let event = match event_rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Global WebSocket subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            if !event.is_global() {
                continue;
            }
            if let Some(msg) = encode(&event) {
                if let Err(e) = sender.send(msg).await {
                    tracing::debug!(error = %e, "Failed to send global WebSocket message");
                    break;
                }
            }
        }
    });

    let mut receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!("Global WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Global WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut forward_task => receive_task.abort(),
        _ = &mut receive_task => forward_task.abort(),
    }

    tracing::info!("Global WebSocket disconnected");
}
