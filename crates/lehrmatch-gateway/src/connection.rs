use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn};
use uuid::Uuid;

use lehrmatch_db::Database;
use lehrmatch_types::api::Claims;
use lehrmatch_types::events::{GatewayCommand, GatewayEvent};

use crate::chat;
use crate::dispatcher::Dispatcher;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// How long a fresh connection gets to present its Identify token.
const IDENTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle a single chat WebSocket connection.
///
/// Lifecycle: the client must authenticate with an Identify command before
/// anything else; only then is the connection registered and allowed to join
/// match rooms. Disconnecting cleans up all room memberships.
pub async fn handle_connection(
    socket: WebSocket,
    dispatcher: Dispatcher,
    db: Arc<Database>,
    jwt_secret: String,
) {
    let (mut sender, mut receiver) = socket.split();

    // Step 1: Wait for Identify command with a valid bearer token
    let user_id = match wait_for_identify(&mut receiver, &jwt_secret).await {
        Some(id) => id,
        None => {
            warn!("WebSocket client failed to identify, closing");
            return;
        }
    };

    info!("{} connected to chat gateway", user_id);

    // Step 2: Send Ready event
    let ready = GatewayEvent::Ready { user_id };
    if sender
        .send(Message::Text(serde_json::to_string(&ready).unwrap().into()))
        .await
        .is_err()
    {
        return;
    }

    // Step 3: Register and run the event loop
    let (conn_id, mut event_rx) = dispatcher.register(user_id).await;

    // Shared flag for heartbeat
    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward room events -> client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                result = event_rx.recv() => {
                    let event = match result {
                        Some(event) => event,
                        None => break,
                    };
                    let text = serde_json::to_string(&event).unwrap();
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read commands from client
    let dispatcher_recv = dispatcher.clone();
    let db_recv = db.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<GatewayCommand>(&text) {
                    Ok(cmd) => {
                        handle_command(&dispatcher_recv, &db_recv, conn_id, user_id, cmd).await;
                    }
                    Err(e) => {
                        warn!(
                            "{} bad command: {} -- raw: {}",
                            user_id,
                            e,
                            &text[..text.len().min(200)]
                        );
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    dispatcher.unregister(conn_id).await;
    info!("{} disconnected from chat gateway", user_id);
}

async fn wait_for_identify(
    receiver: &mut futures_util::stream::SplitStream<WebSocket>,
    jwt_secret: &str,
) -> Option<Uuid> {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    let timeout = tokio::time::timeout(IDENTIFY_TIMEOUT, async {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                if let Ok(GatewayCommand::Identify { token }) =
                    serde_json::from_str::<GatewayCommand>(&text)
                {
                    let token_data = decode::<Claims>(
                        &token,
                        &DecodingKey::from_secret(jwt_secret.as_bytes()),
                        &Validation::default(),
                    )
                    .ok()?;

                    return Some(token_data.claims.sub);
                }
            }
        }
        None
    });

    timeout.await.ok().flatten()
}

async fn handle_command(
    dispatcher: &Dispatcher,
    db: &Arc<Database>,
    conn_id: Uuid,
    user_id: Uuid,
    cmd: GatewayCommand,
) {
    match cmd {
        GatewayCommand::Identify { .. } => {} // Already handled

        GatewayCommand::JoinMatch { match_id } => {
            dispatcher.join_room(match_id, conn_id).await;
        }

        GatewayCommand::LeaveMatch { match_id } => {
            dispatcher.leave_room(match_id, conn_id).await;
        }

        GatewayCommand::SendMessage {
            match_id,
            content,
            message_type,
        } => {
            if let Err(e) =
                chat::send_message(db, dispatcher, match_id, user_id, content, message_type).await
            {
                reject(dispatcher, conn_id, user_id, "send-message", e).await;
            }
        }

        GatewayCommand::MarkRead { match_id } => {
            if let Err(e) = chat::mark_read(db, dispatcher, match_id, user_id, conn_id).await {
                reject(dispatcher, conn_id, user_id, "mark-read", e).await;
            }
        }

        GatewayCommand::TypingStart { match_id } => {
            dispatcher
                .broadcast_to_room_except(
                    match_id,
                    conn_id,
                    GatewayEvent::Typing {
                        match_id,
                        user_id,
                        is_typing: true,
                    },
                )
                .await;
        }

        GatewayCommand::TypingStop { match_id } => {
            dispatcher
                .broadcast_to_room_except(
                    match_id,
                    conn_id,
                    GatewayEvent::Typing {
                        match_id,
                        user_id,
                        is_typing: false,
                    },
                )
                .await;
        }
    }
}

/// Report a failed command back to the issuing connection only.
async fn reject(
    dispatcher: &Dispatcher,
    conn_id: Uuid,
    user_id: Uuid,
    op: &str,
    error: chat::ChatError,
) {
    warn!("{} {} rejected: {}", user_id, op, error);
    dispatcher
        .send_to_conn(
            conn_id,
            GatewayEvent::Error {
                message: error.to_string(),
                code: error.code().to_string(),
            },
        )
        .await;
}
