use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use lehrmatch_db::models::MessageRow;
use lehrmatch_db::Database;
use lehrmatch_types::api::MessageResponse;
use lehrmatch_types::models::MessageType;

use crate::dispatcher::Dispatcher;

/// Longest accepted chat message, in characters.
const MAX_MESSAGE_LENGTH: usize = 2000;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Match not found")]
    MatchNotFound,

    #[error("Not authorized to access this chat")]
    NotParty,

    #[error("Message content must be 1-{MAX_MESSAGE_LENGTH} characters")]
    InvalidContent,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ChatError {
    /// Stable error code, shared with the REST error body.
    pub fn code(&self) -> &'static str {
        match self {
            ChatError::MatchNotFound => "NOT_FOUND",
            ChatError::NotParty => "FORBIDDEN",
            ChatError::InvalidContent => "BAD_REQUEST",
            ChatError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Check that a user is one of the two parties to a match — the student or
/// the listing's owning company. Everyone else is rejected, never ignored.
pub async fn verify_match_party(
    db: &Arc<Database>,
    match_id: Uuid,
    user_id: Uuid,
) -> Result<(), ChatError> {
    let db = db.clone();
    let mid = match_id.to_string();

    let parties = tokio::task::spawn_blocking(move || db.get_match_parties(&mid))
        .await
        .map_err(|e| ChatError::Internal(anyhow::anyhow!("spawn_blocking join error: {e}")))??
        .ok_or(ChatError::MatchNotFound)?;

    let uid = user_id.to_string();
    let is_student = parties.student_user_id == uid;
    let is_company = parties.company_user_id.as_deref() == Some(uid.as_str());

    if !is_student && !is_company {
        return Err(ChatError::NotParty);
    }
    Ok(())
}

/// Persist a message, bump the match's activity timestamp, and fan the
/// message out to the whole room — the sender's other connections included.
pub async fn send_message(
    db: &Arc<Database>,
    dispatcher: &Dispatcher,
    match_id: Uuid,
    sender_id: Uuid,
    content: String,
    message_type: MessageType,
) -> Result<MessageResponse, ChatError> {
    if content.is_empty() || content.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(ChatError::InvalidContent);
    }

    verify_match_party(db, match_id, sender_id).await?;

    let message_id = Uuid::new_v4();
    let db_task = db.clone();
    let mid = match_id.to_string();
    let msg_id = message_id.to_string();
    let sid = sender_id.to_string();
    let body = content.clone();
    let type_str = message_type.as_str();

    tokio::task::spawn_blocking(move || {
        db_task.insert_message(&msg_id, &mid, &sid, &body, type_str)?;
        db_task.touch_match(&mid)
    })
    .await
    .map_err(|e| ChatError::Internal(anyhow::anyhow!("spawn_blocking join error: {e}")))??;

    let message = MessageResponse {
        id: message_id,
        match_id,
        sender_id,
        content,
        message_type,
        is_read: false,
        created_at: Utc::now(),
    };

    dispatcher
        .broadcast_to_room(
            match_id,
            lehrmatch_types::events::GatewayEvent::NewMessage {
                message: message.clone(),
            },
        )
        .await;

    Ok(message)
}

/// Mark every message the reader did not author as read, then notify the
/// room — excluding the acting connection, to avoid an echo.
pub async fn mark_read(
    db: &Arc<Database>,
    dispatcher: &Dispatcher,
    match_id: Uuid,
    reader_id: Uuid,
    acting_conn: Uuid,
) -> Result<(), ChatError> {
    verify_match_party(db, match_id, reader_id).await?;

    let db_task = db.clone();
    let mid = match_id.to_string();
    let rid = reader_id.to_string();

    tokio::task::spawn_blocking(move || db_task.mark_messages_read(&mid, &rid))
        .await
        .map_err(|e| ChatError::Internal(anyhow::anyhow!("spawn_blocking join error: {e}")))??;

    dispatcher
        .broadcast_to_room_except(
            match_id,
            acting_conn,
            lehrmatch_types::events::GatewayEvent::MessageRead {
                match_id,
                read_by: reader_id,
            },
        )
        .await;

    Ok(())
}

/// Message history for a party to the match: newest-first fetch under the
/// `before` cursor, reversed to chronological order for the caller.
pub async fn history(
    db: &Arc<Database>,
    match_id: Uuid,
    user_id: Uuid,
    limit: u32,
    before: Option<DateTime<Utc>>,
) -> Result<Vec<MessageResponse>, ChatError> {
    verify_match_party(db, match_id, user_id).await?;

    let db_task = db.clone();
    let mid = match_id.to_string();
    // SQLite stores datetime('now') text; format the cursor to match.
    let cursor = before.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string());

    let rows = tokio::task::spawn_blocking(move || {
        db_task.get_messages(&mid, limit, cursor.as_deref())
    })
    .await
    .map_err(|e| ChatError::Internal(anyhow::anyhow!("spawn_blocking join error: {e}")))??;

    let mut messages: Vec<MessageResponse> = rows.iter().map(message_response_from_row).collect();
    messages.reverse();
    Ok(messages)
}

pub fn message_response_from_row(row: &MessageRow) -> MessageResponse {
    MessageResponse {
        id: parse_uuid(&row.id, "message id"),
        match_id: parse_uuid(&row.match_id, "match_id"),
        sender_id: parse_uuid(&row.sender_id, "sender_id"),
        content: row.content.clone(),
        message_type: MessageType::parse(&row.message_type),
        is_read: row.is_read,
        created_at: parse_timestamp(&row.created_at),
    }
}

fn parse_uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Try RFC3339 first, then parse as naive UTC and convert.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lehrmatch_db::queries::{NewListing, NewMatch, NewSwipe};
    use lehrmatch_types::events::GatewayEvent;

    struct Fixture {
        db: Arc<Database>,
        dispatcher: Dispatcher,
        match_id: Uuid,
        student_user: Uuid,
        company_user: Uuid,
    }

    fn fixture() -> Fixture {
        let db = Arc::new(Database::open_in_memory().unwrap());

        let student_user = Uuid::new_v4();
        let student_id = Uuid::new_v4().to_string();
        db.create_user(&student_user.to_string(), "mia@test.ch", "hash", "STUDENT")
            .unwrap();
        db.upsert_student_profile(
            &student_id,
            &student_user.to_string(),
            "Mia",
            "Keller",
            "ZH",
            "Zürich",
        )
        .unwrap();

        let company_user = Uuid::new_v4();
        let company_id = Uuid::new_v4().to_string();
        let listing_id = Uuid::new_v4().to_string();
        db.create_user(&company_user.to_string(), "firma@test.ch", "hash", "COMPANY")
            .unwrap();
        db.upsert_company_profile(
            &company_id,
            &company_user.to_string(),
            "Muster AG",
            "ZH",
            "Zürich",
        )
        .unwrap();
        db.create_listing(&NewListing {
            id: listing_id.clone(),
            company_id,
            title: "Informatiker/in EFZ".into(),
            description: "Lehrstelle".into(),
            field: "informatik".into(),
            career_code: None,
            canton: "ZH".into(),
            city: "Zürich".into(),
            ideal_ocean: [None; 5],
            ideal_riasec: [None; 6],
            spots_available: 1,
        })
        .unwrap();

        let match_id = Uuid::new_v4();
        db.record_swipe(
            &NewSwipe {
                id: Uuid::new_v4().to_string(),
                student_id,
                listing_id,
                direction: "RIGHT".into(),
            },
            Some(&NewMatch {
                id: match_id.to_string(),
                compatibility_score: 80,
                greeting_message_id: Uuid::new_v4().to_string(),
                sender_id: student_user.to_string(),
                greeting: "Es ist ein Match!".into(),
            }),
        )
        .unwrap();

        Fixture {
            db,
            dispatcher: Dispatcher::new(),
            match_id,
            student_user,
            company_user,
        }
    }

    #[tokio::test]
    async fn non_party_send_is_rejected() {
        let f = fixture();
        let outsider = Uuid::new_v4();

        let result = send_message(
            &f.db,
            &f.dispatcher,
            f.match_id,
            outsider,
            "Hallo".into(),
            MessageType::Text,
        )
        .await;

        assert!(matches!(result, Err(ChatError::NotParty)));
    }

    #[tokio::test]
    async fn unknown_match_is_not_found() {
        let f = fixture();
        let result = verify_match_party(&f.db, Uuid::new_v4(), f.student_user).await;
        assert!(matches!(result, Err(ChatError::MatchNotFound)));
    }

    #[tokio::test]
    async fn empty_content_is_rejected_before_any_write() {
        let f = fixture();
        let result = send_message(
            &f.db,
            &f.dispatcher,
            f.match_id,
            f.student_user,
            String::new(),
            MessageType::Text,
        )
        .await;
        assert!(matches!(result, Err(ChatError::InvalidContent)));
    }

    #[tokio::test]
    async fn sent_message_reaches_every_room_member_including_sender() {
        let f = fixture();

        let (student_conn, mut student_rx) = f.dispatcher.register(f.student_user).await;
        let (company_conn, mut company_rx) = f.dispatcher.register(f.company_user).await;
        f.dispatcher.join_room(f.match_id, student_conn).await;
        f.dispatcher.join_room(f.match_id, company_conn).await;

        let sent = send_message(
            &f.db,
            &f.dispatcher,
            f.match_id,
            f.student_user,
            "Grüezi!".into(),
            MessageType::Text,
        )
        .await
        .unwrap();

        for rx in [&mut student_rx, &mut company_rx] {
            match rx.try_recv().unwrap() {
                GatewayEvent::NewMessage { message } => {
                    assert_eq!(message.id, sent.id);
                    assert_eq!(message.content, "Grüezi!");
                }
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn mark_read_notifies_room_but_not_the_actor() {
        let f = fixture();

        let (student_conn, mut student_rx) = f.dispatcher.register(f.student_user).await;
        let (company_conn, mut company_rx) = f.dispatcher.register(f.company_user).await;
        f.dispatcher.join_room(f.match_id, student_conn).await;
        f.dispatcher.join_room(f.match_id, company_conn).await;

        mark_read(&f.db, &f.dispatcher, f.match_id, f.company_user, company_conn)
            .await
            .unwrap();

        assert!(company_rx.try_recv().is_err());
        match student_rx.try_recv().unwrap() {
            GatewayEvent::MessageRead { match_id, read_by } => {
                assert_eq!(match_id, f.match_id);
                assert_eq!(read_by, f.company_user);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn history_is_chronological_and_respects_the_cursor() {
        let f = fixture();

        for hour in 1..=4 {
            let id = format!("msg-{hour}");
            f.db.insert_message(
                &id,
                &f.match_id.to_string(),
                &f.student_user.to_string(),
                &format!("m{hour}"),
                "TEXT",
            )
            .unwrap();
            f.db.with_conn(|conn| {
                conn.execute(
                    "UPDATE messages SET created_at = ?2 WHERE id = ?1",
                    (&id, &format!("2026-03-01 0{hour}:00:00")),
                )?;
                Ok(())
            })
            .unwrap();
        }

        let cursor = "2026-03-01T04:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let page = history(&f.db, f.match_id, f.company_user, 2, Some(cursor))
            .await
            .unwrap();

        assert_eq!(page.len(), 2);
        // Ascending chronological order, all strictly before the cursor.
        assert_eq!(page[0].content, "m2");
        assert_eq!(page[1].content, "m3");
        assert!(page.iter().all(|m| m.created_at < cursor));
    }
}
