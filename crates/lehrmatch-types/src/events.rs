use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::MessageResponse;
use crate::models::MessageType;

/// Commands sent FROM client TO server over the chat WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Authenticate the WebSocket connection with a bearer token
    Identify { token: String },

    /// Enter the broadcast room of a match
    JoinMatch { match_id: Uuid },

    /// Leave the broadcast room of a match
    LeaveMatch { match_id: Uuid },

    /// Send a chat message into a match
    SendMessage {
        match_id: Uuid,
        content: String,
        #[serde(default)]
        message_type: MessageType,
    },

    /// Mark all messages from the other party as read
    MarkRead { match_id: Uuid },

    /// Indicate typing in a match
    TypingStart { match_id: Uuid },

    /// Indicate typing stopped
    TypingStop { match_id: Uuid },
}

/// Events sent over the chat WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Server confirms successful authentication
    Ready { user_id: Uuid },

    /// A new message was posted in a match the connection has joined
    NewMessage { message: MessageResponse },

    /// The other party read the conversation
    MessageRead { match_id: Uuid, read_by: Uuid },

    /// A participant started or stopped typing
    Typing {
        match_id: Uuid,
        user_id: Uuid,
        is_typing: bool,
    },

    /// A command was rejected; mirrors the REST error body shape
    Error { message: String, code: String },
}
