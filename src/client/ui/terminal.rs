use std::collections::HashMap;

use crate::client::models::events::{ConnectionState, Notice, NoticeLevel};
use crate::client::models::message::{ChatMessage, DeliveryState, MessageId, Origin};
use crate::client::ui::Renderer;

/// Line-oriented renderer for the CLI front-end.
pub struct TerminalRenderer {
    local_user: String,
    show_timestamps: bool,
    /// id -> short text preview, kept so a later failure can say which
    /// message it was about.
    previews: HashMap<MessageId, String>,
}

impl TerminalRenderer {
    pub fn new(local_user: &str, show_timestamps: bool) -> Self {
        Self {
            local_user: local_user.to_string(),
            show_timestamps,
            previews: HashMap::new(),
        }
    }

    fn preview(text: &str) -> String {
        if text.chars().count() > 32 {
            let cut: String = text.chars().take(32).collect();
            format!("{}…", cut)
        } else {
            text.to_string()
        }
    }

    fn level_tag(level: NoticeLevel) -> &'static str {
        match level {
            NoticeLevel::Success => "✅",
            NoticeLevel::Error => "❌",
            NoticeLevel::Info => "ℹ️",
            NoticeLevel::Warning => "⚠️",
        }
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, message: &ChatMessage) {
        let who = if message.author == self.local_user { "You" } else { message.author.as_str() };
        let clock = if self.show_timestamps {
            format!("{} ", message.formatted_time)
        } else {
            String::new()
        };
        let suffix = match (message.origin, message.delivery_state) {
            (Origin::Local, DeliveryState::Pending) => " (sending...)",
            _ => "",
        };
        println!("{}{}: {}{}", clock, who, message.text, suffix);
        self.previews.insert(message.id.clone(), Self::preview(&message.text));
    }

    fn mark_failed(&mut self, id: &MessageId) {
        match self.previews.get(id) {
            Some(preview) => println!("[CHAT][ERROR] not delivered: \"{}\"", preview),
            None => println!("[CHAT][ERROR] a message was not delivered"),
        }
    }

    fn notify(&mut self, notice: Notice) {
        println!("{} {}", Self::level_tag(notice.level), notice.text);
    }

    fn roster_changed(&mut self, names: &[String]) {
        // "You" is rendered separately and counted on top, come nel client web
        if names.is_empty() {
            println!("[USERS] online (1): You");
        } else {
            println!("[USERS] online ({}): You, {}", names.len() + 1, names.join(", "));
        }
    }

    fn connection_changed(&mut self, state: ConnectionState) {
        let label = match state {
            ConnectionState::Disconnected => "offline (polling)",
            ConnectionState::Connecting => "connecting...",
            ConnectionState::Connected => "live",
        };
        println!("[STATUS] {}", label);
    }

    fn sound_cue(&mut self) {
        // terminal bell, the closest thing to the web client's chime
        print!("\x07");
    }
}
