pub mod terminal;

pub use terminal::TerminalRenderer;

use crate::client::models::events::{ConnectionState, Notice};
use crate::client::models::message::{ChatMessage, MessageId};

/// View glue driven by the sync engine. The engine owns all message and
/// roster state; a renderer only mirrors it, and is the one place the
/// library touches a screen.
pub trait Renderer: Send {
    /// Show a message. Called at most once per message id.
    fn render(&mut self, message: &ChatMessage);
    /// Flag an already-rendered message as failed.
    fn mark_failed(&mut self, id: &MessageId);
    /// Transient notification banner.
    fn notify(&mut self, notice: Notice);
    /// The online-user set changed; `names` is sorted and excludes the
    /// local user.
    fn roster_changed(&mut self, names: &[String]);
    /// Push-channel status indicator.
    fn connection_changed(&mut self, state: ConnectionState);
    /// Audible cue for a message from someone else.
    fn sound_cue(&mut self);
}
