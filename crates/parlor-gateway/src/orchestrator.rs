//! Hooks into the host orchestrator.
//!
//! The gateway notifies the orchestrator about every accepted human
//! message and the chat metadata that goes with it. The hooks are
//! synchronous and must return quickly: they run on the request path,
//! before the message is broadcast to the room.

use parlor_types::{ChatMessage, ChatMetadata};

/// Callback invoked by the gateway for each accepted inbound message.
///
/// Implementations that need to do real work (call an agent, write to a
/// queue) should hand the message off to their own task and return.
pub trait Orchestrator: Send + Sync {
    /// Called once per accepted human message, after it has been stored.
    fn on_inbound_message(&self, jid: &str, message: &ChatMessage);

    /// Called with fresh chat metadata just before
    /// [`on_inbound_message`](Self::on_inbound_message).
    fn on_chat_metadata(&self, metadata: &ChatMetadata);
}

/// An orchestrator that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOrchestrator;

impl Orchestrator for NoopOrchestrator {
    fn on_inbound_message(&self, _jid: &str, _message: &ChatMessage) {}

    fn on_chat_metadata(&self, _metadata: &ChatMetadata) {}
}
