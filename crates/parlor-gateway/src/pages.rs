//! Minimal HTML pages served by the gateway.
//!
//! The chat page loads history once the event stream is open, renders
//! every `message` event, and posts the input box to the send endpoint.
//! Messages are de-duplicated by id, so a history fetch that overlaps
//! with live events renders each message once. The access token the page
//! was opened with is embedded so the page can authorize its own calls.

use std::sync::LazyLock;

use axum::response::Html;
use minijinja::{Environment, Value, context};
use parlor_types::{RegisteredRoom, RoomId};

use crate::error::GatewayError;
use crate::rooms::RoomSummary;

/// Page templates, parsed once. Names ending in `.html` are auto-escaped.
static TEMPLATES: LazyLock<Result<Environment<'static>, minijinja::Error>> =
    LazyLock::new(load_templates);

fn load_templates() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("base.html", include_str!("../templates/base.html"))?;
    env.add_template("chat.html", include_str!("../templates/chat.html"))?;
    env.add_template("rooms.html", include_str!("../templates/rooms.html"))?;
    Ok(env)
}

fn render(name: &str, ctx: Value) -> Result<Html<String>, GatewayError> {
    let env = TEMPLATES
        .as_ref()
        .map_err(|e| GatewayError::Template(format!("failed to load templates: {e}")))?;
    let html = env
        .get_template(name)
        .map_err(|e| GatewayError::Template(format!("missing {name} template: {e}")))?
        .render(ctx)
        .map_err(|e| GatewayError::Template(format!("{name} render failed: {e}")))?;
    Ok(Html(html))
}

/// Render the chat page of a room.
pub fn chat_page(
    room: &RegisteredRoom,
    id: &RoomId,
    token: &str,
    assistant_name: &str,
) -> Result<Html<String>, GatewayError> {
    render(
        "chat.html",
        context! {
            room_name => &room.name,
            room_id => id.as_str(),
            assistant_name => assistant_name,
            token => token,
        },
    )
}

/// Render the list of rooms with a form to create a new one.
pub fn room_list_page(rooms: &[RoomSummary], token: &str) -> Result<Html<String>, GatewayError> {
    render("rooms.html", context! { rooms => rooms, token => token })
}
