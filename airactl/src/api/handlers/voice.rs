//! Inbound voice call webhook.
//!
//! The carrier POSTs here (form-encoded) when one of our provisioned numbers
//! receives a call. The response is TwiML. Unauthenticated: the carrier
//! cannot send a bearer key, and the worst a forged request gets back is a
//! greeting.

use axum::{
    Form,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    AppState,
    db::{errors::DbError, handlers::Numbers},
    errors::Result,
};

/// Form fields the carrier sends with an inbound call
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct InboundCall {
    /// The provisioned number that was dialed
    #[serde(rename = "To")]
    pub to: String,
    /// The caller's number
    #[serde(rename = "From")]
    pub from: Option<String>,
    /// Carrier-side call identifier
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
}

fn twiml(body: &str) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/xml")],
        format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>{body}</Response>"),
    )
        .into_response()
}

/// Escape text destined for a TwiML element body
fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Answer an inbound call on a provisioned number
#[utoipa::path(
    post,
    path = "/call",
    tag = "voice",
    summary = "Inbound call webhook",
    responses(
        (status = 200, description = "TwiML instructions for the call"),
    )
)]
#[tracing::instrument(skip_all, fields(to = %call.to))]
pub async fn inbound_call(State(state): State<AppState>, Form(call): Form<InboundCall>) -> Result<Response> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let number = Numbers::new(&mut conn).get_by_phone_number(&call.to).await?;

    let Some(number) = number.filter(|n| n.is_active && n.voice_enabled) else {
        tracing::warn!(call_sid = ?call.call_sid, "Inbound call to unknown or inactive number");
        return Ok(twiml("<Reject/>"));
    };

    tracing::info!(
        number_id = %number.id,
        from = ?call.from,
        call_sid = ?call.call_sid,
        "Answering inbound call"
    );

    let greeting = match &number.display_name {
        Some(name) => format!("Thank you for calling {}. Please hold while we connect you.", xml_escape(name)),
        None => "Thank you for calling. Please hold while we connect you.".to_string(),
    };

    Ok(twiml(&format!("<Say voice=\"alice\">{greeting}</Say>")))
}
