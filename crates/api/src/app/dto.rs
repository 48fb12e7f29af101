use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use eventive_booking::MerchandiseSelection;
use eventive_core::{Email, EventId, RegistrationId, TicketId};
use eventive_infra::views::{RegistrationDetail, TicketDetail, TicketSummary};

use crate::app::errors::json_error;

/// `?email=&event_id=` lookup parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailEventQuery {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub event_id: String,
}

impl EmailEventQuery {
    pub fn parse(&self) -> Result<(Email, EventId), axum::response::Response> {
        let email = Email::parse(&self.email)
            .map_err(|e| json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()))?;
        let event = EventId::parse(&self.event_id)
            .map_err(|e| json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()))?;
        Ok((email, event))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMerchandiseRequest {
    pub attendee_email: String,
    #[serde(default)]
    pub merchandise: Vec<MerchandiseSelection>,
}

#[derive(Debug, Serialize)]
pub struct RegistrationLookup {
    pub has_registration: bool,
    #[serde(flatten)]
    pub registration: Option<RegistrationDetail>,
}

impl From<Option<RegistrationDetail>> for RegistrationLookup {
    fn from(registration: Option<RegistrationDetail>) -> Self {
        Self {
            has_registration: registration.is_some(),
            registration,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TicketLookup {
    pub has_ticket: bool,
    #[serde(flatten)]
    pub ticket: Option<TicketDetail>,
}

impl From<Option<TicketDetail>> for TicketLookup {
    fn from(ticket: Option<TicketDetail>) -> Self {
        Self {
            has_ticket: ticket.is_some(),
            ticket,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TicketStatusResponse {
    pub has_ticket: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<TicketSummary>,
}

impl From<Option<TicketSummary>> for TicketStatusResponse {
    fn from(ticket: Option<TicketSummary>) -> Self {
        Self {
            has_ticket: ticket.is_some(),
            ticket,
        }
    }
}

pub fn parse_registration_id(raw: &str) -> Result<RegistrationId, axum::response::Response> {
    raw.parse::<RegistrationId>()
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}

pub fn parse_ticket_id(raw: &str) -> Result<TicketId, axum::response::Response> {
    raw.parse::<TicketId>()
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}
