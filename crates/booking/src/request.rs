//! Booking requests and their structural validation.
//!
//! Validation here is everything that can be decided without a catalog:
//! required fields, email syntax, duplicate attendees. Catalog checks
//! (event published, ticket type exists) happen in the booking service.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use eventive_core::{DomainError, DomainResult, Email, EventId, Money, TicketTypeId};

use crate::merchandise::MerchandiseSelection;

/// One attendee as submitted by the booker.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttendeeRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub ticket_type: String,
    /// Price shown to the booker. When present it is frozen as the snapshot.
    #[serde(default)]
    pub ticket_price: Option<Money>,
    #[serde(default)]
    pub merchandise: Vec<MerchandiseSelection>,
}

/// A booking request as submitted by the booker.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BookingRequest {
    pub event_id: String,
    pub email: String,
    #[serde(default)]
    pub discount_code: Option<String>,
    #[serde(default)]
    pub attendees: Vec<AttendeeRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedAttendee {
    pub full_name: String,
    pub email: Email,
    pub ticket_type: TicketTypeId,
    pub ticket_price: Option<Money>,
    pub merchandise: Vec<MerchandiseSelection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBooking {
    pub event_id: EventId,
    pub email: Email,
    pub discount_code: Option<String>,
    pub attendees: Vec<ValidatedAttendee>,
}

impl BookingRequest {
    pub fn validate(&self) -> DomainResult<ValidatedBooking> {
        if self.attendees.is_empty() {
            return Err(DomainError::validation("at least one attendee is required"));
        }

        let event_id = EventId::parse(&self.event_id)
            .map_err(|_| DomainError::validation("event_id is required"))?;
        let email = Email::parse(&self.email)
            .map_err(|e| DomainError::validation(format!("booker {}", message_of(e))))?;

        let discount_code = self
            .discount_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        let mut seen = HashSet::with_capacity(self.attendees.len());
        let mut attendees = Vec::with_capacity(self.attendees.len());
        for (idx, a) in self.attendees.iter().enumerate() {
            let attendee = a.validate(idx)?;
            if !seen.insert(attendee.email.clone()) {
                return Err(DomainError::validation(format!(
                    "attendee {idx}: duplicate attendee email {}",
                    attendee.email
                )));
            }
            attendees.push(attendee);
        }

        Ok(ValidatedBooking {
            event_id,
            email,
            discount_code,
            attendees,
        })
    }
}

impl AttendeeRequest {
    fn validate(&self, idx: usize) -> DomainResult<ValidatedAttendee> {
        let full_name = self.full_name.trim();
        if full_name.is_empty() {
            return Err(DomainError::validation(format!("attendee {idx}: full_name is required")));
        }

        let email = Email::parse(&self.email)
            .map_err(|e| DomainError::validation(format!("attendee {idx}: {}", message_of(e))))?;

        let ticket_type = TicketTypeId::parse(&self.ticket_type)
            .map_err(|_| DomainError::validation(format!("attendee {idx}: ticket_type is required")))?;

        Ok(ValidatedAttendee {
            full_name: full_name.to_string(),
            email,
            ticket_type,
            ticket_price: self.ticket_price,
            merchandise: self.merchandise.clone(),
        })
    }
}

fn message_of(err: DomainError) -> String {
    match err {
        DomainError::Validation(msg) | DomainError::InvalidId(msg) => msg,
        other => other.to_string(),
    }
}
