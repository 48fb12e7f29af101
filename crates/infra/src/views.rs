//! Read shapes returned by the query operations.

use chrono::{DateTime, Utc};
use serde::Serialize;

use eventive_booking::{
    ArtifactRef, AttendeeRow, Event, LineItem, PaymentStatus, Registration, RegistrationStatus, Ticket,
    TicketStatus, TicketType,
};
use eventive_core::{Email, EventId, Money, RegistrationId, TicketId, TicketTypeId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendeeView {
    pub full_name: String,
    pub email: Email,
    pub ticket_type: TicketTypeId,
    pub ticket_price: Money,
    pub merchandise_total: Money,
    pub merchandise: Vec<LineItem>,
}

impl From<&AttendeeRow> for AttendeeView {
    fn from(row: &AttendeeRow) -> Self {
        Self {
            full_name: row.full_name().to_string(),
            email: row.email().clone(),
            ticket_type: row.ticket_type().clone(),
            ticket_price: row.ticket_price(),
            merchandise_total: row.merchandise_total(),
            merchandise: row.merchandise().map(|b| b.items().to_vec()).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketView {
    pub ticket_id: TicketId,
    pub event_id: EventId,
    pub ticket_type: TicketTypeId,
    pub email: Email,
    pub status: TicketStatus,
    pub checked_in: bool,
    pub qr_code: Option<ArtifactRef>,
    pub issue_date: DateTime<Utc>,
    pub merchandise: Vec<LineItem>,
    pub attendee: Option<AttendeeView>,
}

impl TicketView {
    pub fn new(ticket: &Ticket, attendee: Option<&AttendeeRow>) -> Self {
        Self {
            ticket_id: ticket.id_typed(),
            event_id: ticket.event().clone(),
            ticket_type: ticket.ticket_type().clone(),
            email: ticket.email().clone(),
            status: ticket.status(),
            checked_in: ticket.is_checked_in(),
            qr_code: ticket.qr_code().cloned(),
            issue_date: ticket.issue_date(),
            merchandise: ticket.merchandise().to_vec(),
            attendee: attendee.map(AttendeeView::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationDetail {
    pub registration_id: RegistrationId,
    pub event_id: EventId,
    pub event_name: Option<String>,
    pub email: Email,
    pub status: RegistrationStatus,
    pub payment_status: PaymentStatus,
    pub discount_code: Option<String>,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
    pub attendees: Vec<AttendeeView>,
    pub tickets: Vec<TicketView>,
}

impl RegistrationDetail {
    pub fn new(registration: &Registration, event: Option<&Event>, tickets: &[Ticket]) -> Self {
        Self {
            registration_id: registration.id_typed(),
            event_id: registration.event().clone(),
            event_name: event.map(|e| e.name.clone()),
            email: registration.email().clone(),
            status: registration.status(),
            payment_status: registration.payment_status(),
            discount_code: registration.discount_code().map(str::to_string),
            total_amount: registration.total_amount(),
            created_at: registration.created_at(),
            attendees: registration.attendees().iter().map(AttendeeView::from).collect(),
            tickets: tickets
                .iter()
                .map(|t| TicketView::new(t, registration.attendee_by_email(t.email())))
                .collect(),
        }
    }
}

/// A ticket joined with its event, ticket type, registration and attendee row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketDetail {
    pub ticket_id: TicketId,
    pub registration_id: RegistrationId,
    pub status: TicketStatus,
    pub checked_in: bool,
    pub qr_code: Option<ArtifactRef>,
    pub issue_date: DateTime<Utc>,
    pub event_id: EventId,
    pub event_name: Option<String>,
    pub venue: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub ticket_type: TicketTypeId,
    pub category: Option<String>,
    pub access_level: Option<String>,
    /// Price frozen at booking time, falling back to the current catalog price.
    pub ticket_price: Option<Money>,
    pub discount_code: Option<String>,
    pub total_amount: Option<Money>,
    pub full_name: Option<String>,
    pub email: Email,
    pub merchandise_total: Money,
    pub merchandise: Vec<LineItem>,
}

impl TicketDetail {
    pub fn new(
        ticket: &Ticket,
        event: Option<&Event>,
        ticket_type: Option<&TicketType>,
        registration: Option<&Registration>,
    ) -> Self {
        let row = registration.and_then(|r| r.attendee_by_email(ticket.email()));
        Self {
            ticket_id: ticket.id_typed(),
            registration_id: ticket.registration(),
            status: ticket.status(),
            checked_in: ticket.is_checked_in(),
            qr_code: ticket.qr_code().cloned(),
            issue_date: ticket.issue_date(),
            event_id: ticket.event().clone(),
            event_name: event.map(|e| e.name.clone()),
            venue: event.and_then(|e| e.venue.clone()),
            start_date: event.and_then(|e| e.start_date),
            end_date: event.and_then(|e| e.end_date),
            ticket_type: ticket.ticket_type().clone(),
            category: ticket_type.map(|t| t.category.clone()),
            access_level: ticket_type.and_then(|t| t.access_level.clone()),
            ticket_price: row
                .map(AttendeeRow::ticket_price)
                .or_else(|| ticket_type.map(|t| t.price)),
            discount_code: registration.and_then(|r| r.discount_code().map(str::to_string)),
            total_amount: registration.map(Registration::total_amount),
            full_name: row.map(|r| r.full_name().to_string()),
            email: ticket.email().clone(),
            merchandise_total: row.map(AttendeeRow::merchandise_total).unwrap_or(Money::ZERO),
            merchandise: ticket.merchandise().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketSummary {
    pub id: TicketId,
    pub ticket_type: TicketTypeId,
    pub status: TicketStatus,
}

impl From<&Ticket> for TicketSummary {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id_typed(),
            ticket_type: ticket.ticket_type().clone(),
            status: ticket.status(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MyTicket {
    pub ticket_id: TicketId,
    pub registration_id: RegistrationId,
    pub event_id: EventId,
    pub event_name: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub ticket_type: TicketTypeId,
    pub status: TicketStatus,
    pub qr_code: Option<ArtifactRef>,
    pub issue_date: DateTime<Utc>,
    pub merchandise: Vec<LineItem>,
}

impl MyTicket {
    pub fn new(ticket: &Ticket, event: Option<&Event>) -> Self {
        Self {
            ticket_id: ticket.id_typed(),
            registration_id: ticket.registration(),
            event_id: ticket.event().clone(),
            event_name: event.map(|e| e.name.clone()),
            start_date: event.and_then(|e| e.start_date),
            end_date: event.and_then(|e| e.end_date),
            ticket_type: ticket.ticket_type().clone(),
            status: ticket.status(),
            qr_code: ticket.qr_code().cloned(),
            issue_date: ticket.issue_date(),
            merchandise: ticket.merchandise().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketDownload {
    pub ticket_id: TicketId,
    pub ticket_type: TicketTypeId,
    pub status: TicketStatus,
    pub qr_code: Option<ArtifactRef>,
    pub issue_date: DateTime<Utc>,
    pub event_id: EventId,
    pub event_name: Option<String>,
    pub venue: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl TicketDownload {
    pub fn new(ticket: &Ticket, event: Option<&Event>) -> Self {
        Self {
            ticket_id: ticket.id_typed(),
            ticket_type: ticket.ticket_type().clone(),
            status: ticket.status(),
            qr_code: ticket.qr_code().cloned(),
            issue_date: ticket.issue_date(),
            event_id: ticket.event().clone(),
            event_name: event.map(|e| e.name.clone()),
            venue: event.and_then(|e| e.venue.clone()),
            start_date: event.and_then(|e| e.start_date),
            end_date: event.and_then(|e| e.end_date),
        }
    }
}
