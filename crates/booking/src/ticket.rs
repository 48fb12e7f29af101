use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eventive_core::{DomainError, DomainResult, Email, EventId, RegistrationId, TicketId, TicketTypeId};

use crate::merchandise::LineItem;

/// Reference to a stored artifact (URL or storage key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ticket status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    Valid,
    CheckedIn,
    Revoked,
}

impl TicketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Valid => "Valid",
            TicketStatus::CheckedIn => "CheckedIn",
            TicketStatus::Revoked => "Revoked",
        }
    }
}

/// Per-attendee proof of registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ticket {
    id: TicketId,
    registration: RegistrationId,
    event: EventId,
    ticket_type: TicketTypeId,
    email: Email,
    status: TicketStatus,
    qr_code: Option<ArtifactRef>,
    issue_date: DateTime<Utc>,
    merchandise: Vec<LineItem>,
}

impl Ticket {
    pub fn issue(
        id: TicketId,
        registration: RegistrationId,
        event: EventId,
        ticket_type: TicketTypeId,
        email: Email,
        merchandise: Vec<LineItem>,
        issue_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            registration,
            event,
            ticket_type,
            email,
            status: TicketStatus::Valid,
            qr_code: None,
            issue_date,
            merchandise,
        }
    }

    pub fn id_typed(&self) -> TicketId {
        self.id
    }

    pub fn registration(&self) -> RegistrationId {
        self.registration
    }

    pub fn event(&self) -> &EventId {
        &self.event
    }

    pub fn ticket_type(&self) -> &TicketTypeId {
        &self.ticket_type
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn status(&self) -> TicketStatus {
        self.status
    }

    pub fn qr_code(&self) -> Option<&ArtifactRef> {
        self.qr_code.as_ref()
    }

    pub fn issue_date(&self) -> DateTime<Utc> {
        self.issue_date
    }

    pub fn merchandise(&self) -> &[LineItem] {
        &self.merchandise
    }

    pub fn is_active(&self) -> bool {
        self.status != TicketStatus::Revoked
    }

    pub fn is_checked_in(&self) -> bool {
        self.status == TicketStatus::CheckedIn
    }

    /// Assign the QR artifact. A ticket's QR reference is set exactly once.
    pub fn assign_qr_code(&mut self, artifact: ArtifactRef) -> DomainResult<()> {
        if let Some(existing) = &self.qr_code {
            return Err(DomainError::conflict(format!(
                "ticket {} already has qr code {existing}",
                self.id
            )));
        }
        self.qr_code = Some(artifact);
        Ok(())
    }

    pub fn check_in(&mut self) -> DomainResult<()> {
        match self.status {
            TicketStatus::Valid => {
                self.status = TicketStatus::CheckedIn;
                Ok(())
            }
            TicketStatus::CheckedIn => Err(DomainError::invariant("ticket is already checked in")),
            TicketStatus::Revoked => Err(DomainError::invariant("cannot check in a revoked ticket")),
        }
    }

    pub fn revoke(&mut self) {
        self.status = TicketStatus::Revoked;
    }

    pub fn replace_merchandise(&mut self, merchandise: Vec<LineItem>) -> DomainResult<()> {
        if self.status == TicketStatus::Revoked {
            return Err(DomainError::invariant("cannot modify a revoked ticket"));
        }
        self.merchandise = merchandise;
        Ok(())
    }
}
