use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eventive_core::{DomainError, DomainResult, Email, EventId, Money, RegistrationId, TicketTypeId};

use crate::merchandise::MerchandiseBundle;

/// Registration status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl RegistrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "Pending",
            RegistrationStatus::Confirmed => "Confirmed",
            RegistrationStatus::Cancelled => "Cancelled",
        }
    }
}

/// Payment status as reported by the (external) payment processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
}

/// One attendee's line within a registration.
///
/// `ticket_price` is the price at booking time and never follows later
/// catalog changes. `merchandise_total` is derived from the bundle and is 0
/// when there is no merchandise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendeeRow {
    full_name: String,
    email: Email,
    ticket_type: TicketTypeId,
    ticket_price: Money,
    merchandise: Option<MerchandiseBundle>,
    merchandise_total: Money,
}

impl AttendeeRow {
    pub fn new(
        full_name: impl Into<String>,
        email: Email,
        ticket_type: TicketTypeId,
        ticket_price: Money,
        merchandise: Option<MerchandiseBundle>,
    ) -> Self {
        let merchandise_total = merchandise.as_ref().map(|b| b.subtotal()).unwrap_or(Money::ZERO);
        Self {
            full_name: full_name.into(),
            email,
            ticket_type,
            ticket_price,
            merchandise,
            merchandise_total,
        }
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn ticket_type(&self) -> &TicketTypeId {
        &self.ticket_type
    }

    pub fn ticket_price(&self) -> Money {
        self.ticket_price
    }

    pub fn merchandise(&self) -> Option<&MerchandiseBundle> {
        self.merchandise.as_ref()
    }

    pub fn merchandise_total(&self) -> Money {
        self.merchandise_total
    }

    /// What this attendee contributes to the registration total.
    pub fn line_total(&self) -> DomainResult<Money> {
        self.ticket_price.checked_add(self.merchandise_total)
    }

    fn set_merchandise(&mut self, merchandise: Option<MerchandiseBundle>) {
        self.merchandise_total = merchandise.as_ref().map(|b| b.subtotal()).unwrap_or(Money::ZERO);
        self.merchandise = merchandise;
    }
}

/// A booker's registration for one event, with one or more attendees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    id: RegistrationId,
    event: EventId,
    email: Email,
    discount_code: Option<String>,
    status: RegistrationStatus,
    payment_status: PaymentStatus,
    total_amount: Money,
    attendees: Vec<AttendeeRow>,
    created_at: DateTime<Utc>,
    /// Set while tickets are being issued. Booker-facing transitions are
    /// refused until issuance completes.
    #[serde(skip)]
    issuing: bool,
}

impl Registration {
    /// Build a pending, unpaid registration and compute its total.
    pub fn new(
        id: RegistrationId,
        event: EventId,
        email: Email,
        discount_code: Option<String>,
        attendees: Vec<AttendeeRow>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if attendees.is_empty() {
            return Err(DomainError::validation("at least one attendee is required"));
        }
        for (idx, row) in attendees.iter().enumerate() {
            if attendees[..idx].iter().any(|other| other.email == row.email) {
                return Err(DomainError::validation(format!(
                    "duplicate attendee email {}",
                    row.email
                )));
            }
        }

        let total_amount = Self::sum_rows(&attendees)?;

        Ok(Self {
            id,
            event,
            email,
            discount_code,
            status: RegistrationStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            total_amount,
            attendees,
            created_at,
            issuing: false,
        })
    }

    /// Same as [`Registration::new`], but held in the issuing state until
    /// [`Registration::complete_issuance`] is applied.
    pub fn new_issuing(
        id: RegistrationId,
        event: EventId,
        email: Email,
        discount_code: Option<String>,
        attendees: Vec<AttendeeRow>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let mut registration = Self::new(id, event, email, discount_code, attendees, created_at)?;
        registration.issuing = true;
        Ok(registration)
    }

    fn sum_rows(rows: &[AttendeeRow]) -> DomainResult<Money> {
        Money::try_sum(
            rows.iter()
                .map(AttendeeRow::line_total)
                .collect::<DomainResult<Vec<_>>>()?,
        )
    }

    fn recompute_total(&mut self) -> DomainResult<()> {
        self.total_amount = Self::sum_rows(&self.attendees)?;
        Ok(())
    }

    pub fn id_typed(&self) -> RegistrationId {
        self.id
    }

    pub fn event(&self) -> &EventId {
        &self.event
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn discount_code(&self) -> Option<&str> {
        self.discount_code.as_deref()
    }

    pub fn status(&self) -> RegistrationStatus {
        self.status
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn attendees(&self) -> &[AttendeeRow] {
        &self.attendees
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn attendee_count(&self) -> u32 {
        u32::try_from(self.attendees.len()).unwrap_or(u32::MAX)
    }

    pub fn is_issuing(&self) -> bool {
        self.issuing
    }

    pub fn complete_issuance(&mut self) -> DomainResult<()> {
        if !self.issuing {
            return Err(DomainError::invariant("tickets were already issued"));
        }
        self.issuing = false;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status != RegistrationStatus::Cancelled
    }

    pub fn attendee_by_email(&self, email: &Email) -> Option<&AttendeeRow> {
        self.attendees.iter().find(|a| &a.email == email)
    }

    /// Total equals the sum of the attendee rows.
    pub fn is_consistent(&self) -> bool {
        Self::sum_rows(&self.attendees)
            .map(|sum| sum == self.total_amount)
            .unwrap_or(false)
    }

    /// Attach a ticket type's automatic merchandise to a row.
    ///
    /// Only applies while the row has no merchandise. Returns `false` (and
    /// leaves the row untouched) when an explicit selection already exists.
    pub fn attach_included_merchandise(
        &mut self,
        attendee_index: usize,
        bundle: MerchandiseBundle,
    ) -> DomainResult<bool> {
        self.ensure_modifiable()?;
        let row = self
            .attendees
            .get_mut(attendee_index)
            .ok_or_else(|| DomainError::invariant(format!("no attendee at index {attendee_index}")))?;

        if row.merchandise.is_some() {
            return Ok(false);
        }
        row.set_merchandise(Some(bundle));
        self.recompute_total()?;
        Ok(true)
    }

    /// Replace an attendee's merchandise with an explicit selection (or clear it).
    pub fn replace_merchandise(
        &mut self,
        attendee: &Email,
        bundle: Option<MerchandiseBundle>,
    ) -> DomainResult<()> {
        self.ensure_issued()?;
        self.ensure_modifiable()?;
        let row = self
            .attendees
            .iter_mut()
            .find(|a| &a.email == attendee)
            .ok_or_else(|| DomainError::not_found(format!("attendee {attendee}")))?;

        row.set_merchandise(bundle);
        self.recompute_total()
    }

    /// Record an externally settled payment.
    pub fn confirm(&mut self) -> DomainResult<()> {
        self.ensure_issued()?;
        if self.status != RegistrationStatus::Pending {
            return Err(DomainError::invariant("only pending registrations can be confirmed"));
        }
        self.status = RegistrationStatus::Confirmed;
        self.payment_status = PaymentStatus::Paid;
        Ok(())
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        self.ensure_issued()?;
        if self.status == RegistrationStatus::Cancelled {
            return Err(DomainError::invariant("registration is already cancelled"));
        }
        self.status = RegistrationStatus::Cancelled;
        if self.payment_status == PaymentStatus::Paid {
            self.payment_status = PaymentStatus::Refunded;
        }
        Ok(())
    }

    fn ensure_issued(&self) -> DomainResult<()> {
        if self.issuing {
            return Err(DomainError::conflict("tickets are still being issued"));
        }
        Ok(())
    }

    fn ensure_modifiable(&self) -> DomainResult<()> {
        if self.status == RegistrationStatus::Cancelled {
            return Err(DomainError::invariant("cannot modify a cancelled registration"));
        }
        Ok(())
    }
}
