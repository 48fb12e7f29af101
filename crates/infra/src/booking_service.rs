//! Booking orchestration.
//!
//! `create_booking` runs an explicit, ordered pipeline:
//!
//! ```text
//! BookingRequest
//!   ↓
//! 0. Validate request + catalog (event published, ticket types belong)
//!   ↓
//! 1. Reserve capacity                      ← compensation: release
//!   ↓
//! 2. Resolve merchandise, snapshot prices
//!   ↓
//! 3. Compute total, persist registration   ← compensation: delete
//!   ↓
//! 4. Issue one ticket per attendee         ← compensation: remove tickets + artifacts
//! ```
//!
//! Compensation happens here, at the call site, in reverse order. Nothing is
//! retried automatically.

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use eventive_booking::{
    ArtifactRef, AttendeeRow, BookingRequest, Caller, MerchandiseSelection, Registration, RegistrationStatus,
    Ticket, TicketType, ValidatedBooking,
};
use eventive_core::{Email, EventId, Money, RegistrationId, TicketId, TicketTypeId};

use crate::artifact::ArtifactStore;
use crate::capacity::{CapacityError, CapacityGate, Reservation};
use crate::catalog::Catalog;
use crate::error::{BookingError, IssueError};
use crate::issuer::TicketIssuer;
use crate::qr::QrSettings;
use crate::resolver::BundleResolver;
use crate::store::BookingStore;
use crate::views::{MyTicket, RegistrationDetail, TicketDetail, TicketDownload, TicketSummary, TicketView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingOptions {
    /// Issue tickets for one booking on scoped threads.
    pub parallel_issuance: bool,
    pub qr: QrSettings,
}

impl Default for BookingOptions {
    fn default() -> Self {
        Self {
            parallel_issuance: true,
            qr: QrSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedTicket {
    pub id: TicketId,
    pub email: Email,
    pub ticket_type: TicketTypeId,
    pub qr_code: Option<ArtifactRef>,
}

impl From<&Ticket> for IssuedTicket {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id_typed(),
            email: ticket.email().clone(),
            ticket_type: ticket.ticket_type().clone(),
            qr_code: ticket.qr_code().cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingResult {
    pub registration_id: RegistrationId,
    pub tickets: Vec<IssuedTicket>,
    pub total_amount: Money,
    pub status: RegistrationStatus,
}

pub struct BookingService<C, G, S, A> {
    catalog: C,
    gate: G,
    store: S,
    resolver: BundleResolver<C>,
    issuer: TicketIssuer<C, S, A>,
    options: BookingOptions,
}

impl<C, G, S, A> BookingService<C, G, S, A>
where
    C: Catalog + Clone,
    G: CapacityGate,
    S: BookingStore + Clone,
    A: ArtifactStore,
{
    pub fn new(catalog: C, gate: G, store: S, artifacts: A, options: BookingOptions) -> Self {
        Self {
            resolver: BundleResolver::new(catalog.clone()),
            issuer: TicketIssuer::new(catalog.clone(), store.clone(), artifacts, options.qr),
            catalog,
            gate,
            store,
            options,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }

    #[instrument(
        skip_all,
        fields(event_id = %request.event_id, email = %request.email, attendees = request.attendees.len())
    )]
    pub fn create_booking(&self, request: &BookingRequest) -> Result<BookingResult, BookingError> {
        let booking = request.validate()?;
        let ticket_types = self.check_catalog(&booking)?;
        let requested = u32::try_from(booking.attendees.len())
            .map_err(|_| BookingError::validation("too many attendees"))?;

        let reservation = self.gate.reserve(&booking.event_id, requested).map_err(|e| {
            if let CapacityError::CapacityExceeded { available, .. } = &e {
                warn!(requested, available, "capacity exceeded");
            }
            BookingError::from(e)
        })?;

        match self.commit(&booking, &ticket_types) {
            Ok(result) => {
                info!(
                    registration_id = %result.registration_id,
                    tickets = result.tickets.len(),
                    total_amount = %result.total_amount,
                    "booking created"
                );
                Ok(result)
            }
            Err(e) => {
                self.release(&reservation);
                Err(e)
            }
        }
    }

    /// Catalog-dependent validation. Returns the ticket type of each attendee.
    fn check_catalog(&self, booking: &ValidatedBooking) -> Result<Vec<TicketType>, BookingError> {
        let event = self
            .catalog
            .get_event(&booking.event_id)
            .ok_or_else(|| BookingError::validation(format!("unknown event {}", booking.event_id)))?;
        if !event.is_published {
            return Err(BookingError::validation(format!(
                "event {} is not open for registration",
                event.id
            )));
        }

        booking
            .attendees
            .iter()
            .enumerate()
            .map(|(idx, attendee)| {
                let ticket_type = self.catalog.get_ticket_type(&attendee.ticket_type).ok_or_else(|| {
                    BookingError::validation(format!("attendee {idx}: unknown ticket type {}", attendee.ticket_type))
                })?;
                if !ticket_type.belongs_to(&event.id) {
                    return Err(BookingError::validation(format!(
                        "attendee {idx}: ticket type {} does not belong to event {}",
                        ticket_type.id, event.id
                    )));
                }
                Ok(ticket_type)
            })
            .collect()
    }

    /// Steps 2-4. The caller releases the reservation if this fails.
    fn commit(&self, booking: &ValidatedBooking, ticket_types: &[TicketType]) -> Result<BookingResult, BookingError> {
        let rows = booking
            .attendees
            .iter()
            .zip(ticket_types)
            .map(|(attendee, ticket_type)| {
                let bundle = self.resolver.resolve(&attendee.merchandise)?;
                Ok(AttendeeRow::new(
                    attendee.full_name.clone(),
                    attendee.email.clone(),
                    attendee.ticket_type.clone(),
                    attendee.ticket_price.unwrap_or(ticket_type.price),
                    bundle,
                ))
            })
            .collect::<Result<Vec<_>, BookingError>>()?;

        let registration = Registration::new_issuing(
            RegistrationId::new(),
            booking.event_id.clone(),
            booking.email.clone(),
            booking.discount_code.clone(),
            rows,
            Utc::now(),
        )?;
        let registration_id = registration.id_typed();
        self.store.insert_registration(registration.clone())?;

        let tickets = match self.issue_all(&registration) {
            Ok(tickets) => tickets,
            Err(e) => {
                self.unwind(registration_id);
                return Err(e);
            }
        };

        // The committed record carries included merchandise attached during issuance.
        let registration = match self
            .store
            .update_registration(registration_id, &mut |r| r.complete_issuance())
        {
            Ok(committed) => committed,
            Err(e) => {
                error!(registration_id = %registration_id, error = %e, "failed to complete issuance");
                self.unwind(registration_id);
                return Err(e.into());
            }
        };

        Ok(BookingResult {
            registration_id,
            tickets: tickets.iter().map(IssuedTicket::from).collect(),
            total_amount: registration.total_amount(),
            status: registration.status(),
        })
    }

    /// Issue every ticket, joining all workers before returning. Results keep
    /// attendee order; the first failure by attendee index is reported.
    fn issue_all(&self, registration: &Registration) -> Result<Vec<Ticket>, BookingError> {
        let count = registration.attendees().len();
        if !self.options.parallel_issuance || count < 2 {
            return (0..count).map(|idx| self.issue_one(registration, idx)).collect();
        }

        let results: Vec<Result<Ticket, BookingError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..count)
                .map(|idx| scope.spawn(move || self.issue_one(registration, idx)))
                .collect();

            handles
                .into_iter()
                .enumerate()
                .map(|(idx, handle)| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(issuance_error(registration, idx, IssueError::Panicked)))
                })
                .collect()
        });

        results.into_iter().collect()
    }

    fn issue_one(&self, registration: &Registration, idx: usize) -> Result<Ticket, BookingError> {
        self.issuer
            .issue_ticket(registration, idx)
            .map_err(|source| issuance_error(registration, idx, source))
    }

    /// Remove everything a failed issuance left behind.
    fn unwind(&self, registration: RegistrationId) {
        match self.store.remove_tickets_for_registration(registration) {
            Ok(removed) => {
                for ticket in &removed {
                    if let Err(e) = self.issuer.discard_artifact(ticket.id_typed()) {
                        error!(
                            registration_id = %registration,
                            ticket_id = %ticket.id_typed(),
                            error = %e,
                            "failed to remove qr artifact during rollback"
                        );
                    }
                }
            }
            Err(e) => error!(registration_id = %registration, error = %e, "failed to remove tickets during rollback"),
        }

        if let Err(e) = self.store.delete_registration(registration) {
            error!(registration_id = %registration, error = %e, "failed to delete registration during rollback");
        }
        warn!(registration_id = %registration, "booking rolled back");
    }

    fn release(&self, reservation: &Reservation) {
        if let Err(e) = self.gate.release(reservation) {
            error!(
                event_id = %reservation.event,
                slots = reservation.slots,
                error = %e,
                "failed to release capacity reservation"
            );
        }
    }

    fn event_of(&self, id: &EventId) -> Option<eventive_booking::Event> {
        self.catalog.get_event(id)
    }

    fn detail(&self, registration: &Registration) -> Result<RegistrationDetail, BookingError> {
        let tickets = self.store.tickets_for_registration(registration.id_typed())?;
        let event = self.event_of(registration.event());
        Ok(RegistrationDetail::new(registration, event.as_ref(), &tickets))
    }

    /// Registrations still issuing tickets are reported as missing.
    fn require_registration(&self, id: RegistrationId) -> Result<Registration, BookingError> {
        self.store
            .get_registration(id)?
            .filter(|r| !r.is_issuing())
            .ok_or_else(|| BookingError::not_found(format!("registration {id}")))
    }

    /// False while the owning registration is still issuing (or was rolled back).
    fn is_issued(&self, ticket: &Ticket) -> Result<bool, BookingError> {
        Ok(self
            .store
            .get_registration(ticket.registration())?
            .is_some_and(|r| !r.is_issuing()))
    }

    fn require_ticket(&self, id: TicketId) -> Result<Ticket, BookingError> {
        match self.store.get_ticket(id)? {
            Some(ticket) if self.is_issued(&ticket)? => Ok(ticket),
            _ => Err(BookingError::not_found(format!("ticket {id}"))),
        }
    }

    /// The ticket holder or the booker who paid for it.
    fn ensure_ticket_access(&self, caller: &Caller, ticket: &Ticket, action: &str) -> Result<(), BookingError> {
        if caller.is_guest() {
            return Err(BookingError::Unauthenticated);
        }
        if caller.owns(ticket.email()) {
            return Ok(());
        }
        let booker = self
            .store
            .get_registration(ticket.registration())?
            .map(|r| r.email().clone());
        if booker.as_ref().is_some_and(|b| caller.owns(b)) {
            return Ok(());
        }
        Err(BookingError::forbidden(format!("not permitted to {action} this ticket")))
    }

    /// The booker's registration for an event. An active registration is
    /// preferred over cancelled ones.
    pub fn get_registration(&self, email: &Email, event: &EventId) -> Result<Option<RegistrationDetail>, BookingError> {
        let registrations: Vec<Registration> = self
            .store
            .registrations_for(email, event)?
            .into_iter()
            .filter(|r| !r.is_issuing())
            .collect();
        let Some(registration) = registrations
            .iter()
            .find(|r| r.is_active())
            .or_else(|| registrations.first())
        else {
            return Ok(None);
        };
        self.detail(registration).map(Some)
    }

    pub fn registration(&self, id: RegistrationId) -> Result<RegistrationDetail, BookingError> {
        let registration = self.require_registration(id)?;
        self.detail(&registration)
    }

    fn active_ticket_for(&self, email: &Email, event: &EventId) -> Result<Option<Ticket>, BookingError> {
        for ticket in self.store.tickets_for_email(email)? {
            if ticket.event() == event && ticket.is_active() && self.is_issued(&ticket)? {
                return Ok(Some(ticket));
            }
        }
        Ok(None)
    }

    pub fn get_ticket(&self, email: &Email, event: &EventId) -> Result<Option<TicketDetail>, BookingError> {
        let Some(ticket) = self.active_ticket_for(email, event)? else {
            return Ok(None);
        };
        let registration = self.store.get_registration(ticket.registration())?;
        let event = self.event_of(ticket.event());
        let ticket_type = self.catalog.get_ticket_type(ticket.ticket_type());

        Ok(Some(TicketDetail::new(
            &ticket,
            event.as_ref(),
            ticket_type.as_ref(),
            registration.as_ref(),
        )))
    }

    pub fn has_ticket(&self, email: &Email, event: &EventId) -> Result<Option<TicketSummary>, BookingError> {
        Ok(self.active_ticket_for(email, event)?.as_ref().map(TicketSummary::from))
    }

    /// Ticket types of an event, cheapest first.
    pub fn ticket_types(&self, event: &EventId) -> Result<Vec<TicketType>, BookingError> {
        if self.catalog.get_event(event).is_none() {
            return Err(BookingError::not_found(format!("event {event}")));
        }
        let mut types = self.catalog.ticket_types_for_event(event);
        types.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.id.cmp(&b.id)));
        Ok(types)
    }

    pub fn my_tickets(&self, caller: &Caller) -> Result<Vec<MyTicket>, BookingError> {
        let email = caller.email().ok_or(BookingError::Unauthenticated)?;
        let mut tickets = Vec::new();
        for ticket in self.store.tickets_for_email(email)? {
            if ticket.is_active() && self.is_issued(&ticket)? {
                tickets.push(MyTicket::new(&ticket, self.event_of(ticket.event()).as_ref()));
            }
        }
        Ok(tickets)
    }

    /// Ticket holder or the booker who paid for it may download.
    pub fn download_ticket(&self, caller: &Caller, ticket: TicketId) -> Result<TicketDownload, BookingError> {
        if caller.is_guest() {
            return Err(BookingError::Unauthenticated);
        }
        let ticket = self.require_ticket(ticket)?;
        if !ticket.is_active() {
            return Err(BookingError::not_found(format!("ticket {}", ticket.id_typed())));
        }
        self.ensure_ticket_access(caller, &ticket, "download")?;

        Ok(TicketDownload::new(&ticket, self.event_of(ticket.event()).as_ref()))
    }

    /// Raw bytes of a stored artifact.
    pub fn artifact(&self, name: &str) -> Result<Option<Vec<u8>>, BookingError> {
        Ok(self.issuer.qr().artifacts().get(name)?)
    }

    pub fn reserved(&self, event: &EventId) -> Result<u32, BookingError> {
        Ok(self.gate.reserved(event)?)
    }

    #[instrument(skip(self, caller), fields(registration_id = %id))]
    pub fn cancel_registration(&self, caller: &Caller, id: RegistrationId) -> Result<RegistrationDetail, BookingError> {
        if caller.is_guest() {
            return Err(BookingError::Unauthenticated);
        }
        let registration = self.require_registration(id)?;
        if !caller.owns(registration.email()) {
            return Err(BookingError::forbidden("only the booker may cancel a registration"));
        }

        if !registration.is_active() {
            return Err(BookingError::InvariantViolation("registration is already cancelled".to_string()));
        }

        // Tickets go first: a failure here leaves the registration active and
        // its capacity held, so the cancel can simply be retried.
        for ticket in self.store.tickets_for_registration(id)? {
            if ticket.is_active() {
                self.store.update_ticket(ticket.id_typed(), &mut |t| {
                    t.revoke();
                    Ok(())
                })?;
            }
        }

        // Only the call that flips the status releases the slots.
        let cancelled = self.store.update_registration(id, &mut |r| r.cancel())?;

        self.release(&Reservation::new(
            cancelled.event().clone(),
            cancelled.attendee_count(),
        ));
        info!(event_id = %cancelled.event(), "registration cancelled");

        self.detail(&cancelled)
    }

    /// Record payment. Only the booker may confirm their registration.
    #[instrument(skip(self, caller), fields(registration_id = %id))]
    pub fn confirm_registration(&self, caller: &Caller, id: RegistrationId) -> Result<RegistrationDetail, BookingError> {
        if caller.is_guest() {
            return Err(BookingError::Unauthenticated);
        }
        let registration = self.require_registration(id)?;
        if !caller.owns(registration.email()) {
            return Err(BookingError::forbidden("only the booker may confirm a registration"));
        }

        let confirmed = self.store.update_registration(id, &mut |r| r.confirm())?;
        info!(total_amount = %confirmed.total_amount(), "registration confirmed");
        self.detail(&confirmed)
    }

    #[instrument(skip(self, caller), fields(ticket_id = %id))]
    pub fn check_in(&self, caller: &Caller, id: TicketId) -> Result<TicketView, BookingError> {
        if caller.is_guest() {
            return Err(BookingError::Unauthenticated);
        }
        let ticket = self.require_ticket(id)?;
        self.ensure_ticket_access(caller, &ticket, "check in")?;

        let ticket = self.store.update_ticket(id, &mut |t| t.check_in())?;
        let registration = self.store.get_registration(ticket.registration())?;
        info!("ticket checked in");
        Ok(TicketView::new(
            &ticket,
            registration.as_ref().and_then(|r| r.attendee_by_email(ticket.email())),
        ))
    }

    /// Replace an attendee's merchandise with an explicit selection. An empty
    /// selection clears it. The attendee's ticket is refreshed to match.
    #[instrument(skip(self, caller, items), fields(registration_id = %id, attendee = %attendee))]
    pub fn update_attendee_merchandise(
        &self,
        caller: &Caller,
        id: RegistrationId,
        attendee: &Email,
        items: &[MerchandiseSelection],
    ) -> Result<RegistrationDetail, BookingError> {
        if caller.is_guest() {
            return Err(BookingError::Unauthenticated);
        }
        let registration = self.require_registration(id)?;
        if !caller.owns(registration.email()) && !caller.owns(attendee) {
            return Err(BookingError::forbidden("only the booker or the attendee may change merchandise"));
        }
        if registration.attendee_by_email(attendee).is_none() {
            return Err(BookingError::not_found(format!("attendee {attendee} in registration {id}")));
        }

        let bundle = self.resolver.resolve(items)?;
        let updated = self
            .store
            .update_registration(id, &mut |r| r.replace_merchandise(attendee, bundle.clone()))?;

        let lines = bundle.as_ref().map(|b| b.items().to_vec()).unwrap_or_default();
        for ticket in self.store.tickets_for_registration(id)? {
            if ticket.email() == attendee && ticket.is_active() {
                self.store
                    .update_ticket(ticket.id_typed(), &mut |t| t.replace_merchandise(lines.clone()))?;
            }
        }

        info!(total_amount = %updated.total_amount(), "attendee merchandise updated");
        self.detail(&updated)
    }
}

fn issuance_error(registration: &Registration, attendee_index: usize, source: IssueError) -> BookingError {
    let email = registration
        .attendees()
        .get(attendee_index)
        .map(|row| row.email().clone())
        .unwrap_or_else(|| registration.email().clone());
    BookingError::TicketIssuance {
        attendee_index,
        email,
        source,
    }
}
