//! Ticket issuance: one ticket per attendee row.

use chrono::Utc;
use tracing::{debug, error};

use eventive_booking::{AttendeeRow, LineItem, Registration, Ticket};
use eventive_core::{RegistrationId, TicketId};

use crate::artifact::{ArtifactError, ArtifactStore};
use crate::catalog::{MerchandiseCatalog, TicketTypeCatalog};
use crate::error::IssueError;
use crate::qr::{QrArtifactGenerator, QrSettings};
use crate::resolver::BundleResolver;
use crate::store::BookingStore;

/// Creates a ticket for an attendee row, attaches any automatically
/// included merchandise, and assigns the ticket's QR artifact.
///
/// Failures are logged and returned; nothing is retried here. Cleaning up a
/// half-issued booking is the caller's job.
#[derive(Debug, Clone)]
pub struct TicketIssuer<C, S, A> {
    catalog: C,
    store: S,
    resolver: BundleResolver<C>,
    qr: QrArtifactGenerator<A>,
}

impl<C, S, A> TicketIssuer<C, S, A>
where
    C: TicketTypeCatalog + MerchandiseCatalog + Clone,
    S: BookingStore,
    A: ArtifactStore,
{
    pub fn new(catalog: C, store: S, artifacts: A, settings: QrSettings) -> Self {
        Self {
            resolver: BundleResolver::new(catalog.clone()),
            catalog,
            store,
            qr: QrArtifactGenerator::new(artifacts, settings),
        }
    }

    pub fn qr(&self) -> &QrArtifactGenerator<A> {
        &self.qr
    }

    pub fn issue_ticket(&self, registration: &Registration, attendee_index: usize) -> Result<Ticket, IssueError> {
        self.try_issue(registration, attendee_index).inspect_err(|e| {
            let email = registration
                .attendees()
                .get(attendee_index)
                .map(|row| row.email().to_string())
                .unwrap_or_default();
            error!(
                registration_id = %registration.id_typed(),
                event_id = %registration.event(),
                email = %email,
                attendee_index,
                error = %e,
                "ticket issuance failed"
            );
        })
    }

    fn try_issue(&self, registration: &Registration, attendee_index: usize) -> Result<Ticket, IssueError> {
        let row = registration
            .attendees()
            .get(attendee_index)
            .ok_or(IssueError::MissingAttendee(attendee_index))?;

        let lines = match row.merchandise() {
            Some(bundle) => bundle.items().to_vec(),
            None => self
                .attach_included(registration.id_typed(), attendee_index, row)?
                .unwrap_or_default(),
        };

        let ticket = Ticket::issue(
            TicketId::new(),
            registration.id_typed(),
            registration.event().clone(),
            row.ticket_type().clone(),
            row.email().clone(),
            lines,
            Utc::now(),
        );
        let ticket_id = ticket.id_typed();
        self.store.insert_ticket(ticket)?;

        let artifact = self.qr.generate(ticket_id)?;
        let ticket = self
            .store
            .update_ticket(ticket_id, &mut |t| t.assign_qr_code(artifact.clone()))?;

        debug!(
            registration_id = %registration.id_typed(),
            ticket_id = %ticket_id,
            attendee_index,
            "ticket issued"
        );
        Ok(ticket)
    }

    /// Attach the ticket type's included merchandise to a row that has none.
    ///
    /// Returns the line items the row holds afterwards. The store update is
    /// conditional: an explicit selection written in the meantime wins.
    fn attach_included(
        &self,
        registration: RegistrationId,
        attendee_index: usize,
        row: &AttendeeRow,
    ) -> Result<Option<Vec<LineItem>>, IssueError> {
        let ticket_type = self
            .catalog
            .get_ticket_type(row.ticket_type())
            .ok_or_else(|| IssueError::UnknownTicketType(row.ticket_type().clone()))?;
        if !ticket_type.includes_merchandise() {
            return Ok(None);
        }

        let Some(bundle) = self
            .resolver
            .resolve_included(&ticket_type.included_merchandise)
            .map_err(|e| IssueError::IncludedMerchandise(e.to_string()))?
        else {
            return Ok(None);
        };

        let mut attached = false;
        let updated = self.store.update_registration(registration, &mut |r| {
            attached = r.attach_included_merchandise(attendee_index, bundle.clone())?;
            Ok(())
        })?;

        debug!(
            registration_id = %registration,
            attendee_index,
            attached,
            total_amount = %updated.total_amount(),
            "included merchandise"
        );

        Ok(updated
            .attendees()
            .get(attendee_index)
            .and_then(AttendeeRow::merchandise)
            .map(|b| b.items().to_vec()))
    }

    /// Best-effort removal of a ticket's QR artifact.
    pub fn discard_artifact(&self, ticket: TicketId) -> Result<(), ArtifactError> {
        self.qr.discard(ticket)
    }
}
