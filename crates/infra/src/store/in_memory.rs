use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use eventive_booking::{Registration, Ticket};
use eventive_core::{Email, EventId, RegistrationId, TicketId};

use super::r#trait::{BookingStore, RegistrationUpdate, StoreError, TicketUpdate};

#[derive(Debug, Default)]
struct State {
    registrations: HashMap<RegistrationId, Registration>,
    tickets: HashMap<TicketId, Ticket>,
}

/// In-memory booking store.
///
/// One lock guards both tables so registration and ticket writes observe a
/// consistent view. Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryBookingStore {
    state: RwLock<State>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    pub fn registration_count(&self) -> usize {
        self.read().map(|s| s.registrations.len()).unwrap_or(0)
    }

    pub fn ticket_count(&self) -> usize {
        self.read().map(|s| s.tickets.len()).unwrap_or(0)
    }
}

fn newest_tickets_first(tickets: &mut [Ticket]) {
    tickets.sort_by(|a, b| {
        b.issue_date()
            .cmp(&a.issue_date())
            .then_with(|| b.id_typed().cmp(&a.id_typed()))
    });
}

impl BookingStore for InMemoryBookingStore {
    fn insert_registration(&self, registration: Registration) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let id = registration.id_typed();
        if state.registrations.contains_key(&id) {
            return Err(StoreError::Conflict(format!("registration {id} already exists")));
        }
        state.registrations.insert(id, registration);
        Ok(())
    }

    fn get_registration(&self, id: RegistrationId) -> Result<Option<Registration>, StoreError> {
        Ok(self.read()?.registrations.get(&id).cloned())
    }

    fn registrations_for(&self, email: &Email, event: &EventId) -> Result<Vec<Registration>, StoreError> {
        let state = self.read()?;
        let mut out: Vec<Registration> = state
            .registrations
            .values()
            .filter(|r| r.email() == email && r.event() == event)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id_typed().cmp(&a.id_typed()))
        });
        Ok(out)
    }

    fn reserved_slots(&self, event: &EventId) -> Result<u32, StoreError> {
        let state = self.read()?;
        Ok(state
            .registrations
            .values()
            .filter(|r| r.event() == event && r.is_active())
            .map(Registration::attendee_count)
            .sum())
    }

    fn update_registration(
        &self,
        id: RegistrationId,
        update: RegistrationUpdate<'_>,
    ) -> Result<Registration, StoreError> {
        let mut state = self.write()?;
        let current = state
            .registrations
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("registration {id}")))?;

        // Work on a copy so a failed update leaves the stored record intact.
        let mut next = current.clone();
        update(&mut next)?;
        *current = next.clone();
        Ok(next)
    }

    fn delete_registration(&self, id: RegistrationId) -> Result<Option<Registration>, StoreError> {
        Ok(self.write()?.registrations.remove(&id))
    }

    fn insert_ticket(&self, ticket: Ticket) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let id = ticket.id_typed();
        if !state.registrations.contains_key(&ticket.registration()) {
            return Err(StoreError::NotFound(format!("registration {}", ticket.registration())));
        }
        if state.tickets.contains_key(&id) {
            return Err(StoreError::Conflict(format!("ticket {id} already exists")));
        }
        state.tickets.insert(id, ticket);
        Ok(())
    }

    fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        Ok(self.read()?.tickets.get(&id).cloned())
    }

    fn update_ticket(&self, id: TicketId, update: TicketUpdate<'_>) -> Result<Ticket, StoreError> {
        let mut state = self.write()?;
        let current = state
            .tickets
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("ticket {id}")))?;

        let mut next = current.clone();
        update(&mut next)?;
        *current = next.clone();
        Ok(next)
    }

    fn tickets_for_registration(&self, id: RegistrationId) -> Result<Vec<Ticket>, StoreError> {
        let state = self.read()?;
        let mut out: Vec<Ticket> = state
            .tickets
            .values()
            .filter(|t| t.registration() == id)
            .cloned()
            .collect();
        newest_tickets_first(&mut out);
        Ok(out)
    }

    fn tickets_for_email(&self, email: &Email) -> Result<Vec<Ticket>, StoreError> {
        let state = self.read()?;
        let mut out: Vec<Ticket> = state.tickets.values().filter(|t| t.email() == email).cloned().collect();
        newest_tickets_first(&mut out);
        Ok(out)
    }

    fn remove_tickets_for_registration(&self, id: RegistrationId) -> Result<Vec<Ticket>, StoreError> {
        let mut state = self.write()?;
        let ids: Vec<TicketId> = state
            .tickets
            .values()
            .filter(|t| t.registration() == id)
            .map(Ticket::id_typed)
            .collect();

        Ok(ids.iter().filter_map(|tid| state.tickets.remove(tid)).collect())
    }
}
