use std::collections::HashMap;
use std::sync::Mutex;

use eventive_core::EventId;

use super::r#trait::{CapacityError, CapacityGate, Reservation};
use crate::catalog::EventCatalog;

/// Mutex-guarded reserved counters.
///
/// Declared capacity is read from the catalog before the lock is taken; the
/// lock covers only the compare-and-increment.
#[derive(Debug)]
pub struct InMemoryCapacityGate<C> {
    catalog: C,
    reserved: Mutex<HashMap<EventId, u32>>,
}

impl<C> InMemoryCapacityGate<C> {
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            reserved: Mutex::new(HashMap::new()),
        }
    }

    fn poisoned() -> CapacityError {
        CapacityError::Backend("lock poisoned".to_string())
    }
}

impl<C> CapacityGate for InMemoryCapacityGate<C>
where
    C: EventCatalog,
{
    fn reserve(&self, event: &EventId, requested: u32) -> Result<Reservation, CapacityError> {
        let capacity = self
            .catalog
            .get_event(event)
            .ok_or_else(|| CapacityError::UnknownEvent(event.clone()))?
            .capacity;

        let mut counters = self.reserved.lock().map_err(|_| Self::poisoned())?;
        let current = counters.get(event).copied().unwrap_or(0);
        let next = current
            .checked_add(requested)
            .ok_or_else(|| CapacityError::Backend(format!("reserved counter overflow for {event}")))?;

        if let Some(capacity) = capacity {
            if next > capacity {
                return Err(CapacityError::CapacityExceeded {
                    event: event.clone(),
                    requested,
                    available: capacity.saturating_sub(current),
                });
            }
        }

        counters.insert(event.clone(), next);
        Ok(Reservation::new(event.clone(), requested))
    }

    fn release(&self, reservation: &Reservation) -> Result<(), CapacityError> {
        let mut counters = self.reserved.lock().map_err(|_| Self::poisoned())?;
        if let Some(current) = counters.get_mut(&reservation.event) {
            *current = current.saturating_sub(reservation.slots);
        }
        Ok(())
    }

    fn reserved(&self, event: &EventId) -> Result<u32, CapacityError> {
        let counters = self.reserved.lock().map_err(|_| Self::poisoned())?;
        Ok(counters.get(event).copied().unwrap_or(0))
    }
}
