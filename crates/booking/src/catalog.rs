//! Records owned by the catalog collaborators.
//!
//! The engine only reads these. They are deserializable so a catalog can be
//! seeded from JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eventive_core::{EventId, MerchandiseItemId, Money, TicketTypeId};

use crate::merchandise::MerchandiseSelection;

/// An event attendees can register for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    /// Maximum number of attendees; `None` means unlimited.
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

impl Event {
    pub fn is_unlimited(&self) -> bool {
        self.capacity.is_none()
    }
}

/// A ticket category for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketType {
    pub id: TicketTypeId,
    pub event: EventId,
    pub category: String,
    #[serde(default)]
    pub access_level: Option<String>,
    pub price: Money,
    /// Merchandise handed out with every ticket of this type.
    #[serde(default)]
    pub included_merchandise: Vec<MerchandiseSelection>,
    #[serde(default)]
    pub sales_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sales_end: Option<DateTime<Utc>>,
}

impl TicketType {
    pub fn includes_merchandise(&self) -> bool {
        !self.included_merchandise.is_empty()
    }

    pub fn belongs_to(&self, event: &EventId) -> bool {
        &self.event == event
    }
}

/// A sellable add-on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchandiseItem {
    pub id: MerchandiseItemId,
    pub name: String,
    pub unit_price: Money,
    #[serde(default)]
    pub event: Option<EventId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_type_deserializes_with_defaults() {
        let tt: TicketType = serde_json::from_value(serde_json::json!({
            "id": "VIP",
            "event": "EVT-1",
            "category": "VIP",
            "price": 5000,
        }))
        .unwrap();

        assert_eq!(tt.price, Money::from_minor(5000));
        assert!(!tt.includes_merchandise());
        assert!(tt.belongs_to(&EventId::from("EVT-1")));
    }

    #[test]
    fn event_without_capacity_is_unlimited() {
        let ev: Event = serde_json::from_value(serde_json::json!({
            "id": "EVT-1",
            "name": "RustConf",
            "is_published": true,
        }))
        .unwrap();
        assert!(ev.is_unlimited());
    }
}
