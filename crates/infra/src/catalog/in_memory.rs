use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use serde::Deserialize;
use thiserror::Error;

use eventive_booking::{Event, MerchandiseItem, TicketType};
use eventive_core::{EventId, MerchandiseItemId, TicketTypeId};

use super::{EventCatalog, MerchandiseCatalog, TicketTypeCatalog};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog seed {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog seed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// JSON shape accepted by [`InMemoryCatalog::from_json_file`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub ticket_types: Vec<TicketType>,
    #[serde(default)]
    pub merchandise: Vec<MerchandiseItem>,
}

/// In-memory catalog for tests/dev and JSON-seeded deployments.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    events: RwLock<HashMap<EventId, Event>>,
    ticket_types: RwLock<HashMap<TicketTypeId, TicketType>>,
    merchandise: RwLock<HashMap<MerchandiseItemId, MerchandiseItem>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: CatalogSeed) -> Self {
        let catalog = Self::new();
        for event in seed.events {
            catalog.upsert_event(event);
        }
        for ticket_type in seed.ticket_types {
            catalog.upsert_ticket_type(ticket_type);
        }
        for item in seed.merchandise {
            catalog.upsert_item(item);
        }
        catalog
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let seed: CatalogSeed = serde_json::from_str(&raw)?;
        Ok(Self::from_seed(seed))
    }

    pub fn upsert_event(&self, event: Event) {
        if let Ok(mut map) = self.events.write() {
            map.insert(event.id.clone(), event);
        }
    }

    pub fn upsert_ticket_type(&self, ticket_type: TicketType) {
        if let Ok(mut map) = self.ticket_types.write() {
            map.insert(ticket_type.id.clone(), ticket_type);
        }
    }

    pub fn upsert_item(&self, item: MerchandiseItem) {
        if let Ok(mut map) = self.merchandise.write() {
            map.insert(item.id.clone(), item);
        }
    }

    pub fn events(&self) -> Vec<Event> {
        let map = match self.events.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        let mut out: Vec<Event> = map.values().cloned().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}

impl EventCatalog for InMemoryCatalog {
    fn get_event(&self, id: &EventId) -> Option<Event> {
        let map = self.events.read().ok()?;
        map.get(id).cloned()
    }
}

impl TicketTypeCatalog for InMemoryCatalog {
    fn get_ticket_type(&self, id: &TicketTypeId) -> Option<TicketType> {
        let map = self.ticket_types.read().ok()?;
        map.get(id).cloned()
    }

    fn ticket_types_for_event(&self, event: &EventId) -> Vec<TicketType> {
        let map = match self.ticket_types.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        map.values().filter(|t| t.belongs_to(event)).cloned().collect()
    }
}

impl MerchandiseCatalog for InMemoryCatalog {
    fn get_item(&self, id: &MerchandiseItemId) -> Option<MerchandiseItem> {
        let map = self.merchandise.read().ok()?;
        map.get(id).cloned()
    }
}
