//! Merchandise bundles: immutable, priced sets of add-on items.

use serde::{Deserialize, Serialize};

use eventive_core::{BundleId, DomainError, DomainResult, MerchandiseItemId, Money};

/// A requested item and quantity, before pricing.
///
/// Quantity is signed so that non-positive requests can be represented and
/// rejected by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchandiseSelection {
    pub item: MerchandiseItemId,
    pub quantity: i64,
}

/// One priced line of a bundle. `unit_price` is a snapshot taken at
/// resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub item: MerchandiseItemId,
    pub quantity: u32,
    pub unit_price: Money,
    /// Handed out with the ticket type rather than selected by the attendee.
    #[serde(default)]
    pub included: bool,
}

impl LineItem {
    pub fn amount(&self) -> DomainResult<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

/// Immutable bundle of line items with a precomputed subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MerchandiseBundle {
    id: BundleId,
    items: Vec<LineItem>,
    subtotal: Money,
}

impl MerchandiseBundle {
    pub fn new(id: BundleId, items: Vec<LineItem>) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::validation("merchandise bundle must contain at least one item"));
        }
        if let Some(line) = items.iter().find(|l| l.quantity == 0) {
            return Err(DomainError::validation(format!(
                "quantity must be positive for item {}",
                line.item
            )));
        }

        let subtotal = Money::try_sum(
            items
                .iter()
                .map(LineItem::amount)
                .collect::<DomainResult<Vec<_>>>()?,
        )?;

        Ok(Self { id, items, subtotal })
    }

    pub fn id(&self) -> BundleId {
        self.id
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    /// True when every line came from a ticket type's automatic inclusion.
    pub fn is_included(&self) -> bool {
        self.items.iter().all(|l| l.included)
    }
}
