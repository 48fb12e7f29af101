//! Merchandise bundle resolution against the merchandise catalog.

use eventive_booking::{LineItem, MerchandiseBundle, MerchandiseSelection};
use eventive_core::{BundleId, Money};

use crate::catalog::MerchandiseCatalog;
use crate::error::BookingError;

/// Prices merchandise selections from the catalog.
///
/// Unit prices are snapshotted at resolution time; a client never supplies
/// them.
#[derive(Debug, Clone)]
pub struct BundleResolver<C> {
    catalog: C,
}

impl<C> BundleResolver<C>
where
    C: MerchandiseCatalog,
{
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    /// Resolve an attendee's explicit selection. An empty list means no bundle.
    pub fn resolve(&self, items: &[MerchandiseSelection]) -> Result<Option<MerchandiseBundle>, BookingError> {
        self.resolve_lines(items, false)
    }

    /// Resolve a ticket type's included merchandise. Lines are flagged
    /// `included` and priced at zero.
    pub fn resolve_included(
        &self,
        items: &[MerchandiseSelection],
    ) -> Result<Option<MerchandiseBundle>, BookingError> {
        self.resolve_lines(items, true)
    }

    fn resolve_lines(
        &self,
        items: &[MerchandiseSelection],
        included: bool,
    ) -> Result<Option<MerchandiseBundle>, BookingError> {
        if items.is_empty() {
            return Ok(None);
        }

        let mut lines = Vec::with_capacity(items.len());
        for selection in items {
            let quantity = u32::try_from(selection.quantity)
                .ok()
                .filter(|q| *q > 0)
                .ok_or_else(|| BookingError::InvalidQuantity {
                    item: selection.item.clone(),
                    quantity: selection.quantity,
                })?;

            let item = self
                .catalog
                .get_item(&selection.item)
                .ok_or_else(|| BookingError::UnknownItem(selection.item.clone()))?;

            lines.push(LineItem {
                item: item.id,
                quantity,
                unit_price: if included { Money::ZERO } else { item.unit_price },
                included,
            });
        }

        Ok(Some(MerchandiseBundle::new(BundleId::new(), lines)?))
    }
}
