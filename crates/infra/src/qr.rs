//! QR artifacts for tickets.
//!
//! The payload is exactly the ticket id string. Rendering is a pure function
//! of the id and [`QrSettings`], so the PNG bytes are reproducible.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use tracing::debug;

use eventive_booking::ArtifactRef;
use eventive_core::TicketId;

use crate::artifact::{ArtifactError, ArtifactStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrSettings {
    /// Edge length of one QR module in pixels.
    pub module_px: u32,
    pub quiet_zone: bool,
}

impl Default for QrSettings {
    fn default() -> Self {
        Self {
            module_px: 8,
            quiet_zone: true,
        }
    }
}

pub fn artifact_name(ticket: TicketId) -> String {
    format!("Ticket_{ticket}.png")
}

/// Encode `ticket` as a grayscale PNG.
pub fn render_png(ticket: TicketId, settings: QrSettings) -> Result<Vec<u8>, ArtifactError> {
    let payload = ticket.to_string();
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
        .map_err(|e| ArtifactError::Encoding(e.to_string()))?;

    let px = settings.module_px.max(1);
    let image = code
        .render::<Luma<u8>>()
        .module_dimensions(px, px)
        .quiet_zone(settings.quiet_zone)
        .build();

    let mut bytes = Vec::new();
    DynamicImage::ImageLuma8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| ArtifactError::Encoding(e.to_string()))?;
    Ok(bytes)
}

/// Renders ticket QR codes and stores them as `Ticket_<id>.png`.
#[derive(Debug, Clone)]
pub struct QrArtifactGenerator<A> {
    artifacts: A,
    settings: QrSettings,
}

impl<A> QrArtifactGenerator<A>
where
    A: ArtifactStore,
{
    pub fn new(artifacts: A, settings: QrSettings) -> Self {
        Self { artifacts, settings }
    }

    pub fn artifacts(&self) -> &A {
        &self.artifacts
    }

    pub fn render(&self, ticket: TicketId) -> Result<Vec<u8>, ArtifactError> {
        render_png(ticket, self.settings)
    }

    pub fn generate(&self, ticket: TicketId) -> Result<ArtifactRef, ArtifactError> {
        let bytes = self.render(ticket)?;
        let name = artifact_name(ticket);
        debug!(ticket_id = %ticket, bytes = bytes.len(), "storing qr artifact");
        self.artifacts.put(&name, bytes)
    }

    /// Remove a ticket's artifact, if one was stored.
    pub fn discard(&self, ticket: TicketId) -> Result<(), ArtifactError> {
        self.artifacts.delete(&artifact_name(ticket))
    }
}
