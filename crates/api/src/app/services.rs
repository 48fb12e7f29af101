use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use sqlx::postgres::PgPoolOptions;

use eventive_infra::artifact::{ArtifactStore, FsArtifactStore, InMemoryArtifactStore};
use eventive_infra::capacity::{CapacityGate, InMemoryCapacityGate, PostgresCapacityGate};
use eventive_infra::catalog::InMemoryCatalog;
use eventive_infra::config::AppConfig;
use eventive_infra::store::{BookingStore, InMemoryBookingStore};
use eventive_infra::{BookingError, BookingOptions, BookingService};

use crate::app::errors;

pub type AppBookingService = BookingService<
    Arc<InMemoryCatalog>,
    Arc<dyn CapacityGate>,
    Arc<InMemoryBookingStore>,
    Arc<dyn ArtifactStore>,
>;

/// Application services shared by all handlers.
pub struct AppServices {
    booking: AppBookingService,
}

impl AppServices {
    pub fn new(booking: AppBookingService) -> Self {
        Self { booking }
    }

    /// Fully in-memory wiring: catalog-driven capacity, artifacts kept in memory.
    pub fn in_memory(catalog: InMemoryCatalog, options: BookingOptions) -> Self {
        let catalog = Arc::new(catalog);
        let gate: Arc<dyn CapacityGate> = Arc::new(InMemoryCapacityGate::new(catalog.clone()));
        let artifacts: Arc<dyn ArtifactStore> = Arc::new(InMemoryArtifactStore::new());
        Self::new(BookingService::new(
            catalog,
            gate,
            Arc::new(InMemoryBookingStore::new()),
            artifacts,
            options,
        ))
    }

    pub fn booking(&self) -> &AppBookingService {
        &self.booking
    }

    /// Run a (blocking) service operation off the async executor and map its
    /// error to an HTTP response.
    pub async fn run<T, F>(self: Arc<Self>, op: F) -> Result<T, Response>
    where
        T: Send + 'static,
        F: FnOnce(&AppBookingService) -> Result<T, BookingError> + Send + 'static,
    {
        match tokio::task::spawn_blocking(move || op(&self.booking)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(errors::booking_error_to_response(err)),
            Err(join) => {
                tracing::error!(error = %join, "booking operation aborted");
                Err(errors::json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "booking operation aborted",
                ))
            }
        }
    }
}

/// Build services from configuration.
///
/// The capacity gate is Postgres-backed when `DATABASE_URL` is set; every
/// catalog event's capacity is declared there on startup and its reserved
/// counter is reset to the slots the booking store actually holds.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let catalog = match &config.catalog_path {
        Some(path) => InMemoryCatalog::from_json_file(path)?,
        None => {
            tracing::warn!("EVENTIVE_CATALOG_PATH not set; starting with an empty catalog");
            InMemoryCatalog::new()
        }
    };
    let catalog = Arc::new(catalog);

    let artifacts: Arc<dyn ArtifactStore> = match &config.artifact_dir {
        Some(dir) => Arc::new(FsArtifactStore::open(dir)?),
        None => Arc::new(InMemoryArtifactStore::new()),
    };

    let store = Arc::new(InMemoryBookingStore::new());

    let gate: Arc<dyn CapacityGate> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
            let gate = PostgresCapacityGate::new(pool);
            gate.migrate().await?;
            for event in catalog.events() {
                gate.declare_capacity(&event.id, event.capacity).await?;
                gate.sync_reserved(&event.id, store.reserved_slots(&event.id)?).await?;
            }
            tracing::info!("using postgres capacity gate");
            Arc::new(gate)
        }
        None => Arc::new(InMemoryCapacityGate::new(catalog.clone())),
    };

    Ok(AppServices::new(BookingService::new(
        catalog,
        gate,
        store,
        artifacts,
        config.booking_options(),
    )))
}
