//! Integration tests for the booking pipeline.
//!
//! Tests: BookingRequest → CapacityGate → BookingStore → TicketIssuer → ArtifactStore
//!
//! Verifies:
//! - Capacity is never exceeded under concurrent bookings
//! - A failed issuance leaves no tickets, artifacts, registration or reservation behind
//! - Totals and ticket/attendee correspondence hold for successful bookings
//! - A registration still issuing tickets cannot be observed or cancelled
//! - A cancel that fails part way keeps its capacity and can be retried

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::sync::{Arc, Mutex};

    use eventive_booking::{
        ArtifactRef, AttendeeRequest, BookingRequest, Caller, Event, MerchandiseItem, MerchandiseSelection,
        Registration, Ticket, TicketType,
    };
    use eventive_core::{Email, EventId, MerchandiseItemId, Money, RegistrationId, TicketId, TicketTypeId};

    use crate::artifact::{ArtifactError, ArtifactStore, InMemoryArtifactStore};
    use crate::booking_service::{BookingOptions, BookingService};
    use crate::capacity::{CapacityGate, InMemoryCapacityGate};
    use crate::catalog::InMemoryCatalog;
    use crate::error::{BookingError, IssueError};
    use crate::store::{BookingStore, InMemoryBookingStore, StoreError};
    use crate::store::r#trait::{RegistrationUpdate, TicketUpdate};

    /// Artifact store that fails every put after the first `allowed` ones.
    struct FailingArtifactStore {
        inner: InMemoryArtifactStore,
        allowed: usize,
        puts: AtomicUsize,
    }

    impl FailingArtifactStore {
        fn new(allowed: usize) -> Self {
            Self {
                inner: InMemoryArtifactStore::new(),
                allowed,
                puts: AtomicUsize::new(0),
            }
        }
    }

    impl ArtifactStore for FailingArtifactStore {
        fn put(&self, name: &str, bytes: Vec<u8>) -> Result<ArtifactRef, ArtifactError> {
            if self.puts.fetch_add(1, Ordering::SeqCst) >= self.allowed {
                return Err(ArtifactError::Backend("disk full".to_string()));
            }
            self.inner.put(name, bytes)
        }

        fn get(&self, name: &str) -> Result<Option<Vec<u8>>, ArtifactError> {
            self.inner.get(name)
        }

        fn delete(&self, name: &str) -> Result<(), ArtifactError> {
            self.inner.delete(name)
        }
    }

    /// Artifact store whose first put blocks until the test lets it fail.
    struct StalledArtifactStore {
        entered: Mutex<Sender<()>>,
        resume: Mutex<Receiver<()>>,
    }

    impl StalledArtifactStore {
        /// Returns the store, a receiver signalled once `put` is entered and a
        /// sender that makes the stalled `put` fail.
        fn new() -> (Self, Receiver<()>, Sender<()>) {
            let (entered_tx, entered_rx) = mpsc::channel();
            let (resume_tx, resume_rx) = mpsc::channel();
            let store = Self {
                entered: Mutex::new(entered_tx),
                resume: Mutex::new(resume_rx),
            };
            (store, entered_rx, resume_tx)
        }
    }

    impl ArtifactStore for StalledArtifactStore {
        fn put(&self, _name: &str, _bytes: Vec<u8>) -> Result<ArtifactRef, ArtifactError> {
            let _ = self.entered.lock().unwrap().send(());
            let _ = self.resume.lock().unwrap().recv();
            Err(ArtifactError::Backend("storage went away".to_string()))
        }

        fn get(&self, _name: &str) -> Result<Option<Vec<u8>>, ArtifactError> {
            Ok(None)
        }

        fn delete(&self, _name: &str) -> Result<(), ArtifactError> {
            Ok(())
        }
    }

    /// Booking store whose updates can be made to fail on demand.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryBookingStore,
        tickets_broken: AtomicBool,
        registrations_broken: AtomicBool,
    }

    fn outage() -> StoreError {
        StoreError::Backend("connection reset".to_string())
    }

    impl BookingStore for FlakyStore {
        fn insert_registration(&self, registration: Registration) -> Result<(), StoreError> {
            self.inner.insert_registration(registration)
        }

        fn get_registration(&self, id: RegistrationId) -> Result<Option<Registration>, StoreError> {
            self.inner.get_registration(id)
        }

        fn registrations_for(&self, email: &Email, event: &EventId) -> Result<Vec<Registration>, StoreError> {
            self.inner.registrations_for(email, event)
        }

        fn reserved_slots(&self, event: &EventId) -> Result<u32, StoreError> {
            self.inner.reserved_slots(event)
        }

        fn update_registration(
            &self,
            id: RegistrationId,
            update: RegistrationUpdate<'_>,
        ) -> Result<Registration, StoreError> {
            if self.registrations_broken.load(Ordering::SeqCst) {
                return Err(outage());
            }
            self.inner.update_registration(id, update)
        }

        fn delete_registration(&self, id: RegistrationId) -> Result<Option<Registration>, StoreError> {
            self.inner.delete_registration(id)
        }

        fn insert_ticket(&self, ticket: Ticket) -> Result<(), StoreError> {
            self.inner.insert_ticket(ticket)
        }

        fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
            self.inner.get_ticket(id)
        }

        fn update_ticket(&self, id: TicketId, update: TicketUpdate<'_>) -> Result<Ticket, StoreError> {
            if self.tickets_broken.load(Ordering::SeqCst) {
                return Err(outage());
            }
            self.inner.update_ticket(id, update)
        }

        fn tickets_for_registration(&self, id: RegistrationId) -> Result<Vec<Ticket>, StoreError> {
            self.inner.tickets_for_registration(id)
        }

        fn tickets_for_email(&self, email: &Email) -> Result<Vec<Ticket>, StoreError> {
            self.inner.tickets_for_email(email)
        }

        fn remove_tickets_for_registration(&self, id: RegistrationId) -> Result<Vec<Ticket>, StoreError> {
            self.inner.remove_tickets_for_registration(id)
        }
    }

    type Service<A> = BookingService<
        Arc<InMemoryCatalog>,
        Arc<InMemoryCapacityGate<Arc<InMemoryCatalog>>>,
        Arc<InMemoryBookingStore>,
        Arc<A>,
    >;

    struct Harness<A> {
        service: Arc<Service<A>>,
        store: Arc<InMemoryBookingStore>,
        gate: Arc<InMemoryCapacityGate<Arc<InMemoryCatalog>>>,
        artifacts: Arc<A>,
    }

    fn catalog(capacity: Option<u32>) -> Arc<InMemoryCatalog> {
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.upsert_event(Event {
            id: EventId::from("EVT-1"),
            name: "RustConf".to_string(),
            capacity,
            is_published: true,
            venue: None,
            start_date: None,
            end_date: None,
        });
        catalog.upsert_ticket_type(TicketType {
            id: TicketTypeId::from("GA"),
            event: EventId::from("EVT-1"),
            category: "General".to_string(),
            access_level: None,
            price: Money::from_minor(50),
            included_merchandise: vec![],
            sales_start: None,
            sales_end: None,
        });
        catalog.upsert_ticket_type(TicketType {
            id: TicketTypeId::from("VIP"),
            event: EventId::from("EVT-1"),
            category: "VIP".to_string(),
            access_level: Some("backstage".to_string()),
            price: Money::from_minor(200),
            included_merchandise: vec![MerchandiseSelection {
                item: MerchandiseItemId::from("lanyard"),
                quantity: 1,
            }],
            sales_start: None,
            sales_end: None,
        });
        for (id, price) in [("tshirt", 10), ("lanyard", 4)] {
            catalog.upsert_item(MerchandiseItem {
                id: MerchandiseItemId::from(id),
                name: id.to_string(),
                unit_price: Money::from_minor(price),
                event: None,
            });
        }
        catalog
    }

    fn harness_with<A: ArtifactStore>(capacity: Option<u32>, artifacts: A, parallel: bool) -> Harness<A> {
        let catalog = catalog(capacity);
        let store = Arc::new(InMemoryBookingStore::new());
        let gate = Arc::new(InMemoryCapacityGate::new(catalog.clone()));
        let artifacts = Arc::new(artifacts);
        let options = BookingOptions {
            parallel_issuance: parallel,
            ..BookingOptions::default()
        };
        let service = Arc::new(BookingService::new(
            catalog,
            gate.clone(),
            store.clone(),
            artifacts.clone(),
            options,
        ));
        Harness {
            service,
            store,
            gate,
            artifacts,
        }
    }

    fn harness(capacity: Option<u32>) -> Harness<InMemoryArtifactStore> {
        harness_with(capacity, InMemoryArtifactStore::new(), true)
    }

    fn attendee(email: &str) -> AttendeeRequest {
        AttendeeRequest {
            full_name: format!("Attendee {email}"),
            email: email.to_string(),
            ticket_type: "GA".to_string(),
            ticket_price: None,
            merchandise: vec![],
        }
    }

    fn booking(booker: &str, attendees: Vec<AttendeeRequest>) -> BookingRequest {
        BookingRequest {
            event_id: "EVT-1".to_string(),
            email: booker.to_string(),
            discount_code: None,
            attendees,
        }
    }

    fn event() -> EventId {
        EventId::from("EVT-1")
    }

    #[test]
    fn two_concurrent_bookings_for_one_seat_admit_exactly_one() {
        let h = harness(Some(1));

        let handles: Vec<_> = ["a@example.com", "b@example.com"]
            .into_iter()
            .map(|who| {
                let service = h.service.clone();
                std::thread::spawn(move || service.create_booking(&booking(who, vec![attendee(who)])))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let ok = results.iter().filter(|r| r.is_ok()).count();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(BookingError::CapacityExceeded { .. })))
            .count();
        assert_eq!(ok, 1);
        assert_eq!(rejected, 1);
        assert_eq!(h.gate.reserved(&event()).unwrap(), 1);
        assert_eq!(h.store.registration_count(), 1);
    }

    #[test]
    fn capacity_is_never_exceeded_under_contention() {
        let h = harness(Some(5));

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let service = h.service.clone();
                std::thread::spawn(move || {
                    let who = format!("booker{i}@example.com");
                    service.create_booking(&booking(&who, vec![attendee(&who)]))
                })
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(Result::is_ok)
            .count();

        assert_eq!(successes, 5);
        assert_eq!(h.gate.reserved(&event()).unwrap(), 5);
        assert_eq!(h.store.ticket_count(), 5);
    }

    #[test]
    fn multi_attendee_booking_is_all_or_nothing_on_capacity() {
        let h = harness(Some(3));
        h.service
            .create_booking(&booking("x@example.com", vec![attendee("x1@example.com"), attendee("x2@example.com")]))
            .unwrap();

        let err = h
            .service
            .create_booking(&booking("y@example.com", vec![attendee("y1@example.com"), attendee("y2@example.com")]))
            .unwrap_err();

        assert!(matches!(
            err,
            BookingError::CapacityExceeded {
                requested: 2,
                available: 1,
                ..
            }
        ));
        assert_eq!(h.store.registration_count(), 1);
    }

    #[test]
    fn issuance_failure_rolls_back_everything() {
        for parallel in [false, true] {
            let h = harness_with(Some(10), FailingArtifactStore::new(1), parallel);

            let err = h
                .service
                .create_booking(&booking(
                    "booker@example.com",
                    vec![
                        attendee("a@example.com"),
                        attendee("b@example.com"),
                        attendee("c@example.com"),
                    ],
                ))
                .unwrap_err();

            match err {
                BookingError::TicketIssuance { source, .. } => {
                    assert!(matches!(source, IssueError::Artifact(_)), "{source:?}")
                }
                other => panic!("unexpected error: {other:?}"),
            }
            assert_eq!(h.store.registration_count(), 0);
            assert_eq!(h.store.ticket_count(), 0);
            assert!(h.artifacts.inner.is_empty());
            assert_eq!(h.gate.reserved(&event()).unwrap(), 0);
        }
    }

    #[test]
    fn sequential_failure_reports_the_failing_attendee() {
        let h = harness_with(Some(10), FailingArtifactStore::new(1), false);

        let err = h
            .service
            .create_booking(&booking(
                "booker@example.com",
                vec![attendee("a@example.com"), attendee("b@example.com")],
            ))
            .unwrap_err();

        match err {
            BookingError::TicketIssuance {
                attendee_index, email, ..
            } => {
                assert_eq!(attendee_index, 1);
                assert_eq!(email.as_str(), "b@example.com");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn totals_and_tickets_match_attendee_rows() {
        let h = harness(None);
        let mut ada = attendee("ada@example.com");
        ada.merchandise = vec![MerchandiseSelection {
            item: MerchandiseItemId::from("tshirt"),
            quantity: 2,
        }];

        let result = h
            .service
            .create_booking(&booking("booker@example.com", vec![ada, attendee("bob@example.com")]))
            .unwrap();

        // (50 + 2 x 10) + 50
        assert_eq!(result.total_amount, Money::from_minor(120));
        assert_eq!(result.tickets.len(), 2);

        let registration = h.store.get_registration(result.registration_id).unwrap().unwrap();
        assert_eq!(registration.attendees()[0].merchandise_total(), Money::from_minor(20));
        assert!(registration.is_consistent());

        for ticket in h.store.tickets_for_registration(result.registration_id).unwrap() {
            let matching = registration
                .attendees()
                .iter()
                .filter(|row| row.email() == ticket.email())
                .count();
            assert_eq!(matching, 1);
            assert!(ticket.qr_code().is_some());
        }
        assert_eq!(h.artifacts.len(), 2);
    }

    #[test]
    fn included_merchandise_only_fills_empty_rows() {
        let h = harness(None);
        let mut explicit = attendee("ada@example.com");
        explicit.ticket_type = "VIP".to_string();
        explicit.merchandise = vec![MerchandiseSelection {
            item: MerchandiseItemId::from("tshirt"),
            quantity: 1,
        }];
        let mut automatic = attendee("bob@example.com");
        automatic.ticket_type = "VIP".to_string();

        let result = h
            .service
            .create_booking(&booking("booker@example.com", vec![explicit, automatic]))
            .unwrap();

        let registration = h.store.get_registration(result.registration_id).unwrap().unwrap();
        let rows = registration.attendees();
        assert!(!rows[0].merchandise().unwrap().is_included());
        assert_eq!(rows[0].merchandise_total(), Money::from_minor(10));
        assert!(rows[1].merchandise().unwrap().is_included());
        assert_eq!(rows[1].merchandise_total(), Money::ZERO);
        // 200 + 10 + 200
        assert_eq!(result.total_amount, Money::from_minor(410));
        assert!(registration.is_consistent());
    }

    #[test]
    fn cancellation_frees_capacity_for_a_retry() {
        let h = harness(Some(1));
        let first = h
            .service
            .create_booking(&booking("a@example.com", vec![attendee("a@example.com")]))
            .unwrap();

        let retry = booking("b@example.com", vec![attendee("b@example.com")]);
        assert!(matches!(
            h.service.create_booking(&retry),
            Err(BookingError::CapacityExceeded { .. })
        ));

        let caller = Caller::user(Email::parse("a@example.com").unwrap());
        h.service.cancel_registration(&caller, first.registration_id).unwrap();

        assert!(h.service.create_booking(&retry).is_ok());
        assert_eq!(h.gate.reserved(&event()).unwrap(), 1);
    }

    #[test]
    fn qr_artifact_bytes_are_reproducible() {
        let h = harness(None);
        let result = h
            .service
            .create_booking(&booking("a@example.com", vec![attendee("a@example.com")]))
            .unwrap();
        let ticket = result.tickets[0].id;

        let name = crate::qr::artifact_name(ticket);
        let stored = h.service.artifact(&name).unwrap().unwrap();
        let rendered = crate::qr::render_png(ticket, BookingOptions::default().qr).unwrap();
        assert_eq!(stored, rendered);
    }

    #[test]
    fn registration_in_flight_is_hidden_and_cannot_be_cancelled() {
        let (artifacts, entered, resume) = StalledArtifactStore::new();
        let h = harness_with(Some(2), artifacts, false);

        // Same gate and store, working artifact storage.
        let ok_service = BookingService::new(
            catalog(Some(2)),
            h.gate.clone(),
            h.store.clone(),
            Arc::new(InMemoryArtifactStore::new()),
            BookingOptions::default(),
        );
        ok_service
            .create_booking(&booking("a@example.com", vec![attendee("a@example.com")]))
            .unwrap();

        let service = h.service.clone();
        let stalled = std::thread::spawn(move || {
            service.create_booking(&booking("b@example.com", vec![attendee("b@example.com")]))
        });
        entered.recv().unwrap();

        let email_b = Email::parse("b@example.com").unwrap();
        let pending = h.store.registrations_for(&email_b, &event()).unwrap();
        assert_eq!(pending.len(), 1);
        assert!(pending[0].is_issuing());
        let pending_id = pending[0].id_typed();

        let caller_b = Caller::user(email_b.clone());
        assert!(h.service.get_registration(&email_b, &event()).unwrap().is_none());
        assert!(h.service.get_ticket(&email_b, &event()).unwrap().is_none());
        assert!(matches!(
            h.service.cancel_registration(&caller_b, pending_id),
            Err(BookingError::NotFound(_))
        ));
        assert!(matches!(
            h.service.confirm_registration(&caller_b, pending_id),
            Err(BookingError::NotFound(_))
        ));
        assert_eq!(h.gate.reserved(&event()).unwrap(), 2);

        resume.send(()).unwrap();
        let err = stalled.join().unwrap().unwrap_err();
        assert!(matches!(err, BookingError::TicketIssuance { .. }), "{err:?}");
        assert!(h.store.get_registration(pending_id).unwrap().is_none());
        assert_eq!(h.gate.reserved(&event()).unwrap(), 1);

        ok_service
            .create_booking(&booking("c@example.com", vec![attendee("c@example.com")]))
            .unwrap();
        assert!(matches!(
            ok_service.create_booking(&booking("d@example.com", vec![attendee("d@example.com")])),
            Err(BookingError::CapacityExceeded { .. })
        ));
        assert_eq!(h.store.reserved_slots(&event()).unwrap(), 2);
        assert_eq!(h.gate.reserved(&event()).unwrap(), 2);
    }

    fn flaky_service(
        capacity: u32,
    ) -> (
        BookingService<
            Arc<InMemoryCatalog>,
            Arc<InMemoryCapacityGate<Arc<InMemoryCatalog>>>,
            Arc<FlakyStore>,
            Arc<InMemoryArtifactStore>,
        >,
        Arc<FlakyStore>,
        Arc<InMemoryCapacityGate<Arc<InMemoryCatalog>>>,
    ) {
        let catalog = catalog(Some(capacity));
        let store = Arc::new(FlakyStore::default());
        let gate = Arc::new(InMemoryCapacityGate::new(catalog.clone()));
        let service = BookingService::new(
            catalog,
            gate.clone(),
            store.clone(),
            Arc::new(InMemoryArtifactStore::new()),
            BookingOptions::default(),
        );
        (service, store, gate)
    }

    #[test]
    fn failed_cancel_keeps_capacity_and_can_be_retried() {
        let (service, store, gate) = flaky_service(2);
        let result = service
            .create_booking(&booking("a@example.com", vec![attendee("a@example.com"), attendee("b@example.com")]))
            .unwrap();
        let id = result.registration_id;
        let caller = Caller::user(Email::parse("a@example.com").unwrap());

        store.tickets_broken.store(true, Ordering::SeqCst);
        let err = service.cancel_registration(&caller, id).unwrap_err();
        assert!(matches!(err, BookingError::Store(_)), "{err:?}");
        assert!(store.get_registration(id).unwrap().unwrap().is_active());
        assert_eq!(gate.reserved(&event()).unwrap(), 2);

        store.tickets_broken.store(false, Ordering::SeqCst);
        let detail = service.cancel_registration(&caller, id).unwrap();
        assert_eq!(detail.status, eventive_booking::RegistrationStatus::Cancelled);
        assert_eq!(gate.reserved(&event()).unwrap(), 0);
        assert!(store.tickets_for_registration(id).unwrap().iter().all(|t| !t.is_active()));

        assert!(matches!(
            service.cancel_registration(&caller, id),
            Err(BookingError::InvariantViolation(_))
        ));
        assert_eq!(gate.reserved(&event()).unwrap(), 0);
    }

    #[test]
    fn store_failure_after_issuance_rolls_back() {
        let (service, store, gate) = flaky_service(2);
        store.registrations_broken.store(true, Ordering::SeqCst);

        let err = service
            .create_booking(&booking("a@example.com", vec![attendee("a@example.com")]))
            .unwrap_err();

        assert!(matches!(err, BookingError::Store(_)), "{err:?}");
        assert_eq!(store.inner.registration_count(), 0);
        assert_eq!(store.inner.ticket_count(), 0);
        assert_eq!(gate.reserved(&event()).unwrap(), 0);

        store.registrations_broken.store(false, Ordering::SeqCst);
        service
            .create_booking(&booking("a@example.com", vec![attendee("a@example.com")]))
            .unwrap();
        assert_eq!(gate.reserved(&event()).unwrap(), 1);
    }
}
