//! Event catalog service
//!
//! Typed access patterns over the single-table entity store: events with
//! their tickets and orders in one partition, and event search through the
//! search index. Record validation lives here; the store accepts anything
//! keyed correctly.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use serde::Serialize;

use crate::app::retry::{with_retry, RetryPolicy};
use crate::domain::entities::{
    Event, EventId, EventRecord, NewEvent, NewOrder, NewTickets, Order, OrderId, OrderStatus,
    Ticket, TicketId, TicketStatus,
};
use crate::domain::identity::EmailAddress;
use crate::domain::item::{Item, PrimaryKey};
use crate::domain::ports::{
    collect_all, EntityStore, IndexQuery, PartitionQuery, Query, SortKeyCondition,
};
use crate::domain::schema::{
    search_city_prefix, search_partition, sort_key_prefix, EntityType, SK_METADATA,
};
use crate::error::{AppError, DomainError, StoreError};

/// Most tickets a single `issue_tickets` call may create
pub const MAX_TICKETS_PER_BATCH: u32 = 1000;

/// Page size used when draining a partition
const DRAIN_PAGE_SIZE: usize = 100;

/// Everything stored under one event partition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventBundle {
    pub event: Event,
    pub tickets: Vec<Ticket>,
    pub orders: Vec<Order>,
}

/// Service for events, tickets and orders
pub struct EventCatalogService<S>
where
    S: EntityStore,
{
    store: Arc<S>,
    retry: RetryPolicy,
}

impl<S> EventCatalogService<S>
where
    S: EntityStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Create an event and index it for search
    pub async fn create_event(&self, new_event: NewEvent) -> Result<Event, AppError> {
        require_non_empty("name", &new_event.name)?;
        require_non_empty("category", &new_event.category)?;
        require_non_empty("city", &new_event.city)?;

        let event = Event {
            id: EventId::new(),
            name: new_event.name.trim().to_string(),
            category: new_event.category.trim().to_string(),
            city: new_event.city.trim().to_string(),
            venue: new_event.venue.trim().to_string(),
            starts_at: new_event.starts_at.trunc_subsecs(0),
            description: new_event.description,
            created_at: Utc::now().trunc_subsecs(0),
        };

        self.put(event.to_item()).await?;
        tracing::info!(event_id = %event.id, category = %event.category, city = %event.city, "Event created");

        Ok(event)
    }

    /// Fetch an event's metadata record
    pub async fn get_event(&self, id: &EventId) -> Result<Event, AppError> {
        let key = PrimaryKey::new(id.partition_key(), SK_METADATA);
        let item = self
            .get(&key)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Event {}", id)))?;

        Ok(Event::from_item(&item)?)
    }

    /// Issue `count` identical tickets for an existing event
    pub async fn issue_tickets(
        &self,
        event_id: &EventId,
        new_tickets: NewTickets,
    ) -> Result<Vec<Ticket>, AppError> {
        if new_tickets.count == 0 || new_tickets.count > MAX_TICKETS_PER_BATCH {
            return Err(DomainError::Validation(format!(
                "Ticket count must be between 1 and {}",
                MAX_TICKETS_PER_BATCH
            ))
            .into());
        }
        if new_tickets.price_cents < 0 {
            return Err(DomainError::Validation("Price cannot be negative".to_string()).into());
        }
        require_non_empty("tier", &new_tickets.tier)?;
        require_non_empty("currency", &new_tickets.currency)?;

        self.get_event(event_id).await?;

        let mut tickets = Vec::with_capacity(new_tickets.count as usize);
        for _ in 0..new_tickets.count {
            let ticket = Ticket {
                id: TicketId::new(),
                event_id: *event_id,
                tier: new_tickets.tier.clone(),
                price_cents: new_tickets.price_cents,
                currency: new_tickets.currency.to_uppercase(),
                status: TicketStatus::Available,
            };
            self.put(ticket.to_item()).await?;
            tickets.push(ticket);
        }

        tracing::info!(event_id = %event_id, count = tickets.len(), tier = %new_tickets.tier, "Tickets issued");
        Ok(tickets)
    }

    /// Reserve available tickets and record a pending order
    ///
    /// There is no cross-key transaction: two concurrent orders for the same
    /// ticket can both pass the availability check. If a reservation or the
    /// order write fails, the tickets reserved so far are put back to
    /// available on a best-effort basis and the original error is returned.
    pub async fn place_order(&self, new_order: NewOrder) -> Result<Order, AppError> {
        if new_order.ticket_ids.is_empty() {
            return Err(
                DomainError::Validation("An order needs at least one ticket".to_string()).into(),
            );
        }
        let unique: HashSet<&TicketId> = new_order.ticket_ids.iter().collect();
        if unique.len() != new_order.ticket_ids.len() {
            return Err(DomainError::Validation("Duplicate ticket in order".to_string()).into());
        }
        let buyer_email = EmailAddress::parse(&new_order.buyer_email)
            .map_err(|e| DomainError::Validation(e.to_string()))?;

        let event_id = new_order.event_id;
        self.get_event(&event_id).await?;

        let mut tickets = Vec::with_capacity(new_order.ticket_ids.len());
        for ticket_id in &new_order.ticket_ids {
            let key = PrimaryKey::new(event_id.partition_key(), ticket_id.sort_key());
            let item = self.get(&key).await?.ok_or_else(|| {
                DomainError::NotFound(format!("Ticket {} for event {}", ticket_id, event_id))
            })?;

            let ticket = Ticket::from_item(&item)?;
            if !ticket.is_available() {
                return Err(DomainError::Conflict(format!(
                    "Ticket {} is {}",
                    ticket_id, ticket.status
                ))
                .into());
            }
            tickets.push(ticket);
        }

        let currency = tickets[0].currency.clone();
        if tickets.iter().any(|t| t.currency != currency) {
            return Err(DomainError::Validation(
                "All tickets in an order must share a currency".to_string(),
            )
            .into());
        }

        let total_cents = tickets
            .iter()
            .try_fold(0i64, |total, t| total.checked_add(t.price_cents))
            .ok_or_else(|| DomainError::Validation("Order total is out of range".to_string()))?;

        let order = Order {
            id: OrderId::new(),
            event_id,
            buyer_email: buyer_email.as_str().to_string(),
            ticket_ids: new_order.ticket_ids,
            total_cents,
            currency,
            status: OrderStatus::Pending,
            created_at: Utc::now().trunc_subsecs(0),
        };

        let mut reserved = Vec::with_capacity(tickets.len());
        for mut ticket in tickets {
            ticket.status = TicketStatus::Reserved;
            if let Err(e) = self.put(ticket.to_item()).await {
                self.release(reserved).await;
                return Err(e.into());
            }
            reserved.push(ticket);
        }
        if let Err(e) = self.put(order.to_item()).await {
            self.release(reserved).await;
            return Err(e.into());
        }

        tracing::info!(
            event_id = %event_id,
            order_id = %order.id,
            tickets = order.ticket_ids.len(),
            total_cents = order.total_cents,
            "Order placed"
        );
        Ok(order)
    }

    /// The event with all its tickets and orders, from one partition query
    pub async fn event_bundle(&self, event_id: &EventId) -> Result<EventBundle, AppError> {
        let items = self
            .collect(PartitionQuery::new(event_id.partition_key()).limit(DRAIN_PAGE_SIZE))
            .await?;

        let mut event = None;
        let mut tickets = Vec::new();
        let mut orders = Vec::new();

        for item in &items {
            match EventRecord::from_item(item)? {
                EventRecord::Metadata(e) => event = Some(e),
                EventRecord::Ticket(t) => tickets.push(t),
                EventRecord::Order(o) => orders.push(o),
            }
        }

        let event = event.ok_or_else(|| DomainError::NotFound(format!("Event {}", event_id)))?;
        Ok(EventBundle {
            event,
            tickets,
            orders,
        })
    }

    /// Tickets of an event, ordered by ticket id
    pub async fn list_tickets(&self, event_id: &EventId) -> Result<Vec<Ticket>, AppError> {
        let query = PartitionQuery::new(event_id.partition_key())
            .sort(SortKeyCondition::begins_with(sort_key_prefix(
                EntityType::Ticket,
            )))
            .limit(DRAIN_PAGE_SIZE);

        let tickets = self
            .collect(query)
            .await?
            .iter()
            .map(Ticket::from_item)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tickets)
    }

    /// Events in a category, optionally in one city, ordered by city then date
    pub async fn search(&self, category: &str, city: Option<&str>) -> Result<Vec<Event>, AppError> {
        require_non_empty("category", category)?;

        let mut query = IndexQuery::search(search_partition(category));
        if let Some(city) = city.filter(|c| !c.trim().is_empty()) {
            query = query.sort(SortKeyCondition::begins_with(search_city_prefix(city)));
        }

        let events = self
            .collect(query)
            .await?
            .iter()
            .map(Event::from_item)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(category, city = city.unwrap_or("*"), results = events.len(), "Search");
        Ok(events)
    }

    /// Delete every record of an event's partition
    ///
    /// Not atomic. Repeating the call after a partial failure finishes the job.
    /// Returns the number of records removed.
    pub async fn delete_event(&self, event_id: &EventId) -> Result<usize, AppError> {
        let items = self
            .collect(PartitionQuery::new(event_id.partition_key()).limit(DRAIN_PAGE_SIZE))
            .await?;

        for item in &items {
            let key = item.key();
            with_retry(&self.retry, || self.store.delete(&key)).await?;
        }

        tracing::info!(event_id = %event_id, records = items.len(), "Event deleted");
        Ok(items.len())
    }

    async fn get(&self, key: &PrimaryKey) -> Result<Option<Item>, StoreError> {
        with_retry(&self.retry, || self.store.get(key)).await
    }

    async fn put(&self, item: Item) -> Result<(), StoreError> {
        with_retry(&self.retry, || self.store.put(item.clone())).await
    }

    /// Return reserved tickets to sale after a failed order
    async fn release(&self, tickets: Vec<Ticket>) {
        for mut ticket in tickets {
            ticket.status = TicketStatus::Available;
            if let Err(e) = self.put(ticket.to_item()).await {
                tracing::error!(
                    event_id = %ticket.event_id,
                    ticket_id = %ticket.id,
                    error = %e,
                    "Failed to release reserved ticket"
                );
            }
        }
    }

    async fn collect(&self, query: impl Into<Query>) -> Result<Vec<Item>, StoreError> {
        let query = query.into();
        with_retry(&self.retry, || collect_all(self.store.as_ref(), query.clone())).await
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryEntityStore;
    use crate::test_utils::*;
    use chrono::TimeZone;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    fn service() -> (Arc<InMemoryEntityStore>, EventCatalogService<InMemoryEntityStore>) {
        let store = Arc::new(InMemoryEntityStore::default());
        (store.clone(), EventCatalogService::new(store))
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            multiplier: 2.0,
            max_backoff: Duration::from_millis(2),
        }
    }

    // ========================================================================
    // Events
    // ========================================================================

    #[tokio::test]
    async fn test_create_and_get_event() {
        let (_, service) = service();

        let created = service.create_event(test_new_event()).await.unwrap();
        let fetched = service.get_event(&created.id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.description.as_deref(), Some("Opening night"));
    }

    #[tokio::test]
    async fn test_create_event_rejects_blank_fields() {
        let (store, service) = service();

        let mut new_event = test_new_event();
        new_event.category = "  ".to_string();

        let err = service.create_event(new_event).await.unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::Validation(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_get_missing_event_is_not_found() {
        let (_, service) = service();

        let err = service.get_event(&EventId::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_created_event_is_searchable() {
        let (_, service) = service();
        let event = service.create_event(test_new_event()).await.unwrap();

        let found = service.search("MUSIC", Some("madrid")).await.unwrap();
        assert_eq!(found, vec![event]);
    }

    // ========================================================================
    // Tickets
    // ========================================================================

    #[tokio::test]
    async fn test_issue_tickets() {
        let (_, service) = service();
        let event = service.create_event(test_new_event()).await.unwrap();

        let issued = service
            .issue_tickets(&event.id, test_new_tickets(3))
            .await
            .unwrap();
        assert_eq!(issued.len(), 3);
        assert!(issued.iter().all(Ticket::is_available));

        let mut listed = service.list_tickets(&event.id).await.unwrap();
        let mut expected = issued.clone();
        listed.sort_by_key(|t| t.id.sort_key());
        expected.sort_by_key(|t| t.id.sort_key());
        assert_eq!(listed, expected);
    }

    #[tokio::test]
    async fn test_issue_tickets_requires_event() {
        let (store, service) = service();

        let err = service
            .issue_tickets(&EventId::new(), test_new_tickets(2))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::NotFound(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_issue_tickets_validates_count_and_price() {
        let (_, service) = service();
        let event = service.create_event(test_new_event()).await.unwrap();

        for count in [0, MAX_TICKETS_PER_BATCH + 1] {
            let err = service
                .issue_tickets(&event.id, test_new_tickets(count))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Domain(DomainError::Validation(_))));
        }

        let mut negative = test_new_tickets(1);
        negative.price_cents = -1;
        let err = service.issue_tickets(&event.id, negative).await.unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_tickets_excludes_other_records() {
        let (store, service) = service();
        let event = test_event();
        store.put(event.to_item()).await.unwrap();
        let ticket = test_ticket(event.id);
        store.put(ticket.to_item()).await.unwrap();
        store
            .put(test_order(event.id, vec![ticket.id]).to_item())
            .await
            .unwrap();

        assert_eq!(service.list_tickets(&event.id).await.unwrap(), vec![ticket]);
    }

    // ========================================================================
    // Orders
    // ========================================================================

    #[tokio::test]
    async fn test_place_order_reserves_tickets() {
        let (_, service) = service();
        let event = service.create_event(test_new_event()).await.unwrap();
        let tickets = service
            .issue_tickets(&event.id, test_new_tickets(2))
            .await
            .unwrap();
        let ids: Vec<TicketId> = tickets.iter().map(|t| t.id).collect();

        let mut new_order = test_new_order(event.id, ids.clone());
        new_order.buyer_email = " Ana@Example.com ".to_string();
        let order = service.place_order(new_order).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_cents, 9000);
        assert_eq!(order.currency, "EUR");
        assert_eq!(order.buyer_email, "ana@example.com");

        let listed = service.list_tickets(&event.id).await.unwrap();
        assert!(listed.iter().all(|t| t.status == TicketStatus::Reserved));
    }

    #[tokio::test]
    async fn test_place_order_rejects_reserved_ticket() {
        let (_, service) = service();
        let event = service.create_event(test_new_event()).await.unwrap();
        let ticket = service
            .issue_tickets(&event.id, test_new_tickets(1))
            .await
            .unwrap()
            .remove(0);

        service
            .place_order(test_new_order(event.id, vec![ticket.id]))
            .await
            .unwrap();

        let err = service
            .place_order(test_new_order(event.id, vec![ticket.id]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_place_order_rejects_unknown_ticket() {
        let (_, service) = service();
        let event = service.create_event(test_new_event()).await.unwrap();

        let err = service
            .place_order(test_new_order(event.id, vec![TicketId::new()]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_place_order_validates_input() {
        let (_, service) = service();
        let event = service.create_event(test_new_event()).await.unwrap();
        let ticket = service
            .issue_tickets(&event.id, test_new_tickets(1))
            .await
            .unwrap()
            .remove(0);

        let empty = test_new_order(event.id, vec![]);
        let duplicate = test_new_order(event.id, vec![ticket.id, ticket.id]);
        let mut bad_email = test_new_order(event.id, vec![ticket.id]);
        bad_email.buyer_email = "not-an-email".to_string();

        for new_order in [empty, duplicate, bad_email] {
            let err = service.place_order(new_order).await.unwrap_err();
            assert!(matches!(err, AppError::Domain(DomainError::Validation(_))));
        }

        let listed = service.list_tickets(&event.id).await.unwrap();
        assert!(listed[0].is_available());
    }

    #[tokio::test]
    async fn test_place_order_rejects_total_out_of_range() {
        let (_, service) = service();
        let event = service.create_event(test_new_event()).await.unwrap();
        let mut new_tickets = test_new_tickets(2);
        new_tickets.price_cents = i64::MAX;
        let tickets = service.issue_tickets(&event.id, new_tickets).await.unwrap();

        let err = service
            .place_order(test_new_order(
                event.id,
                tickets.iter().map(|t| t.id).collect(),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::Validation(_))));

        let bundle = service.event_bundle(&event.id).await.unwrap();
        assert!(bundle.tickets.iter().all(Ticket::is_available));
        assert!(bundle.orders.is_empty());
    }

    #[tokio::test]
    async fn test_failed_order_write_releases_reserved_tickets() {
        // event, 2 tickets, 2 reservations, then the order write is rejected
        let store = Arc::new(FlakyEntityStore::rejecting_put(6));
        let service = EventCatalogService::new(store.clone()).with_retry_policy(fast_retry());
        let event = service.create_event(test_new_event()).await.unwrap();
        let tickets = service
            .issue_tickets(&event.id, test_new_tickets(2))
            .await
            .unwrap();

        let err = service
            .place_order(test_new_order(
                event.id,
                tickets.iter().map(|t| t.id).collect(),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::Internal(_))));

        let bundle = service.event_bundle(&event.id).await.unwrap();
        assert_eq!(bundle.tickets.len(), 2);
        assert!(bundle.tickets.iter().all(Ticket::is_available));
        assert!(bundle.orders.is_empty());
    }

    #[tokio::test]
    async fn test_failed_reservation_releases_earlier_tickets() {
        let store = Arc::new(FlakyEntityStore::rejecting_put(5));
        let service = EventCatalogService::new(store.clone()).with_retry_policy(fast_retry());
        let event = service.create_event(test_new_event()).await.unwrap();
        let tickets = service
            .issue_tickets(&event.id, test_new_tickets(2))
            .await
            .unwrap();

        assert_err!(
            service
                .place_order(test_new_order(
                    event.id,
                    tickets.iter().map(|t| t.id).collect(),
                ))
                .await
        );

        let listed = service.list_tickets(&event.id).await.unwrap();
        assert!(listed.iter().all(Ticket::is_available));

        // Released tickets can be ordered again
        assert_ok!(
            service
                .place_order(test_new_order(
                    event.id,
                    tickets.iter().map(|t| t.id).collect(),
                ))
                .await
        );
    }

    // ========================================================================
    // Partition reads
    // ========================================================================

    #[tokio::test]
    async fn test_event_bundle_groups_partition_records() {
        let (_, service) = service();
        let event = service.create_event(test_new_event()).await.unwrap();
        let tickets = service
            .issue_tickets(&event.id, test_new_tickets(3))
            .await
            .unwrap();
        let order = service
            .place_order(test_new_order(event.id, vec![tickets[0].id]))
            .await
            .unwrap();

        let bundle = service.event_bundle(&event.id).await.unwrap();

        assert_eq!(bundle.event, event);
        assert_eq!(bundle.tickets.len(), 3);
        assert_eq!(bundle.orders, vec![order]);
        assert_eq!(
            bundle
                .tickets
                .iter()
                .filter(|t| t.status == TicketStatus::Reserved)
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_event_bundle_without_metadata_is_not_found() {
        let (store, service) = service();
        let event_id = EventId::new();
        store.put(test_ticket(event_id).to_item()).await.unwrap();

        let err = service.event_bundle(&event_id).await.unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_event_bundle_fails_on_unknown_record_kind() {
        let (store, service) = service();
        let event = test_event();
        store.put(event.to_item()).await.unwrap();
        store
            .put(Item::new(PrimaryKey::new(event.id.partition_key(), "REVIEW#1")))
            .await
            .unwrap();

        let err = service.event_bundle(&event.id).await.unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::Internal(_))));
    }

    // ========================================================================
    // Search
    // ========================================================================

    #[tokio::test]
    async fn test_search_orders_by_city_then_date() {
        let (_, service) = service();
        let later = Utc.with_ymd_and_hms(2026, 9, 1, 20, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2026, 7, 1, 20, 0, 0).unwrap();

        let madrid_late = service
            .create_event(test_new_event_in("Music", "Madrid", later))
            .await
            .unwrap();
        let madrid_early = service
            .create_event(test_new_event_in("music", "madrid", earlier))
            .await
            .unwrap();
        let bilbao = service
            .create_event(test_new_event_in("Music", "Bilbao", later))
            .await
            .unwrap();
        service
            .create_event(test_new_event_in("Theatre", "Madrid", earlier))
            .await
            .unwrap();

        let all_music = service.search("music", None).await.unwrap();
        assert_eq!(all_music, vec![bilbao, madrid_early.clone(), madrid_late.clone()]);

        let madrid_music = service.search("Music", Some("MADRID")).await.unwrap();
        assert_eq!(madrid_music, vec![madrid_early, madrid_late]);
    }

    #[tokio::test]
    async fn test_search_city_prefix_does_not_match_longer_city() {
        let (_, service) = service();
        service
            .create_event(test_new_event_in("music", "Leon", test_starts_at()))
            .await
            .unwrap();
        let leone = service
            .create_event(test_new_event_in("music", "Leone", test_starts_at()))
            .await
            .unwrap();

        let found = service.search("music", Some("leone")).await.unwrap();
        assert_eq!(found, vec![leone]);
        assert_eq!(service.search("music", Some("leo")).await.unwrap(), vec![]);
    }

    #[tokio::test]
    async fn test_search_skips_unindexed_records() {
        let (store, service) = service();
        let event = test_event_in("music", "Sevilla");
        store.put(event.to_item()).await.unwrap();
        store.put(test_ticket(event.id).to_item()).await.unwrap();

        assert_eq!(service.search("music", None).await.unwrap(), vec![event]);
        assert!(service.search("sports", None).await.unwrap().is_empty());
    }

    // ========================================================================
    // Delete
    // ========================================================================

    #[tokio::test]
    async fn test_delete_event_removes_partition() {
        let (store, service) = service();
        let event = service.create_event(test_new_event()).await.unwrap();
        let other = service.create_event(test_new_event()).await.unwrap();
        service
            .issue_tickets(&event.id, test_new_tickets(4))
            .await
            .unwrap();

        let removed = service.delete_event(&event.id).await.unwrap();
        assert_eq!(removed, 5);
        assert_eq!(store.len().await, 1);

        let err = service.get_event(&event.id).await.unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::NotFound(_))));
        assert_eq!(service.search("music", None).await.unwrap(), vec![other]);

        assert_eq!(service.delete_event(&event.id).await.unwrap(), 0);
    }

    // ========================================================================
    // Retry
    // ========================================================================

    #[tokio::test]
    async fn test_transient_store_failures_are_retried() {
        let store = Arc::new(FlakyEntityStore::new());
        let service = EventCatalogService::new(store.clone()).with_retry_policy(fast_retry());

        let event = service.create_event(test_new_event()).await.unwrap();
        store.fail_next(2);

        assert_eq!(service.get_event(&event.id).await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_persistent_unavailability_surfaces_as_retryable() {
        let store = Arc::new(FlakyEntityStore::failing(10));
        let service = EventCatalogService::new(store.clone()).with_retry_policy(fast_retry());

        let err = service.get_event(&EventId::new()).await.unwrap_err();
        match err {
            AppError::Domain(e) => assert!(e.is_retryable()),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(store.calls(), 3);
    }

    #[tokio::test]
    async fn test_backend_faults_are_not_retried() {
        let store = Arc::new(FlakyEntityStore::broken());
        let service = EventCatalogService::new(store.clone()).with_retry_policy(fast_retry());

        let err = service.create_event(test_new_event()).await.unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::Internal(_))));
        assert_eq!(store.calls(), 1);
    }
}
