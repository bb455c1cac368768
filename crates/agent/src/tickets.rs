use std::sync::Arc;

use tracing::info;

use inventra_core::domain::inventory::{reorder_quantity, DEFAULT_REORDER_MULTIPLIER};
use inventra_core::domain::ticket::{
    NewTicket, Ticket, TicketId, TicketPriority, TicketStats, TicketStatus,
};
use inventra_core::pipeline::ReorderDecision;
use inventra_db::repositories::{Repositories, RepositoryError, TicketRepository};

pub const DEFAULT_LIST_LIMIT: u32 = 50;

/// Procurement ticket operations over the ticket store.
#[derive(Clone)]
pub struct TicketService {
    tickets: Arc<dyn TicketRepository>,
}

impl TicketService {
    pub fn new(repositories: &Repositories) -> Self {
        Self { tickets: repositories.tickets.clone() }
    }

    pub async fn create(&self, ticket: NewTicket) -> Result<Ticket, RepositoryError> {
        let created = self.tickets.create(ticket).await?;
        info!(
            event_name = "tickets.created",
            ticket_id = created.id.0,
            sku = created.sku.as_str(),
            priority = created.priority.as_str(),
            "reorder ticket created"
        );
        Ok(created)
    }

    pub async fn pending(&self, limit: u32) -> Result<Vec<Ticket>, RepositoryError> {
        self.tickets.list(Some(TicketStatus::Pending), limit).await
    }

    pub async fn list(
        &self,
        status: Option<TicketStatus>,
        limit: u32,
    ) -> Result<Vec<Ticket>, RepositoryError> {
        self.tickets.list(status, limit).await
    }

    pub async fn by_priority(
        &self,
        priority: TicketPriority,
        limit: u32,
    ) -> Result<Vec<Ticket>, RepositoryError> {
        self.tickets.list_pending_by_priority(priority, limit).await
    }

    pub async fn get(&self, id: TicketId) -> Result<Option<Ticket>, RepositoryError> {
        self.tickets.find_by_id(id).await
    }

    /// `false` when the ticket does not exist.
    pub async fn update_status(
        &self,
        id: TicketId,
        status: TicketStatus,
    ) -> Result<bool, RepositoryError> {
        let updated = self.tickets.update_status(id, status).await?;
        if updated {
            info!(
                event_name = "tickets.status_updated",
                ticket_id = id.0,
                status = status.as_str(),
                "ticket status updated"
            );
        }
        Ok(updated)
    }

    pub async fn stats(&self) -> Result<TicketStats, RepositoryError> {
        self.tickets.stats().await
    }

    /// One high-priority ticket per low-stock item, sourced from the best-ranked vendor. No
    /// tickets are created when the decision carries no vendors.
    pub async fn create_from_reorder(
        &self,
        decision: &ReorderDecision,
    ) -> Result<Vec<Ticket>, RepositoryError> {
        let Some(vendor) = decision.top_vendors.first() else {
            return Ok(Vec::new());
        };

        let mut created = Vec::with_capacity(decision.inventory.low_stock_items.len());
        for item in &decision.inventory.low_stock_items {
            let ticket = NewTicket {
                sku: item.sku.clone(),
                reason: format!(
                    "Low stock: {} units remaining (threshold: {})",
                    item.qty, item.reorder_threshold
                ),
                recommended_qty: reorder_quantity(
                    item.qty,
                    item.reorder_threshold,
                    DEFAULT_REORDER_MULTIPLIER,
                ),
                vendor_id: vendor.vendor_id.0.clone(),
                priority: TicketPriority::High,
            };
            created.push(self.create(ticket).await?);
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use inventra_core::domain::inventory::{InventoryItem, InventorySnapshot};
    use inventra_core::domain::ticket::{NewTicket, TicketId, TicketPriority, TicketStatus};
    use inventra_core::domain::vendor::{VendorId, VendorPerformance};
    use inventra_core::pipeline::ReorderDecision;
    use inventra_db::repositories::{InMemoryTicketRepository, Repositories};

    use super::{TicketService, DEFAULT_LIST_LIMIT};

    fn item(sku: &str, qty: i64) -> InventoryItem {
        InventoryItem {
            sku: sku.to_string(),
            name: format!("Item {sku}"),
            category: "Beverages".to_string(),
            region: "South".to_string(),
            qty,
            reorder_threshold: 10,
            vendor_id: None,
            unit_price: Decimal::from(40),
        }
    }

    fn decision(vendors: Vec<VendorPerformance>) -> ReorderDecision {
        let inventory =
            InventorySnapshot::from_items(&[item("BEV-S01", 5), item("BEV-S02", 30), item("BEV-S03", 0)]);
        ReorderDecision {
            region: None,
            low_stock_count: inventory.low_stock_count,
            analysis: "Reorder beverages.".to_string(),
            inventory,
            top_vendors: vendors,
        }
    }

    fn vendor(id: &str) -> VendorPerformance {
        VendorPerformance {
            vendor_id: VendorId(id.to_string()),
            name: format!("Vendor {id}"),
            quality_score: 4.8,
            reliability: 0.95,
            lead_time_days: 3,
        }
    }

    fn service() -> TicketService {
        let tickets = InMemoryTicketRepository::default().with_unit_price("V001", Decimal::new(1250, 2));
        TicketService::new(&Repositories { tickets: Arc::new(tickets), ..Repositories::in_memory() })
    }

    #[tokio::test]
    async fn reorder_decision_creates_one_ticket_per_low_stock_item() {
        let service = service();

        let created = service
            .create_from_reorder(&decision(vec![vendor("V001"), vendor("V002")]))
            .await
            .expect("create");

        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|ticket| ticket.vendor_id == "V001"));
        assert!(created.iter().all(|ticket| ticket.priority == TicketPriority::High));
        assert_eq!(created[0].recommended_qty, 15);
        assert_eq!(created[1].recommended_qty, 20);
        assert_eq!(created[0].reason, "Low stock: 5 units remaining (threshold: 10)");

        let stats = service.stats().await.expect("stats");
        assert_eq!(stats.total_pending, 2);
        assert_eq!(stats.total_value, Decimal::new(43750, 2));
    }

    #[tokio::test]
    async fn no_vendor_means_no_tickets() {
        let created = service().create_from_reorder(&decision(Vec::new())).await.expect("create");
        assert!(created.is_empty());
    }

    #[tokio::test]
    async fn status_updates_drop_tickets_from_the_pending_list() {
        let service = service();
        let created = service.create_from_reorder(&decision(vec![vendor("V001")])).await.expect("create");

        assert!(service.update_status(created[0].id, TicketStatus::Approved).await.expect("update"));
        assert!(!service.update_status(TicketId(999), TicketStatus::Rejected).await.expect("update"));

        let pending = service.pending(DEFAULT_LIST_LIMIT).await.expect("pending");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].sku, "BEV-S03");
        let approved = service.get(created[0].id).await.expect("get").expect("exists");
        assert_eq!(approved.status, TicketStatus::Approved);
    }

    #[tokio::test]
    async fn priority_view_only_shows_pending_tickets_of_that_priority() {
        let service = service();
        let created = service.create_from_reorder(&decision(vec![vendor("V001")])).await.expect("create");
        service
            .create(NewTicket {
                sku: "BEV-S02".to_string(),
                reason: "Seasonal top-up".to_string(),
                recommended_qty: 12,
                vendor_id: "V001".to_string(),
                priority: TicketPriority::Low,
            })
            .await
            .expect("create");
        service.update_status(created[0].id, TicketStatus::Completed).await.expect("update");

        let high = service.by_priority(TicketPriority::High, DEFAULT_LIST_LIMIT).await.expect("high");
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].sku, "BEV-S03");

        let low = service.by_priority(TicketPriority::Low, DEFAULT_LIST_LIMIT).await.expect("low");
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].reason, "Seasonal top-up");
        assert!(service.by_priority(TicketPriority::Medium, 10).await.expect("medium").is_empty());
    }
}
