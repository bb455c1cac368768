use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use inventra_core::domain::conversation::{
    ConversationRecord, NewConversation, SessionId, SessionSummary,
};
use inventra_core::domain::finance::FinanceTransaction;
use inventra_core::domain::inventory::InventoryItem;
use inventra_core::domain::sales::SaleRecord;
use inventra_core::domain::ticket::{
    NewTicket, Ticket, TicketId, TicketPriority, TicketStats, TicketStatus,
};
use inventra_core::domain::vendor::{compare_performance, Vendor, VendorId, VendorPerformance};

use super::{
    ConversationRepository, FinanceRepository, InventoryRepository, RepositoryError,
    SalesRepository, TicketRepository, VendorRepository,
};

#[derive(Default)]
pub struct InMemoryInventoryRepository {
    items: RwLock<BTreeMap<String, InventoryItem>>,
}

impl InMemoryInventoryRepository {
    pub fn with_items(items: impl IntoIterator<Item = InventoryItem>) -> Self {
        let items = items.into_iter().map(|item| (item.sku.clone(), item)).collect();
        Self { items: RwLock::new(items) }
    }
}

#[async_trait::async_trait]
impl InventoryRepository for InMemoryInventoryRepository {
    async fn list_items(&self, region: Option<&str>) -> Result<Vec<InventoryItem>, RepositoryError> {
        let items = self.items.read().await;
        Ok(items
            .values()
            .filter(|item| region.map_or(true, |region| item.region == region))
            .cloned()
            .collect())
    }

    async fn find_by_sku(&self, sku: &str) -> Result<Option<InventoryItem>, RepositoryError> {
        let items = self.items.read().await;
        Ok(items.get(sku).cloned())
    }

    async fn save_item(&self, item: InventoryItem) -> Result<(), RepositoryError> {
        let mut items = self.items.write().await;
        items.insert(item.sku.clone(), item);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySalesRepository {
    sales: RwLock<Vec<SaleRecord>>,
}

impl InMemorySalesRepository {
    pub fn with_sales(sales: impl IntoIterator<Item = SaleRecord>) -> Self {
        Self { sales: RwLock::new(sales.into_iter().collect()) }
    }
}

#[async_trait::async_trait]
impl SalesRepository for InMemorySalesRepository {
    async fn list_sales(
        &self,
        since: Option<NaiveDate>,
        sku: Option<&str>,
    ) -> Result<Vec<SaleRecord>, RepositoryError> {
        let sales = self.sales.read().await;
        let mut matching: Vec<SaleRecord> = sales
            .iter()
            .filter(|sale| since.map_or(true, |since| sale.date >= since))
            .filter(|sale| sku.map_or(true, |sku| sale.sku == sku))
            .cloned()
            .collect();
        matching.sort_by(|left, right| right.date.cmp(&left.date));
        Ok(matching)
    }

    async fn record_sale(&self, sale: SaleRecord) -> Result<(), RepositoryError> {
        self.sales.write().await.push(sale);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryFinanceRepository {
    transactions: RwLock<Vec<FinanceTransaction>>,
}

impl InMemoryFinanceRepository {
    pub fn with_transactions(transactions: impl IntoIterator<Item = FinanceTransaction>) -> Self {
        Self { transactions: RwLock::new(transactions.into_iter().collect()) }
    }
}

#[async_trait::async_trait]
impl FinanceRepository for InMemoryFinanceRepository {
    async fn list_transactions(
        &self,
        since: Option<NaiveDate>,
        region: Option<&str>,
    ) -> Result<Vec<FinanceTransaction>, RepositoryError> {
        let transactions = self.transactions.read().await;
        let mut matching: Vec<FinanceTransaction> = transactions
            .iter()
            .filter(|tx| since.map_or(true, |since| tx.date >= since))
            .filter(|tx| region.map_or(true, |region| tx.region == region))
            .cloned()
            .collect();
        matching.sort_by(|left, right| right.date.cmp(&left.date));
        Ok(matching)
    }

    async fn record(&self, transaction: FinanceTransaction) -> Result<(), RepositoryError> {
        self.transactions.write().await.push(transaction);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryVendorRepository {
    vendors: RwLock<HashMap<String, Vendor>>,
}

impl InMemoryVendorRepository {
    pub fn with_vendors(vendors: impl IntoIterator<Item = Vendor>) -> Self {
        let vendors = vendors.into_iter().map(|vendor| (vendor.id.0.clone(), vendor)).collect();
        Self { vendors: RwLock::new(vendors) }
    }
}

#[async_trait::async_trait]
impl VendorRepository for InMemoryVendorRepository {
    async fn list_ranked(&self) -> Result<Vec<Vendor>, RepositoryError> {
        let vendors = self.vendors.read().await;
        let mut ranked: Vec<Vendor> = vendors.values().cloned().collect();
        ranked.sort_by(|left, right| {
            compare_performance(&VendorPerformance::from(left), &VendorPerformance::from(right))
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(ranked)
    }

    async fn find_by_id(&self, id: &VendorId) -> Result<Option<Vendor>, RepositoryError> {
        let vendors = self.vendors.read().await;
        Ok(vendors.get(&id.0).cloned())
    }

    async fn save(&self, vendor: Vendor) -> Result<(), RepositoryError> {
        let mut vendors = self.vendors.write().await;
        vendors.insert(vendor.id.0.clone(), vendor);
        Ok(())
    }
}

/// Tickets kept in insertion order. Vendor prices for `stats` are registered up front since
/// there is no vendor table to join.
#[derive(Default)]
pub struct InMemoryTicketRepository {
    tickets: RwLock<Vec<Ticket>>,
    unit_prices: HashMap<String, Decimal>,
}

impl InMemoryTicketRepository {
    pub fn with_unit_price(mut self, vendor_id: impl Into<String>, unit_price: Decimal) -> Self {
        self.unit_prices.insert(vendor_id.into(), unit_price);
        self
    }
}

#[async_trait::async_trait]
impl TicketRepository for InMemoryTicketRepository {
    async fn create(&self, ticket: NewTicket) -> Result<Ticket, RepositoryError> {
        let mut tickets = self.tickets.write().await;
        let id = TicketId(tickets.iter().map(|t| t.id.0).max().unwrap_or(0) + 1);
        let created = Ticket {
            id,
            sku: ticket.sku,
            reason: ticket.reason,
            recommended_qty: ticket.recommended_qty,
            vendor_id: ticket.vendor_id,
            priority: ticket.priority,
            status: TicketStatus::Pending,
            created_at: Utc::now(),
            product_name: None,
            vendor_name: None,
        };
        tickets.push(created.clone());
        Ok(created)
    }

    async fn list(
        &self,
        status: Option<TicketStatus>,
        limit: u32,
    ) -> Result<Vec<Ticket>, RepositoryError> {
        let tickets = self.tickets.read().await;
        let mut matching: Vec<Ticket> = tickets
            .iter()
            .filter(|ticket| status.map_or(true, |status| ticket.status == status))
            .cloned()
            .collect();
        matching.sort_by(|left, right| {
            right
                .priority
                .cmp(&left.priority)
                .then_with(|| right.created_at.cmp(&left.created_at))
                .then_with(|| right.id.0.cmp(&left.id.0))
        });
        matching.truncate(limit as usize);
        Ok(matching)
    }

    async fn list_pending_by_priority(
        &self,
        priority: TicketPriority,
        limit: u32,
    ) -> Result<Vec<Ticket>, RepositoryError> {
        let tickets = self.tickets.read().await;
        let mut matching: Vec<Ticket> = tickets
            .iter()
            .filter(|ticket| ticket.status == TicketStatus::Pending && ticket.priority == priority)
            .cloned()
            .collect();
        matching.sort_by(|left, right| {
            right.created_at.cmp(&left.created_at).then_with(|| right.id.0.cmp(&left.id.0))
        });
        matching.truncate(limit as usize);
        Ok(matching)
    }

    async fn find_by_id(&self, id: TicketId) -> Result<Option<Ticket>, RepositoryError> {
        let tickets = self.tickets.read().await;
        Ok(tickets.iter().find(|ticket| ticket.id == id).cloned())
    }

    async fn update_status(&self, id: TicketId, status: TicketStatus) -> Result<bool, RepositoryError> {
        let mut tickets = self.tickets.write().await;
        match tickets.iter_mut().find(|ticket| ticket.id == id) {
            Some(ticket) => {
                ticket.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn stats(&self) -> Result<TicketStats, RepositoryError> {
        let tickets = self.tickets.read().await;
        let mut stats = TicketStats::default();
        for ticket in tickets.iter() {
            *stats.by_status.entry(ticket.status.as_str().to_string()).or_insert(0) += 1;
            if ticket.status != TicketStatus::Pending {
                continue;
            }
            stats.total_pending += 1;
            *stats.by_priority.entry(ticket.priority.as_str().to_string()).or_insert(0) += 1;
            if let Some(price) = self.unit_prices.get(&ticket.vendor_id) {
                stats.total_value += Decimal::from(ticket.recommended_qty) * *price;
            }
        }
        Ok(stats)
    }
}

#[derive(Default)]
pub struct InMemoryConversationRepository {
    records: RwLock<Vec<ConversationRecord>>,
}

fn newest_first(records: &mut [ConversationRecord]) {
    records.sort_by(|left, right| {
        right.created_at.cmp(&left.created_at).then_with(|| right.id.cmp(&left.id))
    });
}

#[async_trait::async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn append(&self, conversation: NewConversation) -> Result<i64, RepositoryError> {
        let mut records = self.records.write().await;
        let id = records.iter().map(|record| record.id).max().unwrap_or(0) + 1;
        records.push(ConversationRecord {
            id,
            session_id: conversation.session_id,
            user_message: conversation.user_message,
            assistant_message: conversation.assistant_message,
            intent: conversation.intent,
            metadata: conversation.metadata,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn session_history(
        &self,
        session_id: &SessionId,
        limit: u32,
    ) -> Result<Vec<ConversationRecord>, RepositoryError> {
        let records = self.records.read().await;
        let mut history: Vec<ConversationRecord> =
            records.iter().filter(|record| &record.session_id == session_id).cloned().collect();
        newest_first(&mut history);
        history.truncate(limit as usize);
        history.reverse();
        Ok(history)
    }

    async fn recent(&self, limit: u32) -> Result<Vec<ConversationRecord>, RepositoryError> {
        let mut records = self.records.read().await.clone();
        newest_first(&mut records);
        records.truncate(limit as usize);
        Ok(records)
    }

    async fn search(
        &self,
        keyword: &str,
        limit: u32,
    ) -> Result<Vec<ConversationRecord>, RepositoryError> {
        // SQLite LIKE is case-insensitive for ASCII.
        let needle = keyword.to_ascii_lowercase();
        let records = self.records.read().await;
        let mut hits: Vec<ConversationRecord> = records
            .iter()
            .filter(|record| {
                record.user_message.to_ascii_lowercase().contains(&needle)
                    || record.assistant_message.to_ascii_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        newest_first(&mut hits);
        hits.truncate(limit as usize);
        Ok(hits)
    }

    async fn session_summary(
        &self,
        session_id: &SessionId,
    ) -> Result<SessionSummary, RepositoryError> {
        let records = self.records.read().await;
        let session: Vec<&ConversationRecord> =
            records.iter().filter(|record| &record.session_id == session_id).collect();

        let mut intent_distribution = BTreeMap::new();
        for intent in session.iter().filter_map(|record| record.intent.as_ref()) {
            *intent_distribution.entry(intent.clone()).or_insert(0) += 1;
        }

        Ok(SessionSummary {
            session_id: session_id.clone(),
            total_messages: session.len() as i64,
            intent_distribution,
            first_message: session.iter().map(|record| record.created_at).min(),
            last_message: session.iter().map(|record| record.created_at).max(),
        })
    }

    async fn clear_session(&self, session_id: &SessionId) -> Result<u64, RepositoryError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|record| &record.session_id != session_id);
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use inventra_core::domain::inventory::InventoryItem;
    use inventra_core::domain::sales::SaleRecord;
    use inventra_core::domain::ticket::{NewTicket, TicketPriority, TicketStatus};
    use inventra_core::domain::vendor::{Vendor, VendorId};

    use crate::repositories::{
        InMemoryInventoryRepository, InMemorySalesRepository, InMemoryTicketRepository,
        InMemoryVendorRepository, InventoryRepository, SalesRepository, TicketRepository,
        VendorRepository,
    };

    #[tokio::test]
    async fn inventory_filters_by_region() {
        let item = |sku: &str, region: &str| InventoryItem {
            sku: sku.to_string(),
            name: sku.to_string(),
            category: "Cooling".to_string(),
            region: region.to_string(),
            qty: 1,
            reorder_threshold: 5,
            vendor_id: None,
            unit_price: Decimal::ONE,
        };
        let repo = InMemoryInventoryRepository::with_items([item("A", "West"), item("B", "East")]);

        let west = repo.list_items(Some("West")).await.expect("list");
        assert_eq!(west.len(), 1);
        assert_eq!(west[0].sku, "A");
        assert_eq!(repo.list_items(None).await.expect("list").len(), 2);
    }

    #[tokio::test]
    async fn sales_window_is_inclusive() {
        let sale = |day: u32| SaleRecord {
            date: NaiveDate::from_ymd_opt(2024, 7, day).expect("valid date"),
            sku: "FAN".to_string(),
            qty: 1,
            revenue: Decimal::TEN,
            region: "South".to_string(),
            weather_condition: "Sunny".to_string(),
            temperature: None,
            rainfall: None,
        };
        let repo = InMemorySalesRepository::with_sales([sale(1), sale(5), sale(9)]);

        let since = NaiveDate::from_ymd_opt(2024, 7, 5);
        let windowed = repo.list_sales(since, Some("FAN")).await.expect("list");
        assert_eq!(windowed.len(), 2);
        assert!(repo.list_sales(None, Some("BEV")).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn vendors_rank_like_the_sql_ordering() {
        let vendor = |id: &str, quality: f64, lead: i64| Vendor {
            id: VendorId(id.to_string()),
            name: id.to_string(),
            quality_score: quality,
            reliability_rating: 0.9,
            lead_time_days: lead,
            unit_price: Decimal::ONE,
        };
        let repo = InMemoryVendorRepository::with_vendors([
            vendor("V3", 4.0, 2),
            vendor("V1", 4.8, 9),
            vendor("V2", 4.0, 1),
        ]);

        let ids: Vec<_> =
            repo.list_ranked().await.expect("ranked").into_iter().map(|v| v.id.0).collect();
        assert_eq!(ids, vec!["V1", "V2", "V3"]);
    }

    #[tokio::test]
    async fn ticket_stats_value_pending_work_only() {
        let repo = InMemoryTicketRepository::default().with_unit_price("V1", Decimal::new(9550, 2));
        let ticket = |qty: i64, priority: TicketPriority| NewTicket {
            sku: "AC-W01".to_string(),
            reason: "Low stock".to_string(),
            recommended_qty: qty,
            vendor_id: "V1".to_string(),
            priority,
        };

        let low = repo.create(ticket(4, TicketPriority::Low)).await.expect("create");
        repo.create(ticket(10, TicketPriority::High)).await.expect("create");
        repo.update_status(low.id, TicketStatus::Rejected).await.expect("update");

        let stats = repo.stats().await.expect("stats");
        assert_eq!(stats.total_pending, 1);
        assert_eq!(stats.total_value, Decimal::new(95_500, 2));
        assert_eq!(stats.by_status.get("rejected"), Some(&1));

        let listed = repo.list(None, 10).await.expect("list");
        assert_eq!(listed[0].priority, TicketPriority::High);
    }
}
