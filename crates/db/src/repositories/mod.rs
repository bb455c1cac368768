use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use thiserror::Error;

use inventra_core::domain::conversation::{
    ConversationRecord, NewConversation, SessionId, SessionSummary,
};
use inventra_core::domain::finance::FinanceTransaction;
use inventra_core::domain::inventory::InventoryItem;
use inventra_core::domain::sales::SaleRecord;
use inventra_core::domain::ticket::{
    NewTicket, Ticket, TicketId, TicketPriority, TicketStats, TicketStatus,
};
use inventra_core::domain::vendor::{Vendor, VendorId};

use crate::DbPool;

pub mod conversation;
pub mod finance;
pub mod inventory;
pub mod memory;
pub mod sales;
pub mod ticket;
pub mod vendor;

pub use conversation::SqlConversationRepository;
pub use finance::SqlFinanceRepository;
pub use inventory::SqlInventoryRepository;
pub use memory::{
    InMemoryConversationRepository, InMemoryFinanceRepository, InMemoryInventoryRepository,
    InMemorySalesRepository, InMemoryTicketRepository, InMemoryVendorRepository,
};
pub use sales::SqlSalesRepository;
pub use ticket::SqlTicketRepository;
pub use vendor::SqlVendorRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Items ordered by sku, optionally restricted to one canonical region name.
    async fn list_items(&self, region: Option<&str>) -> Result<Vec<InventoryItem>, RepositoryError>;
    async fn find_by_sku(&self, sku: &str) -> Result<Option<InventoryItem>, RepositoryError>;
    async fn save_item(&self, item: InventoryItem) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait SalesRepository: Send + Sync {
    /// Sales on or after `since` (all time when absent), newest first.
    async fn list_sales(
        &self,
        since: Option<NaiveDate>,
        sku: Option<&str>,
    ) -> Result<Vec<SaleRecord>, RepositoryError>;
    async fn record_sale(&self, sale: SaleRecord) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait FinanceRepository: Send + Sync {
    async fn list_transactions(
        &self,
        since: Option<NaiveDate>,
        region: Option<&str>,
    ) -> Result<Vec<FinanceTransaction>, RepositoryError>;
    async fn record(&self, transaction: FinanceTransaction) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait VendorRepository: Send + Sync {
    /// Vendors ordered by quality desc, reliability desc, lead time asc.
    async fn list_ranked(&self) -> Result<Vec<Vendor>, RepositoryError>;
    async fn find_by_id(&self, id: &VendorId) -> Result<Option<Vendor>, RepositoryError>;
    async fn save(&self, vendor: Vendor) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn create(&self, ticket: NewTicket) -> Result<Ticket, RepositoryError>;
    /// Tickets ordered by priority (high first), then newest first.
    async fn list(
        &self,
        status: Option<TicketStatus>,
        limit: u32,
    ) -> Result<Vec<Ticket>, RepositoryError>;
    /// Pending tickets of one priority, newest first.
    async fn list_pending_by_priority(
        &self,
        priority: TicketPriority,
        limit: u32,
    ) -> Result<Vec<Ticket>, RepositoryError>;
    async fn find_by_id(&self, id: TicketId) -> Result<Option<Ticket>, RepositoryError>;
    /// Returns `false` when no ticket has that id.
    async fn update_status(&self, id: TicketId, status: TicketStatus) -> Result<bool, RepositoryError>;
    async fn stats(&self) -> Result<TicketStats, RepositoryError>;
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn append(&self, conversation: NewConversation) -> Result<i64, RepositoryError>;
    /// The latest `limit` turns of a session, returned oldest first.
    async fn session_history(
        &self,
        session_id: &SessionId,
        limit: u32,
    ) -> Result<Vec<ConversationRecord>, RepositoryError>;
    async fn recent(&self, limit: u32) -> Result<Vec<ConversationRecord>, RepositoryError>;
    async fn search(
        &self,
        keyword: &str,
        limit: u32,
    ) -> Result<Vec<ConversationRecord>, RepositoryError>;
    async fn session_summary(&self, session_id: &SessionId)
        -> Result<SessionSummary, RepositoryError>;
    async fn clear_session(&self, session_id: &SessionId) -> Result<u64, RepositoryError>;
}

/// One handle per store, shared by the pipeline, the ticket service and the binaries.
#[derive(Clone)]
pub struct Repositories {
    pub inventory: Arc<dyn InventoryRepository>,
    pub sales: Arc<dyn SalesRepository>,
    pub finance: Arc<dyn FinanceRepository>,
    pub vendors: Arc<dyn VendorRepository>,
    pub tickets: Arc<dyn TicketRepository>,
    pub conversations: Arc<dyn ConversationRepository>,
}

impl Repositories {
    pub fn sqlite(pool: DbPool) -> Self {
        Self {
            inventory: Arc::new(SqlInventoryRepository::new(pool.clone())),
            sales: Arc::new(SqlSalesRepository::new(pool.clone())),
            finance: Arc::new(SqlFinanceRepository::new(pool.clone())),
            vendors: Arc::new(SqlVendorRepository::new(pool.clone())),
            tickets: Arc::new(SqlTicketRepository::new(pool.clone())),
            conversations: Arc::new(SqlConversationRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            inventory: Arc::new(InMemoryInventoryRepository::default()),
            sales: Arc::new(InMemorySalesRepository::default()),
            finance: Arc::new(InMemoryFinanceRepository::default()),
            vendors: Arc::new(InMemoryVendorRepository::default()),
            tickets: Arc::new(InMemoryTicketRepository::default()),
            conversations: Arc::new(InMemoryConversationRepository::default()),
        }
    }
}

pub(crate) fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name).map_err(|e| RepositoryError::Decode(e.to_string()))
}

pub(crate) fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw.trim())
        .map_err(|e| RepositoryError::Decode(format!("{field} `{raw}` is not a decimal: {e}")))
}

pub(crate) fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, RepositoryError> {
    // Timestamps in a date column keep only their date part.
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|e| RepositoryError::Decode(format!("{field} `{raw}` is not a date: {e}")))
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{field} `{raw}` is not RFC 3339: {e}")))
}

pub(crate) fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
