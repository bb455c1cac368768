use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;

use inventra_core::domain::ticket::{
    NewTicket, Ticket, TicketId, TicketPriority, TicketStats, TicketStatus,
};

use super::{column, format_timestamp, parse_decimal, parse_timestamp, RepositoryError, TicketRepository};
use crate::DbPool;

const TICKET_COLUMNS: &str = "t.id, t.sku, t.reason, t.recommended_qty, t.vendor_id, t.priority,
        t.status, t.created_at, i.name AS product_name, v.name AS vendor_name
     FROM tickets t
     LEFT JOIN inventory i ON t.sku = i.sku
     LEFT JOIN vendors v ON t.vendor_id = v.vendor_id";

const PRIORITY_RANK: &str =
    "CASE t.priority WHEN 'high' THEN 3 WHEN 'medium' THEN 2 WHEN 'low' THEN 1 ELSE 0 END";

pub struct SqlTicketRepository {
    pool: DbPool,
}

impl SqlTicketRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_ticket(row: &SqliteRow) -> Result<Ticket, RepositoryError> {
    let priority: String = column(row, "priority")?;
    let status: String = column(row, "status")?;
    let created_at: String = column(row, "created_at")?;

    Ok(Ticket {
        id: TicketId(column(row, "id")?),
        sku: column(row, "sku")?,
        reason: column(row, "reason")?,
        recommended_qty: column(row, "recommended_qty")?,
        vendor_id: column(row, "vendor_id")?,
        priority: priority
            .parse::<TicketPriority>()
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        status: status.parse::<TicketStatus>().map_err(|e| RepositoryError::Decode(e.to_string()))?,
        created_at: parse_timestamp("created_at", &created_at)?,
        product_name: column(row, "product_name")?,
        vendor_name: column(row, "vendor_name")?,
    })
}

#[async_trait::async_trait]
impl TicketRepository for SqlTicketRepository {
    async fn create(&self, ticket: NewTicket) -> Result<Ticket, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO tickets (sku, reason, recommended_qty, vendor_id, priority, status,
                                  created_at)
             VALUES (?, ?, ?, ?, ?, 'pending', ?)",
        )
        .bind(&ticket.sku)
        .bind(&ticket.reason)
        .bind(ticket.recommended_qty)
        .bind(&ticket.vendor_id)
        .bind(ticket.priority.as_str())
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        let id = TicketId(result.last_insert_rowid());
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::Decode(format!("ticket {} vanished after insert", id.0)))
    }

    async fn list(
        &self,
        status: Option<TicketStatus>,
        limit: u32,
    ) -> Result<Vec<Ticket>, RepositoryError> {
        let sql = format!(
            "SELECT {TICKET_COLUMNS}
             WHERE ?1 IS NULL OR t.status = ?1
             ORDER BY {PRIORITY_RANK} DESC, t.created_at DESC, t.id DESC
             LIMIT ?2"
        );
        let rows = sqlx::query(&sql)
            .bind(status.map(|status| status.as_str()))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_ticket).collect()
    }

    async fn list_pending_by_priority(
        &self,
        priority: TicketPriority,
        limit: u32,
    ) -> Result<Vec<Ticket>, RepositoryError> {
        let sql = format!(
            "SELECT {TICKET_COLUMNS}
             WHERE t.status = 'pending' AND t.priority = ?
             ORDER BY t.created_at DESC, t.id DESC
             LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(priority.as_str())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_ticket).collect()
    }

    async fn find_by_id(&self, id: TicketId) -> Result<Option<Ticket>, RepositoryError> {
        let sql = format!("SELECT {TICKET_COLUMNS} WHERE t.id = ?");
        let row = sqlx::query(&sql).bind(id.0).fetch_optional(&self.pool).await?;

        row.as_ref().map(row_to_ticket).transpose()
    }

    async fn update_status(&self, id: TicketId, status: TicketStatus) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE tickets SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self) -> Result<TicketStats, RepositoryError> {
        let mut by_status = BTreeMap::new();
        for row in sqlx::query("SELECT status, COUNT(*) AS count FROM tickets GROUP BY status")
            .fetch_all(&self.pool)
            .await?
        {
            by_status.insert(column::<String>(&row, "status")?, column::<i64>(&row, "count")?);
        }

        let mut by_priority = BTreeMap::new();
        for row in sqlx::query(
            "SELECT priority, COUNT(*) AS count FROM tickets WHERE status = 'pending' GROUP BY priority",
        )
        .fetch_all(&self.pool)
        .await?
        {
            by_priority.insert(column::<String>(&row, "priority")?, column::<i64>(&row, "count")?);
        }

        let mut total_value = Decimal::ZERO;
        for row in sqlx::query(
            "SELECT t.recommended_qty, v.unit_price
             FROM tickets t
             JOIN vendors v ON t.vendor_id = v.vendor_id
             WHERE t.status = 'pending'",
        )
        .fetch_all(&self.pool)
        .await?
        {
            let qty: i64 = column(&row, "recommended_qty")?;
            let unit_price: String = column(&row, "unit_price")?;
            total_value += Decimal::from(qty) * parse_decimal("unit_price", &unit_price)?;
        }

        Ok(TicketStats {
            total_pending: by_status.get(TicketStatus::Pending.as_str()).copied().unwrap_or(0),
            by_status,
            by_priority,
            total_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use inventra_core::domain::ticket::{NewTicket, TicketId, TicketPriority, TicketStatus};

    use super::SqlTicketRepository;
    use crate::repositories::TicketRepository;
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup() -> (DbPool, SqlTicketRepository) {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        sqlx::query(
            "INSERT INTO vendors (vendor_id, name, quality_score, reliability_rating, lead_time_days, unit_price)
             VALUES ('V1', 'Summit Traders', 4.6, 0.92, 7, '95.50'),
                    ('V2', 'Eastern Goods Ltd', 3.9, 0.85, 6, '70.00')",
        )
        .execute(&pool)
        .await
        .expect("vendors");
        sqlx::query(
            "INSERT INTO inventory (sku, name, category, region, qty, reorder_threshold, vendor_id, unit_price)
             VALUES ('AC-W01', 'Portable Air Cooler', 'Cooling', 'West', 5, 10, 'V1', '6499.00')",
        )
        .execute(&pool)
        .await
        .expect("inventory");
        (pool.clone(), SqlTicketRepository::new(pool))
    }

    fn new_ticket(sku: &str, vendor: &str, qty: i64, priority: TicketPriority) -> NewTicket {
        NewTicket {
            sku: sku.to_string(),
            reason: "Low stock".to_string(),
            recommended_qty: qty,
            vendor_id: vendor.to_string(),
            priority,
        }
    }

    #[tokio::test]
    async fn created_tickets_are_pending_and_joined_with_names() {
        let (_pool, repo) = setup().await;

        let ticket = repo
            .create(new_ticket("AC-W01", "V1", 15, TicketPriority::High))
            .await
            .expect("create");

        assert_eq!(ticket.status, TicketStatus::Pending);
        assert_eq!(ticket.product_name.as_deref(), Some("Portable Air Cooler"));
        assert_eq!(ticket.vendor_name.as_deref(), Some("Summit Traders"));

        let orphan = repo
            .create(new_ticket("NO-SKU", "Unknown", 3, TicketPriority::Low))
            .await
            .expect("vendor without a row is allowed");
        assert_eq!(orphan.product_name, None);
        assert_eq!(orphan.vendor_name, None);
    }

    #[tokio::test]
    async fn listing_orders_by_priority_rank_not_text() {
        let (pool, repo) = setup().await;
        for (id, priority, created_at) in [
            (1, "low", "2024-01-03T00:00:00.000Z"),
            (2, "high", "2024-01-01T00:00:00.000Z"),
            (3, "medium", "2024-01-02T00:00:00.000Z"),
            (4, "high", "2024-01-02T00:00:00.000Z"),
        ] {
            sqlx::query(
                "INSERT INTO tickets (id, sku, reason, recommended_qty, vendor_id, priority, status, created_at)
                 VALUES (?, 'AC-W01', 'r', 1, 'V1', ?, 'pending', ?)",
            )
            .bind(id)
            .bind(priority)
            .bind(created_at)
            .execute(&pool)
            .await
            .expect("insert");
        }

        let tickets = repo.list(Some(TicketStatus::Pending), 50).await.expect("list");
        let ids: Vec<_> = tickets.iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![4, 2, 3, 1]);

        assert_eq!(repo.list(None, 2).await.expect("limited").len(), 2);
        assert!(repo.list(Some(TicketStatus::Completed), 50).await.expect("none").is_empty());
    }

    #[tokio::test]
    async fn priority_filter_keeps_pending_tickets_newest_first() {
        let (_pool, repo) = setup().await;
        let older = repo.create(new_ticket("AC-W01", "V1", 15, TicketPriority::High)).await.expect("c");
        repo.create(new_ticket("AC-W01", "V2", 26, TicketPriority::Medium)).await.expect("c");
        let newer = repo.create(new_ticket("AC-W01", "V2", 8, TicketPriority::High)).await.expect("c");
        let closed = repo.create(new_ticket("AC-W01", "V1", 4, TicketPriority::High)).await.expect("c");
        repo.update_status(closed.id, TicketStatus::Rejected).await.expect("update");

        let high = repo.list_pending_by_priority(TicketPriority::High, 50).await.expect("high");
        let ids: Vec<_> = high.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);

        assert_eq!(repo.list_pending_by_priority(TicketPriority::High, 1).await.expect("one").len(), 1);
        assert!(repo.list_pending_by_priority(TicketPriority::Low, 50).await.expect("low").is_empty());
    }

    #[tokio::test]
    async fn status_updates_report_missing_ids_and_feed_stats() {
        let (_pool, repo) = setup().await;
        let high = repo.create(new_ticket("AC-W01", "V1", 15, TicketPriority::High)).await.expect("c");
        repo.create(new_ticket("AC-W01", "V2", 26, TicketPriority::Medium)).await.expect("c");
        let done = repo.create(new_ticket("AC-W01", "V2", 100, TicketPriority::Low)).await.expect("c");

        assert!(repo.update_status(done.id, TicketStatus::Completed).await.expect("update"));
        assert!(!repo.update_status(TicketId(999), TicketStatus::Approved).await.expect("missing"));

        let stats = repo.stats().await.expect("stats");
        assert_eq!(stats.total_pending, 2);
        assert_eq!(stats.by_status.get("completed"), Some(&1));
        assert_eq!(stats.by_priority.get("high"), Some(&1));
        assert_eq!(stats.by_priority.get("low"), None);
        assert_eq!(stats.total_value, Decimal::new(325_250, 2));

        let fetched = repo.find_by_id(high.id).await.expect("find").expect("present");
        assert_eq!(fetched.recommended_qty, 15);
    }
}
