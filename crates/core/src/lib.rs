pub mod config;
pub mod domain;
pub mod errors;
pub mod pipeline;

pub use domain::classification::QueryClassification;
pub use domain::conversation::{
    ConversationMetadata, ConversationRecord, NewConversation, SessionId, SessionSummary,
};
pub use domain::finance::{FinanceTransaction, FinancialSummary, TransactionKind};
pub use domain::intent::Intent;
pub use domain::inventory::{InventoryItem, InventorySnapshot, LowStockItem};
pub use domain::region::Region;
pub use domain::sales::{SaleRecord, SalesPatternSummary};
pub use domain::ticket::{
    NewTicket, Ticket, TicketId, TicketPriority, TicketSnapshot, TicketStats, TicketStatus,
};
pub use domain::vendor::{Vendor, VendorId, VendorPerformance};
pub use domain::weather::{DailyForecast, WeatherForecast};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use pipeline::{
    Classified, DataResult, Decided, DecisionResult, Gathered, PipelineOutcome, PipelineStage,
    Report,
};
