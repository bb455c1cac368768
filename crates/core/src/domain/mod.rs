pub mod classification;
pub mod conversation;
pub mod finance;
pub mod intent;
pub mod inventory;
pub mod region;
pub mod sales;
pub mod ticket;
pub mod vendor;
pub mod weather;
