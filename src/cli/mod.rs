//! Command handlers and terminal rendering

pub mod financials;
pub mod index;
pub mod listing;
pub mod notify;
pub mod setup;
pub mod stock;
pub mod ui;
pub mod users;
