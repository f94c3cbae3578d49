pub mod daily_price;
pub mod event;
pub mod holding;
pub mod instrument;
pub mod notification_log;
pub mod portfolio_snapshot;
pub mod signal_history;
