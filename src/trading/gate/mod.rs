pub mod notification_gate;
pub mod state_store;

pub use notification_gate::{GateOutcome, NotificationGate, SuppressReason};
pub use state_store::{GateStateStore, MemoryGateStore, PreviousSignal, RedisGateStore};
