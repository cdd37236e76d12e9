pub mod condition;
pub mod notifier;
pub mod transport;
