//! Event fan-out and notification dispatch.
//!
//! Provides:
//! - [`bus::EventBus`], the subscriber registry with single-slot delivery
//! - [`dispatch::DispatchPool`], the bounded worker pool for outbound mail

pub mod bus;
pub mod dispatch;
pub mod subscription;

pub use bus::EventBus;
pub use dispatch::{DispatchConfig, DispatchHandle, DispatchPool, DispatchSnapshot, DispatchStats};
pub use subscription::Subscription;
