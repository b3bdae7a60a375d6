//! Local notification module
//!
//! A schedule/cancel-by-id backend plus the gateway that tracks which
//! notifications belong to which timer.

pub mod backend;
pub mod gateway;

pub use backend::{DeliveredNotification, LocalNotifier, NotificationBackend};
pub use gateway::{NotificationGateway, PendingNotifications};
