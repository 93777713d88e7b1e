//! Customer notifications for order status changes.
//!
//! The lifecycle manager never talks to SMTP directly. It records a row in the
//! `notification_outbox` table inside the status-change transaction and wakes
//! the [`NotificationWorker`], which renders receipts, sends email and retries
//! failed deliveries with exponential backoff.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Notify;

use crate::models::{Order, OrderItem, OrderStatus, User};

pub mod email;
pub mod outbox;
pub mod receipt;
pub mod worker;

pub use email::{LogNotifier, SmtpNotifier};
pub use receipt::{FileReceiptGenerator, ReceiptRenderer};
pub use worker::{BatchReport, NotificationWorker};

/// Errors from the notification dependencies. These never reach HTTP callers.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Receipt I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

/// Everything a notification needs to describe one status change.
#[derive(Debug, Clone, Copy)]
pub struct OrderNotice<'a> {
    /// Status being announced; the order may have moved on since.
    pub status: OrderStatus,
    pub order: &'a Order,
    pub items: &'a [OrderItem],
    pub user: &'a User,
}

/// Sends the customer email for a status change and returns a message id.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_status_update(
        &self,
        notice: &OrderNotice<'_>,
        receipt: Option<&Path>,
    ) -> Result<String, NotifyError>;
}

/// Produces a receipt artifact for a delivered order and returns its location.
#[async_trait]
pub trait ReceiptGenerator: Send + Sync {
    async fn generate(&self, notice: &OrderNotice<'_>) -> Result<PathBuf, NotifyError>;
}

/// Handle used to wake the outbox worker after new rows are committed.
#[derive(Clone, Default)]
pub struct NotificationQueue {
    wake: Arc<Notify>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wake(&self) {
        self.wake.notify_one();
    }

    pub(crate) async fn woken(&self) {
        self.wake.notified().await;
    }
}

/// Formats minor currency units as `12.34`.
pub(crate) fn format_amount(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Short human-facing order reference, e.g. `3F2A9C1B`.
pub(crate) fn order_reference(order: &Order) -> String {
    let simple = order.id.simple().to_string();
    simple.get(..8).unwrap_or(&simple).to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::format_amount;

    #[test]
    fn amounts_render_with_two_decimals() {
        assert_eq!(format_amount(0), "0.00");
        assert_eq!(format_amount(5), "0.05");
        assert_eq!(format_amount(12_345), "123.45");
        assert_eq!(format_amount(-250), "-2.50");
    }
}
