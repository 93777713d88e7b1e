use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use super::{
    NotificationQueue, Notifier, OrderNotice, ReceiptGenerator,
    outbox::{self, OutboxState},
};
use crate::{
    audit::log_audit_or_warn,
    config::NotifyConfig,
    entity::{
        OrderItems, Orders, Users, notification_outbox::Model as OutboxModel,
        order_items::Column as OrderItemCol,
    },
    error::AppResult,
    models::{Order, OrderItem, OrderStatus, User},
};

/// Outcome counts of one pass over the due outbox rows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub sent: usize,
    pub retried: usize,
    pub dead: usize,
}

/// Background task delivering queued status notifications.
pub struct NotificationWorker {
    orm: DatabaseConnection,
    queue: NotificationQueue,
    notifier: Arc<dyn Notifier>,
    receipts: Arc<dyn ReceiptGenerator>,
    config: NotifyConfig,
}

struct NoticeData {
    order: Order,
    items: Vec<OrderItem>,
    user: User,
}

impl NotificationWorker {
    pub fn new(
        orm: DatabaseConnection,
        queue: NotificationQueue,
        notifier: Arc<dyn Notifier>,
        receipts: Arc<dyn ReceiptGenerator>,
        config: NotifyConfig,
    ) -> Self {
        Self {
            orm,
            queue,
            notifier,
            receipts,
            config,
        }
    }

    /// Runs until the process exits. Wakes on [`NotificationQueue::wake`] and
    /// on a periodic scan so retries and rows left by a crash are picked up.
    pub async fn run(self) {
        tracing::info!(
            max_attempts = self.config.max_attempts,
            scan_secs = self.config.scan_interval.as_secs(),
            "notification worker started"
        );

        let mut scan = tokio::time::interval(self.config.scan_interval);
        loop {
            tokio::select! {
                _ = self.queue.woken() => {}
                _ = scan.tick() => {}
            }

            // Drain until a pass finds nothing due.
            loop {
                match self.process_due().await {
                    Ok(report) if report == BatchReport::default() => break,
                    Ok(report) => {
                        tracing::debug!(?report, "notification batch processed");
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "failed to read notification outbox");
                        break;
                    }
                }
            }
        }
    }

    /// Attempts every row that is due now, once.
    pub async fn process_due(&self) -> Result<BatchReport, DbErr> {
        let now = Utc::now();
        let jobs = outbox::due(&self.orm, now, self.config.batch_size).await?;
        let mut report = BatchReport::default();

        for job in jobs {
            match self.process(job, now).await? {
                OutboxState::Sent => report.sent += 1,
                OutboxState::Pending => report.retried += 1,
                OutboxState::Dead => report.dead += 1,
            }
        }

        Ok(report)
    }

    async fn process(&self, job: OutboxModel, now: DateTime<Utc>) -> Result<OutboxState, DbErr> {
        let attempts = job.attempts + 1;
        let order_id = job.order_id;

        let Ok(status) = job.status.parse::<OrderStatus>() else {
            let reason = format!("unknown status `{}`", job.status);
            return self.dead_letter(job, attempts, reason, now).await;
        };

        let data = match self.load(order_id).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                let reason = "order or customer no longer exists".to_string();
                return self.dead_letter(job, attempts, reason, now).await;
            }
            Err(err) => return self.failed(job, attempts, err.to_string(), now).await,
        };

        let notice = OrderNotice {
            status,
            order: &data.order,
            items: &data.items,
            user: &data.user,
        };

        let receipt = if status == OrderStatus::Delivered {
            match self.receipts.generate(&notice).await {
                Ok(path) => Some(path),
                Err(err) => {
                    tracing::warn!(
                        order_id = %order_id,
                        error = %err,
                        "receipt generation failed, sending without attachment"
                    );
                    None
                }
            }
        } else {
            None
        };

        match self
            .notifier
            .send_status_update(&notice, receipt.as_deref())
            .await
        {
            Ok(message_id) => {
                tracing::info!(
                    order_id = %order_id,
                    status = %status,
                    to = %data.user.email,
                    message_id = %message_id,
                    "order notification sent"
                );
                let outbox_id = job.id;
                if let Err(err) = outbox::mark_sent(&self.orm, job, attempts, message_id, now).await
                {
                    // The email is out; keep going with the batch.
                    tracing::error!(
                        order_id = %order_id,
                        outbox_id = %outbox_id,
                        error = %err,
                        "failed to record sent notification"
                    );
                }
                Ok(OutboxState::Sent)
            }
            Err(err) => self.failed(job, attempts, err.to_string(), now).await,
        }
    }

    async fn failed(
        &self,
        job: OutboxModel,
        attempts: i32,
        error: String,
        now: DateTime<Utc>,
    ) -> Result<OutboxState, DbErr> {
        let max_attempts = i32::try_from(self.config.max_attempts).unwrap_or(i32::MAX);
        if attempts >= max_attempts {
            return self.dead_letter(job, attempts, error, now).await;
        }

        let delay = self.config.backoff(attempts.unsigned_abs());
        let delay_secs = i64::try_from(delay.as_secs()).unwrap_or(i64::MAX).min(86_400);
        let next_attempt_at = now + TimeDelta::seconds(delay_secs);
        tracing::warn!(
            order_id = %job.order_id,
            attempts,
            retry_in_secs = delay_secs,
            error = %error,
            "order notification failed, will retry"
        );
        outbox::mark_retry(&self.orm, job, attempts, error, next_attempt_at, now).await?;
        Ok(OutboxState::Pending)
    }

    async fn dead_letter(
        &self,
        job: OutboxModel,
        attempts: i32,
        error: String,
        now: DateTime<Utc>,
    ) -> Result<OutboxState, DbErr> {
        tracing::error!(
            order_id = %job.order_id,
            status = %job.status,
            attempts,
            error = %error,
            "order notification abandoned"
        );
        let metadata = serde_json::json!({
            "outbox_id": job.id,
            "order_id": job.order_id,
            "status": job.status,
            "attempts": attempts,
            "error": error,
        });
        outbox::mark_dead(&self.orm, job, attempts, error, now).await?;
        log_audit_or_warn(
            &self.orm,
            None,
            "notification_dead_letter",
            Some("notification_outbox"),
            Some(metadata),
        )
        .await;
        Ok(OutboxState::Dead)
    }

    async fn load(&self, order_id: Uuid) -> AppResult<Option<NoticeData>> {
        let Some(order) = Orders::find_by_id(order_id).one(&self.orm).await? else {
            return Ok(None);
        };
        let Some(user) = Users::find_by_id(order.user_id).one(&self.orm).await? else {
            return Ok(None);
        };
        let items = OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(order_id))
            .order_by_asc(OrderItemCol::Name)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(OrderItem::from)
            .collect();

        Ok(Some(NoticeData {
            order: Order::try_from(order)?,
            items,
            user: User::try_from(user)?,
        }))
    }
}
