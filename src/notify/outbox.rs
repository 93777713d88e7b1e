//! Persistence for the notification outbox.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    entity::notification_outbox::{
        ActiveModel as OutboxActive, Column as OutboxCol, Entity as Outbox, Model as OutboxModel,
    },
    models::OrderStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboxState {
    Pending,
    Sent,
    Dead,
}

impl OutboxState {
    pub fn as_str(self) -> &'static str {
        match self {
            OutboxState::Pending => "pending",
            OutboxState::Sent => "sent",
            OutboxState::Dead => "dead",
        }
    }
}

/// Queue a notification for `status`. Call inside the transaction that
/// applies the status change so both commit or neither does.
pub async fn enqueue<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    status: OrderStatus,
    now: DateTime<Utc>,
) -> Result<OutboxModel, DbErr> {
    OutboxActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        status: Set(status.as_str().to_string()),
        state: Set(OutboxState::Pending.as_str().to_string()),
        attempts: Set(0),
        last_error: Set(None),
        message_id: Set(None),
        next_attempt_at: Set(now.into()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(conn)
    .await
}

/// Pending rows whose next attempt is due, oldest first.
pub async fn due<C: ConnectionTrait>(
    conn: &C,
    now: DateTime<Utc>,
    limit: u64,
) -> Result<Vec<OutboxModel>, DbErr> {
    let now: sea_orm::prelude::DateTimeWithTimeZone = now.into();
    Outbox::find()
        .filter(OutboxCol::State.eq(OutboxState::Pending.as_str()))
        .filter(OutboxCol::NextAttemptAt.lte(now))
        .order_by_asc(OutboxCol::CreatedAt)
        .limit(limit)
        .all(conn)
        .await
}

pub async fn for_order<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> Result<Vec<OutboxModel>, DbErr> {
    Outbox::find()
        .filter(OutboxCol::OrderId.eq(order_id))
        .order_by_asc(OutboxCol::CreatedAt)
        .all(conn)
        .await
}

pub async fn mark_sent<C: ConnectionTrait>(
    conn: &C,
    job: OutboxModel,
    attempts: i32,
    message_id: String,
    now: DateTime<Utc>,
) -> Result<OutboxModel, DbErr> {
    let mut active: OutboxActive = job.into();
    active.state = Set(OutboxState::Sent.as_str().to_string());
    active.attempts = Set(attempts);
    active.message_id = Set(Some(message_id));
    active.last_error = Set(None);
    active.updated_at = Set(now.into());
    active.update(conn).await
}

pub async fn mark_retry<C: ConnectionTrait>(
    conn: &C,
    job: OutboxModel,
    attempts: i32,
    error: String,
    next_attempt_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<OutboxModel, DbErr> {
    let mut active: OutboxActive = job.into();
    active.attempts = Set(attempts);
    active.last_error = Set(Some(error));
    active.next_attempt_at = Set(next_attempt_at.into());
    active.updated_at = Set(now.into());
    active.update(conn).await
}

pub async fn mark_dead<C: ConnectionTrait>(
    conn: &C,
    job: OutboxModel,
    attempts: i32,
    error: String,
    now: DateTime<Utc>,
) -> Result<OutboxModel, DbErr> {
    let mut active: OutboxActive = job.into();
    active.state = Set(OutboxState::Dead.as_str().to_string());
    active.attempts = Set(attempts);
    active.last_error = Set(Some(error));
    active.updated_at = Set(now.into());
    active.update(conn).await
}
