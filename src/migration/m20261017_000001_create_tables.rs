use sea_orm::{EntityTrait, Schema};
use sea_orm_migration::prelude::*;

use crate::entity::{
    AuditLogs, NotificationOutbox, OrderItems, Orders, Products, Reviews, Users,
    notification_outbox, orders, reviews,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        // Parents first; foreign keys come from the entity relations.
        create_table(manager, &schema, Users).await?;
        create_table(manager, &schema, Products).await?;
        create_table(manager, &schema, Orders).await?;
        create_table(manager, &schema, OrderItems).await?;
        create_table(manager, &schema, Reviews).await?;
        create_table(manager, &schema, AuditLogs).await?;
        create_table(manager, &schema, NotificationOutbox).await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_orders_user_id")
                    .table(Orders)
                    .col(orders::Column::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("idx_reviews_product_user")
                    .table(Reviews)
                    .col(reviews::Column::ProductId)
                    .col(reviews::Column::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_outbox_state_next_attempt")
                    .table(NotificationOutbox)
                    .col(notification_outbox::Column::State)
                    .col(notification_outbox::Column::NextAttemptAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_table(manager, NotificationOutbox).await?;
        drop_table(manager, AuditLogs).await?;
        drop_table(manager, Reviews).await?;
        drop_table(manager, OrderItems).await?;
        drop_table(manager, Orders).await?;
        drop_table(manager, Products).await?;
        drop_table(manager, Users).await
    }
}

async fn create_table<E: EntityTrait>(
    manager: &SchemaManager<'_>,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    manager
        .create_table(
            schema
                .create_table_from_entity(entity)
                .if_not_exists()
                .to_owned(),
        )
        .await
}

async fn drop_table<E: EntityTrait>(manager: &SchemaManager<'_>, entity: E) -> Result<(), DbErr> {
    manager
        .drop_table(Table::drop().table(entity).if_exists().to_owned())
        .await
}
