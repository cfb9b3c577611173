use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(ReactivationRequests)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        let conn = manager.get_connection();

        // At most one pending request per account.
        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_reactivation_one_pending \
             ON reactivation_requests(user_id) WHERE status = 'pending'",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_reactivation_requested_at \
             ON reactivation_requests(requested_at DESC)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared("DROP INDEX IF EXISTS idx_reactivation_requested_at")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_reactivation_one_pending")
            .await?;

        manager
            .drop_table(Table::drop().table(ReactivationRequests).to_owned())
            .await?;

        Ok(())
    }
}
