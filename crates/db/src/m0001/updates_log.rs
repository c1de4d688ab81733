use sea_query::{ColumnDef, Table, TableCreateStatement, TableDropStatement};

use crate::table::UpdatesLog;

pub struct CreateTable;

fn create_table() -> TableCreateStatement {
    Table::create()
        .table(UpdatesLog::Table)
        .col(
            ColumnDef::new(UpdatesLog::Id)
                .big_integer()
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(UpdatesLog::Timestamp).big_integer().not_null())
        .col(ColumnDef::new(UpdatesLog::Update).text().not_null())
        .to_owned()
}

fn drop_table() -> TableDropStatement {
    Table::drop().table(UpdatesLog::Table).to_owned()
}

#[async_trait::async_trait]
impl sqlx_migrator::Operation<sqlx::Sqlite> for CreateTable {
    async fn up(
        &self,
        connection: &mut sqlx::SqliteConnection,
    ) -> Result<(), sqlx_migrator::Error> {
        let statement = create_table().to_string(sea_query::SqliteQueryBuilder);
        sqlx::query(&statement).execute(connection).await?;

        Ok(())
    }

    async fn down(
        &self,
        connection: &mut sqlx::SqliteConnection,
    ) -> Result<(), sqlx_migrator::Error> {
        let statement = drop_table().to_string(sea_query::SqliteQueryBuilder);
        sqlx::query(&statement).execute(connection).await?;

        Ok(())
    }
}
