//! Schema building blocks shared by migrations.
//!
//! An *editable enum* is a lookup table of allowed values that stays
//! modifiable after deployment. A *dynamic enum* column is a nullable
//! integer pointing at one of those tables by foreign key.

use sea_orm::DatabaseBackend;
use sea_orm_migration::prelude::*;

#[derive(DeriveIden, Clone, Copy)]
pub enum EditableEnum {
    Id,
    Value,
    Position,
    Readonly,
}

/// Creates the lookup table `name` and seeds it with `values`, keeping
/// their order in `position`.
pub async fn create_editable_enum(
    manager: &SchemaManager<'_>,
    name: &str,
    values: &[&str],
) -> Result<(), DbErr> {
    manager
        .create_table(
            Table::create()
                .table(Alias::new(name))
                .col(
                    ColumnDef::new(EditableEnum::Id)
                        .integer()
                        .not_null()
                        .auto_increment()
                        .primary_key(),
                )
                .col(
                    ColumnDef::new(EditableEnum::Value)
                        .string()
                        .not_null()
                        .unique_key(),
                )
                .col(ColumnDef::new(EditableEnum::Position).integer().not_null())
                .col(
                    ColumnDef::new(EditableEnum::Readonly)
                        .boolean()
                        .not_null()
                        .default(false),
                )
                .to_owned(),
        )
        .await?;

    if values.is_empty() {
        return Ok(());
    }

    let mut insert = Query::insert()
        .into_table(Alias::new(name))
        .columns([EditableEnum::Value, EditableEnum::Position])
        .to_owned();
    for (position, value) in values.iter().enumerate() {
        insert.values_panic([(*value).into(), (position as i32).into()]);
    }
    manager.exec_stmt(insert).await?;

    tracing::debug!(enum_table = name, count = values.len(), "created editable enum");
    Ok(())
}

/// Adds a nullable integer `column` to `table` that references
/// `enum_table.id`.
pub async fn add_dynamic_enum<T, C>(
    manager: &SchemaManager<'_>,
    table: T,
    column: C,
    enum_table: &str,
) -> Result<(), DbErr>
where
    T: Iden + Copy + 'static,
    C: Iden + Copy + 'static,
{
    match manager.get_database_backend() {
        // SQLite can't attach constraints to an existing table, but accepts
        // an inline reference on a column added with a NULL default.
        DatabaseBackend::Sqlite => {
            manager
                .alter_table(
                    Table::alter()
                        .table(table)
                        .add_column(
                            ColumnDef::new(column)
                                .integer()
                                .null()
                                .extra(format!("REFERENCES \"{enum_table}\" (\"id\")")),
                        )
                        .to_owned(),
                )
                .await
        }
        _ => {
            manager
                .alter_table(
                    Table::alter()
                        .table(table)
                        .add_column(ColumnDef::new(column).integer().null())
                        .to_owned(),
                )
                .await?;

            let foreign_key = TableForeignKey::new()
                .name(format!("fk-{}-{}", table.to_string(), column.to_string()))
                .from_tbl(table)
                .from_col(column)
                .to_tbl(Alias::new(enum_table))
                .to_col(EditableEnum::Id)
                .to_owned();
            manager
                .alter_table(
                    Table::alter()
                        .table(table)
                        .add_foreign_key(&foreign_key)
                        .to_owned(),
                )
                .await
        }
    }
}

/// Adds a nullable long text column. MySQL `text` tops out at 64KiB, which
/// is too small for 16384 four-byte characters.
pub async fn add_text_column<T, C>(
    manager: &SchemaManager<'_>,
    table: T,
    column: C,
) -> Result<(), DbErr>
where
    T: Iden + Copy + 'static,
    C: Iden + Copy + 'static,
{
    let mut def = ColumnDef::new(column);
    match manager.get_database_backend() {
        DatabaseBackend::MySql => def.custom(Alias::new("mediumtext")),
        _ => def.text(),
    };

    manager
        .alter_table(
            Table::alter()
                .table(table)
                .add_column(def.null())
                .to_owned(),
        )
        .await
}

pub async fn add_string_column<T, C>(
    manager: &SchemaManager<'_>,
    table: T,
    column: C,
) -> Result<(), DbErr>
where
    T: Iden + Copy + 'static,
    C: Iden + Copy + 'static,
{
    manager
        .alter_table(
            Table::alter()
                .table(table)
                .add_column(ColumnDef::new(column).string().null())
                .to_owned(),
        )
        .await
}
