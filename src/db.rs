use std::path::Path;

use anyhow::{bail, Context, Result};
use entities::{container, prelude::*};
use migration::{helpers::EditableEnum, Alias, Expr, Migrator, MigratorTrait, Order, Query};
use sea_orm::{
    prelude::*, ActiveValue, ConnectOptions, Database, DatabaseConnection, FromQueryResult,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::log::LevelFilter;

use crate::{
    schema::{container_ext, MEDIA_DENSITY_ENUM, MEDIA_FORMAT_ENUM},
    validate::{validate, DynamicEnums},
};

#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct EnumValue {
    pub id: i32,
    pub value: String,
    pub position: i32,
    pub readonly: bool,
}

/// Media fields of a container as external consumers see them, with enum
/// ids translated to their values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerMedia {
    pub media_format: Option<String>,
    pub media_density: Option<String>,
    pub media_label_transcription: Option<String>,
    pub media_manufacturer: Option<String>,
    pub media_serial_number: Option<String>,
}

pub struct Db {
    dc: DatabaseConnection,
}

impl Db {
    /// Connects to `DATABASE_URL` and brings the schema up to date.
    pub async fn new() -> Result<Self> {
        let db_url = std::env::var("DATABASE_URL")?;
        Self::connect(&db_url).await
    }

    pub async fn connect(db_url: &str) -> Result<Self> {
        Self::connect_with(ConnectOptions::new(db_url)).await
    }

    pub async fn connect_with(conn_options: ConnectOptions) -> Result<Self> {
        let db = Self::open(conn_options).await?;
        db.migrate().await?;
        Ok(db)
    }

    /// Connects without touching the schema.
    pub async fn open(mut conn_options: ConnectOptions) -> Result<Self> {
        conn_options.sqlx_logging_level(LevelFilter::Debug);
        conn_options.sqlx_logging(true);

        let dc = Database::connect(conn_options).await?;
        Ok(Self { dc })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.dc
    }

    pub async fn migrate(&self) -> Result<()> {
        let pending = Migrator::get_pending_migrations(&self.dc).await?;
        for migration in &pending {
            tracing::info!(migration = migration.name(), "applying migration");
        }
        Migrator::up(&self.dc, None).await?;
        Ok(())
    }

    /// Migration names paired with their status, oldest first.
    pub async fn migration_status(&self) -> Result<Vec<(String, String)>> {
        let status = Migrator::get_migration_with_status(&self.dc)
            .await?
            .into_iter()
            .map(|m| (m.name().to_owned(), m.status().to_string()))
            .collect();
        Ok(status)
    }

    pub async fn ensure_migrated(&self) -> Result<()> {
        let pending = Migrator::get_pending_migrations(&self.dc).await?;
        if !pending.is_empty() {
            bail!(
                "{} migrations have not been applied, run `migrate` first",
                pending.len()
            );
        }
        Ok(())
    }

    pub async fn enum_values(&self, name: &str) -> Result<Vec<EnumValue>> {
        ensure_known_enum(name)?;

        let query = Query::select()
            .columns([
                EditableEnum::Id,
                EditableEnum::Value,
                EditableEnum::Position,
                EditableEnum::Readonly,
            ])
            .from(Alias::new(name))
            .order_by(EditableEnum::Position, Order::Asc)
            .order_by(EditableEnum::Id, Order::Asc)
            .to_owned();
        let backend = self.dc.get_database_backend();
        let values = EnumValue::find_by_statement(backend.build(&query))
            .all(&self.dc)
            .await?;
        Ok(values)
    }

    pub async fn resolve_enum_value(&self, name: &str, value: &str) -> Result<Option<i32>> {
        ensure_known_enum(name)?;

        let query = Query::select()
            .column(EditableEnum::Id)
            .from(Alias::new(name))
            .and_where(Expr::col(EditableEnum::Value).eq(value))
            .to_owned();
        let backend = self.dc.get_database_backend();
        let id = match self.dc.query_one(backend.build(&query)).await? {
            Some(row) => Some(row.try_get::<i32>("", "id")?),
            None => None,
        };
        Ok(id)
    }

    pub async fn dynamic_enums(&self, schema: &crate::schema::Schema) -> Result<DynamicEnums> {
        let mut enums = DynamicEnums::default();
        for table in schema.dynamic_enums() {
            let values = self
                .enum_values(table)
                .await?
                .into_iter()
                .map(|v| v.value)
                .collect();
            enums.insert(table, values);
        }
        Ok(enums)
    }

    /// Appends `value` after the current last position and returns its id.
    pub async fn add_enum_value(&self, name: &str, value: &str) -> Result<i32> {
        if self.resolve_enum_value(name, value).await?.is_some() {
            bail!("'{value}' already exists in {name}");
        }

        let position = self
            .enum_values(name)
            .await?
            .iter()
            .map(|v| v.position + 1)
            .max()
            .unwrap_or(0);

        let insert = Query::insert()
            .into_table(Alias::new(name))
            .columns([EditableEnum::Value, EditableEnum::Position])
            .values_panic([value.into(), position.into()])
            .to_owned();
        let backend = self.dc.get_database_backend();
        self.dc.execute(backend.build(&insert)).await?;

        tracing::info!(enum_table = name, value, position, "added enum value");
        self.resolve_enum_value(name, value)
            .await?
            .context("enum value vanished after insert")
    }

    /// Deletes an editable value. Values still referenced by a container are
    /// refused by the foreign key.
    pub async fn remove_enum_value(&self, name: &str, value: &str) -> Result<()> {
        let Some(existing) = self
            .enum_values(name)
            .await?
            .into_iter()
            .find(|v| v.value == value)
        else {
            bail!("'{value}' is not a value of {name}");
        };
        if existing.readonly {
            bail!("'{value}' is read-only in {name}");
        }

        let delete = Query::delete()
            .from_table(Alias::new(name))
            .and_where(Expr::col(EditableEnum::Id).eq(existing.id))
            .to_owned();
        let backend = self.dc.get_database_backend();
        self.dc
            .execute(backend.build(&delete))
            .await
            .with_context(|| format!("can't remove '{value}' from {name}"))?;

        tracing::info!(enum_table = name, value, "removed enum value");
        Ok(())
    }

    /// Read-only values stay selectable but can't be removed.
    pub async fn set_enum_readonly(&self, name: &str, value: &str, readonly: bool) -> Result<()> {
        let Some(id) = self.resolve_enum_value(name, value).await? else {
            bail!("'{value}' is not a value of {name}");
        };

        let update = Query::update()
            .table(Alias::new(name))
            .value(EditableEnum::Readonly, readonly)
            .and_where(Expr::col(EditableEnum::Id).eq(id))
            .to_owned();
        let backend = self.dc.get_database_backend();
        self.dc.execute(backend.build(&update)).await?;

        tracing::info!(enum_table = name, value, readonly, "changed enum value lock");
        Ok(())
    }

    pub async fn create_container(
        &self,
        indicator: String,
        container_type: Option<String>,
    ) -> Result<i32> {
        let container = container::ActiveModel {
            indicator: ActiveValue::Set(indicator),
            container_type: ActiveValue::Set(container_type),
            ..Default::default()
        };
        let res = Container::insert(container).exec(&self.dc).await?;
        Ok(res.last_insert_id)
    }

    /// Checks `record` against the container extension schema and the enum
    /// values currently in the database.
    pub async fn check_record(&self, record: &Value) -> Result<()> {
        let schema = container_ext();
        let enums = self.dynamic_enums(&schema).await?;
        validate(&schema, record, &enums)?;
        Ok(())
    }

    pub async fn check_record_file(&self, path: &Path) -> Result<()> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("can't read {}", path.display()))?;
        let record: Value = serde_json::from_str(&raw)
            .with_context(|| format!("{} is not valid JSON", path.display()))?;
        self.check_record(&record).await
    }

    /// Validates `record` against the container extension schema and stores
    /// it. All five media fields are replaced; absent ones become NULL.
    pub async fn set_container_media(&self, id: i32, record: &Value) -> Result<()> {
        self.check_record(record).await?;

        let media: ContainerMedia = serde_json::from_value(record.clone())?;
        let media_format_id = self
            .enum_id(MEDIA_FORMAT_ENUM, media.media_format.as_deref())
            .await?;
        let media_density_id = self
            .enum_id(MEDIA_DENSITY_ENUM, media.media_density.as_deref())
            .await?;

        let Some(model) = Container::find_by_id(id).one(&self.dc).await? else {
            bail!("container {id} not found");
        };
        let mut container: container::ActiveModel = model.into();
        container.media_format_id = ActiveValue::Set(media_format_id);
        container.media_density_id = ActiveValue::Set(media_density_id);
        container.media_label_transcription = ActiveValue::Set(media.media_label_transcription);
        container.media_manufacturer = ActiveValue::Set(media.media_manufacturer);
        container.media_serial_number = ActiveValue::Set(media.media_serial_number);
        container.update(&self.dc).await?;
        Ok(())
    }

    pub async fn container_media(&self, id: i32) -> Result<Option<ContainerMedia>> {
        let Some((container, format)) = Container::find_by_id(id)
            .find_also_related(ContainerMediaFormat)
            .one(&self.dc)
            .await?
        else {
            return Ok(None);
        };
        let density = container
            .find_related(ContainerMediaDensity)
            .one(&self.dc)
            .await?;

        Ok(Some(ContainerMedia {
            media_format: format.map(|f| f.value),
            media_density: density.map(|d| d.value),
            media_label_transcription: container.media_label_transcription,
            media_manufacturer: container.media_manufacturer,
            media_serial_number: container.media_serial_number,
        }))
    }

    async fn enum_id(&self, name: &str, value: Option<&str>) -> Result<Option<i32>> {
        let Some(value) = value else {
            return Ok(None);
        };
        let id = self
            .resolve_enum_value(name, value)
            .await?
            .with_context(|| format!("'{value}' is not a value of {name}"))?;
        Ok(Some(id))
    }
}

fn ensure_known_enum(name: &str) -> Result<()> {
    if !container_ext().dynamic_enums().contains(&name) {
        bail!("unknown enumeration {name}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn memory_options() -> ConnectOptions {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1);
        options
    }

    async fn memory_db() -> Db {
        Db::connect_with(memory_options()).await.unwrap()
    }

    #[tokio::test]
    async fn connect_applies_every_migration() {
        let db = memory_db().await;
        assert!(db.ensure_migrated().await.is_ok());
        let status = db.migration_status().await.unwrap();
        assert_eq!(status.len(), 2);
        assert!(status.iter().all(|(_, s)| s == "Applied"));
    }

    #[tokio::test]
    async fn open_leaves_schema_alone() {
        let db = Db::open(memory_options()).await.unwrap();
        assert!(db.ensure_migrated().await.is_err());

        db.migrate().await.unwrap();
        assert!(db.ensure_migrated().await.is_ok());
    }

    #[tokio::test]
    async fn locked_value_cannot_be_removed() {
        let db = memory_db().await;
        db.set_enum_readonly(MEDIA_DENSITY_ENUM, "quad", true)
            .await
            .unwrap();

        let values = db.enum_values(MEDIA_DENSITY_ENUM).await.unwrap();
        let quad = values.iter().find(|v| v.value == "quad").unwrap();
        assert!(quad.readonly);

        let err = db
            .remove_enum_value(MEDIA_DENSITY_ENUM, "quad")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("read-only"));

        db.set_enum_readonly(MEDIA_DENSITY_ENUM, "quad", false)
            .await
            .unwrap();
        db.remove_enum_value(MEDIA_DENSITY_ENUM, "quad").await.unwrap();
        assert!(db
            .set_enum_readonly(MEDIA_DENSITY_ENUM, "quad", true)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn enum_values_are_ordered_by_position() {
        let db = memory_db().await;
        let values = db.enum_values(MEDIA_DENSITY_ENUM).await.unwrap();
        let names: Vec<_> = values.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(names, ["single", "double", "quad", "high"]);
        assert_eq!(values[3].position, 3);
        assert!(values.iter().all(|v| !v.readonly));
    }

    #[tokio::test]
    async fn unknown_enum_is_refused() {
        let db = memory_db().await;
        assert!(db.enum_values("container").await.is_err());
    }

    #[tokio::test]
    async fn added_value_goes_last() {
        let db = memory_db().await;
        let id = db.add_enum_value(MEDIA_FORMAT_ENUM, "lto_tape").await.unwrap();

        let values = db.enum_values(MEDIA_FORMAT_ENUM).await.unwrap();
        let last = values.last().unwrap();
        assert_eq!((last.id, last.value.as_str(), last.position), (id, "lto_tape", 12));

        assert!(db.add_enum_value(MEDIA_FORMAT_ENUM, "lto_tape").await.is_err());
    }

    #[tokio::test]
    async fn referenced_value_cannot_be_removed() {
        let db = memory_db().await;
        let id = db.create_container("Box 1".into(), None).await.unwrap();
        db.set_container_media(id, &json!({"media_format": "zip_disk"}))
            .await
            .unwrap();

        assert!(db.remove_enum_value(MEDIA_FORMAT_ENUM, "zip_disk").await.is_err());
        db.remove_enum_value(MEDIA_FORMAT_ENUM, "jaz_cartridge")
            .await
            .unwrap();
        assert_eq!(
            db.resolve_enum_value(MEDIA_FORMAT_ENUM, "jaz_cartridge")
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn media_round_trips_through_enum_ids() {
        let db = memory_db().await;
        let id = db
            .create_container("Box 2".into(), Some("box".into()))
            .await
            .unwrap();
        db.set_container_media(
            id,
            &json!({
                "media_format": "cd-r",
                "media_density": "high",
                "media_manufacturer": "Verbatim",
            }),
        )
        .await
        .unwrap();

        let stored = Container::find_by_id(id).one(db.connection()).await.unwrap().unwrap();
        assert_eq!(
            stored.media_format_id,
            db.resolve_enum_value(MEDIA_FORMAT_ENUM, "cd-r").await.unwrap()
        );

        let media = db.container_media(id).await.unwrap().unwrap();
        assert_eq!(
            media,
            ContainerMedia {
                media_format: Some("cd-r".into()),
                media_density: Some("high".into()),
                media_manufacturer: Some("Verbatim".into()),
                ..Default::default()
            }
        );
        assert_eq!(db.container_media(id + 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalid_media_leaves_container_untouched() {
        let db = memory_db().await;
        let id = db.create_container("Box 3".into(), None).await.unwrap();
        let err = db
            .set_container_media(id, &json!({"media_density": "octal"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("media_density"));
        assert_eq!(
            db.container_media(id).await.unwrap(),
            Some(ContainerMedia::default())
        );
    }
}
