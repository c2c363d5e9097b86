use sea_orm_migration::prelude::*;

use crate::helpers::{add_dynamic_enum, add_string_column, add_text_column, create_editable_enum};
use crate::m20240102_090000_create_container::Container;

pub const MEDIA_FORMAT_ENUM: &str = "container_media_format";
pub const MEDIA_DENSITY_ENUM: &str = "container_media_density";

pub const MEDIA_FORMATS: [&str; 12] = [
    "3_5_inch_floppy",
    "5_25_inch_floppy",
    "8_inch_floppy",
    "cd",
    "cd-r",
    "cd-rw",
    "dvd",
    "flash",
    "hard_disk",
    "jaz_cartridge",
    "other",
    "zip_disk",
];

pub const MEDIA_DENSITIES: [&str; 4] = ["single", "double", "quad", "high"];

/// Forward-only: rolling back falls through to the framework's default
/// `down`, which refuses.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_editable_enum(manager, MEDIA_FORMAT_ENUM, &MEDIA_FORMATS).await?;
        create_editable_enum(manager, MEDIA_DENSITY_ENUM, &MEDIA_DENSITIES).await?;

        add_dynamic_enum(
            manager,
            Container::Table,
            Container::MediaFormatId,
            MEDIA_FORMAT_ENUM,
        )
        .await?;
        add_dynamic_enum(
            manager,
            Container::Table,
            Container::MediaDensityId,
            MEDIA_DENSITY_ENUM,
        )
        .await?;
        add_text_column(manager, Container::Table, Container::MediaLabelTranscription).await?;
        add_string_column(manager, Container::Table, Container::MediaManufacturer).await?;
        add_string_column(manager, Container::Table, Container::MediaSerialNumber).await?;

        Ok(())
    }
}
