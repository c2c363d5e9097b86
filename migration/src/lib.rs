pub use sea_orm_migration::prelude::*;

pub mod helpers;
mod m20240102_090000_create_container;
mod m20240311_142500_media_container;

pub use m20240102_090000_create_container::Container;
pub use m20240311_142500_media_container::{
    MEDIA_DENSITIES, MEDIA_DENSITY_ENUM, MEDIA_FORMATS, MEDIA_FORMAT_ENUM,
};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240102_090000_create_container::Migration),
            Box::new(m20240311_142500_media_container::Migration),
        ]
    }
}
