use std::io::Write;

use media_container::{
    db::{ContainerMedia, Db},
    schema::{container_ext, MEDIA_FORMAT_ENUM, MEDIA_LABEL_TRANSCRIPTION_MAX_LENGTH},
    validate::{validate, FieldError, ValidationErrors},
};
use sea_orm::ConnectOptions;
use serde_json::json;
use tempfile::NamedTempFile;

async fn memory_db() -> Db {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    Db::connect_with(options).await.unwrap()
}

#[tokio::test]
async fn transcription_limit_is_enforced_on_save() {
    let db = memory_db().await;
    let id = db.create_container("Box 1".into(), None).await.unwrap();

    let at_limit = "a".repeat(MEDIA_LABEL_TRANSCRIPTION_MAX_LENGTH);
    db.set_container_media(id, &json!({"media_label_transcription": at_limit}))
        .await
        .unwrap();

    let over = "a".repeat(MEDIA_LABEL_TRANSCRIPTION_MAX_LENGTH + 1);
    assert!(db
        .set_container_media(id, &json!({"media_label_transcription": over}))
        .await
        .is_err());

    let media = db.container_media(id).await.unwrap().unwrap();
    assert_eq!(
        media.media_label_transcription.map(|t| t.len()),
        Some(MEDIA_LABEL_TRANSCRIPTION_MAX_LENGTH)
    );
}

#[tokio::test]
async fn enum_fields_follow_live_values() {
    let db = memory_db().await;
    let schema = container_ext();
    let record = json!({"media_format": "lto_tape"});

    let enums = db.dynamic_enums(&schema).await.unwrap();
    let err = validate(&schema, &record, &enums).unwrap_err();
    assert!(matches!(err.errors(), [FieldError::NotInEnum { .. }]));

    db.add_enum_value(MEDIA_FORMAT_ENUM, "lto_tape").await.unwrap();
    let enums = db.dynamic_enums(&schema).await.unwrap();
    assert!(validate(&schema, &record, &enums).is_ok());

    let id = db.create_container("Box 2".into(), None).await.unwrap();
    db.set_container_media(id, &record).await.unwrap();
    assert_eq!(
        db.container_media(id).await.unwrap(),
        Some(ContainerMedia {
            media_format: Some("lto_tape".into()),
            ..Default::default()
        })
    );
}

#[tokio::test]
async fn saving_replaces_every_media_field() {
    let db = memory_db().await;
    let id = db.create_container("Box 3".into(), None).await.unwrap();
    db.set_container_media(
        id,
        &json!({"media_density": "quad", "media_serial_number": "A-1"}),
    )
    .await
    .unwrap();
    db.set_container_media(id, &json!({"media_manufacturer": "Iomega"}))
        .await
        .unwrap();

    assert_eq!(
        db.container_media(id).await.unwrap(),
        Some(ContainerMedia {
            media_manufacturer: Some("Iomega".into()),
            ..Default::default()
        })
    );
}

#[tokio::test]
async fn unknown_container_is_an_error() {
    let db = memory_db().await;
    assert!(db
        .set_container_media(42, &json!({"media_format": "cd"}))
        .await
        .is_err());
}

fn record_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn record_file_is_checked_against_live_enums() {
    let db = memory_db().await;

    let valid = record_file(r#"{"media_format": "dvd", "media_density": "single"}"#);
    db.check_record_file(valid.path()).await.unwrap();

    let invalid = record_file(r#"{"media_format": "betamax", "media_serial_number": 7}"#);
    let err = db.check_record_file(invalid.path()).await.unwrap_err();
    let errors = err.downcast_ref::<ValidationErrors>().unwrap();
    assert_eq!(errors.errors().len(), 2);
    assert!(matches!(
        errors.errors()[1],
        FieldError::WrongType { ref field } if field == "media_serial_number"
    ));
}

#[tokio::test]
async fn unreadable_record_file_is_an_error() {
    let db = memory_db().await;

    let garbage = record_file("media_format = dvd");
    let err = db.check_record_file(garbage.path()).await.unwrap_err();
    assert!(err.downcast_ref::<ValidationErrors>().is_none());
    assert!(err.to_string().contains("not valid JSON"));

    let missing = garbage.path().with_extension("missing");
    assert!(db.check_record_file(&missing).await.is_err());
}
