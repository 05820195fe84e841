use sea_orm::TransactionTrait;
use tablecrud::{BulkItemKey, CrudError, FilterExpression, OperationOptions};

mod common;
use common::{ArticleCreate, ArticleUpdate, article_service, seed, setup_test_db};

fn no_options() -> OperationOptions<'static> {
    OperationOptions::default()
}

#[tokio::test]
async fn test_mass_create_persists_all_items() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let service = article_service(db);

    let items = (0..3)
        .map(|i| ArticleCreate::new(&format!("bulk-{i}"), &format!("Bulk {i}")))
        .collect();
    let created = service.mass_create(items, &no_options()).await.unwrap();

    assert_eq!(created.len(), 3);
    assert_eq!(created[2].slug, "bulk-2");
    assert_eq!(
        service.count(&FilterExpression::new(), &no_options()).await.unwrap(),
        3
    );
}

#[tokio::test]
async fn test_mass_create_failure_rolls_back_every_item() {
    let db = setup_test_db().await.unwrap();
    let service = article_service(db);

    let items = (0..5)
        .map(|i| {
            let title = if i == 2 { String::new() } else { format!("Item {i}") };
            ArticleCreate::new(&format!("item-{i}"), &title)
        })
        .collect();
    let err = service.mass_create(items, &no_options()).await.unwrap_err();

    match &err {
        CrudError::BulkOperation { message, errors } => {
            assert_eq!(message, "Mass create errors");
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].key, BulkItemKey::Index(2));
            assert!(matches!(errors[0].error, CrudError::ValidationFailed { .. }));
        }
        other => panic!("expected BulkOperation, got {other:?}"),
    }
    assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(
        service.count(&FilterExpression::new(), &no_options()).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_mass_update_with_missing_id_changes_nothing() {
    let db = setup_test_db().await.unwrap();
    let service = article_service(db);
    let rows = seed(&service, &[("a", "A", 1), ("b", "B", 2)]).await;

    let data = ArticleUpdate {
        views: Some(100),
        ..Default::default()
    };
    let err = service
        .mass_update([rows[0].id, 999, rows[1].id], data.clone(), &no_options())
        .await
        .unwrap_err();
    match err {
        CrudError::BulkOperation { errors, .. } => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].key, BulkItemKey::Id(999.into()));
            assert!(matches!(errors[0].error, CrudError::EntityNotFound { .. }));
        }
        other => panic!("expected BulkOperation, got {other:?}"),
    }
    let first = service.find(rows[0].id, &no_options()).await.unwrap().unwrap();
    assert_eq!(first.views, 1);

    let updated = service
        .mass_update(rows.iter().map(|row| row.id), data, &no_options())
        .await
        .unwrap();
    assert!(updated.iter().all(|article| article.views == 100));
}

#[tokio::test]
async fn test_mass_soft_delete_and_restore() {
    let db = setup_test_db().await.unwrap();
    let service = article_service(db);
    let rows = seed(&service, &[("a", "A", 1), ("b", "B", 2), ("c", "C", 3)]).await;
    let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();

    assert!(
        service
            .mass_soft_delete(ids[..2].to_vec(), &no_options())
            .await
            .unwrap()
    );
    assert_eq!(
        service.count(&FilterExpression::new(), &no_options()).await.unwrap(),
        1
    );

    let restored = service.mass_restore(ids[..2].to_vec(), &no_options()).await.unwrap();
    assert_eq!(restored.len(), 2);
    assert!(restored.iter().all(|article| article.deleted_at.is_none()));
    assert_eq!(
        service.count(&FilterExpression::new(), &no_options()).await.unwrap(),
        3
    );
}

#[tokio::test]
async fn test_mass_delete_is_atomic() {
    let db = setup_test_db().await.unwrap();
    let service = article_service(db);
    let rows = seed(&service, &[("a", "A", 1), ("b", "B", 2)]).await;

    let err = service
        .mass_delete([rows[0].id, 12345], &no_options())
        .await
        .unwrap_err();
    assert!(matches!(err, CrudError::BulkOperation { .. }));
    assert!(service.exists(rows[0].id, &no_options()).await.unwrap());

    assert!(
        service
            .mass_delete(rows.iter().map(|row| row.id), &no_options())
            .await
            .unwrap()
    );
    assert_eq!(
        service.count(&FilterExpression::new(), &no_options()).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_mass_create_joins_caller_transaction() {
    let db = setup_test_db().await.unwrap();
    let service = article_service(db);

    let txn = service.connection().begin().await.unwrap();
    let options = OperationOptions::in_transaction(&txn);
    let created = service
        .mass_create(
            vec![ArticleCreate::new("x", "X"), ArticleCreate::new("y", "Y")],
            &options,
        )
        .await
        .unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(
        service.count(&FilterExpression::new(), &options).await.unwrap(),
        2
    );

    // The batch did not commit the caller's transaction
    txn.rollback().await.unwrap();
    assert_eq!(
        service.count(&FilterExpression::new(), &no_options()).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_empty_batches_succeed() {
    let db = setup_test_db().await.unwrap();
    let service = article_service(db);

    assert!(service.mass_create(Vec::new(), &no_options()).await.unwrap().is_empty());
    assert!(service.mass_delete(Vec::<i32>::new(), &no_options()).await.unwrap());
}
