mod common;

use async_trait::async_trait;
use common::{people, person_rows, resource, RecordingStorage};
use pg_resource::{
    AppError, Conditions, Cursor, ListRequest, Payload, ResourceDefinition, ResourceHooks, Row,
    StorageError,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ── List ─────────────────────────────────────────────────────────

#[tokio::test]
async fn search_list_returns_all_matches_on_one_page() {
    let storage = RecordingStorage::new();
    storage.push_rows(vec![json!({"count": 6})]);
    storage.push_rows(person_rows(1, 6));
    let people = resource(people(), &storage);

    let envelope = people
        .list(ListRequest::new().search("ann bob").window(0, 10))
        .await
        .unwrap();

    assert_eq!(envelope.data.count, 6);
    assert_eq!(envelope.data.length, 6);
    assert_eq!(envelope.data.next, None);
    assert_eq!(envelope.data.prev, None);
    assert_eq!(envelope.index.len(), 6);

    let statements = storage.statements();
    assert_eq!(statements.len(), 2);
    assert_eq!(
        statements[0].0,
        r#"SELECT count(1) AS count FROM "people" WHERE ("name"::text ILIKE $1 OR "name"::text ILIKE $2)"#
    );
    assert_eq!(statements[0].1, vec![json!("%ann%"), json!("%bob%")]);
    assert_eq!(
        statements[1].0,
        r#"SELECT * FROM "people" WHERE ("name"::text ILIKE $1 OR "name"::text ILIKE $2) ORDER BY "id" LIMIT 10"#
    );
    assert_eq!(statements[1].1, statements[0].1);
}

#[tokio::test]
async fn last_page_links_back_only() {
    let storage = RecordingStorage::new();
    storage.push_rows(vec![json!({"count": 25})]);
    storage.push_rows(person_rows(21, 5));
    let people = resource(people(), &storage);

    let envelope = people.list(ListRequest::new().window(20, 10)).await.unwrap();

    assert_eq!(envelope.data.next, None);
    assert_eq!(
        envelope.data.prev.as_deref(),
        Some("http://localhost:8000/people?offset=10&limit=10")
    );
    assert_eq!(envelope.data.length, 5);
    assert_eq!(envelope.self_url, "http://localhost:8000/people?offset=20&limit=10");
    assert!(storage.statements()[1].0.ends_with(r#"ORDER BY "id" LIMIT 10 OFFSET 20"#));
}

#[tokio::test]
async fn next_link_preserves_filters_and_search() {
    let storage = RecordingStorage::new();
    storage.push_rows(vec![json!({"count": 30})]);
    storage.push_rows(person_rows(1, 10));
    let people = resource(people(), &storage);

    let request = ListRequest::new()
        .conditions(Conditions::new().with("email", "a@b.io"))
        .search("ann")
        .window(0, 10);
    let envelope = people.list(request).await.unwrap();

    assert_eq!(
        envelope.data.next.as_deref(),
        Some("http://localhost:8000/people?email=a%40b.io&search=ann&offset=10&limit=10")
    );
    let (sql, params) = &storage.statements()[0];
    assert_eq!(
        sql,
        r#"SELECT count(1) AS count FROM "people" WHERE "email" = $1 AND ("name"::text ILIKE $2)"#
    );
    assert_eq!(params, &vec![json!("a@b.io"), json!("%ann%")]);
}

#[tokio::test]
async fn empty_table_is_an_empty_list_not_an_error() {
    let storage = RecordingStorage::new();
    storage.push_rows(vec![json!({"count": 0})]);
    let people = resource(people(), &storage);

    let envelope = people.list(ListRequest::new()).await.unwrap();

    assert_eq!(envelope.data.count, 0);
    assert_eq!(envelope.data.length, 0);
    assert!(envelope.index.is_empty());
    assert_eq!(storage.statements()[0].0, r#"SELECT count(1) AS count FROM "people""#);
}

#[tokio::test]
async fn default_window_comes_from_settings_then_resource() {
    let storage = RecordingStorage::new();
    storage.push_rows(vec![json!({"count": 0})]);
    let envelope = resource(people(), &storage).list(ListRequest::new()).await.unwrap();
    assert_eq!((envelope.data.offset, envelope.data.limit), (0, 20));

    let storage = RecordingStorage::new();
    storage.push_rows(vec![json!({"count": 0})]);
    let def = people().page_size(5).max_page_size(50);
    let people = resource(def, &storage);
    let envelope = people.list(ListRequest::new()).await.unwrap();
    assert_eq!(envelope.data.limit, 5);

    storage.push_rows(vec![json!({"count": 0})]);
    let envelope = people.list(ListRequest::new().window(0, 500)).await.unwrap();
    assert_eq!(envelope.data.limit, 50);
}

#[tokio::test]
async fn unlimited_list_has_no_limit_clause_or_links() {
    let storage = RecordingStorage::new();
    storage.push_rows(vec![json!({"count": 40})]);
    storage.push_rows(person_rows(1, 40));
    let people = resource(people(), &storage);

    let envelope = people.list(ListRequest::new().window(0, 0)).await.unwrap();

    assert_eq!(envelope.data.next, None);
    assert_eq!(envelope.data.prev, None);
    assert_eq!(envelope.data.length, 40);
    assert!(storage.statements()[1].0.ends_with(r#"ORDER BY "id""#));
}

#[tokio::test]
async fn list_uses_one_cursor_and_releases_it() {
    let storage = RecordingStorage::new();
    storage.push_rows(vec![json!({"count": 1})]);
    storage.push_rows(person_rows(1, 1));
    resource(people(), &storage).list(ListRequest::new()).await.unwrap();
    assert_eq!(storage.acquired(), 1);
    assert_eq!(storage.released(), 1);
}

#[tokio::test]
async fn list_storage_failure_releases_cursor() {
    let storage = RecordingStorage::new();
    storage.push_error(StorageError::Decode("connection reset".into()));
    let err = resource(people(), &storage).list(ListRequest::new()).await.unwrap_err();
    assert!(matches!(err, AppError::Storage(_)));
    assert_eq!(storage.released(), storage.acquired());
}

// ── Retrieve ─────────────────────────────────────────────────────

#[tokio::test]
async fn retrieve_missing_row_is_not_found() {
    let storage = RecordingStorage::new();
    let err = resource(people(), &storage).retrieve("42").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(storage.released(), 1);
}

#[tokio::test]
async fn retrieve_returns_row_unchanged_with_default_hooks() {
    let storage = RecordingStorage::new();
    storage.push_rows(vec![json!({"id": 42, "name": "Ann", "email": null})]);

    let obj = resource(people(), &storage).retrieve("42").await.unwrap();

    assert_eq!(obj, json!({"id": 42, "name": "Ann", "email": null}));
    let (sql, params) = &storage.statements()[0];
    assert_eq!(sql, r#"SELECT * FROM "people" WHERE "id" = $1::bigint"#);
    assert_eq!(params, &vec![json!(42)]);
}

#[tokio::test]
async fn retrieve_rejects_malformed_id_before_storage() {
    let storage = RecordingStorage::new();
    let err = resource(people(), &storage).retrieve("abc").await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(storage.acquired(), 0);
}

#[tokio::test]
async fn retrieve_text_ids_bind_as_strings() {
    let storage = RecordingStorage::new();
    storage.push_rows(vec![json!({"slug": "rust"})]);
    let def = ResourceDefinition::new("tags").id_column("slug", "text");
    resource(def, &storage).retrieve("rust").await.unwrap();
    let (sql, params) = &storage.statements()[0];
    assert_eq!(sql, r#"SELECT * FROM "tags" WHERE "slug" = $1::text"#);
    assert_eq!(params, &vec![json!("rust")]);
}

// ── Create ───────────────────────────────────────────────────────

#[tokio::test]
async fn create_with_disallowed_field_never_reaches_storage() {
    let storage = RecordingStorage::new();
    let err = resource(people(), &storage)
        .create(json!({"name": "Ann", "is_admin": true}))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(ref m) if m == "Field 'is_admin' is not allowed"));
    assert_eq!(storage.acquired(), 0);
    assert!(storage.statements().is_empty());
}

#[tokio::test]
async fn create_missing_required_field_inserts_nothing() {
    let storage = RecordingStorage::new();
    let err = resource(people(), &storage)
        .create(json!({"email": "x@y.com"}))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(ref m) if m == "Field 'name' is required"));
    assert!(storage.statements().is_empty());
}

#[tokio::test]
async fn create_returns_generated_id_and_location() {
    let storage = RecordingStorage::new();
    storage.push_rows(vec![json!({"id": 26})]);

    let created = resource(people(), &storage)
        .create(json!({"name": "Ann", "email": "ann@x.io"}))
        .await
        .unwrap();

    assert_eq!(created.id, json!(26));
    assert_eq!(created.location, "http://localhost:8000/people/26");
    let (sql, params) = &storage.statements()[0];
    assert_eq!(
        sql,
        r#"INSERT INTO "people" ("name", "email") VALUES ($1, $2) RETURNING "id""#
    );
    assert_eq!(params, &vec![json!("Ann"), json!("ann@x.io")]);
    assert_eq!(storage.released(), 1);
}

#[tokio::test]
async fn create_constraint_violation_is_conflict() {
    let storage = RecordingStorage::new();
    storage.push_error(StorageError::Constraint(
        "duplicate key value violates unique constraint \"people_email_key\"".into(),
    ));

    let err = resource(people(), &storage)
        .create(json!({"name": "Ann", "email": "ann@x.io"}))
        .await
        .unwrap_err();

    match err {
        AppError::Conflict(m) => assert!(m.contains("people_email_key")),
        other => panic!("expected conflict, got {:?}", other),
    }
    assert_eq!(storage.released(), 1);
}

#[tokio::test]
async fn create_other_storage_failure_is_not_conflict() {
    let storage = RecordingStorage::new();
    storage.push_error(StorageError::Decode("server closed the connection".into()));
    let err = resource(people(), &storage)
        .create(json!({"name": "Ann"}))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Storage(_)));
}

#[tokio::test]
async fn create_without_returned_row_is_storage_error() {
    let storage = RecordingStorage::new();
    let err = resource(people(), &storage)
        .create(json!({"name": "Ann"}))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Storage(StorageError::Decode(_))));
}

// ── Update ───────────────────────────────────────────────────────

#[tokio::test]
async fn update_sets_exactly_the_payload_fields() {
    let storage = RecordingStorage::new();
    resource(people(), &storage)
        .update("7", json!({"email": "new@x.io"}))
        .await
        .unwrap();
    let (sql, params) = &storage.statements()[0];
    assert_eq!(sql, r#"UPDATE "people" SET "email" = $1 WHERE "id" = $2::bigint"#);
    assert_eq!(params, &vec![json!("new@x.io"), json!(7)]);
}

#[tokio::test]
async fn update_rejects_disallowed_and_empty_payloads() {
    let storage = RecordingStorage::new();
    let people = resource(people(), &storage);
    assert!(matches!(
        people.update("7", json!({"id": 8})).await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(people.update("7", json!({})).await, Err(AppError::Validation(_))));
    assert!(matches!(people.update("7", json!("name")).await, Err(AppError::BadRequest(_))));
    assert_eq!(storage.acquired(), 0);
}

#[tokio::test]
async fn update_constraint_violation_is_conflict() {
    let storage = RecordingStorage::new();
    storage.push_error(StorageError::Constraint("null value in column \"name\"".into()));
    let err = resource(people(), &storage)
        .update("7", json!({"name": null}))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(storage.released(), 1);
}

// ── Hooks ────────────────────────────────────────────────────────

#[derive(Default)]
struct Auditing {
    before: Arc<AtomicUsize>,
    after: Arc<AtomicUsize>,
}

#[async_trait]
impl ResourceHooks for Auditing {
    fn serialize(&self, row: Row) -> Value {
        json!({ "name": row.get("name").cloned().unwrap_or(Value::Null) })
    }

    async fn prepare_insert(&self, mut payload: Payload) -> Result<Payload, AppError> {
        if let Some(Value::String(name)) = payload.get("name").cloned() {
            payload.insert("name".into(), Value::String(name.trim().to_string()));
        }
        payload.insert("created_by".into(), json!("system"));
        Ok(payload)
    }

    async fn before_insert(&self, _cursor: &mut dyn Cursor) -> Result<(), AppError> {
        self.before.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn after_insert(&self, cursor: &mut dyn Cursor, id: &Value) -> Result<(), AppError> {
        cursor
            .execute("INSERT INTO audit (resource_id) VALUES ($1)", &[id.clone()])
            .await?;
        self.after.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn insert_hooks_bracket_the_statement_on_one_cursor() {
    let storage = RecordingStorage::new();
    storage.push_rows(vec![json!({"id": 3})]);
    let hooks = Auditing::default();
    let (before, after) = (hooks.before.clone(), hooks.after.clone());
    let people = resource(people(), &storage).with_hooks(hooks);

    people.create(json!({"name": "  Ann "})).await.unwrap();

    assert_eq!(before.load(Ordering::SeqCst), 1);
    assert_eq!(after.load(Ordering::SeqCst), 1);
    let statements = storage.statements();
    assert_eq!(
        statements[0].0,
        r#"INSERT INTO "people" ("name", "created_by") VALUES ($1, $2) RETURNING "id""#
    );
    assert_eq!(statements[0].1, vec![json!("Ann"), json!("system")]);
    assert_eq!(statements[1].1, vec![json!(3)]);
    assert_eq!(storage.acquired(), 1);
}

#[tokio::test]
async fn serialize_hook_shapes_list_items() {
    let storage = RecordingStorage::new();
    storage.push_rows(vec![json!({"count": 2})]);
    storage.push_rows(person_rows(1, 2));
    let people = resource(people(), &storage).with_hooks(Auditing::default());

    let envelope = people.list(ListRequest::new()).await.unwrap();

    assert_eq!(
        envelope.index,
        vec![json!({"name": "person 1"}), json!({"name": "person 2"})]
    );
}

struct Rejecting;

#[async_trait]
impl ResourceHooks for Rejecting {
    async fn prepare_update(&self, _id: &Value, _payload: Payload) -> Result<Payload, AppError> {
        Err(AppError::Validation("read only".into()))
    }
}

#[tokio::test]
async fn prepare_hook_can_reject_before_storage() {
    let storage = RecordingStorage::new();
    let err = resource(people(), &storage)
        .with_hooks(Rejecting)
        .update("1", json!({"name": "x"}))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "read only");
    assert_eq!(storage.acquired(), 0);
}

struct UpdateAudit;

#[async_trait]
impl ResourceHooks for UpdateAudit {
    async fn before_update(&self, cursor: &mut dyn Cursor, id: &Value) -> Result<(), AppError> {
        cursor
            .execute("SELECT pg_advisory_xact_lock($1)", &[id.clone()])
            .await?;
        Ok(())
    }

    async fn after_update(&self, cursor: &mut dyn Cursor, id: &Value) -> Result<(), AppError> {
        cursor
            .execute("INSERT INTO audit (resource_id) VALUES ($1)", &[id.clone()])
            .await?;
        Ok(())
    }
}

#[tokio::test]
async fn update_hooks_bracket_the_statement_on_one_cursor() {
    let storage = RecordingStorage::new();
    resource(people(), &storage)
        .with_hooks(UpdateAudit)
        .update("7", json!({"name": "Bo"}))
        .await
        .unwrap();

    let sql: Vec<String> = storage.statements().into_iter().map(|(sql, _)| sql).collect();
    assert_eq!(
        sql,
        vec![
            "SELECT pg_advisory_xact_lock($1)".to_string(),
            r#"UPDATE "people" SET "name" = $1 WHERE "id" = $2::bigint"#.to_string(),
            "INSERT INTO audit (resource_id) VALUES ($1)".to_string(),
        ]
    );
    assert_eq!(storage.statements()[2].1, vec![json!(7)]);
    assert_eq!(storage.acquired(), 1);
    assert_eq!(storage.released(), 1);
}

#[tokio::test]
async fn failed_update_skips_after_hook() {
    let storage = RecordingStorage::new();
    storage.push_rows(vec![]);
    storage.push_error(StorageError::Constraint("check violation".into()));
    let err = resource(people(), &storage)
        .with_hooks(UpdateAudit)
        .update("7", json!({"name": "Bo"}))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(storage.statements().len(), 2);
    assert_eq!(storage.released(), 1);
}

// ── Cancellation ─────────────────────────────────────────────────

#[tokio::test]
async fn abandoned_list_releases_its_cursor() {
    let storage = RecordingStorage::new();
    storage.push_rows(vec![json!({"count": 3})]);
    storage.push_pending();
    let people = resource(people(), &storage);

    let outcome = tokio::time::timeout(
        Duration::from_millis(20),
        people.list(ListRequest::new()),
    )
    .await;

    assert!(outcome.is_err());
    assert_eq!(storage.statements().len(), 2);
    assert_eq!(storage.acquired(), 1);
    assert_eq!(storage.released(), 1);
}

#[tokio::test]
async fn abandoned_create_releases_its_cursor() {
    let storage = RecordingStorage::new();
    storage.push_pending();
    let people = resource(people(), &storage);

    let mut create = Box::pin(people.create(json!({"name": "Ann"})));
    tokio::select! {
        _ = &mut create => panic!("insert should still be pending"),
        _ = tokio::time::sleep(Duration::from_millis(20)) => {}
    }
    assert_eq!(storage.acquired(), 1);
    assert_eq!(storage.released(), 0);

    drop(create);
    assert_eq!(storage.released(), 1);
}

// ── Reserved names ───────────────────────────────────────────────

#[tokio::test]
async fn reserved_names_cannot_be_filter_fields() {
    let storage = RecordingStorage::new();
    let request = ListRequest::new().conditions(Conditions::new().with("limit", 5));
    let err = resource(people(), &storage).list(request).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("'limit'")));
    assert_eq!(storage.acquired(), 0);
}
