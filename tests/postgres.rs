//! PostgreSQL round trips. Ignored by default; run with `TEST_DATABASE_URL=... cargo test -- --ignored`.

use entity_graph::model::{ComponentType, NewComponent, NewUser, User, UserPatch};
use entity_graph::store::Criteria;
use entity_graph::{build_schema, ensure_tables, AppError, PgStore, Repository, Store};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

async fn store() -> (PgStore, String) {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect to TEST_DATABASE_URL");
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).expect("clock").subsec_nanos();
    let schema = format!("eg_test_{}_{}", std::process::id(), nanos);
    ensure_tables(&pool, &schema).await.expect("ddl");
    (PgStore::new(pool, schema.clone()), schema)
}

async fn drop_schema(store: &PgStore, schema: &str) {
    let _ = sqlx::query(&format!("DROP SCHEMA \"{}\" CASCADE", schema))
        .execute(store.pool())
        .await;
}

#[tokio::test]
#[ignore = "needs TEST_DATABASE_URL"]
async fn repository_round_trip() {
    let (pg, schema) = store().await;
    let store: Arc<dyn Store> = Arc::new(pg.clone());
    let users = Repository::<User>::new(store.clone());

    let ada = users.insert(&NewUser { name: "ada".into() }).await.unwrap();
    let renamed = users
        .update(ada.id, &UserPatch { name: Some("lovelace".into()) })
        .await
        .unwrap();
    assert_eq!(renamed.name, "lovelace");
    let missing = users.update(ada.id + 1000, &UserPatch { name: Some("x".into()) }).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let components = Repository::<entity_graph::model::Component>::new(store.clone());
    let dangling = components
        .insert_many(&[
            NewComponent { user_id: ada.id, index: 0, kind: ComponentType::Code, text: "ok".into() },
            NewComponent { user_id: ada.id + 1000, index: 1, kind: ComponentType::Code, text: "bad".into() },
        ])
        .await;
    assert!(matches!(dangling, Err(AppError::Conflict(_))));
    let stored = components.find_many(&Criteria::new(), None, &[]).await.unwrap();
    assert!(stored.is_empty(), "failed batch must not leave rows behind");

    assert_eq!(users.delete(&Criteria::new().eq("id", ada.id)).await.unwrap(), 1);
    assert_eq!(users.delete(&Criteria::new().eq("id", ada.id)).await.unwrap(), 0);
    drop_schema(&pg, &schema).await;
}

#[tokio::test]
#[ignore = "needs TEST_DATABASE_URL"]
async fn schema_against_postgres() {
    let (pg, schema_name) = store().await;
    let schema = build_schema(Arc::new(pg.clone()));
    let run = |q: String| {
        let schema = schema.clone();
        async move { schema.execute(q).await.data.into_json().unwrap() }
    };
    assert_eq!(run(r#"mutation { createUser(name: "ada") }"#.into()).await, json!({"createUser": true}));
    let users = run("{ users { id } }".into()).await;
    let id = users["users"][0]["id"].as_i64().unwrap();
    run(format!(
        r#"mutation {{ createComponent(userId: {}, components: [{{index: 0, type: "quote", text: "q"}}]) }}"#,
        id
    ))
    .await;
    run(format!(r#"mutation {{ createPost(userId: {}, text: "hello") }}"#, id)).await;
    let found = run(format!("{{ findUser(id: {}) {{ posts {{ text }} components {{ type }} }} }}", id)).await;
    assert_eq!(
        found["findUser"],
        json!({"posts": [{"text": "hello"}], "components": [{"type": "quote"}]})
    );
    run(format!("mutation {{ deleteUser(id: {}) }}", id)).await;
    let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM \"{}\".\"posts\"", schema_name))
        .fetch_one(pg.pool())
        .await
        .unwrap();
    assert_eq!(count.0, 0);
    drop_schema(&pg, &schema_name).await;
}
