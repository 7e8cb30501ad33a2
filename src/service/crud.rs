//! Generic typed CRUD over any `Store`, with eager relation loading.

use crate::error::AppError;
use crate::model::{Entity, EntityDef, RelationKind};
use crate::store::{Criteria, OrderBy, Row, Store};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

pub struct Repository<T> {
    store: Arc<dyn Store>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Repository {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Repository {
            store,
            _entity: PhantomData,
        }
    }

    /// All records, ordered by `order` (default primary key ascending).
    pub async fn find_all(&self, order: Option<OrderBy>) -> Result<Vec<T>, AppError> {
        self.find_many(&Criteria::new(), order, &[]).await
    }

    /// Records matching `criteria`, with `include` relations loaded in one query per relation.
    pub async fn find_many(
        &self,
        criteria: &Criteria,
        order: Option<OrderBy>,
        include: &[&str],
    ) -> Result<Vec<T>, AppError> {
        let def = T::def();
        let order: Vec<OrderBy> = order.into_iter().collect();
        let mut rows = self.store.select(def, criteria, &order).await?;
        attach_relations(self.store.as_ref(), def, &mut rows, include).await?;
        rows.into_iter().map(from_row).collect()
    }

    /// First record matching `criteria` (lowest primary key), or `None`.
    pub async fn find_one(&self, criteria: &Criteria, include: &[&str]) -> Result<Option<T>, AppError> {
        let def = T::def();
        let mut rows = self.store.select(def, criteria, &[]).await?;
        rows.truncate(1);
        attach_relations(self.store.as_ref(), def, &mut rows, include).await?;
        rows.into_iter().next().map(from_row).transpose()
    }

    pub async fn find_by_id(&self, id: i32, include: &[&str]) -> Result<Option<T>, AppError> {
        self.find_one(&Criteria::new().eq(T::def().primary_key, id), include)
            .await
    }

    pub async fn insert(&self, new: &T::New) -> Result<T, AppError> {
        let row = to_row(new)?;
        let stored = self.store.insert(T::def(), &[row]).await?;
        stored
            .into_iter()
            .next()
            .map(from_row)
            .ok_or_else(|| AppError::Db(sqlx::Error::RowNotFound))?
    }

    /// Insert every record in one unit of work: all of them or none.
    pub async fn insert_many(&self, news: &[T::New]) -> Result<Vec<T>, AppError> {
        if news.is_empty() {
            return Ok(Vec::new());
        }
        let rows = news.iter().map(to_row).collect::<Result<Vec<_>, _>>()?;
        let stored = self.store.insert(T::def(), &rows).await?;
        stored.into_iter().map(from_row).collect()
    }

    /// Apply a partial update. Fails with `NotFound` when no record has `id`.
    pub async fn update(&self, id: i32, patch: &T::Patch) -> Result<T, AppError> {
        let def = T::def();
        let changes = to_row(patch)?;
        if changes.is_empty() {
            return Err(AppError::Validation(format!("no fields to update on {}", def.name)));
        }
        self.store
            .update(def, id, &changes)
            .await?
            .map(from_row)
            .transpose()?
            .ok_or_else(|| AppError::NotFound(format!("{} {}", def.name, id)))
    }

    /// Delete matching records. Zero matches is not an error.
    pub async fn delete(&self, criteria: &Criteria) -> Result<u64, AppError> {
        self.store.delete(T::def(), criteria).await
    }
}

fn to_row<S: Serialize>(value: &S) -> Result<Row, AppError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::Validation(format!("expected an object, got {}", other))),
    }
}

fn from_row<T: Entity>(row: Row) -> Result<T, AppError> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

/// Load each named relation for all `rows` with a single `IN` query and store it under the relation name.
async fn attach_relations(
    store: &dyn Store,
    def: &'static EntityDef,
    rows: &mut [Row],
    include: &[&str],
) -> Result<(), AppError> {
    for name in include {
        let rel = def.relation(name).ok_or_else(|| {
            AppError::Validation(format!("{} has no relation '{}'", def.name, name))
        })?;
        let target = (rel.target)();
        let keys: Vec<Value> = rows
            .iter()
            .filter_map(|r| r.get(rel.our_key).filter(|v| !v.is_null()).cloned())
            .collect();
        let related = if keys.is_empty() {
            Vec::new()
        } else {
            let order: Vec<OrderBy> = rel.order_by.map(OrderBy::asc).into_iter().collect();
            store
                .select(target, &Criteria::new().any_of(rel.their_key, keys), &order)
                .await?
        };

        let mut by_key: HashMap<String, Vec<Value>> = HashMap::new();
        for r in related {
            let key = r.get(rel.their_key).map(Value::to_string).unwrap_or_default();
            by_key.entry(key).or_default().push(Value::Object(r));
        }
        for row in rows.iter_mut() {
            let key = row.get(rel.our_key).map(Value::to_string).unwrap_or_default();
            let found = by_key.get(&key).cloned().unwrap_or_default();
            let value = match rel.kind {
                RelationKind::OneToMany => Value::Array(found),
                RelationKind::ManyToOne => found.into_iter().next().unwrap_or(Value::Null),
            };
            row.insert(rel.name.to_string(), value);
        }
    }
    Ok(())
}
