//! In-process store with the same constraint semantics as the PostgreSQL schema:
//! generated keys, NOT NULL, foreign keys and cascading deletes.

use super::{check_row, compare_cells, Criteria, OrderBy, Row, Store, Direction};
use crate::error::AppError;
use crate::model::{all_entities, EntityDef};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Default)]
struct Table {
    last_id: i32,
    rows: BTreeMap<i32, Row>,
}

pub struct MemoryStore {
    entities: Vec<&'static EntityDef>,
    tables: RwLock<HashMap<&'static str, Table>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_entities(all_entities())
    }

    pub fn with_entities(entities: impl IntoIterator<Item = &'static EntityDef>) -> Self {
        let entities: Vec<_> = entities.into_iter().collect();
        let tables = entities.iter().map(|d| (d.table, Table::default())).collect();
        MemoryStore {
            entities,
            tables: RwLock::new(tables),
        }
    }

    fn table<'a>(tables: &'a HashMap<&'static str, Table>, def: &EntityDef) -> Result<&'a Table, AppError> {
        tables
            .get(def.table)
            .ok_or_else(|| AppError::Validation(format!("no table for {}", def.name)))
    }

    /// Every foreign key in `row` must point at an existing parent row.
    fn check_references(
        tables: &HashMap<&'static str, Table>,
        def: &EntityDef,
        row: &Row,
    ) -> Result<(), AppError> {
        for col in def.columns {
            let (Some(parent), Some(v)) = (col.references, row.get(col.name)) else {
                continue;
            };
            if v.is_null() {
                continue;
            }
            let found = v
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .and_then(|id| tables.get(parent).map(|t| t.rows.contains_key(&id)))
                .unwrap_or(false);
            if !found {
                return Err(AppError::Conflict(format!(
                    "{}.{} references missing {} row {}",
                    def.name, col.name, parent, v
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(
        &self,
        def: &'static EntityDef,
        criteria: &Criteria,
        order: &[OrderBy],
    ) -> Result<Vec<Row>, AppError> {
        criteria.check(def)?;
        for o in order {
            if def.column(&o.column).is_none() {
                return Err(AppError::Validation(format!(
                    "unknown column '{}' on {}",
                    o.column, def.name
                )));
            }
        }
        let tables = self.tables.read().await;
        let mut rows: Vec<Row> = Self::table(&tables, def)?
            .rows
            .values()
            .filter(|r| criteria.matches(r))
            .cloned()
            .collect();
        // Rows come out in key order, so a stable sort leaves the pk as the final tiebreak.
        rows.sort_by(|a, b| {
            for o in order {
                let x = a.get(&o.column).unwrap_or(&Value::Null);
                let y = b.get(&o.column).unwrap_or(&Value::Null);
                let ord = match o.direction {
                    Direction::Asc => compare_cells(x, y),
                    Direction::Desc => compare_cells(y, x),
                };
                if ord.is_ne() {
                    return ord;
                }
            }
            std::cmp::Ordering::Equal
        });
        Ok(rows)
    }

    async fn insert(&self, def: &'static EntityDef, rows: &[Row]) -> Result<Vec<Row>, AppError> {
        for row in rows {
            check_row(def, row, false)?;
        }
        let mut tables = self.tables.write().await;
        for row in rows {
            Self::check_references(&tables, def, row)?;
        }
        let table = tables
            .get_mut(def.table)
            .ok_or_else(|| AppError::Validation(format!("no table for {}", def.name)))?;
        i32::try_from(rows.len())
            .ok()
            .and_then(|n| table.last_id.checked_add(n))
            .ok_or_else(|| AppError::Conflict(format!("{} id sequence exhausted", def.table)))?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            table.last_id += 1;
            let id = table.last_id;
            let mut stored = Row::new();
            for col in def.columns {
                let v = if col.name == def.primary_key {
                    Value::from(id)
                } else {
                    row.get(col.name).cloned().unwrap_or(Value::Null)
                };
                stored.insert(col.name.to_string(), v);
            }
            table.rows.insert(id, stored.clone());
            out.push(stored);
        }
        tracing::debug!(table = def.table, rows = out.len(), "memory insert");
        Ok(out)
    }

    async fn update(
        &self,
        def: &'static EntityDef,
        id: i32,
        changes: &Row,
    ) -> Result<Option<Row>, AppError> {
        check_row(def, changes, true)?;
        if changes.is_empty() {
            return Err(AppError::Validation(format!("no columns to update on {}", def.name)));
        }
        let mut tables = self.tables.write().await;
        Self::check_references(&tables, def, changes)?;
        let table = tables
            .get_mut(def.table)
            .ok_or_else(|| AppError::Validation(format!("no table for {}", def.name)))?;
        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        for (k, v) in changes {
            row.insert(k.clone(), v.clone());
        }
        Ok(Some(row.clone()))
    }

    async fn delete(&self, def: &'static EntityDef, criteria: &Criteria) -> Result<u64, AppError> {
        criteria.check(def)?;
        let mut tables = self.tables.write().await;
        let ids: Vec<i32> = Self::table(&tables, def)?
            .rows
            .iter()
            .filter(|(_, r)| criteria.matches(r))
            .map(|(id, _)| *id)
            .collect();
        let removed = ids.len() as u64;

        let mut pending = vec![(def.table, ids)];
        while let Some((table_name, ids)) = pending.pop() {
            if ids.is_empty() {
                continue;
            }
            if let Some(t) = tables.get_mut(table_name) {
                for id in &ids {
                    t.rows.remove(id);
                }
            }
            let parent_keys: Vec<Value> = ids.iter().map(|id| Value::from(*id)).collect();
            for child in &self.entities {
                for col in child.columns.iter().filter(|c| c.references == Some(table_name)) {
                    let Some(t) = tables.get(child.table) else { continue };
                    let cascade = Criteria::new().any_of(col.name, parent_keys.clone());
                    let child_ids: Vec<i32> = t
                        .rows
                        .iter()
                        .filter(|(_, r)| cascade.matches(r))
                        .map(|(id, _)| *id)
                        .collect();
                    pending.push((child.table, child_ids));
                }
            }
        }
        tracing::debug!(table = def.table, removed, "memory delete");
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
