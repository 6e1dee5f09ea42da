//! Document store client
//!
//! A key-value store of JSON documents grouped into logical tables. Each
//! table declares a partition key attribute and, optionally, a sort key
//! attribute. Items are addressed by those attribute values.
//!
//! The store is backed by the `documents` SQLite table created in
//! [`crate::db::init`]. One `DocumentStore` is shared by every handler;
//! cloning it only clones the pool handle and the write lock.
//!
//! Every write holds the store's write lock. Updates are read-modify-write
//! and keep the lock for the whole transaction, so concurrent updates of the
//! same item never interleave.

use crate::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// A stored document
pub type Item = Map<String, Value>;

/// Upper bound on items per `batch_write` call
pub const MAX_BATCH_WRITE: usize = 25;

const UPSERT_SQL: &str = r#"
    INSERT INTO documents (table_name, partition_key, sort_key, body)
    VALUES (?, ?, ?, ?)
    ON CONFLICT(table_name, partition_key, sort_key)
    DO UPDATE SET body = excluded.body, updated_at = CURRENT_TIMESTAMP
"#;

// ========================================
// Tables and keys
// ========================================

/// Key schema of a logical table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub partition_key: &'static str,
    pub sort_key: Option<&'static str>,
}

/// Album catalog, keyed by album id
pub const ALBUMS: TableSchema = TableSchema::simple("Albumes", "id");

/// Song catalog, keyed by song id
pub const SONGS: TableSchema = TableSchema::simple("Canciones", "id");

/// Playlists, one partition per user
pub const PLAYLISTS: TableSchema = TableSchema::composite("Playlists", "usuario_id", "playlist_id");

/// Favorite albums, one partition per user
pub const FAVORITE_ALBUMS: TableSchema =
    TableSchema::composite("UserFavoriteAlbums", "usuario_id", "album_id");

impl TableSchema {
    pub const fn simple(name: &'static str, partition_key: &'static str) -> Self {
        Self {
            name,
            partition_key,
            sort_key: None,
        }
    }

    pub const fn composite(
        name: &'static str,
        partition_key: &'static str,
        sort_key: &'static str,
    ) -> Self {
        Self {
            name,
            partition_key,
            sort_key: Some(sort_key),
        }
    }

    fn is_key_attribute(&self, attribute: &str) -> bool {
        attribute == self.partition_key || Some(attribute) == self.sort_key
    }

    /// Extract the key of an item from its key attributes
    pub fn key_of(&self, item: &Item) -> Result<Key> {
        let partition = key_attribute(self, item, self.partition_key)?;
        let sort = match self.sort_key {
            Some(attribute) => Some(key_attribute(self, item, attribute)?),
            None => None,
        };
        Ok(Key { partition, sort })
    }

    /// Reject keys whose shape does not match the schema
    fn check_key(&self, key: &Key) -> Result<()> {
        if key.partition.is_empty() {
            return Err(Error::InvalidInput(format!(
                "{}: empty partition key",
                self.name
            )));
        }
        match (self.sort_key, &key.sort) {
            (Some(attribute), None) => Err(Error::InvalidInput(format!(
                "{}: missing sort key '{}'",
                self.name, attribute
            ))),
            (Some(_), Some(sort)) if sort.is_empty() => Err(Error::InvalidInput(format!(
                "{}: empty sort key",
                self.name
            ))),
            (None, Some(_)) => Err(Error::InvalidInput(format!(
                "{}: table has no sort key",
                self.name
            ))),
            _ => Ok(()),
        }
    }

    /// Item holding only the key attributes
    fn key_item(&self, key: &Key) -> Item {
        let mut item = Item::new();
        item.insert(
            self.partition_key.to_string(),
            Value::String(key.partition.clone()),
        );
        if let (Some(attribute), Some(sort)) = (self.sort_key, &key.sort) {
            item.insert(attribute.to_string(), Value::String(sort.clone()));
        }
        item
    }
}

fn key_attribute(table: &TableSchema, item: &Item, attribute: &str) -> Result<String> {
    match item.get(attribute) {
        Some(Value::String(value)) if !value.is_empty() => Ok(value.clone()),
        Some(_) => Err(Error::InvalidInput(format!(
            "{}: key attribute '{}' must be a non-empty string",
            table.name, attribute
        ))),
        None => Err(Error::InvalidInput(format!(
            "{}: missing key attribute '{}'",
            table.name, attribute
        ))),
    }
}

/// Primary key of an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub partition: String,
    pub sort: Option<String>,
}

impl Key {
    pub fn partition(partition: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: None,
        }
    }

    pub fn composite(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: Some(sort.into()),
        }
    }

    fn sort_value(&self) -> &str {
        self.sort.as_deref().unwrap_or("")
    }
}

// ========================================
// Update expressions
// ========================================

#[derive(Debug, Clone, PartialEq)]
enum UpdateAction {
    Set(Value),
    SetIfNotExists(Value),
}

/// Attribute assignments applied by [`DocumentStore::update`]
///
/// ```
/// use melodia_common::UpdateExpression;
/// use serde_json::json;
///
/// let expr = UpdateExpression::new()
///     .set("canciones", json!([]))
///     .set_if_not_exists("nombre_playlist", "Liked Songs");
/// assert_eq!(expr.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateExpression {
    actions: Vec<(String, UpdateAction)>,
}

impl UpdateExpression {
    pub fn new() -> Self {
        Self::default()
    }

    /// `SET attribute = value`
    pub fn set(mut self, attribute: &str, value: impl Into<Value>) -> Self {
        self.actions
            .push((attribute.to_string(), UpdateAction::Set(value.into())));
        self
    }

    /// `SET attribute = if_not_exists(attribute, value)`
    pub fn set_if_not_exists(mut self, attribute: &str, value: impl Into<Value>) -> Self {
        self.actions.push((
            attribute.to_string(),
            UpdateAction::SetIfNotExists(value.into()),
        ));
        self
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    fn apply(&self, item: &mut Item) {
        for (attribute, action) in &self.actions {
            match action {
                UpdateAction::Set(value) => {
                    item.insert(attribute.clone(), value.clone());
                }
                UpdateAction::SetIfNotExists(value) => {
                    item.entry(attribute.clone()).or_insert_with(|| value.clone());
                }
            }
        }
    }
}

// ========================================
// Store client
// ========================================

/// Shared document store client
#[derive(Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl DocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Every item of a table, ordered by key
    pub async fn scan(&self, table: &TableSchema) -> Result<Vec<Item>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT body FROM documents WHERE table_name = ? ORDER BY partition_key, sort_key",
        )
        .bind(table.name)
        .fetch_all(&self.pool)
        .await?;

        debug!("scan {}: {} items", table.name, rows.len());
        rows.iter().map(|(body,)| parse_body(body)).collect()
    }

    /// Every item of one partition, ordered by sort key
    pub async fn query(&self, table: &TableSchema, partition: &str) -> Result<Vec<Item>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT body FROM documents WHERE table_name = ? AND partition_key = ? ORDER BY sort_key",
        )
        .bind(table.name)
        .bind(partition)
        .fetch_all(&self.pool)
        .await?;

        debug!("query {}[{}]: {} items", table.name, partition, rows.len());
        rows.iter().map(|(body,)| parse_body(body)).collect()
    }

    pub async fn get(&self, table: &TableSchema, key: &Key) -> Result<Option<Item>> {
        table.check_key(key)?;

        let row: Option<(String,)> = sqlx::query_as(
            "SELECT body FROM documents WHERE table_name = ? AND partition_key = ? AND sort_key = ?",
        )
        .bind(table.name)
        .bind(&key.partition)
        .bind(key.sort_value())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(body,)| parse_body(&body)).transpose()
    }

    /// Like [`get`](Self::get), keeping only the named attributes
    pub async fn get_projected(
        &self,
        table: &TableSchema,
        key: &Key,
        attributes: &[&str],
    ) -> Result<Option<Item>> {
        let item = self.get(table, key).await?;
        Ok(item.map(|mut item| {
            item.retain(|name, _| attributes.contains(&name.as_str()));
            item
        }))
    }

    /// Insert or replace an item
    pub async fn put(&self, table: &TableSchema, item: Item) -> Result<()> {
        let key = table.key_of(&item)?;
        let body = serde_json::to_string(&item)?;

        let _guard = self.write_lock.lock().await;
        sqlx::query(UPSERT_SQL)
            .bind(table.name)
            .bind(&key.partition)
            .bind(key.sort_value())
            .bind(body)
            .execute(&self.pool)
            .await?;

        debug!("put {}[{:?}]", table.name, key);
        Ok(())
    }

    /// Delete an item; deleting a missing item is not an error
    pub async fn delete(&self, table: &TableSchema, key: &Key) -> Result<()> {
        table.check_key(key)?;

        let _guard = self.write_lock.lock().await;
        let result = sqlx::query(
            "DELETE FROM documents WHERE table_name = ? AND partition_key = ? AND sort_key = ?",
        )
        .bind(table.name)
        .bind(&key.partition)
        .bind(key.sort_value())
        .execute(&self.pool)
        .await?;

        debug!(
            "delete {}[{:?}]: {} rows",
            table.name,
            key,
            result.rows_affected()
        );
        Ok(())
    }

    /// Apply an update expression, creating the item if it does not exist
    ///
    /// Returns the whole item as stored after the update.
    pub async fn update(
        &self,
        table: &TableSchema,
        key: &Key,
        expression: &UpdateExpression,
    ) -> Result<Item> {
        self.update_with(table, key, |_| Ok(expression.clone())).await
    }

    /// Build the update expression from the current item, then apply it
    ///
    /// `build` sees the stored item (or `None`) inside the same transaction
    /// that writes the result. An error from `build` aborts without writing.
    pub async fn update_with<F>(&self, table: &TableSchema, key: &Key, build: F) -> Result<Item>
    where
        F: FnOnce(Option<&Item>) -> Result<UpdateExpression>,
    {
        table.check_key(key)?;

        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let existing: Option<(String,)> = sqlx::query_as(
            "SELECT body FROM documents WHERE table_name = ? AND partition_key = ? AND sort_key = ?",
        )
        .bind(table.name)
        .bind(&key.partition)
        .bind(key.sort_value())
        .fetch_optional(&mut *tx)
        .await?;

        let existing = existing.map(|(body,)| parse_body(&body)).transpose()?;
        let expression = build(existing.as_ref())?;

        if let Some((attribute, _)) = expression
            .actions
            .iter()
            .find(|(attribute, _)| table.is_key_attribute(attribute))
        {
            return Err(Error::InvalidInput(format!(
                "{}: cannot update key attribute '{}'",
                table.name, attribute
            )));
        }

        let mut item = existing.unwrap_or_else(|| table.key_item(key));
        expression.apply(&mut item);

        sqlx::query(UPSERT_SQL)
            .bind(table.name)
            .bind(&key.partition)
            .bind(key.sort_value())
            .bind(serde_json::to_string(&item)?)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!("update {}[{:?}]", table.name, key);
        Ok(item)
    }

    /// Write up to [`MAX_BATCH_WRITE`] items in one transaction
    pub async fn batch_write(&self, table: &TableSchema, items: Vec<Item>) -> Result<usize> {
        if items.len() > MAX_BATCH_WRITE {
            return Err(Error::InvalidInput(format!(
                "batch of {} items exceeds the limit of {}",
                items.len(),
                MAX_BATCH_WRITE
            )));
        }

        // Validate every key before touching the database
        let keyed = items
            .into_iter()
            .map(|item| -> Result<(Key, String)> {
                Ok((table.key_of(&item)?, serde_json::to_string(&item)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        for (key, body) in &keyed {
            sqlx::query(UPSERT_SQL)
                .bind(table.name)
                .bind(&key.partition)
                .bind(key.sort_value())
                .bind(body)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        debug!("batch_write {}: {} items", table.name, keyed.len());
        Ok(keyed.len())
    }

    /// Write any number of items as consecutive batches of [`MAX_BATCH_WRITE`]
    ///
    /// Each batch commits on its own; a failure leaves earlier batches written.
    pub async fn batch_write_all(&self, table: &TableSchema, items: Vec<Item>) -> Result<usize> {
        let mut written = 0;
        let mut items = items.into_iter().peekable();
        while items.peek().is_some() {
            let chunk: Vec<Item> = items.by_ref().take(MAX_BATCH_WRITE).collect();
            written += self.batch_write(table, chunk).await?;
        }
        Ok(written)
    }
}

fn parse_body(body: &str) -> Result<Item> {
    match serde_json::from_str(body)? {
        Value::Object(item) => Ok(item),
        _ => Err(Error::Internal("stored document is not a JSON object".to_string())),
    }
}

/// Convert a typed model into a store item
pub fn to_item<T: Serialize>(value: &T) -> Result<Item> {
    match serde_json::to_value(value)? {
        Value::Object(item) => Ok(item),
        _ => Err(Error::InvalidInput(
            "document must serialize to a JSON object".to_string(),
        )),
    }
}

/// Convert a store item into a typed model
pub fn from_item<T: DeserializeOwned>(item: Item) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(item))?)
}
