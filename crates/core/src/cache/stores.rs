//! SQLite implementation of [`CacheStorage`].

use async_trait::async_trait;
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Connection, OptionalExtension};

use super::connection::CacheDb;
use super::key::RequestKey;
use super::storage::{ACTIVE_GENERATION, CacheStorage, CachedEntry};
use crate::Error;
use crate::request::AssetResponse;

const ENTRY_COLUMNS: &str =
    "method, url, response_url, status, status_text, response_type, headers_json, body, stored_at";

/// Raw column values of one `cache_entries` row.
struct EntryRow {
    method: String,
    url: String,
    response_url: String,
    status: i64,
    status_text: String,
    response_type: String,
    headers_json: String,
    body: Vec<u8>,
    stored_at: String,
}

impl EntryRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            method: row.get(0)?,
            url: row.get(1)?,
            response_url: row.get(2)?,
            status: row.get(3)?,
            status_text: row.get(4)?,
            response_type: row.get(5)?,
            headers_json: row.get(6)?,
            body: row.get(7)?,
            stored_at: row.get(8)?,
        })
    }

    fn into_entry(self) -> Result<CachedEntry, Error> {
        let status = u16::try_from(self.status)
            .map_err(|_| Error::CorruptEntry(format!("status {} out of range for {}", self.status, self.url)))?;
        let response_type = self.response_type.parse().map_err(Error::CorruptEntry)?;
        let headers: Vec<(String, String)> = serde_json::from_str(&self.headers_json)
            .map_err(|e| Error::CorruptEntry(format!("headers of {}: {e}", self.url)))?;

        Ok(CachedEntry {
            response: AssetResponse {
                url: self.response_url,
                status,
                status_text: self.status_text,
                response_type,
                headers,
                body: Bytes::from(self.body),
            },
            key: RequestKey { method: self.method, url: self.url },
            stored_at: self.stored_at,
        })
    }
}

fn create_store(conn: &Connection, store: &str, created_at: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
        params![store, created_at],
    )?;
    Ok(())
}

fn store_exists(conn: &Connection, store: &str) -> Result<bool, Error> {
    let found = conn
        .query_row("SELECT 1 FROM cache_stores WHERE name = ?1", params![store], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

/// Upsert one entry into an existing store.
fn write_entry(
    conn: &Connection, store: &str, key: &RequestKey, response: &AssetResponse, stored_at: &str,
) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&response.headers)
        .map_err(|e| Error::CorruptEntry(format!("failed to encode headers: {e}")))?;

    conn.execute(
        "INSERT INTO cache_entries (
            store, key_hash, method, url, response_url, status, status_text,
            response_type, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT(store, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            response_url = excluded.response_url,
            status = excluded.status,
            status_text = excluded.status_text,
            response_type = excluded.response_type,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            store,
            key.hash(),
            &key.method,
            &key.url,
            &response.url,
            i64::from(response.status),
            &response.status_text,
            response.response_type.as_str(),
            headers_json,
            response.body.as_ref(),
            stored_at,
        ],
    )?;
    Ok(())
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open_store(&self, store: &str) -> Result<(), Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| create_store(conn, &store, &now()))
            .await
            .map_err(Error::from)
    }

    async fn get(&self, store: &str, key: &RequestKey) -> Result<Option<CachedEntry>, Error> {
        let store = store.to_string();
        let key_hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<CachedEntry>, Error> {
                let row = conn
                    .query_row(
                        &format!("SELECT {ENTRY_COLUMNS} FROM cache_entries WHERE store = ?1 AND key_hash = ?2"),
                        params![store, key_hash],
                        EntryRow::from_row,
                    )
                    .optional()?;

                row.map(EntryRow::into_entry).transpose()
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, store: &str, key: &RequestKey, response: &AssetResponse) -> Result<bool, Error> {
        let store = store.to_string();
        let key = key.clone();
        let response = response.clone();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                if !store_exists(&tx, &store)? {
                    return Ok(false);
                }
                write_entry(&tx, &store, &key, &response, &now())?;
                tx.commit()?;
                Ok(true)
            })
            .await
            .map_err(Error::from)
    }

    async fn put_all(&self, store: &str, entries: Vec<(RequestKey, AssetResponse)>) -> Result<(), Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let stored_at = now();
                let tx = conn.transaction()?;
                create_store(&tx, &store, &stored_at)?;
                for (key, response) in &entries {
                    write_entry(&tx, &store, key, response, &stored_at)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_store(&self, store: &str) -> Result<bool, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM cache_entries WHERE store = ?1", params![store])?;
                let deleted = tx.execute("DELETE FROM cache_stores WHERE name = ?1", params![store])?;
                tx.commit()?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn entry_count(&self, store: &str) -> Result<u64, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM cache_entries WHERE store = ?1", params![store], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    async fn entries(&self, store: &str) -> Result<Vec<CachedEntry>, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<CachedEntry>, Error> {
                let mut stmt =
                    conn.prepare(&format!("SELECT {ENTRY_COLUMNS} FROM cache_entries WHERE store = ?1 ORDER BY url"))?;
                let rows = stmt
                    .query_map(params![store], EntryRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows.into_iter().map(EntryRow::into_entry).collect()
            })
            .await
            .map_err(Error::from)
    }

    async fn active_generation(&self) -> Result<Option<String>, Error> {
        self.conn
            .call(|conn| -> Result<Option<String>, Error> {
                let value = conn
                    .query_row(
                        "SELECT value FROM worker_state WHERE key = ?1",
                        params![ACTIVE_GENERATION],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(value)
            })
            .await
            .map_err(Error::from)
    }

    async fn set_active_generation(&self, store: &str) -> Result<(), Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO worker_state (key, value, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    params![ACTIVE_GENERATION, store, now()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
