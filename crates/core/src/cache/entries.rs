//! Entry reads and writes inside a bucket.

use super::connection::CacheDb;
use crate::request::RequestIdentity;
use crate::response::Response;
use crate::Error;
use chrono::{DateTime, Utc};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Summary of one stored entry, without its body.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct EntryMeta {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub size: u64,
    pub stored_at: String,
}

impl CacheDb {
    /// Insert or overwrite the entry for `identity` in `bucket`.
    ///
    /// The bucket is created on first write. The row is replaced in a single
    /// statement, so a reader sees either the previous entry or the new one
    /// in full.
    pub async fn upsert_entry(&self, bucket: &str, identity: &RequestIdentity, response: &Response) -> Result<(), Error> {
        let bucket = bucket.to_string();
        let key_hash = identity.key();
        let method = identity.method.clone();
        let url = identity.url.clone();
        let status = i64::from(response.status);
        let headers_json = serde_json::to_string(&response.headers)?;
        let body = response.body.to_vec();
        let now = Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO buckets (name, created_at) VALUES (?1, ?2)",
                    params![&bucket, &now],
                )?;
                tx.execute(
                    "INSERT INTO entries (bucket, key_hash, method, url, status, headers_json, body, stored_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(bucket, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![&bucket, &key_hash, &method, &url, status, &headers_json, &body, &now],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get the entry stored for `identity` in `bucket`.
    ///
    /// Returns None if the bucket or the entry doesn't exist.
    pub async fn get_entry(&self, bucket: &str, identity: &RequestIdentity) -> Result<Option<Response>, Error> {
        let bucket = bucket.to_string();
        let key_hash = identity.key();
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status, headers_json, body, stored_at FROM entries WHERE bucket = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![bucket, key_hash], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                });

                match result {
                    Ok((status, headers_json, body, stored_at)) => {
                        let status = u16::try_from(status)
                            .map_err(|_| Error::StoreFailure(format!("corrupt status: {status}")))?;
                        let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;
                        let stored_at = DateTime::parse_from_rfc3339(&stored_at)
                            .map(|d| d.with_timezone(&Utc))
                            .ok();
                        Ok(Some(Response { status, headers, body: body.into(), stored_at }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// List entry summaries in a bucket, most recently stored first.
    pub async fn list_entries(&self, bucket: &str) -> Result<Vec<EntryMeta>, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<EntryMeta>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, status, LENGTH(body), stored_at FROM entries
                    WHERE bucket = ?1 ORDER BY stored_at DESC, url ASC",
                )?;
                let rows = stmt
                    .query_map(params![bucket], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, i64>(2)?,
                            row.get::<_, i64>(3)?,
                            row.get::<_, String>(4)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                rows.into_iter()
                    .map(|(method, url, status, size, stored_at)| -> Result<EntryMeta, Error> {
                        Ok(EntryMeta {
                            method,
                            url,
                            status: u16::try_from(status)
                                .map_err(|_| Error::StoreFailure(format!("corrupt status: {status}")))?,
                            size: u64::try_from(size).map_err(|_| Error::StoreFailure(format!("corrupt size: {size}")))?,
                            stored_at,
                        })
                    })
                    .collect()
            })
            .await
            .map_err(Error::from)
    }
}
