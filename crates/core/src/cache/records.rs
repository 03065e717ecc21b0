//! Vehicle image record operations.

use super::connection::CacheDb;
use super::hash::compute_record_id;
use crate::Error;
use crate::name::{VehicleCategory, VehicleDescriptor};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A persisted resolution of one vehicle name to an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheRecord {
    pub id: String,
    pub normalized_key: String,
    pub original_name: String,
    pub category: VehicleCategory,
    pub year: Option<String>,
    /// Blob store URL when the upload succeeded, otherwise the scraped URL.
    pub image_url: String,
    pub source: String,
    pub all_images: Vec<String>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl CacheRecord {
    /// Build a new record stamped with the current time.
    pub fn new(
        descriptor: &VehicleDescriptor, image_url: impl Into<String>, source: impl Into<String>,
        all_images: Vec<String>,
    ) -> Self {
        let image_url = image_url.into();
        let created_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let id = compute_record_id(&descriptor.normalized_key, &image_url, &created_at);

        Self {
            id,
            normalized_key: descriptor.normalized_key.clone(),
            original_name: descriptor.original_name.clone(),
            category: descriptor.category,
            year: descriptor.year.clone(),
            image_url,
            source: source.into(),
            all_images,
            created_at,
        }
    }
}

const SELECT_COLUMNS: &str =
    "id, normalized_key, original_name, category, year, image_url, source, all_images_json, created_at";

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<(CacheRecord, String)> {
    let category: String = row.get(3)?;
    let all_images_json: String = row.get(7)?;
    Ok((
        CacheRecord {
            id: row.get(0)?,
            normalized_key: row.get(1)?,
            original_name: row.get(2)?,
            category: VehicleCategory::from_label(&category),
            year: row.get(4)?,
            image_url: row.get(5)?,
            source: row.get(6)?,
            all_images: Vec::new(),
            created_at: row.get(8)?,
        },
        all_images_json,
    ))
}

impl CacheDb {
    /// Append a record. Existing records for the same key are kept.
    ///
    /// Returns the record id.
    pub async fn insert_record(&self, record: &CacheRecord) -> Result<String, Error> {
        let record = record.clone();
        let all_images_json =
            serde_json::to_string(&record.all_images).map_err(|e| Error::CorruptRecord(e.to_string()))?;

        self.conn
            .call(move |conn| -> Result<String, Error> {
                conn.execute(
                    "INSERT INTO vehicle_images (
                        id, normalized_key, original_name, category, year,
                        image_url, source, all_images_json, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT(id) DO NOTHING",
                    params![
                        &record.id,
                        &record.normalized_key,
                        &record.original_name,
                        record.category.as_str(),
                        &record.year,
                        &record.image_url,
                        &record.source,
                        &all_images_json,
                        &record.created_at,
                    ],
                )?;
                Ok(record.id)
            })
            .await
            .map_err(Error::from)
    }

    /// Get the most recent record for an exact normalized key.
    ///
    /// Returns None if no record exists for the key.
    pub async fn latest_record(&self, normalized_key: &str) -> Result<Option<CacheRecord>, Error> {
        let key = normalized_key.to_string();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(CacheRecord, String)>, Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {SELECT_COLUMNS} FROM vehicle_images
                     WHERE normalized_key = ?1
                     ORDER BY created_at DESC
                     LIMIT 1"
                ))?;

                match stmt.query_row(params![key], row_to_record) {
                    Ok(found) => Ok(Some(found)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        match row {
            Some((mut record, all_images_json)) => {
                record.all_images =
                    serde_json::from_str(&all_images_json).map_err(|e| Error::CorruptRecord(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Count records stored for a normalized key.
    pub async fn count_records(&self, normalized_key: &str) -> Result<u64, Error> {
        let key = normalized_key.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM vehicle_images WHERE normalized_key = ?1",
                    params![key],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete records created more than `days` days ago.
    ///
    /// Returns the number of deleted entries. A window too large to
    /// represent as a timestamp is rejected as invalid input.
    pub async fn purge_records_older_than(&self, days: i64) -> Result<u64, Error> {
        let cutoff = chrono::TimeDelta::try_days(days)
            .and_then(|window| chrono::Utc::now().checked_sub_signed(window))
            .ok_or_else(|| Error::InvalidInput(format!("older_than_days out of range: {days}")))?
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM vehicle_images WHERE created_at < ?1", params![cutoff])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Purge oldest records until count <= max_entries.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_lru_records(&self, max_entries: usize) -> Result<u64, Error> {
        let max = max_entries as i64;
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM vehicle_images", [], |row| row.get(0))?;
                if count <= max {
                    return Ok(0);
                }

                let to_delete = count - max;
                let deleted = conn.execute(
                    "DELETE FROM vehicle_images WHERE id IN (
                    SELECT id FROM vehicle_images ORDER BY created_at ASC LIMIT ?1
                )",
                    params![to_delete],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }
}
