use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::wire::{decode_point, encode_point};
use super::PointsApi;
use crate::error::ApiError;
use crate::model::{Destination, OfferGroup, Point, PointId};

const SCHEMA: &str = r"
    CREATE TABLE IF NOT EXISTS points (
        id TEXT PRIMARY KEY,
        seq INTEGER NOT NULL,
        data TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS destinations (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS offers (
        kind TEXT PRIMARY KEY,
        data TEXT NOT NULL
    );
";

/// Local SQLite backend. Points are stored as server wire JSON, in insertion order.
///
/// Trait calls run on the blocking pool; the seeding helpers block the caller.
pub struct SqlitePointsApi {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePointsApi {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let conn = Connection::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "opened sqlite points store");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, ApiError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, ApiError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run<T, F>(&self, work: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, ApiError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            work(&*conn)
        })
        .await
        .map_err(|e| ApiError::Storage(format!("sqlite task failed: {e}")))?
    }

    /// Seeds reference data. Existing rows with the same key are replaced.
    pub fn put_destinations(&self, destinations: &[Destination]) -> Result<(), ApiError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        for destination in destinations {
            tx.execute(
                "INSERT OR REPLACE INTO destinations (id, data) VALUES (?1, ?2)",
                params![destination.id.as_str(), serde_json::to_string(destination)?],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn put_offers(&self, groups: &[OfferGroup]) -> Result<(), ApiError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        for group in groups {
            tx.execute(
                "INSERT OR REPLACE INTO offers (kind, data) VALUES (?1, ?2)",
                params![group.kind.as_str(), serde_json::to_string(group)?],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn insert(conn: &Connection, point: &Point) -> Result<(), ApiError> {
        conn.execute(
            "INSERT INTO points (id, seq, data)
             VALUES (?1, (SELECT COALESCE(MAX(seq), 0) + 1 FROM points), ?2)",
            params![point.id.as_str(), encode_point(point)?],
        )?;
        Ok(())
    }
}

fn load_rows<T>(
    conn: &Connection,
    sql: &str,
    decode: impl Fn(&str) -> Result<T, ApiError>,
) -> Result<Vec<T>, ApiError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut out = Vec::new();
    for raw in rows {
        out.push(decode(&raw?)?);
    }
    Ok(out)
}

#[async_trait::async_trait]
impl PointsApi for SqlitePointsApi {
    async fn points(&self) -> Result<Vec<Point>, ApiError> {
        self.run(|conn| load_rows(conn, "SELECT data FROM points ORDER BY seq ASC", decode_point))
            .await
    }

    async fn destinations(&self) -> Result<Vec<Destination>, ApiError> {
        self.run(|conn| {
            load_rows(conn, "SELECT data FROM destinations ORDER BY id ASC", |raw| {
                Ok(serde_json::from_str(raw)?)
            })
        })
        .await
    }

    async fn offers(&self) -> Result<Vec<OfferGroup>, ApiError> {
        self.run(|conn| {
            load_rows(conn, "SELECT data FROM offers ORDER BY kind ASC", |raw| {
                Ok(serde_json::from_str(raw)?)
            })
        })
        .await
    }

    async fn add_point(&self, point: &Point) -> Result<Point, ApiError> {
        let mut created = point.clone();
        created.id = PointId::generate();
        let created = self
            .run(move |conn| {
                Self::insert(conn, &created)?;
                Ok(created)
            })
            .await?;
        debug!(id = %created.id, "sqlite backend stored new point");
        Ok(created)
    }

    async fn update_point(&self, point: &Point) -> Result<Point, ApiError> {
        let point = point.clone();
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE points SET data = ?2 WHERE id = ?1",
                params![point.id.as_str(), encode_point(&point)?],
            )?;
            if changed == 0 {
                return Err(ApiError::NotFound(point.id));
            }
            Ok(point)
        })
        .await
    }

    async fn delete_point(&self, id: &PointId) -> Result<(), ApiError> {
        let id = id.clone();
        self.run(move |conn| {
            let existing: Option<String> = conn
                .query_row("SELECT id FROM points WHERE id = ?1", params![id.as_str()], |row| {
                    row.get(0)
                })
                .optional()?;
            if existing.is_none() {
                return Err(ApiError::NotFound(id));
            }
            conn.execute("DELETE FROM points WHERE id = ?1", params![id.as_str()])?;
            Ok(())
        })
        .await
    }
}
