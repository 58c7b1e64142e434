use crate as storage;
use crate::{JokeStore, PageQuery};
use jokebox_rs_models::{Joke, JokeId};
use rusqlite::{params, Connection, Rows};
use std::{
    convert::TryFrom,
    path::Path,
    sync::{Mutex, MutexGuard},
    time::Instant,
};

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS jokes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    joke TEXT NOT NULL
);";

/// SQLite-backed `JokeStore`.
///
/// A single connection is shared behind a mutex, which also serializes writes.
pub struct SqliteJokeStore {
    conn: Mutex<Connection>,
}

impl SqliteJokeStore {
    pub fn open<P: AsRef<Path>>(path: P) -> storage::Result<SqliteJokeStore> {
        let started_at = Instant::now();
        info!("Opening sqlite database at {}", path.as_ref().display());
        let conn = Connection::open(path)?;
        SqliteJokeStore::bootstrap(conn, started_at)
    }

    pub fn open_in_memory() -> storage::Result<SqliteJokeStore> {
        let started_at = Instant::now();
        info!("Opening in-memory sqlite database");
        let conn = Connection::open_in_memory()?;
        SqliteJokeStore::bootstrap(conn, started_at)
    }

    fn bootstrap(conn: Connection, started_at: Instant) -> storage::Result<SqliteJokeStore> {
        if let Err(e) = conn.execute_batch(SCHEMA_SQL) {
            error!("Failed to create jokes table: {}", e);
            return Err(e.into());
        }
        info!("Database ready in {}ms", started_at.elapsed().as_millis());
        Ok(SqliteJokeStore {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> storage::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| storage::Error::Lock(format!("sqlite connection poisoned: {}", e)))
    }
}

impl JokeStore for SqliteJokeStore {
    fn create(&self, text: &str) -> storage::Result<Joke> {
        let conn = self.lock()?;
        conn.execute("INSERT INTO jokes (joke) VALUES (?1)", params![text])?;
        let id = conn.last_insert_rowid();
        debug!("Inserted joke {}", id);
        Ok(Joke::new(id, text.to_owned()))
    }

    fn find_by_id(&self, id: JokeId) -> storage::Result<Option<Joke>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached("SELECT id, joke FROM jokes WHERE id = ?1")?;
        let mut rows = stmt.query(params![id])?;
        let jokes = collect_jokes(&mut rows)?;
        Ok(jokes.into_iter().next())
    }

    fn find_all(&self) -> storage::Result<Vec<Joke>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached("SELECT id, joke FROM jokes")?;
        let mut rows = stmt.query([])?;
        let jokes = collect_jokes(&mut rows)?;
        Ok(jokes)
    }

    fn find_page(&self, query: PageQuery) -> storage::Result<Vec<Joke>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare_cached("SELECT id, joke FROM jokes ORDER BY id ASC LIMIT ?1 OFFSET ?2")?;
        let mut rows = stmt.query(params![query.limit, query.offset])?;
        let jokes = collect_jokes(&mut rows)?;
        Ok(jokes)
    }

    fn update(&self, joke: &Joke) -> storage::Result<Joke> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE jokes SET joke = ?1 WHERE id = ?2",
            params![joke.joke, joke.id],
        )?;
        if changed == 0 {
            return Err(storage::Error::Missing(joke.id));
        }
        Ok(joke.clone())
    }

    fn delete(&self, joke: &Joke) -> storage::Result<()> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM jokes WHERE id = ?1", params![joke.id])?;
        if changed == 0 {
            return Err(storage::Error::Missing(joke.id));
        }
        debug!("Deleted joke {}", joke.id);
        Ok(())
    }
}

fn collect_jokes(rows: &mut Rows<'_>) -> storage::Result<Vec<Joke>> {
    let mut jokes = vec![];
    while let Some(row) = rows.next()? {
        match Joke::try_from(row) {
            Ok(joke) => jokes.push(joke),
            Err(e) => {
                error!("Failed to convert row to Joke: {}", e);
                return Err(storage::Error::InvalidData(e));
            }
        }
    }
    Ok(jokes)
}
