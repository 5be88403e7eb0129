//! DuckDB roster of arbitrators.

use std::path::Path;

use duckdb::{Connection, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::StoreError;

/// Database file used when no path is given.
pub const DEFAULT_DB_PATH: &str = "arbitrators.duckdb";

/// Bundled seed rows.
pub const DEFAULT_SEED: &str = include_str!("../data/roster_seed.json");

const CREATE_SQL: &str = "
CREATE SEQUENCE IF NOT EXISTS arbitrator_id_seq START 1;
CREATE TABLE IF NOT EXISTS arbitrators (
    id BIGINT PRIMARY KEY DEFAULT nextval('arbitrator_id_seq'),
    name VARCHAR NOT NULL,
    specialization VARCHAR,
    experience_years INTEGER,
    cases_handled INTEGER
);";

/// A stored roster row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arbitrator {
    pub id: i64,
    pub name: String,
    pub specialization: Option<String>,
    pub experience_years: Option<i32>,
    pub cases_handled: Option<i32>,
}

/// A row to insert; the id is assigned by the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewArbitrator {
    pub name: String,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub experience_years: Option<i32>,
    #[serde(default)]
    pub cases_handled: Option<i32>,
}

/// Parse a JSON list of seed rows. Names must be non-blank.
pub fn parse_seed(json: &str) -> Result<Vec<NewArbitrator>, StoreError> {
    let rows: Vec<NewArbitrator> = serde_json::from_str(json)?;
    for (i, row) in rows.iter().enumerate() {
        if row.name.trim().is_empty() {
            return Err(StoreError::InvalidSeed(format!("row {i} has a blank name")));
        }
    }
    Ok(rows)
}

/// Roster table on an in-memory or file-backed DuckDB database.
///
/// The table is created on open, so a fresh file is immediately usable.
pub struct RosterStore {
    conn: Connection,
}

impl RosterStore {
    /// Open an in-memory database.
    pub fn open() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Open or create a database file at `path`.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        debug!(path = %path.display(), "opening roster");
        Self::init(Connection::open(path)?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(CREATE_SQL)?;
        Ok(Self { conn })
    }

    /// Insert rows whose name is not already present. Returns how many were
    /// inserted.
    pub fn seed(&self, rows: &[NewArbitrator]) -> Result<usize, StoreError> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO arbitrators (name, specialization, experience_years, cases_handled)
             SELECT ?, ?, ?, ?
             WHERE NOT EXISTS (SELECT 1 FROM arbitrators WHERE name = ?)",
        )?;

        let mut inserted = 0;
        for row in rows {
            let n = stmt.execute(params![
                row.name,
                row.specialization,
                row.experience_years,
                row.cases_handled,
                row.name,
            ])?;
            if n == 0 {
                debug!(name = %row.name, "already in roster");
            }
            inserted += n;
        }
        info!(inserted, offered = rows.len(), "seeded roster");
        Ok(inserted)
    }

    /// All rows in id order.
    pub fn list(&self) -> Result<Vec<Arbitrator>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, specialization, experience_years, cases_handled
             FROM arbitrators ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Arbitrator {
                id: row.get(0)?,
                name: row.get(1)?,
                specialization: row.get(2)?,
                experience_years: row.get(3)?,
                cases_handled: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Number of rows in the roster.
    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT count(*)::BIGINT FROM arbitrators", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled() -> Vec<NewArbitrator> {
        parse_seed(DEFAULT_SEED).unwrap()
    }

    #[test]
    fn bundled_seed_parses() {
        let rows = bundled();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].name, "Donald M. McRae");
        assert_eq!(rows[2].experience_years, Some(35));
    }

    #[test]
    fn open_in_memory_is_empty() {
        let store = RosterStore::open().unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn seed_then_list_in_id_order() {
        let store = RosterStore::open().unwrap();
        assert_eq!(store.seed(&bundled()).unwrap(), 4);

        let rows = store.list().unwrap();
        let names: Vec<&str> = rows.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            ["Donald M. McRae", "Kristian Jervell", "Vaughan Lowe", "Marius Emberland"]
        );
        assert!(rows.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(rows[1].specialization.as_deref(), Some("Investment Arbitration"));
        assert_eq!(rows[3].cases_handled, Some(30));
    }

    #[test]
    fn reseeding_skips_existing_names() {
        let store = RosterStore::open().unwrap();
        store.seed(&bundled()).unwrap();

        let mut more = bundled();
        more.push(NewArbitrator {
            name: "New Arbitrator".into(),
            specialization: None,
            experience_years: None,
            cases_handled: None,
        });
        assert_eq!(store.seed(&more).unwrap(), 1);
        assert_eq!(store.count().unwrap(), 5);
        assert_eq!(store.list().unwrap()[4].specialization, None);
    }

    #[test]
    fn persistent_store_survives_reopen() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("roster.duckdb");

        {
            let store = RosterStore::open_persistent(&path).unwrap();
            store.seed(&bundled()).unwrap();
        }

        let store = RosterStore::open_persistent(&path).unwrap();
        assert_eq!(store.count().unwrap(), 4);
        assert_eq!(store.seed(&bundled()).unwrap(), 0);
    }

    #[test]
    fn seed_rows_need_a_name() {
        assert!(matches!(
            parse_seed(r#"[{"name": "  "}]"#),
            Err(StoreError::InvalidSeed(_))
        ));
        assert!(matches!(parse_seed("{"), Err(StoreError::Json(_))));

        let rows = parse_seed(r#"[{"name": "Only Name"}]"#).unwrap();
        assert_eq!(rows[0].specialization, None);
    }

    #[test]
    fn rows_serialize_flat() {
        let store = RosterStore::open().unwrap();
        store.seed(&bundled()[..1]).unwrap();
        let v = serde_json::to_value(store.list().unwrap()).unwrap();
        assert_eq!(v[0]["name"], "Donald M. McRae");
        assert_eq!(v[0]["experience_years"], 30);
        assert!(v[0]["id"].is_number());
    }
}
