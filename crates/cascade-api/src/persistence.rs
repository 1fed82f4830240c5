use std::fmt;
use std::path::Path;

use contracts::{Scenario, ScenarioStatus};
use rusqlite::{params, Connection, OptionalExtension};

#[derive(Debug)]
pub enum PersistenceError {
    Sqlite(rusqlite::Error),
    Serde(serde_json::Error),
    ScenarioNotFound(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::Serde(err) => write!(f, "serde error: {err}"),
            Self::ScenarioNotFound(id) => write!(f, "scenario not found: {id}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// Storage seam for scenarios. The server runs on SQLite; tests and
/// embedded callers use the in-memory store.
pub trait ScenarioRepository: Send {
    fn save(&mut self, scenario: &Scenario) -> Result<(), PersistenceError>;
    fn load(&self, scenario_id: &str) -> Result<Scenario, PersistenceError>;
    fn list(&self) -> Result<Vec<Scenario>, PersistenceError>;
    fn delete(&mut self, scenario_id: &str) -> Result<(), PersistenceError>;
}

#[derive(Debug, Default)]
pub struct InMemoryScenarioRepository {
    scenarios: std::collections::BTreeMap<String, Scenario>,
}

impl InMemoryScenarioRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScenarioRepository for InMemoryScenarioRepository {
    fn save(&mut self, scenario: &Scenario) -> Result<(), PersistenceError> {
        self.scenarios
            .insert(scenario.id.clone(), scenario.clone());
        Ok(())
    }

    fn load(&self, scenario_id: &str) -> Result<Scenario, PersistenceError> {
        self.scenarios
            .get(scenario_id)
            .cloned()
            .ok_or_else(|| PersistenceError::ScenarioNotFound(scenario_id.to_string()))
    }

    fn list(&self) -> Result<Vec<Scenario>, PersistenceError> {
        Ok(self.scenarios.values().cloned().collect())
    }

    fn delete(&mut self, scenario_id: &str) -> Result<(), PersistenceError> {
        self.scenarios
            .remove(scenario_id)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::ScenarioNotFound(scenario_id.to_string()))
    }
}

/// Scenarios persist as JSON blobs keyed by id. The name and scope columns
/// are denormalized alongside the blob so the table stays queryable with
/// plain SQL.
#[derive(Debug)]
pub struct SqliteScenarioStore {
    conn: Connection,
}

impl SqliteScenarioStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.configure()?;
        store.migrate()?;
        Ok(store)
    }

    fn configure(&mut self) -> Result<(), PersistenceError> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    }

    fn migrate(&mut self) -> Result<(), PersistenceError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS scenarios (
                scenario_id TEXT PRIMARY KEY,
                scenario_name TEXT NOT NULL,
                scope_type TEXT NOT NULL,
                scope_name TEXT NOT NULL,
                status TEXT NOT NULL,
                scenario_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_scenarios_scope
                ON scenarios (scope_type, scope_name);
            ",
        )?;
        Ok(())
    }
}

fn status_label(status: ScenarioStatus) -> &'static str {
    match status {
        ScenarioStatus::Draft => "draft",
        ScenarioStatus::Completed => "completed",
    }
}

impl ScenarioRepository for SqliteScenarioStore {
    fn save(&mut self, scenario: &Scenario) -> Result<(), PersistenceError> {
        let scenario_json = serde_json::to_string(scenario)?;
        self.conn.execute(
            "INSERT INTO scenarios (
                scenario_id,
                scenario_name,
                scope_type,
                scope_name,
                status,
                scenario_json
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (scenario_id) DO UPDATE SET
                scenario_name = excluded.scenario_name,
                status = excluded.status,
                scenario_json = excluded.scenario_json",
            params![
                scenario.id.as_str(),
                scenario.config.scenario_name.as_str(),
                scenario.config.scope_type.as_str(),
                scenario.config.scope_name.as_str(),
                status_label(scenario.status),
                scenario_json,
            ],
        )?;
        Ok(())
    }

    fn load(&self, scenario_id: &str) -> Result<Scenario, PersistenceError> {
        let row: Option<String> = self
            .conn
            .query_row(
                "SELECT scenario_json FROM scenarios WHERE scenario_id = ?1",
                params![scenario_id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(payload) = row else {
            return Err(PersistenceError::ScenarioNotFound(scenario_id.to_string()));
        };
        Ok(serde_json::from_str(&payload)?)
    }

    fn list(&self) -> Result<Vec<Scenario>, PersistenceError> {
        let mut stmt = self.conn.prepare(
            "SELECT scenario_json FROM scenarios ORDER BY scenario_id ASC",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut scenarios = Vec::new();
        for row in rows {
            let payload = row?;
            scenarios.push(serde_json::from_str::<Scenario>(&payload)?);
        }
        Ok(scenarios)
    }

    fn delete(&mut self, scenario_id: &str) -> Result<(), PersistenceError> {
        let removed = self.conn.execute(
            "DELETE FROM scenarios WHERE scenario_id = ?1",
            params![scenario_id],
        )?;
        if removed == 0 {
            return Err(PersistenceError::ScenarioNotFound(scenario_id.to_string()));
        }
        Ok(())
    }
}
