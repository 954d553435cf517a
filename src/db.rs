// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::Path;

use examprep_core::EngineError;
use examprep_core::EngineResult;
use examprep_core::KeyValueStore;
use examprep_core::Timestamp;
use examprep_core::error::ErrorReport;
use examprep_core::error::Fallible;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;

/// SQLite-backed key-value store. Each save is a single upsert statement,
/// so a value is either fully replaced or left as it was.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Fallible<Self> {
        let conn = Connection::open(path)
            .map_err(|e| ErrorReport::new(format!("Failed to open database: {e}")))?;
        Self::init(conn)
    }

    #[cfg(test)]
    pub fn in_memory() -> Fallible<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ErrorReport::new(format!("Failed to open database: {e}")))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Fallible<Self> {
        conn.execute_batch(
            "create table if not exists kv (
                key text primary key,
                value blob not null,
                updated_at text not null
            );",
        )
        .map_err(|e| ErrorReport::new(format!("Failed to initialize database: {e}")))?;
        Ok(Self { conn })
    }

    /// All keys currently stored.
    pub fn keys(&self) -> EngineResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("select key from kv order by key")
            .map_err(|e| EngineError::persistence("kv", e))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| EngineError::persistence("kv", e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| EngineError::persistence("kv", e))
    }
}

impl KeyValueStore for SqliteStore {
    fn load(&self, key: &str) -> EngineResult<Option<Vec<u8>>> {
        self.conn
            .query_row("select value from kv where key = ?1", [key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()
            .map_err(|e| EngineError::persistence(key, e))
    }

    fn save(&self, key: &str, bytes: &[u8]) -> EngineResult<()> {
        let updated_at = Timestamp::now().to_string();
        self.conn
            .execute(
                "insert into kv (key, value, updated_at) values (?1, ?2, ?3)
                 on conflict(key) do update
                 set value = excluded.value, updated_at = excluded.updated_at",
                params![key, bytes, updated_at],
            )
            .map_err(|e| EngineError::persistence(key, e))?;
        log::debug!("Wrote {} bytes to '{key}'", bytes.len());
        Ok(())
    }
}
