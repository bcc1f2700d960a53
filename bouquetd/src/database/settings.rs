//! Settings record CRUD operations.

use super::{Database, DatabaseError, Result};
use crate::bouquet::collab::SettingsStore;
use bouquet_protocol::ConfigMap;
use log::warn;
use rusqlite::params;
use serde_json::Value;

/// Split a `category/name` path.
fn split_path(path: &str) -> Result<(&str, &str)> {
    match path.split_once('/') {
        Some((category, name)) if !category.is_empty() && !name.is_empty() => Ok((category, name)),
        _ => Err(DatabaseError::PathError(path.to_string())),
    }
}

impl Database {
    /// Load every record of a category, ordered by name.
    ///
    /// Rows whose body is not a JSON object are skipped.
    pub fn load_settings(&self, category: &str) -> Result<Vec<(String, ConfigMap)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT path, name, body FROM settings WHERE category = ?1 ORDER BY name")?;

        let rows = stmt
            .query_map([category], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(rows.len());
        for (path, name, body) in rows {
            match serde_json::from_str::<Value>(&body) {
                Ok(Value::Object(map)) => records.push((name, map)),
                Ok(_) => warn!("Settings: {} is not an object, skipping", path),
                Err(e) => warn!("Settings: {} has invalid JSON ({}), skipping", path, e),
            }
        }

        Ok(records)
    }

    /// Get a single record.
    pub fn get_settings(&self, path: &str) -> Result<Option<ConfigMap>> {
        split_path(path)?;
        let result = self.conn.query_row(
            "SELECT body FROM settings WHERE path = ?1",
            [path],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(body) => match serde_json::from_str::<Value>(&body)? {
                Value::Object(map) => Ok(Some(map)),
                _ => Ok(None),
            },
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert or replace a record.
    pub fn save_settings(&self, path: &str, config: &ConfigMap) -> Result<()> {
        let (category, name) = split_path(path)?;
        let body = serde_json::to_string(config)?;
        self.conn.execute(
            "INSERT INTO settings (path, category, name, body) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(path) DO UPDATE SET body = excluded.body, updated_at = strftime('%s', 'now')",
            params![path, category, name, body],
        )?;
        Ok(())
    }

    /// Delete a record. Returns true if a row was removed.
    pub fn remove_settings(&self, path: &str) -> Result<bool> {
        split_path(path)?;
        let removed = self
            .conn
            .execute("DELETE FROM settings WHERE path = ?1", [path])?;
        Ok(removed > 0)
    }
}

impl SettingsStore for Database {
    fn load(&self, category: &str) -> Result<Vec<(String, ConfigMap)>> {
        self.load_settings(category)
    }

    fn save(&self, config: &ConfigMap, path: &str) -> Result<()> {
        self.save_settings(path, config)
    }

    fn remove(&self, path: &str) -> Result<()> {
        self.remove_settings(path).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str) -> ConfigMap {
        let mut map = ConfigMap::new();
        map.insert("name".into(), json!(name));
        map.insert("enabled".into(), json!(true));
        map
    }

    #[test]
    fn test_settings_crud() {
        let db = Database::open_in_memory().unwrap();

        db.save_settings("bouquet/b", &record("Second")).unwrap();
        db.save_settings("bouquet/a", &record("First")).unwrap();
        db.save_settings("channel/x", &record("Other")).unwrap();

        let loaded = db.load_settings("bouquet").unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].0, "a");
        assert_eq!(loaded[0].1["name"], json!("First"));
        assert_eq!(loaded[1].0, "b");

        // Replace
        db.save_settings("bouquet/a", &record("Renamed")).unwrap();
        let a = db.get_settings("bouquet/a").unwrap().unwrap();
        assert_eq!(a["name"], json!("Renamed"));
        assert_eq!(db.load_settings("bouquet").unwrap().len(), 2);

        // Delete
        assert!(db.remove_settings("bouquet/a").unwrap());
        assert!(!db.remove_settings("bouquet/a").unwrap());
        assert!(db.get_settings("bouquet/a").unwrap().is_none());
    }

    #[test]
    fn test_invalid_path() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.save_settings("bouquet", &record("x")),
            Err(DatabaseError::PathError(_))
        ));
        assert!(db.remove_settings("/x").is_err());
    }

    #[test]
    fn test_load_skips_malformed_rows() {
        let db = Database::open_in_memory().unwrap();
        db.save_settings("bouquet/good", &record("Good")).unwrap();
        db.connection()
            .execute(
                "INSERT INTO settings (path, category, name, body) VALUES ('bouquet/bad', 'bouquet', 'bad', '[1,2]')",
                [],
            )
            .unwrap();
        db.connection()
            .execute(
                "INSERT INTO settings (path, category, name, body) VALUES ('bouquet/worse', 'bouquet', 'worse', '{oops')",
                [],
            )
            .unwrap();

        let loaded = db.load_settings("bouquet").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].0, "good");
    }
}
