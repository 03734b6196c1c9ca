#![deny(warnings)]

//! Session storage keyed by join code.
//!
//! Stores hold whole [`GameSession`] records. Writers replace the full
//! record, so two writers racing on the same key resolve last-writer-wins.
//! Both stores serialise their own read-modify-write in [`SessionStore::update`].

use anyhow::{anyhow, Context, Result};
use game_core::GameSession;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// File name of the JSON store inside the data directory.
pub const STORE_FILE: &str = "games.json";

/// Join codes are compared case-insensitively and stored uppercase.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Key/value access to session records.
pub trait SessionStore {
    fn get(&self, join_code: &str) -> Result<Option<GameSession>>;

    /// Insert or replace the record under `session.join_code`.
    fn put(&self, session: &GameSession) -> Result<()>;

    /// Insert a new record. Returns false when the code is already taken.
    fn create(&self, session: &GameSession) -> Result<bool>;

    /// Returns whether a record was removed.
    fn delete(&self, join_code: &str) -> Result<bool>;

    fn list_all(&self) -> Result<Vec<GameSession>>;

    fn exists(&self, join_code: &str) -> Result<bool> {
        Ok(self.get(join_code)?.is_some())
    }

    /// Read the record, apply `f` and write the record back.
    ///
    /// Returns `None` without writing when no record exists.
    fn update<R, F>(&self, join_code: &str, f: F) -> Result<Option<R>>
    where
        Self: Sized,
        F: FnOnce(&mut GameSession) -> R,
    {
        let Some(mut session) = self.get(join_code)? else {
            return Ok(None);
        };
        let out = f(&mut session);
        self.put(&session)?;
        Ok(Some(out))
    }
}

fn poisoned() -> anyhow::Error {
    anyhow!("session store lock poisoned")
}

/// Process-local store, used by tests and the demo driver.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: RwLock<BTreeMap<String, GameSession>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, join_code: &str) -> Result<Option<GameSession>> {
        let map = self.sessions.read().map_err(|_| poisoned())?;
        Ok(map.get(&normalize_code(join_code)).cloned())
    }

    fn put(&self, session: &GameSession) -> Result<()> {
        let mut map = self.sessions.write().map_err(|_| poisoned())?;
        map.insert(normalize_code(&session.join_code), session.clone());
        Ok(())
    }

    fn create(&self, session: &GameSession) -> Result<bool> {
        let mut map = self.sessions.write().map_err(|_| poisoned())?;
        let key = normalize_code(&session.join_code);
        if map.contains_key(&key) {
            return Ok(false);
        }
        map.insert(key, session.clone());
        Ok(true)
    }

    fn delete(&self, join_code: &str) -> Result<bool> {
        let mut map = self.sessions.write().map_err(|_| poisoned())?;
        Ok(map.remove(&normalize_code(join_code)).is_some())
    }

    fn list_all(&self) -> Result<Vec<GameSession>> {
        let map = self.sessions.read().map_err(|_| poisoned())?;
        Ok(map.values().cloned().collect())
    }

    fn update<R, F>(&self, join_code: &str, f: F) -> Result<Option<R>>
    where
        Self: Sized,
        F: FnOnce(&mut GameSession) -> R,
    {
        let mut map = self.sessions.write().map_err(|_| poisoned())?;
        Ok(map.get_mut(&normalize_code(join_code)).map(f))
    }
}

/// All sessions in one pretty-printed JSON object on disk.
///
/// An unreadable or malformed file is treated as an empty store. Writes go
/// to a temporary file that is renamed over the old one.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonFileStore {
    /// Store backed by `dir/games.json`. The directory is created on first write.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::at(dir.as_ref().join(STORE_FILE))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> BTreeMap<String, GameSession> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "store unreadable, starting empty");
                return BTreeMap::new();
            }
        };
        if text.trim().is_empty() {
            return BTreeMap::new();
        }
        match serde_json::from_str(&text) {
            Ok(map) => map,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "store malformed, starting empty");
                BTreeMap::new()
            }
        }
    }

    fn save(&self, map: &BTreeMap<String, GameSession>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        debug!(path = %self.path.display(), sessions = map.len(), "store saved");
        Ok(())
    }
}

impl SessionStore for JsonFileStore {
    fn get(&self, join_code: &str) -> Result<Option<GameSession>> {
        let _g = self.guard.lock().map_err(|_| poisoned())?;
        Ok(self.load().remove(&normalize_code(join_code)))
    }

    fn put(&self, session: &GameSession) -> Result<()> {
        let _g = self.guard.lock().map_err(|_| poisoned())?;
        let mut map = self.load();
        map.insert(normalize_code(&session.join_code), session.clone());
        self.save(&map)
    }

    fn create(&self, session: &GameSession) -> Result<bool> {
        let _g = self.guard.lock().map_err(|_| poisoned())?;
        let mut map = self.load();
        let key = normalize_code(&session.join_code);
        if map.contains_key(&key) {
            return Ok(false);
        }
        map.insert(key, session.clone());
        self.save(&map)?;
        Ok(true)
    }

    fn delete(&self, join_code: &str) -> Result<bool> {
        let _g = self.guard.lock().map_err(|_| poisoned())?;
        let mut map = self.load();
        if map.remove(&normalize_code(join_code)).is_none() {
            return Ok(false);
        }
        self.save(&map)?;
        Ok(true)
    }

    fn list_all(&self) -> Result<Vec<GameSession>> {
        let _g = self.guard.lock().map_err(|_| poisoned())?;
        Ok(self.load().into_values().collect())
    }

    fn update<R, F>(&self, join_code: &str, f: F) -> Result<Option<R>>
    where
        Self: Sized,
        F: FnOnce(&mut GameSession) -> R,
    {
        let _g = self.guard.lock().map_err(|_| poisoned())?;
        let mut map = self.load();
        let Some(session) = map.get_mut(&normalize_code(join_code)) else {
            return Ok(None);
        };
        let out = f(session);
        self.save(&map)?;
        Ok(Some(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use game_core::{EngineConfig, GameType};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn session(code: &str) -> GameSession {
        let cfg = EngineConfig::default();
        GameSession::new(
            code.to_string(),
            GameType::BeatMarket,
            "Ms Lee".to_string(),
            cfg.default_settings(GameType::BeatMarket, 4),
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        )
    }

    fn temp_store() -> JsonFileStore {
        static N: AtomicU32 = AtomicU32::new(0);
        let dir = std::env::temp_dir().join(format!(
            "econ-store-{}-{}",
            std::process::id(),
            N.fetch_add(1, Ordering::SeqCst)
        ));
        let _ = fs::remove_dir_all(&dir);
        JsonFileStore::in_dir(dir)
    }

    fn exercise(store: &impl SessionStore) {
        assert!(store.create(&session("ABC123")).unwrap());
        assert!(!store.create(&session("ABC123")).unwrap());
        assert!(store.exists("abc123").unwrap());

        let round = store
            .update("ABC123", |s| {
                s.current_round = 2;
                s.current_round
            })
            .unwrap();
        assert_eq!(round, Some(2));
        assert_eq!(store.get("ABC123").unwrap().unwrap().current_round, 2);
        assert_eq!(store.update("NOPE00", |s| s.current_round).unwrap(), None);

        store.put(&session("ZZZ999")).unwrap();
        assert_eq!(store.list_all().unwrap().len(), 2);
        assert!(store.delete("ZZZ999").unwrap());
        assert!(!store.delete("ZZZ999").unwrap());
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn memory_store_contract() {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn file_store_contract() {
        let store = temp_store();
        exercise(&store);
        let reopened = JsonFileStore::at(store.path());
        assert_eq!(reopened.get("ABC123").unwrap().unwrap().current_round, 2);
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let store = temp_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ not json").unwrap();
        assert!(store.list_all().unwrap().is_empty());
        assert!(store.get("ABC123").unwrap().is_none());
        assert!(store.create(&session("ABC123")).unwrap());
        assert_eq!(store.list_all().unwrap().len(), 1);
    }
}
