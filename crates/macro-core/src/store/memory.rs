use std::fs;
use std::path::Path;

use tracing::debug;

use super::{parse_macros_toml, MacroStore, StoreError};
use crate::field::FieldKind;
use crate::macros::{Macro, MacroId};

/// Macro store held in memory, optionally seeded from a macros file.
/// Keeps insertion order so ranking ties stay deterministic.
#[derive(Default)]
pub struct MemoryStore {
    macros: Vec<Macro>,
    revision: u64,
}

impl MemoryStore {
    pub fn new(macros: Vec<Macro>) -> Self {
        Self {
            macros,
            revision: 0,
        }
    }

    pub fn from_toml_str(toml_str: &str, known_variables: &[String]) -> Result<Self, StoreError> {
        Ok(Self::new(parse_macros_toml(toml_str, known_variables)?))
    }

    pub fn from_path(path: &Path, known_variables: &[String]) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content, known_variables)
    }

    pub fn get(&self, id: &MacroId) -> Option<&Macro> {
        self.macros.iter().find(|m| &m.id == id)
    }

    /// Insert or replace by id.
    pub fn upsert(&mut self, m: Macro) {
        match self.macros.iter_mut().find(|e| e.id == m.id) {
            Some(existing) => *existing = m,
            None => self.macros.push(m),
        }
        self.revision += 1;
    }

    pub fn remove(&mut self, id: &MacroId) -> Option<Macro> {
        let idx = self.macros.iter().position(|m| &m.id == id)?;
        self.revision += 1;
        Some(self.macros.remove(idx))
    }

    fn get_mut(&mut self, id: &MacroId) -> Result<&mut Macro, StoreError> {
        self.macros
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}

impl MacroStore for MemoryStore {
    fn list(&self) -> Result<Vec<Macro>, StoreError> {
        Ok(self.macros.clone())
    }

    fn increment_usage(&mut self, id: &MacroId, now_ms: u64) -> Result<(), StoreError> {
        let m = self.get_mut(id)?;
        m.usage_count = m.usage_count.saturating_add(1);
        m.last_used = Some(now_ms);
        m.updated_at = now_ms;
        self.revision += 1;
        debug!(%id, "usage incremented");
        Ok(())
    }

    fn record_context_usage(
        &mut self,
        id: &MacroId,
        context_key: &str,
        _field_type: FieldKind,
        _domain: &str,
    ) -> Result<(), StoreError> {
        let m = self.get_mut(id)?;
        *m.context_usage.entry(context_key.to_string()).or_insert(0) += 1;
        self.revision += 1;
        Ok(())
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::new(vec![
            Macro::new("sig", "sig", "Best,\nA"),
            Macro::new("addr", "addr", "1 Main St"),
        ])
    }

    #[test]
    fn usage_is_recorded() {
        let mut s = store();
        let id = MacroId::new("sig");
        let before = s.revision();
        s.increment_usage(&id, 42).unwrap();
        s.record_context_usage(&id, "example.com:message", FieldKind::Message, "example.com")
            .unwrap();
        s.record_context_usage(&id, "example.com:message", FieldKind::Message, "example.com")
            .unwrap();
        let m = s.get(&id).unwrap();
        assert_eq!(m.usage_count, 1);
        assert_eq!(m.last_used, Some(42));
        assert_eq!(m.context_usage["example.com:message"], 2);
        assert_eq!(s.revision(), before + 3);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut s = store();
        let err = s.increment_usage(&MacroId::new("nope"), 0).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn upsert_and_remove_keep_order() {
        let mut s = store();
        s.upsert(Macro::new("sig", "signature", "Cheers"));
        s.upsert(Macro::new("new", "new", "x"));
        let names: Vec<String> = s.list().unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, ["signature", "addr", "new"]);
        assert!(s.remove(&MacroId::new("addr")).is_some());
        assert!(s.remove(&MacroId::new("addr")).is_none());
        assert_eq!(s.list().unwrap().len(), 2);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macros.toml");
        fs::write(
            &path,
            "[[macro]]\nid = \"sig\"\nname = \"sig\"\nbody = \"Best\"\n",
        )
        .unwrap();
        let s = MemoryStore::from_path(&path, &[]).unwrap();
        assert_eq!(s.list().unwrap().len(), 1);

        let missing = MemoryStore::from_path(&dir.path().join("missing.toml"), &[]);
        assert!(matches!(missing, Err(StoreError::Io(_))));
    }
}
