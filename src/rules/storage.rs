use std::path::{Path, PathBuf};

use super::rule::Rule;
use crate::error::{Result, TidyError};

/// Rules kept as a pretty-printed JSON array in a single file.
pub struct RuleStorage {
    path: PathBuf,
}

impl RuleStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty rule set.
    pub fn all(&self) -> Result<Vec<Rule>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn get(&self, id: &str) -> Result<Option<Rule>> {
        Ok(self.all()?.into_iter().find(|r| r.id == id))
    }

    /// Look a rule up by full id or a unique id prefix.
    pub fn resolve(&self, id_or_prefix: &str) -> Result<Rule> {
        if let Some(rule) = self.get(id_or_prefix)? {
            return Ok(rule);
        }
        let mut matches = self.all()?.into_iter().filter(|r| r.id.starts_with(id_or_prefix));
        match (matches.next(), matches.next()) {
            (Some(rule), None) if !id_or_prefix.is_empty() => Ok(rule),
            (Some(_), Some(_)) => Err(TidyError::InvalidRule(format!(
                "ID prefix '{id_or_prefix}' matches more than one rule"
            ))),
            _ => Err(TidyError::UnknownRule(id_or_prefix.to_string())),
        }
    }

    /// Insert, or replace the rule with the same id.
    pub fn save(&self, rule: &Rule) -> Result<()> {
        let mut rules = self.all()?;
        match rules.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule.clone(),
            None => rules.push(rule.clone()),
        }
        self.write(&rules)
    }

    /// Returns false when no rule had that id.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut rules = self.all()?;
        let before = rules.len();
        rules.retain(|r| r.id != id);
        if rules.len() == before {
            return Ok(false);
        }
        self.write(&rules)?;
        Ok(true)
    }

    fn write(&self, rules: &[Rule]) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(rules)?;
        std::fs::write(&self.path, format!("{json}\n"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::action::Action;
    use crate::rules::condition::Condition;

    fn storage() -> (tempfile::TempDir, RuleStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = RuleStorage::new(dir.path().join("nested").join("rules.json"));
        (dir, storage)
    }

    fn rule(name: &str) -> Rule {
        Rule::new(
            name,
            vec![Condition::parse("payee_name contains x").unwrap()],
            vec![Action::parse("memo set y").unwrap()],
        )
    }

    #[test]
    fn test_missing_file_is_empty() {
        let (_dir, storage) = storage();
        assert!(storage.all().unwrap().is_empty());
        assert!(storage.get("nope").unwrap().is_none());
    }

    #[test]
    fn test_save_creates_file_and_upserts() {
        let (_dir, storage) = storage();
        let mut r = rule("First");
        storage.save(&r).unwrap();
        assert!(storage.path().exists());

        r.priority = 7;
        storage.save(&r).unwrap();
        storage.save(&rule("Second")).unwrap();

        let all = storage.all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(storage.get(&r.id).unwrap().unwrap().priority, 7);
    }

    #[test]
    fn test_delete() {
        let (_dir, storage) = storage();
        let r = rule("Gone");
        storage.save(&r).unwrap();
        assert!(storage.delete(&r.id).unwrap());
        assert!(!storage.delete(&r.id).unwrap());
        assert!(storage.all().unwrap().is_empty());
    }

    #[test]
    fn test_resolve_by_prefix() {
        let (_dir, storage) = storage();
        let mut a = rule("A");
        a.id = "aaaa1111".to_string();
        let mut b = rule("B");
        b.id = "aaaa2222".to_string();
        storage.save(&a).unwrap();
        storage.save(&b).unwrap();

        assert_eq!(storage.resolve("aaaa1").unwrap().name, "A");
        assert!(matches!(storage.resolve("aaaa"), Err(TidyError::InvalidRule(_))));
        assert_eq!(storage.resolve("aaaa2222").unwrap().name, "B");
        // A full id wins even when it is also a prefix of another id.
        let mut c = rule("C");
        c.id = "aaaa".to_string();
        storage.save(&c).unwrap();
        assert_eq!(storage.resolve("aaaa").unwrap().name, "C");
        assert!(matches!(storage.resolve("zz"), Err(TidyError::UnknownRule(_))));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let (_dir, storage) = storage();
        std::fs::create_dir_all(storage.path().parent().unwrap()).unwrap();
        std::fs::write(storage.path(), "{not json").unwrap();
        assert!(matches!(storage.all(), Err(TidyError::Json(_))));
    }
}
