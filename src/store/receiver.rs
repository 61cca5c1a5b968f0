//! Receiver rows: classes, modules and their singleton classes

use super::{DeclarationSite, SymbolStore};
use crate::error::StoreError;
use rusqlite::{OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiverKind {
    Class,
    Module,
}

impl ReceiverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiverKind::Class => "Class",
            ReceiverKind::Module => "Module",
        }
    }

    pub fn parse(value: &str) -> Result<Self, StoreError> {
        match value {
            "Class" => Ok(ReceiverKind::Class),
            "Module" => Ok(ReceiverKind::Module),
            other => Err(StoreError::InvalidValue {
                column: "receivers.kind",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receiver {
    pub id: i64,
    pub kind: ReceiverKind,
    pub fqname: String,
    pub is_singleton: bool,
    pub file_path: String,
    pub line: usize,
    pub file_hash: String,
}

impl Receiver {
    /// Name of the class or module without the `singleton(...)` wrapper
    pub fn base_name(&self) -> &str {
        strip_singleton(&self.fqname).0
    }
}

/// `Foo` -> `singleton(Foo)`
pub fn singleton_fqname(name: &str) -> String {
    format!("singleton({})", name)
}

/// `singleton(Foo)` -> (`Foo`, true), `Foo` -> (`Foo`, false)
pub fn strip_singleton(fqname: &str) -> (&str, bool) {
    match fqname
        .strip_prefix("singleton(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (inner, true),
        None => (fqname, false),
    }
}

const RECEIVER_COLUMNS: &str = "id, kind, fqname, is_singleton, file_path, line, file_hash";

type RawReceiver = (i64, String, String, bool, String, i64, String);

fn raw_receiver(row: &Row) -> rusqlite::Result<RawReceiver> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn into_receiver(raw: RawReceiver) -> Result<Receiver, StoreError> {
    let (id, kind, fqname, is_singleton, file_path, line, file_hash) = raw;
    Ok(Receiver {
        id,
        kind: ReceiverKind::parse(&kind)?,
        fqname,
        is_singleton,
        file_path,
        line: line as usize,
        file_hash,
    })
}

impl SymbolStore {
    /// Record a class declaration: the instance and singleton receivers
    pub fn insert_class(&self, fqname: &str, site: &DeclarationSite) -> Result<(), StoreError> {
        self.insert_receiver(ReceiverKind::Class, fqname, false, site)?;
        self.insert_receiver(ReceiverKind::Class, &singleton_fqname(fqname), true, site)?;
        Ok(())
    }

    /// Record a module declaration
    ///
    /// The instance form holds the module's methods for mixin resolution; the
    /// singleton form holds `def self.x` and `module_function` copies.
    pub fn insert_module(&self, fqname: &str, site: &DeclarationSite) -> Result<(), StoreError> {
        self.insert_receiver(ReceiverKind::Module, fqname, false, site)?;
        self.insert_receiver(ReceiverKind::Module, &singleton_fqname(fqname), true, site)?;
        Ok(())
    }

    /// Insert one receiver row, or add a declaration site to an existing one
    pub fn insert_receiver(
        &self,
        kind: ReceiverKind,
        fqname: &str,
        is_singleton: bool,
        site: &DeclarationSite,
    ) -> Result<i64, StoreError> {
        let conn = self.conn();
        conn.execute(
            r#"
INSERT INTO receivers (kind, fqname, is_singleton, file_path, line, file_hash)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
ON CONFLICT(fqname) DO NOTHING
"#,
            rusqlite::params![
                kind.as_str(),
                fqname,
                is_singleton,
                &site.file_path,
                site.line as i64,
                &site.file_hash
            ],
        )?;

        let id: i64 = conn.query_row(
            "SELECT id FROM receivers WHERE fqname = ?1",
            [fqname],
            |row| row.get(0),
        )?;

        conn.execute(
            "INSERT INTO receiver_declarations (receiver_id, file_path, line, file_hash) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![id, &site.file_path, site.line as i64, &site.file_hash],
        )?;

        Ok(id)
    }

    pub fn find_receiver(&self, fqname: &str) -> Result<Option<Receiver>, StoreError> {
        let raw = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM receivers WHERE fqname = ?1", RECEIVER_COLUMNS),
                [fqname],
                raw_receiver,
            )
            .optional()?;

        raw.map(into_receiver).transpose()
    }

    /// Resolve a constant name written inside `eval_scope` to a receiver
    ///
    /// Enclosing scopes are tried from the innermost outward, then the top
    /// level. A leading `::` resolves from the top level only.
    pub fn resolve_name_to_receiver(
        &self,
        eval_scope: &str,
        passed_name: &str,
    ) -> Result<Option<Receiver>, StoreError> {
        if let Some(absolute) = passed_name.strip_prefix("::") {
            return self.find_receiver(absolute);
        }

        let tokens: Vec<&str> = if eval_scope.is_empty() {
            Vec::new()
        } else {
            eval_scope.split("::").collect()
        };

        for depth in (0..=tokens.len()).rev() {
            let candidate = if depth == 0 {
                passed_name.to_string()
            } else {
                format!("{}::{}", tokens[..depth].join("::"), passed_name)
            };
            if let Some(receiver) = self.find_receiver(&candidate)? {
                return Ok(Some(receiver));
            }
        }

        Ok(None)
    }

    /// Receivers with a declaration site in `path`
    pub fn receiver_names_by_path(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn().prepare(
            r#"
SELECT DISTINCT r.fqname FROM receivers r
JOIN receiver_declarations d ON d.receiver_id = r.id
WHERE d.file_path = ?1
ORDER BY r.id
"#,
        )?;
        let names = stmt
            .query_map([path], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    pub fn all_receiver_names(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn().prepare("SELECT fqname FROM receivers ORDER BY id")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(path: &str) -> DeclarationSite {
        DeclarationSite::new(path, 1, "hash")
    }

    #[test]
    fn test_insert_class_creates_both_forms() {
        let store = SymbolStore::open_in_memory().unwrap();
        store.insert_class("Foo", &site("foo.rb")).unwrap();

        let foo = store.find_receiver("Foo").unwrap().unwrap();
        assert_eq!(foo.kind, ReceiverKind::Class);
        assert!(!foo.is_singleton);

        let singleton = store.find_receiver("singleton(Foo)").unwrap().unwrap();
        assert!(singleton.is_singleton);
        assert_eq!(singleton.base_name(), "Foo");
    }

    #[test]
    fn test_reopening_does_not_duplicate_receiver() {
        let store = SymbolStore::open_in_memory().unwrap();
        store.insert_class("Foo", &site("a.rb")).unwrap();
        store.insert_class("Foo", &site("b.rb")).unwrap();

        assert_eq!(
            store.all_receiver_names().unwrap(),
            vec!["Foo".to_string(), "singleton(Foo)".to_string()]
        );
        assert_eq!(store.find_receiver("Foo").unwrap().unwrap().file_path, "a.rb");
        assert_eq!(
            store.receiver_names_by_path("b.rb").unwrap(),
            vec!["Foo".to_string(), "singleton(Foo)".to_string()]
        );
    }

    #[test]
    fn test_resolve_name_to_receiver_walks_outward() {
        let store = SymbolStore::open_in_memory().unwrap();
        store.insert_class("Base", &site("a.rb")).unwrap();
        store.insert_class("Api::Base", &site("a.rb")).unwrap();

        let inner = store
            .resolve_name_to_receiver("Api::V1", "Base")
            .unwrap()
            .unwrap();
        assert_eq!(inner.fqname, "Api::Base");

        let top = store.resolve_name_to_receiver("Object", "Base").unwrap().unwrap();
        assert_eq!(top.fqname, "Base");

        let absolute = store
            .resolve_name_to_receiver("Api", "::Base")
            .unwrap()
            .unwrap();
        assert_eq!(absolute.fqname, "Base");

        assert!(store.resolve_name_to_receiver("Api", "Missing").unwrap().is_none());
    }

    #[test]
    fn test_strip_singleton() {
        assert_eq!(strip_singleton("singleton(A::B)"), ("A::B", true));
        assert_eq!(strip_singleton("A::B"), ("A::B", false));
    }
}
