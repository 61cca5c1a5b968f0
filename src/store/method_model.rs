//! Method declaration rows

use super::SymbolStore;
use crate::error::StoreError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }

    pub fn parse(value: &str) -> Result<Self, StoreError> {
        match value {
            "public" => Ok(Visibility::Public),
            "protected" => Ok(Visibility::Protected),
            "private" => Ok(Visibility::Private),
            other => Err(StoreError::InvalidValue {
                column: "methods.visibility",
                value: other.to_string(),
            }),
        }
    }

    /// Whether a call site allowed `self` visibility may call a method
    /// declared with `declared`
    ///
    /// Private call sites see everything, protected ones see public and
    /// protected methods, public ones see public methods only.
    pub fn permits(&self, declared: Visibility) -> bool {
        match self {
            Visibility::Private => true,
            Visibility::Protected => declared != Visibility::Private,
            Visibility::Public => declared == Visibility::Public,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRow {
    pub id: i64,
    pub receiver_id: i64,
    pub visibility: Visibility,
    pub name: String,
    pub file_path: String,
    pub line: usize,
}

impl SymbolStore {
    pub fn insert_method(
        &self,
        receiver_id: i64,
        visibility: Visibility,
        name: &str,
        file_path: &str,
        line: usize,
    ) -> Result<i64, StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO methods (receiver_id, visibility, name, file_path, line) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![receiver_id, visibility.as_str(), name, file_path, line as i64],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Methods declared directly on a receiver, in declaration order
    pub fn methods_of_receiver(&self, receiver_id: i64) -> Result<Vec<MethodRow>, StoreError> {
        let mut stmt = self.conn().prepare(
            r#"
SELECT id, receiver_id, visibility, name, file_path, line
FROM methods
WHERE receiver_id = ?1
ORDER BY id
"#,
        )?;

        let raw = stmt
            .query_map([receiver_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i64>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(id, receiver_id, visibility, name, file_path, line)| {
                Ok(MethodRow {
                    id,
                    receiver_id,
                    visibility: Visibility::parse(&visibility)?,
                    name,
                    file_path,
                    line: line as usize,
                })
            })
            .collect()
    }

    /// Change the recorded visibility of every declaration of `name` on a receiver
    pub fn change_visibility(
        &self,
        receiver_id: i64,
        name: &str,
        visibility: Visibility,
    ) -> Result<usize, StoreError> {
        let changed = self.conn().execute(
            "UPDATE methods SET visibility = ?1 WHERE receiver_id = ?2 AND name = ?3",
            rusqlite::params![visibility.as_str(), receiver_id, name],
        )?;
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DeclarationSite;

    #[test]
    fn test_visibility_permits() {
        assert!(Visibility::Private.permits(Visibility::Private));
        assert!(Visibility::Protected.permits(Visibility::Protected));
        assert!(!Visibility::Protected.permits(Visibility::Private));
        assert!(Visibility::Public.permits(Visibility::Public));
        assert!(!Visibility::Public.permits(Visibility::Protected));
    }

    #[test]
    fn test_insert_and_change_visibility() {
        let store = SymbolStore::open_in_memory().unwrap();
        store
            .insert_class("Foo", &DeclarationSite::new("foo.rb", 1, "h"))
            .unwrap();
        let foo = store.find_receiver("Foo").unwrap().unwrap();

        store
            .insert_method(foo.id, Visibility::Public, "bar", "foo.rb", 2)
            .unwrap();
        let changed = store
            .change_visibility(foo.id, "bar", Visibility::Private)
            .unwrap();
        assert_eq!(changed, 1);

        let methods = store.methods_of_receiver(foo.id).unwrap();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].visibility, Visibility::Private);
        assert_eq!(methods[0].line, 2);
    }
}
