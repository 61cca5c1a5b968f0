//! Respond-to rows: the flattened method names each receiver answers to

use super::SymbolStore;
use crate::error::StoreError;
use rusqlite::ToSql;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespondSource {
    /// Declared on the receiver itself
    SelfMethod,
    Inherit,
    Mixin,
}

impl RespondSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RespondSource::SelfMethod => "self",
            RespondSource::Inherit => "inherit",
            RespondSource::Mixin => "mixin",
        }
    }

    pub fn parse(value: &str) -> Result<Self, StoreError> {
        match value {
            "self" => Ok(RespondSource::SelfMethod),
            "inherit" => Ok(RespondSource::Inherit),
            "mixin" => Ok(RespondSource::Mixin),
            other => Err(StoreError::InvalidValue {
                column: "receiver_responds.source",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverRespond {
    pub receiver_fqname: String,
    pub method_name: String,
    pub source: RespondSource,
}

impl SymbolStore {
    /// Replace every respond-to row of one receiver
    pub fn replace_responds(
        &self,
        receiver_fqname: &str,
        rows: &[(String, RespondSource)],
    ) -> Result<(), StoreError> {
        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "DELETE FROM receiver_responds WHERE receiver_fqname = ?1",
            [receiver_fqname],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO receiver_responds (receiver_fqname, method_name, source) VALUES (?1, ?2, ?3)",
            )?;
            for (method_name, source) in rows {
                stmt.execute(rusqlite::params![receiver_fqname, method_name, source.as_str()])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn delete_responds(&self, receiver_fqname: &str) -> Result<(), StoreError> {
        self.conn().execute(
            "DELETE FROM receiver_responds WHERE receiver_fqname = ?1",
            [receiver_fqname],
        )?;
        Ok(())
    }

    /// Respond-to rows of one receiver in insertion order
    pub fn responds_of(&self, receiver_fqname: &str) -> Result<Vec<ReceiverRespond>, StoreError> {
        let mut stmt = self.conn().prepare(
            r#"
SELECT receiver_fqname, method_name, source
FROM receiver_responds
WHERE receiver_fqname = ?1
ORDER BY rowid
"#,
        )?;
        let raw = stmt
            .query_map([receiver_fqname], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(receiver_fqname, method_name, source)| {
                Ok(ReceiverRespond {
                    receiver_fqname,
                    method_name,
                    source: RespondSource::parse(&source)?,
                })
            })
            .collect()
    }

    /// Receivers that respond to every name in `method_names`
    ///
    /// With `self_only`, only methods declared on the receiver itself count.
    pub fn receivers_respond_to(
        &self,
        method_names: &[String],
        self_only: bool,
    ) -> Result<Vec<String>, StoreError> {
        if method_names.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; method_names.len()].join(", ");
        let source_filter = if self_only { "AND source = 'self'" } else { "" };
        let sql = format!(
            r#"
SELECT receiver_fqname FROM receiver_responds
WHERE method_name IN ({}) {}
GROUP BY receiver_fqname
HAVING COUNT(DISTINCT method_name) = ?
ORDER BY MIN(rowid)
"#,
            placeholders, source_filter
        );

        let count = method_names.len() as i64;
        let mut params: Vec<&dyn ToSql> = method_names.iter().map(|n| n as &dyn ToSql).collect();
        params.push(&count);

        let mut stmt = self.conn().prepare(&sql)?;
        let names = stmt
            .query_map(params.as_slice(), |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(items: &[(&str, RespondSource)]) -> Vec<(String, RespondSource)> {
        items.iter().map(|(n, s)| (n.to_string(), *s)).collect()
    }

    #[test]
    fn test_replace_responds_overwrites() {
        let store = SymbolStore::open_in_memory().unwrap();
        store
            .replace_responds("A", &rows(&[("a", RespondSource::SelfMethod)]))
            .unwrap();
        store
            .replace_responds("A", &rows(&[("b", RespondSource::Inherit)]))
            .unwrap();

        let responds = store.responds_of("A").unwrap();
        assert_eq!(responds.len(), 1);
        assert_eq!(responds[0].method_name, "b");
        assert_eq!(responds[0].source, RespondSource::Inherit);
    }

    #[test]
    fn test_receivers_respond_to_requires_all_names() {
        let store = SymbolStore::open_in_memory().unwrap();
        store
            .replace_responds(
                "A",
                &rows(&[
                    ("run", RespondSource::SelfMethod),
                    ("stop", RespondSource::SelfMethod),
                    // duplicate name from an ancestor must not inflate the count
                    ("run", RespondSource::Inherit),
                ]),
            )
            .unwrap();
        store
            .replace_responds("B", &rows(&[("run", RespondSource::Inherit)]))
            .unwrap();

        let names = vec!["run".to_string(), "stop".to_string()];
        assert_eq!(store.receivers_respond_to(&names, false).unwrap(), vec!["A".to_string()]);

        let run = vec!["run".to_string()];
        assert_eq!(
            store.receivers_respond_to(&run, false).unwrap(),
            vec!["A".to_string(), "B".to_string()]
        );
        assert_eq!(store.receivers_respond_to(&run, true).unwrap(), vec!["A".to_string()]);
        assert!(store.receivers_respond_to(&[], false).unwrap().is_empty());
    }
}
