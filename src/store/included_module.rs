//! Inherit and mixin edges between receivers

use super::{singleton_fqname, SymbolStore};
use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Inherit,
    Mixin,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Inherit => "inherit",
            EdgeKind::Mixin => "mixin",
        }
    }

    pub fn parse(value: &str) -> Result<Self, StoreError> {
        match value {
            "inherit" => Ok(EdgeKind::Inherit),
            "mixin" => Ok(EdgeKind::Mixin),
            other => Err(StoreError::InvalidValue {
                column: "included_modules.kind",
                value: other.to_string(),
            }),
        }
    }
}

/// One edge: `target_fqname` inherits from or mixes in `passed_name`, which is
/// resolved lexically against `eval_scope`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludedModule {
    pub id: i64,
    pub kind: EdgeKind,
    pub target_fqname: String,
    pub eval_scope: String,
    pub passed_name: String,
    pub file_path: String,
    pub line: usize,
}

impl SymbolStore {
    pub fn insert_edge(
        &self,
        kind: EdgeKind,
        target_fqname: &str,
        eval_scope: &str,
        passed_name: &str,
        file_path: &str,
        line: usize,
    ) -> Result<i64, StoreError> {
        let conn = self.conn();
        conn.execute(
            r#"
INSERT INTO included_modules (kind, target_fqname, eval_scope, passed_name, file_path, line)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#,
            rusqlite::params![
                kind.as_str(),
                target_fqname,
                eval_scope,
                passed_name,
                file_path,
                line as i64
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Superclass edge for both the instance and the singleton receiver
    pub fn insert_inherit(
        &self,
        target_fqname: &str,
        eval_scope: &str,
        passed_name: &str,
        file_path: &str,
        line: usize,
    ) -> Result<(), StoreError> {
        self.insert_edge(
            EdgeKind::Inherit,
            target_fqname,
            eval_scope,
            passed_name,
            file_path,
            line,
        )?;
        self.insert_edge(
            EdgeKind::Inherit,
            &singleton_fqname(target_fqname),
            eval_scope,
            passed_name,
            file_path,
            line,
        )?;
        Ok(())
    }

    /// Edges of one kind recorded on `target_fqname`, in insertion order
    pub fn edges_of(
        &self,
        kind: EdgeKind,
        target_fqname: &str,
    ) -> Result<Vec<IncludedModule>, StoreError> {
        let mut stmt = self.conn().prepare(
            r#"
SELECT id, kind, target_fqname, eval_scope, passed_name, file_path, line
FROM included_modules
WHERE kind = ?1 AND target_fqname = ?2
ORDER BY id
"#,
        )?;
        let raw = stmt
            .query_map(rusqlite::params![kind.as_str(), target_fqname], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, i64>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(
                |(id, kind, target_fqname, eval_scope, passed_name, file_path, line)| {
                    Ok(IncludedModule {
                        id,
                        kind: EdgeKind::parse(&kind)?,
                        target_fqname,
                        eval_scope,
                        passed_name,
                        file_path,
                        line: line as usize,
                    })
                },
            )
            .collect()
    }

    /// Targets of edges whose passed name ends with the last segment of `fqname`
    ///
    /// This over-approximates the receivers whose ancestry may mention `fqname`;
    /// callers resolve the edges properly afterwards.
    pub fn edge_targets_mentioning(&self, fqname: &str) -> Result<Vec<String>, StoreError> {
        let last = fqname.rsplit("::").next().unwrap_or(fqname);
        let mut stmt = self.conn().prepare(
            r#"
SELECT DISTINCT target_fqname FROM included_modules
WHERE passed_name = ?1 OR passed_name LIKE ?2
ORDER BY target_fqname
"#,
        )?;
        let targets = stmt
            .query_map(rusqlite::params![last, format!("%::{}", last)], |row| {
                row.get(0)
            })?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(targets)
    }
}
