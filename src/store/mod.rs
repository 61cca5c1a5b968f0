//! Symbol store: receivers, methods and inherit/mixin edges as relational rows
//!
//! The store lives in an in-memory SQLite database for the lifetime of one
//! analysis session. Method-resolution queries (ancestor walks, respond-to
//! computation) are set oriented, so they are answered with SQL rather than
//! by walking in-memory objects.

pub mod guesser;
pub mod included_module;
pub mod method_model;
pub mod patcher;
pub mod receiver;
pub mod receiver_respond;

pub use guesser::ReceiverGuesser;
pub use included_module::{EdgeKind, IncludedModule};
pub use method_model::{MethodRow, Visibility};
pub use patcher::RespondPatcher;
pub use receiver::{singleton_fqname, strip_singleton, Receiver, ReceiverKind};
pub use receiver_respond::{ReceiverRespond, RespondSource};

use crate::error::StoreError;
use rusqlite::Connection;

/// Where a receiver, method or edge was declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationSite {
    pub file_path: String,
    pub line: usize,
    pub file_hash: String,
}

impl DeclarationSite {
    pub fn new(file_path: &str, line: usize, file_hash: &str) -> Self {
        Self {
            file_path: file_path.to_string(),
            line,
            file_hash: file_hash.to_string(),
        }
    }
}

pub struct SymbolStore {
    conn: Connection,
}

impl SymbolStore {
    /// Open a fresh in-memory store and create the schema
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch(
            r#"
CREATE TABLE receivers (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    kind         TEXT NOT NULL,
    fqname       TEXT NOT NULL UNIQUE,
    is_singleton INTEGER NOT NULL,
    file_path    TEXT NOT NULL,
    line         INTEGER NOT NULL,
    file_hash    TEXT NOT NULL
);

CREATE TABLE receiver_declarations (
    receiver_id INTEGER NOT NULL,
    file_path   TEXT NOT NULL,
    line        INTEGER NOT NULL,
    file_hash   TEXT NOT NULL
);

CREATE TABLE methods (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    receiver_id INTEGER NOT NULL,
    visibility  TEXT NOT NULL,
    name        TEXT NOT NULL,
    file_path   TEXT NOT NULL,
    line        INTEGER NOT NULL
);

CREATE TABLE included_modules (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    kind          TEXT NOT NULL,
    target_fqname TEXT NOT NULL,
    eval_scope    TEXT NOT NULL,
    passed_name   TEXT NOT NULL,
    file_path     TEXT NOT NULL,
    line          INTEGER NOT NULL
);

CREATE TABLE receiver_responds (
    receiver_fqname TEXT NOT NULL,
    method_name     TEXT NOT NULL,
    source          TEXT NOT NULL
);

CREATE INDEX idx_receiver_declarations_path ON receiver_declarations(file_path);
CREATE INDEX idx_methods_receiver ON methods(receiver_id, name);
CREATE INDEX idx_methods_path ON methods(file_path);
CREATE INDEX idx_included_modules_target ON included_modules(kind, target_fqname);
CREATE INDEX idx_included_modules_path ON included_modules(file_path);
CREATE INDEX idx_receiver_responds_name ON receiver_responds(method_name);
CREATE INDEX idx_receiver_responds_receiver ON receiver_responds(receiver_fqname);
"#,
        )?;

        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Drop every row declared by `path`
    ///
    /// Receivers survive while another file still declares them; their primary
    /// declaration site moves to the oldest remaining one.
    pub fn remove_by_path(&self, path: &str) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute("DELETE FROM methods WHERE file_path = ?1", [path])?;
        tx.execute("DELETE FROM included_modules WHERE file_path = ?1", [path])?;
        tx.execute(
            "DELETE FROM receiver_declarations WHERE file_path = ?1",
            [path],
        )?;
        tx.execute(
            "DELETE FROM receivers WHERE id NOT IN (SELECT receiver_id FROM receiver_declarations)",
            [],
        )?;
        tx.execute(
            r#"
UPDATE receivers SET
    file_path = (SELECT d.file_path FROM receiver_declarations d
                 WHERE d.receiver_id = receivers.id ORDER BY d.rowid LIMIT 1),
    line      = (SELECT d.line FROM receiver_declarations d
                 WHERE d.receiver_id = receivers.id ORDER BY d.rowid LIMIT 1),
    file_hash = (SELECT d.file_hash FROM receiver_declarations d
                 WHERE d.receiver_id = receivers.id ORDER BY d.rowid LIMIT 1)
WHERE file_path = ?1
"#,
            [path],
        )?;
        tx.execute(
            "DELETE FROM methods WHERE receiver_id NOT IN (SELECT id FROM receivers)",
            [],
        )?;
        tx.execute(
            "DELETE FROM receiver_responds WHERE receiver_fqname NOT IN (SELECT fqname FROM receivers)",
            [],
        )?;

        tx.commit()?;
        Ok(())
    }
}
