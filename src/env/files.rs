//! Path interning for analyzed files

use crate::graph::FileId;
use std::collections::HashMap;

/// Maps file paths to compact ids. Ids are never reused within a session.
#[derive(Debug, Default)]
pub struct FileTable {
    ids: HashMap<String, FileId>,
    paths: Vec<String>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, path: &str) -> FileId {
        if let Some(id) = self.ids.get(path) {
            return *id;
        }
        let id = FileId(self.paths.len() as u32);
        self.paths.push(path.to_string());
        self.ids.insert(path.to_string(), id);
        id
    }

    pub fn id_of(&self, path: &str) -> Option<FileId> {
        self.ids.get(path).copied()
    }

    pub fn path_of(&self, id: FileId) -> Option<&str> {
        self.paths.get(id.0 as usize).map(String::as_str)
    }
}
