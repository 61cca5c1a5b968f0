//! Incremental update coordinator
//!
//! The service owns one analysis session. Updating a file invalidates what
//! the previous analysis of that path declared, rebuilds the graph from the
//! new syntax tree, refreshes respond-to rows for the receivers involved and
//! runs the two inference phases over the updated paths.

use crate::analyzer::{AstInstaller, HookTable};
use crate::config::ServiceConfig;
use crate::diagnostics::{Diagnostic, Location};
use crate::env::{GlobalEnv, NodeEntry};
use crate::error::{BuildError, BuildResult, ParseError, ServiceError};
use crate::graph::Constraints;
use crate::parser::parse_ruby_source;
use crate::stdlib::StdlibDeclarations;
use crate::store::RespondPatcher;
use crate::syntax::{node_at, SyntaxTree};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Syntax tree of the last successful analysis of a path
struct AnalyzedFile {
    path: String,
    tree: SyntaxTree,
    file_hash: String,
}

enum FileFailure {
    Parse(ParseError),
    Build(BuildError),
}

#[derive(Default)]
struct BatchReport {
    analyzed: Vec<String>,
    failures: Vec<(String, FileFailure)>,
}

pub struct Service {
    genv: GlobalEnv,
    hooks: HookTable,
    config: ServiceConfig,
    files: HashMap<String, AnalyzedFile>,
    diagnostics: HashMap<String, Vec<Diagnostic>>,
}

impl Service {
    /// Start a session with the stdlib declarations loaded
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let mut genv = GlobalEnv::new()?;
        StdlibDeclarations::load_or_build(config.use_signature_cache).load_into(&mut genv)?;

        Ok(Self {
            genv,
            hooks: HookTable::new(),
            config,
            files: HashMap::new(),
            diagnostics: HashMap::new(),
        })
    }

    pub fn env(&self) -> &GlobalEnv {
        &self.genv
    }

    pub fn env_mut(&mut self) -> &mut GlobalEnv {
        &mut self.genv
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // ===== Updates =====

    /// (Re)analyze one file; `None` reads the content from `path`
    ///
    /// A syntax or build failure is recorded as a diagnostic, the previous
    /// analysis of the path is kept and the failure is returned.
    pub fn update_file(&mut self, path: &Path, content: Option<&str>) -> Result<(), ServiceError> {
        let source = match content {
            Some(content) => content.to_string(),
            None => read_source(path)?,
        };

        let report = self.analyze_batch(vec![(path_key(path), source)])?;
        match report.failures.into_iter().next() {
            None => Ok(()),
            Some((_, FileFailure::Parse(err))) => Err(ServiceError::Parse(err)),
            Some((_, FileFailure::Build(source))) => Err(ServiceError::Build {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Analyze many files, then run inference once over all of them
    ///
    /// Failures are recorded as diagnostics; returns how many files were
    /// analyzed successfully.
    pub fn update_files(&mut self, paths: &[PathBuf]) -> Result<usize, ServiceError> {
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            match read_source(path) {
                Ok(source) => sources.push((path_key(path), source)),
                Err(err) => {
                    tracing::warn!("{}", err);
                    self.diagnostics.insert(
                        path_key(path),
                        vec![Diagnostic::unreadable(path, err.to_string())],
                    );
                }
            }
        }

        let report = self.analyze_batch(sources)?;
        Ok(report.analyzed.len())
    }

    /// Analyze every source file below `dir`
    pub fn add_workspace(&mut self, dir: &Path) -> Result<usize, ServiceError> {
        let paths = self.collect_workspace_files(dir);
        tracing::info!("analyzing {} files in {}", paths.len(), dir.display());
        self.update_files(&paths)
    }

    /// Source files below `dir`, honoring the configured extensions and
    /// excluded directories
    pub fn collect_workspace_files(&self, dir: &Path) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        for entry in WalkDir::new(dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let rel_path = match path.strip_prefix(dir) {
                Ok(p) => p,
                Err(_) => continue,
            };
            if rel_path
                .components()
                .any(|c| self.config.is_excluded_dir(&c.as_os_str().to_string_lossy()))
            {
                continue;
            }
            if self.config.is_source_file(path) {
                paths.push(path.to_path_buf());
            }
        }

        paths
    }

    /// Forget a deleted file
    pub fn remove_file(&mut self, path: &Path) -> Result<(), ServiceError> {
        let key = path_key(path);
        let touched = self.genv.store.receiver_names_by_path(&key)?;

        self.genv.remove_by_path(&key)?;
        self.files.remove(&key);
        self.diagnostics.remove(&key);

        self.patch_responds(&touched)?;
        self.genv.run_fast_pass();
        tracing::debug!("removed {}", key);
        Ok(())
    }

    fn analyze_batch(&mut self, sources: Vec<(String, String)>) -> Result<BatchReport, ServiceError> {
        let mut report = BatchReport::default();

        let mut parsed = Vec::new();
        for (path, source) in sources {
            let file_hash = fingerprint(&source);
            if self.is_current(&path, &file_hash) {
                tracing::debug!("{} is unchanged", path);
                report.analyzed.push(path);
                continue;
            }
            match parse_ruby_source(&source, &path) {
                Ok(tree) => parsed.push(AnalyzedFile {
                    path,
                    tree,
                    file_hash,
                }),
                Err(err) => {
                    tracing::warn!("{}", err);
                    self.diagnostics.insert(
                        path.clone(),
                        vec![Diagnostic::syntax_error(Path::new(&path), &err)],
                    );
                    report.failures.push((path, FileFailure::Parse(err)));
                }
            }
        }
        if parsed.is_empty() {
            return Ok(report);
        }

        let mut touched = Vec::new();
        for file in &parsed {
            touched.extend(self.genv.store.receiver_names_by_path(&file.path)?);
        }

        let mut inferred: Vec<String> = Vec::new();
        let failed = self.build_all(parsed, &mut inferred)?;

        for (file, err) in failed {
            tracing::warn!("failed to analyze {}: {}", file.path, err);
            self.diagnostics.insert(
                file.path.clone(),
                vec![Diagnostic::build_failure(Path::new(&file.path), &err)],
            );
            if self.restore(&file.path)? {
                inferred.push(file.path.clone());
            }
            report.failures.push((file.path, FileFailure::Build(err)));
        }

        for path in &inferred {
            touched.extend(self.genv.store.receiver_names_by_path(path)?);
        }
        self.patch_responds(&touched)?;
        self.run_inference(&inferred);

        report.analyzed.extend(
            inferred
                .into_iter()
                .filter(|path| !self.diagnostics.contains_key(path)),
        );
        Ok(report)
    }

    /// Build every file, retrying the ones that stopped at an undefined
    /// constant for as long as another file of the batch succeeds
    fn build_all(
        &mut self,
        mut pending: Vec<AnalyzedFile>,
        built: &mut Vec<String>,
    ) -> Result<Vec<(AnalyzedFile, BuildError)>, ServiceError> {
        let mut failed = Vec::new();

        loop {
            let built_before = built.len();
            let mut deferred = Vec::new();

            for file in pending {
                self.genv.remove_by_path(&file.path)?;
                match build(&mut self.genv, &self.hooks, &file) {
                    Ok(()) => {
                        self.diagnostics.remove(&file.path);
                        built.push(file.path.clone());
                        self.files.insert(file.path.clone(), file);
                    }
                    Err(err) => {
                        self.genv.remove_by_path(&file.path)?;
                        match err {
                            BuildError::UndefinedConstant { .. } => deferred.push((file, err)),
                            err => failed.push((file, err)),
                        }
                    }
                }
            }

            if deferred.is_empty() || built.len() == built_before {
                failed.extend(deferred);
                return Ok(failed);
            }
            tracing::debug!("retrying {} files with unresolved constants", deferred.len());
            pending = deferred.into_iter().map(|(file, _)| file).collect();
        }
    }

    /// Rebuild the last successful tree of `path` after a failed update
    fn restore(&mut self, path: &str) -> Result<bool, ServiceError> {
        let Some(previous) = self.files.get(path) else {
            return Ok(false);
        };
        match build(&mut self.genv, &self.hooks, previous) {
            Ok(()) => {
                tracing::debug!("restored previous analysis of {}", path);
                Ok(true)
            }
            Err(err) => {
                tracing::debug!("previous analysis of {} no longer builds: {}", path, err);
                self.genv.remove_by_path(path)?;
                self.files.remove(path);
                Ok(false)
            }
        }
    }

    fn is_current(&self, path: &str, file_hash: &str) -> bool {
        !self.diagnostics.contains_key(path)
            && self
                .files
                .get(path)
                .is_some_and(|file| file.file_hash == file_hash)
    }

    /// Recompute respond-to rows of `receivers` and of everything whose
    /// edges mention them
    fn patch_responds(&self, receivers: &[String]) -> Result<(), ServiceError> {
        let patcher = RespondPatcher::new(&self.genv.store);
        let affected = patcher.with_dependents(receivers)?;
        patcher.patch(&affected)?;
        tracing::debug!("patched respond-to rows of {} receivers", affected.len());
        Ok(())
    }

    /// Fast receiver pass over every call, then full inference of `paths`
    fn run_inference(&mut self, paths: &[String]) {
        let calls = self.genv.run_fast_pass();
        tracing::debug!("fast pass over {} calls", calls);

        self.genv.begin_inference_pass();
        for path in paths {
            if let Some(file) = self.genv.files.id_of(path) {
                let vertices = self.genv.infer_file(file);
                tracing::info!("analyzed {}: {} vertices", path, vertices);
            }
        }
        self.genv.end_inference_pass();
    }

    // ===== Queries =====

    /// Type at a position: 1-based line, 0-based column
    ///
    /// Method definitions render as `Owner#name -> ReturnType`.
    pub fn hover(&mut self, path: &Path, line: usize, column: usize) -> Option<String> {
        let key = path_key(path);
        let file = self.files.get(&key)?;
        let node = node_at(&file.tree, line, column)?;

        let entry = self.genv.node_entry(&key, node)?.clone();
        let opened = self.genv.begin_inference_pass();
        let shown = match entry {
            NodeEntry::Vertex(id) => self.genv.infer_vertex(id, &Constraints::none()).show(),
            NodeEntry::Method(method) => {
                let ret = self.genv.infer_method_return(&method, &Constraints::none());
                format!("{} -> {}", method, ret.show())
            }
        };
        if opened {
            self.genv.end_inference_pass();
        }
        Some(shown)
    }

    /// Failures recorded for the latest update of `path`
    pub fn diagnostics(&self, path: &Path) -> &[Diagnostic] {
        self.diagnostics
            .get(&path_key(path))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn definitions(&self, _path: &Path, _line: usize, _column: usize) -> Vec<Location> {
        Vec::new()
    }

    pub fn type_definitions(&self, _path: &Path, _line: usize, _column: usize) -> Vec<Location> {
        Vec::new()
    }

    pub fn references(&self, _path: &Path, _line: usize, _column: usize) -> Vec<Location> {
        Vec::new()
    }

    pub fn rename(
        &self,
        _path: &Path,
        _line: usize,
        _column: usize,
        _new_name: &str,
    ) -> Vec<(Location, String)> {
        Vec::new()
    }

    pub fn completion(&self, _path: &Path, _line: usize, _column: usize) -> Vec<String> {
        Vec::new()
    }

    pub fn code_lens(&self, _path: &Path) -> Vec<(Location, String)> {
        Vec::new()
    }
}

fn build(genv: &mut GlobalEnv, hooks: &HookTable, file: &AnalyzedFile) -> BuildResult<()> {
    AstInstaller::new(genv, hooks, &file.tree, &file.path, &file.file_hash).install()
}

fn read_source(path: &Path) -> Result<String, ServiceError> {
    fs::read_to_string(path).map_err(|source| ServiceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// SHA-256 of the file content, hex encoded
fn fingerprint(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MethodKey;

    fn service() -> Service {
        Service::new(ServiceConfig {
            use_signature_cache: false,
            ..ServiceConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        assert_eq!(
            fingerprint(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_failed_update_keeps_previous_analysis() {
        let mut service = service();
        let path = Path::new("user.rb");
        service
            .update_file(path, Some("class User\n  def name\n    \"anon\"\n  end\nend\n"))
            .unwrap();

        let err = service
            .update_file(path, Some("class User\n  def name\n    Missing\n  end\nend\n"))
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Build {
                source: BuildError::UndefinedConstant { .. },
                ..
            }
        ));

        let diagnostics = service.diagnostics(path);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].location.line, 3);

        let key = MethodKey::new("User", "name", false);
        assert!(service.env().methods.get(&key).is_some());
        assert_eq!(service.hover(path, 2, 7).as_deref(), Some("User#name -> \"anon\""));
    }

    #[test]
    fn test_syntax_error_is_recorded() {
        let mut service = service();
        let path = Path::new("broken.rb");
        let err = service.update_file(path, Some("def broken(\n")).unwrap_err();
        assert!(matches!(err, ServiceError::Parse(_)));
        assert_eq!(service.diagnostics(path)[0].code.as_deref(), Some("E001"));

        service.update_file(path, Some("x = 1\n")).unwrap();
        assert!(service.diagnostics(path).is_empty());
    }

    #[test]
    fn test_batch_retries_files_that_need_later_constants() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_user.rb"), "class User < Base\n  LIMIT = Base\nend\n").unwrap();
        fs::write(dir.path().join("b_base.rb"), "class Base\nend\n").unwrap();

        let mut service = service();
        assert_eq!(service.add_workspace(dir.path()).unwrap(), 2);
        assert!(service.env().consts.find("User::LIMIT").is_some());
        assert!(service.diagnostics(&dir.path().join("a_user.rb")).is_empty());
    }

    #[test]
    fn test_workspace_skips_excluded_dirs_and_other_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("vendor")).unwrap();
        fs::create_dir_all(dir.path().join("app")).unwrap();
        fs::write(dir.path().join("vendor/gem.rb"), "class Gem\nend\n").unwrap();
        fs::write(dir.path().join("app/user.rb"), "class User\nend\n").unwrap();
        fs::write(dir.path().join("README.md"), "# readme\n").unwrap();

        let service = service();
        let files = service.collect_workspace_files(dir.path());
        assert_eq!(files, vec![dir.path().join("app/user.rb")]);
    }

    #[test]
    fn test_remove_file_forgets_declarations() {
        let mut service = service();
        let path = Path::new("a.rb");
        service
            .update_file(path, Some("class Foo\n  def bar\n  end\nend\n"))
            .unwrap();
        assert!(service.env().consts.find("Foo").is_some());

        service.remove_file(path).unwrap();
        assert!(service.env().consts.find("Foo").is_none());
        assert!(service.env().store.find_receiver("Foo").unwrap().is_none());
        assert_eq!(service.hover(path, 1, 0), None);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut service = service();
        let err = service
            .update_file(Path::new("/nonexistent/hifriend/a.rb"), None)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Io { .. }));
    }

    #[test]
    fn test_editor_stubs_are_empty() {
        let service = service();
        let path = Path::new("a.rb");
        assert!(service.definitions(path, 1, 0).is_empty());
        assert!(service.type_definitions(path, 1, 0).is_empty());
        assert!(service.references(path, 1, 0).is_empty());
        assert!(service.rename(path, 1, 0, "other").is_empty());
        assert!(service.completion(path, 1, 0).is_empty());
        assert!(service.code_lens(path).is_empty());
    }
}
