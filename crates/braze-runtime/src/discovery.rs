//! Handler-definition discovery.
//!
//! The core consumes discovery as a collaborator: something that yields the
//! ordered [`Definition`]s to load, without the core interpreting where they
//! came from. Two implementations are provided:
//!
//! - [`StaticSource`] for definitions built in code, and
//! - [`FsHandlerSource`], which walks a directory tree for files with a
//!   configured name suffix and maps each through an injected registrar.

use std::path::{Path, PathBuf};

use braze_core::Definition;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// The discovery collaborator.
pub trait HandlerSource {
    /// Yields the definitions to load, in registration order.
    ///
    /// An empty result is a valid no-op, not an error.
    fn definitions(&mut self) -> Vec<Definition>;
}

/// A source over definitions built in code.
pub struct StaticSource {
    definitions: Vec<Definition>,
}

impl StaticSource {
    /// Wraps a prebuilt definition list.
    pub fn new(definitions: Vec<Definition>) -> Self {
        Self { definitions }
    }
}

impl HandlerSource for StaticSource {
    fn definitions(&mut self) -> Vec<Definition> {
        std::mem::take(&mut self.definitions)
    }
}

/// Maps one discovered file location to its definitions.
///
/// The registrar owns the file format; discovery only finds the files.
pub type Registrar = Box<dyn FnMut(&Path) -> Vec<Definition> + Send>;

/// Discovers definition files under a root directory by name suffix.
pub struct FsHandlerSource {
    root: PathBuf,
    suffix: String,
    registrar: Registrar,
}

impl FsHandlerSource {
    /// Creates a source scanning `root` recursively for files whose names
    /// end with `suffix`, mapping each through `registrar`.
    pub fn new(
        root: impl Into<PathBuf>,
        suffix: impl Into<String>,
        registrar: impl FnMut(&Path) -> Vec<Definition> + Send + 'static,
    ) -> Self {
        Self {
            root: root.into(),
            suffix: suffix.into(),
            registrar: Box::new(registrar),
        }
    }

    /// Returns the matching file paths under the root, sorted for a
    /// deterministic registration order.
    fn scan(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry during handler scan");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.ends_with(&self.suffix))
            })
            .map(|entry| entry.into_path())
            .collect();
        files.sort();
        files
    }
}

impl HandlerSource for FsHandlerSource {
    fn definitions(&mut self) -> Vec<Definition> {
        let files = self.scan();
        debug!(
            root = %self.root.display(),
            files = files.len(),
            "handler scan complete"
        );
        files
            .iter()
            .flat_map(|path| (self.registrar)(path))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use braze_core::handler;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    #[test]
    fn static_source_yields_once() {
        let mut source = StaticSource::new(vec![Definition::command(
            "!ping",
            vec![handler(|_ctx| async { Ok(()) })],
        )]);
        assert_eq!(source.definitions().len(), 1);
        assert!(source.definitions().is_empty());
    }

    #[test]
    fn fs_source_finds_suffixed_files_recursively() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("ping.handler.toml"));
        touch(&dir.path().join("nested/deep/cron.handler.toml"));
        touch(&dir.path().join("README.md"));

        let mut seen = Vec::new();
        let mut source = FsHandlerSource::new(dir.path(), ".handler.toml", move |path: &Path| {
            vec![Definition::command(
                format!("!{}", path.file_name().unwrap().to_string_lossy()),
                vec![handler(|_ctx| async { Ok(()) })],
            )]
        });

        for def in source.definitions() {
            seen.push(def.name().to_string());
        }
        assert_eq!(
            seen,
            vec!["!cron.handler.toml".to_string(), "!ping.handler.toml".to_string()]
        );
    }

    #[test]
    fn empty_scan_is_a_silent_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut source =
            FsHandlerSource::new(dir.path(), ".handler.toml", |_: &Path| Vec::new());
        assert!(source.definitions().is_empty());
    }
}
