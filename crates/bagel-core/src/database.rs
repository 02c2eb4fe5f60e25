use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use derive_more::{Display, Error};
use salsa::Setter;

/// File extension appended to import paths written without one.
pub const SOURCE_EXTENSION: &str = "bgl";

#[salsa::input(debug)]
pub struct SourceFile {
    #[returns(ref)]
    pub path: PathBuf,
    #[returns(ref)]
    pub text: String,
}

#[derive(Debug, Display, Error)]
pub enum DatabaseError {
    #[display("cannot read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[salsa::db]
pub trait Db: salsa::Database {
    /// Look up (or load from disk) the source file at `path`.
    fn input(&self, path: PathBuf) -> Result<SourceFile, DatabaseError>;
}

#[derive(Default, Clone)]
#[salsa::db]
pub struct BagelDatabaseImpl {
    storage: salsa::Storage<Self>,
    /// Loaded source files, keyed by normalized path.
    files: Arc<DashMap<PathBuf, SourceFile>>,
}

#[salsa::db]
impl salsa::Database for BagelDatabaseImpl {}

#[salsa::db]
impl Db for BagelDatabaseImpl {
    fn input(&self, path: PathBuf) -> Result<SourceFile, DatabaseError> {
        let key = normalize(&path);
        if let Some(file) = self.files.get(&key) {
            return Ok(*file);
        }

        let path = path
            .canonicalize()
            .map_err(|source| DatabaseError::Read {
                path: path.clone(),
                source,
            })?;
        match self.files.entry(path.clone()) {
            Entry::Occupied(entry) => Ok(*entry.get()),
            Entry::Vacant(entry) => {
                let contents =
                    std::fs::read_to_string(&path).map_err(|source| DatabaseError::Read {
                        path: path.clone(),
                        source,
                    })?;
                tracing::debug!(path = %path.display(), "loaded source file");
                let file = SourceFile::new(self, path, contents);
                Ok(*entry.insert(file))
            }
        }
    }
}

impl BagelDatabaseImpl {
    /// Register (or replace the text of) an in-memory source file.
    ///
    /// Files registered here shadow the filesystem, which is how tests and
    /// editors feed unsaved buffers to the pipeline.
    pub fn set_source(&mut self, path: impl AsRef<Path>, text: impl Into<String>) -> SourceFile {
        let key = normalize(path.as_ref());
        let text = text.into();
        let existing = self.files.get(&key).map(|file| *file);
        match existing {
            Some(file) => {
                file.set_text(self).to(text);
                file
            }
            None => {
                let file = SourceFile::new(self, key.clone(), text);
                self.files.insert(key, file);
                file
            }
        }
    }

    pub fn remove_source(&self, path: impl AsRef<Path>) {
        self.files.remove(&normalize(path.as_ref()));
    }
}

/// Resolve an import specifier relative to the importing file.
pub fn import_path(from: &Path, specifier: &str) -> PathBuf {
    let base = from.parent().unwrap_or_else(|| Path::new(""));
    let mut path = base.join(specifier);
    if path.extension().is_none() {
        path.set_extension(SOURCE_EXTENSION);
    }
    normalize(&path)
}

/// Lexically normalize a path, folding `.` and `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
