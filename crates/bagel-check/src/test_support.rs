//! Fixtures shared by the unit tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use bagel_ast::{Module, Node};
use bagel_core::database::import_path;

use crate::{Analyzer, BagelError, ModuleLoader, NoImports};

/// A parsed module together with its text, for locating nodes by snippet.
pub(crate) struct Source {
    pub(crate) module: Arc<Module>,
    text: String,
}

impl Source {
    pub(crate) fn new(text: &str) -> Self {
        Self::with_path("/main.bgl", text)
    }

    pub(crate) fn with_path(path: &str, text: &str) -> Self {
        let module = bagel_ast::parse(path, text)
            .unwrap_or_else(|err| panic!("{err} at {:?} in {text:?}", err.span));
        Self {
            module: Arc::new(module),
            text: text.to_string(),
        }
    }

    /// Innermost node at the first occurrence of `needle`.
    pub(crate) fn at(&self, needle: &str) -> Node {
        let offset = self
            .text
            .find(needle)
            .unwrap_or_else(|| panic!("{needle:?} not in source"));
        self.module.node_at(offset)
    }

    /// Innermost node at the last occurrence of `needle`.
    pub(crate) fn last(&self, needle: &str) -> Node {
        let offset = self
            .text
            .rfind(needle)
            .unwrap_or_else(|| panic!("{needle:?} not in source"));
        self.module.node_at(offset)
    }

    /// The top-level declaration at `index`.
    pub(crate) fn decl(&self, index: usize) -> Node {
        self.module.declarations().remove(index)
    }

    /// Every diagnostic of the module as `kind: message`.
    pub(crate) fn check(&self, loader: &dyn ModuleLoader) -> Vec<String> {
        let mut out = Vec::new();
        Analyzer::new(loader).typecheck(&self.module, &mut |err: BagelError| {
            out.push(format!("{}: {err}", err.kind()));
        });
        out
    }
}

/// Typecheck a single module with no imports.
pub(crate) fn check(text: &str) -> Vec<String> {
    Source::new(text).check(&NoImports)
}

/// In-memory modules keyed by absolute path.
#[derive(Default)]
pub(crate) struct TestLoader {
    modules: HashMap<PathBuf, Arc<Module>>,
}

impl TestLoader {
    pub(crate) fn add(&mut self, path: &str, text: &str) -> Arc<Module> {
        let module = Source::with_path(path, text).module;
        self.modules.insert(PathBuf::from(path), module.clone());
        module
    }
}

impl ModuleLoader for TestLoader {
    fn get_module_by_name(&self, from: &Module, path: &str) -> Option<Arc<Module>> {
        self.modules.get(&import_path(from.path(), path)).cloned()
    }
}
