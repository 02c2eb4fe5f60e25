use std::sync::Arc;

use bagel_ast::Module;

/// Supplies the modules named by import declarations.
///
/// `path` is the specifier exactly as written in the import; resolving it
/// relative to `from` is the loader's job.
pub trait ModuleLoader {
    fn get_module_by_name(&self, from: &Module, path: &str) -> Option<Arc<Module>>;
}

/// A loader for single-module programs: every import is missing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoImports;

impl ModuleLoader for NoImports {
    fn get_module_by_name(&self, _: &Module, _: &str) -> Option<Arc<Module>> {
        None
    }
}

impl<L: ModuleLoader + ?Sized> ModuleLoader for &L {
    fn get_module_by_name(&self, from: &Module, path: &str) -> Option<Arc<Module>> {
        (**self).get_module_by_name(from, path)
    }
}
