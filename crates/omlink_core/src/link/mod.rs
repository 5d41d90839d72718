mod compat;
mod error;
mod merge;
mod namespace;
mod resolve;
mod rewrite;
mod scan;

use tracing::{info, info_span};

use crate::{ir::Module, parallel::parallel_map};

pub use crate::ir::SymbolKind;
pub use error::{LinkError, Mismatch};
pub use merge::merge_modules;
pub use namespace::Namespace;
pub use resolve::RenameMap;
pub use rewrite::rewrite_module;
pub use scan::{ModuleSymbols, scan_module};

#[derive(Clone, Debug, Default)]
pub struct LinkOptions {
    pub jobs: usize,
}

pub fn link_modules(mut modules: Vec<Module>, opts: &LinkOptions) -> Result<Module, LinkError> {
    let _span = info_span!("link_modules", modules = modules.len(), jobs = opts.jobs).entered();

    assign_namespaces(&mut modules);

    let tables = parallel_map(&mut modules, opts.jobs, scan_module);
    let renames = resolve::resolve_symbols(&modules, &tables)?;

    parallel_map(&mut modules, opts.jobs, |idx, module| {
        rewrite_module(idx, module, &renames)
    });

    let merged = merge_modules(modules);
    info!(
        entries = merged.entries.len(),
        renamed = renames.len(),
        "linked modules"
    );
    Ok(merged)
}

// Only unnamed modules advance the `module_<n>` counter.
pub fn assign_namespaces(modules: &mut [Module]) {
    let mut counter = 0;
    for module in modules {
        module.namespace.get_or_insert_with(|| {
            let namespace = format!("module_{counter}");
            counter += 1;
            namespace
        });
    }
}

#[cfg(test)]
mod tests {
    use super::assign_namespaces;
    use crate::ir::Module;

    #[test]
    fn unnamed_modules_are_numbered_in_order() {
        let mut modules = vec![
            Module::default(),
            Module {
                namespace: Some("core".into()),
                entries: Vec::new(),
            },
            Module::default(),
        ];
        assign_namespaces(&mut modules);

        let namespaces: Vec<_> = modules
            .iter()
            .map(|module| module.namespace.as_deref())
            .collect();
        assert_eq!(
            namespaces,
            vec![Some("module_0"), Some("core"), Some("module_1")]
        );
    }
}
