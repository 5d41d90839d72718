use crate::ir::Module;

pub fn merge_modules(modules: Vec<Module>) -> Module {
    let total = modules.iter().map(|module| module.entries.len()).sum();
    let mut entries = Vec::with_capacity(total);
    for module in modules {
        entries.extend(module.entries);
    }

    Module {
        namespace: None,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::merge_modules;
    use crate::{ir::Module, parse::parse_source, source::SourceManager};

    #[test]
    fn keeps_module_then_entry_order() {
        let mut manager = SourceManager::new();
        let (modules, diags) = parse_source(
            &mut manager,
            "m.om",
            "module @a {\n  class @A1() {}\n  class @A2() {}\n}\nmodule @b {}\nmodule @c {\n  hw.module @C1() {}\n}\n",
        );
        assert!(diags.is_empty());

        let merged = merge_modules(modules);
        let names: Vec<_> = merged
            .entries
            .iter()
            .filter_map(|entry| entry.symbol_name())
            .collect();
        assert_eq!(names, vec!["A1", "A2", "C1"]);
        assert_eq!(merged.namespace, None);
    }

    #[test]
    fn merging_nothing_yields_an_empty_module() {
        assert_eq!(merge_modules(Vec::new()), Module::default());
    }
}
