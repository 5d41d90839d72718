use indexmap::IndexMap;
use tracing::debug;

use crate::ir::{Entry, Module};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleSymbols {
    pub classes: IndexMap<String, usize>,
    pub hw_modules: IndexMap<String, usize>,
}

// Duplicate names inside one module are not diagnosed; the table keeps the last entry.
pub fn scan_module(module_idx: usize, module: &mut Module) -> ModuleSymbols {
    module.entries.retain(|entry| match entry {
        Entry::Other(op) => {
            debug!(module = module_idx, op = %op.name, "discarding unrecognized entry");
            false
        }
        Entry::Class(_) | Entry::HwModule(_) => true,
    });

    let mut symbols = ModuleSymbols::default();
    for (idx, entry) in module.entries.iter().enumerate() {
        match entry {
            Entry::Class(class) => {
                symbols.classes.insert(class.name().to_string(), idx);
            }
            Entry::HwModule(hw_module) => {
                symbols.hw_modules.insert(hw_module.name().to_string(), idx);
            }
            Entry::Other(_) => {}
        }
    }

    debug!(
        module = module_idx,
        classes = symbols.classes.len(),
        hw_modules = symbols.hw_modules.len(),
        "scanned module"
    );
    symbols
}

#[cfg(test)]
mod tests {
    use super::scan_module;
    use crate::{ir::Entry, parse::parse_source, source::SourceManager};

    fn parse_one(text: &str) -> crate::ir::Module {
        let mut manager = SourceManager::new();
        let (mut modules, diags) = parse_source(&mut manager, "scan.om", text);
        assert!(diags.is_empty(), "diagnostics: {diags:#?}");
        modules.remove(0)
    }

    #[test]
    fn partitions_entries_and_drops_others() {
        let mut module = parse_one(
            r#"module {
  sv.verbatim() [text = "x"]
  class @A() {}
  hw.module.extern @Sub(in a: i1)
  om.constant() [value = 1]
  extern class @B() {}
  hw.module @Top() {}
}"#,
        );
        let symbols = scan_module(0, &mut module);

        assert_eq!(module.entries.len(), 4);
        assert!(module.entries.iter().all(|entry| !matches!(entry, Entry::Other(_))));
        assert_eq!(
            symbols.classes.iter().map(|(k, v)| (k.as_str(), *v)).collect::<Vec<_>>(),
            vec![("A", 0), ("B", 2)]
        );
        assert_eq!(
            symbols.hw_modules.iter().map(|(k, v)| (k.as_str(), *v)).collect::<Vec<_>>(),
            vec![("Sub", 1), ("Top", 3)]
        );
    }

    #[test]
    fn duplicate_names_keep_the_last_entry() {
        let mut module = parse_one("module {\n  class @A() {}\n  class @B() {}\n  class @A(%x: i1) {}\n}\n");
        let symbols = scan_module(0, &mut module);

        assert_eq!(symbols.classes.len(), 2);
        assert_eq!(symbols.classes["A"], 2);
        assert_eq!(symbols.classes.get_index(0).map(|(name, _)| name.as_str()), Some("A"));
    }

    #[test]
    fn scanning_is_idempotent() {
        let mut module = parse_one(
            "module {\n  hw.module private @H() {}\n  om.any()\n  class @C() {}\n}\n",
        );
        let first = scan_module(0, &mut module);
        let snapshot = module.clone();
        let second = scan_module(0, &mut module);

        assert_eq!(first, second);
        assert_eq!(module, snapshot);
    }
}
