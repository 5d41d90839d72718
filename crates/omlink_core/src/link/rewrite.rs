use super::resolve::RenameMap;
use crate::{
    ir::{Entry, Module, Symbol, SymbolKind},
    walk::RewriteSymbols,
};

pub fn rewrite_module(module_idx: usize, module: &mut Module, renames: &RenameMap) {
    module.entries.retain(|entry| !entry.is_extern());

    let mut rename = |kind: Option<SymbolKind>, name: &str| {
        renames.lookup(module_idx, kind, name).map(str::to_string)
    };

    for entry in &mut module.entries {
        let defined_name = match entry {
            Entry::Class(Symbol::Definition(class)) => Some((SymbolKind::Class, &mut class.name)),
            Entry::HwModule(Symbol::Definition(hw_module)) => {
                Some((SymbolKind::HwModule, &mut hw_module.name))
            }
            _ => None,
        };
        if let Some((kind, name)) = defined_name {
            if let Some(renamed) = renames.get(module_idx, kind, name) {
                *name = renamed.to_string();
            }
        }

        entry.rewrite_symbols(&mut rename);
    }
}
