use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use super::{
    compat::{Declaration, Definition},
    error::LinkError,
    namespace::Namespace,
    scan::ModuleSymbols,
};
use crate::ir::{
    ClassDef, ClassExtern, Entry, HwModuleDef, HwModuleExtern, Module, Named, Symbol, SymbolKind,
};

#[derive(Debug)]
pub(crate) struct Occurrence<'a, D, E> {
    pub module: usize,
    pub symbol: &'a Symbol<D, E>,
}

#[derive(Clone, Debug, Default)]
struct ModuleRenames {
    classes: FxHashMap<String, String>,
    hw_modules: FxHashMap<String, String>,
}

impl ModuleRenames {
    fn of_kind(&self, kind: SymbolKind) -> &FxHashMap<String, String> {
        match kind {
            SymbolKind::Class => &self.classes,
            SymbolKind::HwModule => &self.hw_modules,
        }
    }
}

/// `(module, kind, old name) -> new name`. Names without an entry keep their original spelling.
#[derive(Clone, Debug, Default)]
pub struct RenameMap {
    per_module: Vec<ModuleRenames>,
    // Names used by both a class and an hw-module somewhere in the link set.
    shared_names: FxHashSet<String>,
}

impl RenameMap {
    pub(crate) fn new(module_count: usize) -> Self {
        Self {
            per_module: vec![ModuleRenames::default(); module_count],
            shared_names: FxHashSet::default(),
        }
    }

    pub fn get(&self, module: usize, kind: SymbolKind, name: &str) -> Option<&str> {
        self.per_module
            .get(module)
            .and_then(|renames| renames.of_kind(kind).get(name))
            .map(String::as_str)
    }

    /// Rename for a reference whose kind may be unknown. An untyped reference to a name that
    /// is both a class and an hw-module is left alone.
    pub fn lookup(&self, module: usize, kind: Option<SymbolKind>, name: &str) -> Option<&str> {
        match kind {
            Some(kind) => self.get(module, kind, name),
            None if self.shared_names.contains(name) => None,
            None => self
                .get(module, SymbolKind::Class, name)
                .or_else(|| self.get(module, SymbolKind::HwModule, name)),
        }
    }

    pub fn len(&self) -> usize {
        self.per_module
            .iter()
            .map(|renames| renames.classes.len() + renames.hw_modules.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn insert(&mut self, module: usize, kind: SymbolKind, old: &str, new: String) {
        if let Some(renames) = self.per_module.get_mut(module) {
            let renames = match kind {
                SymbolKind::Class => &mut renames.classes,
                SymbolKind::HwModule => &mut renames.hw_modules,
            };
            renames.insert(old.to_string(), new);
        }
    }

    pub(crate) fn mark_shared(&mut self, name: &str) {
        self.shared_names.insert(name.to_string());
    }
}

type OccurrenceTable<'a, D, E> = IndexMap<&'a str, Vec<Occurrence<'a, D, E>>>;

// All hw-module names are resolved before any class name, each kind in first-seen order.
pub(crate) fn resolve_symbols(
    modules: &[Module],
    tables: &[ModuleSymbols],
) -> Result<RenameMap, LinkError> {
    let mut namespace = Namespace::new();
    let mut classes: OccurrenceTable<'_, ClassDef, ClassExtern> = IndexMap::new();
    let mut hw_modules: OccurrenceTable<'_, HwModuleDef, HwModuleExtern> = IndexMap::new();

    for (module_idx, (module, table)) in modules.iter().zip(tables).enumerate() {
        for (name, &entry_idx) in &table.classes {
            namespace.reserve(name);
            let Some(Entry::Class(symbol)) = module.entries.get(entry_idx) else {
                continue;
            };
            classes
                .entry(name.as_str())
                .or_insert_with(Vec::new)
                .push(Occurrence {
                    module: module_idx,
                    symbol,
                });
        }

        for (name, &entry_idx) in &table.hw_modules {
            namespace.reserve(name);
            let Some(Entry::HwModule(symbol)) = module.entries.get(entry_idx) else {
                continue;
            };
            hw_modules
                .entry(name.as_str())
                .or_insert_with(Vec::new)
                .push(Occurrence {
                    module: module_idx,
                    symbol,
                });
        }
    }

    let mut renames = RenameMap::new(modules.len());
    for name in classes.keys() {
        if hw_modules.contains_key(name) {
            renames.mark_shared(name);
        }
    }
    resolve_table(&hw_modules, modules, &mut namespace, &mut renames)?;
    resolve_table(&classes, modules, &mut namespace, &mut renames)?;
    Ok(renames)
}

fn resolve_table<D, E>(
    table: &OccurrenceTable<'_, D, E>,
    modules: &[Module],
    namespace: &mut Namespace,
    renames: &mut RenameMap,
) -> Result<(), LinkError>
where
    D: Definition,
    E: Declaration<D>,
{
    for (&name, occurrences) in table {
        if resolve_name(name, occurrences)? {
            rename_apart(name, occurrences, modules, namespace, renames);
        }
    }
    Ok(())
}

// Ok(true) when the occurrences have to be renamed apart.
pub(crate) fn resolve_name<D, E>(
    name: &str,
    occurrences: &[Occurrence<'_, D, E>],
) -> Result<bool, LinkError>
where
    D: Definition,
    E: Declaration<D>,
{
    let mut definitions = Vec::new();
    let mut declarations = Vec::new();
    for occurrence in occurrences {
        match occurrence.symbol {
            Symbol::Definition(definition) => definitions.push(definition),
            Symbol::Extern(declaration) => declarations.push(declaration),
        }
    }

    if !declarations.is_empty() {
        match definitions.as_slice() {
            [] => {
                return Err(LinkError::MissingDefinition {
                    kind: D::KIND,
                    name: name.to_string(),
                    declarations: declarations.iter().map(|decl| decl.loc().clone()).collect(),
                });
            }
            [definition] => {
                for declaration in &declarations {
                    declaration.check_against(definition).map_err(|mismatch| {
                        LinkError::SignatureMismatch {
                            kind: D::KIND,
                            name: name.to_string(),
                            declaration: declaration.loc().clone(),
                            definition: definition.loc().clone(),
                            mismatch,
                        }
                    })?;
                }
            }
            _ => {
                return Err(LinkError::MultipleDefinitions {
                    kind: D::KIND,
                    name: name.to_string(),
                    declarations: declarations.iter().map(|decl| decl.loc().clone()).collect(),
                    definitions: definitions.iter().map(|def| def.loc().clone()).collect(),
                });
            }
        }
    }

    let public: Vec<_> = definitions
        .iter()
        .filter(|definition| definition.is_public())
        .map(|definition| definition.loc().clone())
        .collect();
    if public.len() > 1 {
        return Err(LinkError::MultiplePublicDefinitions {
            kind: D::KIND,
            name: name.to_string(),
            definitions: public,
        });
    }

    Ok(declarations.is_empty() && occurrences.len() > 1)
}

// The public definition, or else the first occurrence, keeps the original name.
fn rename_apart<D, E>(
    name: &str,
    occurrences: &[Occurrence<'_, D, E>],
    modules: &[Module],
    namespace: &mut Namespace,
    renames: &mut RenameMap,
) where
    D: Definition,
{
    let keeper = occurrences
        .iter()
        .position(|occurrence| {
            matches!(occurrence.symbol, Symbol::Definition(definition) if definition.is_public())
        })
        .unwrap_or(0);

    let kind = D::KIND;
    for (idx, occurrence) in occurrences.iter().enumerate() {
        if idx == keeper {
            continue;
        }

        let suffix = match kind {
            SymbolKind::Class => modules
                .get(occurrence.module)
                .and_then(|module| module.namespace.as_deref()),
            SymbolKind::HwModule => None,
        };
        let renamed = namespace.fresh(name, suffix);
        debug!(%kind, module = occurrence.module, from = name, to = %renamed, "renaming symbol");
        renames.insert(occurrence.module, kind, name, renamed);
    }
}
