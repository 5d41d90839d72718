use crate::{
    ir::{
        ClassDef, ClassExtern, Entry, Field, FieldSig, HwModuleDef, HwModuleExtern, Module, Op,
        Param, Port, Symbol, SymbolKind,
    },
    types::{Attr, NamedAttr, SymbolRef, Type},
};

pub trait RewriteSymbols {
    fn rewrite_symbols<F>(&mut self, f: &mut F)
    where
        F: FnMut(Option<SymbolKind>, &str) -> Option<String>;
}

// The callback gets the kind a reference's position implies, or `None` when the position
// says nothing (an attribute of an unknown op).
pub fn referenced_symbols<T: RewriteSymbols + Clone>(
    node: &T,
) -> Vec<(Option<SymbolKind>, String)> {
    let mut refs = Vec::new();
    node.clone().rewrite_symbols(&mut |kind, name| {
        refs.push((kind, name.to_string()));
        None
    });
    refs
}

fn attr_kind(attr_name: &str) -> Option<SymbolKind> {
    match attr_name {
        "class" => Some(SymbolKind::Class),
        "module" => Some(SymbolKind::HwModule),
        _ => None,
    }
}

fn rewrite_ref<F>(symbol: &mut SymbolRef, kind: Option<SymbolKind>, f: &mut F)
where
    F: FnMut(Option<SymbolKind>, &str) -> Option<String>,
{
    if let Some(renamed) = f(kind, &symbol.0) {
        symbol.0 = renamed;
    }
}

// Arrays and dictionaries inherit the kind of the attribute they sit under unless a nested
// entry names its own.
fn rewrite_attr<F>(attr: &mut Attr, kind: Option<SymbolKind>, f: &mut F)
where
    F: FnMut(Option<SymbolKind>, &str) -> Option<String>,
{
    match attr {
        Attr::Symbol(symbol) => rewrite_ref(symbol, kind, f),
        Attr::Type(ty) => ty.rewrite_symbols(f),
        Attr::Array(elements) => {
            for element in elements {
                rewrite_attr(element, kind, f);
            }
        }
        Attr::Dict(entries) => {
            for entry in entries {
                rewrite_attr(&mut entry.value, attr_kind(&entry.name).or(kind), f);
            }
        }
        Attr::String(_) | Attr::Int(_) | Attr::Bool(_) => {}
    }
}

impl<T: RewriteSymbols> RewriteSymbols for [T] {
    fn rewrite_symbols<F>(&mut self, f: &mut F)
    where
        F: FnMut(Option<SymbolKind>, &str) -> Option<String>,
    {
        for item in self {
            item.rewrite_symbols(f);
        }
    }
}

impl<T: RewriteSymbols> RewriteSymbols for Vec<T> {
    fn rewrite_symbols<F>(&mut self, f: &mut F)
    where
        F: FnMut(Option<SymbolKind>, &str) -> Option<String>,
    {
        self.as_mut_slice().rewrite_symbols(f);
    }
}

impl<T: RewriteSymbols> RewriteSymbols for Option<T> {
    fn rewrite_symbols<F>(&mut self, f: &mut F)
    where
        F: FnMut(Option<SymbolKind>, &str) -> Option<String>,
    {
        if let Some(inner) = self {
            inner.rewrite_symbols(f);
        }
    }
}

impl RewriteSymbols for Type {
    fn rewrite_symbols<F>(&mut self, f: &mut F)
    where
        F: FnMut(Option<SymbolKind>, &str) -> Option<String>,
    {
        match self {
            Type::Class(symbol) => rewrite_ref(symbol, Some(SymbolKind::Class), f),
            Type::Composite { params, .. } => params.rewrite_symbols(f),
            Type::Int(_) | Type::Named(_) => {}
        }
    }
}

impl RewriteSymbols for Attr {
    fn rewrite_symbols<F>(&mut self, f: &mut F)
    where
        F: FnMut(Option<SymbolKind>, &str) -> Option<String>,
    {
        rewrite_attr(self, None, f);
    }
}

impl RewriteSymbols for NamedAttr {
    fn rewrite_symbols<F>(&mut self, f: &mut F)
    where
        F: FnMut(Option<SymbolKind>, &str) -> Option<String>,
    {
        rewrite_attr(&mut self.value, attr_kind(&self.name), f);
    }
}

impl RewriteSymbols for Op {
    fn rewrite_symbols<F>(&mut self, f: &mut F)
    where
        F: FnMut(Option<SymbolKind>, &str) -> Option<String>,
    {
        self.attrs.rewrite_symbols(f);
        self.result_type.rewrite_symbols(f);
        self.regions.rewrite_symbols(f);
    }
}

macro_rules! rewrite_typed {
    ($($ty:ty),+ $(,)?) => {
        $(impl RewriteSymbols for $ty {
            fn rewrite_symbols<F>(&mut self, f: &mut F)
            where
                F: FnMut(Option<SymbolKind>, &str) -> Option<String>,
            {
                self.ty.rewrite_symbols(f);
            }
        })+
    };
}

rewrite_typed!(Param, Field, FieldSig, Port);

impl RewriteSymbols for ClassDef {
    fn rewrite_symbols<F>(&mut self, f: &mut F)
    where
        F: FnMut(Option<SymbolKind>, &str) -> Option<String>,
    {
        self.params.rewrite_symbols(f);
        self.body.rewrite_symbols(f);
        self.fields.rewrite_symbols(f);
    }
}

impl RewriteSymbols for ClassExtern {
    fn rewrite_symbols<F>(&mut self, f: &mut F)
    where
        F: FnMut(Option<SymbolKind>, &str) -> Option<String>,
    {
        self.params.rewrite_symbols(f);
        self.fields.rewrite_symbols(f);
    }
}

impl RewriteSymbols for HwModuleDef {
    fn rewrite_symbols<F>(&mut self, f: &mut F)
    where
        F: FnMut(Option<SymbolKind>, &str) -> Option<String>,
    {
        self.ports.rewrite_symbols(f);
        self.body.rewrite_symbols(f);
    }
}

impl RewriteSymbols for HwModuleExtern {
    fn rewrite_symbols<F>(&mut self, f: &mut F)
    where
        F: FnMut(Option<SymbolKind>, &str) -> Option<String>,
    {
        self.ports.rewrite_symbols(f);
    }
}

impl<D: RewriteSymbols, E: RewriteSymbols> RewriteSymbols for Symbol<D, E> {
    fn rewrite_symbols<F>(&mut self, f: &mut F)
    where
        F: FnMut(Option<SymbolKind>, &str) -> Option<String>,
    {
        match self {
            Symbol::Definition(def) => def.rewrite_symbols(f),
            Symbol::Extern(decl) => decl.rewrite_symbols(f),
        }
    }
}

impl RewriteSymbols for Entry {
    fn rewrite_symbols<F>(&mut self, f: &mut F)
    where
        F: FnMut(Option<SymbolKind>, &str) -> Option<String>,
    {
        match self {
            Entry::Class(class) => class.rewrite_symbols(f),
            Entry::HwModule(module) => module.rewrite_symbols(f),
            Entry::Other(op) => op.rewrite_symbols(f),
        }
    }
}

impl RewriteSymbols for Module {
    fn rewrite_symbols<F>(&mut self, f: &mut F)
    where
        F: FnMut(Option<SymbolKind>, &str) -> Option<String>,
    {
        self.entries.rewrite_symbols(f);
    }
}
