use std::fmt;

use crate::{
    source::Loc,
    types::{Attr, NamedAttr, Type},
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Module {
    pub namespace: Option<String>,
    pub entries: Vec<Entry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    Class(ClassLike),
    HwModule(HwModuleLike),
    Other(Op),
}

impl Entry {
    pub fn is_extern(&self) -> bool {
        matches!(
            self,
            Entry::Class(Symbol::Extern(_)) | Entry::HwModule(Symbol::Extern(_))
        )
    }

    pub fn symbol_name(&self) -> Option<&str> {
        match self {
            Entry::Class(class) => Some(class.name()),
            Entry::HwModule(module) => Some(module.name()),
            Entry::Other(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Class,
    HwModule,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Class => f.write_str("class"),
            SymbolKind::HwModule => f.write_str("module"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Symbol<D, E> {
    Definition(D),
    Extern(E),
}

pub type ClassLike = Symbol<ClassDef, ClassExtern>;
pub type HwModuleLike = Symbol<HwModuleDef, HwModuleExtern>;

impl<D: Named, E: Named> Symbol<D, E> {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Definition(def) => def.name(),
            Symbol::Extern(decl) => decl.name(),
        }
    }

    pub fn loc(&self) -> &Loc {
        match self {
            Symbol::Definition(def) => def.loc(),
            Symbol::Extern(decl) => decl.loc(),
        }
    }
}

pub trait Named {
    fn name(&self) -> &str;
    fn loc(&self) -> &Loc;
}

macro_rules! impl_named {
    ($($ty:ty),+ $(,)?) => {
        $(impl Named for $ty {
            fn name(&self) -> &str {
                &self.name
            }

            fn loc(&self) -> &Loc {
                &self.loc
            }
        })+
    };
}

impl_named!(ClassDef, ClassExtern, HwModuleDef, HwModuleExtern);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSig {
    pub name: String,
    pub ty: Type,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassDef {
    pub name: String,
    pub loc: Loc,
    pub params: Vec<Param>,
    pub body: Vec<Op>,
    pub fields: Vec<Field>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassExtern {
    pub name: String,
    pub loc: Loc,
    pub params: Vec<Param>,
    pub fields: Vec<FieldSig>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortDirection {
    In,
    Out,
    InOut,
}

impl PortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            PortDirection::In => "in",
            PortDirection::Out => "out",
            PortDirection::InOut => "inout",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Port {
    pub name: String,
    pub dir: PortDirection,
    pub ty: Type,
}

impl Port {
    pub fn new(name: impl Into<String>, dir: PortDirection, ty: Type) -> Self {
        Self {
            name: name.into(),
            dir,
            ty,
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.dir.keyword(), self.name, self.ty)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HwModuleDef {
    pub name: String,
    pub loc: Loc,
    pub visibility: Visibility,
    pub ports: Vec<Port>,
    pub body: Vec<Op>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HwModuleExtern {
    pub name: String,
    pub loc: Loc,
    pub visibility: Visibility,
    pub ports: Vec<Port>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Op {
    pub result: Option<String>,
    pub name: String,
    pub operands: Vec<String>,
    pub attrs: Vec<NamedAttr>,
    pub result_type: Option<Type>,
    pub regions: Vec<Vec<Op>>,
    pub loc: Loc,
}

impl Op {
    pub fn attr(&self, name: &str) -> Option<&Attr> {
        self.attrs
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| &attr.value)
    }
}
