use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymbolRef(pub String);

impl SymbolRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Int(u32),
    Named(String),
    Class(SymbolRef),
    Composite { ctor: String, params: Vec<Type> },
}

impl Type {
    pub fn int(width: u32) -> Self {
        Type::Int(width)
    }

    pub fn class(name: impl Into<String>) -> Self {
        Type::Class(SymbolRef::new(name))
    }

    pub fn list(element: Type) -> Self {
        Type::composite("list", vec![element])
    }

    pub fn map(key: Type, value: Type) -> Self {
        Type::composite("map", vec![key, value])
    }

    pub fn tuple(elements: Vec<Type>) -> Self {
        Type::composite("tuple", elements)
    }

    pub fn composite(ctor: impl Into<String>, params: Vec<Type>) -> Self {
        Type::Composite {
            ctor: ctor.into(),
            params,
        }
    }

    // `iN` is an N-bit integer.
    pub fn from_name(name: String) -> Self {
        match name.strip_prefix('i').map(str::parse::<u32>) {
            Some(Ok(width)) => Type::Int(width),
            _ => Type::Named(name),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int(width) => write!(f, "i{width}"),
            Type::Named(name) => f.write_str(name),
            Type::Class(symbol) => write!(f, "class<{symbol}>"),
            Type::Composite { ctor, params } => {
                write!(f, "{ctor}<")?;
                for (idx, param) in params.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                f.write_str(">")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedAttr {
    pub name: String,
    pub value: Attr,
}

impl NamedAttr {
    pub fn new(name: impl Into<String>, value: Attr) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl fmt::Display for NamedAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Attr {
    Symbol(SymbolRef),
    String(String),
    Int(i64),
    Bool(bool),
    Type(Type),
    Array(Vec<Attr>),
    Dict(Vec<NamedAttr>),
}

impl Attr {
    pub fn symbol(name: impl Into<String>) -> Self {
        Attr::Symbol(SymbolRef::new(name))
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attr::Symbol(symbol) => write!(f, "{symbol}"),
            Attr::String(value) => f.write_str(&escape_string(value)),
            Attr::Int(value) => write!(f, "{value}"),
            Attr::Bool(value) => write!(f, "{value}"),
            Attr::Type(ty) => write!(f, "!{ty}"),
            Attr::Array(elements) => {
                f.write_str("[")?;
                write_joined(f, elements)?;
                f.write_str("]")
            }
            Attr::Dict(entries) => {
                f.write_str("{")?;
                write_joined(f, entries)?;
                f.write_str("}")
            }
        }
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

pub(crate) fn escape_string(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
        .replace('"', "\\\"");
    format!("\"{escaped}\"")
}
