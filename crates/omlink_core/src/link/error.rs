use thiserror::Error;

use crate::{
    diag::{Diag, DiagLabel},
    ir::{Port, SymbolKind},
    source::Loc,
    types::Type,
};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Mismatch {
    #[error("the number of ports is not equal, {defined} vs {declared}")]
    PortCount { defined: usize, declared: usize },
    #[error("{index}-th port is not equal, {defined} vs {declared}")]
    Port {
        index: usize,
        defined: Port,
        declared: Port,
    },
    #[error("the number of arguments is not equal, {defined} vs {declared}")]
    ArgumentCount { defined: usize, declared: usize },
    #[error("{index}-th argument type is not equal, {defined} vs {declared}")]
    ArgumentType {
        index: usize,
        defined: Type,
        declared: Type,
    },
    #[error("declaration has a field {field} but not found in its definition")]
    MissingField { field: String },
    #[error("declaration has a field {field} but types don't match, {defined} vs {declared}")]
    FieldType {
        field: String,
        defined: Type,
        declared: Type,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("{kind} {name} is declared as an external {kind} but there is no definition")]
    MissingDefinition {
        kind: SymbolKind,
        name: String,
        declarations: Vec<Loc>,
    },
    #[error("{kind} {name} is declared as an external {kind} but there are multiple definitions")]
    MultipleDefinitions {
        kind: SymbolKind,
        name: String,
        declarations: Vec<Loc>,
        definitions: Vec<Loc>,
    },
    #[error(
        "{kind} {name} is declared as a public {kind} but there are multiple public {kind}s defined with the same name"
    )]
    MultiplePublicDefinitions {
        kind: SymbolKind,
        name: String,
        definitions: Vec<Loc>,
    },
    #[error("failed to link {kind} {name} since declaration doesn't match the definition: {mismatch}")]
    SignatureMismatch {
        kind: SymbolKind,
        name: String,
        declaration: Loc,
        definition: Loc,
        mismatch: Mismatch,
    },
}

impl LinkError {
    pub fn kind(&self) -> SymbolKind {
        match self {
            LinkError::MissingDefinition { kind, .. }
            | LinkError::MultipleDefinitions { kind, .. }
            | LinkError::MultiplePublicDefinitions { kind, .. }
            | LinkError::SignatureMismatch { kind, .. } => *kind,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            LinkError::MissingDefinition { name, .. }
            | LinkError::MultipleDefinitions { name, .. }
            | LinkError::MultiplePublicDefinitions { name, .. }
            | LinkError::SignatureMismatch { name, .. } => name,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            LinkError::MissingDefinition { .. } => "link::missing-definition",
            LinkError::MultipleDefinitions { .. } => "link::multiple-definitions",
            LinkError::MultiplePublicDefinitions { .. } => "link::multiple-public-definitions",
            LinkError::SignatureMismatch { .. } => "link::signature-mismatch",
        }
    }

}

impl From<&LinkError> for Diag {
    fn from(error: &LinkError) -> Self {
        let kind = error.kind();
        let name = error.name();

        let (primary, notes): (Option<&Loc>, Vec<DiagLabel>) = match error {
            LinkError::MissingDefinition { declarations, .. } => (
                declarations.first(),
                declarations
                    .iter()
                    .skip(1)
                    .map(|loc| DiagLabel::at(loc, format!("{kind} {name} is declared here as well")))
                    .collect(),
            ),
            LinkError::MultipleDefinitions {
                declarations,
                definitions,
                ..
            } => (
                declarations.first(),
                declarations
                    .iter()
                    .skip(1)
                    .map(|loc| DiagLabel::at(loc, format!("{kind} {name} is declared here as well")))
                    .chain(
                        definitions
                            .iter()
                            .map(|loc| DiagLabel::at(loc, format!("{kind} {name} is defined here"))),
                    )
                    .collect(),
            ),
            LinkError::MultiplePublicDefinitions { definitions, .. } => (
                definitions.first(),
                definitions
                    .iter()
                    .map(|loc| DiagLabel::at(loc, format!("{kind} {name} is declared here as public")))
                    .collect(),
            ),
            LinkError::SignatureMismatch {
                declaration,
                definition,
                ..
            } => (
                Some(declaration),
                vec![DiagLabel::at(definition, "definition is here")],
            ),
        };

        let primary = primary.cloned().unwrap_or_default();
        let mut diag = Diag::error_at(&primary, error.to_string()).with_code(error.code());
        diag.labels.extend(notes);
        diag
    }
}

#[cfg(test)]
mod tests {
    use super::{LinkError, Mismatch};
    use crate::{
        diag::Diag,
        ir::{Port, PortDirection, SymbolKind},
        source::{FileId, Loc},
        types::Type,
    };

    fn loc(start: usize) -> Loc {
        Loc::new(FileId(0), start..start + 3)
    }

    #[test]
    fn messages_name_kind_and_symbol() {
        let error = LinkError::MissingDefinition {
            kind: SymbolKind::Class,
            name: "Foo".into(),
            declarations: vec![loc(0)],
        };
        assert_eq!(
            error.to_string(),
            "class Foo is declared as an external class but there is no definition"
        );

        let error = LinkError::SignatureMismatch {
            kind: SymbolKind::HwModule,
            name: "Bar".into(),
            declaration: loc(0),
            definition: loc(10),
            mismatch: Mismatch::Port {
                index: 0,
                defined: Port::new("a", PortDirection::In, Type::int(16)),
                declared: Port::new("a", PortDirection::In, Type::int(8)),
            },
        };
        assert_eq!(
            error.to_string(),
            "failed to link module Bar since declaration doesn't match the definition: \
             0-th port is not equal, in a: i16 vs in a: i8"
        );
    }

    #[test]
    fn diag_carries_a_note_per_occurrence() {
        let error = LinkError::MultipleDefinitions {
            kind: SymbolKind::HwModule,
            name: "Sub".into(),
            declarations: vec![loc(0), loc(20)],
            definitions: vec![loc(40), loc(60)],
        };
        let diag = Diag::from(&error);

        assert_eq!(diag.primary.span, 0..3);
        assert_eq!(diag.code.as_deref(), Some("link::multiple-definitions"));
        let notes: Vec<_> = diag.labels.iter().map(|label| label.message.as_str()).collect();
        assert_eq!(
            notes,
            vec![
                "module Sub is declared here as well",
                "module Sub is defined here",
                "module Sub is defined here",
            ]
        );
    }
}
