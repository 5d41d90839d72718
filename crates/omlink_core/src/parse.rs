use std::fmt;

use chumsky::{
    IterParser,
    error::Rich,
    extra,
    prelude::{Parser, choice, end, just, recursive, select_ref},
    span::SimpleSpan,
};

use crate::{
    diag::{Diag, DiagLabel},
    ir::{
        ClassDef, ClassExtern, Entry, Field, FieldSig, HwModuleDef, HwModuleExtern, Module, Op,
        Param, Port, PortDirection, Symbol, Visibility,
    },
    lex::{Token, TokenKind, lex_file},
    source::{FileId, Loc, SourceManager, Span},
    types::{Attr, NamedAttr, SymbolRef, Type},
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum ParseToken {
    Ident(String),
    Symbol(String),
    Value(String),
    Integer(i64),
    String(String),

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LAngle,
    RAngle,
    Comma,
    Colon,
    Eq,
    Bang,
}

impl fmt::Display for ParseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseToken::Ident(name) => write!(f, "`{name}`"),
            ParseToken::Symbol(name) => write!(f, "`@{name}`"),
            ParseToken::Value(name) => write!(f, "`%{name}`"),
            ParseToken::Integer(value) => write!(f, "`{value}`"),
            ParseToken::String(value) => write!(f, "string {value:?}"),
            ParseToken::LParen => f.write_str("`(`"),
            ParseToken::RParen => f.write_str("`)`"),
            ParseToken::LBrace => f.write_str("`{`"),
            ParseToken::RBrace => f.write_str("`}`"),
            ParseToken::LBracket => f.write_str("`[`"),
            ParseToken::RBracket => f.write_str("`]`"),
            ParseToken::LAngle => f.write_str("`<`"),
            ParseToken::RAngle => f.write_str("`>`"),
            ParseToken::Comma => f.write_str("`,`"),
            ParseToken::Colon => f.write_str("`:`"),
            ParseToken::Eq => f.write_str("`=`"),
            ParseToken::Bang => f.write_str("`!`"),
        }
    }
}

#[derive(Clone, Debug)]
struct FileToken {
    kind: ParseToken,
    span: Span,
}

// Parser spans are token indices; this maps them back to byte spans.
#[derive(Clone, Copy)]
struct Locator<'src> {
    file: FileId,
    tokens: &'src [FileToken],
}

impl Locator<'_> {
    fn loc(&self, span: SimpleSpan<usize>) -> Loc {
        Loc::new(self.file, parser_span_to_byte_span(span, self.tokens))
    }
}

enum ClassItem {
    Field(Field),
    Op(Op),
}

type PError<'src> = Rich<'src, ParseToken>;
type PExtra<'src> = extra::Err<PError<'src>>;

pub fn parse_tokens(file: FileId, tokens: &[Token]) -> (Vec<Module>, Vec<Diag>) {
    let mut diags = Vec::new();
    let file_tokens = convert_tokens(tokens, &mut diags);
    let parse_input: Vec<ParseToken> = file_tokens.iter().map(|token| token.kind.clone()).collect();

    let locator = Locator {
        file,
        tokens: &file_tokens,
    };

    match file_parser(locator).parse(parse_input.as_slice()).into_result() {
        Ok(modules) => (modules, diags),
        Err(errors) => {
            push_parse_errors(errors, file, &file_tokens, &mut diags);
            (Vec::new(), diags)
        }
    }
}

pub fn parse_source(
    source_manager: &mut SourceManager,
    name: &str,
    text: &str,
) -> (Vec<Module>, Vec<Diag>) {
    let file = source_manager.add_virtual_file(name, text);
    parse_file(source_manager, file)
}

pub fn parse_file(source_manager: &SourceManager, file: FileId) -> (Vec<Module>, Vec<Diag>) {
    let (tokens, mut diags) = lex_file(source_manager, file);
    let (modules, parse_diags) = parse_tokens(file, &tokens);
    diags.extend(parse_diags);
    (modules, diags)
}

fn push_parse_errors(
    errors: Vec<PError<'_>>,
    file: FileId,
    file_tokens: &[FileToken],
    diags: &mut Vec<Diag>,
) {
    for error in errors {
        let span = parser_span_to_byte_span(*error.span(), file_tokens);
        let found = error
            .found()
            .map(|token| token.to_string())
            .unwrap_or_else(|| "end of input".to_string());
        diags.push(
            Diag::error(file, span.clone(), "parse error").with_label(DiagLabel {
                file,
                span,
                message: format!("unexpected {found}"),
            }),
        );
    }
}

fn convert_tokens(raw_tokens: &[Token], diags: &mut Vec<Diag>) -> Vec<FileToken> {
    let mut out = Vec::with_capacity(raw_tokens.len());

    for token in raw_tokens {
        let kind = match token.kind {
            TokenKind::Ident => ParseToken::Ident(token.lexeme.clone()),
            TokenKind::Symbol => ParseToken::Symbol(token.lexeme[1..].to_string()),
            TokenKind::Value => ParseToken::Value(token.lexeme[1..].to_string()),
            TokenKind::Integer => match token.lexeme.parse::<i64>() {
                Ok(value) => ParseToken::Integer(value),
                Err(_) => {
                    diags.push(Diag::error(
                        token.file,
                        token.span.clone(),
                        format!("integer literal `{}` does not fit in 64 bits", token.lexeme),
                    ));
                    ParseToken::Integer(0)
                }
            },
            TokenKind::String => match unescape_string_literal(&token.lexeme) {
                Ok(value) => ParseToken::String(value),
                Err(message) => {
                    diags.push(Diag::error(token.file, token.span.clone(), message));
                    ParseToken::String(String::new())
                }
            },
            TokenKind::LParen => ParseToken::LParen,
            TokenKind::RParen => ParseToken::RParen,
            TokenKind::LBrace => ParseToken::LBrace,
            TokenKind::RBrace => ParseToken::RBrace,
            TokenKind::LBracket => ParseToken::LBracket,
            TokenKind::RBracket => ParseToken::RBracket,
            TokenKind::LAngle => ParseToken::LAngle,
            TokenKind::RAngle => ParseToken::RAngle,
            TokenKind::Comma => ParseToken::Comma,
            TokenKind::Colon => ParseToken::Colon,
            TokenKind::Eq => ParseToken::Eq,
            TokenKind::Bang => ParseToken::Bang,
        };

        out.push(FileToken {
            kind,
            span: token.span.clone(),
        });
    }

    out
}

fn keyword<'src>(word: &'static str) -> impl Parser<'src, &'src [ParseToken], (), PExtra<'src>> + Clone {
    just(ParseToken::Ident(word.to_string())).ignored()
}

fn ident<'src>() -> impl Parser<'src, &'src [ParseToken], String, PExtra<'src>> + Clone {
    select_ref! {
        ParseToken::Ident(name) => name.clone(),
    }
}

fn symbol_name<'src>() -> impl Parser<'src, &'src [ParseToken], String, PExtra<'src>> + Clone {
    select_ref! {
        ParseToken::Symbol(name) => name.clone(),
    }
}

fn value_name<'src>() -> impl Parser<'src, &'src [ParseToken], String, PExtra<'src>> + Clone {
    select_ref! {
        ParseToken::Value(name) => name.clone(),
    }
}

fn type_parser<'src>() -> impl Parser<'src, &'src [ParseToken], Type, PExtra<'src>> + Clone {
    recursive(|ty| {
        let class = keyword("class")
            .ignore_then(
                symbol_name().delimited_by(just(ParseToken::LAngle), just(ParseToken::RAngle)),
            )
            .map(|name| Type::Class(SymbolRef(name)));

        let params = ty
            .separated_by(just(ParseToken::Comma))
            .at_least(1)
            .collect::<Vec<_>>()
            .delimited_by(just(ParseToken::LAngle), just(ParseToken::RAngle));

        let named = ident().then(params.or_not()).map(|(name, params)| match params {
            Some(params) => Type::Composite { ctor: name, params },
            None => Type::from_name(name),
        });

        choice((class, named))
    })
}

fn attr_parser<'src>() -> impl Parser<'src, &'src [ParseToken], Attr, PExtra<'src>> + Clone {
    recursive(|attr| {
        let literal = select_ref! {
            ParseToken::Symbol(name) => Attr::Symbol(SymbolRef(name.clone())),
            ParseToken::String(value) => Attr::String(value.clone()),
            ParseToken::Integer(value) => Attr::Int(*value),
        };

        let array = attr
            .clone()
            .separated_by(just(ParseToken::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(ParseToken::LBracket), just(ParseToken::RBracket))
            .map(Attr::Array);

        let dict = ident()
            .then_ignore(just(ParseToken::Eq))
            .then(attr)
            .map(|(name, value)| NamedAttr { name, value })
            .separated_by(just(ParseToken::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(ParseToken::LBrace), just(ParseToken::RBrace))
            .map(Attr::Dict);

        choice((
            literal,
            keyword("true").to(Attr::Bool(true)),
            keyword("false").to(Attr::Bool(false)),
            just(ParseToken::Bang)
                .ignore_then(type_parser())
                .map(Attr::Type),
            array,
            dict,
        ))
    })
}

fn op_parser<'src>(
    locator: Locator<'src>,
) -> impl Parser<'src, &'src [ParseToken], Op, PExtra<'src>> + Clone {
    recursive(move |op| {
        let result = value_name().then_ignore(just(ParseToken::Eq)).or_not();

        let name = ident().map_with(move |name, extra| (name, locator.loc(extra.span())));

        let operands = value_name()
            .separated_by(just(ParseToken::Comma))
            .collect::<Vec<_>>()
            .delimited_by(just(ParseToken::LParen), just(ParseToken::RParen));

        let attrs = ident()
            .then_ignore(just(ParseToken::Eq))
            .then(attr_parser())
            .map(|(name, value)| NamedAttr { name, value })
            .separated_by(just(ParseToken::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(ParseToken::LBracket), just(ParseToken::RBracket))
            .or_not()
            .map(|attrs| attrs.unwrap_or_default());

        let result_type = just(ParseToken::Colon).ignore_then(type_parser()).or_not();

        let region = op
            .repeated()
            .collect::<Vec<_>>()
            .delimited_by(just(ParseToken::LBrace), just(ParseToken::RBrace));

        result
            .then(name)
            .then(operands)
            .then(attrs)
            .then(result_type)
            .then(region.repeated().collect::<Vec<_>>())
            .map(
                |(((((result, (name, loc)), operands), attrs), result_type), regions)| Op {
                    result,
                    name,
                    operands,
                    attrs,
                    result_type,
                    regions,
                    loc,
                },
            )
    })
}

fn file_parser<'src>(
    locator: Locator<'src>,
) -> impl Parser<'src, &'src [ParseToken], Vec<Module>, PExtra<'src>> {
    let op = op_parser(locator);

    let located_symbol =
        symbol_name().map_with(move |name, extra| (name, locator.loc(extra.span())));

    let params = value_name()
        .then_ignore(just(ParseToken::Colon))
        .then(type_parser())
        .map(|(name, ty)| Param { name, ty })
        .separated_by(just(ParseToken::Comma))
        .allow_trailing()
        .collect::<Vec<_>>()
        .delimited_by(just(ParseToken::LParen), just(ParseToken::RParen));

    let field = keyword("field")
        .ignore_then(symbol_name())
        .then_ignore(just(ParseToken::Colon))
        .then(type_parser())
        .then_ignore(just(ParseToken::Eq))
        .then(value_name())
        .map(|((name, ty), value)| ClassItem::Field(Field { name, ty, value }));

    let field_sig = keyword("field")
        .ignore_then(symbol_name())
        .then_ignore(just(ParseToken::Colon))
        .then(type_parser())
        .map(|(name, ty)| FieldSig { name, ty });

    let class_items = choice((field, op.clone().map(ClassItem::Op)))
        .repeated()
        .collect::<Vec<_>>()
        .delimited_by(just(ParseToken::LBrace), just(ParseToken::RBrace));

    let class_def = keyword("class")
        .ignore_then(located_symbol.clone())
        .then(params.clone())
        .then(class_items)
        .map(|(((name, loc), params), items)| {
            let mut body = Vec::new();
            let mut fields = Vec::new();
            for item in items {
                match item {
                    ClassItem::Field(field) => fields.push(field),
                    ClassItem::Op(op) => body.push(op),
                }
            }
            Entry::Class(Symbol::Definition(ClassDef {
                name,
                loc,
                params,
                body,
                fields,
            }))
        });

    let class_extern = keyword("extern")
        .ignore_then(keyword("class"))
        .ignore_then(located_symbol.clone())
        .then(params)
        .then(
            field_sig
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(ParseToken::LBrace), just(ParseToken::RBrace)),
        )
        .map(|(((name, loc), params), fields)| {
            Entry::Class(Symbol::Extern(ClassExtern {
                name,
                loc,
                params,
                fields,
            }))
        });

    let visibility = choice((
        keyword("private").to(Visibility::Private),
        keyword("public").to(Visibility::Public),
    ))
    .or_not()
    .map(|visibility| visibility.unwrap_or_default());

    let direction = choice((
        keyword("in").to(PortDirection::In),
        keyword("out").to(PortDirection::Out),
        keyword("inout").to(PortDirection::InOut),
    ));

    let ports = direction
        .then(ident())
        .then_ignore(just(ParseToken::Colon))
        .then(type_parser())
        .map(|((dir, name), ty)| Port { name, dir, ty })
        .separated_by(just(ParseToken::Comma))
        .allow_trailing()
        .collect::<Vec<_>>()
        .delimited_by(just(ParseToken::LParen), just(ParseToken::RParen));

    let hw_body = op
        .clone()
        .repeated()
        .collect::<Vec<_>>()
        .delimited_by(just(ParseToken::LBrace), just(ParseToken::RBrace));

    let hw_def = keyword("hw.module")
        .ignore_then(visibility.clone())
        .then(located_symbol.clone())
        .then(ports.clone())
        .then(hw_body)
        .map(|(((visibility, (name, loc)), ports), body)| {
            Entry::HwModule(Symbol::Definition(HwModuleDef {
                name,
                loc,
                visibility,
                ports,
                body,
            }))
        });

    let hw_extern = keyword("hw.module.extern")
        .ignore_then(visibility)
        .then(located_symbol)
        .then(ports)
        .map(|((visibility, (name, loc)), ports)| {
            Entry::HwModule(Symbol::Extern(HwModuleExtern {
                name,
                loc,
                visibility,
                ports,
            }))
        });

    let entry = choice((
        class_def,
        class_extern,
        hw_def,
        hw_extern,
        op.map(Entry::Other),
    ));

    let module = keyword("module")
        .ignore_then(symbol_name().or_not())
        .then(
            entry
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(ParseToken::LBrace), just(ParseToken::RBrace)),
        )
        .map(|(namespace, entries)| Module { namespace, entries });

    module.repeated().collect::<Vec<_>>().then_ignore(end())
}

fn parser_span_to_byte_span(span: SimpleSpan<usize>, file_tokens: &[FileToken]) -> Span {
    if file_tokens.is_empty() {
        return 0..0;
    }

    let len = file_tokens.len();
    let start = span.start.min(len);
    let end = span.end.min(len);

    if start < end {
        return file_tokens[start].span.start..file_tokens[end - 1].span.end;
    }

    if start < len {
        return file_tokens[start].span.clone();
    }

    let eof = file_tokens[len - 1].span.end;
    eof..eof
}

fn unescape_string_literal(input: &str) -> Result<String, String> {
    if input.len() < 2 || !input.starts_with('"') || !input.ends_with('"') {
        return Err("invalid string literal".to_string());
    }

    let mut out = String::new();
    let mut chars = input[1..input.len() - 1].chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        let escaped = chars
            .next()
            .ok_or_else(|| "unterminated escape".to_string())?;
        match escaped {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            other => {
                return Err(format!("unsupported escape `\\{other}`"));
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::parse_source;
    use crate::{
        diag::has_errors,
        ir::{Entry, PortDirection, Symbol, Visibility},
        source::SourceManager,
        types::{Attr, Type},
    };

    #[test]
    fn parses_all_entry_kinds() {
        let mut manager = SourceManager::new();
        let (modules, diags) = parse_source(
            &mut manager,
            "a.om",
            r#"
module @lib {
  class @Holder(%w: i8, %xs: list<class<@Item>>) {
    %0 = om.object(%w) [class = @Item] : class<@Item>
    field @item: class<@Item> = %0
  }
  extern class @Item(%w: i8) {
    field @width: i8
  }
  hw.module private @Adder(in a: i8, out sum: i8) {
    hw.instance(%a) [module = @Sub, name = "u0"] : i8
  }
  hw.module.extern @Sub(in a: i8, out x: i8)
  sv.verbatim() [text = "// keep"]
}
"#,
        );

        assert!(!has_errors(&diags), "diagnostics: {diags:#?}");
        assert_eq!(modules.len(), 1);
        let module = &modules[0];
        assert_eq!(module.namespace.as_deref(), Some("lib"));
        assert_eq!(module.entries.len(), 5);

        let Entry::Class(Symbol::Definition(holder)) = &module.entries[0] else {
            panic!("expected class definition, got {:?}", module.entries[0]);
        };
        assert_eq!(holder.name, "Holder");
        assert_eq!(holder.params[1].ty, Type::list(Type::class("Item")));
        assert_eq!(holder.body.len(), 1);
        assert_eq!(holder.body[0].attr("class"), Some(&Attr::symbol("Item")));
        assert_eq!(holder.fields[0].value, "0");

        let Entry::HwModule(Symbol::Definition(adder)) = &module.entries[2] else {
            panic!("expected hw.module, got {:?}", module.entries[2]);
        };
        assert_eq!(adder.visibility, Visibility::Private);
        assert_eq!(adder.ports[1].dir, PortDirection::Out);

        assert!(module.entries[1].is_extern());
        assert!(module.entries[3].is_extern());
        assert!(matches!(&module.entries[4], Entry::Other(op) if op.name == "sv.verbatim"));
    }

    #[test]
    fn entry_locations_point_at_symbol_names() {
        let mut manager = SourceManager::new();
        let text = "module {\n  class @Foo() {}\n}\n";
        let (modules, diags) = parse_source(&mut manager, "a.om", text);

        assert!(diags.is_empty(), "diagnostics: {diags:#?}");
        let Entry::Class(class) = &modules[0].entries[0] else {
            panic!("expected class");
        };
        assert_eq!(&text[class.loc().span.clone()], "@Foo");
    }

    #[test]
    fn parses_nested_regions_and_attributes() {
        let mut manager = SourceManager::new();
        let (modules, diags) = parse_source(
            &mut manager,
            "a.om",
            r#"module {
  hw.module @Top() {
    sv.ifdef() [cond = {flag = true, sizes = [1, -2]}] {
      %x = hw.constant() [value = 3] : i4
      sv.always() {
        hw.instance() [module = @Leaf, types = [!tuple<i1, map<string, class<@C>>>]]
      }
    }
  }
}"#,
        );

        assert!(!has_errors(&diags), "diagnostics: {diags:#?}");
        let Entry::HwModule(Symbol::Definition(top)) = &modules[0].entries[0] else {
            panic!("expected hw.module");
        };
        let ifdef = &top.body[0];
        assert_eq!(ifdef.regions.len(), 1);
        assert_eq!(ifdef.regions[0].len(), 2);
        assert_eq!(ifdef.regions[0][0].result.as_deref(), Some("x"));
        assert_eq!(ifdef.regions[0][0].result_type, Some(Type::int(4)));

        let instance = &ifdef.regions[0][1].regions[0][0];
        assert_eq!(instance.attr("module"), Some(&Attr::symbol("Leaf")));
        assert_eq!(
            instance.attr("types"),
            Some(&Attr::Array(vec![Attr::Type(Type::tuple(vec![
                Type::int(1),
                Type::map(Type::Named("string".into()), Type::class("C")),
            ]))]))
        );
    }

    #[test]
    fn reports_parse_errors_with_location() {
        let mut manager = SourceManager::new();
        let (modules, diags) =
            parse_source(&mut manager, "a.om", "module {\n  class Foo() {}\n}\n");

        assert!(modules.is_empty());
        assert!(has_errors(&diags));
        assert_eq!(diags[0].message, "parse error");
    }
}
