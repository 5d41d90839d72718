use logos::Logos;

use crate::{
    diag::Diag,
    source::{FileId, SourceManager, Span},
};

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip(r"//[^\n]*", allow_greedy = true))]
pub enum TokenKind {
    #[regex(r"[A-Za-z_][A-Za-z0-9_.]*")]
    Ident,

    #[regex(r"@[A-Za-z_][A-Za-z0-9_$.]*")]
    Symbol,

    #[regex(r"%[A-Za-z0-9_]+")]
    Value,

    #[regex(r"-?[0-9]+")]
    Integer,

    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("<")]
    LAngle,
    #[token(">")]
    RAngle,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("=")]
    Eq,
    #[token("!")]
    Bang,
}

#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub file: FileId,
    pub span: Span,
    pub lexeme: String,
}

pub fn lex_file(source_manager: &SourceManager, file: FileId) -> (Vec<Token>, Vec<Diag>) {
    let source = &source_manager.file(file).text;
    let mut tokens = Vec::new();
    let mut diags = Vec::new();

    for (kind, span) in TokenKind::lexer(source).spanned() {
        match kind {
            Ok(kind) => {
                tokens.push(Token {
                    kind,
                    file,
                    span: span.start..span.end,
                    lexeme: source[span.clone()].to_string(),
                });
            }
            Err(_) => {
                diags.push(
                    Diag::error(file, span.start..span.end, "invalid token")
                        .with_help("remove or replace this character"),
                );
            }
        }
    }

    (tokens, diags)
}

#[cfg(test)]
mod tests {
    use super::{TokenKind, lex_file};
    use crate::source::SourceManager;

    #[test]
    fn lexes_entry_header() {
        let mut manager = SourceManager::new();
        let file = manager.add_virtual_file(
            "test.om",
            "hw.module.extern private @Sub(in a: i8) // trailing\n",
        );
        let (tokens, diags) = lex_file(&manager, file);

        assert!(diags.is_empty());
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Symbol,
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Ident,
                TokenKind::RParen,
            ]
        );
        assert_eq!(tokens[0].lexeme, "hw.module.extern");
        assert_eq!(tokens[2].lexeme, "@Sub");
    }

    #[test]
    fn reports_invalid_characters() {
        let mut manager = SourceManager::new();
        let file = manager.add_virtual_file("test.om", "module # {}\n");
        let (tokens, diags) = lex_file(&manager, file);

        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].primary.span, 7..8);
        assert_eq!(tokens.len(), 3);
    }
}
