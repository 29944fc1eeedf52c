//! Tokenizer for `.hal` sources.

use logos::{FilterResult, Lexer, Logos};

use crate::base::{TextRange, TextSize};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum TokenKind {
    /// Never produced: the callback skips the comment or fails.
    #[token("/*", block_comment)]
    BlockComment,

    #[token("package")]
    Package,
    #[token("import")]
    Import,
    #[token("interface")]
    Interface,
    #[token("extends")]
    Extends,
    #[token("struct")]
    Struct,
    #[token("union")]
    Union,
    #[token("enum")]
    Enum,
    #[token("typedef")]
    Typedef,

    /// Identifier, dotted path or qualified name (`a.b@1.0::IFoo.Bar`).
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*(@[0-9]+\.[0-9]+)?(::[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*)?")]
    Name,
    #[regex(r"@[A-Za-z_][A-Za-z0-9_]*")]
    Annotation,
    #[regex(r"[0-9][0-9A-Za-z_]*")]
    Number,
    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("<")]
    LAngle,
    #[token(">")]
    RAngle,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token("=")]
    Eq,
    #[regex(r"[-+*/%|&^~!?.]")]
    Operator,
}

impl TokenKind {
    /// Human-readable form used in syntax errors.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::BlockComment => "comment",
            TokenKind::Package => "'package'",
            TokenKind::Import => "'import'",
            TokenKind::Interface => "'interface'",
            TokenKind::Extends => "'extends'",
            TokenKind::Struct => "'struct'",
            TokenKind::Union => "'union'",
            TokenKind::Enum => "'enum'",
            TokenKind::Typedef => "'typedef'",
            TokenKind::Name => "name",
            TokenKind::Annotation => "annotation",
            TokenKind::Number => "number",
            TokenKind::String => "string literal",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LAngle => "'<'",
            TokenKind::RAngle => "'>'",
            TokenKind::Semi => "';'",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::Eq => "'='",
            TokenKind::Operator => "operator",
        }
    }
}

/// Skips through the closing `*/`. An unterminated comment is an error
/// spanning the rest of the input.
fn block_comment(lex: &mut Lexer<TokenKind>) -> FilterResult<(), ()> {
    let remainder = lex.remainder();
    match remainder.find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            FilterResult::Skip
        }
        None => {
            lex.bump(remainder.len());
            FilterResult::Error(())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
}

fn range_of(span: std::ops::Range<usize>) -> TextRange {
    TextRange::new(TextSize::from(span.start as u32), TextSize::from(span.end as u32))
}

/// Split `text` into tokens. Returns the range of the first unrecognised
/// input on failure.
pub fn tokenize(text: &str) -> Result<Vec<Token>, TextRange> {
    let mut lexer = TokenKind::lexer(text);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let range = range_of(lexer.span());
        match result {
            Ok(kind) => tokens.push(Token { kind, range }),
            Err(()) => return Err(range),
        }
    }
    Ok(tokens)
}
