//! Recursive-descent parser producing a [`HalFile`].
//!
//! The grammar handled here is the declaration skeleton of a `.hal` file:
//!
//! ```text
//! file      = "package" NAME ";" { "import" NAME ";" } { decl }
//! decl      = { ANNOTATION } ( interface | compound | enum | typedef )
//! interface = "interface" IDENT [ "extends" NAME ] "{" body "}" [";"]
//! compound  = ("struct" | "union") IDENT "{" body "}" [";"]
//! enum      = "enum" IDENT [ ":" NAME ] "{" ... "}" [";"]
//! typedef   = "typedef" ... IDENT ";"
//! ```
//!
//! Inside bodies, anything that is not a nested type declaration (fields,
//! methods) is skipped up to its terminating `;`.

use std::path::Path;

use crate::base::{FqName, LineIndex, TextRange, TextSize};

use super::ast::{HalFile, Scope, TypeDecl, TypeKind};
use super::lexer::{Token, TokenKind, tokenize};
use super::ParseError;

/// Parse the text of the file at `path`. The path is only used for errors.
pub fn parse_source(text: &str, path: &Path) -> Result<HalFile, ParseError> {
    let line_index = LineIndex::new(text);
    let tokens = tokenize(text).map_err(|range| {
        let bad = &text[range];
        let message = if bad.starts_with("/*") {
            "unterminated comment".to_string()
        } else {
            format!("unexpected character '{bad}'")
        };
        ParseError::Syntax {
            path: path.to_path_buf(),
            at: line_index.start_of(range),
            message,
        }
    })?;

    SourceParser {
        text,
        tokens,
        pos: 0,
        path,
        line_index,
    }
    .parse_file()
}

struct SourceParser<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    path: &'a Path,
    line_index: LineIndex,
}

impl<'a> SourceParser<'a> {
    fn parse_file(mut self) -> Result<HalFile, ParseError> {
        self.expect(TokenKind::Package)?;
        let tok = self.expect(TokenKind::Name)?;
        let package = self.fq_name(tok)?;
        if !package.is_package_only() {
            return Err(self.error(tok.range, "expected a package name of the form pkg@M.m"));
        }
        self.expect(TokenKind::Semi)?;

        let mut imports = Vec::new();
        while self.at(TokenKind::Import) {
            self.bump();
            let tok = self.expect(TokenKind::Name)?;
            imports.push(self.fq_name(tok)?);
            self.expect(TokenKind::Semi)?;
        }

        let mut root = Scope::default();
        loop {
            self.skip_annotations()?;
            let Some(tok) = self.peek() else { break };
            let decl = match tok.kind {
                TokenKind::Interface => {
                    let decl = self.parse_interface()?;
                    if root.iter().any(|d| d.kind == TypeKind::Interface) {
                        return Err(self.error(decl.range, "a file may declare only one interface"));
                    }
                    decl
                }
                TokenKind::Struct | TokenKind::Union | TokenKind::Enum | TokenKind::Typedef => {
                    self.parse_type_decl()?
                }
                other => {
                    return Err(self.error(
                        tok.range,
                        format!("expected a declaration, found {}", other.describe()),
                    ));
                }
            };
            self.declare(&mut root, decl)?;
        }

        Ok(HalFile {
            package,
            imports,
            root,
        })
    }

    fn parse_interface(&mut self) -> Result<TypeDecl, ParseError> {
        self.expect(TokenKind::Interface)?;
        let (name, range) = self.expect_identifier()?;
        let mut decl = TypeDecl::new(name, TypeKind::Interface, range);

        if self.at(TokenKind::Extends) {
            self.bump();
            let tok = self.expect(TokenKind::Name)?;
            decl.extends = Some(self.fq_name(tok)?);
        }

        self.expect(TokenKind::LBrace)?;
        decl.members = self.parse_body()?;
        self.eat(TokenKind::Semi);
        Ok(decl)
    }

    /// Struct, union, enum or typedef. The current token is the keyword.
    fn parse_type_decl(&mut self) -> Result<TypeDecl, ParseError> {
        let Some(keyword) = self.bump() else {
            return Err(self.error_at_end("expected a type declaration"));
        };

        match keyword.kind {
            TokenKind::Struct | TokenKind::Union => {
                let kind = if keyword.kind == TokenKind::Struct {
                    TypeKind::Struct
                } else {
                    TypeKind::Union
                };
                let (name, range) = self.expect_identifier()?;
                let mut decl = TypeDecl::new(name, kind, range);
                self.expect(TokenKind::LBrace)?;
                decl.members = self.parse_body()?;
                self.eat(TokenKind::Semi);
                Ok(decl)
            }
            TokenKind::Enum => {
                let (name, range) = self.expect_identifier()?;
                if self.eat(TokenKind::Colon) {
                    self.expect(TokenKind::Name)?;
                }
                if !self.at(TokenKind::LBrace) {
                    return Err(self.error_here("expected '{' after enum header"));
                }
                self.skip_balanced()?;
                self.eat(TokenKind::Semi);
                Ok(TypeDecl::new(name, TypeKind::Enum, range))
            }
            TokenKind::Typedef => {
                let mut last = None;
                loop {
                    match self.bump() {
                        Some(tok) if tok.kind == TokenKind::Semi => break,
                        Some(tok) => last = Some(tok),
                        None => return Err(self.error_at_end("unterminated typedef")),
                    }
                }
                match last {
                    Some(tok) if tok.kind == TokenKind::Name && self.is_identifier(tok) => {
                        Ok(TypeDecl::new(self.slice(tok), TypeKind::Typedef, tok.range))
                    }
                    _ => Err(self.error(keyword.range, "typedef must end with the new type name")),
                }
            }
            other => Err(self.error(
                keyword.range,
                format!("expected a type declaration, found {}", other.describe()),
            )),
        }
    }

    /// Members up to and including the closing `}`.
    fn parse_body(&mut self) -> Result<Scope, ParseError> {
        let mut scope = Scope::default();
        loop {
            self.skip_annotations()?;
            let Some(tok) = self.peek() else {
                return Err(self.error_at_end("unexpected end of file, expected '}'"));
            };
            match tok.kind {
                TokenKind::RBrace => {
                    self.bump();
                    return Ok(scope);
                }
                TokenKind::Struct | TokenKind::Union | TokenKind::Enum | TokenKind::Typedef => {
                    let decl = self.parse_type_decl()?;
                    self.declare(&mut scope, decl)?;
                }
                TokenKind::Interface => {
                    return Err(self.error(tok.range, "interfaces cannot be nested"));
                }
                _ => self.skip_member()?,
            }
        }
    }

    fn declare(&self, scope: &mut Scope, decl: TypeDecl) -> Result<(), ParseError> {
        scope.insert(decl).map_err(|dup| {
            self.error(dup.range, format!("redefinition of '{}'", dup.name))
        })
    }

    /// Skip a field or method through its `;`, or up to an unmatched `}`.
    fn skip_member(&mut self) -> Result<(), ParseError> {
        while let Some(tok) = self.peek() {
            match tok.kind {
                TokenKind::Semi => {
                    self.bump();
                    return Ok(());
                }
                TokenKind::RBrace => return Ok(()),
                TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket => {
                    self.skip_balanced()?;
                }
                _ => {
                    self.bump();
                }
            }
        }
        Err(self.error_at_end("unexpected end of file inside a declaration body"))
    }

    fn skip_annotations(&mut self) -> Result<(), ParseError> {
        while self.at(TokenKind::Annotation) {
            self.bump();
            if self.at(TokenKind::LParen) {
                self.skip_balanced()?;
            }
        }
        Ok(())
    }

    /// The current token opens a group; consume through its closer.
    fn skip_balanced(&mut self) -> Result<(), ParseError> {
        let mut stack = Vec::new();
        while let Some(tok) = self.bump() {
            match tok.kind {
                TokenKind::LBrace => stack.push(TokenKind::RBrace),
                TokenKind::LParen => stack.push(TokenKind::RParen),
                TokenKind::LBracket => stack.push(TokenKind::RBracket),
                TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => {
                    if stack.pop() != Some(tok.kind) {
                        return Err(self.error(
                            tok.range,
                            format!("unbalanced {}", tok.kind.describe()),
                        ));
                    }
                }
                _ => {}
            }
            if stack.is_empty() {
                return Ok(());
            }
        }
        Err(self.error_at_end("unexpected end of file, unbalanced brackets"))
    }

    fn fq_name(&self, tok: Token) -> Result<FqName, ParseError> {
        FqName::parse(self.slice(tok)).map_err(|err| self.error(tok.range, err.to_string()))
    }

    fn expect_identifier(&mut self) -> Result<(&'a str, TextRange), ParseError> {
        let tok = self.expect(TokenKind::Name)?;
        if !self.is_identifier(tok) {
            return Err(self.error(
                tok.range,
                format!("expected a simple identifier, found '{}'", self.slice(tok)),
            ));
        }
        Ok((self.slice(tok), tok.range))
    }

    fn is_identifier(&self, tok: Token) -> bool {
        !self.slice(tok).contains(['.', '@', ':'])
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        match self.peek() {
            Some(tok) if tok.kind == kind => {
                self.bump();
                Ok(tok)
            }
            Some(tok) => Err(self.error(
                tok.range,
                format!("expected {}, found {}", kind.describe(), tok.kind.describe()),
            )),
            None => Err(self.error_at_end(format!("expected {}, found end of file", kind.describe()))),
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|tok| tok.kind == kind)
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.peek()?;
        self.pos += 1;
        Some(tok)
    }

    fn slice(&self, tok: Token) -> &'a str {
        &self.text[tok.range]
    }

    fn error(&self, range: TextRange, message: impl Into<String>) -> ParseError {
        ParseError::Syntax {
            path: self.path.to_path_buf(),
            at: self.line_index.start_of(range),
            message: message.into(),
        }
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        match self.peek() {
            Some(tok) => self.error(tok.range, message),
            None => self.error_at_end(message),
        }
    }

    fn error_at_end(&self, message: impl Into<String>) -> ParseError {
        let end = TextSize::from(self.text.len() as u32);
        self.error(TextRange::empty(end), message)
    }
}
