//! Parser for the jsonmap language
//!
//! This module implements a recursive descent parser that produces an AST
//! from a token stream. The parser is LL(1) with one token lookahead.
//!
//! Object bodies (and the top-level program) come in two dialects: the
//! statement style `key = expr;` and the JSON style `"key": expr,`. The
//! dialect is committed at the first assignment operator and may not be
//! mixed within one body.

pub mod ast;

use std::collections::HashSet;

use crate::errors::{JsonMapError, JsonMapResult};
use crate::lexer::token::{SourceLocation, Token, TokenKind};
use ast::*;

/// The two separator dialects of an object body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    /// `key = expr;`
    Statement,
    /// `"key": expr,`
    Json,
}

impl Dialect {
    /// The entry separator this dialect uses
    fn separator(self) -> TokenKind {
        match self {
            Dialect::Statement => TokenKind::Semicolon,
            Dialect::Json => TokenKind::Comma,
        }
    }
}

/// Parser for jsonmap source code
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    source: String,
}

impl Parser {
    /// Create a new parser from a token stream
    pub fn new(tokens: Vec<Token>, source: impl Into<String>) -> Self {
        Self {
            tokens,
            pos: 0,
            source: source.into(),
        }
    }

    /// Parse an entire program
    pub fn parse(&mut self) -> JsonMapResult<Program> {
        let start_loc = self.current_location();

        let bindings = self.parse_entries(false)?;

        if !self.is_at_end() {
            return Err(self.error_unexpected("end of file"));
        }

        let end_loc = self.previous_location();
        Ok(Program {
            bindings,
            location: start_loc.span_to(&end_loc),
        })
    }

    /// Parse the entries of an object body or the top-level program.
    /// The first assignment operator commits the dialect for the whole body.
    fn parse_entries(&mut self, in_object: bool) -> JsonMapResult<Vec<Binding>> {
        let mut entries = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut dialect: Option<Dialect> = None;

        loop {
            if self.at_entries_end(in_object) {
                break;
            }

            let name_loc = self.current_location();
            let name = self.parse_binding_name()?;
            if !seen.insert(name.clone()) {
                return Err(JsonMapError::duplicate_binding(
                    self.source.clone(),
                    &name_loc,
                    name,
                ));
            }

            let entry_dialect = match self.current().kind {
                TokenKind::Eq => Dialect::Statement,
                TokenKind::Colon => Dialect::Json,
                _ => return Err(self.error_unexpected("'=' or ':'")),
            };
            match dialect {
                None => dialect = Some(entry_dialect),
                Some(d) if d != entry_dialect => {
                    return Err(JsonMapError::mixed_object_styles(
                        self.source.clone(),
                        &self.current_location(),
                    ));
                }
                Some(_) => {}
            }
            self.advance();

            let value = self.parse_expr()?;
            let end_loc = self.previous_location();
            entries.push(Binding {
                name,
                value,
                location: name_loc.span_to(&end_loc),
            });

            // The separator is optional before the closing brace or end of file
            if self.at_entries_end(in_object) {
                break;
            }
            let expected = dialect.expect("dialect committed above").separator();
            if self.check(&expected) {
                self.advance();
            } else if matches!(
                self.current().kind,
                TokenKind::Semicolon | TokenKind::Comma
            ) {
                return Err(JsonMapError::mixed_object_styles(
                    self.source.clone(),
                    &self.current_location(),
                ));
            } else {
                return Err(self.error_unexpected(&format!("'{}'", expected)));
            }
        }

        Ok(entries)
    }

    /// Check whether the entry list ends here
    fn at_entries_end(&self, in_object: bool) -> bool {
        if in_object {
            self.check(&TokenKind::RightBrace)
        } else {
            self.is_at_end()
        }
    }

    /// Parse a binding name: an identifier or a quoted string
    fn parse_binding_name(&mut self) -> JsonMapResult<String> {
        match &self.current().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            TokenKind::String(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error_unexpected("binding name (identifier or string)")),
        }
    }

    /// Parse an expression
    fn parse_expr(&mut self) -> JsonMapResult<Expr> {
        let start_loc = self.current_location();

        match &self.current().kind.clone() {
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Null(start_loc))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Bool(true, start_loc))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Bool(false, start_loc))
            }
            TokenKind::Number(n) => {
                let n = *n;
                self.advance();
                Ok(Expr::Number(n, start_loc))
            }
            TokenKind::String(s) => {
                let s = s.clone();
                self.advance();
                Ok(Expr::String(s, start_loc))
            }
            TokenKind::Ref => self.parse_ref(RefRoot::Current),
            TokenKind::AnonRef => self.parse_ref(RefRoot::Anonymous),
            TokenKind::GlobalRef => self.parse_ref(RefRoot::Global),
            TokenKind::LeftBracket => Ok(Expr::List(self.parse_list()?)),
            TokenKind::LeftBrace => Ok(Expr::Object(self.parse_object()?)),
            TokenKind::Map => self.parse_map(),
            TokenKind::Zip => self.parse_zip(),
            TokenKind::Bind => self.parse_bind(),
            _ => Err(self.error_unexpected("expression")),
        }
    }

    /// Parse a reference after one of the `&`, `&?`, `&!` sigils
    fn parse_ref(&mut self, root: RefRoot) -> JsonMapResult<Expr> {
        let start_loc = self.current_location();
        self.advance(); // the sigil

        let mut path = Vec::new();

        // The first step may follow the sigil directly: `&actor`, `&!store`
        if self.starts_path_step() {
            path.push(self.parse_path_step()?);
        }
        while self.check(&TokenKind::Dot) {
            self.advance();
            path.push(self.parse_path_step()?);
        }

        let end_loc = self.previous_location();
        Ok(Expr::Ref(RefExpr {
            root,
            path,
            location: start_loc.span_to(&end_loc),
        }))
    }

    /// Check if the current token can begin a path step
    fn starts_path_step(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Ident(_) | TokenKind::String(_) | TokenKind::Number(_)
        )
    }

    /// Parse one path step: a field name or a list index
    fn parse_path_step(&mut self) -> JsonMapResult<PathStep> {
        match &self.current().kind.clone() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(PathStep::Field(name))
            }
            TokenKind::String(name) => {
                let name = name.clone();
                self.advance();
                Ok(PathStep::Field(name))
            }
            TokenKind::Number(n) => {
                if n.fract() == 0.0 && *n >= 0.0 && *n <= u32::MAX as f64 {
                    let index = *n as u32;
                    self.advance();
                    Ok(PathStep::Index(index))
                } else {
                    Err(JsonMapError::unexpected_token(
                        self.source.clone(),
                        &self.current_location(),
                        "a non-negative integer list index",
                        format!("{}", n),
                        "write each index as its own step, e.g. &items.0.1",
                    ))
                }
            }
            _ => Err(self.error_unexpected("path step (identifier, string, or index)")),
        }
    }

    /// Parse a list literal
    fn parse_list(&mut self) -> JsonMapResult<ListExpr> {
        let start_loc = self.current_location();
        self.expect(&TokenKind::LeftBracket)?;

        let mut elements = Vec::new();

        while !self.check(&TokenKind::RightBracket) {
            elements.push(self.parse_expr()?);
            if !self.check(&TokenKind::RightBracket) {
                self.expect(&TokenKind::Comma)?;
            }
        }

        self.expect(&TokenKind::RightBracket)?;
        let end_loc = self.previous_location();

        Ok(ListExpr {
            elements,
            location: start_loc.span_to(&end_loc),
        })
    }

    /// Parse an object literal (either dialect)
    fn parse_object(&mut self) -> JsonMapResult<ObjectExpr> {
        let start_loc = self.current_location();
        self.expect(&TokenKind::LeftBrace)?;

        let entries = self.parse_entries(true)?;

        self.expect(&TokenKind::RightBrace)?;
        let end_loc = self.previous_location();

        Ok(ObjectExpr {
            entries,
            location: start_loc.span_to(&end_loc),
        })
    }

    /// Parse `map source body`
    fn parse_map(&mut self) -> JsonMapResult<Expr> {
        let start_loc = self.current_location();
        self.expect(&TokenKind::Map)?;

        let source = self.parse_expr()?;
        let body = self.parse_body("map")?;

        let end_loc = self.previous_location();
        Ok(Expr::Map(Box::new(MapExpr {
            source,
            body,
            location: start_loc.span_to(&end_loc),
        })))
    }

    /// Parse `zip source+ body`.
    ///
    /// Sources and body are all primary expressions; the final `[...]` or
    /// `{...}` group is the body, everything before it is a source.
    fn parse_zip(&mut self) -> JsonMapResult<Expr> {
        let start_loc = self.current_location();
        self.expect(&TokenKind::Zip)?;

        let mut args = Vec::new();
        while self.starts_expr() {
            args.push(self.parse_expr()?);
        }

        let body = match args.pop() {
            Some(Expr::List(list)) => {
                if list.elements.is_empty() {
                    return Err(JsonMapError::empty_list_body(
                        self.source.clone(),
                        &list.location,
                    ));
                }
                Body::List(list)
            }
            Some(Expr::Object(obj)) => Body::Object(obj),
            Some(other) => {
                return Err(JsonMapError::unexpected_token(
                    self.source.clone(),
                    other.location(),
                    "a '{' or '[' body as the final zip argument",
                    "an expression",
                    "the last bracketed group after the zip sources is the body",
                ));
            }
            None => return Err(self.error_unexpected("zip sources and a body")),
        };

        if args.is_empty() {
            return Err(JsonMapError::zip_without_sources(
                self.source.clone(),
                &start_loc,
            ));
        }

        let end_loc = self.previous_location();
        Ok(Expr::Zip(Box::new(ZipExpr {
            sources: args,
            body,
            location: start_loc.span_to(&end_loc),
        })))
    }

    /// Parse `bind source body`
    fn parse_bind(&mut self) -> JsonMapResult<Expr> {
        let start_loc = self.current_location();
        self.expect(&TokenKind::Bind)?;

        let source = self.parse_expr()?;
        let body = self.parse_body("bind")?;

        let end_loc = self.previous_location();
        Ok(Expr::Bind(Box::new(BindExpr {
            source,
            body,
            location: start_loc.span_to(&end_loc),
        })))
    }

    /// Parse the body of a `map`/`bind`: a list body or an object body
    fn parse_body(&mut self, keyword: &str) -> JsonMapResult<Body> {
        match self.current().kind {
            TokenKind::LeftBracket => {
                let list = self.parse_list()?;
                if list.elements.is_empty() {
                    return Err(JsonMapError::empty_list_body(
                        self.source.clone(),
                        &list.location,
                    ));
                }
                Ok(Body::List(list))
            }
            TokenKind::LeftBrace => Ok(Body::Object(self.parse_object()?)),
            _ => Err(self.error_unexpected(&format!("a '{{' or '[' body for {}", keyword))),
        }
    }

    /// Check if the current token can begin an expression
    fn starts_expr(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Null
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Number(_)
                | TokenKind::String(_)
                | TokenKind::Ref
                | TokenKind::AnonRef
                | TokenKind::GlobalRef
                | TokenKind::LeftBracket
                | TokenKind::LeftBrace
                | TokenKind::Map
                | TokenKind::Zip
                | TokenKind::Bind
        )
    }

    // Helper methods

    /// Get the current token
    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| {
            self.tokens
                .last()
                .expect("token stream should not be empty")
        })
    }

    /// Get the current token's location
    fn current_location(&self) -> SourceLocation {
        self.current().location.clone()
    }

    /// Get the previous token's location
    fn previous_location(&self) -> SourceLocation {
        if self.pos > 0 {
            self.tokens[self.pos - 1].location.clone()
        } else {
            self.current_location()
        }
    }

    /// Check if we're at the end of input
    fn is_at_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    /// Check if current token matches expected kind
    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    /// Advance to next token
    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    /// Expect a specific token kind
    fn expect(&mut self, kind: &TokenKind) -> JsonMapResult<()> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_unexpected(&format!("{}", kind)))
        }
    }

    /// Create an "unexpected token" error
    fn error_unexpected(&self, expected: &str) -> JsonMapError {
        JsonMapError::unexpected_token(
            self.source.clone(),
            &self.current_location(),
            expected,
            format!("{}", self.current().kind),
            "check syntax",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> JsonMapResult<Program> {
        let mut lexer = Lexer::new(source, None);
        let tokens = lexer.tokenize()?;
        let mut parser = Parser::new(tokens, source);
        parser.parse()
    }

    #[test]
    fn test_empty_program() {
        let program = parse("").unwrap();
        assert!(program.bindings.is_empty());
    }

    #[test]
    fn test_simple_binding() {
        let program = parse("speaker = &actor;").unwrap();
        assert_eq!(program.bindings.len(), 1);
        assert_eq!(program.bindings[0].name, "speaker");

        if let Expr::Ref(r) = &program.bindings[0].value {
            assert_eq!(r.root, RefRoot::Current);
            assert_eq!(r.path, vec![PathStep::Field("actor".to_string())]);
        } else {
            panic!("expected reference");
        }
    }

    #[test]
    fn test_trailing_separator_optional() {
        assert_eq!(parse("a = 1; b = 2;").unwrap().bindings.len(), 2);
        assert_eq!(parse("a = 1; b = 2").unwrap().bindings.len(), 2);
    }

    #[test]
    fn test_json_dialect_top_level() {
        let program = parse(r#"foo: null, "fizz": &"bar","#).unwrap();
        assert_eq!(program.bindings.len(), 2);
        assert_eq!(program.bindings[1].name, "fizz");
    }

    #[test]
    fn test_string_binding_name() {
        let program = parse(r#""my key" = 1;"#).unwrap();
        assert_eq!(program.bindings[0].name, "my key");
    }

    #[test]
    fn test_mixed_dialects_rejected() {
        assert!(matches!(
            parse("a = 1; b: 2;"),
            Err(JsonMapError::MixedObjectStyles { .. })
        ));
        assert!(matches!(
            parse("a = 1, b = 2,"),
            Err(JsonMapError::MixedObjectStyles { .. })
        ));
        assert!(matches!(
            parse("x = { a: 1, b = 2 };"),
            Err(JsonMapError::MixedObjectStyles { .. })
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        assert!(matches!(
            parse("a = 1; a = 2;"),
            Err(JsonMapError::DuplicateBinding { .. })
        ));
        assert!(matches!(
            parse("x = { k = 1; k = 2; };"),
            Err(JsonMapError::DuplicateBinding { .. })
        ));
        // The same name in sibling scopes is fine
        assert!(parse("x = { k = 1; }; y = { k = 2; };").is_ok());
    }

    #[test]
    fn test_literals() {
        let program = parse("a = null; b = true; c = -1.5; d = \"hi\";").unwrap();
        assert!(matches!(program.bindings[0].value, Expr::Null(_)));
        assert!(matches!(program.bindings[1].value, Expr::Bool(true, _)));
        assert!(matches!(program.bindings[2].value, Expr::Number(n, _) if n == -1.5));
        assert!(matches!(&program.bindings[3].value, Expr::String(s, _) if s == "hi"));
    }

    #[test]
    fn test_list_literal() {
        let program = parse("xs = [1, \"two\", [3], {four = 4;}];").unwrap();
        if let Expr::List(list) = &program.bindings[0].value {
            assert_eq!(list.elements.len(), 4);
        } else {
            panic!("expected list");
        }
        // Trailing comma allowed
        assert!(parse("xs = [1, 2,];").is_ok());
        assert!(parse("xs = [];").is_ok());
    }

    #[test]
    fn test_empty_object() {
        let program = parse("x = {};").unwrap();
        if let Expr::Object(obj) = &program.bindings[0].value {
            assert!(obj.entries.is_empty());
        } else {
            panic!("expected object");
        }
    }

    #[test]
    fn test_object_dialects() {
        let stmt = parse("x = { teacher = &t; grade = 5; };").unwrap();
        let json = parse(r#"x = { "teacher": &t, "grade": 5 };"#).unwrap();

        for program in [stmt, json] {
            if let Expr::Object(obj) = &program.bindings[0].value {
                assert_eq!(obj.entries.len(), 2);
                assert_eq!(obj.entries[0].name, "teacher");
                assert_eq!(obj.entries[1].name, "grade");
            } else {
                panic!("expected object");
            }
        }
    }

    #[test]
    fn test_ref_paths() {
        let program = parse(
            r#"a = &; b = &x.y."z w".2; c = &?; d = &?.1; e = &!; f = &!store;"#,
        )
        .unwrap();

        let refs: Vec<&RefExpr> = program
            .bindings
            .iter()
            .map(|b| match &b.value {
                Expr::Ref(r) => r,
                _ => panic!("expected reference"),
            })
            .collect();

        assert_eq!(refs[0].root, RefRoot::Current);
        assert!(refs[0].path.is_empty());

        assert_eq!(
            refs[1].path,
            vec![
                PathStep::Field("x".to_string()),
                PathStep::Field("y".to_string()),
                PathStep::Field("z w".to_string()),
                PathStep::Index(2),
            ]
        );

        assert_eq!(refs[2].root, RefRoot::Anonymous);
        assert!(refs[2].path.is_empty());
        assert_eq!(refs[3].path, vec![PathStep::Index(1)]);

        assert_eq!(refs[4].root, RefRoot::Global);
        assert_eq!(refs[5].path, vec![PathStep::Field("store".to_string())]);
    }

    #[test]
    fn test_fractional_index_rejected() {
        // `0.1` lexes as one number; it is not a valid path step
        assert!(matches!(
            parse("x = &a.0.1;"),
            Err(JsonMapError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_map() {
        let program = parse("classes = map &schedule { subject = &class; };").unwrap();
        if let Expr::Map(m) = &program.bindings[0].value {
            assert!(matches!(&m.source, Expr::Ref(_)));
            assert!(matches!(&m.body, Body::Object(_)));
        } else {
            panic!("expected map");
        }
    }

    #[test]
    fn test_map_list_body() {
        let program = parse("names = map &students [ &first_name ];").unwrap();
        if let Expr::Map(m) = &program.bindings[0].value {
            if let Body::List(list) = &m.body {
                assert_eq!(list.elements.len(), 1);
            } else {
                panic!("expected list body");
            }
        } else {
            panic!("expected map");
        }
    }

    #[test]
    fn test_map_literal_source() {
        let program = parse("names = map [{n = 1;}, {n = 2;}] { v = &n; };").unwrap();
        if let Expr::Map(m) = &program.bindings[0].value {
            assert!(matches!(&m.source, Expr::List(_)));
        } else {
            panic!("expected map");
        }
    }

    #[test]
    fn test_empty_list_body_rejected() {
        assert!(matches!(
            parse("xs = map &a [];"),
            Err(JsonMapError::EmptyListBody { .. })
        ));
        assert!(matches!(
            parse("xs = zip &a [];"),
            Err(JsonMapError::EmptyListBody { .. })
        ));
    }

    #[test]
    fn test_missing_body_rejected() {
        assert!(matches!(
            parse("xs = map &a;"),
            Err(JsonMapError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse("xs = bind &a;"),
            Err(JsonMapError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_zip_sources_and_body() {
        let program =
            parse("nums = zip [1, 2] [\"one\", \"two\"] { v = &?.0; n = &?.1; };").unwrap();
        if let Expr::Zip(z) = &program.bindings[0].value {
            assert_eq!(z.sources.len(), 2);
            assert!(matches!(&z.body, Body::Object(_)));
        } else {
            panic!("expected zip");
        }
    }

    #[test]
    fn test_zip_final_list_is_body() {
        // Three bracketed groups: two sources, the last is the body
        let program = parse("out = zip [1] [2] [ &?.0 ];").unwrap();
        if let Expr::Zip(z) = &program.bindings[0].value {
            assert_eq!(z.sources.len(), 2);
            assert!(matches!(&z.body, Body::List(_)));
        } else {
            panic!("expected zip");
        }
    }

    #[test]
    fn test_zip_without_sources_rejected() {
        assert!(matches!(
            parse("out = zip { v = 1; };"),
            Err(JsonMapError::ZipWithoutSources { .. })
        ));
    }

    #[test]
    fn test_zip_without_body_rejected() {
        assert!(matches!(
            parse("out = zip &a &b;"),
            Err(JsonMapError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_bind() {
        let program = parse("foo = bind &bar { first = &first; };").unwrap();
        if let Expr::Bind(b) = &program.bindings[0].value {
            assert!(matches!(&b.source, Expr::Ref(_)));
            assert!(matches!(&b.body, Body::Object(_)));
        } else {
            panic!("expected bind");
        }
    }

    #[test]
    fn test_nested_scopes() {
        let program = parse(
            r#"
            fizz = {
                buzz = {
                    whiz = "bang";
                };
                widget = &fuzz;
            };
            "#,
        )
        .unwrap();
        if let Expr::Object(obj) = &program.bindings[0].value {
            assert_eq!(obj.entries.len(), 2);
            assert!(matches!(&obj.entries[0].value, Expr::Object(_)));
        } else {
            panic!("expected object");
        }
    }

    #[test]
    fn test_error_has_position() {
        let err = parse("x = ;").unwrap_err();
        let span = err.span().expect("parse errors carry a span");
        assert_eq!(span.offset(), 4);
    }

    #[test]
    fn test_comments_ignored() {
        let program = parse("// leading comment\na = 1; // trailing\n").unwrap();
        assert_eq!(program.bindings.len(), 1);
    }
}
