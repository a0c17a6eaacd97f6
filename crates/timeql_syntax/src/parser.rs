//! Recursive descent parser for GraphQL documents.
//!
//! After the first error inside a definition the parser stops reporting
//! until it has skipped to the next definition, so one mistake yields one
//! diagnostic.

use crate::ast::*;
use crate::lexer::{block_string_value, unescape_string, Lexer};
use crate::token::{Token, TokenKind};
use std::borrow::Cow;
use timeql_core::{diagnostics::codes, DiagnosticBag, Interner, Span, Text};

/// Deepest nesting of selection sets, list and object values, and list
/// types accepted in one document.
pub const MAX_DEPTH: usize = 128;

/// Parser for GraphQL documents.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    diagnostics: DiagnosticBag,
    failed: bool,
    depth: usize,
}

/// Result of parsing.
pub struct ParseResult<'a> {
    pub document: Document<'a>,
    pub diagnostics: DiagnosticBag,
}

/// Parses a source string into a document.
pub fn parse<'a>(source: &'a str, interner: &'a Interner) -> ParseResult<'a> {
    let mut parser = Parser::new(source, interner);
    let document = parser.parse_document();
    ParseResult {
        document,
        diagnostics: parser.diagnostics,
    }
}

impl<'a> Parser<'a> {
    /// Creates a new parser.
    pub fn new(source: &'a str, interner: &'a Interner) -> Self {
        let mut lexer = Lexer::new(source, interner);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            diagnostics: DiagnosticBag::new(),
            failed: false,
            depth: 0,
        }
    }

    /// Returns the current token kind.
    #[inline]
    fn at(&self) -> TokenKind {
        self.current.kind
    }

    /// Returns true if at the given kind.
    #[inline]
    fn at_kind(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Returns true when a delimited list should stop.
    #[inline]
    fn at_list_end(&self, close: TokenKind) -> bool {
        self.failed || self.at_kind(close) || self.at_kind(TokenKind::Eof)
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    /// Expects a specific token kind.
    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.at_kind(kind) {
            self.advance();
            true
        } else {
            self.error_expected(kind.as_str());
            false
        }
    }

    /// Gets the text of the current token.
    fn current_text(&self) -> &'a str {
        self.lexer.span_text(self.current.span)
    }

    /// Interns the current token's text.
    fn intern_current(&self) -> Text {
        self.lexer.intern_span(self.current.span)
    }

    /// Describes the current token for error messages.
    fn describe_current(&self) -> String {
        match self.at() {
            TokenKind::Eof => TokenKind::Eof.as_str().to_string(),
            kind if kind.is_name() => format!("`{}`", self.current_text()),
            TokenKind::IntLiteral
            | TokenKind::FloatLiteral
            | TokenKind::StringLiteral
            | TokenKind::BlockStringLiteral
            | TokenKind::Error => format!("`{}`", self.current_text()),
            kind => format!("`{kind}`"),
        }
    }

    /// Reports an error at a span unless one is already pending.
    fn error_at(&mut self, code: &str, title: &str, span: Span, message: String) {
        if self.failed {
            return;
        }
        self.failed = true;
        self.diagnostics.error(code, title, span, message);
    }

    /// Reports an error at the current token.
    fn error(&mut self, message: &str) {
        if self.at_kind(TokenKind::Error) {
            self.error_lexical();
            return;
        }
        let message = format!("{message}, found {}", self.describe_current());
        self.error_at(
            codes::INVALID_SYNTAX,
            "invalid syntax",
            self.current.span,
            message,
        );
    }

    /// Reports an expected token error.
    fn error_expected(&mut self, expected: &str) {
        if self.at_kind(TokenKind::Error) {
            self.error_lexical();
            return;
        }
        let code = if self.at_kind(TokenKind::Eof) {
            codes::UNEXPECTED_EOF
        } else {
            codes::UNEXPECTED_TOKEN
        };
        let message = format!("expected {expected}, found {}", self.describe_current());
        self.error_at(code, "unexpected token", self.current.span, message);
    }

    /// Reports the error carried by an `Error` token.
    fn error_lexical(&mut self) {
        let text = self.current_text();
        let (code, title, message) = match text.as_bytes().first() {
            Some(b'"') => (
                codes::UNTERMINATED_STRING,
                "unterminated string",
                "unterminated string literal".to_string(),
            ),
            Some(b'-' | b'0'..=b'9') => (
                codes::INVALID_NUMBER,
                "invalid number",
                format!("invalid number literal `{text}`"),
            ),
            _ => (
                codes::UNEXPECTED_TOKEN,
                "unexpected character",
                format!("unexpected character `{text}`"),
            ),
        };
        self.error_at(code, title, self.current.span, message);
    }

    /// Enters one level of nesting.
    ///
    /// Past [`MAX_DEPTH`] this reports an error, skips the rest of the input
    /// and returns false; the caller must not call [`Self::leave`] then.
    fn enter(&mut self) -> bool {
        if self.depth >= MAX_DEPTH {
            let message = format!("document is nested more than {MAX_DEPTH} levels deep");
            self.error_at(
                codes::INVALID_SYNTAX,
                "nesting too deep",
                self.current.span,
                message,
            );
            while !self.at_kind(TokenKind::Eof) {
                self.advance();
            }
            return false;
        }
        self.depth += 1;
        true
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Skips tokens until the start of the next top-level definition.
    fn recover(&mut self, definition_start: u32) {
        let mut depth = 0usize;
        loop {
            match self.at() {
                TokenKind::Eof => break,
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    self.advance();
                    if depth == 0 {
                        break;
                    }
                    continue;
                }
                TokenKind::Type
                | TokenKind::Scalar
                | TokenKind::Schema
                | TokenKind::Enum
                | TokenKind::Input
                | TokenKind::Interface
                | TokenKind::Union
                | TokenKind::Directive
                | TokenKind::Extend
                | TokenKind::Fragment
                | TokenKind::Query
                | TokenKind::Mutation
                | TokenKind::Subscription
                    if depth == 0 && self.current.span.start > definition_start =>
                {
                    break;
                }
                _ => {}
            }
            self.advance();
        }
        self.failed = false;
    }

    /// Parses a document.
    pub fn parse_document(&mut self) -> Document<'a> {
        let start = self.current.span.start;
        let mut definitions = Vec::new();

        if self.at_kind(TokenKind::Eof) {
            self.error_at(
                codes::UNEXPECTED_EOF,
                "empty document",
                self.current.span,
                "document contains no definitions".to_string(),
            );
        }

        while !self.at_kind(TokenKind::Eof) {
            let before = self.current.span.start;
            if let Some(def) = self.parse_definition() {
                definitions.push(def);
            }
            if self.failed || self.current.span.start == before {
                self.recover(before);
            }
        }

        let end = self.current.span.end;
        Document {
            definitions,
            span: Span::new(start, end),
        }
    }

    /// Parses a definition.
    fn parse_definition(&mut self) -> Option<Definition<'a>> {
        let description = self.try_parse_description();

        match self.at() {
            TokenKind::Schema => Some(Definition::Schema(
                self.parse_schema_definition(description),
            )),
            TokenKind::Type => Some(Definition::Type(TypeDefinition::Object(
                self.parse_object_type(description),
            ))),
            TokenKind::Enum => Some(Definition::Type(TypeDefinition::Enum(
                self.parse_enum_type(description),
            ))),
            TokenKind::Input => Some(Definition::Type(TypeDefinition::Input(
                self.parse_input_object_type(description),
            ))),
            TokenKind::Scalar => Some(Definition::Type(TypeDefinition::Scalar(
                self.parse_scalar_type(description),
            ))),
            TokenKind::Interface | TokenKind::Union | TokenKind::Directive | TokenKind::Extend => {
                let message = format!("`{}` definitions are not supported", self.at());
                self.error_at(
                    codes::INVALID_SYNTAX,
                    "unsupported definition",
                    self.current.span,
                    message,
                );
                None
            }
            TokenKind::Query
            | TokenKind::Mutation
            | TokenKind::Subscription
            | TokenKind::LBrace => Some(Definition::Operation(self.parse_operation())),
            TokenKind::Fragment => Some(Definition::Fragment(self.parse_fragment_definition())),
            _ => {
                self.error("expected definition");
                None
            }
        }
    }

    /// Decodes the current string token.
    fn string_value(&mut self) -> Cow<'a, str> {
        let text = self.current_text();
        if self.at_kind(TokenKind::BlockStringLiteral) {
            return Cow::Owned(block_string_value(&text[3..text.len() - 3]));
        }
        match unescape_string(&text[1..text.len() - 1]) {
            Ok(value) => value,
            Err(err) => {
                let offset = self.current.span.start + 1 + err.offset as u32;
                let span = Span::new(offset, offset + err.sequence.len() as u32);
                self.error_at(
                    codes::INVALID_ESCAPE,
                    "invalid escape sequence",
                    span,
                    err.to_string(),
                );
                Cow::Borrowed("")
            }
        }
    }

    /// Tries to parse a description.
    fn try_parse_description(&mut self) -> Option<Description<'a>> {
        if matches!(
            self.at(),
            TokenKind::StringLiteral | TokenKind::BlockStringLiteral
        ) {
            let span = self.current.span;
            let value = self.string_value();
            self.advance();
            Some(Description::new(value, span))
        } else {
            None
        }
    }

    /// Parses a name.
    fn parse_name(&mut self) -> Name {
        let span = self.current.span;
        if self.at().is_name() {
            let value = self.intern_current();
            self.advance();
            Name::new(value, span)
        } else {
            self.error_expected("name");
            Name::new(self.lexer.intern_span(Span::empty(span.start)), span)
        }
    }

    /// Parses schema definition.
    fn parse_schema_definition(
        &mut self,
        description: Option<Description<'a>>,
    ) -> SchemaDefinition<'a> {
        let start = self.current.span.start;
        self.advance(); // schema

        let directives = self.parse_directives();
        self.expect(TokenKind::LBrace);

        let mut operations = Vec::new();
        while !self.at_list_end(TokenKind::RBrace) {
            let op_start = self.current.span.start;
            let operation = match self.at() {
                TokenKind::Query => OperationType::Query,
                TokenKind::Mutation => OperationType::Mutation,
                TokenKind::Subscription => OperationType::Subscription,
                _ => {
                    self.error("expected operation type");
                    break;
                }
            };
            self.advance();
            self.expect(TokenKind::Colon);
            let type_name = self.parse_name();
            operations.push(OperationTypeDefinition {
                operation,
                type_name,
                span: Span::new(op_start, type_name.span.end),
            });
        }
        self.expect(TokenKind::RBrace);

        let end = self.current.span.start;
        SchemaDefinition {
            description,
            directives,
            operations,
            span: Span::new(start, end),
        }
    }

    /// Parses object type definition.
    fn parse_object_type(
        &mut self,
        description: Option<Description<'a>>,
    ) -> ObjectTypeDefinition<'a> {
        let start = self.current.span.start;
        self.advance(); // type

        let name = self.parse_name();
        let directives = self.parse_directives();

        let fields = if self.at_kind(TokenKind::LBrace) {
            self.advance();
            let fields = self.parse_field_definitions();
            self.expect(TokenKind::RBrace);
            fields
        } else {
            Vec::new()
        };

        let end = self.current.span.start;
        ObjectTypeDefinition {
            description,
            name,
            directives,
            fields,
            span: Span::new(start, end),
        }
    }

    /// Parses enum type definition.
    fn parse_enum_type(&mut self, description: Option<Description<'a>>) -> EnumTypeDefinition<'a> {
        let start = self.current.span.start;
        self.advance(); // enum

        let name = self.parse_name();
        let directives = self.parse_directives();

        let mut values = Vec::new();
        if self.at_kind(TokenKind::LBrace) {
            self.advance();
            while !self.at_list_end(TokenKind::RBrace) {
                let value_start = self.current.span.start;
                let description = self.try_parse_description();
                if matches!(
                    self.at(),
                    TokenKind::True | TokenKind::False | TokenKind::Null
                ) {
                    self.error("enum values cannot be `true`, `false` or `null`");
                    break;
                }
                let name = self.parse_name();
                let directives = self.parse_directives();
                values.push(EnumValueDefinition {
                    description,
                    name,
                    directives,
                    span: Span::new(value_start, self.current.span.start),
                });
            }
            self.expect(TokenKind::RBrace);
        }

        let end = self.current.span.start;
        EnumTypeDefinition {
            description,
            name,
            directives,
            values,
            span: Span::new(start, end),
        }
    }

    /// Parses input object type definition.
    fn parse_input_object_type(
        &mut self,
        description: Option<Description<'a>>,
    ) -> InputObjectTypeDefinition<'a> {
        let start = self.current.span.start;
        self.advance(); // input

        let name = self.parse_name();
        let directives = self.parse_directives();

        let fields = if self.at_kind(TokenKind::LBrace) {
            self.advance();
            let fields = self.parse_input_value_definitions(TokenKind::RBrace);
            self.expect(TokenKind::RBrace);
            fields
        } else {
            Vec::new()
        };

        let end = self.current.span.start;
        InputObjectTypeDefinition {
            description,
            name,
            directives,
            fields,
            span: Span::new(start, end),
        }
    }

    /// Parses scalar type definition.
    fn parse_scalar_type(
        &mut self,
        description: Option<Description<'a>>,
    ) -> ScalarTypeDefinition<'a> {
        let start = self.current.span.start;
        self.advance(); // scalar

        let name = self.parse_name();
        let directives = self.parse_directives();

        let end = self.current.span.start;
        ScalarTypeDefinition {
            description,
            name,
            directives,
            span: Span::new(start, end),
        }
    }

    /// Parses field definitions.
    fn parse_field_definitions(&mut self) -> Vec<FieldDefinition<'a>> {
        let mut fields = Vec::new();
        while !self.at_list_end(TokenKind::RBrace) {
            let description = self.try_parse_description();
            fields.push(self.parse_field_definition(description));
        }
        fields
    }

    /// Parses a field definition.
    fn parse_field_definition(
        &mut self,
        description: Option<Description<'a>>,
    ) -> FieldDefinition<'a> {
        let start = self.current.span.start;
        let name = self.parse_name();

        let arguments = if self.at_kind(TokenKind::LParen) {
            self.advance();
            let args = self.parse_input_value_definitions(TokenKind::RParen);
            self.expect(TokenKind::RParen);
            args
        } else {
            Vec::new()
        };

        self.expect(TokenKind::Colon);
        let ty = self.parse_type();
        let directives = self.parse_directives();

        let end = self.current.span.start;
        FieldDefinition {
            description,
            name,
            arguments,
            ty,
            directives,
            span: Span::new(start, end),
        }
    }

    /// Parses input value definitions up to a closing token.
    fn parse_input_value_definitions(&mut self, close: TokenKind) -> Vec<InputValueDefinition<'a>> {
        let mut fields = Vec::new();
        while !self.at_list_end(close) {
            let description = self.try_parse_description();
            fields.push(self.parse_input_value_definition(description));
        }
        fields
    }

    /// Parses an input value definition.
    fn parse_input_value_definition(
        &mut self,
        description: Option<Description<'a>>,
    ) -> InputValueDefinition<'a> {
        let start = self.current.span.start;
        let name = self.parse_name();
        self.expect(TokenKind::Colon);
        let ty = self.parse_type();

        let default_value = if self.at_kind(TokenKind::Eq) {
            self.advance();
            Some(self.parse_value(true))
        } else {
            None
        };

        let directives = self.parse_directives();

        let end = self.current.span.start;
        InputValueDefinition {
            description,
            name,
            ty,
            default_value,
            directives,
            span: Span::new(start, end),
        }
    }

    /// Parses a type reference: `Name`, `[Type]`, optionally followed by `!`.
    fn parse_type(&mut self) -> Type {
        let start = self.current.span.start;

        let ty = if self.at_kind(TokenKind::LBracket) {
            if !self.enter() {
                return Type::Named(NamedType {
                    name: self.lexer.intern_span(Span::empty(start)),
                    span: self.current.span,
                });
            }
            self.advance();
            let inner = self.parse_type();
            self.expect(TokenKind::RBracket);
            self.leave();
            Type::List(Box::new(inner), Span::new(start, self.current.span.start))
        } else {
            let name = self.parse_name();
            Type::Named(NamedType {
                name: name.value,
                span: name.span,
            })
        };

        if self.at_kind(TokenKind::Bang) {
            let end = self.current.span.end;
            self.advance();
            Type::NonNull(Box::new(ty), Span::new(start, end))
        } else {
            ty
        }
    }

    /// Parses directives.
    fn parse_directives(&mut self) -> Vec<Directive<'a>> {
        let mut directives = Vec::new();
        while self.at_kind(TokenKind::At) && !self.failed {
            directives.push(self.parse_directive());
        }
        directives
    }

    /// Parses a directive.
    fn parse_directive(&mut self) -> Directive<'a> {
        let start = self.current.span.start;
        self.advance(); // @

        let name = self.parse_name();
        let arguments = self.parse_arguments();

        let end = self.current.span.start;
        Directive {
            name,
            arguments,
            span: Span::new(start, end),
        }
    }

    /// Parses an optional parenthesized argument list.
    fn parse_arguments(&mut self) -> Vec<Argument<'a>> {
        if !self.at_kind(TokenKind::LParen) {
            return Vec::new();
        }
        self.advance();

        let mut args = Vec::new();
        if self.at_kind(TokenKind::RParen) {
            self.error("expected argument");
        }
        while !self.at_list_end(TokenKind::RParen) {
            args.push(self.parse_argument());
        }
        self.expect(TokenKind::RParen);
        args
    }

    /// Parses an argument.
    fn parse_argument(&mut self) -> Argument<'a> {
        let start = self.current.span.start;
        let name = self.parse_name();
        self.expect(TokenKind::Colon);
        let value = self.parse_value(false);
        let end = self.current.span.start;
        Argument {
            name,
            value,
            span: Span::new(start, end),
        }
    }

    /// Parses a value. Constant contexts reject variables.
    fn parse_value(&mut self, constant: bool) -> Value<'a> {
        let start = self.current.span.start;
        let span = self.current.span;

        match self.at() {
            TokenKind::Dollar if !constant => {
                self.advance();
                let name = self.parse_name();
                Value::Variable(Name::new(name.value, Span::new(start, name.span.end)))
            }
            TokenKind::IntLiteral => {
                let text = self.current_text();
                let value = match text.parse() {
                    Ok(value) => value,
                    Err(_) => {
                        let message = format!("integer literal `{text}` is out of range");
                        self.error_at(codes::INVALID_NUMBER, "invalid number", span, message);
                        0
                    }
                };
                self.advance();
                Value::Int(value, span)
            }
            TokenKind::FloatLiteral => {
                let value = self.current_text().parse().unwrap_or(f64::INFINITY);
                self.advance();
                Value::Float(value, span)
            }
            TokenKind::StringLiteral | TokenKind::BlockStringLiteral => {
                let value = self.string_value();
                self.advance();
                Value::String(value, span)
            }
            TokenKind::True => {
                self.advance();
                Value::Boolean(true, span)
            }
            TokenKind::False => {
                self.advance();
                Value::Boolean(false, span)
            }
            TokenKind::Null => {
                self.advance();
                Value::Null(span)
            }
            TokenKind::LBracket => {
                if !self.enter() {
                    return Value::Null(span);
                }
                self.advance();
                let mut values = Vec::new();
                while !self.at_list_end(TokenKind::RBracket) {
                    values.push(self.parse_value(constant));
                }
                self.expect(TokenKind::RBracket);
                self.leave();
                Value::List(values, Span::new(start, self.current.span.start))
            }
            TokenKind::LBrace => {
                if !self.enter() {
                    return Value::Null(span);
                }
                self.advance();
                let mut fields = Vec::new();
                while !self.at_list_end(TokenKind::RBrace) {
                    let name = self.parse_name();
                    self.expect(TokenKind::Colon);
                    let value = self.parse_value(constant);
                    fields.push((name, value));
                }
                self.expect(TokenKind::RBrace);
                self.leave();
                Value::Object(fields, Span::new(start, self.current.span.start))
            }
            kind if kind.is_name() => {
                let name = self.parse_name();
                Value::Enum(name)
            }
            _ => {
                self.error("expected value");
                Value::Null(span)
            }
        }
    }

    /// Parses an operation definition.
    fn parse_operation(&mut self) -> OperationDefinition<'a> {
        let start = self.current.span.start;

        let (operation, name) = if self.at_kind(TokenKind::LBrace) {
            (OperationType::Query, None)
        } else {
            let op = match self.at() {
                TokenKind::Mutation => OperationType::Mutation,
                TokenKind::Subscription => OperationType::Subscription,
                _ => OperationType::Query,
            };
            self.advance();

            let name = if self.at().is_name() {
                Some(self.parse_name())
            } else {
                None
            };

            (op, name)
        };

        let variables = if self.at_kind(TokenKind::LParen) {
            self.advance();
            let vars = self.parse_variable_definitions();
            self.expect(TokenKind::RParen);
            vars
        } else {
            Vec::new()
        };

        let directives = self.parse_directives();
        let selection_set = self.parse_selection_set();

        let end = self.current.span.start;
        OperationDefinition {
            operation,
            name,
            variables,
            directives,
            selection_set,
            span: Span::new(start, end),
        }
    }

    /// Parses variable definitions.
    fn parse_variable_definitions(&mut self) -> Vec<VariableDefinition<'a>> {
        let mut vars = Vec::new();
        while !self.at_list_end(TokenKind::RParen) {
            vars.push(self.parse_variable_definition());
        }
        vars
    }

    /// Parses a variable definition.
    fn parse_variable_definition(&mut self) -> VariableDefinition<'a> {
        let start = self.current.span.start;
        self.expect(TokenKind::Dollar);
        let name = self.parse_name();
        self.expect(TokenKind::Colon);
        let ty = self.parse_type();

        let default_value = if self.at_kind(TokenKind::Eq) {
            self.advance();
            Some(self.parse_value(true))
        } else {
            None
        };

        let directives = self.parse_directives();

        let end = self.current.span.start;
        VariableDefinition {
            name: Name::new(name.value, Span::new(start, name.span.end)),
            ty,
            default_value,
            directives,
            span: Span::new(start, end),
        }
    }

    /// Parses a fragment definition.
    fn parse_fragment_definition(&mut self) -> FragmentDefinition<'a> {
        let start = self.current.span.start;
        self.advance(); // fragment

        if self.at_kind(TokenKind::On) {
            self.error("expected fragment name");
        }
        let name = self.parse_name();
        self.expect(TokenKind::On);
        let type_condition = self.parse_name();
        let directives = self.parse_directives();
        let selection_set = self.parse_selection_set();

        let end = self.current.span.start;
        FragmentDefinition {
            name,
            type_condition,
            directives,
            selection_set,
            span: Span::new(start, end),
        }
    }

    /// Parses a selection set.
    fn parse_selection_set(&mut self) -> SelectionSet<'a> {
        let start = self.current.span.start;
        if !self.enter() {
            return SelectionSet {
                selections: Vec::new(),
                span: Span::empty(start),
            };
        }
        self.expect(TokenKind::LBrace);

        let mut selections = Vec::new();
        if self.at_kind(TokenKind::RBrace) {
            self.error("expected selection");
        }
        while !self.at_list_end(TokenKind::RBrace) {
            selections.push(self.parse_selection());
        }
        self.expect(TokenKind::RBrace);
        self.leave();

        let end = self.current.span.start;
        SelectionSet {
            selections,
            span: Span::new(start, end),
        }
    }

    /// Parses a selection.
    fn parse_selection(&mut self) -> Selection<'a> {
        if !self.at_kind(TokenKind::Spread) {
            return Selection::Field(self.parse_field_selection());
        }

        let start = self.current.span.start;
        self.advance(); // ...

        if self.at_kind(TokenKind::On) {
            self.advance();
            let type_condition = Some(self.parse_name());
            let directives = self.parse_directives();
            let selection_set = self.parse_selection_set();
            Selection::InlineFragment(InlineFragment {
                type_condition,
                directives,
                selection_set,
                span: Span::new(start, self.current.span.start),
            })
        } else if self.at_kind(TokenKind::LBrace) || self.at_kind(TokenKind::At) {
            let directives = self.parse_directives();
            let selection_set = self.parse_selection_set();
            Selection::InlineFragment(InlineFragment {
                type_condition: None,
                directives,
                selection_set,
                span: Span::new(start, self.current.span.start),
            })
        } else {
            let name = self.parse_name();
            let directives = self.parse_directives();
            Selection::FragmentSpread(FragmentSpread {
                name,
                directives,
                span: Span::new(start, self.current.span.start),
            })
        }
    }

    /// Parses a field selection.
    fn parse_field_selection(&mut self) -> FieldSelection<'a> {
        let start = self.current.span.start;

        let first_name = self.parse_name();
        let (alias, name) = if self.at_kind(TokenKind::Colon) {
            self.advance();
            (Some(first_name), self.parse_name())
        } else {
            (None, first_name)
        };

        let arguments = self.parse_arguments();
        let directives = self.parse_directives();

        let selection_set = if self.at_kind(TokenKind::LBrace) {
            Some(self.parse_selection_set())
        } else {
            None
        };

        let end = self.current.span.start;
        FieldSelection {
            alias,
            name,
            arguments,
            directives,
            selection_set,
            span: Span::new(start, end),
        }
    }
}
