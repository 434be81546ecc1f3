//! The HoloScript+ parser.

use std::collections::{BTreeMap, BTreeSet};

use holo_common::{Location, Position, Span};
use holo_diagnostic::suggest::find_similar;
use holo_diagnostic::vocabulary::{COMPOSITION_KEYWORDS, ELEMENT_KEYWORDS, is_known_geometry, is_lifecycle_hook};
use holo_diagnostic::{Diagnostic, DiagnosticCollector, DiagnosticEngine, ErrorCode, Label};
use holo_lexer::{Token, TokenKind};
use holo_syntax::*;

use crate::options::ParserOptions;
use crate::recovery::{
    DelimiterKind, LINE_ENDS, is_closer, is_construct_keyword, is_in_set, is_sync_token, starts_construct,
};
use crate::result::{Feature, ParseResult};

/// Deepest nesting of elements and values the parser descends into.
pub const MAX_NESTING_DEPTH: usize = 128;

/// A directive together with where it was written.
pub(crate) struct DirectiveAt {
    pub directive: Directive,
    pub span: Span,
    pub position: Position,
}

/// The HoloScript+ parser.
///
/// Layout tokens are significant only outside braces: inside `{ ... }` the
/// parser steps over `Newline`/`Indent`/`Dedent` as if they were whitespace.
pub struct Parser<'src> {
    pub(crate) source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    /// Index of the last consumed non-layout token
    last: Option<usize>,
    brace_depth: usize,
    nesting: usize,
    /// Set when a value could not be parsed and the cursor is not at a sane
    /// resumption point.
    pub(crate) value_failed: bool,
    pub(crate) options: ParserOptions,
    pub(crate) engine: DiagnosticEngine,
    diagnostics: DiagnosticCollector,
    pub(crate) expressions: BTreeMap<String, String>,
    pub(crate) imports: Vec<ImportDecl>,
    pub(crate) features: BTreeSet<Feature>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, mut tokens: Vec<Token>, options: ParserOptions) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let end = Span::from_usize(source.len(), source.len());
            tokens.push(Token::new(TokenKind::Eof, "", end, Position::START));
        }
        Self {
            source,
            tokens,
            pos: 0,
            last: None,
            brace_depth: 0,
            nesting: 0,
            value_failed: false,
            options,
            engine: DiagnosticEngine::new(options.strict),
            diagnostics: DiagnosticCollector::with_limits(options.limits),
            expressions: BTreeMap::new(),
            imports: Vec::new(),
            features: BTreeSet::new(),
        }
    }

    /// Parse a complete document.
    pub fn parse(mut self) -> ParseResult {
        let start = self.start_position();
        let mut roots = Vec::new();
        let mut loose = Node::fragment(Vec::new(), Location::default());

        loop {
            self.skip_layout();
            let mut leading = Vec::new();
            while self.check(TokenKind::At) {
                if let Some(directive) = self.parse_directive(true) {
                    leading.push(directive);
                }
                self.skip_layout();
            }

            match self.current_kind() {
                TokenKind::Eof => {
                    for directive in leading {
                        self.attach(&mut loose, directive);
                    }
                    break;
                }
                TokenKind::Identifier => {
                    let mut node = self.parse_element();
                    self.attach_leading(&mut node, leading);
                    roots.push(node);
                }
                _ => {
                    for directive in leading {
                        self.attach(&mut loose, directive);
                    }
                    self.unexpected("at top level");
                    if self.check(TokenKind::RBrace) {
                        self.advance();
                    } else {
                        self.synchronize();
                    }
                }
            }
        }

        let loc = match (roots.first(), roots.last()) {
            (Some(first), Some(last)) => first.loc.merge(last.loc),
            _ => self.location_from(start),
        };
        let ast = if roots.len() == 1 && loose.directives.is_empty() && loose.traits.is_empty() {
            roots.remove(0)
        } else {
            loose.children = roots;
            loose.loc = loc;
            loose
        };

        let success = !self.diagnostics.has_errors();
        let (diagnostics, warnings) = self.diagnostics.into_parts();
        ParseResult {
            success,
            ast,
            diagnostics,
            warnings,
            compiled_expressions: self.expressions,
            imports: self.imports,
            features: self.features,
        }
    }

    // ========== Elements ==========

    /// Parse an element introduced by the identifier at the cursor.
    pub(crate) fn parse_element(&mut self) -> Node {
        let keyword = self.current().text.clone();
        let declaration_follows = self.peek_kind(1) == TokenKind::Identifier;
        match keyword.as_str() {
            "export" if declaration_follows => self.parse_export(),
            "function" if declaration_follows => self.parse_function(),
            "logic" => self.parse_logic(),
            "state_machine" => self.parse_state_machine(),
            "template" => {
                self.features.insert(Feature::Templates);
                self.parse_generic(NodeKind::Template { params: Vec::new() })
            }
            "environment" => {
                self.features.insert(Feature::Environment);
                self.parse_generic(NodeKind::Environment)
            }
            k if COMPOSITION_KEYWORDS.contains(&k) => {
                self.parse_generic(NodeKind::Composition { keyword })
            }
            _ => {
                self.check_element_keyword();
                self.parse_generic(NodeKind::Element {
                    element_type: keyword,
                    template: None,
                })
            }
        }
    }

    /// `export <declaration>`: the declaration, marked as exported.
    fn parse_export(&mut self) -> Node {
        let start = self.start_position();
        self.advance(); // export
        if !self.enter() {
            self.skip_element_rest();
            return Node::fragment(Vec::new(), self.location_from(start));
        }
        let mut node = self.parse_element();
        self.leave();
        node.exported = true;
        node.loc = self.location_from(start);
        node
    }

    /// `function name(params) { body }` at element level.
    fn parse_function(&mut self) -> Node {
        let start = self.start_position();
        self.advance(); // function
        self.features.insert(Feature::Logic);

        let mut node = Node::new(
            NodeKind::Function {
                params: Vec::new(),
                body: String::new(),
            },
            Location::default(),
        );
        node.name = self.expect_name("function name");
        if node.name.is_none() {
            self.synchronize();
            node.loc = self.location_from(start);
            return node;
        }

        let params = self.parse_param_list();
        let body = self.capture_block().unwrap_or_default();
        node.kind = NodeKind::Function { params, body };
        node.loc = self.location_from(start);
        node
    }

    /// Warn when a custom element name is one or two edits away from a
    /// built-in keyword.
    fn check_element_keyword(&mut self) {
        let token = self.current();
        if is_construct_keyword(&token.text) {
            return;
        }
        let max_distance = if token.text.chars().count() <= 4 { 1 } else { 2 };
        if find_similar(&token.text, ELEMENT_KEYWORDS, max_distance, 1).is_empty() {
            return;
        }
        let diagnostic = self
            .engine
            .unknown_keyword(&token.text, token.span, token.position());
        self.report(diagnostic);
    }

    fn parse_generic(&mut self, kind: NodeKind) -> Node {
        let start = self.start_position();
        let head_line = self.current().line;
        self.advance(); // keyword

        let mut node = Node::new(kind, Location::default());
        if !self.enter() {
            self.skip_element_rest();
            node.loc = self.location_from(start);
            return node;
        }

        self.parse_element_name(&mut node, head_line);

        if self.check(TokenKind::LParen)
            && let NodeKind::Template { params } = &mut node.kind
        {
            *params = self.parse_param_list();
        }

        if self.current().is_ident("using") && self.current().line == head_line {
            self.advance();
            self.parse_using(&mut node);
        }

        self.parse_element_head(&mut node, head_line);

        if self.check(TokenKind::LBrace) {
            self.parse_braced(|p| p.parse_body_item(&mut node));
        } else if self.brace_depth == 0
            && self.check(TokenKind::Newline)
            && self.peek_kind(1) == TokenKind::Indent
        {
            self.advance();
            self.advance();
            self.features.insert(Feature::Indentation);
            self.parse_indented_body(&mut node);
        }

        self.leave();
        node.loc = self.location_from(start);
        node
    }

    /// Optional quoted or bare name, then an optional `#id`.
    fn parse_element_name(&mut self, node: &mut Node, head_line: u32) {
        let token = self.current().clone();
        if token.line != head_line {
            return;
        }
        match token.kind {
            TokenKind::String => {
                node.name = Some(token.text);
                self.advance();
            }
            TokenKind::UnterminatedString => {
                self.report_unterminated(&token);
                node.name = Some(token.text);
                self.advance();
            }
            TokenKind::Identifier
                if !token.is_ident("using")
                    && !matches!(self.peek_kind(1), TokenKind::Colon | TokenKind::Equals) =>
            {
                node.name = Some(token.text);
                self.advance();
            }
            _ => {}
        }

        if self.check(TokenKind::Hash) && self.current().line == head_line {
            self.advance();
            if self.check(TokenKind::Identifier) {
                node.id = Some(self.current().text.clone());
                self.advance();
            } else {
                self.unexpected("after '#'");
            }
        }
    }

    fn parse_using(&mut self, node: &mut Node) {
        let token = self.current().clone();
        let name = match token.kind {
            TokenKind::String | TokenKind::Identifier => token.text.clone(),
            TokenKind::UnterminatedString => {
                self.report_unterminated(&token);
                token.text.clone()
            }
            _ => {
                self.unexpected("after 'using'");
                return;
            }
        };
        self.advance();

        match &mut node.kind {
            NodeKind::Element { template, .. } => *template = Some(name),
            _ => self.report(Diagnostic::error(
                ErrorCode::UnexpectedToken,
                token.span,
                token.position(),
                format!("'using' is only valid on elements, not on {}", node.kind_name()),
            )),
        }
    }

    /// Directives and `key: value` pairs on the element's own line.
    fn parse_element_head(&mut self, node: &mut Node, head_line: u32) {
        while self.current().line == head_line {
            match self.current_kind() {
                TokenKind::LBrace
                | TokenKind::RBrace
                | TokenKind::Eof
                | TokenKind::Newline
                | TokenKind::Indent
                | TokenKind::Dedent
                | TokenKind::Comma
                | TokenKind::Semicolon => break,
                TokenKind::At => {
                    if let Some(directive) = self.parse_directive(false) {
                        self.attach(node, directive);
                    }
                }
                TokenKind::Identifier
                    if matches!(self.peek_kind(1), TokenKind::Colon | TokenKind::Equals) =>
                {
                    self.parse_property(node);
                }
                // A sibling element on the same line
                TokenKind::Identifier => break,
                _ => {
                    self.unexpected("in element header");
                    self.skip_head(head_line);
                    break;
                }
            }
        }
    }

    fn skip_head(&mut self, head_line: u32) {
        while self.current().line == head_line
            && !matches!(
                self.current_kind(),
                TokenKind::LBrace | TokenKind::RBrace | TokenKind::Eof
            )
            && !self.current_kind().is_layout()
        {
            self.skip_balanced();
        }
    }

    /// Skip the rest of an element that is nested too deeply.
    fn skip_element_rest(&mut self) {
        while !matches!(
            self.current_kind(),
            TokenKind::LBrace | TokenKind::RBrace | TokenKind::Eof
        ) && !(self.brace_depth == 0 && self.current_kind().is_layout())
        {
            self.skip_balanced();
        }
        if self.check(TokenKind::LBrace) {
            self.skip_balanced();
        }
    }

    /// One item of an element body: a directive, a spread, a property or a
    /// nested element.
    pub(crate) fn parse_body_item(&mut self, node: &mut Node) {
        match self.current_kind() {
            TokenKind::At => {
                if let Some(directive) = self.parse_directive(true) {
                    self.attach(node, directive);
                }
            }
            TokenKind::Spread => {
                self.advance();
                self.features.insert(Feature::Spread);
                self.value_failed = false;
                let value = self.parse_value();
                if self.value_failed {
                    self.synchronize();
                }
                node.spreads.push(value);
            }
            TokenKind::Identifier => self.parse_identifier_item(node),
            TokenKind::String if matches!(self.peek_kind(1), TokenKind::Colon | TokenKind::Equals) => {
                self.parse_property(node);
            }
            _ => {
                self.unexpected("in element body");
                self.synchronize();
            }
        }
    }

    /// Decide whether an identifier in a body starts a property or an element.
    fn parse_identifier_item(&mut self, node: &mut Node) {
        let token = self.current();
        let next = self.peek(1);

        let is_property = match next.kind {
            TokenKind::Colon | TokenKind::Equals => true,
            _ if is_construct_keyword(&token.text) => false,
            // `Custom "Name" {` is an element, not a property missing its colon
            TokenKind::String if self.peek_kind(2) == TokenKind::LBrace => false,
            kind => kind.starts_value() && next.line == token.line,
        };

        if is_property {
            self.parse_property(node);
        } else {
            let child = self.parse_element();
            node.children.push(child);
        }
    }

    /// `key: value`, `key = value`, or `key value` (reported as a missing colon).
    pub(crate) fn parse_property(&mut self, node: &mut Node) {
        let key_token = self.current().clone();
        self.advance();

        if !self.eat(TokenKind::Colon) && !self.eat(TokenKind::Equals) {
            let diagnostic =
                self.engine
                    .missing_colon(&key_token.text, key_token.span, key_token.position());
            self.report(diagnostic);
        }

        let value_token = self.current().clone();
        self.value_failed = false;
        let value = self.parse_value();
        if self.value_failed {
            self.synchronize();
        }

        self.check_property(&key_token, &value, &value_token);
        node.properties.insert(key_token.text, value);
    }

    fn check_property(&mut self, key: &Token, value: &Value, value_token: &Token) {
        if let Some(diagnostic) = self
            .engine
            .misspelled_property(&key.text, key.span, key.position())
        {
            self.report(diagnostic);
        }

        if matches!(key.text.as_str(), "geometry" | "shape")
            && let Value::String(geometry) = value
            && !is_known_geometry(geometry)
        {
            let diagnostic =
                self.engine
                    .unknown_geometry(geometry, value_token.span, value_token.position());
            self.report(diagnostic);
        }
    }

    /// Body lines after `NEWLINE INDENT`, up to the matching `DEDENT`.
    fn parse_indented_body(&mut self, node: &mut Node) {
        // Deeper continuation lines that do not open a body of their own
        let mut extra = 0usize;
        loop {
            match self.current_kind() {
                TokenKind::Newline => self.advance(),
                TokenKind::Indent => {
                    extra += 1;
                    self.advance();
                }
                TokenKind::Dedent => {
                    self.advance();
                    if extra == 0 {
                        return;
                    }
                    extra -= 1;
                }
                TokenKind::Eof => return,
                TokenKind::RBrace => {
                    self.unexpected("in indented block");
                    self.advance();
                }
                _ => {
                    let before = self.pos;
                    self.parse_body_item(node);
                    if self.pos == before {
                        self.advance();
                    }
                }
            }
        }
    }

    /// Attach a directive: traits (and unknown directives accepted as
    /// traits) go into the trait map, everything else into `directives`.
    pub(crate) fn attach(&mut self, node: &mut Node, at: DirectiveAt) {
        match at.directive {
            Directive::Trait { name, config } | Directive::Generic { name, config } => {
                if node.traits.insert(name.clone(), config).is_some() {
                    self.report(Diagnostic::warning(
                        ErrorCode::DuplicateName,
                        at.span,
                        at.position,
                        format!("trait '@{}' is declared more than once; the last declaration wins", name),
                    ));
                }
            }
            directive => node.directives.push(directive),
        }
    }

    /// Attach directives written before an element. They precede the
    /// element's own directives; the element's own traits win.
    fn attach_leading(&mut self, node: &mut Node, leading: Vec<DirectiveAt>) {
        let mut directives = Vec::new();
        for at in leading {
            match at.directive {
                Directive::Trait { name, config } | Directive::Generic { name, config } => {
                    node.traits.entry(name).or_insert(config);
                }
                directive => directives.push(directive),
            }
        }
        directives.append(&mut node.directives);
        node.directives = directives;
    }

    // ========== Logic Blocks ==========

    fn parse_logic(&mut self) -> Node {
        let start = self.start_position();
        let head_line = self.current().line;
        self.advance(); // logic
        self.features.insert(Feature::Logic);

        let mut node = Node::new(NodeKind::Logic(LogicBlock::default()), Location::default());
        if !self.enter() {
            self.skip_element_rest();
            node.loc = self.location_from(start);
            return node;
        }
        self.parse_element_name(&mut node, head_line);

        let mut block = LogicBlock::default();
        if self.check(TokenKind::LBrace) {
            self.parse_braced(|p| match p.current_kind() {
                TokenKind::Identifier => p.parse_logic_item(&mut block),
                TokenKind::At => {
                    if let Some(directive) = p.parse_directive(true) {
                        p.attach(&mut node, directive);
                    }
                }
                _ => {
                    p.unexpected("in logic block");
                    p.synchronize();
                }
            });
        } else {
            self.unexpected("after 'logic'");
            self.synchronize();
        }

        self.leave();
        node.kind = NodeKind::Logic(block);
        node.loc = self.location_from(start);
        node
    }

    fn parse_logic_item(&mut self, block: &mut LogicBlock) {
        let word = self.current().text.clone();
        let next = self.peek_kind(1);

        match word.as_str() {
            "function" | "fn" | "func" => {
                self.advance();
                let Some(name) = self.expect_name("function name") else {
                    self.synchronize();
                    return;
                };
                let params = self.parse_param_list();
                let body = self.capture_block().unwrap_or_default();
                block.functions.push(LogicFunction { name, params, body });
            }
            "let" | "var" | "const" => {
                self.advance();
                let Some(name) = self.expect_name("variable name") else {
                    self.synchronize();
                    return;
                };
                if !self.eat(TokenKind::Equals) && !self.eat(TokenKind::Colon) {
                    self.unexpected("after variable name");
                }
                let value = self.parse_logic_value();
                block.variables.insert(name, value);
            }
            _ if matches!(next, TokenKind::Colon | TokenKind::Equals) => {
                self.advance();
                self.advance();
                let value = self.parse_logic_value();
                block.variables.insert(word, value);
            }
            _ if matches!(next, TokenKind::LParen | TokenKind::LBrace) => {
                self.advance();
                let params = self.parse_param_list();
                let body = self.capture_block().unwrap_or_default();
                if word.starts_with("on") || is_lifecycle_hook(&word) {
                    block.handlers.push(EventHandler {
                        event: word,
                        params,
                        body,
                    });
                } else {
                    block.functions.push(LogicFunction {
                        name: word,
                        params,
                        body,
                    });
                }
            }
            _ => {
                self.unexpected("in logic block");
                self.synchronize();
            }
        }
    }

    fn parse_logic_value(&mut self) -> Value {
        self.value_failed = false;
        let value = self.parse_value();
        if self.value_failed {
            self.synchronize();
        }
        value
    }

    /// `(a, b, ...rest)`; returns no parameters if there is no `(`.
    pub(crate) fn parse_param_list(&mut self) -> Vec<String> {
        let mut params = Vec::new();
        if !self.eat(TokenKind::LParen) {
            return params;
        }
        loop {
            match self.current_kind() {
                TokenKind::RParen => {
                    self.advance();
                    break;
                }
                TokenKind::Comma => self.advance(),
                TokenKind::Spread => {
                    self.advance();
                    if self.check(TokenKind::Identifier) {
                        params.push(format!("...{}", self.current().text));
                        self.advance();
                    }
                }
                TokenKind::Identifier => {
                    params.push(self.current().text.clone());
                    self.advance();
                }
                _ => {
                    self.unexpected("in parameter list");
                    self.skip_to_closing(DelimiterKind::Paren);
                    break;
                }
            }
        }
        params
    }

    // ========== State Machines ==========

    fn parse_state_machine(&mut self) -> Node {
        let start = self.start_position();
        let keyword = self.current().clone();
        self.advance(); // state_machine
        self.features.insert(Feature::StateMachines);

        let mut node = Node::new(
            NodeKind::StateMachine(StateMachine::default()),
            Location::default(),
        );
        if !self.enter() {
            self.skip_element_rest();
            node.loc = self.location_from(start);
            return node;
        }
        self.parse_element_name(&mut node, keyword.line);

        let mut machine = StateMachine::default();
        if self.check(TokenKind::LBrace) {
            self.parse_braced(|p| p.parse_state_machine_item(&mut node, &mut machine));
        } else {
            self.unexpected("after state machine name");
            self.synchronize();
        }

        if machine.initial.is_none() {
            self.report(Diagnostic::error(
                ErrorCode::MissingRequired,
                keyword.span,
                keyword.position(),
                format!(
                    "state machine '{}' is missing the required 'initial' state",
                    node.name.as_deref().unwrap_or("<anonymous>")
                ),
            ));
        }

        self.leave();
        node.kind = NodeKind::StateMachine(machine);
        node.loc = self.location_from(start);
        node
    }

    fn parse_state_machine_item(&mut self, node: &mut Node, machine: &mut StateMachine) {
        let token = self.current().clone();
        let next = self.peek_kind(1);

        match token.kind {
            TokenKind::At => {
                if let Some(directive) = self.parse_directive(true) {
                    self.attach(node, directive);
                }
            }
            TokenKind::Identifier if token.text == "initial" && next != TokenKind::Arrow => {
                self.advance();
                if !self.eat(TokenKind::Colon) && !self.eat(TokenKind::Equals) {
                    let diagnostic = self
                        .engine
                        .missing_colon("initial", token.span, token.position());
                    self.report(diagnostic);
                }
                let Some(initial) = self.expect_name("initial state name") else {
                    self.synchronize();
                    return;
                };
                if machine.initial.is_some() {
                    self.report(Diagnostic::error(
                        ErrorCode::DuplicateName,
                        token.span,
                        token.position(),
                        "state machine declares 'initial' more than once",
                    ));
                } else {
                    machine.initial = Some(initial);
                }
            }
            TokenKind::Identifier if token.text == "state" && next != TokenKind::Arrow => {
                self.advance();
                if let Some(state) = self.parse_state() {
                    machine.states.push(state);
                }
            }
            TokenKind::Identifier if token.text == "transitions" && next == TokenKind::LBrace => {
                self.advance();
                self.parse_braced(|p| match p.current_kind() {
                    TokenKind::Identifier | TokenKind::String => {
                        if let Some(transition) = p.parse_transition() {
                            machine.transitions.push(transition);
                        }
                    }
                    _ => {
                        p.unexpected("in transitions block");
                        p.synchronize();
                    }
                });
            }
            TokenKind::Identifier | TokenKind::String if next == TokenKind::Arrow => {
                if let Some(transition) = self.parse_transition() {
                    machine.transitions.push(transition);
                }
            }
            TokenKind::Identifier if matches!(next, TokenKind::Colon | TokenKind::Equals) => {
                self.parse_property(node);
            }
            _ => {
                self.unexpected("in state machine");
                self.synchronize();
            }
        }
    }

    /// `state name { on_entry { ... } on_exit { ... } key: value }`
    fn parse_state(&mut self) -> Option<State> {
        let name = self.expect_name("state name")?;
        let mut state = State {
            name,
            ..State::default()
        };
        if !self.check(TokenKind::LBrace) {
            return Some(state);
        }

        self.parse_braced(|p| {
            let token = p.current().clone();
            match (token.kind, p.peek_kind(1)) {
                (TokenKind::Identifier, TokenKind::LBrace)
                    if matches!(token.text.as_str(), "on_entry" | "onEntry") =>
                {
                    p.advance();
                    state.on_entry = p.capture_block();
                }
                (TokenKind::Identifier, TokenKind::LBrace)
                    if matches!(token.text.as_str(), "on_exit" | "onExit") =>
                {
                    p.advance();
                    state.on_exit = p.capture_block();
                }
                (TokenKind::Identifier | TokenKind::String, TokenKind::Colon | TokenKind::Equals) => {
                    p.advance();
                    p.advance();
                    let value = p.parse_logic_value();
                    state.properties.insert(token.text, value);
                }
                _ => {
                    p.unexpected("in state");
                    p.synchronize();
                }
            }
        });
        Some(state)
    }

    /// `from -> to : event`
    fn parse_transition(&mut self) -> Option<Transition> {
        let from = self.expect_name("transition source")?;
        if !self.eat(TokenKind::Arrow) {
            self.unexpected("in transition, expected '->'");
            self.synchronize();
            return None;
        }
        let Some(to) = self.expect_name("transition target") else {
            self.synchronize();
            return None;
        };
        let event = if self.eat(TokenKind::Colon) {
            self.expect_name("event name")
        } else {
            None
        };
        Some(Transition { from, to, event })
    }

    // ========== Token Access ==========

    /// Index of the first token at or after `i` the parser can see.
    fn visible(&self, mut i: usize) -> usize {
        let last = self.tokens.len() - 1;
        if self.brace_depth > 0 {
            while i < last && self.tokens[i].kind.is_layout() {
                i += 1;
            }
        }
        i.min(last)
    }

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.visible(self.pos)]
    }

    pub(crate) fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    /// The `n`th visible token after the current one.
    pub(crate) fn peek(&self, n: usize) -> &Token {
        let mut i = self.visible(self.pos);
        for _ in 0..n {
            i = self.visible(i + 1);
        }
        &self.tokens[i]
    }

    pub(crate) fn peek_kind(&self, n: usize) -> TokenKind {
        self.peek(n).kind
    }

    /// Raw token lookahead, without layout skipping.
    pub(crate) fn raw_kind(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.visible(self.pos) + offset)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    pub(crate) fn at_end(&self) -> bool {
        self.current_kind() == TokenKind::Eof
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    pub(crate) fn advance(&mut self) {
        let i = self.visible(self.pos);
        match self.tokens[i].kind {
            TokenKind::Eof => {
                self.pos = i;
                return;
            }
            TokenKind::LBrace => self.brace_depth += 1,
            TokenKind::RBrace => self.brace_depth = self.brace_depth.saturating_sub(1),
            _ => {}
        }
        if !self.tokens[i].kind.is_layout() {
            self.last = Some(i);
        }
        self.pos = i + 1;
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn previous(&self) -> Option<&Token> {
        self.last.map(|i| &self.tokens[i])
    }

    pub(crate) fn previous_span(&self) -> Span {
        self.previous().map_or(Span::DUMMY, |t| t.span)
    }

    pub(crate) fn previous_line(&self) -> u32 {
        self.previous().map_or(0, |t| t.line)
    }

    fn skip_layout(&mut self) {
        while is_in_set(self.current_kind(), LINE_ENDS) {
            self.advance();
        }
    }

    /// Skip plain newlines only; used to look for a continuation such as
    /// `@else` on the next line.
    pub(crate) fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    pub(crate) fn start_position(&self) -> Position {
        self.current().position()
    }

    /// Position just past the last consumed token.
    pub(crate) fn end_position(&self) -> Position {
        match self.previous() {
            Some(token) => {
                let width = self.source.get(token.span.range()).map_or(0, |s| s.chars().count());
                Position::new(token.line, token.column + width as u32)
            }
            None => Position::START,
        }
    }

    pub(crate) fn location_from(&self, start: Position) -> Location {
        Location::new(start, self.end_position().max(start))
    }

    /// Source text between two byte offsets.
    pub(crate) fn slice(&self, start: usize, end: usize) -> &'src str {
        self.source.get(start..end.max(start)).unwrap_or("")
    }

    /// Read a name given as an identifier or a string.
    pub(crate) fn expect_name(&mut self, what: &str) -> Option<String> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Identifier | TokenKind::String => {
                self.advance();
                Some(token.text)
            }
            TokenKind::UnterminatedString => {
                self.report_unterminated(&token);
                self.advance();
                Some(token.text)
            }
            _ => {
                self.unexpected(&format!("where a {} was expected", what));
                None
            }
        }
    }

    // ========== Nesting ==========

    /// Enter one level of nesting. Reports and returns `false` at the limit.
    pub(crate) fn enter(&mut self) -> bool {
        if self.nesting >= MAX_NESTING_DEPTH {
            self.error(
                ErrorCode::NestingTooDeep,
                format!("nesting too deep: more than {} levels", MAX_NESTING_DEPTH),
            );
            return false;
        }
        self.nesting += 1;
        true
    }

    pub(crate) fn leave(&mut self) {
        self.nesting = self.nesting.saturating_sub(1);
    }

    // ========== Blocks ==========

    /// Parse `{ item* }`, calling `item` for everything but separators.
    /// Returns `false` if the block was missing or never closed.
    pub(crate) fn parse_braced(&mut self, mut item: impl FnMut(&mut Self)) -> bool {
        let open = self.current().clone();
        if !self.eat(TokenKind::LBrace) {
            self.unexpected("where '{' was expected");
            return false;
        }

        loop {
            match self.current_kind() {
                TokenKind::RBrace => {
                    self.advance();
                    return true;
                }
                TokenKind::Eof => {
                    self.report_unclosed(&open);
                    return false;
                }
                TokenKind::Comma | TokenKind::Semicolon => self.advance(),
                _ => {
                    let before = self.pos;
                    item(self);
                    if self.pos == before && !matches!(self.current_kind(), TokenKind::RBrace | TokenKind::Eof) {
                        self.advance();
                    }
                }
            }
        }
    }

    /// Consume `{ ... }` and return the source between the braces.
    pub(crate) fn capture_block(&mut self) -> Option<String> {
        let open = self.current().clone();
        if open.kind != TokenKind::LBrace {
            self.unexpected("where '{' was expected");
            return None;
        }
        let closed = self.skip_balanced();
        let start = open.span.end.0 as usize;
        let body = if closed {
            self.slice(start, self.previous_span().start.0 as usize)
        } else {
            self.report_unclosed(&open);
            self.slice(start, self.source.len())
        };
        Some(body.trim().to_string())
    }

    // ========== Error Recovery ==========

    /// Skip one token, or a whole bracketed group if the cursor is on an
    /// opening delimiter. Returns `false` if the group was never closed.
    pub(crate) fn skip_balanced(&mut self) -> bool {
        let Some(kind) = DelimiterKind::from_opening(self.current_kind()) else {
            self.advance();
            return true;
        };
        self.advance();
        self.skip_to_closing(kind)
    }

    /// Skip to just past the delimiter closing an already-opened group.
    pub(crate) fn skip_to_closing(&mut self, kind: DelimiterKind) -> bool {
        let mut depth = 1usize;
        while !self.at_end() {
            let current = self.current_kind();
            if current == kind.opening_token() {
                depth += 1;
            } else if current == kind.closing_token() {
                depth -= 1;
                if depth == 0 {
                    self.advance();
                    return true;
                }
            }
            self.advance();
        }
        false
    }

    /// Skip forward to a point where parsing can resume: a `}`, an `@`, a
    /// keyword that starts an element, or (outside braces) a line break.
    /// Advances at least once unless already at `}` or the end.
    pub(crate) fn synchronize(&mut self) {
        if matches!(self.current_kind(), TokenKind::RBrace | TokenKind::Eof) {
            return;
        }
        self.skip_balanced();

        while !self.at_end() {
            let token = self.current();
            if is_sync_token(token.kind) || starts_construct(token) {
                return;
            }
            if self.brace_depth == 0 && is_in_set(token.kind, LINE_ENDS) {
                return;
            }
            self.skip_balanced();
        }
    }

    /// Recover inside a delimited list: skip to the next `,` or any closer.
    pub(crate) fn recover_in_list(&mut self) {
        while !self.check(TokenKind::Comma) && !is_closer(self.current_kind()) {
            self.skip_balanced();
        }
    }

    // ========== Diagnostics ==========

    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn error(&mut self, code: ErrorCode, message: impl Into<String>) {
        let token = self.current();
        let span = token.span;
        let mut diagnostic = Diagnostic::error(code, span, token.position(), message)
            .with_label(Label::new(span, "here"));
        if let Some(help) = code.suggestion() {
            diagnostic = diagnostic.with_help(help);
        }
        self.report(diagnostic);
    }

    /// Report the current token as unexpected in `context`.
    pub(crate) fn unexpected(&mut self, context: &str) {
        let token = self.current();
        let found = match token.kind {
            TokenKind::Identifier => format!("'{}'", token.text),
            kind => kind.describe().to_string(),
        };
        self.error(ErrorCode::UnexpectedToken, format!("unexpected {} {}", found, context));
    }

    pub(crate) fn report_unterminated(&mut self, token: &Token) {
        let quote = self
            .source
            .get(token.span.range())
            .and_then(|s| s.chars().next())
            .unwrap_or('"');
        let diagnostic = self.engine.missing_quote(token.span, quote, token.position());
        self.report(diagnostic);
    }

    fn report_unclosed(&mut self, open: &Token) {
        let end = self.previous_span().end;
        let diagnostic = self
            .engine
            .missing_brace(Span::new(end, end), self.end_position())
            .with_label(Label::new(open.span, "block opened here"));
        self.report(diagnostic);
    }
}
