//! Directive parsing: traits, control flow, imports, lifecycle hooks and the
//! configuration-style directives.

use holo_common::Location;
use holo_diagnostic::suggest::suggest;
use holo_diagnostic::vocabulary::{KNOWN_TRAITS, is_known_trait, is_lifecycle_hook};
use holo_diagnostic::{Diagnostic, ErrorCode};
use holo_lexer::TokenKind;
use holo_syntax::{Directive, ImportDecl, ImportName, Node, ObjectEntry, TraitConfig, Value};

use crate::parser::{DirectiveAt, Parser};
use crate::result::Feature;

impl Parser<'_> {
    /// Parse `@name ...` at the cursor.
    ///
    /// `allow_body` is false in element headers, where a following `{` opens
    /// the element body rather than a directive body. Returns `None` when the
    /// directive was rejected (already reported).
    pub(crate) fn parse_directive(&mut self, allow_body: bool) -> Option<DirectiveAt> {
        let at = self.current().clone();
        self.advance(); // @

        let name_token = self.current().clone();
        if name_token.kind != TokenKind::Identifier {
            self.unexpected("after '@', expected a directive name");
            return None;
        }
        self.advance();

        let name = name_token.text.clone();
        let span = at.span.merge(name_token.span);
        let position = at.position();

        let directive = match name.as_str() {
            "for" => self.parse_for(false),
            "forEach" => self.parse_for(true),
            "while" => {
                self.features.insert(Feature::ControlFlow);
                let condition = self.parse_condition();
                let body = self.parse_control_body();
                Directive::While { condition, body }
            }
            "if" => self.parse_if(),
            "else" => {
                self.report(Diagnostic::error(
                    ErrorCode::UnexpectedToken,
                    span,
                    position,
                    "'@else' without a preceding '@if'",
                ));
                if self.check(TokenKind::LBrace) {
                    self.skip_balanced();
                }
                return None;
            }
            "import" if self.options.enable_typescript_imports => self.parse_import()?,
            "state" => Directive::State {
                properties: self.parse_directive_config(true).config,
            },
            "bindings" => Directive::Bindings {
                bindings: self.parse_directive_config(true).config,
            },
            "manifest" => Directive::Manifest {
                config: self.parse_directive_config(allow_body),
            },
            "asset" => {
                let config = self.parse_directive_config(allow_body);
                Directive::Asset {
                    name: config.subject().map(str::to_string),
                    config,
                }
            }
            "semantic" => {
                let config = self.parse_directive_config(allow_body);
                Directive::Semantic {
                    label: config.subject().map(str::to_string),
                    config,
                }
            }
            "world_metadata" => Directive::WorldMetadata {
                config: self.parse_directive_config(allow_body),
            },
            "world_config" => Directive::WorldConfig {
                config: self.parse_directive_config(allow_body),
            },
            "zones" => Directive::Zones {
                config: self.parse_directive_config(allow_body),
            },
            "spawn_points" => Directive::SpawnPoints {
                config: self.parse_directive_config(allow_body),
            },
            "skybox" => Directive::Skybox {
                config: self.parse_directive_config(allow_body),
            },
            "ambient_light" => Directive::AmbientLight {
                config: self.parse_directive_config(allow_body),
            },
            "directional_light" => Directive::DirectionalLight {
                config: self.parse_directive_config(allow_body),
            },
            "fog" => Directive::Fog {
                config: self.parse_directive_config(allow_body),
            },
            "lighting" => Directive::Lighting {
                config: self.parse_directive_config(allow_body),
            },
            "external_api" => {
                let config = self.parse_directive_config(allow_body);
                Directive::ExternalApi {
                    url: config.subject().map(str::to_string),
                    config,
                }
            }
            "generate" => {
                let config = self.parse_directive_config(allow_body);
                Directive::Generate {
                    prompt: config.subject().map(str::to_string),
                    config,
                }
            }
            "npc" => {
                let config = self.parse_directive_config(allow_body);
                Directive::Npc {
                    name: config.subject().map(str::to_string),
                    config,
                }
            }
            "dialog" => {
                let config = self.parse_directive_config(allow_body);
                Directive::Dialog {
                    name: config.subject().map(str::to_string),
                    config,
                }
            }
            "platform_event" => {
                let config = self.parse_directive_config(allow_body);
                Directive::PlatformEvent {
                    event: config.subject().map(str::to_string),
                    config,
                }
            }
            hook if is_lifecycle_hook(hook) || hook.starts_with("on_") => {
                let params = self.parse_param_list();
                let body = if self.check(TokenKind::LBrace) {
                    self.capture_block().unwrap_or_default()
                } else {
                    String::new()
                };
                Directive::Lifecycle {
                    hook: name,
                    params,
                    body,
                }
            }
            _ => {
                let config = self.parse_directive_config(allow_body);
                if self.options.enable_vr_traits && is_known_trait(&name) {
                    self.features.insert(Feature::Traits);
                    Directive::Trait { name, config }
                } else {
                    self.report_unknown_directive(&name, &name_token);
                    if self.options.strict {
                        return None;
                    }
                    Directive::Generic { name, config }
                }
            }
        };

        Some(DirectiveAt {
            directive,
            span,
            position,
        })
    }

    fn report_unknown_directive(&mut self, name: &str, token: &holo_lexer::Token) {
        let looks_like_trait = is_known_trait(name) || !suggest(name, KNOWN_TRAITS).is_empty();
        let mut diagnostic = if looks_like_trait {
            self.engine.unknown_trait(name, token.span, token.position())
        } else {
            self.engine.unknown_directive(name, token.span, token.position())
        };
        if is_known_trait(name) {
            diagnostic = diagnostic.with_note("VR traits are disabled for this parse");
        } else if name == "import" {
            diagnostic = diagnostic.with_note("imports are disabled for this parse");
        }
        self.report(diagnostic);
    }

    /// `(args, key: value)`, bare strings on the same line, and with
    /// `allow_body` an optional `{ key: value }` body.
    pub(crate) fn parse_directive_config(&mut self, allow_body: bool) -> TraitConfig {
        let mut config = TraitConfig::default();
        let line = self.previous_line();

        if self.check(TokenKind::LParen) && self.current().line == line {
            self.advance();
            loop {
                let token = self.current().clone();
                match token.kind {
                    TokenKind::RParen => {
                        self.advance();
                        break;
                    }
                    TokenKind::Eof => {
                        self.unexpected("in directive arguments, expected ')'");
                        break;
                    }
                    TokenKind::Comma => self.advance(),
                    TokenKind::Identifier | TokenKind::String
                        if matches!(self.peek_kind(1), TokenKind::Colon | TokenKind::Equals) =>
                    {
                        self.advance();
                        self.advance();
                        let value = self.parse_argument();
                        config.config.insert(token.text, value);
                    }
                    _ => {
                        let before = self.current().span;
                        let value = self.parse_argument();
                        config.args.push(value);
                        if self.current().span == before {
                            // Nothing consumed, e.g. a stray '}'
                            break;
                        }
                    }
                }
            }
        }

        while self.check(TokenKind::String) && self.current().line == line {
            config.args.push(Value::String(self.current().text.clone()));
            self.advance();
        }

        if allow_body
            && self.check(TokenKind::LBrace)
            && let Value::Object(entries) = self.parse_object()
        {
            for entry in entries {
                match entry {
                    ObjectEntry::Field { key, value } => {
                        config.config.insert(key, value);
                    }
                    ObjectEntry::Spread(value) => config.args.push(Value::Spread(Box::new(value))),
                }
            }
        }

        config
    }

    fn parse_argument(&mut self) -> Value {
        self.value_failed = false;
        let value = self.parse_value();
        if self.value_failed {
            self.recover_in_list();
            self.value_failed = false;
        }
        value
    }

    // ========== Control Flow ==========

    /// `@for item in items { ... }`
    fn parse_for(&mut self, each: bool) -> Directive {
        self.features.insert(Feature::ControlFlow);
        let variable = if self.check(TokenKind::Identifier) {
            let name = self.current().text.clone();
            self.advance();
            name
        } else {
            self.unexpected("where a loop variable was expected");
            String::new()
        };

        if self.current().is_ident("in") || self.current().is_ident("of") {
            self.advance();
        } else {
            self.unexpected("in loop header, expected 'in'");
        }

        let iterable = self.parse_condition();
        let body = self.parse_control_body();
        if each {
            Directive::ForEach {
                variable,
                iterable,
                body,
            }
        } else {
            Directive::For {
                variable,
                iterable,
                body,
            }
        }
    }

    /// `@if cond { ... }` with an optional `@else { ... }` or `@else @if ...`.
    fn parse_if(&mut self) -> Directive {
        self.features.insert(Feature::ControlFlow);
        let condition = self.parse_condition();
        let body = self.parse_control_body();

        let else_body = if self.else_follows() {
            self.skip_newlines();
            let start = self.start_position();
            self.advance(); // @
            self.advance(); // else
            if self.check(TokenKind::At) && self.peek(1).is_ident("if") {
                let mut holder = Node::fragment(Vec::new(), Location::default());
                if let Some(nested) = self.parse_directive(true) {
                    self.attach(&mut holder, nested);
                }
                holder.loc = self.location_from(start);
                Some(vec![holder])
            } else if self.current().is_ident("if") {
                self.advance();
                let mut holder = Node::fragment(Vec::new(), Location::default());
                holder.directives.push(self.parse_if());
                holder.loc = self.location_from(start);
                Some(vec![holder])
            } else {
                Some(self.parse_control_body())
            }
        } else {
            None
        };

        Directive::If {
            condition,
            body,
            else_body,
        }
    }

    /// Does an `@else` follow, possibly after line breaks?
    fn else_follows(&self) -> bool {
        let mut n = 0;
        while self.peek_kind(n) == TokenKind::Newline {
            n += 1;
        }
        self.peek_kind(n) == TokenKind::At && self.peek(n + 1).is_ident("else")
    }

    /// Parse an expression and return its source text.
    fn parse_condition(&mut self) -> String {
        let start = self.current().span.start.0 as usize;
        self.value_failed = false;
        self.parse_value();
        if self.value_failed {
            while !matches!(
                self.current_kind(),
                TokenKind::LBrace | TokenKind::RBrace | TokenKind::Eof
            ) && !self.current_kind().is_layout()
            {
                self.skip_balanced();
            }
            self.value_failed = false;
        }
        let end = self.previous_span().end.0 as usize;
        self.slice(start, end).trim().to_string()
    }

    /// `{ items }` of a control-flow directive. A lone element is stored as
    /// is; properties and directives are wrapped in a fragment.
    fn parse_control_body(&mut self) -> Vec<Node> {
        let mut body = Vec::new();
        self.parse_braced(|p| {
            let start = p.start_position();
            let mut item = Node::fragment(Vec::new(), Location::default());
            p.parse_body_item(&mut item);

            let lone_child = item.children.len() == 1
                && item.properties.is_empty()
                && item.spreads.is_empty()
                && item.directives.is_empty()
                && item.traits.is_empty();
            if lone_child {
                body.append(&mut item.children);
            } else if item.count() > 1
                || !item.properties.is_empty()
                || !item.spreads.is_empty()
                || !item.traits.is_empty()
            {
                item.loc = p.location_from(start);
                body.push(item);
            }
        });
        body
    }

    // ========== Imports ==========

    /// `@import "path" [as Alias]`, `@import { a, b as c } from "path"` or
    /// `@import Name from "path"`.
    fn parse_import(&mut self) -> Option<Directive> {
        self.features.insert(Feature::Imports);
        let mut decl = ImportDecl {
            path: String::new(),
            names: Vec::new(),
            alias: None,
        };

        match self.current_kind() {
            TokenKind::String => {
                decl.path = self.current().text.clone();
                self.advance();
                if self.current().is_ident("as") {
                    self.advance();
                    decl.alias = self.expect_name("import alias");
                }
            }
            TokenKind::LBrace => {
                self.parse_braced(|p| {
                    if !p.check(TokenKind::Identifier) {
                        p.unexpected("in import list");
                        p.advance();
                        return;
                    }
                    let name = p.current().text.clone();
                    p.advance();
                    let alias = if p.current().is_ident("as") {
                        p.advance();
                        p.expect_name("import alias")
                    } else {
                        None
                    };
                    decl.names.push(ImportName { name, alias });
                });
                decl.path = self.parse_import_source()?;
            }
            TokenKind::Identifier => {
                decl.names.push(ImportName {
                    name: self.current().text.clone(),
                    alias: None,
                });
                self.advance();
                decl.path = self.parse_import_source()?;
            }
            _ => {
                self.unexpected("after '@import', expected a path");
                return None;
            }
        }

        self.imports.push(decl.clone());
        Some(Directive::Import(decl))
    }

    /// `from "path"`
    fn parse_import_source(&mut self) -> Option<String> {
        if !self.current().is_ident("from") {
            self.unexpected("in import, expected 'from'");
            return None;
        }
        self.advance();
        if !self.check(TokenKind::String) {
            self.unexpected("after 'from', expected a path");
            return None;
        }
        let path = self.current().text.clone();
        self.advance();
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use crate::{ParserOptions, parse, parse_with_options};
    use holo_diagnostic::ErrorCode;
    use holo_syntax::Directive;

    #[test]
    fn test_trait_with_config() {
        let result = parse("orb \"Ball\" @grabbable(snap: true) @glowing { }");
        assert!(result.success, "{:?}", result.diagnostics);
        let config = &result.ast.traits["grabbable"];
        assert_eq!(config.get("snap").and_then(|v| v.as_bool()), Some(true));
        assert!(result.ast.has_trait("glowing"));
    }

    #[test]
    fn test_unknown_directive_is_generic_warning() {
        let result = parse("orb a { @sparkly }");
        assert!(result.success);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.ast.has_trait("sparkly"));
    }

    #[test]
    fn test_strict_rejects_unknown_directive() {
        let options = ParserOptions::default().strict(true);
        let result = parse_with_options("orb a { @sparkly }", &options);
        assert!(!result.success);
        assert!(!result.ast.has_trait("sparkly"));
    }

    #[test]
    fn test_if_else_chain() {
        let source = "object a {\n  @if hp > 0 { orb alive {} }\n  @else @if hp == 0 { orb dead {} }\n  @else { orb gone {} }\n}\n";
        let result = parse(source);
        assert!(result.success, "{:?}", result.diagnostics);
        let Directive::If { condition, body, else_body } = &result.ast.directives[0] else {
            panic!("expected @if");
        };
        assert_eq!(condition, "hp > 0");
        assert_eq!(body[0].name.as_deref(), Some("alive"));
        assert!(else_body.as_ref().is_some_and(|b| b.len() == 1));
        // root, alive, the `@else @if` holder, dead, gone
        assert_eq!(result.ast.count(), 5);
    }

    #[test]
    fn test_stray_else_is_an_error() {
        let result = parse("object a { @else { } }");
        assert_eq!(result.diagnostics[0].code, ErrorCode::UnexpectedToken);
    }

    #[test]
    fn test_import_forms() {
        let result = parse("@import \"./a.holo\" as A\n@import { b, c as d } from \"./b.holo\"\norb x {}\n");
        assert!(result.success, "{:?}", result.diagnostics);
        assert_eq!(result.imports.len(), 2);
        assert_eq!(result.imports[0].alias.as_deref(), Some("A"));
        assert_eq!(result.imports[1].names[1].local_name(), "d");
    }

    #[test]
    fn test_lifecycle_body_is_raw() {
        let result = parse("orb a {\n  @on_click(event) { score += 1 }\n}\n");
        let Directive::Lifecycle { hook, params, body } = &result.ast.directives[0] else {
            panic!("expected lifecycle hook");
        };
        assert_eq!(hook, "on_click");
        assert_eq!(params, &["event".to_string()]);
        assert_eq!(body, "score += 1");
    }
}
