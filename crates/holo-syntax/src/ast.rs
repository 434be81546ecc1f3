//! AST node definitions.
//! AST 节点定义。

use crate::{Directive, TraitConfig, Value};
use holo_common::Location;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A node of the scene tree.
/// 场景树中的节点。
///
/// Every node kind shares the same carrier fields; what differs per kind
/// lives in [`NodeKind`]. A node owns its children, so the tree has no cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    /// Quoted or bare name, e.g. `"Ball"` in `orb "Ball" {}`
    pub name: Option<String>,
    /// `#id` marker
    pub id: Option<String>,
    pub children: Vec<Node>,
    pub properties: BTreeMap<String, Value>,
    /// `...base` entries in a body, in source order
    pub spreads: Vec<Value>,
    /// Directives other than traits, in source order
    pub directives: Vec<Directive>,
    /// Traits by name; a later declaration overwrites an earlier one
    pub traits: BTreeMap<String, TraitConfig>,
    /// Declared with a leading `export`
    #[serde(default)]
    pub exported: bool,
    pub loc: Location,
}

/// What a node is.
/// 节点类型。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// `object`, `orb`, `cube`, ... or any custom element name / 通用元素
    Element {
        element_type: String,
        /// `using "Template"` reference
        template: Option<String>,
    },
    /// Synthetic wrapper around several top-level nodes / 片段
    Fragment,
    /// `composition`, `world` or `scene` root / 组合根节点
    Composition { keyword: String },
    /// `logic { ... }` / 逻辑块
    Logic(LogicBlock),
    /// `template "Name"(params) { ... }` / 模板
    Template { params: Vec<String> },
    /// `environment { ... }` / 环境块
    Environment,
    /// `state_machine "Name" { ... }` / 状态机
    StateMachine(StateMachine),
    /// Top-level `function name(params) { ... }`; the body is raw source / 函数
    Function { params: Vec<String>, body: String },
}

/// Contents of a `logic` block. Function and handler bodies are kept as raw
/// source text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogicBlock {
    pub functions: Vec<LogicFunction>,
    pub handlers: Vec<EventHandler>,
    pub variables: BTreeMap<String, Value>,
}

/// `function name(a, b) { ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicFunction {
    pub name: String,
    pub params: Vec<String>,
    pub body: String,
}

/// `on_click(event) { ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHandler {
    pub event: String,
    pub params: Vec<String>,
    pub body: String,
}

/// A state machine. `initial` is not checked against `states`.
/// 状态机。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateMachine {
    pub initial: Option<String>,
    pub states: Vec<State>,
    pub transitions: Vec<Transition>,
}

impl StateMachine {
    pub fn state(&self, name: &str) -> Option<&State> {
        self.states.iter().find(|s| s.name == name)
    }
}

/// `state idle { on_entry { ... } on_exit { ... } key: value }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub name: String,
    pub on_entry: Option<String>,
    pub on_exit: Option<String>,
    pub properties: BTreeMap<String, Value>,
}

/// `from -> to : event`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: String,
    pub to: String,
    pub event: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind, loc: Location) -> Self {
        Self {
            kind,
            name: None,
            id: None,
            children: Vec::new(),
            properties: BTreeMap::new(),
            spreads: Vec::new(),
            directives: Vec::new(),
            traits: BTreeMap::new(),
            exported: false,
            loc,
        }
    }

    pub fn element(element_type: impl Into<String>, loc: Location) -> Self {
        Self::new(
            NodeKind::Element {
                element_type: element_type.into(),
                template: None,
            },
            loc,
        )
    }

    pub fn fragment(children: Vec<Node>, loc: Location) -> Self {
        let mut node = Self::new(NodeKind::Fragment, loc);
        node.children = children;
        node
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self.kind, NodeKind::Fragment)
    }

    /// Short name of the node kind, as used in chunk ids and tool output.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Element { .. } => "element",
            NodeKind::Fragment => "fragment",
            NodeKind::Composition { .. } => "composition",
            NodeKind::Logic(_) => "logic",
            NodeKind::Template { .. } => "template",
            NodeKind::Environment => "environment",
            NodeKind::StateMachine(_) => "state_machine",
            NodeKind::Function { .. } => "function",
        }
    }

    /// The keyword that introduced the node, e.g. `orb` or `template`.
    pub fn keyword(&self) -> &str {
        match &self.kind {
            NodeKind::Element { element_type, .. } => element_type,
            NodeKind::Composition { keyword } => keyword,
            _ => self.kind_name(),
        }
    }

    /// `using "T"` reference of an element.
    pub fn template(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { template, .. } => template.as_deref(),
            _ => None,
        }
    }

    /// Name if present, otherwise the `#id`.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.id.as_deref())
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn has_trait(&self, name: &str) -> bool {
        self.traits.contains_key(name)
    }

    /// First direct child with the given name or id.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|c| c.name.as_deref() == Some(name) || c.id.as_deref() == Some(name))
    }

    /// Visit this node and every descendant, including nodes held in
    /// control-flow directive bodies, depth first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Node)) {
        f(self);
        for directive in &self.directives {
            for node in directive.nodes() {
                node.walk(f);
            }
        }
        for child in &self.children {
            child.walk(f);
        }
    }

    /// Total number of nodes in this subtree.
    pub fn count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_| count += 1);
        count
    }

    /// Find the first node in this subtree with the given name.
    pub fn find(&self, name: &str) -> Option<&Node> {
        let mut found = None;
        self.walk(&mut |node| {
            if found.is_none() && node.name.as_deref() == Some(name) {
                found = Some(node);
            }
        });
        found
    }

    /// Shift every location in the subtree down by `delta` lines.
    pub fn offset_lines(&mut self, delta: u32) {
        if delta == 0 {
            return;
        }
        self.loc = self.loc.offset_lines(delta);
        for directive in &mut self.directives {
            directive.offset_lines(delta);
        }
        for child in &mut self.children {
            child.offset_lines(delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holo_common::Position;

    fn loc(line: u32) -> Location {
        Location::new(Position::new(line, 1), Position::new(line, 10))
    }

    #[test]
    fn test_walk_reaches_directive_bodies() {
        let mut root = Node::element("object", loc(1));
        root.name = Some("Root".into());
        let mut inner = Node::element("orb", loc(3));
        inner.name = Some("Inner".into());
        root.directives.push(Directive::If {
            condition: "show".into(),
            body: vec![inner],
            else_body: None,
        });
        root.children.push(Node::element("cube", loc(5)));

        assert_eq!(root.count(), 3);
        assert!(root.find("Inner").is_some());
    }

    #[test]
    fn test_offset_lines_is_recursive() {
        let mut root = Node::fragment(vec![Node::element("orb", loc(2))], loc(1));
        root.offset_lines(10);
        assert_eq!(root.loc.start.line, 11);
        assert_eq!(root.children[0].loc.start.line, 12);
    }
}
