//! Directives: `@name`, `@name(args)`, `@name { body }` and friends.
//! 指令定义。

use crate::{Node, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Arguments of a directive or trait: positional values from `(...)` and
/// named entries from `(key: value)` or a `{ key: value }` body.
/// 指令或特征的参数。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraitConfig {
    pub args: Vec<Value>,
    pub config: BTreeMap<String, Value>,
}

impl TraitConfig {
    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.config.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    /// The first positional string argument, e.g. `"Guard"` in `@npc("Guard")`.
    pub fn subject(&self) -> Option<&str> {
        self.args.first().and_then(Value::as_str)
    }
}

/// One imported name, `name` or `name as alias`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportName {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportName {
    /// The name the symbol is bound to locally.
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// `@import "path" as Alias` or `@import { a, b as c } from "path"`.
/// 导入声明。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub path: String,
    pub names: Vec<ImportName>,
    pub alias: Option<String>,
}

/// A directive attached to an element or standing alone.
/// 附加到元素或独立存在的指令。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "directive", rename_all = "snake_case")]
pub enum Directive {
    /// A known trait such as `@grabbable` / 特征
    Trait { name: String, config: TraitConfig },
    /// `@on_click(event) { ... }`, body kept as raw source / 生命周期钩子
    Lifecycle {
        hook: String,
        params: Vec<String>,
        body: String,
    },
    /// `@state { key: value }` / 状态块
    State { properties: BTreeMap<String, Value> },
    /// `@for item in items { ... }`
    For {
        variable: String,
        iterable: String,
        body: Vec<Node>,
    },
    /// `@forEach item in items { ... }`
    ForEach {
        variable: String,
        iterable: String,
        body: Vec<Node>,
    },
    /// `@while cond { ... }`
    While { condition: String, body: Vec<Node> },
    /// `@if cond { ... } @else { ... }`
    If {
        condition: String,
        body: Vec<Node>,
        else_body: Option<Vec<Node>>,
    },
    /// `@import ...` / 导入
    Import(ImportDecl),
    Manifest { config: TraitConfig },
    Asset {
        name: Option<String>,
        config: TraitConfig,
    },
    Semantic {
        label: Option<String>,
        config: TraitConfig,
    },
    Bindings { bindings: BTreeMap<String, Value> },
    WorldMetadata { config: TraitConfig },
    WorldConfig { config: TraitConfig },
    Zones { config: TraitConfig },
    SpawnPoints { config: TraitConfig },
    Skybox { config: TraitConfig },
    AmbientLight { config: TraitConfig },
    DirectionalLight { config: TraitConfig },
    Fog { config: TraitConfig },
    Lighting { config: TraitConfig },
    ExternalApi {
        url: Option<String>,
        config: TraitConfig,
    },
    Generate {
        prompt: Option<String>,
        config: TraitConfig,
    },
    Npc {
        name: Option<String>,
        config: TraitConfig,
    },
    Dialog {
        name: Option<String>,
        config: TraitConfig,
    },
    PlatformEvent {
        event: Option<String>,
        config: TraitConfig,
    },
    /// Any other `@name`, accepted as a trait-like payload / 未识别的指令
    Generic { name: String, config: TraitConfig },
}

impl Directive {
    /// The directive name as written after `@`.
    pub fn name(&self) -> &str {
        match self {
            Directive::Trait { name, .. } | Directive::Generic { name, .. } => name,
            Directive::Lifecycle { hook, .. } => hook,
            Directive::State { .. } => "state",
            Directive::For { .. } => "for",
            Directive::ForEach { .. } => "forEach",
            Directive::While { .. } => "while",
            Directive::If { .. } => "if",
            Directive::Import(_) => "import",
            Directive::Manifest { .. } => "manifest",
            Directive::Asset { .. } => "asset",
            Directive::Semantic { .. } => "semantic",
            Directive::Bindings { .. } => "bindings",
            Directive::WorldMetadata { .. } => "world_metadata",
            Directive::WorldConfig { .. } => "world_config",
            Directive::Zones { .. } => "zones",
            Directive::SpawnPoints { .. } => "spawn_points",
            Directive::Skybox { .. } => "skybox",
            Directive::AmbientLight { .. } => "ambient_light",
            Directive::DirectionalLight { .. } => "directional_light",
            Directive::Fog { .. } => "fog",
            Directive::Lighting { .. } => "lighting",
            Directive::ExternalApi { .. } => "external_api",
            Directive::Generate { .. } => "generate",
            Directive::Npc { .. } => "npc",
            Directive::Dialog { .. } => "dialog",
            Directive::PlatformEvent { .. } => "platform_event",
        }
    }

    /// Child nodes owned by control-flow directives.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        let (body, else_body): (&[Node], &[Node]) = match self {
            Directive::For { body, .. }
            | Directive::ForEach { body, .. }
            | Directive::While { body, .. } => (body.as_slice(), &[][..]),
            Directive::If {
                body, else_body, ..
            } => (body.as_slice(), else_body.as_deref().unwrap_or(&[][..])),
            _ => (&[][..], &[][..]),
        };
        body.iter().chain(else_body.iter())
    }

    pub(crate) fn offset_lines(&mut self, delta: u32) {
        match self {
            Directive::For { body, .. }
            | Directive::ForEach { body, .. }
            | Directive::While { body, .. } => {
                body.iter_mut().for_each(|n| n.offset_lines(delta));
            }
            Directive::If {
                body, else_body, ..
            } => {
                body.iter_mut().for_each(|n| n.offset_lines(delta));
                if let Some(else_body) = else_body {
                    else_body.iter_mut().for_each(|n| n.offset_lines(delta));
                }
            }
            _ => {}
        }
    }

    pub fn is_control_flow(&self) -> bool {
        matches!(
            self,
            Directive::For { .. }
                | Directive::ForEach { .. }
                | Directive::While { .. }
                | Directive::If { .. }
        )
    }
}
