//! Closed vocabularies used for validation hints and "did you mean" lookups.

/// Built-in VR/behaviour traits (`@grabbable`, `@physics`, ...).
pub const KNOWN_TRAITS: &[&str] = &[
    // Interaction
    "grabbable",
    "throwable",
    "holdable",
    "clickable",
    "hoverable",
    "draggable",
    "pointable",
    "scalable",
    // Physics
    "collidable",
    "physics",
    "rigid",
    "kinematic",
    "trigger",
    "gravity",
    // Visual
    "glowing",
    "emissive",
    "transparent",
    "reflective",
    "animated",
    "billboard",
    // Networking
    "networked",
    "synced",
    "persistent",
    "owned",
    "host_only",
    // Inventory
    "stackable",
    "attachable",
    "equippable",
    "consumable",
    "destructible",
    // Spatial
    "anchor",
    "tracked",
    "world_locked",
    "hand_tracked",
    "eye_tracked",
    // Audio
    "spatial_audio",
    "ambient",
    "voice_activated",
    // Reactive state
    "state",
    "reactive",
    "observable",
    "computed",
    // Social
    "shareable",
    "collaborative",
    "tweetable",
    // Digital twins and IoT
    "digital_twin",
    "twin_sync",
    "twin_actuator",
    "sensor",
    "mitosis",
    // Web3
    "nft",
    "token_gated",
    "wallet",
    "marketplace",
];

/// Built-in geometry primitives.
pub const KNOWN_GEOMETRIES: &[&str] = &[
    "cube", "sphere", "cylinder", "cone", "torus", "capsule", "plane", "box", "ring", "circle",
    "line",
];

/// Keywords that introduce a structural element.
pub const ELEMENT_KEYWORDS: &[&str] = &[
    "composition",
    "world",
    "scene",
    "object",
    "orb",
    "entity",
    "group",
    "spatial_group",
    "template",
    "environment",
    "logic",
    "state_machine",
    "light",
    "camera",
    "audio",
    "panel",
    "button",
    "text",
    "model",
    "particles",
    "zone",
    "portal",
];

/// Keywords that dispatch to a dedicated sub-parser.
pub const STRUCTURAL_KEYWORDS: &[&str] = &["logic", "template", "state_machine", "environment"];

/// Element keywords that produce a composition root.
pub const COMPOSITION_KEYWORDS: &[&str] = &["composition", "world", "scene"];

/// Names handled by the directive dispatch table (traits excluded).
pub const KNOWN_DIRECTIVES: &[&str] = &[
    "state",
    "for",
    "forEach",
    "while",
    "if",
    "else",
    "import",
    "manifest",
    "asset",
    "semantic",
    "bindings",
    "world_metadata",
    "world_config",
    "zones",
    "spawn_points",
    "skybox",
    "ambient_light",
    "directional_light",
    "fog",
    "lighting",
    "external_api",
    "generate",
    "npc",
    "dialog",
    "platform_event",
];

/// Lifecycle hooks accepted as `@on_*` directives.
pub const LIFECYCLE_HOOKS: &[&str] = &[
    "on_mount",
    "on_unmount",
    "on_update",
    "on_click",
    "on_hover_enter",
    "on_hover_exit",
    "on_grab",
    "on_release",
    "on_collision",
    "on_trigger_enter",
    "on_trigger_exit",
    "on_data_update",
];

/// Frequently used element properties.
pub const KNOWN_PROPERTIES: &[&str] = &[
    "position",
    "rotation",
    "scale",
    "size",
    "color",
    "geometry",
    "material",
    "texture",
    "opacity",
    "visible",
    "model",
    "src",
    "intensity",
    "radius",
    "mass",
];

/// Well-known misspellings and their corrections.
pub const COMMON_TYPOS: &[(&str, &str)] = &[
    ("geomety", "geometry"),
    ("geometery", "geometry"),
    ("positon", "position"),
    ("postion", "position"),
    ("rotatoin", "rotation"),
    ("roation", "rotation"),
    ("colour", "color"),
    ("collideable", "collidable"),
    ("grabable", "grabbable"),
    ("matrial", "material"),
];

pub fn is_known_trait(name: &str) -> bool {
    KNOWN_TRAITS.contains(&name)
}

/// A geometry value is valid if it is built in, or refers to a model asset.
pub fn is_known_geometry(value: &str) -> bool {
    KNOWN_GEOMETRIES.contains(&value)
        || value.starts_with("model/")
        || value.ends_with(".glb")
        || value.ends_with(".gltf")
}

pub fn is_element_keyword(name: &str) -> bool {
    ELEMENT_KEYWORDS.contains(&name) || KNOWN_GEOMETRIES.contains(&name)
}

pub fn is_lifecycle_hook(name: &str) -> bool {
    LIFECYCLE_HOOKS.contains(&name)
}

pub fn known_typo(word: &str) -> Option<&'static str> {
    COMMON_TYPOS
        .iter()
        .find(|(typo, _)| *typo == word)
        .map(|(_, fixed)| *fixed)
}
