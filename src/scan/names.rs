//! Display names for common tile ids.

use std::borrow::Cow;

/// `(id, name)` pairs, sorted by id.
pub const KNOWN_TILES: &[(u16, &str)] = &[
    (0, "Dirt Block"),
    (1, "Stone Block"),
    (2, "Grass"),
    (4, "Torch"),
    (5, "Tree"),
    (6, "Iron Ore"),
    (7, "Copper Ore"),
    (8, "Gold Ore"),
    (9, "Silver Ore"),
    (21, "Chest"),
    (22, "Demonite Ore"),
    (37, "Meteorite"),
    (40, "Clay Block"),
    (48, "Spike"),
    (53, "Sand Block"),
    (57, "Ash Block"),
    (58, "Hellstone"),
    (59, "Mud Block"),
    (60, "Jungle Grass"),
    (107, "Cobalt Ore"),
    (108, "Mythril Ore"),
    (111, "Adamantite Ore"),
    (147, "Snow Block"),
    (151, "Sandstone Brick"),
    (161, "Ice Block"),
    (166, "Tin Ore"),
    (167, "Lead Ore"),
    (168, "Tungsten Ore"),
    (169, "Platinum Ore"),
    (204, "Crimtane Ore"),
    (211, "Chlorophyte Ore"),
    (226, "Lihzahrd Brick"),
    (237, "Lihzahrd Altar"),
    (396, "Sandstone"),
    (397, "Hardened Sand"),
];

/// Tile searched for when none is given.
pub const DEFAULT_TARGET: u16 = 151;

pub fn tile_name(id: u16) -> Option<&'static str> {
    KNOWN_TILES
        .binary_search_by_key(&id, |&(known, _)| known)
        .ok()
        .map(|i| KNOWN_TILES[i].1)
}

/// Name for display, falling back to `tile #<id>`.
pub fn display_name(id: u16) -> Cow<'static, str> {
    match tile_name(id) {
        Some(name) => Cow::Borrowed(name),
        None => Cow::Owned(format!("tile #{id}")),
    }
}

/// Resolve a numeric id or a known name. Names match case-insensitively and
/// ignore spaces, dashes and underscores.
pub fn resolve_tile(input: &str) -> Option<u16> {
    let input = input.trim();
    if let Ok(id) = input.parse::<u16>() {
        return Some(id);
    }
    let wanted = normalize(input);
    if wanted.is_empty() {
        return None;
    }
    KNOWN_TILES
        .iter()
        .find(|(_, name)| normalize(name) == wanted)
        .map(|&(id, _)| id)
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}
