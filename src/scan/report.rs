use std::borrow::Cow;
use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use super::names::display_name;
use super::scanner::DetectionResult;
use crate::world::TilePos;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetInfo {
    pub id: u16,
    pub name: Cow<'static, str>,
}

/// A [`DetectionResult`] labelled for output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub target: TargetInfo,
    pub found: bool,
    pub count: u64,
    pub min_count: u64,
    pub first_coordinate: Option<TilePos>,
    pub scan_first: Option<TilePos>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<TilePos>>,
}

impl DetectionReport {
    pub fn new(result: DetectionResult) -> Self {
        Self {
            path: None,
            target: TargetInfo { id: result.target, name: display_name(result.target) },
            found: result.found(),
            count: result.count,
            min_count: result.min_matches,
            first_coordinate: result.first_coordinate,
            scan_first: result.scan_first,
            matches: result.matches,
        }
    }

    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.display().to_string());
        self
    }

    /// Human-readable summary, one line per fact, no trailing newline.
    pub fn render_text(&self) -> String {
        let name = &self.target.name;
        let mut out = String::new();
        if let Some(path) = &self.path {
            let _ = writeln!(out, "{path}:");
        }

        match (self.found, self.first_coordinate) {
            (true, Some(pos)) => {
                let _ = writeln!(out, "Found {} {name} tiles.", self.count);
                let _ = write!(out, "Highest point coordinates: X={}, Y={}", pos.x, pos.y);
            }
            _ if self.count > 0 => {
                let _ = write!(
                    out,
                    "Only {} {name} tiles found, {} required.",
                    self.count, self.min_count
                );
            }
            _ => {
                let _ = write!(out, "No {name} (tile ID: {}) found in the world.", self.target.id);
            }
        }

        if let Some(matches) = &self.matches {
            for pos in matches {
                let _ = write!(out, "\n  X={}, Y={}", pos.x, pos.y);
            }
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl From<DetectionResult> for DetectionReport {
    fn from(result: DetectionResult) -> Self {
        Self::new(result)
    }
}
