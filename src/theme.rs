use crate::error::VizError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
        .expect("static regex is valid")
});

/// Single-letter and named colors accepted in colormaps, mapped to hex.
/// Covers the matplotlib base colors and the common X11 names.
const NAMED_COLORS: [(&str, &str); 36] = [
    ("b", "#0000FF"),
    ("g", "#008000"),
    ("r", "#FF0000"),
    ("c", "#00BFBF"),
    ("m", "#BF00BF"),
    ("y", "#BFBF00"),
    ("k", "#000000"),
    ("w", "#FFFFFF"),
    ("black", "#000000"),
    ("white", "#FFFFFF"),
    ("red", "#FF0000"),
    ("green", "#008000"),
    ("blue", "#0000FF"),
    ("yellow", "#FFFF00"),
    ("cyan", "#00FFFF"),
    ("magenta", "#FF00FF"),
    ("orange", "#FFA500"),
    ("purple", "#800080"),
    ("brown", "#A52A2A"),
    ("pink", "#FFC0CB"),
    ("gray", "#808080"),
    ("grey", "#808080"),
    ("lightgray", "#D3D3D3"),
    ("lightgrey", "#D3D3D3"),
    ("darkgray", "#A9A9A9"),
    ("darkgrey", "#A9A9A9"),
    ("silver", "#C0C0C0"),
    ("navy", "#000080"),
    ("teal", "#008080"),
    ("olive", "#808000"),
    ("maroon", "#800000"),
    ("gold", "#FFD700"),
    ("lightblue", "#ADD8E6"),
    ("steelblue", "#4682B4"),
    ("crimson", "#DC143C"),
    ("transparent", "#00000000"),
];

/// Turns a color spec (hex or a known name) into a hex string.
pub fn resolve_color(spec: &str) -> Result<String, VizError> {
    let trimmed = spec.trim();
    if HEX_COLOR.is_match(trimmed) {
        return Ok(trimmed.to_string());
    }
    let lowered = trimmed.to_ascii_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lowered)
        .map(|(_, hex)| hex.to_string())
        .ok_or_else(|| VizError::UnknownColor(spec.to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub background: String,
    pub label_color: String,
    /// Stroke of the arrows that tie a displaced label to its node.
    pub leader_color: String,
}

impl Theme {
    /// Matplotlib look: white figure, black DejaVu labels.
    pub fn classic() -> Self {
        Self {
            font_family: "DejaVu Sans, Bitstream Vera Sans, Arial, sans-serif".to_string(),
            background: "#FFFFFF".to_string(),
            label_color: "#000000".to_string(),
            leader_color: "lightgray".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            background: "#F8FAFF".to_string(),
            label_color: "#1C2430".to_string(),
            leader_color: "#C7D2E5".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
