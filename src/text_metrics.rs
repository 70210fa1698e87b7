use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

/// Average advance of a sans-serif glyph, as a share of the font size. Used
/// when no system font can be found.
const FALLBACK_CHAR_WIDTH: f32 = 0.6;
const LINE_HEIGHT: f32 = 1.2;

static FONT_CACHE: Lazy<Mutex<FontCache>> = Lazy::new(|| Mutex::new(FontCache::new()));

/// Width of `text` set in the first available font of `font_family`, or
/// `None` when no matching font is installed.
pub fn measure_text_width(text: &str, font_size: f32, font_family: &str) -> Option<f32> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut cache = FONT_CACHE.lock().ok()?;
    cache.measure(text, font_size, font_family)
}

/// Size of the box a single-line label occupies, falling back to an average
/// glyph width when the font is unavailable.
pub fn label_box_size(text: &str, font_size: f32, font_family: &str) -> (f32, f32) {
    let width = measure_text_width(text, font_size, font_family)
        .unwrap_or_else(|| text.chars().count() as f32 * font_size * FALLBACK_CHAR_WIDTH);
    (width, font_size * LINE_HEIGHT)
}

struct FontCache {
    db: Database,
    system_fonts_loaded: bool,
    fonts: HashMap<String, Option<LabelFont>>,
}

impl FontCache {
    fn new() -> Self {
        Self {
            db: Database::new(),
            system_fonts_loaded: false,
            fonts: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
        let key = font_family.trim().to_string();
        if !self.fonts.contains_key(&key) {
            let face = self.resolve_font(font_family);
            self.fonts.insert(key.clone(), face);
        }
        self.fonts.get_mut(&key)?.as_mut()?.advance_width(text, font_size)
    }

    fn resolve_font(&mut self, font_family: &str) -> Option<LabelFont> {
        let names: Vec<String> = font_family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\'').to_string())
            .filter(|part| !part.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names
            .iter()
            .map(|name| match name.to_ascii_lowercase().as_str() {
                "serif" => Family::Serif,
                "monospace" => Family::Monospace,
                "sans-serif" | "system-ui" | "-apple-system" => Family::SansSerif,
                _ => Family::Name(name.as_str()),
            })
            .collect();
        families.push(Family::SansSerif);

        if !self.system_fonts_loaded {
            self.db.load_system_fonts();
            self.system_fonts_loaded = true;
        }

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| LabelFont::new(data.to_vec(), index))
            .flatten()
    }
}

struct LabelFont {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
    advances: HashMap<char, Option<u16>>,
}

impl LabelFont {
    fn new(data: Vec<u8>, index: u32) -> Option<Self> {
        let units_per_em = Face::parse(&data, index).ok()?.units_per_em().max(1);
        Some(Self {
            data,
            index,
            units_per_em,
            advances: HashMap::new(),
        })
    }

    fn advance_width(&mut self, text: &str, font_size: f32) -> Option<f32> {
        let face = Face::parse(&self.data, self.index).ok()?;
        let scale = font_size / self.units_per_em as f32;
        let fallback = font_size * FALLBACK_CHAR_WIDTH;
        let mut width = 0.0f32;
        for ch in text.chars().filter(|ch| *ch != '\n') {
            let advance = *self.advances.entry(ch).or_insert_with(|| {
                face.glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
            });
            width += match advance {
                Some(units) if units > 0 => units as f32 * scale,
                _ => fallback,
            };
        }
        Some(width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_no_width() {
        assert_eq!(measure_text_width("", 12.0, "sans-serif"), Some(0.0));
        let (w, h) = label_box_size("", 10.0, "sans-serif");
        assert_eq!(w, 0.0);
        assert!((h - 12.0).abs() < 1e-4);
    }

    #[test]
    fn longer_labels_are_wider() {
        let (short, h1) = label_box_size("ab", 8.0, "DejaVu Sans, sans-serif");
        let (long, h2) = label_box_size("abcdefgh", 8.0, "DejaVu Sans, sans-serif");
        assert!(long > short);
        assert!(short > 0.0);
        assert_eq!(h1, h2);
    }
}
