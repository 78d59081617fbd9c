//! Shared font maps and face descriptions.

use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use crate::shaper::{CosmicShaper, Shaper};

/// Family used when the description names none.
pub const DEFAULT_FAMILY: &str = "monospace";

/// Size used when neither the description nor the caller sets one.
pub const DEFAULT_SIZE_PT: f32 = 10.0;

/// Resolution used to turn point sizes into pixels.
pub const DPI: f32 = 96.0;

/// A shared font map.
///
/// Cloning is cheap and yields another handle onto the same map; the map is
/// released when the last handle (including the ones held by faces) drops.
pub struct Font<S: Shaper = CosmicShaper> {
    shaper: Rc<RefCell<S>>,
}

impl Font<CosmicShaper> {
    /// Create a font map backed by the system font database.
    pub fn new() -> Self {
        Self::with_shaper(CosmicShaper::new())
    }
}

impl Default for Font<CosmicShaper> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Shaper> Font<S> {
    /// Wrap an existing shaper.
    pub fn with_shaper(shaper: S) -> Self {
        Self {
            shaper: Rc::new(RefCell::new(shaper)),
        }
    }

    pub(crate) fn shaper(&self) -> RefMut<'_, S> {
        self.shaper.borrow_mut()
    }

    /// Number of live handles onto this map.
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.shaper)
    }
}

impl<S: Shaper> Clone for Font<S> {
    fn clone(&self) -> Self {
        Self {
            shaper: Rc::clone(&self.shaper),
        }
    }
}

impl<S: Shaper> std::fmt::Debug for Font<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("handles", &self.handle_count())
            .finish_non_exhaustive()
    }
}

/// A face request.
///
/// `None` in `size`, `bold` or `italic` means "don't care": the value from
/// the description string is used, or the default if it has none.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceDesc {
    /// Description string, `"[FAMILY] [Bold] [Italic|Oblique] [SIZE]"`.
    pub desc: String,
    /// Absolute size in pixels. Ignored unless > 0.
    pub size: Option<u32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
}

impl FaceDesc {
    pub fn new(desc: impl Into<String>) -> Self {
        Self {
            desc: desc.into(),
            size: None,
            bold: None,
            italic: None,
        }
    }

    pub fn size(mut self, px: u32) -> Self {
        self.size = Some(px);
        self
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold);
        self
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = Some(italic);
        self
    }

    /// Resolve into a concrete style.
    pub fn resolve(&self) -> FaceStyle {
        let parsed = ParsedDesc::parse(&self.desc);

        let size_px = match self.size {
            Some(px) if px > 0 => px as f32,
            _ => points_to_pixels(parsed.size_pt.unwrap_or(DEFAULT_SIZE_PT)),
        };

        FaceStyle {
            family: parsed.family.unwrap_or_else(|| DEFAULT_FAMILY.to_string()),
            size_px,
            bold: self.bold.or(parsed.bold).unwrap_or(false),
            italic: self.italic.or(parsed.italic).unwrap_or(false),
        }
    }
}

impl Default for FaceDesc {
    fn default() -> Self {
        Self::new(DEFAULT_FAMILY)
    }
}

/// A fully resolved face style, as handed to the shaper.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceStyle {
    pub family: String,
    pub size_px: f32,
    pub bold: bool,
    pub italic: bool,
}

pub fn points_to_pixels(pt: f32) -> f32 {
    pt * DPI / 72.0
}

/// Fields found in a description string.
#[derive(Debug, Default, PartialEq)]
struct ParsedDesc {
    family: Option<String>,
    size_pt: Option<f32>,
    bold: Option<bool>,
    italic: Option<bool>,
}

impl ParsedDesc {
    /// Parse trailing style and size words off a description. Words are
    /// consumed from the end until one is not recognized; the rest is the
    /// family. Only the first of a comma separated family list is kept.
    fn parse(desc: &str) -> Self {
        let mut parsed = ParsedDesc::default();
        let mut words: Vec<&str> = desc.split_whitespace().collect();

        while let Some(&word) = words.last() {
            let lower = word.to_ascii_lowercase();
            match lower.as_str() {
                "bold" => parsed.bold = Some(true),
                "normal" | "regular" | "book" => {}
                "italic" | "oblique" => parsed.italic = Some(true),
                _ => match lower.trim_end_matches("px").parse::<f32>() {
                    Ok(v) if v.is_finite() && v > 0.0 && parsed.size_pt.is_none() => {
                        parsed.size_pt = Some(if lower.ends_with("px") {
                            v * 72.0 / DPI
                        } else {
                            v
                        });
                    }
                    _ => break,
                },
            }
            words.pop();
        }

        let family = words.join(" ");
        let family = family.split(',').next().unwrap_or("").trim();
        if !family.is_empty() {
            parsed.family = Some(family.to_string());
        }
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let style = FaceDesc::new("").resolve();
        assert_eq!(style.family, "monospace");
        assert!(!style.bold);
        assert!(!style.italic);
        assert!((style.size_px - 40.0 / 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_parse_description() {
        let style = FaceDesc::new("DejaVu Sans Mono Bold Italic 12").resolve();
        assert_eq!(style.family, "DejaVu Sans Mono");
        assert!(style.bold);
        assert!(style.italic);
        assert!((style.size_px - 16.0).abs() < 1e-4);
    }

    #[test]
    fn test_parse_family_list_and_pixels() {
        let parsed = ParsedDesc::parse("Fira Code, monospace 18px");
        assert_eq!(parsed.family.as_deref(), Some("Fira Code"));
        let px = points_to_pixels(parsed.size_pt.unwrap());
        assert!((px - 18.0).abs() < 1e-4);
    }

    #[test]
    fn test_explicit_arguments_override_description() {
        let style = FaceDesc::new("Mono Bold 20")
            .size(15)
            .bold(false)
            .italic(true)
            .resolve();
        assert_eq!(style.family, "Mono");
        assert_eq!(style.size_px, 15.0);
        assert!(!style.bold);
        assert!(style.italic);
    }

    #[test]
    fn test_zero_size_is_ignored() {
        let style = FaceDesc::new("monospace 12").size(0).resolve();
        assert!((style.size_px - 16.0).abs() < 1e-4);
    }

    #[test]
    fn test_font_handles_are_shared() {
        let font = Font::with_shaper(crate::shaper::tests::NullShaper);
        assert_eq!(font.handle_count(), 1);
        let other = font.clone();
        assert_eq!(font.handle_count(), 2);
        drop(other);
        assert_eq!(font.handle_count(), 1);
    }
}
