//! Glyph fonts for the large lyric display.

use lrcsync_core::{CoreError, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const BLOCK_FONT: &str = "block";
pub const PLAIN_FONT: &str = "plain";

const BLOCK_HEIGHT: usize = 5;

#[rustfmt::skip]
const BLOCK_GLYPHS: &[(char, [&str; BLOCK_HEIGHT])] = &[
    ('A', [" ███ ", "█   █", "█████", "█   █", "█   █"]),
    ('B', ["████ ", "█   █", "████ ", "█   █", "████ "]),
    ('C', [" ████", "█    ", "█    ", "█    ", " ████"]),
    ('D', ["████ ", "█   █", "█   █", "█   █", "████ "]),
    ('E', ["█████", "█    ", "████ ", "█    ", "█████"]),
    ('F', ["█████", "█    ", "████ ", "█    ", "█    "]),
    ('G', [" ████", "█    ", "█  ██", "█   █", " ████"]),
    ('H', ["█   █", "█   █", "█████", "█   █", "█   █"]),
    ('I', ["█████", "  █  ", "  █  ", "  █  ", "█████"]),
    ('J', ["█████", "   █ ", "   █ ", "█  █ ", " ██  "]),
    ('K', ["█   █", "█  █ ", "███  ", "█  █ ", "█   █"]),
    ('L', ["█    ", "█    ", "█    ", "█    ", "█████"]),
    ('M', ["█   █", "██ ██", "█ █ █", "█   █", "█   █"]),
    ('N', ["█   █", "██  █", "█ █ █", "█  ██", "█   █"]),
    ('O', [" ███ ", "█   █", "█   █", "█   █", " ███ "]),
    ('P', ["████ ", "█   █", "████ ", "█    ", "█    "]),
    ('Q', [" ███ ", "█   █", "█ █ █", "█  █ ", " ██ █"]),
    ('R', ["████ ", "█   █", "████ ", "█  █ ", "█   █"]),
    ('S', [" ████", "█    ", " ███ ", "    █", "████ "]),
    ('T', ["█████", "  █  ", "  █  ", "  █  ", "  █  "]),
    ('U', ["█   █", "█   █", "█   █", "█   █", " ███ "]),
    ('V', ["█   █", "█   █", "█   █", " █ █ ", "  █  "]),
    ('W', ["█   █", "█   █", "█ █ █", "██ ██", "█   █"]),
    ('X', ["█   █", " █ █ ", "  █  ", " █ █ ", "█   █"]),
    ('Y', ["█   █", " █ █ ", "  █  ", "  █  ", "  █  "]),
    ('Z', ["█████", "   █ ", "  █  ", " █   ", "█████"]),
    ('0', [" ███ ", "█  ██", "█ █ █", "██  █", " ███ "]),
    ('1', ["  █  ", " ██  ", "  █  ", "  █  ", " ███ "]),
    ('2', [" ███ ", "█   █", "  ██ ", " █   ", "█████"]),
    ('3', ["████ ", "    █", " ███ ", "    █", "████ "]),
    ('4', ["█   █", "█   █", "█████", "    █", "    █"]),
    ('5', ["█████", "█    ", "████ ", "    █", "████ "]),
    ('6', [" ███ ", "█    ", "████ ", "█   █", " ███ "]),
    ('7', ["█████", "    █", "   █ ", "  █  ", "  █  "]),
    ('8', [" ███ ", "█   █", " ███ ", "█   █", " ███ "]),
    ('9', [" ███ ", "█   █", " ████", "    █", " ███ "]),
    (' ', ["   ", "   ", "   ", "   ", "   "]),
    ('.', [" ", " ", " ", " ", "█"]),
    (',', ["  ", "  ", "  ", " █", "█ "]),
    ('!', ["█", "█", "█", " ", "█"]),
    ('?', [" ███ ", "█   █", "  ██ ", "     ", "  █  "]),
    ('\'', ["█", "█", " ", " ", " "]),
    ('"', ["█ █", "█ █", "   ", "   ", "   "]),
    (':', [" ", "█", " ", "█", " "]),
    ('-', ["    ", "    ", "████", "    ", "    "]),
    ('(', ["  █", " █ ", " █ ", " █ ", "  █"]),
    (')', ["█  ", " █ ", " █ ", " █ ", "█  "]),
];

/// Display width of `text` in terminal cells.
#[must_use]
pub fn text_width(text: &str) -> usize {
    text.chars().count()
}

/// A glyph table rendering text as rows of equal width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Font {
    name: String,
    height: usize,
    /// Blank columns between two glyphs of a word
    spacing: usize,
    /// Width of the blank cell drawn for characters without a glyph
    blank_width: usize,
    /// Characters are drawn as themselves
    literal: bool,
    glyphs: HashMap<char, Vec<String>>,
}

impl Font {
    /// Built-in five-row block letters.
    #[must_use]
    pub fn block() -> Self {
        let glyphs = BLOCK_GLYPHS
            .iter()
            .map(|(c, rows)| (*c, rows.iter().map(|r| (*r).to_string()).collect()))
            .collect();
        Self::from_glyphs(BLOCK_FONT, glyphs)
    }

    /// Built-in single-row font that prints the text unchanged.
    #[must_use]
    pub fn plain() -> Self {
        Self {
            name: PLAIN_FONT.to_string(),
            height: 1,
            spacing: 0,
            blank_width: 1,
            literal: true,
            glyphs: HashMap::new(),
        }
    }

    fn from_glyphs(name: impl Into<String>, glyphs: HashMap<char, Vec<String>>) -> Self {
        let height = glyphs.values().map(Vec::len).max().unwrap_or(1).max(1);
        let glyphs: HashMap<char, Vec<String>> = glyphs
            .into_iter()
            .map(|(c, rows)| (c, pad_glyph(rows, height)))
            .collect();
        let blank_width = glyphs
            .get(&'A')
            .or_else(|| glyphs.get(&'a'))
            .map_or_else(
                || glyphs.values().map(|g| glyph_width(g)).max().unwrap_or(1),
                |g| glyph_width(g),
            )
            .max(1);

        Self {
            name: name.into(),
            height,
            spacing: 1,
            blank_width,
            literal: false,
            glyphs,
        }
    }

    fn from_table(name: String, table: BTreeMap<String, Vec<String>>) -> Self {
        let glyphs = table
            .into_iter()
            .filter_map(|(key, rows)| {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some((c, rows)),
                    _ => {
                        warn!("Font '{}': ignoring glyph key '{}'", name, key);
                        None
                    }
                }
            })
            .collect();
        Self::from_glyphs(name, glyphs)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rows per rendered line of text
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Blank columns between two words.
    #[must_use]
    pub fn word_gap(&self) -> usize {
        if self.literal {
            return 1;
        }
        self.glyphs
            .get(&' ')
            .map_or(self.blank_width, |g| glyph_width(g))
            + 2 * self.spacing
    }

    /// Render one word as [`height`](Self::height) rows of equal width.
    #[must_use]
    pub fn render_word(&self, word: &str) -> Vec<String> {
        let mut rows = vec![String::new(); self.height];

        for (i, c) in word.chars().enumerate() {
            if i > 0 && self.spacing > 0 {
                for row in &mut rows {
                    row.push_str(&" ".repeat(self.spacing));
                }
            }

            if self.literal {
                rows[0].push(c);
                continue;
            }

            match self.lookup(c) {
                Some(glyph) => {
                    for (row, part) in rows.iter_mut().zip(glyph) {
                        row.push_str(part);
                    }
                }
                None => {
                    let blank = " ".repeat(self.blank_width);
                    for row in &mut rows {
                        row.push_str(&blank);
                    }
                }
            }
        }

        rows
    }

    /// Exact glyph first, then the uppercase glyph for a lowercase character.
    fn lookup(&self, c: char) -> Option<&[String]> {
        self.glyphs
            .get(&c)
            .or_else(|| {
                let mut upper = c.to_uppercase();
                match (upper.next(), upper.next()) {
                    (Some(u), None) if u != c => self.glyphs.get(&u),
                    _ => None,
                }
            })
            .map(Vec::as_slice)
    }
}

fn glyph_width(rows: &[String]) -> usize {
    rows.iter().map(|r| text_width(r)).max().unwrap_or(0)
}

/// Pad every row to the glyph's width and add blank rows up to `height`.
fn pad_glyph(mut rows: Vec<String>, height: usize) -> Vec<String> {
    let width = glyph_width(&rows);
    rows.resize(height, String::new());
    for row in &mut rows {
        let missing = width - text_width(row);
        row.push_str(&" ".repeat(missing));
    }
    rows
}

/// Parse a custom font table: `{"name": {"A": ["row", ...], ...}, ...}`.
///
/// Top-level keys starting with `_` are comments and skipped.
///
/// # Errors
///
/// Returns the JSON error if the document or any font table is malformed.
pub fn parse_custom_fonts(json: &str) -> std::result::Result<Vec<Font>, serde_json::Error> {
    let tables: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;
    tables
        .into_iter()
        .filter(|(name, _)| !name.starts_with('_'))
        .map(|(name, value)| {
            let table: BTreeMap<String, Vec<String>> = serde_json::from_value(value)?;
            Ok(Font::from_table(name, table))
        })
        .collect()
}

/// Fonts available to the renderer, built once at startup.
#[derive(Debug, Clone)]
pub struct FontRegistry {
    fonts: BTreeMap<String, Font>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FontRegistry {
    /// Registry holding the `block` and `plain` fonts.
    #[must_use]
    pub fn builtin() -> Self {
        let fonts = [Font::block(), Font::plain()]
            .into_iter()
            .map(|f| (f.name().to_string(), f))
            .collect();
        Self { fonts }
    }

    /// Add the fonts of a custom JSON table; a custom font replaces a
    /// built-in one of the same name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IoError`] if the file can not be read and
    /// [`CoreError::FontParseError`] if it is not a valid font table.
    pub fn with_custom_file(mut self, path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let fonts = parse_custom_fonts(&json).map_err(|source| CoreError::FontParseError {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Loaded {} custom fonts from {}", fonts.len(), path.display());
        for font in fonts {
            let name = font.name().to_string();
            if self.fonts.insert(name.clone(), font).is_some() {
                info!("Custom font '{}' replaces the built-in one", name);
            }
        }
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::UnknownFont`] listing the available names.
    pub fn get(&self, name: &str) -> Result<&Font> {
        self.fonts.get(name).ok_or_else(|| CoreError::UnknownFont {
            name: name.to_string(),
            available: self.names().collect::<Vec<_>>().join(", "),
        })
    }

    /// Names of all fonts, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fonts.keys().map(String::as_str)
    }
}
