//! Frame composition and terminal output.
//!
//! [`compose`] is pure: it lays the active line out for a given terminal
//! size. [`draw`] writes a composed frame with crossterm.

use crate::font::{text_width, Font};
use crossterm::cursor::MoveTo;
use crossterm::style::{Attribute, Color, Print, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::queue;
use lrcsync_core::text::split_words;
use lrcsync_core::{LrcLine, WordSync};
use std::io::{self, Write};

/// Shown when there is nothing to sing
pub const IDLE_TEXT: &str = "•••";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Words up to and including the active one
    Sung,
    /// Words not reached yet
    Pending,
    /// Idle display, gaps and lines without word timing
    Normal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: Style,
}

impl Span {
    fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// One terminal row of a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Zero-based terminal row
    pub y: u16,
    /// Column of the first span
    pub x: u16,
    pub spans: Vec<Span>,
}

impl Row {
    /// Text of the row without styling.
    #[cfg(test)]
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// A fully laid out screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub rows: Vec<Row>,
}

/// A word ready for layout
struct Block {
    rows: Vec<String>,
    width: usize,
    style: Style,
}

/// Lay out `line` for a `width` x `height` terminal, highlighting words up
/// to `active_word`. `None` composes the idle display.
#[must_use]
pub fn compose(
    line: Option<&LrcLine>,
    active_word: Option<usize>,
    font: &Font,
    width: u16,
    height: u16,
) -> Frame {
    let width = usize::from(width);
    let height = usize::from(height);
    if width == 0 || height == 0 {
        return Frame::default();
    }

    let Some(line) = line else {
        return place(
            vec![vec![Span::new(IDLE_TEXT, Style::Normal)]],
            width,
            height,
        );
    };

    let blocks: Vec<Block> = styled_words(line, active_word)
        .into_iter()
        .map(|(word, style)| {
            let rows = font.render_word(word);
            let width = rows.iter().map(|r| text_width(r)).max().unwrap_or(0);
            Block { rows, width, style }
        })
        .collect();

    let gap = font.word_gap();
    let row_gap = usize::from(font.height() > 1);
    let mut rows = Vec::new();
    for (i, wrapped) in wrap(&blocks, gap, width).into_iter().enumerate() {
        if i > 0 {
            rows.extend(std::iter::repeat_with(Vec::new).take(row_gap));
        }
        for r in 0..font.height() {
            let mut spans = Vec::with_capacity(wrapped.len() * 2);
            for (j, block) in wrapped.iter().enumerate() {
                if j > 0 {
                    spans.push(Span::new(" ".repeat(gap), Style::Normal));
                }
                spans.push(Span::new(block.rows[r].clone(), block.style));
            }
            rows.push(spans);
        }
    }

    place(rows, width, height)
}

/// Words of `line` with their highlight style.
fn styled_words(line: &LrcLine, active_word: Option<usize>) -> Vec<(&str, Style)> {
    if line.sync != WordSync::Synced || line.words.is_empty() {
        return split_words(&line.text)
            .into_iter()
            .map(|w| (w, Style::Normal))
            .collect();
    }

    line.words
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let style = match active_word {
                Some(active) if i <= active => Style::Sung,
                _ => Style::Pending,
            };
            (w.text.as_str(), style)
        })
        .collect()
}

/// Greedily pack blocks into lines no wider than `width`.
///
/// A block wider than `width` gets a line of its own.
fn wrap(blocks: &[Block], gap: usize, width: usize) -> Vec<&[Block]> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut used = 0;

    for (i, block) in blocks.iter().enumerate() {
        if i > start && used + gap + block.width > width {
            lines.push(&blocks[start..i]);
            start = i;
            used = 0;
        }
        if i > start {
            used += gap;
        }
        used += block.width;
    }
    if start < blocks.len() {
        lines.push(&blocks[start..]);
    }
    lines
}

/// Center rows vertically and horizontally, truncating to the screen.
fn place(rows: Vec<Vec<Span>>, width: usize, height: usize) -> Frame {
    let visible = rows.len().min(height);
    let top = (height - visible) / 2;

    let rows = rows
        .into_iter()
        .take(visible)
        .enumerate()
        .filter(|(_, spans)| !spans.is_empty())
        .map(|(i, spans)| {
            let spans = truncate(spans, width);
            let used: usize = spans.iter().map(|s| text_width(&s.text)).sum();
            Row {
                y: to_u16(top + i),
                x: to_u16((width - used) / 2),
                spans,
            }
        })
        .collect();

    Frame { rows }
}

fn truncate(spans: Vec<Span>, width: usize) -> Vec<Span> {
    let mut remaining = width;
    let mut out = Vec::with_capacity(spans.len());
    for span in spans {
        if remaining == 0 {
            break;
        }
        let len = text_width(&span.text);
        if len <= remaining {
            remaining -= len;
            out.push(span);
        } else {
            out.push(Span::new(
                span.text.chars().take(remaining).collect::<String>(),
                span.style,
            ));
            remaining = 0;
        }
    }
    out
}

fn to_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

/// Clear the screen and write `frame`.
///
/// # Errors
///
/// Returns any error from writing to `out`.
pub fn draw<W: Write>(out: &mut W, frame: &Frame, colors_enabled: bool) -> io::Result<()> {
    queue!(out, Clear(ClearType::All))?;
    for row in &frame.rows {
        queue!(out, MoveTo(row.x, row.y))?;
        for span in &row.spans {
            apply_style(out, span.style, colors_enabled)?;
            queue!(out, Print(&span.text), SetAttribute(Attribute::Reset))?;
        }
    }
    out.flush()
}

fn apply_style<W: Write>(out: &mut W, style: Style, colors_enabled: bool) -> io::Result<()> {
    match (style, colors_enabled) {
        (Style::Sung, true) => queue!(
            out,
            SetAttribute(Attribute::Bold),
            SetForegroundColor(Color::Cyan)
        ),
        (Style::Sung, false) => queue!(out, SetAttribute(Attribute::Bold)),
        (Style::Pending, true) => queue!(out, SetForegroundColor(Color::DarkGrey)),
        (Style::Pending, false) => queue!(out, SetAttribute(Attribute::Dim)),
        (Style::Normal, _) => Ok(()),
    }
}
