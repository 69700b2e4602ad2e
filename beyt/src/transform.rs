//! Verse reconstruction: search hits → display excerpts
//!
//! A search hit carries the matched verse plus its sibling verses
//! (`context_verses`). The excerpt shows a small window of the poem around the
//! matched verse, rebuilt into couplets (two hemistichs) and full-width lines.
//!
//! Records without context verses come from the legacy backend, where the poem
//! text itself encodes the structure: couplets separated by newlines,
//! hemistichs separated by four spaces.
//!
//! Nothing here fails. Malformed input degrades to empty text or absent ids.

use crate::interface::{DisplayLine, FullPoem, Hemistich, SearchExcerpt};
use crate::models::{ContextVerse, PoemRecord, Position, VerseRecord, DEFAULT_CATEGORY};
use tracing::debug;

/// Lines shown in a list preview
pub const PREVIEW_LINES: usize = 3;

/// Separator between the two hemistichs of a couplet in legacy poem text
pub const HEMISTICH_SEPARATOR: &str = "    ";

/// Verses kept before and after the matched verse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextWindow {
    pub before: usize,
    pub after: usize,
}

impl ContextWindow {
    /// Window size for a matched verse in the given couplet role.
    ///
    /// A first hemistich needs room after it for its partner, a second
    /// hemistich needs room before it.
    pub fn for_position(position: Position) -> Self {
        match position {
            Position::Unstructured | Position::Second => Self { before: 3, after: 2 },
            Position::First => Self { before: 2, after: 3 },
            Position::Standalone => Self { before: 2, after: 2 },
        }
    }

    /// Half-open index range of the window around `matched`, clamped to `len`
    pub fn bounds(&self, matched: usize, len: usize) -> (usize, usize) {
        let start = matched.saturating_sub(self.before);
        let end = matched.saturating_add(self.after).saturating_add(1).min(len);
        (start.min(end), end)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EXCERPTS
// ─────────────────────────────────────────────────────────────────────────────

/// Reshape one search hit into a display excerpt.
///
/// `poet_id` is the session-local id of the record's poet, if known.
pub fn build_excerpt(record: &VerseRecord, poet_id: Option<u64>) -> SearchExcerpt {
    let (display_lines, has_more, poem_id) = if record.context_verses.is_empty() {
        let (lines, has_more) = legacy_preview(&record.text);
        (lines, has_more, record.poem_id.or(record.id))
    } else {
        let (lines, has_more) = context_preview(record);
        (lines, has_more, record.poem_id)
    };

    SearchExcerpt {
        poem_id,
        verse_id: record.id,
        poet_id,
        poet_name: record.poet.clone(),
        poem_title: record.poem_title.clone(),
        display_lines,
        matched_verse_text: record.text.clone(),
        url: record.url.clone(),
        category: record.category_or_default(),
        has_more,
    }
}

fn context_preview(record: &VerseRecord) -> (Vec<DisplayLine>, bool) {
    let sorted = sorted_by_vorder(&record.context_verses);

    let window: &[&ContextVerse] = match sorted.iter().position(|v| v.is_match) {
        Some(matched) => {
            let (start, end) =
                ContextWindow::for_position(sorted[matched].position()).bounds(matched, sorted.len());
            &sorted[start..end]
        }
        None => {
            debug!(
                verse_id = ?record.id,
                poem_id = ?record.poem_id,
                "No matched verse among context verses, showing the full context"
            );
            &sorted[..]
        }
    };

    let total_lines = build_lines(&sorted).len();
    let mut lines = build_lines(window);
    lines.truncate(PREVIEW_LINES);

    (lines, total_lines > PREVIEW_LINES)
}

fn legacy_preview(text: &str) -> (Vec<DisplayLine>, bool) {
    let mut lines = split_legacy_text(text);
    let has_more = lines.len() > PREVIEW_LINES;
    lines.truncate(PREVIEW_LINES);
    (lines, has_more)
}

// ─────────────────────────────────────────────────────────────────────────────
// LINE BUILDING
// ─────────────────────────────────────────────────────────────────────────────

/// Context verses in ascending `vorder` (stable for equal orders)
pub fn sorted_by_vorder(verses: &[ContextVerse]) -> Vec<&ContextVerse> {
    let mut sorted: Vec<&ContextVerse> = verses.iter().collect();
    sorted.sort_by_key(|v| v.vorder);
    sorted
}

/// Build display lines from verses already sorted by `vorder`.
///
/// First hemistichs pair with the second hemistich at `vorder + 1` found in
/// the same slice. Second hemistichs only ever appear through their partner.
pub fn build_lines(verses: &[&ContextVerse]) -> Vec<DisplayLine> {
    let mut lines = Vec::with_capacity(verses.len());

    for verse in verses {
        match verse.position() {
            Position::Unstructured | Position::Standalone => lines.push(DisplayLine::FullWidth {
                vorder: verse.vorder,
                text: verse.text.clone(),
                verse_id: verse.id,
                liked: verse.is_liked,
            }),
            Position::First => {
                let partner = verse.vorder.checked_add(1).and_then(|next| {
                    verses
                        .iter()
                        .find(|v| v.position() == Position::Second && v.vorder == next)
                });
                lines.push(DisplayLine::Couplet {
                    vorder: verse.vorder,
                    first: hemistich(verse),
                    second: partner.map(|p| hemistich(p)).unwrap_or_default(),
                });
            }
            Position::Second => {}
        }
    }

    lines
}

fn hemistich(verse: &ContextVerse) -> Hemistich {
    Hemistich {
        text: verse.text.clone(),
        verse_id: verse.id,
        liked: verse.is_liked,
    }
}

/// Split legacy poem text into couplets, one per non-blank line.
///
/// A line that does not split into exactly two non-blank hemistichs becomes a
/// couplet with an empty second half.
pub fn split_legacy_text(text: &str) -> Vec<DisplayLine> {
    text.split('\n')
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(index, line)| {
            let halves: Vec<&str> = line
                .split(HEMISTICH_SEPARATOR)
                .filter(|h| !h.trim().is_empty())
                .collect();
            let (first, second) = match halves.as_slice() {
                [first, second] => (first.to_string(), second.to_string()),
                _ => (halves.first().map(|h| h.to_string()).unwrap_or_default(), String::new()),
            };
            DisplayLine::Couplet {
                vorder: index as i64 + 1,
                first: Hemistich { text: first, ..Default::default() },
                second: Hemistich { text: second, ..Default::default() },
            }
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// FULL POEMS
// ─────────────────────────────────────────────────────────────────────────────

/// Render every line of a poem (no window, no cap)
pub fn build_full_poem(poem: &PoemRecord) -> FullPoem {
    let lines = if poem.verses.is_empty() {
        split_legacy_text(&poem.text)
    } else {
        build_lines(&sorted_by_vorder(&poem.verses))
    };

    FullPoem {
        poem_id: poem.id,
        title: poem.title.clone(),
        poet_name: poem.poet.clone(),
        url: poem.url.clone(),
        category: poem
            .category
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verse(vorder: i64, position: Option<i64>, text: &str) -> ContextVerse {
        ContextVerse {
            id: Some(vorder * 10),
            text: text.to_string(),
            vorder,
            position,
            ..Default::default()
        }
    }

    #[test]
    fn test_window_sizes() {
        assert_eq!(ContextWindow::for_position(Position::Unstructured), ContextWindow { before: 3, after: 2 });
        assert_eq!(ContextWindow::for_position(Position::Second), ContextWindow { before: 3, after: 2 });
        assert_eq!(ContextWindow::for_position(Position::First), ContextWindow { before: 2, after: 3 });
        assert_eq!(ContextWindow::for_position(Position::Standalone), ContextWindow { before: 2, after: 2 });
    }

    #[test]
    fn test_window_bounds_clamp() {
        let window = ContextWindow { before: 2, after: 3 };
        assert_eq!(window.bounds(0, 10), (0, 4));
        assert_eq!(window.bounds(5, 10), (3, 9));
        assert_eq!(window.bounds(9, 10), (7, 10));
        assert_eq!(window.bounds(0, 1), (0, 1));
    }

    #[test]
    fn test_orphan_second_hemistich_is_dropped() {
        let a = verse(1, Some(1), "orphan");
        let b = verse(2, Some(-1), "standalone");
        let lines = build_lines(&[&a, &b]);
        assert_eq!(lines.len(), 1);
        assert!(matches!(&lines[0], DisplayLine::FullWidth { text, .. } if text == "standalone"));
    }

    #[test]
    fn test_partner_must_be_adjacent() {
        let a = verse(1, Some(0), "A");
        let b = verse(3, Some(1), "B");
        let lines = build_lines(&[&a, &b]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].texts(), vec!["A", ""]);
    }

    #[test]
    fn test_partner_carries_id_and_like() {
        let a = verse(4, Some(0), "A");
        let mut b = verse(5, Some(1), "B");
        b.is_liked = true;
        let lines = build_lines(&[&a, &b]);
        match &lines[0] {
            DisplayLine::Couplet { vorder, first, second } => {
                assert_eq!(*vorder, 4);
                assert_eq!(first.verse_id, Some(40));
                assert_eq!(second.verse_id, Some(50));
                assert!(!first.liked);
                assert!(second.liked);
            }
            other => panic!("Expected couplet, got {:?}", other),
        }
    }

    #[test]
    fn test_legacy_split_rules() {
        let lines = split_legacy_text("a    b\n\n   \nsingle\nx    y    z\n        ");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].texts(), vec!["a", "b"]);
        assert_eq!(lines[1].texts(), vec!["single", ""]);
        assert_eq!(lines[2].texts(), vec!["x", ""]);
        assert_eq!(lines[2].vorder(), 3);
    }

    #[test]
    fn test_full_poem_prefers_structured_verses() {
        let poem = PoemRecord {
            id: Some(7),
            title: "t".into(),
            text: "ignored    text".into(),
            verses: vec![verse(2, Some(1), "B"), verse(1, Some(0), "A"), verse(3, None, "C")],
            ..Default::default()
        };
        let full = build_full_poem(&poem);
        assert_eq!(full.lines.len(), 2);
        assert_eq!(full.lines[0].texts(), vec!["A", "B"]);
        assert_eq!(full.lines[1].texts(), vec!["C"]);
        assert_eq!(full.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn test_full_poem_from_text_is_uncapped() {
        let poem = PoemRecord {
            text: (1..=6).map(|i| format!("a{i}    b{i}")).collect::<Vec<_>>().join("\n"),
            ..Default::default()
        };
        assert_eq!(build_full_poem(&poem).lines.len(), 6);
    }
}
