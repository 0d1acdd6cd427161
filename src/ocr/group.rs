use std::collections::BTreeMap;

use crate::ocr::geom::union_bbox;
use crate::ocr::{BBoxPx, Word};

/// Words sharing one `(block_id, line_id)` key, merged into a single run.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GroupedLine {
    pub block_id: u32,
    pub line_id: u32,
    pub text: String,
    pub bbox: BBoxPx,
    pub font_size: u32,
    pub word_count: usize,
}

/// Merges words into lines keyed by `(block_id, line_id)`.
///
/// Lines come back sorted by key so slides render in a reproducible order.
/// `font_ratio` converts the mean glyph height in pixels to points.
pub fn group_words(words: &[Word], font_ratio: f32) -> Vec<GroupedLine> {
    let mut groups: BTreeMap<(u32, u32), Vec<&Word>> = BTreeMap::new();
    for word in words {
        groups
            .entry((word.block_id, word.line_id))
            .or_default()
            .push(word);
    }

    groups
        .into_iter()
        .filter_map(|((block_id, line_id), mut members)| {
            members.sort_by_key(|word| word.bbox.x);
            build_line(block_id, line_id, &members, font_ratio)
        })
        .collect()
}

fn build_line(
    block_id: u32,
    line_id: u32,
    words: &[&Word],
    font_ratio: f32,
) -> Option<GroupedLine> {
    let (first, rest) = words.split_first()?;
    let bbox = rest
        .iter()
        .fold(first.bbox, |acc, word| union_bbox(&acc, &word.bbox));
    let text = words
        .iter()
        .map(|word| word.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let mean_h = words.iter().map(|word| word.bbox.h as f32).sum::<f32>() / words.len() as f32;

    Some(GroupedLine {
        block_id,
        line_id,
        text,
        bbox,
        font_size: (mean_h * font_ratio).round() as u32,
        word_count: words.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, bbox: (u32, u32, u32, u32), block_id: u32, line_id: u32) -> Word {
        Word {
            text: text.to_string(),
            bbox: BBoxPx {
                x: bbox.0,
                y: bbox.1,
                w: bbox.2,
                h: bbox.3,
            },
            confidence: 90.0,
            line_id,
            block_id,
        }
    }

    #[test]
    fn single_word_becomes_line() {
        let lines = group_words(&[word("Hello", (10, 10, 50, 20), 1, 1)], 0.72);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Hello");
        assert_eq!(
            lines[0].bbox,
            BBoxPx {
                x: 10,
                y: 10,
                w: 50,
                h: 20
            }
        );
        assert_eq!(lines[0].font_size, 14);
    }

    #[test]
    fn words_in_same_line_join_left_to_right() {
        let words = [
            word("B", (20, 0, 10, 10), 1, 1),
            word("A", (0, 0, 10, 10), 1, 1),
        ];
        let lines = group_words(&words, 0.72);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "A B");
        assert_eq!(
            lines[0].bbox,
            BBoxPx {
                x: 0,
                y: 0,
                w: 30,
                h: 10
            }
        );
        assert_eq!(lines[0].word_count, 2);
    }

    #[test]
    fn line_bbox_is_tight_union() {
        let words = [
            word("tall", (5, 2, 20, 30), 2, 1),
            word("low", (40, 10, 15, 25), 2, 1),
            word("mid", (30, 8, 5, 12), 2, 1),
        ];
        let lines = group_words(&words, 0.72);
        let line = &lines[0];
        assert!(words.iter().all(|w| line.bbox.contains(&w.bbox)));
        assert_eq!(line.bbox.x, 5);
        assert_eq!(line.bbox.y, 2);
        assert_eq!(line.bbox.right(), 55);
        assert_eq!(line.bbox.bottom(), 35);
        // mean height (30 + 25 + 12) / 3 = 22.33
        assert_eq!(line.font_size, 16);
    }

    #[test]
    fn grouping_partitions_words() {
        let words = [
            word("a", (0, 0, 5, 5), 1, 1),
            word("b", (0, 10, 5, 5), 1, 2),
            word("c", (10, 0, 5, 5), 1, 1),
            word("d", (0, 0, 5, 5), 2, 1),
            word("e", (10, 10, 5, 5), 1, 2),
        ];
        let lines = group_words(&words, 0.72);
        assert_eq!(lines.len(), 3);
        let total: usize = lines.iter().map(|line| line.word_count).sum();
        assert_eq!(total, words.len());

        let mut tokens: Vec<&str> = lines
            .iter()
            .flat_map(|line| line.text.split(' '))
            .collect();
        tokens.sort_unstable();
        assert_eq!(tokens, ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn lines_are_ordered_by_key() {
        let words = [
            word("third", (0, 0, 5, 5), 3, 1),
            word("second", (0, 0, 5, 5), 1, 2),
            word("first", (0, 0, 5, 5), 1, 1),
        ];
        let keys: Vec<_> = group_words(&words, 0.72)
            .into_iter()
            .map(|line| (line.block_id, line.line_id, line.text))
            .collect();
        assert_eq!(
            keys,
            [
                (1, 1, "first".to_string()),
                (1, 2, "second".to_string()),
                (3, 1, "third".to_string()),
            ]
        );
    }

    #[test]
    fn empty_input_yields_no_lines() {
        assert!(group_words(&[], 0.72).is_empty());
    }
}
