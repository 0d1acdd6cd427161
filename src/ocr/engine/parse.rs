use std::collections::HashMap;

use crate::ocr::{BBoxPx, Word};

const WORD_LEVEL: u32 = 5;

/// Reads word rows out of tesseract TSV.
///
/// Tesseract numbers lines per paragraph, so each distinct
/// `(par_num, line_num)` pair inside a block gets its own `line_id`, assigned
/// in reading order starting at 1. Rows with a negative confidence carry no
/// text and are skipped; empty or low-confidence words are kept for the caller
/// to filter.
pub(super) fn parse_tsv_words(tsv: &str) -> Vec<Word> {
    let mut line_ids: HashMap<(u32, u32, u32, u32), u32> = HashMap::new();
    let mut next_line: HashMap<(u32, u32), u32> = HashMap::new();
    let mut words = Vec::new();

    for (idx, row) in tsv.lines().enumerate() {
        if idx == 0 {
            continue;
        }
        let cols = row.split('\t').collect::<Vec<_>>();
        if cols.len() < 12 {
            continue;
        }
        let level: u32 = cols[0].parse().unwrap_or(0);
        if level != WORD_LEVEL {
            continue;
        }
        let conf: f32 = cols[10].trim().parse().unwrap_or(-1.0);
        if conf < 0.0 {
            continue;
        }
        let page_num: u32 = cols[1].parse().unwrap_or(0);
        let block_num: u32 = cols[2].parse().unwrap_or(0);
        let par_num: u32 = cols[3].parse().unwrap_or(0);
        let line_num: u32 = cols[4].parse().unwrap_or(0);
        let left: u32 = cols[6].parse().unwrap_or(0);
        let top: u32 = cols[7].parse().unwrap_or(0);
        let width: u32 = cols[8].parse().unwrap_or(0);
        let height: u32 = cols[9].parse().unwrap_or(0);

        let line_id = *line_ids
            .entry((page_num, block_num, par_num, line_num))
            .or_insert_with(|| {
                let counter = next_line.entry((page_num, block_num)).or_insert(0);
                *counter += 1;
                *counter
            });

        words.push(Word {
            text: cols[11..].join("\t").trim().to_string(),
            bbox: BBoxPx {
                x: left,
                y: top,
                w: width,
                h: height,
            },
            confidence: conf,
            line_id,
            block_id: block_num,
        });
    }

    words
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn tsv(rows: &[&str]) -> String {
        let mut out = HEADER.to_string();
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn keeps_only_word_rows() {
        let input = tsv(&[
            "1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t",
            "2\t1\t1\t0\t0\t0\t10\t10\t200\t40\t-1\t",
            "4\t1\t1\t1\t1\t0\t10\t10\t200\t20\t-1\t",
            "5\t1\t1\t1\t1\t1\t10\t10\t50\t20\t96.5\tHello",
            "5\t1\t1\t1\t1\t2\t70\t10\t60\t20\t91.0\tworld",
        ]);
        let words = parse_tsv_words(&input);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "Hello");
        assert_eq!(
            words[0].bbox,
            BBoxPx {
                x: 10,
                y: 10,
                w: 50,
                h: 20
            }
        );
        assert_eq!(words[0].confidence, 96.5);
        assert_eq!((words[1].block_id, words[1].line_id), (1, 1));
    }

    #[test]
    fn paragraph_lines_get_distinct_ids() {
        let input = tsv(&[
            "5\t1\t1\t1\t1\t1\t0\t0\t10\t10\t90\tfirst",
            "5\t1\t1\t2\t1\t1\t0\t20\t10\t10\t90\tsecond",
            "5\t1\t1\t2\t2\t1\t0\t40\t10\t10\t90\tthird",
            "5\t1\t2\t1\t1\t1\t0\t60\t10\t10\t90\tother",
        ]);
        let ids: Vec<_> = parse_tsv_words(&input)
            .iter()
            .map(|word| (word.block_id, word.line_id))
            .collect();
        assert_eq!(ids, [(1, 1), (1, 2), (1, 3), (2, 1)]);
    }

    #[test]
    fn blank_words_survive_parsing() {
        let input = tsv(&[
            "5\t1\t1\t1\t1\t1\t0\t0\t10\t10\t95\t ",
            "5\t1\t1\t1\t1\t2\t0\t0\t10\t10\t-1\t",
            "5\t1\t1\t1\t1\t3\tbad",
        ]);
        let words = parse_tsv_words(&input);
        assert_eq!(words.len(), 1);
        assert!(words[0].text.is_empty());
    }
}
