//! Structured-record extraction from recognized page text.
//!
//! Electoral roll pages carry voter entries as labeled fields:
//!
//! ```text
//! নাম : <voter name>
//! পিতার নাম : <father's name>      (or স্বামীর নাম : <husband's name>)
//! ```
//!
//! Entries are separated by blank lines. A block yields a record only when
//! both the name field and one guardian field are present; the two guardian
//! labels are not distinguished downstream.

use once_cell::sync::Lazy;
use regex::Regex;

use super::matching::similarity_ratio;
use crate::types::{BoundingBox, OcrWord, VoterInfo};

/// Minimum word-level similarity for an OCR word to be claimed by a field
/// token during box attachment.
const WORD_MATCH_MIN_SCORE: f64 = 70.0;

// Captures are lazy and bounded at 200 chars so adversarial OCR noise cannot
// trigger catastrophic backtracking.
static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"নাম\s*[:：]\s*(.{1,200}?)(?:\n|$)").expect("name pattern is valid")
});

static GUARDIAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:পিতার নাম|স্বামীর নাম)\s*[:：]\s*(.{1,200}?)(?:\n|$)")
        .expect("guardian pattern is valid")
});

/// Extract voter records from one page of recognized text.
///
/// Blocks with only one recognizable field are silently dropped: partial
/// records are worse than no records for downstream matching.
pub fn extract_voter_blocks(text: &str) -> Vec<VoterInfo> {
    let mut voters = Vec::new();

    for block in text.split("\n\n") {
        let name = find_name(block);
        let father = GUARDIAN_RE.captures(block).map(|c| c[1].trim().to_string());

        match (name, father) {
            (Some(name), Some(father)) => voters.push(VoterInfo::new(name, father)),
            _ => {
                tracing::debug!("block without both fields, skipping");
            }
        }
    }

    voters
}

/// First name-field value whose label is not the tail of a guardian label.
///
/// "পিতার নাম" and "স্বামীর নাম" both end in "নাম", so an unguarded name
/// match can start mid-label and swallow the guardian value. Guardian spans
/// are located first and name matches beginning inside one are skipped.
fn find_name(block: &str) -> Option<String> {
    let guardian_spans: Vec<std::ops::Range<usize>> =
        GUARDIAN_RE.find_iter(block).map(|m| m.range()).collect();

    NAME_RE
        .captures_iter(block)
        .find(|caps| match caps.get(0) {
            Some(m) => !guardian_spans.iter().any(|span| span.contains(&m.start())),
            None => false,
        })
        .map(|caps| caps[1].trim().to_string())
}

/// Extract voter records and attach bounding boxes from word-level OCR output.
///
/// For each record found in the text, field tokens are matched against the
/// OCR word list and the claimed words' boxes are unioned per field. A word
/// may be claimed at most once within a field; reuse across the name and
/// guardian fields of the same record is allowed. When no word clears the
/// minimum score the record is kept with box and confidence omitted.
pub fn extract_voter_blocks_with_boxes(text: &str, ocr_words: &[OcrWord]) -> Vec<VoterInfo> {
    let mut voters = Vec::new();

    for mut voter in extract_voter_blocks(text) {
        let name_words = find_field_words(&voter.name, ocr_words);
        let father_words = find_field_words(&voter.father, ocr_words);

        voter.name_bbox = combined_bbox(&name_words, ocr_words);
        voter.father_bbox = combined_bbox(&father_words, ocr_words);

        let claimed: Vec<&OcrWord> = name_words
            .iter()
            .chain(father_words.iter())
            .map(|&i| &ocr_words[i])
            .collect();
        if !claimed.is_empty() {
            let sum: f64 = claimed.iter().map(|w| w.confidence).sum();
            voter.confidence = Some(sum / claimed.len() as f64);
        }

        voters.push(voter);
    }

    voters
}

/// Indices of OCR words claimed by the tokens of one field value.
///
/// Each token claims the unclaimed word with the highest similarity, subject
/// to [`WORD_MATCH_MIN_SCORE`]. Tokens that match nothing claim nothing.
fn find_field_words(field_text: &str, ocr_words: &[OcrWord]) -> Vec<usize> {
    let mut claimed: Vec<usize> = Vec::new();

    if field_text.is_empty() || ocr_words.is_empty() {
        return claimed;
    }

    for token in field_text.split_whitespace() {
        let mut best: Option<(usize, f64)> = None;

        for (idx, word) in ocr_words.iter().enumerate() {
            if claimed.contains(&idx) {
                continue;
            }
            let score = similarity_ratio(token, &word.text);
            if score < WORD_MATCH_MIN_SCORE {
                continue;
            }
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((idx, score));
            }
        }

        if let Some((idx, _)) = best {
            claimed.push(idx);
        }
    }

    claimed
}

fn combined_bbox(indices: &[usize], ocr_words: &[OcrWord]) -> Option<BoundingBox> {
    let mut boxes = indices.iter().map(|&i| ocr_words[i].bbox);
    let first = boxes.next()?;
    Some(boxes.fold(first, |acc, b| acc.union(&b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, confidence: f64, left: u32, top: u32) -> OcrWord {
        OcrWord {
            text: text.to_string(),
            confidence,
            bbox: BoundingBox::new(left, top, 40, 12),
        }
    }

    #[test]
    fn test_extract_complete_block() {
        let text = "নাম : রহিম আলী\nপিতার নাম : করিম আলী\n";
        let voters = extract_voter_blocks(text);

        assert_eq!(voters.len(), 1);
        assert_eq!(voters[0].name, "রহিম আলী");
        assert_eq!(voters[0].father, "করিম আলী");
    }

    #[test]
    fn test_extract_husband_label_accepted() {
        let text = "নাম : ফাতেমা বেগম\nস্বামীর নাম : রহিম আলী\n";
        let voters = extract_voter_blocks(text);

        assert_eq!(voters.len(), 1);
        assert_eq!(voters[0].father, "রহিম আলী");
    }

    #[test]
    fn test_extract_name_only_block_dropped() {
        let voters = extract_voter_blocks("নাম : রহিম আলী\n");
        assert!(voters.is_empty());
    }

    #[test]
    fn test_extract_guardian_only_block_dropped() {
        // The guardian label ends in "নাম"; it must not double as a name field.
        assert!(extract_voter_blocks("পিতার নাম : করিম আলী\n").is_empty());
        assert!(extract_voter_blocks("স্বামীর নাম : রহিম আলী\n").is_empty());
    }

    #[test]
    fn test_extract_guardian_line_before_name_line() {
        let text = "পিতার নাম : করিম আলী\nনাম : রহিম আলী\n";
        let voters = extract_voter_blocks(text);

        assert_eq!(voters.len(), 1);
        assert_eq!(voters[0].name, "রহিম আলী");
        assert_eq!(voters[0].father, "করিম আলী");
    }

    #[test]
    fn test_extract_multiple_blocks() {
        let text = "নাম : রহিম আলী\nপিতার নাম : করিম আলী\n\nনাম : কামাল হোসেন\nস্বামীর নাম : জামাল হোসেন\n";
        let voters = extract_voter_blocks(text);

        assert_eq!(voters.len(), 2);
        assert_eq!(voters[0].name, "রহিম আলী");
        assert_eq!(voters[1].name, "কামাল হোসেন");
    }

    #[test]
    fn test_extract_values_trimmed() {
        let text = "নাম :   রহিম আলী  \nপিতার নাম :  করিম আলী \n";
        let voters = extract_voter_blocks(text);

        assert_eq!(voters[0].name, "রহিম আলী");
        assert_eq!(voters[0].father, "করিম আলী");
    }

    #[test]
    fn test_extract_fullwidth_colon() {
        let text = "নাম： রহিম আলী\nপিতার নাম： করিম আলী\n";
        let voters = extract_voter_blocks(text);
        assert_eq!(voters.len(), 1);
    }

    #[test]
    fn test_extract_capture_bounded() {
        // A value longer than the 200-char cap cannot reach its line end,
        // so the field does not match and the block is dropped.
        let long_value = "ক".repeat(500);
        let text = format!("নাম : রহিম\nপিতার নাম : {}\n", long_value);
        assert!(extract_voter_blocks(&text).is_empty());

        let ok_value = "ক".repeat(200);
        let text = format!("নাম : রহিম\nপিতার নাম : {}\n", ok_value);
        assert_eq!(extract_voter_blocks(&text).len(), 1);
    }

    #[test]
    fn test_extract_empty_text() {
        assert!(extract_voter_blocks("").is_empty());
    }

    #[test]
    fn test_boxes_attached_and_unioned() {
        let text = "নাম : রহিম আলী\nপিতার নাম : করিম আলী\n";
        let words = vec![
            word("নাম", 96.0, 0, 0),
            word("রহিম", 92.0, 60, 0),
            word("আলী", 90.0, 110, 0),
            word("করিম", 88.0, 60, 20),
        ];

        let voters = extract_voter_blocks_with_boxes(text, &words);
        assert_eq!(voters.len(), 1);

        let name_bbox = voters[0].name_bbox.expect("name bbox attached");
        assert_eq!(name_bbox.left, 60);
        assert_eq!(name_bbox.right(), 150);

        let confidence = voters[0].confidence.expect("confidence attached");
        // রহিম (92) + আলী (90) for the name, করিম (88) + আলী (90) for the father.
        assert!((confidence - 90.0).abs() < 0.01);
    }

    #[test]
    fn test_no_word_reuse_within_field() {
        // Two identical tokens in one field must claim two distinct words.
        let text = "নাম : রহিম রহিম\nপিতার নাম : করিম\n";
        let words = vec![
            word("রহিম", 95.0, 0, 0),
            word("রহিম", 85.0, 60, 0),
            word("করিম", 90.0, 0, 20),
        ];

        let voters = extract_voter_blocks_with_boxes(text, &words);
        let bbox = voters[0].name_bbox.expect("bbox");
        // Both words claimed: the union spans them.
        assert_eq!(bbox.left, 0);
        assert_eq!(bbox.right(), 100);
    }

    #[test]
    fn test_cross_field_reuse_allowed() {
        // Same word may back both the name and the guardian field.
        let text = "নাম : আলী\nপিতার নাম : আলী\n";
        let words = vec![word("আলী", 80.0, 10, 10)];

        let voters = extract_voter_blocks_with_boxes(text, &words);
        assert!(voters[0].name_bbox.is_some());
        assert!(voters[0].father_bbox.is_some());
    }

    #[test]
    fn test_degraded_provenance_when_no_words_match() {
        let text = "নাম : রহিম আলী\nপিতার নাম : করিম আলী\n";
        let words = vec![word("xyz", 99.0, 0, 0)];

        let voters = extract_voter_blocks_with_boxes(text, &words);
        assert_eq!(voters.len(), 1);
        assert!(voters[0].name_bbox.is_none());
        assert!(voters[0].father_bbox.is_none());
        assert!(voters[0].confidence.is_none());
    }
}
