// SYNOID Reel Scene Splitter
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Turns a raw narration script into ordered scenes. Blank lines separate
// scenes; a script without any is cut into groups of three sentences.

use serde::Serialize;
use tracing::{debug, info};

/// Sentences per scene when the script has no blank-line breaks.
pub const SENTENCES_PER_SCENE: usize = 3;

const MAX_QUERY_WORDS: usize = 6;
const DEFAULT_QUERY: &str = "abstract background";

/// One narration + image unit of the final video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scene {
    /// 0-based playback position
    pub index: usize,
    /// Narration text, trimmed and never empty
    pub text: String,
    /// Stock image search query
    pub query: String,
}

impl Scene {
    pub fn new(index: usize, text: impl Into<String>, topic_keywords: Option<&str>) -> Self {
        let text = text.into();
        let query = derive_query(&text, topic_keywords.unwrap_or(""));
        Self { index, text, query }
    }
}

/// Split a script into scene texts.
///
/// Paragraphs (separated by one or more blank lines) win. A single paragraph
/// is split into sentences and grouped by [`SENTENCES_PER_SCENE`]; the last
/// group keeps whatever is left over instead of being merged backward.
pub fn split_into_scenes(script: &str) -> Vec<String> {
    let script = script.trim();
    if script.is_empty() {
        return Vec::new();
    }

    let paragraphs = split_paragraphs(script);
    if paragraphs.len() > 1 {
        debug!("[SCENES] Using {} paragraphs", paragraphs.len());
        return paragraphs;
    }

    let sentences = split_sentences(script);
    debug!(
        "[SCENES] No blank lines, grouping {} sentences",
        sentences.len()
    );
    sentences
        .chunks(SENTENCES_PER_SCENE)
        .map(|group| group.join(" "))
        .collect()
}

/// Split text after every `.`, `!` or `?` that is followed by whitespace.
/// Text without a terminator is a single sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;

    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() && matches!(prev, Some('.' | '!' | '?')) {
            push_trimmed(&mut sentences, &text[start..idx]);
            start = idx;
        }
        prev = Some(ch);
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

/// Build the scene list for a run, deriving a search query for each scene.
pub fn build_scenes(script: &str, topic_keywords: Option<&str>) -> Vec<Scene> {
    let scenes: Vec<Scene> = split_into_scenes(script)
        .into_iter()
        .enumerate()
        .map(|(index, text)| Scene::new(index, text, topic_keywords))
        .collect();

    info!("[SCENES] Detected {} scene(s)", scenes.len());
    scenes
}

/// Reduce scene text to a short image search query.
///
/// Only ASCII letters, digits and whitespace survive. Fewer than two words
/// means the text is too generic, so the topic keywords are used instead.
pub fn derive_query(text: &str, fallback: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    let words: Vec<&str> = cleaned.split_whitespace().collect();
    let fallback = fallback.trim();

    if words.len() < 2 && !fallback.is_empty() {
        return fallback.to_string();
    }
    if words.is_empty() {
        return DEFAULT_QUERY.to_string();
    }

    words
        .into_iter()
        .take(MAX_QUERY_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

fn split_paragraphs(script: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in script.lines() {
        if line.trim().is_empty() {
            flush_paragraph(&mut paragraphs, &mut current);
        } else {
            current.push(line);
        }
    }
    flush_paragraph(&mut paragraphs, &mut current);

    paragraphs
}

fn flush_paragraph(paragraphs: &mut Vec<String>, current: &mut Vec<&str>) {
    if !current.is_empty() {
        push_trimmed(paragraphs, &current.join("\n"));
        current.clear();
    }
}

fn push_trimmed(out: &mut Vec<String>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        out.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence_counts(scenes: &[String]) -> Vec<usize> {
        scenes.iter().map(|s| split_sentences(s).len()).collect()
    }

    #[test]
    fn test_paragraphs_become_scenes_in_order() {
        let script = "The sun rises over the hills.\nBirds start to sing.\n\nA farmer walks out.\n\n\n\nThe day begins.";
        let scenes = split_into_scenes(script);
        assert_eq!(
            scenes,
            vec![
                "The sun rises over the hills.\nBirds start to sing.",
                "A farmer walks out.",
                "The day begins.",
            ]
        );
    }

    #[test]
    fn test_whitespace_only_lines_separate_paragraphs() {
        let scenes = split_into_scenes("First part.\n   \t\nSecond part.");
        assert_eq!(scenes, vec!["First part.", "Second part."]);
    }

    #[test]
    fn test_crlf_blank_lines() {
        let scenes = split_into_scenes("One.\r\n\r\nTwo.\r\n");
        assert_eq!(scenes, vec!["One.", "Two."]);
    }

    #[test]
    fn test_seven_sentences_group_three_three_one() {
        let script = "One. Two! Three? Four. Five. Six. Seven.";
        let scenes = split_into_scenes(script);
        assert_eq!(scenes.len(), 3);
        assert_eq!(sentence_counts(&scenes), vec![3, 3, 1]);
        assert_eq!(scenes[0], "One. Two! Three?");
        assert_eq!(scenes[2], "Seven.");
    }

    #[test]
    fn test_sentence_groups_are_ceil_of_thirds() {
        for n in 1..=12 {
            let script: Vec<String> = (0..n).map(|i| format!("Sentence number {}.", i)).collect();
            let scenes = split_into_scenes(&script.join(" "));
            assert_eq!(scenes.len(), (n + 2) / 3, "n = {}", n);
            for scene in &scenes {
                let count = split_sentences(scene).len();
                assert!(count >= 1 && count <= SENTENCES_PER_SCENE);
            }
        }
    }

    #[test]
    fn test_remainder_of_two_is_not_merged() {
        let scenes = split_into_scenes("A. B. C. D. E.");
        assert_eq!(sentence_counts(&scenes), vec![3, 2]);
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert!(split_into_scenes("").is_empty());
        assert!(split_into_scenes("   \n\n\t  \n").is_empty());
        assert!(build_scenes(" \n ", Some("space")).is_empty());
    }

    #[test]
    fn test_single_short_sentence() {
        assert_eq!(split_into_scenes("Hello world."), vec!["Hello world."]);
        assert_eq!(split_into_scenes("no terminator here"), vec!["no terminator here"]);
    }

    #[test]
    fn test_trailing_blank_lines_do_not_force_paragraph_mode() {
        let scenes = split_into_scenes("One. Two. Three. Four.\n\n\n");
        assert_eq!(sentence_counts(&scenes), vec![3, 1]);
    }

    #[test]
    fn test_scenes_cover_all_sentences() {
        let script = "Rockets roar. Engines burn hot! Where do we go? To the moon. Then Mars.";
        let scenes = split_into_scenes(script);
        let rejoined = scenes.join(" ");
        assert_eq!(split_sentences(&rejoined), split_sentences(script));
    }

    #[test]
    fn test_split_sentences_keeps_ellipsis_together() {
        let sentences = split_sentences("Wait... what? Yes.");
        assert_eq!(sentences, vec!["Wait...", "what?", "Yes."]);
    }

    #[test]
    fn test_build_scenes_indexes_and_queries() {
        let scenes = build_scenes("Lions hunt at dawn.\n\nWow!", Some("savanna wildlife"));
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].index, 0);
        assert_eq!(scenes[0].query, "Lions hunt at dawn");
        assert_eq!(scenes[1].index, 1);
        assert_eq!(scenes[1].query, "savanna wildlife");
    }

    #[test]
    fn test_derive_query_rules() {
        assert_eq!(
            derive_query("The quick, brown fox jumps over the lazy dog.", ""),
            "The quick brown fox jumps over"
        );
        assert_eq!(derive_query("Don't stop!", ""), "Dont stop");
        assert_eq!(derive_query("Hi.", "ocean"), "ocean");
        assert_eq!(derive_query("Hi.", ""), "Hi");
        assert_eq!(derive_query("!!! ???", ""), DEFAULT_QUERY);
        assert_eq!(derive_query("Café au lait", ""), "Caf au lait");
    }
}
