#![cfg(feature = "stream-orch")]

//! Sentence segmentation (spec §4.6a): recognizes sentence boundaries in
//! the streaming LLM output so each complete sentence can be dispatched to
//! TTS as soon as it is known, without waiting for the whole reply.

use once_cell::sync::Lazy;
use regex::Regex;

use super::config::SENTENCE_SAFETY_BREAK_CHARS;

const ABBREVIATIONS: &[&str] = &["dr", "mr", "mrs", "ms", "prof", "inc", "ltd", "corp", "etc", "vs", "e.g", "i.e", "st", "ave"];

static TRAILING_DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.\d*$").expect("valid regex"));

const ASCII_DELIMS: [char; 3] = ['.', '!', '?'];
const FULLWIDTH_DELIMS: [char; 3] = ['。', '！', '？'];

/// True if `last_fragment` (the token/fragment just appended to `buffer`)
/// completes a sentence. `buffer` is the accumulated text since the last
/// dispatched sentence, already including `last_fragment`.
///
/// Per spec §4.6a, the false-positive guards (abbreviation, trailing
/// decimal, short buffer) apply only when the delimiter that fired is an
/// ASCII `.`; `!`, `?`, their full-width counterparts, and newlines always
/// complete a sentence.
#[must_use]
pub fn sentence_complete(buffer: &str, last_fragment: &str) -> bool {
	let Some(delim) = last_fragment.chars().find(|c| ASCII_DELIMS.contains(c) || FULLWIDTH_DELIMS.contains(c) || *c == '\n') else {
		return false;
	};

	if delim != '.' {
		return true;
	}

	!is_false_positive_period(buffer)
}

fn is_false_positive_period(buffer: &str) -> bool {
	let trimmed = buffer.trim();

	if trimmed.chars().count() < 10 {
		return true;
	}

	if TRAILING_DECIMAL.is_match(trimmed) {
		return true;
	}

	let before_period = trimmed.trim_end_matches('.');
	let last_word = before_period.rsplit(|c: char| c.is_whitespace()).next().unwrap_or("").to_lowercase();
	ABBREVIATIONS.contains(&last_word.as_str())
}

/// Long-run safety break (spec §4.6a): if `buffer` has grown past
/// [`SENTENCE_SAFETY_BREAK_CHARS`] without a delimiter ever firing, force a
/// break at the next whitespace boundary. Returns the split point (byte
/// index into `buffer`) if a forced break applies, else `None`.
#[must_use]
pub fn forced_break_point(buffer: &str) -> Option<usize> {
	if buffer.chars().count() <= SENTENCE_SAFETY_BREAK_CHARS {
		return None;
	}
	buffer.char_indices().find(|&(_, c)| c.is_whitespace()).map(|(idx, _)| idx)
}
