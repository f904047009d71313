use std::collections::HashSet;

use icu_normalizer::DecomposingNormalizerBorrowed;
use serde::{Deserialize, Serialize};

use crate::engine::topic::canonical_key;

pub const NEUTRAL_SCORE: f64 = 0.5;

const COMPREHENSION_BASE: f64 = 0.3;
const CURIOSITY_BASE: f64 = 0.2;
const CONFIDENCE_BASE: f64 = 0.45;
const GARBLED_COMPREHENSION_CAP: f64 = 0.15;
const FULL_LENGTH_WORDS: f64 = 20.0;
const CONFIDENT_LENGTH_WORDS: f64 = 50.0;
const MAX_WORD_LEN: usize = 20;

const UNDERSTANDING_MARKERS: &[&str] = &[
    "understand",
    "understood",
    "makes sense",
    "i see",
    "got it",
    "clear",
    "know",
    "learned",
    "because",
    "means",
];

const HEDGE_MARKERS: &[&str] = &[
    "i think",
    "maybe",
    "probably",
    "seems",
    "guess",
    "not sure",
    "might",
    "perhaps",
    "kind of",
    "sort of",
    "i believe",
];

const CONFUSION_MARKERS: &[&str] = &[
    "confused",
    "confusing",
    "don't understand",
    "dont understand",
    "do not understand",
    "don't get it",
    "don't know",
    "dont know",
    "not clear",
    "no idea",
    "lost",
    "help",
    "hard",
    "difficult",
    "huh",
];

const CURIOSITY_MARKERS: &[&str] = &[
    "why",
    "how",
    "what if",
    "can we",
    "could we",
    "tell me more",
    "interesting",
    "cool",
    "wonder",
    "what happens",
    "curious",
];

const ASSERTIVE_MARKERS: &[&str] = &[
    "definitely",
    "certainly",
    "i know",
    "i'm sure",
    "i am sure",
    "for sure",
    "clearly",
    "obviously",
    "always",
    "the answer is",
];

const NEGATIONS: &[&str] = &[
    "not", "don't", "dont", "doesn't", "didn't", "never", "no", "isn't", "wasn't",
];

// Bare interrogatives that read as "I am lost" rather than as a question.
// Longest first; a span already claimed by one entry is not counted again.
const CONFUSED_QUESTIONS: &[&str] = &["wait what", "what ?", "what?"];

// Base letters after canonical decomposition, for scripts that write vowels.
const VOWELS: &str = "aeiouyæøœəıαεηιουωаеиоуыэюяіїєә";

/// The three [0, 1] scores produced for one learner response.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseScores {
    pub comprehension: f64,
    pub curiosity: f64,
    pub confidence: f64,
}

impl ResponseScores {
    pub fn neutral() -> Self {
        Self {
            comprehension: NEUTRAL_SCORE,
            curiosity: NEUTRAL_SCORE,
            confidence: NEUTRAL_SCORE,
        }
    }

    /// Clamp every score into [0, 1]; non-finite values become neutral.
    pub fn clamped(self) -> Self {
        Self {
            comprehension: clamp_unit(self.comprehension),
            curiosity: clamp_unit(self.curiosity),
            confidence: clamp_unit(self.confidence),
        }
    }

    /// Weighted blend used as the performance score folded into mastery.
    pub fn performance(&self, weights: &PerformanceWeights) -> f64 {
        let total = weights.total();
        if total <= 0.0 {
            return clamp_unit(self.comprehension);
        }
        clamp_unit(
            (self.comprehension * weights.comprehension
                + self.curiosity * weights.curiosity
                + self.confidence * weights.confidence)
                / total,
        )
    }
}

impl Default for ResponseScores {
    fn default() -> Self {
        Self::neutral()
    }
}

pub fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        NEUTRAL_SCORE
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceWeights {
    pub comprehension: f64,
    pub curiosity: f64,
    pub confidence: f64,
}

impl PerformanceWeights {
    pub fn total(&self) -> f64 {
        self.comprehension.max(0.0) + self.curiosity.max(0.0) + self.confidence.max(0.0)
    }
}

impl Default for PerformanceWeights {
    fn default() -> Self {
        Self {
            comprehension: 1.0,
            curiosity: 0.0,
            confidence: 0.0,
        }
    }
}

/// Extra information about the response's setting.
#[derive(Clone, Debug, Default)]
pub struct AssessmentContext {
    pub topic: Option<String>,
    /// Domain terms whose use signals understanding of the topic.
    pub vocabulary: Vec<String>,
}

impl AssessmentContext {
    pub fn for_topic(topic: &str) -> Self {
        Self {
            topic: Some(topic.to_string()),
            vocabulary: Vec::new(),
        }
    }

    pub fn with_vocabulary<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vocabulary.extend(terms.into_iter().map(Into::into));
        self
    }

    fn vocabulary_terms(&self) -> Vec<Vec<String>> {
        let mut terms: Vec<Vec<String>> = self
            .vocabulary
            .iter()
            .map(|t| tokenize(&canonical_key(t)))
            .filter(|t| !t.is_empty())
            .collect();
        if let Some(topic) = &self.topic {
            for word in tokenize(&canonical_key(topic)) {
                if word.chars().count() > 3 {
                    terms.push(vec![word]);
                }
            }
        }
        terms
    }
}

/// Raw lexical counts behind a set of scores.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Signals {
    pub words: usize,
    pub unique_words: usize,
    pub recognizable_words: usize,
    pub sentences: usize,
    pub questions: usize,
    pub complete_statements: usize,
    pub question_marks: usize,
    pub understanding: usize,
    pub hedges: usize,
    pub confusion: usize,
    pub curiosity: usize,
    pub assertive: usize,
    pub vocabulary: usize,
}

impl Signals {
    pub fn extract(text: &str, context: &AssessmentContext) -> Self {
        let lower = text.to_lowercase().replace('\u{2019}', "'");
        let tokens = tokenize(&lower);
        let sentences = split_sentences(&lower);

        let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
        let recognizable = tokens.iter().filter(|t| looks_like_word(t)).count();

        let questions = sentences.iter().filter(|s| s.interrogative).count();
        let complete_statements = sentences
            .iter()
            .filter(|s| !s.interrogative && s.words >= 3)
            .count();

        let confused_questions = count_spans(&lower, CONFUSED_QUESTIONS);

        let vocabulary = context
            .vocabulary_terms()
            .iter()
            .map(|term| count_phrase(&tokens, term))
            .sum();

        Self {
            words: tokens.len(),
            unique_words: unique.len(),
            recognizable_words: recognizable,
            sentences: sentences.len(),
            questions,
            complete_statements,
            question_marks: lower.matches('?').count(),
            understanding: count_unnegated(&tokens, UNDERSTANDING_MARKERS),
            hedges: count_markers(&tokens, HEDGE_MARKERS),
            confusion: count_markers(&tokens, CONFUSION_MARKERS) + confused_questions,
            curiosity: count_markers(&tokens, CURIOSITY_MARKERS),
            assertive: count_markers(&tokens, ASSERTIVE_MARKERS),
            vocabulary,
        }
    }

    fn declarative_ratio(&self) -> f64 {
        if self.sentences == 0 {
            return 0.0;
        }
        (self.sentences - self.questions) as f64 / self.sentences as f64
    }

    fn question_ratio(&self) -> f64 {
        if self.sentences == 0 {
            return 0.0;
        }
        self.questions as f64 / self.sentences as f64
    }

    fn is_garbled(&self) -> bool {
        self.words == 0 || (self.recognizable_words as f64) < self.words as f64 * 0.5
    }
}

/// Rule-based scorer for free-text learner responses.
///
/// Pure: the same text and context always produce the same scores.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResponseAnalyzer;

impl ResponseAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn assess(&self, text: &str, context: &AssessmentContext) -> ResponseScores {
        if text.trim().is_empty() {
            return ResponseScores::neutral();
        }
        let signals = Signals::extract(text, context);
        Self::score(&signals)
    }

    pub fn score(signals: &Signals) -> ResponseScores {
        ResponseScores {
            comprehension: Self::comprehension(signals),
            curiosity: Self::curiosity(signals),
            confidence: Self::confidence(signals),
        }
        .clamped()
    }

    fn comprehension(s: &Signals) -> f64 {
        let length = (s.words as f64).min(FULL_LENGTH_WORDS) / FULL_LENGTH_WORDS;
        let diversity = if s.words > 0 {
            s.unique_words as f64 / s.words as f64
        } else {
            0.0
        };
        let structure = if s.complete_statements > 0 { 0.05 } else { 0.0 };

        let score = COMPREHENSION_BASE + 0.2 * s.understanding.min(3) as f64
            - 0.05 * s.hedges.min(3) as f64
            - 0.2 * s.confusion as f64
            + 0.1 * s.declarative_ratio()
            + structure
            + 0.15 * length
            + 0.1 * diversity
            + 0.1 * s.vocabulary.min(2) as f64;

        if s.is_garbled() {
            score.min(GARBLED_COMPREHENSION_CAP)
        } else {
            score
        }
    }

    fn curiosity(s: &Signals) -> f64 {
        let mut score = CURIOSITY_BASE
            + 0.15 * s.curiosity.min(4) as f64
            + 0.3 * s.question_ratio();
        if s.question_marks > 2 {
            score += 0.2;
        }
        score
    }

    fn confidence(s: &Signals) -> f64 {
        let length = (s.words as f64).min(CONFIDENT_LENGTH_WORDS) / CONFIDENT_LENGTH_WORDS;
        let mut score = CONFIDENCE_BASE + 0.1 * s.assertive.min(3) as f64
            - 0.12 * s.hedges.min(3) as f64
            - 0.1 * s.confusion.min(3) as f64
            + 0.1 * s.declarative_ratio()
            + 0.2 * length;
        if s.question_marks > 2 {
            score *= 0.8;
        }
        score
    }
}

struct Sentence {
    words: usize,
    interrogative: bool,
}

fn split_sentences(text: &str) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if matches!(ch, '.' | '!' | '?') {
            push_sentence(&mut sentences, &current, ch == '?');
            current.clear();
        } else {
            current.push(ch);
        }
    }
    push_sentence(&mut sentences, &current, false);
    sentences
}

fn push_sentence(out: &mut Vec<Sentence>, raw: &str, interrogative: bool) {
    let words = tokenize(raw).len();
    if words > 0 {
        out.push(Sentence {
            words,
            interrogative,
        });
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Heuristic word check.
///
/// Tokens in Latin, Greek or Cyrillic script need a vowel after stripping
/// diacritics. Other scripts only need letters. A run of one repeated
/// character ("ñññ", "zzzz") never counts.
fn looks_like_word(token: &str) -> bool {
    if token.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    let len = token.chars().count();
    if len > MAX_WORD_LEN {
        return false;
    }
    let first = token.chars().next();
    if len >= 3 && token.chars().all(|c| Some(c) == first) {
        return false;
    }

    let base = DecomposingNormalizerBorrowed::new_nfd().normalize(token);
    let letters: Vec<char> = base.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.is_empty() {
        return false;
    }
    if letters.iter().any(|&c| writes_vowels(c)) {
        letters.iter().any(|&c| VOWELS.contains(c))
    } else {
        true
    }
}

fn writes_vowels(c: char) -> bool {
    matches!(
        c,
        'a'..='z'
            | '\u{00C0}'..='\u{024F}'
            | '\u{0370}'..='\u{03FF}'
            | '\u{1F00}'..='\u{1FFF}'
            | '\u{0400}'..='\u{04FF}'
    )
}

/// Non-overlapping occurrences of `phrases`, earlier entries claiming first.
fn count_spans(text: &str, phrases: &[&str]) -> usize {
    let mut claimed: Vec<(usize, usize)> = Vec::new();
    for phrase in phrases {
        for (start, _) in text.match_indices(phrase) {
            let end = start + phrase.len();
            if claimed.iter().all(|&(s, e)| end <= s || start >= e) {
                claimed.push((start, end));
            }
        }
    }
    claimed.len()
}

fn count_phrase(tokens: &[String], phrase: &[String]) -> usize {
    if phrase.is_empty() || phrase.len() > tokens.len() {
        return 0;
    }
    tokens
        .windows(phrase.len())
        .filter(|w| w.iter().zip(phrase).all(|(a, b)| a == b))
        .count()
}

fn count_markers(tokens: &[String], markers: &[&str]) -> usize {
    markers
        .iter()
        .map(|m| count_phrase(tokens, &tokenize(m)))
        .sum()
}

/// Single-word markers preceded by a negation ("don't understand") do not count.
fn count_unnegated(tokens: &[String], markers: &[&str]) -> usize {
    markers
        .iter()
        .map(|m| {
            let phrase = tokenize(m);
            if phrase.len() != 1 {
                return count_phrase(tokens, &phrase);
            }
            tokens
                .iter()
                .enumerate()
                .filter(|(i, t)| {
                    **t == phrase[0]
                        && !(*i > 0 && NEGATIONS.contains(&tokens[i - 1].as_str()))
                })
                .count()
        })
        .sum()
}
