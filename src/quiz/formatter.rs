use super::shuffle::{shuffle, shuffled};
use crate::question_source::{
    Category, Dataset, GrammarEntry, NULL_TEXT, RawEntry, VocabEntry,
};
use rand::Rng;
use std::collections::HashSet;

pub const DISTRACTOR_COUNT: usize = 3;
pub const DEFAULT_TRANSLITERATION_CHANCE: f64 = 0.2;
/// Units whose vocabulary may be quizzed on transliteration.
const TRANSLITERATION_UNITS: std::ops::RangeInclusive<u32> = 1..=10;

/// A presentable multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Question {
    pub prompt: String,
    pub correct_answer: String,
    pub answer_options: Vec<String>,
    pub is_vocabulary: bool,
    pub biblical_frequency: Option<u32>,
}

impl Question {
    pub fn is_correct(&self, selected: &str) -> bool {
        selected == self.correct_answer
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormatterOptions {
    /// Probability that an early-unit vocabulary entry also offers its transliteration as a header.
    pub transliteration_chance: f64,
}

impl Default for FormatterOptions {
    fn default() -> Self {
        Self {
            transliteration_chance: DEFAULT_TRANSLITERATION_CHANCE,
        }
    }
}

impl FormatterOptions {
    pub fn from_percent(percent: u8) -> Self {
        Self {
            transliteration_chance: f64::from(percent.min(100)) / 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VocabHeader {
    Translation,
    Transliteration,
}

impl VocabHeader {
    fn label(self) -> &'static str {
        match self {
            Self::Translation => "Translation",
            Self::Transliteration => "Transliteration",
        }
    }

    fn value(self, entry: &VocabEntry) -> &str {
        match self {
            Self::Translation => &entry.translation,
            Self::Transliteration => &entry.transliteration,
        }
    }
}

/// Build a question from one dataset record. Returns `None` when the record does not
/// belong to `category`.
pub fn format_question<R: Rng + ?Sized>(
    entry: RawEntry<'_>,
    category: Category,
    dataset: &Dataset,
    options: &FormatterOptions,
    rng: &mut R,
) -> Option<Question> {
    match (category, entry) {
        (Category::Grammar, RawEntry::Grammar(grammar)) => Some(format_grammar(grammar, rng)),
        (Category::Vocab, RawEntry::Vocab(vocab)) => Some(format_vocab(
            vocab,
            dataset.vocab_entries(),
            options,
            rng,
        )),
        _ => None,
    }
}

fn format_grammar<R: Rng + ?Sized>(entry: &GrammarEntry, rng: &mut R) -> Question {
    let mut answer_options = Vec::with_capacity(entry.incorrect_answers.len() + 1);
    answer_options.push(entry.correct_answer.clone());
    answer_options.extend(entry.incorrect_answers.iter().cloned());
    shuffle(&mut answer_options, rng);
    Question {
        prompt: entry.question.clone(),
        correct_answer: entry.correct_answer.clone(),
        answer_options,
        is_vocabulary: false,
        biblical_frequency: None,
    }
}

fn format_vocab<R: Rng + ?Sized>(
    entry: &VocabEntry,
    pool: &[VocabEntry],
    options: &FormatterOptions,
    rng: &mut R,
) -> Question {
    let mut header = choose_header(entry, options, rng);
    if header.value(entry) == NULL_TEXT {
        header = VocabHeader::Translation;
    }
    let correct_answer = header.value(entry).to_string();

    let distractors = sample_distractors(header, &correct_answer, pool, rng);
    let mut answer_options = shuffled(&distractors, rng);
    let position = rng.random_range(0..=DISTRACTOR_COUNT);
    answer_options.insert(position, correct_answer.clone());

    Question {
        prompt: format!("What is the {} of {}?", header.label(), entry.hebrew),
        correct_answer,
        answer_options,
        is_vocabulary: true,
        biblical_frequency: entry.biblical_frequency,
    }
}

fn choose_header<R: Rng + ?Sized>(
    entry: &VocabEntry,
    options: &FormatterOptions,
    rng: &mut R,
) -> VocabHeader {
    let mut eligible = vec![VocabHeader::Translation];
    let early_unit = entry
        .unit
        .is_some_and(|unit| TRANSLITERATION_UNITS.contains(&unit));
    let chance = options.transliteration_chance.clamp(0.0, 1.0);
    if early_unit && rng.random_bool(chance) {
        eligible.push(VocabHeader::Transliteration);
    }
    eligible[rng.random_range(0..eligible.len())]
}

/// Draw distinct distractors from the dataset with replacement, padding with the correct
/// answer when the dataset cannot supply enough unique values.
fn sample_distractors<R: Rng + ?Sized>(
    header: VocabHeader,
    correct_answer: &str,
    pool: &[VocabEntry],
    rng: &mut R,
) -> Vec<String> {
    let is_candidate =
        |value: &str| !value.is_empty() && value != NULL_TEXT && value != correct_answer;
    let available = pool
        .iter()
        .map(|candidate| header.value(candidate))
        .filter(|value| is_candidate(*value))
        .collect::<HashSet<_>>()
        .len();
    let target = DISTRACTOR_COUNT.min(available);

    let mut seen: HashSet<&str> = HashSet::new();
    let mut distractors = Vec::with_capacity(DISTRACTOR_COUNT);
    while distractors.len() < target {
        let value = header.value(&pool[rng.random_range(0..pool.len())]);
        if is_candidate(value) && seen.insert(value) {
            distractors.push(value.to_string());
        }
    }
    while distractors.len() < DISTRACTOR_COUNT {
        distractors.push(correct_answer.to_string());
    }
    distractors
}
