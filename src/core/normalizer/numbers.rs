//! Spoken English cardinals to digits.
//!
//! Supports: units, teens, tens, hyphenated compounds, "hundred",
//! "thousand"/"million"/"billion" scales and "and" inside a number.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::TextNormalizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberWord {
    Unit(u64),
    Teen(u64),
    Tens(u64),
    Hundred,
    Scale(u64),
}

static NUMBER_WORDS: Lazy<HashMap<&'static str, NumberWord>> = Lazy::new(|| {
    const UNITS: &[&str] = &[
        "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
    ];
    const TEENS: &[&str] = &[
        "ten",
        "eleven",
        "twelve",
        "thirteen",
        "fourteen",
        "fifteen",
        "sixteen",
        "seventeen",
        "eighteen",
        "nineteen",
    ];
    const TENS: &[&str] = &[
        "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
    ];

    let mut words = HashMap::new();
    for (value, word) in UNITS.iter().enumerate() {
        words.insert(*word, NumberWord::Unit(value as u64));
    }
    for (offset, word) in TEENS.iter().enumerate() {
        words.insert(*word, NumberWord::Teen(10 + offset as u64));
    }
    for (offset, word) in TENS.iter().enumerate() {
        words.insert(*word, NumberWord::Tens(20 + 10 * offset as u64));
    }
    words.insert("hundred", NumberWord::Hundred);
    words.insert("thousand", NumberWord::Scale(1_000));
    words.insert("million", NumberWord::Scale(1_000_000));
    words.insert("billion", NumberWord::Scale(1_000_000_000));
    words
});

fn lookup(word: &str) -> Option<NumberWord> {
    NUMBER_WORDS.get(word).copied()
}

/// Split a token into number words, including hyphenated compounds.
fn number_words(token: &str) -> Option<Vec<NumberWord>> {
    let lower = token.to_lowercase();
    if let Some(word) = lookup(&lower) {
        return Some(vec![word]);
    }
    if lower.contains('-') {
        return lower.split('-').map(lookup).collect();
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Last {
    Unit,
    Teen,
    Tens,
    Hundred,
    Scale,
    And,
}

/// One cardinal being assembled from consecutive words.
#[derive(Debug, Default)]
struct Group {
    total: u64,
    current: u64,
    last: Option<Last>,
    smallest_scale: Option<u64>,
    closed: bool,
}

impl Group {
    fn is_empty(&self) -> bool {
        self.last.is_none()
    }

    fn value(&self) -> u64 {
        self.total + self.current
    }

    fn after_boundary(&self) -> bool {
        matches!(self.last, Some(Last::Hundred | Last::Scale | Last::And))
    }

    /// Extend the group with `word`, or return `false` if it starts a new one.
    fn push(&mut self, word: NumberWord) -> bool {
        if self.closed {
            return false;
        }
        if self.is_empty() {
            match word {
                NumberWord::Unit(0) => {
                    self.closed = true;
                    self.last = Some(Last::Unit);
                }
                NumberWord::Unit(n) => {
                    self.current = n;
                    self.last = Some(Last::Unit);
                }
                NumberWord::Teen(n) => {
                    self.current = n;
                    self.last = Some(Last::Teen);
                }
                NumberWord::Tens(n) => {
                    self.current = n;
                    self.last = Some(Last::Tens);
                }
                NumberWord::Hundred => {
                    self.current = 100;
                    self.last = Some(Last::Hundred);
                }
                NumberWord::Scale(scale) => {
                    self.total = scale;
                    self.smallest_scale = Some(scale);
                    self.last = Some(Last::Scale);
                }
            }
            return true;
        }

        match word {
            NumberWord::Unit(0) => false,
            NumberWord::Unit(n) => {
                if self.last == Some(Last::Tens) || self.after_boundary() {
                    self.current += n;
                    self.last = Some(Last::Unit);
                    true
                } else {
                    false
                }
            }
            NumberWord::Teen(n) | NumberWord::Tens(n) => {
                if self.after_boundary() {
                    self.current += n;
                    self.last = Some(if n < 20 { Last::Teen } else { Last::Tens });
                    true
                } else {
                    false
                }
            }
            NumberWord::Hundred => {
                if matches!(self.last, Some(Last::Unit | Last::Teen)) && self.current < 100 {
                    self.current *= 100;
                    self.last = Some(Last::Hundred);
                    true
                } else {
                    false
                }
            }
            NumberWord::Scale(scale) => {
                let fits = self.smallest_scale.is_none_or(|smallest| scale < smallest);
                if self.current > 0 && fits && self.last != Some(Last::And) {
                    self.total += self.current * scale;
                    self.current = 0;
                    self.smallest_scale = Some(scale);
                    self.last = Some(Last::Scale);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// "and" joins only "hundred"/scale to a following unit, teen or tens.
    fn accepts_and(&self, next: Option<NumberWord>) -> bool {
        matches!(self.last, Some(Last::Hundred | Last::Scale))
            && matches!(
                next,
                Some(NumberWord::Unit(1..) | NumberWord::Teen(_) | NumberWord::Tens(_))
            )
    }
}

/// Digit regrouping for English transcripts.
///
/// # Example
/// ```
/// use asr_gateway::core::normalizer::{NumberExtractor, TextNormalizer};
///
/// let (text, mask) = NumberExtractor::new().replace("room twenty three", true);
/// assert_eq!(text, "room 23");
/// assert_eq!(mask, vec![false, true]);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct NumberExtractor;

impl NumberExtractor {
    pub fn new() -> Self {
        Self
    }
}

struct Output {
    tokens: Vec<String>,
    mask: Vec<bool>,
}

impl Output {
    fn word(&mut self, word: &str) {
        self.tokens.push(word.to_string());
        self.mask.push(false);
    }

    fn flush(&mut self, groups: &mut Vec<Group>, apply_regrouping: bool) {
        if groups.is_empty() {
            return;
        }
        if apply_regrouping {
            let digits: String = groups.iter().map(|g| g.value().to_string()).collect();
            self.tokens.push(digits);
            self.mask.push(true);
        } else {
            for group in groups.iter() {
                self.tokens.push(group.value().to_string());
                self.mask.push(true);
            }
        }
        groups.clear();
    }
}

impl TextNormalizer for NumberExtractor {
    fn replace(&self, text: &str, apply_regrouping: bool) -> (String, Vec<bool>) {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let mut out = Output {
            tokens: Vec::with_capacity(tokens.len()),
            mask: Vec::with_capacity(tokens.len()),
        };
        let mut groups: Vec<Group> = Vec::new();

        let mut index = 0;
        while index < tokens.len() {
            let token = tokens[index];

            if token.eq_ignore_ascii_case("and") {
                let next = tokens
                    .get(index + 1)
                    .and_then(|t| number_words(t))
                    .and_then(|words| words.first().copied());
                if let Some(group) = groups.last_mut()
                    && group.accepts_and(next)
                {
                    group.last = Some(Last::And);
                } else {
                    out.flush(&mut groups, apply_regrouping);
                    out.word(token);
                }
                index += 1;
                continue;
            }

            match number_words(token) {
                Some(words) => {
                    for word in words {
                        let extended = groups.last_mut().is_some_and(|g| g.push(word));
                        if !extended {
                            let mut group = Group::default();
                            group.push(word);
                            groups.push(group);
                        }
                    }
                }
                None => {
                    out.flush(&mut groups, apply_regrouping);
                    out.word(token);
                }
            }
            index += 1;
        }
        out.flush(&mut groups, apply_regrouping);

        (out.tokens.join(" "), out.mask)
    }
}
