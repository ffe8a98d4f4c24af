//! Identifier case conversion.
//!
//! A single left-to-right automaton renames identifiers between lower, snake,
//! camel and Pascal forms. Runs of capitals are treated as acronyms: every
//! letter of the run stays in the current word except the last one, which
//! starts the next word when a lowercase letter follows it. This splits
//! `HTTPServer` into `Http` + `Server` rather than `H` + `T` + ... .
//!
//! ```
//! use protohelp_sdk::case;
//!
//! assert_eq!(case::pascal("HTTPServer"), "HttpServer");
//! assert_eq!(case::camel("user_id"), "userId");
//! assert_eq!(case::snake("JSONPayloadV2"), "json_payload_v2");
//! ```

/// A pure character mapping used by a [`CaseTranslator`].
pub type CharMap = fn(char) -> char;

/// Describes how each class of letter is rewritten and what is inserted
/// between words.
#[derive(Debug, Clone, Copy)]
pub struct CaseTranslator {
    /// Applied to the very first word character of the identifier.
    pub first_letter: CharMap,
    /// Applied to every letter that continues a word.
    pub letter_in_word: CharMap,
    /// Applied to the first letter of every word after the first.
    pub first_letter_of_word: CharMap,
    /// Emitted before every word after the first.
    pub separator: Option<char>,
}

impl CaseTranslator {
    /// Lowercases everything, joining words with `separator` when given.
    pub const fn lower(separator: Option<char>) -> Self {
        Self {
            first_letter: to_lower,
            letter_in_word: to_lower,
            first_letter_of_word: to_lower,
            separator,
        }
    }

    /// `lowerCamelCase`.
    pub const fn camel() -> Self {
        Self {
            first_letter: to_lower,
            letter_in_word: to_lower,
            first_letter_of_word: to_upper,
            separator: None,
        }
    }

    /// `PascalCase`.
    pub const fn pascal() -> Self {
        Self {
            first_letter: to_upper,
            letter_in_word: to_lower,
            first_letter_of_word: to_upper,
            separator: None,
        }
    }
}

/// Convert `input` using `translator`.
pub fn convert(input: &str, translator: &CaseTranslator) -> String {
    let mut automaton = Automaton::new(translator, input.len());
    for c in input.chars() {
        automaton.feed(c);
    }
    automaton.finish()
}

/// Lowercase every word, joining them with `separator` when present.
pub fn lower(input: &str, separator: Option<char>) -> String {
    convert(input, &CaseTranslator::lower(separator))
}

/// `snake_case`.
pub fn snake(input: &str) -> String {
    lower(input, Some('_'))
}

/// `lowerCamelCase`.
pub fn camel(input: &str) -> String {
    convert(input, &CaseTranslator::camel())
}

/// `PascalCase`.
pub fn pascal(input: &str) -> String {
    convert(input, &CaseTranslator::pascal())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    /// One capital was just seen at the start of a word.
    ExpectLowerContinuation,
    /// Inside a run of two or more capitals/digits; the last one is buffered.
    InAcronymRun,
    InWord,
    SeekNextWord,
}

struct Automaton<'t> {
    state: State,
    out: String,
    translator: &'t CaseTranslator,
    buffered: Option<char>,
}

impl<'t> Automaton<'t> {
    fn new(translator: &'t CaseTranslator, capacity: usize) -> Self {
        Self {
            state: State::Initial,
            out: String::with_capacity(capacity),
            translator,
            buffered: None,
        }
    }

    fn feed(&mut self, c: char) {
        let is_number = c.is_numeric();
        let is_word = c.is_alphabetic() || is_number;

        match self.state {
            State::Initial => {
                if is_word {
                    self.out.push((self.translator.first_letter)(c));
                    self.state = word_start_state(c);
                }
            }
            State::ExpectLowerContinuation => {
                if !is_word {
                    self.flush_in_word();
                    self.state = State::SeekNextWord;
                } else if c.is_uppercase() {
                    self.buffer(c);
                    self.state = State::InAcronymRun;
                } else {
                    self.flush_in_word();
                    self.letter_in_word(c);
                    self.state = State::InWord;
                }
            }
            State::InAcronymRun => {
                if !is_word {
                    self.flush_in_word();
                    self.state = State::SeekNextWord;
                } else if c.is_uppercase() || is_number {
                    self.buffer(c);
                } else {
                    if let Some(capital) = self.buffered.take() {
                        self.new_word(capital);
                    }
                    self.letter_in_word(c);
                    self.state = State::InWord;
                }
            }
            State::InWord => {
                if !is_word {
                    self.state = State::SeekNextWord;
                } else if c.is_uppercase() {
                    self.new_word(c);
                } else {
                    self.letter_in_word(c);
                }
            }
            State::SeekNextWord => {
                if is_word {
                    self.new_word(c);
                }
            }
        }
    }

    fn finish(mut self) -> String {
        self.flush_in_word();
        self.out
    }

    /// Hold `c` back; whatever was held before it stays in the current word.
    fn buffer(&mut self, c: char) {
        self.flush_in_word();
        self.buffered = Some(c);
    }

    fn flush_in_word(&mut self) {
        if let Some(c) = self.buffered.take() {
            self.letter_in_word(c);
        }
    }

    fn letter_in_word(&mut self, c: char) {
        self.out.push((self.translator.letter_in_word)(c));
    }

    fn new_word(&mut self, c: char) {
        if let Some(separator) = self.translator.separator {
            self.out.push(separator);
        }
        self.out.push((self.translator.first_letter_of_word)(c));
        self.state = word_start_state(c);
    }
}

fn word_start_state(c: char) -> State {
    if c.is_uppercase() {
        State::ExpectLowerContinuation
    } else {
        State::InWord
    }
}

// Multi-character case mappings (e.g. 'ß' -> "SS") leave the character as is.
fn to_lower(c: char) -> char {
    single(c.to_lowercase()).unwrap_or(c)
}

fn to_upper(c: char) -> char {
    single(c.to_uppercase()).unwrap_or(c)
}

fn single(mut chars: impl Iterator<Item = char>) -> Option<char> {
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
