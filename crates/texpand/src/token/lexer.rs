//! The lexer, which turns characters into tokens.
//!
//! The lexer is "just in time": it only produces a token when one is requested,
//! and it looks up the category code of each character at the moment it is read.
//! This matters because the token just returned may change category codes.
//! Consider, with plain TeX category codes,
//! ```tex
//! \makeAspace AB
//! ```
//! If `\makeAspace` changes the category of `A` to space, then the `A` must be skipped
//! as part of the whitespace following the control sequence, and the next token is `B`.
//! Lexing the whole line up front would get this wrong.
//!
//! Characters with category ignored or invalid are dropped; this is not an error.
use crate::token::catcode::{CatCode, CatCodeTable};
use crate::token::factory::TokenFactory;
use crate::token::trace;
use crate::token::{Namespace, Token};

/// Source of category codes for the lexer.
pub trait Classifier {
    fn cat_code(&self, c: char) -> CatCode;
}

impl Classifier for CatCodeTable {
    #[inline]
    fn cat_code(&self, c: char) -> CatCode {
        self.classify(c)
    }
}

/// A lexer over owned source code.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    keys: trace::KeyRange,
    trim_next_whitespace: bool,
    // Control sequence names are read into this buffer to avoid an allocation per name.
    buffer: String,
}

impl Lexer {
    pub fn new(source_code: &str, keys: trace::KeyRange) -> Lexer {
        Lexer {
            chars: source_code.chars().collect(),
            pos: 0,
            keys,
            trim_next_whitespace: false,
            buffer: Default::default(),
        }
    }

    /// Returns the next token, or [None] if the source code is exhausted.
    pub fn next<C: Classifier + ?Sized>(
        &mut self,
        classifier: &C,
        factory: &mut TokenFactory,
        namespace: Namespace,
    ) -> Option<Token> {
        while let Some((c, cat_code)) = self.peek_raw(classifier) {
            let key = self.keys.key(self.pos);
            if cat_code == CatCode::Superscript && self.apply_caret_notation(self.pos) {
                continue;
            }
            self.pos += 1;
            let token = match cat_code {
                CatCode::Escape => {
                    let skip_blanks = self.read_control_sequence(classifier);
                    let cs_name = factory.interner_mut().get_or_intern(&self.buffer);
                    self.trim_next_whitespace = skip_blanks;
                    return Some(Token::new_control_sequence(cs_name, namespace, key));
                }
                CatCode::EndOfLine | CatCode::Space => {
                    let num_new_lines = usize::from(cat_code == CatCode::EndOfLine)
                        + self.consume_whitespace(classifier, c);
                    if num_new_lines >= 2 {
                        factory.par(key)
                    } else if self.trim_next_whitespace {
                        continue;
                    } else {
                        factory.space(key)
                    }
                }
                CatCode::Comment => {
                    while let Some((_, cat_code)) = self.peek_raw(classifier) {
                        if cat_code == CatCode::EndOfLine {
                            break;
                        }
                        self.pos += 1;
                    }
                    self.trim_next_whitespace = true;
                    continue;
                }
                CatCode::Ignored | CatCode::Invalid => continue,
                _ => match factory.create(cat_code, c, namespace, key) {
                    Ok(Some(token)) => token,
                    _ => continue,
                },
            };
            self.trim_next_whitespace = false;
            return Some(token);
        }
        None
    }

    /// Returns whether all of the source code has been read.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Returns whether the lexer is at the end of a line or the end of the input.
    pub fn is_eol(&self) -> bool {
        match self.chars.get(self.pos) {
            None => true,
            Some(c) => *c == '\n' || *c == '\r',
        }
    }

    /// Discards the rest of the source code.
    pub fn truncate(&mut self) {
        self.pos = self.chars.len();
    }

    /// Reads a control sequence name into the buffer.
    ///
    /// Returns whether whitespace after the control sequence should be skipped:
    /// true after a name made of letters, a control space, or the empty name at the end
    /// of the input.
    fn read_control_sequence<C: Classifier + ?Sized>(&mut self, classifier: &C) -> bool {
        self.buffer.clear();
        let (first, cat_code) = loop {
            let (c, cat_code) = match self.peek_raw(classifier) {
                None => return true,
                Some(raw) => raw,
            };
            if cat_code == CatCode::Superscript && self.apply_caret_notation(self.pos) {
                continue;
            }
            self.pos += 1;
            break (c, cat_code);
        };
        self.buffer.push(first);
        if cat_code != CatCode::Letter {
            return cat_code == CatCode::Space;
        }
        while let Some((c, cat_code)) = self.peek_raw(classifier) {
            if cat_code == CatCode::Letter {
                self.buffer.push(c);
                self.pos += 1;
            } else if cat_code == CatCode::Superscript && self.apply_caret_notation(self.pos) {
                continue;
            } else {
                break;
            }
        }
        true
    }

    /// Consumes whitespace and returns the number of line breaks consumed.
    ///
    /// A `\r\n` pair counts as one line break.
    fn consume_whitespace<C: Classifier + ?Sized>(&mut self, classifier: &C, mut prev: char) -> usize {
        let mut num_new_lines = 0;
        while let Some((c, cat_code)) = self.peek_raw(classifier) {
            match cat_code {
                CatCode::EndOfLine if !(prev == '\r' && c == '\n') => num_new_lines += 1,
                CatCode::EndOfLine | CatCode::Space => {}
                _ => break,
            }
            prev = c;
            self.pos += 1;
        }
        num_new_lines
    }

    #[inline]
    fn peek_raw<C: Classifier + ?Sized>(&self, classifier: &C) -> Option<(char, CatCode)> {
        let c = *self.chars.get(self.pos)?;
        Some((c, classifier.cat_code(c)))
    }

    /// Applies `^^` notation if the characters at `at` are two identical superscript
    /// characters followed by an ASCII character.
    ///
    /// On success the two superscript characters are consumed and the third character is
    /// replaced by the character whose code differs from it by 64.
    fn apply_caret_notation(&mut self, at: usize) -> bool {
        let (first, second, third) = match (
            self.chars.get(at),
            self.chars.get(at + 1),
            self.chars.get(at + 2),
        ) {
            (Some(a), Some(b), Some(c)) => (*a, *b, *c),
            // At the end of the input the characters are left alone, as in TeX.
            _ => return false,
        };
        if first != second || !third.is_ascii() {
            return false;
        }
        let u = third as u8;
        let m = if u < 0x40 { u + 0x40 } else { u - 0x40 };
        self.chars[at + 2] = char::from(m);
        self.pos = at + 2;
        true
    }
}
