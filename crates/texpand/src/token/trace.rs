//! Recovering where a token came from.
//!
//! Error messages and locators need the file, line and column of a token.
//! Storing that on every token would make tokens large, so instead each token carries a
//! 32-bit [Key] and the [Tracer] maps keys back to source positions.
//!
//! Whenever source code is added to the input it is registered with
//! [register_source_code](Tracer::register_source_code), which reserves one key per character
//! and returns them as a [KeyRange].
//! The lexer gives the token starting at character `i` the key `range.key(i)`.
//! Tracing a key finds the registration it belongs to; the offset within the range is the
//! character offset within the source.
//!
//! Tokens created by the program rather than read from source (for example `\inaccessible`
//! or the tokens of a string pushed by a primitive) carry [Key::dummy] and trace to an
//! [Origin::Internal] location.
use crate::token::{CommandRef, CsNameInterner, Token, Value};
use std::collections::BTreeMap;
use std::ops::Bound::Included;
use std::path::PathBuf;

/// Key attached to tokens to enable tracing them.
#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Key(u32);

impl Key {
    /// Key for tokens that do not come from registered source code.
    pub fn dummy() -> Key {
        Key(u32::MAX)
    }

    pub fn is_dummy(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Keys reserved for one piece of source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRange {
    start: u32,
    len: u32,
}

impl KeyRange {
    /// Key of the character at the offset.
    ///
    /// Offsets past the end of the range map to the dummy key.
    #[inline]
    pub fn key(&self, offset: usize) -> Key {
        match u32::try_from(offset) {
            Ok(offset) if offset < self.len => Key(self.start + offset),
            _ => Key::dummy(),
        }
    }

    pub fn empty() -> KeyRange {
        KeyRange { start: 0, len: 0 }
    }

    #[cfg(test)]
    pub fn for_testing() -> KeyRange {
        KeyRange {
            start: 0,
            len: u32::MAX - 1,
        }
    }
}

/// Where some source code came from.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Origin {
    File(PathBuf),
    /// A string added to the input under the provided label.
    String(String),
    Terminal,
    /// Tokens created by the interpreter itself.
    Internal,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::File(path) => write!(f, "{}", path.display()),
            Origin::String(label) => write!(f, "{label}"),
            Origin::Terminal => write!(f, "<terminal>"),
            Origin::Internal => write!(f, "<internal>"),
        }
    }
}

/// The result of tracing a token, or the end of the input.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SourceCodeTrace {
    pub origin: Origin,
    /// Content of the line the token came from.
    pub line_content: String,
    /// Starts at 1.
    pub line_number: usize,
    /// Character index within the line where the token starts.
    pub index: usize,
    /// Printable form of the token.
    pub value: String,
    /// The traced token, or [None] for an end of input trace.
    pub token: Option<Token>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct Registration {
    origin: Origin,
    content: String,
}

/// Records registered source code so that tokens can be traced.
#[derive(Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tracer {
    registrations: BTreeMap<u32, Registration>,
    next_key: u32,
    // The most recent source added from outside of TeX code (i.e. not by \input).
    last_external_input: Option<u32>,
}

impl Tracer {
    /// Registers source code and returns the keys for its characters.
    ///
    /// The token is the command that added the source code, or [None] if the source
    /// was added from outside of the TeX code.
    ///
    /// # Panics
    ///
    /// Panics if the total amount of registered source code exceeds 2^32 characters.
    pub fn register_source_code(
        &mut self,
        token: Option<Token>,
        origin: Origin,
        source_code: &str,
    ) -> KeyRange {
        // One extra key for the end of input position.
        let len = match u32::try_from(source_code.chars().count() + 1) {
            Ok(len) if self.next_key.checked_add(len).is_some_and(|l| l < u32::MAX) => len,
            _ => panic!("too much source code registered with the tracer"),
        };
        let range = KeyRange {
            start: self.next_key,
            len,
        };
        self.registrations.insert(
            range.start,
            Registration {
                origin,
                content: source_code.to_string(),
            },
        );
        if token.is_none() {
            self.last_external_input = Some(range.start);
        }
        self.next_key += len;
        range
    }

    /// Returns a trace for the token.
    pub fn trace(&self, token: Token, cs_name_interner: &CsNameInterner) -> SourceCodeTrace {
        let value = printable_value(token, cs_name_interner);
        let key = token.trace_key().0;
        let registration = if token.trace_key().is_dummy() {
            None
        } else {
            self.registrations
                .range((Included(&0), Included(&key)))
                .next_back()
        };
        let (first_key, registration) = match registration {
            None => return internal_trace(value, Some(token)),
            Some((first_key, registration)) => (*first_key, registration),
        };
        let char_offset = (key - first_key) as usize;
        let content = &registration.content;
        let mut line_number = 1;
        let mut byte_line_start = 0;
        let mut char_line_start = 0;
        for (char_index, (byte_index, c)) in content.char_indices().enumerate() {
            if char_index == char_offset {
                break;
            }
            if c == '\n' {
                byte_line_start = byte_index + 1;
                char_line_start = char_index + 1;
                line_number += 1;
            }
        }
        let line_content = content[byte_line_start..]
            .split('\n')
            .next()
            .unwrap_or_default()
            .trim_end_matches('\r')
            .to_string();
        SourceCodeTrace {
            origin: registration.origin.clone(),
            line_content,
            line_number,
            index: char_offset - char_line_start,
            value,
            token: Some(token),
        }
    }

    /// Returns a trace pointing just after the last non-blank line of the most recent
    /// external input.
    pub fn trace_end_of_input(&self) -> SourceCodeTrace {
        let registration = match self
            .last_external_input
            .and_then(|key| self.registrations.get(&key))
        {
            None => return internal_trace(" ".to_string(), None),
            Some(registration) => registration,
        };
        let content = &registration.content;
        let mut line_number = 0;
        let mut last_non_blank = (1, "");
        for line in content.split('\n') {
            line_number += 1;
            let line = line.trim_end();
            if !line.is_empty() {
                last_non_blank = (line_number, line);
            }
        }
        SourceCodeTrace {
            origin: registration.origin.clone(),
            line_content: last_non_blank.1.to_string(),
            line_number: last_non_blank.0,
            index: last_non_blank.1.chars().count(),
            value: " ".to_string(),
            token: None,
        }
    }
}

fn printable_value(token: Token, cs_name_interner: &CsNameInterner) -> String {
    match token.value() {
        Value::CommandRef(CommandRef::ControlSequence(cs_name, _)) => {
            format!["\\{}", cs_name_interner.resolve(cs_name).unwrap_or_default()]
        }
        Value::CommandRef(CommandRef::ActiveCharacter(c, _)) => c.to_string(),
        _ => token.char().map(String::from).unwrap_or_default(),
    }
}

fn internal_trace(value: String, token: Option<Token>) -> SourceCodeTrace {
    SourceCodeTrace {
        origin: Origin::Internal,
        line_content: value.clone(),
        line_number: 1,
        index: 0,
        value,
        token,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Namespace;

    #[test]
    fn one_source_code() {
        let origin = Origin::File("input.tex".into());
        let source_code = "hël\nwor\\cömmand\nx";
        let mut tracer: Tracer = Default::default();
        let mut interner: CsNameInterner = Default::default();
        let command = interner.get_or_intern("cömmand");
        let range = tracer.register_source_code(None, origin.clone(), source_code);
        let tokens = vec![
            Token::new_letter('ë', range.key(1)),
            Token::new_space(' ', range.key(3)),
            Token::new_letter('w', range.key(4)),
            Token::new_control_sequence(command, Namespace::DEFAULT, range.key(7)),
            Token::new_letter('x', range.key(16)),
        ];
        let got: Vec<(usize, String, usize, String)> = tokens
            .iter()
            .map(|token| {
                let trace = tracer.trace(*token, &interner);
                assert_eq!(trace.origin, origin);
                (trace.line_number, trace.line_content, trace.index, trace.value)
            })
            .collect();
        let want = vec![
            (1, "hël".to_string(), 1, "ë".to_string()),
            (1, "hël".to_string(), 3, " ".to_string()),
            (2, "wor\\cömmand".to_string(), 0, "w".to_string()),
            (2, "wor\\cömmand".to_string(), 3, "\\cömmand".to_string()),
            (3, "x".to_string(), 0, "x".to_string()),
        ];
        assert_eq!(got, want);
    }

    #[test]
    fn multiple_source_code() {
        let mut tracer: Tracer = Default::default();
        let interner: CsNameInterner = Default::default();
        let origins = vec![
            Origin::File("a.tex".into()),
            Origin::String("b".into()),
            Origin::Terminal,
        ];
        let mut tokens = vec![];
        for (i, origin) in origins.iter().enumerate() {
            let c = char::from(b'a' + i as u8);
            let range = tracer.register_source_code(None, origin.clone(), &c.to_string());
            tokens.push(Token::new_letter(c, range.key(0)));
        }
        for (token, origin) in tokens.into_iter().zip(origins) {
            let trace = tracer.trace(token, &interner);
            assert_eq!(trace.origin, origin);
            assert_eq!(trace.line_content, token.char().unwrap().to_string());
        }
    }

    #[test]
    fn dummy_key_traces_to_internal() {
        let mut tracer: Tracer = Default::default();
        let mut interner: CsNameInterner = Default::default();
        tracer.register_source_code(None, Origin::Terminal, "abc");
        let name = interner.get_or_intern("inaccessible");
        let token = Token::new_control_sequence(name, Namespace::DEFAULT, Key::dummy());
        let trace = tracer.trace(token, &interner);
        assert_eq!(trace.origin, Origin::Internal);
        assert_eq!(trace.value, "\\inaccessible");
    }

    #[test]
    fn end_of_input_skips_blank_lines() {
        let mut tracer: Tracer = Default::default();
        tracer.register_source_code(None, Origin::Terminal, "first\nsecond  \n\n  \n");
        let trace = tracer.trace_end_of_input();
        assert_eq!(trace.line_number, 2);
        assert_eq!(trace.line_content, "second");
        assert_eq!(trace.index, 6);
        assert_eq!(trace.token, None);
    }

    #[test]
    fn end_of_input_without_source() {
        let tracer: Tracer = Default::default();
        assert_eq!(tracer.trace_end_of_input().origin, Origin::Internal);
    }
}
