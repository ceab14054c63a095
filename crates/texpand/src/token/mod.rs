//! Tokens, category codes and the machinery that produces tokens from characters.

mod catcode;
pub mod factory;
pub mod lexer;
pub mod trace;
pub use catcode::{CatCode, CatCodeTable};
pub use factory::TokenFactory;
use std::{fmt::Display, num};
use texpand_stdext::collections::interner;

/// Interned name of a control sequence.
///
/// The representation is opaque so that it can change without affecting consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsName(num::NonZeroU32);

impl CsName {
    #[inline]
    pub fn to_usize(&self) -> usize {
        self.0.get() as usize
    }

    /// Inverse of [CsName::to_usize].
    pub fn from_usize(u: usize) -> Option<CsName> {
        u32::try_from(u).ok().and_then(num::NonZeroU32::new).map(CsName)
    }
}

/// String interner for control sequence names.
pub type CsNameInterner = interner::Interner<CsName>;

impl interner::Key for CsName {
    fn try_from_usize(index: usize) -> Option<Self> {
        num::NonZeroU32::try_from_usize(index).map(CsName)
    }

    fn into_usize(self) -> usize {
        self.0.into_usize()
    }
}

/// Qualifier of control sequences and active characters.
///
/// Two code tokens with the same name in different namespaces are different tokens.
/// Command lookup for a token in a non-default namespace falls back to the default
/// namespace when the token is not defined in its own namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Namespace(u16);

impl Namespace {
    pub const DEFAULT: Namespace = Namespace(0);

    pub fn is_default(&self) -> bool {
        *self == Namespace::DEFAULT
    }

    pub(crate) fn new(index: u16) -> Namespace {
        Namespace(index)
    }

    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

/// The value of a token.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    BeginGroup(char),
    EndGroup(char),
    MathShift(char),
    AlignmentTab(char),
    Parameter(char),
    Superscript(char),
    Subscript(char),
    Space(char),
    Letter(char),
    Other(char),
    CommandRef(CommandRef),
}

/// A token that refers to a command: a control sequence or an active character.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandRef {
    ControlSequence(CsName, Namespace),
    ActiveCharacter(char, Namespace),
}

impl CommandRef {
    pub fn namespace(&self) -> Namespace {
        match self {
            CommandRef::ControlSequence(_, namespace) => *namespace,
            CommandRef::ActiveCharacter(_, namespace) => *namespace,
        }
    }

    /// The same command reference in the default namespace.
    pub fn in_default_namespace(&self) -> CommandRef {
        match *self {
            CommandRef::ControlSequence(name, _) => {
                CommandRef::ControlSequence(name, Namespace::DEFAULT)
            }
            CommandRef::ActiveCharacter(c, _) => CommandRef::ActiveCharacter(c, Namespace::DEFAULT),
        }
    }

    pub fn to_string(&self, cs_name_interner: &CsNameInterner) -> String {
        match self {
            CommandRef::ControlSequence(cs_name, _) => {
                format!("\\{}", cs_name_interner.resolve(*cs_name).unwrap_or_default())
            }
            CommandRef::ActiveCharacter(c, _) => format!("{c}"),
        }
    }
}

impl Value {
    /// Builds the value of a character token.
    ///
    /// Returns [None] for the category codes that never appear on tokens.
    /// Active characters are placed in the default namespace.
    pub fn new(c: char, cat_code: CatCode) -> Option<Value> {
        Some(match cat_code {
            CatCode::BeginGroup => Value::BeginGroup(c),
            CatCode::EndGroup => Value::EndGroup(c),
            CatCode::MathShift => Value::MathShift(c),
            CatCode::AlignmentTab => Value::AlignmentTab(c),
            CatCode::Parameter => Value::Parameter(c),
            CatCode::Superscript => Value::Superscript(c),
            CatCode::Subscript => Value::Subscript(c),
            CatCode::Space => Value::Space(c),
            CatCode::Letter => Value::Letter(c),
            CatCode::Other => Value::Other(c),
            CatCode::Active => {
                Value::CommandRef(CommandRef::ActiveCharacter(c, Namespace::DEFAULT))
            }
            CatCode::Escape
            | CatCode::EndOfLine
            | CatCode::Ignored
            | CatCode::Comment
            | CatCode::Invalid => return None,
        })
    }
}

/// A TeX token.
///
/// Equality ignores the trace key: two tokens are equal if they have the same value.
#[derive(Debug, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    value: Value,
    trace_key: trace::Key,
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

macro_rules! token_constructor {
    ($name: ident, $value: expr) => {
        pub fn $name(c: char, trace_key: trace::Key) -> Token {
            Token {
                value: $value(c),
                trace_key,
            }
        }
    };
}

impl Token {
    token_constructor!(new_begin_group, Value::BeginGroup);
    token_constructor!(new_end_group, Value::EndGroup);
    token_constructor!(new_math_shift, Value::MathShift);
    token_constructor!(new_alignment_tab, Value::AlignmentTab);
    token_constructor!(new_parameter, Value::Parameter);
    token_constructor!(new_superscript, Value::Superscript);
    token_constructor!(new_subscript, Value::Subscript);
    token_constructor!(new_space, Value::Space);
    token_constructor!(new_letter, Value::Letter);
    token_constructor!(new_other, Value::Other);

    pub fn new_active_character(c: char, namespace: Namespace, trace_key: trace::Key) -> Token {
        Token {
            value: Value::CommandRef(CommandRef::ActiveCharacter(c, namespace)),
            trace_key,
        }
    }

    pub fn new_control_sequence(name: CsName, namespace: Namespace, trace_key: trace::Key) -> Token {
        Token {
            value: Value::CommandRef(CommandRef::ControlSequence(name, namespace)),
            trace_key,
        }
    }

    pub fn new_from_value(value: Value, trace_key: trace::Key) -> Token {
        Token { value, trace_key }
    }

    #[inline]
    pub fn value(&self) -> Value {
        self.value
    }

    #[inline]
    pub fn trace_key(&self) -> trace::Key {
        self.trace_key
    }

    #[inline]
    pub fn is_space(&self) -> bool {
        matches!(self.value, Value::Space(_))
    }

    /// The command reference, if this is a code token.
    #[inline]
    pub fn command_ref(&self) -> Option<CommandRef> {
        match self.value {
            Value::CommandRef(command_ref) => Some(command_ref),
            _ => None,
        }
    }

    /// The character of a character token or active character.
    pub fn char(&self) -> Option<char> {
        match self.value {
            Value::BeginGroup(c)
            | Value::EndGroup(c)
            | Value::MathShift(c)
            | Value::AlignmentTab(c)
            | Value::Parameter(c)
            | Value::Superscript(c)
            | Value::Subscript(c)
            | Value::Space(c)
            | Value::Letter(c)
            | Value::Other(c) => Some(c),
            Value::CommandRef(CommandRef::ActiveCharacter(c, _)) => Some(c),
            Value::CommandRef(CommandRef::ControlSequence(..)) => None,
        }
    }

    pub fn cat_code(&self) -> Option<CatCode> {
        Some(match self.value {
            Value::BeginGroup(_) => CatCode::BeginGroup,
            Value::EndGroup(_) => CatCode::EndGroup,
            Value::MathShift(_) => CatCode::MathShift,
            Value::AlignmentTab(_) => CatCode::AlignmentTab,
            Value::Parameter(_) => CatCode::Parameter,
            Value::Superscript(_) => CatCode::Superscript,
            Value::Subscript(_) => CatCode::Subscript,
            Value::Space(_) => CatCode::Space,
            Value::Letter(_) => CatCode::Letter,
            Value::Other(_) => CatCode::Other,
            Value::CommandRef(CommandRef::ActiveCharacter(..)) => CatCode::Active,
            Value::CommandRef(CommandRef::ControlSequence(..)) => return None,
        })
    }
}

enum PendingWhitespace {
    NotStarted,
    None,
    Space,
    Newlines(usize),
}

impl PendingWhitespace {
    fn start(&mut self) {
        *self = PendingWhitespace::None;
    }

    fn add_space(&mut self) {
        if let PendingWhitespace::None = self {
            *self = PendingWhitespace::Space;
        }
    }

    fn add_newline(&mut self) {
        *self = match self {
            PendingWhitespace::NotStarted => PendingWhitespace::NotStarted,
            PendingWhitespace::None | PendingWhitespace::Space => PendingWhitespace::Newlines(1),
            PendingWhitespace::Newlines(n) => PendingWhitespace::Newlines(*n + 1),
        }
    }
}

impl Display for PendingWhitespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PendingWhitespace::NotStarted | PendingWhitespace::None => Ok(()),
            PendingWhitespace::Space => write!(f, " "),
            PendingWhitespace::Newlines(n) => {
                for _ in 0..*n {
                    writeln!(f)?;
                }
                Ok(())
            }
        }
    }
}

/// Writes tokens as text.
///
/// Leading and trailing whitespace is dropped and runs of spaces are collapsed.
/// Control sequences are written with a leading backslash.
pub struct Writer<I> {
    io_writer: I,
    pending_whitespace: PendingWhitespace,
}

impl<I: Default> Default for Writer<I> {
    fn default() -> Self {
        Writer::new(Default::default())
    }
}

impl<I> Writer<I> {
    pub fn new(io_writer: I) -> Self {
        Self {
            io_writer,
            pending_whitespace: PendingWhitespace::NotStarted,
        }
    }

    pub fn take_io_writer(self) -> I {
        self.io_writer
    }
}

impl<I: std::io::Write> Writer<I> {
    pub fn write(&mut self, interner: &CsNameInterner, token: Token) -> Result<(), std::io::Error> {
        match &token.value {
            Value::CommandRef(CommandRef::ControlSequence(s, _)) => {
                write!(
                    self.io_writer,
                    "{}\\{}",
                    self.pending_whitespace,
                    interner.resolve(*s).unwrap_or_default()
                )?;
                self.pending_whitespace.start();
            }
            Value::Space('\n') => self.pending_whitespace.add_newline(),
            Value::Space(_) => self.pending_whitespace.add_space(),
            _ => {
                if let Some(c) = token.char() {
                    write!(self.io_writer, "{}{}", self.pending_whitespace, c)?;
                }
                self.pending_whitespace.start();
            }
        }
        Ok(())
    }

    /// Writes a newline that is not subject to whitespace trimming.
    pub fn write_newline(&mut self) -> Result<(), std::io::Error> {
        writeln!(self.io_writer)?;
        self.pending_whitespace = PendingWhitespace::NotStarted;
        Ok(())
    }
}

/// Writes tokens to a string.
pub fn write_tokens<'a, T>(tokens: T, interner: &CsNameInterner) -> String
where
    T: IntoIterator<Item = &'a Token>,
{
    let mut writer: Writer<Vec<u8>> = Default::default();
    for token in tokens {
        // Writing to a vector cannot fail.
        let _ = writer.write(interner, *token);
    }
    String::from_utf8_lossy(&writer.take_io_writer()).into_owned()
}

/// Writes tokens the way TeX shows token lists in traces: every token is shown,
/// spaces included, and a control sequence made of letters is followed by a space.
pub fn show_tokens<'a, T>(tokens: T, interner: &CsNameInterner) -> String
where
    T: IntoIterator<Item = &'a Token>,
{
    let mut s = String::new();
    for token in tokens {
        match token.value {
            Value::CommandRef(CommandRef::ControlSequence(name, _)) => {
                let name = interner.resolve(name).unwrap_or_default();
                s.push('\\');
                s.push_str(name);
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_alphabetic() => {}
                    _ => s.push(' '),
                }
            }
            _ => {
                if let Some(c) = token.char() {
                    s.push(c);
                }
            }
        }
    }
    s
}
