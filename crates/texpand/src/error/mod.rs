//! Error types and error display logic.
//!
//! Every fallible operation returns [crate::prelude::Result], whose error type is a boxed [Error].
//! An error is either a root [TexError] or a [PropagatedError] frame wrapping another error.
//! A frame is added each time an error passes out of a command, so the chain of frames is
//! the stack of commands that were running when the error occurred.
//! The innermost frame also records the chain of macro expansions active at the failure site,
//! see [Locator].

use crate::token;
use crate::token::trace;
use crate::vm;
use texpand_stdext::algorithms::spellcheck::{self, CloseWord};

pub mod display;

#[derive(Debug)]
pub enum Error {
    Tex(Box<dyn TexError + 'static>),
    Propagated(PropagatedError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        display::format_error(f, self)
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Wraps an error raised while running the command referred to by the token.
    pub fn new_propagated<S>(
        vm: &vm::VM<S>,
        context: PropagationContext,
        token: token::Token,
        error: Box<Error>,
    ) -> Box<Error> {
        let locators = match *error {
            Error::Tex(_) => vm.locators(),
            Error::Propagated(_) => vec![],
        };
        Box::new(Error::Propagated(PropagatedError {
            context,
            token,
            trace: vm.trace(token),
            locators,
            error,
        }))
    }

    /// Returns the propagation frames, outermost first, and the root error.
    pub fn stack_view(&self) -> (Vec<&PropagatedError>, &dyn TexError) {
        let mut stack: Vec<&PropagatedError> = vec![];
        let mut last = self;
        loop {
            match last {
                Error::Tex(error) => {
                    return (stack, error.as_ref());
                }
                Error::Propagated(propagated) => {
                    stack.push(propagated);
                    last = &propagated.error;
                }
            }
        }
    }

    /// The category of the root error.
    pub fn category(&self) -> Category {
        self.stack_view().1.category()
    }

    /// The macro expansions that were active where the error was raised, innermost first.
    pub fn locators(&self) -> &[Locator] {
        match self.stack_view().0.last() {
            None => &[],
            Some(innermost) => &innermost.locators,
        }
    }
}

impl<T: TexError + 'static> From<T> for Box<Error> {
    fn from(err: T) -> Self {
        Box::new(Error::Tex(Box::new(err)))
    }
}

/// A frame in the error stack.
#[derive(Debug)]
pub struct PropagatedError {
    pub context: PropagationContext,
    pub token: token::Token,
    pub trace: trace::SourceCodeTrace,
    /// Only populated on the innermost frame.
    pub locators: Vec<Locator>,
    pub error: Box<Error>,
}

/// One active macro expansion at the point an error was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    /// Printable name of the macro, e.g. `\foo`.
    pub macro_name: String,
    /// Where the macro was invoked.
    pub invocation: trace::SourceCodeTrace,
}

#[derive(Debug)]
pub enum Kind<'a> {
    Token(&'a trace::SourceCodeTrace),
    EndOfInput(&'a trace::SourceCodeTrace),
    FailedPrecondition,
}

/// Classification of errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// The input ended while something was still being read.
    UnexpectedEndOfInput,
    /// A token did not match what was expected, e.g. a macro's delimiter.
    SyntaxMismatch,
    /// A parameter number in a macro pattern is out of sequence.
    NonConsecutiveParameter,
    /// An `\outer` macro appeared in a macro pattern.
    OuterInPattern,
    /// `\par` appeared in an argument of a macro that is not `\long`.
    RunawayArgument,
    /// A macro body refers to a parameter that does not exist.
    IllegalParameterReference,
    MissingNumber,
    /// An unmatched end group token was found in a macro argument.
    ExtraRightBrace,
    InvalidCatCode,
    UndefinedCommand,
    Other,
}

pub trait TexError: std::fmt::Debug {
    fn kind(&self) -> Kind;

    fn category(&self) -> Category {
        Category::Other
    }

    fn title(&self) -> String;

    fn notes(&self) -> Vec<display::Note> {
        vec![]
    }

    fn source_annotation(&self) -> String {
        TexError::default_source_annotation(self)
    }

    fn default_source_annotation(&self) -> String {
        match TexError::kind(self) {
            Kind::Token(s) => match s.token.and_then(|t| t.char().zip(t.cat_code())) {
                Some((c, code)) => {
                    format!["character token with value {c} and category code {code}"]
                }
                None => "control sequence".to_string(),
            },
            Kind::EndOfInput(_) => "input ended here".into(),
            Kind::FailedPrecondition => {
                "failed precondition error while running this command".into()
            }
        }
    }
}

/// Errors in which the input ended prematurely.
///
/// Implementations only describe what was being done;
/// the trace is added by [vm::TokenStream::next_or_err].
pub trait EndOfInputError: std::fmt::Debug + 'static {
    fn doing(&self) -> String;

    fn notes(&self) -> Vec<String> {
        vec![]
    }
}

#[derive(Debug)]
pub(crate) struct EofError {
    trace: trace::SourceCodeTrace,
    doing: String,
    notes: Vec<String>,
}

impl EofError {
    pub(crate) fn new<E: EndOfInputError>(trace: trace::SourceCodeTrace, err: E) -> Self {
        Self {
            trace,
            doing: err.doing(),
            notes: err.notes(),
        }
    }
}

impl TexError for EofError {
    fn kind(&self) -> Kind {
        Kind::EndOfInput(&self.trace)
    }

    fn category(&self) -> Category {
        Category::UnexpectedEndOfInput
    }

    fn title(&self) -> String {
        format!("unexpected end of input while {}", self.doing)
    }

    fn notes(&self) -> Vec<display::Note> {
        self.notes.iter().map(display::Note::from).collect()
    }
}

#[derive(Debug)]
pub enum PropagationContext {
    Expansion,
    Execution,
}

impl PropagationContext {
    fn action(&self) -> &'static str {
        match self {
            PropagationContext::Expansion => "expanding this command",
            PropagationContext::Execution => "executing this command",
        }
    }
}

#[derive(Debug)]
pub struct SimpleTokenError {
    pub token: token::Token,
    pub trace: trace::SourceCodeTrace,
    pub title: String,
    pub category: Category,
}

impl SimpleTokenError {
    pub fn new<S, T: AsRef<str>>(vm: &vm::VM<S>, token: token::Token, title: T) -> SimpleTokenError {
        SimpleTokenError {
            token,
            trace: vm.trace(token),
            title: title.as_ref().into(),
            category: Category::Other,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }
}

impl TexError for SimpleTokenError {
    fn kind(&self) -> Kind {
        Kind::Token(&self.trace)
    }

    fn category(&self) -> Category {
        self.category
    }

    fn title(&self) -> String {
        self.title.clone()
    }
}

#[derive(Debug)]
pub struct SimpleFailedPreconditionError {
    pub title: String,
    pub text_notes: Vec<String>,
}

impl SimpleFailedPreconditionError {
    pub fn new<T: AsRef<str>>(title: T) -> Self {
        Self {
            title: title.as_ref().into(),
            text_notes: vec![],
        }
    }

    pub fn with_note<T: Into<String>>(mut self, note: T) -> Self {
        self.text_notes.push(note.into());
        self
    }
}

impl TexError for SimpleFailedPreconditionError {
    fn kind(&self) -> Kind {
        Kind::FailedPrecondition
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn notes(&self) -> Vec<display::Note> {
        self.text_notes.iter().map(display::Note::from).collect()
    }
}

#[derive(Debug)]
pub struct UndefinedCommandError {
    pub trace: trace::SourceCodeTrace,
    pub close_names: Vec<CloseWord>,
}

impl UndefinedCommandError {
    pub fn new<S>(vm: &vm::VM<S>, token: token::Token) -> UndefinedCommandError {
        let trace = vm.trace(token);
        let close_names = match token.value() {
            token::Value::CommandRef(token::CommandRef::ControlSequence(..)) => {
                let name = trace.value.trim_start_matches('\\');
                spellcheck::find_close_words(&vm.control_sequence_names(), name)
            }
            _ => vec![],
        };
        UndefinedCommandError { trace, close_names }
    }
}

impl TexError for UndefinedCommandError {
    fn kind(&self) -> Kind {
        Kind::Token(&self.trace)
    }

    fn category(&self) -> Category {
        Category::UndefinedCommand
    }

    fn title(&self) -> String {
        format!["undefined control sequence {}", &self.trace.value]
    }

    fn notes(&self) -> Vec<display::Note> {
        use texpand_stdext::color::Colorize;
        match self.close_names.first() {
            None => vec![],
            Some(close_name) => {
                vec![format!["did you mean \\{}?", close_name.word.as_str().bold()].into()]
            }
        }
    }
}
