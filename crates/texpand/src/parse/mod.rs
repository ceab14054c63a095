//! Logic for parsing elements of the TeX grammar from token streams.
//!
//! This parsing module is based around the [Parsable] trait, which is the most important type in the module.
//! This trait is implemented by Rust types that correspond to elements of the TeX grammar.
//! The trait implementation provides a way to parse grammar elements out of the input stream.
//!
//! The module contains implementations of [Parsable] for tuples where each element is parsable.
//! This allows expressions like `<control sequence><optional equals><number>` to be parsed by one invocation
//!     of [Parsable::parse], in this case on the type `(token::CommandRef, OptionalEquals, i32)`.
//!
//! Finally this module contains functions for special situations: keywords and balanced lists of tokens.

#[macro_use]
mod helpers;

mod equals;
mod keyword;
mod number;
#[cfg(test)]
pub(crate) mod testing;

pub use equals::OptionalEquals;
pub use equals::OptionalEqualsUnexpanded;
pub use keyword::get_keyword;

use crate::error;
use crate::prelude as txl;
use crate::token;
use crate::token::trace;
use crate::traits::*;
use crate::vm;

/// Implementations of this trait are elements of the TeX grammar than can be parsed from a stream of tokens.
pub trait Parsable<S: TexpandState>: Sized {
    /// Parses a value from an input stream.
    ///
    /// This method just delegates to [Parsable::parse_impl].
    #[inline]
    fn parse<I>(input: &mut I) -> txl::Result<Self>
    where
        I: AsMut<vm::ExpandedStream<S>>,
    {
        Parsable::parse_impl(input.as_mut())
    }

    /// Parses a value from the [vm::ExpandedStream].
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self>;
}

/// Error returned when the input does not contain the expected grammar element.
#[derive(Debug)]
pub struct Error {
    pub expected: String,
    pub got: trace::SourceCodeTrace,
    pub got_override: String,
    pub annotation_override: String,
    pub guidance: String,
    pub category: error::Category,
}

impl error::TexError for Error {
    fn kind(&self) -> error::Kind {
        match self.got.token {
            None => error::Kind::EndOfInput(&self.got),
            Some(_) => error::Kind::Token(&self.got),
        }
    }

    fn category(&self) -> error::Category {
        self.category
    }

    fn title(&self) -> String {
        let got = if self.got_override.is_empty() {
            match self.got.token {
                None => "the input ended".to_string(),
                Some(token) => match token.value() {
                    token::Value::Letter(c) => format!["found the letter {c}"],
                    token::Value::Other(c) => format!["found a non-letter character {c}"],
                    _ => match (token.char(), token.cat_code()) {
                        (Some(c), Some(code)) => {
                            format!["found a token with value {c} and category code {code}"]
                        }
                        _ => format!("found the control sequence {}", self.got.value),
                    },
                },
            }
        } else {
            self.got_override.clone()
        };
        format!["expected {}, instead {}", self.expected, got]
    }

    fn notes(&self) -> Vec<error::display::Note> {
        if self.guidance.is_empty() {
            return vec![];
        }
        vec![self.guidance.clone().into()]
    }

    fn source_annotation(&self) -> String {
        if !self.annotation_override.is_empty() {
            return self.annotation_override.clone();
        }
        error::TexError::default_source_annotation(self)
    }
}

impl Error {
    pub fn new<S, T: Into<String>, R: Into<String>>(
        vm: &vm::VM<S>,
        expected: T,
        got: Option<token::Token>,
        guidance: R,
    ) -> Self {
        let (got, category) = match got {
            None => (
                vm.trace_end_of_input(),
                error::Category::UnexpectedEndOfInput,
            ),
            Some(token) => (vm.trace(token), error::Category::SyntaxMismatch),
        };
        Error {
            expected: expected.into(),
            got,
            got_override: "".into(),
            annotation_override: "".into(),
            guidance: guidance.into(),
            category,
        }
    }

    pub fn with_got_override<T: Into<String>>(mut self, got_override: T) -> Self {
        self.got_override = got_override.into();
        self
    }

    pub fn with_annotation_override<T: Into<String>>(mut self, annotation_override: T) -> Self {
        self.annotation_override = annotation_override.into();
        self
    }

    pub fn with_category(mut self, category: error::Category) -> Self {
        self.category = category;
        self
    }
}

macro_rules! generate_tuple_impls {
    ( $first: ident ) => {};
    ( $first: ident, $( $name: ident ),+ ) => {
        generate_tuple_impls![ $( $name ),+];

        impl<S: TexpandState, $first : Parsable<S>, $( $name : Parsable<S> ),+> Parsable<S> for ($first, $( $name ),+) {
            fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
                Ok(($first::parse(input)?, $( $name::parse(input)? ),+))
            }
        }
    };
}

generate_tuple_impls![T1, T2, T3, T4, T5];

const INACCESSIBLE: &str = "inaccessible";

/// Parses a control sequence or active character from the unexpanded input.
///
/// Leading spaces are skipped.
/// If the next token is not a command reference it is pushed back, and the
///     `\inaccessible` control sequence is pushed in front of it.
impl<S: TexpandState> Parsable<S> for token::CommandRef {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        let token = input.unexpanded().next_non_space()?;
        match token {
            None => Err(Error::new(
                input.vm(),
                "a control sequence or active character",
                None,
                "a command must be a control sequence or an active character",
            )
            .into()),
            Some(token) => match token.value() {
                token::Value::CommandRef(command_ref) => Ok(command_ref),
                _ => {
                    let err = Error::new(
                        input.vm(),
                        "a control sequence or active character",
                        Some(token),
                        "a command must be a control sequence or an active character",
                    );
                    let inaccessible = input
                        .token_factory_mut()
                        .control_sequence(INACCESSIBLE, token.trace_key());
                    input.back_all(&[inaccessible, token]);
                    Err(err.into())
                }
            },
        }
    }
}

#[derive(Debug)]
struct ListEndOfInputError;

impl error::EndOfInputError for ListEndOfInputError {
    fn doing(&self) -> String {
        "reading a balanced list of tokens".into()
    }

    fn notes(&self) -> Vec<String> {
        vec!["every begin group token must be matched by an end group token".into()]
    }
}

/// Reads a balanced list of tokens from the unexpanded input.
///
/// The first non-space token must be a begin group token.
/// The returned list does not include the outer braces.
pub fn get_tokens<S: TexpandState>(input: &mut vm::UnexpandedStream<S>) -> txl::Result<Vec<token::Token>> {
    match input.next_non_space()? {
        Some(token) => match token.value() {
            token::Value::BeginGroup(_) => (),
            _ => {
                input.back(token);
                return Err(Error::new(
                    input.vm(),
                    "a begin group token",
                    Some(token),
                    "a list of tokens must be surrounded by braces",
                )
                .into());
            }
        },
        None => {
            return Err(
                error::EofError::new(input.trace_end_of_input(), ListEndOfInputError {}).into(),
            )
        }
    }
    let mut result = Vec::new();
    if !parse_balanced_tokens(input, &mut result)? {
        return Err(error::EofError::new(input.trace_end_of_input(), ListEndOfInputError {}).into());
    }
    Ok(result)
}

/// Parses balanced tokens from the stream.
///
/// The opening begin group token must already have been consumed.
/// The closing end group token is consumed but not added to the result.
/// Returns false if the input ended before balanced tokens completed.
pub fn parse_balanced_tokens<S: vm::TokenStream>(
    stream: &mut S,
    result: &mut Vec<token::Token>,
) -> txl::Result<bool> {
    let mut scope_depth = 0_usize;
    while let Some(token) = stream.next()? {
        match token.value() {
            token::Value::BeginGroup(_) => {
                scope_depth += 1;
            }
            token::Value::EndGroup(_) => {
                if scope_depth == 0 {
                    return Ok(true);
                }
                scope_depth -= 1;
            }
            _ => (),
        }
        result.push(token);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use std::collections::HashMap;

    fn setup(source: &str) -> Box<vm::VM<()>> {
        let mut vm = vm::VM::<()>::new(HashMap::new());
        vm.push_source("main.tex", source);
        vm
    }

    fn cat_code_vm(source: &str) -> Box<vm::VM<State>> {
        let mut vm = vm::VM::<State>::new(HashMap::new());
        vm.push_source("main.tex", source);
        vm
    }

    #[test]
    fn get_tokens_excludes_outer_braces() {
        let mut vm = cat_code_vm("  {a{b}c}d");
        let input = vm::ExecutionInput::new(&mut vm);
        let tokens = get_tokens(input.unexpanded()).unwrap();
        let got = token::write_tokens(&tokens, input.vm().cs_name_interner());
        assert_eq!(got, "a{b}c");
        assert_eq!(
            input.next().unwrap().map(|t| t.value()),
            Some(token::Value::Letter('d'))
        );
    }

    #[test]
    fn get_tokens_end_of_input() {
        let mut vm = cat_code_vm("{a{b}c");
        let input = vm::ExecutionInput::new(&mut vm);
        let err = get_tokens(input.unexpanded()).unwrap_err();
        assert_eq!(err.category(), error::Category::UnexpectedEndOfInput);
    }

    #[test]
    fn get_tokens_no_begin_group() {
        let mut vm = cat_code_vm("a{b}");
        let input = vm::ExecutionInput::new(&mut vm);
        assert!(get_tokens(input.unexpanded()).is_err());
        assert_eq!(
            input.next().unwrap().map(|t| t.value()),
            Some(token::Value::Letter('a'))
        );
    }

    #[test]
    fn command_ref_skips_spaces() {
        let mut vm = setup("   \\a b");
        let input = vm::ExecutionInput::new(&mut vm);
        let command_ref = token::CommandRef::parse(input).unwrap();
        assert_eq!(
            command_ref.to_string(input.vm().cs_name_interner()),
            "\\a"
        );
    }

    #[test]
    fn command_ref_failure_inserts_inaccessible() {
        let mut vm = setup("b");
        let input = vm::ExecutionInput::new(&mut vm);
        let err = token::CommandRef::parse(input).unwrap_err();
        assert_eq!(err.category(), error::Category::SyntaxMismatch);
        let first = input.unexpanded().next().unwrap().unwrap();
        let command_ref = first.command_ref().unwrap();
        assert_eq!(
            command_ref.to_string(input.vm().cs_name_interner()),
            "\\inaccessible"
        );
        assert_eq!(
            input.unexpanded().next().unwrap().map(|t| t.value()),
            Some(token::Value::Letter('b'))
        );
    }

    #[test]
    fn command_ref_end_of_input() {
        let mut vm = setup("  ");
        let input = vm::ExecutionInput::new(&mut vm);
        let err = token::CommandRef::parse(input).unwrap_err();
        assert_eq!(err.category(), error::Category::UnexpectedEndOfInput);
    }

    parse_success_tests![
        (tuple_of_numbers, "1 2", (1_i32, 2_i32)),
        (tuple_with_equals, "= 3 4", (OptionalEquals {}, 3_i32, 4_i32)),
    ];
}
