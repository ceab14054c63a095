use std::path::PathBuf;

use super::{StateClassifier, TexpandState};
use crate::error;
use crate::prelude as txl;
use crate::token::trace;
use crate::token::Token;
use crate::*;

/// A stream of tokens generated on demand.
///
/// In practice all [TokenStreams](TokenStream) in Texpand
/// are either [ExecutionInput], [ExpansionInput], [ExpandedStream] or [UnexpandedStream].
/// This trait exists to allow a generic function to accept any of these types.
///
/// # Note on lazy loading
///
/// The contents of a stream generally cannot be determined in advance.
/// The classic example comes from the following LaTeX snippet:
/// ```tex
/// \makeatletter \do@
/// ```
/// With the default category codes, lexing this all at once gives three tokens:
/// `\makeatletter`, `\do` and an other token `@`.
/// But the first control sequence changes the category of `@` to letter, so the correct
/// input is `\makeatletter` followed by the control sequence `\do@`.
pub trait TokenStream {
    /// The type of the custom state in the VM.
    type S;

    /// Gets the next token in the stream.
    ///
    /// As with iterators, a result of `Ok(None)` indicates that the stream is exhausted.
    fn next(&mut self) -> txl::Result<Option<Token>>;

    /// Pushes a token to the front of the stream, so that it is returned by the next call
    /// to [TokenStream::next].
    fn back(&mut self, token: Token);

    /// Pushes tokens to the front of the stream. The first token is returned first.
    fn back_all(&mut self, tokens: &[Token]);

    /// Arms the one-shot skip spaces flag.
    ///
    /// Space tokens are discarded until the next non-space token is read.
    fn skip_spaces(&mut self);

    /// Returns a reference to the VM.
    fn vm(&self) -> &vm::VM<Self::S>;

    /// Peeks at the next token in the stream without removing it.
    ///
    /// The peek method requires a mutable reference to the stream
    /// because some processing may be needed to determine the next token.
    /// When peeking at an expanded stream, expandable commands in front of the stream
    /// are expanded. This is irreversible.
    fn peek(&mut self) -> txl::Result<Option<Token>> {
        let token = self.next()?;
        if let Some(token) = token {
            self.back(token);
        }
        Ok(token)
    }

    /// Consumes the next token in the stream without returning it.
    fn consume(&mut self) -> txl::Result<()> {
        self.next().map(|_| ())
    }

    /// Gets the next token in the stream, or returns an end of input error.
    fn next_or_err<E: error::EndOfInputError>(&mut self, err: E) -> txl::Result<Token> {
        match self.next()? {
            Some(token) => Ok(token),
            None => Err(error::EofError::new(self.trace_end_of_input(), err).into()),
        }
    }

    /// Gets the next token that is not a space.
    fn next_non_space(&mut self) -> txl::Result<Option<Token>> {
        loop {
            self.skip_spaces();
            match self.next()? {
                Some(token) if token.is_space() => continue,
                other => return Ok(other),
            }
        }
    }

    /// Returns a reference to the commands map.
    #[inline]
    fn commands_map(&self) -> &command::Map<Self::S> {
        &self.vm().commands_map
    }

    /// Returns a reference to the custom state.
    #[inline]
    fn state(&self) -> &Self::S {
        &self.vm().state
    }

    fn trace(&self, token: Token) -> trace::SourceCodeTrace {
        self.vm().trace(token)
    }

    fn trace_end_of_input(&self) -> trace::SourceCodeTrace {
        self.vm().trace_end_of_input()
    }
}

/// A [TokenStream] that performs expansion.
///
/// The unexpanded tokens are retrieved from the unexpanded stream returned by the
/// [unexpanded](ExpandedStream::unexpanded) method.
#[repr(transparent)]
pub struct ExpandedStream<S>(UnexpandedStream<S>);

impl<S> ExpandedStream<S> {
    /// Creates a mutable reference to this type from the [VM](vm::VM) type.
    #[inline]
    pub fn new(vm: &mut vm::VM<S>) -> &mut ExpandedStream<S> {
        unsafe { &mut *(vm as *mut vm::VM<S> as *mut ExpandedStream<S>) }
    }

    /// Returns the underlying unexpanded stream.
    #[inline]
    pub fn unexpanded(&mut self) -> &mut UnexpandedStream<S> {
        &mut self.0
    }

    #[inline]
    pub(crate) fn token_factory_mut(&mut self) -> &mut token::TokenFactory {
        &mut self.0 .0.internal.factory
    }
}

impl<S> std::convert::AsMut<ExpandedStream<S>> for ExpandedStream<S> {
    fn as_mut(&mut self) -> &mut ExpandedStream<S> {
        self
    }
}

impl<S: TexpandState> ExpandedStream<S> {
    /// Expand the next token in the input.
    ///
    /// This method only expands a single token. If, after the expansion, the next token
    /// is expandable it will not be expanded.
    /// Returns whether a token was expanded.
    pub fn expand_once(&mut self) -> txl::Result<bool> {
        stream::expand_once(&mut self.0 .0)
    }
}

impl<S: TexpandState> TokenStream for ExpandedStream<S> {
    type S = S;

    #[inline]
    fn next(&mut self) -> txl::Result<Option<Token>> {
        stream::next_expanded(&mut self.0 .0)
    }

    #[inline]
    fn back(&mut self, token: Token) {
        self.0.back(token)
    }

    #[inline]
    fn back_all(&mut self, tokens: &[Token]) {
        self.0.back_all(tokens)
    }

    #[inline]
    fn skip_spaces(&mut self) {
        self.0.skip_spaces()
    }

    #[inline]
    fn vm(&self) -> &vm::VM<Self::S> {
        &self.0 .0
    }
}

/// Stream that returns input tokens without performing expansion.
///
/// The unexpanded stream is used when reading tokens without performing expansion;
/// e.g., when reading the replacement text for a macro defined using `\def`.
#[repr(transparent)]
pub struct UnexpandedStream<S>(vm::VM<S>);

impl<S> UnexpandedStream<S> {
    /// Creates a mutable reference to this type from the [VM](vm::VM) type.
    #[inline]
    pub fn new(vm: &mut vm::VM<S>) -> &mut UnexpandedStream<S> {
        unsafe { &mut *(vm as *mut vm::VM<S> as *mut UnexpandedStream<S>) }
    }

    /// Returns whether the current stream has no pushed back tokens and its source is at
    /// the end of a line.
    ///
    /// Streams that are not backed by source code are always at the end of a line.
    pub fn at_end_of_line(&self) -> bool {
        self.0.internal.mouth.is_eol()
    }
}

impl<S: TexpandState> TokenStream for UnexpandedStream<S> {
    type S = S;

    #[inline]
    fn next(&mut self) -> txl::Result<Option<Token>> {
        Ok(stream::next_unexpanded(&mut self.0))
    }

    #[inline]
    fn back(&mut self, token: Token) {
        self.0.internal.mouth.push(token)
    }

    #[inline]
    fn back_all(&mut self, tokens: &[Token]) {
        self.0.internal.mouth.push_all(tokens)
    }

    #[inline]
    fn skip_spaces(&mut self) {
        self.0.internal.mouth.skip_spaces()
    }

    #[inline]
    fn next_non_space(&mut self) -> txl::Result<Option<Token>> {
        Ok(stream::next_unexpanded_non_space(&mut self.0))
    }

    #[inline]
    fn vm(&self) -> &vm::VM<S> {
        &self.0
    }
}

/// Input type for expansion primitives.
///
/// This type provides:
///
/// - Access to the input stream (with or without expansion). Its implementation of the [TokenStream]
///     trait returns expanded tokens.
///     To read the input stream without performing expansion, use the
///     [unexpanded](ExpansionInput::unexpanded) method.
///
/// - Read only access to the VM.
///
/// - The ability to push source code or tokens to the front of the input stream.
///
/// - Access to token buffers using the [ExpansionInput::checkout_token_buffer] and
///     [ExpansionInput::return_token_buffer] methods.
///
/// This type is also used in the parsing code for situations where both an
/// [ExpansionInput] or [ExecutionInput] is accepted. We use this type because
/// it has only read access to the VM, and so casting does not escalate privileges.
#[repr(transparent)]
pub struct ExpansionInput<S>(ExpandedStream<S>);

impl<S> std::convert::AsMut<ExpandedStream<S>> for ExpansionInput<S> {
    fn as_mut(&mut self) -> &mut ExpandedStream<S> {
        &mut self.0
    }
}

impl<S: TexpandState> TokenStream for ExpansionInput<S> {
    type S = S;

    #[inline]
    fn next(&mut self) -> txl::Result<Option<Token>> {
        self.0.next()
    }

    #[inline]
    fn back(&mut self, token: Token) {
        self.0.back(token)
    }

    #[inline]
    fn back_all(&mut self, tokens: &[Token]) {
        self.0.back_all(tokens)
    }

    #[inline]
    fn skip_spaces(&mut self) {
        self.0.skip_spaces()
    }

    #[inline]
    fn vm(&self) -> &vm::VM<Self::S> {
        self.0.vm()
    }
}

impl<S> ExpansionInput<S> {
    /// Creates a mutable reference to this type from the [VM](vm::VM) type.
    #[inline]
    pub fn new(vm: &mut vm::VM<S>) -> &mut ExpansionInput<S> {
        unsafe { &mut *(vm as *mut vm::VM<S> as *mut ExpansionInput<S>) }
    }

    #[inline]
    pub fn unexpanded(&mut self) -> &mut UnexpandedStream<S> {
        &mut self.0 .0
    }

    #[inline]
    pub fn expanded(&mut self) -> &mut ExpandedStream<S> {
        &mut self.0
    }

    #[inline]
    fn vm_mut(&mut self) -> &mut vm::VM<S> {
        &mut self.0 .0 .0
    }

    /// Push source code read from a file to the front of the input stream.
    ///
    /// The token is the command that read the file.
    pub fn push_source(&mut self, token: Token, file_name: PathBuf, source_code: &str) {
        self.vm_mut().internal.push_source(
            Some(token),
            trace::Origin::File(file_name),
            source_code,
        )
    }

    /// End the current file.
    ///
    /// The rest of the innermost file is discarded.
    /// This method is used by the `\endinput` primitive.
    pub fn end_current_file(&mut self) {
        self.vm_mut().internal.mouth.end_current_file()
    }

    /// Push the letter, other and space tokens of the string to the front of the input.
    pub fn push_string_tokens(&mut self, token: Token, s: &str) {
        let internal = &mut self.vm_mut().internal;
        let mut buffer = internal.mouth.checkout_token_buffer();
        buffer.extend(internal.factory.to_tokens(s, token.trace_key()));
        internal.mouth.push_all(&buffer);
        internal.mouth.return_token_buffer(buffer);
    }

    /// Pushes the replacement text of a macro invoked by the token.
    ///
    /// The buffer must be in reverse order. The new stream is reported in error locators.
    pub(crate) fn push_macro_body(&mut self, token: Token, reversed: Vec<Token>) {
        self.vm_mut().internal.mouth.push_macro_body(token, reversed)
    }

    /// Returns a vector than can be used as a token buffer, potentially without allocating memory.
    ///
    /// The returned vector is empty, but will generally have non-zero capacity from previous uses of the buffer.
    /// Reusing the allocated memory results in fewer allocations overall.
    ///
    /// When finished with the buffer, please return it using [return_token_buffer](ExpansionInput::return_token_buffer).
    ///
    /// Token buffers are often used in macro expansion, and at any point in time multiple macros may be in
    ///     the process of expansion.
    /// A single shared buffer would be incorrect, as the multiple expansions
    ///     would step on each other.
    pub fn checkout_token_buffer(&mut self) -> Vec<Token> {
        self.vm_mut().internal.mouth.checkout_token_buffer()
    }

    /// Return a token buffer, allowing it to be reused.
    pub fn return_token_buffer(&mut self, token_buffer: Vec<Token>) {
        self.vm_mut()
            .internal
            .mouth
            .return_token_buffer(token_buffer)
    }
}

/// Input type for execution primitives.
///
/// This type provides:
///
/// - Access to the input stream (with or without expansion). Its implementation of the [TokenStream]
///     trait returns expanded tokens.
///     To read the input stream without performing expansion, use the
///     [unexpanded](ExecutionInput::unexpanded) method.
///
/// - Mutable access to the state and the commands map
///     through the [ExecutionInput::state_mut]
///     and [ExecutionInput::commands_map_mut] methods.
#[repr(transparent)]
pub struct ExecutionInput<S>(ExpandedStream<S>);

impl<S> std::convert::AsMut<ExpandedStream<S>> for ExecutionInput<S> {
    fn as_mut(&mut self) -> &mut ExpandedStream<S> {
        &mut self.0
    }
}

impl<S: TexpandState> TokenStream for ExecutionInput<S> {
    type S = S;

    #[inline]
    fn next(&mut self) -> txl::Result<Option<Token>> {
        self.0.next()
    }

    #[inline]
    fn back(&mut self, token: Token) {
        self.0.back(token)
    }

    #[inline]
    fn back_all(&mut self, tokens: &[Token]) {
        self.0.back_all(tokens)
    }

    #[inline]
    fn skip_spaces(&mut self) {
        self.0.skip_spaces()
    }

    #[inline]
    fn vm(&self) -> &vm::VM<Self::S> {
        self.0.vm()
    }
}

impl<S> ExecutionInput<S> {
    /// Creates a mutable reference to this type from the [VM](vm::VM) type.
    #[inline]
    pub fn new(vm: &mut vm::VM<S>) -> &mut ExecutionInput<S> {
        unsafe { &mut *(vm as *mut vm::VM<S> as *mut ExecutionInput<S>) }
    }

    #[inline]
    pub fn unexpanded(&mut self) -> &mut UnexpandedStream<S> {
        &mut self.0 .0
    }

    #[inline]
    pub fn expanded(&mut self) -> &mut ExpandedStream<S> {
        &mut self.0
    }

    #[inline]
    fn vm_mut(&mut self) -> &mut vm::VM<S> {
        &mut self.0 .0 .0
    }

    #[inline]
    pub fn commands_map_mut(&mut self) -> &mut command::Map<S> {
        &mut self.vm_mut().commands_map
    }

    /// Returns a mutable reference to the state.
    #[inline]
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.vm_mut().state
    }

    /// Returns a mutable reference to the token factory, for example to create namespaces.
    #[inline]
    pub fn token_factory_mut(&mut self) -> &mut token::TokenFactory {
        &mut self.vm_mut().internal.factory
    }

    /// Sets the tokens inserted when a file ends.
    pub fn set_every_eof(&mut self, tokens: Vec<Token>) {
        self.vm_mut().internal.mouth.set_every_eof(tokens)
    }

    /// Returns this input as an [ExpansionInput], which has fewer privileges.
    #[inline]
    pub fn as_expansion_input(&mut self) -> &mut ExpansionInput<S> {
        ExpansionInput::new(self.vm_mut())
    }
}

impl<S: TexpandState> ExecutionInput<S> {
    pub fn begin_group(&mut self) {
        self.vm_mut().begin_group()
    }

    pub fn end_group(&mut self, token: Token) -> txl::Result<()> {
        self.vm_mut().end_group(token)
    }
}

mod stream {
    use super::*;
    use crate::command::Command;

    #[inline]
    pub fn next_unexpanded<S: TexpandState>(vm: &mut vm::VM<S>) -> Option<Token> {
        let namespace = vm.state.namespace();
        let internal = &mut vm.internal;
        internal
            .mouth
            .get_token(&mut internal.factory, &StateClassifier(&vm.state), namespace)
    }

    pub fn next_unexpanded_non_space<S: TexpandState>(vm: &mut vm::VM<S>) -> Option<Token> {
        let namespace = vm.state.namespace();
        let internal = &mut vm.internal;
        internal
            .mouth
            .get_non_space(&mut internal.factory, &StateClassifier(&vm.state), namespace)
    }

    enum Expansion {
        /// The token is not expandable.
        None,
        /// The token was expanded and the result is in the input.
        Done,
        /// The expansion override hook replaced the token.
        Override(Token),
    }

    fn expand<S: TexpandState>(vm: &mut vm::VM<S>, token: Token) -> txl::Result<Expansion> {
        let command_ref = match token.value() {
            token::Value::CommandRef(command_ref) => command_ref,
            _ => return Ok(Expansion::None),
        };
        match vm.commands_map.get_command(&command_ref) {
            Some(Command::Expansion(command, tag)) => {
                let command = *command;
                let tag = *tag;
                match S::expansion_override_hook(token, ExpansionInput::new(vm), tag) {
                    Ok(None) => (),
                    Ok(Some(override_expansion)) => {
                        return Ok(Expansion::Override(override_expansion));
                    }
                    Err(err) => return Err(convert_command_error(vm, token, err)),
                };
                if let Err(err) = command(token, ExpansionInput::new(vm)) {
                    return Err(convert_command_error(vm, token, err));
                };
                Ok(Expansion::Done)
            }
            Some(Command::Macro(command)) => {
                let command = command.clone();
                if let Err(err) = command.call(token, ExpansionInput::new(vm)) {
                    return Err(convert_command_error(vm, token, err));
                }
                Ok(Expansion::Done)
            }
            Some(Command::Execution(..)) | Some(Command::CharacterTokenAlias(_)) | None => {
                Ok(Expansion::None)
            }
        }
    }

    /// Returns the next unexpandable token, expanding commands along the way.
    ///
    /// This is a loop rather than a recursion: each expansion pushes its result onto the
    /// input and the loop continues reading.
    pub fn next_expanded<S: TexpandState>(vm: &mut vm::VM<S>) -> txl::Result<Option<Token>> {
        loop {
            let token = match next_unexpanded(vm) {
                None => return Ok(None),
                Some(token) => token,
            };
            match expand(vm, token)? {
                Expansion::None => return Ok(Some(token)),
                Expansion::Done => continue,
                Expansion::Override(token) => return Ok(Some(token)),
            }
        }
    }

    pub fn expand_once<S: TexpandState>(vm: &mut vm::VM<S>) -> txl::Result<bool> {
        let token = match next_unexpanded(vm) {
            None => return Ok(false),
            Some(token) => token,
        };
        match expand(vm, token)? {
            Expansion::None => {
                vm.internal.mouth.push(token);
                Ok(false)
            }
            Expansion::Done => Ok(true),
            Expansion::Override(token) => {
                vm.internal.mouth.push(token);
                Ok(true)
            }
        }
    }

    fn convert_command_error<S>(
        vm: &mut vm::VM<S>,
        token: Token,
        err: Box<error::Error>,
    ) -> Box<error::Error> {
        error::Error::new_propagated(vm, error::PropagationContext::Expansion, token, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::testing::State;
    use std::collections::HashMap;

    fn new_vm(source: &str) -> Box<vm::VM<State>> {
        let mut vm = vm::VM::<State>::new(HashMap::new());
        vm.push_source("main.tex", source);
        vm
    }

    #[test]
    fn next_non_space_skips_spaces() {
        let mut vm = new_vm("a   b c");
        let input = UnexpandedStream::new(&mut vm);
        assert_eq!(input.next_non_space().unwrap().unwrap().value(), token::Value::Letter('a'));
        assert_eq!(input.next_non_space().unwrap().unwrap().value(), token::Value::Letter('b'));
        assert_eq!(input.next().unwrap().unwrap().value(), token::Value::Space(' '));
        assert_eq!(input.next_non_space().unwrap().unwrap().value(), token::Value::Letter('c'));
        assert_eq!(input.next_non_space().unwrap(), None);
    }

    #[test]
    fn next_non_space_crosses_streams() {
        let mut vm = new_vm(" b");
        vm.push_string("first", "  ");
        let input = UnexpandedStream::new(&mut vm);
        assert_eq!(input.next_non_space().unwrap().unwrap().value(), token::Value::Letter('b'));
    }

    #[test]
    fn at_end_of_line() {
        let mut vm = new_vm("ab\ncd");
        let input = UnexpandedStream::new(&mut vm);
        assert!(!input.at_end_of_line());
        input.next().unwrap();
        assert!(!input.at_end_of_line());
        let b = input.next().unwrap().unwrap();
        assert!(input.at_end_of_line());
        input.back(b);
        assert!(!input.at_end_of_line());
        input.consume().unwrap();
        input.consume().unwrap();
        assert!(!input.at_end_of_line());
    }
}
