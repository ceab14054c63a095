//! The mouth: the stack of token streams.
//!
//! The mouth serves tokens to the rest of the VM. Its state is a current stream and a
//! stack of streams beneath it. Tokens are read from the current stream; when it is
//! exhausted it is closed and the stream below becomes current.
//!
//! Macro expansion pushes the replacement text as a new stream, which is then read by the
//! same loop. Nested expansions therefore grow the stack of streams on the heap,
//! not the native call stack.

use super::source::{Kind, Stream};
use crate::token::lexer::Classifier;
use crate::token::{Namespace, Token, TokenFactory};
use std::collections::BinaryHeap;

/// Callbacks invoked when the mouth changes state.
///
/// Each kind of event has its own channel.
#[derive(Default)]
pub struct Observers {
    push: Vec<Box<dyn FnMut(&[Token])>>,
    pop: Vec<Box<dyn FnMut(Token)>>,
    end_of_input: Vec<Box<dyn FnMut()>>,
    stream_close: Vec<Box<dyn FnMut(bool)>>,
}

impl Observers {
    /// Registers a callback invoked with the tokens of every push back.
    pub fn on_push<F: FnMut(&[Token]) + 'static>(&mut self, f: F) {
        self.push.push(Box::new(f));
    }

    /// Registers a callback invoked with every token delivered by the mouth.
    pub fn on_pop<F: FnMut(Token) + 'static>(&mut self, f: F) {
        self.pop.push(Box::new(f));
    }

    /// Registers a callback invoked when a token is requested but all streams are exhausted.
    pub fn on_end_of_input<F: FnMut() + 'static>(&mut self, f: F) {
        self.end_of_input.push(Box::new(f));
    }

    /// Registers a callback invoked when a stream is closed.
    ///
    /// The argument is whether the stream was a file stream.
    pub fn on_stream_close<F: FnMut(bool) + 'static>(&mut self, f: F) {
        self.stream_close.push(Box::new(f));
    }

    fn fire_push(&mut self, tokens: &[Token]) {
        for f in &mut self.push {
            f(tokens)
        }
    }

    fn fire_pop(&mut self, token: Token) {
        for f in &mut self.pop {
            f(token)
        }
    }

    fn fire_end_of_input(&mut self) {
        for f in &mut self.end_of_input {
            f()
        }
    }

    fn fire_stream_close(&mut self, is_file: bool) {
        for f in &mut self.stream_close {
            f(is_file)
        }
    }
}

#[derive(Default)]
pub(crate) struct Mouth {
    // The top of the stack is stored separately for performance.
    current: Option<Stream>,
    stack: Vec<Stream>,
    skip_spaces: bool,
    last_token: Option<Token>,
    every_eof: Vec<Token>,
    token_buffers: BinaryHeap<TokenBuffer>,
    pub observers: Observers,
}

impl Mouth {
    /// Makes the stream the current stream.
    pub fn add_stream(&mut self, stream: Stream) {
        if let Some(current) = self.current.replace(stream) {
            self.stack.push(current);
        }
    }

    /// Returns the next token, or [None] if every stream is exhausted.
    ///
    /// If the skip spaces flag is armed, space tokens are discarded until a non-space
    /// token is delivered. The flag is cleared when any token is delivered.
    pub fn get_token<C: Classifier + ?Sized>(
        &mut self,
        factory: &mut TokenFactory,
        classifier: &C,
        namespace: Namespace,
    ) -> Option<Token> {
        loop {
            let stream = match &mut self.current {
                None => {
                    self.observers.fire_end_of_input();
                    return None;
                }
                Some(stream) => stream,
            };
            match stream.get(classifier, factory, namespace) {
                None => {
                    self.close_current();
                }
                Some(token) => {
                    if self.skip_spaces && token.is_space() {
                        continue;
                    }
                    self.skip_spaces = false;
                    self.last_token = Some(token);
                    self.observers.fire_pop(token);
                    return Some(token);
                }
            }
        }
    }

    /// Returns the next non-space token.
    pub fn get_non_space<C: Classifier + ?Sized>(
        &mut self,
        factory: &mut TokenFactory,
        classifier: &C,
        namespace: Namespace,
    ) -> Option<Token> {
        loop {
            // Closing a stream disarms the flag, so it is armed again on each iteration.
            self.skip_spaces = true;
            let token = self.get_token(factory, classifier, namespace)?;
            if !token.is_space() {
                return Some(token);
            }
        }
    }

    /// Closes the current stream and returns whether it was a file stream.
    ///
    /// After a file stream the `\everyeof` tokens are pushed onto the new current stream.
    /// After any other stream the skip spaces flag is cleared.
    pub fn close_current(&mut self) -> bool {
        let closed = match self.current.take() {
            None => return false,
            Some(closed) => closed,
        };
        self.current = self.stack.pop();
        let is_file = closed.is_file_stream();
        if is_file {
            if !self.every_eof.is_empty() {
                let every_eof = std::mem::take(&mut self.every_eof);
                self.push_all(&every_eof);
                self.every_eof = every_eof;
            }
        } else {
            self.skip_spaces = false;
        }
        self.observers.fire_stream_close(is_file);
        self.return_token_buffer(closed.into_buffer());
        is_file
    }

    pub fn close_all_streams(&mut self) {
        while self.current.is_some() {
            self.close_current();
        }
    }

    /// Closes streams until a file stream has been closed or no streams remain.
    pub fn close_next_file_stream(&mut self) {
        while self.current.is_some() {
            if self.close_current() {
                return;
            }
        }
    }

    /// Truncates the innermost file stream, so that it ends once its pushed back
    /// tokens have been read.
    pub fn end_current_file(&mut self) {
        let innermost_file = self
            .current
            .iter_mut()
            .chain(self.stack.iter_mut().rev())
            .find(|stream| stream.is_file_stream());
        if let Some(stream) = innermost_file {
            stream.close_file_stream();
        }
    }

    /// Pushes a token to the front of the input.
    #[inline]
    pub fn push(&mut self, token: Token) {
        self.current_or_new().put(token);
        self.observers.fire_push(std::slice::from_ref(&token));
    }

    /// Pushes tokens to the front of the input; the first token is read first.
    pub fn push_all(&mut self, tokens: &[Token]) {
        if tokens.is_empty() {
            return;
        }
        let stream = self.current_or_new();
        for token in tokens.iter().rev() {
            stream.put(*token);
        }
        self.observers.fire_push(tokens);
    }

    /// Pushes the replacement text of a macro invoked by the token.
    ///
    /// The buffer must be in reverse order.
    pub fn push_macro_body(&mut self, token: Token, reversed: Vec<Token>) {
        // Exhausted token lists are closed first so that tail calls do not grow the stack.
        while let Some(current) = &self.current {
            match current.kind() {
                Kind::MacroBody { .. } | Kind::Tokens if current.is_eof() => {
                    self.close_current();
                }
                _ => break,
            }
        }
        self.add_stream(Stream::new_macro_body(token, reversed));
    }

    fn current_or_new(&mut self) -> &mut Stream {
        let token_buffers = &mut self.token_buffers;
        self.current
            .get_or_insert_with(|| Stream::new_tokens(token_buffers.pop().unwrap_or_default().0))
    }

    /// Arms the skip spaces flag for the next token fetch.
    #[inline]
    pub fn skip_spaces(&mut self) {
        self.skip_spaces = true;
    }

    pub fn last_token(&self) -> Option<Token> {
        self.last_token
    }

    pub fn every_eof(&self) -> &[Token] {
        &self.every_eof
    }

    pub fn set_every_eof(&mut self, tokens: Vec<Token>) {
        self.every_eof = tokens;
    }

    /// Number of streams in the stack.
    pub fn depth(&self) -> usize {
        self.stack.len() + usize::from(self.current.is_some())
    }

    pub fn is_eol(&self) -> bool {
        self.current.as_ref().map_or(true, Stream::is_eol)
    }

    /// Returns the invocation tokens of the active macro expansions, innermost first.
    pub fn macro_invocations(&self) -> Vec<Token> {
        self.current
            .iter()
            .chain(self.stack.iter().rev())
            .filter_map(|stream| match stream.kind() {
                Kind::MacroBody { token } => Some(token),
                _ => None,
            })
            .collect()
    }

    /// Returns an empty vector, potentially with capacity from a previous use.
    pub fn checkout_token_buffer(&mut self) -> Vec<Token> {
        self.token_buffers.pop().unwrap_or_default().0
    }

    pub fn return_token_buffer(&mut self, mut buffer: Vec<Token>) {
        buffer.clear();
        self.token_buffers.push(TokenBuffer(buffer))
    }
}

#[derive(Default)]
struct TokenBuffer(Vec<Token>);

impl PartialEq for TokenBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.0.capacity() == other.0.capacity()
    }
}

impl Eq for TokenBuffer {}

impl PartialOrd for TokenBuffer {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TokenBuffer {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.capacity().cmp(&other.0.capacity())
    }
}
