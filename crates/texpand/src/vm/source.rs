//! Individual token streams.
//!
//! A [Stream] is one entry in the mouth's stack: a piece of source code being lexed,
//! a list of tokens inserted by a command, or the replacement text of a macro.
//! Every stream has a push-back stack that is read before the underlying source.

use crate::token::lexer::{Classifier, Lexer};
use crate::token::trace;
use crate::token::{Namespace, Token, TokenFactory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    /// Source code that did not come from a file, e.g. the terminal.
    String,
    File,
    /// Tokens inserted in front of the input.
    Tokens,
    /// The replacement text of a macro invoked by the token.
    MacroBody { token: Token },
}

pub(crate) struct Stream {
    kind: Kind,
    // The next token is the last element.
    pushback: Vec<Token>,
    lexer: Option<Lexer>,
}

impl Stream {
    pub fn new_source(file: bool, source_code: &str, keys: trace::KeyRange) -> Stream {
        Stream {
            kind: if file { Kind::File } else { Kind::String },
            pushback: Vec::new(),
            lexer: Some(Lexer::new(source_code, keys)),
        }
    }

    /// Creates a stream of tokens; the buffer must already be in reverse order.
    pub fn new_tokens(reversed: Vec<Token>) -> Stream {
        Stream {
            kind: Kind::Tokens,
            pushback: reversed,
            lexer: None,
        }
    }

    /// Creates a macro body stream; the buffer must already be in reverse order.
    pub fn new_macro_body(token: Token, reversed: Vec<Token>) -> Stream {
        Stream {
            kind: Kind::MacroBody { token },
            pushback: reversed,
            lexer: None,
        }
    }

    #[inline]
    pub fn get<C: Classifier + ?Sized>(
        &mut self,
        classifier: &C,
        factory: &mut TokenFactory,
        namespace: Namespace,
    ) -> Option<Token> {
        if let Some(token) = self.pushback.pop() {
            return Some(token);
        }
        self.lexer.as_mut()?.next(classifier, factory, namespace)
    }

    #[inline]
    pub fn put(&mut self, token: Token) {
        self.pushback.push(token);
    }

    pub fn is_eof(&self) -> bool {
        self.pushback.is_empty() && self.lexer.as_ref().map_or(true, Lexer::is_eof)
    }

    pub fn is_eol(&self) -> bool {
        self.pushback.is_empty() && self.lexer.as_ref().map_or(true, Lexer::is_eol)
    }

    pub fn is_file_stream(&self) -> bool {
        self.kind == Kind::File
    }

    /// Discards the unread source code of a file stream.
    ///
    /// Pushed back tokens are kept. For other streams this does nothing.
    pub fn close_file_stream(&mut self) {
        if let (Kind::File, Some(lexer)) = (self.kind, self.lexer.as_mut()) {
            lexer.truncate();
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Consumes the stream and returns its push-back buffer for reuse.
    pub fn into_buffer(self) -> Vec<Token> {
        self.pushback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{CatCodeTable, Value};

    fn get_all(stream: &mut Stream, factory: &mut TokenFactory) -> Vec<Value> {
        let table = CatCodeTable::plain_tex();
        let mut values = vec![];
        while let Some(token) = stream.get(&table, factory, Namespace::DEFAULT) {
            values.push(token.value());
        }
        values
    }

    #[test]
    fn put_then_get() {
        let mut factory = TokenFactory::default();
        let mut stream = Stream::new_source(false, "ab", trace::KeyRange::empty());
        stream.put(Token::new_other('1', trace::Key::dummy()));
        stream.put(Token::new_other('2', trace::Key::dummy()));
        assert_eq!(
            get_all(&mut stream, &mut factory),
            vec![
                Value::Other('2'),
                Value::Other('1'),
                Value::Letter('a'),
                Value::Letter('b'),
            ]
        );
        assert!(stream.is_eof());
    }

    #[test]
    fn macro_body_is_reversed() {
        let mut factory = TokenFactory::default();
        let body: Vec<Token> = "xyz"
            .chars()
            .rev()
            .map(|c| Token::new_letter(c, trace::Key::dummy()))
            .collect();
        let mut stream = Stream::new_macro_body(Token::new_other('!', trace::Key::dummy()), body);
        assert!(!stream.is_file_stream());
        assert_eq!(
            get_all(&mut stream, &mut factory),
            vec![Value::Letter('x'), Value::Letter('y'), Value::Letter('z')]
        );
    }

    #[test]
    fn close_file_stream() {
        let mut factory = TokenFactory::default();
        let mut stream = Stream::new_source(true, "abc", trace::KeyRange::empty());
        let table = CatCodeTable::plain_tex();
        stream.get(&table, &mut factory, Namespace::DEFAULT);
        stream.put(Token::new_other('1', trace::Key::dummy()));
        stream.close_file_stream();
        assert!(!stream.is_eof());
        assert_eq!(get_all(&mut stream, &mut factory), vec![Value::Other('1')]);
        assert!(stream.is_eof());
    }

    #[test]
    fn close_string_stream_is_noop() {
        let mut factory = TokenFactory::default();
        let mut stream = Stream::new_source(false, "ab", trace::KeyRange::empty());
        stream.close_file_stream();
        assert_eq!(
            get_all(&mut stream, &mut factory),
            vec![Value::Letter('a'), Value::Letter('b')]
        );
    }
}
