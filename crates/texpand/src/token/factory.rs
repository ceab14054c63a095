//! Construction of tokens from characters and category codes.
//!
//! The [TokenFactory] is owned by the VM. It holds the control sequence name interner,
//! the namespace names and the canonical space token value.
use super::{trace, CatCode, CommandRef, CsName, CsNameInterner, Namespace, Token, Value};
use crate::error;

/// Builds tokens and owns the state needed to do so.
pub struct TokenFactory {
    interner: CsNameInterner,
    namespaces: Vec<String>,
    space: Value,
    par: CsName,
}

impl Default for TokenFactory {
    fn default() -> Self {
        let mut interner = CsNameInterner::default();
        let par = interner.get_or_intern("par");
        TokenFactory {
            interner,
            namespaces: vec![String::new()],
            space: Value::Space(' '),
            par,
        }
    }
}

impl TokenFactory {
    /// Creates a character token, or an active character token in the namespace.
    ///
    /// Characters with category ignored, invalid or comment produce no token.
    /// Every space and end of line character produces the canonical space.
    /// The escape category cannot be turned into a token without a name;
    /// use [TokenFactory::create_code] for control sequences.
    pub fn create(
        &self,
        cat_code: CatCode,
        c: char,
        namespace: Namespace,
        trace_key: trace::Key,
    ) -> Result<Option<Token>, InvalidCatCodeError> {
        let value = match cat_code {
            CatCode::Escape => return Err(InvalidCatCodeError { cat_code, c }),
            CatCode::Ignored | CatCode::Invalid | CatCode::Comment => return Ok(None),
            CatCode::Space | CatCode::EndOfLine => self.space,
            CatCode::Active => Value::CommandRef(CommandRef::ActiveCharacter(c, namespace)),
            CatCode::BeginGroup => Value::BeginGroup(c),
            CatCode::EndGroup => Value::EndGroup(c),
            CatCode::MathShift => Value::MathShift(c),
            CatCode::AlignmentTab => Value::AlignmentTab(c),
            CatCode::Parameter => Value::Parameter(c),
            CatCode::Superscript => Value::Superscript(c),
            CatCode::Subscript => Value::Subscript(c),
            CatCode::Letter => Value::Letter(c),
            CatCode::Other => Value::Other(c),
        };
        Ok(Some(Token::new_from_value(value, trace_key)))
    }

    /// Creates a code token.
    ///
    /// For the escape category this is a control sequence with the provided name,
    /// or named by the character if the name is empty.
    /// Other categories are handled as in [TokenFactory::create].
    pub fn create_code(
        &mut self,
        cat_code: CatCode,
        c: char,
        name: &str,
        namespace: Namespace,
        trace_key: trace::Key,
    ) -> Result<Option<Token>, InvalidCatCodeError> {
        if cat_code != CatCode::Escape {
            return self.create(cat_code, c, namespace, trace_key);
        }
        let cs_name = if name.is_empty() {
            let mut buffer = [0_u8; 4];
            self.interner.get_or_intern(c.encode_utf8(&mut buffer))
        } else {
            self.interner.get_or_intern(name)
        };
        Ok(Some(Token::new_control_sequence(
            cs_name, namespace, trace_key,
        )))
    }

    /// The canonical space token.
    pub fn space(&self, trace_key: trace::Key) -> Token {
        Token::new_from_value(self.space, trace_key)
    }

    /// The `\par` control sequence in the default namespace.
    pub fn par(&self, trace_key: trace::Key) -> Token {
        Token::new_control_sequence(self.par, Namespace::DEFAULT, trace_key)
    }

    /// Returns whether the token is `\par`, ignoring its namespace.
    #[inline]
    pub fn is_par(&self, token: &Token) -> bool {
        matches!(
            token.value(),
            Value::CommandRef(CommandRef::ControlSequence(name, _)) if name == self.par
        )
    }

    /// Builds the control sequence with the name in the default namespace.
    pub fn control_sequence(&mut self, name: &str, trace_key: trace::Key) -> Token {
        let cs_name = self.interner.get_or_intern(name);
        Token::new_control_sequence(cs_name, Namespace::DEFAULT, trace_key)
    }

    /// Converts a string to letter, other and space tokens using the default category codes.
    ///
    /// The returned iterator can be cloned to restart the conversion.
    pub fn to_tokens<'a>(&self, text: &'a str, trace_key: trace::Key) -> ToTokens<'a> {
        ToTokens {
            chars: text.chars(),
            space: self.space,
            trace_key,
        }
    }

    /// Returns the namespace with the name, creating it if needed.
    ///
    /// The empty name is the default namespace.
    /// Returns [None] if the maximum number of namespaces has been reached.
    pub fn namespace(&mut self, name: &str) -> Option<Namespace> {
        if let Some(i) = self.namespaces.iter().position(|n| n == name) {
            return Some(Namespace::new(i as u16));
        }
        let index = u16::try_from(self.namespaces.len()).ok()?;
        self.namespaces.push(name.to_string());
        Some(Namespace::new(index))
    }

    pub fn namespace_name(&self, namespace: Namespace) -> &str {
        self.namespaces
            .get(namespace.index())
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn interner(&self) -> &CsNameInterner {
        &self.interner
    }

    pub fn interner_mut(&mut self) -> &mut CsNameInterner {
        &mut self.interner
    }
}

/// Iterator returned by [TokenFactory::to_tokens].
#[derive(Clone)]
pub struct ToTokens<'a> {
    chars: std::str::Chars<'a>,
    space: Value,
    trace_key: trace::Key,
}

impl<'a> Iterator for ToTokens<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            let c = self.chars.next()?;
            let value = match CatCode::default_for(c) {
                CatCode::Letter => Value::Letter(c),
                CatCode::Space | CatCode::EndOfLine => self.space,
                CatCode::Ignored | CatCode::Invalid => continue,
                _ => Value::Other(c),
            };
            return Some(Token::new_from_value(value, self.trace_key));
        }
    }
}

/// Error returned when a token is requested for a category code that cannot produce one.
#[derive(Debug)]
pub struct InvalidCatCodeError {
    pub cat_code: CatCode,
    pub c: char,
}

impl error::TexError for InvalidCatCodeError {
    fn kind(&self) -> error::Kind {
        error::Kind::FailedPrecondition
    }

    fn category(&self) -> error::Category {
        error::Category::InvalidCatCode
    }

    fn title(&self) -> String {
        format!(
            "cannot create a token for character '{}' with category code {}",
            self.c, self.cat_code
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> trace::Key {
        trace::Key::dummy()
    }

    #[test]
    fn escape_is_invalid() {
        let factory = TokenFactory::default();
        let result = factory.create(CatCode::Escape, '\\', Namespace::DEFAULT, key());
        assert!(matches!(
            result,
            Err(InvalidCatCodeError {
                cat_code: CatCode::Escape,
                c: '\\'
            })
        ));
    }

    #[test]
    fn filtered_categories_produce_nothing() {
        let factory = TokenFactory::default();
        for cat_code in [CatCode::Ignored, CatCode::Invalid, CatCode::Comment] {
            let result = factory.create(cat_code, 'x', Namespace::DEFAULT, key());
            assert_eq!(result.unwrap(), None);
        }
    }

    #[test]
    fn space_is_canonical() {
        let factory = TokenFactory::default();
        let a = factory
            .create(CatCode::Space, '\t', Namespace::DEFAULT, key())
            .unwrap()
            .unwrap();
        let b = factory
            .create(CatCode::EndOfLine, '\n', Namespace::DEFAULT, key())
            .unwrap()
            .unwrap();
        assert_eq!(a.value(), Value::Space(' '));
        assert_eq!(a, b);
        assert_eq!(a, factory.space(key()));
    }

    #[test]
    fn character_tokens() {
        let factory = TokenFactory::default();
        let token = factory
            .create(CatCode::Parameter, '#', Namespace::DEFAULT, key())
            .unwrap()
            .unwrap();
        assert_eq!(token.value(), Value::Parameter('#'));
        let ns = Namespace::new(3);
        let token = factory
            .create(CatCode::Active, '~', ns, key())
            .unwrap()
            .unwrap();
        assert_eq!(
            token.value(),
            Value::CommandRef(CommandRef::ActiveCharacter('~', ns))
        );
    }

    #[test]
    fn code_token_name_defaults_to_character() {
        let mut factory = TokenFactory::default();
        let named = factory
            .create_code(CatCode::Escape, '\\', "relax", Namespace::DEFAULT, key())
            .unwrap()
            .unwrap();
        let unnamed = factory
            .create_code(CatCode::Escape, '!', "", Namespace::DEFAULT, key())
            .unwrap()
            .unwrap();
        let interner = factory.interner();
        assert_eq!(
            named.command_ref().unwrap().to_string(interner),
            "\\relax".to_string()
        );
        assert_eq!(
            unnamed.command_ref().unwrap().to_string(interner),
            "\\!".to_string()
        );
    }

    #[test]
    fn par() {
        let mut factory = TokenFactory::default();
        let par = factory.control_sequence("par", key());
        assert!(factory.is_par(&par));
        assert_eq!(par, factory.par(key()));
        let other = factory.control_sequence("parr", key());
        assert!(!factory.is_par(&other));
    }

    #[test]
    fn to_tokens_is_restartable() {
        let factory = TokenFactory::default();
        let tokens = factory.to_tokens("a1 \\%\u{0}b", key());
        let want = vec![
            Value::Letter('a'),
            Value::Other('1'),
            Value::Space(' '),
            Value::Other('\\'),
            Value::Other('%'),
            Value::Letter('b'),
        ];
        let first: Vec<Value> = tokens.clone().map(|t| t.value()).collect();
        let second: Vec<Value> = tokens.map(|t| t.value()).collect();
        assert_eq!(first, want);
        assert_eq!(second, want);
    }

    #[test]
    fn namespaces() {
        let mut factory = TokenFactory::default();
        assert_eq!(factory.namespace(""), Some(Namespace::DEFAULT));
        let a = factory.namespace("a").unwrap();
        let b = factory.namespace("b").unwrap();
        assert_ne!(a, b);
        assert_eq!(factory.namespace("a"), Some(a));
        assert_eq!(factory.namespace_name(b), "b");
    }
}
