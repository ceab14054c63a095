//! Map type
use super::*;
use std::collections::HashMap;
use std::fmt;
use texpand_stdext::collections::groupingmap;
use texpand_stdext::collections::groupingmap::GroupingHashMap;
use texpand_stdext::collections::groupingmap::GroupingVec;

/// Map from control sequences and active characters to commands.
///
/// Commands for control sequences in the default namespace are stored in a vector indexed
/// by the interned control sequence name, which makes the common lookup a single index.
/// Active characters and tokens in other namespaces live in hash maps.
///
/// A token in a non-default namespace that has no command of its own resolves to the
/// command of the same token in the default namespace.
///
/// All assignments obey TeX grouping: local assignments are undone at the end of the group.
pub struct Map<S> {
    commands: GroupingVec<Command<S>>,
    active_char: GroupingHashMap<char, Command<S>>,
    namespaced: GroupingHashMap<token::CommandRef, Command<S>>,
    built_in_commands: HashMap<token::CsName, BuiltIn<S>>,
}

impl<S> Map<S> {
    pub(crate) fn new(built_in_commands: HashMap<token::CsName, BuiltIn<S>>) -> Map<S> {
        let mut commands: GroupingVec<Command<S>> = Default::default();
        commands.extend(
            built_in_commands
                .iter()
                .map(|(k, v)| (k.to_usize(), v.cmd.clone())),
        );
        Self {
            commands,
            active_char: Default::default(),
            namespaced: Default::default(),
            built_in_commands,
        }
    }

    #[inline]
    pub fn get_command(&self, command_ref: &token::CommandRef) -> Option<&Command<S>> {
        match command_ref {
            token::CommandRef::ControlSequence(name, namespace) if namespace.is_default() => {
                self.commands.get(&name.to_usize())
            }
            token::CommandRef::ActiveCharacter(c, namespace) if namespace.is_default() => {
                self.active_char.get(c)
            }
            _ => self
                .namespaced
                .get(command_ref)
                .or_else(|| self.get_command(&command_ref.in_default_namespace())),
        }
    }

    pub fn get_tag(&self, command_ref: &token::CommandRef) -> Option<Tag> {
        self.get_command(command_ref).and_then(Command::tag)
    }

    /// Resolves a token one step through a `\let` character alias.
    ///
    /// If the token is a control sequence or active character bound to a character token
    /// alias, the aliased character token is returned with the trace key of the input token.
    /// Otherwise the token is returned unchanged.
    #[inline]
    pub fn resolve_alias(&self, token: token::Token) -> token::Token {
        match token.value() {
            token::Value::CommandRef(command_ref) => match self.get_command(&command_ref) {
                Some(Command::CharacterTokenAlias(value)) => {
                    token::Token::new_from_value(*value, token.trace_key())
                }
                _ => token,
            },
            _ => token,
        }
    }

    pub fn built_in_commands(&self) -> &HashMap<token::CsName, BuiltIn<S>> {
        &self.built_in_commands
    }

    pub fn insert_macro(
        &mut self,
        name: token::CommandRef,
        texmacro: texmacro::Macro,
        scope: groupingmap::Scope,
    ) {
        self.insert(name, Command::Macro(rc::Rc::new(texmacro)), scope);
    }

    /// Binds the alias to the command currently bound to the other command reference.
    ///
    /// Returns an error if the other command reference is undefined.
    pub fn alias_control_sequence(
        &mut self,
        alias: token::CommandRef,
        command: &token::CommandRef,
        scope: groupingmap::Scope,
    ) -> std::result::Result<(), InvalidAlias> {
        let command = match self.get_command(command) {
            None => return Err(InvalidAlias {}),
            Some(t) => t.clone(),
        };
        self.insert(alias, command, scope);
        Ok(())
    }

    pub fn alias_token(
        &mut self,
        alias: token::CommandRef,
        token: token::Token,
        scope: groupingmap::Scope,
    ) {
        self.insert(alias, Command::CharacterTokenAlias(token.value()), scope);
    }

    pub fn insert(
        &mut self,
        command_ref: token::CommandRef,
        command: Command<S>,
        scope: groupingmap::Scope,
    ) {
        match command_ref {
            token::CommandRef::ControlSequence(name, namespace) if namespace.is_default() => {
                self.commands.insert(name.to_usize(), command, scope);
            }
            token::CommandRef::ActiveCharacter(c, namespace) if namespace.is_default() => {
                self.active_char.insert(c, command, scope);
            }
            _ => {
                self.namespaced.insert(command_ref, command, scope);
            }
        }
    }

    /// Names of the control sequences defined in the default namespace.
    pub fn control_sequences(&self) -> impl Iterator<Item = token::CsName> + '_ {
        self.commands
            .iter()
            .filter_map(|(key, _)| token::CsName::from_usize(key))
    }

    pub(crate) fn begin_group(&mut self) {
        self.commands.begin_group();
        self.active_char.begin_group();
        self.namespaced.begin_group();
    }

    pub(crate) fn end_group(&mut self) -> std::result::Result<(), groupingmap::NoGroupToEndError> {
        self.commands.end_group()?;
        self.active_char.end_group()?;
        self.namespaced.end_group()?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.commands.len() + self.active_char.len() + self.namespaced.len()
    }
}

#[derive(Debug)]
pub struct InvalidAlias;

impl fmt::Display for InvalidAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid alias: the control sequence to alias is undefined"
        )
    }
}

impl std::error::Error for InvalidAlias {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{trace, CommandRef, CsNameInterner, Namespace, Token, Value};
    use groupingmap::Scope;

    fn noop(_: Token, _: &mut vm::ExecutionInput<()>) -> txl::Result<()> {
        Ok(())
    }

    fn setup() -> (Map<()>, CsNameInterner) {
        let mut interner = CsNameInterner::default();
        let relax = interner.get_or_intern("relax");
        let map = Map::new(HashMap::from([(relax, BuiltIn::new_execution(noop))]));
        (map, interner)
    }

    fn cs(interner: &mut CsNameInterner, name: &str, namespace: Namespace) -> CommandRef {
        CommandRef::ControlSequence(interner.get_or_intern(name), namespace)
    }

    #[test]
    fn namespace_falls_back_to_default() {
        let (mut map, mut interner) = setup();
        let ns = Namespace::new(2);
        let relax = cs(&mut interner, "relax", Namespace::DEFAULT);
        let relax_ns = cs(&mut interner, "relax", ns);
        assert!(map.get_command(&relax_ns).is_some());

        let x = cs(&mut interner, "x", ns);
        map.alias_token(x, Token::new_letter('a', trace::Key::dummy()), Scope::Local);
        assert!(map.get_command(&x).is_some());
        let x_default = cs(&mut interner, "x", Namespace::DEFAULT);
        assert!(map.get_command(&x_default).is_none());

        map.alias_token(relax_ns, Token::new_letter('b', trace::Key::dummy()), Scope::Local);
        assert!(matches!(
            map.get_command(&relax),
            Some(Command::Execution(..))
        ));
    }

    #[test]
    fn resolve_alias_is_one_step() {
        let (mut map, mut interner) = setup();
        let a = cs(&mut interner, "a", Namespace::DEFAULT);
        let b = cs(&mut interner, "b", Namespace::DEFAULT);
        map.alias_token(a, Token::new_parameter('#', trace::Key::dummy()), Scope::Local);
        map.alias_control_sequence(b, &a, Scope::Local).unwrap();
        let token = Token::new_from_value(Value::CommandRef(b), trace::Key::dummy());
        assert_eq!(map.resolve_alias(token).value(), Value::Parameter('#'));
        let c = Token::new_letter('c', trace::Key::dummy());
        assert_eq!(map.resolve_alias(c), c);
    }

    #[test]
    fn alias_undefined() {
        let (mut map, mut interner) = setup();
        let a = cs(&mut interner, "a", Namespace::DEFAULT);
        let b = cs(&mut interner, "b", Namespace::DEFAULT);
        assert!(map.alias_control_sequence(a, &b, Scope::Local).is_err());
    }

    #[test]
    fn grouping() {
        let (mut map, mut interner) = setup();
        let a = cs(&mut interner, "a", Namespace::DEFAULT);
        let tilde = CommandRef::ActiveCharacter('~', Namespace::DEFAULT);
        map.begin_group();
        map.alias_token(a, Token::new_letter('a', trace::Key::dummy()), Scope::Local);
        map.alias_token(tilde, Token::new_letter('t', trace::Key::dummy()), Scope::Global);
        assert_eq!(map.len(), 3);
        map.end_group().unwrap();
        assert!(map.get_command(&a).is_none());
        assert!(map.get_command(&tilde).is_some());
        assert!(map.end_group().is_err());
    }

    #[test]
    fn control_sequences() {
        let (map, interner) = setup();
        let names: Vec<&str> = map
            .control_sequences()
            .filter_map(|name| interner.resolve(name))
            .collect();
        assert_eq!(names, vec!["relax"]);
    }
}
