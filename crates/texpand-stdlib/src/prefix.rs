//! The `\global`, `\long` and `\outer` prefix commands
//!
//! `\long` and `\outer` can only come before `\def` and `\gdef`.
//! `\global` can also come before the other assignment commands in this library.
//!
//! # Developer notes
//!
//! `\global` changes the behavior, at run time, of the command that follows it.
//! We maintain a component with a flag for each prefix.
//! The prefix commands set the flags and then push the prefixed command back onto the input,
//!   so the prefixed command runs through the main loop as usual.
//!
//! The flags need to be reset at some point; otherwise `\global` would make *all*
//!   subsequent assignments global.
//! So any command which can be prefixed reads the flags a single time using
//!   [Component::take_global] or [Component::take_prefixes].
//! These methods return the flag values and reset the flags to false.
//! Commands that only take `\global` read the flag through
//!   [TexpandState::variable_assignment_scope_hook], which for states with this
//!   component should call [variable_assignment_scope_hook].
//!
//! In order for the convention to work it is essential that *all* code paths within
//!   a prefixable command read the flags, even if they don't use the result.
//! For example `\gdef` always creates a macro in the global scope, but it still reads the flags.

use crate::alias;
use crate::catcode;
use crate::def;
use crate::expansion;
use crate::input;
use crate::namespace;
use crate::tracingmacros;
use std::collections::HashSet;
use texpand::command;
use texpand::error;
use texpand::prelude as txl;
use texpand::token;
use texpand::token::trace;
use texpand::traits::*;
use texpand::vm;
use texpand_stdext::collections::groupingmap;

/// Component for the prefix commands.
pub struct Component {
    global: bool,
    long: bool,
    outer: bool,
    prefixable_with_global: HashSet<command::Tag>,
}

impl Default for Component {
    fn default() -> Self {
        Component {
            global: false,
            long: false,
            outer: false,
            prefixable_with_global: HashSet::from([
                alias::let_tag(),
                catcode::catcode_tag(),
                input::everyeof_tag(),
                namespace::namespace_tag(),
                tracingmacros::tracingmacros_tag(),
            ]),
        }
    }
}

/// The prefixes that applied to a command.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Prefixes {
    pub global: bool,
    pub long: bool,
    pub outer: bool,
}

impl Component {
    /// Get the value of the global flag and reset all of the flags to false.
    ///
    /// See the module documentation for correct usage of this method.
    pub fn take_global(&mut self) -> bool {
        self.take_prefixes().global
    }

    /// Get the value of all the prefix flags and reset them to false.
    pub fn take_prefixes(&mut self) -> Prefixes {
        let prefixes = Prefixes {
            global: self.global,
            long: self.long,
            outer: self.outer,
        };
        self.global = false;
        self.long = false;
        self.outer = false;
        prefixes
    }
}

/// Scope of the next assignment, taking `\global` into account.
#[inline]
pub fn variable_assignment_scope_hook<S: HasComponent<Component>>(
    state: &mut S,
) -> groupingmap::Scope {
    if state.component_mut().take_global() {
        groupingmap::Scope::Global
    } else {
        groupingmap::Scope::Local
    }
}

static GLOBAL_TAG: command::StaticTag = command::StaticTag::new();
static LONG_TAG: command::StaticTag = command::StaticTag::new();
static OUTER_TAG: command::StaticTag = command::StaticTag::new();

/// Get the `\global` command.
pub fn get_global<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(global_primitive_fn)
        .with_tag(GLOBAL_TAG.get())
        .with_doc("Make the following assignment global")
}

/// Get the `\long` command.
pub fn get_long<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(long_primitive_fn)
        .with_tag(LONG_TAG.get())
        .with_doc("Allow the arguments of the following macro to contain \\par")
}

/// Get the `\outer` command.
pub fn get_outer<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(outer_primitive_fn)
        .with_tag(OUTER_TAG.get())
        .with_doc("Forbid the following macro from appearing in parameter texts")
}

#[derive(Default, Clone, Copy)]
struct Prefix {
    global: Option<token::Token>,
    long: Option<token::Token>,
    outer: Option<token::Token>,
}

impl Prefix {
    fn get_one(&self) -> (token::Token, Kind) {
        match (self.global, self.long, self.outer) {
            (Some(token), _, _) => (token, Kind::Global),
            (None, Some(token), _) => (token, Kind::Long),
            (None, None, Some(token)) => (token, Kind::Outer),
            // Every prefix command sets one of the fields before processing starts.
            (None, None, None) => unreachable!(),
        }
    }
}

fn global_primitive_fn<S: HasComponent<Component>>(
    token: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    process_prefixes(
        Prefix {
            global: Some(token),
            ..Default::default()
        },
        input,
    )
}

fn long_primitive_fn<S: HasComponent<Component>>(
    token: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    process_prefixes(
        Prefix {
            long: Some(token),
            ..Default::default()
        },
        input,
    )
}

fn outer_primitive_fn<S: HasComponent<Component>>(
    token: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    process_prefixes(
        Prefix {
            outer: Some(token),
            ..Default::default()
        },
        input,
    )
}

fn process_prefixes<S: HasComponent<Component>>(
    mut prefix: Prefix,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    loop {
        let token = match input.next_non_space()? {
            None => {
                let (prefix_token, _) = prefix.get_one();
                return Err(Error::EndOfInput {
                    end_of_input: input.trace_end_of_input(),
                    prefix: input.trace(prefix_token),
                }
                .into());
            }
            Some(token) => token,
        };
        let tag = match token
            .command_ref()
            .and_then(|command_ref| input.commands_map().get_tag(&command_ref))
        {
            None => return Err(cannot_be_prefixed_error(input.vm(), token, prefix)),
            Some(tag) => tag,
        };
        if tag == GLOBAL_TAG.get() {
            prefix.global = Some(token);
            continue;
        }
        if tag == LONG_TAG.get() {
            prefix.long = Some(token);
            continue;
        }
        if tag == OUTER_TAG.get() {
            prefix.outer = Some(token);
            continue;
        }
        if tag == expansion::relax_tag() {
            continue;
        }
        if tag == def::def_tag() {
            let component = input.state_mut().component_mut();
            component.global = prefix.global.is_some();
            component.long = prefix.long.is_some();
            component.outer = prefix.outer.is_some();
        } else if input
            .state()
            .component()
            .prefixable_with_global
            .contains(&tag)
        {
            if let Some(token_and_kind) = match (prefix.long, prefix.outer) {
                (Some(long_token), _) => Some((long_token, Kind::Long)),
                (None, Some(outer_token)) => Some((outer_token, Kind::Outer)),
                (None, None) => None,
            } {
                return Err(Error::CannotBePrefixed {
                    got: input.trace(token),
                    prefix: input.trace(token_and_kind.0),
                    kind: token_and_kind.1,
                }
                .into());
            }
            input.state_mut().component_mut().global = prefix.global.is_some();
        } else {
            return Err(cannot_be_prefixed_error(input.vm(), token, prefix));
        }
        input.back(token);
        return Ok(());
    }
}

fn cannot_be_prefixed_error<S>(
    vm: &vm::VM<S>,
    token: token::Token,
    prefix: Prefix,
) -> Box<error::Error> {
    let (prefix_token, kind) = prefix.get_one();
    Error::CannotBePrefixed {
        got: vm.trace(token),
        prefix: vm.trace(prefix_token),
        kind,
    }
    .into()
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Global,
    Long,
    Outer,
}

#[derive(Debug)]
enum Error {
    CannotBePrefixed {
        got: trace::SourceCodeTrace,
        prefix: trace::SourceCodeTrace,
        kind: Kind,
    },
    EndOfInput {
        end_of_input: trace::SourceCodeTrace,
        prefix: trace::SourceCodeTrace,
    },
}

impl error::TexError for Error {
    fn kind(&self) -> error::Kind {
        match self {
            Error::CannotBePrefixed { got, .. } => error::Kind::Token(got),
            Error::EndOfInput { end_of_input, .. } => error::Kind::EndOfInput(end_of_input),
        }
    }

    fn category(&self) -> error::Category {
        match self {
            Error::CannotBePrefixed { .. } => error::Category::Other,
            Error::EndOfInput { .. } => error::Category::UnexpectedEndOfInput,
        }
    }

    fn title(&self) -> String {
        match self {
            Error::CannotBePrefixed { got, prefix, .. } => match got.token {
                Some(token) if token.command_ref().is_none() => {
                    format!["character tokens cannot be prefixed with {}", prefix.value]
                }
                _ => format![
                    "the command {} cannot be prefixed with {}",
                    got.value, prefix.value
                ],
            },
            Error::EndOfInput { prefix, .. } => {
                format!["end of input after the prefix command {}", prefix.value]
            }
        }
    }

    fn notes(&self) -> Vec<error::display::Note> {
        match self {
            Error::CannotBePrefixed { prefix, kind, .. } => vec![
                match kind {
                    Kind::Global => {
                        r"the \global prefix can only be used with \def, \gdef and assignment commands like \let"
                    }
                    Kind::Long => r"the \long prefix can only be used with \def and \gdef",
                    Kind::Outer => r"the \outer prefix can only be used with \def and \gdef",
                }
                .into(),
                error::display::Note::SourceCodeTrace("the prefix appeared here:".into(), prefix),
            ],
            Error::EndOfInput { .. } => {
                vec![r"prefix commands must be followed by a command like \def".into()]
            }
        }
    }
}
