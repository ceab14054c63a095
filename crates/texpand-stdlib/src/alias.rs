//! The `\let` primitive

use texpand::command;
use texpand::error;
use texpand::parse::OptionalEqualsUnexpanded;
use texpand::prelude as txl;
use texpand::token;
use texpand::traits::*;
use texpand::vm;

pub const LET_DOC: &str = "Assign a command or character to a control sequence";

static LET_TAG: command::StaticTag = command::StaticTag::new();

pub fn let_tag() -> command::Tag {
    LET_TAG.get()
}

/// Get the `\let` command.
pub fn get_let<S: TexpandState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(let_primitive_fn)
        .with_tag(let_tag())
        .with_doc(LET_DOC)
}

fn let_primitive_fn<S: TexpandState>(
    _: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    let scope = S::variable_assignment_scope_hook(input.state_mut());
    let (alias, _) = <(token::CommandRef, OptionalEqualsUnexpanded)>::parse(input)?;
    let token = input.unexpanded().next_or_err(LetEndOfInputError {})?;
    match token.value() {
        token::Value::CommandRef(command_ref) => {
            match input
                .commands_map_mut()
                .alias_control_sequence(alias, &command_ref, scope)
            {
                Ok(()) => Ok(()),
                Err(_) => Err(error::UndefinedCommandError::new(input.vm(), token).into()),
            }
        }
        _ => {
            input.commands_map_mut().alias_token(alias, token, scope);
            Ok(())
        }
    }
}

#[derive(Debug)]
struct LetEndOfInputError;

impl error::EndOfInputError for LetEndOfInputError {
    fn doing(&self) -> String {
        r"reading the right hand side of a \let assignment".into()
    }
}
