//! The `\namespace` primitive
//!
//! Control sequences and active characters read by the lexer are placed in the current namespace.
//! A command that is not defined in the current namespace is looked up in the default namespace,
//!     so primitives keep working after the namespace changes.
//! The namespace follows TeX grouping.

use texpand::command;
use texpand::error;
use texpand::prelude as txl;
use texpand::token;
use texpand::traits::*;
use texpand::vm;
use texpand_stdext::collections::groupingmap;

pub const NAMESPACE_DOC: &str = "Set the namespace of control sequences read from the input";

#[derive(Default)]
pub struct Component {
    current: groupingmap::GroupingVec<token::Namespace>,
}

pub fn namespace<S: HasComponent<Component>>(state: &S) -> token::Namespace {
    state
        .component()
        .current
        .get(&0)
        .copied()
        .unwrap_or(token::Namespace::DEFAULT)
}

pub fn begin_group_hook<S: HasComponent<Component>>(state: &mut S) {
    state.component_mut().current.begin_group();
}

pub fn end_group_hook<S: HasComponent<Component>>(state: &mut S) {
    // The VM only ends the group after checking one is open.
    _ = state.component_mut().current.end_group();
}

static NAMESPACE_TAG: command::StaticTag = command::StaticTag::new();

pub fn namespace_tag() -> command::Tag {
    NAMESPACE_TAG.get()
}

/// Get the `\namespace` command.
///
/// The syntax is `\namespace{<name>}`, where the name is made of letter and other tokens.
/// An empty name selects the default namespace.
pub fn get_namespace<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(namespace_primitive_fn)
        .with_tag(namespace_tag())
        .with_doc(NAMESPACE_DOC)
}

fn namespace_primitive_fn<S: HasComponent<Component>>(
    namespace_token: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    let scope = S::variable_assignment_scope_hook(input.state_mut());
    let tokens = texpand::parse::get_tokens(input.unexpanded())?;
    let mut name = String::new();
    for token in tokens {
        match token.value() {
            token::Value::Letter(c) | token::Value::Other(c) => name.push(c),
            _ => {
                return Err(error::SimpleTokenError::new(
                    input.vm(),
                    token,
                    "a namespace name can only contain letter and other tokens",
                )
                .into())
            }
        }
    }
    let namespace = match input.token_factory_mut().namespace(&name) {
        None => {
            return Err(error::SimpleTokenError::new(
                input.vm(),
                namespace_token,
                "too many namespaces have been created",
            )
            .into())
        }
        Some(namespace) => namespace,
    };
    input
        .state_mut()
        .component_mut()
        .current
        .insert(0, namespace, scope);
    Ok(())
}
