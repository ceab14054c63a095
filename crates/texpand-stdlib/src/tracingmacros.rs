//! TeX macro debugging

use texpand::command;
use texpand::parse::OptionalEquals;
use texpand::prelude as txl;
use texpand::token;
use texpand::traits::*;
use texpand::vm;
use texpand_stdext::collections::groupingmap;

pub const TRACINGMACROS_DOC: &str = "Write macro expansions to the log file when positive";

/// Component for storing state related to macro tracing.
#[derive(Default)]
pub struct Component {
    tracing_macros: groupingmap::GroupingVec<i32>,
}

/// Current value of `\tracingmacros`.
pub fn tracing_macros<S: HasComponent<Component>>(state: &S) -> i32 {
    state
        .component()
        .tracing_macros
        .get(&0)
        .copied()
        .unwrap_or(0)
}

pub fn begin_group_hook<S: HasComponent<Component>>(state: &mut S) {
    state.component_mut().tracing_macros.begin_group();
}

pub fn end_group_hook<S: HasComponent<Component>>(state: &mut S) {
    _ = state.component_mut().tracing_macros.end_group();
}

static TRACINGMACROS_TAG: command::StaticTag = command::StaticTag::new();

pub fn tracingmacros_tag() -> command::Tag {
    TRACINGMACROS_TAG.get()
}

/// Get the `\tracingmacros` command.
///
/// The syntax is `\tracingmacros <optional equals> <number>`.
pub fn get_tracingmacros<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(tracingmacros_primitive_fn)
        .with_tag(tracingmacros_tag())
        .with_doc(TRACINGMACROS_DOC)
}

fn tracingmacros_primitive_fn<S: HasComponent<Component>>(
    _: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    let (_, value) = <(OptionalEquals, i32)>::parse(input)?;
    let scope = S::variable_assignment_scope_hook(input.state_mut());
    input
        .state_mut()
        .component_mut()
        .tracing_macros
        .insert(0, value, scope);
    Ok(())
}
