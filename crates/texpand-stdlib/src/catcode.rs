//! The `\catcode` primitive

use texpand::command;
use texpand::parse::OptionalEquals;
use texpand::prelude as txl;
use texpand::token;
use texpand::token::CatCode;
use texpand::traits::*;
use texpand::vm;

/// Component holding the category code table.
///
/// The table starts with the plain TeX assignments and follows TeX grouping.
pub struct Component {
    table: token::CatCodeTable,
}

impl Default for Component {
    fn default() -> Self {
        Self {
            table: token::CatCodeTable::plain_tex(),
        }
    }
}

#[inline]
pub fn cat_code<S: HasComponent<Component>>(state: &S, c: char) -> CatCode {
    state.component().table.classify(c)
}

pub fn begin_group_hook<S: HasComponent<Component>>(state: &mut S) {
    state.component_mut().table.begin_group();
}

pub fn end_group_hook<S: HasComponent<Component>>(state: &mut S) {
    state.component_mut().table.end_group();
}

pub const CATCODE_DOC: &str = "Set the category code of a character";

static CATCODE_TAG: command::StaticTag = command::StaticTag::new();

pub fn catcode_tag() -> command::Tag {
    CATCODE_TAG.get()
}

/// Get the `\catcode` command.
///
/// The syntax is `\catcode <character code> <optional equals> <category code>`.
pub fn get_catcode<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(catcode_primitive_fn)
        .with_tag(catcode_tag())
        .with_doc(CATCODE_DOC)
}

fn catcode_primitive_fn<S: HasComponent<Component>>(
    _: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    let (c, _, cat_code) = <(char, OptionalEquals, CatCode)>::parse(input)?;
    let scope = S::variable_assignment_scope_hook(input.state_mut());
    input
        .state_mut()
        .component_mut()
        .table
        .set(c, cat_code, scope);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def;
    use crate::prefix;
    use crate::testing::*;
    use std::collections::HashMap;

    fn built_in_commands() -> HashMap<&'static str, command::BuiltIn<State>> {
        HashMap::from([
            ("catcode", get_catcode()),
            ("def", def::get_def()),
            ("global", prefix::get_global()),
        ])
    }

    test_suite![
        expansion_equality_tests(
            (begin_group, r"\catcode`\;=1 ;a}b", "ab"),
            (
                with_equals,
                r"\catcode 59 = 1 \catcode 58 = 2 ;a:b",
                "ab"
            ),
            (comment, r"\catcode`\X=14 aXbc", "a"),
            (ignored, r"\catcode`\X=9 aXb", "ab"),
            (new_escape, r"\catcode`\|=0 |def|A{x}|A", "x"),
            (letter_control_sequence, r"\catcode`\@=11 \def\a@b{x}\a@b", "x"),
            (
                grouping,
                r"\catcode`\^=12 {\catcode`\^=1 }^",
                r"\catcode`\^=12 ^"
            ),
            (
                global,
                r"{\global\catcode`\;=1 };a}b",
                "ab"
            ),
            (
                texbook_exercise_20_7,
                r"\catcode`\[=1 \catcode`\]=2 \catcode`\!=6 \def\!!1#2![{!#]#!!2}\! x{[y]][z}",
                r"\catcode`\[=1 \catcode`\]=2 \catcode`\!=6 {#]![y][z}",
            ),
        ),
        failure_tests(
            (catcode_value_too_large, r"\catcode 48 16"),
            (catcode_value_is_negative, r"\catcode 48 -1"),
            (character_is_negative, r"\catcode -1 = 12"),
            (end_of_input, r"\catcode 48"),
        ),
    ];
}
