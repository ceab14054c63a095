//! Primitives for creating user-defined macros (`\def` and `\gdef`).

use crate::prefix;
use texpand::command;
use texpand::prelude as txl;
use texpand::texmacro;
use texpand::token;
use texpand::traits::*;
use texpand::vm;
use texpand_stdext::collections::groupingmap;

pub const DEF_DOC: &str = "Define a custom macro";
pub const GDEF_DOC: &str = "Define a custom macro globally";

static DEF_TAG: command::StaticTag = command::StaticTag::new();

/// Tag shared by `\def` and `\gdef`.
pub fn def_tag() -> command::Tag {
    DEF_TAG.get()
}

/// Get the `\def` command.
pub fn get_def<S: HasComponent<prefix::Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(def_primitive_fn)
        .with_tag(def_tag())
        .with_doc(DEF_DOC)
}

/// Get the `\gdef` command.
pub fn get_gdef<S: HasComponent<prefix::Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(gdef_primitive_fn)
        .with_tag(def_tag())
        .with_doc(GDEF_DOC)
}

fn def_primitive_fn<S: HasComponent<prefix::Component>>(
    def_token: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    parse_and_set_macro(def_token, input, false)
}

fn gdef_primitive_fn<S: HasComponent<prefix::Component>>(
    def_token: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    parse_and_set_macro(def_token, input, true)
}

fn parse_and_set_macro<S: HasComponent<prefix::Component>>(
    _: token::Token,
    input: &mut vm::ExecutionInput<S>,
    set_globally_override: bool,
) -> txl::Result<()> {
    let prefixes = input.state_mut().component_mut().take_prefixes();
    let scope = if prefixes.global || set_globally_override {
        groupingmap::Scope::Global
    } else {
        groupingmap::Scope::Local
    };
    let name = token::CommandRef::parse(input)?;
    let pattern = texmacro::MacroPattern::parse(input.unexpanded())?;
    let body = texmacro::Macro::parse_body(input.unexpanded(), &pattern)?;
    let user_defined_macro = texmacro::Macro::new(prefixes.long, prefixes.outer, pattern, body);
    input
        .commands_map_mut()
        .insert_macro(name, user_defined_macro, scope);
    Ok(())
}
