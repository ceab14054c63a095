//! State shared by the unit tests of this crate.

use crate::catcode;
use crate::expansion;
use crate::namespace;
use crate::prefix;
use crate::tracingmacros;
use texpand::command;
use texpand::implement_has_component;
use texpand::prelude as txl;
use texpand::token;
use texpand::traits::*;
use texpand::vm;
use texpand_stdext::collections::groupingmap;

pub use texpand_testing::*;

#[derive(Default)]
pub struct State {
    catcode: catcode::Component,
    namespace: namespace::Component,
    prefix: prefix::Component,
    tracing_macros: tracingmacros::Component,
    testing: TestingComponent,
}

impl TexpandState for State {
    fn cat_code(&self, c: char) -> token::CatCode {
        catcode::cat_code(self, c)
    }

    fn namespace(&self) -> token::Namespace {
        namespace::namespace(self)
    }

    fn tracing_macros(&self) -> i32 {
        tracingmacros::tracing_macros(self)
    }

    fn expansion_override_hook(
        token: token::Token,
        input: &mut vm::ExpansionInput<Self>,
        tag: Option<command::Tag>,
    ) -> txl::Result<Option<token::Token>> {
        expansion::noexpand_hook(token, input, tag)
    }

    fn begin_group_hook(state: &mut Self) {
        catcode::begin_group_hook(state);
        namespace::begin_group_hook(state);
        tracingmacros::begin_group_hook(state);
    }

    fn end_group_hook(state: &mut Self) {
        catcode::end_group_hook(state);
        namespace::end_group_hook(state);
        tracingmacros::end_group_hook(state);
    }

    fn variable_assignment_scope_hook(state: &mut Self) -> groupingmap::Scope {
        prefix::variable_assignment_scope_hook(state)
    }
}

implement_has_component![
    State,
    (catcode::Component, catcode),
    (namespace::Component, namespace),
    (prefix::Component, prefix),
    (tracingmacros::Component, tracing_macros),
    (TestingComponent, testing),
];
