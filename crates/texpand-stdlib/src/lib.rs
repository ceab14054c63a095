//! # The Texpand standard library
//!
//! This crate contains implementations of TeX primitives built on the Texpand core:
//! macro definition and aliasing, the `\global`, `\long` and `\outer` prefixes,
//! category codes, expansion control, file input, namespaces and macro tracing.
//!
//! Each primitive lives in a module together with the component that holds its state.
//! The [StdLibState] type includes every component and can run every primitive.

extern crate texpand;
extern crate texpand_stdext;

use std::collections::HashMap;

use texpand::command;
use texpand::implement_has_component;
use texpand::prelude as txl;
use texpand::token;
use texpand::traits::*;
use texpand::vm;
use texpand_stdext::collections::groupingmap;

pub mod alias;
pub mod catcode;
pub mod def;
pub mod expansion;
pub mod input;
pub mod namespace;
pub mod prefix;
pub mod script;
pub mod tracingmacros;

#[cfg(test)]
mod testing;

/// A state struct that is compatible with every primitive in the Texpand standard library.
#[derive(Default)]
pub struct StdLibState {
    pub catcode: catcode::Component,
    pub namespace: namespace::Component,
    pub prefix: prefix::Component,
    pub script: script::Component,
    pub tracing_macros: tracingmacros::Component,
}

impl TexpandState for StdLibState {
    #[inline]
    fn cat_code(&self, c: char) -> token::CatCode {
        catcode::cat_code(self, c)
    }

    #[inline]
    fn namespace(&self) -> token::Namespace {
        namespace::namespace(self)
    }

    #[inline]
    fn tracing_macros(&self) -> i32 {
        tracingmacros::tracing_macros(self)
    }

    #[inline]
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

    #[inline]
    fn variable_assignment_scope_hook(state: &mut Self) -> groupingmap::Scope {
        prefix::variable_assignment_scope_hook(state)
    }
}

impl StdLibState {
    pub fn all_initial_built_ins() -> HashMap<&'static str, command::BuiltIn<StdLibState>> {
        HashMap::from([
            ("catcode", catcode::get_catcode()),
            //
            ("def", def::get_def()),
            //
            ("endinput", input::get_endinput()),
            ("everyeof", input::get_everyeof()),
            ("expandafter", expansion::get_expandafter_optimized()),
            //
            ("gdef", def::get_gdef()),
            ("global", prefix::get_global()),
            //
            ("input", input::get_input()),
            //
            ("let", alias::get_let()),
            ("long", prefix::get_long()),
            //
            ("namespace", namespace::get_namespace()),
            ("newline", script::get_newline()),
            ("noexpand", expansion::get_noexpand()),
            //
            ("outer", prefix::get_outer()),
            //
            ("par", script::get_par()),
            //
            ("relax", expansion::get_relax()),
            //
            ("tracingmacros", tracingmacros::get_tracingmacros()),
        ])
    }

    /// Create a new VM that uses the standard library's state and all of its commands.
    pub fn new_vm() -> Box<vm::VM<StdLibState>> {
        vm::VM::<StdLibState>::new(StdLibState::all_initial_built_ins())
    }
}

implement_has_component![
    StdLibState,
    (catcode::Component, catcode),
    (namespace::Component, namespace),
    (prefix::Component, prefix),
    (script::Component, script),
    (tracingmacros::Component, tracing_macros),
];

/// A TeX snippet that exercises some error case in the standard library.
pub struct ErrorCase {
    pub description: &'static str,
    pub source_code: &'static str,
}

impl ErrorCase {
    /// Returns a vector of TeX snippets that exercise the error paths of Texpand.
    pub fn all_error_cases() -> Vec<ErrorCase> {
        let mut cases = vec![];
        for (description, source_code) in [
            ("file does not exist", r"\input doesNotExist"),
            ("end of input after \\global", r"\global"),
            ("\\relax between \\global and a character", r"\global \relax a"),
            ("can't be prefixed by \\global (character)", r"\global a"),
            ("can't be prefixed by \\long", r"\long \let \a = \def"),
            ("can't be prefixed by \\outer", r"\outer \let \a = \def"),
            ("undefined control sequence", r"\elephant"),
            ("empty control sequence", r"\"),
            ("invalid end of group", r"}"),
            ("end of input in a macro pattern", r"\def\A#1"),
            ("end of input in a macro body", r"\def\A{abc"),
            ("non-consecutive parameters", r"\def\A#1#3{}"),
            ("illegal parameter reference", r"\def\A#1{#2}"),
            ("end group in a macro pattern", r"\def\A}{}"),
            ("macro use does not match", r"\def\A.{}\A,"),
            ("runaway argument", r"\def\A#1{}\A\par"),
            ("extra right brace", r"\def\A#1.{}\A a}."),
            ("end of input reading an argument", r"\def\A#1{}\A"),
            ("outer macro in a pattern", r"\outer\def\B{}\def\A\B{}"),
            ("outer macro in an argument", r"\outer\def\B{}\def\A#1{}\A\B"),
            ("invalid start of number", r"\catcode X"),
            ("invalid start of number (eof)", r"\catcode"),
            ("invalid character", r"\catcode `\def"),
            ("invalid character (eof)", r"\catcode `"),
            ("invalid octal digit", r"\catcode '9"),
            ("invalid hexadecimal digit", "\\catcode \"Z"),
            ("decimal number too big", r"\catcode 1000000000000000000000"),
            ("category code out of bounds", r"\catcode 0 = 17"),
            ("invalid command target", r"\let a = \relax"),
            ("invalid command target (eof)", r"\let"),
            ("alias of undefined command", r"\let \a = \undefined"),
            ("end of input after \\noexpand", r"\noexpand"),
            ("end of input after \\expandafter", r"\expandafter\relax"),
            ("invalid namespace", r"\namespace{\relax}"),
            ("end of input in \\everyeof", r"\everyeof{"),
            ("invalid \\tracingmacros value", r"\tracingmacros = x"),
        ] {
            cases.push(ErrorCase {
                description,
                source_code,
            })
        }
        cases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source_code: &str) -> txl::Result<String> {
        let mut vm = StdLibState::new_vm();
        vm.push_source("main.tex", source_code);
        let output = script::run(&mut vm, true)?;
        Ok(token::write_tokens(&output, vm.cs_name_interner()))
    }

    #[test]
    fn all_error_cases() {
        for case in ErrorCase::all_error_cases() {
            println!("CASE {}", case.description);
            if let Ok(output) = run(case.source_code) {
                panic!(
                    "case '{}' ran successfully with output '{}'",
                    case.description, output
                );
            }
        }
    }

    #[test]
    fn every_primitive_together() {
        let source = r"\tracingmacros=0 \def\greet#1{Hello, #1!}%
\let\salute\greet
\global\long\def\twice#1{#1#1}%
\namespace{local}\def\greet#1{Hi #1}\namespace{}%
\expandafter\twice\expandafter{\salute{World}}\relax
\par
\noexpand\par done";
        assert_eq!(
            run(source).unwrap(),
            "Hello, World!Hello, World!\n\ndone"
        );
    }

    #[test]
    fn all_built_ins_have_docs() {
        for (name, built_in) in StdLibState::all_initial_built_ins() {
            assert!(built_in.doc().is_some(), "\\{name} has no documentation");
        }
    }
}
