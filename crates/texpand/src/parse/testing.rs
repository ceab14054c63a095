use crate::token;
use crate::traits::*;
use crate::vm;
use std::collections::HashMap;
use std::fmt::Debug;

/// State with the plain TeX category codes.
pub struct State {
    cat_codes: token::CatCodeTable,
    pub tracing_macros: i32,
}

impl Default for State {
    fn default() -> Self {
        Self {
            cat_codes: token::CatCodeTable::plain_tex(),
            tracing_macros: 0,
        }
    }
}

impl TexpandState for State {
    fn cat_code(&self, c: char) -> token::CatCode {
        self.cat_codes.classify(c)
    }

    fn tracing_macros(&self) -> i32 {
        self.tracing_macros
    }
}

pub fn run_parse_success_test<S: TexpandState + Default, T: Parsable<S> + Debug + PartialEq>(
    source: &str,
    want: T,
) {
    let mut vm = vm::VM::<S>::new(HashMap::new());
    vm.push_source("main.tex", source);
    let input = vm::ExecutionInput::new(&mut vm);
    let got = match T::parse(input) {
        Ok(got) => got,
        Err(err) => panic!["failed to parse '{source}': {err}"],
    };
    assert_eq!(got, want);
}

pub fn run_parse_failure_test<S: TexpandState + Default, T: Parsable<S> + Debug>(source: &str) {
    let mut vm = vm::VM::<S>::new(HashMap::new());
    vm.push_source("main.tex", source);
    let input = vm::ExecutionInput::new(&mut vm);
    let result = T::parse(input);
    if let Ok(value) = result {
        panic![
            "Successfully parsed a value '{value:?}' of type '{}' from invalid input '{source}'",
            std::any::type_name::<T>()
        ];
    }
}

macro_rules! parse_success_tests {
    ($( ($name: ident, $input: expr, $expected: expr $(,)? ) ),+ $(,)? ) => {
        $(
        #[test]
        fn $name() {
            let source = $input;
            let want = $expected;
            run_parse_success_test::<State, _>(&source, want);
        }
        )+
    };
}

pub(crate) use parse_success_tests;

macro_rules! parse_failure_tests {
    ( $parsable_type: ty, $state: ty, $( ($name: ident, $input: expr), )+) => {
        $(
        #[test]
        fn $name() {
            let input = $input;
            run_parse_failure_test::<$state, $parsable_type>(&input);
        }
        )+
    };
}

pub(crate) use parse_failure_tests;
