/*!
Texpand unit testing library

This is a crate for writing unit tests for code that uses Texpand.
It is used extensively in the Texpand standard library,
    so the unit tests there are good examples of what this crate can do.

## Basic setup

Each unit test built with this library works with a specific user-defined Texpand state type.
This state type is provided by the unit test writer.
In addition to implementing the [`TexpandState`] trait, this state must also:

1. Include the [`TestingComponent`] type as a component.
    I.e., the state must implement the [`HasComponent<TestingComponent>`](texpand::traits::HasComponent<TestingComponent>) trait.

1. Implement [`Default`].

If the unit test doesn't require anything else from the state,
    the [`State`] type defined in this library can simply be used.
It classifies characters using the plain TeX category codes.

## Test types

### Expansion equality tests

Run using [`run_expansion_equality_test`].

These tests verify that two different TeX snippets expand to the same output.
For example, an output equality test can verify that
```tex
\def\HelloWorld{Hola Mundo}\HelloWorld - \HelloWorld
```
and
```tex
Hola Mundo - Hola Mundo
```
produce the same output.

These tests do _not_ verify that the state of the VM is the same in both cases.

### Failure tests

Run using [`run_failure_test`].

These tests verify that a specific TeX snippet fails to execute.
The variant [`run_failure_test_with_category`] additionally checks the category of the error.

## The test suite macro

The preferred way to write a suite of unit tests is to use the [`test_suite`] macro.
See the macro's documentation for instructions on using it.
*/

use std::collections::HashMap;

use texpand::command;
use texpand::error;
use texpand::implement_has_component;
use texpand::prelude as txl;
use texpand::token;
use texpand::traits::*;
use texpand::vm;
use texpand::vm::VM;

/// Texpand component that every unit testing state needs to have.
#[derive(Default)]
pub struct TestingComponent {
    allow_undefined_command: bool,
    tokens: Vec<token::Token>,
}

impl TestingComponent {
    fn take_tokens(&mut self) -> Vec<token::Token> {
        std::mem::take(&mut self.tokens)
    }
}

/// Simple state type for simple unit tests.
///
/// If the primitives under test don't require custom components or
/// other pieces in the state, it is easier to use this type rather than defining a custom one.
pub struct State {
    cat_codes: token::CatCodeTable,
    testing: TestingComponent,
}

impl Default for State {
    fn default() -> Self {
        State {
            cat_codes: token::CatCodeTable::plain_tex(),
            testing: Default::default(),
        }
    }
}

impl TexpandState for State {
    fn cat_code(&self, c: char) -> token::CatCode {
        self.cat_codes.classify(c)
    }
}

implement_has_component![State, (TestingComponent, testing),];

/// In-memory file system for tests that read files.
pub struct InMemoryFileSystem {
    working_directory: std::path::PathBuf,
    files: HashMap<std::path::PathBuf, String>,
}

impl InMemoryFileSystem {
    /// Create a new in-memory file system.
    ///
    /// Typically the working directory is taken from the VM.
    pub fn new(working_directory: &std::path::Path) -> Self {
        Self {
            working_directory: working_directory.into(),
            files: Default::default(),
        }
    }

    /// Add a file to the in-memory file system.
    ///
    /// The provided path is relative to the working directory.
    pub fn add_file(&mut self, relative_path: &str, content: &str) {
        let mut path = self.working_directory.clone();
        path.push(relative_path);
        self.files.insert(path, content.to_string());
    }
}

impl vm::FileSystem for InMemoryFileSystem {
    fn read_to_string(&self, path: &std::path::Path) -> std::io::Result<String> {
        match self.files.get(path) {
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!["no file at {}", path.display()],
            )),
            Some(content) => Ok(content.clone()),
        }
    }
}

/// Option passed to a test runner.
pub enum TestOption<'a, S> {
    /// The built-in commands are the result of invoking the provided static function.
    ///
    /// Overrides previous `BuiltInCommands` or `BuiltInCommandsDyn` options.
    BuiltInCommands(fn() -> HashMap<&'static str, command::BuiltIn<S>>),

    /// The built-in commands are the result of invoking the provided closure.
    ///
    /// Overrides previous `BuiltInCommands` or `BuiltInCommandsDyn` options.
    BuiltInCommandsDyn(Box<dyn Fn() -> HashMap<&'static str, command::BuiltIn<S>> + 'a>),

    /// The provided static function is invoked after the VM is created and before execution starts.
    ///
    /// Overrides previous `CustomVMInitialization` or `CustomVMInitializationDyn` options.
    CustomVMInitialization(fn(&mut VM<S>)),

    /// The provided closure is invoked after the VM is created and before execution starts.
    ///
    /// Overrides previous `CustomVMInitialization` or `CustomVMInitializationDyn` options.
    #[allow(clippy::type_complexity)]
    CustomVMInitializationDyn(Box<dyn Fn(&mut VM<S>) + 'a>),

    /// Whether undefined commands raise an error.
    ///
    /// Overrides previous `AllowUndefinedCommands` options.
    AllowUndefinedCommands(bool),
}

/// Run an expansion equality test.
///
/// The test passes if the two provided input strings expand to the same tokens.
pub fn run_expansion_equality_test<S>(lhs: &str, rhs: &str, options: &[TestOption<S>])
where
    S: Default + HasComponent<TestingComponent>,
{
    let options = ResolvedOptions::new(options);

    let mut vm_1 = initialize_vm(&options);
    let output_1 = match execute_source_code(&mut vm_1, lhs, &options) {
        Ok(output) => output,
        Err(err) => panic!("left hand side failed to run:\n{err}"),
    };

    let mut vm_2 = initialize_vm(&options);
    let output_2 = match execute_source_code(&mut vm_2, rhs, &options) {
        Ok(output) => output,
        Err(err) => panic!("right hand side failed to run:\n{err}"),
    };
    compare_output(output_1, &vm_1, output_2, &vm_2);
}

fn compare_output<S>(
    mut output_1: Vec<token::Token>,
    vm_1: &vm::VM<S>,
    mut output_2: Vec<token::Token>,
    vm_2: &vm::VM<S>,
) {
    let trim_space = |v: &mut Vec<token::Token>| {
        if v.last().map(token::Token::is_space) == Some(true) {
            v.pop();
        }
    };
    trim_space(&mut output_1);
    trim_space(&mut output_2);

    let equal = match output_1.len() == output_2.len() {
        false => {
            println!(
                "output lengths do not match: {} != {}",
                output_1.len(),
                output_2.len()
            );
            false
        }
        true => output_1
            .iter()
            .zip(output_2.iter())
            .all(|(token_1, token_2)| match (token_1.command_ref(), token_2.command_ref()) {
                // Interned names are only comparable within one VM.
                (Some(command_ref_1), Some(command_ref_2)) => {
                    command_ref_1.namespace() == command_ref_2.namespace()
                        && command_ref_1.to_string(vm_1.cs_name_interner())
                            == command_ref_2.to_string(vm_2.cs_name_interner())
                }
                _ => token_1 == token_2,
            }),
    };

    if !equal {
        println!("Expansion output is different:");
        println!("------[lhs]------");
        println!(
            "'{}'",
            token::write_tokens(&output_1, vm_1.cs_name_interner())
        );
        println!("------[rhs]------");
        println!(
            "'{}'",
            token::write_tokens(&output_2, vm_2.cs_name_interner())
        );
        println!("-----------------");
        panic!("Expansion test failed");
    }
}

/// Run a failure test.
///
/// The test passes if execution of the provided input fails.
/// The error is returned so that callers can make further assertions on it.
pub fn run_failure_test<S>(input: &str, options: &[TestOption<S>]) -> Box<error::Error>
where
    S: Default + HasComponent<TestingComponent>,
{
    let options = ResolvedOptions::new(options);

    let mut vm = initialize_vm(&options);
    match execute_source_code(&mut vm, input, &options) {
        Ok(output) => {
            println!("Expansion succeeded:");
            println!("{}", token::write_tokens(&output, vm.cs_name_interner()));
            panic!("Expansion failure test did not pass: expansion successful");
        }
        Err(err) => {
            println!("{err}");
            err
        }
    }
}

/// Run a failure test and check the category of the resulting error.
pub fn run_failure_test_with_category<S>(
    input: &str,
    category: error::Category,
    options: &[TestOption<S>],
) where
    S: Default + HasComponent<TestingComponent>,
{
    let err = run_failure_test(input, options);
    assert_eq!(err.category(), category, "unexpected error category");
}

struct ResolvedOptions<'a, S> {
    built_in_commands: &'a dyn Fn() -> HashMap<&'static str, command::BuiltIn<S>>,
    custom_vm_initialization: &'a dyn Fn(&mut VM<S>),
    allow_undefined_commands: bool,
}

impl<'a, S> ResolvedOptions<'a, S> {
    pub fn new(options: &'a [TestOption<S>]) -> Self {
        let mut resolved = Self {
            built_in_commands: &HashMap::new,
            custom_vm_initialization: &|_| {},
            allow_undefined_commands: false,
        };
        for option in options {
            match option {
                TestOption::BuiltInCommands(f) => resolved.built_in_commands = f,
                TestOption::BuiltInCommandsDyn(f) => resolved.built_in_commands = f,
                TestOption::CustomVMInitialization(f) => resolved.custom_vm_initialization = f,
                TestOption::CustomVMInitializationDyn(f) => resolved.custom_vm_initialization = f,
                TestOption::AllowUndefinedCommands(b) => resolved.allow_undefined_commands = *b,
            }
        }
        resolved
    }
}

fn initialize_vm<S: Default>(options: &ResolvedOptions<S>) -> Box<vm::VM<S>> {
    let mut vm = VM::<S>::new((options.built_in_commands)());
    (options.custom_vm_initialization)(&mut vm);
    vm
}

fn execute_source_code<S>(
    vm: &mut vm::VM<S>,
    source: &str,
    options: &ResolvedOptions<S>,
) -> txl::Result<Vec<token::Token>>
where
    S: Default + HasComponent<TestingComponent>,
{
    vm.push_source("testing.tex", source);
    vm.state.component_mut().allow_undefined_command = options.allow_undefined_commands;
    vm.run::<Handlers>()?;
    Ok(vm.state.component_mut().take_tokens())
}

struct Handlers;

impl<S: HasComponent<TestingComponent>> vm::Handlers<S> for Handlers {
    fn character_handler(
        token: token::Token,
        input: &mut vm::ExecutionInput<S>,
    ) -> txl::Result<()> {
        input.state_mut().component_mut().tokens.push(token);
        Ok(())
    }

    fn undefined_command_handler(
        token: token::Token,
        input: &mut vm::ExecutionInput<S>,
    ) -> txl::Result<()> {
        if input.state().component().allow_undefined_command {
            input.state_mut().component_mut().tokens.push(token);
            Ok(())
        } else {
            Err(error::UndefinedCommandError::new(input.vm(), token).into())
        }
    }

    fn unexpanded_expansion_command(
        token: token::Token,
        input: &mut vm::ExecutionInput<S>,
    ) -> txl::Result<()> {
        input.state_mut().component_mut().tokens.push(token);
        Ok(())
    }
}

/// Macro to generate a suite of unit tests
///
/// The general use of this macros looks like this:
/// ```
/// # use texpand_testing::*;
/// # use std::collections::HashMap;
/// # fn built_in_commands() -> HashMap<&'static str, texpand::command::BuiltIn<State>> {
/// #   HashMap::new()
/// # }
/// test_suite![
///     state(State),
///     options(TestOption::BuiltInCommands(built_in_commands)),
///     expansion_equality_tests(
///         (case_1, "lhs_1", "lhs_1"),
///         (case_2, "lhs_2", "lhs_2"),
///     ),
///     failure_tests(
///         (case_3, "}"),
///     ),
/// ];
/// ```
///
/// The arguments to the macro are:
///
/// - `state(State)`: defines which Rust type to use as the VM state in the tests.
///     This can be omitted, in which case it defaults to the type name `State` in the current scope.
///
/// - `options(option_1, option_2, ..., option_n)`: options to pass to the test runner.
///     This is a list of values of type [TestOption].
///     The options can be omitted, in which case they default to `options(TestOption::BuiltInCommands(built_in_commands))`.
///     In this case `built_in_commands` is a static function that returns a list of built-in primitives
///     to initialize the VM with.
///
/// - `expansion_equality_tests(cases...)`: a list of expansion equality test cases.
///     Each case is of the form (case name, left hand side, right hand side).
///     The data here is fed into the [run_expansion_equality_test] test runner.
///
/// - `failure_tests(cases...)`: a list of failure test cases.
///     Each case is of the form (case name, input).
///     The data here is fed into the [run_failure_test] test runner.
///
/// - `failure_tests_with_category(cases...)`: a list of failure test cases
///     of the form (case name, input, category).
///     The category is a variant of [texpand::error::Category].
///
/// Only one `state()` argument may be provided, and if provided it must be in the first position.
/// Only one `options()` argument may be provided, and if provided it must be in the first position
///     or after the `state()` argument.
/// Zero or more of the other arguments may be provided, and in any order.
#[macro_export]
macro_rules! test_suite {
    ( state($state: ty), options $options: tt, expansion_equality_tests ( $( ($name: ident, $lhs: expr, $rhs: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let lhs = $lhs;
                let rhs = $rhs;
                let options = vec! $options;
                $crate::run_expansion_equality_test::<$state>(&lhs, &rhs, &options);
            }
        )*
    );
    ( state($state: ty), options $options: tt, expansion_equality_tests $test_body: tt $(,)? ) => (
        compile_error!("Invalid test cases for expansion_equality_tests: must be a list of tuples (name, lhs, rhs)");
    );
    ( state($state: ty), options $options: tt, failure_tests ( $( ($name: ident, $input: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let input = $input;
                let options = vec! $options;
                $crate::run_failure_test::<$state>(&input, &options);
            }
        )*
    );
    ( state($state: ty), options $options: tt, failure_tests_with_category ( $( ($name: ident, $input: expr, $category: ident $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let input = $input;
                let options = vec! $options;
                $crate::run_failure_test_with_category::<$state>(
                    &input,
                    ::texpand::error::Category::$category,
                    &options,
                );
            }
        )*
    );
    ( state($state: ty), options $options: tt, $test_kind: ident $test_cases: tt $(,)? ) => (
        compile_error!("Invalid keyword: test_suite! only accepts the following keywords: `state`, `options`, `expansion_equality_tests`, `failure_tests`, `failure_tests_with_category`");
    );
    ( state($state: ty), options $options: tt, $( $test_kind: ident $test_cases: tt ),+ $(,)? ) => (
        $(
            $crate::test_suite![state($state), options $options, $test_kind $test_cases,];
        )+
    );
    ( options $options: tt, $( $test_kind: ident $test_cases: tt ),+ $(,)? ) => (
        $crate::test_suite![state(State), options $options, $( $test_kind $test_cases, )+ ];
    );
    ( $( $test_kind: ident $test_cases: tt ),+ $(,)? ) => (
        $crate::test_suite![options ($crate::TestOption::BuiltInCommands(built_in_commands)), $( $test_kind $test_cases, )+ ];
    );
}
