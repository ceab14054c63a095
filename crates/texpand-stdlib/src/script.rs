//! Texpand as a scripting language
//!
//! Input is processed with the usual TeX semantics, but instead of being typeset
//!     the output is returned as a list of tokens.
//! The list can be converted to a string using [texpand::token::write_tokens].

use texpand::command;
use texpand::prelude as txl;
use texpand::token::Token;
use texpand::traits::*;
use texpand::vm;

pub const NEWLINE_DOC: &str = "Add a newline to the output";
pub const PAR_DOC: &str = "End the current paragraph by adding two newlines to the output";

#[derive(Default)]
pub struct Component {
    exec_output: Vec<Token>,
    num_trailing_newlines: usize,
    allow_undefined_commands: bool,
}

/// Get the `\newline` command.
///
/// This adds a newline to the output.
pub fn get_newline<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(newline_primitive_fn).with_doc(NEWLINE_DOC)
}

fn newline_primitive_fn<S: HasComponent<Component>>(
    t: Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    let c = input.state_mut().component_mut();
    let newline_token = Token::new_space('\n', t.trace_key());
    c.exec_output.push(newline_token);
    c.num_trailing_newlines += 1;
    Ok(())
}

/// Get the `\par` command.
///
/// The `\par` command adds two newlines to the output.
/// Consecutive `\par` commands are treated as one.
pub fn get_par<S: HasComponent<Component>>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(par_primitive_fn).with_doc(PAR_DOC)
}

fn par_primitive_fn<S: HasComponent<Component>>(
    t: Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    let c = input.state_mut().component_mut();
    if c.exec_output.is_empty() {
        return Ok(());
    }
    let par_token = Token::new_space('\n', t.trace_key());
    match c.num_trailing_newlines {
        0 => {
            c.exec_output.push(par_token);
            c.exec_output.push(par_token);
            c.num_trailing_newlines += 2;
        }
        1 => {
            c.exec_output.push(par_token);
            c.num_trailing_newlines += 1;
        }
        _ => {}
    }
    Ok(())
}

/// Run the VM and return the output as a list of tokens.
///
/// If `err_for_undefined_cs` is false, undefined control sequences are written to the output
///     instead of raising an error.
///
/// When an error occurs the rest of the file being read is discarded.
/// Running the VM again continues with the input that enclosed that file.
pub fn run<S: HasComponent<Component>>(
    vm: &mut vm::VM<S>,
    err_for_undefined_cs: bool,
) -> txl::Result<Vec<Token>> {
    vm.state.component_mut().allow_undefined_commands = !err_for_undefined_cs;
    let result = vm.run::<Handlers>();
    let output = std::mem::take(&mut vm.state.component_mut().exec_output);
    vm.state.component_mut().num_trailing_newlines = 0;
    if let Err(err) = result {
        vm.close_next_file_stream();
        return Err(err);
    }
    Ok(output)
}

struct Handlers;

impl<S: HasComponent<Component>> vm::Handlers<S> for Handlers {
    fn character_handler(mut token: Token, input: &mut vm::ExecutionInput<S>) -> txl::Result<()> {
        let c = input.state_mut().component_mut();
        if let Some('\n') = token.char() {
            token = Token::new_space(' ', token.trace_key());
        }
        c.exec_output.push(token);
        c.num_trailing_newlines = 0;
        Ok(())
    }

    fn undefined_command_handler(
        token: Token,
        input: &mut vm::ExecutionInput<S>,
    ) -> txl::Result<()> {
        if input.state().component().allow_undefined_commands {
            <Self as vm::Handlers<S>>::character_handler(token, input)
        } else {
            Err(texpand::error::UndefinedCommandError::new(input.vm(), token).into())
        }
    }

    fn unexpanded_expansion_command(
        token: Token,
        input: &mut vm::ExecutionInput<S>,
    ) -> txl::Result<()> {
        <Self as vm::Handlers<S>>::character_handler(token, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catcode;
    use crate::def;
    use crate::input;
    use crate::prefix;
    use std::collections::HashMap;
    use texpand::implement_has_component;
    use texpand::token;

    #[derive(Default)]
    struct State {
        catcode: catcode::Component,
        prefix: prefix::Component,
        script: Component,
    }

    impl TexpandState for State {
        fn cat_code(&self, c: char) -> token::CatCode {
            catcode::cat_code(self, c)
        }
    }

    implement_has_component![
        State,
        (catcode::Component, catcode),
        (prefix::Component, prefix),
        (Component, script),
    ];

    fn built_in_commands() -> HashMap<&'static str, command::BuiltIn<State>> {
        HashMap::from([
            ("par", get_par()),
            ("def", def::get_def()),
            ("input", input::get_input()),
            ("newline", get_newline()),
        ])
    }

    fn run_script(input: &str, err_for_undefined_cs: bool) -> txl::Result<String> {
        let mut vm = vm::VM::<State>::new(built_in_commands());
        vm.push_source("script.tex", input);
        let tokens = run(&mut vm, err_for_undefined_cs)?;
        Ok(token::write_tokens(&tokens, vm.cs_name_interner()))
    }

    macro_rules! script_test {
        ($name: ident, $input: expr, $want: expr) => {
            #[test]
            fn $name() {
                let got = run_script($input, false).unwrap();
                let want = $want.to_string();
                if got != want {
                    println!("Output is different:");
                    println!("------[got]-------");
                    println!("{}", got);
                    println!("------[want]------");
                    println!("{}", want);
                    println!("-----------------");
                    panic!("script test failed");
                }
            }
        };
    }

    script_test!(char_newline_1, "H\nW", "H W");
    script_test!(newline_1, "H\\newline W", "H\nW");
    script_test!(newline_2, "H\\newline \\newline W", "H\n\nW");
    script_test!(newline_3, "H\\newline \\newline \\newline W", "H\n\n\nW");
    script_test!(par_1, "H\n\n\nW", "H\n\nW");
    script_test!(par_2, "H\n\n\n\n\nW", "H\n\nW");
    script_test!(par_explicit, "H\\par\\par W", "H\n\nW");
    script_test!(par_at_start, "\\par W", "W");
    script_test!(macro_output, "\\def\\A#1{(#1)}\\A x\\A y", "(x)(y)");
    script_test!(undefined_command_written, "a \\undefined", "a \\undefined");

    #[test]
    fn undefined_command_error() {
        let err = run_script("a\\undefined b", true).unwrap_err();
        assert_eq!(
            err.category(),
            texpand::error::Category::UndefinedCommand
        );
    }

    #[test]
    fn output_is_reset_between_runs() {
        let mut vm = vm::VM::<State>::new(built_in_commands());
        vm.push_source("first.tex", "a");
        assert_eq!(run(&mut vm, true).unwrap().len(), 1);
        vm.push_source("second.tex", "bc");
        assert_eq!(run(&mut vm, true).unwrap().len(), 2);
    }

    fn new_vm_with_files() -> Box<vm::VM<State>> {
        let working_directory = std::path::PathBuf::from("/work");
        let mut file_system = texpand_testing::InMemoryFileSystem::new(&working_directory);
        file_system.add_file("broken.tex", r"before\undefined after");
        let mut vm = vm::VM::<State>::new(built_in_commands());
        vm.working_directory = Some(working_directory);
        vm.file_system = Box::new(file_system);
        vm
    }

    #[test]
    fn error_discards_the_rest_of_the_file() {
        let mut vm = new_vm_with_files();
        vm.push_source("main.tex", r"\input broken more");
        assert!(run(&mut vm, true).is_err());
        let output = run(&mut vm, true).unwrap();
        assert_eq!(token::write_tokens(&output, vm.cs_name_interner()), "more");
    }

    #[test]
    fn error_in_macro_discards_the_expansion() {
        let mut vm = new_vm_with_files();
        vm.push_source("main.tex", r"\def\A{a\undefined b}\A c");
        assert!(run(&mut vm, true).is_err());
        assert!(run(&mut vm, true).unwrap().is_empty());
        assert_eq!(vm.input_depth(), 0);
    }

    #[test]
    fn clear_sources_discards_all_input() {
        let mut vm = new_vm_with_files();
        vm.push_source("main.tex", r"\input broken more");
        assert!(run(&mut vm, true).is_err());
        vm.clear_sources();
        assert!(run(&mut vm, true).unwrap().is_empty());
    }
}
