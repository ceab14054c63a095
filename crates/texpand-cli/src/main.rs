use clap::Parser;
use colored::Colorize;
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use texpand::prelude as txl;
use texpand::*;
use texpand_stdlib::script;
use texpand_stdlib::StdLibState;

/// Expand TeX macros from the command line.
///
/// Input is processed with TeX's macro expansion semantics and the
///   resulting characters are printed to standard output.
/// See the subcommands for things it can do.
#[derive(Parser)]
#[clap(version, name = "texpand")]
struct Cli {
    /// Initial value of \tracingmacros
    #[arg(long)]
    tracing_macros: Option<i32>,

    /// File that macro traces are written to. Default: standard error.
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[clap(subcommand)]
    sub_command: SubCommand,
}

#[derive(Parser)]
enum SubCommand {
    Doc(Doc),
    Eval(Eval),
    Run(Run),
}

/// Print documentation for a primitive
#[derive(Parser)]
struct Doc {
    /// Name of the control sequence
    name: Option<String>,
}

/// Expand a snippet of TeX
#[derive(Parser)]
struct Eval {
    /// The TeX source. If not provided, the source is read from standard input.
    source: Option<String>,
}

/// Expand a TeX file
#[derive(Parser)]
struct Run {
    /// Path to the TeX file to run
    file_path: PathBuf,
}

fn main() {
    let args: Cli = Cli::parse();
    let mut vm = StdLibState::new_vm();
    if let Err(err) = configure_log_file(&mut vm, args.log_file) {
        println!["{err}"];
        std::process::exit(1);
    }
    let result = match args.sub_command {
        SubCommand::Doc(d) => doc(&vm, d.name),
        SubCommand::Eval(eval_args) => read_source(eval_args.source).map(|source| {
            vm.push_terminal_input(source);
        }),
        SubCommand::Run(run_args) => push_file(&mut vm, run_args.file_path),
    };
    if let Err(err) = result {
        println!["{err}"];
        std::process::exit(1);
    }
    if vm.input_depth() == 0 {
        return;
    }
    if let Some(value) = args.tracing_macros {
        vm.push_string("command line", format![r"\tracingmacros={value}\relax"]);
    }
    if let Err(err) = run(&mut vm) {
        println!["{err}"];
        std::process::exit(1);
    }
}

fn run(vm: &mut vm::VM<StdLibState>) -> txl::Result<()> {
    let output = script::run(vm, true)?;
    println!["{}", token::write_tokens(&output, vm.cs_name_interner())];
    Ok(())
}

fn configure_log_file(
    vm: &mut vm::VM<StdLibState>,
    log_file: Option<PathBuf>,
) -> Result<(), String> {
    match log_file {
        None => {
            vm.log_file = Rc::new(RefCell::new(std::io::stderr()));
        }
        Some(path) => match fs::File::create(&path) {
            Ok(file) => {
                vm.log_file = Rc::new(RefCell::new(file));
            }
            Err(err) => return Err(format!["Failed to create log file {:?}: {err}", &path]),
        },
    }
    Ok(())
}

fn push_file(vm: &mut vm::VM<StdLibState>, mut path: PathBuf) -> Result<(), String> {
    if path.extension().is_none() {
        path.set_extension("tex");
    }
    let source_code = match fs::read_to_string(&path) {
        Ok(source_code) => source_code,
        Err(err) => return Err(format!["Failed to open file {:?}: {err}", &path]),
    };
    if let Some(parent) = path.parent() {
        if let Some(working_directory) = &vm.working_directory {
            vm.working_directory = Some(working_directory.join(parent));
        }
    }
    vm.push_source(path, source_code);
    Ok(())
}

fn read_source(source: Option<String>) -> Result<String, String> {
    match source {
        Some(source) => Ok(source),
        None => std::io::read_to_string(std::io::stdin())
            .map_err(|err| format!["Failed to read standard input: {err}"]),
    }
}

fn doc(vm: &vm::VM<StdLibState>, cs_name: Option<String>) -> Result<(), String> {
    match cs_name {
        None => {
            let mut cs_names = vm.control_sequence_names();
            cs_names.sort();
            let mut last_prefix = None;
            for (i, cs_name) in cs_names.into_iter().enumerate() {
                let new_last_prefix = cs_name.chars().next();
                if last_prefix != new_last_prefix {
                    last_prefix = new_last_prefix;
                    if i != 0 {
                        println!();
                    }
                }
                let doc = doc_for(vm, cs_name).unwrap_or_default();
                let first_line = doc.split('\n').next().unwrap_or("");
                println!["\\{}  {}", cs_name.bold(), first_line];
            }
            Ok(())
        }
        Some(name) => {
            let name = name.trim_start_matches('\\');
            match doc_for(vm, name) {
                None => Err(format!("Unknown command \\{name}")),
                Some(doc) => {
                    println!["\\{}  {}", name.bold(), doc];
                    Ok(())
                }
            }
        }
    }
}

fn doc_for(vm: &vm::VM<StdLibState>, name: &str) -> Option<String> {
    let cs_name = vm.cs_name_interner().get(name)?;
    let command_ref = token::CommandRef::ControlSequence(cs_name, token::Namespace::DEFAULT);
    match vm.commands_map.get_command(&command_ref)? {
        command::Command::Macro(texmacro) => Some(texmacro.doc(vm.cs_name_interner())),
        _ => {
            let built_in = vm.commands_map.built_in_commands().get(&cs_name)?;
            Some(built_in.doc().unwrap_or("").to_string())
        }
    }
}
