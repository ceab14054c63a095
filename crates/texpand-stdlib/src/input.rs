//! Primitives for reading input files

use std::path;
use texpand::command;
use texpand::error;
use texpand::parse::OptionalEqualsUnexpanded;
use texpand::prelude as txl;
use texpand::token;
use texpand::traits::*;
use texpand::vm;

pub const INPUT_DOC: &str = "Insert the contents of a file into the input";
pub const ENDINPUT_DOC: &str = "Stop reading the current file";
pub const EVERYEOF_DOC: &str = "Set the tokens inserted at the end of every file";

const DEFAULT_EXTENSION: &str = "tex";

/// Get the `\input` expansion primitive.
pub fn get_input<S: TexpandState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(input_fn).with_doc(INPUT_DOC)
}

fn input_fn<S: TexpandState>(
    input_token: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<()> {
    let file_name = FileName::parse(input)?;
    let (file_path, source_code) = read_file(input_token, input.vm(), &file_name)?;
    input.push_source(input_token, file_path, &source_code);
    Ok(())
}

/// Get the `\endinput` expansion primitive.
pub fn get_endinput<S: TexpandState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(endinput_fn).with_doc(ENDINPUT_DOC)
}

fn endinput_fn<S: TexpandState>(
    _: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<()> {
    input.end_current_file();
    Ok(())
}

static EVERYEOF_TAG: command::StaticTag = command::StaticTag::new();

pub fn everyeof_tag() -> command::Tag {
    EVERYEOF_TAG.get()
}

/// Get the `\everyeof` execution primitive.
///
/// The syntax is `\everyeof <optional equals> {<balanced text>}`.
/// The tokens are inserted whenever a file ends.
/// The setting is not undone at the end of a group.
pub fn get_everyeof<S: TexpandState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(everyeof_fn)
        .with_tag(everyeof_tag())
        .with_doc(EVERYEOF_DOC)
}

fn everyeof_fn<S: TexpandState>(
    _: token::Token,
    input: &mut vm::ExecutionInput<S>,
) -> txl::Result<()> {
    // Consumes any \global prefix.
    _ = S::variable_assignment_scope_hook(input.state_mut());
    OptionalEqualsUnexpanded::parse(input)?;
    let tokens = texpand::parse::get_tokens(input.unexpanded())?;
    input.set_every_eof(tokens);
    Ok(())
}

/// A file name as it appears after `\input`.
///
/// The name is made of character tokens and ends at the first space, which is consumed,
///     or at the first non-character token, which is not.
#[derive(Debug, PartialEq, Eq)]
struct FileName {
    name: String,
    has_extension: bool,
}

impl<S: TexpandState> Parsable<S> for FileName {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        let mut name = String::new();
        let mut has_extension = false;
        while let Some(token) = input.next()? {
            let c = match token.value() {
                token::Value::Space(_) => {
                    if name.is_empty() {
                        continue;
                    }
                    break;
                }
                token::Value::Letter(c) | token::Value::Other(c) => c,
                _ => {
                    input.back(token);
                    break;
                }
            };
            match c {
                '.' => has_extension = true,
                '/' => has_extension = false,
                _ => (),
            }
            name.push(c);
        }
        if name.is_empty() {
            let got = input.peek()?;
            return Err(texpand::parse::Error::new(
                input.vm(),
                "a file name",
                got,
                r"the file name after \input must contain at least one character",
            )
            .into());
        }
        Ok(FileName {
            name,
            has_extension,
        })
    }
}

fn read_file<S>(
    token: token::Token,
    vm: &vm::VM<S>,
    file_name: &FileName,
) -> txl::Result<(path::PathBuf, String)> {
    let mut raw_path = path::PathBuf::from(&file_name.name);
    if !file_name.has_extension {
        raw_path.set_extension(DEFAULT_EXTENSION);
    }
    let file_path = if raw_path.is_absolute() {
        raw_path
    } else {
        match &vm.working_directory {
            None => {
                return Err(error::SimpleTokenError::new(
                    vm,
                    token,
                    format![
                        "cannot resolve the relative path {} because the working directory is not set",
                        raw_path.display()
                    ],
                )
                .into())
            }
            Some(working_directory) => working_directory.join(raw_path),
        }
    };
    match vm.file_system.read_to_string(&file_path) {
        Ok(source_code) => Ok((file_path, source_code)),
        Err(err) => Err(error::SimpleTokenError::new(
            vm,
            token,
            format!["could not read from {}: {}", file_path.display(), err],
        )
        .into()),
    }
}
