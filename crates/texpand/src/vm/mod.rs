//! The Texpand virtual machine (VM).
//!
//! This module contains the definition of the runtime VM,
//!     the mouth (the stack of token streams the VM reads from),
//!     various input types that wrap the VM
//!     and the main loop that is used to run Texpand.

use crate::command;
use crate::command::BuiltIn;
use crate::command::Command;
use crate::error;
use crate::prelude as txl;
use crate::token;
use crate::token::lexer::Classifier;
use crate::token::trace;
use crate::token::CsNameInterner;
use crate::token::Token;
use crate::token::TokenFactory;
use crate::token::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use texpand_stdext::collections::groupingmap;

mod mouth;
mod source;
mod streams;
pub use mouth::Observers;
pub use streams::*;

/// Implementations of this trait determine how the VM handles non-execution-command tokens.
///
/// The main loop of the VM reads the next expanded token and performs
///     some action based on the token.
/// Some cases are handled automatically based on the semantics of the TeX language:
///
/// | token type | example | action |
/// | -- | -- | -- |
/// | execution command | `\def` | run the command |
/// | token alias | `\a` after `\let\a=a` | handle the aliased character token |
/// | begin group character | `{` | begin a group
/// | end group character | `}` | end the current group
///
/// The remaining cases are specified by implementing the associated handler:
///
/// | token type | example | handler | default |
/// | --- | --- | --- | --- |
/// | character token | `b` | [character_handler](Handlers::character_handler) | do nothing
/// | undefined command | `\b` where `\b` was never defined | [undefined_command_handler](Handlers::undefined_command_handler) | return an undefined control sequence error
/// | unexpanded expansion command | `\x` in `\noexpand\x` | [unexpanded_expansion_command](Handlers::unexpanded_expansion_command) | do nothing
pub trait Handlers<S: TexpandState> {
    /// Handler to invoke for character tokens.
    ///
    /// This handler is _not_ invoked for begin group and end group tokens.
    fn character_handler(token: Token, input: &mut ExecutionInput<S>) -> txl::Result<()> {
        _ = (token, input);
        Ok(())
    }

    /// Handler to invoke for a control sequence or active character for which no command is defined.
    fn undefined_command_handler(token: Token, input: &mut ExecutionInput<S>) -> txl::Result<()> {
        Err(error::UndefinedCommandError::new(input.vm(), token).into())
    }

    /// Handler to invoke for expansion commands that were not expanded.
    fn unexpanded_expansion_command(
        token: Token,
        input: &mut ExecutionInput<S>,
    ) -> txl::Result<()> {
        _ = (token, input);
        Ok(())
    }
}

pub struct DefaultHandlers;

impl<S: TexpandState> Handlers<S> for DefaultHandlers {}

impl<S: TexpandState> VM<S> {
    /// Run the VM.
    ///
    /// It is assumed that the VM has been preloaded with source code using
    /// [VM::push_source] or one of the related methods.
    pub fn run<H: Handlers<S>>(&mut self) -> txl::Result<()> {
        let input = ExecutionInput::new(self);
        loop {
            let token = match input.next()? {
                None => break,
                Some(token) => token,
            };
            match token.value() {
                Value::CommandRef(command_ref) => {
                    match input.commands_map().get_command(&command_ref).cloned() {
                        Some(Command::Execution(cmd, _)) => {
                            if let Err(err) = cmd(token, input) {
                                return Err(error::Error::new_propagated(
                                    input.vm(),
                                    error::PropagationContext::Execution,
                                    token,
                                    err,
                                ));
                            }
                        }
                        Some(Command::CharacterTokenAlias(value)) => {
                            let token = Token::new_from_value(value, token.trace_key());
                            match value {
                                Value::BeginGroup(_) => input.begin_group(),
                                Value::EndGroup(_) => input.end_group(token)?,
                                _ => H::character_handler(token, input)?,
                            }
                        }
                        Some(Command::Expansion(_, _)) | Some(Command::Macro(_)) => {
                            H::unexpanded_expansion_command(token, input)?
                        }
                        None => H::undefined_command_handler(token, input)?,
                    }
                }
                Value::BeginGroup(_) => {
                    input.begin_group();
                }
                Value::EndGroup(_) => {
                    input.end_group(token)?;
                }
                Value::MathShift(_)
                | Value::AlignmentTab(_)
                | Value::Parameter(_)
                | Value::Superscript(_)
                | Value::Subscript(_)
                | Value::Space(_)
                | Value::Letter(_)
                | Value::Other(_) => H::character_handler(token, input)?,
            };
        }
        Ok(())
    }
}

#[derive(Debug)]
struct EndOfGroupError {
    trace: trace::SourceCodeTrace,
}

impl error::TexError for EndOfGroupError {
    fn kind(&self) -> error::Kind {
        error::Kind::Token(&self.trace)
    }

    fn category(&self) -> error::Category {
        error::Category::SyntaxMismatch
    }

    fn title(&self) -> String {
        "there is no group to end".into()
    }
}

/// The Texpand virtual machine.
pub struct VM<S> {
    /// The state
    pub state: S,

    /// The commands map
    pub commands_map: command::Map<S>,

    /// File system operations
    ///
    /// By default this is real operations on the file system.
    /// It is replaceable to support unit testing.
    pub file_system: Box<dyn FileSystem>,

    /// Writer that writes to the terminal
    ///
    /// Defaults to standard error.
    pub terminal_out: Rc<RefCell<dyn std::io::Write>>,

    /// Writer that writes to the log file
    ///
    /// Defaults to a sink writer that writes nothing.
    /// Macro tracing output is written here.
    pub log_file: Rc<RefCell<dyn std::io::Write>>,

    /// The working directory which is used as the root for relative file paths
    ///
    /// This is [None] if the working directory could not be determined.
    pub working_directory: Option<std::path::PathBuf>,

    internal: Internal,
}

/// File system operations that TeX may need to perform.
///
/// These operations are extracted to a trait so that they be mocked out in unit testing.
pub trait FileSystem {
    /// Read the entire contents of a file into a string.
    ///
    /// This is implemented by [std::fs::read_to_string].
    fn read_to_string(&self, path: &std::path::Path) -> std::io::Result<String>;
}

struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &std::path::Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Implementations of this trait may be used as the state in a Texpand VM.
///
/// The trait has no required methods.
/// For any type it can be implemented trivially:
/// ```
/// # use texpand::traits::TexpandState;
/// struct SomeNewType;
///
/// impl TexpandState for SomeNewType {}
/// ```
///
/// Methods of the trait are invoked at certain points when the VM is running,
///     and offer a way of customizing the behavior of the VM.
/// The trait methods are all dispatched statically.
pub trait TexpandState: Sized {
    /// Get the category code for the provided character.
    ///
    /// The default implementation returns [token::CatCode::default_for].
    fn cat_code(&self, c: char) -> token::CatCode {
        token::CatCode::default_for(c)
    }

    /// Namespace of the control sequences and active characters produced by the lexer.
    fn namespace(&self) -> token::Namespace {
        token::Namespace::DEFAULT
    }

    /// Value of `\tracingmacros`. When positive, macro expansions are written to the log.
    fn tracing_macros(&self) -> i32 {
        0
    }

    /// Hook that potentially overrides the expansion of a command.
    ///
    /// This hook is invoked before an expandable token is expanded.
    /// If the result of the hook is non-empty, that result is considered the expansion of
    ///   the token.
    /// The result of the hook is not expanded before being returned.
    ///
    /// This hook is designed to support the `\noexpand` primitive.
    fn expansion_override_hook(
        token: Token,
        input: &mut ExpansionInput<Self>,
        tag: Option<command::Tag>,
    ) -> txl::Result<Option<Token>> {
        _ = (token, input, tag);
        Ok(None)
    }

    /// Hook that is invoked when a group begins.
    ///
    /// State that follows TeX grouping, like category codes, opens a group here.
    fn begin_group_hook(state: &mut Self) {
        _ = state;
    }

    /// Hook that is invoked when a group ends.
    fn end_group_hook(state: &mut Self) {
        _ = state;
    }

    /// Hook that determines the scope of an assignment.
    ///
    /// This hook is designed to support the `\global` prefix.
    fn variable_assignment_scope_hook(state: &mut Self) -> groupingmap::Scope {
        _ = state;
        groupingmap::Scope::Local
    }
}

impl TexpandState for () {}

/// Adapts the state to the lexer's classifier interface.
struct StateClassifier<'a, S>(&'a S);

impl<'a, S: TexpandState> Classifier for StateClassifier<'a, S> {
    #[inline]
    fn cat_code(&self, c: char) -> token::CatCode {
        self.0.cat_code(c)
    }
}

impl<S: Default> VM<S> {
    /// Create a new VM.
    pub fn new(initial_built_ins: HashMap<&str, BuiltIn<S>>) -> Box<VM<S>> {
        let mut internal = Internal::default();
        let initial_built_ins = initial_built_ins
            .into_iter()
            .map(|(key, value)| (internal.factory.interner_mut().get_or_intern(key), value))
            .collect();
        Box::new(VM {
            state: Default::default(),
            commands_map: command::Map::new(initial_built_ins),
            internal,
            file_system: Box::new(RealFileSystem {}),
            terminal_out: Rc::new(RefCell::new(std::io::stderr())),
            log_file: Rc::new(RefCell::new(std::io::sink())),
            working_directory: match std::env::current_dir() {
                Ok(path_buf) => Some(path_buf),
                Err(err) => {
                    eprintln!("failed to determine the working directory: {err}");
                    None
                }
            },
        })
    }
}

impl<S> VM<S> {
    /// Add the contents of a file to the VM.
    ///
    /// TeX input is organized as a stack.
    /// Pushing source code onto the stack means it is read first.
    /// When a file stream ends the `\everyeof` tokens are inserted.
    pub fn push_source<T1: Into<PathBuf>, T2: Into<String>>(
        &mut self,
        file_name: T1,
        source_code: T2,
    ) {
        self.internal
            .push_source(None, trace::Origin::File(file_name.into()), &source_code.into())
    }

    /// Add source code that did not come from a file, labelled for error messages.
    pub fn push_string<T1: Into<String>, T2: Into<String>>(&mut self, label: T1, source_code: T2) {
        self.internal
            .push_source(None, trace::Origin::String(label.into()), &source_code.into())
    }

    /// Add source code that was read from the terminal.
    pub fn push_terminal_input<T: Into<String>>(&mut self, source_code: T) {
        self.internal
            .push_source(None, trace::Origin::Terminal, &source_code.into())
    }

    /// Close every stream in the VM.
    ///
    /// Streams are closed one at a time, so the tokens of `\everyeof` are inserted
    /// and then discarded after each file.
    pub fn clear_sources(&mut self) {
        self.internal.mouth.close_all_streams()
    }

    /// Close streams until a file stream has been closed or no streams remain.
    ///
    /// This discards the rest of the innermost file together with any macro expansions
    /// and pushed back tokens in front of it.
    pub fn close_next_file_stream(&mut self) {
        self.internal.mouth.close_next_file_stream()
    }

    /// Return a reference to the control sequence name string interner.
    #[inline]
    pub fn cs_name_interner(&self) -> &CsNameInterner {
        self.internal.factory.interner()
    }

    #[inline]
    pub fn token_factory(&self) -> &TokenFactory {
        &self.internal.factory
    }

    #[inline]
    pub fn token_factory_mut(&mut self) -> &mut TokenFactory {
        &mut self.internal.factory
    }

    /// Channels for observing the token streams.
    pub fn observers_mut(&mut self) -> &mut Observers {
        &mut self.internal.mouth.observers
    }

    /// The tokens inserted when a file ends.
    pub fn every_eof(&self) -> &[Token] {
        self.internal.mouth.every_eof()
    }

    /// Number of streams currently being read.
    pub fn input_depth(&self) -> usize {
        self.internal.mouth.depth()
    }

    /// The token most recently delivered by the mouth.
    pub fn last_token(&self) -> Option<Token> {
        self.internal.mouth.last_token()
    }

    /// Names of the control sequences defined in the default namespace.
    pub fn control_sequence_names(&self) -> Vec<&str> {
        let interner = self.internal.factory.interner();
        self.commands_map
            .control_sequences()
            .filter_map(|name| interner.resolve(name))
            .collect()
    }

    pub fn trace(&self, token: Token) -> trace::SourceCodeTrace {
        self.internal
            .tracer
            .trace(token, self.internal.factory.interner())
    }

    pub fn trace_end_of_input(&self) -> trace::SourceCodeTrace {
        self.internal.tracer.trace_end_of_input()
    }

    /// Returns the active macro expansions, innermost first.
    pub fn locators(&self) -> Vec<error::Locator> {
        self.internal
            .mouth
            .macro_invocations()
            .into_iter()
            .map(|token| {
                let invocation = self.trace(token);
                error::Locator {
                    macro_name: invocation.value.clone(),
                    invocation,
                }
            })
            .collect()
    }
}

impl<S: TexpandState> VM<S> {
    fn begin_group(&mut self) {
        self.commands_map.begin_group();
        S::begin_group_hook(&mut self.state);
    }

    fn end_group(&mut self, token: Token) -> txl::Result<()> {
        if self.commands_map.end_group().is_err() {
            return Err(EndOfGroupError {
                trace: self.trace(token),
            }
            .into());
        }
        S::end_group_hook(&mut self.state);
        Ok(())
    }
}

/// Parts of the VM that are private.
#[derive(Default)]
struct Internal {
    mouth: mouth::Mouth,
    factory: TokenFactory,
    tracer: trace::Tracer,
}

impl Internal {
    fn push_source(&mut self, token: Option<Token>, origin: trace::Origin, source_code: &str) {
        let file = matches!(origin, trace::Origin::File(_));
        let keys = self
            .tracer
            .register_source_code(token, origin, source_code);
        self.mouth
            .add_stream(source::Stream::new_source(file, source_code, keys));
    }
}

/// Helper trait for implementing the component pattern in Texpand.
///
/// In the component pattern the state needed by a command, like the category code table
///     used by `\catcode`, is isolated in a _component_: a concrete Rust type defined in the
///     same module as the command and with private internals.
/// The command accesses the component through this trait, so any VM state that contains
///     the component can use the command.
/// Different VM states can include the same component and thus reuse the same commands.
///
/// This trait requires that the type also implements [TexpandState].
/// This only reduces the number of trait bounds that need to be specified on commands.
pub trait HasComponent<C>: TexpandState {
    /// Return a immutable reference to the component.
    fn component(&self) -> &C;

    /// Return a mutable reference to the component.
    fn component_mut(&mut self) -> &mut C;
}

/// This macro is for implementing the [HasComponent] trait in the special (but common)
///     case when the state is a struct and the component is a direct field of the struct.
///
/// ```
/// # mod mylibrary1{
/// #   pub struct Component;
/// # }
/// # mod mylibrary2{
/// #   pub struct Component;
/// # }
/// # use texpand::vm::implement_has_component;
/// # use texpand::traits::*;
/// #
/// struct MyState {
///     component_1: mylibrary1::Component,
///     component_2: mylibrary2::Component,
/// }
///
/// impl TexpandState for MyState {}
///
/// implement_has_component![
///     MyState,
///     (mylibrary1::Component, component_1),
///     (mylibrary2::Component, component_2),
/// ];
/// ```
#[macro_export]
macro_rules! implement_has_component {
    ( $type: path, $component: path, $field: ident ) => {
        implement_has_component![$type, ($component, $field),];
    };
    ( $type: path, $(($component: path, $field: ident),)+) => {
        $(
            impl ::texpand::vm::HasComponent<$component> for $type {
                #[inline]
                fn component(&self) -> &$component {
                    &self.$field
                }
                #[inline]
                fn component_mut(&mut self) -> &mut $component {
                    &mut self.$field
                }
            }
        )*
    };
}

pub use implement_has_component;
