//! Implementation of TeX user defined macros.
//!
//! A macro is a parameter text ([MacroPattern]) plus a replacement text, or body.
//! Invoking a macro matches its arguments, substitutes them into the body and pushes the
//!     result onto the input as a new stream.
//! The result is not expanded here: the tokens are expanded when the VM reads them,
//!     so deeply nested macro calls do not grow the native stack.

use crate::error;
use crate::prelude as txl;
use crate::token;
use crate::token::Token;
use crate::token::Value;
use crate::traits::*;
use crate::vm;
use std::io::Write;
use texpand_stdext::color::Colorize;

mod pattern;

pub use pattern::Bindings;
pub use pattern::Element;
pub use pattern::MacroPattern;
pub use pattern::Matcher;

/// A TeX Macro.
///
/// Macros are immutable. Two macros are equal if they have the same prefixes, parameter
///     text and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    long: bool,
    outer: bool,
    pattern: MacroPattern,
    body: Vec<Token>,
}

impl Macro {
    /// Create a new macro.
    ///
    /// # Panics
    ///
    /// Panics if the body refers to a parameter the pattern does not have.
    /// Bodies returned by [Macro::parse_body] never do.
    pub fn new(long: bool, outer: bool, pattern: MacroPattern, body: Vec<Token>) -> Macro {
        if let Err(i) = check_body(&body, pattern.arity()) {
            panic!("invalid parameter reference at position {i} of a macro body");
        }
        Macro {
            long,
            outer,
            pattern,
            body,
        }
    }

    pub fn is_long(&self) -> bool {
        self.long
    }

    pub fn is_outer(&self) -> bool {
        self.outer
    }

    pub fn pattern(&self) -> &MacroPattern {
        &self.pattern
    }

    pub fn body(&self) -> &[Token] {
        &self.body
    }

    /// Reads the body of a macro from the unexpanded input.
    ///
    /// The opening begin group token must have been consumed by [MacroPattern::parse].
    /// Parameter references are checked against the pattern: `##` is kept as two parameter
    ///     tokens and `#d` must satisfy `1 <= d <= arity`.
    /// Tokens aliased to parameter tokens or digits are replaced by their targets.
    /// If the pattern ends with `#{` a begin group token is appended to the body.
    pub fn parse_body<S: TexpandState>(
        input: &mut vm::UnexpandedStream<S>,
        pattern: &MacroPattern,
    ) -> txl::Result<Vec<Token>> {
        let mut body = vec![];
        let mut depth = 0_usize;
        loop {
            let token = input.next_or_err(BodyEndOfInputError {})?;
            match token.value() {
                Value::BeginGroup(_) => depth += 1,
                Value::EndGroup(_) => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                _ => (),
            }
            let resolved = input.commands_map().resolve_alias(token);
            if !matches!(resolved.value(), Value::Parameter(_)) {
                body.push(token);
                continue;
            }
            let next = input.next_or_err(BodyEndOfInputError {})?;
            let next_resolved = input.commands_map().resolve_alias(next);
            match next_resolved.value() {
                Value::Parameter(_) => (),
                Value::Other(c) if parameter_index(c, pattern.arity()).is_some() => (),
                _ => {
                    let title = if pattern.arity() == 0 {
                        "illegal parameter reference: this macro has no parameters".to_string()
                    } else {
                        format![
                            "illegal parameter reference: this macro has parameters #1 to #{}",
                            pattern.arity()
                        ]
                    };
                    return Err(error::SimpleTokenError::new(input.vm(), next, title)
                        .with_category(error::Category::IllegalParameterReference)
                        .into());
                }
            }
            body.push(resolved);
            body.push(next_resolved);
        }
        if let Some(brace) = pattern.trailing_brace() {
            body.push(brace);
        }
        Ok(body)
    }

    /// Invokes the macro.
    ///
    /// The arguments are read from the input and the substituted body is pushed onto the input.
    pub fn call<S: TexpandState>(
        &self,
        token: Token,
        input: &mut vm::ExpansionInput<S>,
    ) -> txl::Result<()> {
        let mut bindings = Bindings::new(input.checkout_token_buffer(), self.pattern.arity());
        let mut result = self
            .pattern
            .match_compiled(input.unexpanded(), self.long, &mut bindings);
        if result.is_ok() && input.state().tracing_macros() > 0 {
            result = self.trace(token, input.vm(), &bindings);
        }
        if let Err(err) = result {
            input.return_token_buffer(bindings.into_buffer());
            return Err(err);
        }

        let mut body = input.checkout_token_buffer();
        substitute(&self.body, &bindings, &mut body);
        body.reverse();
        input.push_macro_body(token, body);
        input.return_token_buffer(bindings.into_buffer());
        Ok(())
    }

    fn trace<S>(&self, token: Token, vm: &vm::VM<S>, bindings: &Bindings) -> txl::Result<()> {
        let interner = vm.cs_name_interner();
        let name = match token.value() {
            Value::CommandRef(command_ref) => command_ref.to_string(interner),
            _ => String::new(),
        };
        let result = write_trace(
            &mut *vm.log_file.borrow_mut(),
            &name,
            &pattern::show_pattern(&self.pattern, interner),
            &token::show_tokens(&self.body, interner),
            bindings,
            interner,
        );
        match result {
            Ok(()) => Ok(()),
            Err(err) => Err(error::SimpleFailedPreconditionError::new(
                "failed to write macro tracing to the log file",
            )
            .with_note(format!["{err}"])
            .into()),
        }
    }

    /// Returns a description of the macro for documentation and help output.
    pub fn doc(&self, interner: &token::CsNameInterner) -> String {
        let mut d = String::default();
        d.push_str("User defined macro\n\n");
        let mut prefixes = vec![];
        if self.long {
            prefixes.push("\\long");
        }
        if self.outer {
            prefixes.push("\\outer");
        }
        if !prefixes.is_empty() {
            d.push_str(&format![
                "{} {}\n\n",
                "Prefixes:".italic(),
                prefixes.join(" ")
            ]);
        }
        d.push_str(&format![
            "{}\n{}",
            "Parameters definition".italic(),
            pretty_print_pattern(&self.pattern, interner),
        ]);
        d.push_str(&format![
            "\n\n{} `{}`\n",
            "Replacement definition:".italic(),
            pretty_print_body(&self.body, interner),
        ]);
        d
    }
}

/// Returns the 0-based index for the digit of a parameter reference.
fn parameter_index(c: char, arity: usize) -> Option<usize> {
    match c.to_digit(10) {
        Some(d) if d >= 1 && (d as usize) <= arity => Some(d as usize - 1),
        _ => None,
    }
}

/// Checks that every parameter token in the body is followed by a parameter token or
///     a valid digit. Returns the position of the first bad reference.
fn check_body(body: &[Token], arity: usize) -> Result<(), usize> {
    let mut i = 0;
    while let Some(token) = body.get(i) {
        if let Value::Parameter(_) = token.value() {
            match body.get(i + 1).map(Token::value) {
                Some(Value::Parameter(_)) => (),
                Some(Value::Other(c)) if parameter_index(c, arity).is_some() => (),
                _ => return Err(i),
            }
            i += 1;
        }
        i += 1;
    }
    Ok(())
}

fn substitute(body: &[Token], bindings: &Bindings, result: &mut Vec<Token>) {
    let mut iter = body.iter();
    while let Some(token) = iter.next() {
        if !matches!(token.value(), Value::Parameter(_)) {
            result.push(*token);
            continue;
        }
        let next = match iter.next() {
            None => break,
            Some(next) => next,
        };
        match next.value() {
            Value::Other(c) => {
                if let Some(i) = parameter_index(c, bindings.len()) {
                    result.extend_from_slice(bindings.get(i));
                }
            }
            _ => result.push(*next),
        }
    }
}

fn write_trace(
    log: &mut dyn Write,
    name: &str,
    pattern: &str,
    body: &str,
    bindings: &Bindings,
    interner: &token::CsNameInterner,
) -> std::io::Result<()> {
    writeln!(log, "{name} {pattern}->{body}")?;
    for i in 0..bindings.len() {
        writeln!(
            log,
            "#{}<-{}",
            i + 1,
            token::show_tokens(bindings.get(i), interner)
        )?;
    }
    Ok(())
}

fn colored_parameter_number(n: usize) -> String {
    let color = match n {
        1 => |s: String| s.bright_yellow(),
        _ => |s: String| s.bright_blue(),
    };
    format![
        "{}{}",
        color("#".to_string()).bold(),
        color(n.to_string()).bold()
    ]
}

fn pretty_print_pattern(pattern: &MacroPattern, interner: &token::CsNameInterner) -> String {
    let mut d = String::default();
    d.push_str(&format![" . Parameters ({}):\n", pattern.arity()]);
    let elements = pattern.elements();
    for (i, element) in elements.iter().enumerate() {
        let n = match element {
            Element::Parameter(n) => *n,
            Element::Token(_) => continue,
        };
        let delimiter: Vec<Token> = elements[i + 1..]
            .iter()
            .map_while(|element| match element {
                Element::Token(token) => Some(*token),
                Element::Parameter(_) => None,
            })
            .collect();
        if delimiter.is_empty() {
            d.push_str(&format![
                "    {}: undelimited\n",
                colored_parameter_number(n),
            ]);
        } else {
            d.push_str(&format![
                "    {}: delimited by `{}`\n",
                colored_parameter_number(n),
                token::write_tokens(&delimiter, interner)
            ]);
        }
    }
    d.push_str(" . Full argument specification: `");
    for element in elements {
        match element {
            Element::Parameter(n) => d.push_str(&colored_parameter_number(*n)),
            Element::Token(token) => d.push_str(&token::show_tokens([token], interner)),
        }
    }
    d.push('`');
    d
}

fn pretty_print_body(body: &[Token], interner: &token::CsNameInterner) -> String {
    let mut b = String::default();
    let mut iter = body.iter().peekable();
    while let Some(token) = iter.next() {
        if let Value::Parameter(_) = token.value() {
            if let Some(Value::Other(c)) = iter.peek().map(|t| t.value()) {
                if let Some(d) = c.to_digit(10) {
                    b.push_str(&colored_parameter_number(d as usize));
                    iter.next();
                    continue;
                }
            }
        }
        b.push_str(&token::show_tokens([token], interner));
    }
    b
}

#[derive(Debug)]
struct BodyEndOfInputError;

impl error::EndOfInputError for BodyEndOfInputError {
    fn doing(&self) -> String {
        "reading the replacement text of a macro definition".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command;
    use crate::parse::testing::State;
    use std::collections::HashMap;
    use std::rc::Rc;
    use texpand_stdext::collections::groupingmap::Scope;

    fn new_vm(source: &str) -> Box<vm::VM<State>> {
        let mut vm = vm::VM::<State>::new(HashMap::new());
        vm.push_source("main.tex", source);
        vm
    }

    /// Defines `name` using the pattern and body at the front of the input.
    fn define(vm: &mut vm::VM<State>, name: &str, long: bool) -> txl::Result<()> {
        let input = vm::ExecutionInput::new(vm);
        let pattern = MacroPattern::parse(input.unexpanded())?;
        let body = Macro::parse_body(input.unexpanded(), &pattern)?;
        let texmacro = Macro::new(long, false, pattern, body);
        let cs = input.token_factory_mut().control_sequence(name, token::trace::Key::dummy());
        input.commands_map_mut().insert_macro(
            cs.command_ref().unwrap(),
            texmacro,
            Scope::Local,
        );
        Ok(())
    }

    fn run(definitions: &[(&str, &str)], source: &str) -> txl::Result<String> {
        let mut vm = new_vm(source);
        for (name, definition) in definitions {
            vm.push_string("definition", *definition);
            define(&mut vm, name, false)?;
        }
        let input = vm::ExecutionInput::new(&mut vm);
        let mut tokens = vec![];
        while let Some(token) = input.next()? {
            tokens.push(token);
        }
        Ok(token::write_tokens(&tokens, input.vm().cs_name_interner()))
    }

    macro_rules! expansion_tests {
        ($( ($name: ident, $definitions: expr, $source: expr, $want: expr), )+) => {
            $(
            #[test]
            fn $name() {
                let got = run(&$definitions, $source).unwrap();
                assert_eq!(got, $want);
            }
            )+
        };
    }

    expansion_tests![
        (no_parameters, [("x", "{ABC}")], r"\x\x\x", "ABCABCABC"),
        (one_parameter, [("x", "#1{[#1]}")], r"\x a\x{bc}", "[a][bc]"),
        (delimited_group_stripped, [("x", "#1,{[#1]}")], r"\x{ab},", "[ab]"),
        (delimited_plain, [("x", "#1,{[#1]}")], r"\x ab,", "[ab]"),
        (double_hash_in_body, [("x", "{a##b}")], r"\x", "a#b"),
        (parameter_used_twice, [("x", "#1#2{#2#1#2}")], r"\x ab", "bab"),
        (brace_terminated, [("x", "#1#{[#1]}")], r"\x ab{c}", "[ab]{c}"),
        (
            nested_macros,
            [("x", "#1{<#1>}"), ("y", "{\\x{\\x{z}}}")],
            r"\y",
            "<<z>>"
        ),
        (
            expansion_is_lazy,
            [("x", "{\\y}"), ("y", "{Y}")],
            r"\x",
            "Y"
        ),
    ];

    macro_rules! failure_tests {
        ($( ($name: ident, $definitions: expr, $source: expr, $category: expr), )+) => {
            $(
            #[test]
            fn $name() {
                let err = run(&$definitions, $source).unwrap_err();
                assert_eq!(err.category(), $category);
            }
            )+
        };
    }

    failure_tests![
        (
            body_reference_beyond_arity,
            [("x", "#1#2{#3}")],
            "",
            error::Category::IllegalParameterReference
        ),
        (
            body_reference_zero,
            [("x", "#1{#0}")],
            "",
            error::Category::IllegalParameterReference
        ),
        (
            body_reference_letter,
            [("x", "{#a}")],
            "",
            error::Category::IllegalParameterReference
        ),
        (
            body_end_of_input,
            [("x", "{abc")],
            "",
            error::Category::UnexpectedEndOfInput
        ),
        (
            pattern_non_consecutive,
            [("x", "#1#2#1{}")],
            "",
            error::Category::NonConsecutiveParameter
        ),
        (
            runaway_argument,
            [("x", "#1.{}")],
            "\\x a\\par b.",
            error::Category::RunawayArgument
        ),
        (
            use_does_not_match,
            [("x", "a#1{}")],
            "\\x b",
            error::Category::SyntaxMismatch
        ),
    ];

    #[test]
    fn macro_equality() {
        let mut vm = new_vm("#1,{a#1} #1,{a#1} #1.{a#1} #1,{b#1}");
        let input = vm::ExecutionInput::new(&mut vm);
        let mut macros = vec![];
        for _ in 0..4 {
            let pattern = MacroPattern::parse(input.unexpanded()).unwrap();
            let body = Macro::parse_body(input.unexpanded(), &pattern).unwrap();
            macros.push(Macro::new(false, false, pattern, body));
            input.unexpanded().skip_spaces();
        }
        assert_eq!(macros[0], macros[1]);
        assert_ne!(macros[0], macros[2]);
        assert_ne!(macros[0], macros[3]);
        let mut long = macros[0].clone();
        long.long = true;
        assert_ne!(macros[0], long);
        assert_eq!(
            Macro::new(false, false, MacroPattern::default(), vec![]),
            Macro::new(false, false, MacroPattern::new(vec![], false), vec![])
        );
    }

    #[test]
    #[should_panic]
    fn new_panics_on_malformed_body() {
        let hash = Token::new_parameter('#', token::trace::Key::dummy());
        let two = Token::new_other('2', token::trace::Key::dummy());
        Macro::new(false, false, MacroPattern::default(), vec![hash, two]);
    }

    #[test]
    fn aliased_parameter_in_body() {
        let mut vm = new_vm(r"#1{\p1}");
        let p = vm
            .token_factory_mut()
            .control_sequence("p", token::trace::Key::dummy());
        vm.commands_map.alias_token(
            p.command_ref().unwrap(),
            Token::new_parameter('#', token::trace::Key::dummy()),
            Scope::Local,
        );
        let input = vm::ExecutionInput::new(&mut vm);
        let pattern = MacroPattern::parse(input.unexpanded()).unwrap();
        let body = Macro::parse_body(input.unexpanded(), &pattern).unwrap();
        assert_eq!(
            body.iter().map(Token::value).collect::<Vec<_>>(),
            vec![Value::Parameter('#'), Value::Other('1')]
        );
    }

    #[test]
    fn tracing_writes_to_log_file() {
        let mut vm = new_vm(r"\x ab");
        vm.state.tracing_macros = 1;
        let log: Rc<std::cell::RefCell<Vec<u8>>> = Default::default();
        vm.log_file = log.clone();
        vm.push_string("definition", "#1#2{[#2#1]}");
        define(&mut vm, "x", false).unwrap();
        let input = vm::ExecutionInput::new(&mut vm);
        while input.next().unwrap().is_some() {}
        let log = String::from_utf8(log.borrow().clone()).unwrap();
        assert_eq!(log, "\\x #1#2->[#2#1]\n#1<-a\n#2<-b\n");
    }

    #[test]
    fn tail_calls_do_not_grow_the_stack() {
        // Each expansion of \a consumes one x and expands to \a again.
        let n = 50_000;
        let source: String = "x".repeat(n);
        let mut vm = new_vm(&source);
        vm.push_string("definition", "#1{\\a}");
        define(&mut vm, "a", false).unwrap();
        let a = vm
            .token_factory_mut()
            .control_sequence("a", token::trace::Key::dummy());
        let input = vm::ExecutionInput::new(&mut vm);
        input.back(a);
        let err = input.next().unwrap_err();
        assert_eq!(err.category(), error::Category::UnexpectedEndOfInput);
        assert!(input.vm().input_depth() <= 2);
    }

    #[test]
    fn deep_nesting_does_not_grow_the_native_stack() {
        // Every argument contains the next call, so no expansion finishes until z is read.
        let n = 4_000;
        let source = format!["{}z{}", "\\a{".repeat(n), "}".repeat(n)];
        let mut vm = new_vm(&source);
        vm.push_string("definition", "#1{#1x}");
        define(&mut vm, "a", false).unwrap();
        let input = vm::ExecutionInput::new(&mut vm);
        let mut tokens = vec![];
        let mut max_depth = 0;
        while let Some(token) = input.next().unwrap() {
            max_depth = max_depth.max(input.vm().input_depth());
            tokens.push(token);
        }
        assert!(max_depth >= n);
        assert_eq!(
            token::write_tokens(&tokens, input.vm().cs_name_interner()),
            format!["z{}", "x".repeat(n)]
        );
    }

    #[test]
    fn bindings_buffer_is_returned_after_match_failure() {
        let mut vm = new_vm(&format!["\\x {}", "a".repeat(100)]);
        vm.push_string("definition", "#1.{}");
        define(&mut vm, "x", false).unwrap();
        let input = vm::ExecutionInput::new(&mut vm);
        let err = input.next().unwrap_err();
        assert_eq!(err.category(), error::Category::UnexpectedEndOfInput);
        let buffer = input.as_expansion_input().checkout_token_buffer();
        assert!(buffer.capacity() >= 100);
    }

    #[test]
    fn doc_lists_parameters() {
        let mut vm = new_vm("#1.{a#1}");
        let input = vm::ExecutionInput::new(&mut vm);
        let pattern = MacroPattern::parse(input.unexpanded()).unwrap();
        let body = Macro::parse_body(input.unexpanded(), &pattern).unwrap();
        let texmacro = Macro::new(true, false, pattern, body);
        let doc = texmacro.doc(input.vm().cs_name_interner());
        assert!(doc.contains("Parameters (1)"));
        assert!(doc.contains("delimited by `.`"));
        assert!(doc.contains("\\long"));
    }
}
