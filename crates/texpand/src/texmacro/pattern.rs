//! Macro parameter text and argument matching.
//!
//! The parameter text of a macro is the part of a definition between the control sequence and
//! the replacement text; e.g., `#1,#2.` in `\def\x#1,#2.{...}`.
//! It is parsed once into a list of [Element]s and compiled into a list of [Matcher]s.
//! At invocation the matchers consume tokens from the input and bind the arguments.
//!
//! Matching is strictly left to right and never backtracks.

use crate::command::Command;
use crate::error;
use crate::prelude as txl;
use crate::token;
use crate::token::Token;
use crate::token::Value;
use crate::traits::*;
use crate::vm;
use std::ops::Range;
use texpand_stdext::algorithms::substringsearch;

/// An element of a parameter text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    /// A token that must appear verbatim in the input.
    Token(Token),
    /// The parameter with this 1-based index.
    Parameter(usize),
}

/// A single matching operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// The next token must equal this token.
    Constant(Token),
    /// An undelimited argument: one token, or a balanced group without its braces.
    Argument(usize),
    /// The final argument of a pattern ending in `#{`: everything up to the next `{`.
    Group(usize),
    /// A delimited argument: everything up to the delimiter at brace depth 0.
    Collecting {
        index: usize,
        delimiter: substringsearch::Matcher<Value>,
    },
}

/// The parameter text of a macro.
///
/// Two patterns are equal if their elements are equal and they both do or do not end with `#{`.
/// The compiled matchers are derived from the elements and do not affect equality.
#[derive(Debug, Clone, Default)]
pub struct MacroPattern {
    raw: Vec<Element>,
    arity: usize,
    ends_with_brace: bool,
    compiled: Vec<Matcher>,
}

impl PartialEq for MacroPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && self.ends_with_brace == other.ends_with_brace
    }
}

impl Eq for MacroPattern {}

/// Arguments bound by matching a pattern.
///
/// All arguments live in one token buffer, which is usually checked out from the VM.
#[derive(Debug, Default)]
pub struct Bindings {
    tokens: Vec<Token>,
    ranges: Vec<Range<usize>>,
}

impl Bindings {
    pub fn new(tokens: Vec<Token>, arity: usize) -> Bindings {
        Bindings {
            tokens,
            ranges: vec![0..0; arity],
        }
    }

    /// Returns the argument with the 0-based index.
    pub fn get(&self, i: usize) -> &[Token] {
        match self.ranges.get(i) {
            None => &[],
            Some(range) => &self.tokens[range.clone()],
        }
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn into_buffer(self) -> Vec<Token> {
        self.tokens
    }

    fn bind(&mut self, index: usize, range: Range<usize>) {
        if let Some(slot) = self.ranges.get_mut(index - 1) {
            *slot = range;
        }
    }
}

impl MacroPattern {
    /// Builds a pattern from its elements.
    ///
    /// # Panics
    ///
    /// Panics if the parameters are not numbered 1, 2, 3, and so on, or if `ends_with_brace`
    ///     is true and the last element is not a begin group token.
    pub fn new(raw: Vec<Element>, ends_with_brace: bool) -> MacroPattern {
        let mut arity = 0;
        for element in &raw {
            if let Element::Parameter(n) = element {
                assert_eq!(*n, arity + 1, "macro parameters must be consecutive");
                arity = *n;
            }
        }
        if ends_with_brace {
            assert!(
                matches!(raw.last(), Some(Element::Token(t)) if matches!(t.value(), Value::BeginGroup(_))),
                "a pattern ending with #{{ must end with a begin group token"
            );
        }
        let compiled = compile(&raw, ends_with_brace);
        MacroPattern {
            raw,
            arity,
            ends_with_brace,
            compiled,
        }
    }

    /// Reads a parameter text from the unexpanded input.
    ///
    /// Reading stops at the first begin group token, which is consumed.
    /// If the parameter text ends with `#{` the begin group token is also the final
    ///     delimiter of the pattern.
    pub fn parse<S: TexpandState>(input: &mut vm::UnexpandedStream<S>) -> txl::Result<MacroPattern> {
        let mut raw = vec![];
        let mut arity = 0;
        loop {
            let token = input.next_or_err(PatternEndOfInputError {})?;
            check_not_outer(input, token)?;
            match token.value() {
                Value::BeginGroup(_) => return Ok(MacroPattern::new(raw, false)),
                Value::EndGroup(_) => {
                    return Err(error::SimpleTokenError::new(
                        input.vm(),
                        token,
                        "unexpected end group token in the parameter text of a macro",
                    )
                    .with_category(error::Category::SyntaxMismatch)
                    .into())
                }
                _ => (),
            }
            if !matches!(
                input.commands_map().resolve_alias(token).value(),
                Value::Parameter(_)
            ) {
                raw.push(Element::Token(token));
                continue;
            }
            let next = input.next_or_err(PatternEndOfInputError {})?;
            check_not_outer(input, next)?;
            match input.commands_map().resolve_alias(next).value() {
                Value::Parameter(_) => {
                    raw.push(Element::Token(input.commands_map().resolve_alias(next)));
                }
                Value::BeginGroup(_) if matches!(next.value(), Value::BeginGroup(_)) => {
                    raw.push(Element::Token(next));
                    return Ok(MacroPattern::new(raw, true));
                }
                Value::Other(c) if c.to_digit(10) == Some(arity as u32 + 1) => {
                    arity += 1;
                    raw.push(Element::Parameter(arity));
                }
                _ => {
                    return Err(error::SimpleTokenError::new(
                        input.vm(),
                        next,
                        format!["parameters must be numbered consecutively; expected #{}", arity + 1],
                    )
                    .with_category(error::Category::NonConsecutiveParameter)
                    .into())
                }
            }
        }
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn ends_with_brace(&self) -> bool {
        self.ends_with_brace
    }

    pub fn elements(&self) -> &[Element] {
        &self.raw
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.compiled
    }

    /// The begin group token at the end of a pattern ending with `#{`.
    pub fn trailing_brace(&self) -> Option<Token> {
        match (self.ends_with_brace, self.raw.last()) {
            (true, Some(Element::Token(token))) => Some(*token),
            _ => None,
        }
    }

    /// Matches the input against the compiled matchers.
    pub fn match_compiled<S: TexpandState>(
        &self,
        input: &mut vm::UnexpandedStream<S>,
        long: bool,
        bindings: &mut Bindings,
    ) -> txl::Result<()> {
        for matcher in &self.compiled {
            match matcher {
                Matcher::Constant(want) => match_constant(input, *want, long)?,
                Matcher::Argument(index) => match_argument(input, *index, long, bindings)?,
                Matcher::Group(index) => match_group(input, *index, long, bindings)?,
                Matcher::Collecting { index, delimiter } => {
                    match_collecting(input, *index, delimiter, long, bindings)?
                }
            }
        }
        Ok(())
    }

    /// Matches the input by walking the elements of the pattern directly.
    ///
    /// This binds exactly the same arguments as [MacroPattern::match_compiled].
    pub fn match_raw<S: TexpandState>(
        &self,
        input: &mut vm::UnexpandedStream<S>,
        long: bool,
        bindings: &mut Bindings,
    ) -> txl::Result<()> {
        let mut i = 0;
        while let Some(element) = self.raw.get(i) {
            i += 1;
            let index = match element {
                Element::Token(want) => {
                    match_constant(input, *want, long)?;
                    continue;
                }
                Element::Parameter(index) => *index,
            };
            let delimiter: Vec<Value> = self.raw[i..]
                .iter()
                .map_while(|element| match element {
                    Element::Token(token) => Some(token.value()),
                    Element::Parameter(_) => None,
                })
                .collect();
            i += delimiter.len();
            if self.ends_with_brace && i == self.raw.len() && delimiter.len() == 1 {
                match_group(input, index, long, bindings)?;
                continue;
            }
            match substringsearch::Matcher::new(delimiter) {
                None => match_argument(input, index, long, bindings)?,
                Some(delimiter) => match_collecting(input, index, &delimiter, long, bindings)?,
            }
        }
        Ok(())
    }
}

fn compile(raw: &[Element], ends_with_brace: bool) -> Vec<Matcher> {
    let mut compiled = vec![];
    let mut i = 0;
    while let Some(element) = raw.get(i) {
        i += 1;
        let index = match element {
            Element::Token(token) => {
                compiled.push(Matcher::Constant(*token));
                continue;
            }
            Element::Parameter(index) => *index,
        };
        let mut delimiter = vec![];
        while let Some(Element::Token(token)) = raw.get(i) {
            delimiter.push(token.value());
            i += 1;
        }
        let matcher = if ends_with_brace && i == raw.len() && delimiter.len() == 1 {
            Matcher::Group(index)
        } else {
            match substringsearch::Matcher::new(delimiter) {
                None => Matcher::Argument(index),
                Some(delimiter) => Matcher::Collecting { index, delimiter },
            }
        };
        compiled.push(matcher);
    }
    compiled
}

fn is_outer<S: TexpandState>(input: &vm::UnexpandedStream<S>, token: Token) -> bool {
    match token.value() {
        Value::CommandRef(command_ref) => matches!(
            input.commands_map().get_command(&command_ref),
            Some(Command::Macro(texmacro)) if texmacro.is_outer()
        ),
        _ => false,
    }
}

fn check_not_outer<S: TexpandState>(
    input: &vm::UnexpandedStream<S>,
    token: Token,
) -> txl::Result<()> {
    if is_outer(input, token) {
        return Err(error::SimpleTokenError::new(
            input.vm(),
            token,
            "an \\outer macro cannot appear in the parameter text of a macro",
        )
        .with_category(error::Category::OuterInPattern)
        .into());
    }
    Ok(())
}

/// Checks a token read while matching the arguments of a macro.
///
/// A `\par` token is only allowed in the arguments of `\long` macros.
/// An `\outer` macro is never allowed.
fn check_argument_token<S: TexpandState>(
    input: &vm::UnexpandedStream<S>,
    token: Token,
    long: bool,
) -> txl::Result<()> {
    if !long && is_par(input, &token) {
        return Err(runaway_error(input, token));
    }
    if is_outer(input, token) {
        return Err(error::SimpleTokenError::new(
            input.vm(),
            token,
            "runaway argument: an \\outer macro cannot appear in the argument of a macro",
        )
        .with_category(error::Category::RunawayArgument)
        .into());
    }
    Ok(())
}

fn is_par<S>(input: &vm::UnexpandedStream<S>, token: &Token) -> bool
where
    S: TexpandState,
{
    input.vm().token_factory().is_par(token)
}

fn runaway_error<S: TexpandState>(
    input: &vm::UnexpandedStream<S>,
    token: Token,
) -> Box<error::Error> {
    error::SimpleTokenError::new(
        input.vm(),
        token,
        "runaway argument: the paragraph ended before the argument was complete",
    )
    .with_category(error::Category::RunawayArgument)
    .into()
}

fn extra_right_brace_error<S: TexpandState>(
    input: &vm::UnexpandedStream<S>,
    token: Token,
) -> Box<error::Error> {
    error::SimpleTokenError::new(
        input.vm(),
        token,
        "argument of a macro contains an unmatched end group token",
    )
    .with_category(error::Category::ExtraRightBrace)
    .into()
}

fn match_constant<S: TexpandState>(
    input: &mut vm::UnexpandedStream<S>,
    want: Token,
    long: bool,
) -> txl::Result<()> {
    let token = input.next_or_err(ConstantEndOfInputError {})?;
    check_argument_token(input, token, long)?;
    if token != want {
        return Err(error::SimpleTokenError::new(
            input.vm(),
            token,
            "use of the macro does not match its definition",
        )
        .with_category(error::Category::SyntaxMismatch)
        .into());
    }
    Ok(())
}

fn match_argument<S: TexpandState>(
    input: &mut vm::UnexpandedStream<S>,
    index: usize,
    long: bool,
    bindings: &mut Bindings,
) -> txl::Result<()> {
    let token = match input.next_non_space()? {
        None => return Err(argument_eof(input, index)),
        Some(token) => token,
    };
    let start = bindings.tokens.len();
    match token.value() {
        Value::EndGroup(_) => return Err(extra_right_brace_error(input, token)),
        Value::BeginGroup(_) => {
            collect_group(input, index, long, &mut bindings.tokens)?;
        }
        _ => {
            check_argument_token(input, token, long)?;
            bindings.tokens.push(token);
        }
    }
    let end = bindings.tokens.len();
    bindings.bind(index, start..end);
    Ok(())
}

/// Collects the rest of a group whose begin group token has been consumed.
fn collect_group<S: TexpandState>(
    input: &mut vm::UnexpandedStream<S>,
    index: usize,
    long: bool,
    result: &mut Vec<Token>,
) -> txl::Result<()> {
    let mut depth = 0_usize;
    loop {
        let token = match input.next()? {
            None => return Err(argument_eof(input, index)),
            Some(token) => token,
        };
        match token.value() {
            Value::BeginGroup(_) => depth += 1,
            Value::EndGroup(_) => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            _ => {
                check_argument_token(input, token, long)?;
            }
        }
        result.push(token);
    }
}

/// Matches the `#{` parameter: the argument ends at the first begin group token,
///     so it cannot contain any group.
fn match_group<S: TexpandState>(
    input: &mut vm::UnexpandedStream<S>,
    index: usize,
    long: bool,
    bindings: &mut Bindings,
) -> txl::Result<()> {
    let start = bindings.tokens.len();
    loop {
        let token = match input.next()? {
            None => return Err(argument_eof(input, index)),
            Some(token) => token,
        };
        match token.value() {
            Value::BeginGroup(_) => break,
            Value::EndGroup(_) => return Err(extra_right_brace_error(input, token)),
            _ => check_argument_token(input, token, long)?,
        }
        bindings.tokens.push(token);
    }
    let end = bindings.tokens.len();
    bindings.bind(index, start..end);
    Ok(())
}

fn match_collecting<S: TexpandState>(
    input: &mut vm::UnexpandedStream<S>,
    index: usize,
    delimiter: &substringsearch::Matcher<Value>,
    long: bool,
    bindings: &mut Bindings,
) -> txl::Result<()> {
    let mut search = delimiter.start();
    // A delimiter ending with `{` (from `#{`) leaves the depth at 1 when it matches.
    let closing_depth = match delimiter.substring().last() {
        Some(Value::BeginGroup(_)) => 1,
        _ => 0,
    };
    let start = bindings.tokens.len();
    let mut depth = 0_usize;
    loop {
        let token = match input.next()? {
            None => return Err(argument_eof(input, index)),
            Some(token) => token,
        };
        match token.value() {
            Value::BeginGroup(_) => depth += 1,
            Value::EndGroup(_) => {
                if depth == 0 {
                    return Err(extra_right_brace_error(input, token));
                }
                depth -= 1;
            }
            _ => {
                check_argument_token(input, token, long)?;
            }
        }
        let matched = search.next(&token.value());
        bindings.tokens.push(token);
        if matched && depth == closing_depth {
            break;
        }
    }
    let end = bindings.tokens.len() - delimiter.substring().len();
    bindings.tokens.truncate(end);
    let range = if is_single_group(&bindings.tokens[start..end]) {
        start + 1..end - 1
    } else {
        start..end
    };
    bindings.bind(index, range);
    Ok(())
}

/// Returns whether the list is one group: a begin group token, balanced tokens and the
///     matching end group token.
fn is_single_group(list: &[Token]) -> bool {
    if list.len() < 2 || !matches!(list[0].value(), Value::BeginGroup(_)) {
        return false;
    }
    let mut depth = 0_usize;
    for (i, token) in list.iter().enumerate() {
        match token.value() {
            Value::BeginGroup(_) => depth += 1,
            Value::EndGroup(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i + 1 == list.len();
                }
            }
            _ => (),
        }
    }
    false
}

fn argument_eof<S: TexpandState>(input: &vm::UnexpandedStream<S>, index: usize) -> Box<error::Error> {
    error::EofError::new(
        input.trace_end_of_input(),
        ArgumentEndOfInputError { param_num: index },
    )
    .into()
}

#[derive(Debug)]
struct PatternEndOfInputError;

impl error::EndOfInputError for PatternEndOfInputError {
    fn doing(&self) -> String {
        "reading the parameter text of a macro definition".into()
    }

    fn notes(&self) -> Vec<String> {
        vec!["the parameter text of a macro ends with a begin group token".into()]
    }
}

#[derive(Debug)]
struct ConstantEndOfInputError;

impl error::EndOfInputError for ConstantEndOfInputError {
    fn doing(&self) -> String {
        "matching the parameter text of a macro".into()
    }
}

#[derive(Debug)]
struct ArgumentEndOfInputError {
    param_num: usize,
}

impl error::EndOfInputError for ArgumentEndOfInputError {
    fn doing(&self) -> String {
        "reading an argument for a macro".into()
    }

    fn notes(&self) -> Vec<String> {
        vec![format!("this is argument number {} for this macro", self.param_num)]
    }
}

/// Writes the pattern the way TeX shows parameter texts in traces, e.g. `#1,#2.`.
pub(crate) fn show_pattern(pattern: &MacroPattern, interner: &token::CsNameInterner) -> String {
    let mut s = String::new();
    let elements = if pattern.ends_with_brace {
        &pattern.raw[..pattern.raw.len().saturating_sub(1)]
    } else {
        &pattern.raw[..]
    };
    for element in elements {
        match element {
            Element::Token(token) => s.push_str(&token::show_tokens([token], interner)),
            Element::Parameter(n) => {
                s.push('#');
                s.push_str(&n.to_string());
            }
        }
    }
    if pattern.ends_with_brace {
        s.push_str("#{");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::testing::State;
    use std::collections::HashMap;

    fn new_vm(source: &str) -> Box<vm::VM<State>> {
        let mut vm = vm::VM::<State>::new(HashMap::new());
        vm.push_source("main.tex", source);
        vm
    }

    /// Parses a pattern pushed in front of the VM's input.
    fn parse_pattern_from_str(vm: &mut vm::VM<State>, source: &str) -> txl::Result<MacroPattern> {
        vm.push_string("pattern", source);
        let input = vm::ExecutionInput::new(vm);
        MacroPattern::parse(input.unexpanded())
    }

    fn parse_pattern(source: &str) -> txl::Result<MacroPattern> {
        let mut vm = new_vm(source);
        let input = vm::ExecutionInput::new(&mut vm);
        MacroPattern::parse(input.unexpanded())
    }

    #[test]
    fn parse_simple_pattern() {
        let pattern = parse_pattern("#1#2{").unwrap();
        assert_eq!(pattern.arity(), 2);
        assert_eq!(
            pattern.matchers(),
            &[Matcher::Argument(1), Matcher::Argument(2)]
        );
    }

    #[test]
    fn parse_delimited_pattern() {
        let pattern = parse_pattern("a#1,#2.{").unwrap();
        assert_eq!(pattern.arity(), 2);
        assert!(matches!(pattern.matchers()[0], Matcher::Constant(_)));
        assert!(matches!(
            pattern.matchers()[1],
            Matcher::Collecting { index: 1, .. }
        ));
        assert!(matches!(
            pattern.matchers()[2],
            Matcher::Collecting { index: 2, .. }
        ));
    }

    #[test]
    fn parse_brace_terminated_pattern() {
        let pattern = parse_pattern("#1#{").unwrap();
        assert!(pattern.ends_with_brace());
        assert_eq!(pattern.matchers(), &[Matcher::Group(1)]);
        assert!(pattern.trailing_brace().is_some());
    }

    #[test]
    fn parse_double_hash() {
        let pattern = parse_pattern("##{").unwrap();
        assert_eq!(pattern.arity(), 0);
        assert_eq!(pattern.elements().len(), 1);
    }

    #[test]
    fn empty_pattern_equals_default() {
        let pattern = parse_pattern("{").unwrap();
        assert_eq!(pattern, MacroPattern::default());
    }

    macro_rules! pattern_failure_tests {
        ($( ($name: ident, $source: expr, $category: expr), )+) => {
            $(
            #[test]
            fn $name() {
                let err = parse_pattern($source).unwrap_err();
                assert_eq!(err.category(), $category);
            }
            )+
        };
    }

    pattern_failure_tests![
        (non_consecutive_1, "#1#2#1{", error::Category::NonConsecutiveParameter),
        (non_consecutive_2, "#2{", error::Category::NonConsecutiveParameter),
        (parameter_then_letter, "#a{", error::Category::NonConsecutiveParameter),
        (end_of_input, "#1a", error::Category::UnexpectedEndOfInput),
        (end_of_input_after_hash, "#", error::Category::UnexpectedEndOfInput),
        (end_group, "a}", error::Category::SyntaxMismatch),
    ];

    fn run_match(pattern: &str, input: &str, raw: bool) -> txl::Result<Vec<String>> {
        let mut vm = new_vm(input);
        let pattern = parse_pattern_from_str(&mut vm, pattern)?;
        let input = vm::ExecutionInput::new(&mut vm);
        let mut bindings = Bindings::new(vec![], pattern.arity());
        if raw {
            pattern.match_raw(input.unexpanded(), false, &mut bindings)?;
        } else {
            pattern.match_compiled(input.unexpanded(), false, &mut bindings)?;
        }
        Ok((0..bindings.len())
            .map(|i| token::write_tokens(bindings.get(i), input.vm().cs_name_interner()))
            .collect())
    }

    macro_rules! match_tests {
        ($( ($name: ident, $pattern: expr, $input: expr, $want: expr), )+) => {
            $(
            #[test]
            fn $name() {
                let want: Vec<&str> = $want;
                for raw in [false, true] {
                    let got = run_match($pattern, $input, raw).unwrap();
                    assert_eq!(got, want, "raw={raw}");
                }
            }
            )+
        };
    }

    match_tests![
        (undelimited_single_tokens, "#1#2{", "ab", vec!["a", "b"]),
        (undelimited_skips_spaces, "#1#2{", "a   b", vec!["a", "b"]),
        (undelimited_group, "#1#2{", "{a b}c", vec!["a b", "c"]),
        (undelimited_nested_group, "#1{", "{a{b}c}", vec!["a{b}c"]),
        (delimited_strips_one_group, "#1,{", "{ab},", vec!["ab"]),
        (delimited_plain, "#1,{", "ab,", vec!["ab"]),
        (delimited_two_groups_not_stripped, "#1,{", "{a}{b},", vec!["{a}{b}"]),
        (delimited_ignores_nested_delimiter, "#1,{", "{a,b}c,", vec!["{a,b}c"]),
        (delimited_empty, "#1,{", ",", vec![""]),
        (delimited_multi_token, "#1ab{", "xaaab", vec!["xaa"]),
        (prefix_constant, "x#1.{", "xab.", vec!["ab"]),
        (group_terminal, "#1#{", "ab{", vec!["ab"]),
        (mixed, "#1#2.#3{", "a{bc}d.e", vec!["a", "{bc}d", "e"]),
    ];

    macro_rules! match_failure_tests {
        ($( ($name: ident, $pattern: expr, $input: expr, $category: expr), )+) => {
            $(
            #[test]
            fn $name() {
                for raw in [false, true] {
                    let err = run_match($pattern, $input, raw).unwrap_err();
                    assert_eq!(err.category(), $category, "raw={raw}");
                }
            }
            )+
        };
    }

    match_failure_tests![
        (constant_mismatch, "x#1{", "ya", error::Category::SyntaxMismatch),
        (constant_par_is_runaway, "x#1{", "\\par a", error::Category::RunawayArgument),
        (argument_extra_right_brace, "#1{", "}", error::Category::ExtraRightBrace),
        (argument_end_of_input, "#1#2{", "a", error::Category::UnexpectedEndOfInput),
        (argument_unterminated_group, "#1{", "{a", error::Category::UnexpectedEndOfInput),
        (collecting_extra_right_brace, "#1.{", "a}.", error::Category::ExtraRightBrace),
        (collecting_par_is_runaway, "#1.{", "a\\par.", error::Category::RunawayArgument),
        (collecting_end_of_input, "#1.{", "abc", error::Category::UnexpectedEndOfInput),
        (group_extra_right_brace, "#1#{", "a}{", error::Category::ExtraRightBrace),
        (group_par_is_runaway, "#1#{", "a\\par{", error::Category::RunawayArgument),
        (group_end_of_input, "#1#{", "ab", error::Category::UnexpectedEndOfInput),
    ];

    #[test]
    fn long_allows_par() {
        let mut vm = new_vm("a\\par.");
        let pattern = parse_pattern_from_str(&mut vm, "#1.{").unwrap();
        let input = vm::ExecutionInput::new(&mut vm);
        let mut bindings = Bindings::new(vec![], 1);
        pattern
            .match_compiled(input.unexpanded(), true, &mut bindings)
            .unwrap();
        assert_eq!(bindings.get(0).len(), 2);
    }

    #[test]
    fn is_single_group_cases() {
        let b = Token::new_begin_group('{', token::trace::Key::dummy());
        let e = Token::new_end_group('}', token::trace::Key::dummy());
        let a = Token::new_letter('a', token::trace::Key::dummy());
        assert!(is_single_group(&[b, a, e]));
        assert!(is_single_group(&[b, b, e, e]));
        assert!(!is_single_group(&[b, e, b, e]));
        assert!(!is_single_group(&[a, b, e]));
        assert!(!is_single_group(&[b]));
    }
}
