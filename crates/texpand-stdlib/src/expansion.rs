//! Commands that alter the expansion process

use texpand::command;
use texpand::error;
use texpand::prelude as txl;
use texpand::token;
use texpand::traits::*;
use texpand::vm;

pub const NOEXPAND_DOC: &str = "Prevent the next token from being expanded";
pub const EXPANDAFTER_DOC: &str = "Expand the token after the next token";
pub const RELAX_DOC: &str = "Do nothing";

static NO_EXPAND_TAG: command::StaticTag = command::StaticTag::new();
static RELAX_TAG: command::StaticTag = command::StaticTag::new();

/// Get the `\noexpand` command.
///
/// The command only works if the state's expansion override hook calls [noexpand_hook].
pub fn get_noexpand<S: TexpandState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(noexpand_fn)
        .with_tag(NO_EXPAND_TAG.get())
        .with_doc(NOEXPAND_DOC)
}

fn noexpand_fn<S: TexpandState>(
    _: token::Token,
    _: &mut vm::ExpansionInput<S>,
) -> txl::Result<()> {
    Err(error::SimpleFailedPreconditionError::new(
        r"the \noexpand expansion function was invoked directly",
    )
    .with_note(r"\noexpand works through the expansion override hook of the state")
    .with_note("make sure the hook calls `expansion::noexpand_hook`")
    .into())
}

#[inline]
pub fn noexpand_hook<S: TexpandState>(
    token: token::Token,
    input: &mut vm::ExpansionInput<S>,
    tag: Option<command::Tag>,
) -> txl::Result<Option<token::Token>> {
    // Fast path, inlined into the expansion loop.
    if tag != Some(NO_EXPAND_TAG.get()) {
        return Ok(None);
    }
    noexpand_hook_finish(token, input)
}

fn noexpand_hook_finish<S: TexpandState>(
    token: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<Option<token::Token>> {
    match input.unexpanded().next()? {
        None => Err(error::SimpleTokenError::new(
            input.vm(),
            token,
            r"unexpected end of input while expanding a \noexpand command",
        )
        .with_category(error::Category::UnexpectedEndOfInput)
        .into()),
        Some(token) => Ok(Some(token)),
    }
}

/// Get the simple `\expandafter` command.
///
/// This is the same algorithm as in the original TeX: it reads one token,
///     expands the next token once, and then puts the first token back.
pub fn get_expandafter_simple<S: TexpandState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(expandafter_simple_fn).with_doc(EXPANDAFTER_DOC)
}

/// Get the optimized `\expandafter` command.
///
/// Chains of the form `\expandafter<token 1>\expandafter<token 2>...\expandafter<token n><token n+1>`
///     are handled in one pass: the stream is scanned ahead while the pattern repeats,
///     `<token n+1>` is expanded and the intermediate `\expandafter` tokens are dropped.
/// This uses a single Rust stack frame rather than n.
///
/// If after this pass the buffered tokens again start with `\expandafter`,
///     as in `\expandafter\expandafter\expandafter\A\expandafter\B\C`,
///     the leading command is expanded too without yielding to the main expansion loop.
/// This repeats until the buffer no longer starts with `\expandafter`.
///
/// The output is identical to the simple version.
pub fn get_expandafter_optimized<S: TexpandState>() -> command::BuiltIn<S> {
    command::BuiltIn::new_expansion(expandafter_optimized_fn).with_doc(EXPANDAFTER_DOC)
}

fn expandafter_simple_fn<S: TexpandState>(
    expandafter_token: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<()> {
    let next = match input.unexpanded().next()? {
        None => {
            return Err(expandafter_missing_token_error(
                input.vm(),
                expandafter_token,
                0,
            ));
        }
        Some(next) => next,
    };
    if input.unexpanded().peek()?.is_none() {
        return Err(expandafter_missing_token_error(
            input.vm(),
            expandafter_token,
            1,
        ));
    }
    input.expanded().expand_once()?;
    input.back(next);
    Ok(())
}

fn expandafter_optimized_fn<S: TexpandState>(
    expandafter_token: token::Token,
    input: &mut vm::ExpansionInput<S>,
) -> txl::Result<()> {
    let mut buffer: Vec<token::Token> = input.checkout_token_buffer();
    loop {
        match input.unexpanded().next()? {
            None => {
                return Err(expandafter_missing_token_error(
                    input.vm(),
                    expandafter_token,
                    0,
                ))
            }
            Some(next) => buffer.push(next),
        };
        let token = match input.unexpanded().peek()? {
            None => {
                return Err(expandafter_missing_token_error(
                    input.vm(),
                    expandafter_token,
                    1,
                ))
            }
            Some(token) => token,
        };
        if token.value() != expandafter_token.value() {
            break;
        }
        input.unexpanded().consume()?;
    }
    input.expanded().expand_once()?;

    while let Some(&root) = buffer.first() {
        if root.value() != expandafter_token.value() {
            input.back_all(&buffer);
            break;
        }
        let mut last_expandafter_index = 0;
        while let Some(next) = buffer.get(last_expandafter_index + 2) {
            if next.value() != root.value() {
                break;
            }
            last_expandafter_index += 2;
        }
        // The buffer must end exactly one token after the last \expandafter token.
        match buffer.len() - (last_expandafter_index + 1) {
            // Under-full
            0 => {
                let next = match input.unexpanded().next()? {
                    None => return Err(expandafter_missing_token_error(input.vm(), root, 0)),
                    Some(next) => next,
                };
                buffer.push(next);
            }
            // Exactly right
            1 => {}
            // Overfull
            _ => {
                input.back_all(&buffer[last_expandafter_index + 2..]);
                buffer.truncate(last_expandafter_index + 2);
            }
        }
        if input.unexpanded().peek()?.is_none() {
            return Err(expandafter_missing_token_error(input.vm(), root, 1));
        }
        input.expanded().expand_once()?;
        remove_even_indices(&mut buffer);
    }
    input.return_token_buffer(buffer);
    Ok(())
}

fn remove_even_indices(v: &mut Vec<token::Token>) {
    let mut src = 1;
    let mut dest = 0;
    while let Some(token) = v.get(src) {
        v[dest] = *token;
        dest += 1;
        src += 2;
    }
    v.truncate(dest);
}

fn expandafter_missing_token_error<S>(
    vm: &vm::VM<S>,
    expandafter_token: token::Token,
    num_found: usize,
) -> Box<error::Error> {
    error::SimpleTokenError::new(
        vm,
        expandafter_token,
        format![
            r"unexpected end of input while expanding an \expandafter command: it must be followed by 2 tokens and {} were found",
            num_found,
        ],
    )
    .with_category(error::Category::UnexpectedEndOfInput)
    .into()
}

pub fn relax_tag() -> command::Tag {
    RELAX_TAG.get()
}

/// Get the `\relax` command.
pub fn get_relax<S>() -> command::BuiltIn<S> {
    command::BuiltIn::new_execution(|_, _| Ok(()))
        .with_tag(relax_tag())
        .with_doc(RELAX_DOC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def;
    use crate::testing::*;
    use std::collections::HashMap;

    fn built_in_commands(optimized: bool) -> HashMap<&'static str, command::BuiltIn<State>> {
        HashMap::from([
            ("def", def::get_def()),
            ("noexpand", get_noexpand()),
            ("relax", get_relax()),
            (
                "xa",
                match optimized {
                    true => get_expandafter_optimized(),
                    false => get_expandafter_simple(),
                },
            ),
        ])
    }

    test_suite![
        options(
            TestOption::BuiltInCommandsDyn(Box::new(|| { built_in_commands(true) })),
            TestOption::AllowUndefinedCommands(true),
        ),
        expansion_equality_tests(
            (simple_case, r"\def\a{Hello}\noexpand\a", r"\a"),
            (
                expandafter_and_noexpand_1,
                r"\def\a#1\b{Hello '#1'}\def\b{World}\a\b",
                "Hello ''"
            ),
            (
                expandafter_and_noexpand_2,
                r"\def\a#1\b{Hello '#1'}\def\b{World}\a\b\b",
                "Hello ''World"
            ),
            (
                expandafter_and_noexpand_3,
                r"\def\a#1\b{Hello '#1'}\def\b{World}\xa\a\b\b",
                "Hello 'World'"
            ),
            (
                expandafter_and_noexpand_4,
                r"\def\a#1\b{Hello '#1'}\def\b{World}\xa\a\noexpand\b\b",
                "Hello ''World"
            ),
            (
                only_expands_once,
                r"\def\A{\B}\def\B{Hello}\xa\noexpand\A",
                r"\B",
            ),
            (noexpand_character, r"\noexpand a", "a"),
            (relax_does_nothing, r"a\relax b", "ab"),
            (relax_ends_control_word, r"\def\A{x}\A\relax y", "xy"),
        ),
        failure_tests_with_category((end_of_input, r"\noexpand", UnexpectedEndOfInput),),
    ];

    #[test]
    fn noexpand_without_hook() {
        #[derive(Default)]
        struct HooklessState {
            testing: TestingComponent,
        }
        impl TexpandState for HooklessState {}
        texpand::implement_has_component![HooklessState, (TestingComponent, testing),];

        let options = vec![TestOption::BuiltInCommandsDyn(Box::new(|| {
            HashMap::from([("noexpand", get_noexpand())])
        }))];
        run_failure_test::<HooklessState>(r"\noexpand a", &options);
    }

    static PREFIX: &str = r"\def\mk#1#2{\def#1##1\notes##2\end{##1\notes##2#2\end}}\mk\a a\mk\b b\mk\c c\mk\d d\def\notes#1\end{#1}";
    static POSTFIX: &str = r"\notes\end";

    macro_rules! expandafter_test {
        ( $( ( $name: ident, $lhs: expr, $rhs: expr ) ),* $(,)? ) => {
            mod expandafter_simple {
                use super::*;
                test_suite![
                    options(TestOption::BuiltInCommandsDyn(Box::new(|| { built_in_commands(false) }))),
                    expansion_equality_tests(
                        $(
                            ( $name, format!("{}{}{}", PREFIX, $lhs, POSTFIX), $rhs ),
                        )*
                    ),
                ];
            }
            mod expandafter_optimized {
                use super::*;
                test_suite![
                    options(TestOption::BuiltInCommandsDyn(Box::new(|| { built_in_commands(true) }))),
                    expansion_equality_tests(
                        $(
                            ( $name, format!("{}{}{}", PREFIX, $lhs, POSTFIX), $rhs ),
                        )*
                    ),
                ];
            }
        };
    }

    // Each macro is moved right by a shift that depends on the number of preceding \xa
    // tokens: 0 -> 0, 1 -> 1, 3 -> 2, 7 -> 3. Applying the shifts from the last macro
    // backwards gives the expected order.
    expandafter_test![
        (texbook_p374_3, r"\xa\a\b", r"ba"),
        (texbook_p374_4, r"\xa\xa\xa\a\xa\b\c", "cba"),
        (
            texbook_p374_5,
            r"\xa\xa\xa\xa\xa\xa\xa\a\xa\xa\xa\b\xa\c\d",
            "dcba"
        ),
        (permutation_abcd, r"\a\b\c\d", "abcd"),
        (permutation_abdc, r"\a\b\xa\c\d", "abdc"),
        (permutation_acbd, r"\a\xa\b\c\d", "acbd"),
        (permutation_acdb, r"\a\xa\xa\xa\b\c\d", "acdb"),
        (permutation_adbc, r"\a\xa\b\xa\c\d", "adbc"),
        (permutation_adcb, r"\a\xa\xa\xa\b\xa\c\d", "adcb"),
        (permutation_bacd, r"\xa\a\b\c\d", "bacd"),
        (permutation_badc, r"\xa\a\b\xa\c\d", "badc"),
        (permutation_bcad, r"\xa\xa\xa\a\b\c\d", "bcad"),
        (permutation_bcda, r"\xa\xa\xa\xa\xa\xa\xa\a\b\c\d", "bcda"),
        (permutation_bdac, r"\xa\xa\xa\a\b\xa\c\d", "bdac"),
        (
            permutation_bdca,
            r"\xa\xa\xa\xa\xa\xa\xa\a\b\xa\c\d",
            "bdca"
        ),
        (permutation_cabd, r"\xa\a\xa\b\c\d", "cabd"),
        (permutation_cadb, r"\xa\a\xa\xa\xa\b\c\d", "cadb"),
        (permutation_cbad, r"\xa\xa\xa\a\xa\b\c\d", "cbad"),
        (permutation_cdab, r"\xa\xa\xa\a\xa\xa\xa\b\c\d", "cdab"),
        (
            permutation_cdba,
            r"\xa\xa\xa\xa\xa\xa\xa\a\xa\xa\xa\b\c\d",
            "cdba"
        ),
        (permutation_dabc, r"\xa\a\xa\b\xa\c\d", "dabc"),
        (permutation_dacb, r"\xa\a\xa\xa\xa\b\xa\c\d", "dacb"),
        (permutation_dbac, r"\xa\xa\xa\a\xa\b\xa\c\d", "dbac"),
        (
            permutation_dbca,
            r"\xa\xa\xa\xa\xa\xa\xa\a\xa\b\xa\c\d",
            "dbca"
        ),
        (permutation_dcab, r"\xa\xa\xa\a\xa\xa\xa\b\xa\c\d", "dcab"),
        (
            permutation_dcba,
            r"\xa\xa\xa\xa\xa\xa\xa\a\xa\xa\xa\b\xa\c\d",
            "dcba"
        ),
        (
            expandafter_last_after_first_pass,
            r"\xa\xa\xa\a\xa\xa\b\c\d",
            "bdac"
        ),
    ];

    fn run_expandafter_failure_test(input: &str, optimized: bool) {
        let options = vec![TestOption::BuiltInCommandsDyn(Box::new(|| {
            built_in_commands(optimized)
        }))];
        run_failure_test_with_category::<State>(
            input,
            texpand::error::Category::UnexpectedEndOfInput,
            &options,
        );
    }

    macro_rules! expandafter_failure_test {
        ($( ( $name: ident, $input: expr), )+) => {
            $(
            mod $name {
                #[test]
                fn simple() {
                    super::run_expandafter_failure_test($input, false);
                }
                #[test]
                fn optimized() {
                    super::run_expandafter_failure_test($input, true);
                }
            }
            )+
        };
    }

    expandafter_failure_test![
        (expandafter_missing_1st_token, r"\xa"),
        (expandafter_missing_2nd_token, r"\xa\a"),
        (expandafter_missing_1st_token_nested, r"\xa\xa\xa\a\xa\xa\b"),
        (
            expandafter_missing_2nd_token_nested,
            r"\def\A{}\xa\xa\xa\A\A"
        ),
    ];
}
