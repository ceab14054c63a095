use crate::prelude as txl;
use crate::traits::*;
use crate::*;

/// When parsed, this type consumes an optional equals from the token stream.
///
/// Spaces before the equals are skipped.
/// If an equals is found, spaces after it are skipped too.
#[derive(Debug, PartialEq, Eq)]
pub struct OptionalEquals;

impl<S: TexpandState> Parsable<S> for OptionalEquals {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        parse_optional_equals(input)?;
        Ok(OptionalEquals {})
    }
}

/// When parsed, this type consumes an optional equals from the token stream without performing expansion.
#[derive(Debug, PartialEq, Eq)]
pub struct OptionalEqualsUnexpanded;

impl<S: TexpandState> Parsable<S> for OptionalEqualsUnexpanded {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        parse_optional_equals(input.unexpanded())?;
        Ok(OptionalEqualsUnexpanded {})
    }
}

fn parse_optional_equals<I: TokenStream>(input: &mut I) -> txl::Result<()> {
    input.skip_spaces();
    if get_optional_element![
        input,
        token::Value::Other('=') => (),
    ]
    .is_some()
    {
        input.skip_spaces();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::testing::*;

    parse_success_tests![
        (no_equals, "", OptionalEquals {}),
        (equals, "=", OptionalEquals {}),
        (spaces_then_equals, "   =", OptionalEquals {}),
        (unexpanded_equals, "  = ", OptionalEqualsUnexpanded {}),
    ];

    fn remaining(source: &str) -> Vec<token::Value> {
        let mut vm = vm::VM::<State>::new(Default::default());
        vm.push_source("main.tex", source);
        let input = vm::ExecutionInput::new(&mut vm);
        OptionalEquals::parse(input).unwrap();
        let mut values = vec![];
        while let Some(token) = input.next().unwrap() {
            values.push(token.value());
        }
        values
    }

    #[test]
    fn spaces_after_equals_are_skipped() {
        assert_eq!(remaining("  =  a"), vec![token::Value::Letter('a')]);
    }

    #[test]
    fn other_token_is_pushed_back() {
        assert_eq!(
            remaining("  a ="),
            vec![
                token::Value::Letter('a'),
                token::Value::Space(' '),
                token::Value::Other('=')
            ]
        );
    }
}
