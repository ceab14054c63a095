//! Number parsing.
//!
//! The number may be octal, decimal, hexadecimal, or cast from a character token.
//! Each form may be preceded by any number of `+` and `-` signs and spaces.

use crate::error;
use crate::parse;
use crate::prelude as txl;
use crate::token;
use crate::token::Value;
use crate::traits::*;
use crate::vm;

impl<S: TexpandState> Parsable<S> for i32 {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        let (_, i): (token::Token, i32) = parse_number_internal(input)?;
        Ok(i)
    }
}

impl<S: TexpandState> Parsable<S> for token::CatCode {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        let (token, i): (token::Token, i32) = parse_number_internal(input)?;
        if let Ok(val_u8) = u8::try_from(i) {
            if let Ok(cat_code) = token::CatCode::try_from(val_u8) {
                return Ok(cat_code);
            }
        }
        Err(parse::Error::new(
            input.vm(),
            "a category code number (an integer in the range [0, 15])",
            Some(token),
            "",
        )
        .with_got_override(format!["got the integer {i}"])
        .with_annotation_override("this is where the number started")
        .into())
    }
}

impl<S: TexpandState> Parsable<S> for char {
    fn parse_impl(input: &mut vm::ExpandedStream<S>) -> txl::Result<Self> {
        let (token, i): (token::Token, i32) = parse_number_internal(input)?;
        match u32::try_from(i).ok().and_then(char::from_u32) {
            Some(c) => Ok(c),
            None => Err(parse::Error::new(
                input.vm(),
                "a character code",
                Some(token),
                "a character code is a non-negative integer that is a valid Unicode scalar value",
            )
            .with_got_override(format!["got the integer {i}"])
            .with_annotation_override("this is where the number started")
            .into()),
        }
    }
}

const GUIDANCE_BEGINNING: &str =
    "a number begins with zero or more minus signs followed by one of the following:
- A decimal digit (0-9), which begins a decimal number.
- The character ', which indicates the beginning of an octal number
- The character \", which indicates the beginning of a hexadecimal number
- The character `, followed by a character token. The character is converted into its UTF-8 number.
";

fn parse_number_internal<S: TexpandState>(
    stream: &mut vm::ExpandedStream<S>,
) -> txl::Result<(token::Token, i32)> {
    let sign = parse_optional_signs(stream)?;
    let first_token = stream.next_or_err(NumberEndOfInputError {})?;
    let result: i32 = match first_token.value() {
        Value::Other(c @ '0'..='9') => parse_constant::<S, 10>(stream, c as i32 - '0' as i32)?,
        Value::Other('\'') => parse_constant::<S, 8>(stream, 0)?,
        Value::Other('"') => parse_constant::<S, 16>(stream, 0)?,
        Value::Other('`') => parse_character(stream)?,
        _ => {
            stream.back(first_token);
            let err = parse::Error::new(
                stream.vm(),
                "the beginning of a number",
                Some(first_token),
                GUIDANCE_BEGINNING,
            )
            .with_category(error::Category::MissingNumber);
            let err = match first_token.value() {
                Value::CommandRef(command_ref) => {
                    let annotation = match stream.commands_map().get_command(&command_ref) {
                        None => "undefined control sequence".to_string(),
                        Some(cmd) => format!["control sequence referencing {cmd}"],
                    };
                    err.with_annotation_override(annotation)
                }
                _ => err,
            };
            return Err(err.into());
        }
    };
    get_optional_element![stream, Value::Space(_) => (),];
    let result = match sign {
        None => result,
        // Only i32::MIN cannot be negated, and the parsed magnitude never exceeds i32::MAX.
        Some(_) => -result,
    };
    Ok((first_token, result))
}

#[derive(Debug)]
struct NumberEndOfInputError;

impl error::EndOfInputError for NumberEndOfInputError {
    fn doing(&self) -> String {
        "parsing a number".into()
    }

    fn notes(&self) -> Vec<String> {
        vec![GUIDANCE_BEGINNING.into()]
    }
}

/// Parses optional signs and spaces.
///
/// If the combination of the signs is positive, [None] is returned.
/// Otherwise, the Token corresponding to the last negative sign is returned.
fn parse_optional_signs<S: TexpandState>(
    stream: &mut vm::ExpandedStream<S>,
) -> txl::Result<Option<token::Token>> {
    let mut result = None;
    while let Some((sign, token)) = get_optional_element_with_token![
        stream,
        Value::Other('+') => true,
        Value::Other('-') => false,
        Value::Space(_) => true,
    ] {
        result = match (result, sign) {
            (None, false) => Some(token),
            (Some(_), false) => None,
            (result, true) => result,
        };
    }
    Ok(result)
}

const CHARACTER_GUIDANCE: &str =
    r"a character is a character token or single-character control sequence like \a";

fn parse_character<S: TexpandState>(input: &mut vm::ExpandedStream<S>) -> txl::Result<i32> {
    let token = input.unexpanded().next_or_err(CharacterError {})?;
    let c = match token.value() {
        Value::CommandRef(token::CommandRef::ControlSequence(cs_name, _)) => {
            let name = input
                .vm()
                .cs_name_interner()
                .resolve(cs_name)
                .unwrap_or_default();
            let mut iter = name.chars();
            match (iter.next(), iter.next()) {
                (Some(c), None) => c,
                _ => {
                    return Err(parse::Error::new(
                        input.vm(),
                        "a character",
                        Some(token),
                        CHARACTER_GUIDANCE,
                    )
                    .into())
                }
            }
        }
        _ => match token.char() {
            Some(c) => c,
            None => {
                return Err(parse::Error::new(
                    input.vm(),
                    "a character",
                    Some(token),
                    CHARACTER_GUIDANCE,
                )
                .into())
            }
        },
    };
    Ok(c as i32)
}

#[derive(Debug)]
struct CharacterError;

impl error::EndOfInputError for CharacterError {
    fn doing(&self) -> String {
        "parsing a character".into()
    }

    fn notes(&self) -> Vec<String> {
        vec![CHARACTER_GUIDANCE.into()]
    }
}

fn digit<const RADIX: i32>(value: Value) -> Option<i32> {
    let c = match value {
        Value::Other(c) => c,
        Value::Letter(c) if RADIX == 16 => c,
        _ => return None,
    };
    match c.to_digit(RADIX as u32) {
        // Hexadecimal digits 0-9 must have category other.
        Some(d) if d < 10 && !matches!(value, Value::Other(_)) => None,
        Some(d) => Some(d as i32),
        None => None,
    }
}

fn parse_constant<S: TexpandState, const RADIX: i32>(
    stream: &mut vm::ExpandedStream<S>,
    mut result: i32,
) -> txl::Result<i32> {
    let mut started = RADIX == 10;
    loop {
        let next = match stream.next()? {
            None => break,
            Some(next) => next,
        };
        let lsd = match digit::<RADIX>(next.value()) {
            None => {
                stream.back(next);
                break;
            }
            Some(lsd) => lsd,
        };
        started = true;
        result = match add_lsd::<RADIX>(result, lsd) {
            Some(n) => n,
            None => return Err(add_lsd_error::<S, RADIX>(stream.vm(), next, result, lsd).into()),
        }
    }
    if !started {
        let (expected, guidance) = match RADIX {
            8 => (
                "an octal digit",
                "an octal digit is a token with value 0-7 and category other",
            ),
            _ => (
                "a hexadecimal digit",
                "a hexadecimal digit is either:\n- A character token with value 0-9 and category other, or\n- A character token with value A-F or a-f and category letter or other",
            ),
        };
        let got = stream.peek()?;
        return Err(parse::Error::new(stream.vm(), expected, got, guidance)
            .with_category(error::Category::MissingNumber)
            .into());
    }
    Ok(result)
}

fn add_lsd<const RADIX: i32>(n: i32, lsd: i32) -> Option<i32> {
    match n.checked_mul(RADIX) {
        None => None,
        Some(n) => n.checked_add(lsd),
    }
}

fn add_lsd_error<S, const RADIX: i32>(
    vm: &vm::VM<S>,
    token: token::Token,
    n: i32,
    lsd: i32,
) -> parse::Error {
    let (got, range) = match RADIX {
        8 => (
            format!["got '{n:o}{lsd:o}"],
            format!["'{:o}, '{:o}", -i32::MAX, i32::MAX],
        ),
        16 => (
            format!["got 0x{n:X}{lsd:X}"],
            format!["-0x{:X}, 0x{:X}", i32::MAX, i32::MAX],
        ),
        _ => (
            format!["got {n}{lsd}"],
            format!["{}, {}", -i32::MAX, i32::MAX],
        ),
    };
    parse::Error::new(vm, format!["a number in the range [{range}]"], Some(token), "")
        .with_got_override(got)
        .with_annotation_override("this digit makes the number too big")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::testing::*;

    parse_success_tests![
        (octal_0, "'0", 0),
        (octal_7, "'7", 7),
        (octal_8, "'10", 8),
        (octal_15, "'17", 15),
        (octal_129, "'201", 129),
        (octal_max, "'17777777777", 2147483647),
        (octal_min, "-'17777777777", -2147483647),
        (decimal_0, "0", 0),
        (decimal_9, "9", 9),
        (decimal_19, "19", 19),
        (decimal_1_with_0_padding, "00019", 19),
        (decimal_123, "123", 123),
        (decimal_max, "2147483647", 2147483647),
        (decimal_min, "-2147483647", -2147483647),
        (hexadecimal_0, "\"0", 0),
        (hexadecimal_10, "\"A", 10),
        (hexadecimal_15, "\"F", 15),
        (hexadecimal_lowercase, "\"f", 15),
        (hexadecimal_16, "\"10", 16),
        (hexadecimal_31, "\"1F", 31),
        (hexadecimal_513, "\"201", 513),
        (hexadecimal_max, "\"7FFFFFFF", 2147483647),
        (hexadecimal_min, "-\"7FFFFFFF", -2147483647),
        (number_from_character, "`A", 65),
        (number_from_length_1_control_sequence, r"`\A", 65),
        (number_from_character_non_ascii, "`ö", 0x00F6),
        (number_from_length_1_control_sequence_non_ascii, r"`\ö", 0x00F6),
        (signs_plus, r"+4", 4),
        (signs_minus, r"-4", -4),
        (signs_plus_minus, r"+-4", -4),
        (signs_minus_minus, r"--4", 4),
        (signs_minus_minus_spaces, r"  -  - 4", 4),
        (catcode, "11", token::CatCode::Letter),
        (character_code, "97", 'a'),
    ];

    parse_failure_tests![
        i32,
        State,
        (octal_too_big, "'177777777770"),
        (octal_empty, "'"),
        (decimal_too_big_1, "2147483648"),
        (decimal_too_big_2, "500000000000000"),
        (decimal_too_negative, "-2147483648"),
        (hexadecimal_too_big, "\"7FFFFFFF0"),
        (hexadecimal_empty, "\""),
        (character, "A"),
        (character_missing, r"`"),
        (control_sequence_too_big, r"`\BC"),
        (empty_input, ""),
    ];

    parse_failure_tests![
        token::CatCode,
        State,
        (catcode_too_big, "16"),
        (catcode_negative, "-1"),
    ];

    #[test]
    fn terminator_is_pushed_back() {
        let mut vm = vm::VM::<State>::new(Default::default());
        vm.push_source("main.tex", "12a");
        let input = vm::ExecutionInput::new(&mut vm);
        assert_eq!(i32::parse(input).unwrap(), 12);
        assert_eq!(
            input.next().unwrap().map(|t| t.value()),
            Some(Value::Letter('a'))
        );
    }

    #[test]
    fn one_trailing_space_is_consumed() {
        let mut vm = vm::VM::<State>::new(Default::default());
        vm.push_source("main.tex", "12 \\relax");
        let input = vm::ExecutionInput::new(&mut vm);
        assert_eq!(i32::parse(input).unwrap(), 12);
        let next = input.unexpanded().next().unwrap().unwrap();
        assert!(next.command_ref().is_some());
    }

    #[test]
    fn missing_number_is_pushed_back() {
        let mut vm = vm::VM::<State>::new(Default::default());
        vm.push_source("main.tex", "a");
        let input = vm::ExecutionInput::new(&mut vm);
        let err = i32::parse(input).unwrap_err();
        assert_eq!(err.category(), error::Category::MissingNumber);
        assert_eq!(
            input.next().unwrap().map(|t| t.value()),
            Some(Value::Letter('a'))
        );
    }
}
