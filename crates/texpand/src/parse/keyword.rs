use crate::prelude as txl;
use crate::token::Value;
use crate::traits::*;

/// Attempts to read a keyword like `by` or `to` from the input.
///
/// The keyword is matched against letter and other tokens, ignoring ASCII case.
/// If the input does not contain the keyword, every token that was read is pushed back in
///     its original order and false is returned.
/// If the keyword is found, spaces after it are skipped.
pub fn get_keyword<I: TokenStream>(input: &mut I, keyword: &str) -> txl::Result<bool> {
    let mut consumed = Vec::with_capacity(keyword.len());
    let mut matched = true;
    for want in keyword.chars() {
        let token = match input.next()? {
            None => {
                matched = false;
                break;
            }
            Some(token) => token,
        };
        consumed.push(token);
        matched = match token.value() {
            Value::Letter(c) | Value::Other(c) => c.eq_ignore_ascii_case(&want),
            _ => false,
        };
        if !matched {
            break;
        }
    }
    if matched {
        input.skip_spaces();
        return Ok(true);
    }
    input.back_all(&consumed);
    Ok(false)
}
