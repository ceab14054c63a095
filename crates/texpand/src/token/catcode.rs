//! Category codes and the table that assigns them to characters.
use texpand_stdext::collections::groupingmap::{GroupingHashMap, GroupingVec, Scope};

use CatCode::*;

/// The 16 category codes of TeX.
///
/// Each variant's documentation gives a character that has this category in plain TeX.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CatCode {
    /// Starts a control sequence. Example: `\`.
    ///
    /// Only the lexer sees this code; no token ever carries it.
    Escape = 0,
    /// Example: `{`.
    BeginGroup = 1,
    /// Example: `}`.
    EndGroup = 2,
    /// Example: `$`.
    MathShift = 3,
    /// Example: `&`.
    AlignmentTab = 4,
    /// Ends a line. Example: `\n`.
    ///
    /// Behaves like [Space] except that an empty line produces `\par`
    /// and that it terminates comments.
    EndOfLine = 5,
    /// Introduces a macro parameter. Example: `#`.
    Parameter = 6,
    /// Example: `^`.
    Superscript = 7,
    /// Example: `_`.
    Subscript = 8,
    /// Dropped by the lexer. Example: ASCII null.
    Ignored = 9,
    /// Example: ` `.
    Space = 10,
    /// A character that can appear in a multi-letter control sequence name. Example: `a`.
    Letter = 11,
    /// Example: `@`.
    #[default]
    Other = 12,
    /// A single character that behaves like a control sequence. Example: `~`.
    Active = 13,
    /// Starts a comment that runs to the end of the line. Example: `%`.
    Comment = 14,
    /// Dropped by the lexer. Example: ASCII delete.
    Invalid = 15,
}

impl TryFrom<u8> for CatCode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Escape,
            1 => BeginGroup,
            2 => EndGroup,
            3 => MathShift,
            4 => AlignmentTab,
            5 => EndOfLine,
            6 => Parameter,
            7 => Superscript,
            8 => Subscript,
            9 => Ignored,
            10 => Space,
            11 => Letter,
            12 => Other,
            13 => Active,
            14 => Comment,
            15 => Invalid,
            _ => return Err(()),
        })
    }
}

impl std::fmt::Display for CatCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} ({})", self, *self as u8)
    }
}

impl CatCode {
    /// The category a character has when no assignment has been made for it.
    pub fn default_for(c: char) -> CatCode {
        match c {
            '\\' => Escape,
            ' ' => Space,
            '\r' | '\n' => EndOfLine,
            '%' => Comment,
            '\u{0}' => Ignored,
            '\u{7F}' => Invalid,
            c if c.is_alphabetic() => Letter,
            _ => Other,
        }
    }
}

const PLAIN_TEX_ASSIGNMENTS: [(char, CatCode); 10] = [
    ('{', BeginGroup),
    ('}', EndGroup),
    ('$', MathShift),
    ('&', AlignmentTab),
    ('#', Parameter),
    ('^', Superscript),
    ('_', Subscript),
    ('~', Active),
    ('\t', Space),
    ('\u{C}', Active),
];

/// Assignment of category codes to characters.
///
/// Characters without an explicit assignment get [CatCode::default_for].
/// Assignments are scoped: those made in a group are undone when the group ends.
#[derive(Default)]
pub struct CatCodeTable {
    low: GroupingVec<CatCode>,
    high: GroupingHashMap<char, CatCode>,
}

impl CatCodeTable {
    /// A table with the assignments made by the plain TeX format.
    pub fn plain_tex() -> CatCodeTable {
        let mut table: CatCodeTable = Default::default();
        for (c, cat_code) in PLAIN_TEX_ASSIGNMENTS {
            table.set(c, cat_code, Scope::Global);
        }
        table
    }

    #[inline]
    pub fn classify(&self, c: char) -> CatCode {
        let assigned = if (c as u32) < 128 {
            self.low.get(&(c as usize))
        } else {
            self.high.get(&c)
        };
        match assigned {
            Some(cat_code) => *cat_code,
            None => CatCode::default_for(c),
        }
    }

    pub fn set(&mut self, c: char, cat_code: CatCode, scope: Scope) {
        if (c as u32) < 128 {
            self.low.insert(c as usize, cat_code, scope);
        } else {
            self.high.insert(c, cat_code, scope);
        }
    }

    pub fn begin_group(&mut self) {
        self.low.begin_group();
        self.high.begin_group();
    }

    /// Ends the current group. Does nothing if there is no group to end.
    pub fn end_group(&mut self) {
        // Both containers always have the same depth.
        if self.low.end_group().is_ok() {
            let _ = self.high.end_group();
        }
    }
}
