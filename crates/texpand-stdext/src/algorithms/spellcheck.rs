//! Spell checking with Levenshtein distance.
//!
//! Used to build "did you mean" suggestions when an undefined control sequence is invoked.
//!
//! ```
//! # use texpand_stdext::algorithms::spellcheck::find_close_words;
//! let dictionary = ["def", "edef", "gdef", "relax", "let"];
//! let close = find_close_words(&dictionary, "deff");
//! assert_eq!(close[0].word, "def");
//! assert_eq!(close[0].distance, 1);
//! ```

/// A dictionary word together with its distance to the searched word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseWord {
    pub word: String,
    pub distance: usize,
}

/// Returns the dictionary words that are plausibly misspellings of `word`, closest first.
///
/// A word is plausible if its distance is at most a third of the searched word's length,
/// and always if the distance is 1.
/// Ties are broken alphabetically.
pub fn find_close_words<S: AsRef<str>>(dictionary: &[S], word: &str) -> Vec<CloseWord> {
    let max_distance = std::cmp::max(1, word.chars().count() / 3);
    let mut close: Vec<CloseWord> = dictionary
        .iter()
        .map(|candidate| CloseWord {
            word: candidate.as_ref().to_string(),
            distance: levenshtein_distance(word, candidate.as_ref()),
        })
        .filter(|candidate| candidate.distance <= max_distance)
        .collect();
    close.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.word.cmp(&b.word)));
    close
}

/// The minimum number of single character insertions, deletions and substitutions
/// needed to turn `a` into `b`.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    // Only the previous row of the dynamic programming matrix is kept.
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, a_char) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, b_char) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if a_char == *b_char {
                diagonal
            } else {
                1 + diagonal.min(above).min(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! levenshtein_tests {
        ($( ($name: ident, $a: expr, $b: expr, $want: expr), )+) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!(levenshtein_distance($a, $b), $want);
                    assert_eq!(levenshtein_distance($b, $a), $want);
                }
            )+
        };
    }

    levenshtein_tests![
        (identical, "relax", "relax", 0),
        (both_empty, "", "", 0),
        (one_empty, "", "def", 3),
        (substitution, "def", "dff", 1),
        (insertion, "def", "gdef", 1),
        (deletion, "expandafter", "expndafter", 1),
        (kitten_sitting, "kitten", "sitting", 3),
        (unrelated, "abc", "xyz", 3),
    ];

    #[test]
    fn close_words_sorted() {
        let dictionary = ["edef", "gdef", "def", "relax"];
        let close = find_close_words(&dictionary, "def");
        let words: Vec<&str> = close.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(words, vec!["def", "edef", "gdef"]);
    }

    #[test]
    fn nothing_close() {
        let dictionary = ["catcode", "everyeof"];
        assert!(find_close_words(&dictionary, "def").is_empty());
    }
}
