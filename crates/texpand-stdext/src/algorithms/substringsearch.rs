//! Knuth–Morris–Pratt substring search.
//!
//! Macro parameters delimited by tokens are found by running a search for the delimiter
//! over tokens as they are read from the input.
//! The string being searched is therefore never fully known in advance, so the API
//! takes elements one at a time.
//!
//! ```
//! # use texpand_stdext::algorithms::substringsearch::Matcher;
//! let matcher = Matcher::new(vec!['a', 'b', 'a']).unwrap();
//! let mut search = matcher.start();
//! assert_eq![search.next(&'x'), false];
//! assert_eq![search.next(&'a'), false];
//! assert_eq![search.next(&'b'), false];
//! assert_eq![search.next(&'a'), true];
//! assert_eq![search.next(&'b'), false];
//! assert_eq![search.next(&'a'), true];
//! ```

/// A precomputed search for one non-empty substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matcher<T: PartialEq> {
    substring: Vec<T>,
    // prefix_fn[i] is the length of the longest proper prefix of substring[..=i]
    // that is also a suffix of it.
    prefix_fn: Vec<usize>,
}

impl<T: PartialEq> Matcher<T> {
    /// Builds a matcher for the substring. Returns [None] if the substring is empty.
    pub fn new(substring: Vec<T>) -> Option<Matcher<T>> {
        if substring.is_empty() {
            return None;
        }
        let mut prefix_fn = Vec::with_capacity(substring.len());
        prefix_fn.push(0);
        let mut k = 0;
        for i in 1..substring.len() {
            while k > 0 && substring[k] != substring[i] {
                k = prefix_fn[k - 1];
            }
            if substring[k] == substring[i] {
                k += 1;
            }
            prefix_fn.push(k);
        }
        Some(Matcher {
            substring,
            prefix_fn,
        })
    }

    /// Starts a search over a new string.
    pub fn start(&self) -> Search<'_, T> {
        Search {
            matcher: self,
            q: 0,
        }
    }

    pub fn substring(&self) -> &[T] {
        &self.substring
    }
}

/// An in-progress search.
pub struct Search<'a, T: PartialEq> {
    matcher: &'a Matcher<T>,
    q: usize,
}

impl<'a, T: PartialEq> Search<'a, T> {
    /// Feeds the next element of the string.
    ///
    /// Returns true if the elements fed so far end with the substring.
    pub fn next(&mut self, elem: &T) -> bool {
        let substring = &self.matcher.substring;
        while self.q > 0 && &substring[self.q] != elem {
            self.q = self.matcher.prefix_fn[self.q - 1];
        }
        if &substring[self.q] == elem {
            self.q += 1;
        }
        if self.q == substring.len() {
            self.q = self.matcher.prefix_fn[self.q - 1];
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn match_positions(substring: &str, string: &str) -> Vec<usize> {
        let matcher = Matcher::new(substring.chars().collect()).unwrap();
        let mut search = matcher.start();
        string
            .chars()
            .enumerate()
            .filter_map(|(i, c)| if search.next(&c) { Some(i) } else { None })
            .collect()
    }

    #[test]
    fn empty_substring() {
        assert_eq!(Matcher::<char>::new(vec![]), None);
    }

    #[test]
    fn single_element() {
        assert_eq!(match_positions("a", "banana"), vec![1, 3, 5]);
    }

    #[test]
    fn overlapping_matches() {
        assert_eq!(match_positions("ana", "banana"), vec![3, 5]);
    }

    #[test]
    fn partial_match_then_restart() {
        assert_eq!(match_positions("aab", "aaab"), vec![3]);
        assert_eq!(match_positions("abab", "abaabab"), vec![6]);
    }

    #[test]
    fn no_match() {
        assert_eq!(match_positions("xyz", "xyxyxy"), Vec::<usize>::new());
    }
}
