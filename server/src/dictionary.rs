//! Dictionary trie and answer validation
//!
//! The dictionary is built once at startup from a word list and never
//! modified afterwards, so a single instance is shared by every game behind
//! an `Arc`.

use log::info;
use shared::Feedback;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Word list compiled into the binary, one lowercase word per line
pub const EMBEDDED_WORDLIST: &str = include_str!("../resources/words.txt");

/// A trie node: outgoing transitions plus a flag for words ending here
#[derive(Debug, Default)]
pub struct TrieNode {
    children: HashMap<char, TrieNode>,
    terminal: bool,
}

impl TrieNode {
    pub fn child(&self, letter: char) -> Option<&TrieNode> {
        self.children.get(&letter)
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }
}

#[derive(Debug, Default)]
pub struct Dictionary {
    root: TrieNode,
    len: usize,
}

impl Dictionary {
    /// Builds a dictionary from any iterator of words.
    ///
    /// Words are trimmed and lowercased; empty entries and entries with
    /// non-alphabetic characters are skipped.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dictionary = Dictionary::default();
        for word in words {
            dictionary.insert(word.as_ref());
        }
        dictionary
    }

    pub fn from_wordlist(data: &str) -> Self {
        Self::from_words(data.lines())
    }

    pub fn embedded() -> Self {
        let dictionary = Self::from_wordlist(EMBEDDED_WORDLIST);
        info!("Loaded {} words from embedded word list", dictionary.len());
        dictionary
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);

        let mut dictionary = Dictionary::default();
        for line in reader.lines() {
            dictionary.insert(&line?);
        }

        info!(
            "Loaded {} words from {}",
            dictionary.len(),
            path.as_ref().display()
        );
        Ok(dictionary)
    }

    fn insert(&mut self, word: &str) {
        let word = word.trim().to_lowercase();
        if word.is_empty() || !word.chars().all(|c| c.is_alphabetic()) {
            return;
        }

        let mut node = &mut self.root;
        for letter in word.chars() {
            node = node.children.entry(letter).or_default();
        }

        if !node.terminal {
            node.terminal = true;
            self.len += 1;
        }
    }

    pub fn root(&self) -> &TrieNode {
        &self.root
    }

    /// Number of distinct words stored
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if `word` is a complete dictionary word.
    ///
    /// Lookup is exact; callers lowercase first.
    pub fn is_word(&self, word: &str) -> bool {
        if word.is_empty() {
            return false;
        }

        let mut node = &self.root;
        for letter in word.chars() {
            match node.child(letter) {
                Some(next) => node = next,
                None => return false,
            }
        }
        node.is_terminal()
    }

    /// Scores an answer against the round's letters.
    ///
    /// `top_answer` always starts false; the round engine awards it.
    pub fn feedback(&self, letters: &str, word: &str) -> Feedback {
        Feedback {
            dict: self.is_word(word),
            letters: is_constructible(letters, word),
            top_answer: false,
        }
    }
}

/// Returns true if `word` can be spelled from `letters` as a multiset.
///
/// Both sides are compared case-insensitively. Each letter of the draw can
/// be used at most once, so a word needing two E's fails against one E.
pub fn is_constructible(letters: &str, word: &str) -> bool {
    let mut available: HashMap<char, usize> = HashMap::new();
    for letter in letters.chars() {
        *available.entry(letter.to_ascii_lowercase()).or_insert(0) += 1;
    }

    for letter in word.chars() {
        match available.get_mut(&letter.to_ascii_lowercase()) {
            Some(count) if *count > 0 => *count -= 1,
            _ => return false,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_dictionary() -> Dictionary {
        Dictionary::from_words(["cat", "cats", "action", "creation", "tree"])
    }

    #[test]
    fn test_is_word() {
        let dictionary = small_dictionary();

        assert!(dictionary.is_word("cat"));
        assert!(dictionary.is_word("cats"));
        assert!(dictionary.is_word("creation"));
        assert!(!dictionary.is_word("ca"));
        assert!(!dictionary.is_word("catsup"));
        assert!(!dictionary.is_word("dog"));
        assert!(!dictionary.is_word(""));
    }

    #[test]
    fn test_lookup_is_exact_case() {
        let dictionary = small_dictionary();
        assert!(!dictionary.is_word("CAT"));
    }

    #[test]
    fn test_insert_normalizes_words() {
        let dictionary = Dictionary::from_wordlist("  Apple\nBANANA\n\nit's\ncat\ncat\n");

        assert_eq!(dictionary.len(), 3);
        assert!(dictionary.is_word("apple"));
        assert!(dictionary.is_word("banana"));
        assert!(!dictionary.is_word("it's"));
    }

    #[test]
    fn test_embedded_wordlist() {
        let dictionary = Dictionary::embedded();

        assert!(!dictionary.is_empty());
        assert!(dictionary.is_word("creation"));
        assert!(dictionary.is_word("zoo"));
    }

    #[test]
    fn test_embedded_wordlist_has_inflections() {
        let dictionary = Dictionary::embedded();

        for word in ["notes", "tones", "tears", "rates", "toner", "orient", "treason"] {
            assert!(dictionary.is_word(word), "{} missing", word);
        }
        for word in ["running", "carried", "stopped", "children", "happier"] {
            assert!(dictionary.is_word(word), "{} missing", word);
        }

        let feedback = dictionary.feedback("NOTESRAIX", "notes");
        assert!(feedback.is_valid());
    }

    #[test]
    fn test_from_missing_file() {
        let result = Dictionary::from_file("/nonexistent/words.txt");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("countdown-words-{}.txt", std::process::id()));
        std::fs::write(&path, "oat\noats\n").unwrap();

        let dictionary = Dictionary::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(dictionary.len(), 2);
        assert!(dictionary.is_word("oats"));
    }

    #[test]
    fn test_constructible() {
        assert!(is_constructible("CREATIONS", "creation"));
        assert!(is_constructible("CREATIONS", "cats"));
        assert!(is_constructible("creations", "ACTION"));
        assert!(is_constructible("CREATIONS", ""));
    }

    #[test]
    fn test_constructible_respects_multiplicity() {
        assert!(!is_constructible("TREAXBCDF", "tree"));
        assert!(is_constructible("TREEXBCDF", "tree"));
        assert!(!is_constructible("CREATIONS", "assassin"));
    }

    #[test]
    fn test_constructible_missing_letter() {
        assert!(!is_constructible("ZXQVWBNMP", "zoo"));
    }

    #[test]
    fn test_constructible_never_underflows() {
        let letters = "AEERSTLNO";
        for word in ["stone", "eel", "reel", "letters", "toner", "seen"] {
            let mut remaining: Vec<char> = letters.to_lowercase().chars().collect();
            let mut fits = true;
            for letter in word.chars() {
                match remaining.iter().position(|c| *c == letter) {
                    Some(index) => {
                        remaining.swap_remove(index);
                    }
                    None => fits = false,
                }
            }
            assert_eq!(is_constructible(letters, word), fits, "word {}", word);
        }
    }

    #[test]
    fn test_feedback() {
        let dictionary = small_dictionary();

        let feedback = dictionary.feedback("CREATIONS", "creation");
        assert!(feedback.dict);
        assert!(feedback.letters);
        assert!(!feedback.top_answer);

        let feedback = dictionary.feedback("CREATIONS", "tree");
        assert!(feedback.dict);
        assert!(!feedback.letters);

        let feedback = dictionary.feedback("CREATIONS", "rations");
        assert!(!feedback.dict);
        assert!(feedback.letters);
    }
}
