//! Exhaustive best-word search over a letter draw
//!
//! [`Solutions`] walks the dictionary trie and the draw together, depth
//! first, yielding each dictionary word it can spell as soon as it reaches
//! the word's terminal node. The walk keeps its own stack instead of
//! recursing, so candidates are produced lazily and the search can be
//! dropped at any point.

use crate::dictionary::{Dictionary, TrieNode};
use std::collections::HashSet;

/// One level of the depth-first walk
struct Frame<'a> {
    node: &'a TrieNode,
    /// Draw position consumed to reach this node; `None` for the root
    via: Option<usize>,
    /// Next draw position to try from this node
    next: usize,
    /// Characters already branched on at this depth
    tried: HashSet<char>,
    visited: bool,
}

impl<'a> Frame<'a> {
    fn new(node: &'a TrieNode, via: Option<usize>) -> Self {
        Self {
            node,
            via,
            next: 0,
            tried: HashSet::new(),
            visited: false,
        }
    }
}

/// Lazy stream of every dictionary word spellable from a draw
///
/// Words are yielded in discovery order, unsorted. The stream is a raw
/// candidate list: callers that need distinct words deduplicate themselves.
pub struct Solutions<'a> {
    letters: Vec<char>,
    used: Vec<bool>,
    word: String,
    stack: Vec<Frame<'a>>,
}

impl<'a> Solutions<'a> {
    pub fn new(dictionary: &'a Dictionary, letters: &str) -> Self {
        let letters: Vec<char> = letters.chars().collect();
        Self {
            used: vec![false; letters.len()],
            letters,
            word: String::new(),
            stack: vec![Frame::new(dictionary.root(), None)],
        }
    }

    /// Pops the top frame and releases the draw position it consumed
    fn backtrack(&mut self) {
        if let Some(frame) = self.stack.pop() {
            if let Some(index) = frame.via {
                self.used[index] = false;
                self.word.pop();
            }
        }
    }
}

impl<'a> Iterator for Solutions<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let depth = self.stack.len();
            let exhausted = self.word.chars().count() == self.letters.len();
            let frame = self.stack.last_mut()?;
            let node: &'a TrieNode = frame.node;

            if !frame.visited {
                frame.visited = true;
                if node.is_terminal() {
                    return Some(self.word.clone());
                }
            }

            let mut descend = None;
            if !exhausted {
                while frame.next < self.letters.len() {
                    let index = frame.next;
                    frame.next += 1;

                    let letter = self.letters[index];
                    if self.used[index] || frame.tried.contains(&letter) {
                        continue;
                    }

                    if let Some(child) = node.child(letter) {
                        frame.tried.insert(letter);
                        descend = Some((index, letter, child));
                        break;
                    }
                }
            }

            match descend {
                Some((index, letter, child)) => {
                    self.used[index] = true;
                    self.word.push(letter);
                    self.stack.push(Frame::new(child, Some(index)));
                }
                None => {
                    self.backtrack();
                    if depth == 1 {
                        return None;
                    }
                }
            }
        }
    }
}

impl Dictionary {
    /// Enumerates dictionary words spellable from `letters`.
    ///
    /// Letters are matched exactly against the trie, so pass them lowercased.
    pub fn solve<'a>(&'a self, letters: &str) -> Solutions<'a> {
        Solutions::new(self, letters)
    }
}

/// Longest candidates first, discovery order within a length, at most `limit`
pub fn best_words(dictionary: &Dictionary, letters: &str, limit: usize) -> Vec<String> {
    let mut words: Vec<String> = dictionary.solve(&letters.to_lowercase()).collect();

    // sort_by is stable, so equal lengths keep discovery order
    words.sort_by(|a, b| b.len().cmp(&a.len()));
    words.truncate(limit);
    words
}
