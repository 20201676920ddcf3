use std::collections::{BTreeSet, HashSet};
use std::fmt::{Debug, Formatter};

use log::warn;
use smallvec::SmallVec;

use crate::{WordId, MAX_SLOT_LENGTH};

/// The external source of acceptable words.
pub trait Dictionary {
    fn words(&self) -> Box<dyn Iterator<Item = &str> + '_>;
}

impl<T: AsRef<str>> Dictionary for [T] {
    fn words(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.iter().map(AsRef::as_ref))
    }
}

impl<T: AsRef<str>, const N: usize> Dictionary for [T; N] {
    fn words(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.iter().map(AsRef::as_ref))
    }
}

impl<T: AsRef<str>> Dictionary for Vec<T> {
    fn words(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.iter().map(AsRef::as_ref))
    }
}

impl<T: AsRef<str>> Dictionary for BTreeSet<T> {
    fn words(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.iter().map(AsRef::as_ref))
    }
}

impl<T: AsRef<str>> Dictionary for HashSet<T> {
    fn words(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.iter().map(AsRef::as_ref))
    }
}

/// A struct representing a word that can be chosen for a slot.
#[derive(Debug)]
pub struct Word {
    pub string: String,
    pub glyphs: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

/// The normalised contents of a dictionary: valid words only, de-duplicated and sorted, so that
/// word ids follow lexicographic order whatever the dictionary's iteration order.
pub struct WordList {
    pub words: Vec<Word>,

    /// Word ids bucketed by word length (in glyphs).
    pub ids_by_length: Vec<Vec<WordId>>,
}

impl Debug for WordList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordList")
            .field("words", &format!("({} entries)", self.words.len()))
            .finish()
    }
}

impl WordList {
    pub fn new<D>(dictionary: &D) -> WordList
    where
        D: Dictionary + ?Sized,
    {
        let mut accepted: BTreeSet<&str> = BTreeSet::new();
        for word in dictionary.words() {
            if word.is_empty() {
                warn!("Ignoring empty dictionary word");
            } else if word.chars().any(char::is_whitespace) {
                warn!("Ignoring dictionary word with whitespace: {:?}", word);
            } else {
                accepted.insert(word);
            }
        }

        let words: Vec<Word> = accepted
            .into_iter()
            .map(|word| Word {
                string: word.to_string(),
                glyphs: word.chars().collect(),
            })
            .collect();

        let max_length = words.iter().map(|word| word.glyphs.len()).max().unwrap_or(0);
        let mut ids_by_length: Vec<Vec<WordId>> = vec![vec![]; max_length + 1];
        for (word_id, word) in words.iter().enumerate() {
            ids_by_length[word.glyphs.len()].push(word_id);
        }

        WordList {
            words,
            ids_by_length,
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    pub fn words_of_length(&self, length: usize) -> &[WordId] {
        self.ids_by_length.get(length).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn find(&self, string: &str) -> Option<WordId> {
        self.words
            .binary_search_by(|word| word.string.as_str().cmp(string))
            .ok()
    }
}
