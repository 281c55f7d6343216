//! Derived word views
//!
//! Pure projections over a word mirror: tag filtering and a shuffled display
//! order. Nothing here mutates the mirror; callers recompute on every read.

use std::collections::{BTreeSet, HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{TagId, Word, WordId};

/// Tag ids the user has selected to narrow the word list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    selected: BTreeSet<TagId>,
}

impl TagFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I: IntoIterator<Item = TagId>>(ids: I) -> Self {
        Self {
            selected: ids.into_iter().collect(),
        }
    }

    /// Flips selection of `tag_id`; returns whether it is now selected.
    pub fn toggle(&mut self, tag_id: TagId) -> bool {
        if self.selected.remove(&tag_id) {
            false
        } else {
            self.selected.insert(tag_id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn contains(&self, tag_id: TagId) -> bool {
        self.selected.contains(&tag_id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn ids(&self) -> Vec<TagId> {
        self.selected.iter().copied().collect()
    }

    pub fn matches(&self, word: &Word) -> bool {
        self.is_empty() || word.tags.iter().any(|tag| self.selected.contains(&tag.id))
    }

    pub(crate) fn retain_known(&mut self, known: &HashSet<TagId>) {
        self.selected.retain(|id| known.contains(id));
    }
}

/// Words matching `filter`, in input order. An empty filter keeps everything;
/// otherwise untagged words never match.
pub fn filter_words(words: &[Word], filter: &TagFilter) -> Vec<Word> {
    words
        .iter()
        .filter(|word| filter.matches(word))
        .cloned()
        .collect()
}

/// A one-shot display permutation laid over a word mirror.
///
/// Uniformity of the permutation is not part of the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOrder {
    ids: Vec<WordId>,
}

impl DisplayOrder {
    pub fn shuffled(words: &[Word]) -> Self {
        Self::shuffled_with(words, &mut rand::rng())
    }

    pub fn shuffled_with<R: Rng + ?Sized>(words: &[Word], rng: &mut R) -> Self {
        let mut ids: Vec<WordId> = words.iter().map(|w| w.id).collect();
        ids.shuffle(rng);
        Self { ids }
    }

    pub fn from_ids(ids: Vec<WordId>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &[WordId] {
        &self.ids
    }

    /// Orders `words` by this permutation. Ids that left the mirror are
    /// skipped; words added after the shuffle follow in mirror order.
    pub fn apply(&self, words: &[Word]) -> Vec<Word> {
        let by_id: HashMap<WordId, &Word> = words.iter().map(|w| (w.id, w)).collect();
        let placed: HashSet<WordId> = self.ids.iter().copied().collect();

        let mut ordered: Vec<Word> = self
            .ids
            .iter()
            .filter_map(|id| by_id.get(id).map(|w| (*w).clone()))
            .collect();
        ordered.extend(words.iter().filter(|w| !placed.contains(&w.id)).cloned());
        ordered
    }
}
