//! Card collections displayed on the portfolio page.
//!
//! The store is the only state the built-in tools touch. It holds named
//! collections of titled cards; titles are unique within a collection but may
//! repeat across collections, in which case searches return the card from the
//! collection that was added first.
//!
//! Reordering a collection with a list of titles leaves exactly those cards
//! displayed. Cards left out are hidden rather than deleted: they no longer
//! show up in layouts or searches, and a later reorder that names them brings
//! them back.

use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the projects collection.
pub const PROJECTS: &str = "projects";
/// Name of the skills-and-experience collection.
pub const SKILLS_AND_EXPERIENCE: &str = "skillsAndExperience";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub is_expanded: bool,
}

impl Card {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            is_expanded: false,
        }
    }

    /// Copy of the card with its content blanked, for layout listings.
    #[must_use]
    pub fn without_content(&self) -> Self {
        Self {
            title: self.title.clone(),
            content: String::new(),
            is_expanded: self.is_expanded,
        }
    }
}

/// Snapshot of a collection's displayed cards.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CardCollection {
    pub name: String,
    pub cards: Vec<Card>,
}

#[derive(Debug, Error)]
pub enum CardStoreError {
    #[error("Unknown card collection '{0}'")]
    UnknownCollection(String),

    #[error("Card collection '{0}' already exists")]
    DuplicateCollection(String),

    #[error("Duplicate card title '{title}' in collection '{collection}'")]
    DuplicateTitle { collection: String, title: String },
}

/// Storage for card collections.
///
/// Implementations must be safe to share between the tools of one registry;
/// every operation sees a consistent state.
pub trait CardStore: Send + Sync {
    /// Collection names in search order.
    fn collection_names(&self) -> Vec<String>;

    /// Displayed cards of one collection.
    ///
    /// # Errors
    ///
    /// Returns `CardStoreError::UnknownCollection` if no collection has that name.
    fn list_collection(&self, name: &str) -> Result<CardCollection, CardStoreError>;

    /// First displayed card with an exactly matching title, in search order.
    fn find_card(&self, title: &str) -> Option<Card>;

    /// Applies `mutation` to the card [`find_card`](Self::find_card) would
    /// return. Returns `false` if there is no such card.
    fn update_card(&self, title: &str, mutation: &dyn Fn(&mut Card)) -> bool;

    /// Replaces the displayed cards of a collection with the cards named in
    /// `titles`, in that order. Unknown titles are ignored.
    ///
    /// # Errors
    ///
    /// Returns `CardStoreError::UnknownCollection` if no collection has that name.
    fn reorder_collection(&self, name: &str, titles: &[String]) -> Result<(), CardStoreError>;
}

#[derive(Debug, Clone)]
struct StoredCollection {
    name: String,
    displayed: Vec<Card>,
    hidden: Vec<Card>,
}

/// Card store kept in process memory behind a lock.
#[derive(Debug, Default)]
pub struct InMemoryCardStore {
    collections: RwLock<Vec<StoredCollection>>,
}

impl InMemoryCardStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a collection after the existing ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection name is taken or two cards share a title.
    pub fn with_collection(
        self,
        name: impl Into<String>,
        cards: impl IntoIterator<Item = Card>,
    ) -> Result<Self, CardStoreError> {
        let name = name.into();
        let cards: Vec<Card> = cards.into_iter().collect();

        for (i, card) in cards.iter().enumerate() {
            if cards[..i].iter().any(|c| c.title == card.title) {
                return Err(CardStoreError::DuplicateTitle {
                    collection: name,
                    title: card.title.clone(),
                });
            }
        }

        {
            let mut collections = self.write();
            if collections.iter().any(|c| c.name == name) {
                return Err(CardStoreError::DuplicateCollection(name));
            }
            collections.push(StoredCollection {
                name,
                displayed: cards,
                hidden: Vec::new(),
            });
        }

        Ok(self)
    }

    /// Titles of cards currently hidden from a collection.
    #[must_use]
    pub fn hidden_titles(&self, name: &str) -> Vec<String> {
        self.read()
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.hidden.iter().map(|card| card.title.clone()).collect())
            .unwrap_or_default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<StoredCollection>> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<StoredCollection>> {
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl CardStore for InMemoryCardStore {
    fn collection_names(&self) -> Vec<String> {
        self.read().iter().map(|c| c.name.clone()).collect()
    }

    fn list_collection(&self, name: &str) -> Result<CardCollection, CardStoreError> {
        self.read()
            .iter()
            .find(|c| c.name == name)
            .map(|c| CardCollection {
                name: c.name.clone(),
                cards: c.displayed.clone(),
            })
            .ok_or_else(|| CardStoreError::UnknownCollection(name.to_string()))
    }

    fn find_card(&self, title: &str) -> Option<Card> {
        self.read()
            .iter()
            .flat_map(|c| c.displayed.iter())
            .find(|card| card.title == title)
            .cloned()
    }

    fn update_card(&self, title: &str, mutation: &dyn Fn(&mut Card)) -> bool {
        let mut collections = self.write();
        let card = collections
            .iter_mut()
            .flat_map(|c| c.displayed.iter_mut())
            .find(|card| card.title == title);

        match card {
            Some(card) => {
                mutation(card);
                true
            }
            None => false,
        }
    }

    fn reorder_collection(&self, name: &str, titles: &[String]) -> Result<(), CardStoreError> {
        let mut collections = self.write();
        let collection = collections
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| CardStoreError::UnknownCollection(name.to_string()))?;

        let mut pool: Vec<Card> = collection
            .displayed
            .drain(..)
            .chain(collection.hidden.drain(..))
            .collect();

        let mut displayed = Vec::with_capacity(titles.len());
        for title in titles {
            if let Some(pos) = pool.iter().position(|card| &card.title == title) {
                displayed.push(pool.remove(pos));
            }
        }

        collection.displayed = displayed;
        collection.hidden = pool;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use proptest::prelude::*;

    fn titles(collection: &CardCollection) -> Vec<&str> {
        collection.cards.iter().map(|c| c.title.as_str()).collect()
    }

    fn owned(titles: &[&str]) -> Vec<String> {
        titles.iter().map(ToString::to_string).collect()
    }

    fn store() -> InMemoryCardStore {
        InMemoryCardStore::new()
            .with_collection(
                PROJECTS,
                [
                    Card::new("A", "alpha"),
                    Card::new("B", "beta"),
                    Card::new("C", "gamma"),
                ],
            )
            .unwrap()
            .with_collection(
                SKILLS_AND_EXPERIENCE,
                [Card::new("Rust", "systems"), Card::new("A", "other alpha")],
            )
            .unwrap()
    }

    #[test]
    fn test_collection_names_in_insertion_order() {
        assert_eq!(store().collection_names(), vec![PROJECTS, SKILLS_AND_EXPERIENCE]);
    }

    #[test]
    fn test_unknown_collection() {
        let store = store();
        assert!(matches!(
            store.list_collection("hobbies"),
            Err(CardStoreError::UnknownCollection(_))
        ));
        assert!(store.reorder_collection("hobbies", &[]).is_err());
    }

    #[test]
    fn test_duplicate_titles_rejected_within_collection() {
        let err = InMemoryCardStore::new()
            .with_collection(PROJECTS, [Card::new("A", "1"), Card::new("A", "2")])
            .unwrap_err();
        assert!(matches!(err, CardStoreError::DuplicateTitle { .. }));
    }

    #[test]
    fn test_duplicate_collection_rejected() {
        let err = InMemoryCardStore::new()
            .with_collection(PROJECTS, Vec::new())
            .unwrap()
            .with_collection(PROJECTS, Vec::new())
            .unwrap_err();
        assert!(matches!(err, CardStoreError::DuplicateCollection(_)));
    }

    #[test]
    fn test_find_uses_search_order() {
        let card = store().find_card("A").unwrap();
        assert_eq!(card.content, "alpha");
        assert!(store().find_card("a").is_none());
    }

    #[test]
    fn test_update_card_touches_first_match_only() {
        let store = store();
        assert!(store.update_card("A", &|card| card.is_expanded = true));
        assert!(store.find_card("A").unwrap().is_expanded);

        let skills = store.list_collection(SKILLS_AND_EXPERIENCE).unwrap();
        assert!(skills.cards.iter().all(|c| !c.is_expanded));

        assert!(!store.update_card("Missing", &|card| card.is_expanded = true));
    }

    #[test]
    fn test_reorder_subset() {
        let store = store();
        store.reorder_collection(PROJECTS, &owned(&["B", "A"])).unwrap();

        assert_eq!(titles(&store.list_collection(PROJECTS).unwrap()), vec!["B", "A"]);
        assert_eq!(store.hidden_titles(PROJECTS), vec!["C"]);
        assert!(store.find_card("C").is_none());
    }

    #[test]
    fn test_reorder_with_no_matches_empties_collection() {
        let store = store();
        store.reorder_collection(PROJECTS, &owned(&["X", "Y"])).unwrap();
        assert!(store.list_collection(PROJECTS).unwrap().cards.is_empty());
    }

    #[test]
    fn test_reorder_restores_hidden_cards() {
        let store = store();
        store.update_card("C", &|card| card.is_expanded = true);
        store.reorder_collection(PROJECTS, &owned(&["A"])).unwrap();
        store
            .reorder_collection(PROJECTS, &owned(&["C", "B", "A"]))
            .unwrap();

        let projects = store.list_collection(PROJECTS).unwrap();
        assert_eq!(titles(&projects), vec!["C", "B", "A"]);
        assert!(projects.cards[0].is_expanded);
        assert!(store.hidden_titles(PROJECTS).is_empty());
    }

    #[test]
    fn test_reorder_ignores_repeated_titles() {
        let store = store();
        store
            .reorder_collection(PROJECTS, &owned(&["B", "B", "A"]))
            .unwrap();
        assert_eq!(titles(&store.list_collection(PROJECTS).unwrap()), vec!["B", "A"]);
    }

    #[test]
    fn test_reorder_leaves_other_collections_alone() {
        let store = store();
        store.reorder_collection(PROJECTS, &[]).unwrap();
        assert_eq!(store.find_card("A").unwrap().content, "other alpha");
    }

    #[test]
    fn test_card_serializes_camel_case() {
        let json = serde_json::to_value(Card::new("A", "alpha")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"title": "A", "content": "alpha", "isExpanded": false})
        );
    }

    proptest! {
        #[test]
        fn prop_reorder_keeps_known_titles_in_given_order(
            order in proptest::sample::subsequence(vec!["A", "B", "C", "D", "E"], 0..=5)
                .prop_shuffle(),
            unknown in proptest::collection::vec("[x-z]{1,3}", 0..3),
        ) {
            let store = InMemoryCardStore::new()
                .with_collection(
                    PROJECTS,
                    ["A", "B", "C", "D", "E"].map(|t| Card::new(t, t.to_lowercase())),
                )
                .unwrap();

            let mut requested = owned(&order);
            requested.extend(unknown);
            store.reorder_collection(PROJECTS, &requested).unwrap();

            let projects = store.list_collection(PROJECTS).unwrap();
            prop_assert_eq!(titles(&projects), order.clone());

            let displayed = projects.cards.len();
            prop_assert_eq!(displayed + store.hidden_titles(PROJECTS).len(), 5);
        }
    }
}
