//! Collection kinds and collection values
//!
//! A field declares an abstract [`CollectionKind`]; the engine resolves it to
//! one of the [`ConcreteCollectionKind`]s implementing it. A [`CollectionValue`]
//! enforces the semantics of its concrete kind on insert.

use crate::error::CollectionError;
use crate::kind::{ScalarKind, TypeName};
use crate::value::Value;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Collection kind declared by a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// Any collection
    Collection,
    List,
    Set,
    SortedSet,
    Queue,
    Deque,
    /// A specific concrete kind
    Exactly(ConcreteCollectionKind),
}

impl CollectionKind {
    /// Concrete kinds implementing this kind, in declaration order
    #[must_use]
    pub fn candidates(self) -> Vec<ConcreteCollectionKind> {
        ConcreteCollectionKind::ALL
            .iter()
            .copied()
            .filter(|concrete| concrete.implements(self))
            .collect()
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collection => f.write_str("collection"),
            Self::List => f.write_str("list"),
            Self::Set => f.write_str("set"),
            Self::SortedSet => f.write_str("sorted_set"),
            Self::Queue => f.write_str("queue"),
            Self::Deque => f.write_str("deque"),
            Self::Exactly(concrete) => f.write_str(concrete.name()),
        }
    }
}

/// Instantiable collection kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcreteCollectionKind {
    Vec,
    VecDeque,
    LinkedList,
    HashSet,
    IndexSet,
    BTreeSet,
    BinaryHeap,
    /// Snapshot-on-write list, unsupported for mocking
    CopyOnWriteVec,
    /// Snapshot-on-write set, unsupported for mocking
    CopyOnWriteSet,
}

impl ConcreteCollectionKind {
    /// All concrete kinds
    pub const ALL: [Self; 9] = [
        Self::Vec,
        Self::VecDeque,
        Self::LinkedList,
        Self::HashSet,
        Self::IndexSet,
        Self::BTreeSet,
        Self::BinaryHeap,
        Self::CopyOnWriteVec,
        Self::CopyOnWriteSet,
    ];

    /// Whether this concrete kind satisfies the declared kind
    #[must_use]
    pub fn implements(self, kind: CollectionKind) -> bool {
        use CollectionKind as K;
        match kind {
            K::Exactly(concrete) => concrete == self,
            K::Collection => true,
            K::List => matches!(
                self,
                Self::Vec | Self::VecDeque | Self::LinkedList | Self::CopyOnWriteVec
            ),
            K::Set => self.is_set(),
            K::SortedSet => self.is_sorted() && self.is_set(),
            K::Queue => matches!(self, Self::VecDeque | Self::LinkedList | Self::BinaryHeap),
            K::Deque => matches!(self, Self::VecDeque | Self::LinkedList),
        }
    }

    /// Concurrency-oriented kinds rejected by the resolver
    #[inline]
    #[must_use]
    pub fn is_concurrent(self) -> bool {
        matches!(self, Self::CopyOnWriteVec | Self::CopyOnWriteSet)
    }

    /// Kinds with set semantics
    #[inline]
    #[must_use]
    pub fn is_set(self) -> bool {
        matches!(
            self,
            Self::HashSet | Self::IndexSet | Self::BTreeSet | Self::CopyOnWriteSet
        )
    }

    /// Kinds that require ordered elements
    #[inline]
    #[must_use]
    pub fn is_sorted(self) -> bool {
        matches!(self, Self::BTreeSet | Self::BinaryHeap)
    }

    /// Kind name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Vec => "vec",
            Self::VecDeque => "vec_deque",
            Self::LinkedList => "linked_list",
            Self::HashSet => "hash_set",
            Self::IndexSet => "index_set",
            Self::BTreeSet => "btree_set",
            Self::BinaryHeap => "binary_heap",
            Self::CopyOnWriteVec => "copy_on_write_vec",
            Self::CopyOnWriteSet => "copy_on_write_set",
        }
    }
}

impl fmt::Display for ConcreteCollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Element type of a collection field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementType {
    Scalar(ScalarKind),
    Entity(TypeName),
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::Entity(name) => write!(f, "{name}"),
        }
    }
}

/// Collection value with the semantics of its concrete kind
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionValue {
    kind: ConcreteCollectionKind,
    items: Vec<Value>,
}

impl CollectionValue {
    /// Create empty collection
    #[inline]
    #[must_use]
    pub fn new(kind: ConcreteCollectionKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    /// Concrete kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ConcreteCollectionKind {
        self.kind
    }

    /// Insert an element
    ///
    /// Returns `false` when a set already holds an equal element.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::Unorderable`] when a sorted kind receives
    /// an element without a total order against its contents.
    pub fn insert(&mut self, value: Value) -> Result<bool, CollectionError> {
        if self.kind.is_sorted() {
            let position = self.sorted_position(&value)?;
            if self.kind.is_set() && position.1 {
                return Ok(false);
            }
            self.items.insert(position.0, value);
            return Ok(true);
        }
        if self.kind.is_set() && self.items.contains(&value) {
            return Ok(false);
        }
        self.items.push(value);
        Ok(true)
    }

    fn sorted_position(&self, value: &Value) -> Result<(usize, bool), CollectionError> {
        // Self-comparison rejects element kinds without an order, even when empty.
        let unorderable = || CollectionError::Unorderable {
            collection: self.kind,
            element: value.kind_name(),
        };
        value.total_cmp(value).ok_or_else(unorderable)?;
        for (i, item) in self.items.iter().enumerate() {
            match value.total_cmp(item).ok_or_else(unorderable)? {
                Ordering::Less => return Ok((i, false)),
                Ordering::Equal => return Ok((i, true)),
                Ordering::Greater => {}
            }
        }
        Ok((self.items.len(), false))
    }

    /// Remove elements matching a predicate, returning whether any were removed
    pub fn remove_if(&mut self, mut predicate: impl FnMut(&Value) -> bool) -> bool {
        let before = self.items.len();
        self.items.retain(|item| !predicate(item));
        self.items.len() != before
    }

    /// Keep only elements matching a predicate
    pub fn retain(&mut self, predicate: impl FnMut(&Value) -> bool) {
        self.items.retain(predicate);
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate elements in collection order
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }
}

impl<'a> IntoIterator for &'a CollectionValue {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Serialize for CollectionValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.items.len()))?;
        for item in &self.items {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}
