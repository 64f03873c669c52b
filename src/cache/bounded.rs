use std::collections::vec_deque;
use std::collections::VecDeque;
use std::ops::Index;

/// Fixed-capacity sequence with strict FIFO eviction.
///
/// A capacity of `None` or `Some(0)` means unbounded.
#[derive(Debug, Clone)]
pub struct BoundedSequence<T> {
    items: VecDeque<T>,
    capacity: Option<usize>,
}

impl<T> BoundedSequence<T> {
    #[must_use]
    pub fn new(capacity: Option<usize>) -> Self {
        let capacity = capacity.filter(|&c| c > 0);
        Self {
            items: VecDeque::with_capacity(capacity.unwrap_or_default()),
            capacity,
        }
    }

    #[must_use]
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    #[must_use]
    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Push `item` to the tail, evicting and returning the head when full.
    pub fn append(&mut self, item: T) -> Option<T> {
        let evicted = if self.is_full() {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.capacity.is_some_and(|c| self.items.len() >= c)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Oldest retained item.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.items.front()
    }

    /// Most recently appended (or moved) item.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.items.iter()
    }

    /// The newest `limit` items, oldest first. `None` yields everything.
    pub fn tail(&self, limit: Option<usize>) -> impl DoubleEndedIterator<Item = &T> + '_ {
        let skip = limit.map_or(0, |n| self.items.len().saturating_sub(n));
        self.items.iter().skip(skip)
    }

    pub(crate) fn iter_mut(&mut self) -> vec_deque::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub(crate) fn position(&self, predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.items.iter().position(predicate)
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<T> {
        self.items.remove(index)
    }
}

impl<T: Clone> BoundedSequence<T> {
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

impl<T> Default for BoundedSequence<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<T> Index<usize> for BoundedSequence<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<'a, T> IntoIterator for &'a BoundedSequence<T> {
    type Item = &'a T;
    type IntoIter = vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
