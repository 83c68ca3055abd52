//! Bounded free-list of reusable records.

/// Records that can be parked in a [`Pool`].
pub trait Reset {
    /// Clears every field, including back-references, so a parked record
    /// carries no state from its previous use.
    fn reset(&mut self);
}

/// A free-list of reset records with a retention limit.
///
/// Records returned past the limit are dropped instead of parked, which bounds
/// the memory a burst of releases can pin.
#[derive(Debug)]
pub struct Pool<T> {
    free: Vec<T>,
    limit: usize,
    hits: u64,
    misses: u64,
}

impl<T: Reset> Pool<T> {
    pub fn new(limit: usize) -> Self {
        Self {
            free: Vec::new(),
            limit,
            hits: 0,
            misses: 0,
        }
    }

    /// Takes a parked record, or builds one with `make` when the pool is empty.
    pub fn get_or_else(&mut self, make: impl FnOnce() -> T) -> T {
        match self.free.pop() {
            Some(item) => {
                self.hits += 1;
                item
            }
            None => {
                self.misses += 1;
                make()
            }
        }
    }

    /// Takes a parked record, or `T::default()`.
    pub fn get(&mut self) -> T
    where
        T: Default,
    {
        self.get_or_else(T::default)
    }

    /// Resets `item` and parks it. Returns `false` if the pool was full and the
    /// record was dropped.
    pub fn ret(&mut self, mut item: T) -> bool {
        if self.free.len() >= self.limit {
            return false;
        }
        item.reset();
        self.free.push(item);
        true
    }

    /// Records currently parked.
    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of `get` calls served from parked records.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of `get` calls that had to build a new record.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Drops every parked record.
    pub fn clear(&mut self) {
        self.free.clear();
    }
}
