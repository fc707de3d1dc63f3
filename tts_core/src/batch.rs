/// A value that is either a single item or a batch of items.
///
/// The model accepts a scalar for one chunk and parallel lists for several
/// chunks. Every per-chunk argument of one call shares the same shape, which
/// [`OneOrMany::broadcast`] keeps consistent.
#[derive(Debug, Clone, PartialEq)]
pub enum OneOrMany<T> {
    Single(T),
    Batch(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// A one-element vector becomes `Single`; anything else becomes `Batch`.
    pub fn from_vec(mut items: Vec<T>) -> Self {
        if items.len() == 1 {
            if let Some(item) = items.pop() {
                return OneOrMany::Single(item);
            }
        }
        OneOrMany::Batch(items)
    }

    pub fn len(&self) -> usize {
        match self {
            OneOrMany::Single(_) => 1,
            OneOrMany::Batch(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, OneOrMany::Batch(_))
    }

    /// Repeat `value` into the same shape as `self`.
    pub fn broadcast<U: Clone>(&self, value: U) -> OneOrMany<U> {
        match self {
            OneOrMany::Single(_) => OneOrMany::Single(value),
            OneOrMany::Batch(items) => OneOrMany::Batch(vec![value; items.len()]),
        }
    }

    /// True when both values have the same variant and length.
    pub fn same_shape<U>(&self, other: &OneOrMany<U>) -> bool {
        self.is_batch() == other.is_batch() && self.len() == other.len()
    }

    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> OneOrMany<U> {
        match self {
            OneOrMany::Single(item) => OneOrMany::Single(f(item)),
            OneOrMany::Batch(items) => OneOrMany::Batch(items.into_iter().map(f).collect()),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            OneOrMany::Single(item) => std::slice::from_ref(item).iter(),
            OneOrMany::Batch(items) => items.iter(),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Single(item) => vec![item],
            OneOrMany::Batch(items) => items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_vec_promotes_single_element() {
        assert_eq!(OneOrMany::from_vec(vec![7]), OneOrMany::Single(7));
        assert_eq!(OneOrMany::from_vec(vec![1, 2]), OneOrMany::Batch(vec![1, 2]));
    }

    #[test]
    fn broadcast_follows_shape() {
        let single = OneOrMany::Single("a");
        let batch = OneOrMany::Batch(vec!["a", "b", "c"]);

        assert_eq!(single.broadcast("x"), OneOrMany::Single("x"));
        assert_eq!(batch.broadcast("x"), OneOrMany::Batch(vec!["x", "x", "x"]));
        assert!(batch.same_shape(&batch.broadcast(0u8)));
        assert!(!batch.same_shape(&single));
    }

    #[test]
    fn single_and_one_element_batch_differ_in_shape() {
        let single = OneOrMany::Single(1);
        let batch = OneOrMany::Batch(vec![1]);
        assert!(!single.same_shape(&batch));
        assert_eq!(single.iter().count(), batch.iter().count());
    }
}
