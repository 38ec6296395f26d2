/// Fixed-capacity set of small non-negative integers, backed by 64-bit
/// words.
///
/// Indices at or beyond the capacity are a programming error and panic.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BitVector {
  words: Vec<u64>,
  capacity: usize,
}

const WORD_BITS: usize = 64;

impl BitVector {
  pub fn new(capacity: usize) -> Self {
    BitVector {
      words: vec![0; (capacity + WORD_BITS - 1) / WORD_BITS],
      capacity,
    }
  }

  #[inline]
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  #[inline]
  fn check(&self, index: usize) {
    assert!(
      index < self.capacity,
      "bit index {} out of range for capacity {}",
      index,
      self.capacity
    );
  }

  #[inline]
  pub fn get(&self, index: usize) -> bool {
    self.check(index);
    self.words[index / WORD_BITS] & (1u64 << (index % WORD_BITS)) != 0
  }

  #[inline]
  pub fn set(&mut self, index: usize) {
    self.check(index);
    self.words[index / WORD_BITS] |= 1u64 << (index % WORD_BITS);
  }

  #[inline]
  pub fn clear(&mut self, index: usize) {
    self.check(index);
    self.words[index / WORD_BITS] &= !(1u64 << (index % WORD_BITS));
  }

  pub fn clear_all(&mut self) {
    self.words.iter_mut().for_each(|w| *w = 0);
  }

  /// `self |= other`. Returns whether any bit was added.
  ///
  /// `self` must be at least as large as `other`.
  pub fn union_with(&mut self, other: &BitVector) -> bool {
    assert!(
      self.capacity >= other.capacity,
      "union of a {}-bit set into a {}-bit set",
      other.capacity,
      self.capacity
    );
    let mut changed = false;
    for (dst, src) in self.words.iter_mut().zip(other.words.iter()) {
      let merged = *dst | *src;
      changed |= merged != *dst;
      *dst = merged;
    }
    changed
  }

  /// `self &= !other`.
  pub fn difference_with(&mut self, other: &BitVector) {
    for (dst, src) in self.words.iter_mut().zip(other.words.iter()) {
      *dst &= !*src;
    }
  }

  pub fn is_empty(&self) -> bool {
    self.words.iter().all(|w| *w == 0)
  }

  /// Population count.
  pub fn count(&self) -> usize {
    self.words.iter().map(|w| w.count_ones() as usize).sum()
  }

  /// First set bit at or after `from`, if any.
  pub fn next_set_bit(&self, from: usize) -> Option<usize> {
    if from >= self.capacity {
      return None;
    }
    let mut word_idx = from / WORD_BITS;
    let mut word = self.words[word_idx] & (!0u64 << (from % WORD_BITS));
    loop {
      if word != 0 {
        let idx = word_idx * WORD_BITS + word.trailing_zeros() as usize;
        return if idx < self.capacity { Some(idx) } else { None };
      }
      word_idx += 1;
      if word_idx >= self.words.len() {
        return None;
      }
      word = self.words[word_idx];
    }
  }

  /// Whether any bit in `[from, from + len)` is set. Bits past the capacity
  /// count as clear.
  pub fn any_in_range(&self, from: usize, len: usize) -> bool {
    self.next_set_bit(from).map_or(false, |idx| idx < from + len)
  }

  pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
    let mut next = self.next_set_bit(0);
    std::iter::from_fn(move || {
      let current = next?;
      next = self.next_set_bit(current + 1);
      Some(current)
    })
  }
}
