//! Fixed-capacity bitset indexed by entity slot

const WORD_BITS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityBitset {
    words: Vec<u64>,
    capacity: usize,
}

impl EntityBitset {
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(WORD_BITS)],
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Grows to hold at least `capacity` bits; never shrinks.
    pub fn grow(&mut self, capacity: usize) {
        if capacity > self.capacity {
            self.words.resize(capacity.div_ceil(WORD_BITS), 0);
            self.capacity = capacity;
        }
    }

    /// Returns `false` without writing when `index` is out of range.
    pub fn set(&mut self, index: usize) -> bool {
        if index >= self.capacity {
            return false;
        }
        self.words[index / WORD_BITS] |= 1u64 << (index % WORD_BITS);
        true
    }

    /// Returns whether the bit was set.
    pub fn unset(&mut self, index: usize) -> bool {
        if !self.contains(index) {
            return false;
        }
        self.words[index / WORD_BITS] &= !(1u64 << (index % WORD_BITS));
        true
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.capacity && self.words[index / WORD_BITS] & (1u64 << (index % WORD_BITS)) != 0
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// `self |= a & b`
    pub fn union_intersection(&mut self, a: &EntityBitset, b: &EntityBitset) {
        for (i, word) in self.words.iter_mut().enumerate() {
            let a_word = a.words.get(i).copied().unwrap_or(0);
            let b_word = b.words.get(i).copied().unwrap_or(0);
            *word |= a_word & b_word;
        }
    }

    /// Population count of `a & b` without allocating.
    pub fn intersection_count(a: &EntityBitset, b: &EntityBitset) -> usize {
        a.words
            .iter()
            .zip(&b.words)
            .map(|(x, y)| (x & y).count_ones() as usize)
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        ones(self.words.iter().copied())
    }

    /// Indices set in both `a` and `b`, ascending.
    pub fn intersection<'a>(
        a: &'a EntityBitset,
        b: &'a EntityBitset,
    ) -> impl Iterator<Item = usize> + 'a {
        ones(a.words.iter().zip(&b.words).map(|(x, y)| x & y))
    }
}

fn ones(words: impl Iterator<Item = u64>) -> impl Iterator<Item = usize> {
    words.enumerate().flat_map(|(i, word)| {
        let mut remaining = word;
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            let bit = remaining.trailing_zeros() as usize;
            remaining &= remaining - 1;
            Some(i * WORD_BITS + bit)
        })
    })
}
