use alloc::vec;
use alloc::vec::Vec;
use core::borrow::Borrow;
use core::fmt::Debug;
use core::iter::FusedIterator;

use serde::Serialize;

use crate::chain::Arena;
use crate::chain::Chain;
use crate::chain::ChainIter;
use crate::chain::NodeId;
use crate::encode;
use crate::error::Result;
use crate::hash::ByteHasher;
use crate::hash::Murmur3;
use crate::hash::random_seed;

/// A hash map resolving collisions by separate chaining.
///
/// `HashMap<K, V, H>` hashes the canonical byte encoding of each key (see
/// [`encode`](crate::encode)) with a seeded [`ByteHasher`] and stores the
/// entry in the doubly-linked chain of bucket `hash % capacity`. Keys must
/// implement `Serialize + Eq`; values need no bounds beyond what individual
/// methods ask for.
///
/// The seed is chosen at construction (randomly unless given explicitly) and
/// never changes afterwards.
///
/// ## Resizing
///
/// Capacity is the number of buckets. Before a new entry is placed into a map
/// whose length equals its capacity, the map grows to `max(1, 2 * len)`
/// buckets. After a removal leaves `capacity / 4 >= len`, the map shrinks to
/// `max(1, 2 * len)` buckets. Both rehash every entry in one call, so those
/// particular operations are O(n).
///
/// ## Example
///
/// ```rust
/// use chain_map::HashMap;
///
/// let mut map = HashMap::new();
/// map.insert("apple".to_string(), 3)?;
/// map.insert("pear".to_string(), 5)?;
///
/// assert_eq!(map.get("apple")?, Some(&3));
/// assert_eq!(map.get_key_by_value(&5).map(String::as_str), Some("pear"));
/// assert_eq!(map.remove("apple")?, Some(3));
/// assert!(!map.contains_key("apple")?);
/// # Ok::<(), chain_map::Error>(())
/// ```
#[derive(Clone)]
pub struct HashMap<K, V, H = Murmur3> {
    buckets: Vec<Option<Chain>>,
    nodes: Arena<K, V>,
    seed: u32,
    hasher: H,
}

impl<K, V, H> Debug for HashMap<K, V, H>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> HashMap<K, V, Murmur3> {
    /// Creates an empty map hashing with [`Murmur3`] under a random seed.
    ///
    /// No buckets are allocated until the first insertion.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty map with `capacity` buckets, hashing with
    /// [`Murmur3`] under a random seed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let map: HashMap<u32, u32> = HashMap::with_capacity(16);
    /// assert_eq!(map.capacity(), 16);
    /// assert!(map.is_empty());
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Murmur3)
    }
}

impl<K, V, H> Default for HashMap<K, V, H>
where
    H: Default,
{
    fn default() -> Self {
        Self::with_hasher(H::default())
    }
}

impl<K, V, H> HashMap<K, V, H> {
    /// Creates an empty map using `hasher` under a random seed.
    pub fn with_hasher(hasher: H) -> Self {
        Self::with_capacity_and_hasher(0, hasher)
    }

    /// Creates an empty map with `capacity` buckets using `hasher` under a
    /// random seed.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: H) -> Self {
        Self::with_capacity_seed_and_hasher(capacity, random_seed(), hasher)
    }

    /// Creates an empty map with `capacity` buckets using `hasher` under a
    /// fixed `seed`.
    ///
    /// A fixed seed makes bucket placement reproducible across runs, which
    /// also makes it predictable. Prefer the randomly seeded constructors for
    /// keys an adversary can choose.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    /// use chain_map::Murmur3;
    ///
    /// let map: HashMap<u8, u8> = HashMap::with_capacity_seed_and_hasher(4, 42, Murmur3);
    /// assert_eq!(map.seed(), 42);
    /// ```
    pub fn with_capacity_seed_and_hasher(capacity: usize, seed: u32, hasher: H) -> Self {
        Self {
            buckets: vec![None; capacity],
            nodes: Arena::with_capacity(capacity),
            seed,
            hasher,
        }
    }

    /// Returns the number of entries, counting shadowed duplicates added by
    /// [`push`](Self::push).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the seed mixed into every hash.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Returns a reference to the map's hasher.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Removes every entry and resets the map to a single empty bucket.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::with_capacity(8);
    /// map.insert(1, "a")?;
    /// map.clear();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 1);
    /// assert_eq!(map.keys().count(), 0);
    /// # Ok::<(), chain_map::Error>(())
    /// ```
    pub fn clear(&mut self) {
        self.buckets = vec![None];
        self.nodes.clear();
    }

    /// An iterator visiting every entry, bucket by bucket and then along each
    /// chain. The order depends on the seed and is otherwise unspecified.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            chain: None,
            nodes: &self.nodes,
            remaining: self.len(),
        }
    }

    /// An iterator visiting every key in [`iter`](Self::iter) order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// An iterator visiting every value in [`iter`](Self::iter) order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns some key mapped to `value`.
    ///
    /// Scans every chain. When several keys map to `value`, which one is
    /// returned depends on bucket placement, not on insertion order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert('a', 1)?;
    /// map.insert('b', 2)?;
    /// assert_eq!(map.get_key_by_value(&2), Some(&'b'));
    /// assert_eq!(map.get_key_by_value(&3), None);
    /// # Ok::<(), chain_map::Error>(())
    /// ```
    pub fn get_key_by_value(&self, value: &V) -> Option<&K>
    where
        V: PartialEq,
    {
        self.buckets
            .iter()
            .flatten()
            .find_map(|chain| chain.find_node_by_value(&self.nodes, value))
            .map(|id| self.nodes[id].key())
    }

    /// Returns `true` if any key maps to `value`.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.get_key_by_value(value).is_some()
    }

    #[inline(always)]
    fn bucket_index(&self, hash: u32) -> usize {
        hash as usize % self.buckets.len()
    }

    fn place(&mut self, hash: u32, key: K, value: V) -> NodeId {
        let index = self.bucket_index(hash);
        let chain = self.buckets[index].get_or_insert_with(|| {
            log::trace!("Allocating chain for bucket {index}");
            Chain::new()
        });
        chain.push(&mut self.nodes, hash, key, value)
    }

    fn maybe_grow(&mut self) {
        let capacity = self.capacity();
        if capacity == self.len() {
            let target = (self.len() * 2).max(1);
            log::debug!("Growing from {capacity} to {target} buckets");
            self.rehash(target);
        }
    }

    fn maybe_shrink(&mut self) {
        let capacity = self.capacity();
        if capacity >> 2 >= self.len() {
            let target = (self.len() * 2).max(1);
            if target != capacity {
                log::debug!(
                    "Shrinking from {capacity} to {target} buckets ({} entries)",
                    self.len()
                );
                self.rehash(target);
            }
        }
    }

    /// Moves every entry into a fresh bucket array of `capacity` buckets.
    ///
    /// Entries are re-placed from the cached hash, so keys are never encoded
    /// again. Each chain is walked tail to head so entries sharing a key keep
    /// their relative order.
    fn rehash(&mut self, capacity: usize) {
        let len = self.len();
        let old_buckets = core::mem::replace(&mut self.buckets, vec![None; capacity]);
        let mut old_nodes = core::mem::replace(&mut self.nodes, Arena::with_capacity(len));

        for chain in old_buckets.into_iter().flatten() {
            let mut cursor = chain.tail(&old_nodes);
            while let Some(id) = cursor {
                let node = old_nodes.take(id);
                cursor = node.prev();
                let hash = node.hash();
                let (key, value) = node.into_entry();
                self.place(hash, key, value);
            }
        }

        debug_assert_eq!(self.len(), len);
        debug_assert!(old_nodes.is_empty());
    }
}

impl<K, V, H> HashMap<K, V, H>
where
    K: Eq + Serialize,
    H: ByteHasher,
{
    fn hash_key<Q>(&self, key: &Q) -> Result<u32>
    where
        Q: Serialize + ?Sized,
    {
        let bytes = encode::to_bytes(key)?;
        Ok(self.hasher.hash_bytes(&bytes, self.seed))
    }

    fn find<Q>(&self, hash: u32, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        if self.is_empty() {
            return None;
        }
        self.buckets[self.bucket_index(hash)]
            .as_ref()?
            .find_node(&self.nodes, key)
    }

    /// Inserts a key/value pair, replacing and returning the value of an
    /// existing entry with an equal key.
    ///
    /// Placing a new entry may first grow the map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`](crate::Error::Encoding) if `key` has no
    /// canonical byte encoding. The map is left unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert_eq!(map.insert(7, "seven")?, None);
    /// assert_eq!(map.insert(7, "SEVEN")?, Some("seven"));
    /// assert_eq!(map.len(), 1);
    /// # Ok::<(), chain_map::Error>(())
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let hash = self.hash_key(&key)?;
        if let Some(id) = self.find(hash, &key) {
            return Ok(Some(core::mem::replace(
                self.nodes[id].value_mut(),
                value,
            )));
        }

        self.maybe_grow();
        self.place(hash, key, value);
        Ok(None)
    }

    /// Links a new entry without looking for an existing one.
    ///
    /// An older entry with an equal key stays in the map, shadowed: lookups
    /// return the newest value, [`len`](Self::len) counts both, and each
    /// [`remove`](Self::remove) peels off the newest remaining entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`](crate::Error::Encoding) if `key` has no
    /// canonical byte encoding. The map is left unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.push("k", 1)?;
    /// map.push("k", 2)?;
    /// assert_eq!(map.len(), 2);
    /// assert_eq!(map.get("k")?, Some(&2));
    /// assert_eq!(map.remove("k")?, Some(2));
    /// assert_eq!(map.get("k")?, Some(&1));
    /// # Ok::<(), chain_map::Error>(())
    /// ```
    pub fn push(&mut self, key: K, value: V) -> Result<()> {
        let hash = self.hash_key(&key)?;
        self.maybe_grow();
        self.place(hash, key, value);
        Ok(())
    }

    /// Returns a reference to the value of `key`.
    ///
    /// An empty map answers `None` without encoding `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`](crate::Error::Encoding) if `key` has no
    /// canonical byte encoding.
    pub fn get<Q>(&self, key: &Q) -> Result<Option<&V>>
    where
        K: Borrow<Q>,
        Q: Serialize + Eq + ?Sized,
    {
        if self.is_empty() {
            return Ok(None);
        }
        let hash = self.hash_key(key)?;
        Ok(self.find(hash, key).map(|id| self.nodes[id].value()))
    }

    /// Returns a mutable reference to the value of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`](crate::Error::Encoding) if `key` has no
    /// canonical byte encoding.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<Option<&mut V>>
    where
        K: Borrow<Q>,
        Q: Serialize + Eq + ?Sized,
    {
        if self.is_empty() {
            return Ok(None);
        }
        let hash = self.hash_key(key)?;
        match self.find(hash, key) {
            Some(id) => Ok(Some(self.nodes[id].value_mut())),
            None => Ok(None),
        }
    }

    /// Returns the stored key and value of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`](crate::Error::Encoding) if `key` has no
    /// canonical byte encoding.
    pub fn get_key_value<Q>(&self, key: &Q) -> Result<Option<(&K, &V)>>
    where
        K: Borrow<Q>,
        Q: Serialize + Eq + ?Sized,
    {
        if self.is_empty() {
            return Ok(None);
        }
        let hash = self.hash_key(key)?;
        Ok(self.find(hash, key).map(|id| {
            let node = &self.nodes[id];
            (node.key(), node.value())
        }))
    }

    /// Returns `true` if the map holds an entry for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`](crate::Error::Encoding) if `key` has no
    /// canonical byte encoding.
    pub fn contains_key<Q>(&self, key: &Q) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Serialize + Eq + ?Sized,
    {
        Ok(self.get(key)?.is_some())
    }

    /// Removes the entry for `key` and returns its value.
    ///
    /// A successful removal may shrink the map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`](crate::Error::Encoding) if `key` has no
    /// canonical byte encoding.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_map::HashMap;
    ///
    /// let mut map = HashMap::with_capacity(8);
    /// map.insert(1, 'a')?;
    /// map.insert(2, 'b')?;
    ///
    /// assert_eq!(map.remove(&1)?, Some('a'));
    /// assert_eq!(map.remove(&1)?, None);
    /// // 8 buckets for 1 entry is below a quarter load, so the map shrank
    /// assert_eq!(map.capacity(), 2);
    /// # Ok::<(), chain_map::Error>(())
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Result<Option<V>>
    where
        K: Borrow<Q>,
        Q: Serialize + Eq + ?Sized,
    {
        Ok(self.remove_entry(key)?.map(|(_, value)| value))
    }

    /// Removes the entry for `key` and returns the stored key and value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`](crate::Error::Encoding) if `key` has no
    /// canonical byte encoding.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Result<Option<(K, V)>>
    where
        K: Borrow<Q>,
        Q: Serialize + Eq + ?Sized,
    {
        if self.is_empty() {
            return Ok(None);
        }
        let hash = self.hash_key(key)?;
        let index = self.bucket_index(hash);

        let Some(chain) = self.buckets[index].as_mut() else {
            return Ok(None);
        };
        let Some(entry) = chain.remove(&mut self.nodes, key) else {
            return Ok(None);
        };
        if chain.is_empty() {
            self.buckets[index] = None;
        }

        self.maybe_shrink();
        Ok(Some(entry))
    }

    /// Inserts every pair of `iter`, stopping at the first encoding failure.
    ///
    /// Pairs inserted before the failure stay in the map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`](crate::Error::Encoding) for the first key
    /// with no canonical byte encoding.
    pub fn try_extend<I>(&mut self, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in iter {
            self.insert(key, value)?;
        }
        Ok(())
    }
}

impl<'a, K, V, H> IntoIterator for &'a HashMap<K, V, H> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the key-value pairs of a `HashMap`.
pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Option<Chain>>,
    chain: Option<ChainIter<'a, K, V>>,
    nodes: &'a Arena<K, V>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((_, node)) = self.chain.as_mut().and_then(|chain| chain.next()) {
                self.remaining -= 1;
                return Some((node.key(), node.value()));
            }
            let chain = self.buckets.by_ref().flatten().next()?;
            self.chain = Some(chain.iter(self.nodes));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// An iterator over the keys of a `HashMap`.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// An iterator over the values of a `HashMap`.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// Step-by-step configuration of a [`HashMap`].
///
/// # Examples
///
/// ```rust
/// use chain_map::Builder;
/// use chain_map::HashMap;
///
/// let map: HashMap<u64, String> = Builder::new().capacity(32).seed(7).build();
/// assert_eq!(map.capacity(), 32);
/// assert_eq!(map.seed(), 7);
/// ```
#[derive(Debug, Clone)]
pub struct Builder<H = Murmur3> {
    capacity: usize,
    seed: Option<u32>,
    hasher: H,
}

impl Default for Builder<Murmur3> {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder<Murmur3> {
    /// Starts from zero buckets, a random seed, and [`Murmur3`].
    pub fn new() -> Self {
        Self {
            capacity: 0,
            seed: None,
            hasher: Murmur3,
        }
    }
}

impl<H> Builder<H> {
    /// Sets the initial number of buckets.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Fixes the seed instead of drawing a random one.
    pub fn seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replaces the hasher.
    pub fn hasher<H2>(self, hasher: H2) -> Builder<H2> {
        Builder {
            capacity: self.capacity,
            seed: self.seed,
            hasher,
        }
    }

    /// Creates the configured, empty map.
    pub fn build<K, V>(self) -> HashMap<K, V, H> {
        let seed = self.seed.unwrap_or_else(random_seed);
        HashMap::with_capacity_seed_and_hasher(self.capacity, seed, self.hasher)
    }
}

/// Bucket statistics for a [`HashMap`].
///
/// Only available with the `stats` feature.
#[cfg(feature = "stats")]
#[derive(Debug, Clone, PartialEq)]
pub struct TableStats {
    /// Number of entries
    pub len: usize,
    /// Number of buckets
    pub capacity: usize,
    /// Buckets holding a chain
    pub occupied_buckets: usize,
    /// Length of the longest chain
    pub longest_chain: usize,
    /// Entries per bucket (len / capacity)
    pub load_factor: f64,
    /// Mean length of the allocated chains
    pub mean_chain_length: f64,
}

#[cfg(feature = "stats")]
impl TableStats {
    /// Pretty-print the statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Map Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.len,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Buckets: {}/{} occupied, longest chain {}, mean chain {:.2}",
            self.occupied_buckets, self.capacity, self.longest_chain, self.mean_chain_length
        );
    }
}

/// Number of buckets per chain length; index `0` counts empty buckets.
///
/// Only available with the `stats` feature.
#[cfg(feature = "stats")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainHistogram {
    counts: Vec<usize>,
}

#[cfg(feature = "stats")]
impl ChainHistogram {
    /// Bucket counts indexed by chain length.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Pretty-print the histogram.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let total: usize = self.counts.iter().sum();
        println!("=== Chain Length Histogram ===");
        for (length, &count) in self.counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let share = count as f64 / total as f64;
            let bar = "#".repeat((share * 50.0).ceil() as usize);
            println!("{length:>4}: {count:>8} ({:>6.2}%) {bar}", share * 100.0);
        }
    }
}

#[cfg(feature = "stats")]
impl<K, V, H> HashMap<K, V, H> {
    /// Summarizes bucket occupancy and chain lengths.
    pub fn stats(&self) -> TableStats {
        let chains = self.buckets.iter().flatten();
        let occupied_buckets = chains.clone().count();
        let longest_chain = chains.map(Chain::len).max().unwrap_or(0);

        TableStats {
            len: self.len(),
            capacity: self.capacity(),
            occupied_buckets,
            longest_chain,
            load_factor: if self.capacity() == 0 {
                0.0
            } else {
                self.len() as f64 / self.capacity() as f64
            },
            mean_chain_length: if occupied_buckets == 0 {
                0.0
            } else {
                self.len() as f64 / occupied_buckets as f64
            },
        }
    }

    /// Counts buckets by chain length.
    pub fn chain_length_histogram(&self) -> ChainHistogram {
        let mut counts = Vec::new();
        for slot in &self.buckets {
            let length = slot.as_ref().map_or(0, Chain::len);
            if counts.len() <= length {
                counts.resize(length + 1, 0);
            }
            counts[length] += 1;
        }
        ChainHistogram { counts }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use test_log::test;

    use super::*;
    use crate::Error;

    /// Sends every key to the same bucket.
    #[derive(Debug, Clone, Copy, Default)]
    struct Constant;

    impl ByteHasher for Constant {
        fn hash_bytes(&self, _bytes: &[u8], _seed: u32) -> u32 {
            7
        }
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(
            &self,
            _serializer: S,
        ) -> core::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("no stable bytes"))
        }
    }

    impl PartialEq for Unencodable {
        fn eq(&self, _other: &Self) -> bool {
            true
        }
    }

    impl Eq for Unencodable {}

    fn assert_invariants<K, V, H>(map: &HashMap<K, V, H>) {
        let mut total = 0;
        for (index, slot) in map.buckets.iter().enumerate() {
            let Some(chain) = slot else { continue };
            assert!(!chain.is_empty(), "bucket {index} holds an empty chain");
            for (_, node) in chain.iter(&map.nodes) {
                assert_eq!(node.hash() as usize % map.capacity(), index);
            }
            total += chain.len();
        }
        assert_eq!(total, map.len());
    }

    fn sorted<T: Ord + Clone>(items: impl Iterator<Item = T>) -> Vec<T> {
        let mut items: Vec<T> = items.collect();
        items.sort();
        items
    }

    #[test]
    fn new_map_is_empty() {
        let map: HashMap<u32, u32> = HashMap::new();
        assert!(map.is_empty());
        assert_eq!(map.capacity(), 0);
        assert_eq!(map.get(&1), Ok(None));
        assert_eq!(map.contains_key(&1), Ok(false));
        assert!(!map.contains_value(&1));
        assert_eq!(map.keys().count(), 0);
    }

    #[test]
    fn growth_from_zero_capacity() {
        let mut map: HashMap<u32, u32> = HashMap::with_capacity(0);
        let mut trajectory = Vec::new();
        for k in 1..=3 {
            map.insert(k, k).unwrap();
            trajectory.push(map.capacity());
            assert_invariants(&map);
        }

        assert_eq!(trajectory, vec![1, 2, 4]);
        assert_eq!(sorted(map.keys().copied()), vec![1, 2, 3]);
        for k in 1..=3 {
            assert_eq!(map.get(&k).unwrap(), Some(&k));
        }
    }

    #[test]
    fn growth_doubles_at_saturation() {
        let mut map: HashMap<u32, u32> = HashMap::with_capacity(5);
        for k in 0..5 {
            map.insert(k, k * 2).unwrap();
        }
        assert_eq!(map.capacity(), 5);

        map.insert(5, 10).unwrap();
        assert_eq!(map.capacity(), 10);
        for k in 0..6 {
            assert_eq!(map.get(&k).unwrap(), Some(&(k * 2)));
        }
        assert_invariants(&map);
    }

    #[test]
    fn shrink_at_quarter_load() {
        let mut map: HashMap<u32, u32> = HashMap::with_capacity(20);
        for k in 0..5 {
            map.insert(k, k).unwrap();
        }
        assert_eq!(map.capacity(), 20);

        let mut trajectory = Vec::new();
        for k in 0..5 {
            assert_eq!(map.remove(&k).unwrap(), Some(k));
            trajectory.push(map.capacity());
            assert_invariants(&map);
            for rest in k + 1..5 {
                assert_eq!(map.get(&rest).unwrap(), Some(&rest));
            }
        }

        assert_eq!(trajectory, vec![8, 8, 4, 2, 1]);
        assert!(map.is_empty());
    }

    #[test]
    fn no_shrink_above_quarter_load() {
        let mut map: HashMap<u32, u32> = HashMap::with_capacity(8);
        for k in 0..4 {
            map.insert(k, k).unwrap();
        }
        map.remove(&0).unwrap();
        assert_eq!(map.capacity(), 8);
        map.remove(&1).unwrap();
        assert_eq!(map.capacity(), 4);
    }

    #[test]
    fn failed_remove_does_not_shrink() {
        let mut map: HashMap<u32, u32> = HashMap::with_capacity(64);
        map.insert(1, 1).unwrap();
        assert_eq!(map.remove(&2).unwrap(), None);
        assert_eq!(map.capacity(), 64);
    }

    #[test]
    fn insert_overwrites() {
        let mut map: HashMap<String, u32> = HashMap::new();
        assert_eq!(map.insert("a".to_string(), 1).unwrap(), None);
        let capacity = map.capacity();
        assert_eq!(map.insert("a".to_string(), 2).unwrap(), Some(1));
        assert_eq!(map.len(), 1);
        assert_eq!(map.capacity(), capacity);
        assert_eq!(map.get("a").unwrap(), Some(&2));
    }

    #[test]
    fn push_shadows_across_rehash() {
        let mut map: HashMap<u32, &str> = HashMap::new();
        map.push(1, "old").unwrap();
        map.push(1, "new").unwrap();
        // Saturated at 2/2, so this grows and rehashes both duplicates.
        map.push(2, "other").unwrap();
        assert_eq!(map.capacity(), 4);
        assert_eq!(map.len(), 3);

        assert_eq!(map.get(&1).unwrap(), Some(&"new"));
        assert_eq!(sorted(map.keys().copied()), vec![1, 1, 2]);

        assert_eq!(map.remove(&1).unwrap(), Some("new"));
        assert_eq!(map.get(&1).unwrap(), Some(&"old"));
        assert_eq!(map.remove(&1).unwrap(), Some("old"));
        assert_eq!(map.get(&1).unwrap(), None);
        assert_invariants(&map);
    }

    #[test]
    fn count_tracks_pushes_and_removals() {
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        let mut map: HashMap<u8, u32> = HashMap::new();
        let mut pushes = 0usize;
        let mut removals = 0usize;

        for step in 0..2000u32 {
            let key = rng.random_range(0..32u8);
            if rng.random_bool(0.6) {
                map.push(key, step).unwrap();
                pushes += 1;
            } else if map.remove(&key).unwrap().is_some() {
                removals += 1;
            }
            assert_eq!(map.len(), pushes - removals);
        }
        assert_invariants(&map);
    }

    #[test]
    fn colliding_keys_share_one_chain() {
        let mut map = HashMap::with_capacity_seed_and_hasher(0, 0, Constant);
        for k in 0..6u32 {
            map.insert(k, k * 100).unwrap();
        }
        assert_invariants(&map);

        let occupied: Vec<&Chain> = map.buckets.iter().flatten().collect();
        assert_eq!(occupied.len(), 1);
        assert_eq!(occupied[0].len(), 6);

        // Remove from the middle of the chain and check the neighbours.
        let chain = occupied[0].clone();
        let ids: Vec<NodeId> = chain.iter(&map.nodes).map(|(id, _)| id).collect();
        let middle = *map.nodes[ids[2]].key();
        let (before, after) = (*map.nodes[ids[1]].key(), *map.nodes[ids[3]].key());

        assert_eq!(map.remove(&middle).unwrap(), Some(middle * 100));

        let chain = map.buckets.iter().flatten().next().unwrap();
        let nodes: Vec<(NodeId, u32)> = chain
            .iter(&map.nodes)
            .map(|(id, n)| (id, *n.key()))
            .collect();
        assert_eq!(nodes.len(), 5);
        let pos = nodes.iter().position(|(_, k)| *k == before).unwrap();
        assert_eq!(nodes[pos + 1].1, after);
        assert_eq!(map.nodes[nodes[pos].0].next(), Some(nodes[pos + 1].0));
        assert_eq!(map.nodes[nodes[pos + 1].0].prev(), Some(nodes[pos].0));
        assert_eq!(map.nodes[nodes[0].0].prev(), None);

        for k in (0..6u32).filter(|k| *k != middle) {
            assert_eq!(map.get(&k).unwrap(), Some(&(k * 100)));
        }
    }

    #[test]
    fn empty_chains_are_released() {
        let mut map = HashMap::with_capacity_seed_and_hasher(16, 0, Constant);
        map.insert(1u32, ()).unwrap();
        map.insert(2u32, ()).unwrap();
        map.remove(&1).unwrap();
        map.remove(&2).unwrap();
        assert!(map.buckets.iter().all(Option::is_none));
        assert_invariants(&map);
    }

    #[test]
    fn get_key_by_value_scans_all_buckets() {
        let mut map: HashMap<u32, char> = HashMap::new();
        for (k, v) in [(1, 'x'), (2, 'y'), (3, 'z')] {
            map.insert(k, v).unwrap();
        }
        assert_eq!(map.get_key_by_value(&'y'), Some(&2));
        assert!(map.contains_value(&'z'));
        assert!(!map.contains_value(&'w'));

        map.insert(4, 'y').unwrap();
        let found = *map.get_key_by_value(&'y').unwrap();
        assert!(found == 2 || found == 4);
    }

    #[test]
    fn get_mut_and_entry_access() {
        let mut map: HashMap<String, Vec<u32>> = HashMap::new();
        map.insert("list".to_string(), vec![1]).unwrap();
        map.get_mut("list").unwrap().unwrap().push(2);
        assert_eq!(map.get("list").unwrap(), Some(&vec![1, 2]));

        let (key, value) = map.get_key_value("list").unwrap().unwrap();
        assert_eq!(key, "list");
        assert_eq!(value.len(), 2);

        assert_eq!(
            map.remove_entry("list").unwrap(),
            Some(("list".to_string(), vec![1, 2]))
        );
    }

    #[test]
    fn clear_resets_to_one_bucket() {
        let mut map: HashMap<u32, u32> = HashMap::with_capacity(10);
        for k in 0..10 {
            map.insert(k, k).unwrap();
        }
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.capacity(), 1);
        assert_eq!(map.keys().count(), 0);
        assert_eq!(map.values().count(), 0);

        map.clear();
        assert!(map.is_empty());

        map.insert(3, 3).unwrap();
        assert_eq!(map.get(&3).unwrap(), Some(&3));
        assert_invariants(&map);
    }

    #[test]
    fn encoding_errors_surface() {
        let mut map: HashMap<Unencodable, u32> = HashMap::new();
        assert!(matches!(map.insert(Unencodable, 1), Err(Error::Encoding(_))));
        assert!(matches!(map.push(Unencodable, 1), Err(Error::Encoding(_))));
        assert!(map.is_empty());
        assert_eq!(map.capacity(), 0);

        // An empty map answers without encoding.
        assert_eq!(map.get(&Unencodable).unwrap(), None);
        assert_eq!(map.remove(&Unencodable).unwrap(), None);
    }

    #[test]
    fn encoding_error_on_populated_map() {
        #[derive(PartialEq, Eq)]
        enum Key {
            Plain(u8),
            Handle,
        }

        impl Serialize for Key {
            fn serialize<S: serde::Serializer>(
                &self,
                serializer: S,
            ) -> core::result::Result<S::Ok, S::Error> {
                match self {
                    Key::Plain(v) => serializer.serialize_u8(*v),
                    Key::Handle => Err(serde::ser::Error::custom("handle")),
                }
            }
        }

        let mut map = HashMap::new();
        map.insert(Key::Plain(1), "one").unwrap();
        assert!(matches!(map.get(&Key::Handle), Err(Error::Encoding(_))));
        assert!(matches!(
            map.contains_key(&Key::Handle),
            Err(Error::Encoding(_))
        ));
        assert!(matches!(map.remove(&Key::Handle), Err(Error::Encoding(_))));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let build = || {
            let mut map: HashMap<u32, u32> = Builder::new().seed(99).build();
            for k in 0..50 {
                map.insert(k, k).unwrap();
            }
            map.keys().copied().collect::<Vec<_>>()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn builder_with_custom_hasher() {
        let mut map: HashMap<&str, u8, Constant> =
            Builder::new().capacity(3).hasher(Constant).seed(1).build();
        map.insert("a", 1).unwrap();
        map.insert("b", 2).unwrap();
        assert_eq!(map.capacity(), 3);
        assert_eq!(map.get("b").unwrap(), Some(&2));
    }

    #[test]
    fn structured_keys() {
        #[derive(Serialize, PartialEq, Eq, Debug, Clone)]
        struct Point {
            x: i64,
            y: i64,
        }

        let mut map = HashMap::new();
        for x in -3..3 {
            for y in -3..3 {
                map.insert(Point { x, y }, x * y).unwrap();
            }
        }
        assert_eq!(map.len(), 36);
        assert_eq!(map.get(&Point { x: -2, y: 2 }).unwrap(), Some(&-4));
        assert_eq!(map.get(&Point { x: 5, y: 5 }).unwrap(), None);

        let mut nested: HashMap<(String, Vec<u8>), bool> = HashMap::new();
        nested.insert(("a".to_string(), vec![1, 2]), true).unwrap();
        assert_eq!(
            nested.get(&("a".to_string(), vec![1, 2])).unwrap(),
            Some(&true)
        );
        assert_eq!(nested.get(&("a".to_string(), vec![1])).unwrap(), None);
    }

    #[test]
    fn try_extend_and_debug() {
        let mut map: HashMap<u8, u8> = HashMap::new();
        map.try_extend([(1, 10), (2, 20)]).unwrap();
        assert_eq!(map.len(), 2);

        let rendered = alloc::format!("{map:?}");
        assert!(rendered.contains("1: 10"));
        assert!(rendered.contains("2: 20"));
    }

    #[test]
    fn iterators_report_exact_len() {
        let mut map: HashMap<u32, u32> = HashMap::new();
        for k in 0..20 {
            map.insert(k, k).unwrap();
        }
        let mut iter = map.iter();
        assert_eq!(iter.len(), 20);
        iter.next();
        assert_eq!(iter.len(), 19);
        assert_eq!(map.values().len(), 20);
        assert_eq!((&map).into_iter().count(), 20);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn insert_many() {
        let mut map: HashMap<u64, u64> = HashMap::new();
        for k in 0..20_000u64 {
            map.insert(k, k ^ 0xFF).unwrap();
        }
        assert_eq!(map.len(), 20_000);
        assert_invariants(&map);
        for k in (0..20_000u64).step_by(7) {
            assert_eq!(map.remove(&k).unwrap(), Some(k ^ 0xFF));
        }
        assert_invariants(&map);
        for k in 0..20_000u64 {
            let expected = (k % 7 != 0).then_some(k ^ 0xFF);
            assert_eq!(map.get(&k).unwrap().copied(), expected);
        }
    }

    #[cfg(feature = "stats")]
    #[test]
    fn stats_and_histogram() {
        let mut map = HashMap::with_capacity_seed_and_hasher(4, 0, Constant);
        for k in 0..3u32 {
            map.insert(k, ()).unwrap();
        }

        let stats = map.stats();
        assert_eq!(stats.len, 3);
        assert_eq!(stats.capacity, 4);
        assert_eq!(stats.occupied_buckets, 1);
        assert_eq!(stats.longest_chain, 3);
        assert_eq!(stats.mean_chain_length, 3.0);

        assert_eq!(map.chain_length_histogram().counts(), &[3, 0, 0, 1]);
    }
}
