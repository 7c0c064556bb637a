use core::borrow::Borrow;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::ops::Index;

use crate::DefaultHashBuilder;
use crate::config::Config;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashTable;

/// Matches a stored pair against a borrowed form of its key.
fn equivalent_key<K, Q, V>(key: &Q) -> impl Fn(&(K, V)) -> bool + '_
where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
{
    move |(k, _)| <K as Borrow<Q>>::borrow(k) == key
}

/// A hash map implemented using the linear-probing [`HashTable`] as the
/// underlying storage.
///
/// `HashMap<K, V, S>` stores key-value pairs where keys implement `Hash + Eq`
/// and uses a configurable hasher builder `S` to hash keys. Each key is hashed
/// once per operation; the hash is kept alongside the pair, so growing the
/// table never rehashes keys through `S`.
///
/// The map starts with 16 slots and doubles them whenever an insertion would
/// fill more than half, unless a different [`Config`] is given. Removed keys
/// leave tombstones that later insertions reuse, and that are dropped when
/// the slots are rebuilt.
///
/// Keys must hash consistently with their `Eq` implementation. A key whose
/// hash or equality changes while it is in the map may become unreachable.
///
/// # Examples
///
/// ```rust
/// use probe_hash::HashMap;
///
/// let mut map: HashMap<_, _> = HashMap::new();
/// map.insert("a", 1);
/// assert_eq!(map.remove(&"a"), Some(1));
/// assert_eq!(map.get(&"a"), None);
/// assert_eq!(map.len(), 0);
///
/// map.insert("a", 2);
/// assert_eq!(map.get(&"a"), Some(&2));
/// assert_eq!(map.len(), 1);
/// ```
#[derive(Clone)]
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    table: HashTable<(K, V)>,
    hash_builder: S,
}

impl<K, V, S> Debug for HashMap<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.table.values() {
            map.entry(k, v);
        }
        map.finish()
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates a new hash map with the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use probe_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, _> = HashMap::with_hasher(SimpleHasher);
    /// assert!(map.is_empty());
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_config_and_hasher(Config::default(), hash_builder)
    }

    /// Creates a new hash map able to hold `capacity` entries without
    /// growing, using the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use probe_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, _> = HashMap::with_capacity_and_hasher(100, SimpleHasher);
    /// assert!(map.capacity() >= 100);
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
            hash_builder,
        }
    }

    /// Creates a new hash map sized by `config`, using the given hasher
    /// builder.
    pub fn with_config_and_hasher(config: Config, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_config(config),
            hash_builder,
        }
    }

    /// Returns the number of entries in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashMap;
    /// #
    /// let mut map: HashMap<_, _> = HashMap::new();
    /// assert_eq!(map.len(), 0);
    /// map.insert(1, "a");
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of entries the map can hold before its slot array
    /// doubles.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashMap;
    /// #
    /// let map: HashMap<i32, String> = HashMap::new();
    /// assert_eq!(map.capacity(), 8);
    /// assert_eq!(map.slot_count(), 16);
    /// ```
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the length of the underlying slot array.
    pub fn slot_count(&self) -> usize {
        self.table.slot_count()
    }

    /// Returns the configuration the map was created with.
    pub fn config(&self) -> &Config {
        self.table.config()
    }

    /// Returns a reference to the map's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Removes all elements from the map.
    ///
    /// This operation preserves the map's allocated slots.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Shrinks the slot array as much as possible, dropping all tombstones.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashMap;
    /// #
    /// let mut map: HashMap<_, _> = HashMap::with_capacity(100);
    /// map.insert(1, "one");
    /// map.insert(2, "two");
    ///
    /// // The map has a large capacity but only 2 elements
    /// assert!(map.capacity() >= 100);
    ///
    /// map.shrink_to_fit();
    ///
    /// // Back to the initial 16 slots, which still fit the elements
    /// assert_eq!(map.slot_count(), 16);
    /// assert_eq!(map.len(), 2);
    /// ```
    pub fn shrink_to_fit(&mut self) {
        self.table.shrink_to_fit();
    }

    /// Reserves capacity for at least `additional` more elements.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map did not have this key present, `None` is returned and the
    /// slot array doubles first if the new entry would exceed the load
    /// factor. If the map did have this key present, the value is updated in
    /// place, and the old value is returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use probe_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HashMap::with_hasher(SimpleHasher);
    /// assert_eq!(map.insert(37, "a"), None);
    /// assert_eq!(map.insert(37, "b"), Some("a"));
    /// assert_eq!(map.get(&37), Some(&"b"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hash_builder.hash_one(&key);
        match self.table.entry(hash, |(k, _)| k == &key) {
            TableEntry::Occupied(mut entry) => {
                let old_value = core::mem::replace(&mut entry.get_mut().1, value);
                Some(old_value)
            }
            TableEntry::Vacant(entry) => {
                entry.insert((key, value));
                None
            }
        }
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but `Hash` and
    /// `Eq` on the borrowed form must match those for the key type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashMap;
    /// #
    /// let mut map: HashMap<_, _> = HashMap::new();
    /// map.insert("a".to_string(), 1);
    /// assert_eq!(map.get("a"), Some(&1));
    /// assert_eq!(map.get("b"), None);
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find(hash, equivalent_key(key))
            .map(|(_, v)| v)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashMap;
    /// #
    /// let mut map: HashMap<_, _> = HashMap::new();
    /// map.insert(1, "a");
    /// if let Some(x) = map.get_mut(&1) {
    ///     *x = "b";
    /// }
    /// assert_eq!(map.get(&1), Some(&"b"));
    /// ```
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find_mut(hash, equivalent_key(key))
            .map(|(_, v)| v)
    }

    /// Returns `true` if the map contains a value for the specified key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Removes a key from the map, returning the value at the key if the key
    /// was previously in the map.
    ///
    /// The key's slot is left as a tombstone until the slot array is next
    /// rebuilt.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashMap;
    /// #
    /// let mut map: HashMap<_, _> = HashMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes a key from the map, returning the stored key and value if the
    /// key was previously in the map.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_builder.hash_one(key);
        self.table.remove(hash, equivalent_key(key))
    }

    /// Gets the given key's corresponding entry in the map for in-place
    /// manipulation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashMap;
    /// #
    /// let mut letters: HashMap<_, _> = HashMap::new();
    /// for ch in "a short treatise on fungi".chars() {
    ///     *letters.entry(ch).or_insert(0) += 1;
    /// }
    ///
    /// assert_eq!(letters[&'s'], 2);
    /// assert_eq!(letters[&'t'], 3);
    /// assert_eq!(letters.get(&'y'), None);
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V> {
        let hash = self.hash_builder.hash_one(&key);
        match self.table.entry(hash, |(k, _)| k == &key) {
            TableEntry::Occupied(entry) => Entry::Occupied(OccupiedEntry { entry }),
            TableEntry::Vacant(entry) => Entry::Vacant(VacantEntry { entry, key }),
        }
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates a new hash map using the default hasher builder: 16 slots and a
    /// maximum load factor of one half.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::HashMap;
    /// #
    /// let map: HashMap<i32, String> = HashMap::new();
    /// assert!(map.is_empty());
    /// assert_eq!(map.slot_count(), 16);
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates a new hash map able to hold `capacity` entries without
    /// growing, using the default hasher builder.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }

    /// Creates a new hash map sized by `config`, using the default hasher
    /// builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::Config;
    /// # use probe_hash::HashMap;
    /// #
    /// let config = Config::new(32, 0.75)?;
    /// let map: HashMap<u64, u64> = HashMap::with_config(config);
    /// assert_eq!(map.slot_count(), 32);
    /// assert_eq!(map.capacity(), 24);
    /// # Ok::<(), probe_hash::ConfigError>(())
    /// ```
    pub fn with_config(config: Config) -> Self {
        Self::with_config_and_hasher(config, S::default())
    }
}

impl<K, V, S> Default for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Extend<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, Q, V, S> Index<&Q> for HashMap<K, V, S>
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    type Output = V;

    /// Returns a reference to the value corresponding to the supplied key.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not found in HashMap")
    }
}

/// A view into a single entry in the map, which may either be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashMap`].
///
/// [`entry`]: HashMap::entry
pub enum Entry<'a, K, V> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V>),
}

impl<'a, K, V> Entry<'a, K, V> {
    /// Inserts a default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a value computed from a closure if the entry is vacant and
    /// returns a mutable reference.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V> Entry<'a, K, V>
where
    V: Default,
{
    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the map.
pub struct VacantEntry<'a, K, V> {
    entry: crate::hash_table::VacantEntry<'a, (K, V)>,
    key: K,
}

impl<'a, K, V> VacantEntry<'a, K, V> {
    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the value into the map and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        &mut self.entry.insert((self.key, value)).1
    }
}

/// A view into an occupied entry in the map.
pub struct OccupiedEntry<'a, K, V> {
    entry: crate::hash_table::OccupiedEntry<'a, (K, V)>,
}

impl<'a, K, V> OccupiedEntry<'a, K, V> {
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.entry.get().0
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.entry.get().1
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.entry.get_mut().1
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.entry.into_mut().1
    }

    /// Inserts a value into the entry and returns the old value.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(&mut self.entry.get_mut().1, value)
    }

    /// Removes the entry from the map and returns the value.
    pub fn remove(self) -> V {
        self.entry.remove().1
    }

    /// Removes the entry from the map and returns the key and value.
    pub fn remove_entry(self) -> (K, V) {
        self.entry.remove()
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use core::hash::BuildHasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;

    #[derive(Clone)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k1: rng.try_next_u64().unwrap_or(0),
                k2: rng.try_next_u64().unwrap_or(0),
            }
        }
    }

    /// Sends every key to the same hash, so every key shares one probe chain.
    #[derive(Clone, Default)]
    struct ConstantHashBuilder;

    struct ConstantHasher;

    impl core::hash::Hasher for ConstantHasher {
        fn finish(&self) -> u64 {
            0
        }

        fn write(&mut self, _bytes: &[u8]) {}
    }

    impl BuildHasher for ConstantHashBuilder {
        type Hasher = ConstantHasher;

        fn build_hasher(&self) -> Self::Hasher {
            ConstantHasher
        }
    }

    #[test]
    fn test_new_and_with_hasher() {
        let map: HashMap<i32, String, SipHashBuilder> = HashMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.slot_count(), 16);
        assert_eq!(map.capacity(), 8);

        let map2 = HashMap::<i32, String, _>::with_hasher(SipHashBuilder::default());
        assert!(map2.is_empty());
        assert_eq!(map2.len(), 0);
    }

    #[test]
    fn test_default_hasher() {
        let mut map: HashMap<i32, &str> = HashMap::default();
        map.insert(1, "one");
        assert_eq!(map.get(&1), Some(&"one"));
    }

    #[test]
    fn test_with_capacity() {
        let map: HashMap<i32, String, SipHashBuilder> = HashMap::with_capacity(100);
        assert!(map.capacity() >= 100);
        assert!(map.is_empty());

        let map2 =
            HashMap::<i32, String, _>::with_capacity_and_hasher(200, SipHashBuilder::default());
        assert!(map2.capacity() >= 200);
        assert!(map2.is_empty());
    }

    #[test]
    fn test_with_config() {
        let config = Config::new(4, 0.75).unwrap();
        let mut map: HashMap<i32, i32, SipHashBuilder> = HashMap::with_config(config);
        assert_eq!(map.slot_count(), 4);
        assert_eq!(map.capacity(), 3);
        assert_eq!(map.config(), &config);

        for i in 0..4 {
            map.insert(i, i);
        }
        assert_eq!(map.slot_count(), 8);
        assert_eq!(map.capacity(), 6);
    }

    #[test]
    fn test_small_load_factor_still_inserts() {
        let config = Config::new(16, 0.01).unwrap();
        let mut map: HashMap<i32, i32, SipHashBuilder> = HashMap::with_config(config);
        assert_eq!(map.capacity(), 0);

        assert_eq!(map.insert(1, 1), None);
        assert_eq!(map.slot_count(), 128);
        assert_eq!(map.get(&1), Some(&1));

        assert!(Config::new(16, 1e-300).is_err());
    }

    #[test]
    fn test_insert_and_get() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());

        assert_eq!(map.insert(1, "hello".to_string()), None);
        assert_eq!(map.len(), 1);
        assert!(!map.is_empty());

        assert_eq!(map.get(&1), Some(&"hello".to_string()));
        assert_eq!(map.get(&2), None);

        assert_eq!(
            map.insert(1, "world".to_string()),
            Some("hello".to_string())
        );
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&"world".to_string()));
    }

    #[test]
    fn test_remove_then_reinsert_reuses_tombstone() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert("a", 1);
        assert_eq!(map.remove(&"a"), Some(1));
        assert_eq!(map.get(&"a"), None);
        assert_eq!(map.len(), 0);
        assert_eq!(map.table.tombstones(), 1);

        map.insert("a", 2);
        assert_eq!(map.get(&"a"), Some(&2));
        assert_eq!(map.len(), 1);
        assert_eq!(map.table.tombstones(), 0);
    }

    #[test]
    fn test_lookup_and_removal_forms() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one".to_string());
        map.insert(2, "two".to_string());

        map.get_mut(&1).unwrap().push('!');
        assert_eq!(map.get(&1).map(String::as_str), Some("one!"));
        assert!(map.contains_key(&2));
        assert!(!map.contains_key(&3));
        assert_eq!(map.get_mut(&3), None);

        assert_eq!(map.remove_entry(&1), Some((1, "one!".to_string())));
        assert_eq!(map.remove(&1), None);
        assert_eq!(map.remove(&2).as_deref(), Some("two"));
        assert!(map.is_empty());
        assert_eq!(map.table.tombstones(), 2);
    }

    #[test]
    fn test_clear_drops_tombstones_and_keeps_slots() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        for i in 0..20 {
            map.insert(i, i);
        }
        map.remove(&0);
        let slots = map.slot_count();

        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.slot_count(), slots);
        assert_eq!(map.table.tombstones(), 0);
        assert_eq!(map.get(&1), None);

        map.insert(1, 10);
        assert_eq!(map[&1], 10);
    }

    #[test]
    fn test_alternating_removals_keep_survivors_reachable() {
        let mut map = HashMap::with_hasher(ConstantHashBuilder);
        for i in 0..30 {
            map.insert(i, vec![i; 3]);
        }
        // Every other entry on the single shared chain becomes a tombstone.
        for i in (0..30).step_by(2) {
            assert_eq!(map.remove(&i), Some(vec![i; 3]));
        }
        assert_eq!(map.table.tombstones(), 15);

        for i in (1..30).step_by(2) {
            map.get_mut(&i).unwrap().push(i);
            assert_eq!(map.get(&i), Some(&vec![i; 4]));
        }
        for i in (0..30).step_by(2) {
            assert!(!map.contains_key(&i));
        }
    }

    #[test]
    fn test_nine_keys_grow_to_32_slots() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        for i in 0..8 {
            map.insert(i, i * 10);
        }
        assert_eq!(map.slot_count(), 16);

        map.insert(8, 80);
        assert_eq!(map.slot_count(), 32);
        assert_eq!(map.len(), 9);
        for i in 0..9 {
            assert_eq!(map.get(&i), Some(&(i * 10)));
        }
    }

    #[test]
    #[cfg(feature = "std")]
    fn test_len_tracks_live_keys() {
        let mut map: HashMap<u32, u32, _> = HashMap::with_hasher(SipHashBuilder::default());
        let mut reference = std::collections::HashMap::new();
        let mut rng = OsRng;

        for _ in 0..5000 {
            let key = rng.try_next_u32().unwrap_or(0) % 64;
            match rng.try_next_u32().unwrap_or(0) % 3 {
                0 => assert_eq!(map.remove(&key), reference.remove(&key)),
                _ => assert_eq!(map.insert(key, key * 2), reference.insert(key, key * 2)),
            }
            assert_eq!(map.len(), reference.len());
            assert!(map.len() * 2 <= map.slot_count());
        }

        for key in 0..64 {
            assert_eq!(map.get(&key), reference.get(&key));
        }
    }

    #[test]
    fn test_tombstone_reclaim_and_doubling_schedule() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        for i in 0..16 {
            map.insert(i, i);
        }
        assert_eq!(map.slot_count(), 32);

        for i in 0..8 {
            assert_eq!(map.remove(&i), Some(i));
        }
        assert_eq!(map.len(), 8);

        // 9 more live keys crosses 16 of 32 slots.
        for i in 100..109 {
            map.insert(i, i);
        }
        assert_eq!(map.slot_count(), 64);
        assert_eq!(map.len(), 17);
        assert_eq!(map.table.tombstones(), 0);

        for i in 0..8 {
            assert_eq!(map.get(&i), None);
        }
        for i in (8..16).chain(100..109) {
            assert_eq!(map.get(&i), Some(&i));
        }
    }

    #[test]
    fn test_all_keys_colliding() {
        let mut map = HashMap::with_hasher(ConstantHashBuilder);
        for i in 0..40 {
            assert_eq!(map.insert(i, i * 3), None);
        }
        assert_eq!(map.len(), 40);
        assert_eq!(map.slot_count(), 128);

        for i in (0..40).step_by(3) {
            assert_eq!(map.remove(&i), Some(i * 3));
        }
        for i in 0..40 {
            let expected = if i % 3 == 0 { None } else { Some(i * 3) };
            assert_eq!(map.get(&i).copied(), expected);
        }
        assert_eq!(map.get(&1000), None);
    }

    #[test]
    fn test_reserve() {
        let mut map = HashMap::<i32, String, _>::with_hasher(SipHashBuilder::default());
        let initial_capacity = map.capacity();

        map.reserve(1000);
        assert!(map.capacity() >= initial_capacity + 1000);
    }

    #[test]
    fn test_shrink_to_fit() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        for i in 0..200 {
            map.insert(i, i);
        }
        for i in 20..200 {
            map.remove(&i);
        }
        map.shrink_to_fit();
        assert_eq!(map.slot_count(), 64);
        for i in 0..20 {
            assert_eq!(map.get(&i), Some(&i));
        }
    }

    #[test]
    fn test_entry_api() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());

        let value = map.entry(1).or_insert("hello".to_string());
        assert_eq!(value, &"hello".to_string());
        assert_eq!(map.len(), 1);

        let value = map.entry(1).or_insert("world".to_string());
        assert_eq!(value, &"hello".to_string());
        assert_eq!(map.len(), 1);

        map.entry(2).or_insert_with(|| "computed".to_string());
        assert_eq!(map.get(&2), Some(&"computed".to_string()));

        map.entry(2)
            .and_modify(|v| v.push('!'))
            .or_insert_with(|| unreachable!());
        assert_eq!(map.get(&2), Some(&"computed!".to_string()));

        let mut counts: HashMap<&str, u32, _> = HashMap::with_hasher(SipHashBuilder::default());
        *counts.entry("x").or_default() += 1;
        *counts.entry("x").or_default() += 1;
        assert_eq!(counts[&"x"], 2);
    }

    #[test]
    fn test_occupied_entry() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "old".to_string());

        match map.entry(1) {
            Entry::Occupied(mut entry) => {
                assert_eq!(entry.key(), &1);
                assert_eq!(entry.get(), &"old".to_string());
                assert_eq!(entry.insert("new".to_string()), "old".to_string());

                let (key, value) = entry.remove_entry();
                assert_eq!(key, 1);
                assert_eq!(value, "new".to_string());
            }
            Entry::Vacant(_) => panic!("Expected occupied entry"),
        }

        assert!(map.is_empty());
    }

    #[test]
    fn test_vacant_entry() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());

        match map.entry(1) {
            Entry::Vacant(entry) => {
                assert_eq!(entry.key(), &1);

                let value = entry.insert("hello".to_string());
                assert_eq!(value, &"hello".to_string());
            }
            Entry::Occupied(_) => panic!("Expected vacant entry"),
        }

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&"hello".to_string()));

        match map.entry(2) {
            Entry::Vacant(entry) => assert_eq!(entry.into_key(), 2),
            Entry::Occupied(_) => panic!("Expected vacant entry"),
        }
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_string_keys() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());

        map.insert("hello".to_string(), 1);
        map.insert("world".to_string(), 2);
        map.insert("rust".to_string(), 3);

        assert_eq!(map.get("hello"), Some(&1));
        assert_eq!(map.get(&"world".to_string()), Some(&2));
        assert_eq!(map.get("rust"), Some(&3));
        assert_eq!(map.get("missing"), None);
        assert_eq!(map.remove("world"), Some(2));
        assert!(!map.contains_key("world"));
    }

    #[test]
    fn test_from_iter_and_extend() {
        let mut map: HashMap<i32, i32, SipHashBuilder> = (0..10).map(|i| (i, i * i)).collect();
        assert_eq!(map.len(), 10);
        assert_eq!(map[&3], 9);

        map.extend([(3, 0), (10, 100)]);
        assert_eq!(map.len(), 11);
        assert_eq!(map[&3], 0);
        assert_eq!(map[&10], 100);
    }

    #[test]
    #[should_panic(expected = "key not found")]
    fn test_index_missing_key_panics() {
        let map: HashMap<i32, i32, SipHashBuilder> = HashMap::new();
        let _value = map[&1];
    }

    #[test]
    fn test_clone_is_independent() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, 1);
        let cloned = map.clone();
        map.insert(1, 2);
        map.insert(2, 2);

        assert_eq!(cloned.get(&1), Some(&1));
        assert_eq!(cloned.len(), 1);
    }

    #[test]
    fn test_debug_format() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(7, "seven");
        assert_eq!(format!("{:?}", map), r#"{7: "seven"}"#);

        map.remove(&7);
        assert_eq!(format!("{:?}", map), "{}");
    }
}
