//! A low-level open-addressing hash table with linear probing.
//!
//! [`HashTable`] stores values of type `V` in a single power-of-two sized slot
//! array. Callers supply the hash of every value along with an equality
//! predicate; the keyed [`HashMap`](crate::HashMap) is built on top of it.
//!
//! Removal leaves a tombstone in the vacated slot so that probe chains passing
//! through it stay intact. Tombstones are reused by later insertions and
//! dropped whenever the slot array is rebuilt.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::config::Config;

/// Folds a 64-bit hash to 32 bits and spreads its high bits into the low ones.
///
/// Indices are taken by masking with `len - 1`, which only looks at the low
/// bits, so hashes differing only above the mask would otherwise collide.
#[inline(always)]
fn mix(hash: u64) -> u32 {
    let mut h = (hash ^ (hash >> 32)) as u32;
    h ^= (h >> 20) ^ (h >> 12);
    h ^ (h >> 7) ^ (h >> 4)
}

/// Ideal slot for `hash` in a slot array of `len` slots.
#[inline(always)]
fn index_for(hash: u64, len: usize) -> usize {
    debug_assert!(len.is_power_of_two());
    mix(hash) as usize & (len - 1)
}

#[derive(Clone)]
enum Slot<V> {
    Empty,
    Occupied { hash: u64, value: V },
    Tombstone,
}

fn empty_slots<V>(len: usize) -> Vec<Slot<V>> {
    let mut slots = Vec::with_capacity(len);
    slots.resize_with(len, || Slot::Empty);
    slots
}

/// First empty or tombstoned slot on the probe chain of `hash`.
fn find_vacant<V>(slots: &[Slot<V>], hash: u64) -> usize {
    let mask = slots.len() - 1;
    let mut index = index_for(hash, slots.len());
    for _ in 0..slots.len() {
        if !matches!(slots[index], Slot::Occupied { .. }) {
            return index;
        }
        index = (index + 1) & mask;
    }

    unreachable!("no vacant slot among {} slots", slots.len())
}

/// Debug statistics for hash table analysis.
///
/// Available in tests, or with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of live entries in the table
    pub populated: usize,
    /// Number of tombstoned slots awaiting the next rehash
    pub tombstones: usize,
    /// Maximum live entries before the slot array doubles
    pub capacity: usize,
    /// Total number of slots allocated
    pub total_slots: usize,
    /// Load factor (populated / total_slots)
    pub load_factor: f64,
    /// Slot utilization ((populated + tombstones) / total_slots)
    pub slot_utilization: f64,
    /// Longest distance of any entry from its ideal slot
    pub longest_probe: usize,
    /// Mean distance of the entries from their ideal slots
    pub mean_probe: f64,
    /// Total memory in bytes used by the slot array
    pub total_bytes: usize,
    /// Bytes held by slots with no live entry
    pub wasted_bytes: usize,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.total_slots,
            self.load_factor * 100.0
        );
        println!(
            "Slot Usage: {} live + {} tombstones ({:.2}% utilization)",
            self.populated,
            self.tombstones,
            self.slot_utilization * 100.0
        );
        println!("Growth threshold: {} entries", self.capacity);
        println!(
            "Probe length: {} max, {:.2} mean",
            self.longest_probe, self.mean_probe
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
        println!(
            "Memory: {} bytes wasted ({:.02}%)",
            self.wasted_bytes,
            if self.total_bytes == 0 {
                0.0
            } else {
                (self.wasted_bytes as f64 / self.total_bytes as f64) * 100.0
            }
        );
    }
}

/// Histogram of probe lengths, produced by [`HashTable::probe_histogram`].
///
/// Bin `i` counts the live entries stored `i` slots past their ideal slot.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHistogram {
    bins: Vec<usize>,
}

#[cfg(any(test, feature = "stats"))]
impl ProbeHistogram {
    /// Entry counts per probe length.
    pub fn bins(&self) -> &[usize] {
        &self.bins
    }

    /// Total number of entries counted.
    pub fn total(&self) -> usize {
        self.bins.iter().sum()
    }

    /// Pretty-prints the histogram horizontally using stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = self.bins.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!("probe histogram ({} entries):", self.total());

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let full = units / 8;
            let rem = units % 8;
            let mut bar = "█".repeat(full);
            if rem > 0 {
                let ch = match rem {
                    1 => '▏',
                    2 => '▎',
                    3 => '▍',
                    4 => '▌',
                    5 => '▋',
                    6 => '▊',
                    7 => '▉',
                    _ => unreachable!(),
                };
                bar.push(ch);
            }
            bar
        };

        for (i, &count) in self.bins.iter().enumerate() {
            println!("{:>3} | {} ({})", i, make_bar(count), count);
        }
    }
}

/// An open-addressing hash table using linear probing and tombstones.
///
/// `HashTable<V>` stores values of type `V`. Like a raw table, it requires
/// you to provide both the hash value and an equality predicate for each
/// operation. The hash is cached next to each value, so rehashing never calls
/// back into user code.
///
/// ## Behavior
///
/// - The slot array starts at [`Config::initial_capacity`] slots (16 by
///   default) and doubles whenever inserting a new value would push the live
///   count above [`Config::max_load_factor`] of the slots (half by default).
/// - Removing a value leaves a tombstone. Lookups probe past tombstones and
///   stop at the first empty slot; insertions reuse the first tombstone on the
///   probe chain.
/// - Rebuilding the slot array drops every tombstone. If tombstones alone
///   would fill the table past its load limit, it is rebuilt in place at the
///   same size.
///
/// Hashes must be consistent with the predicate: two values the predicate
/// considers equal must have been given equal hashes. Violating this does not
/// cause undefined behavior, but values may become unreachable.
///
/// ## Example
///
/// ```rust
/// # use core::hash::Hash;
/// # use core::hash::Hasher;
/// #
/// # use probe_hash::hash_table::HashTable;
/// # use siphasher::sip::SipHasher;
/// #
/// # #[derive(Debug, PartialEq)]
/// # struct Person {
/// #     id: u64,
/// #     name: String,
/// # }
/// #
/// # fn hash_id(id: u64) -> u64 {
/// #     let mut hasher = SipHasher::new();
/// #     id.hash(&mut hasher);
/// #     hasher.finish()
/// # }
///
/// let mut table = HashTable::new();
/// let hash = hash_id(123);
///
/// // Insert a person
/// match table.entry(hash, |p: &Person| p.id == 123) {
///     probe_hash::hash_table::Entry::Vacant(entry) => {
///         entry.insert(Person {
///             id: 123,
///             name: "Alice".to_string(),
///         });
///     }
///     probe_hash::hash_table::Entry::Occupied(_) => {
///         println!("Person already exists");
///     }
/// }
/// assert_eq!(table.len(), 1);
/// ```
#[derive(Clone)]
pub struct HashTable<V> {
    slots: Vec<Slot<V>>,

    populated: usize,
    tombstones: usize,
    max_pop: usize,

    config: Config,
}

impl<V> Debug for HashTable<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use alloc::format;
        use alloc::string::String;
        use alloc::string::ToString;

        let mask = self.slots.len() - 1;
        f.debug_struct("HashTable")
            .field(
                "slots",
                &self
                    .slots
                    .chunks(16)
                    .enumerate()
                    .map(|(chunk, slots)| {
                        slots
                            .iter()
                            .enumerate()
                            .map(|(offset, slot)| match slot {
                                Slot::Empty => "..".to_string(),
                                Slot::Tombstone => "xx".to_string(),
                                Slot::Occupied { hash, .. } => {
                                    let index = chunk * 16 + offset;
                                    let distance =
                                        index.wrapping_sub(index_for(*hash, self.slots.len()))
                                            & mask;
                                    format!("{:02}", distance.min(99))
                                }
                            })
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .collect::<Vec<String>>(),
            )
            .field("populated", &self.populated)
            .field("tombstones", &self.tombstones)
            .field("capacity", &self.max_pop)
            .finish()
    }
}

impl<V> Default for HashTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> HashTable<V> {
    /// Creates an empty table with the default configuration: 16 slots and a
    /// maximum load factor of one half.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::new();
    /// assert_eq!(table.slot_count(), 16);
    /// assert_eq!(table.capacity(), 8);
    /// ```
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a new hash table able to hold `capacity` values without
    /// growing.
    ///
    /// The slot array may be larger than requested, since its length is a
    /// power of two and at most half of it is filled.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// // Create a table that can hold at least 100 items without resizing
    /// let table: HashTable<String> = HashTable::with_capacity(100);
    /// assert!(table.capacity() >= 100);
    /// assert_eq!(table.slot_count(), 256);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_config(capacity, Config::default())
    }

    /// Creates an empty table sized by `config`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::Config;
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let config = Config::new(64, 0.75).unwrap();
    /// let table: HashTable<u32> = HashTable::with_config(config);
    /// assert_eq!(table.slot_count(), 64);
    /// assert_eq!(table.capacity(), 48);
    /// ```
    pub fn with_config(config: Config) -> Self {
        Self::with_capacity_and_config(0, config)
    }

    /// Creates an empty table using `config`, with enough slots for
    /// `capacity` values.
    pub fn with_capacity_and_config(capacity: usize, config: Config) -> Self {
        let slots = config.slots_for(capacity, config.initial_capacity());
        Self {
            slots: empty_slots(slots),
            populated: 0,
            tombstones: 0,
            max_pop: config.load_limit(slots),
            config,
        }
    }

    /// Returns the configuration this table was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns `true` if the table contains no elements.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<i32> = HashTable::new();
    /// assert!(table.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of live elements in the table.
    ///
    /// Tombstones are not counted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use probe_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// assert_eq!(table.len(), 0);
    ///
    /// table.entry(hash_u64(1), |&n: &u64| n == 1).or_insert(1);
    /// assert_eq!(table.len(), 1);
    ///
    /// table.remove(hash_u64(1), |&n| n == 1);
    /// assert_eq!(table.len(), 0);
    /// ```
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns the number of live values the table can hold before the slot
    /// array doubles.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<i32> = HashTable::with_capacity(100);
    /// assert!(table.capacity() >= 100);
    /// ```
    pub fn capacity(&self) -> usize {
        self.max_pop
    }

    /// Returns the length of the slot array. Always a power of two.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of tombstones left by removals since the slot array
    /// was last rebuilt.
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Removes all elements from the table.
    ///
    /// This operation preserves the table's allocated slots.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use probe_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(hash_u64(1), |&n: &u64| n == 1).or_insert(1);
    /// table.clear();
    /// assert!(table.is_empty());
    /// assert_eq!(table.tombstones(), 0);
    /// ```
    pub fn clear(&mut self) {
        self.slots.fill_with(|| Slot::Empty);
        self.populated = 0;
        self.tombstones = 0;
    }

    /// Shrinks the slot array as much as possible.
    ///
    /// The table is rebuilt into the smallest power-of-two slot array, no
    /// smaller than the configured initial capacity, that holds the current
    /// values under the load factor. All tombstones are dropped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use probe_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::with_capacity(1000);
    /// for i in 0..10u64 {
    ///     table.entry(hash_u64(i), |&n: &u64| n == i).or_insert(i);
    /// }
    ///
    /// table.shrink_to_fit();
    /// assert_eq!(table.slot_count(), 32);
    /// assert_eq!(table.len(), 10);
    /// ```
    pub fn shrink_to_fit(&mut self) {
        let slots = self
            .config
            .slots_for(self.populated, self.config.initial_capacity());
        if slots < self.slots.len() || self.tombstones > 0 {
            crate::log_debug!(
                "shrinking hash table from {} to {} slots ({} live, {} tombstones)",
                self.slots.len(),
                slots,
                self.populated,
                self.tombstones
            );
            self.rehash(slots);
        }
    }

    /// Reserves capacity for at least `additional` more values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::new();
    /// table.reserve(100);
    /// assert!(table.capacity() >= 100);
    /// ```
    pub fn reserve(&mut self, additional: usize) {
        let required = self.populated.saturating_add(additional);
        if required > self.max_pop {
            self.grow(required);
        }
    }

    /// Removes a value from the table.
    ///
    /// The value's slot becomes a tombstone, and the value is returned if it
    /// was present. A missing value leaves the table untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use probe_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(hash_u64(42), |&n: &u64| n == 42).or_insert(42);
    ///
    /// assert_eq!(table.remove(hash_u64(42), |&n| n == 42), Some(42));
    /// assert_eq!(table.remove(hash_u64(42), |&n| n == 42), None);
    /// assert_eq!(table.tombstones(), 1);
    /// ```
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<V> {
        if self.populated == 0 {
            return None;
        }

        let index = self.search(hash, eq).ok()?;
        Some(self.take(index))
    }

    /// Gets the given value's corresponding entry in the table for in-place
    /// manipulation.
    ///
    /// The table never grows here; a [`VacantEntry`] only grows the table when
    /// a value is actually inserted through it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use probe_hash::hash_table::Entry;
    /// # use probe_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_str(s: &str) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     s.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// let hash = hash_str("key");
    ///
    /// match table.entry(hash, |s: &String| s == "key") {
    ///     Entry::Vacant(entry) => {
    ///         entry.insert("key".to_string());
    ///     }
    ///     Entry::Occupied(_) => unreachable!(),
    /// }
    ///
    /// assert!(matches!(
    ///     table.entry(hash, |s: &String| s == "key"),
    ///     Entry::Occupied(_)
    /// ));
    /// ```
    #[inline]
    pub fn entry(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Entry<'_, V> {
        match self.search(hash, eq) {
            Ok(index) => Entry::Occupied(OccupiedEntry { table: self, index }),
            Err(index) => Entry::Vacant(VacantEntry {
                table: self,
                hash,
                index,
            }),
        }
    }

    /// Finds a value in the table by hash and equality predicate.
    ///
    /// Returns a reference to the value if found, or `None` if no matching
    /// value exists. This method does not modify the table.
    ///
    /// # Arguments
    ///
    /// * `hash` - The hash value to search for
    /// * `eq` - A predicate function that returns `true` for the desired value
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use probe_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(hash_u64(42), |&n: &u64| n == 42).or_insert(42);
    ///
    /// // Find existing value
    /// let found = table.find(hash_u64(42), |&n| n == 42);
    /// assert_eq!(found, Some(&42));
    ///
    /// // Search for non-existent value
    /// let not_found = table.find(hash_u64(99), |&n| n == 99);
    /// assert_eq!(not_found, None);
    /// ```
    #[inline]
    pub fn find(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&V> {
        if self.populated == 0 {
            return None;
        }

        let index = self.search(hash, eq).ok()?;
        Some(self.value(index))
    }

    /// Finds a value in the table by hash and equality predicate, returning a
    /// mutable reference.
    ///
    /// The predicate must keep holding for the value after it is modified.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use probe_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// let hash = hash_u64(1);
    /// table.entry(hash, |&(k, _): &(u64, u64)| k == 1).or_insert((1, 10));
    ///
    /// if let Some((_, v)) = table.find_mut(hash, |&(k, _)| k == 1) {
    ///     *v += 5;
    /// }
    /// assert_eq!(table.find(hash, |&(k, _)| k == 1), Some(&(1, 15)));
    /// ```
    #[inline]
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&mut V> {
        if self.populated == 0 {
            return None;
        }

        let index = self.search(hash, eq).ok()?;
        Some(self.value_mut(index))
    }

    /// Walks the probe chain of `hash`.
    ///
    /// Returns `Ok` with the index of the matching value, or `Err` with the
    /// slot a new value for `hash` should take: the first tombstone passed,
    /// else the empty slot that ended the search.
    #[inline]
    fn search(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Result<usize, usize> {
        let mask = self.slots.len() - 1;
        let mut index = index_for(hash, self.slots.len());
        let mut first_tombstone = None;

        for _ in 0..self.slots.len() {
            match &self.slots[index] {
                Slot::Empty => return Err(first_tombstone.unwrap_or(index)),
                Slot::Occupied { hash: stored, value } if *stored == hash && eq(value) => {
                    return Ok(index);
                }
                Slot::Occupied { .. } => {}
                Slot::Tombstone => {
                    first_tombstone.get_or_insert(index);
                }
            }
            index = (index + 1) & mask;
        }

        // Live entries plus tombstones never exceed the load limit, which
        // always leaves an empty slot.
        debug_assert!(
            false,
            "probe visited all {} slots without reaching an empty one",
            self.slots.len()
        );
        match first_tombstone {
            Some(index) => Err(index),
            None => unreachable!("no vacant slot among {} slots", self.slots.len()),
        }
    }

    #[inline(always)]
    fn value(&self, index: usize) -> &V {
        match &self.slots[index] {
            Slot::Occupied { value, .. } => value,
            _ => unreachable!("slot {index} is not occupied"),
        }
    }

    #[inline(always)]
    fn value_mut(&mut self, index: usize) -> &mut V {
        match &mut self.slots[index] {
            Slot::Occupied { value, .. } => value,
            _ => unreachable!("slot {index} is not occupied"),
        }
    }

    /// Replaces the value at `index` with a tombstone and returns it.
    fn take(&mut self, index: usize) -> V {
        match core::mem::replace(&mut self.slots[index], Slot::Tombstone) {
            Slot::Occupied { value, .. } => {
                self.populated -= 1;
                self.tombstones += 1;
                value
            }
            _ => unreachable!("slot {index} is not occupied"),
        }
    }

    /// Stores a new value for `hash`, given the vacancy `index` found by
    /// [`search`](Self::search). Returns the slot actually used, which differs
    /// from `index` if the slot array had to be rebuilt first.
    fn insert_at(&mut self, hash: u64, index: usize, value: V) -> usize {
        let index = if self.populated + 1 > self.max_pop {
            self.grow(self.populated + 1);
            find_vacant(&self.slots, hash)
        } else if matches!(self.slots[index], Slot::Tombstone) {
            self.tombstones -= 1;
            index
        } else if self.populated + self.tombstones + 1 > self.max_pop {
            self.purge_tombstones();
            find_vacant(&self.slots, hash)
        } else {
            debug_assert!(matches!(self.slots[index], Slot::Empty));
            index
        };

        self.slots[index] = Slot::Occupied { hash, value };
        self.populated += 1;
        debug_assert!(self.populated + self.tombstones <= self.max_pop);

        index
    }

    /// Doubles the slot array until `required` live values fit.
    #[cold]
    #[inline(never)]
    fn grow(&mut self, required: usize) {
        let doubled = self
            .slots
            .len()
            .checked_mul(2)
            .expect("allocation size overflow");
        let slots = self.config.slots_for(required, doubled);

        crate::log_debug!(
            "growing hash table from {} to {} slots ({} live, {} tombstones dropped)",
            self.slots.len(),
            slots,
            self.populated,
            self.tombstones
        );
        self.rehash(slots);
    }

    /// Rebuilds the slot array at its current size to reclaim tombstones.
    #[cold]
    #[inline(never)]
    fn purge_tombstones(&mut self) {
        crate::log_debug!(
            "purging {} tombstones from {} slots ({} live)",
            self.tombstones,
            self.slots.len(),
            self.populated
        );
        self.rehash(self.slots.len());
    }

    /// Moves every live value into a fresh array of `len` slots.
    ///
    /// Empty slots and tombstones are not carried over. Each value is placed
    /// with the same probe used for insertion; the fresh array holds no
    /// tombstones, so that probe stops at the first empty slot.
    fn rehash(&mut self, len: usize) {
        debug_assert!(len.is_power_of_two());
        debug_assert!(self.config.load_limit(len) >= self.populated);

        let old = core::mem::replace(&mut self.slots, empty_slots(len));
        for slot in old {
            if let Slot::Occupied { hash, value } = slot {
                let index = find_vacant(&self.slots, hash);
                self.slots[index] = Slot::Occupied { hash, value };
            }
        }

        self.tombstones = 0;
        self.max_pop = self.config.load_limit(len);
    }

    /// Live values in slot order. Used for formatting only.
    pub(crate) fn values(&self) -> impl Iterator<Item = &V> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied { value, .. } => Some(value),
            _ => None,
        })
    }

    /// Computes a histogram of probe lengths for the current table state.
    ///
    /// Available in tests, or with the `stats` feature.
    ///
    /// The probe length of an entry is its distance, with wraparound, from
    /// its ideal slot. The returned histogram has one bin per length from
    /// zero up to the longest probe present.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self) -> ProbeHistogram {
        let mut bins = Vec::new();
        for distance in self.probe_lengths() {
            if bins.len() <= distance {
                bins.resize(distance + 1, 0);
            }
            bins[distance] += 1;
        }

        ProbeHistogram { bins }
    }

    /// Returns detailed utilization statistics for debugging.
    ///
    /// Available in tests, or with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let total_slots = self.slots.len();
        let (longest_probe, probe_sum) = self
            .probe_lengths()
            .fold((0, 0), |(max, sum), d| (max.max(d), sum + d));
        let slot_bytes = core::mem::size_of::<Slot<V>>();

        DebugStats {
            populated: self.populated,
            tombstones: self.tombstones,
            capacity: self.max_pop,
            total_slots,
            load_factor: self.populated as f64 / total_slots as f64,
            slot_utilization: (self.populated + self.tombstones) as f64 / total_slots as f64,
            longest_probe,
            mean_probe: if self.populated == 0 {
                0.0
            } else {
                probe_sum as f64 / self.populated as f64
            },
            total_bytes: total_slots * slot_bytes,
            wasted_bytes: (total_slots - self.populated) * slot_bytes,
        }
    }

    #[cfg(any(test, feature = "stats"))]
    fn probe_lengths(&self) -> impl Iterator<Item = usize> + '_ {
        let mask = self.slots.len() - 1;
        self.slots
            .iter()
            .enumerate()
            .filter_map(move |(index, slot)| match slot {
                Slot::Occupied { hash, .. } => {
                    Some(index.wrapping_sub(index_for(*hash, self.slots.len())) & mask)
                }
                _ => None,
            })
    }
}

/// A view into a single entry in the hash table, which may be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
///
/// # Examples
///
/// ```rust
/// # use core::hash::Hash;
/// # use core::hash::Hasher;
/// #
/// # use probe_hash::hash_table::Entry;
/// # use probe_hash::hash_table::HashTable;
/// # use siphasher::sip::SipHasher;
/// #
/// # fn hash_str(s: &str) -> u64 {
/// #     let mut hasher = SipHasher::new();
/// #     s.hash(&mut hasher);
/// #     hasher.finish()
/// # }
/// #
/// let mut table = HashTable::new();
/// let hash = hash_str("key");
///
/// match table.entry(hash, |s: &String| s == "key") {
///     Entry::Vacant(entry) => {
///         entry.insert("key".to_string());
///     }
///     Entry::Occupied(entry) => {
///         println!("Found existing value: {}", entry.get());
///     }
/// }
/// ```
pub enum Entry<'a, V> {
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, V>),
    /// A vacant entry.
    Vacant(VacantEntry<'a, V>),
}

impl<'a, V> Entry<'a, V> {
    /// Inserts `default` if the entry is vacant, and returns a mutable
    /// reference to the value in the entry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use probe_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_str(s: &str) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     s.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// let hash = hash_str("key");
    ///
    /// let value = table
    ///     .entry(hash, |s: &String| s == "key")
    ///     .or_insert("key".to_string());
    /// assert_eq!(value, "key");
    /// ```
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant, and returns a
    /// mutable reference to the value in the entry.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Modifies an occupied entry in place, returning `None` for a vacant one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use probe_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// let hash = hash_u64(7);
    ///
    /// let missing = table
    ///     .entry(hash, |&(k, _): &(u64, u64)| k == 7)
    ///     .and_modify(|(_, v)| *v += 1);
    /// assert!(missing.is_none());
    ///
    /// table.entry(hash, |&(k, _)| k == 7).or_insert((7, 1));
    /// let value = table
    ///     .entry(hash, |&(k, _)| k == 7)
    ///     .and_modify(|(_, v)| *v += 1);
    /// assert_eq!(value, Some(&mut (7, 2)));
    /// ```
    pub fn and_modify(self, f: impl FnOnce(&mut V)) -> Option<&'a mut V> {
        match self {
            Entry::Occupied(entry) => {
                let value = entry.into_mut();
                f(&mut *value);
                Some(value)
            }
            Entry::Vacant(_) => None,
        }
    }

    /// Inserts `V::default()` if the entry is vacant, and returns a mutable
    /// reference to the value in the entry.
    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }
}

/// A view into a vacant entry in the hash table.
///
/// The entry remembers the slot its probe ended on, so inserting does not
/// probe again unless the table must grow first.
pub struct VacantEntry<'a, V> {
    table: &'a mut HashTable<V>,
    hash: u64,
    index: usize,
}

impl<'a, V> VacantEntry<'a, V> {
    /// Inserts a value into the vacant entry and returns a mutable reference to
    /// it.
    ///
    /// If the table is at its load limit, its slot array doubles first and the
    /// value is placed in the new array.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use probe_hash::hash_table::Entry;
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// # fn hash_str(s: &str) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     s.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// let hash = hash_str("key");
    ///
    /// match table.entry(hash, |s: &String| s == "key") {
    ///     Entry::Vacant(entry) => {
    ///         let value_ref = entry.insert("value".to_string());
    ///         assert_eq!(value_ref, "value");
    ///     }
    ///     Entry::Occupied(_) => unreachable!("Entry should be vacant"),
    /// }
    /// ```
    pub fn insert(self, value: V) -> &'a mut V {
        let Self { table, hash, index } = self;
        let index = table.insert_at(hash, index, value);
        table.value_mut(index)
    }
}

/// A view into an occupied entry in the hash table.
///
/// This struct is created by the [`entry`] method on [`HashTable`] when the
/// requested value is present in the table. It provides methods to access,
/// modify, or remove the existing value.
///
/// [`entry`]: HashTable::entry
pub struct OccupiedEntry<'a, V> {
    table: &'a mut HashTable<V>,
    index: usize,
}

impl<'a, V> OccupiedEntry<'a, V> {
    /// Gets a reference to the value in the entry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use probe_hash::hash_table::Entry;
    /// # use probe_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_str(s: &str) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     s.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// let hash = hash_str("key");
    /// table
    ///     .entry(hash, |s: &String| s == "key")
    ///     .or_insert("key".to_string());
    ///
    /// match table.entry(hash, |s: &String| s == "key") {
    ///     Entry::Occupied(entry) => assert_eq!(entry.get(), "key"),
    ///     Entry::Vacant(_) => unreachable!(),
    /// }
    /// ```
    pub fn get(&self) -> &V {
        self.table.value(self.index)
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        self.table.value_mut(self.index)
    }

    /// Converts the entry into a mutable reference to the value with the
    /// lifetime of the table borrow.
    pub fn into_mut(self) -> &'a mut V {
        let Self { table, index } = self;
        table.value_mut(index)
    }

    /// Replaces the value in place and returns the old one.
    ///
    /// The slot and the live count are unchanged.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(self.get_mut(), value)
    }

    /// Removes the value from the table, leaving a tombstone in its slot.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use probe_hash::hash_table::Entry;
    /// # use probe_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_str(s: &str) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     s.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// let hash = hash_str("key");
    /// table
    ///     .entry(hash, |s: &String| s == "key")
    ///     .or_insert("key".to_string());
    ///
    /// let removed_value = match table.entry(hash, |s: &String| s == "key") {
    ///     Entry::Occupied(entry) => entry.remove(),
    ///     Entry::Vacant(_) => unreachable!(),
    /// };
    /// assert_eq!(removed_value, "key");
    /// assert!(table.is_empty());
    /// ```
    pub fn remove(self) -> V {
        self.table.take(self.index)
    }
}
