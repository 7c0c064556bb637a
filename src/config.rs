use thiserror::Error;

/// Number of slots a table starts with when no configuration is given.
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// Fraction of the slot array that may hold live entries before it doubles.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.5;

/// Largest power-of-two slot count a table can be asked for.
const MAX_SLOTS: usize = 1 << (usize::BITS - 1);

/// Errors produced when validating a [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    /// The initial capacity was zero.
    #[error("initial capacity must be non-zero")]
    ZeroCapacity,
    /// The initial capacity has no power of two at or above it.
    #[error("initial capacity {0} cannot be rounded up to a power of two")]
    CapacityOverflow(usize),
    /// The load factor was not strictly between zero and one.
    #[error("max load factor {0} must lie strictly between 0 and 1 and admit one entry")]
    InvalidLoadFactor(f64),
}

/// Sizing options for a [`HashTable`](crate::HashTable) or
/// [`HashMap`](crate::HashMap).
///
/// The initial capacity is a slot count, rounded up to the next power of two.
/// The load factor bounds the fraction of slots holding live entries; once an
/// insertion would exceed it the slot array doubles. It must be below one so
/// that an empty slot always exists to terminate probing.
///
/// # Examples
///
/// ```rust
/// use probe_hash::Config;
///
/// let config = Config::new(100, 0.75).unwrap();
/// assert_eq!(config.initial_capacity(), 128);
/// assert_eq!(config.max_load_factor(), 0.75);
///
/// assert!(Config::new(16, 1.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    initial_capacity: usize,
    max_load_factor: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }
}

impl Config {
    /// Creates a validated configuration.
    pub fn new(initial_capacity: usize, max_load_factor: f64) -> Result<Self, ConfigError> {
        Self::default()
            .with_initial_capacity(initial_capacity)?
            .with_max_load_factor(max_load_factor)
    }

    /// Returns a copy of this configuration with a different initial slot
    /// count.
    pub fn with_initial_capacity(self, initial_capacity: usize) -> Result<Self, ConfigError> {
        if initial_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        let initial_capacity = initial_capacity
            .checked_next_power_of_two()
            .ok_or(ConfigError::CapacityOverflow(initial_capacity))?;

        Ok(Self {
            initial_capacity,
            ..self
        })
    }

    /// Returns a copy of this configuration with a different load factor.
    ///
    /// The factor must lie strictly between zero and one, and must be large
    /// enough that the largest addressable slot array admits one entry.
    pub fn with_max_load_factor(self, max_load_factor: f64) -> Result<Self, ConfigError> {
        // Written so that NaN is rejected too.
        if !(max_load_factor > 0.0 && max_load_factor < 1.0) {
            return Err(ConfigError::InvalidLoadFactor(max_load_factor));
        }

        let config = Self {
            max_load_factor,
            ..self
        };
        if config.load_limit(MAX_SLOTS) == 0 {
            return Err(ConfigError::InvalidLoadFactor(max_load_factor));
        }
        Ok(config)
    }

    /// The number of slots a fresh table allocates. Always a power of two.
    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    /// The fraction of slots that may hold live entries.
    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    /// Number of live entries `slots` slots may hold before they must double.
    ///
    /// Never reaches `slots`, so at least one slot stays empty.
    #[inline]
    pub(crate) fn load_limit(&self, slots: usize) -> usize {
        let limit = (slots as f64 * self.max_load_factor) as usize;
        limit.min(slots.saturating_sub(1))
    }

    /// Smallest power-of-two slot count, starting from `from`, whose load
    /// limit admits `entries` live entries.
    pub(crate) fn slots_for(&self, entries: usize, from: usize) -> usize {
        let mut slots = from.max(1);
        while self.load_limit(slots) < entries {
            slots = slots.checked_mul(2).expect("allocation size overflow");
        }
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.initial_capacity(), 16);
        assert_eq!(config.max_load_factor(), 0.5);
        assert_eq!(config.load_limit(16), 8);
        assert_eq!(config.load_limit(32), 16);
    }

    #[test]
    fn capacity_rounds_up() {
        assert_eq!(Config::new(1, 0.5).unwrap().initial_capacity(), 1);
        assert_eq!(Config::new(17, 0.5).unwrap().initial_capacity(), 32);
        assert_eq!(Config::new(64, 0.5).unwrap().initial_capacity(), 64);
    }

    #[test]
    fn rejects_invalid_values() {
        assert_eq!(Config::new(0, 0.5), Err(ConfigError::ZeroCapacity));
        assert_eq!(
            Config::new(usize::MAX, 0.5),
            Err(ConfigError::CapacityOverflow(usize::MAX))
        );
        assert_eq!(
            Config::new(16, 0.0),
            Err(ConfigError::InvalidLoadFactor(0.0))
        );
        assert_eq!(
            Config::new(16, 1.0),
            Err(ConfigError::InvalidLoadFactor(1.0))
        );
        assert!(matches!(
            Config::new(16, f64::NAN),
            Err(ConfigError::InvalidLoadFactor(_))
        ));
    }

    #[test]
    #[cfg(feature = "std")]
    fn error_messages() {
        use std::string::ToString;

        assert_eq!(
            ConfigError::ZeroCapacity.to_string(),
            "initial capacity must be non-zero"
        );
        assert_eq!(
            ConfigError::InvalidLoadFactor(1.5).to_string(),
            "max load factor 1.5 must lie strictly between 0 and 1 and admit one entry"
        );
    }

    #[test]
    fn rejects_load_factor_too_small_for_any_table() {
        let smallest = 1.0 / MAX_SLOTS as f64;
        let config = Config::new(16, smallest).unwrap();
        assert_eq!(config.load_limit(MAX_SLOTS), 1);
        assert_eq!(config.slots_for(1, 16), MAX_SLOTS);

        assert_eq!(
            Config::new(16, smallest / 2.0),
            Err(ConfigError::InvalidLoadFactor(smallest / 2.0))
        );
        assert_eq!(
            Config::new(16, 1e-300),
            Err(ConfigError::InvalidLoadFactor(1e-300))
        );
    }

    #[test]
    fn load_limit_keeps_an_empty_slot() {
        let config = Config::new(1, 0.99).unwrap();
        assert_eq!(config.load_limit(1), 0);
        assert_eq!(config.load_limit(2), 1);
        assert_eq!(config.load_limit(4), 3);
        assert_eq!(config.load_limit(128), 126);
    }

    #[test]
    fn slots_for_doubles_until_entries_fit() {
        let config = Config::default();
        assert_eq!(config.slots_for(0, 16), 16);
        assert_eq!(config.slots_for(8, 16), 16);
        assert_eq!(config.slots_for(9, 16), 32);
        assert_eq!(config.slots_for(100, 16), 256);
        assert_eq!(config.slots_for(9, 64), 64);
    }
}
