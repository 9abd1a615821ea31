//! Counters reported by the in-memory backend

/// A point-in-time view of cache activity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStatistics {
	pub hits: u64,
	pub misses: u64,
	/// Live entries, expired ones not yet swept included
	pub entries: u64,
	/// Encoded size of all entries in bytes
	pub bytes: u64,
	/// Entries dropped by prefix deletes and clears
	pub invalidated: u64,
	/// Entries dropped by expiry sweeps
	pub expired: u64,
}

impl CacheStatistics {
	pub fn requests(&self) -> u64 {
		self.hits + self.misses
	}

	/// Share of lookups answered from the cache
	///
	/// # Examples
	///
	/// ```
	/// use canopy_cache::CacheStatistics;
	///
	/// let stats = CacheStatistics {
	///     hits: 3,
	///     misses: 1,
	///     ..Default::default()
	/// };
	/// assert_eq!(stats.hit_rate(), 0.75);
	/// ```
	pub fn hit_rate(&self) -> f64 {
		match self.requests() {
			0 => 0.0,
			requests => self.hits as f64 / requests as f64,
		}
	}
}
