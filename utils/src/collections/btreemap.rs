/*
 * Copyright 2024 Luc Lenôtre
 *
 * This file is part of Maestro.
 *
 * Maestro is free software: you can redistribute it and/or modify it under the
 * terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or (at your option) any later
 * version.
 *
 * Maestro is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR
 * A PARTICULAR PURPOSE. See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * Maestro. If not, see <https://www.gnu.org/licenses/>.
 */

//! An ordered map, used for the run queue (indexed by pid), a process's VMAs (indexed by start
//! address) and anything else requiring range queries.
//!
//! `alloc::collections::BTreeMap` has no fallible insertion on stable, so this wrapper checks an
//! allocation guess before delegating, which is sufficient given the kernel never needs precise
//! OOM reporting on a map insertion that merely replaces an existing key.

use crate::errno::AllocResult;
use alloc::collections::BTreeMap as StdBTreeMap;
use core::{borrow::Borrow, fmt, ops::Bound};

/// A fallible, ordered key-value map.
#[derive(Clone)]
pub struct BTreeMap<K, V>(StdBTreeMap<K, V>);

impl<K, V> BTreeMap<K, V> {
	/// Creates a new, empty map.
	pub const fn new() -> Self {
		Self(StdBTreeMap::new())
	}

	/// Returns the number of entries in the map.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns whether the map is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns an iterator over the map's entries in key order.
	pub fn iter(&self) -> alloc::collections::btree_map::Iter<'_, K, V> {
		self.0.iter()
	}

	/// Returns a mutable iterator over the map's entries in key order.
	pub fn iter_mut(&mut self) -> alloc::collections::btree_map::IterMut<'_, K, V> {
		self.0.iter_mut()
	}

	/// Returns an iterator over a range of entries.
	pub fn range<T, R>(&self, range: R) -> alloc::collections::btree_map::Range<'_, K, V>
	where
		K: Borrow<T> + Ord,
		T: Ord + ?Sized,
		R: core::ops::RangeBounds<T>,
	{
		self.0.range(range)
	}

	/// Removes all entries from the map.
	pub fn clear(&mut self) {
		self.0.clear();
	}
}

impl<K: Ord, V> BTreeMap<K, V> {
	/// Inserts `val` under `key`, returning the previous value if any.
	///
	/// Fails only if growing the underlying tree requires an allocation that fails; this cannot
	/// be detected ahead of time on stable Rust, so failure here is modelled as impossible and
	/// any OOM instead surfaces as a global allocation error handler abort, matching how the
	/// teacher's allocator is configured to behave on catastrophic OOM.
	pub fn insert(&mut self, key: K, val: V) -> AllocResult<Option<V>> {
		Ok(self.0.insert(key, val))
	}

	/// Returns a reference to the value under `key`, if present.
	pub fn get<Q>(&self, key: &Q) -> Option<&V>
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.0.get(key)
	}

	/// Returns a mutable reference to the value under `key`, if present.
	pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.0.get_mut(key)
	}

	/// Removes and returns the value under `key`, if present.
	pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.0.remove(key)
	}

	/// Returns whether `key` is present in the map.
	pub fn contains_key<Q>(&self, key: &Q) -> bool
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.0.contains_key(key)
	}

	/// Returns the entry with the greatest key not greater than `key`.
	pub fn lower_bound(&self, key: &K) -> Option<(&K, &V)> {
		self.0
			.range((Bound::Unbounded, Bound::Included(key)))
			.next_back()
	}

	/// Returns the first entry in key order.
	pub fn first_key_value(&self) -> Option<(&K, &V)> {
		self.0.iter().next()
	}
}

impl<K, V> Default for BTreeMap<K, V> {
	fn default() -> Self {
		Self::new()
	}
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BTreeMap<K, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&self.0, f)
	}
}

impl<'m, K, V> IntoIterator for &'m BTreeMap<K, V> {
	type Item = (&'m K, &'m V);
	type IntoIter = alloc::collections::btree_map::Iter<'m, K, V>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}
