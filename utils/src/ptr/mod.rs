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

//! Shared-ownership pointers that report allocation failure instead of aborting.

pub mod arc;

pub use arc::{Arc, Weak};

use crate::errno::AllocResult;
use core::{
	cell::UnsafeCell,
	sync::atomic::{AtomicBool, Ordering},
};

/// A cell holding an `Arc<T>` that can be atomically swapped, used for state read far more often
/// than written (the current memory space bound to a CPU).
///
/// Unlike `arc_swap`-style structures this uses a simple spinlock rather than hazard pointers,
/// which is sufficient given the low contention on kernel-internal cells of this kind.
pub struct RelaxedArcCell<T> {
	lock: AtomicBool,
	inner: UnsafeCell<Option<Arc<T>>>,
}

unsafe impl<T: Send + Sync> Sync for RelaxedArcCell<T> {}

impl<T> RelaxedArcCell<T> {
	/// Creates a new cell, initially empty.
	pub const fn new() -> Self {
		Self {
			lock: AtomicBool::new(false),
			inner: UnsafeCell::new(None),
		}
	}

	fn with_lock<R>(&self, f: impl FnOnce(&mut Option<Arc<T>>) -> R) -> R {
		while self
			.lock
			.compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
			.is_err()
		{
			core::hint::spin_loop();
		}
		let res = f(unsafe { &mut *self.inner.get() });
		self.lock.store(false, Ordering::Release);
		res
	}

	/// Returns a clone of the currently stored value, if any.
	pub fn get(&self) -> Option<Arc<T>> {
		self.with_lock(|inner| inner.clone())
	}

	/// Replaces the stored value, returning the previous one.
	pub fn set(&self, val: Arc<T>) -> Option<Arc<T>> {
		self.with_lock(|inner| inner.replace(val))
	}
}

impl<T> Default for RelaxedArcCell<T> {
	fn default() -> Self {
		Self::new()
	}
}

/// Allocates a new `Arc<T>`, propagating allocation failure.
pub fn arc_new<T>(val: T) -> AllocResult<Arc<T>> {
	Arc::new(val)
}
