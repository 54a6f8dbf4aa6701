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

//! Low-level mutual exclusion primitives that do not depend on the scheduler.
//!
//! [`Mutex`] is a plain spinlock. [`IntMutex`] additionally disables interrupts for the duration
//! of the critical section, which is required for any state an interrupt handler may also touch
//! (the PID allocator, the run queue, a process's pending-signal set).

pub mod once;

use crate::interrupt;
use core::{
	cell::UnsafeCell,
	fmt,
	hint,
	ops::{Deref, DerefMut},
	sync::atomic::{AtomicBool, Ordering},
};

/// A mutual-exclusion spinlock.
///
/// `DISABLE_INT` selects whether interrupts are masked while the lock is held. Use the
/// [`IntMutex`] alias for state that is also touched from interrupt context.
pub struct Mutex<T: ?Sized, const DISABLE_INT: bool = false> {
	locked: AtomicBool,
	data: UnsafeCell<T>,
}

unsafe impl<T: ?Sized + Send, const DISABLE_INT: bool> Sync for Mutex<T, DISABLE_INT> {}
unsafe impl<T: ?Sized + Send, const DISABLE_INT: bool> Send for Mutex<T, DISABLE_INT> {}

impl<T, const DISABLE_INT: bool> Mutex<T, DISABLE_INT> {
	/// Creates a new, unlocked mutex wrapping `data`.
	pub const fn new(data: T) -> Self {
		Self {
			locked: AtomicBool::new(false),
			data: UnsafeCell::new(data),
		}
	}
}

impl<T: Default, const DISABLE_INT: bool> Default for Mutex<T, DISABLE_INT> {
	fn default() -> Self {
		Self::new(T::default())
	}
}

impl<T: ?Sized, const DISABLE_INT: bool> Mutex<T, DISABLE_INT> {
	/// Acquires the lock, busy-waiting if it is already held.
	pub fn lock(&self) -> MutexGuard<'_, T, DISABLE_INT> {
		let int_state = if DISABLE_INT {
			interrupt::disable()
		} else {
			false
		};
		while self
			.locked
			.compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
			.is_err()
		{
			hint::spin_loop();
		}
		MutexGuard {
			mutex: self,
			int_state,
		}
	}

	/// Returns a mutable reference to the inner value without locking.
	///
	/// # Safety
	///
	/// The caller must ensure no other context can access the value concurrently.
	pub unsafe fn get_mut(&self) -> &mut T {
		&mut *self.data.get()
	}
}

impl<T: ?Sized + fmt::Debug, const DISABLE_INT: bool> fmt::Debug for Mutex<T, DISABLE_INT> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&*self.lock(), f)
	}
}

/// RAII guard releasing a [`Mutex`] when dropped.
pub struct MutexGuard<'m, T: ?Sized, const DISABLE_INT: bool> {
	mutex: &'m Mutex<T, DISABLE_INT>,
	int_state: bool,
}

impl<T: ?Sized, const DISABLE_INT: bool> Deref for MutexGuard<'_, T, DISABLE_INT> {
	type Target = T;

	fn deref(&self) -> &T {
		unsafe { &*self.mutex.data.get() }
	}
}

impl<T: ?Sized, const DISABLE_INT: bool> DerefMut for MutexGuard<'_, T, DISABLE_INT> {
	fn deref_mut(&mut self) -> &mut T {
		unsafe { &mut *self.mutex.data.get() }
	}
}

impl<T: ?Sized, const DISABLE_INT: bool> Drop for MutexGuard<'_, T, DISABLE_INT> {
	fn drop(&mut self) {
		self.mutex.locked.store(false, Ordering::Release);
		if DISABLE_INT {
			interrupt::restore(self.int_state);
		}
	}
}

/// A [`Mutex`] that also disables interrupts while held.
///
/// Used for any structure an ISR may touch: the scheduler run queue, a process's signal state,
/// the PID allocator.
pub type IntMutex<T> = Mutex<T, true>;
/// Guard returned by [`IntMutex::lock`].
pub type IntMutexGuard<'m, T> = MutexGuard<'m, T, true>;
