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

//! Utility library shared between the kernel, its modules and its build scripts.
//!
//! This crate is `no_std` by default (the `std` feature pulls in the standard library for use by
//! build scripts and host-side tooling) and depends on nothing but `core` and `alloc`: every
//! fallible operation that could fail on a real machine (allocation, arithmetic) is expressed
//! through a [`Result`] rather than assumed to succeed.

#![cfg_attr(not(feature = "std"), no_std)]
#![feature(allocator_api)]

extern crate alloc;

pub mod bytes;
pub mod collections;
pub mod errno;
pub mod interrupt;
pub mod limits;
pub mod lock;
pub mod math;
pub mod ptr;

use core::fmt;

/// A value that can be cloned, except the clone may fail because of an allocation failure.
pub trait TryClone: Sized {
	/// Clones the value, returning an allocation error on failure.
	fn try_clone(&self) -> errno::AllocResult<Self>;
}

impl<T: Clone> TryClone for T {
	fn try_clone(&self) -> errno::AllocResult<Self> {
		Ok(self.clone())
	}
}

/// A displayable byte string, used to print paths and other non-UTF8 byte sequences.
pub struct DisplayableStr<'s>(pub &'s [u8]);

impl fmt::Display for DisplayableStr<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for b in self.0 {
			write!(f, "{}", *b as char)?;
		}
		Ok(())
	}
}

/// Builds a fallible [`collections::vec::Vec`] from the given elements, propagating allocation
/// failure.
#[macro_export]
macro_rules! vec {
	() => {
		Ok::<$crate::collections::vec::Vec<_>, ::core::alloc::AllocError>($crate::collections::vec::Vec::new())
	};
	($($x:expr),+ $(,)?) => {{
		(|| -> Result<_, ::core::alloc::AllocError> {
			let mut v = $crate::collections::vec::Vec::new();
			$(v.push($x)?;)+
			Ok(v)
		})()
	}};
}
