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

//! A byte string, used for process arguments, environment variables and anything else that may
//! not be valid UTF-8 but is conventionally treated as text (POSIX makes no UTF-8 guarantee).

use super::vec::Vec;
use crate::errno::AllocResult;
use core::{fmt, ops::Deref};

/// An owned, fallibly-allocated byte string.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct String(Vec<u8>);

impl String {
	/// Creates a new, empty string.
	pub const fn new() -> Self {
		Self(Vec::new())
	}

	/// Builds a string from an UTF-8 `&str`, propagating allocation failure.
	pub fn try_from_str(s: &str) -> AllocResult<Self> {
		let mut v = Vec::new();
		v.extend_from_slice(s.as_bytes())?;
		Ok(Self(v))
	}

	/// Builds a string by copying raw bytes that are not guaranteed to be valid UTF-8.
	pub fn try_from_bytes(bytes: &[u8]) -> AllocResult<Self> {
		let mut v = Vec::new();
		v.extend_from_slice(bytes)?;
		Ok(Self(v))
	}

	/// Appends `s` to the end of the string.
	pub fn push_str(&mut self, s: &str) -> AllocResult<()> {
		self.0.extend_from_slice(s.as_bytes())
	}

	/// Appends raw bytes, not necessarily valid UTF-8, to the end of the string.
	pub fn extend_from_bytes(&mut self, bytes: &[u8]) -> AllocResult<()> {
		self.0.extend_from_slice(bytes)
	}

	/// Appends a single byte to the end of the string.
	pub fn push(&mut self, b: u8) -> AllocResult<()> {
		self.0.push(b)
	}

	/// Returns the string's bytes.
	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	/// Interprets the string as UTF-8, if valid.
	pub fn as_str(&self) -> Option<&str> {
		core::str::from_utf8(&self.0).ok()
	}
}

impl Deref for String {
	type Target = [u8];

	fn deref(&self) -> &[u8] {
		&self.0
	}
}

impl fmt::Debug for String {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.as_str() {
			Some(s) => write!(f, "{s:?}"),
			None => write!(f, "{:?}", &*self.0),
		}
	}
}

impl fmt::Display for String {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", crate::DisplayableStr(&self.0))
	}
}
