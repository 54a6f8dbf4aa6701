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

//! Error codes returned to userspace, modelled after the POSIX `errno` values.
//!
//! Recoverable failures (resource exhaustion, permission, structural errors in user-supplied
//! data) are reported as an [`Errno`] and propagated with `?`. Only violations of kernel-internal
//! invariants panic.

use core::{alloc::AllocError, fmt};

/// Declares the table of error codes and their numeric values.
macro_rules! errnos {
	($($name:ident = $val:expr, $doc:expr;)*) => {
		/// A POSIX error code.
		#[derive(Clone, Copy, Debug, Eq, PartialEq)]
		#[repr(i32)]
		pub enum Errno {
			$(
				#[doc = $doc]
				$name = $val,
			)*
		}

		impl Errno {
			/// Returns the numeric value of the error, as returned to userspace (negated).
			pub const fn as_int(&self) -> i32 {
				*self as i32
			}

			/// Returns the name of the error code, as it would appear in a C header.
			pub const fn as_str(&self) -> &'static str {
				match self {
					$(Self::$name => stringify!($name),)*
				}
			}
		}
	};
}

errnos! {
	EPERM = 1, "Operation not permitted";
	ENOENT = 2, "No such file or directory";
	ESRCH = 3, "No such process";
	EINTR = 4, "Interrupted system call";
	EIO = 5, "I/O error";
	ENXIO = 6, "No such device or address";
	E2BIG = 7, "Argument list too long";
	ENOEXEC = 8, "Exec format error";
	EBADF = 9, "Bad file number";
	ECHILD = 10, "No child processes";
	EAGAIN = 11, "Try again";
	ENOMEM = 12, "Out of memory";
	EACCES = 13, "Permission denied";
	EFAULT = 14, "Bad address";
	ENOTBLK = 15, "Block device required";
	EBUSY = 16, "Device or resource busy";
	EEXIST = 17, "File exists";
	EXDEV = 18, "Cross-device link";
	ENODEV = 19, "No such device";
	ENOTDIR = 20, "Not a directory";
	EISDIR = 21, "Is a directory";
	EINVAL = 22, "Invalid argument";
	ENFILE = 23, "File table overflow";
	EMFILE = 24, "Too many open files";
	ENOTTY = 25, "Not a typewriter";
	ETXTBSY = 26, "Text file busy";
	EFBIG = 27, "File too large";
	ENOSPC = 28, "No space left on device";
	ESPIPE = 29, "Illegal seek";
	EROFS = 30, "Read-only file system";
	EMLINK = 31, "Too many links";
	EPIPE = 32, "Broken pipe";
	EDOM = 33, "Math argument out of domain";
	ERANGE = 34, "Math result not representable";
	ENAMETOOLONG = 36, "File name too long";
	ENOSYS = 38, "Function not implemented";
	ENOTEMPTY = 39, "Directory not empty";
	ELOOP = 40, "Too many symbolic links encountered";
	ENODATA = 61, "No data available";
	ENOTSOCK = 88, "Socket operation on non-socket";
	EOPNOTSUPP = 95, "Operation not supported";
	ECONNREFUSED = 111, "Connection refused";
}

impl fmt::Display for Errno {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl From<AllocError> for Errno {
	fn from(_: AllocError) -> Self {
		Self::ENOMEM
	}
}

/// Builds an [`Errno`] from one of its variant names.
///
/// This is the idiomatic way to produce an error: `errno!(EINVAL)`.
#[macro_export]
macro_rules! errno {
	($variant:ident) => {
		$crate::errno::Errno::$variant
	};
}

/// The result of a fallible kernel operation that may return any [`Errno`].
pub type EResult<T> = Result<T, Errno>;
/// The result of an operation that may only fail because of resource exhaustion.
pub type AllocResult<T> = Result<T, AllocError>;
