#![no_std]

//! A codec for ANSI and ISO fingerprint interchange records.
//!
//! Whorl reads and writes the headers of fingerprint image records (FID,
//! ANSI INCITS 381-2004 and ISO/IEC 19794-4:2005) and fingerprint minutiae
//! records (FMD, ANSI INCITS 378-2004 and ISO/IEC 19794-2:2005), locates the
//! per-finger views inside them, and parses or serializes each view's payload.
//!
//! The [`sans`] module holds the codec proper. It works over caller-owned
//! buffers, never allocates, and performs no I/O. The [`avec`] module builds
//! on it with record builders, a reader-based loader, an enrollment session
//! and the interface expected of an external matching engine.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `std`: enable the [`avec`] module and the `whorl` binary (default).

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "std")]
pub mod avec;
pub mod sans;
