//! Buffer-level codec for fingerprint interchange records.
//!
//! Every function in this module operates on a byte slice owned by the
//! caller. Records and views are read into small value types and written back
//! from them; nothing here holds state between calls.
//!
//! # Layout
//!
//! Both record families open with an 8-byte magic and version tag, followed
//! by a header whose shape depends on the dialect in force (see [`format`]).
//! Views follow the header back to back. They are not randomly addressable:
//! each view's length depends on its own payload, so the `locate_*` functions
//! walk the chain from the first view.
//!
//! Byte order is big-endian throughout. The primitives live in [`endian`].
//!
//! # Parallel use
//!
//! Views covering disjoint byte ranges of one buffer may be processed on
//! separate threads by splitting the buffer. No locking is done here.

pub mod endian;
pub mod fid;
pub mod finger;
pub mod fmd;
pub mod format;
