//! Owned conveniences over the buffer-level codec.
//!
//! _Requires Cargo feature `std`._
//!
//! - [`builder`] assembles complete records from views.
//! - [`reader`] loads exactly one record from a reader.
//! - [`engine`] describes the external minutiae engine. Nothing in this
//!   crate implements it.
//! - [`enrollment`] accumulates validated views for fusion into a template.
//! - [`bridge`] offers the two entry points exposed to a host language.

pub mod bridge;
pub mod builder;
pub mod engine;
pub mod enrollment;
pub mod reader;

pub use builder::{FidBuilder, FmdBuilder, raw_to_fid};
pub use reader::{read_fid, read_fmd};
