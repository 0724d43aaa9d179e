//! Log assembler - turn a request into a structured record
//!
//! Extraction is mechanical and total: every master-schema field is
//! either populated from the request or left null. Nothing on this path
//! returns an error to the caller; unserializable caller data degrades
//! to an `{error, message}` stub in the `data` field.

mod assembler;
mod device;
mod geo;
mod hashes;

pub use assembler::Assembler;
pub use device::classify_device;
pub use geo::geo_id;
pub use hashes::{crc32_decimal, sample_buckets};
