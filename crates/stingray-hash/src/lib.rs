//! Resource hashing for Stingray archives
//!
//! Every entry in a Stingray archive is addressed by a pair of 64-bit hashes:
//! the hash of its resource path (the FileID) and the hash of its resource
//! type name (the TypeID). Some payloads additionally store 32-bit short
//! hashes, for instance material slot identifiers inside meshes.
//!
//! # Components
//!
//! - **Hashing**: [`murmur64a`], [`hash64`] and [`hash32`]
//! - **Name lists**: [`HashNames`] maps hashes back to human-readable names
//!   using the plain-text lists shipped alongside a game installation
//!
//! # Examples
//!
//! ```
//! use stingray_hash::{hash32, hash64};
//!
//! assert_eq!(hash64("texture"), 0xcd42_38c6_a0c6_9e32);
//! assert_eq!(hash32("texture"), 0xcd42_38c6);
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod murmur;
pub mod names;

pub use error::{HashError, HashResult};
pub use murmur::{hash32, hash64, murmur64a};
pub use names::HashNames;
