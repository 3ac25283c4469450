//! # Introduction
//!
//! `randstruct` reorders the fields of `struct` types that opt in with
//! `randomize_layout`, so that member offsets are no longer predictable from
//! the source. The new order still respects what C requires of a layout:
//! adjacent bit-fields stay together and in order, and a flexible array
//! member stays last.
//!
//! ## Pass pipeline
//!
//! ```text
//! RecordDecl → should_randomize → classify → pack → shuffle → reassemble → commit
//! ```
//!
//! 1. [`decl`]: the declaration model: records, fields, types and sizes.
//! 2. [`composite`]: the [`composite::Composite`] trait the pass reads
//!    records through; implement it to run the pass on another AST.
//! 3. [`randstruct`]: eligibility, cache-line bucketing, shuffling and
//!    reassembly, driven by [`randstruct::Randstruct`].
//! 4. [`config`]: bucket capacity and seeding policy, loadable from TOML.
//! 5. [`diagnostics`]: warnings for conflicting layout attributes.
//!
//! ## Example
//!
//! ```
//! use randstruct::config::RandstructConfig;
//! use randstruct::decl::{BaseType, FieldDecl, RecordDecl, Type};
//! use randstruct::diagnostics::Diagnostics;
//! use randstruct::randstruct::Randstruct;
//!
//! let int = || Type::new(BaseType::Int);
//! let mut records = vec![RecordDecl::new_struct("cred")
//!     .with_field(FieldDecl::new("uid", int()))
//!     .with_field(FieldDecl::new("gid", int()))
//!     .with_field(FieldDecl::new("euid", int()))
//!     .randomized()];
//!
//! let mut pass = Randstruct::new(&RandstructConfig::seeded(7)).unwrap();
//! let mut diagnostics = Diagnostics::new();
//! let reordered = pass.randomize_records(&mut records, &mut diagnostics).unwrap();
//!
//! assert_eq!(reordered, 1);
//! assert_eq!(records[0].fields().count(), 3);
//! ```

pub mod composite;
pub mod config;
pub mod constants;
pub mod decl;
pub mod diagnostics;
pub mod errors;
pub mod randstruct;
