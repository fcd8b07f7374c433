//! # seedjson-core
//!
//! Streaming JSON parser paired with an incremental, type-directed
//! reconstruction engine. JSON text becomes a strongly typed value without an
//! intermediate generic JSON tree.
//!
//! ```text
//! text -> Tokenizer -> tokens -> Parser -> callbacks -> SeedStack -> seeds -> spawn() -> T
//! ```
//!
//! Construction is deferred end-to-end: seeds only accumulate pending values
//! while parsing, and every constructor runs once, with its complete argument
//! set, when the root is spawned after the whole document parsed.
//!
//! ## Quick start
//!
//! ```rust
//! use seedjson_core::{deserialize, Record};
//!
//! #[derive(Debug, Record)]
//! struct Reading {
//!     sensor: String,
//!     values: Vec<f64>,
//!     note: Option<String>,
//! }
//!
//! let reading: Reading = deserialize(r#"{"sensor": "t1", "values": [1, 2.5]}"#).unwrap();
//! assert_eq!(reading.sensor, "t1");
//! assert_eq!(reading.values, vec![1.0, 2.5]);
//! assert_eq!(reading.note, None);
//! ```
//!
//! ## Modules
//!
//! - [`tokenizer`]: characters → lazy token sequence
//! - [`parser`]: recursive-descent grammar, reports events through [`callback`]
//! - [`callback`]: the six-event protocol and the [`EventLog`] recorder
//! - [`driver`]: the seed stack machine and the `deserialize` entry points
//! - [`seed`]: object, object-collection, value-collection and map seeds
//! - [`resolver`]: declared type → seed variant
//! - [`types`]: declared-type descriptors, [`Reconstruct`] and [`Record`](trait@Record)
//! - [`metadata`]: cached per-record constructor parameters
//! - [`convert`]: scalar converters ([`FromScalar`])
//! - [`options`]: parser/deserializer configuration
//! - [`error`]: error types

pub mod callback;
pub mod convert;
pub mod driver;
pub mod error;
pub mod metadata;
pub mod options;
pub mod parser;
pub mod resolver;
pub mod seed;
pub mod token;
pub mod tokenizer;
pub mod types;

pub use callback::{Event, EventLog, ParseCallback};
pub use convert::FromScalar;
pub use driver::{deserialize, deserialize_with, from_reader, Deserializer, SeedStack};
pub use error::{Result, SeedError};
pub use metadata::TypeMetadata;
pub use options::Options;
pub use parser::{parse, Parser};
pub use resolver::{classify, resolve, SeedKind};
pub use seed::Seed;
pub use token::{Scalar, Token};
pub use types::{AnyValue, Arguments, DeclaredType, Param, Reconstruct, Record, Shape};

#[cfg(feature = "derive")]
pub use seedjson_derive::Record;
