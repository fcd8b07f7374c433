//! Derive macro for the seedjson-core `Record` trait.
//!
//! `#[derive(Record)]` on a struct with named fields generates:
//! - `impl Record`: one constructor parameter per field, named after the
//!   field, and a `construct` that takes every argument by name;
//! - `impl Reconstruct`: declares the struct as a record type.
//!
//! Every field type must implement `Reconstruct`. Field names are used as-is
//! (raw identifiers lose their `r#` prefix); there are no renaming attributes.
//!
//! # Usage
//!
//! ```ignore
//! use seedjson_core::Record;
//!
//! #[derive(Record)]
//! struct Sample {
//!     label: String,
//!     weight: f64,
//!     tags: Option<Vec<String>>,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod expand;

#[proc_macro_derive(Record)]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand::expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
