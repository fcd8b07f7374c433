//! Type resolver: picks the seed variant that reconstructs a declared type.
//!
//! | declared shape               | seed                   |
//! |------------------------------|------------------------|
//! | sequence of scalar `E`       | `ValueCollectionSeed`  |
//! | sequence of composite `E`    | `ObjectCollectionSeed` |
//! | string-keyed mapping to `V`  | `MapSeed`              |
//! | record                       | `ObjectSeed`           |
//!
//! Containers must carry their element type; an erased container is rejected
//! with `UnsupportedType`. A scalar type has no seed at all, so asking for one
//! means a composite JSON value met a scalar declaration.

use crate::error::{Result, SeedError};
use crate::metadata::TypeMetadata;
use crate::seed::{MapSeed, ObjectCollectionSeed, ObjectSeed, Seed, ValueCollectionSeed};
use crate::types::{DeclaredType, Shape};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedKind {
    Object,
    ObjectCollection,
    ValueCollection,
    Map,
}

fn unsupported(declared: &DeclaredType) -> SeedError {
    SeedError::UnsupportedType {
        type_name: declared.name().to_string(),
    }
}

fn scalar_target(declared: &DeclaredType) -> SeedError {
    SeedError::mismatch(
        declared.name(),
        "composite value found where a scalar is expected",
    )
}

/// Which seed variant `declared` needs, without building it.
pub fn classify(declared: &DeclaredType) -> Result<SeedKind> {
    match declared.shape() {
        Shape::Sequence(sequence) => {
            let element = sequence.element.ok_or_else(|| unsupported(declared))?;
            if element().is_scalar() {
                Ok(SeedKind::ValueCollection)
            } else {
                Ok(SeedKind::ObjectCollection)
            }
        }
        Shape::Mapping(mapping) => {
            mapping.value.ok_or_else(|| unsupported(declared))?;
            Ok(SeedKind::Map)
        }
        Shape::Record(_) => Ok(SeedKind::Object),
        Shape::Scalar => Err(scalar_target(declared)),
    }
}

/// Build the empty seed that reconstructs `declared`.
pub fn resolve<'m>(declared: &DeclaredType, metadata: &'m TypeMetadata) -> Result<Seed<'m>> {
    match declared.shape() {
        Shape::Sequence(sequence) => {
            let element = (sequence.element.ok_or_else(|| unsupported(declared))?)();
            if element.is_scalar() {
                Ok(Seed::ValueCollection(ValueCollectionSeed::new(
                    declared.name(),
                    element,
                    sequence.assemble,
                )))
            } else {
                Ok(Seed::ObjectCollection(ObjectCollectionSeed::new(
                    metadata,
                    declared.name(),
                    element,
                    sequence.assemble,
                )))
            }
        }
        Shape::Mapping(mapping) => {
            let value = (mapping.value.ok_or_else(|| unsupported(declared))?)();
            Ok(Seed::Map(MapSeed::new(
                metadata,
                declared.name(),
                value,
                mapping.assemble,
            )))
        }
        Shape::Record(record) => Ok(Seed::Object(ObjectSeed::new(
            metadata,
            metadata.record(record),
        ))),
        Shape::Scalar => Err(scalar_target(declared)),
    }
}
