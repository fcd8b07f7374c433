//! Seeds: in-progress builders, one per JSON composite, materialized by `spawn`.
//!
//! Construction is two-phase. While parsing, a seed only accumulates pending
//! values (converted scalars and child seeds). Nothing is constructed until
//! `spawn`, which recursively spawns children first and then makes a single
//! constructor or collection call. `spawn` takes `&self` and is pure given
//! the accumulated state, so it can run any number of times.
//!
//! A child seed is created by its parent (`create_composite_property`), lives
//! on the driver's stack while its JSON value is open, and is handed back to
//! the parent with `attach` when that value closes. The [`Slot`] returned at
//! creation says where the child goes.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::{Result, SeedError};
use crate::metadata::{RecordMetadata, TypeMetadata};
use crate::resolver::{resolve, SeedKind};
use crate::token::Scalar;
use crate::types::{AnyValue, Arguments, Converted, DeclaredType};

/// Where a finished child seed belongs in its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Constructor parameter, by index in the record's parameter list.
    Parameter(usize),
    /// Next element of an object collection.
    Element,
    /// Map entry.
    Key(String),
}

/// A freshly created child seed and the slot it fills once complete.
pub struct Child<'m> {
    pub seed: Seed<'m>,
    pub slot: Slot,
}

/// A pending value of one of the four seed kinds.
pub enum Seed<'m> {
    Object(ObjectSeed<'m>),
    ObjectCollection(ObjectCollectionSeed<'m>),
    ValueCollection(ValueCollectionSeed),
    Map(MapSeed<'m>),
}

impl<'m> Seed<'m> {
    pub fn kind(&self) -> SeedKind {
        match self {
            Seed::Object(_) => SeedKind::Object,
            Seed::ObjectCollection(_) => SeedKind::ObjectCollection,
            Seed::ValueCollection(_) => SeedKind::ValueCollection,
            Seed::Map(_) => SeedKind::Map,
        }
    }

    /// Record a scalar member (or, with an empty name, a scalar array element).
    pub fn set_simple_property(&mut self, name: &str, value: Scalar) -> Result<()> {
        match self {
            Seed::Object(seed) => seed.set_simple_property(name, value),
            Seed::ObjectCollection(seed) => Err(SeedError::mismatch(
                seed.owner,
                format!("scalar {value} found where composite element expected"),
            )),
            Seed::ValueCollection(seed) => seed.push(value),
            Seed::Map(seed) => {
                seed.set_simple_property(name, value);
                Ok(())
            }
        }
    }

    /// Create the child seed for a composite member or element called `name`.
    pub fn create_composite_property(&mut self, name: &str) -> Result<Child<'m>> {
        match self {
            Seed::Object(seed) => seed.create_composite_property(name),
            Seed::ObjectCollection(seed) => Ok(Child {
                seed: resolve(&seed.element, seed.metadata)?,
                slot: Slot::Element,
            }),
            Seed::ValueCollection(seed) => Err(SeedError::mismatch(
                seed.owner,
                "composite found where scalar element expected",
            )),
            Seed::Map(seed) => seed.create_composite_property(name),
        }
    }

    /// Take back a completed child created by `create_composite_property`.
    pub fn attach(&mut self, slot: Slot, child: Seed<'m>) -> Result<()> {
        match (self, slot) {
            (Seed::Object(seed), Slot::Parameter(index)) => {
                seed.scalars.remove(&index);
                seed.composites.insert(index, child);
            }
            (Seed::ObjectCollection(seed), Slot::Element) => seed.children.push(child),
            (Seed::Map(seed), Slot::Key(key)) => {
                seed.composites.insert(key, child);
            }
            _ => {
                return Err(SeedError::Protocol {
                    detail: "child seed attached to a slot its parent does not have",
                })
            }
        }
        Ok(())
    }

    pub fn spawn(&self) -> Result<AnyValue> {
        match self {
            Seed::Object(seed) => seed.spawn(),
            Seed::ObjectCollection(seed) => seed.spawn(),
            Seed::ValueCollection(seed) => seed.spawn(),
            Seed::Map(seed) => seed.spawn(),
        }
    }
}

/// Pending construction of one record.
///
/// Scalars are converted on arrival; a later write to the same parameter,
/// scalar or composite, replaces the earlier one.
pub struct ObjectSeed<'m> {
    metadata: &'m TypeMetadata,
    record: Rc<RecordMetadata>,
    scalars: BTreeMap<usize, Converted>,
    composites: BTreeMap<usize, Seed<'m>>,
}

impl<'m> ObjectSeed<'m> {
    pub fn new(metadata: &'m TypeMetadata, record: Rc<RecordMetadata>) -> Self {
        Self {
            metadata,
            record,
            scalars: BTreeMap::new(),
            composites: BTreeMap::new(),
        }
    }

    fn param_index(&self, name: &str) -> Result<usize> {
        self.record
            .index_of(name)
            .ok_or_else(|| SeedError::UnknownProperty {
                type_name: self.record.type_name().to_string(),
                name: name.to_string(),
            })
    }

    fn set_simple_property(&mut self, name: &str, value: Scalar) -> Result<()> {
        let index = self.param_index(name)?;
        let declared = self.record.params()[index].declared_type();
        let converted = declared.convert(self.record.type_name(), &value)?;
        self.composites.remove(&index);
        self.scalars.insert(index, converted);
        Ok(())
    }

    fn create_composite_property(&mut self, name: &str) -> Result<Child<'m>> {
        let index = self.param_index(name)?;
        let declared = self.record.params()[index].declared_type();
        if declared.is_scalar() {
            return Err(SeedError::mismatch(
                self.record.type_name(),
                format!(
                    "composite found where scalar parameter `{name}` ({}) expected",
                    declared.name()
                ),
            ));
        }
        Ok(Child {
            seed: resolve(declared, self.metadata)?,
            slot: Slot::Parameter(index),
        })
    }

    fn spawn(&self) -> Result<AnyValue> {
        let mut args = Arguments::new(self.record.type_name());
        for (index, param) in self.record.params().iter().enumerate() {
            let declared = param.declared_type();
            let value = if let Some(child) = self.composites.get(&index) {
                declared.finish(child.spawn()?)?
            } else if let Some(converted) = self.scalars.get(&index) {
                converted.materialize()?
            } else if let Some(absent) = declared.absent() {
                absent?
            } else {
                return Err(SeedError::MissingArgument {
                    type_name: self.record.type_name().to_string(),
                    parameter: param.name().to_string(),
                });
            };
            args.insert(param.name(), value);
        }
        self.record.construct(&mut args)
    }
}

/// Ordered elements that are themselves composites.
pub struct ObjectCollectionSeed<'m> {
    metadata: &'m TypeMetadata,
    owner: &'static str,
    element: DeclaredType,
    assemble: fn(Vec<AnyValue>) -> Result<AnyValue>,
    children: Vec<Seed<'m>>,
}

impl<'m> ObjectCollectionSeed<'m> {
    pub fn new(
        metadata: &'m TypeMetadata,
        owner: &'static str,
        element: DeclaredType,
        assemble: fn(Vec<AnyValue>) -> Result<AnyValue>,
    ) -> Self {
        Self {
            metadata,
            owner,
            element,
            assemble,
            children: Vec::new(),
        }
    }

    fn spawn(&self) -> Result<AnyValue> {
        let items = self
            .children
            .iter()
            .map(|child| self.element.finish(child.spawn()?))
            .collect::<Result<Vec<_>>>()?;
        (self.assemble)(items)
    }
}

/// Ordered scalar elements.
pub struct ValueCollectionSeed {
    owner: &'static str,
    element: DeclaredType,
    assemble: fn(Vec<AnyValue>) -> Result<AnyValue>,
    values: Vec<Converted>,
}

impl ValueCollectionSeed {
    pub fn new(
        owner: &'static str,
        element: DeclaredType,
        assemble: fn(Vec<AnyValue>) -> Result<AnyValue>,
    ) -> Self {
        Self {
            owner,
            element,
            assemble,
            values: Vec::new(),
        }
    }

    fn push(&mut self, value: Scalar) -> Result<()> {
        self.values.push(self.element.convert(self.owner, &value)?);
        Ok(())
    }

    fn spawn(&self) -> Result<AnyValue> {
        let items = self
            .values
            .iter()
            .map(Converted::materialize)
            .collect::<Result<Vec<_>>>()?;
        (self.assemble)(items)
    }
}

/// String-keyed entries.
///
/// Scalars are kept raw and converted at spawn: when a key holds both a
/// scalar and a composite, the composite wins and the scalar is never
/// converted.
pub struct MapSeed<'m> {
    metadata: &'m TypeMetadata,
    owner: &'static str,
    value: DeclaredType,
    assemble: fn(Vec<(String, AnyValue)>) -> Result<AnyValue>,
    scalars: BTreeMap<String, Scalar>,
    composites: BTreeMap<String, Seed<'m>>,
}

impl<'m> MapSeed<'m> {
    pub fn new(
        metadata: &'m TypeMetadata,
        owner: &'static str,
        value: DeclaredType,
        assemble: fn(Vec<(String, AnyValue)>) -> Result<AnyValue>,
    ) -> Self {
        Self {
            metadata,
            owner,
            value,
            assemble,
            scalars: BTreeMap::new(),
            composites: BTreeMap::new(),
        }
    }

    fn set_simple_property(&mut self, key: &str, value: Scalar) {
        self.scalars.insert(key.to_string(), value);
    }

    fn create_composite_property(&mut self, key: &str) -> Result<Child<'m>> {
        if self.value.is_scalar() {
            return Err(SeedError::mismatch(
                self.owner,
                format!("composite found where scalar value expected for key `{key}`"),
            ));
        }
        Ok(Child {
            seed: resolve(&self.value, self.metadata)?,
            slot: Slot::Key(key.to_string()),
        })
    }

    fn spawn(&self) -> Result<AnyValue> {
        let mut entries = BTreeMap::new();
        for (key, scalar) in &self.scalars {
            if self.composites.contains_key(key) {
                continue;
            }
            let value = self.value.convert(self.owner, scalar)?.materialize()?;
            entries.insert(key.clone(), value);
        }
        for (key, child) in &self.composites {
            entries.insert(key.clone(), self.value.finish(child.spawn()?)?);
        }
        (self.assemble)(entries.into_iter().collect())
    }
}
