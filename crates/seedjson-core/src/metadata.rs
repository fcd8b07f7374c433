//! Type metadata provider: per-record constructor parameters, cached by `TypeId`.
//!
//! Seeds hold a shared `&TypeMetadata` so nested records resolve their
//! parameter lists once per provider rather than once per object in the
//! document.

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::Result;
use crate::types::{AnyValue, Arguments, Param, RecordType};

/// Everything an `ObjectSeed` needs to know about its record type.
pub struct RecordMetadata {
    type_name: &'static str,
    params: Vec<Param>,
    by_name: HashMap<&'static str, usize>,
    construct: fn(&mut Arguments) -> Result<AnyValue>,
}

impl RecordMetadata {
    fn load(record: &RecordType) -> Self {
        let params = (record.parameters)();
        let mut by_name = HashMap::with_capacity(params.len());
        for (index, param) in params.iter().enumerate() {
            by_name.entry(param.name()).or_insert(index);
        }
        Self {
            type_name: record.name,
            params,
            by_name,
            construct: record.construct,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Index of the parameter matching a JSON member name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn construct(&self, args: &mut Arguments) -> Result<AnyValue> {
        (self.construct)(args)
    }
}

/// Caching provider of [`RecordMetadata`].
///
/// Uses interior mutability so a single `&TypeMetadata` can be shared by every
/// seed of one deserialization; it is therefore neither `Sync` nor meant to be
/// shared across threads.
#[derive(Default)]
pub struct TypeMetadata {
    records: RefCell<HashMap<TypeId, Rc<RecordMetadata>>>,
}

impl TypeMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, record: &RecordType) -> Rc<RecordMetadata> {
        if let Some(cached) = self.records.borrow().get(&record.type_id) {
            return Rc::clone(cached);
        }
        let loaded = Rc::new(RecordMetadata::load(record));
        self.records
            .borrow_mut()
            .insert(record.type_id, Rc::clone(&loaded));
        loaded
    }

    /// Number of record types described so far.
    pub fn cached_records(&self) -> usize {
        self.records.borrow().len()
    }
}
