//! The seed stack machine and the public deserialization entry points.
//!
//! [`SeedStack`] adapts parser callbacks to seed operations:
//!
//! - `enter_object`/`enter_array`: the stack top creates a child seed for the
//!   member name and the child is pushed. Objects and arrays are treated the
//!   same here; the declared type of the member decides what the child is.
//! - `leave_object`/`leave_array`: the top is popped and attached to its parent.
//! - `visit_property`: the stack top stores a scalar.
//! - `visit_array_element`: same, with an empty name.
//!
//! The root seed is resolved up front and pushed on the root's enter event,
//! so the stack depth always equals the JSON nesting depth.

use std::any::type_name;
use std::io::Read;

use tracing::{debug, trace};

use crate::callback::ParseCallback;
use crate::error::{Result, SeedError};
use crate::metadata::TypeMetadata;
use crate::options::Options;
use crate::parser::Parser;
use crate::resolver::resolve;
use crate::seed::{Seed, Slot};
use crate::token::Scalar;
use crate::types::{downcast, AnyValue, Converted, DeclaredType, Reconstruct};

struct Frame<'m> {
    seed: Seed<'m>,
    /// `None` for the root.
    slot: Option<Slot>,
}

enum Root<'m> {
    /// Nothing parsed yet. Holds the root seed unless the target is a scalar type.
    Awaiting(Option<Seed<'m>>),
    /// The root composite is on the stack.
    Open,
    Composite(Seed<'m>),
    Scalar(Converted),
}

/// Turns parse events into seed operations, one frame per open composite.
pub struct SeedStack<'m> {
    metadata: &'m TypeMetadata,
    target: DeclaredType,
    root: Root<'m>,
    frames: Vec<Frame<'m>>,
}

impl<'m> SeedStack<'m> {
    /// Resolve the root seed for `target`. Fails before any input is read if
    /// the target cannot be reconstructed (e.g. an erased container).
    pub fn new(metadata: &'m TypeMetadata, target: DeclaredType) -> Result<Self> {
        let seed = if target.is_scalar() {
            None
        } else {
            Some(resolve(&target, metadata)?)
        };
        Ok(Self {
            metadata,
            target,
            root: Root::Awaiting(seed),
            frames: Vec::new(),
        })
    }

    pub fn metadata(&self) -> &'m TypeMetadata {
        self.metadata
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn top(&mut self) -> Result<&mut Seed<'m>> {
        self.frames
            .last_mut()
            .map(|frame| &mut frame.seed)
            .ok_or(SeedError::Protocol {
                detail: "event received outside the root value",
            })
    }

    fn enter(&mut self, name: Option<&str>) -> Result<()> {
        let frame = if self.frames.is_empty() {
            match std::mem::replace(&mut self.root, Root::Open) {
                Root::Awaiting(Some(seed)) => Frame { seed, slot: None },
                Root::Awaiting(None) => {
                    return Err(SeedError::mismatch(
                        self.target.name(),
                        "composite found where scalar root expected",
                    ))
                }
                _ => {
                    return Err(SeedError::Protocol {
                        detail: "second root value",
                    })
                }
            }
        } else {
            let child = self.top()?.create_composite_property(name.unwrap_or(""))?;
            Frame {
                seed: child.seed,
                slot: Some(child.slot),
            }
        };
        self.frames.push(frame);
        trace!(depth = self.frames.len(), name = name.unwrap_or(""), "seed pushed");
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        let frame = self.frames.pop().ok_or(SeedError::Protocol {
            detail: "leave without matching enter",
        })?;
        trace!(depth = self.frames.len(), "seed popped");
        match frame.slot {
            Some(slot) => self.top()?.attach(slot, frame.seed),
            None => {
                self.root = Root::Composite(frame.seed);
                Ok(())
            }
        }
    }

    /// Materialize the root value. Only valid once the whole document has
    /// parsed; may be called more than once.
    pub fn spawn(&self) -> Result<AnyValue> {
        match &self.root {
            Root::Composite(seed) => self.target.finish(seed.spawn()?),
            Root::Scalar(converted) => converted.materialize(),
            Root::Awaiting(_) | Root::Open => Err(SeedError::Protocol {
                detail: "spawn before the root value completed",
            }),
        }
    }
}

impl ParseCallback for SeedStack<'_> {
    fn enter_object(&mut self, name: Option<&str>) -> Result<()> {
        self.enter(name)
    }

    fn leave_object(&mut self) -> Result<()> {
        self.leave()
    }

    fn enter_array(&mut self, name: Option<&str>) -> Result<()> {
        self.enter(name)
    }

    fn leave_array(&mut self) -> Result<()> {
        self.leave()
    }

    fn visit_property(&mut self, name: &str, value: Scalar) -> Result<()> {
        self.top()?.set_simple_property(name, value)
    }

    fn visit_array_element(&mut self, value: Scalar) -> Result<()> {
        if !self.frames.is_empty() {
            return self.top()?.set_simple_property("", value);
        }
        match self.root {
            Root::Awaiting(_) => {
                let converted = self.target.convert(self.target.name(), &value)?;
                self.root = Root::Scalar(converted);
                Ok(())
            }
            _ => Err(SeedError::Protocol {
                detail: "second root value",
            }),
        }
    }
}

/// Reusable deserializer. Keeps its type metadata cache between calls.
///
/// Not `Sync`: the metadata cache uses interior mutability.
#[derive(Default)]
pub struct Deserializer {
    metadata: TypeMetadata,
    options: Options,
}

impl Deserializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Options) -> Self {
        Self {
            metadata: TypeMetadata::new(),
            options,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn metadata(&self) -> &TypeMetadata {
        &self.metadata
    }

    pub fn deserialize<T: Reconstruct>(&self, input: &str) -> Result<T> {
        self.deserialize_chars(input.chars())
    }

    /// Deserialize from a lazily produced character stream.
    pub fn deserialize_chars<T, I>(&self, chars: I) -> Result<T>
    where
        T: Reconstruct,
        I: IntoIterator<Item = char>,
    {
        debug!(target_type = type_name::<T>(), "deserializing");
        let result = self.run(T::declared_type(), chars.into_iter()).and_then(downcast::<T>);
        if let Err(err) = &result {
            debug!(target_type = type_name::<T>(), error = %err, "deserialization failed");
        }
        result
    }

    pub fn deserialize_reader<T: Reconstruct, R: Read>(&self, mut reader: R) -> Result<T> {
        let mut input = String::new();
        reader.read_to_string(&mut input)?;
        self.deserialize(&input)
    }

    fn run<I: Iterator<Item = char>>(&self, target: DeclaredType, chars: I) -> Result<AnyValue> {
        let mut stack = SeedStack::new(&self.metadata, target)?;
        Parser::new(chars, &self.options).parse(&mut stack)?;
        stack.spawn()
    }
}

/// Deserialize `input` into `T` with default options.
pub fn deserialize<T: Reconstruct>(input: &str) -> Result<T> {
    Deserializer::new().deserialize(input)
}

pub fn deserialize_with<T: Reconstruct>(input: &str, options: &Options) -> Result<T> {
    Deserializer::with_options(options.clone()).deserialize(input)
}

/// Deserialize everything `reader` yields into `T` with default options.
pub fn from_reader<T: Reconstruct, R: Read>(reader: R) -> Result<T> {
    Deserializer::new().deserialize_reader(reader)
}
