//! Declared-type descriptors: what the type resolver and the seeds know about
//! a target type.
//!
//! A [`DeclaredType`] describes the statically declared shape of a field,
//! element or map value. It is produced by [`Reconstruct::declared_type`] and
//! never requires reflection: records list their constructor parameters
//! through the [`Record`] trait (hand-written or `#[derive(Record)]`), and the
//! container impls below carry their element types.
//!
//! Values travel between seeds type-erased as [`AnyValue`] and are downcast
//! back to the declared Rust type by the function pointers stored here, so a
//! descriptor and the value it produces always agree.

use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use crate::convert::FromScalar;
use crate::error::{Result, SeedError};
use crate::token::Scalar;

/// A fully built value whose concrete type is known only to its descriptor.
pub type AnyValue = Box<dyn Any>;

type ScalarFn = Rc<dyn Fn(&Scalar) -> Result<Converted>>;
type FinishFn = Rc<dyn Fn(AnyValue) -> Result<AnyValue>>;
type AbsentFn = Rc<dyn Fn() -> Result<AnyValue>>;

/// A type that can be the target of deserialization, or a field, element or
/// map value inside one.
pub trait Reconstruct: Sized + 'static {
    fn declared_type() -> DeclaredType;
}

/// A structured record built by a single constructor call once all of its
/// arguments are known.
pub trait Record: Sized + 'static {
    /// Constructor parameters, in declaration order.
    fn parameters() -> Vec<Param>;

    /// Build the record. Every required parameter is present in `args`.
    fn construct(args: &mut Arguments) -> Result<Self>;
}

/// A scalar after conversion to its parameter's type.
///
/// Stored as a thunk so every `spawn` can hand out a fresh value without
/// re-reading the source.
#[derive(Clone)]
pub struct Converted(Rc<dyn Fn() -> Result<AnyValue>>);

impl Converted {
    pub fn new<T: Clone + 'static>(value: T) -> Self {
        Converted(Rc::new(move || -> Result<AnyValue> { Ok(Box::new(value.clone())) }))
    }

    fn from_fn(f: impl Fn() -> Result<AnyValue> + 'static) -> Self {
        Converted(Rc::new(f))
    }

    pub fn materialize(&self) -> Result<AnyValue> {
        (self.0)()
    }

    fn map<T: 'static, U: 'static>(self, f: fn(T) -> U) -> Self {
        Converted(Rc::new(move || -> Result<AnyValue> {
            let inner = downcast::<T>(self.materialize()?)?;
            Ok(Box::new(f(inner)) as AnyValue)
        }))
    }
}

impl fmt::Debug for Converted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Converted(..)")
    }
}

/// The shape half of a [`DeclaredType`]; this is what the resolver dispatches on.
#[derive(Clone)]
pub enum Shape {
    Scalar,
    Record(RecordType),
    Sequence(SequenceType),
    Mapping(MappingType),
}

impl Shape {
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Scalar => "scalar",
            Shape::Record(_) => "record",
            Shape::Sequence(_) => "sequence",
            Shape::Mapping(_) => "mapping",
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// Record half of a [`Shape`]: parameter list and constructor.
#[derive(Clone, Copy)]
pub struct RecordType {
    pub(crate) type_id: TypeId,
    pub(crate) name: &'static str,
    pub(crate) parameters: fn() -> Vec<Param>,
    pub(crate) construct: fn(&mut Arguments) -> Result<AnyValue>,
}

/// Element type is `None` for an erased container.
#[derive(Clone, Copy)]
pub struct SequenceType {
    pub(crate) element: Option<fn() -> DeclaredType>,
    pub(crate) assemble: fn(Vec<AnyValue>) -> Result<AnyValue>,
}

/// Value type is `None` for an erased container. Keys are always strings.
#[derive(Clone, Copy)]
pub struct MappingType {
    pub(crate) value: Option<fn() -> DeclaredType>,
    pub(crate) assemble: fn(Vec<(String, AnyValue)>) -> Result<AnyValue>,
}

/// Runtime descriptor of a declared type.
#[derive(Clone)]
pub struct DeclaredType {
    name: &'static str,
    shape: Shape,
    from_scalar: Option<ScalarFn>,
    finish: Option<FinishFn>,
    when_absent: Option<AbsentFn>,
}

impl fmt::Debug for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeclaredType")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("accepts_scalar", &self.from_scalar.is_some())
            .field("required", &self.when_absent.is_none())
            .finish()
    }
}

impl DeclaredType {
    /// A leaf type converted from a single JSON scalar.
    pub fn scalar<T: FromScalar + Clone + 'static>() -> Self {
        let from_scalar: ScalarFn = Rc::new(|scalar: &Scalar| -> Result<Converted> {
            T::from_scalar(scalar).map(Converted::new)
        });
        Self {
            name: type_name::<T>(),
            shape: Shape::Scalar,
            from_scalar: Some(from_scalar),
            finish: None,
            when_absent: None,
        }
    }

    pub fn record<R: Record>() -> Self {
        Self {
            name: type_name::<R>(),
            shape: Shape::Record(RecordType {
                type_id: TypeId::of::<R>(),
                name: type_name::<R>(),
                parameters: R::parameters,
                construct: construct_record::<R>,
            }),
            from_scalar: None,
            finish: None,
            when_absent: None,
        }
    }

    /// An ordered container `C` of `E`.
    pub fn sequence<E: Reconstruct, C: FromIterator<E> + 'static>() -> Self {
        Self::composite::<C>(Shape::Sequence(SequenceType {
            element: Some(E::declared_type),
            assemble: assemble_sequence::<E, C>,
        }))
    }

    /// A string-keyed container `M` of `V`.
    pub fn mapping<V: Reconstruct, M: FromIterator<(String, V)> + 'static>() -> Self {
        Self::composite::<M>(Shape::Mapping(MappingType {
            value: Some(V::declared_type),
            assemble: assemble_mapping::<V, M>,
        }))
    }

    /// A sequence whose element type is not known. Resolving it fails with
    /// `UnsupportedType`.
    pub fn erased_sequence(name: &'static str) -> Self {
        Self {
            name,
            shape: Shape::Sequence(SequenceType {
                element: None,
                assemble: |_| Err(SeedError::Protocol {
                    detail: "erased sequence cannot be assembled",
                }),
            }),
            from_scalar: None,
            finish: None,
            when_absent: None,
        }
    }

    /// A mapping whose value type is not known. Resolving it fails with
    /// `UnsupportedType`.
    pub fn erased_mapping(name: &'static str) -> Self {
        Self {
            name,
            shape: Shape::Mapping(MappingType {
                value: None,
                assemble: |_| Err(SeedError::Protocol {
                    detail: "erased mapping cannot be assembled",
                }),
            }),
            from_scalar: None,
            finish: None,
            when_absent: None,
        }
    }

    fn composite<T: 'static>(shape: Shape) -> Self {
        Self {
            name: type_name::<T>(),
            shape,
            from_scalar: None,
            finish: None,
            when_absent: None,
        }
    }

    /// Same shape, but every produced `T` is passed through `f`.
    pub fn wrap<T: 'static, U: 'static>(self, f: fn(T) -> U) -> Self {
        let from_scalar = self.from_scalar.map(|convert| -> ScalarFn {
            Rc::new(move |scalar: &Scalar| -> Result<Converted> { Ok(convert(scalar)?.map(f)) })
        });
        let finish = if matches!(self.shape, Shape::Scalar) {
            None
        } else {
            let previous = self.finish;
            let finish: FinishFn = Rc::new(move |value: AnyValue| -> Result<AnyValue> {
                let value = match &previous {
                    Some(previous) => previous(value)?,
                    None => value,
                };
                Ok(Box::new(f(downcast::<T>(value)?)) as AnyValue)
            });
            Some(finish)
        };
        let when_absent = self.when_absent.map(|absent| -> AbsentFn {
            Rc::new(move || -> Result<AnyValue> { Ok(Box::new(f(downcast::<T>(absent()?)?)) as AnyValue) })
        });
        Self {
            name: type_name::<U>(),
            shape: self.shape,
            from_scalar,
            finish,
            when_absent,
        }
    }

    /// `Option<T>` around `T`'s descriptor: `null` and an absent parameter both
    /// become `None`.
    pub fn optional<T: 'static>(self) -> Self {
        let inner = self.wrap::<T, Option<T>>(Some);
        let name = inner.name;
        let convert = inner.from_scalar.clone();
        let from_scalar: ScalarFn = Rc::new(move |scalar: &Scalar| -> Result<Converted> {
            match (scalar, &convert) {
                (Scalar::Null, _) => Ok(Converted::from_fn(|| Ok(Box::new(None::<T>) as AnyValue))),
                (_, Some(convert)) => convert(scalar),
                (_, None) => Err(SeedError::mismatch(
                    name,
                    format!("{} found where a composite value is expected", scalar.kind()),
                )),
            }
        });
        let when_absent: AbsentFn = Rc::new(|| -> Result<AnyValue> { Ok(Box::new(None::<T>)) });
        Self {
            from_scalar: Some(from_scalar),
            when_absent: Some(when_absent),
            ..inner
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.shape, Shape::Scalar)
    }

    /// Run this type's scalar converter. `owner` names the seed asking, for
    /// the error raised when the type takes no scalars at all.
    pub(crate) fn convert(&self, owner: &str, scalar: &Scalar) -> Result<Converted> {
        match &self.from_scalar {
            Some(convert) => convert(scalar),
            None => Err(SeedError::mismatch(
                owner,
                format!(
                    "{} found where composite {} is expected",
                    scalar.kind(),
                    self.name
                ),
            )),
        }
    }

    /// Post-process a value spawned by a child seed of this type.
    pub(crate) fn finish(&self, value: AnyValue) -> Result<AnyValue> {
        match &self.finish {
            Some(finish) => finish(value),
            None => Ok(value),
        }
    }

    /// The value used when a parameter of this type is never supplied, or
    /// `None` when such a parameter is required.
    pub(crate) fn absent(&self) -> Option<Result<AnyValue>> {
        self.when_absent.as_ref().map(|absent| absent())
    }
}

/// One constructor parameter: the JSON member name it matches and its declared type.
#[derive(Debug, Clone)]
pub struct Param {
    name: &'static str,
    declared: DeclaredType,
}

impl Param {
    pub fn new<T: Reconstruct>(name: &'static str) -> Self {
        Self::with_type(name, T::declared_type())
    }

    pub fn with_type(name: &'static str, declared: DeclaredType) -> Self {
        Self { name, declared }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn declared_type(&self) -> &DeclaredType {
        &self.declared
    }

    pub fn is_required(&self) -> bool {
        self.declared.when_absent.is_none()
    }
}

/// The complete argument set handed to [`Record::construct`], keyed by
/// parameter name.
pub struct Arguments {
    owner: &'static str,
    values: HashMap<&'static str, AnyValue>,
}

impl Arguments {
    pub(crate) fn new(owner: &'static str) -> Self {
        Self {
            owner,
            values: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, name: &'static str, value: AnyValue) {
        self.values.insert(name, value);
    }

    /// Remove the argument for `name` and downcast it to `T`.
    pub fn take<T: 'static>(&mut self, name: &str) -> Result<T> {
        let value = self
            .values
            .remove(name)
            .ok_or_else(|| SeedError::MissingArgument {
                type_name: self.owner.to_string(),
                parameter: name.to_string(),
            })?;
        downcast(value)
    }
}

pub(crate) fn downcast<T: 'static>(value: AnyValue) -> Result<T> {
    value.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
        SeedError::mismatch(
            type_name::<T>(),
            "descriptor produced a value of a different type",
        )
    })
}

fn construct_record<R: Record>(args: &mut Arguments) -> Result<AnyValue> {
    Ok(Box::new(R::construct(args)?) as AnyValue)
}

fn assemble_sequence<E: 'static, C: FromIterator<E> + 'static>(
    items: Vec<AnyValue>,
) -> Result<AnyValue> {
    let collected = items
        .into_iter()
        .map(downcast::<E>)
        .collect::<Result<C>>()?;
    Ok(Box::new(collected) as AnyValue)
}

fn assemble_mapping<V: 'static, M: FromIterator<(String, V)> + 'static>(
    entries: Vec<(String, AnyValue)>,
) -> Result<AnyValue> {
    let collected = entries
        .into_iter()
        .map(|(key, value)| Ok((key, downcast::<V>(value)?)))
        .collect::<Result<M>>()?;
    Ok(Box::new(collected) as AnyValue)
}

impl<T: Reconstruct> Reconstruct for Option<T> {
    fn declared_type() -> DeclaredType {
        T::declared_type().optional::<T>()
    }
}

impl<T: Reconstruct> Reconstruct for Box<T> {
    fn declared_type() -> DeclaredType {
        T::declared_type().wrap::<T, Box<T>>(Box::new)
    }
}

impl<E: Reconstruct> Reconstruct for Vec<E> {
    fn declared_type() -> DeclaredType {
        DeclaredType::sequence::<E, Vec<E>>()
    }
}

impl<E: Reconstruct> Reconstruct for VecDeque<E> {
    fn declared_type() -> DeclaredType {
        DeclaredType::sequence::<E, VecDeque<E>>()
    }
}

impl<V: Reconstruct> Reconstruct for HashMap<String, V> {
    fn declared_type() -> DeclaredType {
        DeclaredType::mapping::<V, HashMap<String, V>>()
    }
}

impl<V: Reconstruct> Reconstruct for BTreeMap<String, V> {
    fn declared_type() -> DeclaredType {
        DeclaredType::mapping::<V, BTreeMap<String, V>>()
    }
}
