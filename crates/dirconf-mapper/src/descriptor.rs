use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use dirconf_types::{RawValue, CN};

use crate::codec::AttributeValue;
use crate::error::{CodecResult, MapperError, MapperResult};

type Getter<E> = Arc<dyn Fn(&E) -> RawValue + Send + Sync>;
type Setter<B> = Arc<dyn Fn(&mut B, &RawValue) -> CodecResult<()> + Send + Sync>;
type Construct<B> = Arc<dyn Fn(&CtorArgs) -> MapperResult<B> + Send + Sync>;
type Seal<E, B> = Arc<dyn Fn(B) -> MapperResult<E> + Send + Sync>;

/// How one stored attribute relates to an entity type `E` built through the
/// intermediate (builder) type `B`.
///
/// A new mapping is settable and updatable. Use [`create_only`] for
/// attributes that are written once (such as the name) and [`read_only`] for
/// attributes the application never writes.
///
/// [`create_only`]: AttributeMapping::create_only
/// [`read_only`]: AttributeMapping::read_only
pub struct AttributeMapping<E, B> {
    name: &'static str,
    ctor_position: Option<usize>,
    settable: bool,
    updatable: bool,
    get: Getter<E>,
    set: Option<Setter<B>>,
}

impl<E: 'static, B: 'static> AttributeMapping<E, B> {
    pub fn new(
        name: &'static str,
        get: impl Fn(&E) -> RawValue + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            ctor_position: None,
            settable: true,
            updatable: true,
            get: Arc::new(get),
            set: None,
        }
    }

    /// An attribute reachable only through point access
    /// (`get_property` / `set_property`). It is never part of the entity.
    pub fn property(name: &'static str) -> Self {
        Self::new(name, |_: &E| RawValue::empty()).read_only()
    }

    /// Pass this attribute to the constructor at `position`.
    pub fn ctor(mut self, position: usize) -> Self {
        self.ctor_position = Some(position);
        self
    }

    /// Written on create, never replaced afterwards.
    pub fn create_only(mut self) -> Self {
        self.updatable = false;
        self
    }

    /// Never written by the application.
    pub fn read_only(mut self) -> Self {
        self.settable = false;
        self.updatable = false;
        self
    }

    /// Apply the stored value to the builder after construction.
    ///
    /// The setter is called with the stored value even when it is empty.
    pub fn setter(
        mut self,
        set: impl Fn(&mut B, &RawValue) -> CodecResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.set = Some(Arc::new(set));
        self
    }

    /// Typed variant of [`setter`](Self::setter): decode as `T`, then apply.
    pub fn set_with<T: AttributeValue + 'static>(
        self,
        apply: impl Fn(&mut B, T) + Send + Sync + 'static,
    ) -> Self {
        self.setter(move |builder, raw| {
            apply(builder, T::decode(raw)?);
            Ok(())
        })
    }

    /// Re-target this mapping at a wrapper type that embeds `E` and `B`.
    pub fn lift<W: 'static, WB: 'static>(
        self,
        outer: fn(&W) -> &E,
        inner: fn(&mut WB) -> &mut B,
    ) -> AttributeMapping<W, WB> {
        let get = self.get;
        let set = self.set.map(|set| -> Setter<WB> {
            Arc::new(move |wrapper: &mut WB, raw: &RawValue| set(inner(wrapper), raw))
        });
        AttributeMapping {
            name: self.name,
            ctor_position: self.ctor_position,
            settable: self.settable,
            updatable: self.updatable,
            get: Arc::new(move |wrapper: &W| get(outer(wrapper))),
            set,
        }
    }

    pub(crate) fn shift_ctor(mut self, by: usize) -> Self {
        self.ctor_position = self.ctor_position.map(|p| p + by);
        self
    }
}

impl<E, B> AttributeMapping<E, B> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ctor_position(&self) -> Option<usize> {
        self.ctor_position
    }

    pub fn is_settable(&self) -> bool {
        self.settable
    }

    pub fn is_updatable(&self) -> bool {
        self.updatable
    }

    /// Current value of this attribute on `entity`.
    pub fn value_of(&self, entity: &E) -> RawValue {
        (self.get)(entity)
    }

    pub(crate) fn apply(&self, builder: &mut B, raw: &RawValue) -> MapperResult<()> {
        match &self.set {
            Some(set) => set(builder, raw).map_err(|e| e.at(self.name)),
            None => Ok(()),
        }
    }
}

impl<E, B> fmt::Debug for AttributeMapping<E, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeMapping")
            .field("name", &self.name)
            .field("ctor_position", &self.ctor_position)
            .field("settable", &self.settable)
            .field("updatable", &self.updatable)
            .field("has_setter", &self.set.is_some())
            .finish()
    }
}

static NO_VALUE: RawValue = RawValue::empty();

/// Stored values of the constructor attributes, in constructor order.
/// Absent attributes are present here as empty values.
#[derive(Clone, Debug, Default)]
pub struct CtorArgs {
    values: Vec<(&'static str, RawValue)>,
}

impl CtorArgs {
    pub fn new(values: Vec<(&'static str, RawValue)>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value at `position`; empty when out of range.
    pub fn raw(&self, position: usize) -> &RawValue {
        self.values.get(position).map_or(&NO_VALUE, |(_, v)| v)
    }

    /// Decode the argument at `position`. Use `Option<T>` or `Vec<T>` for
    /// arguments that may be absent.
    pub fn get<T: AttributeValue>(&self, position: usize) -> MapperResult<T> {
        match self.values.get(position) {
            Some((name, raw)) => T::decode(raw).map_err(|e| e.at(name)),
            None => Err(MapperError::MalformedAttributeValue {
                attribute: format!("#{position}"),
                reason: "no constructor argument at this position".into(),
            }),
        }
    }

    /// The arguments after the first `n`.
    pub fn skip(&self, n: usize) -> CtorArgs {
        CtorArgs {
            values: self.values.iter().skip(n).cloned().collect(),
        }
    }
}

/// Declarative mapping between entity type `E` and one object class.
///
/// Entities are materialized in two phases: the constructor closure builds a
/// `B` from the constructor attributes, then every other settable attribute
/// is applied through its setter, and finally `seal` turns `B` into `E`.
///
/// Descriptors are validated once at construction and never mutated.
pub struct Descriptor<E, B = E> {
    object_class: &'static str,
    attrs: Vec<AttributeMapping<E, B>>,
    construct: Construct<B>,
    seal: Seal<E, B>,
    cn: usize,
    ctor: Vec<usize>,
    settable: Vec<usize>,
    non_ctor_settable: Vec<usize>,
    updatable: Vec<usize>,
}

impl<E: 'static, B: 'static> Descriptor<E, B> {
    /// Build and validate a descriptor.
    ///
    /// Rules:
    /// - exactly one `cn` mapping, and it is settable
    /// - updatable mappings are settable
    /// - constructor positions are `0..n` without gaps or repeats
    /// - settable mappings outside the constructor have a setter
    /// - attribute names are unique, ignoring ASCII case
    pub fn new(
        object_class: &'static str,
        attrs: Vec<AttributeMapping<E, B>>,
        construct: impl Fn(&CtorArgs) -> MapperResult<B> + Send + Sync + 'static,
        seal: impl Fn(B) -> MapperResult<E> + Send + Sync + 'static,
    ) -> MapperResult<Self> {
        let invalid = |reason: String| MapperError::InvalidDescriptor {
            object_class: object_class.to_string(),
            reason,
        };

        let mut seen = HashSet::new();
        for attr in &attrs {
            if !seen.insert(attr.name.to_ascii_lowercase()) {
                return Err(invalid(format!("attribute {} declared twice", attr.name)));
            }
            if attr.updatable && !attr.settable {
                return Err(invalid(format!(
                    "attribute {} is updatable but not settable",
                    attr.name
                )));
            }
            if attr.settable && attr.ctor_position.is_none() && attr.set.is_none() {
                return Err(invalid(format!("attribute {} has no setter", attr.name)));
            }
        }

        let cns: Vec<usize> = (0..attrs.len())
            .filter(|&i| attrs[i].name.eq_ignore_ascii_case(CN))
            .collect();
        let cn = match cns.as_slice() {
            [i] => *i,
            _ => return Err(invalid("exactly one cn mapping is required".into())),
        };
        if !attrs[cn].settable {
            return Err(invalid("the cn mapping must be settable".into()));
        }

        let mut ctor: Vec<usize> = (0..attrs.len())
            .filter(|&i| attrs[i].ctor_position.is_some())
            .collect();
        ctor.sort_by_key(|&i| attrs[i].ctor_position);
        for (expected, &i) in ctor.iter().enumerate() {
            if attrs[i].ctor_position != Some(expected) {
                return Err(invalid(format!(
                    "constructor positions must be dense from 0; {} is at {:?}",
                    attrs[i].name, attrs[i].ctor_position
                )));
            }
        }

        let settable: Vec<usize> = (0..attrs.len()).filter(|&i| attrs[i].settable).collect();
        let non_ctor_settable = settable
            .iter()
            .copied()
            .filter(|&i| attrs[i].ctor_position.is_none())
            .collect();
        let updatable = (0..attrs.len()).filter(|&i| attrs[i].updatable).collect();

        Ok(Self {
            object_class,
            attrs,
            construct: Arc::new(construct),
            seal: Arc::new(seal),
            cn,
            ctor,
            settable,
            non_ctor_settable,
            updatable,
        })
    }
}

impl<E: 'static> Descriptor<E, E> {
    /// A descriptor whose constructor produces the final entity directly.
    pub fn direct(
        object_class: &'static str,
        attrs: Vec<AttributeMapping<E, E>>,
        construct: impl Fn(&CtorArgs) -> MapperResult<E> + Send + Sync + 'static,
    ) -> MapperResult<Self> {
        Self::new(object_class, attrs, construct, Ok)
    }
}

impl<E, B> Descriptor<E, B> {
    pub fn object_class(&self) -> &'static str {
        self.object_class
    }

    pub fn attributes(&self) -> &[AttributeMapping<E, B>] {
        &self.attrs
    }

    pub fn cn_mapping(&self) -> &AttributeMapping<E, B> {
        &self.attrs[self.cn]
    }

    /// Look up a mapping by name, ignoring ASCII case.
    pub fn attribute(&self, name: &str) -> Option<&AttributeMapping<E, B>> {
        self.attrs.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Like [`attribute`](Self::attribute) but fails with
    /// [`MapperError::UnknownAttribute`].
    pub fn require_attribute(&self, name: &str) -> MapperResult<&AttributeMapping<E, B>> {
        self.attribute(name).ok_or_else(|| MapperError::UnknownAttribute {
            object_class: self.object_class.to_string(),
            attribute: name.to_string(),
        })
    }

    pub fn ctor_attributes(&self) -> impl Iterator<Item = &AttributeMapping<E, B>> {
        self.ctor.iter().map(|&i| &self.attrs[i])
    }

    pub fn settable_attributes(&self) -> impl Iterator<Item = &AttributeMapping<E, B>> {
        self.settable.iter().map(|&i| &self.attrs[i])
    }

    pub fn non_ctor_settable_attributes(&self) -> impl Iterator<Item = &AttributeMapping<E, B>> {
        self.non_ctor_settable.iter().map(|&i| &self.attrs[i])
    }

    pub fn updatable_attributes(&self) -> impl Iterator<Item = &AttributeMapping<E, B>> {
        self.updatable.iter().map(|&i| &self.attrs[i])
    }

    /// Names of all settable attributes; the attribute list of every read.
    pub fn settable_names(&self) -> Vec<&'static str> {
        self.settable_attributes().map(|a| a.name).collect()
    }

    /// Run the two-phase construction over a lookup function for stored
    /// values.
    pub fn materialize(&self, stored: impl Fn(&str) -> RawValue) -> MapperResult<E> {
        let args = CtorArgs::new(
            self.ctor_attributes()
                .map(|a| (a.name, stored(a.name)))
                .collect(),
        );
        let mut builder = (self.construct)(&args)?;
        for attr in self.non_ctor_settable_attributes() {
            attr.apply(&mut builder, &stored(attr.name))?;
        }
        (self.seal)(builder)
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        &'static str,
        Vec<AttributeMapping<E, B>>,
        Construct<B>,
        Seal<E, B>,
    ) {
        (self.object_class, self.attrs, self.construct, self.seal)
    }
}

impl<E, B> fmt::Debug for Descriptor<E, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("object_class", &self.object_class)
            .field("attributes", &self.attrs)
            .finish()
    }
}
