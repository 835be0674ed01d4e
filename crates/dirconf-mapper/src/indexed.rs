//! Ordered collections over a store without sibling order.
//!
//! Each item is wrapped in [`Indexed`] and stored as `cn=<Prefix>-<index>`.
//! Indices are assigned densely from 0 in list order on every save and
//! recovered from the name on load.

use dirconf_store::DirectoryConnection;
use dirconf_types::{Dn, RawValue, CN};

use crate::container::{load_collection, save_collection};
use crate::descriptor::{AttributeMapping, CtorArgs, Descriptor};
use crate::error::{CodecError, CodecResult, MapperResult};

/// A payload paired with its position in the collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Indexed<T> {
    pub index: usize,
    pub item: T,
}

/// Intermediate form of [`Indexed`] during materialization.
#[derive(Debug)]
pub struct IndexedBuilder<B> {
    pub index: usize,
    pub item: B,
}

fn outer<T>(wrapper: &Indexed<T>) -> &T {
    &wrapper.item
}

fn inner<B>(wrapper: &mut IndexedBuilder<B>) -> &mut B {
    &mut wrapper.item
}

/// `<prefix>-<index>`
pub fn index_name(prefix: &str, index: usize) -> String {
    format!("{prefix}-{index}")
}

/// Recover the index from a name produced by [`index_name`].
pub fn parse_index(prefix: &str, name: &str) -> CodecResult<usize> {
    let malformed = || CodecError::new(format!("{name:?} is not of the form {prefix}-<index>"));
    let (head, tail) = name.rsplit_once('-').ok_or_else(malformed)?;
    if !head.eq_ignore_ascii_case(prefix) || tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    tail.parse().map_err(|_| malformed())
}

/// Build the descriptor for an indexed collection of `T`.
///
/// `payload` describes `T` without a `cn` mapping; its constructor positions
/// start at 0 and `construct` sees only the payload arguments. The generated
/// `cn` carries the index.
pub fn indexed_descriptor<T: 'static, TB: 'static>(
    object_class: &'static str,
    prefix: &'static str,
    payload: Vec<AttributeMapping<T, TB>>,
    construct: impl Fn(&CtorArgs) -> MapperResult<TB> + Send + Sync + 'static,
    seal: impl Fn(TB) -> MapperResult<T> + Send + Sync + 'static,
) -> MapperResult<Descriptor<Indexed<T>, IndexedBuilder<TB>>> {
    let mut attrs = vec![AttributeMapping::new(CN, move |w: &Indexed<T>| {
        RawValue::from(index_name(prefix, w.index).as_str())
    })
    .ctor(0)
    .create_only()];
    attrs.extend(
        payload
            .into_iter()
            .map(|m| m.shift_ctor(1).lift(outer::<T>, inner::<TB>)),
    );

    Descriptor::new(
        object_class,
        attrs,
        move |args| {
            let name: String = args.get(0)?;
            let index = parse_index(prefix, &name).map_err(|e| e.at(CN))?;
            Ok(IndexedBuilder {
                index,
                item: construct(&args.skip(1))?,
            })
        },
        move |b| {
            Ok(Indexed {
                index: b.index,
                item: seal(b.item)?,
            })
        },
    )
}

/// Replace the ordered collection in container `name` beneath `parent`
/// with `items`, indexed in slice order. `on_item` runs after each child is
/// created.
pub fn save_indexed<T, TB, F>(
    conn: &dyn DirectoryConnection,
    parent: &Dn,
    name: &str,
    descriptor: &Descriptor<Indexed<T>, IndexedBuilder<TB>>,
    items: &[T],
    mut on_item: F,
) -> MapperResult<()>
where
    T: Clone,
    F: FnMut(&dyn DirectoryConnection, &Dn, &T) -> MapperResult<()>,
{
    let wrapped: Vec<Indexed<T>> = items
        .iter()
        .cloned()
        .enumerate()
        .map(|(index, item)| Indexed { index, item })
        .collect();
    save_collection(conn, parent, name, descriptor, &wrapped, |c, dn, w| {
        on_item(c, dn, &w.item)
    })
}

/// Load the ordered collection in container `name` beneath `parent`.
///
/// With `sort_by_index` the items come back in saved order; otherwise in
/// store order. A missing container is an empty list.
pub fn load_indexed<T, TB, F>(
    conn: &dyn DirectoryConnection,
    parent: &Dn,
    name: &str,
    descriptor: &Descriptor<Indexed<T>, IndexedBuilder<TB>>,
    sort_by_index: bool,
    mut on_item: F,
) -> MapperResult<Vec<T>>
where
    F: FnMut(&dyn DirectoryConnection, &Dn, &mut T) -> MapperResult<()>,
{
    let mut loaded = load_collection(conn, parent, name, descriptor, |c, dn, w| {
        on_item(c, dn, &mut w.item)
    })?;
    if sort_by_index {
        loaded.sort_by_key(|w| w.index);
    }
    Ok(loaded.into_iter().map(|w| w.item).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::AttributeValue;
    use crate::error::MapperError;
    use crate::fixtures::{base, directory};
    use dirconf_store::{EnumerationOrder, InMemoryDirectory};
    use proptest::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Step {
        label: String,
        weight: Option<i32>,
    }

    fn step(label: &str) -> Step {
        Step {
            label: label.to_string(),
            weight: None,
        }
    }

    fn steps_descriptor() -> Descriptor<Indexed<Step>, IndexedBuilder<Step>> {
        indexed_descriptor(
            "step",
            "Step",
            vec![
                AttributeMapping::new("label", |s: &Step| s.label.encode()).ctor(0),
                AttributeMapping::new("weight", |s: &Step| s.weight.encode())
                    .set_with(|s: &mut Step, v: Option<i32>| s.weight = v),
            ],
            |args| {
                Ok(Step {
                    label: args.get(0)?,
                    weight: None,
                })
            },
            Ok,
        )
        .unwrap()
    }

    fn roundtrip(dir: &InMemoryDirectory, items: &[Step]) -> Vec<Step> {
        let d = steps_descriptor();
        save_indexed(dir, &base(), "Steps", &d, items, |_, _, _| Ok(())).unwrap();
        load_indexed(dir, &base(), "Steps", &d, true, |_, _, _| Ok(())).unwrap()
    }

    // -----------------------------------------------------------------------
    // Names
    // -----------------------------------------------------------------------

    #[test]
    fn index_names() {
        assert_eq!(index_name("SignatureAlgorithm", 3), "SignatureAlgorithm-3");
        assert_eq!(parse_index("SignatureAlgorithm", "signaturealgorithm-12").unwrap(), 12);
        assert!(parse_index("Step", "Step-").is_err());
        assert!(parse_index("Step", "Step-x").is_err());
        assert!(parse_index("Step", "Step--1").is_err());
        assert!(parse_index("Step", "Other-1").is_err());
        assert!(parse_index("Step", "Step1").is_err());
    }

    #[test]
    fn descriptor_shifts_payload_ctor() {
        let d = steps_descriptor();
        let ctor: Vec<&str> = d.ctor_attributes().map(|a| a.name()).collect();
        assert_eq!(ctor, vec!["cn", "label"]);
    }

    #[test]
    fn payload_with_cn_is_rejected() {
        let result = indexed_descriptor(
            "step",
            "Step",
            vec![AttributeMapping::new("cn", |s: &Step| s.label.encode()).ctor(0)],
            |args| Ok(step(&args.get::<String>(0)?)),
            Ok,
        );
        assert!(matches!(result, Err(MapperError::InvalidDescriptor { .. })));
    }

    // -----------------------------------------------------------------------
    // Save / load
    // -----------------------------------------------------------------------

    #[test]
    fn preserves_order_for_small_sizes() {
        let dir = directory();
        assert!(roundtrip(&dir, &[]).is_empty());
        assert_eq!(roundtrip(&dir, &[step("only")]), vec![step("only")]);

        dir.set_order(EnumerationOrder::Reversed);
        let many: Vec<Step> = (0..12).map(|i| step(&format!("s{i}"))).collect();
        assert_eq!(roundtrip(&dir, &many), many);
    }

    #[test]
    fn second_save_replaces_first() {
        let dir = directory();
        roundtrip(&dir, &[step("a"), step("b"), step("c")]);
        let second = vec![Step {
            label: "z".into(),
            weight: Some(4),
        }];
        assert_eq!(roundtrip(&dir, &second), second);
    }

    #[test]
    fn missing_collection_is_empty() {
        let dir = directory();
        let d = steps_descriptor();
        let loaded = load_indexed(&dir, &base(), "Steps", &d, true, |_, _, _| Ok(())).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn corrupt_index_is_fatal() {
        let dir = directory();
        roundtrip(&dir, &[step("a")]);
        let d = steps_descriptor();
        let container = base().child_cn("Steps").unwrap();
        let bogus = Indexed {
            index: 0,
            item: step("b"),
        };
        // Same object class, but the name carries no index.
        let dn = container.child_cn("Step-zero").unwrap();
        dir.add(
            &dn,
            &[
                dirconf_store::Modification::add("objectClass", RawValue::from("step")),
                dirconf_store::Modification::add("cn", RawValue::from("Step-zero")),
                dirconf_store::Modification::add("label", bogus.item.label.encode()),
            ],
        )
        .unwrap();
        let err = load_indexed(&dir, &base(), "Steps", &d, true, |_, _, _| Ok(())).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn nested_callbacks_run_per_item() {
        let dir = directory();
        let d = steps_descriptor();
        let items = vec![step("a"), step("b")];
        save_indexed(&dir, &base(), "Steps", &d, &items, |conn, dn, s: &Step| {
            save_indexed(conn, dn, "Children", &d, &[step(&format!("{}-child", s.label))], |_, _, _| Ok(()))
        })
        .unwrap();

        let mut children = Vec::new();
        load_indexed(&dir, &base(), "Steps", &d, true, |conn, dn, _s: &mut Step| {
            children.extend(load_indexed(conn, dn, "Children", &d, true, |_, _, _| Ok(()))?);
            Ok(())
        })
        .unwrap();
        assert_eq!(children, vec![step("a-child"), step("b-child")]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn order_survives_shuffled_enumeration(
            labels in proptest::collection::vec("[a-z]{1,8}", 0..20),
            seed in any::<u64>(),
        ) {
            let dir = InMemoryDirectory::with_suffix(base());
            dir.set_order(EnumerationOrder::Shuffled { seed });
            let items: Vec<Step> = labels.iter().map(|l| step(l)).collect();
            prop_assert_eq!(roundtrip(&dir, &items), items);
        }
    }
}
