//! Shared test entities.

use dirconf_store::InMemoryDirectory;
use dirconf_types::{Dn, RawValue, CN};

use crate::codec::AttributeValue;
use crate::descriptor::{AttributeMapping, Descriptor};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Widget {
    pub name: String,
    pub color: Option<String>,
    pub size: i32,
    pub tags: Vec<String>,
    pub serial: Option<String>,
}

pub struct WidgetBuilder {
    pub name: String,
    pub color: Option<String>,
    pub size: i32,
    pub tags: Vec<String>,
}

impl WidgetBuilder {
    pub fn new(name: String) -> Self {
        Self {
            name,
            color: None,
            size: 0,
            tags: Vec::new(),
        }
    }

    pub fn build(self) -> Widget {
        Widget {
            name: self.name,
            color: self.color,
            size: self.size,
            tags: self.tags,
            serial: None,
        }
    }
}

pub fn widget(name: &str) -> Widget {
    Widget {
        name: name.to_string(),
        color: Some("red".into()),
        size: 3,
        tags: vec!["b".into(), "a".into()],
        serial: None,
    }
}

pub fn widget_descriptor() -> Descriptor<Widget, WidgetBuilder> {
    Descriptor::new(
        "widget",
        vec![
            AttributeMapping::new(CN, |w: &Widget| w.name.encode())
                .ctor(0)
                .create_only(),
            AttributeMapping::new("color", |w: &Widget| w.color.encode())
                .set_with(|b: &mut WidgetBuilder, v: Option<String>| b.color = v),
            AttributeMapping::new("size", |w: &Widget| w.size.encode())
                .set_with(|b: &mut WidgetBuilder, v: i32| b.size = v),
            AttributeMapping::new("tags", |w: &Widget| w.tags.encode())
                .set_with(|b: &mut WidgetBuilder, v: Vec<String>| b.tags = v),
            AttributeMapping::new("serial", |w: &Widget| w.serial.encode()).read_only(),
        ],
        |args| Ok(WidgetBuilder::new(args.get(0)?)),
        |b| Ok(b.build()),
    )
    .expect("widget descriptor is well-formed")
}

pub fn base() -> Dn {
    Dn::parse("dc=example,dc=com").unwrap()
}

pub fn directory() -> InMemoryDirectory {
    InMemoryDirectory::with_suffix(base())
}

pub fn raw(s: &str) -> RawValue {
    RawValue::from(s)
}
