//! Document access for the interpreter.
//!
//! The interpreter never parses a PDF file. It asks an [`ObjectResolver`]
//! to follow indirect references and to classify the dictionaries it finds
//! in resources. [`MemoryDocument`] is a small in-memory store implementing
//! the trait, used by the CLI and by tests.

use crate::object::{Object, ObjectRef};
use std::collections::HashMap;

/// Maximum chain of references followed before giving up.
const MAX_REFERENCE_CHAIN: u32 = 32;

/// What kind of resource a dictionary or stream describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XObjectKind {
    /// Image XObject (`/Subtype /Image`)
    Image,
    /// Form XObject (`/Subtype /Form`)
    Form,
    /// Tiling or shading pattern (`/Type /Pattern` or a `/PatternType`)
    Pattern,
    /// Font dictionary
    Font,
    /// External graphics state (`/Type /ExtGState`)
    GraphicsState,
    /// Soft-mask dictionary (`/Type /Mask` or `/S` with a group `/G`)
    SoftMask,
    /// Anything else
    Unknown,
}

/// Read access to the objects of a document.
///
/// Implementors supply [`resolve`](ObjectResolver::resolve); the remaining
/// methods have default implementations on top of it.
pub trait ObjectResolver {
    /// Look up an indirect object.
    fn resolve(&self, obj_ref: ObjectRef) -> Option<Object>;

    /// Follow `obj` while it is a reference.
    ///
    /// Dangling references and chains longer than 32 hops yield
    /// [`Object::Null`].
    fn resolve_reference(&self, obj: &Object) -> Object {
        let mut current = obj.clone();
        for _ in 0..MAX_REFERENCE_CHAIN {
            let Object::Reference(r) = current else {
                return current;
            };
            match self.resolve(r) {
                Some(next) => current = next,
                None => {
                    log::debug!("Dangling reference {}", r);
                    return Object::Null;
                },
            }
        }
        log::warn!("Reference chain from {:?} exceeds {} hops", obj, MAX_REFERENCE_CHAIN);
        Object::Null
    }

    /// Make a number object.
    fn create_number(&self, value: f64) -> Object {
        Object::Real(value)
    }

    /// Dictionary entry `key` of `obj`, references followed. `None` when
    /// `obj` is not a dictionary, the key is absent, or it resolves to null.
    fn get_resolved(&self, obj: &Object, key: &str) -> Option<Object> {
        let value = self.resolve_reference(obj.get(key)?);
        (!value.is_null()).then_some(value)
    }

    /// Classify a resolved object.
    fn classify(&self, obj: &Object) -> XObjectKind {
        let Some(dict) = obj.as_dict() else {
            return XObjectKind::Unknown;
        };
        let name_of = |key: &str| {
            dict.get(key)
                .map(|v| self.resolve_reference(v))
                .and_then(|v| v.as_name().map(str::to_string))
        };
        match name_of("Subtype").as_deref() {
            Some("Image") => return XObjectKind::Image,
            Some("Form") => return XObjectKind::Form,
            _ => {},
        }
        match name_of("Type").as_deref() {
            Some("Pattern") => return XObjectKind::Pattern,
            Some("Font") => return XObjectKind::Font,
            Some("ExtGState") => return XObjectKind::GraphicsState,
            Some("Mask") => return XObjectKind::SoftMask,
            _ => {},
        }
        if dict.contains_key("PatternType") {
            XObjectKind::Pattern
        } else if dict.contains_key("S") && dict.contains_key("G") {
            XObjectKind::SoftMask
        } else if dict.contains_key("BaseFont") {
            XObjectKind::Font
        } else {
            XObjectKind::Unknown
        }
    }
}

/// In-memory object store.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    objects: HashMap<ObjectRef, Object>,
    next_id: u32,
}

impl MemoryDocument {
    /// Empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `obj` under `obj_ref`, replacing any previous object.
    pub fn insert(&mut self, obj_ref: ObjectRef, obj: Object) {
        self.next_id = self.next_id.max(obj_ref.id + 1);
        self.objects.insert(obj_ref, obj);
    }

    /// Store `obj` under a fresh object number and return a reference to it.
    pub fn add(&mut self, obj: Object) -> Object {
        let obj_ref = ObjectRef::new(self.next_id.max(1), 0);
        self.insert(obj_ref, obj);
        Object::Reference(obj_ref)
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectResolver for MemoryDocument {
    fn resolve(&self, obj_ref: ObjectRef) -> Option<Object> {
        self.objects.get(&obj_ref).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Dictionary;

    fn dict(entries: &[(&str, Object)]) -> Object {
        Object::dictionary(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<Dictionary>(),
        )
    }

    #[test]
    fn test_add_assigns_fresh_numbers() {
        let mut doc = MemoryDocument::new();
        let a = doc.add(Object::Integer(1));
        let b = doc.add(Object::Integer(2));
        assert_ne!(a, b);
        assert_eq!(doc.resolve_reference(&b), Object::Integer(2));
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_resolve_chain_and_dangling() {
        let mut doc = MemoryDocument::new();
        let inner = doc.add(Object::name("X"));
        let outer = doc.add(inner);
        assert_eq!(doc.resolve_reference(&outer), Object::name("X"));
        assert_eq!(doc.resolve_reference(&Object::Reference(ObjectRef::new(99, 0))), Object::Null);
    }

    #[test]
    fn test_reference_cycle_yields_null() {
        let mut doc = MemoryDocument::new();
        doc.insert(ObjectRef::new(1, 0), Object::Reference(ObjectRef::new(2, 0)));
        doc.insert(ObjectRef::new(2, 0), Object::Reference(ObjectRef::new(1, 0)));
        assert_eq!(doc.resolve_reference(&Object::Reference(ObjectRef::new(1, 0))), Object::Null);
    }

    #[test]
    fn test_classify() {
        let doc = MemoryDocument::new();
        let image = Object::stream(
            [("Subtype".to_string(), Object::name("Image"))].into_iter().collect(),
            Vec::<u8>::new(),
        );
        assert_eq!(doc.classify(&image), XObjectKind::Image);
        assert_eq!(doc.classify(&dict(&[("Subtype", Object::name("Form"))])), XObjectKind::Form);
        assert_eq!(doc.classify(&dict(&[("PatternType", Object::Integer(1))])), XObjectKind::Pattern);
        assert_eq!(doc.classify(&dict(&[("Type", Object::name("Font"))])), XObjectKind::Font);
        assert_eq!(
            doc.classify(&dict(&[("Type", Object::name("ExtGState"))])),
            XObjectKind::GraphicsState
        );
        assert_eq!(
            doc.classify(&dict(&[("S", Object::name("Luminosity")), ("G", Object::Null)])),
            XObjectKind::SoftMask
        );
        assert_eq!(doc.classify(&Object::Integer(3)), XObjectKind::Unknown);
    }

    #[test]
    fn test_get_resolved_follows_references() {
        let mut doc = MemoryDocument::new();
        let width = doc.add(Object::Integer(10));
        let image = dict(&[("Width", width), ("Null", Object::Null)]);
        assert_eq!(doc.get_resolved(&image, "Width"), Some(Object::Integer(10)));
        assert_eq!(doc.get_resolved(&image, "Null"), None);
        assert_eq!(doc.get_resolved(&image, "Height"), None);
    }
}
