//! In-memory weathermap document: three ordered sections (`GLOBALS`, `NODES`,
//! `LINKS`), each mapping an object key such as `"NODE swt-a1"` to an ordered
//! attribute block.
//!
//! The template loaded by [`crate::codec::load`] and the rendered output are
//! both instances of this model; the merge engine mutates it in place and only
//! ever fills attributes that are absent.

use indexmap::IndexMap;

/// One attribute value: a scalar string or a nested block.
///
/// Nesting deeper than one level is rare in real weathermap configs, but the
/// model is recursive so serialization does not have to special-case depth.
#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    Scalar(String),
    Block(AttrBlock),
}

impl Attr {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Attr::Scalar(value) => Some(value),
            Attr::Block(_) => None,
        }
    }
}

/// Ordered mapping from attribute name to value. Attribute names are unique;
/// setting an existing name replaces its value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrBlock {
    attrs: IndexMap<String, Attr>,
}

impl AttrBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Attr> {
        self.attrs.get(name)
    }

    pub fn get_scalar(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).and_then(Attr::as_scalar)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    pub fn set(&mut self, name: &str, value: Attr) {
        self.attrs.insert(name.to_string(), value);
    }

    pub fn set_scalar(&mut self, name: &str, value: &str) {
        self.set(name, Attr::Scalar(value.to_string()));
    }

    /// Writes a scalar only when the attribute is absent. Returns whether the
    /// write happened. This is the merge engine's only write primitive, which
    /// is what keeps template-supplied values authoritative.
    pub fn set_scalar_if_absent(&mut self, name: &str, value: &str) -> bool {
        if self.attrs.contains_key(name) {
            return false;
        }
        self.set_scalar(name, value);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Attr)> {
        self.attrs.iter()
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

/// Ordered mapping from object key (`"<COMMAND> <name>"`) to attribute block.
/// Object keys are unique within a section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    objects: IndexMap<String, AttrBlock>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&AttrBlock> {
        self.objects.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut AttrBlock> {
        self.objects.get_mut(key)
    }

    /// Returns the block for `key`, creating an empty one if absent.
    pub fn entry(&mut self, key: &str) -> &mut AttrBlock {
        self.objects.entry(key.to_string()).or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.objects.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrBlock)> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Which section an object key routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Globals,
    Nodes,
    Links,
}

/// Root of the document model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub globals: Section,
    pub nodes: Section,
    pub links: Section,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&self, kind: SectionKind) -> &Section {
        match kind {
            SectionKind::Globals => &self.globals,
            SectionKind::Nodes => &self.nodes,
            SectionKind::Links => &self.links,
        }
    }

    pub fn section_mut(&mut self, kind: SectionKind) -> &mut Section {
        match kind {
            SectionKind::Globals => &mut self.globals,
            SectionKind::Nodes => &mut self.nodes,
            SectionKind::Links => &mut self.links,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.globals.is_empty() && self.nodes.is_empty() && self.links.is_empty()
    }
}

/// Document key for a node object.
pub fn node_key(host: &str) -> String {
    format!("NODE {host}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_scalar_if_absent_never_overwrites() {
        let mut block = AttrBlock::new();
        assert!(block.set_scalar_if_absent("LABEL", "first"));
        assert!(!block.set_scalar_if_absent("LABEL", "second"));
        assert_eq!(block.get_scalar("LABEL"), Some("first"));
    }

    #[test]
    fn section_entry_creates_once() {
        let mut section = Section::new();
        section.entry("NODE a").set_scalar("ICON", "x");
        section.entry("NODE a").set_scalar("LABEL", "y");
        assert_eq!(section.len(), 1);
        let block = section.get("NODE a").unwrap();
        assert_eq!(block.get_scalar("ICON"), Some("x"));
        assert_eq!(block.get_scalar("LABEL"), Some("y"));
    }

    #[test]
    fn nested_blocks_are_addressable() {
        let mut block = AttrBlock::new();
        let mut child = AttrBlock::new();
        child.set_scalar("DOWN", "5 25 red");
        block.set("SCALE", Attr::Block(child));
        match block.get("SCALE") {
            Some(Attr::Block(child)) => assert_eq!(child.get_scalar("DOWN"), Some("5 25 red")),
            other => panic!("expected nested block, got {other:?}"),
        }
    }
}
