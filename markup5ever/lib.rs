// Copyright The html5ever Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Types shared between the tree-construction core and whatever tree sink
//! it is wired up to. Nothing in here knows about HTML5 insertion modes;
//! this crate is the load-bearing vocabulary, not the algorithm.

use std::fmt;
use std::rc::Rc;

pub use tendril::StrTendril;

/// One of the five namespaces the tree builder ever has to reason about,
/// plus the empty "no namespace" case used for ordinary HTML attributes.
///
/// Kept as a closed enum rather than an interned string: the builder only
/// ever compares namespaces against these seven constants, so there is no
/// need to pay for string interning here the way a full DOM would.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Namespace {
    #[default]
    None,
    Html,
    MathMl,
    Svg,
    XLink,
    Xml,
    Xmlns,
}

impl Namespace {
    /// The namespace URI, as it would appear on an adjusted foreign attribute.
    pub fn uri(self) -> &'static str {
        match self {
            Namespace::None => "",
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::XLink => "http://www.w3.org/1999/xlink",
            Namespace::Xml => "http://www.w3.org/XML/1998/namespace",
            Namespace::Xmlns => "http://www.w3.org/2000/xmlns/",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri())
    }
}

/// A cheaply-clonable, case-folded element or attribute local name.
///
/// Backed by `Rc<str>` rather than `String`: these are cloned constantly
/// (every stack frame, every formatting-list entry, every dispatch match),
/// and an `Rc` clone is a refcount bump rather than an allocation.
#[derive(Clone, Eq, Hash)]
pub struct LocalName(Rc<str>);

impl LocalName {
    pub fn new(name: &str) -> Self {
        LocalName(Rc::from(name.to_ascii_lowercase().into_boxed_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for LocalName {
    fn eq(&self, other: &Self) -> bool {
        *self.0 == *other.0
    }
}

impl PartialEq<str> for LocalName {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl std::ops::Deref for LocalName {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LocalName {
    fn from(s: &str) -> Self {
        LocalName::new(s)
    }
}

impl fmt::Debug for LocalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for LocalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A namespace prefix, e.g. the `xlink` in `xlink:href`.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Prefix(Rc<str>);

impl Prefix {
    pub fn new(s: &str) -> Self {
        Prefix(Rc::from(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A name with a namespace: `{namespace}local`, optionally spelled with a
/// `prefix:` in the source markup.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct QualName {
    pub prefix: Option<Prefix>,
    pub ns: Namespace,
    pub local: LocalName,
}

impl QualName {
    pub fn new(prefix: Option<Prefix>, ns: Namespace, local: LocalName) -> QualName {
        QualName { prefix, ns, local }
    }

    /// An unprefixed name in the HTML namespace, the overwhelmingly common case.
    pub fn html(local: LocalName) -> QualName {
        QualName::new(None, Namespace::Html, local)
    }

    pub fn expanded(&self) -> ExpandedName<'_> {
        ExpandedName {
            ns: &self.ns,
            local: &self.local,
        }
    }
}

/// A `(namespace, local name)` pair borrowed out of a `QualName`, used as a
/// cheap comparison key when we don't care about the prefix spelling.
#[derive(Clone, Copy, Eq)]
pub struct ExpandedName<'a> {
    pub ns: &'a Namespace,
    pub local: &'a LocalName,
}

impl<'a, 'b> PartialEq<ExpandedName<'a>> for ExpandedName<'b> {
    fn eq(&self, other: &ExpandedName<'a>) -> bool {
        self.ns == other.ns && self.local == other.local
    }
}

impl<'a> fmt::Debug for ExpandedName<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self.ns == Namespace::None {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.ns, self.local)
        }
    }
}

/// A tag attribute, as produced by the tokeniser and as adjusted for
/// foreign content by the tree builder.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Attribute {
    pub name: QualName,
    pub value: StrTendril,
}

/// The document's quirks mode, set once by `<!DOCTYPE>` handling and
/// consulted only by the sink/layout engine downstream of us.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum QuirksMode {
    Quirks,
    LimitedQuirks,
    #[default]
    NoQuirks,
}

/// A node to append, either freshly created or a run of characters to be
/// coalesced into the target's existing trailing text node.
#[derive(Debug)]
pub enum NodeOrText<Handle> {
    AppendNode(Handle),
    AppendText(StrTendril),
}

/// The tree-construction core never touches node storage directly; every
/// mutation is a call through this trait. `Handle` is an opaque reference
/// the sink owns and reference-counts: the core acquires one with
/// `ref_node` and must release it with a matching `unref_node`, but never
/// dereferences it itself.
pub trait TreeSink {
    type Handle: Copy + Eq + fmt::Debug;

    /// Take out a reference on a handle the core is about to start holding
    /// (pushing to the stack, appending to the formatting list, storing in
    /// a context slot).
    fn ref_node(&self, node: Self::Handle);

    /// Release a reference the core previously took with `ref_node`.
    fn unref_node(&self, node: Self::Handle);

    /// Create an element node. Does not link it into the tree or take a
    /// reference on behalf of the caller.
    fn create_element(&self, name: QualName, attrs: Vec<Attribute>) -> Self::Handle;

    fn create_comment(&self, text: StrTendril) -> Self::Handle;

    fn create_text(&self, text: StrTendril) -> Self::Handle;

    fn create_doctype(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) -> Self::Handle;

    /// Append `child` as the last child of `parent`. If `child` is a text
    /// run and `parent`'s last child is already a text node, the sink may
    /// coalesce into it instead of creating a new node; either way the
    /// handle of the node that now carries the text is returned.
    fn append(&self, parent: Self::Handle, child: NodeOrText<Self::Handle>) -> Self::Handle;

    /// As `append`, but insert immediately before `ref_child` rather than
    /// at the end of `parent`'s children.
    fn append_before_sibling(
        &self,
        ref_child: Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) -> Self::Handle;

    /// Foster-parenting entry point: append `child` as a sibling of
    /// `element` immediately before it if `element` has a parent, otherwise
    /// as the last child of `prev_element`. See the HTML5 foster-parenting
    /// algorithm; the split is the sink's problem because only it knows
    /// whether `element` is currently attached.
    fn append_based_on_parent_node(
        &self,
        element: Self::Handle,
        prev_element: Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) -> Self::Handle;

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    );

    fn remove_from_parent(&self, node: Self::Handle);

    fn reparent_children(&self, src: Self::Handle, dst: Self::Handle);

    fn get_parent(&self, node: Self::Handle, element_only: bool) -> Option<Self::Handle>;

    fn has_children(&self, node: Self::Handle) -> bool;

    /// Shallow- or deep-clone a node (used by the adoption agency algorithm
    /// and by active-formatting-element reconstruction).
    fn clone_node(&self, node: Self::Handle, deep: bool) -> Self::Handle;

    fn form_associate(&self, form: Self::Handle, node: Self::Handle);

    fn add_attributes(&self, node: Self::Handle, attrs: Vec<Attribute>);

    fn set_quirks_mode(&self, mode: QuirksMode);

    /// The `(namespace, local name)` of an element node. The core consults
    /// this constantly during dispatch; it never stores it, so an owned
    /// return is fine even though it costs an `Rc` bump per call.
    fn elem_name(&self, node: Self::Handle) -> QualName;

    /// The contents fragment of a `<template>` element, for insertions that
    /// target template content rather than the template element itself.
    fn get_template_contents(&self, template: Self::Handle) -> Self::Handle;
}
