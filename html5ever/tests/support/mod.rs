// Copyright The html5ever Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A minimal in-memory tree sink for exercising the tree builder in
//! tests, grounded on the shape of the reference-counted DOM the teacher
//! ships (`rcdom.rs`): nodes addressed by a cheap `Copy` handle, stored in
//! one arena, with parent/child edges plus a reference count per node so
//! tests can assert the builder's ref/unref contract balances exactly.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use markup5ever::{Attribute, NodeOrText, QualName, QuirksMode, StrTendril, TreeSink};

pub type Handle = usize;

#[derive(Debug)]
pub enum NodeData {
    Document,
    Doctype { name: StrTendril, public_id: StrTendril, system_id: StrTendril },
    Text(RefCell<StrTendril>),
    Comment(StrTendril),
    Element { name: QualName, attrs: RefCell<Vec<Attribute>> },
}

#[derive(Debug)]
pub struct Node {
    pub data: NodeData,
    pub children: RefCell<Vec<Handle>>,
}

struct Storage {
    nodes: RefCell<HashMap<Handle, Node>>,
    next_id: Cell<Handle>,
    ref_counts: RefCell<HashMap<Handle, i64>>,
    quirks_mode: Cell<QuirksMode>,
}

/// Cheaply `Clone`-able handle onto the arena: the tree builder owns one
/// copy (dropped when `finish()`'s caller drops the builder), and the test
/// keeps another alive to inspect the result afterwards.
#[derive(Clone)]
pub struct TestSink(Rc<Storage>);

impl TestSink {
    pub fn new() -> Self {
        let storage = Storage {
            nodes: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
            ref_counts: RefCell::new(HashMap::new()),
            quirks_mode: Cell::new(QuirksMode::NoQuirks),
        };
        TestSink(Rc::new(storage))
    }

    fn alloc(&self, data: NodeData) -> Handle {
        let id = self.0.next_id.get();
        self.0.next_id.set(id + 1);
        self.0.nodes.borrow_mut().insert(id, Node { data, children: RefCell::new(Vec::new()) });
        id
    }

    /// Allocate the document root the test harness passes to
    /// `TreeBuilder::set_document_node`; not part of `TreeSink` itself,
    /// since the core never creates the root node on its own.
    pub fn new_document(&self) -> Handle {
        self.alloc(NodeData::Document)
    }

    pub fn quirks_mode(&self) -> QuirksMode {
        self.0.quirks_mode.get()
    }

    pub fn children_of(&self, node: Handle) -> Vec<Handle> {
        self.0.nodes.borrow()[&node].children.borrow().clone()
    }

    pub fn element_name(&self, node: Handle) -> Option<QualName> {
        match &self.0.nodes.borrow()[&node].data {
            NodeData::Element { name, .. } => Some(name.clone()),
            _ => None,
        }
    }

    pub fn text_content(&self, node: Handle) -> Option<String> {
        match &self.0.nodes.borrow()[&node].data {
            NodeData::Text(t) => Some(t.borrow().to_string()),
            _ => None,
        }
    }

    /// Every handle currently tracked is ref-counted to exactly zero, i.e.
    /// every `ref_node` this sink saw has a matching `unref_node`. Call
    /// after `TreeBuilder::finish()` to check the reference-balance
    /// invariant the tree builder promises to maintain.
    pub fn all_refs_released(&self) -> bool {
        self.0.ref_counts.borrow().values().all(|&count| count == 0)
    }

    fn append_child(&self, parent: Handle, child: Handle) {
        self.0.nodes.borrow()[&parent].children.borrow_mut().push(child);
    }

    fn insert_before(&self, parent: Handle, sibling: Handle, child: Handle) {
        let nodes = self.0.nodes.borrow();
        let mut children = nodes[&parent].children.borrow_mut();
        let index = children.iter().position(|&h| h == sibling).unwrap_or(children.len());
        children.insert(index, child);
    }

    fn append_to_node_or_text(&self, parent: Handle, child: NodeOrText<Handle>) -> Handle {
        match child {
            NodeOrText::AppendNode(handle) => {
                self.append_child(parent, handle);
                handle
            },
            NodeOrText::AppendText(text) => self.append_text_merging(parent, text),
        }
    }

    fn append_text_merging(&self, parent: Handle, text: StrTendril) -> Handle {
        let last_child = self.0.nodes.borrow()[&parent].children.borrow().last().copied();
        if let Some(last) = last_child {
            if let NodeData::Text(existing) = &self.0.nodes.borrow()[&last].data {
                existing.borrow_mut().push_tendril(&text);
                return last;
            }
        }
        let handle = self.alloc(NodeData::Text(RefCell::new(text)));
        self.append_child(parent, handle);
        handle
    }
}

impl TreeSink for TestSink {
    type Handle = Handle;

    fn ref_node(&self, node: Handle) {
        *self.0.ref_counts.borrow_mut().entry(node).or_insert(0) += 1;
    }

    fn unref_node(&self, node: Handle) {
        *self.0.ref_counts.borrow_mut().entry(node).or_insert(0) -= 1;
    }

    fn create_element(&self, name: QualName, attrs: Vec<Attribute>) -> Handle {
        self.alloc(NodeData::Element { name, attrs: RefCell::new(attrs) })
    }

    fn create_comment(&self, text: StrTendril) -> Handle {
        self.alloc(NodeData::Comment(text))
    }

    fn append(&self, parent: Handle, child: NodeOrText<Handle>) -> Handle {
        self.append_to_node_or_text(parent, child)
    }

    fn append_based_on_parent_node(&self, element: Handle, prev_element: Handle, child: NodeOrText<Handle>) -> Handle {
        match self.get_parent(element, false) {
            Some(parent) => match child {
                NodeOrText::AppendNode(h) => {
                    self.insert_before(parent, element, h);
                    h
                },
                NodeOrText::AppendText(text) => {
                    let handle = self.alloc(NodeData::Text(RefCell::new(text)));
                    self.insert_before(parent, element, handle);
                    handle
                },
            },
            None => self.append_to_node_or_text(prev_element, child),
        }
    }

    fn append_doctype_to_document(&self, name: StrTendril, public_id: StrTendril, system_id: StrTendril) {
        let handle = self.alloc(NodeData::Doctype { name, public_id, system_id });
        // Document handle is always 0 in these tests (the first allocation).
        self.append_child(0, handle);
    }

    fn remove_from_parent(&self, node: Handle) {
        for n in self.0.nodes.borrow().values() {
            n.children.borrow_mut().retain(|&h| h != node);
        }
    }

    fn reparent_children(&self, src: Handle, dst: Handle) {
        let moved: Vec<Handle> = self.0.nodes.borrow()[&src].children.borrow_mut().drain(..).collect();
        self.0.nodes.borrow()[&dst].children.borrow_mut().extend(moved);
    }

    fn get_parent(&self, node: Handle, element_only: bool) -> Option<Handle> {
        for (&id, n) in self.0.nodes.borrow().iter() {
            if n.children.borrow().contains(&node) {
                if element_only && !matches!(n.data, NodeData::Element { .. }) {
                    continue;
                }
                return Some(id);
            }
        }
        None
    }

    fn has_children(&self, node: Handle) -> bool {
        !self.0.nodes.borrow()[&node].children.borrow().is_empty()
    }

    fn clone_node(&self, node: Handle) -> Handle {
        let clone_data = match &self.0.nodes.borrow()[&node].data {
            NodeData::Element { name, attrs } => {
                NodeData::Element { name: name.clone(), attrs: RefCell::new(attrs.borrow().clone()) }
            },
            NodeData::Text(t) => NodeData::Text(RefCell::new(t.borrow().clone())),
            NodeData::Comment(c) => NodeData::Comment(c.clone()),
            NodeData::Document => NodeData::Document,
            NodeData::Doctype { name, public_id, system_id } => {
                NodeData::Doctype { name: name.clone(), public_id: public_id.clone(), system_id: system_id.clone() }
            },
        };
        self.alloc(clone_data)
    }

    fn form_associate(&self, _form: Handle, _node: Handle) {}

    fn add_attributes(&self, node: Handle, attrs: Vec<Attribute>) {
        if let NodeData::Element { attrs: existing, .. } = &self.0.nodes.borrow()[&node].data {
            let mut existing = existing.borrow_mut();
            for attr in attrs {
                if !existing.iter().any(|a| a.name == attr.name) {
                    existing.push(attr);
                }
            }
        }
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        self.0.quirks_mode.set(mode);
    }

    fn elem_name(&self, node: Handle) -> QualName {
        match &self.0.nodes.borrow()[&node].data {
            NodeData::Element { name, .. } => name.clone(),
            _ => panic!("elem_name called on a non-element node"),
        }
    }

    fn get_template_contents(&self, template: Handle) -> Handle {
        // Fragment/template-content parsing is out of scope; tests never
        // reach this for a <template> element, so treat it as an identity.
        template
    }
}
