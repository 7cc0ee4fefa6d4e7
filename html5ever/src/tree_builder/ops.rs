// Copyright The html5ever Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tree operation helpers: the glue between the sink and the two coupled
//! auxiliary structures. Everything here either mutates the stack and the
//! formatting list together (so their cross-invariants keep holding) or
//! implements one of the named recovery algorithms (adoption agency,
//! foster parenting).

use markup5ever::{Attribute, Namespace, NodeOrText, QualName, StrTendril, TreeSink};

use super::formatting::FormatEntry;
use super::stack::Frame;
use super::types::InsertionMode;
use super::TreeBuilder;
use crate::element::{type_from_name, ElementType};
use crate::tokenizer::Tag;

/// Where a node about to be appended should actually land: ordinarily the
/// last child of some parent, or — under foster parenting — as a sibling
/// of a table rather than a child of whatever nonsensical node is
/// currently open.
enum InsertionPoint<Handle> {
    LastChild(Handle),
    TableFoster { table: Handle, before: Handle },
}

enum Bookmark<Handle> {
    Replace(Handle),
    InsertAfter(Handle),
}

/// Elements whose implied end tags close automatically ahead of most
/// structural insertions (`close_implied_end_tags`'s fixed set).
fn has_implied_end_tag(ty: ElementType) -> bool {
    matches!(
        ty,
        ElementType::Dd
            | ElementType::Dt
            | ElementType::Li
            | ElementType::Option
            | ElementType::Optgroup
            | ElementType::P
            | ElementType::Rp
            | ElementType::Rt
    )
}

fn is_foster_target(ty: ElementType) -> bool {
    matches!(
        ty,
        ElementType::Table | ElementType::Tbody | ElementType::Tfoot | ElementType::Thead | ElementType::Tr
    )
}

impl<Handle, Sink> TreeBuilder<Handle, Sink>
where
    Handle: Copy + Eq + std::fmt::Debug,
    Sink: TreeSink<Handle = Handle>,
{
    // ---- stack/formatting-list coupling -------------------------------

    pub(super) fn push_to_stack(&self, ns: Namespace, ty: ElementType, handle: Handle) {
        self.sink.ref_node(handle);
        self.open_elems.borrow_mut().push(ns, ty, handle);
    }

    pub(super) fn insert_stack_frame_at(&self, index: usize, ns: Namespace, ty: ElementType, handle: Handle) {
        self.sink.ref_node(handle);
        self.open_elems.borrow_mut().insert(index, ns, ty, handle);
        self.active_formatting.borrow_mut().on_stack_frame_inserted(index);
    }

    /// Pop the current node, releasing the stack's reference on it and
    /// detaching any formatting-list entry that pointed at this slot.
    pub(super) fn pop(&self) -> Frame<Handle> {
        let index = self.open_elems.borrow().len().checked_sub(1).expect("pop from empty stack");
        let frame = self.open_elems.borrow_mut().pop();
        self.active_formatting.borrow_mut().on_stack_frame_removed(index);
        self.sink.unref_node(frame.handle);
        frame
    }

    pub(super) fn remove_stack_frame_at(&self, index: usize) -> Frame<Handle> {
        let frame = self.open_elems.borrow_mut().remove(index);
        self.active_formatting.borrow_mut().on_stack_frame_removed(index);
        self.sink.unref_node(frame.handle);
        frame
    }

    pub(super) fn remove_stack_frame_by_handle(&self, handle: Handle) {
        let pos = self.open_elems.borrow().position(|f| f.handle == handle);
        if let Some(pos) = pos {
            self.remove_stack_frame_at(pos);
        }
    }

    fn remove_formatting_entry(&self, index: usize) {
        let old = self.active_formatting.borrow_mut().remove(index);
        if let FormatEntry::Element { handle, .. } = old {
            self.sink.unref_node(handle);
        }
    }

    // ---- simple queries -------------------------------------------------

    pub(super) fn current_node_handle(&self) -> Handle {
        self.open_elems.borrow().current().handle
    }

    pub(super) fn current_node_type(&self) -> ElementType {
        self.open_elems.borrow().current().ty
    }

    pub(super) fn prev_node_type(&self) -> ElementType {
        self.open_elems.borrow().prev().map(|f| f.ty).unwrap_or(ElementType::Unknown)
    }

    pub(super) fn html_elem_handle(&self) -> Handle {
        self.open_elems.borrow().get(0).expect("no root element").handle
    }

    // ---- insertion point / foster parenting -----------------------------

    fn appropriate_insertion_point(&self, override_target: Option<(ElementType, Handle)>) -> InsertionPoint<Handle> {
        let (ty, target) = override_target.unwrap_or_else(|| {
            let stack = self.open_elems.borrow();
            let cur = stack.current();
            (cur.ty, cur.handle)
        });

        if !(self.foster_parenting.get() && is_foster_target(ty)) {
            if ty == ElementType::Template {
                return InsertionPoint::LastChild(self.sink.get_template_contents(target));
            }
            return InsertionPoint::LastChild(target);
        }

        let found = {
            let stack = self.open_elems.borrow();
            let mut result = None;
            for i in (0..stack.len()).rev() {
                let frame = stack.get(i).unwrap();
                if frame.ty == ElementType::Template {
                    result = Some(InsertionPoint::LastChild(self.sink.get_template_contents(frame.handle)));
                    break;
                }
                if frame.ty == ElementType::Table {
                    let before = stack.get(i - 1).expect("table with no sibling below it").handle;
                    result = Some(InsertionPoint::TableFoster { table: frame.handle, before });
                    break;
                }
            }
            result
        };

        found.unwrap_or_else(|| InsertionPoint::LastChild(self.html_elem_handle()))
    }

    fn insert_at(&self, point: InsertionPoint<Handle>, child: NodeOrText<Handle>) -> Handle {
        match point {
            InsertionPoint::LastChild(parent) => self.sink.append(parent, child),
            InsertionPoint::TableFoster { table, before } => {
                self.sink.append_based_on_parent_node(table, before, child)
            },
        }
    }

    fn insert_appropriately(&self, child: NodeOrText<Handle>, override_target: Option<(ElementType, Handle)>) -> Handle {
        let point = self.appropriate_insertion_point(override_target);
        self.insert_at(point, child)
    }

    // ---- element / text / comment insertion -----------------------------

    /// `insert_element`: create an element, insert it at the appropriate
    /// place, and (if requested) push it onto the stack of open elements.
    pub(super) fn insert_element(&self, ns: Namespace, name: markup5ever::LocalName, attrs: Vec<Attribute>, push: bool) -> Handle {
        let ty = type_from_name(&name);
        let qname = QualName::new(None, ns, name);
        let handle = self.sink.create_element(qname, attrs);
        self.insert_appropriately(NodeOrText::AppendNode(handle), None);
        if push {
            self.push_to_stack(ns, ty, handle);
        }
        handle
    }

    pub(super) fn insert_element_for(&self, tag: Tag) -> Handle {
        self.insert_element(Namespace::Html, tag.name, tag.attrs, true)
    }

    /// `insert_element_no_push`: void elements (BR, IMG, META, LINK, ...).
    pub(super) fn insert_element_no_push(&self, tag: Tag) -> Handle {
        self.insert_element(Namespace::Html, tag.name, tag.attrs, false)
    }

    /// `append_text`: insert at the appropriate place, relying on the sink
    /// to coalesce into an existing trailing text node.
    pub(super) fn append_text(&self, text: StrTendril) {
        self.insert_appropriately(NodeOrText::AppendText(text), None);
    }

    pub(super) fn append_comment(&self, text: StrTendril) {
        let comment = self.sink.create_comment(text);
        self.insert_appropriately(NodeOrText::AppendNode(comment), None);
    }

    pub(super) fn append_comment_to_doc(&self, text: StrTendril) {
        let comment = self.sink.create_comment(text);
        let doc = self.doc_handle.get().expect("document node not set");
        self.sink.append(doc, NodeOrText::AppendNode(comment));
    }

    pub(super) fn append_comment_to_html(&self, text: StrTendril) {
        let comment = self.sink.create_comment(text);
        let html = self.html_elem_handle();
        self.sink.append(html, NodeOrText::AppendNode(comment));
    }

    // ---- generic (R)CDATA / script-data side modes -----------------------

    /// `parse_generic_rcdata`: insert the element, ask the tokeniser to
    /// switch content model, and remember the mode to come back to.
    pub(super) fn enter_generic_rcdata(&self, tag: Tag, script: bool) {
        let is_textarea = tag.name.as_str() == "textarea";
        let handle = self.insert_element_for(tag);
        if is_textarea {
            if let Some(form) = self.form_elem.get() {
                self.sink.form_associate(form, handle);
            }
        }
        self.orig_mode.set(Some(self.mode.get()));
        self.mode.set(if script {
            InsertionMode::ScriptDataText
        } else {
            InsertionMode::GenericRawText
        });
    }

    // ---- implied end tags / mode reset -----------------------------------

    /// `close_implied_end_tags`: pop while the current node is one of the
    /// fixed implied-closure set, stopping early at `except` if given.
    pub(super) fn close_implied_end_tags(&self, except: Option<ElementType>) {
        loop {
            let ty = self.current_node_type();
            if !has_implied_end_tag(ty) || Some(ty) == except {
                break;
            }
            self.pop();
        }
    }

    /// `reset_insertion_mode`: a pure function of the current stack.
    pub(super) fn reset_insertion_mode(&self) -> InsertionMode {
        let stack = self.open_elems.borrow();
        for i in (0..stack.len()).rev() {
            let last = i == 0;
            let ty = stack.get(i).unwrap().ty;
            match ty {
                ElementType::Select => {
                    for j in (0..i).rev() {
                        if stack.get(j).unwrap().ty == ElementType::Table {
                            return InsertionMode::InSelectInTable;
                        }
                    }
                    return InsertionMode::InSelect;
                },
                ElementType::Td | ElementType::Th if !last => return InsertionMode::InCell,
                ElementType::Tr => return InsertionMode::InRow,
                ElementType::Tbody | ElementType::Thead | ElementType::Tfoot => return InsertionMode::InTableBody,
                ElementType::Caption => return InsertionMode::InCaption,
                ElementType::Colgroup => return InsertionMode::InColumnGroup,
                ElementType::Table => return InsertionMode::InTable,
                ElementType::Head if !last => return InsertionMode::InHead,
                ElementType::Body => return InsertionMode::InBody,
                ElementType::Frameset => return InsertionMode::InFrameset,
                ElementType::Html => {
                    return if self.head_elem.get().is_none() {
                        InsertionMode::BeforeHead
                    } else {
                        InsertionMode::AfterHead
                    };
                },
                _ => {},
            }
        }
        InsertionMode::InBody
    }

    // ---- foreign content --------------------------------------------------

    /// `adjust_foreign_attributes`: rewrite the handful of `xlink:`/`xml:`/
    /// `xmlns` attributes that carry an explicit namespace in foreign
    /// content, stripping the prefix from the local name as we go.
    pub(super) fn adjust_foreign_attributes(&self, attrs: &mut [Attribute]) {
        for attr in attrs.iter_mut() {
            let (prefix, ns, local): (Option<&str>, Namespace, &str) = match attr.name.local.as_str() {
                "xlink:actuate" => (Some("xlink"), Namespace::XLink, "actuate"),
                "xlink:arcrole" => (Some("xlink"), Namespace::XLink, "arcrole"),
                "xlink:href" => (Some("xlink"), Namespace::XLink, "href"),
                "xlink:role" => (Some("xlink"), Namespace::XLink, "role"),
                "xlink:show" => (Some("xlink"), Namespace::XLink, "show"),
                "xlink:title" => (Some("xlink"), Namespace::XLink, "title"),
                "xlink:type" => (Some("xlink"), Namespace::XLink, "type"),
                "xml:lang" => (Some("xml"), Namespace::Xml, "lang"),
                "xml:space" => (Some("xml"), Namespace::Xml, "space"),
                "xmlns" => (None, Namespace::Xmlns, "xmlns"),
                "xmlns:xlink" => (Some("xmlns"), Namespace::Xmlns, "xlink"),
                _ => continue,
            };
            attr.name = QualName::new(
                prefix.map(markup5ever::Prefix::new),
                ns,
                markup5ever::LocalName::new(local),
            );
        }
    }

    // ---- active formatting elements ---------------------------------------

    /// `reconstruct`: rebuild any trailing run of detached formatting
    /// elements by cloning each one, appending the clone, and pushing it
    /// back onto the stack.
    pub(super) fn reconstruct_active_formatting_elements(&self) {
        if self.active_formatting.borrow().tail_blocks_reconstruction() {
            return;
        }

        let mut index = self.active_formatting.borrow().len() - 1;
        while index > 0 {
            index -= 1;
            let blocks = match self.active_formatting.borrow().get(index) {
                FormatEntry::Marker => true,
                FormatEntry::Element { stack_index, .. } => stack_index.is_some(),
            };
            if blocks {
                index += 1;
                break;
            }
        }

        loop {
            let (old_handle, name, attrs) = match self.active_formatting.borrow().get(index) {
                FormatEntry::Element { handle, name, attrs, .. } => (*handle, name.clone(), attrs.clone()),
                FormatEntry::Marker => unreachable!("marker encountered during reconstruction"),
            };

            let clone = self.sink.create_element(name.clone(), attrs.clone());
            self.insert_appropriately(NodeOrText::AppendNode(clone), None);
            self.push_to_stack(name.ns, type_from_name(&name.local), clone);
            let stack_index = self.open_elems.borrow().current_index();

            self.sink.ref_node(clone);
            self.active_formatting.borrow_mut().replace(
                index,
                FormatEntry::Element { handle: clone, name, attrs, stack_index: Some(stack_index) },
            );
            self.sink.unref_node(old_handle);

            if index == self.active_formatting.borrow().len() - 1 {
                break;
            }
            index += 1;
        }
    }

    /// `clear to marker`.
    pub(super) fn clear_active_formatting_to_marker(&self) {
        for handle in self.active_formatting.borrow_mut().clear_to_marker() {
            self.sink.unref_node(handle);
        }
    }

    /// Create a formatting element for `tag`, apply the Noah's Ark clause
    /// (at most two equivalent entries since the last marker), push it,
    /// and append it to the active formatting list.
    pub(super) fn create_formatting_element_for(&self, tag: Tag) -> Handle {
        let qname = QualName::new(None, Namespace::Html, tag.name.clone());
        let matches = self.active_formatting.borrow().count_equivalent_since_marker(&qname, &tag.attrs);
        if matches.len() >= 3 {
            self.remove_formatting_entry(matches[matches.len() - 1]);
        }

        let handle = self.insert_element(Namespace::Html, tag.name, tag.attrs.clone(), true);
        let stack_index = self.open_elems.borrow().current_index();
        self.sink.ref_node(handle);
        self.active_formatting.borrow_mut().append(handle, qname, tag.attrs, stack_index);
        handle
    }

    // ---- generic end-tag closure used by IN_BODY and the adoption agency --

    /// The generic "any other end tag" rule: find the nearest open element
    /// named like `tag`, close everything above it (reporting mis-nesting),
    /// bailing out if a special element blocks the search first.
    pub(super) fn process_end_tag_in_body(&self, ty: ElementType) {
        let match_index = {
            let stack = self.open_elems.borrow();
            let mut found = None;
            for i in (0..stack.len()).rev() {
                let frame_ty = stack.get(i).unwrap().ty;
                if frame_ty == ty {
                    found = Some(i);
                    break;
                }
                if frame_ty.is_special() {
                    self.report_error("found special element while closing generic end tag".into());
                    return;
                }
            }
            found
        };

        let Some(match_index) = match_index else {
            self.report_error("no matching open element for end tag".into());
            return;
        };

        self.close_implied_end_tags(Some(ty));

        if match_index != self.open_elems.borrow().len() - 1 {
            self.report_error("mis-nested end tag".into());
        }

        while self.open_elems.borrow().len() > match_index {
            self.pop();
        }
    }

    // ---- adoption agency ---------------------------------------------------

    /// The adoption agency algorithm (HTML5 §"adoption agency algorithm").
    /// Reparents mis-nested formatting elements around block content.
    pub(super) fn adoption_agency(&self, subject: ElementType) {
        // Step 1: simple case, no reconstruction needed.
        {
            let on_stack_unlisted = {
                let stack = self.open_elems.borrow();
                let cur = stack.current();
                cur.ty == subject && self.active_formatting.borrow().position_of(cur.handle).is_none()
            };
            if on_stack_unlisted {
                self.pop();
                return;
            }
        }

        for _ in 0..8 {
            let found = {
                let list = self.active_formatting.borrow();
                list.iter_from_last_marker()
                    .filter_map(|(i, e)| match e {
                        FormatEntry::Element { handle, name, attrs, stack_index }
                            if type_from_name(&name.local) == subject =>
                        {
                            Some((i, *handle, name.clone(), attrs.clone(), *stack_index))
                        },
                        _ => None,
                    })
                    .last()
            };

            let Some((fmt_index, fmt_handle, fmt_name, fmt_attrs, fmt_stack_index)) = found else {
                self.process_end_tag_in_body(subject);
                return;
            };

            let Some(fmt_stack_index) = fmt_stack_index else {
                self.report_error("formatting element not on open element stack".into());
                self.remove_formatting_entry(fmt_index);
                return;
            };

            {
                let stack = self.open_elems.borrow();
                if !in_scope_up_to(&stack, fmt_stack_index) {
                    self.report_error("formatting element not in scope".into());
                    return;
                }
                if stack.current_index() != fmt_stack_index {
                    self.report_error("formatting element not the current node".into());
                }
            }

            let furthest_index = {
                let stack = self.open_elems.borrow();
                (fmt_stack_index..stack.len()).find(|&i| stack.get(i).unwrap().ty.is_special())
            };

            let Some(furthest_index) = furthest_index else {
                let len = self.open_elems.borrow().len();
                for _ in fmt_stack_index..len {
                    self.pop();
                }
                self.remove_formatting_entry(fmt_index);
                return;
            };

            let furthest_handle = self.open_elems.borrow().get(furthest_index).unwrap().handle;
            let common_ancestor = {
                let stack = self.open_elems.borrow();
                let f = stack.get(fmt_stack_index - 1).expect("formatting element was the root");
                (f.ty, f.handle)
            };

            let mut bookmark = Bookmark::Replace(fmt_handle);
            let mut cursor_index = furthest_index;
            let mut last_node = furthest_handle;
            let mut inner_loops = 0u32;

            loop {
                inner_loops += 1;
                cursor_index -= 1;
                let cursor_handle = self.open_elems.borrow().get(cursor_index).unwrap().handle;

                if cursor_handle == fmt_handle {
                    break;
                }

                let cursor_fmt_index = self.active_formatting.borrow().position_of(cursor_handle);

                if inner_loops > 3 {
                    if let Some(idx) = cursor_fmt_index {
                        self.remove_formatting_entry(idx);
                    }
                    self.remove_stack_frame_at(cursor_index);
                    continue;
                }

                let Some(cursor_fmt_index) = cursor_fmt_index else {
                    self.remove_stack_frame_at(cursor_index);
                    continue;
                };

                let (node_name, node_attrs) = match self.active_formatting.borrow().get(cursor_fmt_index) {
                    FormatEntry::Element { name, attrs, .. } => (name.clone(), attrs.clone()),
                    FormatEntry::Marker => unreachable!("marker among formatting entries during adoption"),
                };

                let ns = self.open_elems.borrow().get(cursor_index).unwrap().ns;
                let ty = type_from_name(&node_name.local);
                let new_node = self.sink.create_element(node_name.clone(), node_attrs.clone());

                self.sink.ref_node(new_node);
                let old_frame = self.open_elems.borrow_mut().replace(cursor_index, ns, ty, new_node);
                self.sink.unref_node(old_frame.handle);

                self.sink.ref_node(new_node);
                let old_entry = self.active_formatting.borrow_mut().replace(
                    cursor_fmt_index,
                    FormatEntry::Element {
                        handle: new_node,
                        name: node_name,
                        attrs: node_attrs,
                        stack_index: Some(cursor_index),
                    },
                );
                if let FormatEntry::Element { handle, .. } = old_entry {
                    self.sink.unref_node(handle);
                }

                if last_node == furthest_handle {
                    bookmark = Bookmark::InsertAfter(new_node);
                }

                self.sink.remove_from_parent(last_node);
                self.sink.append(new_node, NodeOrText::AppendNode(last_node));
                last_node = new_node;
            }

            self.sink.remove_from_parent(last_node);
            let point = self.appropriate_insertion_point(Some(common_ancestor));
            self.insert_at(point, NodeOrText::AppendNode(last_node));

            let new_formatting_node = self.sink.create_element(fmt_name.clone(), fmt_attrs.clone());
            self.sink.reparent_children(furthest_handle, new_formatting_node);
            self.sink.append(furthest_handle, NodeOrText::AppendNode(new_formatting_node));

            match bookmark {
                Bookmark::Replace(_) => {
                    let idx = self
                        .active_formatting
                        .borrow()
                        .position_of(fmt_handle)
                        .expect("bookmark target missing from active formatting list");
                    self.sink.ref_node(new_formatting_node);
                    let old = self.active_formatting.borrow_mut().replace(
                        idx,
                        FormatEntry::Element {
                            handle: new_formatting_node,
                            name: fmt_name.clone(),
                            attrs: fmt_attrs.clone(),
                            stack_index: None,
                        },
                    );
                    if let FormatEntry::Element { handle, .. } = old {
                        self.sink.unref_node(handle);
                    }
                },
                Bookmark::InsertAfter(prev) => {
                    let idx = self
                        .active_formatting
                        .borrow()
                        .position_of(prev)
                        .expect("bookmark target missing from active formatting list");
                    self.sink.ref_node(new_formatting_node);
                    self.active_formatting.borrow_mut().insert_after(
                        idx,
                        FormatEntry::Element {
                            handle: new_formatting_node,
                            name: fmt_name.clone(),
                            attrs: fmt_attrs.clone(),
                            stack_index: None,
                        },
                    );
                    let old_idx = self
                        .active_formatting
                        .borrow()
                        .position_of(fmt_handle)
                        .expect("formatting element missing from active formatting list");
                    self.remove_formatting_entry(old_idx);
                },
            }

            self.remove_stack_frame_by_handle(fmt_handle);
            let furthest_pos = self
                .open_elems
                .borrow()
                .position(|f| f.handle == furthest_handle)
                .expect("furthest block missing from open element stack");
            self.insert_stack_frame_at(
                furthest_pos + 1,
                Namespace::Html,
                type_from_name(&fmt_name.local),
                new_formatting_node,
            );
            if let Some(idx) = self.active_formatting.borrow().position_of(new_formatting_node) {
                self.active_formatting.borrow_mut().set_stack_index(idx, Some(furthest_pos + 1));
            }
        }
    }

    // ---- lifecycle ----------------------------------------------------------

    /// Release every handle this builder still holds a reference on: the
    /// document/head/form context slots, every open-element-stack frame,
    /// and every active-formatting-list entry. Must be called exactly
    /// once, after the tokeniser has stopped delivering tokens; the sink
    /// itself is dropped normally once `self` goes out of scope.
    pub fn finish(self) {
        if let Some(doc) = self.doc_handle.get() {
            self.sink.unref_node(doc);
        }
        if let Some(head) = self.head_elem.get() {
            self.sink.unref_node(head);
        }
        if let Some(form) = self.form_elem.get() {
            self.sink.unref_node(form);
        }
        for frame in self.open_elems.borrow().iter() {
            self.sink.unref_node(frame.handle);
        }
        for entry in self.active_formatting.borrow().iter() {
            if let FormatEntry::Element { handle, .. } = entry {
                self.sink.unref_node(*handle);
            }
        }
    }
}

/// Whether `target_index`'s element is reachable from the current node
/// without crossing a scope boundary — the in-scope check the adoption
/// agency algorithm runs against a specific stack slot rather than a type.
fn in_scope_up_to<Handle>(stack: &super::stack::OpenElementStack<Handle>, target_index: usize) -> bool {
    for i in (target_index..stack.len()).rev() {
        if i == target_index {
            return true;
        }
        let ty = stack.get(i).unwrap().ty;
        if ty == ElementType::Table || ty.is_scoping() {
            return false;
        }
    }
    true
}
