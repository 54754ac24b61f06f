// Copyright 2024 The html5arbor Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Helpers for implementing the tree builder rules.
//!
//! Many of these are named within the spec, e.g. "reset the insertion
//! mode appropriately".

use std::borrow::Cow::Borrowed;
use std::fmt::Debug;

use mac::format_if;
use tendril::StrTendril;

use crate::interface::{AppendNode, AppendText, Namespace, NodeOrText, QuirksMode, TreeSink};
use crate::tokenizer::{ContentModel, StartTag, Tag};
use crate::tree_builder::element_types::ElementType::{
    A, Body, Button, Caption, Dd, Desc, Dt, Fieldset, ForeignObject, Html, Input, Li, Mi, Mn, Mo,
    Ms, Mtext, Object, Optgroup, P, Rp, Rt, Script, Select, Table, Tbody, Td, Textarea, Tfoot, Th,
    Thead, Title, Tr,
};
use crate::tree_builder::element_types::{
    is_formatting, is_implied_end, is_scoping, is_special, ElementType,
};
use crate::tree_builder::list::{FormatElem, FormatEntry};
use crate::tree_builder::stack::{Frame, Scope};
use crate::tree_builder::types::ProcessResult::{self, Done, DoneAckSelfClosing};
use crate::tree_builder::types::PushFlag::{self, NoPush, Push};
use crate::tree_builder::types::{InsertionMode, TextCollector, Token};
use crate::tree_builder::TreeBuilder;

/// Is the current node of an element with this type part of the
/// "in table" insertion group, i.e. a foster-parenting trigger?
fn is_table_furniture(ty: ElementType) -> bool {
    matches!(ty, Table | Tbody | Tfoot | Thead | Tr)
}

pub(crate) fn mathml_text_integration_point(ns: Namespace, ty: ElementType) -> bool {
    ns == Namespace::MathMl && matches!(ty, Mi | Mo | Mn | Ms | Mtext)
}

pub(crate) fn html_integration_point(ns: Namespace, ty: ElementType) -> bool {
    ns == Namespace::Svg && matches!(ty, ForeignObject | Desc | Title)
}

#[doc(hidden)]
impl<Handle, Sink> TreeBuilder<Handle, Sink>
where
    Handle: Clone,
    Sink: TreeSink<Handle = Handle>,
{
    //§ stack-of-open-elements
    pub(crate) fn current_type(&self) -> ElementType {
        self.stack.borrow().current().elem_type
    }

    pub(crate) fn current_ns(&self) -> Namespace {
        self.stack.borrow().current().ns
    }

    pub(crate) fn current_node(&self) -> Handle {
        self.stack.borrow().current().node.clone()
    }

    pub(crate) fn html_root(&self) -> Handle {
        self.stack.borrow().get(0).node.clone()
    }

    /// The second element on the stack, if it is a body element.
    pub(crate) fn body_elem(&self) -> Option<Handle> {
        let stack = self.stack.borrow();
        if stack.len() > 1 && stack.get(1).elem_type == Body {
            Some(stack.get(1).node.clone())
        } else {
            None
        }
    }

    pub(crate) fn push_frame(&self, ns: Namespace, ty: ElementType, node: Handle) -> usize {
        self.stack.borrow_mut().push(Frame {
            ns,
            elem_type: ty,
            node,
        })
    }

    /// Pop the current node.  Formatting-list entries pointing at the
    /// popped slot go stale; popping a table restores the previous
    /// `current_table`.
    pub(crate) fn pop(&self) -> Frame<Handle> {
        let (frame, slot) = {
            let mut stack = self.stack.borrow_mut();
            let frame = stack.pop();
            (frame, stack.len())
        };
        let ty = frame.elem_type;
        if is_formatting(ty) || (is_scoping(ty) && ty != Html && ty != Table) {
            self.formatting.borrow_mut().invalidate_slot(slot);
        }
        frame
    }

    /// Remove a frame from the middle of the stack, keeping the
    /// formatting list's indices consistent.
    pub(crate) fn remove_frame(&self, slot: usize) -> Frame<Handle> {
        let frame = self.stack.borrow_mut().remove(slot);
        self.formatting.borrow_mut().remove_slot(slot);
        frame
    }

    pub(crate) fn insert_frame(&self, slot: usize, frame: Frame<Handle>) {
        self.formatting.borrow_mut().insert_slot(slot);
        self.stack.borrow_mut().insert(slot, frame);
    }

    pub(crate) fn remove_from_stack(&self, node: &Handle) {
        let slot = {
            let stack = self.stack.borrow();
            (1..stack.len()).rev().find(|&s| self.sink.same_node(&stack.get(s).node, node))
        };
        if let Some(slot) = slot {
            self.remove_frame(slot);
        }
    }

    /// Pop until a frame of the given type has been popped.  The
    /// caller must guarantee one is on the stack.  Returns the number
    /// of frames popped.
    pub(crate) fn pop_until(&self, ty: ElementType) -> usize {
        let mut n = 0;
        loop {
            n += 1;
            if self.pop().elem_type == ty {
                return n;
            }
        }
    }

    /// Pop until one with the given type has been popped, signalling
    /// an error if it was not the first.
    pub(crate) fn expect_to_close(&self, ty: ElementType) {
        if self.pop_until(ty) != 1 {
            self.sink.parse_error(format_if!(
                self.opts.exact_errors,
                "Unexpected open element",
                "Unexpected open element while closing {:?}",
                ty
            ));
        }
    }

    /// Pop until the current node satisfies the predicate.  Used to
    /// "clear the stack back to a table context" and friends.
    pub(crate) fn pop_until_current(&self, pred: impl Fn(ElementType) -> bool) {
        while !pred(self.current_type()) {
            self.pop();
        }
    }

    pub(crate) fn in_scope(&self, ty: ElementType, scope: Scope) -> usize {
        self.stack.borrow().in_scope(ty, scope)
    }

    pub(crate) fn in_scope_any(&self, types: &[ElementType], scope: Scope) -> usize {
        self.stack.borrow().in_scope_any(types, scope)
    }

    //§ closing-elements-that-have-implied-end-tags
    pub(crate) fn close_implied_end_tags(&self, except: Option<ElementType>) {
        loop {
            let ty = self.current_type();
            if !is_implied_end(ty) || Some(ty) == except {
                return;
            }
            self.pop();
        }
    }

    pub(crate) fn close_p_element(&self) {
        self.close_implied_end_tags(Some(P));
        self.expect_to_close(P);
    }

    pub(crate) fn close_p_element_in_button_scope(&self) {
        if self.in_scope(P, Scope::Button) != 0 {
            self.close_p_element();
        }
    }

    pub(crate) fn close_the_cell(&self) {
        self.close_implied_end_tags(None);
        let mut extra = 0;
        loop {
            let frame = self.pop();
            if matches!(frame.elem_type, Td | Th) {
                break;
            }
            extra += 1;
        }
        if extra != 0 {
            self.sink
                .parse_error(Borrowed("expected to close <td> or <th> with cell"));
        }
        self.clear_active_formatting_to_marker();
        self.mode.set(InsertionMode::InRow);
    }

    /// Signal an error depending on the state of the stack of open
    /// elements at the end of the body.
    pub(crate) fn check_body_end(&self) {
        fn body_end_ok(ty: ElementType) -> bool {
            matches!(
                ty,
                Dd | Dt
                    | Li
                    | Optgroup
                    | ElementType::Option
                    | P
                    | Rp
                    | Rt
                    | Tbody
                    | Td
                    | Tfoot
                    | Th
                    | Thead
                    | Tr
                    | Body
                    | Html
            )
        }
        let bad = self
            .stack
            .borrow()
            .iter()
            .any(|frame| !body_end_ok(frame.elem_type));
        if bad {
            self.sink
                .parse_error(Borrowed("Unexpected open tag at end of body"));
        }
    }

    //§ reset-the-insertion-mode-appropriately
    pub(crate) fn reset_insertion_mode(&self) -> InsertionMode {
        let stack = self.stack.borrow();
        for slot in (1..stack.len()).rev() {
            match stack.get(slot).elem_type {
                Td | Th => return InsertionMode::InCell,
                Tr => return InsertionMode::InRow,
                Tbody | Tfoot | Thead => return InsertionMode::InTableBody,
                Caption => return InsertionMode::InCaption,
                Table => return InsertionMode::InTable,
                Body => return InsertionMode::InBody,
                // Select, Colgroup, Head, Frameset, Html: fragment
                // cases; this parser has no fragment mode.
                _ => {},
            }
        }
        InsertionMode::InBody
    }

    //§ creating-and-inserting-nodes
    /// A tag token for an element the parser conjures up itself.
    pub(crate) fn phantom_tag(&self, ty: ElementType) -> Tag {
        Tag {
            kind: StartTag,
            name: StrTendril::from_slice(ty.name()),
            ns: Namespace::Html,
            self_closing: false,
            attrs: vec![],
        }
    }

    pub(crate) fn create_root(&self, attrs: Vec<crate::interface::Attribute>) {
        let mut tag = self.phantom_tag(Html);
        tag.attrs = attrs;
        let elem = self.sink.create_element(&tag);
        self.push_frame(Namespace::Html, Html, elem.clone());
        let _ = self.sink.append_child(&self.doc_handle, AppendNode(elem));
    }

    /// Insert a node or text at the current position, foster parenting
    /// if we are inside a table and the flag is set.  Returns the
    /// effective child.
    pub(crate) fn insert_node(&self, child: NodeOrText<Handle>) -> Handle {
        if self.in_table_foster.get() && is_table_furniture(self.current_type()) {
            self.foster_insert(child)
        } else {
            let parent = self.current_node();
            self.sink.append_child(&parent, child)
        }
    }

    /// Insert outside the nearest table: immediately before the table
    /// in its parent if it has one, otherwise as the last child of the
    /// element just below the table on the stack.
    pub(crate) fn foster_insert(&self, child: NodeOrText<Handle>) -> Handle {
        let (table, below) = {
            let stack = self.stack.borrow();
            let slot = stack.current_table();
            if slot == 0 {
                (None, stack.current().node.clone())
            } else {
                (
                    Some(stack.get(slot).node.clone()),
                    stack.get(slot - 1).node.clone(),
                )
            }
        };
        match table.as_ref().map(|t| (t, self.sink.get_parent(t))) {
            Some((table, Some(parent))) => self.sink.insert_before(&parent, child, table),
            Some((_, None)) | None => self.sink.append_child(&below, child),
        }
    }

    pub(crate) fn insert_element(
        &self,
        push: PushFlag,
        ns: Namespace,
        ty: ElementType,
        tag: &Tag,
    ) -> Handle {
        let elem = self.sink.create_element(tag);

        if ns == Namespace::Html && matches!(ty, Button | Fieldset | Input | Object | Select) {
            if let Some(form) = self.form_elem.borrow().as_ref() {
                self.sink.form_associate(form, &elem);
            }
        }

        let _ = self.insert_node(AppendNode(elem.clone()));
        if let Push = push {
            self.push_frame(ns, ty, elem.clone());
        }
        elem
    }

    pub(crate) fn insert_element_for(&self, ty: ElementType, tag: &Tag) -> Handle {
        self.insert_element(Push, Namespace::Html, ty, tag)
    }

    pub(crate) fn insert_and_pop_element_for(&self, ty: ElementType, tag: &Tag) -> Handle {
        self.insert_element(NoPush, Namespace::Html, ty, tag)
    }

    pub(crate) fn insert_phantom(&self, ty: ElementType) -> Handle {
        let tag = self.phantom_tag(ty);
        self.insert_element(Push, Namespace::Html, ty, &tag)
    }

    pub(crate) fn append_text(&self, text: StrTendril) -> ProcessResult {
        let _ = self.insert_node(AppendText(text));
        Done
    }

    pub(crate) fn append_comment(&self, text: StrTendril) -> ProcessResult {
        let comment = self.sink.create_comment(text);
        let parent = self.current_node();
        let _ = self.sink.append_child(&parent, AppendNode(comment));
        Done
    }

    pub(crate) fn append_comment_to_doc(&self, text: StrTendril) -> ProcessResult {
        let comment = self.sink.create_comment(text);
        let _ = self.sink.append_child(&self.doc_handle, AppendNode(comment));
        Done
    }

    pub(crate) fn append_comment_to_html(&self, text: StrTendril) -> ProcessResult {
        let comment = self.sink.create_comment(text);
        let target = self.html_root();
        let _ = self.sink.append_child(&target, AppendNode(comment));
        Done
    }

    //§ the-list-of-active-formatting-elements
    pub(crate) fn create_formatting_element_for(&self, ty: ElementType, tag: &Tag) -> Handle {
        // The "Noah's Ark" clause, at type granularity: the sink
        // contract has no attribute comparison, so three same-type
        // entries since the last marker evict the earliest.
        {
            let mut list = self.formatting.borrow_mut();
            if list.count_since_marker(ty) >= 3 {
                if let Some(first) = list.first_since_marker(ty) {
                    list.remove(first);
                }
            }
        }

        let elem = self.insert_element(Push, Namespace::Html, ty, tag);
        let slot = self.stack.borrow().current_slot();
        self.formatting.borrow_mut().push(FormatElem {
            ns: Namespace::Html,
            elem_type: ty,
            node: elem.clone(),
            stack_index: slot,
        });
        elem
    }

    pub(crate) fn clear_active_formatting_to_marker(&self) {
        self.formatting.borrow_mut().clear_to_marker();
    }

    pub(crate) fn position_in_active_formatting(&self, node: &Handle) -> Option<usize> {
        self.formatting.borrow().iter().position(|entry| match entry {
            FormatEntry::Element(elem) => self.sink.same_node(&elem.node, node),
            FormatEntry::Marker => false,
        })
    }

    fn entry_is_marker_or_open(&self, entry: &FormatEntry<Handle>) -> bool {
        match entry {
            FormatEntry::Marker => true,
            FormatEntry::Element(elem) => elem.stack_index != 0,
        }
    }

    //§ reconstruct-the-active-formatting-elements
    pub(crate) fn reconstruct_active_formatting_elements(&self) {
        let start = {
            let list = self.formatting.borrow();
            if list.is_empty() {
                return;
            }
            let mut index = list.len() - 1;
            if self.entry_is_marker_or_open(list.get(index)) {
                return;
            }
            // Rewind to the first stale entry after a marker or a
            // still-open element.
            loop {
                if index == 0 {
                    break;
                }
                if self.entry_is_marker_or_open(list.get(index - 1)) {
                    break;
                }
                index -= 1;
            }
            index
        };

        // Advance: one shallow clone per stale entry, opened at the
        // current position.
        let mut index = start;
        loop {
            let (ns, ty, node) = {
                let list = self.formatting.borrow();
                let elem = list.elem(index);
                (elem.ns, elem.elem_type, elem.node.clone())
            };
            let clone = self.sink.clone_node(&node);
            let _ = self.insert_node(AppendNode(clone.clone()));
            let slot = self.push_frame(ns, ty, clone.clone());
            self.formatting.borrow_mut().replace(
                index,
                FormatElem {
                    ns,
                    elem_type: ty,
                    node: clone,
                    stack_index: slot,
                },
            );
            if index + 1 == self.formatting.borrow().len() {
                return;
            }
            index += 1;
        }
    }

    //§ the-adoption-agency-algorithm
    pub(crate) fn adoption_agency(&self, subject: ElementType) {
        // The subject is current and not an active formatting element:
        // a plain pop suffices.
        if self.current_type() == subject && self.current_ns() == Namespace::Html {
            let node = self.current_node();
            if self.position_in_active_formatting(&node).is_none() {
                self.pop();
                return;
            }
        }

        for _ in 0..8 {
            let found = self.formatting.borrow().last_matching(subject);
            let Some((entry_index, fmt)) = found else {
                return self.process_end_tag_in_body(subject);
            };

            debug_assert_eq!(fmt.elem_type, subject);
            let fmt_slot = fmt.stack_index;
            if fmt_slot == 0 {
                self.sink
                    .parse_error(Borrowed("Formatting element not open"));
                self.formatting.borrow_mut().remove(entry_index);
                return;
            }

            if !self.stack.borrow().slot_in_scope(fmt_slot, Scope::Default) {
                self.sink
                    .parse_error(Borrowed("Formatting element not in scope"));
                return;
            }

            if fmt_slot != self.stack.borrow().current_slot() {
                self.sink
                    .parse_error(Borrowed("Formatting element not current node"));
            }

            // The furthest block: earliest special element above the
            // formatting element.
            let found = {
                let stack = self.stack.borrow();
                (fmt_slot + 1..stack.len()).find(|&slot| {
                    let ty = stack.get(slot).elem_type;
                    is_special(ty) || is_scoping(ty)
                })
            };

            let Some(mut furthest_block) = found else {
                // Nothing special above: pop through the formatting
                // element and retire its entry.
                while self.stack.borrow().len() > fmt_slot {
                    self.pop();
                }
                self.formatting.borrow_mut().remove(entry_index);
                return;
            };

            let common_ancestor = fmt_slot - 1;
            let mut bookmark = entry_index;

            // Walk from the furthest block down towards the formatting
            // element, cloning list members and discarding the rest.
            let mut node_slot = furthest_block;
            let mut last_node = self.stack.borrow().get(furthest_block).node.clone();
            let mut last_is_furthest = true;
            let mut inner = 0;
            loop {
                inner += 1;
                node_slot -= 1;
                if node_slot == fmt_slot {
                    break;
                }

                let node_entry = self.formatting.borrow().index_of_slot(node_slot);
                if inner > 3 {
                    if let Some(index) = node_entry {
                        self.formatting.borrow_mut().remove(index);
                        if index < bookmark {
                            bookmark -= 1;
                        }
                    }
                    self.remove_frame(node_slot);
                    furthest_block -= 1;
                    continue;
                }
                let Some(index) = node_entry else {
                    self.remove_frame(node_slot);
                    furthest_block -= 1;
                    continue;
                };

                let (ns, ty, node) = {
                    let list = self.formatting.borrow();
                    let elem = list.elem(index);
                    (elem.ns, elem.elem_type, elem.node.clone())
                };
                let clone = self.sink.clone_node(&node);
                self.stack.borrow_mut().replace_node(node_slot, clone.clone());
                self.formatting.borrow_mut().replace(
                    index,
                    FormatElem {
                        ns,
                        elem_type: ty,
                        node: clone.clone(),
                        stack_index: node_slot,
                    },
                );

                if last_is_furthest {
                    bookmark = index + 1;
                    last_is_furthest = false;
                }

                self.sink.remove_from_parent(&last_node);
                let _ = self.sink.append_child(&clone, AppendNode(last_node));
                last_node = clone;
            }

            // Hang the detached chain off the common ancestor, foster
            // parenting around table furniture.
            self.sink.remove_from_parent(&last_node);
            {
                let (ancestor_ty, ancestor_node) = {
                    let stack = self.stack.borrow();
                    let frame = stack.get(common_ancestor);
                    (frame.elem_type, frame.node.clone())
                };
                if is_table_furniture(ancestor_ty) {
                    let _ = self.foster_insert(AppendNode(last_node));
                } else {
                    let _ = self.sink.append_child(&ancestor_node, AppendNode(last_node));
                }
            }

            // A fresh clone of the formatting element takes over the
            // furthest block's children.
            let new_elem = self.sink.clone_node(&fmt.node);
            {
                let fb_node = self.stack.borrow().get(furthest_block).node.clone();
                self.sink.reparent_children(&fb_node, &new_elem);
                let _ = self.sink.append_child(&fb_node, AppendNode(new_elem.clone()));
            }

            // Retire the old list entry; the clone goes in at the
            // bookmark.
            {
                let mut list = self.formatting.borrow_mut();
                let old_index = list
                    .index_of_slot(fmt_slot)
                    .expect("formatting element entry disappeared");
                list.remove(old_index);
                if old_index < bookmark {
                    bookmark -= 1;
                }
            }

            // Stack: the formatting element's frame goes away and the
            // clone lands right above the furthest block.
            self.remove_frame(fmt_slot);
            furthest_block -= 1;
            let clone_slot = furthest_block + 1;
            self.insert_frame(
                clone_slot,
                Frame {
                    ns: fmt.ns,
                    elem_type: subject,
                    node: new_elem.clone(),
                },
            );
            self.formatting.borrow_mut().insert(
                bookmark,
                FormatElem {
                    ns: fmt.ns,
                    elem_type: subject,
                    node: new_elem,
                    stack_index: clone_slot,
                },
            );
        }
    }

    /// The "any other end tag" rules of IN_BODY.
    pub(crate) fn process_end_tag_in_body(&self, ty: ElementType) {
        let match_slot = {
            let stack = self.stack.borrow();
            let mut found = None;
            for slot in (1..stack.len()).rev() {
                let frame = stack.get(slot);
                if frame.ns == Namespace::Html && frame.elem_type == ty {
                    found = Some(slot);
                    break;
                }
                if is_special(frame.elem_type) || is_scoping(frame.elem_type) {
                    break;
                }
            }
            found
        };

        let Some(match_slot) = match_slot else {
            self.sink
                .parse_error(Borrowed("Found special tag while closing generic tag"));
            return;
        };

        self.close_implied_end_tags(Some(ty));

        if match_slot != self.stack.borrow().current_slot() {
            self.sink.parse_error(format_if!(
                self.opts.exact_errors,
                "Unexpected end tag",
                "Mis-nested end tag {:?}",
                ty
            ));
        }
        while self.stack.borrow().len() > match_slot {
            self.pop();
        }
    }

    /// A second `<a>` before the first was closed: close the first by
    /// adoption and drop whatever is left of it.
    pub(crate) fn handle_misnested_a_tag(&self) {
        let node = {
            let list = self.formatting.borrow();
            match list.last_matching(A) {
                Some((_, snap)) => snap.node,
                None => return,
            }
        };
        self.sink
            .parse_error(Borrowed("<a> before previous <a> was closed"));
        self.adoption_agency(A);
        if let Some(index) = self.position_in_active_formatting(&node) {
            self.formatting.borrow_mut().remove(index);
        }
        self.remove_from_stack(&node);
    }

    //§ parsing-elements-that-contain-only-text
    /// Switch to text collection for the element this tag opens.  The
    /// element is inserted but not pushed; the tokenizer is asked for
    /// the matching content model.
    pub(crate) fn parse_generic_rcdata(
        &self,
        ty: ElementType,
        tag: &Tag,
        rcdata: bool,
    ) -> ProcessResult {
        let elem = self.sink.create_element(tag);
        if ty == Textarea {
            if let Some(form) = self.form_elem.borrow().as_ref() {
                self.sink.form_associate(form, &elem);
            }
        }
        let _ = self.insert_node(AppendNode(elem.clone()));
        *self.collect.borrow_mut() = Some(TextCollector {
            orig_mode: self.mode.get(),
            elem_type: ty,
            node: elem,
            text: StrTendril::new(),
        });
        self.mode.set(InsertionMode::GenericRcdata);
        ProcessResult::ToContentModel(if rcdata {
            ContentModel::Rcdata
        } else {
            ContentModel::Cdata
        })
    }

    pub(crate) fn parse_script(&self, tag: &Tag) -> ProcessResult {
        let result = self.parse_generic_rcdata(Script, tag, false);
        self.mode.set(InsertionMode::ScriptCollectCharacters);
        result
    }

    /// Emit the collected characters as a single text child and
    /// restore the saved insertion mode.
    pub(crate) fn finish_collected_text(&self) {
        let collector = self.collect.borrow_mut().take();
        let Some(collector) = collector else {
            return;
        };
        if !collector.text.is_empty() {
            let text = self.sink.create_text(collector.text);
            let _ = self.sink.append_child(&collector.node, AppendNode(text));
        }
        self.mode.set(collector.orig_mode);
    }

    //§ foreign-content
    pub(crate) fn enter_foreign(&self, mut tag: Tag, ty: ElementType, ns: Namespace) -> ProcessResult {
        match ns {
            Namespace::MathMl => self.adjust_mathml_attributes(&mut tag),
            Namespace::Svg => self.adjust_svg_attributes(&mut tag),
            _ => {},
        }
        self.adjust_foreign_attributes(&mut tag);

        if tag.self_closing {
            self.insert_element(NoPush, ns, ty, &tag);
            DoneAckSelfClosing
        } else {
            self.insert_element(Push, ns, ty, &tag);
            self.second_mode.set(self.mode.get());
            self.mode.set(InsertionMode::InForeignContent);
            Done
        }
    }

    pub(crate) fn foreign_start_tag(&self, mut tag: Tag, ty: ElementType) -> ProcessResult {
        let ns = self.current_ns();
        match ns {
            Namespace::MathMl => self.adjust_mathml_attributes(&mut tag),
            Namespace::Svg => {
                self.adjust_svg_tag_name(&mut tag);
                self.adjust_svg_attributes(&mut tag);
            },
            _ => {},
        }
        self.adjust_foreign_attributes(&mut tag);

        if tag.self_closing {
            self.insert_element(NoPush, ns, ty, &tag);
            DoneAckSelfClosing
        } else {
            self.insert_element(Push, ns, ty, &tag);
            Done
        }
    }

    /// Pop foreign frames until an HTML element or an integration
    /// point is current, then hand control back to the saved mode.
    pub(crate) fn foreign_break_out(&self) {
        loop {
            let (ns, ty) = {
                let stack = self.stack.borrow();
                let frame = stack.current();
                (frame.ns, frame.elem_type)
            };
            if ns == Namespace::Html
                || mathml_text_integration_point(ns, ty)
                || html_integration_point(ns, ty)
            {
                break;
            }
            self.pop();
        }
        self.mode.set(self.second_mode.get());
    }

    //§ adjust-foreign-attributes
    pub(crate) fn adjust_foreign_attributes(&self, tag: &mut Tag) {
        for attr in &mut tag.attrs {
            let (ns, strip) = {
                let name: &str = &attr.name;
                if let Some(rest) = name.strip_prefix("xlink:") {
                    if matches!(
                        rest,
                        "actuate" | "arcrole" | "href" | "role" | "show" | "title" | "type"
                    ) {
                        (Namespace::XLink, 6)
                    } else {
                        continue;
                    }
                } else if let Some(rest) = name.strip_prefix("xml:") {
                    if matches!(rest, "base" | "lang" | "space") {
                        (Namespace::Xml, 4)
                    } else {
                        continue;
                    }
                } else if name == "xmlns" {
                    (Namespace::XmlNs, 0)
                } else if name == "xmlns:xlink" {
                    (Namespace::XmlNs, 6)
                } else {
                    continue;
                }
            };
            attr.ns = ns;
            if strip > 0 {
                let len = attr.name.len32() - strip;
                attr.name = attr.name.subtendril(strip, len);
            }
        }
    }

    pub(crate) fn adjust_mathml_attributes(&self, tag: &mut Tag) {
        for attr in &mut tag.attrs {
            if &*attr.name == "definitionurl" {
                attr.name = StrTendril::from_slice("definitionURL");
            }
        }
    }

    pub(crate) fn adjust_svg_attributes(&self, tag: &mut Tag) {
        for attr in &mut tag.attrs {
            let replacement = match &*attr.name {
                "attributename" => "attributeName",
                "attributetype" => "attributeType",
                "basefrequency" => "baseFrequency",
                "baseprofile" => "baseProfile",
                "calcmode" => "calcMode",
                "clippathunits" => "clipPathUnits",
                "diffuseconstant" => "diffuseConstant",
                "edgemode" => "edgeMode",
                "filterunits" => "filterUnits",
                "glyphref" => "glyphRef",
                "gradienttransform" => "gradientTransform",
                "gradientunits" => "gradientUnits",
                "kernelmatrix" => "kernelMatrix",
                "kernelunitlength" => "kernelUnitLength",
                "keypoints" => "keyPoints",
                "keysplines" => "keySplines",
                "keytimes" => "keyTimes",
                "lengthadjust" => "lengthAdjust",
                "limitingconeangle" => "limitingConeAngle",
                "markerheight" => "markerHeight",
                "markerunits" => "markerUnits",
                "markerwidth" => "markerWidth",
                "maskcontentunits" => "maskContentUnits",
                "maskunits" => "maskUnits",
                "numoctaves" => "numOctaves",
                "pathlength" => "pathLength",
                "patterncontentunits" => "patternContentUnits",
                "patterntransform" => "patternTransform",
                "patternunits" => "patternUnits",
                "pointsatx" => "pointsAtX",
                "pointsaty" => "pointsAtY",
                "pointsatz" => "pointsAtZ",
                "preservealpha" => "preserveAlpha",
                "preserveaspectratio" => "preserveAspectRatio",
                "primitiveunits" => "primitiveUnits",
                "refx" => "refX",
                "refy" => "refY",
                "repeatcount" => "repeatCount",
                "repeatdur" => "repeatDur",
                "requiredextensions" => "requiredExtensions",
                "requiredfeatures" => "requiredFeatures",
                "specularconstant" => "specularConstant",
                "specularexponent" => "specularExponent",
                "spreadmethod" => "spreadMethod",
                "startoffset" => "startOffset",
                "stddeviation" => "stdDeviation",
                "stitchtiles" => "stitchTiles",
                "surfacescale" => "surfaceScale",
                "systemlanguage" => "systemLanguage",
                "tablevalues" => "tableValues",
                "targetx" => "targetX",
                "targety" => "targetY",
                "textlength" => "textLength",
                "viewbox" => "viewBox",
                "viewtarget" => "viewTarget",
                "xchannelselector" => "xChannelSelector",
                "ychannelselector" => "yChannelSelector",
                "zoomandpan" => "zoomAndPan",
                _ => continue,
            };
            attr.name = StrTendril::from_slice(replacement);
        }
    }

    pub(crate) fn adjust_svg_tag_name(&self, tag: &mut Tag) {
        let replacement = match &*tag.name {
            "altglyph" => "altGlyph",
            "altglyphdef" => "altGlyphDef",
            "altglyphitem" => "altGlyphItem",
            "animatecolor" => "animateColor",
            "animatemotion" => "animateMotion",
            "animatetransform" => "animateTransform",
            "clippath" => "clipPath",
            "feblend" => "feBlend",
            "fecolormatrix" => "feColorMatrix",
            "fecomponenttransfer" => "feComponentTransfer",
            "fecomposite" => "feComposite",
            "feconvolvematrix" => "feConvolveMatrix",
            "fediffuselighting" => "feDiffuseLighting",
            "fedisplacementmap" => "feDisplacementMap",
            "fedistantlight" => "feDistantLight",
            "fedropshadow" => "feDropShadow",
            "feflood" => "feFlood",
            "fefunca" => "feFuncA",
            "fefuncb" => "feFuncB",
            "fefuncg" => "feFuncG",
            "fefuncr" => "feFuncR",
            "fegaussianblur" => "feGaussianBlur",
            "feimage" => "feImage",
            "femerge" => "feMerge",
            "femergenode" => "feMergeNode",
            "femorphology" => "feMorphology",
            "feoffset" => "feOffset",
            "fepointlight" => "fePointLight",
            "fespecularlighting" => "feSpecularLighting",
            "fespotlight" => "feSpotLight",
            "fetile" => "feTile",
            "feturbulence" => "feTurbulence",
            "foreignobject" => "foreignObject",
            "glyphref" => "glyphRef",
            "lineargradient" => "linearGradient",
            "radialgradient" => "radialGradient",
            "textpath" => "textPath",
            _ => return,
        };
        tag.name = StrTendril::from_slice(replacement);
    }

    //§ the-in-table-foster-flag
    /// Process a token with the in-body rules while foster parenting
    /// is switched on.
    pub(crate) fn foster_parent_in_body(&self, token: Token) -> ProcessResult {
        self.in_table_foster.set(true);
        let result = self.step(InsertionMode::InBody, token);
        self.in_table_foster.set(false);
        result
    }

    //§ misc
    pub(crate) fn set_quirks_mode(&self, mode: QuirksMode) {
        self.quirks_mode.set(mode);
        self.sink.set_quirks_mode(mode);
    }

    pub(crate) fn unexpected<T: Debug>(&self, thing: &T) -> ProcessResult {
        self.sink.parse_error(format_if!(
            self.opts.exact_errors,
            "Unexpected token",
            "Unexpected token {:?} in insertion mode {:?}",
            thing,
            self.mode.get()
        ));
        Done
    }

    pub(crate) fn is_type_hidden(&self, tag: &Tag) -> bool {
        match tag.get_attribute("type") {
            Some(attr) => attr.value.eq_ignore_ascii_case("hidden"),
            None => false,
        }
    }

    pub(crate) fn is_fontish(&self, tag: &Tag) -> bool {
        tag.get_attribute("color").is_some()
            || tag.get_attribute("face").is_some()
            || tag.get_attribute("size").is_some()
    }
}
