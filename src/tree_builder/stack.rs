// Copyright 2024 The html5arbor Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The stack of open elements.

use crate::interface::Namespace;
use crate::tree_builder::element_types::{is_scoping, ElementType};

const STACK_CHUNK: usize = 128;

/// One open element: its namespace, classified type, and the sink's
/// node handle.
pub(crate) struct Frame<Handle> {
    pub ns: Namespace,
    pub elem_type: ElementType,
    pub node: Handle,
}

/// Scope query variants.  Each names the set of element types a scan
/// may not cross.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub(crate) enum Scope {
    Default,
    ListItem,
    Button,
    Table,
    Select,
}

fn is_scope_boundary(scope: Scope, ty: ElementType) -> bool {
    use self::ElementType::{Button, Ol, Optgroup, Option, Table, Ul};
    match scope {
        // The scoping range covers TABLE and HTML as well; BUTTON is
        // part of the range in this enumeration.
        Scope::Default => is_scoping(ty),
        Scope::ListItem => is_scoping(ty) || ty == Ol || ty == Ul,
        Scope::Button => is_scoping(ty) || ty == Button,
        Scope::Table => ty == Table,
        Scope::Select => ty != Optgroup && ty != Option,
    }
}

/// The stack of open elements.
///
/// Slot 0 holds the html root once it exists; scope queries and the
/// formatting list use slot numbers, with 0 standing for "none", so
/// the root never participates in either.
pub(crate) struct ElemStack<Handle> {
    frames: Vec<Frame<Handle>>,
    /// Slot of the topmost TABLE, or 0 if none is open.
    current_table: usize,
}

impl<Handle> ElemStack<Handle> {
    pub fn new() -> ElemStack<Handle> {
        ElemStack {
            frames: Vec::with_capacity(STACK_CHUNK),
            current_table: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Slot of the current node.
    pub fn current_slot(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn current(&self) -> &Frame<Handle> {
        self.frames.last().expect("no current element")
    }

    pub fn get(&self, slot: usize) -> &Frame<Handle> {
        &self.frames[slot]
    }

    /// Type of the element one below the top, or `Unknown` at the
    /// bottom of the stack.
    pub fn prev_type(&self) -> ElementType {
        match self.current_slot() {
            0 => ElementType::Unknown,
            slot => self.frames[slot - 1].elem_type,
        }
    }

    pub fn current_table(&self) -> usize {
        self.current_table
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame<Handle>> {
        self.frames.iter()
    }

    /// Push a frame; returns its slot.
    pub fn push(&mut self, frame: Frame<Handle>) -> usize {
        if self.frames.len() == self.frames.capacity() {
            self.frames.reserve(STACK_CHUNK);
        }
        let slot = self.frames.len();
        if frame.elem_type == ElementType::Table {
            self.current_table = slot;
        }
        self.frames.push(frame);
        slot
    }

    pub fn pop(&mut self) -> Frame<Handle> {
        let frame = self.frames.pop().expect("no current element");
        if frame.elem_type == ElementType::Table {
            self.rescan_table();
        }
        frame
    }

    /// Remove a frame from the middle of the stack.  Slots above it
    /// shift down by one; the caller fixes up the formatting list.
    pub fn remove(&mut self, slot: usize) -> Frame<Handle> {
        let frame = self.frames.remove(slot);
        if frame.elem_type == ElementType::Table {
            self.rescan_table();
        } else if self.current_table > slot {
            self.current_table -= 1;
        }
        frame
    }

    /// Insert a frame at the given slot.  Slots at and above it shift
    /// up by one; the caller fixes up the formatting list.
    pub fn insert(&mut self, slot: usize, frame: Frame<Handle>) {
        if self.current_table >= slot {
            self.current_table += 1;
        }
        if frame.elem_type == ElementType::Table && slot > self.current_table {
            self.current_table = slot;
        }
        self.frames.insert(slot, frame);
    }

    /// Swap the node of an existing frame, returning the old handle.
    pub fn replace_node(&mut self, slot: usize, node: Handle) -> Handle {
        std::mem::replace(&mut self.frames[slot].node, node)
    }

    fn rescan_table(&mut self) {
        self.current_table = self
            .frames
            .iter()
            .rposition(|f| f.elem_type == ElementType::Table)
            .unwrap_or(0);
    }

    /// Scan from the current node downward for an HTML element of the
    /// given type, stopping at the scope's boundary set.  Returns the
    /// matching slot, or 0 if none is in scope.
    pub fn in_scope(&self, ty: ElementType, scope: Scope) -> usize {
        for slot in (1..self.frames.len()).rev() {
            let frame = &self.frames[slot];
            if frame.ns == Namespace::Html && frame.elem_type == ty {
                return slot;
            }
            if is_scope_boundary(scope, frame.elem_type) {
                break;
            }
        }
        0
    }

    /// Like `in_scope`, for any of several types.
    pub fn in_scope_any(&self, types: &[ElementType], scope: Scope) -> usize {
        for slot in (1..self.frames.len()).rev() {
            let frame = &self.frames[slot];
            if frame.ns == Namespace::Html && types.contains(&frame.elem_type) {
                return slot;
            }
            if is_scope_boundary(scope, frame.elem_type) {
                break;
            }
        }
        0
    }

    /// Is the element at `slot` reachable from the current node
    /// without crossing the scope's boundary set?
    pub fn slot_in_scope(&self, slot: usize, scope: Scope) -> bool {
        self.frames[slot + 1..]
            .iter()
            .all(|f| !is_scope_boundary(scope, f.elem_type))
    }
}

#[cfg(test)]
mod tests {
    use super::ElementType::{
        B, Body, Div, Html, Li, Marquee, Optgroup, Option, P, Select, Span, Table, Tbody, Td,
        Title, Tr, Ul,
    };
    use super::*;

    fn stack(types: &[ElementType]) -> ElemStack<u32> {
        let mut stack = ElemStack::new();
        for (i, &ty) in types.iter().enumerate() {
            stack.push(Frame {
                ns: Namespace::Html,
                elem_type: ty,
                node: i as u32,
            });
        }
        stack
    }

    #[test]
    fn scope_finds_match_above_boundary() {
        let stack = stack(&[Html, Body, P, B]);
        assert_eq!(stack.in_scope(P, Scope::Default), 2);
        assert_eq!(stack.in_scope(Body, Scope::Default), 1);
        assert_eq!(stack.in_scope(Div, Scope::Default), 0);
    }

    #[test]
    fn scope_stops_at_boundaries() {
        // <p> is hidden behind the table in default scope but the
        // table itself is findable in table scope.
        let stack1 = stack(&[Html, Body, P, Table, Tr, Td]);
        assert_eq!(stack1.in_scope(P, Scope::Default), 0);
        assert_eq!(stack1.in_scope(Table, Scope::Table), 3);
        assert_eq!(stack1.in_scope(P, Scope::Table), 0);

        // Marquee is scoping: it hides the <p> too.
        let stack2 = stack(&[Html, Body, P, Marquee, B]);
        assert_eq!(stack2.in_scope(P, Scope::Default), 0);
        assert_eq!(stack2.in_scope(Marquee, Scope::Default), 3);
    }

    #[test]
    fn list_item_scope_adds_lists() {
        let stack = stack(&[Html, Body, Li, Ul, Span]);
        assert_eq!(stack.in_scope(Li, Scope::Default), 2);
        assert_eq!(stack.in_scope(Li, Scope::ListItem), 0);
    }

    #[test]
    fn select_scope_negates() {
        let stack1 = stack(&[Html, Body, Select, Optgroup, Option]);
        assert_eq!(stack1.in_scope(Select, Scope::Select), 2);
        let stack2 = stack(&[Html, Body, Select, Div]);
        assert_eq!(stack2.in_scope(Select, Scope::Select), 0);
    }

    #[test]
    fn slot_zero_is_never_returned() {
        // The root never matches a scope query even with nothing
        // between it and the top.
        let stack = stack(&[Html]);
        assert_eq!(stack.in_scope(Html, Scope::Default), 0);
    }

    #[test]
    fn current_table_tracks_pushes_and_pops() {
        let mut stack = stack(&[Html, Body, Table, Tbody, Tr, Td, Table]);
        assert_eq!(stack.current_table(), 6);
        stack.pop();
        assert_eq!(stack.current_table(), 2);
        stack.pop(); // td
        stack.pop(); // tr
        stack.pop(); // tbody
        stack.pop(); // table
        assert_eq!(stack.current_table(), 0);
    }

    #[test]
    fn current_table_tracks_removal_and_insertion() {
        let mut stack = stack(&[Html, Body, Table, B]);
        assert_eq!(stack.current_table(), 2);
        stack.remove(1);
        assert_eq!(stack.current_table(), 1);
        stack.insert(
            1,
            Frame {
                ns: Namespace::Html,
                elem_type: Body,
                node: 9,
            },
        );
        assert_eq!(stack.current_table(), 2);
        stack.remove(2);
        assert_eq!(stack.current_table(), 0);
    }

    #[test]
    fn foreign_frames_do_not_match_scope_queries() {
        let mut stack = stack(&[Html, Body]);
        stack.push(Frame {
            ns: Namespace::Svg,
            elem_type: Title,
            node: 7,
        });
        assert_eq!(stack.in_scope(Title, Scope::Default), 0);
    }
}
