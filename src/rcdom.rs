// Copyright 2024 The html5arbor Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A simple reference-counted DOM.
//!
//! This is sufficient as a static parse tree, but don't build a
//! web browser using it. :)
//!
//! Nodes own their children and hold only weak references to their
//! parents, so a detached subtree is freed as soon as the last
//! external handle to it goes away.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::mem;
use std::rc::{Rc, Weak};

use tendril::StrTendril;

use crate::interface::tree_builder::{NodeOrText, QuirksMode, TreeSink};
use crate::interface::{Attribute, Namespace};
use crate::tokenizer::Tag;

/// The different kinds of nodes in the DOM.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// The `Document` itself - the root node of a HTML document.
    Document,

    /// A `DOCTYPE` with name, public id, and system id.
    Doctype {
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    },

    /// A text node.
    Text { contents: RefCell<StrTendril> },

    /// A comment.
    Comment { contents: StrTendril },

    /// An element with attributes.
    Element {
        name: StrTendril,
        ns: Namespace,
        attrs: RefCell<Vec<Attribute>>,
    },
}

/// A DOM node.
pub struct Node {
    /// Represents this node's data.
    pub data: NodeData,
    /// Parent node.
    pub parent: Cell<Option<WeakHandle>>,
    /// Child nodes of this node.
    pub children: RefCell<Vec<Handle>>,
}

impl Node {
    fn new(data: NodeData) -> Handle {
        Rc::new(Node {
            data,
            parent: Cell::new(None),
            children: RefCell::new(Vec::new()),
        })
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        // Free deeply nested trees iteratively rather than by drop
        // recursion.
        let mut nodes = mem::take(&mut *self.children.borrow_mut());
        while let Some(node) = nodes.pop() {
            let children = mem::take(&mut *node.children.borrow_mut());
            nodes.extend(children);
        }
    }
}

/// Reference to a DOM node.
pub type Handle = Rc<Node>;

/// Weak reference to a DOM node, used for parent pointers.
pub type WeakHandle = Weak<Node>;

fn append(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

fn get_parent(node: &Handle) -> Option<Handle> {
    let weak = node.parent.take();
    let parent = weak.as_ref().and_then(Weak::upgrade);
    node.parent.set(weak);
    parent
}

fn remove_from_parent(target: &Handle) {
    let Some(parent) = get_parent(target) else {
        return;
    };
    let mut children = parent.children.borrow_mut();
    if let Some(index) = children.iter().position(|child| Rc::ptr_eq(child, target)) {
        children.remove(index);
    }
    target.parent.set(None);
}

fn last_child_is_text(parent: &Handle) -> Option<Handle> {
    let children = parent.children.borrow();
    let last = children.last()?;
    match last.data {
        NodeData::Text { .. } => Some(last.clone()),
        _ => None,
    }
}

/// The DOM itself; the result of parsing.
pub struct RcDom {
    /// The `Document` itself.
    pub document: Handle,

    /// Errors that occurred during parsing.
    pub errors: RefCell<Vec<Cow<'static, str>>>,

    /// The document's quirks mode.
    pub quirks_mode: Cell<QuirksMode>,
}

impl Default for RcDom {
    fn default() -> RcDom {
        RcDom {
            document: Node::new(NodeData::Document),
            errors: RefCell::new(vec![]),
            quirks_mode: Cell::new(QuirksMode::NoQuirks),
        }
    }
}

impl TreeSink for RcDom {
    type Handle = Handle;

    fn parse_error(&self, msg: Cow<'static, str>) {
        self.errors.borrow_mut().push(msg);
    }

    fn get_document(&self) -> Handle {
        self.document.clone()
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        self.quirks_mode.set(mode);
    }

    fn same_node(&self, x: &Handle, y: &Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn create_element(&self, tag: &Tag) -> Handle {
        Node::new(NodeData::Element {
            name: tag.name.clone(),
            ns: tag.ns,
            attrs: RefCell::new(tag.attrs.clone()),
        })
    }

    fn create_comment(&self, text: StrTendril) -> Handle {
        Node::new(NodeData::Comment { contents: text })
    }

    fn create_text(&self, text: StrTendril) -> Handle {
        Node::new(NodeData::Text {
            contents: RefCell::new(text),
        })
    }

    fn create_doctype(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) -> Handle {
        Node::new(NodeData::Doctype {
            name,
            public_id,
            system_id,
        })
    }

    fn append_child(&self, parent: &Handle, child: NodeOrText<Handle>) -> Handle {
        match child {
            NodeOrText::AppendNode(node) => {
                append(parent, node.clone());
                node
            },
            NodeOrText::AppendText(text) => {
                // Text merges into a trailing text child.
                if let Some(last) = last_child_is_text(parent) {
                    if let NodeData::Text { ref contents } = last.data {
                        contents.borrow_mut().push_tendril(&text);
                    }
                    return last;
                }
                let node = Node::new(NodeData::Text {
                    contents: RefCell::new(text),
                });
                append(parent, node.clone());
                node
            },
        }
    }

    fn insert_before(
        &self,
        parent: &Handle,
        child: NodeOrText<Handle>,
        sibling: &Handle,
    ) -> Handle {
        let index = parent
            .children
            .borrow()
            .iter()
            .position(|node| Rc::ptr_eq(node, sibling))
            .expect("insert_before: sibling is not a child of parent");

        match child {
            NodeOrText::AppendNode(node) => {
                node.parent.set(Some(Rc::downgrade(parent)));
                parent.children.borrow_mut().insert(index, node.clone());
                node
            },
            NodeOrText::AppendText(text) => {
                // Merge into an immediately preceding text node.
                if index > 0 {
                    let prev = parent.children.borrow()[index - 1].clone();
                    if let NodeData::Text { ref contents } = prev.data {
                        contents.borrow_mut().push_tendril(&text);
                        return prev;
                    }
                }
                let node = Node::new(NodeData::Text {
                    contents: RefCell::new(text),
                });
                node.parent.set(Some(Rc::downgrade(parent)));
                parent.children.borrow_mut().insert(index, node.clone());
                node
            },
        }
    }

    fn remove_from_parent(&self, target: &Handle) {
        remove_from_parent(target);
    }

    fn reparent_children(&self, node: &Handle, new_parent: &Handle) {
        let children = mem::take(&mut *node.children.borrow_mut());
        for child in &children {
            child.parent.set(Some(Rc::downgrade(new_parent)));
        }
        new_parent.children.borrow_mut().extend(children);
    }

    fn clone_node(&self, node: &Handle) -> Handle {
        Node::new(node.data.clone())
    }

    fn get_parent(&self, node: &Handle) -> Option<Handle> {
        get_parent(node)
    }

    fn add_attributes(&self, target: &Handle, attrs: Vec<Attribute>) {
        let NodeData::Element {
            attrs: ref existing,
            ..
        } = target.data
        else {
            panic!("not an element");
        };

        let mut existing = existing.borrow_mut();
        for attr in attrs {
            if !existing
                .iter()
                .any(|e| e.ns == attr.ns && e.name == attr.name)
            {
                existing.push(attr);
            }
        }
    }

    fn form_associate(&self, _form: &Handle, _node: &Handle) {
        // A static DOM has no form-owner semantics.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::StartTag;

    fn text(s: &str) -> NodeOrText<Handle> {
        NodeOrText::AppendText(StrTendril::from_slice(s))
    }

    fn elem(dom: &RcDom, name: &str) -> Handle {
        dom.create_element(&Tag {
            kind: StartTag,
            name: StrTendril::from_slice(name),
            ns: Namespace::Html,
            self_closing: false,
            attrs: vec![],
        })
    }

    #[test]
    fn append_coalesces_text() {
        let dom = RcDom::default();
        let div = elem(&dom, "div");
        let first = dom.append_child(&div, text("foo"));
        let second = dom.append_child(&div, text("bar"));
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(div.children.borrow().len(), 1);
        match first.data {
            NodeData::Text { ref contents } => assert_eq!(&**contents.borrow(), "foobar"),
            _ => panic!("expected text node"),
        }
    }

    #[test]
    fn insert_before_merges_with_preceding_text() {
        let dom = RcDom::default();
        let div = elem(&dom, "div");
        let _ = dom.append_child(&div, text("a"));
        let table = elem(&dom, "table");
        let _ = dom.append_child(&div, NodeOrText::AppendNode(table.clone()));
        let merged = dom.insert_before(&div, text("b"), &table);
        assert_eq!(div.children.borrow().len(), 2);
        match merged.data {
            NodeData::Text { ref contents } => assert_eq!(&**contents.borrow(), "ab"),
            _ => panic!("expected text node"),
        }
    }

    #[test]
    fn reparent_moves_all_children() {
        let dom = RcDom::default();
        let from = elem(&dom, "b");
        let to = elem(&dom, "i");
        let _ = dom.append_child(&from, text("x"));
        let child = elem(&dom, "span");
        let _ = dom.append_child(&from, NodeOrText::AppendNode(child.clone()));
        dom.reparent_children(&from, &to);
        assert!(from.children.borrow().is_empty());
        assert_eq!(to.children.borrow().len(), 2);
        assert!(Rc::ptr_eq(&dom.get_parent(&child).unwrap(), &to));
    }

    #[test]
    fn clone_node_is_shallow() {
        let dom = RcDom::default();
        let b = elem(&dom, "b");
        let _ = dom.append_child(&b, text("x"));
        let clone = dom.clone_node(&b);
        assert!(clone.children.borrow().is_empty());
        match clone.data {
            NodeData::Element { ref name, .. } => assert_eq!(&**name, "b"),
            _ => panic!("expected element"),
        }
    }
}
