// Copyright 2024 The html5arbor Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The interface a DOM implementation presents to the tree builder.

use std::borrow::Cow;

use tendril::StrTendril;

use crate::interface::Attribute;
use crate::tokenizer::Tag;

pub use self::NodeOrText::{AppendNode, AppendText};
pub use self::QuirksMode::{LimitedQuirks, NoQuirks, Quirks};

/// A document's quirks mode.
#[derive(PartialEq, Eq, Copy, Clone, Hash, Debug)]
pub enum QuirksMode {
    Quirks,
    LimitedQuirks,
    NoQuirks,
}

/// Something which can be inserted into the DOM.
///
/// Adjacent sibling text nodes are merged by the sink (see
/// [`TreeSink::append_child`]), so the tree builder hands text over as
/// bare strings rather than pre-built nodes.
pub enum NodeOrText<Handle> {
    AppendNode(Handle),
    AppendText(StrTendril),
}

/// Types which can process the tree modifications requested by the
/// tree builder.
///
/// Node identity and storage live entirely in the sink; the tree
/// builder only ever sees opaque handles.  Cloning a handle takes a new
/// reference to the node and dropping one releases it, so every handle
/// the tree builder receives is balanced by exactly one release when it
/// relinquishes the node — the compiler enforces the discipline that a
/// reference-counted C API documents.
pub trait TreeSink {
    /// `Handle` is a reference to a DOM node.  The tree builder requires
    /// that a `Handle` implements `Clone` to get another reference to
    /// the same node.
    type Handle: Clone;

    /// Signal a parse error.  Parse errors are recoverable; parsing
    /// always continues after one is reported.
    fn parse_error(&self, msg: Cow<'static, str>);

    /// Get a handle to the `Document` node.
    fn get_document(&self) -> Self::Handle;

    /// Set the document's quirks mode.
    fn set_quirks_mode(&self, mode: QuirksMode);

    /// Do these two handles refer to the same node?
    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool;

    /// Create an element for a tag.  Any foreign attribute adjustment
    /// has already happened.
    fn create_element(&self, tag: &Tag) -> Self::Handle;

    /// Create a comment node.
    fn create_comment(&self, text: StrTendril) -> Self::Handle;

    /// Create a text node.
    fn create_text(&self, text: StrTendril) -> Self::Handle;

    /// Create a doctype node.
    fn create_doctype(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) -> Self::Handle;

    /// Append a node or some text as the last child of `parent`, and
    /// return a handle to the effective child: appended text merges
    /// into a trailing text child if there is one, and the returned
    /// handle names the node the content actually landed in.
    fn append_child(
        &self,
        parent: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) -> Self::Handle;

    /// Insert a node or some text as a child of `parent`, immediately
    /// before `sibling`.  Text merges into an immediately preceding
    /// text sibling, as for [`TreeSink::append_child`].
    fn insert_before(
        &self,
        parent: &Self::Handle,
        child: NodeOrText<Self::Handle>,
        sibling: &Self::Handle,
    ) -> Self::Handle;

    /// Detach the given node from its parent.
    fn remove_from_parent(&self, target: &Self::Handle);

    /// Remove all the children from `node` and append them to
    /// `new_parent`, preserving order.
    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle);

    /// Shallow-clone an element: same name, namespace and attributes,
    /// no children, not attached anywhere.
    fn clone_node(&self, node: &Self::Handle) -> Self::Handle;

    /// The node's parent, if it is attached to one.
    fn get_parent(&self, node: &Self::Handle) -> Option<Self::Handle>;

    /// Add each attribute to the given element, if no attribute with
    /// that name already exists.
    fn add_attributes(&self, target: &Self::Handle, attrs: Vec<Attribute>);

    /// Associate a form-owned element with the given form.
    fn form_associate(&self, form: &Self::Handle, node: &Self::Handle);
}
