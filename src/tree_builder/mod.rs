// Copyright 2024 The html5arbor Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The HTML5 tree builder.
//!
//! Drives an external [`TreeSink`] from the token stream of an
//! external tokenizer: the insertion-mode state machine, the stack of
//! open elements, and the list of active formatting elements live
//! here.

pub use crate::interface::{AppendNode, AppendText, Attribute, NodeOrText, TreeSink};
pub use crate::interface::{LimitedQuirks, NoQuirks, Quirks, QuirksMode};

use std::borrow::Cow::Borrowed;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use log::{debug, log_enabled, Level};
use mac::format_if;

use crate::tokenizer;
use crate::tokenizer::{Doctype, TagKind, TokenSink, TokenSinkResult};
use crate::tree_builder::element_types::ElementType;
use crate::tree_builder::list::FormattingList;
use crate::tree_builder::stack::ElemStack;
use crate::tree_builder::types::ProcessResult::{
    Done, DoneAckSelfClosing, Reprocess, SplitWhitespace, ToContentModel,
};
use crate::tree_builder::types::SplitStatus::{NotSplit, NotWhitespace, Whitespace};
use crate::tree_builder::types::{InsertionMode, TextCollector, Token};

mod actions;
mod data;
pub mod element_types;
mod list;
mod rules;
mod stack;
mod types;

/// Tree builder options, with an impl for Default.
#[derive(Copy, Clone)]
pub struct TreeBuilderOpts {
    /// Report all parse errors described in the spec, at some
    /// performance penalty? Default: false
    pub exact_errors: bool,

    /// Is scripting enabled?
    ///
    /// This controls whether `<noscript>` content parses as raw text
    /// or as a normal tree of nodes.
    pub scripting_enabled: bool,

    /// Should we drop the DOCTYPE (if any) from the tree?
    pub drop_doctype: bool,

    /// Initial quirks mode.  A value other than `NoQuirks` fixes the
    /// document's mode up front: the doctype, or its absence, will
    /// not change it.  Default: NoQuirks
    pub quirks_mode: QuirksMode,
}

impl Default for TreeBuilderOpts {
    fn default() -> TreeBuilderOpts {
        TreeBuilderOpts {
            exact_errors: false,
            scripting_enabled: true,
            drop_doctype: false,
            quirks_mode: NoQuirks,
        }
    }
}

/// The HTML tree builder.
pub struct TreeBuilder<Handle, Sink> {
    /// Options controlling the behavior of the tree builder.
    opts: TreeBuilderOpts,

    /// Consumer of tree modifications.
    pub sink: Sink,

    /// Insertion mode.
    mode: Cell<InsertionMode>,

    /// The mode to return to when foreign content is exhausted.
    second_mode: Cell<InsertionMode>,

    /// Text collection state for generic (R)CDATA and script bodies.
    collect: RefCell<Option<TextCollector<Handle>>>,

    /// Quirks mode as set by the doctype.
    quirks_mode: Cell<QuirksMode>,

    /// The document node, which is created by the sink.
    doc_handle: Handle,

    /// Stack of open elements.
    stack: RefCell<ElemStack<Handle>>,

    /// List of active formatting elements.
    formatting: RefCell<FormattingList<Handle>>,

    /// Head element pointer.
    head_elem: RefCell<Option<Handle>>,

    /// Form element pointer.
    form_elem: RefCell<Option<Handle>>,

    /// Frameset-ok flag.
    frameset_ok: Cell<bool>,

    /// Ignore a following U+000A LINE FEED?
    ignore_lf: Cell<bool>,

    /// Foster-parent inserts while inside a table?
    in_table_foster: Cell<bool>,
}

impl<Handle, Sink> TreeBuilder<Handle, Sink>
where
    Handle: Clone,
    Sink: TreeSink<Handle = Handle>,
{
    /// Create a new tree builder which sends tree modifications to a
    /// particular `TreeSink`.
    ///
    /// The tree builder is also a `TokenSink`.
    pub fn new(sink: Sink, opts: TreeBuilderOpts) -> TreeBuilder<Handle, Sink> {
        let doc_handle = sink.get_document();
        TreeBuilder {
            opts,
            sink,
            mode: Cell::new(InsertionMode::Initial),
            second_mode: Cell::new(InsertionMode::InBody),
            collect: RefCell::new(None),
            quirks_mode: Cell::new(opts.quirks_mode),
            doc_handle,
            stack: RefCell::new(ElemStack::new()),
            formatting: RefCell::new(FormattingList::new()),
            head_elem: RefCell::new(None),
            form_elem: RefCell::new(None),
            frameset_ok: Cell::new(true),
            ignore_lf: Cell::new(false),
            in_table_foster: Cell::new(false),
        }
    }

    /// Is a generic (R)CDATA or script text run being collected?
    pub(crate) fn is_collecting_text(&self) -> bool {
        self.collect.borrow().is_some()
    }

    fn debug_step(&self, mode: InsertionMode, token: &Token) {
        if log_enabled!(Level::Debug) {
            debug!("processing {:?} in insertion mode {:?}", token, mode);
        }
    }

    fn process_to_completion(&self, mut token: Token) -> TokenSinkResult {
        // Queue of additional tokens yet to be processed.
        // This stays empty in the common case where we don't split
        // whitespace.
        let mut more_tokens = VecDeque::new();

        loop {
            let should_have_acknowledged_self_closing_flag = matches!(
                &token,
                Token::StartTag(_, tag) if tag.self_closing
            );
            let mode = self.mode.get();
            match self.step(mode, token) {
                Done => {
                    if should_have_acknowledged_self_closing_flag {
                        self.sink
                            .parse_error(Borrowed("Unacknowledged self-closing tag"));
                    }
                    let Some(new_token) = more_tokens.pop_front() else {
                        return TokenSinkResult::Continue;
                    };
                    token = new_token;
                },
                DoneAckSelfClosing => {
                    let Some(new_token) = more_tokens.pop_front() else {
                        return TokenSinkResult::Continue;
                    };
                    token = new_token;
                },
                Reprocess(m, t) => {
                    self.mode.set(m);
                    token = t;
                },
                SplitWhitespace(mut buf) => {
                    let p = buf.pop_front_char_run(|c| c.is_ascii_whitespace());
                    let Some((first, is_ws)) = p else {
                        return TokenSinkResult::Continue;
                    };
                    let status = if is_ws { Whitespace } else { NotWhitespace };
                    token = Token::Characters(status, first);

                    if buf.len32() > 0 {
                        more_tokens.push_back(Token::Characters(NotSplit, buf));
                    }
                },
                ToContentModel(cm) => {
                    assert!(more_tokens.is_empty());
                    return TokenSinkResult::ContentModel(cm);
                },
            }
        }
    }
}

impl<Handle, Sink> TokenSink for TreeBuilder<Handle, Sink>
where
    Handle: Clone,
    Sink: TreeSink<Handle = Handle>,
{
    fn process_token(&self, token: tokenizer::Token) -> TokenSinkResult {
        let ignore_lf = self.ignore_lf.take();

        // Handle `DoctypeToken` here; convert everything else to the
        // local `Token` type, classifying tag names exactly once.
        let token = match token {
            tokenizer::DoctypeToken(dt) => {
                if self.mode.get() == InsertionMode::Initial {
                    let (err, quirk) = data::doctype_error_and_quirks(&dt);
                    if err {
                        self.sink.parse_error(format_if!(
                            self.opts.exact_errors,
                            "Bad DOCTYPE",
                            "Bad DOCTYPE: {:?}",
                            dt
                        ));
                    }
                    let Doctype {
                        name,
                        public_id,
                        system_id,
                        force_quirks: _,
                    } = dt;
                    if !self.opts.drop_doctype {
                        let doctype = self.sink.create_doctype(
                            name.unwrap_or_default(),
                            public_id.unwrap_or_default(),
                            system_id.unwrap_or_default(),
                        );
                        let _ = self.sink.append_child(&self.doc_handle, AppendNode(doctype));
                    }
                    // A configured non-default mode is authoritative;
                    // the doctype does not override it.
                    let quirk = if self.opts.quirks_mode != NoQuirks {
                        self.opts.quirks_mode
                    } else {
                        quirk
                    };
                    self.set_quirks_mode(quirk);

                    self.mode.set(InsertionMode::BeforeHtml);
                } else {
                    self.sink.parse_error(format_if!(
                        self.opts.exact_errors,
                        "DOCTYPE in body",
                        "DOCTYPE in insertion mode {:?}",
                        self.mode.get()
                    ));
                }
                return TokenSinkResult::Continue;
            },

            tokenizer::TagToken(tag) => {
                let ty = ElementType::from_name(&tag.name);
                match tag.kind {
                    TagKind::StartTag => Token::StartTag(ty, tag),
                    TagKind::EndTag => Token::EndTag(ty, tag),
                }
            },
            tokenizer::CommentToken(text) => Token::Comment(text),
            tokenizer::EOFToken => Token::Eof,

            tokenizer::CharacterTokens(mut text) => {
                if ignore_lf && text.starts_with('\n') {
                    text.pop_front(1);
                }
                if text.is_empty() {
                    return TokenSinkResult::Continue;
                }
                Token::Characters(NotSplit, text)
            },
        };

        self.process_to_completion(token)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use tendril::StrTendril;

    use super::*;
    use crate::interface::Namespace;
    use crate::rcdom::{Handle, RcDom};
    use crate::tokenizer::{CharacterTokens, Tag, TagToken};
    use crate::tree_builder::element_types::ElementType;
    use crate::tree_builder::list::FormatEntry;

    /// Feed a terse token script: `"div"` is a start tag, `"/div"` an
    /// end tag, `"'x"` character data.
    fn builder_after(script: &[&str]) -> TreeBuilder<Handle, RcDom> {
        let tb = TreeBuilder::new(RcDom::default(), TreeBuilderOpts::default());
        for item in script {
            let token = if let Some(text) = item.strip_prefix('\'') {
                CharacterTokens(StrTendril::from_slice(text))
            } else {
                let (kind, name) = match item.strip_prefix('/') {
                    Some(name) => (TagKind::EndTag, name),
                    None => (TagKind::StartTag, *item),
                };
                TagToken(Tag {
                    kind,
                    name: StrTendril::from_slice(name),
                    ns: Namespace::Html,
                    self_closing: false,
                    attrs: vec![],
                })
            };
            let _ = tb.process_token(token);
        }
        tb
    }

    /// Every non-stale formatting entry must point at a frame with
    /// the same type and node.
    fn check_formatting_consistency(tb: &TreeBuilder<Handle, RcDom>) {
        let stack = tb.stack.borrow();
        let list = tb.formatting.borrow();
        for entry in list.iter() {
            if let FormatEntry::Element(elem) = entry {
                if elem.stack_index != 0 {
                    let frame = stack.get(elem.stack_index);
                    assert_eq!(frame.elem_type, elem.elem_type);
                    assert!(Rc::ptr_eq(&frame.node, &elem.node));
                }
            }
        }
    }

    #[test]
    fn close_implied_end_tags_is_idempotent() {
        let tb = builder_after(&["div", "p"]);
        tb.close_implied_end_tags(None);
        assert_eq!(tb.current_type(), ElementType::Div);
        let len = tb.stack.borrow().len();
        tb.close_implied_end_tags(None);
        assert_eq!(tb.stack.borrow().len(), len);
    }

    #[test]
    fn reconstruction_is_a_noop_while_entries_are_open() {
        let tb = builder_after(&["b", "i"]);
        let len = tb.stack.borrow().len();
        tb.reconstruct_active_formatting_elements();
        assert_eq!(tb.stack.borrow().len(), len);
        assert_eq!(tb.formatting.borrow().len(), 2);
        check_formatting_consistency(&tb);
    }

    #[test]
    fn reconstruction_clones_each_stale_entry_once() {
        // Closing the paragraph pops <b> and <i>, leaving both
        // entries stale.
        let tb = builder_after(&["p", "b", "i", "/p"]);
        {
            let list = tb.formatting.borrow();
            for entry in list.iter() {
                match entry {
                    FormatEntry::Element(elem) => assert_eq!(elem.stack_index, 0),
                    FormatEntry::Marker => panic!("unexpected marker"),
                }
            }
        }

        let len = tb.stack.borrow().len();
        tb.reconstruct_active_formatting_elements();
        assert_eq!(tb.stack.borrow().len(), len + 2);
        check_formatting_consistency(&tb);

        // A second pass finds everything open and does nothing.
        tb.reconstruct_active_formatting_elements();
        assert_eq!(tb.stack.borrow().len(), len + 2);
    }

    #[test]
    fn adoption_agency_keeps_bookkeeping_consistent() {
        let tb = builder_after(&["b", "'1", "div", "'2", "/b", "'3"]);
        check_formatting_consistency(&tb);
        assert_eq!(tb.current_type(), ElementType::Div);
    }

    #[test]
    fn current_table_always_names_a_table() {
        let tb = builder_after(&["table", "tr", "td", "table", "/table"]);
        let stack = tb.stack.borrow();
        let slot = stack.current_table();
        assert!(slot != 0);
        assert_eq!(stack.get(slot).elem_type, ElementType::Table);
    }

    #[test]
    fn the_stack_never_holds_two_html_frames() {
        let tb = builder_after(&["html", "html", "body", "'x"]);
        let stack = tb.stack.borrow();
        let htmls = stack
            .iter()
            .filter(|frame| frame.elem_type == ElementType::Html)
            .count();
        assert_eq!(htmls, 1);
    }
}
