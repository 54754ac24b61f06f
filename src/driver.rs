// Copyright 2024 The html5arbor Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! High-level interface to the parser: wires an external tokenizer's
//! token stream to the tree construction engine.

use std::cell::Cell;

use crate::interface::TreeSink;
use crate::tokenizer::{ContentModel, Token, TokenSink, TokenSinkResult};
use crate::tree_builder::{TreeBuilder, TreeBuilderOpts};

/// An HTML parse in progress, minus the tokenizer.
///
/// The driving tokenizer calls [`Parser::feed`] with each token it
/// emits and tokenizes subsequent input under the returned content
/// model.
pub struct Parser<Sink>
where
    Sink: TreeSink,
{
    tree_builder: TreeBuilder<Sink::Handle, Sink>,
    content_model: Cell<ContentModel>,
}

impl<Sink> Parser<Sink>
where
    Sink: TreeSink,
{
    pub fn new(sink: Sink, opts: TreeBuilderOpts) -> Parser<Sink> {
        Parser {
            tree_builder: TreeBuilder::new(sink, opts),
            content_model: Cell::new(ContentModel::Pcdata),
        }
    }

    /// Process one token.  Returns the content model the tokenizer
    /// must use for subsequent input.
    pub fn feed(&self, token: Token) -> ContentModel {
        match self.tree_builder.process_token(token) {
            TokenSinkResult::Continue => {
                // A raw-text run ends with its matching end tag; the
                // tokenizer reverts to PCDATA on its own and the
                // model tracked here follows it.
                let model = self.content_model.get();
                if matches!(model, ContentModel::Rcdata | ContentModel::Cdata)
                    && !self.tree_builder.is_collecting_text()
                {
                    self.content_model.set(ContentModel::Pcdata);
                }
            },
            TokenSinkResult::ContentModel(model) => self.content_model.set(model),
        }
        self.content_model.get()
    }

    /// The content model the tokenizer is expected to be in.
    pub fn content_model(&self) -> ContentModel {
        self.content_model.get()
    }

    /// Signal the end of input and recover the sink.  Remaining open
    /// elements are closed with the appropriate parse errors.
    pub fn finish(self) -> Sink {
        let _ = self.feed(Token::EOFToken);
        self.tree_builder.sink
    }

    pub fn tree_builder(&self) -> &TreeBuilder<Sink::Handle, Sink> {
        &self.tree_builder
    }
}

/// Run a whole token stream through the tree builder and return the
/// sink.  Content-model switches are discarded; a token source
/// replaying pre-recorded tokens has already accounted for them.
pub fn parse_tokens<Sink, It>(tokens: It, sink: Sink, opts: TreeBuilderOpts) -> Sink
where
    Sink: TreeSink,
    It: IntoIterator<Item = Token>,
{
    let parser = Parser::new(sink, opts);
    for token in tokens {
        let _ = parser.feed(token);
    }
    parser.finish()
}
