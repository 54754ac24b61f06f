// Copyright 2024 The html5arbor Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The HTML5 tree construction engine.
//!
//! This crate is the middle stage of an HTML parsing pipeline: it
//! consumes the token stream of an external tokenizer (see
//! [`tokenizer`] for the contract) and drives an external DOM through
//! the [`interface::TreeSink`] trait, implementing the insertion-mode
//! state machine of the HTML5 parsing algorithm — the stack of open
//! elements, the list of active formatting elements, the adoption
//! agency algorithm, foster parenting, and tokenizer content-model
//! switching.
//!
//! A reference-counted sink suitable for tests and simple consumers is
//! provided in [`rcdom`].

pub use tendril;

pub mod driver;
pub mod interface;
pub mod rcdom;
pub mod tokenizer;
pub mod tree_builder;

pub use crate::driver::{parse_tokens, Parser};
pub use crate::interface::{Attribute, Namespace, QuirksMode};
pub use crate::tree_builder::{TreeBuilder, TreeBuilderOpts};
