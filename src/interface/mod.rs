// Copyright 2024 The html5arbor Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Types shared between the tree builder and the DOM implementations
//! it drives.

use tendril::StrTendril;

pub use self::tree_builder::{AppendNode, AppendText, NodeOrText, TreeSink};
pub use self::tree_builder::{LimitedQuirks, NoQuirks, Quirks, QuirksMode};

pub mod tree_builder;

/// A markup namespace.
///
/// A closed enum: the tree builder only ever creates nodes in one of
/// these, and keeping them off the string-comparison path makes
/// namespace tests free.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, Debug)]
pub enum Namespace {
    /// No namespace; ordinary attributes live here.
    None,
    Html,
    MathMl,
    Svg,
    XLink,
    Xml,
    XmlNs,
}

impl Namespace {
    /// The namespace URL, as seen in DOM APIs.
    pub fn url(self) -> &'static str {
        match self {
            Namespace::None => "",
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::XLink => "http://www.w3.org/1999/xlink",
            Namespace::Xml => "http://www.w3.org/XML/1998/namespace",
            Namespace::XmlNs => "http://www.w3.org/2000/xmlns/",
        }
    }
}

/// A tag attribute.
///
/// The namespace is almost always `Namespace::None`.  The tokenizer
/// creates all attributes this way, but the tree builder will adjust
/// certain attribute names inside foreign content (MathML, SVG).
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Debug)]
pub struct Attribute {
    pub ns: Namespace,
    pub name: StrTendril,
    pub value: StrTendril,
}

#[cfg(test)]
mod tests {
    use super::Namespace;

    #[test]
    fn namespace_urls() {
        assert_eq!(Namespace::None.url(), "");
        assert_eq!(Namespace::Html.url(), "http://www.w3.org/1999/xhtml");
        assert_eq!(Namespace::Svg.url(), "http://www.w3.org/2000/svg");
        assert_eq!(
            Namespace::MathMl.url(),
            "http://www.w3.org/1998/Math/MathML"
        );
    }
}
