// Copyright 2024 The html5arbor Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Element classification.
//!
//! Every element the tree builder recognizes, as a closed enum.  The
//! variant order is load-bearing: category predicates are O(1) range
//! tests over the discriminant, so new variants may only be added at
//! the end of the phrasing section, before `Unknown`.

use phf::phf_map;

/// An element type the tree builder recognizes.
///
/// Ranges encode category membership:
/// special is `Address..=Wbr`, scoping is `Applet..=Th`, formatting is
/// `A..=U`, and everything past `U` (including `Unknown`) is phrasing.
#[derive(PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash, Debug)]
pub enum ElementType {
    // Special elements.
    Address,
    Area,
    Base,
    Basefont,
    Bgsound,
    Blockquote,
    Body,
    Br,
    Center,
    Col,
    Colgroup,
    Dd,
    Dir,
    Div,
    Dl,
    Dt,
    Embed,
    Fieldset,
    Form,
    Frame,
    Frameset,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Head,
    Hr,
    Iframe,
    Image,
    Img,
    Input,
    Isindex,
    Li,
    Link,
    Listing,
    Menu,
    Meta,
    Noembed,
    Noframes,
    Noscript,
    Ol,
    Optgroup,
    Option,
    P,
    Param,
    Plaintext,
    Pre,
    Script,
    Select,
    Spacer,
    Style,
    Tbody,
    Textarea,
    Tfoot,
    Thead,
    Title,
    Tr,
    Ul,
    Wbr,
    // Scoping elements.
    Applet,
    Button,
    Caption,
    Html,
    Marquee,
    Object,
    Table,
    Td,
    Th,
    // Formatting elements.
    A,
    B,
    Big,
    Em,
    Font,
    I,
    Nobr,
    S,
    Small,
    Strike,
    Strong,
    Tt,
    U,
    // Phrasing elements.
    Code,
    Rp,
    Rt,
    Ruby,
    Span,
    Sub,
    Sup,
    Var,
    // Foreign content roots and integration points.
    Math,
    Svg,
    AnnotationXml,
    Desc,
    ForeignObject,
    Malignmark,
    Mglyph,
    Mi,
    Mn,
    Mo,
    Ms,
    Mtext,
    Unknown,
}

static TYPES: phf::Map<&'static str, ElementType> = phf_map! {
    "address" => ElementType::Address,
    "area" => ElementType::Area,
    "base" => ElementType::Base,
    "basefont" => ElementType::Basefont,
    "bgsound" => ElementType::Bgsound,
    "blockquote" => ElementType::Blockquote,
    "body" => ElementType::Body,
    "br" => ElementType::Br,
    "center" => ElementType::Center,
    "col" => ElementType::Col,
    "colgroup" => ElementType::Colgroup,
    "dd" => ElementType::Dd,
    "dir" => ElementType::Dir,
    "div" => ElementType::Div,
    "dl" => ElementType::Dl,
    "dt" => ElementType::Dt,
    "embed" => ElementType::Embed,
    "fieldset" => ElementType::Fieldset,
    "form" => ElementType::Form,
    "frame" => ElementType::Frame,
    "frameset" => ElementType::Frameset,
    "h1" => ElementType::H1,
    "h2" => ElementType::H2,
    "h3" => ElementType::H3,
    "h4" => ElementType::H4,
    "h5" => ElementType::H5,
    "h6" => ElementType::H6,
    "head" => ElementType::Head,
    "hr" => ElementType::Hr,
    "iframe" => ElementType::Iframe,
    "image" => ElementType::Image,
    "img" => ElementType::Img,
    "input" => ElementType::Input,
    "isindex" => ElementType::Isindex,
    "li" => ElementType::Li,
    "link" => ElementType::Link,
    "listing" => ElementType::Listing,
    "menu" => ElementType::Menu,
    "meta" => ElementType::Meta,
    "noembed" => ElementType::Noembed,
    "noframes" => ElementType::Noframes,
    "noscript" => ElementType::Noscript,
    "ol" => ElementType::Ol,
    "optgroup" => ElementType::Optgroup,
    "option" => ElementType::Option,
    "p" => ElementType::P,
    "param" => ElementType::Param,
    "plaintext" => ElementType::Plaintext,
    "pre" => ElementType::Pre,
    "script" => ElementType::Script,
    "select" => ElementType::Select,
    "spacer" => ElementType::Spacer,
    "style" => ElementType::Style,
    "tbody" => ElementType::Tbody,
    "textarea" => ElementType::Textarea,
    "tfoot" => ElementType::Tfoot,
    "thead" => ElementType::Thead,
    "title" => ElementType::Title,
    "tr" => ElementType::Tr,
    "ul" => ElementType::Ul,
    "wbr" => ElementType::Wbr,
    "applet" => ElementType::Applet,
    "button" => ElementType::Button,
    "caption" => ElementType::Caption,
    "html" => ElementType::Html,
    "marquee" => ElementType::Marquee,
    "object" => ElementType::Object,
    "table" => ElementType::Table,
    "td" => ElementType::Td,
    "th" => ElementType::Th,
    "a" => ElementType::A,
    "b" => ElementType::B,
    "big" => ElementType::Big,
    "em" => ElementType::Em,
    "font" => ElementType::Font,
    "i" => ElementType::I,
    "nobr" => ElementType::Nobr,
    "s" => ElementType::S,
    "small" => ElementType::Small,
    "strike" => ElementType::Strike,
    "strong" => ElementType::Strong,
    "tt" => ElementType::Tt,
    "u" => ElementType::U,
    "code" => ElementType::Code,
    "rp" => ElementType::Rp,
    "rt" => ElementType::Rt,
    "ruby" => ElementType::Ruby,
    "span" => ElementType::Span,
    "sub" => ElementType::Sub,
    "sup" => ElementType::Sup,
    "var" => ElementType::Var,
    "math" => ElementType::Math,
    "svg" => ElementType::Svg,
    "annotation-xml" => ElementType::AnnotationXml,
    "desc" => ElementType::Desc,
    "foreignobject" => ElementType::ForeignObject,
    "malignmark" => ElementType::Malignmark,
    "mglyph" => ElementType::Mglyph,
    "mi" => ElementType::Mi,
    "mn" => ElementType::Mn,
    "mo" => ElementType::Mo,
    "ms" => ElementType::Ms,
    "mtext" => ElementType::Mtext,
};

// Longest key in the table ("annotation-xml").
const LONGEST_NAME: usize = 14;

impl ElementType {
    /// Classify a tag name.  Names compare ASCII-case-insensitively;
    /// anything not in the table is `Unknown`.
    pub fn from_name(name: &str) -> ElementType {
        let bytes = name.as_bytes();
        if bytes.len() > LONGEST_NAME {
            return ElementType::Unknown;
        }
        let mut buf = [0u8; LONGEST_NAME];
        for (dst, b) in buf.iter_mut().zip(bytes) {
            *dst = b.to_ascii_lowercase();
        }
        match std::str::from_utf8(&buf[..bytes.len()]) {
            Ok(lower) => TYPES.get(lower).copied().unwrap_or(ElementType::Unknown),
            Err(_) => ElementType::Unknown,
        }
    }

    /// The canonical (lowercase) name for a recognized type.
    ///
    /// Used when the tree builder synthesizes an element with no
    /// corresponding tag token.
    pub fn name(self) -> &'static str {
        use self::ElementType::*;
        match self {
            Address => "address",
            Area => "area",
            Base => "base",
            Basefont => "basefont",
            Bgsound => "bgsound",
            Blockquote => "blockquote",
            Body => "body",
            Br => "br",
            Center => "center",
            Col => "col",
            Colgroup => "colgroup",
            Dd => "dd",
            Dir => "dir",
            Div => "div",
            Dl => "dl",
            Dt => "dt",
            Embed => "embed",
            Fieldset => "fieldset",
            Form => "form",
            Frame => "frame",
            Frameset => "frameset",
            H1 => "h1",
            H2 => "h2",
            H3 => "h3",
            H4 => "h4",
            H5 => "h5",
            H6 => "h6",
            Head => "head",
            Hr => "hr",
            Iframe => "iframe",
            Image => "image",
            Img => "img",
            Input => "input",
            Isindex => "isindex",
            Li => "li",
            Link => "link",
            Listing => "listing",
            Menu => "menu",
            Meta => "meta",
            Noembed => "noembed",
            Noframes => "noframes",
            Noscript => "noscript",
            Ol => "ol",
            Optgroup => "optgroup",
            Option => "option",
            P => "p",
            Param => "param",
            Plaintext => "plaintext",
            Pre => "pre",
            Script => "script",
            Select => "select",
            Spacer => "spacer",
            Style => "style",
            Tbody => "tbody",
            Textarea => "textarea",
            Tfoot => "tfoot",
            Thead => "thead",
            Title => "title",
            Tr => "tr",
            Ul => "ul",
            Wbr => "wbr",
            Applet => "applet",
            Button => "button",
            Caption => "caption",
            Html => "html",
            Marquee => "marquee",
            Object => "object",
            Table => "table",
            Td => "td",
            Th => "th",
            A => "a",
            B => "b",
            Big => "big",
            Em => "em",
            Font => "font",
            I => "i",
            Nobr => "nobr",
            S => "s",
            Small => "small",
            Strike => "strike",
            Strong => "strong",
            Tt => "tt",
            U => "u",
            Code => "code",
            Rp => "rp",
            Rt => "rt",
            Ruby => "ruby",
            Span => "span",
            Sub => "sub",
            Sup => "sup",
            Var => "var",
            Math => "math",
            Svg => "svg",
            AnnotationXml => "annotation-xml",
            Desc => "desc",
            ForeignObject => "foreignObject",
            Malignmark => "malignmark",
            Mglyph => "mglyph",
            Mi => "mi",
            Mn => "mn",
            Mo => "mo",
            Ms => "ms",
            Mtext => "mtext",
            Unknown => "unknown",
        }
    }
}

/// Is this a special element?
pub fn is_special(ty: ElementType) -> bool {
    ty <= ElementType::Wbr
}

/// Is this a scoping element?
pub fn is_scoping(ty: ElementType) -> bool {
    ty >= ElementType::Applet && ty <= ElementType::Th
}

/// Is this a formatting element?
pub fn is_formatting(ty: ElementType) -> bool {
    ty >= ElementType::A && ty <= ElementType::U
}

/// Is this a phrasing element?
pub fn is_phrasing(ty: ElementType) -> bool {
    ty > ElementType::U
}

/// Is this a heading element?
pub fn is_heading(ty: ElementType) -> bool {
    ty >= ElementType::H1 && ty <= ElementType::H6
}

/// Elements closed by implied end tags.
pub fn is_implied_end(ty: ElementType) -> bool {
    use self::ElementType::*;
    matches!(ty, Dd | Dt | Li | Option | Optgroup | P | Rp | Rt)
}

/// HTML start tags which break out of foreign content.
pub fn is_foreign_breakout(ty: ElementType) -> bool {
    use self::ElementType::*;
    matches!(
        ty,
        B | Big
            | Blockquote
            | Body
            | Br
            | Center
            | Code
            | Dd
            | Div
            | Dl
            | Dt
            | Em
            | Embed
            | H1
            | H2
            | H3
            | H4
            | H5
            | H6
            | Head
            | Hr
            | I
            | Img
            | Li
            | Listing
            | Menu
            | Meta
            | Nobr
            | Ol
            | P
            | Pre
            | Ruby
            | S
            | Small
            | Span
            | Strong
            | Strike
            | Sub
            | Sup
            | Table
            | Tt
            | U
            | Ul
            | Var
    )
}

#[cfg(test)]
mod tests {
    use super::ElementType::*;
    use super::*;

    #[test]
    fn classify_is_case_insensitive() {
        assert_eq!(ElementType::from_name("table"), Table);
        assert_eq!(ElementType::from_name("TABLE"), Table);
        assert_eq!(ElementType::from_name("TaBlE"), Table);
        assert_eq!(ElementType::from_name("annotation-XML"), AnnotationXml);
    }

    #[test]
    fn unrecognized_names_are_unknown() {
        assert_eq!(ElementType::from_name("article"), Unknown);
        assert_eq!(ElementType::from_name(""), Unknown);
        assert_eq!(ElementType::from_name("x".repeat(40).as_str()), Unknown);
        assert_eq!(ElementType::from_name("tablé"), Unknown);
    }

    #[test]
    fn category_ranges() {
        for ty in [Address, Body, Head, P, Table, A, U, Span, Unknown] {
            // Exactly one category per type, except scoping/special
            // which are disjoint ranges by construction.
            let cats = [
                is_special(ty),
                is_scoping(ty),
                is_formatting(ty),
                is_phrasing(ty),
            ];
            assert_eq!(cats.iter().filter(|&&c| c).count(), 1, "{:?}", ty);
        }

        assert!(is_special(Address) && is_special(Wbr) && is_special(Body));
        assert!(is_scoping(Applet) && is_scoping(Th) && is_scoping(Html));
        assert!(is_formatting(A) && is_formatting(U) && is_formatting(Nobr));
        assert!(is_phrasing(Span) && is_phrasing(Unknown));
        assert!(!is_special(Table) && !is_formatting(Table));
    }

    #[test]
    fn canonical_names_round_trip() {
        for ty in [Html, Body, Tbody, Colgroup, Br, P, Tr, Head, AnnotationXml] {
            assert_eq!(ElementType::from_name(ty.name()), ty);
        }
    }
}
