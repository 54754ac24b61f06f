// Copyright 2024 The html5arbor Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tree construction tests.
//!
//! Each test drives the engine with the token stream a conforming
//! tokenizer would emit and compares the resulting DOM against the
//! html5lib tree-construction serialization format, byte for byte.

use std::rc::Rc;

use html5arbor::rcdom::{Handle, NodeData, RcDom};
use html5arbor::tendril::StrTendril;
use html5arbor::tokenizer::{
    CharacterTokens, CommentToken, ContentModel, Doctype, DoctypeToken, EndTag, StartTag, Tag,
    TagToken, Token,
};
use html5arbor::{parse_tokens, Attribute, Namespace, Parser, QuirksMode, TreeBuilderOpts};

fn attr(name: &str, value: &str) -> Attribute {
    Attribute {
        ns: Namespace::None,
        name: StrTendril::from_slice(name),
        value: StrTendril::from_slice(value),
    }
}

fn start(name: &str) -> Token {
    start_attrs(name, vec![])
}

fn start_attrs(name: &str, attrs: Vec<Attribute>) -> Token {
    TagToken(Tag {
        kind: StartTag,
        name: StrTendril::from_slice(name),
        ns: Namespace::Html,
        self_closing: false,
        attrs,
    })
}

fn void(name: &str) -> Token {
    TagToken(Tag {
        kind: StartTag,
        name: StrTendril::from_slice(name),
        ns: Namespace::Html,
        self_closing: true,
        attrs: vec![],
    })
}

fn end(name: &str) -> Token {
    TagToken(Tag {
        kind: EndTag,
        name: StrTendril::from_slice(name),
        ns: Namespace::Html,
        self_closing: false,
        attrs: vec![],
    })
}

fn text(s: &str) -> Token {
    CharacterTokens(StrTendril::from_slice(s))
}

fn comment(s: &str) -> Token {
    CommentToken(StrTendril::from_slice(s))
}

fn doctype(name: &str) -> Token {
    DoctypeToken(Doctype {
        name: Some(StrTendril::from_slice(name)),
        public_id: None,
        system_id: None,
        force_quirks: false,
    })
}

fn parse(tokens: Vec<Token>) -> RcDom {
    parse_tokens(tokens, RcDom::default(), TreeBuilderOpts::default())
}

fn ns_prefix(ns: Namespace) -> &'static str {
    match ns {
        Namespace::Svg => "svg ",
        Namespace::MathMl => "math ",
        Namespace::XLink => "xlink ",
        Namespace::Xml => "xml ",
        Namespace::XmlNs => "xmlns ",
        _ => "",
    }
}

fn serialize(buf: &mut String, indent: usize, handle: &Handle) {
    buf.push('|');
    buf.push_str(&" ".repeat(indent));

    match handle.data {
        NodeData::Document => panic!("should not reach Document"),

        NodeData::Doctype {
            ref name,
            ref public_id,
            ref system_id,
        } => {
            buf.push_str("<!DOCTYPE ");
            buf.push_str(name);
            if !public_id.is_empty() || !system_id.is_empty() {
                buf.push_str(&format!(" \"{}\" \"{}\"", public_id, system_id));
            }
            buf.push_str(">\n");
        },

        NodeData::Text { ref contents } => {
            buf.push('"');
            buf.push_str(&contents.borrow());
            buf.push_str("\"\n");
        },

        NodeData::Comment { ref contents } => {
            buf.push_str("<!-- ");
            buf.push_str(contents);
            buf.push_str(" -->\n");
        },

        NodeData::Element {
            ref name,
            ns,
            ref attrs,
        } => {
            buf.push('<');
            buf.push_str(ns_prefix(ns));
            buf.push_str(name);
            buf.push_str(">\n");

            let mut attrs = attrs.borrow().clone();
            attrs.sort_by(|x, y| x.name.cmp(&y.name));
            for attr in attrs {
                buf.push('|');
                buf.push_str(&" ".repeat(indent + 2));
                buf.push_str(ns_prefix(attr.ns));
                buf.push_str(&format!("{}=\"{}\"\n", attr.name, attr.value));
            }
        },
    }

    for child in handle.children.borrow().iter() {
        serialize(buf, indent + 2, child);
    }
}

fn dom_to_string(dom: &RcDom) -> String {
    let mut buf = String::new();
    for child in dom.document.children.borrow().iter() {
        serialize(&mut buf, 1, child);
    }
    buf
}

fn assert_tree(tokens: Vec<Token>, expected: &str) {
    let dom = parse(tokens);
    let actual = dom_to_string(&dom);
    assert_eq!(
        actual, expected,
        "\nactual:\n{}\nexpected:\n{}",
        actual, expected
    );
}

/// Every node must be held by exactly one strong reference: its
/// parent's child list (or the `RcDom` for the document).  Anything
/// more means a handle leaked or a node got linked twice.
fn assert_sole_ownership(handle: &Handle) {
    for child in handle.children.borrow().iter() {
        assert_eq!(
            Rc::strong_count(child),
            1,
            "leaked handle to {:?}",
            child.data
        );
        assert_sole_ownership(child);
    }
}

#[test]
fn misnested_paragraph_and_formatting() {
    // <p>foo<b>bar</p>baz
    assert_tree(
        vec![
            start("p"),
            text("foo"),
            start("b"),
            text("bar"),
            end("p"),
            text("baz"),
        ],
        r#"| <html>
|   <head>
|   <body>
|     <p>
|       "foo"
|       <b>
|         "bar"
|     <b>
|       "baz"
"#,
    );
}

#[test]
fn table_synthesizes_tbody_and_row() {
    // <table><tr><td>a<p>b</table>
    assert_tree(
        vec![
            start("table"),
            start("tr"),
            start("td"),
            text("a"),
            start("p"),
            text("b"),
            end("table"),
        ],
        r#"| <html>
|   <head>
|   <body>
|     <table>
|       <tbody>
|         <tr>
|           <td>
|             "a"
|             <p>
|               "b"
"#,
    );
}

#[test]
fn script_collects_raw_text() {
    // <!DOCTYPE html><html><body><script>x<y</script>z
    assert_tree(
        vec![
            doctype("html"),
            start("html"),
            start("body"),
            start("script"),
            text("x<y"),
            end("script"),
            text("z"),
        ],
        r#"| <!DOCTYPE html>
| <html>
|   <head>
|   <body>
|     <script>
|       "x<y"
|     "z"
"#,
    );
}

#[test]
fn misnested_formatting_without_furthest_block() {
    // <b><i></b></i>
    assert_tree(
        vec![start("b"), start("i"), end("b"), end("i")],
        r#"| <html>
|   <head>
|   <body>
|     <b>
|       <i>
"#,
    );
}

#[test]
fn second_a_closes_first() {
    // <a><a>
    assert_tree(
        vec![start("a"), start("a")],
        r#"| <html>
|   <head>
|   <body>
|     <a>
|     <a>
"#,
    );
}

#[test]
fn title_is_rcdata() {
    // <title>a<b>c</title>, with the tokenizer in RCDATA mode
    // emitting the markup as characters.
    assert_tree(
        vec![start("title"), text("a<b>c"), end("title")],
        r#"| <html>
|   <head>
|     <title>
|       "a<b>c"
|   <body>
"#,
    );
}

#[test]
fn adoption_agency_splits_around_paragraph() {
    // <a>1<p>2</a>3</p>
    assert_tree(
        vec![
            start("a"),
            text("1"),
            start("p"),
            text("2"),
            end("a"),
            text("3"),
            end("p"),
        ],
        r#"| <html>
|   <head>
|   <body>
|     <a>
|       "1"
|     <p>
|       <a>
|         "2"
|       "3"
"#,
    );
}

#[test]
fn adoption_agency_clones_into_block() {
    // <b>1<div>2</b>3</div>
    assert_tree(
        vec![
            start("b"),
            text("1"),
            start("div"),
            text("2"),
            end("b"),
            text("3"),
            end("div"),
        ],
        r#"| <html>
|   <head>
|   <body>
|     <b>
|       "1"
|     <div>
|       <b>
|         "2"
|       "3"
"#,
    );
}

#[test]
fn text_in_table_is_foster_parented() {
    // <table>x<tr></table>
    assert_tree(
        vec![start("table"), text("x"), start("tr"), end("table")],
        r#"| <html>
|   <head>
|   <body>
|     "x"
|     <table>
|       <tbody>
|         <tr>
"#,
    );
}

#[test]
fn element_in_table_is_foster_parented() {
    // <table><div>x</div></table>
    assert_tree(
        vec![
            start("table"),
            start("div"),
            text("x"),
            end("div"),
            end("table"),
        ],
        r#"| <html>
|   <head>
|   <body>
|     <div>
|       "x"
|     <table>
"#,
    );
}

#[test]
fn whitespace_in_table_stays_in_table() {
    assert_tree(
        vec![start("table"), text(" "), end("table")],
        r#"| <html>
|   <head>
|   <body>
|     <table>
|       " "
"#,
    );
}

#[test]
fn select_closes_open_options() {
    // <select><option>a<option>b</select>c
    assert_tree(
        vec![
            start("select"),
            start("option"),
            text("a"),
            start("option"),
            text("b"),
            end("select"),
            text("c"),
        ],
        r#"| <html>
|   <head>
|   <body>
|     <select>
|       <option>
|         "a"
|       <option>
|         "b"
|     "c"
"#,
    );
}

#[test]
fn table_inside_select_in_table_pops_out() {
    // <table><tr><td><select><tr> — the new row implicitly closes the
    // select.
    assert_tree(
        vec![
            start("table"),
            start("tr"),
            start("td"),
            start("select"),
            start("tr"),
            end("table"),
        ],
        r#"| <html>
|   <head>
|   <body>
|     <table>
|       <tbody>
|         <tr>
|           <td>
|             <select>
|         <tr>
"#,
    );
}

#[test]
fn frameset_document() {
    // <frameset><frame></frameset><noframes>x</noframes>
    assert_tree(
        vec![
            start("frameset"),
            void("frame"),
            end("frameset"),
            start("noframes"),
            text("x"),
            end("noframes"),
        ],
        r#"| <html>
|   <head>
|   <frameset>
|     <frame>
|   <noframes>
|     "x"
"#,
    );
}

#[test]
fn frameset_after_content_is_ignored() {
    assert_tree(
        vec![text("x"), start("frameset")],
        r#"| <html>
|   <head>
|   <body>
|     "x"
"#,
    );
}

#[test]
fn svg_subtree_keeps_namespace() {
    // <svg><circle/><text>hi</text></svg>after
    assert_tree(
        vec![
            start("svg"),
            void("circle"),
            start("text"),
            text("hi"),
            end("text"),
            end("svg"),
            text("after"),
        ],
        r#"| <html>
|   <head>
|   <body>
|     <svg svg>
|       <svg circle>
|       <svg text>
|         "hi"
|     "after"
"#,
    );
}

#[test]
fn html_tag_breaks_out_of_foreign_content() {
    // <svg><p>x
    assert_tree(
        vec![start("svg"), start("p"), text("x")],
        r#"| <html>
|   <head>
|   <body>
|     <svg svg>
|     <p>
|       "x"
"#,
    );
}

#[test]
fn svg_names_and_foreign_attributes_are_adjusted() {
    // <svg><foreignobject xlink:href="#f"> — the tag name gains its
    // canonical case, the attribute its namespace.
    assert_tree(
        vec![
            start("svg"),
            start_attrs("foreignobject", vec![attr("xlink:href", "#f")]),
        ],
        r##"| <html>
|   <head>
|   <body>
|     <svg svg>
|       <svg foreignObject>
|         xlink href="#f"
"##,
    );
}

#[test]
fn mathml_text_integration_point_hosts_html() {
    // <math><mi><b>y
    assert_tree(
        vec![start("math"), start("mi"), start("b"), text("y")],
        r#"| <html>
|   <head>
|   <body>
|     <math math>
|       <math mi>
|         <b>
|           "y"
"#,
    );
}

#[test]
fn textarea_strips_leading_newline() {
    assert_tree(
        vec![start("textarea"), text("\nabc"), end("textarea")],
        r#"| <html>
|   <head>
|   <body>
|     <textarea>
|       "abc"
"#,
    );
}

#[test]
fn pre_strips_leading_newline_once() {
    assert_tree(
        vec![start("pre"), text("\n\nx"), end("pre")],
        r#"| <html>
|   <head>
|   <body>
|     <pre>
|       "
x"
"#,
    );
}

#[test]
fn eof_in_rcdata_still_emits_text() {
    assert_tree(
        vec![start("title"), text("abc")],
        r#"| <html>
|   <head>
|     <title>
|       "abc"
|   <body>
"#,
    );
}

#[test]
fn comments_land_on_document_and_tree() {
    assert_tree(
        vec![comment("one"), start("p"), comment("two"), end("p")],
        r#"| <!-- one -->
| <html>
|   <head>
|   <body>
|     <p>
|       <!-- two -->
"#,
    );
}

#[test]
fn empty_input_synthesizes_skeleton() {
    let dom = parse(vec![]);
    assert_eq!(
        dom_to_string(&dom),
        r#"| <html>
|   <head>
|   <body>
"#
    );
    // No doctype at all is full quirks.
    assert_eq!(dom.quirks_mode.get(), QuirksMode::Quirks);
    assert!(!dom.errors.borrow().is_empty());
}

#[test]
fn modern_doctype_is_no_quirks() {
    let dom = parse(vec![doctype("html")]);
    assert_eq!(dom.quirks_mode.get(), QuirksMode::NoQuirks);
}

#[test]
fn configured_quirks_mode_is_authoritative() {
    let opts = TreeBuilderOpts {
        quirks_mode: QuirksMode::LimitedQuirks,
        ..TreeBuilderOpts::default()
    };

    // Neither a clean doctype...
    let dom = parse_tokens(vec![doctype("html")], RcDom::default(), opts);
    assert_eq!(dom.quirks_mode.get(), QuirksMode::LimitedQuirks);

    // ...nor a missing one changes a pre-determined mode.
    let dom = parse_tokens(vec![start("p")], RcDom::default(), opts);
    assert_eq!(dom.quirks_mode.get(), QuirksMode::LimitedQuirks);
}

#[test]
fn parser_tracks_the_content_model() {
    let parser = Parser::new(RcDom::default(), TreeBuilderOpts::default());
    assert_eq!(parser.content_model(), ContentModel::Pcdata);

    assert_eq!(parser.feed(start("title")), ContentModel::Rcdata);
    assert_eq!(parser.feed(text("a<b>c")), ContentModel::Rcdata);
    // The matching end tag ends the raw-text run; the tokenizer is
    // back in PCDATA and the parser agrees.
    assert_eq!(parser.feed(end("title")), ContentModel::Pcdata);

    assert_eq!(parser.feed(start("script")), ContentModel::Cdata);
    assert_eq!(parser.feed(text("x")), ContentModel::Cdata);
    assert_eq!(parser.feed(end("script")), ContentModel::Pcdata);
    assert_eq!(parser.content_model(), ContentModel::Pcdata);

    let dom = parser.finish();
    // No doctype was seen, so the document is in full quirks.
    assert_eq!(dom.quirks_mode.get(), QuirksMode::Quirks);
}

#[test]
fn html_attributes_are_merged_not_replaced() {
    // <html lang=a><html lang=b dir=c> — the second tag only
    // contributes attributes the root does not already have.
    let dom = parse(vec![
        start_attrs("html", vec![attr("lang", "a")]),
        start_attrs("html", vec![attr("lang", "b"), attr("dir", "c")]),
    ]);
    assert_eq!(
        dom_to_string(&dom),
        r#"| <html>
|   dir="c"
|   lang="a"
|   <head>
|   <body>
"#
    );
}

#[test]
fn implied_end_tags_close_list_items() {
    // <ul><li>a<li>b</ul>
    assert_tree(
        vec![
            start("ul"),
            start("li"),
            text("a"),
            start("li"),
            text("b"),
            end("ul"),
        ],
        r#"| <html>
|   <head>
|   <body>
|     <ul>
|       <li>
|         "a"
|       <li>
|         "b"
"#,
    );
}

#[test]
fn heading_nesting_is_repaired() {
    // <h1>a<h2>b — the open heading is closed first.
    assert_tree(
        vec![start("h1"), text("a"), start("h2"), text("b")],
        r#"| <html>
|   <head>
|   <body>
|     <h1>
|       "a"
|     <h2>
|       "b"
"#,
    );
}

#[test]
fn caption_scopes_formatting() {
    // <table><caption><b>x</table>y — the <b> opened inside the
    // caption must not be reconstructed outside it.
    assert_tree(
        vec![
            start("table"),
            start("caption"),
            start("b"),
            text("x"),
            end("table"),
            text("y"),
        ],
        r#"| <html>
|   <head>
|   <body>
|     <table>
|       <caption>
|         <b>
|           "x"
|     "y"
"#,
    );
}

#[test]
fn formatting_reconstruction_spans_blocks() {
    // <b>x<p>y</b></p>z — closing the <b> hoists the paragraph out of
    // it and wraps its text in a clone.
    assert_tree(
        vec![
            start("b"),
            text("x"),
            start("p"),
            text("y"),
            end("b"),
            end("p"),
            text("z"),
        ],
        r#"| <html>
|   <head>
|   <body>
|     <b>
|       "x"
|     <p>
|       <b>
|         "y"
|     "z"
"#,
    );
}

#[test]
fn no_handles_are_leaked() {
    let dom = parse(vec![
        doctype("html"),
        start("p"),
        text("foo"),
        start("b"),
        text("bar"),
        end("p"),
        text("baz"),
        start("table"),
        text("x"),
        start("tr"),
        start("td"),
        start("a"),
        text("1"),
        end("table"),
        start("a"),
        text("2"),
    ]);
    // After the parser is gone the document tree holds the only
    // reference to every node.
    assert_sole_ownership(&dom.document);
}

#[test]
fn end_tags_in_head_path() {
    // </br> forces the html/head/body skeleton and becomes <br>.
    assert_tree(
        vec![end("br")],
        r#"| <html>
|   <head>
|   <body>
|     <br>
"#,
    );
}

#[test]
fn unknown_elements_nest_generically() {
    assert_tree(
        vec![
            start("article"),
            start("widget"),
            text("w"),
            end("widget"),
            end("article"),
        ],
        r#"| <html>
|   <head>
|   <body>
|     <article>
|       <widget>
|         "w"
"#,
    );
}
