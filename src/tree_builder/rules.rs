// Copyright 2024 The html5arbor Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

// The tree builder rules, as one match arm per insertion mode.

use std::borrow::Cow::Borrowed;

use tendril::StrTendril;

use crate::interface::{Namespace, NoQuirks, Quirks, TreeSink};
use crate::tokenizer::ContentModel;
use crate::tree_builder::actions::{html_integration_point, mathml_text_integration_point};
use crate::tree_builder::element_types::ElementType::*;
use crate::tree_builder::element_types::{
    is_foreign_breakout, is_heading, is_scoping, is_special, ElementType,
};
use crate::tree_builder::stack::Scope;
use crate::tree_builder::types::InsertionMode::{self, *};
use crate::tree_builder::types::ProcessResult::{self, *};
use crate::tree_builder::types::SplitStatus::{NotSplit, NotWhitespace, Whitespace};
use crate::tree_builder::types::Token;
use crate::tree_builder::TreeBuilder;

fn any_not_whitespace(x: &StrTendril) -> bool {
    x.bytes().any(|b| !matches!(b, b'\t' | b'\n' | b'\x0C' | b' '))
}

#[doc(hidden)]
impl<Handle, Sink> TreeBuilder<Handle, Sink>
where
    Handle: Clone,
    Sink: TreeSink<Handle = Handle>,
{
    pub(crate) fn step(&self, mode: InsertionMode, token: Token) -> ProcessResult {
        self.debug_step(mode, &token);

        match mode {
            //§ the-initial-insertion-mode
            Initial => match token {
                Token::Characters(NotSplit, text) => SplitWhitespace(text),
                Token::Characters(Whitespace, _) => Done,
                Token::Comment(text) => self.append_comment_to_doc(text),
                token => {
                    self.unexpected(&token);
                    // Missing doctype means quirks, unless the caller
                    // pre-determined the document's mode.
                    let quirk = if self.opts.quirks_mode == NoQuirks {
                        Quirks
                    } else {
                        self.opts.quirks_mode
                    };
                    self.set_quirks_mode(quirk);
                    Reprocess(BeforeHtml, token)
                },
            },

            //§ the-before-html-insertion-mode
            BeforeHtml => match token {
                Token::Characters(NotSplit, text) => SplitWhitespace(text),
                Token::Characters(Whitespace, _) => Done,
                Token::Comment(text) => self.append_comment_to_doc(text),

                Token::StartTag(Html, tag) => {
                    self.create_root(tag.attrs);
                    self.mode.set(BeforeHead);
                    Done
                },

                tag @ Token::EndTag(Head | Body | Html | Br, _) => {
                    self.create_root(vec![]);
                    Reprocess(BeforeHead, tag)
                },

                Token::EndTag(_, tag) => self.unexpected(&tag),

                token => {
                    self.create_root(vec![]);
                    Reprocess(BeforeHead, token)
                },
            },

            //§ the-before-head-insertion-mode
            BeforeHead => match token {
                Token::Characters(NotSplit, text) => SplitWhitespace(text),
                Token::Characters(Whitespace, _) => Done,
                Token::Comment(text) => self.append_comment(text),

                token @ Token::StartTag(Html, _) => self.step(InBody, token),

                Token::StartTag(Head, tag) => {
                    *self.head_elem.borrow_mut() = Some(self.insert_element_for(Head, &tag));
                    self.mode.set(InHead);
                    Done
                },

                tag @ Token::EndTag(Head | Body | Html | Br, _) => {
                    *self.head_elem.borrow_mut() = Some(self.insert_phantom(Head));
                    Reprocess(InHead, tag)
                },

                Token::EndTag(_, tag) => self.unexpected(&tag),

                token => {
                    *self.head_elem.borrow_mut() = Some(self.insert_phantom(Head));
                    Reprocess(InHead, token)
                },
            },

            //§ parsing-main-inhead
            InHead => match token {
                Token::Characters(NotSplit, text) => SplitWhitespace(text),
                Token::Characters(Whitespace, text) => self.append_text(text),
                Token::Comment(text) => self.append_comment(text),

                token @ Token::StartTag(Html, _) => self.step(InBody, token),

                Token::StartTag(ty @ (Base | Basefont | Bgsound | Link | Meta), tag) => {
                    self.insert_and_pop_element_for(ty, &tag);
                    DoneAckSelfClosing
                },

                Token::StartTag(Title, tag) => self.parse_generic_rcdata(Title, &tag, true),

                Token::StartTag(ty @ (Noframes | Style), tag) => {
                    self.parse_generic_rcdata(ty, &tag, false)
                },

                Token::StartTag(Noscript, tag) => {
                    if self.opts.scripting_enabled {
                        self.parse_generic_rcdata(Noscript, &tag, false)
                    } else {
                        self.insert_element_for(Noscript, &tag);
                        self.mode.set(InHeadNoscript);
                        Done
                    }
                },

                Token::StartTag(Script, tag) => self.parse_script(&tag),

                Token::EndTag(Head, _) => {
                    self.pop();
                    self.mode.set(AfterHead);
                    Done
                },

                tag @ Token::EndTag(Body | Html | Br, _) => {
                    self.pop();
                    Reprocess(AfterHead, tag)
                },

                Token::StartTag(Head, tag) => self.unexpected(&tag),
                Token::EndTag(_, tag) => self.unexpected(&tag),

                token => {
                    self.pop();
                    Reprocess(AfterHead, token)
                },
            },

            //§ parsing-main-inheadnoscript
            InHeadNoscript => match token {
                token @ Token::StartTag(Html, _) => self.step(InBody, token),

                Token::EndTag(Noscript, _) => {
                    self.pop();
                    self.mode.set(InHead);
                    Done
                },

                Token::Characters(NotSplit, text) => SplitWhitespace(text),
                token @ Token::Characters(Whitespace, _) => self.step(InHead, token),
                token @ Token::Comment(_) => self.step(InHead, token),

                token @ Token::StartTag(Basefont | Bgsound | Link | Meta | Noframes | Style, _) => {
                    self.step(InHead, token)
                },

                Token::StartTag(Head | Noscript, tag) => self.unexpected(&tag),

                tag @ Token::EndTag(Br, _) => {
                    self.unexpected(&tag);
                    self.pop();
                    Reprocess(InHead, tag)
                },
                Token::EndTag(_, tag) => self.unexpected(&tag),

                token => {
                    self.unexpected(&token);
                    self.pop();
                    Reprocess(InHead, token)
                },
            },

            //§ the-after-head-insertion-mode
            AfterHead => match token {
                Token::Characters(NotSplit, text) => SplitWhitespace(text),
                Token::Characters(Whitespace, text) => self.append_text(text),
                Token::Comment(text) => self.append_comment(text),

                token @ Token::StartTag(Html, _) => self.step(InBody, token),

                Token::StartTag(Body, tag) => {
                    self.insert_element_for(Body, &tag);
                    self.frameset_ok.set(false);
                    self.mode.set(InBody);
                    Done
                },

                Token::StartTag(Frameset, tag) => {
                    self.insert_element_for(Frameset, &tag);
                    self.mode.set(InFrameset);
                    Done
                },

                token @ Token::StartTag(
                    Base | Basefont | Bgsound | Link | Meta | Noframes | Script | Style | Title,
                    _,
                ) => {
                    self.unexpected(&token);
                    let head = self
                        .head_elem
                        .borrow()
                        .as_ref()
                        .expect("no head element")
                        .clone();
                    self.push_frame(Namespace::Html, Head, head.clone());
                    let result = self.step(InHead, token);
                    self.remove_from_stack(&head);
                    result
                },

                tag @ Token::EndTag(Body | Html | Br, _) => {
                    self.insert_phantom(Body);
                    Reprocess(InBody, tag)
                },

                Token::StartTag(Head, tag) => self.unexpected(&tag),
                Token::EndTag(_, tag) => self.unexpected(&tag),

                token => {
                    self.insert_phantom(Body);
                    Reprocess(InBody, token)
                },
            },

            //§ parsing-main-inbody
            InBody => match token {
                Token::Characters(_, text) => {
                    self.reconstruct_active_formatting_elements();
                    if any_not_whitespace(&text) {
                        self.frameset_ok.set(false);
                    }
                    self.append_text(text)
                },

                Token::Comment(text) => self.append_comment(text),

                Token::StartTag(Html, tag) => {
                    self.unexpected(&tag);
                    let top = self.html_root();
                    self.sink.add_attributes(&top, tag.attrs);
                    Done
                },

                token @ Token::StartTag(
                    Base | Basefont | Bgsound | Link | Meta | Noframes | Script | Style | Title,
                    _,
                ) => self.step(InHead, token),

                Token::StartTag(Body, tag) => {
                    self.unexpected(&tag);
                    if self.stack.borrow().len() > 1 {
                        if let Some(body) = self.body_elem() {
                            self.frameset_ok.set(false);
                            self.sink.add_attributes(&body, tag.attrs);
                        }
                    }
                    Done
                },

                Token::StartTag(Frameset, tag) => {
                    self.unexpected(&tag);
                    if !self.frameset_ok.get() {
                        return Done;
                    }
                    let Some(body) = self.body_elem() else {
                        return Done;
                    };
                    self.sink.remove_from_parent(&body);
                    while self.stack.borrow().len() > 1 {
                        self.pop();
                    }
                    self.insert_element_for(Frameset, &tag);
                    self.mode.set(InFrameset);
                    Done
                },

                Token::Eof => {
                    self.check_body_end();
                    Done
                },

                Token::EndTag(Body, tag) => {
                    if self.in_scope(Body, Scope::Default) != 0 {
                        self.check_body_end();
                        self.mode.set(AfterBody);
                    } else {
                        self.unexpected(&tag);
                    }
                    Done
                },

                token @ Token::EndTag(Html, _) => {
                    if self.in_scope(Body, Scope::Default) != 0 {
                        self.check_body_end();
                        Reprocess(AfterBody, token)
                    } else {
                        self.unexpected(&token)
                    }
                },

                Token::StartTag(
                    ty @ (Address | Blockquote | Center | Dir | Div | Dl | Fieldset | Menu | Ol
                    | Ul),
                    tag,
                ) => {
                    self.close_p_element_in_button_scope();
                    self.insert_element_for(ty, &tag);
                    Done
                },

                Token::StartTag(ty @ (H1 | H2 | H3 | H4 | H5 | H6), tag) => {
                    self.close_p_element_in_button_scope();
                    if is_heading(self.current_type()) {
                        self.sink.parse_error(Borrowed("nested heading tags"));
                        self.pop();
                    }
                    self.insert_element_for(ty, &tag);
                    Done
                },

                Token::StartTag(ty @ (Pre | Listing), tag) => {
                    self.close_p_element_in_button_scope();
                    self.insert_element_for(ty, &tag);
                    self.ignore_lf.set(true);
                    self.frameset_ok.set(false);
                    Done
                },

                Token::StartTag(Form, tag) => {
                    if self.form_elem.borrow().is_some() {
                        self.sink.parse_error(Borrowed("nested forms"));
                    } else {
                        self.close_p_element_in_button_scope();
                        let elem = self.insert_element_for(Form, &tag);
                        *self.form_elem.borrow_mut() = Some(elem);
                    }
                    Done
                },

                Token::StartTag(ty @ (Li | Dd | Dt), tag) => {
                    self.frameset_ok.set(false);
                    let close_set: &[ElementType] = if ty == Li { &[Li] } else { &[Dd, Dt] };
                    let to_close = {
                        let stack = self.stack.borrow();
                        let mut found = None;
                        for slot in (1..stack.len()).rev() {
                            let t = stack.get(slot).elem_type;
                            if close_set.contains(&t) {
                                found = Some(t);
                                break;
                            }
                            if (is_special(t) || is_scoping(t))
                                && !matches!(t, Address | Div | P)
                            {
                                break;
                            }
                        }
                        found
                    };
                    if let Some(t) = to_close {
                        self.close_implied_end_tags(Some(t));
                        self.expect_to_close(t);
                    }
                    self.close_p_element_in_button_scope();
                    self.insert_element_for(ty, &tag);
                    Done
                },

                Token::StartTag(Plaintext, tag) => {
                    self.close_p_element_in_button_scope();
                    self.insert_element_for(Plaintext, &tag);
                    ToContentModel(ContentModel::Plaintext)
                },

                Token::StartTag(Button, tag) => {
                    if self.in_scope(Button, Scope::Default) != 0 {
                        self.sink.parse_error(Borrowed("nested buttons"));
                        self.close_implied_end_tags(None);
                        self.pop_until(Button);
                    }
                    self.reconstruct_active_formatting_elements();
                    self.insert_element_for(Button, &tag);
                    self.frameset_ok.set(false);
                    Done
                },

                Token::EndTag(
                    ty @ (Address | Blockquote | Button | Center | Dir | Div | Dl | Fieldset
                    | Listing | Menu | Ol | Pre | Ul),
                    tag,
                ) => {
                    if self.in_scope(ty, Scope::Default) == 0 {
                        self.unexpected(&tag);
                    } else {
                        self.close_implied_end_tags(None);
                        self.expect_to_close(ty);
                    }
                    Done
                },

                Token::EndTag(Form, tag) => {
                    let node = self.form_elem.borrow_mut().take();
                    if node.is_none() || self.in_scope(Form, Scope::Default) == 0 {
                        self.unexpected(&tag);
                    } else {
                        self.close_implied_end_tags(None);
                        if self.current_type() != Form {
                            self.sink.parse_error(Borrowed("Bad open element on </form>"));
                        }
                        self.pop_until(Form);
                    }
                    Done
                },

                Token::EndTag(P, tag) => {
                    if self.in_scope(P, Scope::Button) == 0 {
                        self.unexpected(&tag);
                        self.insert_phantom(P);
                    }
                    self.close_p_element();
                    Done
                },

                Token::EndTag(Li, tag) => {
                    if self.in_scope(Li, Scope::ListItem) == 0 {
                        self.unexpected(&tag);
                    } else {
                        self.close_implied_end_tags(Some(Li));
                        self.expect_to_close(Li);
                    }
                    Done
                },

                Token::EndTag(ty @ (Dd | Dt), tag) => {
                    if self.in_scope(ty, Scope::Default) == 0 {
                        self.unexpected(&tag);
                    } else {
                        self.close_implied_end_tags(Some(ty));
                        self.expect_to_close(ty);
                    }
                    Done
                },

                Token::EndTag(ty @ (H1 | H2 | H3 | H4 | H5 | H6), tag) => {
                    if self.in_scope_any(&[H1, H2, H3, H4, H5, H6], Scope::Default) == 0 {
                        self.unexpected(&tag);
                    } else {
                        self.close_implied_end_tags(None);
                        if self.current_type() != ty {
                            self.sink.parse_error(Borrowed("Closing wrong heading tag"));
                        }
                        loop {
                            if is_heading(self.pop().elem_type) {
                                break;
                            }
                        }
                    }
                    Done
                },

                Token::StartTag(A, tag) => {
                    self.handle_misnested_a_tag();
                    self.reconstruct_active_formatting_elements();
                    self.create_formatting_element_for(A, &tag);
                    Done
                },

                Token::StartTag(
                    ty @ (B | Big | Em | Font | I | S | Small | Strike | Strong | Tt | U),
                    tag,
                ) => {
                    self.reconstruct_active_formatting_elements();
                    self.create_formatting_element_for(ty, &tag);
                    Done
                },

                Token::StartTag(Nobr, tag) => {
                    self.reconstruct_active_formatting_elements();
                    if self.in_scope(Nobr, Scope::Default) != 0 {
                        self.sink.parse_error(Borrowed("<nobr> inside <nobr>"));
                        self.adoption_agency(Nobr);
                        self.reconstruct_active_formatting_elements();
                    }
                    self.create_formatting_element_for(Nobr, &tag);
                    Done
                },

                Token::EndTag(
                    ty @ (A | B | Big | Em | Font | I | Nobr | S | Small | Strike | Strong | Tt
                    | U),
                    _,
                ) => {
                    self.adoption_agency(ty);
                    Done
                },

                Token::StartTag(ty @ (Applet | Marquee | Object), tag) => {
                    self.reconstruct_active_formatting_elements();
                    self.insert_element_for(ty, &tag);
                    self.formatting.borrow_mut().push_marker();
                    self.frameset_ok.set(false);
                    Done
                },

                Token::EndTag(ty @ (Applet | Marquee | Object), tag) => {
                    if self.in_scope(ty, Scope::Default) == 0 {
                        self.unexpected(&tag);
                    } else {
                        self.close_implied_end_tags(None);
                        self.expect_to_close(ty);
                        self.clear_active_formatting_to_marker();
                    }
                    Done
                },

                Token::StartTag(Table, tag) => {
                    if self.quirks_mode.get() != Quirks {
                        self.close_p_element_in_button_scope();
                    }
                    self.insert_element_for(Table, &tag);
                    self.frameset_ok.set(false);
                    self.mode.set(InTable);
                    Done
                },

                tag @ Token::EndTag(Br, _) => {
                    self.unexpected(&tag);
                    self.reconstruct_active_formatting_elements();
                    let phantom = self.phantom_tag(Br);
                    self.insert_and_pop_element_for(Br, &phantom);
                    self.frameset_ok.set(false);
                    Done
                },

                Token::StartTag(ty @ (Area | Br | Embed | Img | Wbr), tag) => {
                    self.reconstruct_active_formatting_elements();
                    self.insert_and_pop_element_for(ty, &tag);
                    self.frameset_ok.set(false);
                    DoneAckSelfClosing
                },

                Token::StartTag(Image, mut tag) => {
                    self.sink
                        .parse_error(Borrowed("<image> is not <img>, but try anyway"));
                    tag.name = StrTendril::from_slice("img");
                    self.reconstruct_active_formatting_elements();
                    self.insert_and_pop_element_for(Img, &tag);
                    self.frameset_ok.set(false);
                    DoneAckSelfClosing
                },

                Token::StartTag(Input, tag) => {
                    self.reconstruct_active_formatting_elements();
                    let hidden = self.is_type_hidden(&tag);
                    self.insert_and_pop_element_for(Input, &tag);
                    if !hidden {
                        self.frameset_ok.set(false);
                    }
                    DoneAckSelfClosing
                },

                Token::StartTag(ty @ (Param | Spacer), tag) => {
                    self.insert_and_pop_element_for(ty, &tag);
                    DoneAckSelfClosing
                },

                Token::StartTag(Hr, tag) => {
                    self.close_p_element_in_button_scope();
                    self.insert_and_pop_element_for(Hr, &tag);
                    self.frameset_ok.set(false);
                    DoneAckSelfClosing
                },

                Token::StartTag(Textarea, tag) => {
                    self.ignore_lf.set(true);
                    self.frameset_ok.set(false);
                    self.parse_generic_rcdata(Textarea, &tag, true)
                },

                Token::StartTag(Iframe, tag) => {
                    self.frameset_ok.set(false);
                    self.parse_generic_rcdata(Iframe, &tag, false)
                },

                Token::StartTag(Noembed, tag) => self.parse_generic_rcdata(Noembed, &tag, false),

                Token::StartTag(Noscript, tag) => {
                    if self.opts.scripting_enabled {
                        self.parse_generic_rcdata(Noscript, &tag, false)
                    } else {
                        self.reconstruct_active_formatting_elements();
                        self.insert_element_for(Noscript, &tag);
                        Done
                    }
                },

                Token::StartTag(Select, tag) => {
                    self.reconstruct_active_formatting_elements();
                    self.insert_element_for(Select, &tag);
                    self.frameset_ok.set(false);
                    let mode = self.mode.get();
                    if matches!(mode, InTable | InCaption | InTableBody | InRow | InCell) {
                        self.mode.set(InSelectInTable);
                    } else {
                        self.mode.set(InSelect);
                    }
                    Done
                },

                Token::StartTag(ty @ (Optgroup | Option), tag) => {
                    if self.current_type() == Option {
                        self.pop();
                    }
                    self.reconstruct_active_formatting_elements();
                    self.insert_element_for(ty, &tag);
                    Done
                },

                Token::StartTag(ty @ (Rp | Rt), tag) => {
                    if self.in_scope(Ruby, Scope::Default) != 0 {
                        self.close_implied_end_tags(None);
                        if self.current_type() != Ruby {
                            self.unexpected(&tag);
                        }
                    }
                    self.insert_element_for(ty, &tag);
                    Done
                },

                Token::StartTag(Math, tag) => {
                    self.reconstruct_active_formatting_elements();
                    self.enter_foreign(tag, Math, Namespace::MathMl)
                },

                Token::StartTag(Svg, tag) => {
                    self.reconstruct_active_formatting_elements();
                    self.enter_foreign(tag, Svg, Namespace::Svg)
                },

                Token::StartTag(
                    Caption | Col | Colgroup | Frame | Head | Tbody | Td | Tfoot | Th | Thead
                    | Tr,
                    tag,
                ) => self.unexpected(&tag),

                Token::StartTag(ty, tag) => {
                    self.reconstruct_active_formatting_elements();
                    self.insert_element_for(ty, &tag);
                    Done
                },

                Token::EndTag(ty, _) => {
                    self.process_end_tag_in_body(ty);
                    Done
                },
            },

            //§ parsing-main-intable
            InTable => match token {
                Token::Characters(NotSplit, text) => SplitWhitespace(text),
                Token::Characters(Whitespace, text) => self.append_text(text),
                Token::Characters(NotWhitespace, text) => {
                    self.sink
                        .parse_error(Borrowed("Unexpected characters in table"));
                    self.foster_parent_in_body(Token::Characters(NotWhitespace, text))
                },

                Token::Comment(text) => self.append_comment(text),

                Token::StartTag(Caption, tag) => {
                    self.pop_until_current(|ty| matches!(ty, Table | Html));
                    self.formatting.borrow_mut().push_marker();
                    self.insert_element_for(Caption, &tag);
                    self.mode.set(InCaption);
                    Done
                },

                Token::StartTag(Colgroup, tag) => {
                    self.pop_until_current(|ty| matches!(ty, Table | Html));
                    self.insert_element_for(Colgroup, &tag);
                    self.mode.set(InColumnGroup);
                    Done
                },

                token @ Token::StartTag(Col, _) => {
                    self.pop_until_current(|ty| matches!(ty, Table | Html));
                    self.insert_phantom(Colgroup);
                    Reprocess(InColumnGroup, token)
                },

                Token::StartTag(ty @ (Tbody | Tfoot | Thead), tag) => {
                    self.pop_until_current(|ty| matches!(ty, Table | Html));
                    self.insert_element_for(ty, &tag);
                    self.mode.set(InTableBody);
                    Done
                },

                token @ Token::StartTag(Td | Th | Tr, _) => {
                    self.pop_until_current(|ty| matches!(ty, Table | Html));
                    self.insert_phantom(Tbody);
                    Reprocess(InTableBody, token)
                },

                token @ Token::StartTag(Table, _) => {
                    self.unexpected(&token);
                    if self.in_scope(Table, Scope::Table) != 0 {
                        self.pop_until(Table);
                        let mode = self.reset_insertion_mode();
                        Reprocess(mode, token)
                    } else {
                        Done
                    }
                },

                Token::EndTag(Table, tag) => {
                    if self.in_scope(Table, Scope::Table) != 0 {
                        self.pop_until(Table);
                        let mode = self.reset_insertion_mode();
                        self.mode.set(mode);
                    } else {
                        self.unexpected(&tag);
                    }
                    Done
                },

                Token::EndTag(
                    Body | Caption | Col | Colgroup | Html | Tbody | Td | Tfoot | Th | Thead
                    | Tr,
                    tag,
                ) => self.unexpected(&tag),

                token @ Token::StartTag(Style | Script, _) => self.step(InHead, token),

                Token::StartTag(Input, tag) => {
                    if self.is_type_hidden(&tag) {
                        self.sink
                            .parse_error(Borrowed("Hidden input in table"));
                        self.insert_and_pop_element_for(Input, &tag);
                        DoneAckSelfClosing
                    } else {
                        self.sink
                            .parse_error(Borrowed("Unexpected input in table"));
                        self.foster_parent_in_body(Token::StartTag(Input, tag))
                    }
                },

                Token::StartTag(Form, tag) => {
                    self.unexpected(&tag);
                    if self.form_elem.borrow().is_none() {
                        let elem = self.insert_and_pop_element_for(Form, &tag);
                        *self.form_elem.borrow_mut() = Some(elem);
                    }
                    Done
                },

                Token::Eof => self.step(InBody, Token::Eof),

                token => {
                    self.unexpected(&token);
                    self.foster_parent_in_body(token)
                },
            },

            //§ parsing-main-incaption
            InCaption => match token {
                Token::EndTag(Caption, tag) => {
                    if !self.close_caption() {
                        self.unexpected(&tag);
                    }
                    Done
                },

                token @ (Token::StartTag(
                    Caption | Col | Colgroup | Tbody | Td | Tfoot | Th | Thead | Tr,
                    _,
                )
                | Token::EndTag(Table, _)) => {
                    if self.close_caption() {
                        Reprocess(InTable, token)
                    } else {
                        self.unexpected(&token)
                    }
                },

                Token::EndTag(
                    Body | Col | Colgroup | Html | Tbody | Td | Tfoot | Th | Thead | Tr,
                    tag,
                ) => self.unexpected(&tag),

                token => self.step(InBody, token),
            },

            //§ parsing-main-incolgroup
            InColumnGroup => match token {
                Token::Characters(NotSplit, text) => SplitWhitespace(text),
                Token::Characters(Whitespace, text) => self.append_text(text),
                Token::Comment(text) => self.append_comment(text),

                token @ Token::StartTag(Html, _) => self.step(InBody, token),

                Token::StartTag(Col, tag) => {
                    self.insert_and_pop_element_for(Col, &tag);
                    DoneAckSelfClosing
                },

                Token::EndTag(Colgroup, tag) => {
                    if self.current_type() == Colgroup {
                        self.pop();
                        self.mode.set(InTable);
                    } else {
                        self.unexpected(&tag);
                    }
                    Done
                },

                Token::EndTag(Col, tag) => self.unexpected(&tag),

                Token::Eof => self.step(InBody, Token::Eof),

                token => {
                    if self.current_type() == Colgroup {
                        self.pop();
                        Reprocess(InTable, token)
                    } else {
                        self.unexpected(&token)
                    }
                },
            },

            //§ parsing-main-intbody
            InTableBody => match token {
                Token::StartTag(Tr, tag) => {
                    self.pop_until_current(|ty| matches!(ty, Tbody | Tfoot | Thead | Html));
                    self.insert_element_for(Tr, &tag);
                    self.mode.set(InRow);
                    Done
                },

                token @ Token::StartTag(Td | Th, _) => {
                    self.unexpected(&token);
                    self.pop_until_current(|ty| matches!(ty, Tbody | Tfoot | Thead | Html));
                    self.insert_phantom(Tr);
                    Reprocess(InRow, token)
                },

                Token::EndTag(ty @ (Tbody | Tfoot | Thead), tag) => {
                    if self.in_scope(ty, Scope::Table) != 0 {
                        self.pop_until_current(|ty| matches!(ty, Tbody | Tfoot | Thead | Html));
                        self.pop();
                        self.mode.set(InTable);
                    } else {
                        self.unexpected(&tag);
                    }
                    Done
                },

                token @ (Token::StartTag(Caption | Col | Colgroup | Tbody | Tfoot | Thead, _)
                | Token::EndTag(Table, _)) => {
                    if self.in_scope_any(&[Tbody, Tfoot, Thead], Scope::Table) != 0 {
                        self.pop_until_current(|ty| matches!(ty, Tbody | Tfoot | Thead | Html));
                        self.pop();
                        Reprocess(InTable, token)
                    } else {
                        self.unexpected(&token)
                    }
                },

                Token::EndTag(Body | Caption | Col | Colgroup | Html | Td | Th | Tr, tag) => {
                    self.unexpected(&tag)
                },

                token => self.step(InTable, token),
            },

            //§ parsing-main-intr
            InRow => match token {
                Token::StartTag(ty @ (Td | Th), tag) => {
                    self.pop_until_current(|ty| matches!(ty, Tr | Html));
                    self.insert_element_for(ty, &tag);
                    self.mode.set(InCell);
                    self.formatting.borrow_mut().push_marker();
                    Done
                },

                Token::EndTag(Tr, tag) => {
                    if self.in_scope(Tr, Scope::Table) != 0 {
                        self.pop_until_current(|ty| matches!(ty, Tr | Html));
                        self.pop();
                        self.mode.set(InTableBody);
                    } else {
                        self.unexpected(&tag);
                    }
                    Done
                },

                token @ (Token::StartTag(Caption | Col | Colgroup | Tbody | Tfoot | Thead | Tr, _)
                | Token::EndTag(Table, _)) => {
                    if self.in_scope(Tr, Scope::Table) != 0 {
                        self.pop_until_current(|ty| matches!(ty, Tr | Html));
                        self.pop();
                        Reprocess(InTableBody, token)
                    } else {
                        self.unexpected(&token)
                    }
                },

                token @ Token::EndTag(Tbody | Tfoot | Thead, _) => {
                    let Token::EndTag(ty, ref tag) = token else {
                        unreachable!()
                    };
                    if self.in_scope(ty, Scope::Table) == 0 {
                        return self.unexpected(tag);
                    }
                    if self.in_scope(Tr, Scope::Table) != 0 {
                        self.pop_until_current(|ty| matches!(ty, Tr | Html));
                        self.pop();
                        Reprocess(InTableBody, token)
                    } else {
                        Done
                    }
                },

                Token::EndTag(Body | Caption | Col | Colgroup | Html | Td | Th, tag) => {
                    self.unexpected(&tag)
                },

                token => self.step(InTable, token),
            },

            //§ parsing-main-intd
            InCell => match token {
                Token::EndTag(ty @ (Td | Th), tag) => {
                    if self.in_scope(ty, Scope::Table) != 0 {
                        self.close_implied_end_tags(None);
                        self.expect_to_close(ty);
                        self.clear_active_formatting_to_marker();
                        self.mode.set(InRow);
                    } else {
                        self.unexpected(&tag);
                    }
                    Done
                },

                token @ Token::StartTag(
                    Caption | Col | Colgroup | Tbody | Td | Tfoot | Th | Thead | Tr,
                    _,
                ) => {
                    if self.in_scope_any(&[Td, Th], Scope::Table) != 0 {
                        self.close_the_cell();
                        Reprocess(InRow, token)
                    } else {
                        self.unexpected(&token)
                    }
                },

                Token::EndTag(Body | Caption | Col | Colgroup | Html, tag) => {
                    self.unexpected(&tag)
                },

                token @ Token::EndTag(Table | Tbody | Tfoot | Thead | Tr, _) => {
                    let Token::EndTag(ty, ref tag) = token else {
                        unreachable!()
                    };
                    if self.in_scope(ty, Scope::Table) != 0 {
                        self.close_the_cell();
                        Reprocess(InRow, token)
                    } else {
                        self.unexpected(tag)
                    }
                },

                token => self.step(InBody, token),
            },

            //§ parsing-main-inselect
            InSelect => match token {
                Token::Characters(_, text) => self.append_text(text),
                Token::Comment(text) => self.append_comment(text),

                token @ Token::StartTag(Html, _) => self.step(InBody, token),

                Token::StartTag(Option, tag) => {
                    if self.current_type() == Option {
                        self.pop();
                    }
                    self.insert_element_for(Option, &tag);
                    Done
                },

                Token::StartTag(Optgroup, tag) => {
                    if self.current_type() == Option {
                        self.pop();
                    }
                    if self.current_type() == Optgroup {
                        self.pop();
                    }
                    self.insert_element_for(Optgroup, &tag);
                    Done
                },

                Token::EndTag(Optgroup, tag) => {
                    if self.current_type() == Option && self.stack.borrow().prev_type() == Optgroup
                    {
                        self.pop();
                    }
                    if self.current_type() == Optgroup {
                        self.pop();
                    } else {
                        self.unexpected(&tag);
                    }
                    Done
                },

                Token::EndTag(Option, tag) => {
                    if self.current_type() == Option {
                        self.pop();
                    } else {
                        self.unexpected(&tag);
                    }
                    Done
                },

                Token::EndTag(Select, tag) => {
                    if self.in_scope(Select, Scope::Select) != 0 {
                        self.pop_until(Select);
                        let mode = self.reset_insertion_mode();
                        self.mode.set(mode);
                    } else {
                        self.unexpected(&tag);
                    }
                    Done
                },

                Token::StartTag(Select, tag) => {
                    self.unexpected(&tag);
                    if self.in_scope(Select, Scope::Select) != 0 {
                        self.pop_until(Select);
                        let mode = self.reset_insertion_mode();
                        self.mode.set(mode);
                    }
                    Done
                },

                token @ Token::StartTag(Input | Textarea, _) => {
                    self.unexpected(&token);
                    if self.in_scope(Select, Scope::Select) != 0 {
                        self.pop_until(Select);
                        let mode = self.reset_insertion_mode();
                        Reprocess(mode, token)
                    } else {
                        Done
                    }
                },

                token @ Token::StartTag(Script, _) => self.step(InHead, token),

                Token::Eof => self.step(InBody, Token::Eof),

                token => self.unexpected(&token),
            },

            //§ parsing-main-inselectintable
            InSelectInTable => match token {
                token @ Token::StartTag(
                    Caption | Table | Tbody | Tfoot | Thead | Tr | Td | Th,
                    _,
                ) => {
                    self.unexpected(&token);
                    self.pop_until(Select);
                    let mode = self.reset_insertion_mode();
                    Reprocess(mode, token)
                },

                token @ Token::EndTag(
                    Caption | Table | Tbody | Tfoot | Thead | Tr | Td | Th,
                    _,
                ) => {
                    let Token::EndTag(ty, ref tag) = token else {
                        unreachable!()
                    };
                    self.unexpected(tag);
                    if self.in_scope(ty, Scope::Table) != 0 {
                        self.pop_until(Select);
                        let mode = self.reset_insertion_mode();
                        Reprocess(mode, token)
                    } else {
                        Done
                    }
                },

                token => self.step(InSelect, token),
            },

            //§ parsing-main-inforeign
            InForeignContent => {
                // Nested HTML content below an integration point is
                // handled by the saved mode's rules.
                if self.current_ns() == Namespace::Html {
                    return self.step(self.second_mode.get(), token);
                }

                match token {
                    Token::Characters(_, text) => {
                        if any_not_whitespace(&text) {
                            self.frameset_ok.set(false);
                        }
                        self.append_text(text)
                    },

                    Token::Comment(text) => self.append_comment(text),

                    Token::Eof => Reprocess(self.second_mode.get(), Token::Eof),

                    Token::StartTag(ty, tag) => {
                        let (current_ns, current_ty) = {
                            let stack = self.stack.borrow();
                            let frame = stack.current();
                            (frame.ns, frame.elem_type)
                        };
                        let at_mathml_text = mathml_text_integration_point(current_ns, current_ty);
                        let at_html_point = html_integration_point(current_ns, current_ty);

                        if is_foreign_breakout(ty) || (ty == Font && self.is_fontish(&tag)) {
                            if at_mathml_text || at_html_point {
                                self.step(self.second_mode.get(), Token::StartTag(ty, tag))
                            } else {
                                self.sink
                                    .parse_error(Borrowed("HTML tag in foreign content"));
                                self.foreign_break_out();
                                Reprocess(self.mode.get(), Token::StartTag(ty, tag))
                            }
                        } else if (at_mathml_text && !matches!(ty, Mglyph | Malignmark))
                            || at_html_point
                        {
                            self.step(self.second_mode.get(), Token::StartTag(ty, tag))
                        } else {
                            self.foreign_start_tag(tag, ty)
                        }
                    },

                    Token::EndTag(ty, tag) => {
                        if self.current_type() != ty {
                            self.unexpected(&tag);
                        }
                        let mut result = Done;
                        let mut slot = self.stack.borrow().current_slot();
                        loop {
                            if slot == 0 {
                                break;
                            }
                            let (frame_ns, frame_ty) = {
                                let stack = self.stack.borrow();
                                let frame = stack.get(slot);
                                (frame.ns, frame.elem_type)
                            };
                            if frame_ns == Namespace::Html {
                                result =
                                    self.step(self.second_mode.get(), Token::EndTag(ty, tag));
                                break;
                            }
                            if frame_ty == ty {
                                while self.stack.borrow().len() > slot {
                                    self.pop();
                                }
                                if self.current_ns() == Namespace::Html {
                                    self.mode.set(self.second_mode.get());
                                }
                                break;
                            }
                            slot -= 1;
                        }
                        result
                    },
                }
            },

            //§ parsing-main-afterbody
            AfterBody => match token {
                Token::Characters(NotSplit, text) => SplitWhitespace(text),
                token @ Token::Characters(Whitespace, _) => self.step(InBody, token),
                Token::Comment(text) => self.append_comment_to_html(text),

                token @ Token::StartTag(Html, _) => self.step(InBody, token),

                Token::EndTag(Html, _) => {
                    self.mode.set(AfterAfterBody);
                    Done
                },

                Token::Eof => Done,

                token => {
                    self.unexpected(&token);
                    Reprocess(InBody, token)
                },
            },

            //§ parsing-main-inframeset
            InFrameset => match token {
                Token::Characters(NotSplit, text) => SplitWhitespace(text),
                Token::Characters(Whitespace, text) => self.append_text(text),
                Token::Comment(text) => self.append_comment(text),

                token @ Token::StartTag(Html, _) => self.step(InBody, token),

                Token::StartTag(Frameset, tag) => {
                    self.insert_element_for(Frameset, &tag);
                    Done
                },

                Token::EndTag(Frameset, tag) => {
                    if self.stack.borrow().len() == 1 {
                        self.unexpected(&tag);
                    } else {
                        self.pop();
                        if self.current_type() != Frameset {
                            self.mode.set(AfterFrameset);
                        }
                    }
                    Done
                },

                Token::StartTag(Frame, tag) => {
                    self.insert_and_pop_element_for(Frame, &tag);
                    DoneAckSelfClosing
                },

                token @ Token::StartTag(Noframes, _) => self.step(InHead, token),

                Token::Eof => {
                    if self.stack.borrow().len() != 1 {
                        self.sink
                            .parse_error(Borrowed("EOF in frameset"));
                    }
                    Done
                },

                token => self.unexpected(&token),
            },

            //§ parsing-main-afterframeset
            AfterFrameset => match token {
                Token::Characters(NotSplit, text) => SplitWhitespace(text),
                Token::Characters(Whitespace, text) => self.append_text(text),
                Token::Comment(text) => self.append_comment(text),

                token @ Token::StartTag(Html, _) => self.step(InBody, token),

                Token::EndTag(Html, _) => {
                    self.mode.set(AfterAfterFrameset);
                    Done
                },

                token @ Token::StartTag(Noframes, _) => self.step(InHead, token),

                Token::Eof => Done,

                token => self.unexpected(&token),
            },

            //§ the-after-after-body-insertion-mode
            AfterAfterBody => match token {
                Token::Comment(text) => self.append_comment_to_doc(text),

                Token::Characters(NotSplit, text) => SplitWhitespace(text),
                token @ Token::Characters(Whitespace, _) => self.step(InBody, token),
                token @ Token::StartTag(Html, _) => self.step(InBody, token),

                Token::Eof => Done,

                token => {
                    self.unexpected(&token);
                    Reprocess(InBody, token)
                },
            },

            //§ the-after-after-frameset-insertion-mode
            AfterAfterFrameset => match token {
                Token::Comment(text) => self.append_comment_to_doc(text),

                Token::Characters(NotSplit, text) => SplitWhitespace(text),
                token @ Token::Characters(Whitespace, _) => self.step(InBody, token),
                token @ Token::StartTag(Html, _) => self.step(InBody, token),

                token @ Token::StartTag(Noframes, _) => self.step(InHead, token),

                Token::Eof => Done,

                token => self.unexpected(&token),
            },

            //§ generic-rcdata-collection
            GenericRcdata | ScriptCollectCharacters => match token {
                Token::Characters(_, text) => {
                    if let Some(collector) = self.collect.borrow_mut().as_mut() {
                        collector.text.push_tendril(&text);
                    }
                    Done
                },

                Token::EndTag(ty, tag) => {
                    let matches_collector = self
                        .collect
                        .borrow()
                        .as_ref()
                        .map(|collector| collector.elem_type == ty)
                        .unwrap_or(false);
                    if matches_collector {
                        self.finish_collected_text();
                    } else {
                        self.unexpected(&tag);
                    }
                    Done
                },

                Token::Eof => {
                    self.sink
                        .parse_error(Borrowed("EOF while collecting raw text"));
                    self.finish_collected_text();
                    Reprocess(self.mode.get(), Token::Eof)
                },

                token => self.unexpected(&token),
            },
        }
    }

    /// Close an open caption, returning false if none is in scope.
    fn close_caption(&self) -> bool {
        if self.in_scope(Caption, Scope::Table) == 0 {
            return false;
        }
        self.close_implied_end_tags(None);
        if self.current_type() != Caption {
            self.sink
                .parse_error(Borrowed("Bad open element on </caption>"));
        }
        self.pop_until(Caption);
        self.clear_active_formatting_to_marker();
        self.mode.set(InTable);
        true
    }
}
