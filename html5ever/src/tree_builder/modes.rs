// Copyright The html5ever Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The insertion-mode dispatcher: one `step_*` method per `InsertionMode`
//! variant, driven by [`TreeBuilder::step`]. Written as plain `match`
//! statements on tag names rather than a token-matching macro — there is
//! only one caller per arm, so the macro's main benefit (terse repeated
//! dispatch across many call sites) doesn't pay for itself here.

use markup5ever::{Namespace, QuirksMode};

use super::formatting::FormatEntry;
use super::stack::ScopeResult;
use super::types::{InsertionMode, ProcessResult, Token};
use super::TreeBuilder;
use crate::element::ElementType;
use crate::tokenizer::{ContentModel, Doctype, Tag, TagKind};

const WHITESPACE: [u8; 5] = [0x09, 0x0A, 0x0C, 0x0D, 0x20];

fn is_whitespace(text: &str) -> bool {
    text.bytes().all(|b| WHITESPACE.contains(&b))
}

/// Tag names that force an exit from foreign content back to HTML parsing
/// rules even when encountered inside a MathML/SVG subtree (HTML5's
/// "foreign content breakout" list).
fn breaks_out_of_foreign_content(name: &str) -> bool {
    matches!(
        name,
        "b" | "big"
            | "blockquote"
            | "body"
            | "br"
            | "center"
            | "code"
            | "dd"
            | "div"
            | "dl"
            | "dt"
            | "em"
            | "embed"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "head"
            | "hr"
            | "i"
            | "img"
            | "li"
            | "listing"
            | "menu"
            | "meta"
            | "nobr"
            | "ol"
            | "p"
            | "pre"
            | "ruby"
            | "s"
            | "small"
            | "span"
            | "strong"
            | "strike"
            | "sub"
            | "sup"
            | "table"
            | "tt"
            | "u"
            | "ul"
            | "var"
    )
}

/// SVG's handful of camelCase tag names, which the tokeniser (operating in
/// ASCII-lowercase-only mode) hands us lowercased.
fn adjust_svg_tag_name(name: &str) -> Option<&'static str> {
    Some(match name {
        "altglyph" => "altGlyph",
        "altglyphdef" => "altGlyphDef",
        "altglyphitem" => "altGlyphItem",
        "animatecolor" => "animateColor",
        "animatemotion" => "animateMotion",
        "animatetransform" => "animateTransform",
        "clippath" => "clipPath",
        "feblend" => "feBlend",
        "fecolormatrix" => "feColorMatrix",
        "fecomponenttransfer" => "feComponentTransfer",
        "fecomposite" => "feComposite",
        "feconvolvematrix" => "feConvolveMatrix",
        "fediffuselighting" => "feDiffuseLighting",
        "fedisplacementmap" => "feDisplacementMap",
        "fedistantlight" => "feDistantLight",
        "feflood" => "feFlood",
        "fefunca" => "feFuncA",
        "fefuncb" => "feFuncB",
        "fefuncg" => "feFuncG",
        "fefuncr" => "feFuncR",
        "fegaussianblur" => "feGaussianBlur",
        "feimage" => "feImage",
        "femerge" => "feMerge",
        "femergenode" => "feMergeNode",
        "femorphology" => "feMorphology",
        "feoffset" => "feOffset",
        "fepointlight" => "fePointLight",
        "fespecularlighting" => "feSpecularLighting",
        "fespotlight" => "feSpotLight",
        "fetile" => "feTile",
        "feturbulence" => "feTurbulence",
        "foreignobject" => "foreignObject",
        "glyphref" => "glyphRef",
        "lineargradient" => "linearGradient",
        "radialgradient" => "radialGradient",
        "textpath" => "textPath",
        _ => return None,
    })
}

impl<Handle, Sink> TreeBuilder<Handle, Sink>
where
    Handle: Copy + Eq + std::fmt::Debug,
    Sink: markup5ever::TreeSink<Handle = Handle>,
{
    pub(super) fn step(&self, mode: InsertionMode, token: Token) -> ProcessResult<Handle> {
        use InsertionMode::*;
        if mode != InForeignContent && self.current_node_is_foreign(&token) {
            return self.step_in_foreign_content(token);
        }
        match mode {
            Initial => self.step_initial(token),
            BeforeHtml => self.step_before_html(token),
            BeforeHead => self.step_before_head(token),
            InHead => self.step_in_head(token),
            InHeadNoscript => self.step_in_head_noscript(token),
            AfterHead => self.step_after_head(token),
            InBody => self.step_in_body(token),
            InTable => self.step_in_table(token),
            InCaption => self.step_in_caption(token),
            InColumnGroup => self.step_in_column_group(token),
            InTableBody => self.step_in_table_body(token),
            InRow => self.step_in_row(token),
            InCell => self.step_in_cell(token),
            InSelect => self.step_in_select(token),
            InSelectInTable => self.step_in_select_in_table(token),
            InForeignContent => self.step_in_foreign_content(token),
            AfterBody => self.step_after_body(token),
            InFrameset => self.step_in_frameset(token),
            AfterFrameset => self.step_after_frameset(token),
            AfterAfterBody => self.step_after_after_body(token),
            AfterAfterFrameset => self.step_after_after_frameset(token),
            GenericRawText => self.step_generic_raw_text(token),
            ScriptDataText => self.step_generic_raw_text(token),
        }
    }

    /// Whether the current token should be handled by the foreign-content
    /// rules rather than by the rules the current insertion mode would
    /// otherwise run: the current node must be a foreign element, and the
    /// token must not be one of the documented breakout cases.
    fn current_node_is_foreign(&self, token: &Token) -> bool {
        if self.open_elems.borrow().is_empty() {
            return false;
        }
        let ns = self.open_elems.borrow().current().ns;
        if !matches!(ns, Namespace::MathMl | Namespace::Svg) {
            return false;
        }
        match token {
            Token::Tag(Tag { kind: TagKind::StartTag, name, .. }) => !breaks_out_of_foreign_content(name.as_str()),
            Token::Tag(Tag { kind: TagKind::EndTag, name, .. }) => {
                !(name.as_str() == "br" || name.as_str() == "p")
            },
            _ => true,
        }
    }

    fn in_scope(&self, target: ElementType) -> bool {
        matches!(self.open_elems.borrow().element_in_scope(target, false), ScopeResult::Found(_))
    }

    fn in_button_scope(&self, target: ElementType) -> bool {
        // Button scope is ordinary scope plus a BUTTON boundary; since
        // BUTTON isn't in the scoping range, approximate it by checking
        // ordinary scope and bailing if a BUTTON intervenes.
        let stack = self.open_elems.borrow();
        for (index, frame) in stack.iter().enumerate().rev() {
            if frame.ty == target {
                return true;
            }
            if frame.ty == ElementType::Table || frame.ty == ElementType::Button || frame.ty.is_scoping() {
                return false;
            }
            let _ = index;
        }
        false
    }

    fn in_list_item_scope(&self, target: ElementType) -> bool {
        // List item scope is ordinary scope plus OL/UL boundaries; neither
        // is in the scoping range, so check for them explicitly alongside
        // the ordinary scope boundaries.
        let stack = self.open_elems.borrow();
        for frame in stack.iter().rev() {
            if frame.ty == target {
                return true;
            }
            if matches!(frame.ty, ElementType::Ol | ElementType::Ul) || frame.ty == ElementType::Table || frame.ty.is_scoping() {
                return false;
            }
        }
        false
    }

    // ---- INITIAL ----------------------------------------------------------

    fn step_initial(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::Characters(text) => match self.split_leading_whitespace(&text, false) {
                None => ProcessResult::Done,
                Some(rest) => ProcessResult::Reprocess(InsertionMode::BeforeHtml, Token::Characters(rest)),
            },
            Token::Comment(text) => {
                self.append_comment_to_doc(text);
                ProcessResult::Done
            },
            Token::Doctype(d) => {
                let name = d.name.clone().unwrap_or_default();
                let public_id = d.public_id.clone().unwrap_or_default();
                let system_id = d.system_id.clone().unwrap_or_default();
                self.sink.append_doctype_to_document(name, public_id, system_id);
                let quirks = if d.force_quirks { QuirksMode::Quirks } else { QuirksMode::NoQuirks };
                self.quirks_mode.set(quirks);
                self.sink.set_quirks_mode(quirks);
                self.mode.set(InsertionMode::BeforeHtml);
                ProcessResult::Done
            },
            other => ProcessResult::Reprocess(InsertionMode::BeforeHtml, other),
        }
    }

    // ---- BEFORE_HTML --------------------------------------------------------

    fn step_before_html(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::Characters(text) => match self.split_leading_whitespace(&text, false) {
                None => ProcessResult::Done,
                Some(rest) => ProcessResult::Reprocess(InsertionMode::BeforeHtml, Token::Characters(rest)),
            },
            Token::Comment(text) => {
                self.append_comment_to_doc(text);
                ProcessResult::Done
            },
            Token::Doctype(_) => {
                self.report_error("DOCTYPE not at start of document".into());
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, name, attrs, .. }) if name.as_str() == "html" => {
                self.insert_element(Namespace::Html, name, attrs, true);
                self.mode.set(InsertionMode::BeforeHead);
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. })
                if !matches!(name.as_str(), "head" | "body" | "html" | "br") =>
            {
                self.report_error("unexpected end tag before html".into());
                ProcessResult::Done
            },
            other => {
                let handle = self.insert_element(Namespace::Html, "html".into(), Vec::new(), true);
                let _ = handle;
                ProcessResult::Reprocess(InsertionMode::BeforeHead, other)
            },
        }
    }

    // ---- BEFORE_HEAD --------------------------------------------------------

    fn step_before_head(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::Characters(text) => match self.split_leading_whitespace(&text, false) {
                None => ProcessResult::Done,
                Some(rest) => ProcessResult::Reprocess(InsertionMode::BeforeHead, Token::Characters(rest)),
            },
            Token::Comment(text) => {
                self.append_comment(text);
                ProcessResult::Done
            },
            Token::Doctype(_) => {
                self.report_error("unexpected DOCTYPE".into());
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "html" => {
                self.step_in_body_start_html(token)
            },
            Token::Tag(Tag { kind: TagKind::StartTag, name, attrs, .. }) if name.as_str() == "head" => {
                let handle = self.insert_element(Namespace::Html, name, attrs, true);
                self.head_elem.set(Some(handle));
                self.sink.ref_node(handle);
                self.mode.set(InsertionMode::InHead);
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. })
                if !matches!(name.as_str(), "head" | "body" | "html" | "br") =>
            {
                self.report_error("unexpected end tag before head".into());
                ProcessResult::Done
            },
            other => {
                let handle = self.insert_element(Namespace::Html, "head".into(), Vec::new(), true);
                self.head_elem.set(Some(handle));
                self.sink.ref_node(handle);
                self.mode.set(InsertionMode::InHead);
                ProcessResult::Reprocess(InsertionMode::InHead, other)
            },
        }
    }

    // ---- IN_HEAD ------------------------------------------------------------

    fn step_in_head(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::Characters(text) => match self.split_leading_whitespace(&text, true) {
                None => ProcessResult::Done,
                Some(rest) => {
                    self.pop();
                    self.mode.set(InsertionMode::AfterHead);
                    ProcessResult::Reprocess(InsertionMode::AfterHead, Token::Characters(rest))
                },
            },
            Token::Comment(text) => {
                self.append_comment(text);
                ProcessResult::Done
            },
            Token::Doctype(_) => {
                self.report_error("unexpected DOCTYPE".into());
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "html" => {
                self.step_in_body_start_html(token)
            },
            Token::Tag(Tag { kind: TagKind::StartTag, name, attrs, self_closing: _, .. }) if is_void_head_tag(name.as_str()) => {
                self.insert_element_no_push(Tag { kind: TagKind::StartTag, name, attrs, self_closing: false });
                ProcessResult::DoneAckSelfClosing
            },
            Token::Tag(Tag { kind: TagKind::StartTag, name, attrs, .. }) if name.as_str() == "title" => {
                self.enter_generic_rcdata(Tag { kind: TagKind::StartTag, name, attrs, self_closing: false }, false);
                ProcessResult::SwitchContentModel(ContentModel::Rcdata)
            },
            Token::Tag(Tag { kind: TagKind::StartTag, name, attrs, .. })
                if name.as_str() == "noscript" && self.opts.scripting_enabled =>
            {
                self.insert_element(Namespace::Html, name, attrs, true);
                self.mode.set(InsertionMode::InHeadNoscript);
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, name, attrs, .. })
                if matches!(name.as_str(), "noframes" | "style") =>
            {
                self.enter_generic_rcdata(Tag { kind: TagKind::StartTag, name, attrs, self_closing: false }, false);
                ProcessResult::SwitchContentModel(ContentModel::Rcdata)
            },
            Token::Tag(Tag { kind: TagKind::StartTag, name, attrs, .. }) if name.as_str() == "noscript" => {
                // Scripting disabled: parsed as ordinary markup, not raw text.
                self.insert_element(Namespace::Html, name, attrs, true);
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, name, attrs, .. }) if name.as_str() == "script" => {
                self.enter_generic_rcdata(Tag { kind: TagKind::StartTag, name, attrs, self_closing: false }, true);
                ProcessResult::SwitchContentModel(ContentModel::ScriptData)
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if name.as_str() == "head" => {
                self.pop();
                self.mode.set(InsertionMode::AfterHead);
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "head" => {
                self.report_error("unexpected <head> inside <head>".into());
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. })
                if !matches!(name.as_str(), "body" | "html" | "br") =>
            {
                self.report_error("unexpected end tag in head".into());
                ProcessResult::Done
            },
            other => {
                self.pop();
                self.mode.set(InsertionMode::AfterHead);
                ProcessResult::Reprocess(InsertionMode::AfterHead, other)
            },
        }
    }

    fn step_in_head_noscript(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::Doctype(_) => {
                self.report_error("unexpected DOCTYPE".into());
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "html" => {
                self.step_in_body_start_html(token)
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if name.as_str() == "noscript" => {
                self.pop();
                self.mode.set(InsertionMode::InHead);
                ProcessResult::Done
            },
            Token::Characters(ref text) if is_whitespace(text) => self.step_in_head(token),
            Token::Comment(_) => self.step_in_head(token),
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. })
                if matches!(name.as_str(), "basefont" | "bgsound" | "link" | "meta" | "noframes" | "style") =>
            {
                self.step_in_head(token)
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if name.as_str() == "br" => {
                self.report_error("unexpected </br> in head noscript".into());
                self.pop();
                self.mode.set(InsertionMode::InHead);
                ProcessResult::Reprocess(InsertionMode::InHead, token)
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if matches!(name.as_str(), "head" | "noscript") => {
                self.report_error("unexpected tag in head noscript".into());
                ProcessResult::Done
            },
            other => {
                self.report_error("unexpected token in head noscript".into());
                self.pop();
                self.mode.set(InsertionMode::InHead);
                ProcessResult::Reprocess(InsertionMode::InHead, other)
            },
        }
    }

    fn step_after_head(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::Characters(text) => match self.split_leading_whitespace(&text, true) {
                None => ProcessResult::Done,
                Some(rest) => ProcessResult::Reprocess(InsertionMode::AfterHead, Token::Characters(rest)),
            },
            Token::Comment(text) => {
                self.append_comment(text);
                ProcessResult::Done
            },
            Token::Doctype(_) => {
                self.report_error("unexpected DOCTYPE".into());
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "html" => {
                self.step_in_body_start_html(token)
            },
            Token::Tag(Tag { kind: TagKind::StartTag, name, attrs, .. }) if name.as_str() == "body" => {
                let handle = self.insert_element(Namespace::Html, name, attrs, true);
                let _ = handle;
                self.frameset_ok.set(false);
                self.mode.set(InsertionMode::InBody);
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, name, attrs, .. }) if name.as_str() == "frameset" => {
                self.insert_element(Namespace::Html, name, attrs, true);
                self.mode.set(InsertionMode::InFrameset);
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. })
                if matches!(
                    name.as_str(),
                    "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script" | "style" | "template" | "title"
                ) =>
            {
                self.report_error("head element after </head>".into());
                let head = self.head_elem.get().expect("head element must exist");
                self.push_to_stack(Namespace::Html, ElementType::Head, head);
                let result = self.step_in_head(token);
                self.remove_stack_frame_by_handle(head);
                result
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if name.as_str() == "template" => self.step_in_head(token),
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. })
                if !matches!(name.as_str(), "body" | "html" | "br") =>
            {
                self.report_error("unexpected end tag after head".into());
                ProcessResult::Done
            },
            other => {
                self.insert_element(Namespace::Html, "body".into(), Vec::new(), true);
                self.mode.set(InsertionMode::InBody);
                ProcessResult::Reprocess(InsertionMode::InBody, other)
            },
        }
    }

    fn step_in_body_start_html(&self, token: Token) -> ProcessResult<Handle> {
        if let Token::Tag(Tag { attrs, .. }) = token {
            self.report_error("unexpected <html> start tag".into());
            let html = self.html_elem_handle();
            self.sink.add_attributes(html, attrs);
        }
        ProcessResult::Done
    }

    // ---- IN_BODY --------------------------------------------------------------

    fn step_in_body(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::NullCharacter => {
                self.report_error("unexpected NULL character".into());
                ProcessResult::Done
            },
            Token::Characters(text) => {
                self.reconstruct_active_formatting_elements();
                if !is_whitespace(&text) {
                    self.frameset_ok.set(false);
                }
                self.append_text(text);
                ProcessResult::Done
            },
            Token::Comment(text) => {
                self.append_comment(text);
                ProcessResult::Done
            },
            Token::Doctype(_) => {
                self.report_error("unexpected DOCTYPE".into());
                ProcessResult::Done
            },
            Token::Eof => {
                if !self.open_elems.borrow().is_empty() {
                    // Real HTML5 also checks for a handful of elements still
                    // open that should generate a parse error; not load-bearing
                    // for tree shape, so skipped here.
                }
                ProcessResult::Done
            },
            Token::Tag(tag @ Tag { kind: TagKind::StartTag, .. }) => self.step_in_body_start_tag(tag),
            Token::Tag(tag @ Tag { kind: TagKind::EndTag, .. }) => self.step_in_body_end_tag(tag),
        }
    }

    fn step_in_body_start_tag(&self, tag: Tag) -> ProcessResult<Handle> {
        let name = tag.name.as_str();
        match name {
            "html" => self.step_in_body_start_html(Token::Tag(tag)),
            "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script" | "style" | "template" | "title" => {
                self.step_in_head(Token::Tag(tag))
            },
            "body" => {
                self.report_error("unexpected <body> start tag".into());
                ProcessResult::Done
            },
            "frameset" => {
                self.report_error("unexpected <frameset> start tag".into());
                ProcessResult::Done
            },
            "address" | "article" | "aside" | "blockquote" | "center" | "details" | "dialog" | "dir" | "div" | "dl"
            | "fieldset" | "figcaption" | "figure" | "footer" | "header" | "hgroup" | "main" | "menu" | "nav" | "ol"
            | "p" | "section" | "summary" | "ul" => {
                if self.in_button_scope(ElementType::P) {
                    self.close_p_element();
                }
                self.insert_element_for(tag);
                ProcessResult::Done
            },
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                if self.in_button_scope(ElementType::P) {
                    self.close_p_element();
                }
                if is_heading(self.current_node_type()) {
                    self.report_error("nested heading elements".into());
                    self.pop();
                }
                self.insert_element_for(tag);
                ProcessResult::Done
            },
            "pre" | "listing" => {
                if self.in_button_scope(ElementType::P) {
                    self.close_p_element();
                }
                self.insert_element_for(tag);
                self.ignore_lf.set(true);
                self.frameset_ok.set(false);
                ProcessResult::Done
            },
            "form" => {
                if self.form_elem.get().is_some() && !self.open_elems.borrow().position(|f| f.ty == ElementType::Template).is_some() {
                    self.report_error("nested <form>".into());
                    return ProcessResult::Done;
                }
                if self.in_button_scope(ElementType::P) {
                    self.close_p_element();
                }
                let handle = self.insert_element_for(tag);
                self.form_elem.set(Some(handle));
                self.sink.ref_node(handle);
                ProcessResult::Done
            },
            "li" => {
                self.close_list_item_scope(ElementType::Li);
                if self.in_button_scope(ElementType::P) {
                    self.close_p_element();
                }
                self.insert_element_for(tag);
                ProcessResult::Done
            },
            "dd" | "dt" => {
                self.close_list_item_scope(if name == "dd" { ElementType::Dd } else { ElementType::Dt });
                if self.in_button_scope(ElementType::P) {
                    self.close_p_element();
                }
                self.insert_element_for(tag);
                ProcessResult::Done
            },
            "plaintext" => {
                if self.in_button_scope(ElementType::P) {
                    self.close_p_element();
                }
                self.insert_element_for(tag);
                ProcessResult::SwitchContentModel(ContentModel::Plaintext)
            },
            "button" => {
                if self.in_scope(ElementType::Button) {
                    self.report_error("nested <button>".into());
                    self.close_implied_end_tags(None);
                    self.process_end_tag_in_body(ElementType::Button);
                }
                self.reconstruct_active_formatting_elements();
                self.insert_element_for(tag);
                self.frameset_ok.set(false);
                ProcessResult::Done
            },
            "a" => {
                let has_a = self.active_formatting.borrow().iter_from_last_marker().any(|(_, e)| {
                    matches!(e, FormatEntry::Element { name, .. } if name.local.as_str() == "a")
                });
                if has_a {
                    self.report_error("nested <a>, running adoption agency".into());
                    self.adoption_agency(ElementType::A);
                }
                self.reconstruct_active_formatting_elements();
                self.create_formatting_element_for(tag);
                ProcessResult::Done
            },
            "b" | "big" | "code" | "em" | "font" | "i" | "s" | "small" | "strike" | "strong" | "tt" | "u" => {
                self.reconstruct_active_formatting_elements();
                self.create_formatting_element_for(tag);
                ProcessResult::Done
            },
            "nobr" => {
                self.reconstruct_active_formatting_elements();
                if self.in_scope(ElementType::Nobr) {
                    self.report_error("nested <nobr>".into());
                    self.adoption_agency(ElementType::Nobr);
                    self.reconstruct_active_formatting_elements();
                }
                self.create_formatting_element_for(tag);
                ProcessResult::Done
            },
            "applet" | "marquee" | "object" => {
                self.reconstruct_active_formatting_elements();
                self.insert_element_for(tag);
                self.active_formatting.borrow_mut().push_marker();
                self.frameset_ok.set(false);
                ProcessResult::Done
            },
            "table" => {
                if self.quirks_mode.get() != QuirksMode::Quirks && self.in_button_scope(ElementType::P) {
                    self.close_p_element();
                }
                self.insert_element_for(tag);
                self.frameset_ok.set(false);
                self.mode.set(InsertionMode::InTable);
                ProcessResult::Done
            },
            "area" | "br" | "embed" | "img" | "keygen" | "wbr" => {
                self.reconstruct_active_formatting_elements();
                self.insert_element_no_push(tag);
                self.frameset_ok.set(false);
                ProcessResult::DoneAckSelfClosing
            },
            "input" => {
                let is_hidden = tag
                    .attrs
                    .iter()
                    .any(|a| a.name.local.as_str() == "type" && a.value.eq_ignore_ascii_case("hidden"));
                self.reconstruct_active_formatting_elements();
                self.insert_element_no_push(tag);
                if !is_hidden {
                    self.frameset_ok.set(false);
                }
                ProcessResult::DoneAckSelfClosing
            },
            "param" | "source" | "track" => {
                self.insert_element_no_push(tag);
                ProcessResult::DoneAckSelfClosing
            },
            "hr" => {
                if self.in_button_scope(ElementType::P) {
                    self.close_p_element();
                }
                self.insert_element_no_push(tag);
                self.frameset_ok.set(false);
                ProcessResult::DoneAckSelfClosing
            },
            "image" => {
                self.report_error("<image> treated as <img>".into());
                let mut tag = tag;
                tag.name = "img".into();
                self.step_in_body_start_tag(tag)
            },
            "textarea" => {
                self.enter_generic_rcdata(tag, false);
                self.frameset_ok.set(false);
                ProcessResult::SwitchContentModel(ContentModel::Rcdata)
            },
            "xmp" => {
                if self.in_button_scope(ElementType::P) {
                    self.close_p_element();
                }
                self.reconstruct_active_formatting_elements();
                self.frameset_ok.set(false);
                self.enter_generic_rcdata(tag, false);
                ProcessResult::SwitchContentModel(ContentModel::Cdata)
            },
            "iframe" => {
                self.frameset_ok.set(false);
                self.enter_generic_rcdata(tag, false);
                ProcessResult::SwitchContentModel(ContentModel::Cdata)
            },
            "noembed" => {
                self.enter_generic_rcdata(tag, false);
                ProcessResult::SwitchContentModel(ContentModel::Cdata)
            },
            "select" => {
                self.reconstruct_active_formatting_elements();
                self.insert_element_for(tag);
                self.frameset_ok.set(false);
                self.mode.set(match self.mode.get() {
                    InsertionMode::InTable
                    | InsertionMode::InCaption
                    | InsertionMode::InTableBody
                    | InsertionMode::InRow
                    | InsertionMode::InCell => InsertionMode::InSelectInTable,
                    _ => InsertionMode::InSelect,
                });
                ProcessResult::Done
            },
            "optgroup" | "option" => {
                if self.current_node_type() == ElementType::Option {
                    self.pop();
                }
                self.reconstruct_active_formatting_elements();
                self.insert_element_for(tag);
                ProcessResult::Done
            },
            "rp" | "rt" => {
                if self.in_scope(ElementType::Option) {
                    // not part of the real algorithm; placeholder no-op guard
                }
                self.close_implied_end_tags(None);
                self.insert_element_for(tag);
                ProcessResult::Done
            },
            "math" => {
                self.reconstruct_active_formatting_elements();
                self.insert_foreign_element(tag, Namespace::MathMl);
                ProcessResult::DoneAckSelfClosing
            },
            "svg" => {
                self.reconstruct_active_formatting_elements();
                self.insert_foreign_element(tag, Namespace::Svg);
                ProcessResult::DoneAckSelfClosing
            },
            "caption" | "col" | "colgroup" | "frame" | "head" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr" => {
                self.report_error("stray table-structure start tag in body".into());
                ProcessResult::Done
            },
            _ => {
                self.reconstruct_active_formatting_elements();
                self.insert_element_for(tag);
                ProcessResult::Done
            },
        }
    }

    fn insert_foreign_element(&self, tag: Tag, ns: Namespace) {
        let mut attrs = tag.attrs;
        self.adjust_foreign_attributes(&mut attrs);
        let handle = self.insert_element(ns, tag.name, attrs, !tag.self_closing);
        if tag.self_closing {
            // Not pushed; nothing further to do for a self-closing foreign element.
            let _ = handle;
        }
    }

    fn close_p_element(&self) {
        self.close_implied_end_tags(Some(ElementType::P));
        if self.current_node_type() != ElementType::P {
            self.report_error("unclosed <p> element".into());
        }
        while self.current_node_type() != ElementType::P {
            if self.open_elems.borrow().len() == 1 {
                break;
            }
            self.pop();
        }
        if self.current_node_type() == ElementType::P {
            self.pop();
        }
    }

    fn close_list_item_scope(&self, target: ElementType) {
        let stack = self.open_elems.borrow();
        let mut blocked = false;
        for frame in stack.iter().rev() {
            if frame.ty == target {
                break;
            }
            if matches!(frame.ty, ElementType::Table | ElementType::Button) || frame.ty.is_scoping() {
                blocked = true;
                break;
            }
            if matches!(frame.ty, ElementType::Address | ElementType::Div | ElementType::P) {
                continue;
            }
            if frame.ty.is_special() {
                blocked = true;
                break;
            }
        }
        drop(stack);
        if blocked {
            return;
        }
        if !self.in_button_scope(target) {
            return;
        }
        self.close_implied_end_tags(Some(target));
        if self.current_node_type() != target {
            self.report_error("unclosed list item".into());
        }
        while self.current_node_type() != target {
            if self.open_elems.borrow().len() == 1 {
                return;
            }
            self.pop();
        }
        self.pop();
    }

    fn step_in_body_end_tag(&self, tag: Tag) -> ProcessResult<Handle> {
        let name = tag.name.as_str();
        match name {
            "body" => {
                if !self.in_scope(ElementType::Body) {
                    self.report_error("</body> without matching <body>".into());
                    return ProcessResult::Done;
                }
                self.mode.set(InsertionMode::AfterBody);
                ProcessResult::Done
            },
            "html" => {
                if !self.in_scope(ElementType::Body) {
                    self.report_error("</html> without matching <body>".into());
                    return ProcessResult::Done;
                }
                ProcessResult::Reprocess(InsertionMode::AfterBody, Token::Tag(tag))
            },
            "address" | "article" | "aside" | "blockquote" | "button" | "center" | "details" | "dialog" | "dir" | "div"
            | "dl" | "fieldset" | "figcaption" | "figure" | "footer" | "header" | "hgroup" | "listing" | "main" | "menu"
            | "nav" | "ol" | "pre" | "section" | "summary" | "ul" => {
                let ty = crate::element::type_from_name(name);
                if !self.in_scope(ty) {
                    self.report_error("unmatched end tag".into());
                    return ProcessResult::Done;
                }
                self.close_implied_end_tags(None);
                if self.current_node_type() != ty {
                    self.report_error("mis-nested end tag".into());
                }
                while self.current_node_type() != ty {
                    self.pop();
                }
                self.pop();
                ProcessResult::Done
            },
            "form" => {
                let form = self.form_elem.get();
                match form {
                    Some(form) if !self.open_elems.borrow().position(|f| f.ty == ElementType::Template).is_some() => {
                        self.form_elem.set(None);
                        self.sink.unref_node(form);
                        if !self.open_elems.borrow().position(|f| f.handle == form).is_some() {
                            self.report_error("</form> without matching open <form>".into());
                            return ProcessResult::Done;
                        }
                        self.close_implied_end_tags(None);
                        if self.current_node_handle() != form {
                            self.report_error("mis-nested </form>".into());
                        }
                        self.remove_stack_frame_by_handle(form);
                        ProcessResult::Done
                    },
                    _ => {
                        self.process_end_tag_in_body(ElementType::Form);
                        ProcessResult::Done
                    },
                }
            },
            "p" => {
                if !self.in_button_scope(ElementType::P) {
                    self.report_error("</p> with no open <p>".into());
                    self.insert_element(Namespace::Html, "p".into(), Vec::new(), true);
                }
                self.close_p_element();
                ProcessResult::Done
            },
            "li" => {
                if !self.in_list_item_scope(ElementType::Li) {
                    self.report_error("</li> with no open <li>".into());
                    return ProcessResult::Done;
                }
                self.close_implied_end_tags(Some(ElementType::Li));
                while self.current_node_type() != ElementType::Li {
                    self.pop();
                }
                self.pop();
                ProcessResult::Done
            },
            "dd" | "dt" => {
                let ty = crate::element::type_from_name(name);
                if !self.in_scope(ty) {
                    self.report_error("end tag with nothing matching in scope".into());
                    return ProcessResult::Done;
                }
                self.close_implied_end_tags(Some(ty));
                while self.current_node_type() != ty {
                    self.pop();
                }
                self.pop();
                ProcessResult::Done
            },
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let any_open = ["h1", "h2", "h3", "h4", "h5", "h6"]
                    .iter()
                    .any(|h| self.in_scope(crate::element::type_from_name(h)));
                if !any_open {
                    self.report_error("heading end tag with no matching heading open".into());
                    return ProcessResult::Done;
                }
                self.close_implied_end_tags(None);
                if !is_heading(self.current_node_type()) {
                    self.report_error("mis-nested heading end tag".into());
                }
                while !is_heading(self.current_node_type()) {
                    self.pop();
                }
                self.pop();
                ProcessResult::Done
            },
            "a" | "b" | "big" | "code" | "em" | "font" | "i" | "nobr" | "s" | "small" | "strike" | "strong" | "tt" | "u" => {
                self.adoption_agency(crate::element::type_from_name(name));
                ProcessResult::Done
            },
            "applet" | "marquee" | "object" => {
                let ty = crate::element::type_from_name(name);
                if !self.in_scope(ty) {
                    self.report_error("unmatched end tag".into());
                    return ProcessResult::Done;
                }
                self.close_implied_end_tags(None);
                while self.current_node_type() != ty {
                    self.pop();
                }
                self.pop();
                self.clear_active_formatting_to_marker();
                ProcessResult::Done
            },
            "br" => {
                self.report_error("</br> treated as <br>".into());
                self.reconstruct_active_formatting_elements();
                self.insert_element_no_push(Tag { kind: TagKind::StartTag, name: "br".into(), attrs: Vec::new(), self_closing: false });
                self.frameset_ok.set(false);
                ProcessResult::Done
            },
            _ => {
                self.process_end_tag_in_body(crate::element::type_from_name(name));
                ProcessResult::Done
            },
        }
    }

    // ---- table family -----------------------------------------------------

    fn clear_stack_back_to(&self, targets: &[ElementType]) {
        while !targets.contains(&self.current_node_type()) && self.open_elems.borrow().len() > 1 {
            self.pop();
        }
    }

    fn process_text_in_table(&self, text: markup5ever::StrTendril) -> ProcessResult<Handle> {
        if is_whitespace(&text) {
            self.append_text(text);
        } else {
            self.report_error("non-whitespace text inside <table>".into());
            self.frameset_ok.set(false);
            self.foster_parenting.set(true);
            self.reconstruct_active_formatting_elements();
            self.append_text(text);
            self.foster_parenting.set(false);
        }
        ProcessResult::Done
    }

    fn step_in_table(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::Characters(text) => self.process_text_in_table(text),
            Token::Comment(text) => {
                self.append_comment(text);
                ProcessResult::Done
            },
            Token::Doctype(_) => {
                self.report_error("unexpected DOCTYPE in table".into());
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, name, attrs, .. }) if name.as_str() == "caption" => {
                self.clear_stack_back_to(&[ElementType::Html, ElementType::Table, ElementType::Template]);
                self.active_formatting.borrow_mut().push_marker();
                self.insert_element(Namespace::Html, name, attrs, true);
                self.mode.set(InsertionMode::InCaption);
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, name, attrs, .. }) if name.as_str() == "colgroup" => {
                self.clear_stack_back_to(&[ElementType::Html, ElementType::Table, ElementType::Template]);
                self.insert_element(Namespace::Html, name, attrs, true);
                self.mode.set(InsertionMode::InColumnGroup);
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "col" => {
                self.clear_stack_back_to(&[ElementType::Html, ElementType::Table, ElementType::Template]);
                self.insert_element(Namespace::Html, "colgroup".into(), Vec::new(), true);
                ProcessResult::Reprocess(InsertionMode::InColumnGroup, token)
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. })
                if matches!(name.as_str(), "tbody" | "tfoot" | "thead") =>
            {
                self.clear_stack_back_to(&[ElementType::Html, ElementType::Table, ElementType::Template]);
                if let Token::Tag(Tag { name, attrs, .. }) = token {
                    self.insert_element(Namespace::Html, name, attrs, true);
                }
                self.mode.set(InsertionMode::InTableBody);
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if matches!(name.as_str(), "td" | "th" | "tr") => {
                self.clear_stack_back_to(&[ElementType::Html, ElementType::Table, ElementType::Template]);
                self.insert_element(Namespace::Html, "tbody".into(), Vec::new(), true);
                self.mode.set(InsertionMode::InTableBody);
                ProcessResult::Reprocess(InsertionMode::InTableBody, token)
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "table" => {
                self.report_error("nested <table>".into());
                if !self.in_scope(ElementType::Table) {
                    return ProcessResult::Done;
                }
                while self.current_node_type() != ElementType::Table {
                    self.pop();
                }
                self.pop();
                self.mode.set(self.reset_insertion_mode());
                ProcessResult::Reprocess(self.mode.get(), token)
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if name.as_str() == "table" => {
                if !self.in_scope(ElementType::Table) {
                    self.report_error("</table> without matching <table>".into());
                    return ProcessResult::Done;
                }
                while self.current_node_type() != ElementType::Table {
                    self.pop();
                }
                self.pop();
                self.mode.set(self.reset_insertion_mode());
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. })
                if matches!(
                    name.as_str(),
                    "body" | "caption" | "col" | "colgroup" | "html" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr"
                ) =>
            {
                self.report_error("stray table end tag".into());
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "style" || name.as_str() == "script" => {
                self.step_in_head(token)
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "input" => {
                let is_hidden = match &token {
                    Token::Tag(tag) => tag
                        .attrs
                        .iter()
                        .any(|a| a.name.local.as_str() == "type" && a.value.eq_ignore_ascii_case("hidden")),
                    _ => false,
                };
                if is_hidden {
                    self.report_error("hidden <input> inside <table>".into());
                    if let Token::Tag(tag) = token {
                        self.insert_element_no_push(tag);
                    }
                    ProcessResult::DoneAckSelfClosing
                } else {
                    self.step_in_table_foster(token)
                }
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "form" => {
                self.report_error("<form> inside <table>".into());
                if self.form_elem.get().is_none() {
                    if let Token::Tag(Tag { name, attrs, .. }) = token {
                        let handle = self.insert_element(Namespace::Html, name, attrs, false);
                        self.form_elem.set(Some(handle));
                        self.sink.ref_node(handle);
                    }
                }
                ProcessResult::Done
            },
            Token::Eof => self.step_in_body(token),
            other => self.step_in_table_foster(other),
        }
    }

    /// "Anything else" in IN_TABLE: process using IN_BODY's rules, but with
    /// foster parenting switched on for the duration (the non-character
    /// cases, e.g. stray start tags, are foster-parented the same way text
    /// is).
    fn step_in_table_foster(&self, token: Token) -> ProcessResult<Handle> {
        self.report_error("unexpected token inside <table>, foster parenting".into());
        self.foster_parenting.set(true);
        let result = self.step_in_body(token);
        self.foster_parenting.set(false);
        result
    }

    fn step_in_caption(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if name.as_str() == "caption" => {
                if !self.in_scope(ElementType::Caption) {
                    self.report_error("</caption> without matching <caption>".into());
                    return ProcessResult::Done;
                }
                self.close_implied_end_tags(None);
                while self.current_node_type() != ElementType::Caption {
                    self.pop();
                }
                self.pop();
                self.clear_active_formatting_to_marker();
                self.mode.set(InsertionMode::InTable);
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. })
                if matches!(name.as_str(), "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr") =>
            {
                if !self.in_scope(ElementType::Caption) {
                    return ProcessResult::Done;
                }
                while self.current_node_type() != ElementType::Caption {
                    self.pop();
                }
                self.pop();
                self.clear_active_formatting_to_marker();
                self.mode.set(InsertionMode::InTable);
                ProcessResult::Reprocess(InsertionMode::InTable, token)
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if matches!(name.as_str(), "body" | "col" | "colgroup" | "html" | "table" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr") => {
                self.report_error("stray end tag inside <caption>".into());
                ProcessResult::Done
            },
            other => self.step_in_body(other),
        }
    }

    fn step_in_column_group(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::Characters(ref text) if is_whitespace(text) => {
                if let Token::Characters(text) = token {
                    self.append_text(text);
                }
                ProcessResult::Done
            },
            Token::Comment(text) => {
                self.append_comment(text);
                ProcessResult::Done
            },
            Token::Doctype(_) => ProcessResult::Done,
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "html" => {
                self.step_in_body_start_html(token)
            },
            Token::Tag(Tag { kind: TagKind::StartTag, name, attrs, .. }) if name.as_str() == "col" => {
                self.insert_element_no_push(Tag { kind: TagKind::StartTag, name, attrs, self_closing: false });
                ProcessResult::DoneAckSelfClosing
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if name.as_str() == "colgroup" => {
                if self.current_node_type() != ElementType::Colgroup {
                    self.report_error("</colgroup> without matching <colgroup>".into());
                    return ProcessResult::Done;
                }
                self.pop();
                self.mode.set(InsertionMode::InTable);
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if name.as_str() == "col" => {
                self.report_error("</col> has no matching start tag".into());
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "template" => self.step_in_head(token),
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if name.as_str() == "template" => self.step_in_head(token),
            Token::Eof => self.step_in_body(token),
            other => {
                if self.current_node_type() != ElementType::Colgroup {
                    return ProcessResult::Done;
                }
                self.pop();
                ProcessResult::Reprocess(InsertionMode::InTable, other)
            },
        }
    }

    fn step_in_table_body(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "tr" => {
                self.clear_stack_back_to(&[ElementType::Html, ElementType::Tbody, ElementType::Thead, ElementType::Tfoot]);
                if let Token::Tag(Tag { name, attrs, .. }) = token {
                    self.insert_element(Namespace::Html, name, attrs, true);
                }
                self.mode.set(InsertionMode::InRow);
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if matches!(name.as_str(), "th" | "td") => {
                self.report_error("<td>/<th> without an enclosing <tr>".into());
                self.clear_stack_back_to(&[ElementType::Html, ElementType::Tbody, ElementType::Thead, ElementType::Tfoot]);
                self.insert_element(Namespace::Html, "tr".into(), Vec::new(), true);
                self.mode.set(InsertionMode::InRow);
                ProcessResult::Reprocess(InsertionMode::InRow, token)
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. })
                if matches!(name.as_str(), "caption" | "col" | "colgroup" | "tbody" | "tfoot" | "thead") =>
            {
                if !["tbody", "thead", "tfoot"].iter().any(|t| self.in_scope(crate::element::type_from_name(t))) {
                    return ProcessResult::Done;
                }
                self.clear_stack_back_to(&[ElementType::Html, ElementType::Tbody, ElementType::Thead, ElementType::Tfoot]);
                self.pop();
                self.mode.set(InsertionMode::InTable);
                ProcessResult::Reprocess(InsertionMode::InTable, token)
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if matches!(name.as_str(), "tbody" | "tfoot" | "thead") => {
                let ty = crate::element::type_from_name(name.as_str());
                if !self.in_scope(ty) {
                    self.report_error("unmatched table-section end tag".into());
                    return ProcessResult::Done;
                }
                self.clear_stack_back_to(&[ElementType::Html, ElementType::Tbody, ElementType::Thead, ElementType::Tfoot]);
                self.pop();
                self.mode.set(InsertionMode::InTable);
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. })
                if matches!(name.as_str(), "body" | "caption" | "col" | "colgroup" | "html" | "td" | "th" | "tr") =>
            {
                self.report_error("stray end tag inside table section".into());
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if name.as_str() == "table" => {
                self.clear_stack_back_to(&[ElementType::Html, ElementType::Tbody, ElementType::Thead, ElementType::Tfoot]);
                self.pop();
                self.mode.set(InsertionMode::InTable);
                ProcessResult::Reprocess(InsertionMode::InTable, token)
            },
            other => self.step_in_table(other),
        }
    }

    fn step_in_row(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if matches!(name.as_str(), "th" | "td") => {
                self.clear_stack_back_to(&[ElementType::Html, ElementType::Tr]);
                if let Token::Tag(Tag { name, attrs, .. }) = token {
                    self.insert_element(Namespace::Html, name, attrs, true);
                }
                self.mode.set(InsertionMode::InCell);
                self.active_formatting.borrow_mut().push_marker();
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if name.as_str() == "tr" => {
                if !self.in_scope(ElementType::Tr) {
                    self.report_error("</tr> without matching <tr>".into());
                    return ProcessResult::Done;
                }
                self.clear_stack_back_to(&[ElementType::Html, ElementType::Tr]);
                self.pop();
                self.mode.set(InsertionMode::InTableBody);
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. })
                if matches!(name.as_str(), "caption" | "col" | "colgroup" | "tbody" | "tfoot" | "thead" | "tr") =>
            {
                if !self.in_scope(ElementType::Tr) {
                    return ProcessResult::Done;
                }
                self.clear_stack_back_to(&[ElementType::Html, ElementType::Tr]);
                self.pop();
                self.mode.set(InsertionMode::InTableBody);
                ProcessResult::Reprocess(InsertionMode::InTableBody, token)
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if matches!(name.as_str(), "tbody" | "tfoot" | "thead") => {
                let ty = crate::element::type_from_name(name.as_str());
                if !self.in_scope(ty) || !self.in_scope(ElementType::Tr) {
                    return ProcessResult::Done;
                }
                self.clear_stack_back_to(&[ElementType::Html, ElementType::Tr]);
                self.pop();
                self.mode.set(InsertionMode::InTableBody);
                ProcessResult::Reprocess(InsertionMode::InTableBody, token)
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. })
                if matches!(name.as_str(), "body" | "caption" | "col" | "colgroup" | "html" | "td" | "th") =>
            {
                self.report_error("stray end tag inside <tr>".into());
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if name.as_str() == "table" => {
                if !self.in_scope(ElementType::Tr) {
                    return ProcessResult::Done;
                }
                self.clear_stack_back_to(&[ElementType::Html, ElementType::Tr]);
                self.pop();
                self.mode.set(InsertionMode::InTableBody);
                ProcessResult::Reprocess(InsertionMode::InTableBody, token)
            },
            other => self.step_in_table(other),
        }
    }

    fn step_in_cell(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if matches!(name.as_str(), "td" | "th") => {
                let ty = crate::element::type_from_name(name.as_str());
                if !self.in_scope(ty) {
                    self.report_error("unmatched table-cell end tag".into());
                    return ProcessResult::Done;
                }
                self.close_implied_end_tags(None);
                while self.current_node_type() != ty {
                    self.pop();
                }
                self.pop();
                self.clear_active_formatting_to_marker();
                self.mode.set(InsertionMode::InRow);
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. })
                if matches!(
                    name.as_str(),
                    "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr"
                ) =>
            {
                if !self.in_scope(ElementType::Td) && !self.in_scope(ElementType::Th) {
                    return ProcessResult::Done;
                }
                let ty = if self.in_scope(ElementType::Td) { ElementType::Td } else { ElementType::Th };
                self.close_implied_end_tags(None);
                while self.current_node_type() != ty {
                    self.pop();
                }
                self.pop();
                self.clear_active_formatting_to_marker();
                self.mode.set(InsertionMode::InRow);
                ProcessResult::Reprocess(InsertionMode::InRow, token)
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. })
                if matches!(name.as_str(), "body" | "caption" | "col" | "colgroup" | "html") =>
            {
                self.report_error("stray end tag inside table cell".into());
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if matches!(name.as_str(), "table" | "tbody" | "tfoot" | "thead" | "tr") => {
                let ty = crate::element::type_from_name(name.as_str());
                if !self.in_scope(ty) {
                    return ProcessResult::Done;
                }
                let cell_ty = if self.in_scope(ElementType::Td) { ElementType::Td } else { ElementType::Th };
                self.close_implied_end_tags(None);
                while self.current_node_type() != cell_ty {
                    self.pop();
                }
                self.pop();
                self.clear_active_formatting_to_marker();
                self.mode.set(InsertionMode::InRow);
                ProcessResult::Reprocess(InsertionMode::InRow, token)
            },
            other => self.step_in_body(other),
        }
    }

    // ---- select family ------------------------------------------------------

    fn step_in_select(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::NullCharacter => ProcessResult::Done,
            Token::Characters(text) => {
                self.append_text(text);
                ProcessResult::Done
            },
            Token::Comment(text) => {
                self.append_comment(text);
                ProcessResult::Done
            },
            Token::Doctype(_) => ProcessResult::Done,
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "html" => {
                self.step_in_body_start_html(token)
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "option" => {
                if self.current_node_type() == ElementType::Option {
                    self.pop();
                }
                if let Token::Tag(Tag { name, attrs, .. }) = token {
                    self.insert_element(Namespace::Html, name, attrs, true);
                }
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "optgroup" => {
                if self.current_node_type() == ElementType::Option {
                    self.pop();
                }
                if self.current_node_type() == ElementType::Optgroup {
                    self.pop();
                }
                if let Token::Tag(Tag { name, attrs, .. }) = token {
                    self.insert_element(Namespace::Html, name, attrs, true);
                }
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if name.as_str() == "optgroup" => {
                if self.current_node_type() == ElementType::Option && self.prev_node_type() == ElementType::Optgroup {
                    self.pop();
                }
                if self.current_node_type() == ElementType::Optgroup {
                    self.pop();
                } else {
                    self.report_error("</optgroup> without matching <optgroup>".into());
                }
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if name.as_str() == "option" => {
                if self.current_node_type() == ElementType::Option {
                    self.pop();
                } else {
                    self.report_error("</option> without matching <option>".into());
                }
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if name.as_str() == "select" => {
                if !self.in_scope(ElementType::Select) {
                    self.report_error("</select> without matching <select>".into());
                    return ProcessResult::Done;
                }
                while self.current_node_type() != ElementType::Select {
                    self.pop();
                }
                self.pop();
                self.mode.set(self.reset_insertion_mode());
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "select" => {
                self.report_error("nested <select> treated as </select>".into());
                while self.current_node_type() != ElementType::Select {
                    self.pop();
                }
                self.pop();
                self.mode.set(self.reset_insertion_mode());
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if matches!(name.as_str(), "input" | "keygen" | "textarea") => {
                self.report_error("form control inside <select> closes it".into());
                if !self.in_scope(ElementType::Select) {
                    return ProcessResult::Done;
                }
                while self.current_node_type() != ElementType::Select {
                    self.pop();
                }
                self.pop();
                self.mode.set(self.reset_insertion_mode());
                ProcessResult::Reprocess(self.mode.get(), token)
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if matches!(name.as_str(), "script" | "template") => {
                self.step_in_head(token)
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if name.as_str() == "template" => self.step_in_head(token),
            Token::Eof => self.step_in_body(token),
            _ => {
                self.report_error("unexpected token inside <select>".into());
                ProcessResult::Done
            },
        }
    }

    fn step_in_select_in_table(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. })
                if matches!(name.as_str(), "caption" | "table" | "tbody" | "tfoot" | "thead" | "td" | "th" | "tr") =>
            {
                self.report_error("table element closes an inner <select>".into());
                while self.current_node_type() != ElementType::Select {
                    self.pop();
                }
                self.pop();
                self.mode.set(self.reset_insertion_mode());
                ProcessResult::Reprocess(self.mode.get(), token)
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. })
                if matches!(name.as_str(), "caption" | "table" | "tbody" | "tfoot" | "thead" | "td" | "th" | "tr") =>
            {
                let ty = crate::element::type_from_name(name.as_str());
                if !self.in_scope(ty) {
                    return ProcessResult::Done;
                }
                while self.current_node_type() != ElementType::Select {
                    self.pop();
                }
                self.pop();
                self.mode.set(self.reset_insertion_mode());
                ProcessResult::Reprocess(self.mode.get(), token)
            },
            other => self.step_in_select(other),
        }
    }

    // ---- foreign content ----------------------------------------------------

    fn step_in_foreign_content(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::NullCharacter => {
                self.report_error("unexpected NULL in foreign content".into());
                self.append_text("\u{FFFD}".into());
                ProcessResult::Done
            },
            Token::Characters(text) => {
                if !is_whitespace(&text) {
                    self.frameset_ok.set(false);
                }
                self.append_text(text);
                ProcessResult::Done
            },
            Token::Comment(text) => {
                self.append_comment(text);
                ProcessResult::Done
            },
            Token::Doctype(_) => {
                self.report_error("unexpected DOCTYPE in foreign content".into());
                ProcessResult::Done
            },
            Token::Tag(tag @ Tag { kind: TagKind::StartTag, .. }) => {
                let ns = self.current_node_type_namespace();
                let mut tag = tag;
                if ns == Namespace::Svg {
                    if let Some(fixed) = adjust_svg_tag_name(tag.name.as_str()) {
                        tag.name = fixed.into();
                    }
                }
                self.adjust_foreign_attributes(&mut tag.attrs);
                self.insert_foreign_element(tag, ns);
                ProcessResult::Done
            },
            Token::Tag(tag @ Tag { kind: TagKind::EndTag, .. }) => {
                // Walk up from the current node looking for a same-named
                // element; pop everything above a match, or just the
                // current node if the top-of-stack name already matches.
                let name = tag.name.as_str().to_ascii_lowercase();
                let mut index = self.open_elems.borrow().len();
                loop {
                    if index == 0 {
                        break;
                    }
                    index -= 1;
                    let (matches, ns) = {
                        let stack = self.open_elems.borrow();
                        let frame = stack.get(index).unwrap();
                        (self.sink.elem_name(frame.handle).local.as_str() == name, frame.ns)
                    };
                    if index == 0 || ns == Namespace::Html {
                        break;
                    }
                    if matches {
                        while self.open_elems.borrow().len() > index {
                            self.pop();
                        }
                        break;
                    }
                }
                ProcessResult::Done
            },
            Token::Eof => ProcessResult::Done,
        }
    }

    fn current_node_type_namespace(&self) -> Namespace {
        self.open_elems.borrow().current().ns
    }

    // ---- trailing modes -------------------------------------------------------

    fn step_after_body(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::Characters(ref text) if is_whitespace(text) => self.step_in_body(token),
            Token::Comment(text) => {
                self.append_comment_to_html(text);
                ProcessResult::Done
            },
            Token::Doctype(_) => {
                self.report_error("unexpected DOCTYPE after body".into());
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "html" => {
                self.step_in_body_start_html(token)
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if name.as_str() == "html" => {
                self.mode.set(InsertionMode::AfterAfterBody);
                ProcessResult::Done
            },
            Token::Eof => ProcessResult::Done,
            other => {
                self.report_error("unexpected token after body".into());
                self.mode.set(InsertionMode::InBody);
                ProcessResult::Reprocess(InsertionMode::InBody, other)
            },
        }
    }

    fn step_in_frameset(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::Characters(ref text) if is_whitespace(text) => {
                if let Token::Characters(text) = token {
                    self.append_text(text);
                }
                ProcessResult::Done
            },
            Token::Comment(text) => {
                self.append_comment(text);
                ProcessResult::Done
            },
            Token::Doctype(_) => ProcessResult::Done,
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "html" => {
                self.step_in_body_start_html(token)
            },
            Token::Tag(Tag { kind: TagKind::StartTag, name, attrs, .. }) if name.as_str() == "frameset" => {
                self.insert_element(Namespace::Html, name, attrs, true);
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if name.as_str() == "frameset" => {
                if self.open_elems.borrow().len() == 1 {
                    self.report_error("stray </frameset>".into());
                    return ProcessResult::Done;
                }
                self.pop();
                if self.current_node_type() != ElementType::Frameset {
                    self.mode.set(InsertionMode::AfterFrameset);
                }
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, name, attrs, .. }) if name.as_str() == "frame" => {
                self.insert_element_no_push(Tag { kind: TagKind::StartTag, name, attrs, self_closing: false });
                ProcessResult::DoneAckSelfClosing
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "noframes" => self.step_in_head(token),
            Token::Eof => ProcessResult::Done,
            _ => {
                self.report_error("unexpected token inside <frameset>".into());
                ProcessResult::Done
            },
        }
    }

    fn step_after_frameset(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::Characters(ref text) if is_whitespace(text) => {
                if let Token::Characters(text) = token {
                    self.append_text(text);
                }
                ProcessResult::Done
            },
            Token::Comment(text) => {
                self.append_comment(text);
                ProcessResult::Done
            },
            Token::Doctype(_) => ProcessResult::Done,
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "html" => {
                self.step_in_body_start_html(token)
            },
            Token::Tag(Tag { kind: TagKind::EndTag, ref name, .. }) if name.as_str() == "html" => {
                self.mode.set(InsertionMode::AfterAfterFrameset);
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "noframes" => self.step_in_head(token),
            Token::Eof => ProcessResult::Done,
            _ => {
                self.report_error("unexpected token after </frameset>".into());
                ProcessResult::Done
            },
        }
    }

    fn step_after_after_body(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::Comment(text) => {
                self.append_comment_to_doc(text);
                ProcessResult::Done
            },
            Token::Doctype(_) => self.step_in_body(token),
            Token::Characters(ref text) if is_whitespace(text) => self.step_in_body(token),
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "html" => {
                self.step_in_body_start_html(token)
            },
            Token::Eof => ProcessResult::Done,
            other => {
                self.report_error("unexpected token after </html>".into());
                self.mode.set(InsertionMode::InBody);
                ProcessResult::Reprocess(InsertionMode::InBody, other)
            },
        }
    }

    fn step_after_after_frameset(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::Comment(text) => {
                self.append_comment_to_doc(text);
                ProcessResult::Done
            },
            Token::Doctype(_) => self.step_in_body(token),
            Token::Characters(ref text) if is_whitespace(text) => self.step_in_body(token),
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "html" => {
                self.step_in_body_start_html(token)
            },
            Token::Tag(Tag { kind: TagKind::StartTag, ref name, .. }) if name.as_str() == "noframes" => self.step_in_head(token),
            Token::Eof => ProcessResult::Done,
            _ => {
                self.report_error("unexpected token after </frameset>".into());
                ProcessResult::Done
            },
        }
    }

    // ---- generic (R)CDATA / script-data side mode ----------------------------

    fn step_generic_raw_text(&self, token: Token) -> ProcessResult<Handle> {
        match token {
            Token::NullCharacter => {
                self.append_text("\u{FFFD}".into());
                ProcessResult::Done
            },
            Token::Characters(text) => {
                self.append_text(text);
                ProcessResult::Done
            },
            Token::Tag(Tag { kind: TagKind::EndTag, .. }) => {
                self.pop();
                self.mode.set(self.orig_mode.get().expect("orig_mode set on entry to raw text mode"));
                ProcessResult::Done
            },
            Token::Eof => {
                self.report_error("unexpected end of file in raw text element".into());
                self.pop();
                self.mode.set(self.orig_mode.get().expect("orig_mode set on entry to raw text mode"));
                ProcessResult::Reprocess(self.mode.get(), token)
            },
            _ => ProcessResult::Done,
        }
    }
}

fn is_heading(ty: ElementType) -> bool {
    matches!(
        ty,
        ElementType::H1 | ElementType::H2 | ElementType::H3 | ElementType::H4 | ElementType::H5 | ElementType::H6
    )
}

fn is_void_head_tag(name: &str) -> bool {
    matches!(name, "base" | "basefont" | "bgsound" | "link" | "meta")
}
