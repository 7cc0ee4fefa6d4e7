// Copyright The html5ever Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The contract between this crate and an upstream HTML5 tokeniser.
//!
//! Tokenisation itself — character classification, entity decoding,
//! attribute parsing — is out of scope for this crate. What lives here is
//! only the shape of the tokens the tree builder consumes and the handful
//! of signals it sends back upstream (content-model switches).

use markup5ever::{Attribute, LocalName, StrTendril};
use std::borrow::Cow;

/// Whether a tag token opens or closes an element.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TagKind {
    StartTag,
    EndTag,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Tag {
    pub kind: TagKind,
    pub name: LocalName,
    pub attrs: Vec<Attribute>,
    pub self_closing: bool,
}

impl Tag {
    /// Two start tags are "equivalent" for the purposes of the Noah's Ark
    /// clause (active formatting elements) if they have the same name and
    /// the same attributes, independent of attribute order.
    pub fn equiv_modulo_attr_order(&self, other: &Tag) -> bool {
        if self.name != other.name || self.attrs.len() != other.attrs.len() {
            return false;
        }
        self.attrs
            .iter()
            .all(|a| other.attrs.iter().any(|b| a.name == b.name && a.value == b.value))
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Doctype {
    pub name: Option<StrTendril>,
    pub public_id: Option<StrTendril>,
    pub system_id: Option<StrTendril>,
    pub force_quirks: bool,
}

/// A token as delivered by the tokeniser's token callback.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Token {
    Doctype(Doctype),
    Tag(Tag),
    Comment(StrTendril),
    Character(StrTendril),
    /// A single U+0000 NULL character, kept distinct from `Character`
    /// because several insertion modes react to it specially.
    NullCharacter,
    Eof,
}

/// The content model the tokeniser should switch to. Requested by the tree
/// builder when entering the generic (R)CDATA or script-data side-modes;
/// takes effect only after the handler that requested it returns.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ContentModel {
    Pcdata,
    Rcdata,
    Cdata,
    Plaintext,
    ScriptData,
}

/// What a tokeniser driver should do after a `process_token` call returns.
#[derive(Debug)]
pub enum TokenSinkResult<Handle> {
    /// Keep delivering tokens in the current content model.
    Continue,
    /// Switch to the given content model before the next token.
    SwitchTo(ContentModel),
    /// A `<script>` element was just inserted; the caller may want to
    /// execute it before resuming (the core never runs scripts itself).
    Script(Handle),
}

/// Installed as the tokeniser's token callback. A tree builder is a
/// `TokenSink`; nothing else in this crate needs to be.
pub trait TokenSink {
    type Handle: Copy;

    fn process_token(&self, token: Token) -> TokenSinkResult<Self::Handle>;
}

/// A parse error, reported out-of-band and never fatal to parsing.
pub type ParseError = Cow<'static, str>;
