// Copyright The html5ever Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The HTML5 tree builder: the insertion-mode state machine that turns a
//! token stream into calls against a [`TreeSink`].

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use log::{debug, log_enabled, Level};
use markup5ever::{Namespace, QuirksMode, StrTendril, TreeSink};

use crate::element::{type_from_name, ElementType};
use crate::error::BuilderError;
use crate::tokenizer::{self, ContentModel, ParseError, Tag, TagKind, TokenSink, TokenSinkResult};

mod formatting;
mod modes;
mod ops;
mod stack;
mod types;

use formatting::ActiveFormattingList;
use stack::OpenElementStack;
use types::{InsertionMode, ProcessResult, Token};

/// Options controlling tree-builder behaviour, set once at construction.
#[derive(Clone, Copy, Debug)]
pub struct TreeBuilderOpts {
    /// Affects how `<noscript>` is parsed: as a single text node (true) or
    /// as ordinary markup (false). Default: true.
    pub scripting_enabled: bool,

    /// Is this document being parsed from an `<iframe>`'s `srcdoc`
    /// attribute? Affects quirks-mode inference from DOCTYPE. Default:
    /// false.
    pub iframe_srcdoc: bool,

    /// Initial quirks mode, before any `<!DOCTYPE>` is seen. Default:
    /// `NoQuirks`.
    pub quirks_mode: QuirksMode,
}

impl Default for TreeBuilderOpts {
    fn default() -> Self {
        TreeBuilderOpts {
            scripting_enabled: true,
            iframe_srcdoc: false,
            quirks_mode: QuirksMode::NoQuirks,
        }
    }
}

/// The HTML5 tree-construction core.
///
/// Owns the two coupled auxiliary structures (stack of open elements,
/// active formatting list) and drives them through the insertion-mode
/// state machine described by the HTML5 "tree construction" algorithm,
/// issuing every mutation through `Sink`.
pub struct TreeBuilder<Handle, Sink> {
    opts: TreeBuilderOpts,
    sink: Sink,

    mode: Cell<InsertionMode>,
    orig_mode: Cell<Option<InsertionMode>>,

    /// Set once via [`TreeBuilder::set_document_node`]. Tokens arriving
    /// before that call are discarded.
    doc_handle: Cell<Option<Handle>>,

    open_elems: RefCell<OpenElementStack<Handle>>,
    active_formatting: RefCell<ActiveFormattingList<Handle>>,

    head_elem: Cell<Option<Handle>>,
    form_elem: Cell<Option<Handle>>,

    frameset_ok: Cell<bool>,
    ignore_lf: Cell<bool>,
    foster_parenting: Cell<bool>,
    quirks_mode: Cell<QuirksMode>,

    error_handler: RefCell<Option<Box<dyn FnMut(ParseError)>>>,
    /// Client-installed observer for the tokeniser's buffer-relocation
    /// callback. Since tokens carry self-contained `StrTendril`s rather
    /// than raw offsets into a buffer the tokeniser may move, this crate
    /// has no correctness dependency on it; it exists purely so a caller
    /// that also owns the raw input (for diagnostics, say) can still be
    /// notified.
    buffer_observer: RefCell<Option<Box<dyn FnMut(&StrTendril)>>>,
}

impl<Handle, Sink> TreeBuilder<Handle, Sink>
where
    Handle: Copy + Eq + std::fmt::Debug,
    Sink: TreeSink<Handle = Handle>,
{
    pub fn new(sink: Sink, opts: TreeBuilderOpts) -> Self {
        TreeBuilder {
            opts,
            sink,
            mode: Cell::new(InsertionMode::Initial),
            orig_mode: Cell::new(None),
            doc_handle: Cell::new(None),
            open_elems: RefCell::new(OpenElementStack::new()),
            active_formatting: RefCell::new(ActiveFormattingList::new()),
            head_elem: Cell::new(None),
            form_elem: Cell::new(None),
            frameset_ok: Cell::new(true),
            ignore_lf: Cell::new(false),
            foster_parenting: Cell::new(false),
            quirks_mode: Cell::new(opts.quirks_mode),
            error_handler: RefCell::new(None),
            buffer_observer: RefCell::new(None),
        }
    }

    /// `DOCUMENT_NODE` configuration option: supply the root handle tokens
    /// should be appended under. Until this is called, `process_token`
    /// discards every token it receives. Calling it twice is a contract
    /// error — the first document node would otherwise leak its reference.
    pub fn set_document_node(&self, document: Handle) -> Result<(), BuilderError> {
        if self.doc_handle.get().is_some() {
            return Err(BuilderError::BadParameter);
        }
        self.sink.ref_node(document);
        self.doc_handle.set(Some(document));
        Ok(())
    }

    /// `ERROR_HANDLER` configuration option.
    pub fn set_error_handler(&self, handler: impl FnMut(ParseError) + 'static) {
        *self.error_handler.borrow_mut() = Some(Box::new(handler));
    }

    /// `BUFFER_HANDLER` configuration option: a client observer notified
    /// whenever the tokeniser's buffer-handler callback fires. See the
    /// field doc comment for why this is not load-bearing here.
    pub fn set_buffer_observer(&self, observer: impl FnMut(&StrTendril) + 'static) {
        *self.buffer_observer.borrow_mut() = Some(Box::new(observer));
    }

    /// Forward the tokeniser's buffer-handler callback to any installed
    /// observer. Must be invoked by the driver before it hands this
    /// builder any token whose string references resolve against the new
    /// buffer.
    pub fn notify_buffer_relocated(&self, current: &StrTendril) {
        if let Some(observer) = self.buffer_observer.borrow_mut().as_mut() {
            observer(current);
        }
    }

    fn report_error(&self, error: ParseError) {
        if let Some(handler) = self.error_handler.borrow_mut().as_mut() {
            handler(error);
        } else if log_enabled!(Level::Debug) {
            debug!("parse error: {error}");
        }
    }

    fn debug_step(&self, mode: InsertionMode, token: &Token) {
        if log_enabled!(Level::Debug) {
            debug!("processing {token:?} in insertion mode {mode:?}");
        }
    }

    fn process_to_completion(&self, mut token: Token) -> TokenSinkResult<Handle> {
        let mut more_tokens: VecDeque<Token> = VecDeque::new();
        loop {
            let ack_self_closing = matches!(
                token,
                Token::Tag(Tag { kind: TagKind::StartTag, self_closing: true, .. })
            );
            let mode = self.mode.get();
            self.debug_step(mode, &token);
            match self.step(mode, token) {
                ProcessResult::Done => {
                    if ack_self_closing {
                        self.report_error("unacknowledged self-closing tag".into());
                    }
                    match more_tokens.pop_front() {
                        Some(next) => token = next,
                        None => return TokenSinkResult::Continue,
                    }
                },
                ProcessResult::DoneAckSelfClosing => match more_tokens.pop_front() {
                    Some(next) => token = next,
                    None => return TokenSinkResult::Continue,
                },
                ProcessResult::Reprocess(new_mode, new_token) => {
                    self.mode.set(new_mode);
                    token = new_token;
                },
                ProcessResult::Script(handle) => {
                    debug_assert!(more_tokens.is_empty());
                    return TokenSinkResult::Script(handle);
                },
                ProcessResult::SwitchContentModel(model) => {
                    debug_assert!(more_tokens.is_empty());
                    return TokenSinkResult::SwitchTo(model);
                },
            }
        }
    }

    /// Split a leading run of ASCII whitespace off `text`, inserting it (if
    /// requested) under the current node, and return whatever's left to be
    /// reprocessed — `None` if the whole run was whitespace.
    ///
    /// This is `process_characters_expect_whitespace` from the design: the
    /// common shape used by every mode that only tolerates whitespace
    /// between elements (INITIAL, BEFORE_HTML, the table modes, ...).
    fn split_leading_whitespace(&self, text: &StrTendril, insert: bool) -> Option<StrTendril> {
        let bytes = text.as_bytes();
        let end = bytes
            .iter()
            .position(|&b| !matches!(b, 0x09 | 0x0A | 0x0C | 0x20))
            .unwrap_or(bytes.len());
        if end > 0 && insert {
            self.append_text(text.subtendril(0, end as u32));
        }
        if end == bytes.len() {
            None
        } else {
            Some(text.subtendril(end as u32, bytes.len() as u32 - end as u32))
        }
    }
}

impl<Handle, Sink> TokenSink for TreeBuilder<Handle, Sink>
where
    Handle: Copy + Eq + std::fmt::Debug,
    Sink: TreeSink<Handle = Handle>,
{
    type Handle = Handle;

    fn process_token(&self, token: tokenizer::Token) -> TokenSinkResult<Handle> {
        if self.doc_handle.get().is_none() {
            return TokenSinkResult::Continue;
        }

        let ignore_lf = self.ignore_lf.replace(false);

        let token = match token {
            tokenizer::Token::Doctype(d) => Token::Doctype(d),
            tokenizer::Token::Tag(t) => Token::Tag(t),
            tokenizer::Token::Comment(c) => Token::Comment(c),
            tokenizer::Token::NullCharacter => Token::NullCharacter,
            tokenizer::Token::Eof => Token::Eof,
            tokenizer::Token::Character(text) => {
                let text = if ignore_lf && text.as_bytes().first() == Some(&b'\n') {
                    text.subtendril(1, text.as_bytes().len() as u32 - 1)
                } else {
                    text
                };
                if text.is_empty() {
                    return TokenSinkResult::Continue;
                }
                Token::Characters(text)
            },
        };

        self.process_to_completion(token)
    }
}

