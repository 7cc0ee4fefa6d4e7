// Copyright The html5ever Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Types used internally by the insertion-mode dispatcher. Not exported.

use crate::tokenizer::{ContentModel, Doctype, Tag};
use markup5ever::StrTendril;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum InsertionMode {
    Initial,
    BeforeHtml,
    BeforeHead,
    InHead,
    InHeadNoscript,
    AfterHead,
    InBody,
    InTable,
    InCaption,
    InColumnGroup,
    InTableBody,
    InRow,
    InCell,
    InSelect,
    InSelectInTable,
    InForeignContent,
    AfterBody,
    InFrameset,
    AfterFrameset,
    AfterAfterBody,
    AfterAfterFrameset,
    /// The generic (R)CDATA collection side-mode: `<title>`, `<textarea>`,
    /// `<style>`, `<noscript>` (when scripting is enabled) and friends.
    GenericRawText,
    /// As `GenericRawText`, but for `<script>`, which has its own nesting
    /// semantics the real tokeniser enforces; the tree builder only needs
    /// to know which saved mode to restore.
    ScriptDataText,
}

/// A subset of `tokenizer::Token`: everything the dispatcher needs to see
/// after DOCTYPE/EOF have been peeled off by the outer loop.
#[derive(Clone, Debug)]
pub(crate) enum Token {
    Doctype(Doctype),
    Tag(Tag),
    Comment(StrTendril),
    Characters(StrTendril),
    NullCharacter,
    Eof,
}

/// What a mode handler wants the dispatcher to do next.
pub(crate) enum ProcessResult<Handle> {
    /// Token fully handled, move on to the next one.
    Done,
    /// As `Done`, but also acknowledge the token's self-closing flag (so
    /// the outer loop doesn't report an "unacknowledged self-closing tag"
    /// parse error for it).
    DoneAckSelfClosing,
    /// Re-dispatch `token` under the (possibly updated) current mode.
    Reprocess(InsertionMode, Token),
    /// A `<script>` element was inserted; bubble up to the tokeniser
    /// driver so it can run or skip the script before resuming.
    Script(Handle),
    /// Ask the tokeniser to switch content model before the next token.
    SwitchContentModel(ContentModel),
}
