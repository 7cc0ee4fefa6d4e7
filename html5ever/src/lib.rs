// Copyright The html5ever Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The HTML5 tree-construction core: the insertion-mode state machine that
//! turns a stream of tokens into calls against a pluggable [`TreeSink`].
//!
//! Tokenisation and the concrete DOM implementation are out of scope —
//! see [`tokenizer`] for the contract this crate expects from an upstream
//! tokeniser, and [`markup5ever::TreeSink`] for the contract a downstream
//! document builder must satisfy.
//!
//! ```no_run
//! use html5ever::tree_builder::{TreeBuilder, TreeBuilderOpts};
//! use html5ever::tokenizer::TokenSink;
//!
//! # fn build<Sink: markup5ever::TreeSink<Handle = u32>>(sink: Sink, root: u32) {
//! let builder = TreeBuilder::new(sink, TreeBuilderOpts::default());
//! builder.set_document_node(root).expect("document node not yet set");
//! // feed tokens from an upstream tokeniser:
//! // builder.process_token(token);
//! # }
//! ```

pub mod element;
pub mod error;
pub mod tokenizer;
pub mod tree_builder;

pub use error::BuilderError;
pub use tree_builder::{TreeBuilder, TreeBuilderOpts};
