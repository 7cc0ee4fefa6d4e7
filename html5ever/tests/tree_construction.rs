// Copyright The html5ever Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! End-to-end tree construction scenarios, driving the builder with
//! hand-built token sequences (there is no tokeniser in this crate) and
//! asserting on the resulting tree shape rather than a serialised string.

mod support;

use html5ever::tokenizer::{Doctype, Tag, TagKind, Token, TokenSink};
use html5ever::tree_builder::{TreeBuilder, TreeBuilderOpts};
use markup5ever::{LocalName, StrTendril};

use support::TestSink;

fn start(name: &str) -> Token {
    Token::Tag(Tag {
        kind: TagKind::StartTag,
        name: LocalName::new(name),
        attrs: Vec::new(),
        self_closing: false,
    })
}

fn end(name: &str) -> Token {
    Token::Tag(Tag {
        kind: TagKind::EndTag,
        name: LocalName::new(name),
        attrs: Vec::new(),
        self_closing: false,
    })
}

fn text(s: &str) -> Token {
    Token::Character(StrTendril::from(s))
}

/// Build a builder wired to a fresh `TestSink`, with the document node
/// already set, ready to receive tokens. The document handle is always 0:
/// it is the first node `TestSink` ever allocates.
fn new_builder() -> (TreeBuilder<usize, TestSink>, TestSink) {
    let sink = TestSink::new();
    let document = sink.new_document();
    let builder = TreeBuilder::new(sink.clone(), TreeBuilderOpts::default());
    builder.set_document_node(document).expect("document node not yet set");
    (builder, sink)
}

const DOCUMENT: usize = 0;

fn feed(builder: &TreeBuilder<usize, TestSink>, tokens: Vec<Token>) {
    for token in tokens {
        builder.process_token(token);
    }
}

#[test]
fn simple_paragraph() {
    let (builder, sink) = new_builder();
    feed(&builder, vec![start("html"), start("head"), end("head"), start("body"), start("p"), text("X"), Token::Eof]);
    builder.finish();

    let html = sink.children_of(DOCUMENT);
    // document -> html -> (head, body)
    let html = *html.first().expect("html element inserted");
    let body = sink
        .children_of(html)
        .into_iter()
        .find(|&c| sink.element_name(c).map(|n| n.local.as_str() == "body").unwrap_or(false))
        .expect("body element inserted");
    let p = *sink.children_of(body).first().expect("p element inserted");
    assert_eq!(sink.element_name(p).unwrap().local.as_str(), "p");
    let text_node = *sink.children_of(p).first().expect("text child of p");
    assert_eq!(sink.text_content(text_node).unwrap(), "X");
    assert!(sink.all_refs_released());
}

#[test]
fn adoption_agency_runs_on_misnested_formatting() {
    let (builder, sink) = new_builder();
    feed(
        &builder,
        vec![
            start("html"),
            start("body"),
            start("b"),
            text("1"),
            start("p"),
            text("2"),
            end("b"),
            text("3"),
            Token::Eof,
        ],
    );
    builder.finish();

    let document = DOCUMENT;
    let html = *sink.children_of(document).first().unwrap();
    let body = sink
        .children_of(html)
        .into_iter()
        .find(|&c| sink.element_name(c).map(|n| n.local.as_str() == "body").unwrap_or(false))
        .unwrap();

    // The adoption agency algorithm splits <b> around <p>: body ends up with
    // a <b> containing "1", then a <p> containing a cloned <b> with "2" and
    // "3" both under it, the <b> never spanning the <p> boundary.
    let body_children = sink.children_of(body);
    let first_b = body_children
        .iter()
        .copied()
        .find(|&c| sink.element_name(c).map(|n| n.local.as_str() == "b").unwrap_or(false))
        .expect("leading <b> survives outside <p>");
    assert_eq!(sink.text_content(*sink.children_of(first_b).first().unwrap()).unwrap(), "1");

    let p = body_children
        .iter()
        .copied()
        .find(|&c| sink.element_name(c).map(|n| n.local.as_str() == "p").unwrap_or(false))
        .expect("<p> inserted as a sibling, not a child, of <b>");
    let p_children = sink.children_of(p);
    let cloned_b = p_children
        .iter()
        .copied()
        .find(|&c| sink.element_name(c).map(|n| n.local.as_str() == "b").unwrap_or(false))
        .expect("adoption agency clones <b> inside <p>");
    assert_eq!(sink.text_content(*sink.children_of(cloned_b).first().unwrap()).unwrap(), "2");
    assert!(sink.all_refs_released());
}

#[test]
fn table_row_and_cell() {
    let (builder, sink) = new_builder();
    feed(
        &builder,
        vec![
            start("html"),
            start("body"),
            start("table"),
            start("tr"),
            start("td"),
            text("X"),
            end("td"),
            end("tr"),
            end("table"),
            Token::Eof,
        ],
    );
    builder.finish();

    let document = DOCUMENT;
    let html = *sink.children_of(document).first().unwrap();
    let body = sink
        .children_of(html)
        .into_iter()
        .find(|&c| sink.element_name(c).map(|n| n.local.as_str() == "body").unwrap_or(false))
        .unwrap();
    let table = *sink.children_of(body).first().unwrap();
    assert_eq!(sink.element_name(table).unwrap().local.as_str(), "table");

    // The tbody insertion is implied: <tr> never appears as a direct child
    // of <table>.
    let tbody = *sink.children_of(table).first().unwrap();
    assert_eq!(sink.element_name(tbody).unwrap().local.as_str(), "tbody");
    let tr = *sink.children_of(tbody).first().unwrap();
    assert_eq!(sink.element_name(tr).unwrap().local.as_str(), "tr");
    let td = *sink.children_of(tr).first().unwrap();
    assert_eq!(sink.element_name(td).unwrap().local.as_str(), "td");
    let text_node = *sink.children_of(td).first().unwrap();
    assert_eq!(sink.text_content(text_node).unwrap(), "X");
    assert!(sink.all_refs_released());
}

#[test]
fn foster_parenting_moves_stray_table_text() {
    let (builder, sink) = new_builder();
    feed(
        &builder,
        vec![start("html"), start("body"), text("A"), start("table"), text("B"), end("table"), Token::Eof],
    );
    builder.finish();

    let document = DOCUMENT;
    let html = *sink.children_of(document).first().unwrap();
    let body = sink
        .children_of(html)
        .into_iter()
        .find(|&c| sink.element_name(c).map(|n| n.local.as_str() == "body").unwrap_or(false))
        .unwrap();
    let body_children = sink.children_of(body);

    let table = *body_children
        .iter()
        .find(|&&c| sink.element_name(c).map(|n| n.local.as_str() == "table").unwrap_or(false))
        .unwrap();
    // "A" stays as a text child of body, before <table>; "B" is foster
    // parented to just before <table> rather than becoming its child.
    let table_index = body_children.iter().position(|&c| c == table).unwrap();
    assert!(table_index >= 1, "at least one node precedes <table> in body");
    assert!(
        sink.children_of(table).is_empty() || sink.text_content(*sink.children_of(table).first().unwrap()).is_none(),
        "foster-parented text must not land inside <table>"
    );
    let combined: String = body_children
        .iter()
        .filter_map(|&c| sink.text_content(c))
        .collect();
    assert_eq!(combined, "AB");
    assert!(sink.all_refs_released());
}

#[test]
fn pre_strips_leading_newline() {
    let (builder, sink) = new_builder();
    feed(
        &builder,
        vec![
            Token::Doctype(Doctype { name: Some(StrTendril::from("html")), ..Default::default() }),
            start("html"),
            start("body"),
            start("pre"),
            text("\nHi"),
            end("pre"),
            Token::Eof,
        ],
    );
    builder.finish();

    let document = DOCUMENT;
    let html = *sink.children_of(document).first().unwrap();
    let body = sink
        .children_of(html)
        .into_iter()
        .find(|&c| sink.element_name(c).map(|n| n.local.as_str() == "body").unwrap_or(false))
        .unwrap();
    let pre = *sink
        .children_of(body)
        .into_iter()
        .find(|&c| sink.element_name(c).map(|n| n.local.as_str() == "pre").unwrap_or(false))
        .unwrap();
    let text_node = *sink.children_of(pre).first().unwrap();
    assert_eq!(sink.text_content(text_node).unwrap(), "Hi");
    assert_eq!(sink.quirks_mode(), markup5ever::QuirksMode::NoQuirks);
    assert!(sink.all_refs_released());
}

#[test]
fn select_option_implicitly_closes_prior_option() {
    let (builder, sink) = new_builder();
    feed(
        &builder,
        vec![
            start("html"),
            start("body"),
            start("select"),
            start("option"),
            text("a"),
            start("option"),
            text("b"),
            end("select"),
            Token::Eof,
        ],
    );
    builder.finish();

    let document = DOCUMENT;
    let html = *sink.children_of(document).first().unwrap();
    let body = sink
        .children_of(html)
        .into_iter()
        .find(|&c| sink.element_name(c).map(|n| n.local.as_str() == "body").unwrap_or(false))
        .unwrap();
    let select = *sink
        .children_of(body)
        .into_iter()
        .find(|&c| sink.element_name(c).map(|n| n.local.as_str() == "select").unwrap_or(false))
        .unwrap();
    let options = sink.children_of(select);
    assert_eq!(options.len(), 2, "the first <option> is closed implicitly, not nested");
    assert_eq!(sink.element_name(options[0]).unwrap().local.as_str(), "option");
    assert_eq!(sink.element_name(options[1]).unwrap().local.as_str(), "option");
    assert_eq!(sink.text_content(*sink.children_of(options[0]).first().unwrap()).unwrap(), "a");
    assert_eq!(sink.text_content(*sink.children_of(options[1]).first().unwrap()).unwrap(), "b");
    assert!(sink.all_refs_released());
}
