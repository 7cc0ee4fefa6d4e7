// Copyright The html5ever Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Maps element names to a type code and answers the four classification
//! predicates the tree builder consults constantly: is this element
//! special, a scope boundary, a formatting element, or ordinary phrasing
//! content?
//!
//! The enum is deliberately laid out so each predicate is a single range
//! check on the discriminant rather than a table lookup: the special
//! elements come first and end at `Wbr`, the scope-stopping elements run
//! from `Applet` to `Th`, the formatting elements run from `A` to `U`, and
//! everything declared after `U` is plain phrasing content. `Unknown` sits
//! at discriminant zero so that a default-initialised stack slot never
//! aliases a real element (and so `Html` is never zero, which the open
//! element stack relies on to tell "unused slot" from "HTML root pushed").

#[repr(u16)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ElementType {
    /// Not one of the names this classifier knows about.
    Unknown = 0,

    // --- special (is_special): structural / block elements with
    // distinguished treatment in IN_BODY and in implied-end-tag closure ---
    Address,
    Area,
    Article,
    Aside,
    Base,
    Basefont,
    Bgsound,
    Blockquote,
    Body,
    Br,
    Button,
    Center,
    Col,
    Colgroup,
    Dd,
    Details,
    Dir,
    Div,
    Dl,
    Dt,
    Embed,
    Fieldset,
    Figcaption,
    Figure,
    Footer,
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
    Header,
    Hgroup,
    Hr,
    Iframe,
    Img,
    Input,
    Keygen,
    Li,
    Link,
    Listing,
    Main,
    Menu,
    Meta,
    Nav,
    Noembed,
    Noframes,
    Noscript,
    Ol,
    Option,
    Optgroup,
    P,
    Param,
    Plaintext,
    Pre,
    Rp,
    Rt,
    Script,
    Section,
    Select,
    Source,
    Style,
    Summary,
    Tbody,
    Textarea,
    Tfoot,
    Thead,
    Title,
    Tr,
    Track,
    Ul,
    Wbr,

    // --- scoping (is_scoping): stop an upward "in scope" search ---
    Applet,
    Caption,
    Html,
    Marquee,
    Object,
    Table,
    Td,
    Template,
    Th,

    // --- formatting (is_formatting): reconstructed / adopted by the
    // active formatting element algorithms ---
    A,
    B,
    Big,
    Code,
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

    // --- phrasing (is_phrasing): ordinary inline/flow content, no
    // distinguished tree-construction behaviour beyond default insertion ---
    Abbr,
    Audio,
    Bdi,
    Bdo,
    Canvas,
    Cite,
    Data,
    Datalist,
    Del,
    Dfn,
    Ins,
    Kbd,
    Label,
    Mark,
    Meter,
    Output,
    Picture,
    Progress,
    Q,
    Ruby,
    Samp,
    Span,
    Sub,
    Sup,
    Time,
    Var,
    Video,
}

impl ElementType {
    #[inline]
    fn code(self) -> u16 {
        self as u16
    }

    /// Distinguished start/end-tag treatment in `IN_BODY` and friends.
    #[inline]
    pub fn is_special(self) -> bool {
        self != ElementType::Unknown && self.code() <= ElementType::Wbr.code()
    }

    /// Stops an upward "has an element in [table] scope" search.
    #[inline]
    pub fn is_scoping(self) -> bool {
        self.code() >= ElementType::Applet.code() && self.code() <= ElementType::Th.code()
    }

    /// Reconstructed and adopted by the active formatting element algorithms.
    #[inline]
    pub fn is_formatting(self) -> bool {
        self.code() >= ElementType::A.code() && self.code() <= ElementType::U.code()
    }

    /// Ordinary inline/flow content with no distinguished behaviour.
    #[inline]
    pub fn is_phrasing(self) -> bool {
        self.code() > ElementType::U.code()
    }
}

/// Looks up the type code for an (already ASCII-lowercased) element name.
/// Names outside the static table map to `ElementType::Unknown`.
pub fn type_from_name(name: &str) -> ElementType {
    TYPES_BY_NAME.get(name).copied().unwrap_or(ElementType::Unknown)
}

static TYPES_BY_NAME: phf::Map<&'static str, ElementType> = phf::phf_map! {
    "address" => ElementType::Address,
    "area" => ElementType::Area,
    "article" => ElementType::Article,
    "aside" => ElementType::Aside,
    "base" => ElementType::Base,
    "basefont" => ElementType::Basefont,
    "bgsound" => ElementType::Bgsound,
    "blockquote" => ElementType::Blockquote,
    "body" => ElementType::Body,
    "br" => ElementType::Br,
    "button" => ElementType::Button,
    "center" => ElementType::Center,
    "col" => ElementType::Col,
    "colgroup" => ElementType::Colgroup,
    "dd" => ElementType::Dd,
    "details" => ElementType::Details,
    "dir" => ElementType::Dir,
    "div" => ElementType::Div,
    "dl" => ElementType::Dl,
    "dt" => ElementType::Dt,
    "embed" => ElementType::Embed,
    "fieldset" => ElementType::Fieldset,
    "figcaption" => ElementType::Figcaption,
    "figure" => ElementType::Figure,
    "footer" => ElementType::Footer,
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
    "header" => ElementType::Header,
    "hgroup" => ElementType::Hgroup,
    "hr" => ElementType::Hr,
    "iframe" => ElementType::Iframe,
    "img" => ElementType::Img,
    "input" => ElementType::Input,
    "keygen" => ElementType::Keygen,
    "li" => ElementType::Li,
    "link" => ElementType::Link,
    "listing" => ElementType::Listing,
    "main" => ElementType::Main,
    "menu" => ElementType::Menu,
    "meta" => ElementType::Meta,
    "nav" => ElementType::Nav,
    "noembed" => ElementType::Noembed,
    "noframes" => ElementType::Noframes,
    "noscript" => ElementType::Noscript,
    "ol" => ElementType::Ol,
    "option" => ElementType::Option,
    "optgroup" => ElementType::Optgroup,
    "p" => ElementType::P,
    "param" => ElementType::Param,
    "plaintext" => ElementType::Plaintext,
    "pre" => ElementType::Pre,
    "rp" => ElementType::Rp,
    "rt" => ElementType::Rt,
    "script" => ElementType::Script,
    "section" => ElementType::Section,
    "select" => ElementType::Select,
    "source" => ElementType::Source,
    "style" => ElementType::Style,
    "summary" => ElementType::Summary,
    "tbody" => ElementType::Tbody,
    "textarea" => ElementType::Textarea,
    "tfoot" => ElementType::Tfoot,
    "thead" => ElementType::Thead,
    "title" => ElementType::Title,
    "tr" => ElementType::Tr,
    "track" => ElementType::Track,
    "ul" => ElementType::Ul,
    "wbr" => ElementType::Wbr,

    "applet" => ElementType::Applet,
    "caption" => ElementType::Caption,
    "html" => ElementType::Html,
    "marquee" => ElementType::Marquee,
    "object" => ElementType::Object,
    "table" => ElementType::Table,
    "td" => ElementType::Td,
    "template" => ElementType::Template,
    "th" => ElementType::Th,

    "a" => ElementType::A,
    "b" => ElementType::B,
    "big" => ElementType::Big,
    "code" => ElementType::Code,
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

    "abbr" => ElementType::Abbr,
    "audio" => ElementType::Audio,
    "bdi" => ElementType::Bdi,
    "bdo" => ElementType::Bdo,
    "canvas" => ElementType::Canvas,
    "cite" => ElementType::Cite,
    "data" => ElementType::Data,
    "datalist" => ElementType::Datalist,
    "del" => ElementType::Del,
    "dfn" => ElementType::Dfn,
    "ins" => ElementType::Ins,
    "kbd" => ElementType::Kbd,
    "label" => ElementType::Label,
    "mark" => ElementType::Mark,
    "meter" => ElementType::Meter,
    "output" => ElementType::Output,
    "picture" => ElementType::Picture,
    "progress" => ElementType::Progress,
    "q" => ElementType::Q,
    "ruby" => ElementType::Ruby,
    "samp" => ElementType::Samp,
    "span" => ElementType::Span,
    "sub" => ElementType::Sub,
    "sup" => ElementType::Sup,
    "time" => ElementType::Time,
    "var" => ElementType::Var,
    "video" => ElementType::Video,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_is_zero_and_unclassified() {
        assert_eq!(ElementType::Unknown as u16, 0);
        assert!(!ElementType::Unknown.is_special());
        assert!(!ElementType::Unknown.is_scoping());
        assert!(!ElementType::Unknown.is_formatting());
        assert!(!ElementType::Unknown.is_phrasing());
    }

    #[test]
    fn html_never_aliases_the_sentinel() {
        assert_ne!(ElementType::Html as u16, 0);
    }

    #[test]
    fn predicates_partition_the_known_types() {
        for name in TYPES_BY_NAME.keys() {
            let ty = type_from_name(name);
            let flags = [
                ty.is_special(),
                ty.is_scoping(),
                ty.is_formatting(),
                ty.is_phrasing(),
            ];
            assert_eq!(
                flags.iter().filter(|b| **b).count(),
                1,
                "{name} ({ty:?}) should satisfy exactly one predicate"
            );
        }
    }

    #[test]
    fn lookup_is_case_sensitive_on_the_table_but_callers_lowercase_first() {
        assert_eq!(type_from_name("table"), ElementType::Table);
        assert_eq!(type_from_name("TABLE"), ElementType::Unknown);
    }

    #[test]
    fn unrecognised_name_is_unknown() {
        assert_eq!(type_from_name("x-custom-element"), ElementType::Unknown);
    }
}
