// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-field text encoding for rendered feeds.
//!
//! Feed readers render some fields as HTML, so those are written inside a
//! CDATA literal block and keep their markup. Fields that are plain text by
//! definition (`itunes:summary`, category labels, links, numbers) are entity
//! escaped so any markup shows up as text.

use std::borrow::Cow;

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// How a field's text content is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Treatment {
    /// Inserted verbatim inside `<![CDATA[...]]>`
    LiteralBlock,
    /// `&`, `<` and `>` replaced by entities
    Escaped,
}

/// Every text-bearing element the serializer emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ChannelTitle,
    ChannelDescription,
    ChannelLink,
    Language,
    Copyright,
    LastBuildDate,
    Category,
    ItunesAuthor,
    ItunesSummary,
    ItunesType,
    OwnerName,
    OwnerEmail,
    ItunesExplicit,
    EpisodeTitle,
    EpisodeDescription,
    EpisodeLink,
    Guid,
    Creator,
    PubDate,
    Duration,
    EpisodeType,
    Season,
    EpisodeNumber,
}

impl Field {
    /// Policy table: which fields keep their markup
    pub fn treatment(self) -> Treatment {
        match self {
            Field::ChannelTitle
            | Field::EpisodeTitle
            | Field::ChannelDescription
            | Field::EpisodeDescription
            | Field::Creator
            | Field::ItunesAuthor
            | Field::Copyright => Treatment::LiteralBlock,
            _ => Treatment::Escaped,
        }
    }
}

/// Encode `raw` as the text content of `field`.
///
/// The result is ready to be written between the field's tags without any
/// further escaping. For literal-block fields, text that is already a run of
/// CDATA sections is returned unchanged, so wrapping twice is a no-op.
/// Characters XML 1.0 does not allow are dropped first.
pub fn wrap(field: Field, raw: &str) -> String {
    let clean = strip_invalid_chars(raw);
    match field.treatment() {
        Treatment::LiteralBlock => literal_block(&clean),
        Treatment::Escaped => escape(&clean),
    }
}

/// True for characters matching the XML 1.0 `Char` production
pub fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\u{9}'
            | '\u{A}'
            | '\u{D}'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Remove characters no XML 1.0 document may contain, such as most C0
/// control codes. Borrows when there is nothing to remove.
pub fn strip_invalid_chars(raw: &str) -> Cow<'_, str> {
    if raw.chars().all(is_xml_char) {
        return Cow::Borrowed(raw);
    }

    tracing::debug!("Dropping characters not allowed in XML");
    Cow::Owned(raw.chars().filter(|&c| is_xml_char(c)).collect())
}

/// Wrap text in a CDATA section.
///
/// Any `]]>` in the text would end the section early; it is split across two
/// adjacent sections (`]]` + `>`) which readers concatenate back together.
pub fn literal_block(raw: &str) -> String {
    if is_literal_block(raw) {
        return raw.to_string();
    }

    let body = raw.replace(CDATA_CLOSE, "]]]]><![CDATA[>");
    format!("{CDATA_OPEN}{body}{CDATA_CLOSE}")
}

/// Entity-escape `&`, `<` and `>`
pub fn escape(raw: &str) -> String {
    html_escape::encode_text(raw).into_owned()
}

/// True when `text` is one or more back-to-back CDATA sections and nothing else
pub fn is_literal_block(text: &str) -> bool {
    let mut rest = text;
    if rest.is_empty() {
        return false;
    }

    while !rest.is_empty() {
        let Some(section) = rest.strip_prefix(CDATA_OPEN) else {
            return false;
        };
        let Some(end) = section.find(CDATA_CLOSE) else {
            return false;
        };
        rest = &section[end + CDATA_CLOSE.len()..];
    }

    true
}

/// Recover the text carried by a run of CDATA sections
pub fn unwrap_literal_block(text: &str) -> Option<String> {
    if !is_literal_block(text) {
        return None;
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(section) = rest.strip_prefix(CDATA_OPEN) {
        let end = section.find(CDATA_CLOSE)?;
        out.push_str(&section[..end]);
        rest = &section[end + CDATA_CLOSE.len()..];
    }
    Some(out)
}
