// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! XML tokenizer using nom combinators
//!
//! Produces a flat stream of start/end/text events with byte spans. This is
//! just enough XML for transfer bodies: no DTDs, no namespace resolution.

use memchr::{memchr, memmem};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0, multispace1},
    multi::many0,
    sequence::{delimited, preceded, separated_pair},
    IResult, Parser,
};
use std::borrow::Cow;

/// One XML event
#[derive(Clone, Debug, PartialEq)]
pub enum XmlEvent<'a> {
    /// `<name attr="v">` or `<name/>` when `empty`
    Start {
        name: &'a str,
        attributes: Vec<(&'a str, &'a str)>,
        empty: bool,
        span: (usize, usize),
    },
    /// `</name>`
    End { name: &'a str, span: (usize, usize) },
    /// Character data, raw (entities not yet decoded unless `cdata`)
    Text {
        text: &'a str,
        cdata: bool,
        span: (usize, usize),
    },
}

impl<'a> XmlEvent<'a> {
    /// Byte span of the event in the source
    pub fn span(&self) -> (usize, usize) {
        match self {
            XmlEvent::Start { span, .. } | XmlEvent::End { span, .. } | XmlEvent::Text { span, .. } => {
                *span
            }
        }
    }
}

// ============================================================================
// Parsing Primitives
// ============================================================================

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

/// Parse an element or attribute name
fn name(input: &str) -> IResult<&str, &str> {
    take_while1(is_name_char)(input)
}

/// Parse a quoted attribute value (either quote style)
fn quoted(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
    ))
    .parse(input)
}

/// Parse ` name="value"`
fn attribute(input: &str) -> IResult<&str, (&str, &str)> {
    preceded(
        multispace1,
        separated_pair(name, (multispace0, char('='), multispace0), quoted),
    )
    .parse(input)
}

/// Parse a start tag: `<name attr="v" ...>` or `<name .../>`
fn start_tag(input: &str) -> IResult<&str, (&str, Vec<(&str, &str)>, bool)> {
    let (input, _) = char('<')(input)?;
    let (input, tag_name) = name(input)?;
    let (input, attributes) = many0(attribute).parse(input)?;
    let (input, _) = multispace0(input)?;
    let (input, close) = alt((tag("/>"), tag(">"))).parse(input)?;
    Ok((input, (tag_name, attributes, close == "/>")))
}

/// Parse an end tag: `</name>`
fn end_tag(input: &str) -> IResult<&str, &str> {
    delimited(tag("</"), name, (multispace0, char('>'))).parse(input)
}

// ============================================================================
// Event Stream
// ============================================================================

/// Pull tokenizer over XML content
pub struct XmlEvents<'a> {
    content: &'a str,
    pos: usize,
}

impl<'a> XmlEvents<'a> {
    pub fn new(content: &'a str) -> Self {
        Self { content, pos: 0 }
    }

    /// Start tokenizing at byte offset `pos`
    pub fn at(content: &'a str, pos: usize) -> Self {
        Self { content, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Skip past `terminator`, or to the end of input
    fn skip_past(&mut self, terminator: &str) {
        let rest = &self.content.as_bytes()[self.pos..];
        self.pos = match memmem::find(rest, terminator.as_bytes()) {
            Some(offset) => self.pos + offset + terminator.len(),
            None => self.content.len(),
        };
    }

    fn fail(&mut self, message: String) -> Option<Result<XmlEvent<'a>, String>> {
        self.pos = self.content.len();
        Some(Err(message))
    }
}

impl<'a> Iterator for XmlEvents<'a> {
    type Item = Result<XmlEvent<'a>, String>;

    fn next(&mut self) -> Option<Self::Item> {
        let content = self.content;
        loop {
            let bytes = content.as_bytes();
            if self.pos >= bytes.len() {
                return None;
            }
            let start = self.pos;
            let rest = &content[start..];

            if bytes[start] != b'<' {
                let end = memchr(b'<', &bytes[start..])
                    .map(|offset| start + offset)
                    .unwrap_or(bytes.len());
                self.pos = end;
                return Some(Ok(XmlEvent::Text {
                    text: &content[start..end],
                    cdata: false,
                    span: (start, end),
                }));
            }

            if rest.starts_with("<!--") {
                self.skip_past("-->");
                continue;
            }
            if rest.starts_with("<?") {
                self.skip_past("?>");
                continue;
            }
            if let Some(body) = rest.strip_prefix("<![CDATA[") {
                let Some(len) = memmem::find(body.as_bytes(), b"]]>") else {
                    return self.fail(format!("unterminated CDATA section at byte {start}"));
                };
                let text_start = start + "<![CDATA[".len();
                self.pos = text_start + len + 3;
                return Some(Ok(XmlEvent::Text {
                    text: &content[text_start..text_start + len],
                    cdata: true,
                    span: (start, self.pos),
                }));
            }
            if rest.starts_with("<!") {
                self.skip_past(">");
                continue;
            }

            if rest.starts_with("</") {
                return match end_tag(rest) {
                    Ok((remaining, tag_name)) => {
                        self.pos = content.len() - remaining.len();
                        Some(Ok(XmlEvent::End {
                            name: tag_name,
                            span: (start, self.pos),
                        }))
                    }
                    Err(_) => self.fail(format!("malformed end tag at byte {start}")),
                };
            }

            return match start_tag(rest) {
                Ok((remaining, (tag_name, attributes, empty))) => {
                    self.pos = content.len() - remaining.len();
                    Some(Ok(XmlEvent::Start {
                        name: tag_name,
                        attributes,
                        empty,
                        span: (start, self.pos),
                    }))
                }
                Err(_) => self.fail(format!("malformed start tag at byte {start}")),
            };
        }
    }
}

/// Find an attribute value by name and decode its entities
pub fn attribute_value<'a>(attributes: &[(&str, &'a str)], key: &str) -> Option<Cow<'a, str>> {
    attributes
        .iter()
        .find(|(name, _)| *name == key)
        .map(|&(_, value)| unescape(value))
}

/// Decode the predefined XML entities and character references
pub fn unescape(raw: &str) -> Cow<'_, str> {
    if memchr(b'&', raw.as_bytes()).is_none() {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after.find(';').and_then(|semi| {
            let entity = &after[..semi];
            let c = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, semi))
        });

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}
