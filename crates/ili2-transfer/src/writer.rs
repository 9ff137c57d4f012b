// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Write session: transfer framing around the feature stream
//!
//! The session owns the output stream. Framing is emitted in a fixed order:
//!
//! ```text
//! <?xml ...?>
//! <TRANSFER xmlns="http://www.interlis.ch/INTERLIS2.3">
//! <HEADERSECTION SENDER="..." VERSION="2.3">
//! <MODELS> <MODEL .../>* </MODELS>
//! </HEADERSECTION>
//! <DATASECTION>
//! <basket BID="basket">
//!   ...features...
//! </basket>
//! </DATASECTION>
//! </TRANSFER>
//! ```

use crate::vfs::OutputStream;
use ili2_model::ModelCatalog;
use std::borrow::Cow;
use std::io::{self, Write};

/// Namespace written on the envelope element
pub const INTERLIS_NAMESPACE: &str = "http://www.interlis.ch/INTERLIS2.3";

/// Transfer format version written in the header section
pub const TRANSFER_VERSION: &str = "2.3";

/// Progress of the framing
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FramingState {
    /// Nothing written yet
    Pending,
    /// Header written, basket element open
    Open { basket: String },
    /// Footer written and stream released
    Closed,
}

/// Output stream plus framing state
pub struct TransferWriter {
    out: Option<Box<dyn OutputStream>>,
    state: FramingState,
}

impl TransferWriter {
    pub fn new(out: Box<dyn OutputStream>) -> Self {
        Self {
            out: Some(out),
            state: FramingState::Pending,
        }
    }

    pub fn state(&self) -> &FramingState {
        &self.state
    }

    /// Whether features may be written
    pub fn is_open(&self) -> bool {
        matches!(self.state, FramingState::Open { .. })
    }

    /// Emit prolog, header, model list and open the data section and basket
    pub fn begin(&mut self, catalog: &ModelCatalog, sender: &str) -> io::Result<()> {
        if self.state != FramingState::Pending {
            return Err(io::Error::other("transfer framing already written"));
        }
        let out = self.out.as_mut().ok_or_else(released)?;

        writeln!(out, "<?xml version=\"1.0\" encoding=\"utf-8\" ?>")?;
        writeln!(out, "<TRANSFER xmlns=\"{INTERLIS_NAMESPACE}\">")?;
        writeln!(
            out,
            "<HEADERSECTION SENDER=\"{}\" VERSION=\"{TRANSFER_VERSION}\">",
            escape(sender)
        )?;
        writeln!(out, "<MODELS>")?;
        for model in catalog.models() {
            writeln!(
                out,
                "<MODEL NAME=\"{}\" URI=\"{}\" VERSION=\"{}\"/>",
                escape(&model.name),
                escape(&model.uri),
                escape(&model.version)
            )?;
        }
        writeln!(out, "</MODELS>")?;
        writeln!(out, "</HEADERSECTION>")?;
        writeln!(out, "<DATASECTION>")?;

        let basket = catalog.main_basket_name();
        writeln!(out, "<{basket} BID=\"{}\">", escape(basket))?;

        self.state = FramingState::Open {
            basket: basket.to_string(),
        };
        Ok(())
    }

    /// Stream positioned inside the open basket
    pub fn stream(&mut self) -> Option<&mut dyn Write> {
        if !self.is_open() {
            return None;
        }
        self.out.as_mut().map(|out| out as &mut dyn Write)
    }

    /// Close basket, data section and envelope, then release the stream
    ///
    /// Runs at most once. The footer is written only if [`begin`](Self::begin)
    /// completed; the stream is released in every case.
    pub fn finish(&mut self) -> io::Result<()> {
        let state = std::mem::replace(&mut self.state, FramingState::Closed);
        let Some(mut out) = self.out.take() else {
            return Ok(());
        };

        if let FramingState::Open { basket } = state {
            let footer = write_footer(&mut out, &basket);
            let finished = out.finish();
            footer?;
            finished
        } else {
            out.finish()
        }
    }
}

fn write_footer(out: &mut Box<dyn OutputStream>, basket: &str) -> io::Result<()> {
    writeln!(out, "</{basket}>")?;
    writeln!(out, "</DATASECTION>")?;
    writeln!(out, "</TRANSFER>")
}

fn released() -> io::Error {
    io::Error::other("output stream already released")
}

/// Whether `name` can be written as an element name
pub fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Escape XML special characters in text and attribute values
pub fn escape(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}
