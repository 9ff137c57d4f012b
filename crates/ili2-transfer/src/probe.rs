// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Best-effort format detection

use memchr::memmem;
use std::io::{self, Read};

/// Number of leading bytes inspected when probing
///
/// A heuristic, not a format requirement: the namespace declaration of a
/// well-formed transfer normally sits within the first few hundred bytes.
pub const PROBE_WINDOW: usize = 1000;

/// Substring identifying the INTERLIS 2 namespace
pub const NAMESPACE_MARKER: &str = "interlis.ch/INTERLIS2";

/// Check whether a header window looks like an INTERLIS 2 transfer
///
/// The first non-whitespace byte must be `<` and the window must contain
/// [`NAMESPACE_MARKER`].
pub fn is_transfer_header(header: &[u8]) -> bool {
    let first = header.iter().find(|b| !b.is_ascii_whitespace());
    first == Some(&b'<') && memmem::find(header, NAMESPACE_MARKER.as_bytes()).is_some()
}

/// Read up to [`PROBE_WINDOW`] bytes from `source` and test them
pub fn probe(source: &mut dyn Read) -> io::Result<bool> {
    let mut header = Vec::with_capacity(PROBE_WINDOW);
    source
        .take(PROBE_WINDOW as u64)
        .read_to_end(&mut header)?;
    Ok(is_transfer_header(&header))
}
