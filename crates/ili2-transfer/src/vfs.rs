// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! File system seam
//!
//! The container never touches files directly. All blocking open/read/write
//! calls go through a [`FileSystem`], which makes destination schemes and
//! test doubles pluggable.

use crate::address::{Destination, GZIP_PREFIX, ZIP_PREFIX};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};

/// Exclusively owned output stream
///
/// `finish` flushes and releases the stream, reporting any error the
/// underlying sink produces on completion (e.g. a gzip trailer write).
pub trait OutputStream: Write + Send {
    fn finish(self: Box<Self>) -> io::Result<()>;
}

impl<W: Write + Send> OutputStream for BufWriter<W> {
    fn finish(mut self: Box<Self>) -> io::Result<()> {
        self.flush()
    }
}

impl<W: Write + Send> OutputStream for GzEncoder<W> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let mut inner = (*self).finish()?;
        inner.flush()
    }
}

/// Blocking open primitives
pub trait FileSystem: Send + Sync {
    /// Open `path` for reading
    fn open_read(&self, path: &str) -> io::Result<Box<dyn Read + Send>>;

    /// Open a resolved destination for writing
    fn create(&self, destination: &Destination) -> io::Result<Box<dyn OutputStream>>;
}

/// Local file system with stdout and gzip support
///
/// Zip archive members are not supported and fail to open.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn open_read(&self, path: &str) -> io::Result<Box<dyn Read + Send>> {
        if let Some(inner) = path.strip_prefix(GZIP_PREFIX) {
            let file = File::open(inner)?;
            return Ok(Box::new(GzDecoder::new(BufReader::new(file))));
        }
        if path.starts_with(ZIP_PREFIX) {
            return Err(unsupported_zip());
        }
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }

    fn create(&self, destination: &Destination) -> io::Result<Box<dyn OutputStream>> {
        match destination {
            Destination::Stdout => Ok(Box::new(BufWriter::new(io::stdout()))),
            Destination::Gzip(_) => {
                let file = File::create(destination.inner_path())?;
                Ok(Box::new(GzEncoder::new(
                    BufWriter::new(file),
                    Compression::default(),
                )))
            }
            Destination::Zip(_) => Err(unsupported_zip()),
            Destination::File(path) => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)?;
                Ok(Box::new(BufWriter::new(file)))
            }
        }
    }
}

fn unsupported_zip() -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        "zip archive members are not supported by the local file system",
    )
}
