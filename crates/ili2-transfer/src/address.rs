// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Composite address resolution
//!
//! A container is addressed by `data[,model]`. Write destinations may carry a
//! virtual-file prefix that changes how the output stream is opened.

use ili2_model::{Error, Result};
use std::io;
use std::path::Path;

/// Exact path that streams output to stdout
pub const STDOUT_PATH: &str = "/vsistdout/";
/// Prefix for gzip-wrapped output
pub const GZIP_PREFIX: &str = "/vsigzip/";
/// Prefix for zip-archive output
pub const ZIP_PREFIX: &str = "/vsizip/";
/// Entry name appended to a bare zip archive path
pub const DEFAULT_ZIP_ENTRY: &str = "out.xtf";

/// Split a composite address into its non-empty comma separated parts
pub fn split_address(address: &str) -> Vec<&str> {
    address.split(',').filter(|part| !part.is_empty()).collect()
}

/// Data and model paths of a read request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadPaths {
    pub data: String,
    pub model: Option<String>,
}

impl ReadPaths {
    /// Resolve the read paths
    ///
    /// An explicit model option makes the whole address the data path; an
    /// empty option value means no model.
    /// Otherwise part 0 is the data path and part 1, if any, the model path.
    /// Returns `None` when the address has no parts at all.
    pub fn resolve(address: &str, model_option: Option<&str>) -> Option<Self> {
        if let Some(model) = model_option {
            return Some(Self {
                data: address.to_string(),
                model: Some(model).filter(|m| !m.is_empty()).map(str::to_string),
            });
        }

        let parts = split_address(address);
        let data = parts.first()?;
        Some(Self {
            data: (*data).to_string(),
            model: parts.get(1).map(|m| (*m).to_string()),
        })
    }
}

/// Output and model paths of a write request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WritePaths {
    pub output: String,
    pub model: String,
}

impl WritePaths {
    /// Resolve `output,model`; the model part is mandatory
    pub fn resolve(address: &str) -> Result<Self> {
        let parts = split_address(address);
        match parts.as_slice() {
            [] => Err(Error::open_failed(
                address,
                io::Error::new(io::ErrorKind::InvalidInput, "empty destination address"),
            )),
            [output] => Err(Error::ModelNotSpecified((*output).to_string())),
            [output, model, ..] => Ok(Self {
                output: (*output).to_string(),
                model: (*model).to_string(),
            }),
        }
    }
}

/// How an output destination must be opened
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenMode {
    /// Write only (streams and archive members)
    Write,
    /// Read-write, created or truncated
    ReadWriteCreate,
}

/// Resolved output destination
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    /// Stream to stdout
    Stdout,
    /// Gzip-wrapped file; holds the full prefixed path
    Gzip(String),
    /// Member of a zip archive; holds the full prefixed path including entry
    Zip(String),
    /// Plain file
    File(String),
}

impl Destination {
    /// Apply destination scheme rewrites to an output path
    pub fn resolve(path: &str) -> Self {
        if path == STDOUT_PATH {
            Destination::Stdout
        } else if path.starts_with(GZIP_PREFIX) {
            Destination::Gzip(path.to_string())
        } else if path.starts_with(ZIP_PREFIX) {
            let is_bare_archive = Path::new(path)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
            if is_bare_archive {
                Destination::Zip(form_filename(path, DEFAULT_ZIP_ENTRY))
            } else {
                Destination::Zip(path.to_string())
            }
        } else {
            Destination::File(path.to_string())
        }
    }

    /// Full destination path, prefix included
    pub fn path(&self) -> &str {
        match self {
            Destination::Stdout => STDOUT_PATH,
            Destination::Gzip(path) | Destination::Zip(path) | Destination::File(path) => path,
        }
    }

    /// Path with the virtual-file prefix stripped
    pub fn inner_path(&self) -> &str {
        match self {
            Destination::Stdout => "",
            Destination::Gzip(path) => path.strip_prefix(GZIP_PREFIX).unwrap_or(path),
            Destination::Zip(path) => path.strip_prefix(ZIP_PREFIX).unwrap_or(path),
            Destination::File(path) => path,
        }
    }

    pub fn open_mode(&self) -> OpenMode {
        match self {
            Destination::File(_) => OpenMode::ReadWriteCreate,
            _ => OpenMode::Write,
        }
    }
}

fn form_filename(dir: &str, entry: &str) -> String {
    if dir.ends_with('/') || dir.ends_with('\\') {
        format!("{dir}{entry}")
    } else {
        format!("{dir}/{entry}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_address_drops_empty_parts() {
        assert_eq!(split_address("a.xtf,m.ili"), ["a.xtf", "m.ili"]);
        assert_eq!(split_address("a.xtf,,m.ili"), ["a.xtf", "m.ili"]);
        assert!(split_address("").is_empty());
        assert!(split_address(",").is_empty());
    }

    #[test]
    fn test_read_paths() {
        let paths = ReadPaths::resolve("data.xtf,model.ili", None).unwrap();
        assert_eq!(paths.data, "data.xtf");
        assert_eq!(paths.model.as_deref(), Some("model.ili"));

        let paths = ReadPaths::resolve("data.xtf", None).unwrap();
        assert!(paths.model.is_none());

        assert!(ReadPaths::resolve("", None).is_none());
    }

    #[test]
    fn test_read_paths_model_option_takes_whole_address() {
        let paths = ReadPaths::resolve("dir/a,b.xtf", Some("m.ili")).unwrap();
        assert_eq!(paths.data, "dir/a,b.xtf");
        assert_eq!(paths.model.as_deref(), Some("m.ili"));
    }

    #[test]
    fn test_read_paths_empty_model_option() {
        let paths = ReadPaths::resolve("dir/a,b.xtf", Some("")).unwrap();
        assert_eq!(paths.data, "dir/a,b.xtf");
        assert!(paths.model.is_none());
    }

    #[test]
    fn test_inner_path_without_prefix() {
        assert_eq!(Destination::Gzip("a".into()).inner_path(), "a");
        assert_eq!(Destination::Zip("b.zip".into()).inner_path(), "b.zip");
    }

    #[test]
    fn test_write_paths_require_model() {
        let err = WritePaths::resolve("out.xtf").unwrap_err();
        assert!(matches!(err, Error::ModelNotSpecified(ref p) if p == "out.xtf"));

        let err = WritePaths::resolve("").unwrap_err();
        assert!(matches!(err, Error::OpenFailed { .. }));

        let paths = WritePaths::resolve("out.xtf,model.ili").unwrap();
        assert_eq!(paths.output, "out.xtf");
        assert_eq!(paths.model, "model.ili");
    }

    #[test]
    fn test_zip_archive_gets_default_entry() {
        let dest = Destination::resolve("/vsizip/archive.zip");
        assert_eq!(dest, Destination::Zip("/vsizip/archive.zip/out.xtf".into()));
        assert_eq!(dest.inner_path(), "archive.zip/out.xtf");

        let dest = Destination::resolve("/vsizip/ARCHIVE.ZIP");
        assert_eq!(dest.path(), "/vsizip/ARCHIVE.ZIP/out.xtf");
    }

    #[test]
    fn test_zip_with_entry_is_verbatim() {
        let dest = Destination::resolve("/vsizip/archive.zip/data.xtf");
        assert_eq!(dest.path(), "/vsizip/archive.zip/data.xtf");
        assert_eq!(dest.open_mode(), OpenMode::Write);
    }

    #[test]
    fn test_other_schemes_are_verbatim() {
        assert_eq!(Destination::resolve("/vsistdout/"), Destination::Stdout);

        let gz = Destination::resolve("/vsigzip/out.xtf.gz");
        assert_eq!(gz.path(), "/vsigzip/out.xtf.gz");
        assert_eq!(gz.inner_path(), "out.xtf.gz");
        assert_eq!(gz.open_mode(), OpenMode::Write);

        let file = Destination::resolve("out.zip");
        assert_eq!(file, Destination::File("out.zip".into()));
        assert_eq!(file.open_mode(), OpenMode::ReadWriteCreate);
    }
}
