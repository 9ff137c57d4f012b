// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ili2-transfer - INTERLIS 2 transfer container
//!
//! This crate opens INTERLIS 2 transfer files (XTF) for reading and creates
//! new ones for writing. It implements the container lifecycle on top of the
//! collaborator traits defined in `ili2-model`.
//!
//! # Features
//!
//! - **Format probing** of the first bytes of a candidate file
//! - **Composite addresses** `data[,model]` with virtual-file destinations
//!   (`/vsistdout/`, `/vsigzip/`, `/vsizip/`)
//! - **Whole-document reads** using `nom` and `memchr`
//! - **Framed writes**: header, model list and basket written on create,
//!   closing framing guaranteed on close
//!
//! # Example
//!
//! ```ignore
//! use ili2_transfer::{Ili2Driver, OpenOptions};
//!
//! let driver = Ili2Driver::new();
//! if let Some(container) = driver.open("roads.xtf,roads.json", &OpenOptions::new())? {
//!     for layer in container.layers() {
//!         println!("{}: {} features", layer.name(), layer.feature_count());
//!     }
//! }
//!
//! let mut out = driver.create("out.xtf,roads.json")?;
//! let index = out.create_layer("RoadsSimple.RoadsTopic.LandCover", None, &[]);
//! out.close()?;
//! ```

pub mod address;
pub mod capability;
pub mod catalog_reader;
pub mod container;
pub mod encoder;
pub mod probe;
pub mod registry;
pub mod scanner;
pub mod tokenizer;
pub mod vfs;
pub mod writer;

pub use address::{Destination, OpenMode, ReadPaths, WritePaths};
pub use capability::Capability;
pub use catalog_reader::JsonCatalogReader;
pub use container::{ContainerHandle, Mode, TransferContainer};
pub use encoder::XtfEncoder;
pub use registry::{LayerRecord, WriteLayer};
pub use scanner::{BasketScanner, ScannerFactory};
pub use vfs::{FileSystem, LocalFs, OutputStream};
pub use writer::TransferWriter;

use ili2_model::{Error, FeatureEncoder, ModelReader, ReaderFactory, Result};
use std::io;
use std::sync::Arc;

/// Sender stamp written in the header section by default
pub const DEFAULT_SENDER: &str = concat!("ili2-transfer ", env!("CARGO_PKG_VERSION"));

/// Options for [`Ili2Driver::open`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenOptions {
    /// Check the file header before trusting the file
    pub probe: bool,
    /// Model file; makes the whole address the data path
    pub model: Option<String>,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            probe: true,
            model: None,
        }
    }
}

impl OpenOptions {
    /// Probing open without an explicit model
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to probe the header
    pub fn probe(mut self, enabled: bool) -> Self {
        self.probe = enabled;
        self
    }

    /// Set the model file
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Build from `KEY=VALUE` open options; recognizes `MODEL`
    pub fn from_option_list(options: &[&str]) -> Self {
        let mut result = Self::new();
        for option in options {
            match option.split_once('=') {
                Some((key, value)) if key.eq_ignore_ascii_case("MODEL") => {
                    result.model = Some(value.to_string());
                }
                _ => log::debug!("Ignoring open option {}", option),
            }
        }
        result
    }
}

/// Entry point for opening and creating transfer containers
///
/// Every collaborator can be replaced; the defaults read from the local
/// file system, load JSON catalogs, scan with [`BasketScanner`] and encode
/// with [`XtfEncoder`].
#[derive(Clone)]
pub struct Ili2Driver {
    sender: String,
    fs: Arc<dyn FileSystem>,
    models: Arc<dyn ModelReader>,
    readers: Arc<dyn ReaderFactory>,
    encoder: Arc<dyn FeatureEncoder>,
}

impl Default for Ili2Driver {
    fn default() -> Self {
        Self {
            sender: DEFAULT_SENDER.to_string(),
            fs: Arc::new(LocalFs),
            models: Arc::new(JsonCatalogReader),
            readers: Arc::new(ScannerFactory),
            encoder: Arc::new(XtfEncoder),
        }
    }
}

impl Ili2Driver {
    /// Create a driver with default collaborators
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sender stamp written in the header section
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    pub fn with_file_system(mut self, fs: impl FileSystem + 'static) -> Self {
        self.fs = Arc::new(fs);
        self
    }

    pub fn with_model_reader(mut self, reader: impl ModelReader + 'static) -> Self {
        self.models = Arc::new(reader);
        self
    }

    pub fn with_reader_factory(mut self, factory: impl ReaderFactory + 'static) -> Self {
        self.readers = Arc::new(factory);
        self
    }

    pub fn with_encoder(mut self, encoder: impl FeatureEncoder + 'static) -> Self {
        self.encoder = Arc::new(encoder);
        self
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Open a transfer for reading
    ///
    /// With `options.probe` set, a file that cannot be opened or does not look
    /// like an INTERLIS 2 transfer yields `Ok(None)`. Without probing the same
    /// conditions are errors. A missing reader backend is always an error.
    pub fn open(&self, address: &str, options: &OpenOptions) -> Result<Option<TransferContainer>> {
        let Some(paths) = ReadPaths::resolve(address, options.model.as_deref()) else {
            if options.probe {
                return Ok(None);
            }
            return Err(Error::open_failed(
                address,
                io::Error::new(io::ErrorKind::InvalidInput, "empty address"),
            ));
        };

        let mut source = match self.fs.open_read(&paths.data) {
            Ok(source) => source,
            Err(e) if options.probe => {
                log::debug!("Cannot open {} for probing: {}", paths.data, e);
                return Ok(None);
            }
            Err(e) => return Err(Error::open_failed(&paths.data, e)),
        };

        if options.probe {
            match probe::probe(&mut source) {
                Ok(true) => {}
                Ok(false) => return Ok(None),
                Err(e) => {
                    log::debug!("Cannot probe {}: {}", paths.data, e);
                    return Ok(None);
                }
            }
        }
        drop(source);

        let mut reader = self
            .readers
            .create_reader()
            .ok_or_else(|| Error::ReaderUnavailable(paths.data.clone()))?;

        let catalog = paths
            .model
            .as_deref()
            .map(|model| self.models.read_model(model))
            .transpose()?;

        let mut source = self
            .fs
            .open_read(&paths.data)
            .map_err(|e| Error::open_failed(&paths.data, e))?;
        let mut layers = reader.read_layers(&mut source, catalog.as_ref())?;
        layers.iter_mut().for_each(|layer| layer.reset_reading());

        log::info!("Opened {} with {} layers", paths.data, layers.len());

        let handle = ContainerHandle {
            address: address.to_string(),
            data_path: paths.data,
            model_path: paths.model,
            mode: Mode::Read,
        };
        Ok(Some(TransferContainer::for_read(handle, catalog, reader, layers)))
    }

    /// Create a transfer for writing at `output,model`
    ///
    /// The model part is mandatory and checked before any I/O. The catalog's
    /// basket name must be a valid element name. On success the header, model
    /// list and basket element are already written.
    pub fn create(&self, address: &str) -> Result<TransferContainer> {
        let paths = WritePaths::resolve(address)?;
        let destination = Destination::resolve(&paths.output);

        let out = self
            .fs
            .create(&destination)
            .map_err(|e| Error::open_failed(destination.path(), e))?;
        let mut writer = TransferWriter::new(out);

        let catalog = self.models.read_model(&paths.model)?;
        let basket = catalog.main_basket_name();
        if !crate::writer::is_element_name(basket) {
            return Err(Error::invalid_model(format!(
                "model {} has no usable basket name: `{}`",
                paths.model, basket
            )));
        }
        writer.begin(&catalog, &self.sender)?;

        log::info!(
            "Created {} with {} models",
            destination.path(),
            catalog.models().len()
        );

        let handle = ContainerHandle {
            address: address.to_string(),
            data_path: destination.path().to_string(),
            model_path: Some(paths.model),
            mode: Mode::Write,
        };
        Ok(TransferContainer::for_write(
            handle,
            catalog,
            writer,
            Arc::clone(&self.encoder),
        ))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{road_catalog, NoReaders, StaticModelReader, SAMPLE_XTF};
    use crate::vfs::testing::MemoryFs;
    use ili2_model::{ModelCatalog, ModelDescriptor};

    fn driver(fs: &MemoryFs, models: &StaticModelReader) -> Ili2Driver {
        Ili2Driver::new()
            .with_sender("ili2-transfer test")
            .with_file_system(fs.clone())
            .with_model_reader(models.clone())
    }

    #[test]
    fn test_empty_create_is_complete_document() {
        let fs = MemoryFs::new();
        let models = StaticModelReader::new(road_catalog());
        let container = driver(&fs, &models).create("out.xtf,model.ili").unwrap();
        assert_eq!(container.mode(), Mode::Write);
        assert_eq!(container.layer_count(), 0);
        container.close().unwrap();

        let expected = "<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n\
<TRANSFER xmlns=\"http://www.interlis.ch/INTERLIS2.3\">\n\
<HEADERSECTION SENDER=\"ili2-transfer test\" VERSION=\"2.3\">\n\
<MODELS>\n\
<MODEL NAME=\"RoadsSimple\" URI=\"http://www.interlis.ch\" VERSION=\"2005-06-16\"/>\n\
</MODELS>\n\
</HEADERSECTION>\n\
<DATASECTION>\n\
<RoadsSimple.RoadsTopic BID=\"RoadsSimple.RoadsTopic\">\n\
</RoadsSimple.RoadsTopic>\n\
</DATASECTION>\n\
</TRANSFER>\n";
        assert_eq!(fs.read("out.xtf").unwrap(), expected);
        assert_eq!(models.requested(), ["model.ili"]);
    }

    #[test]
    fn test_framing_lists_every_model() {
        let catalog = road_catalog()
            .with_model(ModelDescriptor::new("Base", "", "1"))
            .with_model(ModelDescriptor::new("Units", "", "2"));
        let fs = MemoryFs::new();
        let models = StaticModelReader::new(catalog);
        driver(&fs, &models)
            .create("out.xtf,model.ili")
            .unwrap()
            .close()
            .unwrap();

        let content = fs.read("out.xtf").unwrap();
        assert_eq!(content.matches("<MODEL ").count(), 3);
        let models_at = content.find("</MODELS>").unwrap();
        let data_at = content.find("<DATASECTION>").unwrap();
        assert!(models_at < data_at);
        assert!(content.ends_with("</RoadsSimple.RoadsTopic>\n</DATASECTION>\n</TRANSFER>\n"));
    }

    #[test]
    fn test_framing_without_models() {
        let fs = MemoryFs::new();
        let models = StaticModelReader::new(ModelCatalog::new("Empty.Topic"));
        driver(&fs, &models)
            .create("out.xtf,model.ili")
            .unwrap()
            .close()
            .unwrap();

        let content = fs.read("out.xtf").unwrap();
        assert!(content.contains("<MODELS>\n</MODELS>\n</HEADERSECTION>\n"));
        assert!(!content.contains("<MODEL "));
        assert!(content.ends_with(
            "<Empty.Topic BID=\"Empty.Topic\">\n</Empty.Topic>\n</DATASECTION>\n</TRANSFER>\n"
        ));
    }

    #[test]
    fn test_create_rejects_unusable_basket_name() {
        for basket in ["", "Roads Topic", "9Topic"] {
            let fs = MemoryFs::new();
            let models = StaticModelReader::new(ModelCatalog::new(basket));
            let result = driver(&fs, &models).create("out.xtf,m.json");

            assert!(matches!(result, Err(Error::InvalidModel(_))), "basket {basket:?}");
            assert!(!fs.read("out.xtf").unwrap_or_default().contains("BID"));
        }
    }

    #[test]
    fn test_empty_model_option_skips_model() {
        let fs = MemoryFs::new().with_file("sample.xtf", SAMPLE_XTF);
        let models = StaticModelReader::new(road_catalog());
        let options = OpenOptions::from_option_list(&["MODEL="]);
        let container = driver(&fs, &models)
            .open("sample.xtf", &options)
            .unwrap()
            .unwrap();

        assert!(models.requested().is_empty());
        assert!(container.catalog().is_none());
        assert_eq!(container.handle().model_path, None);
        assert_eq!(container.layer_count(), 2);
    }

    #[test]
    fn test_container_name_is_data_path() {
        let fs = MemoryFs::new().with_file("sample.xtf", SAMPLE_XTF);
        let models = StaticModelReader::new(road_catalog());
        let d = driver(&fs, &models);

        let read = d
            .open("sample.xtf,roads.json", &OpenOptions::new())
            .unwrap()
            .unwrap();
        assert_eq!(read.name(), "sample.xtf");
        assert_eq!(read.handle().address, "sample.xtf,roads.json");

        let write = d.create("/vsigzip/out.xtf.gz,roads.json").unwrap();
        assert_eq!(write.name(), "/vsigzip/out.xtf.gz");
    }

    #[test]
    fn test_mandatory_model_checked_before_io() {
        let fs = MemoryFs::new();
        let models = StaticModelReader::new(road_catalog());
        let result = driver(&fs, &models).create("out.xtf");

        assert!(matches!(result, Err(Error::ModelNotSpecified(ref p)) if p == "out.xtf"));
        assert_eq!(fs.open_count(), 0);
        assert!(models.requested().is_empty());
    }

    #[test]
    fn test_empty_create_address() {
        let fs = MemoryFs::new();
        let models = StaticModelReader::new(road_catalog());
        let result = driver(&fs, &models).create(",");
        assert!(matches!(result, Err(Error::OpenFailed { .. })));
        assert_eq!(fs.open_count(), 0);
    }

    #[test]
    fn test_scheme_rewrite() {
        let fs = MemoryFs::new();
        let models = StaticModelReader::new(road_catalog());
        let d = driver(&fs, &models);

        d.create("/vsistdout/,m.ili").unwrap().close().unwrap();
        d.create("/vsigzip/out.xtf.gz,m.ili").unwrap().close().unwrap();
        let zip = d.create("/vsizip/archive.ZIP,m.ili");
        assert!(matches!(zip, Err(Error::OpenFailed { ref path, .. }) if path == "/vsizip/archive.ZIP/out.xtf"));

        assert_eq!(
            fs.created(),
            [
                Destination::Stdout,
                Destination::Gzip("/vsigzip/out.xtf.gz".into()),
            ]
        );
    }

    #[test]
    fn test_open_sample() {
        let fs = MemoryFs::new().with_file("sample.xtf", SAMPLE_XTF);
        let mut container = Ili2Driver::new()
            .with_file_system(fs)
            .open("sample.xtf", &OpenOptions::new())
            .unwrap()
            .unwrap();

        assert_eq!(container.mode(), Mode::Read);
        assert_eq!(container.name(), "sample.xtf");
        assert!(container.catalog().is_none());
        assert_eq!(container.models()[0].name, "RoadsSimple");
        assert_eq!(container.layer_count(), 2);

        let land_cover = container.layer_mut(0).unwrap();
        assert_eq!(land_cover.name(), "RoadsSimple.RoadsTopic.LandCover");
        assert_eq!(land_cover.feature_count(), 2);
        assert_eq!(
            land_cover.next_feature().and_then(|f| f.fid.as_deref()),
            Some("16")
        );

        container.reset_reading();
        let land_cover = container.layer_mut(0).unwrap();
        assert_eq!(
            land_cover.next_feature().and_then(|f| f.fid.as_deref()),
            Some("16")
        );
        assert!(container.layer_by_name("RoadsSimple.RoadsTopic.Street").is_some());
        assert!(container.layer(2).is_none());
    }

    #[test]
    fn test_open_with_model_part() {
        let fs = MemoryFs::new().with_file("sample.xtf", SAMPLE_XTF);
        let models = StaticModelReader::new(road_catalog());
        let container = driver(&fs, &models)
            .open("sample.xtf,roads.json", &OpenOptions::new())
            .unwrap()
            .unwrap();

        assert_eq!(models.requested(), ["roads.json"]);
        assert_eq!(container.handle().model_path.as_deref(), Some("roads.json"));
        let layer = container.layer(0).unwrap();
        assert_eq!(layer.defn().geometry_type().kind, ili2_model::GeometryKind::CurvePolygon);
    }

    #[test]
    fn test_model_option_keeps_whole_address() {
        let fs = MemoryFs::new().with_file("a,b.xtf", SAMPLE_XTF);
        let models = StaticModelReader::new(road_catalog());
        let options = OpenOptions::from_option_list(&["model=roads.json", "OTHER=1"]);
        let container = driver(&fs, &models)
            .open("a,b.xtf", &options)
            .unwrap()
            .unwrap();

        assert_eq!(container.handle().data_path, "a,b.xtf");
        assert_eq!(models.requested(), ["roads.json"]);
    }

    #[test]
    fn test_probe_mismatch_is_not_an_error() {
        let fs = MemoryFs::new()
            .with_file("plain.xml", "<root xmlns=\"http://example.com\"/>")
            .with_file("late.xtf", &format!("<TRANSFER{}xmlns=\"http://www.interlis.ch/INTERLIS2.3\">", " ".repeat(1000)));
        let d = Ili2Driver::new().with_file_system(fs);

        assert!(d.open("plain.xml", &OpenOptions::new()).unwrap().is_none());
        assert!(d.open("late.xtf", &OpenOptions::new()).unwrap().is_none());
        assert!(d.open("", &OpenOptions::new()).unwrap().is_none());
    }

    #[test]
    fn test_missing_file() {
        let d = Ili2Driver::new().with_file_system(MemoryFs::new());
        assert!(d.open("missing.xtf", &OpenOptions::new()).unwrap().is_none());

        let trusted = d.open("missing.xtf", &OpenOptions::new().probe(false));
        assert!(matches!(trusted, Err(Error::OpenFailed { ref path, .. }) if path == "missing.xtf"));
    }

    #[test]
    fn test_probe_idempotent() {
        let fs = MemoryFs::new().with_file("sample.xtf", SAMPLE_XTF);
        let d = Ili2Driver::new().with_file_system(fs);
        let first = d.open("sample.xtf", &OpenOptions::new()).unwrap().unwrap();
        let second = d.open("sample.xtf", &OpenOptions::new()).unwrap().unwrap();
        assert_eq!(first.layer_count(), second.layer_count());
    }

    #[test]
    fn test_reader_unavailable() {
        let fs = MemoryFs::new().with_file("sample.xtf", SAMPLE_XTF);
        let result = Ili2Driver::new()
            .with_file_system(fs)
            .with_reader_factory(NoReaders)
            .open("sample.xtf", &OpenOptions::new());

        let err = result.unwrap_err();
        assert!(matches!(err, Error::ReaderUnavailable(ref p) if p == "sample.xtf"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_open_options() {
        let options = OpenOptions::new();
        assert!(options.probe);
        assert!(options.model.is_none());

        let options = OpenOptions::new().probe(false).with_model("m.json");
        assert!(!options.probe);
        assert_eq!(options.model.as_deref(), Some("m.json"));
    }

    #[test]
    fn test_default_sender() {
        assert!(Ili2Driver::new().sender().starts_with("ili2-transfer "));
    }
}
