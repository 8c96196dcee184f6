//! Error types used by the crate.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use image::ImageError;
use thiserror::Error;

/// Mapcraft error type.
#[derive(Debug, Error)]
pub enum MapcraftError {
    /// A row could not be turned into a record.
    #[error("malformed record at row {row}: {reason}")]
    MalformedRecord {
        /// Zero-based index of the input row.
        row: usize,
        /// Human readable description of the problem.
        reason: String,
    },
    /// An attribute value does not match the dataset schema.
    #[error("schema mismatch at row {row}: attribute '{attribute}' expected {expected}, found {found}")]
    SchemaMismatch {
        /// Zero-based index of the input row.
        row: usize,
        /// Attribute name.
        attribute: String,
        /// Type declared by the schema.
        expected: String,
        /// Type of the offending value.
        found: String,
    },
    /// Too many rows were rejected during loading.
    #[error("too many invalid records: {skipped} of {total} rows rejected (first: {first_reason})")]
    TooManyInvalidRecords {
        /// Number of rejected rows at the moment of failure.
        skipped: usize,
        /// Number of rows seen at the moment of failure.
        total: usize,
        /// Reason the first row was rejected.
        first_reason: String,
    },
    /// A mutation was attempted on a sealed dataset.
    #[error("dataset is sealed and cannot be modified")]
    DatasetSealed,
    /// Unknown projection name or an invalid projection definition.
    #[error("unsupported projection: {0}")]
    UnsupportedProjection(String),
    /// Unknown output format.
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),
    /// Invalid customization parameters.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// Layer construction failed.
    #[error("failed to build layer '{layer}': {reason}")]
    LayerBuild {
        /// Name of the layer.
        layer: String,
        /// Reason of the failure.
        reason: String,
    },
    /// Rendering failed.
    #[error("render error: {0}")]
    Render(String),
    /// Operation was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,
    /// The output could not be written.
    #[error("failed to write '{}'", path.display())]
    IoWrite {
        /// Output path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Error reading data from the file system.
    #[error("failed to read data")]
    Io(#[from] std::io::Error),
    /// Image decoding error.
    #[error("image decode error: {0:?}")]
    ImageDecode(#[from] ImageError),
    /// Image encoding error.
    #[error("image encode error: {0}")]
    Encoding(String),
    /// Customization file cannot be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
    /// CSV input cannot be read.
    #[cfg(feature = "csv")]
    #[error("failed to read csv: {0}")]
    Csv(#[from] csv::Error),
}

/// Stage of the rendering pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Validation of the customization parameters.
    Configure,
    /// Loading and validating input rows.
    Load,
    /// Projection, styling and layer construction.
    Build,
    /// Rasterization.
    Render,
    /// Writing of the output image.
    Export,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Configure => "configure",
            Stage::Load => "load",
            Stage::Build => "build",
            Stage::Render => "render",
            Stage::Export => "export",
        };
        f.write_str(name)
    }
}

/// Error returned by the [`Pipeline`](crate::pipeline::Pipeline). Names the stage that failed and
/// carries the counters collected before the failure.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    /// Failing stage.
    pub stage: Stage,
    /// Underlying error.
    #[source]
    pub source: MapcraftError,
    /// Number of input rows skipped before the failure.
    pub skipped: usize,
    /// Number of style fallbacks before the failure.
    pub fallbacks: usize,
}

impl PipelineError {
    pub(crate) fn new(stage: Stage, source: MapcraftError) -> Self {
        Self {
            stage,
            source,
            skipped: 0,
            fallbacks: 0,
        }
    }

    pub(crate) fn with_counters(mut self, skipped: usize, fallbacks: usize) -> Self {
        self.skipped = skipped;
        self.fallbacks = fallbacks;
        self
    }
}

impl From<mapcraft_types::error::MapcraftTypesError> for MapcraftError {
    fn from(value: mapcraft_types::error::MapcraftTypesError) -> Self {
        use mapcraft_types::error::MapcraftTypesError;
        match value {
            MapcraftTypesError::Projection(reason) => Self::UnsupportedProjection(reason),
            MapcraftTypesError::Conversion(reason) => Self::Configuration(reason),
        }
    }
}
