//! [Layers](Layer) hold records of a dataset converted into primitives ready to be drawn.

use log::debug;
use mapcraft_types::Geom;
use rayon::prelude::*;

use crate::cancel::CancellationToken;
use crate::dataset::{Record, SealedDataset};
use crate::error::MapcraftError;
use crate::projector::{PixelCoordinate, Projector};
use crate::style::{Legend, StyleResolver, VisualAttributes};
use crate::viewport::Viewport;

/// Drawable item created from one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    /// Geometry in pixel coordinates of the output image.
    pub geometry: Geom<PixelCoordinate>,
    /// Visual parameters.
    pub attributes: VisualAttributes,
    /// Text label.
    pub label: Option<String>,
}

/// Parameters of [`Layer::build`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Datasets with more records than this are processed in batches.
    pub streaming_threshold: usize,
    /// Number of records in a batch.
    pub batch_size: usize,
    /// Cancellation flag, checked between batches.
    pub cancel: CancellationToken,
    /// Whether the layer should show a legend for its color rule.
    pub legend: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            streaming_threshold: 100_000,
            batch_size: 16_384,
            cancel: CancellationToken::default(),
            legend: true,
        }
    }
}

/// Statistics of a layer build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerDiagnostics {
    /// Number of primitives.
    pub primitives: usize,
    /// Total number of style rules that used their defaults.
    pub fallbacks: usize,
}

/// Set of primitives built from a dataset for a specific viewport.
///
/// A layer is immutable. If the dataset, the viewport or the style changes, a new layer must be
/// built. Maps share layers through `Arc`, so the same layer can be used in several maps with the
/// same viewport.
#[derive(Debug, Clone)]
pub struct Layer {
    name: String,
    viewport: Viewport,
    primitives: Vec<Primitive>,
    diagnostics: LayerDiagnostics,
    legend: Option<Legend>,
}

impl Layer {
    /// Builds a layer, creating one primitive per record in the order of the dataset.
    ///
    /// Large datasets (more than [`BuildOptions::streaming_threshold`] records) are processed in
    /// batches. Records of a batch are resolved in parallel.
    pub fn build(
        name: impl Into<String>,
        dataset: &SealedDataset,
        projector: &Projector,
        resolver: &StyleResolver,
        options: &BuildOptions,
    ) -> Result<Self, MapcraftError> {
        let name = name.into();
        options.cancel.check()?;

        if options.batch_size == 0 {
            return Err(MapcraftError::LayerBuild {
                layer: name,
                reason: "batch size must be positive".into(),
            });
        }

        let records = dataset.records();
        let batch_size = if records.len() > options.streaming_threshold {
            options.batch_size
        } else {
            records.len().max(1)
        };

        let mut primitives = Vec::with_capacity(records.len());
        let mut fallbacks = 0;

        for (batch_index, batch) in records.chunks(batch_size).enumerate() {
            options.cancel.check()?;

            let offset = batch_index * batch_size;
            let built = batch
                .par_iter()
                .enumerate()
                .map(|(i, record)| build_primitive(&name, offset + i, record, projector, resolver))
                .collect::<Result<Vec<_>, _>>()?;

            for (primitive, record_fallbacks) in built {
                primitives.push(primitive);
                fallbacks += record_fallbacks;
            }

            debug!(
                "Layer '{name}': batch {batch_index} done, {} of {} records processed",
                primitives.len(),
                records.len()
            );
        }

        let legend = if options.legend {
            resolver.legend(&name)
        } else {
            None
        };

        Ok(Self {
            diagnostics: LayerDiagnostics {
                primitives: primitives.len(),
                fallbacks,
            },
            name,
            viewport: projector.viewport().clone(),
            primitives,
            legend,
        })
    }

    /// Name of the layer.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Viewport the layer was built for.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Primitives in the order of the source records.
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Build statistics.
    pub fn diagnostics(&self) -> LayerDiagnostics {
        self.diagnostics
    }

    /// Legend of the layer's color rule.
    pub fn legend(&self) -> Option<&Legend> {
        self.legend.as_ref()
    }
}

fn build_primitive(
    layer: &str,
    index: usize,
    record: &Record,
    projector: &Projector,
    resolver: &StyleResolver,
) -> Result<(Primitive, usize), MapcraftError> {
    let geometry = record
        .geometry()
        .project(projector)
        .ok_or_else(|| MapcraftError::LayerBuild {
            layer: layer.to_string(),
            reason: format!("record {index} cannot be projected"),
        })?;

    let resolved = resolver.resolve(record);
    Ok((
        Primitive {
            geometry,
            attributes: resolved.attributes,
            label: resolved.label,
        },
        resolved.fallbacks,
    ))
}
