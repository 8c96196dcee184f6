//! End-to-end orchestration: configuration, loading, layer building, rendering and export.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use ahash::AHashMap;
use log::info;
use mapcraft_types::geo::GeoRect;

use crate::cancel::CancellationToken;
use crate::config::{fit_bbox, MapConfig};
use crate::dataset::{Dataset, LoadOptions, Row, SealedDataset};
use crate::error::{MapcraftError, PipelineError, Stage};
use crate::export::export;
use crate::layer::{BuildOptions, Layer, LayerDiagnostics};
use crate::map::{Basemap, Map};
use crate::projector::{ProjectionKind, Projector};
use crate::render::{PixelBuffer, Renderer};
use crate::style::StyleResolver;
use crate::viewport::Viewport;

/// Input rows of one dataset.
///
/// Rows are pulled from the iterator only during the load stage, so a source can stream from a
/// file or another producer without collecting the rows first.
pub struct DataSource {
    name: String,
    rows: Box<dyn Iterator<Item = Row> + Send>,
    options: LoadOptions,
}

impl DataSource {
    /// Creates a source with the default load options.
    pub fn new<I>(name: impl Into<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = Row>,
        I::IntoIter: Send + 'static,
    {
        Self {
            name: name.into(),
            rows: Box::new(rows.into_iter()),
            options: LoadOptions::default(),
        }
    }

    /// Sets load options.
    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Name of the dataset, referenced by the layer configuration.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Debug for DataSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSource")
            .field("name", &self.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Result of a successful pipeline run.
#[derive(Debug)]
pub struct PipelineOutput {
    /// Rendered image.
    pub image: PixelBuffer,
    /// Viewport the image was rendered for.
    pub viewport: Viewport,
    /// Diagnostics of the layers, in drawing order.
    pub layers: Vec<(String, LayerDiagnostics)>,
    /// Number of rejected input rows.
    pub skipped: usize,
    /// Number of style fallbacks.
    pub fallbacks: usize,
}

/// Everything resolved from the configuration before any data is read.
struct Plan {
    kind: ProjectionKind,
    bbox: Option<GeoRect>,
    basemap: Option<Basemap>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    skipped: usize,
    fallbacks: usize,
}

fn fail(stage: Stage, counters: Counters) -> impl FnOnce(MapcraftError) -> PipelineError {
    move |err| PipelineError::new(stage, err).with_counters(counters.skipped, counters.fallbacks)
}

/// Builds and renders a map described by a [`MapConfig`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: MapConfig,
    build_options: BuildOptions,
}

impl Pipeline {
    /// Creates a pipeline.
    pub fn new(config: MapConfig) -> Self {
        Self {
            config,
            build_options: BuildOptions::default(),
        }
    }

    /// Sets the token that can be used to cancel the run.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.build_options.cancel = cancel;
        self
    }

    /// Sets the layer build options. The cancellation token of the options replaces the one set
    /// with [`Pipeline::with_cancellation`].
    pub fn with_build_options(mut self, options: BuildOptions) -> Self {
        self.build_options = options;
        self
    }

    /// Configuration of the pipeline.
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Runs all the stages. If the configuration has an output, the image is also saved.
    pub fn run(&self, sources: Vec<DataSource>) -> Result<PipelineOutput, PipelineError> {
        let mut counters = Counters::default();

        let plan = self.configure(&sources).map_err(fail(Stage::Configure, counters))?;
        info!(
            "Configuration is valid: {} layers, {} projection",
            self.config.layers.len(),
            plan.kind
        );

        let datasets = match self.load(sources, &mut counters) {
            Ok(datasets) => datasets,
            Err(err) => {
                if let MapcraftError::TooManyInvalidRecords { skipped, .. } = &err {
                    counters.skipped += skipped;
                }
                return Err(fail(Stage::Load, counters)(err));
            }
        };
        info!(
            "Loaded {} datasets, {} rows skipped",
            datasets.len(),
            counters.skipped
        );

        let map = self
            .build(plan, &datasets, &mut counters)
            .map_err(fail(Stage::Build, counters))?;
        info!(
            "Built {} layers, {} style fallbacks",
            map.layers().len(),
            counters.fallbacks
        );

        self.build_options
            .cancel
            .check()
            .map_err(fail(Stage::Render, counters))?;
        let renderer =
            Renderer::new(self.config.render.clone()).map_err(fail(Stage::Render, counters))?;
        let image = renderer
            .render(&map)
            .map_err(fail(Stage::Render, counters))?;

        if let Some(output) = &self.config.output {
            let format = output.format().map_err(fail(Stage::Export, counters))?;
            export(&image, &output.path, Some(format)).map_err(fail(Stage::Export, counters))?;
        }

        Ok(PipelineOutput {
            image,
            viewport: map.viewport().clone(),
            layers: map
                .layers()
                .iter()
                .map(|layer| (layer.name().to_string(), layer.diagnostics()))
                .collect(),
            skipped: counters.skipped,
            fallbacks: counters.fallbacks,
        })
    }

    fn configure(&self, sources: &[DataSource]) -> Result<Plan, MapcraftError> {
        self.config.validate()?;
        self.config
            .render
            .check_output_size(self.config.viewport.size())?;

        for layer in &self.config.layers {
            let dataset = layer.dataset_name();
            if !sources.iter().any(|source| source.name == dataset) {
                return Err(MapcraftError::Configuration(format!(
                    "dataset '{dataset}' of layer '{}' is not provided",
                    layer.name
                )));
            }
        }

        let kind = self.config.projection.kind()?;
        let bbox = self.config.viewport.bbox.bounds()?;
        if let Some(bbox) = bbox {
            let viewport = Viewport::new(bbox, self.config.viewport.size(), kind);
            Projector::new(&viewport)?;
        }

        let basemap = self
            .config
            .basemap
            .as_ref()
            .map(|basemap| basemap.to_basemap())
            .transpose()?;

        Ok(Plan {
            kind,
            bbox,
            basemap,
        })
    }

    fn load(
        &self,
        sources: Vec<DataSource>,
        counters: &mut Counters,
    ) -> Result<AHashMap<String, SealedDataset>, MapcraftError> {
        let mut datasets = AHashMap::new();
        for source in sources {
            self.build_options.cancel.check()?;

            let mut dataset = Dataset::load(source.rows, source.options)?;
            counters.skipped += dataset.report().skipped();
            datasets.insert(source.name, dataset.seal());
        }

        Ok(datasets)
    }

    fn build(
        &self,
        plan: Plan,
        datasets: &AHashMap<String, SealedDataset>,
        counters: &mut Counters,
    ) -> Result<Map, MapcraftError> {
        let bbox = match plan.bbox {
            Some(bbox) => bbox,
            None => fit_bbox(
                self.config
                    .layers
                    .iter()
                    .filter_map(|layer| datasets.get(layer.dataset_name())?.geo_extent())
                    .reduce(|a, b| a.merge(&b)),
                &plan.kind,
            ),
        };

        let viewport = Viewport::new(bbox, self.config.viewport.size(), plan.kind);
        let projector = Projector::new(&viewport)?;

        let mut map = Map::new(projector.viewport().clone());
        map.set_basemap(plan.basemap);

        for config in &self.config.layers {
            let dataset = datasets.get(config.dataset_name()).ok_or_else(|| {
                MapcraftError::Configuration(format!(
                    "dataset '{}' is not loaded",
                    config.dataset_name()
                ))
            })?;

            let resolver = StyleResolver::new(&config.style, dataset).map_err(|err| match err {
                MapcraftError::LayerBuild { .. } => err,
                other => MapcraftError::LayerBuild {
                    layer: config.name.clone(),
                    reason: other.to_string(),
                },
            })?;
            let options = BuildOptions {
                legend: config.legend,
                ..self.build_options.clone()
            };
            let layer = Layer::build(&config.name, dataset, &projector, &resolver, &options)?;
            counters.fallbacks += layer.diagnostics().fallbacks;
            map.layers_mut().push(Arc::new(layer));
        }

        Ok(map)
    }
}
