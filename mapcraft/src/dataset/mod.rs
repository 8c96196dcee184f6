//! Loading of input rows into validated, immutable datasets.
//!
//! A [`Dataset`] is created by [`Dataset::load`] and stays open for appending until it is
//! [sealed](Dataset::seal). Sealing produces a [`SealedDataset`], a cheaply clonable read-only view
//! that layers are built from.

#[cfg(feature = "csv")]
mod csv_source;
mod record;
mod row;

use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use log::{debug, warn};
use mapcraft_types::geo::{GeoPoint, GeoPoint2d, GeoRect, NewGeoPoint};
use mapcraft_types::Geom;

#[cfg(feature = "csv")]
pub use csv_source::CsvSource;
pub use record::{AttributeType, Record, RecordGeometry, Schema, Value};
pub use row::Row;

use crate::error::MapcraftError;

const MAX_REPORTED_REASONS: usize = 32;

/// Limit of rejected rows, after which loading fails.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SkipThreshold {
    /// Loading fails as soon as more than this number of rows is rejected.
    Count(usize),
    /// Loading fails if, after all rows are read, the share of rejected rows is greater than this
    /// value.
    Ratio(f64),
}

/// What to do with rows that cannot be turned into records.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InvalidRecordPolicy {
    /// The first invalid row fails the load with its own error.
    Fail,
    /// Invalid rows are skipped and counted, until the threshold is exceeded.
    Skip {
        /// Maximum allowed amount of invalid rows.
        threshold: SkipThreshold,
    },
}

impl Default for InvalidRecordPolicy {
    fn default() -> Self {
        Self::Skip {
            threshold: SkipThreshold::Ratio(0.2),
        }
    }
}

/// Parameters of [`Dataset::load`].
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Declared schema. If not set, the schema is inferred from the data: the first occurrence of
    /// an attribute fixes its type.
    pub schema: Option<Schema>,
    /// Handling of invalid rows.
    pub policy: InvalidRecordPolicy,
    /// Name of the field with the latitude of point records.
    pub lat_field: String,
    /// Name of the field with the longitude of point records.
    pub lon_field: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            schema: None,
            policy: InvalidRecordPolicy::default(),
            lat_field: "lat".to_string(),
            lon_field: "lon".to_string(),
        }
    }
}

impl LoadOptions {
    /// Sets the declared schema.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Sets the invalid row policy.
    pub fn with_policy(mut self, policy: InvalidRecordPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets names of the coordinate fields.
    pub fn with_coordinate_fields(
        mut self,
        lat_field: impl Into<String>,
        lon_field: impl Into<String>,
    ) -> Self {
        self.lat_field = lat_field.into();
        self.lon_field = lon_field.into();
        self
    }
}

/// Statistics of loading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    rows: usize,
    loaded: usize,
    skipped: usize,
    reasons: Vec<String>,
}

impl LoadReport {
    /// Number of rows read.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of records created.
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    /// Number of rejected rows.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Reasons of the first rejections (up to 32).
    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    fn record_skip(&mut self, error: &MapcraftError) {
        self.skipped += 1;
        if self.reasons.len() < MAX_REPORTED_REASONS {
            self.reasons.push(error.to_string());
        }
    }

    fn too_many(&self) -> MapcraftError {
        MapcraftError::TooManyInvalidRecords {
            skipped: self.skipped,
            total: self.rows,
            first_reason: self.reasons.first().cloned().unwrap_or_default(),
        }
    }
}

#[derive(Debug)]
enum Storage {
    Open(Vec<Record>),
    Sealed(SealedDataset),
}

/// Ordered collection of records with a common schema.
#[derive(Debug)]
pub struct Dataset {
    options: LoadOptions,
    schema: Schema,
    storage: Storage,
    report: LoadReport,
}

impl Dataset {
    /// Creates an empty open dataset.
    pub fn new(options: LoadOptions) -> Self {
        Self {
            schema: options.schema.clone().unwrap_or_default(),
            options,
            storage: Storage::Open(Vec::new()),
            report: LoadReport::default(),
        }
    }

    /// Loads the rows into a new dataset.
    pub fn load(
        rows: impl IntoIterator<Item = Row>,
        options: LoadOptions,
    ) -> Result<Self, MapcraftError> {
        let mut dataset = Self::new(options);
        dataset.append(rows)?;
        Ok(dataset)
    }

    /// Validates the rows and appends the resulting records to the dataset.
    ///
    /// Either all the valid rows are appended, or, if the call fails, the dataset is left
    /// unchanged.
    pub fn append(&mut self, rows: impl IntoIterator<Item = Row>) -> Result<(), MapcraftError> {
        if self.is_sealed() {
            return Err(MapcraftError::DatasetSealed);
        }

        let mut schema = self.schema.clone();
        let mut report = self.report.clone();
        let mut accepted = vec![];

        for row in rows {
            let index = report.rows;
            report.rows += 1;

            match self.parse_row(index, row, &mut schema) {
                Ok(record) => accepted.push(record),
                Err(err) => {
                    let InvalidRecordPolicy::Skip { threshold } = self.options.policy else {
                        return Err(err);
                    };

                    warn!("Skipping row {index}: {err}");
                    report.record_skip(&err);

                    if let SkipThreshold::Count(max) = threshold {
                        if report.skipped > max {
                            return Err(report.too_many());
                        }
                    }
                }
            }
        }

        if let InvalidRecordPolicy::Skip {
            threshold: SkipThreshold::Ratio(max),
        } = self.options.policy
        {
            if report.rows > 0 && report.skipped as f64 / report.rows as f64 > max {
                return Err(report.too_many());
            }
        }

        report.loaded += accepted.len();
        debug!(
            "Appended {} records to dataset ({} rows skipped so far)",
            accepted.len(),
            report.skipped
        );

        self.schema = schema;
        self.report = report;
        if let Storage::Open(records) = &mut self.storage {
            records.extend(accepted);
        }

        Ok(())
    }

    /// Freezes the dataset and returns a read-only view of it.
    ///
    /// Calling this method again returns views of the same storage.
    pub fn seal(&mut self) -> SealedDataset {
        let records = match &mut self.storage {
            Storage::Sealed(sealed) => return sealed.clone(),
            Storage::Open(records) => std::mem::take(records),
        };

        debug!(
            "Sealing dataset with {} records and {} attributes",
            records.len(),
            self.schema.len()
        );

        let sealed = SealedDataset(Arc::new(SealedInner {
            records,
            schema: self.schema.clone(),
        }));
        self.storage = Storage::Sealed(sealed.clone());
        sealed
    }

    /// Returns true if the dataset was sealed.
    pub fn is_sealed(&self) -> bool {
        matches!(self.storage, Storage::Sealed(_))
    }

    /// Records of the dataset in load order.
    pub fn records(&self) -> &[Record] {
        match &self.storage {
            Storage::Open(records) => records,
            Storage::Sealed(sealed) => sealed.records(),
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records().len()
    }

    /// Returns true if the dataset has no records.
    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    /// Current schema of the dataset.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Loading statistics.
    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    fn parse_row(
        &self,
        index: usize,
        row: Row,
        schema: &mut Schema,
    ) -> Result<Record, MapcraftError> {
        let (fields, geometry) = row.into_parts();
        let explicit_geometry = geometry.is_some();
        let declared = self.options.schema.is_some();

        let mut lat = None;
        let mut lon = None;
        let mut attributes = AHashMap::with_capacity(fields.len());
        let mut new_attributes = vec![];
        let mut seen = AHashSet::with_capacity(fields.len());

        for (name, value) in fields {
            if !seen.insert(name.clone()) {
                return Err(malformed(index, format!("field '{name}' is repeated")));
            }

            if !explicit_geometry {
                if name == self.options.lat_field {
                    lat = Some(value);
                    continue;
                }
                if name == self.options.lon_field {
                    lon = Some(value);
                    continue;
                }
            }

            let value = match schema.get(&name) {
                Some(expected) => {
                    value
                        .coerce(expected)
                        .map_err(|value| MapcraftError::SchemaMismatch {
                            row: index,
                            attribute: name.clone(),
                            expected: expected.to_string(),
                            found: value.attribute_type().to_string(),
                        })?
                }
                None if declared => {
                    return Err(MapcraftError::SchemaMismatch {
                        row: index,
                        attribute: name,
                        expected: "no such attribute".to_string(),
                        found: value.attribute_type().to_string(),
                    })
                }
                None => {
                    new_attributes.push((name.clone(), value.attribute_type()));
                    value
                }
            };

            attributes.insert(name, value);
        }

        let geometry = match geometry {
            Some(geometry) => validate_geometry(index, geometry)?,
            None => {
                let lat = coordinate(index, &self.options.lat_field, lat, 90.0)?;
                let lon = coordinate(index, &self.options.lon_field, lon, 180.0)?;
                Geom::Point(GeoPoint2d::latlon(lat, lon))
            }
        };

        for (name, attribute_type) in new_attributes {
            if schema.get(&name).is_none() {
                schema.insert(name, attribute_type);
            }
        }

        Ok(Record::new(geometry, attributes))
    }
}

fn malformed(row: usize, reason: String) -> MapcraftError {
    MapcraftError::MalformedRecord { row, reason }
}

fn coordinate(
    row: usize,
    field: &str,
    value: Option<Value>,
    limit: f64,
) -> Result<f64, MapcraftError> {
    let value = match value {
        Some(Value::Number(v)) => v,
        Some(Value::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| malformed(row, format!("field '{field}' is not numeric: '{s}'")))?,
        Some(Value::Bool(v)) => {
            return Err(malformed(
                row,
                format!("field '{field}' is not numeric: '{v}'"),
            ))
        }
        None => return Err(malformed(row, format!("field '{field}' is missing"))),
    };

    if !value.is_finite() {
        return Err(malformed(row, format!("field '{field}' is not finite")));
    }

    if value.abs() > limit {
        return Err(malformed(
            row,
            format!("field '{field}' value {value} is out of range [-{limit}, {limit}]"),
        ));
    }

    Ok(value)
}

fn validate_geometry(
    row: usize,
    geometry: RecordGeometry,
) -> Result<RecordGeometry, MapcraftError> {
    if let Some(point) = geometry.iter_points().find(|p| !p.is_valid()) {
        return Err(malformed(
            row,
            format!(
                "coordinates ({}, {}) are invalid",
                point.lat(),
                point.lon()
            ),
        ));
    }

    match &geometry {
        Geom::Point(_) => {}
        Geom::Contour(contour) => {
            let min = if contour.is_closed() { 3 } else { 2 };
            if contour.points().len() < min {
                return Err(malformed(
                    row,
                    format!("line must have at least {min} points"),
                ));
            }
        }
        Geom::Polygon(polygon) => {
            if polygon.iter_contours().any(|c| c.points().len() < 3) {
                return Err(malformed(
                    row,
                    "polygon rings must have at least 3 points".to_string(),
                ));
            }
        }
    }

    Ok(geometry)
}

#[derive(Debug)]
struct SealedInner {
    records: Vec<Record>,
    schema: Schema,
}

/// Immutable view of a sealed [`Dataset`].
///
/// Clones share the same storage. The records are freed when the last view (and the dataset
/// itself) is dropped.
#[derive(Debug, Clone)]
pub struct SealedDataset(Arc<SealedInner>);

impl SealedDataset {
    /// Records in load order.
    pub fn records(&self) -> &[Record] {
        &self.0.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.0.records.len()
    }

    /// Returns true if there are no records.
    pub fn is_empty(&self) -> bool {
        self.0.records.is_empty()
    }

    /// Schema of the dataset.
    pub fn schema(&self) -> &Schema {
        &self.0.schema
    }

    /// Minimum and maximum of the finite values of a numeric attribute. Returns `None` if no record
    /// has a finite value of the attribute.
    pub fn numeric_range(&self, attribute: &str) -> Option<(f64, f64)> {
        self.0
            .records
            .iter()
            .filter_map(|r| r.attribute(attribute)?.as_number())
            .filter(|v| v.is_finite())
            .fold(None, |range, v| match range {
                None => Some((v, v)),
                Some((min, max)) => Some((f64::min(min, v), f64::max(max, v))),
            })
    }

    /// Bounding box of all records. Can be degenerate if all the records share a coordinate.
    pub fn geo_extent(&self) -> Option<GeoRect> {
        GeoRect::from_points(
            self.0
                .records
                .iter()
                .flat_map(|r| r.geometry().iter_points()),
        )
    }

    /// Returns true if both views share the same storage.
    pub fn same_storage(&self, other: &SealedDataset) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Releases this view. Returns true if it was the last owner and the records were freed.
    pub fn release(self) -> bool {
        Arc::into_inner(self.0).is_some()
    }
}
