use mapcraft_types::geo::GeoPoint2d;
use mapcraft_types::Geom;

use crate::dataset::record::Value;

/// Raw input row: named values and, optionally, an explicit geometry.
///
/// If the geometry is not given, the dataset loader reads latitude and longitude from the
/// configured fields of the row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Value)>,
    geometry: Option<Geom<GeoPoint2d>>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field to the row.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    /// Sets explicit geometry of the row.
    pub fn with_geometry(mut self, geometry: impl Into<Geom<GeoPoint2d>>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }

    /// Adds a field to the row.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Value of the first field with the given name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Fields of the row in insertion order.
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Explicit geometry of the row.
    pub fn geometry(&self) -> Option<&Geom<GeoPoint2d>> {
        self.geometry.as_ref()
    }

    pub(crate) fn into_parts(self) -> (Vec<(String, Value)>, Option<Geom<GeoPoint2d>>) {
        (self.fields, self.geometry)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            geometry: None,
        }
    }
}
