use std::ops::Index;
use std::sync::Arc;

use crate::layer::Layer;

/// Ordered collection of layers with their visibility flags.
///
/// When a map is rendered, it draws all visible layers in the order they are stored in the
/// collection: the layer at index 0 is drawn first, so it ends up at the bottom. Any layer can be
/// temporarily hidden with [`LayerCollection::hide`] or [`LayerCollection::show_by`]. Hidden
/// layers are ignored by the renderer, but retain their place in the collection.
///
/// Layers are stored as `Arc`s, so the same layer can be shared by several maps without copying
/// its primitives.
#[derive(Debug, Clone, Default)]
pub struct LayerCollection(Vec<LayerEntry>);

#[derive(Debug, Clone)]
struct LayerEntry {
    layer: Arc<Layer>,
    is_hidden: bool,
}

impl LayerCollection {
    /// Shortens the collection, keeping the first `length` layers and dropping the rest. If
    /// the length of the collection is less than `length` does nothing.
    pub fn truncate(&mut self, length: usize) {
        self.0.truncate(length)
    }

    /// Removes all layers from the collection.
    pub fn clear(&mut self) {
        self.0.clear()
    }

    /// Inserts a layer at position `index`, shifting all layers after it to the right.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`
    pub fn insert(&mut self, index: usize, layer: impl Into<Arc<Layer>>) {
        self.0.insert(index, LayerEntry::new(layer.into()));
    }

    /// Removes a layer at `index`, shifting all layers after it to the left and returning the
    /// removed layer.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove(&mut self, index: usize) -> Arc<Layer> {
        self.0.remove(index).layer
    }

    /// Retains only the layers specified by the predicate.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&Layer) -> bool,
    {
        self.0.retain(|entry| f(&entry.layer))
    }

    /// Adds the layer to the end of the collection.
    pub fn push(&mut self, layer: impl Into<Arc<Layer>>) {
        self.0.push(LayerEntry::new(layer.into()))
    }

    /// Removes the last layer from the collection and returns it. Returns `None` if the collection
    /// is empty.
    pub fn pop(&mut self) -> Option<Arc<Layer>> {
        self.0.pop().map(|entry| entry.layer)
    }

    /// Returns the number of layers in the collection, including hidden ones.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the collection does not contain any layers.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the layer at `index`, or `None` if the index is out of bounds.
    pub fn get(&self, index: usize) -> Option<&Arc<Layer>> {
        self.0.get(index).map(|entry| &entry.layer)
    }

    /// Swaps two layers in the collection.
    ///
    /// # Panics
    ///
    /// Panics if `a` or `b` are out of bounds.
    pub fn swap(&mut self, a: usize, b: usize) {
        self.0.swap(a, b)
    }

    /// Iterates over all layers in the collection, including hidden ones.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Layer>> + '_ {
        self.0.iter().map(|entry| &entry.layer)
    }

    /// Sets the layer at `index` as invisible.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn hide(&mut self, index: usize) {
        self.0[index].is_hidden = true;
    }

    /// Sets the layer at `index` as visible.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn show(&mut self, index: usize) {
        self.0[index].is_hidden = false;
    }

    /// Shows the layers for which the predicate returns true and hides all the others.
    pub fn show_by<F>(&mut self, mut f: F)
    where
        F: FnMut(&Layer) -> bool,
    {
        for entry in &mut self.0 {
            entry.is_hidden = !f(&entry.layer);
        }
    }

    /// Returns true if the layer at `index` is not hidden.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn is_visible(&self, index: usize) -> bool {
        !self.0[index].is_hidden
    }

    /// Iterates over visible layers in drawing order.
    pub fn iter_visible(&self) -> impl Iterator<Item = &Arc<Layer>> + '_ {
        self.0
            .iter()
            .filter(|entry| !entry.is_hidden)
            .map(|entry| &entry.layer)
    }
}

impl LayerEntry {
    fn new(layer: Arc<Layer>) -> Self {
        Self {
            layer,
            is_hidden: false,
        }
    }
}

impl Index<usize> for LayerCollection {
    type Output = Layer;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index].layer
    }
}

impl<L: Into<Arc<Layer>>> FromIterator<L> for LayerCollection {
    fn from_iter<T: IntoIterator<Item = L>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|layer| LayerEntry::new(layer.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use mapcraft_types::cartesian::Size;
    use mapcraft_types::geo::GeoRect;

    use super::*;
    use crate::dataset::{Dataset, LoadOptions};
    use crate::layer::BuildOptions;
    use crate::projector::{ProjectionKind, Projector};
    use crate::style::{StyleConfig, StyleResolver};
    use crate::viewport::Viewport;

    pub(crate) fn test_layer(name: &str) -> Layer {
        let dataset = Dataset::load(vec![], LoadOptions::default()).unwrap().seal();
        let viewport = Viewport::new(GeoRect::WORLD, Size::new(10, 10), ProjectionKind::Mercator);
        let projector = Projector::new(&viewport).unwrap();
        let resolver = StyleResolver::new(&StyleConfig::default(), &dataset).unwrap();
        Layer::build(name, &dataset, &projector, &resolver, &BuildOptions::default()).unwrap()
    }

    fn names(collection: &LayerCollection) -> Vec<&str> {
        collection.iter().map(|l| l.name()).collect()
    }

    #[test]
    fn insert_remove_swap() {
        let mut collection: LayerCollection =
            [test_layer("A"), test_layer("B")].into_iter().collect();

        collection.insert(1, test_layer("C"));
        assert_eq!(names(&collection), vec!["A", "C", "B"]);

        collection.swap(0, 2);
        assert_eq!(names(&collection), vec!["B", "C", "A"]);

        let removed = collection.remove(1);
        assert_eq!(removed.name(), "C");
        assert_eq!(collection.len(), 2);
        assert_eq!(collection[1].name(), "A");

        collection.push(test_layer("D"));
        assert_eq!(collection.pop().map(|l| l.name().to_string()), Some("D".into()));

        collection.retain(|l| l.name() != "B");
        assert_eq!(names(&collection), vec!["A"]);

        collection.clear();
        assert!(collection.is_empty());
        assert!(collection.get(0).is_none());
    }

    #[test]
    fn visibility() {
        let mut collection: LayerCollection = [test_layer("A"), test_layer("B"), test_layer("C")]
            .into_iter()
            .collect();

        collection.hide(1);
        assert!(!collection.is_visible(1));
        let visible: Vec<_> = collection.iter_visible().map(|l| l.name()).collect();
        assert_eq!(visible, vec!["A", "C"]);

        collection.show(1);
        assert!(collection.is_visible(1));

        collection.show_by(|l| l.name() == "C");
        let visible: Vec<_> = collection.iter_visible().map(|l| l.name()).collect();
        assert_eq!(visible, vec!["C"]);
        assert_eq!(collection.len(), 3);
    }
}
