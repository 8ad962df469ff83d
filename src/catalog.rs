//! Static catalog of the OpenStreetMap extract regions the pipeline knows about.

/// A named geographic subdivision with an associated remote snapshot.
///
/// `parent` is the sub-region path segment of the download URL; it is empty
/// for top-level regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub id: String,
    pub parent: String,
}

impl Region {
    pub fn new(id: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: parent.into(),
        }
    }

    /// URL of the latest raw snapshot for this region.
    pub fn snapshot_url(&self, base_url: &str) -> String {
        if self.parent.is_empty() {
            format!("{}/{}-latest.osm.pbf", base_url, self.id)
        } else {
            format!("{}/{}/{}-latest.osm.pbf", base_url, self.parent, self.id)
        }
    }
}

/// Ordered, immutable mapping from region id to its parent sub-region path.
///
/// The catalog is also the source of valid CLI choices, so looking up an id
/// that is not in the catalog is a programmer error.
#[derive(Debug, Clone)]
pub struct Catalog {
    regions: Vec<Region>,
}

impl Catalog {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    /// The continental Geofabrik extracts covering the whole planet.
    pub fn geofabrik() -> Self {
        const AREAS: &[&str] = &[
            "africa",
            "antarctica",
            "asia",
            "australia-oceania",
            "europe",
            "north-america",
            "south-america",
        ];
        Self::new(AREAS.iter().map(|id| Region::new(*id, "")).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.regions.iter().any(|region| region.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|region| region.id == id)
    }

    /// Parent sub-region path for `id`; empty for top-level regions.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not in the catalog.
    pub fn parent_path(&self, id: &str) -> &str {
        &self
            .get(id)
            .unwrap_or_else(|| panic!("region '{id}' is not in the catalog"))
            .parent
    }

    pub fn ids(&self) -> Vec<&str> {
        self.regions.iter().map(|region| region.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_level_catalog() -> Catalog {
        Catalog::new(vec![Region::new("a", ""), Region::new("b", "x")])
    }

    #[test]
    fn test_top_level_snapshot_url_has_no_parent_segment() {
        let catalog = two_level_catalog();
        let region = catalog.get("a").unwrap();
        assert_eq!(
            region.snapshot_url("https://download.geofabrik.de"),
            "https://download.geofabrik.de/a-latest.osm.pbf"
        );
    }

    #[test]
    fn test_nested_snapshot_url_includes_parent_segment() {
        let catalog = two_level_catalog();
        let region = catalog.get("b").unwrap();
        assert_eq!(
            region.snapshot_url("https://download.geofabrik.de"),
            "https://download.geofabrik.de/x/b-latest.osm.pbf"
        );
    }

    #[test]
    fn test_parent_path_lookup() {
        let catalog = two_level_catalog();
        assert_eq!(catalog.parent_path("a"), "");
        assert_eq!(catalog.parent_path("b"), "x");
    }

    #[test]
    #[should_panic(expected = "not in the catalog")]
    fn test_parent_path_of_unknown_region_panics() {
        two_level_catalog().parent_path("nowhere");
    }

    #[test]
    fn test_geofabrik_catalog_is_ordered_and_top_level() {
        let catalog = Catalog::geofabrik();
        assert_eq!(catalog.len(), 7);
        assert_eq!(catalog.ids().first(), Some(&"africa"));
        assert_eq!(catalog.ids().last(), Some(&"south-america"));
        assert!(catalog.iter().all(|region| region.parent.is_empty()));
    }
}
