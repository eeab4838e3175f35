use geo::Polygon;

use super::adjacency::should_merge;
use super::merge_config::MergeConfig;
use super::union_find::UnionFind;

/// Partitions polygon indices into transitively adjacent groups.
///
/// Every unordered pair is tested, which is quadratic in the input; per-tile
/// detection counts are in the tens. Groups are ordered by their smallest
/// index and members keep input order. A disabled config yields singletons.
pub fn group(polygons: &[Polygon<f64>], config: &MergeConfig) -> Vec<Vec<usize>> {
    let mut forest = UnionFind::new(polygons.len());
    if !config.enabled() {
        return forest.into_groups();
    }

    for i in 0..polygons.len() {
        for j in (i + 1)..polygons.len() {
            if forest.find(i) == forest.find(j) {
                continue;
            }
            if should_merge(&polygons[i], &polygons[j], config) {
                forest.union(i, j);
            }
        }
    }
    forest.into_groups()
}
