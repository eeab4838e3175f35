use geo::Polygon;

use crate::shared::coordinate_space::CoordinateSpace;
use crate::shared::detection::Detection;

use super::geometry_adapter::to_polygon;
use super::group_merger::{merge_group, MergeError, MergeOutcome};
use super::grouper::group;
use super::merge_config::MergeConfig;

/// Result of one merge call over a detection list.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeReport<S: CoordinateSpace> {
    pub detections: Vec<Detection<S>>,
    /// Groups of two or more detections folded into one.
    pub groups_merged: usize,
    /// Groups that fell back to their first member.
    pub fallbacks: usize,
    /// Detections passed through because they had no usable polygon.
    pub ungeometrizable: usize,
}

impl<S: CoordinateSpace> MergeReport<S> {
    fn unchanged(detections: Vec<Detection<S>>) -> Self {
        Self {
            detections,
            groups_merged: 0,
            fallbacks: 0,
            ungeometrizable: 0,
        }
    }
}

/// Merges detections that represent the same space.
///
/// Output is in input order: a merged group takes the position of its first
/// member, singletons and ungeometrizable detections keep theirs untouched.
pub fn merge_detections<S: CoordinateSpace>(
    detections: Vec<Detection<S>>,
    config: &MergeConfig,
) -> Result<MergeReport<S>, MergeError> {
    if !config.enabled() || detections.len() < 2 {
        return Ok(MergeReport::unchanged(detections));
    }

    let mut indices: Vec<usize> = Vec::with_capacity(detections.len());
    let mut polygons: Vec<Polygon<f64>> = Vec::with_capacity(detections.len());
    for (i, detection) in detections.iter().enumerate() {
        if let Some(polygon) = to_polygon(detection) {
            indices.push(i);
            polygons.push(polygon);
        }
    }
    let ungeometrizable = detections.len() - indices.len();

    let mut merges: Vec<(Vec<usize>, MergeOutcome<S>)> = Vec::new();
    for members in group(&polygons, config) {
        if members.len() < 2 {
            continue;
        }
        let group_detections: Vec<&Detection<S>> =
            members.iter().map(|&m| &detections[indices[m]]).collect();
        let group_polygons: Vec<Polygon<f64>> =
            members.iter().map(|&m| polygons[m].clone()).collect();
        let outcome = merge_group(&group_detections, &group_polygons, config)?;
        merges.push((members.iter().map(|&m| indices[m]).collect(), outcome));
    }

    let mut report = MergeReport::unchanged(Vec::new());
    report.ungeometrizable = ungeometrizable;

    let mut slots: Vec<Option<Detection<S>>> = detections.into_iter().map(Some).collect();
    for (members, outcome) in merges {
        if let MergeOutcome::Fallback { reason, .. } = &outcome {
            log::warn!(
                "Merge of {} {} detections fell back to the first member: {reason}",
                members.len(),
                S::NAME
            );
            report.fallbacks += 1;
        } else {
            report.groups_merged += 1;
        }
        for &m in &members[1..] {
            slots[m] = None;
        }
        slots[members[0]] = Some(outcome.into_detection());
    }
    report.detections = slots.into_iter().flatten().collect();

    log::debug!(
        "{} merge: {} groups merged, {} fallbacks, {} passed through, {} detections out",
        S::NAME,
        report.groups_merged,
        report.fallbacks,
        report.ungeometrizable,
        report.detections.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::shape::Shape;
    use crate::shared::coordinate_space::{Geographic, Pixel};

    fn pixel(bbox: [f64; 4], confidence: f64) -> Detection<Pixel> {
        let mut d = Detection::new(Shape::from_bbox(bbox), vec![confidence]);
        d.area_sq_meters = 1.0;
        d
    }

    fn overlap_only() -> MergeConfig {
        MergeConfig::new(0.1, 0.05, None, true).unwrap()
    }

    #[test]
    fn test_disjoint_input_is_idempotent() {
        let input = vec![
            pixel([0.0, 0.0, 10.0, 10.0], 0.5),
            pixel([100.0, 0.0, 110.0, 10.0], 0.6),
            pixel([0.0, 100.0, 10.0, 110.0], 0.7),
        ];
        let report = merge_detections(input.clone(), &MergeConfig::pixel_default()).unwrap();
        assert_eq!(report.detections, input);
        assert!(report.detections.iter().all(|d| d.merged_count == 1));
        assert_eq!(report.groups_merged, 0);
    }

    #[test]
    fn test_scenario_overlap_ratio_merges_and_isolated_survives() {
        let a = pixel([0.0, 0.0, 10.0, 10.0], 0.5);
        let b = pixel([9.0, 0.0, 19.0, 10.0], 0.7);
        let c = pixel([100.0, 100.0, 110.0, 110.0], 0.9);
        let report =
            merge_detections(vec![a, b, c.clone()], &MergeConfig::pixel_default()).unwrap();

        assert_eq!(report.detections.len(), 2);
        assert_eq!(report.detections[0].merged_count, 2);
        assert_eq!(report.detections[0].envelope().to_array(), [0.0, 0.0, 19.0, 10.0]);
        assert_eq!(report.detections[1], c);
        assert_eq!(report.groups_merged, 1);
    }

    #[test]
    fn test_clockwise_ring_merges_with_box() {
        let mut cw = Detection::new(
            Shape::from_flat(&[0.0, 0.0, 0.0, 10.0, 10.0, 10.0, 10.0, 0.0]).unwrap(),
            vec![0.5],
        );
        cw.area_sq_meters = 1.0;
        let report = merge_detections(
            vec![cw, pixel([5.0, 0.0, 15.0, 10.0], 0.7)],
            &MergeConfig::pixel_default(),
        )
        .unwrap();

        assert_eq!(report.detections.len(), 1);
        assert_eq!(report.fallbacks, 0);
        assert_eq!(report.detections[0].envelope().to_array(), [0.0, 0.0, 15.0, 10.0]);
    }

    #[test]
    fn test_transitive_chain_merges_into_one() {
        let input = vec![
            pixel([0.0, 0.0, 10.0, 10.0], 0.5),
            pixel([8.0, 0.0, 18.0, 10.0], 0.5),
            pixel([16.0, 0.0, 26.0, 10.0], 0.5),
        ];
        let report = merge_detections(input, &overlap_only()).unwrap();
        assert_eq!(report.detections.len(), 1);
        assert_eq!(report.detections[0].merged_count, 3);
        assert_eq!(report.detections[0].area_sq_meters, 3.0);
    }

    #[test]
    fn test_group_takes_position_of_first_member() {
        let input = vec![
            pixel([100.0, 0.0, 110.0, 10.0], 0.1),
            pixel([0.0, 0.0, 10.0, 10.0], 0.2),
            pixel([105.0, 0.0, 115.0, 10.0], 0.3),
        ];
        let report = merge_detections(input, &overlap_only()).unwrap();
        assert_eq!(report.detections.len(), 2);
        assert_eq!(report.detections[0].merged_count, 2);
        assert_eq!(report.detections[1].confidence, vec![0.2]);
    }

    #[test]
    fn test_singleton_passes_through_untouched() {
        let mut lone = pixel([0.0, 0.0, 10.0, 10.0], 0.4);
        lone.confidence = vec![0.4, 0.6];
        lone.merged_count = 5;
        let report = merge_detections(vec![lone.clone()], &MergeConfig::pixel_default()).unwrap();
        assert_eq!(report.detections, vec![lone]);
    }

    #[test]
    fn test_ungeometrizable_detection_kept_in_place() {
        let degenerate = pixel([5.0, 5.0, 5.0, 5.0], 0.3);
        let input = vec![
            pixel([0.0, 0.0, 10.0, 10.0], 0.5),
            degenerate.clone(),
            pixel([5.0, 0.0, 15.0, 10.0], 0.5),
        ];
        let report = merge_detections(input, &overlap_only()).unwrap();
        assert_eq!(report.ungeometrizable, 1);
        assert_eq!(report.detections.len(), 2);
        assert_eq!(report.detections[0].merged_count, 2);
        assert_eq!(report.detections[1], degenerate);
    }

    #[test]
    fn test_disabled_config_returns_input() {
        let input = vec![
            pixel([0.0, 0.0, 10.0, 10.0], 0.5),
            pixel([0.0, 0.0, 10.0, 10.0], 0.5),
        ];
        let config = MergeConfig::new(0.1, 0.05, None, false).unwrap();
        let report = merge_detections(input.clone(), &config).unwrap();
        assert_eq!(report.detections, input);
    }

    #[test]
    fn test_geographic_merge_compounds_merged_count() {
        let mut a: Detection<Geographic> =
            Detection::new(Shape::from_bbox([52.0, 5.0, 52.001, 5.001]), vec![0.5]);
        a.merged_count = 2;
        let b: Detection<Geographic> =
            Detection::new(Shape::from_bbox([52.0008, 5.0, 52.0018, 5.001]), vec![0.9]);
        let report = merge_detections(vec![a, b], &MergeConfig::geographic_default()).unwrap();
        assert_eq!(report.detections.len(), 1);
        assert_eq!(report.detections[0].merged_count, 3);
        assert_eq!(report.detections[0].confidence.len(), 2);
    }
}
