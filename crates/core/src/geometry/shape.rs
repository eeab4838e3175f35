use geo::Coord;

/// Axis-aligned min/max extent of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Envelope {
    /// Extent of a point set; all zeros for an empty set.
    pub fn from_points(points: &[Coord<f64>]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };
        points.iter().skip(1).fold(
            Self {
                min_x: first.x,
                min_y: first.y,
                max_x: first.x,
                max_y: first.y,
            },
            |env, p| Self {
                min_x: env.min_x.min(p.x),
                min_y: env.min_y.min(p.y),
                max_x: env.max_x.max(p.x),
                max_y: env.max_y.max(p.y),
            },
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Coord<f64> {
        Coord {
            x: (self.min_x + self.max_x) / 2.0,
            y: (self.min_y + self.max_y) / 2.0,
        }
    }

    /// `[min_x, min_y, max_x, max_y]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

/// Geometry of a detection, resolved once at ingestion.
///
/// Polygon rings are stored open: the closing vertex is never duplicated.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Box { x1: f64, y1: f64, x2: f64, y2: f64 },
    Polygon(Vec<Coord<f64>>),
}

impl Shape {
    pub fn from_bbox(bbox: [f64; 4]) -> Self {
        Shape::Box {
            x1: bbox[0],
            y1: bbox[1],
            x2: bbox[2],
            y2: bbox[3],
        }
    }

    /// Builds a polygon from a flat `[x1, y1, x2, y2, ...]` list.
    ///
    /// A trailing unpaired value is ignored. Returns `None` for fewer than
    /// three points.
    pub fn from_flat(coords: &[f64]) -> Option<Self> {
        let points: Vec<Coord<f64>> = coords
            .chunks_exact(2)
            .map(|pair| Coord {
                x: pair[0],
                y: pair[1],
            })
            .collect();
        Self::from_points(points)
    }

    /// Builds a polygon from a ring, dropping an explicit closing vertex.
    pub fn from_points(mut points: Vec<Coord<f64>>) -> Option<Self> {
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if points.len() < 3 {
            return None;
        }
        Some(Shape::Polygon(points))
    }

    /// Open ring of the shape. Boxes yield their four corners
    /// counter-clockwise (in a y-up frame) starting at the minimum corner.
    pub fn points(&self) -> Vec<Coord<f64>> {
        match *self {
            Shape::Box { x1, y1, x2, y2 } => {
                let (min_x, max_x) = (x1.min(x2), x1.max(x2));
                let (min_y, max_y) = (y1.min(y2), y1.max(y2));
                vec![
                    Coord { x: min_x, y: min_y },
                    Coord { x: max_x, y: min_y },
                    Coord { x: max_x, y: max_y },
                    Coord { x: min_x, y: max_y },
                ]
            }
            Shape::Polygon(ref points) => points.clone(),
        }
    }

    /// Ring with the first vertex repeated at the end.
    pub fn closed_points(&self) -> Vec<Coord<f64>> {
        let mut points = self.points();
        if let Some(&first) = points.first() {
            points.push(first);
        }
        points
    }

    pub fn envelope(&self) -> Envelope {
        match *self {
            Shape::Box { x1, y1, x2, y2 } => Envelope {
                min_x: x1.min(x2),
                min_y: y1.min(y2),
                max_x: x1.max(x2),
                max_y: y1.max(y2),
            },
            Shape::Polygon(ref points) => Envelope::from_points(points),
        }
    }

    /// Open ring flattened to `[x1, y1, x2, y2, ...]`.
    pub fn to_flat(&self) -> Vec<f64> {
        self.points().iter().flat_map(|p| [p.x, p.y]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_box_corners_normalised() {
        let shape = Shape::Box {
            x1: 10.0,
            y1: 8.0,
            x2: 0.0,
            y2: 2.0,
        };
        let pts = shape.points();
        assert_eq!(pts.len(), 4);
        assert_eq!(pts[0], Coord { x: 0.0, y: 2.0 });
        assert_eq!(pts[2], Coord { x: 10.0, y: 8.0 });
    }

    #[test]
    fn test_from_flat_pairs_points() {
        let shape = Shape::from_flat(&[0.0, 0.0, 4.0, 0.0, 4.0, 3.0, 0.0, 3.0]).unwrap();
        assert_eq!(shape.points().len(), 4);
    }

    #[test]
    fn test_from_flat_ignores_trailing_value() {
        let shape = Shape::from_flat(&[0.0, 0.0, 4.0, 0.0, 4.0, 3.0, 9.0]).unwrap();
        assert_eq!(shape.points().len(), 3);
    }

    #[test]
    fn test_from_flat_too_few_points() {
        assert!(Shape::from_flat(&[0.0, 0.0, 1.0, 1.0]).is_none());
    }

    #[test]
    fn test_closing_vertex_dropped() {
        let shape = Shape::from_flat(&[0.0, 0.0, 4.0, 0.0, 4.0, 3.0, 0.0, 0.0]).unwrap();
        assert_eq!(shape.points().len(), 3);
        let closed = shape.closed_points();
        assert_eq!(closed.len(), 4);
        assert_eq!(closed.first(), closed.last());
    }

    #[test]
    fn test_envelope_of_polygon() {
        let shape = Shape::from_flat(&[1.0, 5.0, 7.0, -2.0, 3.0, 9.0]).unwrap();
        let env = shape.envelope();
        assert_eq!(env.to_array(), [1.0, -2.0, 7.0, 9.0]);
        assert_relative_eq!(env.width(), 6.0);
        assert_relative_eq!(env.height(), 11.0);
    }

    #[test]
    fn test_envelope_of_empty_set() {
        assert_eq!(Envelope::from_points(&[]), Envelope::default());
    }

    #[test]
    fn test_to_flat_round_trips_box() {
        let shape = Shape::from_bbox([0.0, 0.0, 2.0, 1.0]);
        assert_eq!(
            shape.to_flat(),
            vec![0.0, 0.0, 2.0, 0.0, 2.0, 1.0, 0.0, 1.0]
        );
    }
}
