use std::path::Path;

use geo::Coord;

use crate::{Detection, Error, Point2D, Result};

pub const POINTS_PER_DETECTION: usize = 4;

/// Groups a flat run of corner points into detection quadrilaterals.
#[derive(Debug, Clone, Copy)]
pub struct PolygonAssembler {
    round_coordinates: bool,
}

impl Default for PolygonAssembler {
    fn default() -> Self {
        Self {
            round_coordinates: true,
        }
    }
}

impl PolygonAssembler {
    pub fn new(round_coordinates: bool) -> Self {
        Self { round_coordinates }
    }

    pub fn point(&self, x: f64, y: f64) -> Point2D {
        if self.round_coordinates {
            Coord {
                x: x.round(),
                y: y.round(),
            }
        } else {
            Coord { x, y }
        }
    }

    /// `source` is only used to name the input in errors.
    pub fn assemble(&self, points: &[Point2D], source: &Path) -> Result<Vec<Detection>> {
        let chunks = points.chunks_exact(POINTS_PER_DETECTION);
        if !chunks.remainder().is_empty() {
            return Err(Error::MalformedDetection {
                path: source.to_path_buf(),
                line: points.len() / POINTS_PER_DETECTION + 1,
                reason: format!(
                    "{} points do not form whole quadrilaterals",
                    points.len()
                ),
            });
        }
        Ok(chunks
            .map(|quad| Detection::new([quad[0], quad[1], quad[2], quad[3]]))
            .collect())
    }
}
