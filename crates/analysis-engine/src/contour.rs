//! Iso-level contour extraction using marching squares.
//!
//! Cells are classified against the level, crossings found by linear
//! interpolation along cell edges, and the resulting segments chained into
//! polylines. Ambiguous saddle cells are resolved with the cell-center mean
//! so contours do not break into disconnected artifacts.

use chart_common::{ChartError, ContourPath, ScalarGrid};

/// A point in grid index space (fractional column/row).
#[derive(Debug, Clone, Copy, PartialEq)]
struct GridPoint {
    x: f64,
    y: f64,
}

/// A line segment between two grid points.
#[derive(Debug, Clone)]
struct Segment {
    start: GridPoint,
    end: GridPoint,
}

/// All contour paths extracted for one level.
#[derive(Debug, Clone)]
pub struct LevelPaths {
    pub level: f64,
    pub paths: Vec<ContourPath>,
}

/// Trace every requested iso-level of a scalar grid.
///
/// Paths are returned in lon/lat coordinates with at least 2 vertices each;
/// single-point artifacts are discarded. A malformed grid is a tracing
/// failure, terminal for the run.
pub fn trace_iso_lines(grid: &ScalarGrid, levels: &[f64]) -> Result<Vec<LevelPaths>, ChartError> {
    let spec = grid.spec;
    if spec.nx < 2 || spec.ny < 2 {
        return Err(ChartError::TracingFailure(format!(
            "grid too small to contour: {}x{}",
            spec.ny, spec.nx
        )));
    }
    if grid.values.len() != spec.len() {
        return Err(ChartError::TracingFailure(format!(
            "grid shape mismatch: {} values for {}x{} nodes",
            grid.values.len(),
            spec.ny,
            spec.nx
        )));
    }

    let mut out = Vec::with_capacity(levels.len());
    for &level in levels {
        let segments = march_squares(&grid.values, spec.nx, spec.ny, level);
        let chains = connect_segments(segments);

        let paths: Vec<ContourPath> = chains
            .into_iter()
            .filter(|chain| chain.len() >= 2)
            .map(|chain| {
                ContourPath::new(
                    chain
                        .into_iter()
                        .map(|p| {
                            (
                                spec.bbox.min_lon + p.x * spec.resolution,
                                spec.bbox.min_lat + p.y * spec.resolution,
                            )
                        })
                        .collect(),
                )
            })
            .collect();

        out.push(LevelPaths { level, paths });
    }

    tracing::debug!(
        levels = levels.len(),
        paths = out.iter().map(|l| l.paths.len()).sum::<usize>(),
        "Traced contours"
    );
    Ok(out)
}

/// Marching squares over one level, producing unordered segments.
fn march_squares(data: &[f64], width: usize, height: usize, level: f64) -> Vec<Segment> {
    let mut segments = Vec::new();

    for y in 0..(height - 1) {
        for x in 0..(width - 1) {
            let bl = data[y * width + x];
            let br = data[y * width + x + 1];
            let tl = data[(y + 1) * width + x];
            let tr = data[(y + 1) * width + x + 1];

            if bl.is_nan() || br.is_nan() || tl.is_nan() || tr.is_nan() {
                continue;
            }

            let mut cell_index = 0u8;
            if bl >= level {
                cell_index |= 1;
            }
            if br >= level {
                cell_index |= 2;
            }
            if tr >= level {
                cell_index |= 4;
            }
            if tl >= level {
                cell_index |= 8;
            }

            let x0 = x as f64;
            let y0 = y as f64;

            // crossing points on the four cell edges
            let bottom = interpolate_edge(x0, y0, x0 + 1.0, y0, bl, br, level);
            let right = interpolate_edge(x0 + 1.0, y0, x0 + 1.0, y0 + 1.0, br, tr, level);
            let top = interpolate_edge(x0, y0 + 1.0, x0 + 1.0, y0 + 1.0, tl, tr, level);
            let left = interpolate_edge(x0, y0, x0, y0 + 1.0, bl, tl, level);

            match cell_index {
                0 | 15 => {}
                1 | 14 => segments.push(Segment { start: left, end: bottom }),
                2 | 13 => segments.push(Segment { start: bottom, end: right }),
                3 | 12 => segments.push(Segment { start: left, end: right }),
                4 | 11 => segments.push(Segment { start: right, end: top }),
                6 | 9 => segments.push(Segment { start: bottom, end: top }),
                7 | 8 => segments.push(Segment { start: left, end: top }),
                5 => {
                    // saddle: bl and tr above; disambiguate with the center
                    let center = 0.25 * (bl + br + tl + tr);
                    if center >= level {
                        segments.push(Segment { start: left, end: top });
                        segments.push(Segment { start: bottom, end: right });
                    } else {
                        segments.push(Segment { start: left, end: bottom });
                        segments.push(Segment { start: right, end: top });
                    }
                }
                10 => {
                    // saddle: br and tl above
                    let center = 0.25 * (bl + br + tl + tr);
                    if center >= level {
                        segments.push(Segment { start: left, end: bottom });
                        segments.push(Segment { start: right, end: top });
                    } else {
                        segments.push(Segment { start: left, end: top });
                        segments.push(Segment { start: bottom, end: right });
                    }
                }
                _ => {}
            }
        }
    }

    segments
}

/// Linearly interpolate the level crossing between two edge endpoints.
fn interpolate_edge(
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    val1: f64,
    val2: f64,
    level: f64,
) -> GridPoint {
    if (val2 - val1).abs() < 1e-12 {
        return GridPoint {
            x: (x1 + x2) / 2.0,
            y: (y1 + y2) / 2.0,
        };
    }

    let t = ((level - val1) / (val2 - val1)).clamp(0.0, 1.0);
    GridPoint {
        x: x1 + t * (x2 - x1),
        y: y1 + t * (y2 - y1),
    }
}

/// Chain unordered segments into continuous polylines.
fn connect_segments(segments: Vec<Segment>) -> Vec<Vec<GridPoint>> {
    if segments.is_empty() {
        return Vec::new();
    }

    let epsilon = 1e-6;
    let close = |a: &GridPoint, b: &GridPoint| {
        (a.x - b.x).abs() < epsilon && (a.y - b.y).abs() < epsilon
    };

    let mut chains = Vec::new();
    let mut used = vec![false; segments.len()];

    for start_idx in 0..segments.len() {
        if used[start_idx] {
            continue;
        }

        let mut points = vec![segments[start_idx].start, segments[start_idx].end];
        used[start_idx] = true;

        // extend forward from the tail, then backward from the head
        loop {
            let tail = points[points.len() - 1];
            let mut extended = false;
            for (i, seg) in segments.iter().enumerate() {
                if used[i] {
                    continue;
                }
                if close(&seg.start, &tail) {
                    points.push(seg.end);
                    used[i] = true;
                    extended = true;
                    break;
                }
                if close(&seg.end, &tail) {
                    points.push(seg.start);
                    used[i] = true;
                    extended = true;
                    break;
                }
            }
            if !extended {
                break;
            }
        }

        loop {
            let head = points[0];
            let mut extended = false;
            for (i, seg) in segments.iter().enumerate() {
                if used[i] {
                    continue;
                }
                if close(&seg.start, &head) {
                    points.insert(0, seg.end);
                    used[i] = true;
                    extended = true;
                    break;
                }
                if close(&seg.end, &head) {
                    points.insert(0, seg.start);
                    used[i] = true;
                    extended = true;
                    break;
                }
            }
            if !extended {
                break;
            }
        }

        if points.len() >= 2 {
            chains.push(points);
        }
    }

    chains
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_common::{BoundingBox, GridSpec};

    fn grid(nx: usize, ny: usize, values: Vec<f64>) -> ScalarGrid {
        let bbox = BoundingBox::new(
            0.0,
            0.0,
            (nx - 1) as f64,
            (ny - 1) as f64,
        );
        ScalarGrid::new(GridSpec::new(bbox, 1.0), values).unwrap()
    }

    #[test]
    fn test_flat_field_no_contours() {
        let g = grid(3, 3, vec![5.0; 9]);
        let traced = trace_iso_lines(&g, &[5.0]).unwrap();
        assert_eq!(traced.len(), 1);
        assert!(traced[0].paths.is_empty());
    }

    #[test]
    fn test_peak_produces_closed_ring() {
        let g = grid(
            3,
            3,
            vec![
                0.0, 0.0, 0.0, //
                0.0, 10.0, 0.0, //
                0.0, 0.0, 0.0,
            ],
        );
        let traced = trace_iso_lines(&g, &[5.0]).unwrap();
        let paths = &traced[0].paths;
        assert_eq!(paths.len(), 1);
        // ring around the center node: 8 crossings, closed back on itself
        let path = &paths[0];
        assert!(path.len() >= 5);
        let first = path.points[0];
        let last = path.points[path.len() - 1];
        assert!((first.0 - last.0).abs() < 1e-9);
        assert!((first.1 - last.1).abs() < 1e-9);
    }

    #[test]
    fn test_gradient_produces_straight_line() {
        // values rise west to east, contour at 1.5 is a vertical line
        let g = grid(
            4,
            3,
            vec![
                0.0, 1.0, 2.0, 3.0, //
                0.0, 1.0, 2.0, 3.0, //
                0.0, 1.0, 2.0, 3.0,
            ],
        );
        let traced = trace_iso_lines(&g, &[1.5]).unwrap();
        let paths = &traced[0].paths;
        assert_eq!(paths.len(), 1);
        for &(lon, _lat) in &paths[0].points {
            assert!((lon - 1.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_every_path_has_at_least_two_points() {
        let g = grid(
            5,
            5,
            (0..25).map(|i| ((i * 7919) % 13) as f64).collect(),
        );
        let traced = trace_iso_lines(&g, &[3.0, 6.0, 9.0]).unwrap();
        for level in traced {
            for path in level.paths {
                assert!(path.len() >= 2);
            }
        }
    }

    #[test]
    fn test_saddle_resolved_consistently() {
        // diagonal saddle: bl/tr above, br/tl below, center mean above
        let g = grid(
            2,
            2,
            vec![
                10.0, 0.0, //
                0.0, 10.0,
            ],
        );
        let traced = trace_iso_lines(&g, &[5.0]).unwrap();
        // center mean is 5.0 >= level: the two arcs hug the below corners
        assert_eq!(traced[0].paths.len(), 2);
    }

    #[test]
    fn test_too_small_grid_is_failure() {
        let bbox = BoundingBox::new(0.0, 0.0, 0.0, 0.0);
        let g = ScalarGrid::new(GridSpec::new(bbox, 1.0), vec![1.0]).unwrap();
        assert!(matches!(
            trace_iso_lines(&g, &[0.5]),
            Err(ChartError::TracingFailure(_))
        ));
    }
}
