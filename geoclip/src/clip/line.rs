//! Line clipping as an explicit two-state machine.
//!
//! Each segment is split at its robustly computed boundary crossings and every
//! sub-piece is classified by its midpoint. The machine walks the pieces in
//! order and cuts the path into runs: maximal contiguous sequences that stay
//! inside (or on) the boundary.
//!
//! ```text
//!            piece inside                      piece outside
//! Outside ──────────────────► Inside ───────────────────────► Outside
//!          start_run(entry)            emit_point(exit), end_run
//! ```

use geo::Coord;

use crate::geometry::{lerp, Boundary, Hit, Position};

/// Minimum number of positions a run needs to survive.
pub const MIN_RUN_POINTS: usize = 2;

/// State of the line walker relative to the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Inside,
    Outside,
}

/// Accumulates runs while walking a path.
#[derive(Debug)]
pub struct RunBuilder {
    state: RunState,
    current: Vec<Position>,
    runs: Vec<Vec<Position>>,
}

impl Default for RunBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RunBuilder {
    /// A walker positioned outside the boundary with no runs.
    pub fn new() -> Self {
        Self {
            state: RunState::Outside,
            current: Vec::new(),
            runs: Vec::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Enters the boundary at `at`, opening a new run.
    pub fn start_run(&mut self, at: Position) {
        self.end_run();
        self.state = RunState::Inside;
        self.current.push(at);
    }

    /// Appends `at` to the open run. Consecutive duplicates are collapsed.
    pub fn emit_point(&mut self, at: Position) {
        debug_assert_eq!(self.state, RunState::Inside);
        if self.current.last() != Some(&at) {
            self.current.push(at);
        }
    }

    /// Leaves the boundary, closing the open run.
    ///
    /// Runs shorter than [`MIN_RUN_POINTS`] are discarded.
    pub fn end_run(&mut self) {
        self.state = RunState::Outside;
        let run = std::mem::take(&mut self.current);
        if run.len() >= MIN_RUN_POINTS {
            self.runs.push(run);
        }
    }

    /// Closes any open run and returns every surviving run in path order.
    pub fn finish(mut self) -> Vec<Vec<Position>> {
        self.end_run();
        self.runs
    }
}

/// Clips a single path against the boundary, returning the surviving runs.
pub fn clip_path(boundary: &Boundary, path: &[Position]) -> Vec<Vec<Position>> {
    let mut walker = RunBuilder::new();

    for window in path.windows(2) {
        let (a, b) = (window[0].to_geo(), window[1].to_geo());
        if a == b {
            continue;
        }
        walk_segment(boundary, &mut walker, a, b, window[0], window[1]);
    }

    // A single-vertex path never produces a run.
    walker.finish()
}

fn walk_segment(
    boundary: &Boundary,
    walker: &mut RunBuilder,
    a: Coord<f64>,
    b: Coord<f64>,
    start_vertex: Position,
    end_vertex: Position,
) {
    // Cut points: the segment's own vertices plus every interior crossing.
    let mut cuts = Vec::with_capacity(4);
    cuts.push(Hit { t: 0.0, at: a });
    cuts.extend(boundary.crossings(a, b));
    cuts.push(Hit { t: 1.0, at: b });

    let last = cuts.len() - 2;
    for (i, piece) in cuts.windows(2).enumerate() {
        let (from, to) = (piece[0], piece[1]);
        let inside = boundary
            .locate_coord(lerp(a, b, (from.t + to.t) / 2.0))
            .is_kept();
        let entry = if i == 0 {
            start_vertex
        } else {
            Position::from_geo(from.at)
        };

        match (walker.state(), inside) {
            (RunState::Outside, true) => {
                walker.start_run(entry);
                if i == last {
                    walker.emit_point(end_vertex);
                }
            }
            (RunState::Inside, true) => {
                if i == last {
                    walker.emit_point(end_vertex);
                }
            }
            (RunState::Inside, false) => {
                walker.emit_point(entry);
                walker.end_run();
            }
            (RunState::Outside, false) => {}
        }
    }
}

/// Result of clipping a lineal geometry.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LineClip {
    /// Every line is inside and untouched by the boundary.
    Unchanged,
    /// Surviving runs, possibly empty.
    Runs(Vec<Vec<Position>>),
}

/// Clips one or more lines, concatenating the surviving runs.
pub(crate) fn clip_lines(boundary: &Boundary, lines: &[Vec<Position>]) -> LineClip {
    if lines.iter().all(|l| boundary.strictly_contains_path(l)) {
        return LineClip::Unchanged;
    }

    let runs: Vec<Vec<Position>> = lines
        .iter()
        .flat_map(|line| clip_path(boundary, line))
        .collect();

    if runs.as_slice() == lines {
        LineClip::Unchanged
    } else {
        LineClip::Runs(runs)
    }
}
