// Dynamic time warping
//
// Generic minimum-cost monotonic alignment between two sequences under a
// caller-supplied non-negative distance function. The alignment is found by
// least-cost-first search over the implicit m x n grid graph: a heap frontier
// ordered by cumulative cost, a best-known-cost table, and predecessor
// pointers per cell. Because edge weights are non-negative, the search can
// stop the first time it settles the terminal cell.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::MetricError;

/// A frontier entry: cumulative cost to reach `cell` (row-major index).
struct Frontier {
    cost: f64,
    cell: usize,
}

// BinaryHeap is a max-heap; invert the ordering to pop the cheapest cell.
impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}
impl Eq for Frontier {}
impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other.cost.total_cmp(&self.cost)
    }
}

/// Minimum-cost monotonic aligner for two time series.
///
/// Generic over the element types of both sequences and the distance
/// function. `distance()` and `path()` are memoized: the grid search runs
/// once on first use.
///
/// The path always starts at `(0, 0)` and ends at `(m-1, n-1)`, and each
/// step advances one or both indices by exactly one. Identical sequences
/// under a zero-respecting distance function yield distance 0 and a purely
/// diagonal path.
pub struct DynamicTimeWarping<'a, T1, T2, F>
where
    F: Fn(&T1, &T2) -> f64,
{
    ser1: &'a [T1],
    ser2: &'a [T2],
    dist_fn: F,
    solution: Option<(f64, Vec<(usize, usize)>)>,
}

impl<'a, T1, T2, F> DynamicTimeWarping<'a, T1, T2, F>
where
    F: Fn(&T1, &T2) -> f64,
{
    /// Create an aligner over two non-empty sequences.
    pub fn new(ser1: &'a [T1], ser2: &'a [T2], dist_fn: F) -> Result<Self, MetricError> {
        if ser1.is_empty() || ser2.is_empty() {
            return Err(MetricError::EmptySequence);
        }
        Ok(Self {
            ser1,
            ser2,
            dist_fn,
            solution: None,
        })
    }

    /// Total cost of the optimal alignment path, including both endpoints.
    pub fn distance(&mut self) -> f64 {
        self.solve();
        self.solution.as_ref().map(|(d, _)| *d).unwrap_or(f64::INFINITY)
    }

    /// The optimal alignment path as (index-in-ser1, index-in-ser2) cells,
    /// ordered from (0, 0) to (m-1, n-1) inclusive.
    pub fn path(&mut self) -> &[(usize, usize)] {
        self.solve();
        self.solution
            .as_ref()
            .map(|(_, p)| p.as_slice())
            .unwrap_or(&[])
    }

    fn solve(&mut self) {
        if self.solution.is_some() {
            return;
        }

        let m = self.ser1.len();
        let n = self.ser2.len();
        let target = m * n - 1;

        let mut best = vec![f64::INFINITY; m * n];
        let mut pred = vec![usize::MAX; m * n];
        let mut settled = vec![false; m * n];
        let mut frontier = BinaryHeap::new();

        best[0] = (self.dist_fn)(&self.ser1[0], &self.ser2[0]);
        frontier.push(Frontier {
            cost: best[0],
            cell: 0,
        });

        while let Some(Frontier { cost, cell }) = frontier.pop() {
            if settled[cell] {
                continue;
            }
            settled[cell] = true;
            if cell == target {
                break;
            }

            let (i, j) = (cell / n, cell % n);
            // Forward neighbors: down, right, diagonal.
            let steps: [(usize, usize); 3] = [(i + 1, j), (i, j + 1), (i + 1, j + 1)];
            for (ni, nj) in steps {
                if ni >= m || nj >= n {
                    continue;
                }
                let next = ni * n + nj;
                if settled[next] {
                    continue;
                }
                let next_cost = cost + (self.dist_fn)(&self.ser1[ni], &self.ser2[nj]);
                if next_cost < best[next] {
                    best[next] = next_cost;
                    pred[next] = cell;
                    frontier.push(Frontier {
                        cost: next_cost,
                        cell: next,
                    });
                }
            }
        }

        // Walk the predecessor chain back from the terminal cell.
        let mut path = Vec::new();
        let mut cell = target;
        loop {
            path.push((cell / n, cell % n));
            if cell == 0 {
                break;
            }
            cell = pred[cell];
        }
        path.reverse();

        self.solution = Some((best[target], path));
    }
}
