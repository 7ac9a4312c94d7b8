//! Character-grid commit graph computed over a newest-first topological
//! commit stream.
//!
//! Each lane ("column") waits for one specific hash. A commit lands in the
//! lane waiting for it, or opens a new lane when it is a branch tip. Lanes
//! that end up waiting for the same parent collapse into the lowest one, and
//! freed lanes are reused lowest-index first.

use std::collections::HashSet;

use crate::models::{Commit, GraphColumn, GraphLine, GraphRow};

const NODE: char = '*';
const RAIL: char = '|';
const BRANCH_OUT: char = '\\';
const BRANCH_IN: char = '/';
const SPAN_OUT: char = '-';
const SPAN_IN: char = '_';

#[derive(Debug, Default)]
pub struct GraphEngine {
    columns: Vec<GraphColumn>,
    seen: HashSet<String>,
}

impl GraphEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[GraphColumn] {
        &self.columns
    }

    pub fn active_columns(&self) -> usize {
        self.columns.iter().filter(|c| c.active).count()
    }

    /// Feed the next commit. Returns `None` for a hash already seen.
    pub fn push(&mut self, hash: &str, parents: &[String]) -> Option<GraphRow> {
        if !self.seen.insert(hash.to_string()) {
            return None;
        }

        let column = match self.find_commit_column(hash) {
            Some(idx) => idx,
            None => self.allocate(hash),
        };
        let line = self.commit_row(column);
        let mut connectors = Vec::new();

        match parents.split_first() {
            None => self.columns[column].active = false,
            Some((first, rest)) => {
                self.columns[column].commit_hash = first.clone();
                let extra: Vec<&String> = rest
                    .iter()
                    .enumerate()
                    .filter(|(idx, parent)| *parent != first && !rest[..*idx].contains(parent))
                    .map(|(_, parent)| parent)
                    .collect();
                if !extra.is_empty() {
                    connectors.push(self.open_merge_lanes(column, &extra));
                }
            }
        }
        if let Some(row) = self.collapse_converging() {
            connectors.push(row);
        }
        self.trim_trailing_inactive();

        Some(GraphRow {
            hash: hash.to_string(),
            column,
            line,
            connectors,
        })
    }

    /// Index of the active lane waiting for `hash`.
    pub fn find_commit_column(&self, hash: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.active && c.commit_hash == hash)
    }

    fn allocate(&mut self, hash: &str) -> usize {
        let column = GraphColumn {
            commit_hash: hash.to_string(),
            active: true,
        };
        if let Some(idx) = self.columns.iter().position(|c| !c.active) {
            self.columns[idx] = column;
            return idx;
        }
        self.columns.push(column);
        self.columns.len() - 1
    }

    fn width(&self) -> usize {
        (self.columns.len() * 2).saturating_sub(1)
    }

    fn rails(&self, skip: &[usize]) -> Vec<char> {
        let mut chars = vec![' '; self.width()];
        for (idx, column) in self.columns.iter().enumerate() {
            if column.active && !skip.contains(&idx) {
                chars[idx * 2] = RAIL;
            }
        }
        chars
    }

    fn commit_row(&self, column: usize) -> GraphLine {
        let mut chars = self.rails(&[]);
        chars[column * 2] = NODE;
        GraphLine::new(chars)
    }

    fn open_merge_lanes(&mut self, column: usize, parents: &[&String]) -> GraphLine {
        let mut opened = Vec::new();
        let mut targets = Vec::with_capacity(parents.len());
        for parent in parents {
            let target = match self.find_commit_column(parent) {
                Some(idx) => idx,
                None => {
                    let idx = self.allocate(parent);
                    opened.push(idx);
                    idx
                }
            };
            targets.push(target);
        }

        let mut chars = self.rails(&opened);
        for target in targets {
            if target > column {
                for odd in (column * 2 + 1..target * 2).step_by(2) {
                    chars[odd] = SPAN_OUT;
                }
                chars[target * 2 - 1] = BRANCH_OUT;
            } else if target < column {
                for odd in (target * 2 + 1..column * 2).step_by(2) {
                    chars[odd] = SPAN_OUT;
                }
                chars[target * 2 + 1] = BRANCH_IN;
            }
        }
        GraphLine::new(chars)
    }

    /// Fold lanes waiting for the same hash into the lowest of them.
    fn collapse_converging(&mut self) -> Option<GraphLine> {
        let mut folds = Vec::new();
        for low in 0..self.columns.len() {
            if !self.columns[low].active {
                continue;
            }
            for high in low + 1..self.columns.len() {
                if self.columns[high].active
                    && self.columns[high].commit_hash == self.columns[low].commit_hash
                {
                    self.columns[high].active = false;
                    folds.push((high, low));
                }
            }
        }
        if folds.is_empty() {
            return None;
        }

        let mut chars = self.rails(&[]);
        for (high, low) in folds {
            for odd in (low * 2 + 1..high * 2 - 1).step_by(2) {
                chars[odd] = SPAN_IN;
            }
            chars[high * 2 - 1] = BRANCH_IN;
        }
        Some(GraphLine::new(chars))
    }

    fn trim_trailing_inactive(&mut self) {
        while self.columns.last().is_some_and(|c| !c.active) {
            self.columns.pop();
        }
    }
}

/// Graph rows for `commits`, skipping repeated hashes.
pub fn compute_graph(commits: &[Commit]) -> Vec<GraphRow> {
    let mut engine = GraphEngine::new();
    commits
        .iter()
        .filter_map(|commit| engine.push(&commit.hash, &commit.parent_hashes))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parents(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    fn run(commits: &[(&str, &[&str])]) -> Vec<GraphRow> {
        let mut engine = GraphEngine::new();
        commits
            .iter()
            .filter_map(|(hash, ps)| engine.push(hash, &parents(ps)))
            .collect()
    }

    #[test]
    fn linear_chain_stays_in_one_lane() {
        let mut engine = GraphEngine::new();
        let rows: Vec<GraphRow> = [("c3", vec!["c2"]), ("c2", vec!["c1"]), ("c1", vec![])]
            .iter()
            .filter_map(|(h, ps)| engine.push(h, &parents(ps)))
            .collect();

        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert_eq!(row.line.as_string(), "*");
            assert_eq!(row.line.width, 1);
            assert!(row.connectors.is_empty());
        }
        assert_eq!(engine.active_columns(), 0);
    }

    #[test]
    fn two_parent_merge_opens_and_closes_a_lane() {
        let rows = run(&[
            ("c3", &["c1", "c2"]),
            ("c2", &["base"]),
            ("c1", &["base"]),
            ("base", &[]),
        ]);

        assert_eq!(rows[0].line.as_string(), "*");
        assert_eq!(rows[0].connectors.len(), 1);
        assert_eq!(rows[0].connectors[0].as_string(), "|\\ ");

        assert_eq!(rows[1].line.as_string(), "| *");
        assert_eq!(rows[1].column, 1);
        assert_eq!(rows[2].line.as_string(), "* |");
        assert_eq!(rows[2].connectors[0].as_string(), "|/ ");

        assert_eq!(rows[3].line.as_string(), "*");
        assert_eq!(rows[3].column, 0);
    }

    #[test]
    fn branch_tips_reuse_lowest_free_lane() {
        let rows = run(&[
            ("a2", &["a1"]),
            ("b1", &["x"]),
            ("a1", &[]),
            ("c1", &["y"]),
        ]);
        assert_eq!(rows[1].column, 1);
        assert_eq!(rows[2].line.as_string(), "* |");
        // a1 was a root, so lane 0 is free again for the next tip.
        assert_eq!(rows[3].column, 0);
        assert_eq!(rows[3].line.as_string(), "* |");
    }

    #[test]
    fn duplicate_hashes_are_ignored() {
        let rows = run(&[("a", &["b"]), ("a", &["b"]), ("b", &[])]);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn unknown_parents_leave_dangling_rails() {
        let mut engine = GraphEngine::new();
        engine.push("tip", &parents(&["missing"]));
        engine.push("other", &parents(&[]));
        assert_eq!(engine.find_commit_column("missing"), Some(0));
        assert_eq!(engine.active_columns(), 1);
    }

    #[test]
    fn merge_into_existing_lane_draws_without_allocating() {
        let rows = run(&[
            ("side", &["base"]),
            ("m", &["main", "base"]),
            ("main", &["base"]),
            ("base", &[]),
        ]);
        // `m` opens lane 1 and merges towards lane 0, which already waits for base.
        assert_eq!(rows[1].column, 1);
        assert_eq!(rows[1].connectors[0].as_string(), "|/|");
        assert_eq!(rows[2].connectors[0].as_string(), "|/ ");
        assert_eq!(rows[3].line.as_string(), "*");
    }

    /// Deterministic pseudo-random histories for property checks.
    fn synthetic_history(seed: u64, len: usize) -> Vec<(String, Vec<String>)> {
        let mut state = seed;
        let mut next = || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as usize
        };
        let mut commits = Vec::with_capacity(len);
        for idx in 0..len {
            let hash = format!("c{idx}");
            let remaining = len - idx - 1;
            let parents = match remaining {
                0 => Vec::new(),
                _ => {
                    let count = if remaining > 1 && next() % 4 == 0 { 2 } else { 1 };
                    let mut ps = Vec::new();
                    for _ in 0..count {
                        let offset = 1 + next() % remaining.min(4);
                        let parent = format!("c{}", idx + offset);
                        if !ps.contains(&parent) {
                            ps.push(parent);
                        }
                    }
                    ps
                }
            };
            commits.push((hash, parents));
        }
        commits
    }

    #[test]
    fn every_commit_row_has_one_marker_and_consistent_width() {
        for seed in 1..20 {
            let history = synthetic_history(seed, 60);
            let mut engine = GraphEngine::new();
            for (hash, ps) in &history {
                let lanes_before = engine.columns().len();
                let row = engine.push(hash, ps).expect("unique hashes");
                assert_eq!(row.line.chars.iter().filter(|c| **c == NODE).count(), 1);
                assert_eq!(row.line.width, row.line.chars.len());
                // The commit row only widens when the commit opens a fresh lane.
                assert!(row.line.width >= (lanes_before * 2).saturating_sub(1));
                assert!(row.line.width <= lanes_before * 2 + 1);
                for connector in &row.connectors {
                    assert!(!connector.chars.contains(&NODE));
                    assert_eq!(connector.width, connector.chars.len());
                }
            }
            assert_eq!(engine.active_columns(), 0, "seed {seed} left rails open");
        }
    }

    #[test]
    fn width_is_stable_while_topology_is() {
        let rows = run(&[
            ("a", &["b"]),
            ("x", &["y"]),
            ("b", &["c"]),
            ("y", &["z"]),
            ("c", &["d"]),
        ]);
        assert_eq!(rows[1].line.width, 3);
        assert!(rows[1..].iter().all(|row| row.line.width == 3));
    }
}
