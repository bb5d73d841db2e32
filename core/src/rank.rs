//! PageRank over the corpus link graph.
//!
//! Weights are never materialized as an n×n matrix: each row is described by
//! its out-degree and link set, and `weight(j, k)` is evaluated on demand
//! during every sweep.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::{IndexError, Result};
use crate::index::{Corpus, DocId};

pub const DEFAULT_DAMPING: f64 = 0.15;
pub const DEFAULT_THRESHOLD: f64 = 0.001;
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankConfig {
    /// Probability mass spread uniformly over every document (epsilon).
    pub damping: f64,
    /// Euclidean distance between sweeps at which the solver stops.
    pub threshold: f64,
    pub max_iterations: usize,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            damping: DEFAULT_DAMPING,
            threshold: DEFAULT_THRESHOLD,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl RankConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    #[must_use]
    pub const fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub const fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Scores keyed by document id, stored densely in corpus registration order.
#[derive(Debug, Clone, PartialEq)]
pub struct RankVector {
    ids: Arc<[DocId]>,
    /// id → position in `ids`, shared by every vector built over the same ids.
    positions: Arc<HashMap<DocId, usize>>,
    scores: Vec<f64>,
}

impl RankVector {
    pub fn filled(ids: Arc<[DocId]>, value: f64) -> Self {
        let scores = vec![value; ids.len()];
        Self::with_scores(ids, scores)
    }

    fn with_scores(ids: Arc<[DocId]>, scores: Vec<f64>) -> Self {
        let positions = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        Self { ids, positions: Arc::new(positions), scores }
    }

    /// Same ids, every score set to `value`.
    fn refilled(&self, value: f64) -> Self {
        Self {
            ids: Arc::clone(&self.ids),
            positions: Arc::clone(&self.positions),
            scores: vec![value; self.ids.len()],
        }
    }

    pub fn len(&self) -> usize { self.scores.len() }

    pub fn is_empty(&self) -> bool { self.scores.is_empty() }

    pub fn get(&self, id: DocId) -> Option<f64> {
        self.positions.get(&id).map(|&i| self.scores[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (DocId, f64)> + '_ {
        self.ids.iter().copied().zip(self.scores.iter().copied())
    }

    pub fn sum(&self) -> f64 { self.scores.iter().sum() }

    pub fn to_map(&self) -> BTreeMap<DocId, f64> { self.iter().collect() }

    /// Euclidean distance. Both vectors must cover exactly the same ids.
    pub fn distance(&self, other: &RankVector) -> Result<f64> {
        let mismatch = IndexError::DimensionMismatch { left: self.len(), right: other.len() };
        if self.len() != other.len() {
            return Err(mismatch);
        }
        if Arc::ptr_eq(&self.ids, &other.ids) || self.ids == other.ids {
            let sq: f64 = self
                .scores
                .iter()
                .zip(&other.scores)
                .map(|(a, b)| (a - b) * (a - b))
                .sum();
            return Ok(sq.sqrt());
        }

        let mut sq = 0.0;
        for (id, a) in self.iter() {
            let b = other.get(id).ok_or_else(|| mismatch.clone())?;
            sq += (a - b) * (a - b);
        }
        Ok(sq.sqrt())
    }
}

#[derive(Debug, Clone)]
pub struct RankOutcome {
    pub ranks: RankVector,
    pub iterations: usize,
    pub converged: bool,
    /// Distance between the last two sweeps.
    pub residual: f64,
}

#[derive(Debug, Clone)]
struct Row {
    out_degree: usize,
    /// Sorted destination slots.
    links: Vec<usize>,
}

/// Transition weights between documents, addressed by arena slot
/// (the order of [`Corpus::ids`]).
#[derive(Debug, Clone)]
pub struct LinkGraph {
    ids: Arc<[DocId]>,
    damping: f64,
    rows: Vec<Row>,
}

impl LinkGraph {
    pub fn from_corpus(corpus: &Corpus, damping: f64) -> Self {
        let n = corpus.len();
        let rows = corpus
            .documents()
            .iter()
            .enumerate()
            .map(|(slot, doc)| {
                let mut links: Vec<usize> = doc.links.iter().filter_map(|&id| corpus.slot(id)).collect();
                links.sort_unstable();

                // No links at all: the page links to everyone else.
                let mut out_degree = if links.is_empty() { n - 1 } else { links.len() };
                if links.binary_search(&slot).is_ok() {
                    out_degree = if out_degree > 1 { out_degree - 1 } else { n - 1 };
                }
                Row { out_degree, links }
            })
            .collect();

        Self { ids: corpus.ids().collect(), damping, rows }
    }

    pub fn len(&self) -> usize { self.rows.len() }

    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    pub fn ids(&self) -> &[DocId] { &self.ids }

    pub fn out_degree(&self, source: usize) -> usize { self.rows[source].out_degree }

    pub fn weight(&self, source: usize, target: usize) -> f64 {
        let n = self.rows.len();
        let base = self.damping / n as f64;
        if source == target {
            return base;
        }
        let row = &self.rows[source];
        if row.links.binary_search(&target).is_ok() || row.out_degree == n - 1 {
            base + (1.0 - self.damping) / row.out_degree as f64
        } else {
            base
        }
    }

    /// Dense outgoing weights of `source`.
    pub fn row(&self, source: usize) -> impl Iterator<Item = f64> + '_ {
        (0..self.rows.len()).map(move |target| self.weight(source, target))
    }

    /// Mass flowing into `target` from the previous sweep, summed in slot order.
    fn incoming(&self, target: usize, prev: &[f64]) -> f64 {
        prev.iter()
            .enumerate()
            .map(|(source, r)| self.weight(source, target) * r)
            .sum()
    }

    #[cfg(not(feature = "parallel"))]
    fn sweep(&self, prev: &[f64], next: &mut [f64]) {
        for (target, slot) in next.iter_mut().enumerate() {
            *slot = self.incoming(target, prev);
        }
    }

    #[cfg(feature = "parallel")]
    fn sweep(&self, prev: &[f64], next: &mut [f64]) {
        use rayon::prelude::*;
        next.par_iter_mut()
            .enumerate()
            .for_each(|(target, slot)| *slot = self.incoming(target, prev));
    }

    /// Jacobi-style power iteration until two sweeps are within `config.threshold`.
    pub fn solve(&self, config: &RankConfig) -> Result<RankOutcome> {
        let n = self.len();
        if n <= 1 {
            return Ok(RankOutcome {
                ranks: RankVector::filled(self.ids.clone(), 1.0),
                iterations: 0,
                converged: true,
                residual: 0.0,
            });
        }

        let mut rank = RankVector::filled(self.ids.clone(), 0.0);
        let mut rank_prime = rank.refilled(1.0 / n as f64);
        let mut iterations = 0;
        let mut residual = rank.distance(&rank_prime)?;

        while residual > config.threshold {
            if iterations >= config.max_iterations {
                tracing::warn!(iterations, residual, "page rank hit the iteration bound before converging");
                return Ok(RankOutcome { ranks: rank_prime, iterations, converged: false, residual });
            }
            std::mem::swap(&mut rank, &mut rank_prime);
            self.sweep(&rank.scores, &mut rank_prime.scores);
            iterations += 1;
            residual = rank.distance(&rank_prime)?;
            tracing::debug!(iterations, residual, "page rank sweep");
        }

        tracing::info!(num_docs = n, iterations, residual, "page rank converged");
        Ok(RankOutcome { ranks: rank_prime, iterations, converged: true, residual })
    }
}

/// Build the link graph for `corpus` and run the solver.
pub fn compute_page_rank(corpus: &Corpus, config: &RankConfig) -> Result<RankOutcome> {
    LinkGraph::from_corpus(corpus, config.damping).solve(config)
}
