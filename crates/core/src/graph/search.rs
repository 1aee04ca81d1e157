//! Lazy best-first route enumeration.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::{debug, info};

use super::builder::RouteGraph;
use super::dead_end::DeadEndRegistry;
use super::types::{PathStep, Route, SearchMode};
use crate::metrics;

/// A partial route waiting in the frontier.
#[derive(Debug)]
struct FrontierEntry {
    node: usize,
    cost: f64,
    steps: Vec<PathStep>,
    /// Number of closed nodes when this entry was created.
    visited_border: usize,
    seq: u64,
}

// BinaryHeap is a max-heap: the cheapest entry, then the oldest, is greatest.
impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

/// Iterator over the routes from a start to a goal format, cheapest first.
///
/// Work is done only while `next` is called; dropping the iterator abandons
/// the search. Several routes may reach the goal through the same node: a
/// frontier entry is only discarded as stale when its node was closed before
/// the entry was created.
pub struct RouteSearch<'g> {
    graph: &'g RouteGraph,
    dead_ends: DeadEndRegistry,
    goal: PathStep,
    goal_node: usize,
    mode: SearchMode,
    queue: BinaryHeap<FrontierEntry>,
    /// Close counter value at the first closing of each node.
    closed_at: Vec<Option<usize>>,
    closed_count: usize,
    next_seq: u64,
    iterations: u64,
    routes_found: u64,
    exhausted: bool,
}

impl<'g> RouteSearch<'g> {
    pub(super) fn new(
        graph: &'g RouteGraph,
        start: PathStep,
        goal: PathStep,
        mode: SearchMode,
        dead_ends: DeadEndRegistry,
    ) -> Self {
        metrics::ROUTE_SEARCHES.inc();

        let start_node = graph.node_index(start.mime());
        let goal_node = graph.node_index(goal.mime());

        let mut search = Self {
            graph,
            dead_ends,
            goal,
            goal_node: goal_node.unwrap_or_default(),
            mode,
            queue: BinaryHeap::new(),
            closed_at: vec![None; graph.node_count()],
            closed_count: 0,
            next_seq: 0,
            iterations: 0,
            routes_found: 0,
            exhausted: false,
        };

        let (Some(start_node), Some(_)) = (start_node, goal_node) else {
            debug!(
                "No route from {} to {}: format not in graph",
                start.mime(),
                search.goal.mime()
            );
            search.exhausted = true;
            return search;
        };

        info!(
            "Starting path search from {} to {} ({} mode)",
            start, search.goal, mode
        );
        search.push(start_node, 0.0, vec![start], 0);
        search
    }

    /// Frontier pops performed so far.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Routes yielded so far.
    pub fn routes_found(&self) -> u64 {
        self.routes_found
    }

    fn push(&mut self, node: usize, cost: f64, steps: Vec<PathStep>, visited_border: usize) {
        self.queue.push(FrontierEntry {
            node,
            cost,
            steps,
            visited_border,
            seq: self.next_seq,
        });
        self.next_seq += 1;
    }

    fn closed_before(&self, node: usize, border: usize) -> bool {
        matches!(self.closed_at[node], Some(index) if index < border)
    }

    fn accepts_goal_handler(&self, steps: &[PathStep]) -> bool {
        match (self.mode, &self.goal.handler) {
            (SearchMode::Simple, _) | (_, None) => true,
            (SearchMode::Advanced, Some(required)) => steps
                .last()
                .and_then(|step| step.handler.as_ref())
                .is_some_and(|handler| handler == required),
        }
    }

    fn close(&mut self, node: usize) {
        if self.closed_at[node].is_none() {
            self.closed_at[node] = Some(self.closed_count);
        }
        self.closed_count += 1;
    }

    fn expand(&mut self, entry: FrontierEntry) {
        let graph = self.graph;
        let border = self.closed_count;

        for &edge_index in &graph.nodes()[entry.node].edges {
            let edge = &graph.edges()[edge_index];
            if self.closed_before(edge.to.index, entry.visited_border) {
                continue;
            }
            let Some(handler) = edge.handler.clone() else {
                continue;
            };

            let mut steps = Vec::with_capacity(entry.steps.len() + 1);
            steps.extend_from_slice(&entry.steps);
            steps.push(PathStep::new(Some(handler), edge.to.format.clone()));
            self.push(edge.to.index, entry.cost + edge.cost, steps, border);
        }
    }
}

impl Iterator for RouteSearch<'_> {
    type Item = Route;

    fn next(&mut self) -> Option<Route> {
        if self.exhausted {
            return None;
        }

        while let Some(current) = self.queue.pop() {
            self.iterations += 1;

            if self.closed_before(current.node, current.visited_border) {
                continue;
            }

            if self.dead_ends.is_dead_end(&current.steps) {
                debug!(
                    "Skipping dead end at iteration {}: {}",
                    self.iterations,
                    Route {
                        steps: current.steps,
                        cost: current.cost
                    }
                );
                metrics::ROUTES_FILTERED
                    .with_label_values(&["dead_end"])
                    .inc();
                continue;
            }

            if current.node == self.goal_node {
                let route = Route {
                    steps: current.steps,
                    cost: current.cost,
                };
                debug!(
                    "Found path at iteration {} with cost {}: {}",
                    self.iterations, route.cost, route
                );

                if let Some(chain) = self.graph.forbidden_chain(&route.steps) {
                    debug!(
                        "Skipping path {} due to complete loss of media ({})",
                        route.mime_chain(),
                        chain.join(" → ")
                    );
                    metrics::ROUTES_FILTERED
                        .with_label_values(&["forbidden_chain"])
                        .inc();
                    continue;
                }

                if !self.accepts_goal_handler(&route.steps) {
                    metrics::ROUTES_FILTERED
                        .with_label_values(&["goal_handler"])
                        .inc();
                    continue;
                }

                debug!("Path valid! Yielding path: {}", route.mime_chain());
                self.routes_found += 1;
                metrics::ROUTES_YIELDED.inc();
                return Some(route);
            }

            self.close(current.node);
            self.expand(current);

            if self.iterations % self.graph.progress_log_interval() == 0 {
                debug!(
                    "Still searching... Iterations: {}, Paths found: {}, Queue length: {}",
                    self.iterations,
                    self.routes_found,
                    self.queue.len()
                );
            }
        }

        self.exhausted = true;
        info!(
            "Path search completed. Total iterations: {}, Total paths found: {}",
            self.iterations, self.routes_found
        );
        None
    }
}

impl Drop for RouteSearch<'_> {
    fn drop(&mut self) {
        metrics::SEARCH_ITERATIONS.observe(self.iterations as f64);
    }
}
