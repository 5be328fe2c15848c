use std::collections::{BTreeMap, BTreeSet, VecDeque};

use coal_core::{CoalError, VertexId};
use tracing::{debug, warn};

use crate::graph::{graph_error, ModelGraph};
use crate::vertex::Role;

/// Connected subgraph of a [`ModelGraph`] partitioned by vertex role.
///
/// All vertex lists are sorted by id, so the partition does not depend on the
/// terminals used to discover the component or on traversal order.
#[derive(Debug, Clone)]
pub struct BayesianNetwork<'g> {
    graph: &'g ModelGraph,
    members: Vec<VertexId>,
    latent: Vec<VertexId>,
    observed: Vec<VertexId>,
    deterministic: Vec<VertexId>,
    constant: Vec<VertexId>,
    topological: Vec<VertexId>,
    downstream: BTreeMap<VertexId, Vec<VertexId>>,
}

impl<'g> BayesianNetwork<'g> {
    /// Collects the connected component reachable from `terminals` over both
    /// parent and child edges and classifies its vertices.
    ///
    /// Fails when a terminal does not exist, when the component contains a
    /// directed cycle, or when an observed vertex of the graph lies outside the
    /// component.
    pub fn assemble(graph: &'g ModelGraph, terminals: &[VertexId]) -> Result<Self, CoalError> {
        if terminals.is_empty() {
            return Err(graph_error("no-terminals", "network assembly needs at least one vertex"));
        }
        let members = connected_component(graph, terminals)?;

        let mut latent = Vec::new();
        let mut observed = Vec::new();
        let mut deterministic = Vec::new();
        let mut constant = Vec::new();
        for &id in &members {
            match graph.role(id)? {
                Role::Latent => latent.push(id),
                Role::Observed => observed.push(id),
                Role::Deterministic => deterministic.push(id),
                Role::Constant => constant.push(id),
            }
        }

        let member_set: BTreeSet<VertexId> = members.iter().copied().collect();
        for id in graph.ids() {
            if graph.role(id)? == Role::Observed && !member_set.contains(&id) {
                return Err(graph_error(
                    "detached-observation",
                    "observed vertex is not attached to the network",
                )
                .with_context("vertex", id)
                .with_context("name", graph.display_name(id)));
            }
        }

        let topological = topological_order(graph, &members)?;
        let position: BTreeMap<VertexId, usize> = topological
            .iter()
            .enumerate()
            .map(|(idx, id)| (*id, idx))
            .collect();

        let mut downstream = BTreeMap::new();
        for &id in &latent {
            let mut affected = deterministic_descendants(graph, id)?;
            affected.sort_by_key(|vertex| position.get(vertex).copied().unwrap_or(usize::MAX));
            downstream.insert(id, affected);
        }

        let network = Self {
            graph,
            members,
            latent,
            observed,
            deterministic,
            constant,
            topological,
            downstream,
        };
        for id in network.unconstrained_latents()? {
            warn!(
                vertex = %id,
                name = %graph.display_name(id),
                "latent vertex has no observed descendant; its posterior equals its prior"
            );
        }
        debug!(
            members = network.members.len(),
            latent = network.latent.len(),
            observed = network.observed.len(),
            deterministic = network.deterministic.len(),
            constant = network.constant.len(),
            "assembled bayesian network"
        );
        Ok(network)
    }

    /// Returns the graph the network was assembled from.
    pub fn graph(&self) -> &'g ModelGraph {
        self.graph
    }

    /// Returns every member vertex sorted by id.
    pub fn members(&self) -> &[VertexId] {
        &self.members
    }

    /// Returns the latent vertices sorted by id.
    pub fn latent_vertices(&self) -> &[VertexId] {
        &self.latent
    }

    /// Returns the observed vertices sorted by id.
    pub fn observed_vertices(&self) -> &[VertexId] {
        &self.observed
    }

    /// Returns the deterministic vertices sorted by id.
    pub fn deterministic_vertices(&self) -> &[VertexId] {
        &self.deterministic
    }

    /// Returns the constant vertices sorted by id.
    pub fn constant_vertices(&self) -> &[VertexId] {
        &self.constant
    }

    /// Returns the latent and observed vertices, the terms of the joint log probability.
    pub fn probabilistic_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.latent.iter().chain(self.observed.iter()).copied()
    }

    /// Returns all members ordered parents before children.
    pub fn topological_order(&self) -> &[VertexId] {
        &self.topological
    }

    /// Returns the deterministic members ordered parents before children.
    pub fn deterministic_order(&self) -> Vec<VertexId> {
        self.topological
            .iter()
            .copied()
            .filter(|id| matches!(self.graph.role(*id), Ok(Role::Deterministic)))
            .collect()
    }

    /// Returns the deterministic vertices whose value depends on `latent`,
    /// ordered parents before children.
    pub fn downstream_of(&self, latent: VertexId) -> &[VertexId] {
        self.downstream
            .get(&latent)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns whether `id` belongs to the network.
    pub fn contains(&self, id: VertexId) -> bool {
        self.members.binary_search(&id).is_ok()
    }

    /// Returns the latent vertices that influence no observed vertex.
    pub fn unconstrained_latents(&self) -> Result<Vec<VertexId>, CoalError> {
        let mut result = Vec::new();
        for &latent in &self.latent {
            let mut seen = BTreeSet::new();
            let mut queue: VecDeque<VertexId> = VecDeque::from([latent]);
            let mut constrained = false;
            while let Some(id) = queue.pop_front() {
                for &child in self.graph.children(id)? {
                    if self.graph.role(child)? == Role::Observed {
                        constrained = true;
                        break;
                    }
                    if seen.insert(child) {
                        queue.push_back(child);
                    }
                }
                if constrained {
                    break;
                }
            }
            if !constrained {
                result.push(latent);
            }
        }
        Ok(result)
    }
}

fn connected_component(graph: &ModelGraph, terminals: &[VertexId]) -> Result<Vec<VertexId>, CoalError> {
    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::new();
    for &terminal in terminals {
        graph.vertex(terminal)?;
        if visited.insert(terminal) {
            queue.push_back(terminal);
        }
    }
    while let Some(id) = queue.pop_front() {
        let parents = graph.parents(id)?;
        for neighbour in parents.iter().chain(graph.children(id)?.iter()) {
            if visited.insert(*neighbour) {
                queue.push_back(*neighbour);
            }
        }
    }
    Ok(visited.into_iter().collect())
}

fn deterministic_descendants(graph: &ModelGraph, latent: VertexId) -> Result<Vec<VertexId>, CoalError> {
    let mut seen = BTreeSet::new();
    let mut stack = vec![latent];
    while let Some(id) = stack.pop() {
        for &child in graph.children(id)? {
            if graph.role(child)? == Role::Deterministic && seen.insert(child) {
                stack.push(child);
            }
        }
    }
    Ok(seen.into_iter().collect())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    NotVisited,
    Visiting,
    Visited,
}

fn topological_order(graph: &ModelGraph, members: &[VertexId]) -> Result<Vec<VertexId>, CoalError> {
    let mut states: BTreeMap<VertexId, VisitState> = members
        .iter()
        .map(|id| (*id, VisitState::NotVisited))
        .collect();
    let mut order = Vec::with_capacity(members.len());
    for &id in members {
        visit(graph, id, &mut states, &mut order)?;
    }
    Ok(order)
}

// Depth-first over parent edges; a vertex is emitted after all its parents.
fn visit(
    graph: &ModelGraph,
    id: VertexId,
    states: &mut BTreeMap<VertexId, VisitState>,
    order: &mut Vec<VertexId>,
) -> Result<(), CoalError> {
    match states.get(&id).copied().unwrap_or(VisitState::NotVisited) {
        VisitState::Visited => Ok(()),
        VisitState::Visiting => Err(graph_error("cycle-detected", "graph contains a directed cycle")
            .with_context("vertex", id)
            .with_context("name", graph.display_name(id))),
        VisitState::NotVisited => {
            states.insert(id, VisitState::Visiting);
            for parent in graph.parents(id)? {
                visit(graph, parent, states, order)?;
            }
            states.insert(id, VisitState::Visited);
            order.push(id);
            Ok(())
        }
    }
}
