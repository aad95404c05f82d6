// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task dependency graph
//!
//! Vertices are task names; an edge `dep -> dependent` exists for every
//! declared dependency. All orderings break ties by config declaration
//! order, which keeps runs reproducible across processes.

use indexmap::{IndexMap, IndexSet};
use nexus_core::Task;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("task {from} depends on undeclared task {to}")]
    UndeclaredDep { from: String, to: String },
    #[error("dependency cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
    #[error("unknown task: {0}")]
    UnknownTask(String),
}

/// Directed acyclic graph over task names.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// node -> successors (dependents), in insertion order
    succ: IndexMap<String, IndexSet<String>>,
    /// node -> predecessors (dependencies), in insertion order
    pred: IndexMap<String, IndexSet<String>>,
}

impl Graph {
    /// Build from tasks in declaration order. Duplicate edges coalesce;
    /// self-loops and longer cycles are rejected.
    pub fn build<'a, I>(tasks: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let tasks: Vec<&Task> = tasks.into_iter().collect();
        let mut graph = Graph::default();
        for task in &tasks {
            graph.succ.entry(task.name.clone()).or_default();
            graph.pred.entry(task.name.clone()).or_default();
        }
        for task in &tasks {
            for dep in &task.deps {
                if !graph.succ.contains_key(dep) {
                    return Err(GraphError::UndeclaredDep {
                        from: task.name.clone(),
                        to: dep.clone(),
                    });
                }
                graph.add_edge(dep, &task.name);
            }
        }
        if let Some(cycle) = graph.detect_cycle() {
            return Err(GraphError::Cycle(cycle));
        }
        Ok(graph)
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        if let Some(successors) = self.succ.get_mut(from) {
            successors.insert(to.to_string());
        }
        if let Some(predecessors) = self.pred.get_mut(to) {
            predecessors.insert(from.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.succ.is_empty()
    }

    pub fn len(&self) -> usize {
        self.succ.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.succ.contains_key(name)
    }

    /// Node names in insertion order.
    pub fn nodes(&self) -> Vec<&str> {
        self.succ.keys().map(String::as_str).collect()
    }

    /// Direct predecessors of a node, in insertion order.
    pub fn preds(&self, name: &str) -> Vec<&str> {
        self.pred
            .get(name)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Find a cycle, returned as a closed chain like `[x, y, x]`, or None.
    pub fn detect_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            White,
            Gray,
            Black,
        }

        let mut marks: IndexMap<&str, Mark> = self
            .succ
            .keys()
            .map(|name| (name.as_str(), Mark::White))
            .collect();

        // Iterative DFS carrying the current path for cycle extraction.
        for start in self.succ.keys() {
            if marks[start.as_str()] != Mark::White {
                continue;
            }
            let mut path: Vec<&str> = Vec::new();
            let mut stack: Vec<(&str, usize)> = vec![(start.as_str(), 0)];
            while let Some((node, next_child)) = stack.pop() {
                if next_child == 0 {
                    marks[node] = Mark::Gray;
                    path.push(node);
                }
                let children = &self.succ[node];
                if let Some(child) = children.get_index(next_child) {
                    stack.push((node, next_child + 1));
                    match marks[child.as_str()] {
                        Mark::White => stack.push((child.as_str(), 0)),
                        Mark::Gray => {
                            // Close the chain from the first occurrence.
                            let from = path
                                .iter()
                                .position(|n| *n == child.as_str())
                                .unwrap_or(0);
                            let mut cycle: Vec<String> =
                                path[from..].iter().map(|s| s.to_string()).collect();
                            cycle.push(child.to_string());
                            return Some(cycle);
                        }
                        Mark::Black => {}
                    }
                } else {
                    marks[node] = Mark::Black;
                    path.pop();
                }
            }
        }
        None
    }

    /// Kahn's algorithm; ready nodes are taken in insertion order.
    pub fn topological_sort(&self) -> Vec<String> {
        let mut in_degree: IndexMap<&str, usize> = self
            .pred
            .iter()
            .map(|(name, preds)| (name.as_str(), preds.len()))
            .collect();
        let mut order = Vec::with_capacity(self.len());

        while order.len() < self.len() {
            let Some(next) = in_degree
                .iter()
                .find(|(_, degree)| **degree == 0)
                .map(|(name, _)| *name)
            else {
                break; // unreachable for acyclic graphs
            };
            in_degree.shift_remove(next);
            order.push(next.to_string());
            for successor in &self.succ[next] {
                if let Some(degree) = in_degree.get_mut(successor.as_str()) {
                    *degree -= 1;
                }
            }
        }
        order
    }

    /// Wave decomposition: phase 0 is every node with no remaining
    /// in-edges; remove them and repeat. Order within a phase is insertion
    /// order.
    pub fn execution_phases(&self) -> Vec<Vec<String>> {
        let mut in_degree: IndexMap<&str, usize> = self
            .pred
            .iter()
            .map(|(name, preds)| (name.as_str(), preds.len()))
            .collect();
        let mut phases = Vec::new();

        while !in_degree.is_empty() {
            let wave: Vec<&str> = in_degree
                .iter()
                .filter(|(_, degree)| **degree == 0)
                .map(|(name, _)| *name)
                .collect();
            if wave.is_empty() {
                break; // unreachable for acyclic graphs
            }
            for name in &wave {
                in_degree.shift_remove(*name);
                for successor in &self.succ[*name] {
                    if let Some(degree) = in_degree.get_mut(successor.as_str()) {
                        *degree -= 1;
                    }
                }
            }
            phases.push(wave.into_iter().map(|s| s.to_string()).collect());
        }
        phases
    }

    /// Transitive predecessors of a node, sorted for determinism.
    pub fn dependencies(&self, name: &str) -> Vec<String> {
        let mut seen: IndexSet<&str> = IndexSet::new();
        let mut frontier: Vec<&str> = self.preds(name);
        while let Some(node) = frontier.pop() {
            if seen.insert(node) {
                frontier.extend(self.preds(node));
            }
        }
        let mut deps: Vec<String> = seen.into_iter().map(|s| s.to_string()).collect();
        deps.sort();
        deps
    }

    /// Smallest sub-graph containing `requested` and all transitive deps,
    /// preserving insertion order and phase structure.
    pub fn select_with_deps(&self, requested: &[String]) -> Result<Graph, GraphError> {
        for name in requested {
            if !self.contains(name) {
                return Err(GraphError::UnknownTask(name.clone()));
            }
        }
        let mut keep: IndexSet<&str> = IndexSet::new();
        for name in requested {
            keep.insert(name.as_str());
            for dep in self.dependencies(name) {
                if let Some((key, _)) = self.succ.get_key_value(&dep) {
                    keep.insert(key.as_str());
                }
            }
        }

        let mut sub = Graph::default();
        // Original insertion order, filtered.
        for name in self.succ.keys() {
            if keep.contains(name.as_str()) {
                sub.succ.entry(name.clone()).or_default();
                sub.pred.entry(name.clone()).or_default();
            }
        }
        for (from, successors) in &self.succ {
            if !keep.contains(from.as_str()) {
                continue;
            }
            for to in successors {
                if keep.contains(to.as_str()) {
                    sub.add_edge(from, to);
                }
            }
        }
        Ok(sub)
    }
}

#[cfg(test)]
#[path = "dag_tests.rs"]
mod tests;
