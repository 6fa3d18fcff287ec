/// Step graph: step identifiers interned into dense indices, with
/// index-based adjacency for traversal.

use rustc_hash::FxHashMap;

use crate::core::validate::ValidationError;
use crate::schema::step::{Edge, Step};

/// A directed graph over step identifiers.
///
/// Identifiers are mapped to indices once; every traversal works on
/// indices and explicit stacks, so deep graphs never recurse.
#[derive(Debug, Clone, Default)]
pub struct StepGraph<'a> {
    ids: Vec<&'a str>,
    index: FxHashMap<&'a str, usize>,
    successors: Vec<Vec<usize>>,
    in_degree: Vec<usize>,
}

impl<'a> StepGraph<'a> {
    /// Build a graph whose nodes are `steps`, in input order.
    ///
    /// Step identifiers must be unique and every edge must name known steps.
    pub fn from_steps(steps: &'a [Step], edges: &'a [Edge]) -> Result<Self, ValidationError> {
        let mut graph = StepGraph::default();
        for step in steps {
            if graph.index.contains_key(step.id.as_str()) {
                return Err(ValidationError::DuplicateStep(step.id.clone()));
            }
            graph.add_node(&step.id);
        }
        for edge in edges {
            let before = graph
                .position(&edge.before)
                .ok_or_else(|| ValidationError::UnknownStep(edge.before.clone()))?;
            let after = graph
                .position(&edge.after)
                .ok_or_else(|| ValidationError::UnknownStep(edge.after.clone()))?;
            graph.add_edge(before, after);
        }
        Ok(graph)
    }

    /// Build a graph from edges alone. Nodes appear in the order they are
    /// first named by an edge; steps with no edges are not part of it.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = &'a Edge>,
    {
        let mut graph = StepGraph::default();
        for edge in edges {
            let before = graph.add_node(&edge.before);
            let after = graph.add_node(&edge.after);
            graph.add_edge(before, after);
        }
        graph
    }

    fn add_node(&mut self, id: &'a str) -> usize {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.ids.len();
        self.ids.push(id);
        self.index.insert(id, idx);
        self.successors.push(Vec::new());
        self.in_degree.push(0);
        idx
    }

    // Parallel edges collapse into one.
    fn add_edge(&mut self, from: usize, to: usize) {
        if !self.successors[from].contains(&to) {
            self.successors[from].push(to);
            self.in_degree[to] += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn id(&self, idx: usize) -> &'a str {
        self.ids[idx]
    }

    pub fn successors(&self, idx: usize) -> &[usize] {
        &self.successors[idx]
    }

    pub fn in_degree(&self, idx: usize) -> usize {
        self.in_degree[idx]
    }

    /// Nodes nothing points to.
    pub fn starting_nodes(&self) -> Vec<usize> {
        (0..self.len()).filter(|&i| self.in_degree[i] == 0).collect()
    }

    /// Depth-first search for a back edge. Returns the node the back edge
    /// points to, which lies on the cycle.
    ///
    /// Roots are tried in node order, so for a graph built from steps the
    /// reported node is where the first search from the earliest step
    /// closes a cycle: the root itself when the root is on the cycle.
    pub fn find_cycle(&self) -> Option<usize> {
        let n = self.len();
        let mut visited = vec![false; n];
        let mut on_stack = vec![false; n];

        for root in 0..n {
            if visited[root] {
                continue;
            }
            visited[root] = true;
            on_stack[root] = true;
            // (node, next successor to look at)
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];

            while let Some(frame) = stack.last_mut() {
                let (node, cursor) = *frame;
                match self.successors[node].get(cursor) {
                    Some(&next) => {
                        frame.1 += 1;
                        if on_stack[next] {
                            return Some(next);
                        }
                        if !visited[next] {
                            visited[next] = true;
                            on_stack[next] = true;
                            stack.push((next, 0));
                        }
                    }
                    None => {
                        on_stack[node] = false;
                        stack.pop();
                    }
                }
            }
        }
        None
    }

    /// All simple paths leaving `start` with between 2 and `max_nodes`
    /// nodes, in depth-first discovery order.
    pub fn simple_paths_from(&self, start: usize, max_nodes: usize) -> Vec<Vec<usize>> {
        let mut paths = Vec::new();
        if max_nodes < 2 {
            return paths;
        }

        let mut on_path = vec![false; self.len()];
        on_path[start] = true;
        let mut path = vec![start];
        let mut cursors = vec![0usize];

        while let Some(cursor) = cursors.last_mut() {
            let node = path[path.len() - 1];
            match self.successors[node].get(*cursor) {
                Some(&next) => {
                    *cursor += 1;
                    if on_path[next] {
                        continue;
                    }
                    path.push(next);
                    paths.push(path.clone());
                    if path.len() < max_nodes {
                        on_path[next] = true;
                        cursors.push(0);
                    } else {
                        path.pop();
                    }
                }
                None => {
                    cursors.pop();
                    if let Some(done) = path.pop() {
                        on_path[done] = false;
                    }
                }
            }
        }
        paths
    }
}
