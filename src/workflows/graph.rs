use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use super::errors::WorkflowError;
use crate::tracker::models::{normalize_name, Status, Transition, WorkflowLayout};

#[derive(Debug, Clone)]
pub struct Vertex {
    pub id: String,
    pub status: Status,
    /// Ids of statuses reachable with one transition, in ascending order.
    pub adjacency: BTreeSet<String>,
}

/// One hop of a path: the status and the transition taken to leave it.
/// The last step of a path has no transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub status: Status,
    pub transition: Option<Transition>,
}

/// Directed graph of statuses connected by transitions.
#[derive(Debug, Clone, Default)]
pub struct WorkflowGraph {
    vertices: HashMap<String, Vertex>,
    edges: HashMap<(String, String), Transition>,
}

impl WorkflowGraph {
    /// Build the graph from statuses and layout transitions.
    ///
    /// Initial and looped transitions add no edge. A global transition
    /// without a source connects every other status to its target. When two
    /// transitions connect the same pair the first one listed is kept.
    pub fn build(statuses: &[Status], transitions: &[Transition]) -> Result<Self, WorkflowError> {
        let mut graph = WorkflowGraph::default();
        let mut names = HashSet::new();

        for status in statuses {
            if !names.insert(normalize_name(&status.name)) {
                return Err(WorkflowError::Config(format!(
                    "duplicate status name in workflow layout: {}",
                    status.name
                )));
            }
            let vertex = Vertex {
                id: status.id.clone(),
                status: status.clone(),
                adjacency: BTreeSet::new(),
            };
            if graph.vertices.insert(status.id.clone(), vertex).is_some() {
                return Err(WorkflowError::Config(format!(
                    "duplicate status id in workflow layout: {}",
                    status.id
                )));
            }
        }

        for transition in transitions {
            if transition.initial || transition.looped {
                continue;
            }
            let target = transition.target_id.as_deref().ok_or_else(|| {
                WorkflowError::Config(format!("transition '{}' has no target", transition.name))
            })?;
            graph.require(target)?;

            match transition.source_id.as_deref().filter(|s| !s.is_empty()) {
                Some(source) => {
                    graph.require(source)?;
                    graph.add_edge(source, target, transition);
                }
                None if transition.global => {
                    let sources: Vec<String> = graph
                        .vertices
                        .keys()
                        .filter(|id| id.as_str() != target)
                        .cloned()
                        .collect();
                    for source in sources {
                        graph.add_edge(&source, target, transition);
                    }
                }
                None => {
                    return Err(WorkflowError::Config(format!(
                        "transition '{}' has no source status",
                        transition.name
                    )))
                }
            }
        }

        Ok(graph)
    }

    pub fn from_layout(layout: &WorkflowLayout) -> Result<Self, WorkflowError> {
        Self::build(&layout.statuses, &layout.transitions)
    }

    fn require(&self, id: &str) -> Result<&Vertex, WorkflowError> {
        self.vertices
            .get(id)
            .ok_or_else(|| WorkflowError::NotFound(format!("status id {id}")))
    }

    fn add_edge(&mut self, source: &str, target: &str, transition: &Transition) {
        let key = (source.to_string(), target.to_string());
        if self.edges.contains_key(&key) {
            return;
        }
        self.edges.insert(key, transition.clone());
        if let Some(vertex) = self.vertices.get_mut(source) {
            vertex.adjacency.insert(target.to_string());
        }
    }

    pub fn vertex(&self, id: &str) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Transition recorded for the edge `source -> target`.
    pub fn transition(&self, source: &str, target: &str) -> Option<&Transition> {
        self.edges.get(&(source.to_string(), target.to_string()))
    }

    /// Breadth-first traversal from `from_id`.
    ///
    /// Maps every reached vertex id to the id it was first discovered from.
    /// The start vertex maps to `None`.
    pub fn bfs(&self, from_id: &str) -> HashMap<String, Option<String>> {
        let mut predecessors = HashMap::new();
        if !self.vertices.contains_key(from_id) {
            return predecessors;
        }

        let mut queue = VecDeque::from([from_id.to_string()]);
        predecessors.insert(from_id.to_string(), None);

        while let Some(current) = queue.pop_front() {
            let Some(vertex) = self.vertices.get(&current) else {
                continue;
            };
            for next in &vertex.adjacency {
                if !predecessors.contains_key(next) {
                    predecessors.insert(next.clone(), Some(current.clone()));
                    queue.push_back(next.clone());
                }
            }
        }

        predecessors
    }

    /// Shortest path, by number of transitions, from `from_id` to `to_id`.
    pub fn find_path(&self, from_id: &str, to_id: &str) -> Result<Vec<PathStep>, WorkflowError> {
        let from = self.require(from_id)?;
        let to = self.require(to_id)?;

        let predecessors = self.bfs(from_id);
        if !predecessors.contains_key(to_id) {
            return Err(WorkflowError::Unreachable {
                from: from.status.name.clone(),
                to: to.status.name.clone(),
            });
        }

        let mut path = vec![PathStep {
            status: to.status.clone(),
            transition: None,
        }];
        let mut current = to_id.to_string();
        while let Some(Some(previous)) = predecessors.get(&current) {
            let vertex = self.require(previous)?;
            path.push(PathStep {
                status: vertex.status.clone(),
                transition: self.transition(previous, &current).cloned(),
            });
            current = previous.clone();
        }
        path.reverse();

        Ok(path)
    }

    /// Vertex whose status name matches, ignoring case and surrounding whitespace.
    pub fn find_vertex_by_name(&self, name: &str) -> Result<&Vertex, WorkflowError> {
        self.vertices
            .values()
            .find(|v| v.status.is_named(name))
            .ok_or_else(|| WorkflowError::NotFound(format!("unknown status: {}", name.trim())))
    }

    /// Shortest path between two statuses given by name.
    pub fn find_path_by_name(&self, from: &str, to: &str) -> Result<Vec<PathStep>, WorkflowError> {
        let from_id = self.find_vertex_by_name(from)?.id.clone();
        let to_id = self.find_vertex_by_name(to)?.id.clone();
        self.find_path(&from_id, &to_id)
    }
}
