//! Coupling graphs, fidelities, shortest paths and Steiner trees.

use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::{DeviceError, DeviceResult};

/// JSON descriptor for a physical device.
///
/// `couplings` accepts either a list of directed `[i, j]` pairs or a full
/// boolean adjacency matrix. Missing fidelities default to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub name: String,
    pub qubits: usize,
    pub couplings: Couplings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_qubit_fidelity: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub two_qubit_fidelity: Option<Vec<Vec<f64>>>,
}

/// The two accepted coupling encodings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Couplings {
    /// Directed edge list.
    Pairs(Vec<[usize; 2]>),
    /// Boolean adjacency matrix.
    Matrix(Vec<Vec<bool>>),
}

/// A physical device: coupling graph plus fidelities.
///
/// Couplings are directed; an undirected device simply lists both
/// directions. All-pairs shortest paths (Floyd–Warshall over cost
/// `1 − fidelity`, symmetrised) are computed lazily on first use and
/// memoised for the lifetime of the device.
pub struct Device {
    name: String,
    num_qubits: usize,
    graph: DiGraph<(), f64>,
    sq_fidelity: Vec<f64>,
    paths: OnceLock<PathTables>,
}

struct PathTables {
    dist: Vec<Vec<f64>>,
    /// `next[i][j]` is the next hop from `i` toward `j`; `num_qubits` means
    /// unreachable.
    next: Vec<Vec<usize>>,
}

impl Device {
    /// Create a device with unit fidelities from a directed edge list.
    pub fn new(
        name: impl Into<String>,
        num_qubits: usize,
        couplings: &[(usize, usize)],
    ) -> Self {
        let mut graph = DiGraph::new();
        for _ in 0..num_qubits {
            graph.add_node(());
        }
        let mut device = Device {
            name: name.into(),
            num_qubits,
            graph,
            sq_fidelity: vec![1.0; num_qubits],
            paths: OnceLock::new(),
        };
        for &(i, j) in couplings {
            device.add_coupling(i, j, 1.0);
        }
        device
    }

    fn add_coupling(&mut self, i: usize, j: usize, fidelity: f64) {
        let (a, b) = (NodeIndex::new(i), NodeIndex::new(j));
        if self.graph.find_edge(a, b).is_none() {
            self.graph.add_edge(a, b, fidelity);
        }
    }

    /// Load a device from its JSON descriptor.
    pub fn from_json(json: &str) -> DeviceResult<Self> {
        let descriptor: DeviceDescriptor = serde_json::from_str(json)?;
        Self::from_descriptor(&descriptor)
    }

    /// Build a device from a parsed descriptor, validating its invariants.
    pub fn from_descriptor(descriptor: &DeviceDescriptor) -> DeviceResult<Self> {
        let n = descriptor.qubits;
        let mut edges: Vec<(usize, usize)> = vec![];

        match &descriptor.couplings {
            Couplings::Pairs(pairs) => {
                for &[i, j] in pairs {
                    if i >= n || j >= n {
                        return Err(DeviceError::BadDescriptor(format!(
                            "coupling [{i}, {j}] out of range for {n} qubits"
                        )));
                    }
                    if i == j {
                        return Err(DeviceError::BadDescriptor(format!(
                            "self-coupling on qubit {i}"
                        )));
                    }
                    edges.push((i, j));
                }
            }
            Couplings::Matrix(matrix) => {
                if matrix.len() != n || matrix.iter().any(|row| row.len() != n) {
                    return Err(DeviceError::BadDescriptor(format!(
                        "adjacency matrix is not {n}x{n}"
                    )));
                }
                for (i, row) in matrix.iter().enumerate() {
                    for (j, &coupled) in row.iter().enumerate() {
                        if coupled {
                            if i == j {
                                return Err(DeviceError::BadDescriptor(format!(
                                    "self-coupling on qubit {i}"
                                )));
                            }
                            edges.push((i, j));
                        }
                    }
                }
            }
        }

        let mut device = Self::new(descriptor.name.clone(), n, &edges);

        if let Some(sq) = &descriptor.single_qubit_fidelity {
            if sq.len() != n {
                return Err(DeviceError::BadDescriptor(format!(
                    "expected {n} single-qubit fidelities, got {}",
                    sq.len()
                )));
            }
            if sq.iter().any(|f| !(0.0..=1.0).contains(f)) {
                return Err(DeviceError::BadDescriptor(
                    "single-qubit fidelity outside [0, 1]".into(),
                ));
            }
            device.sq_fidelity = sq.clone();
        }

        if let Some(tq) = &descriptor.two_qubit_fidelity {
            if tq.len() != n || tq.iter().any(|row| row.len() != n) {
                return Err(DeviceError::BadDescriptor(format!(
                    "two-qubit fidelity matrix is not {n}x{n}"
                )));
            }
            for &(i, j) in &edges {
                let f = tq[i][j];
                if !(0.0..=1.0).contains(&f) {
                    return Err(DeviceError::BadDescriptor(format!(
                        "two-qubit fidelity {f} outside [0, 1]"
                    )));
                }
                let edge = device
                    .graph
                    .find_edge(NodeIndex::new(i), NodeIndex::new(j))
                    .expect("edge was just inserted");
                device.graph[edge] = f;
            }
        }

        Ok(device)
    }

    /// Device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of physical qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Check whether `i → j` is a coupling of the device.
    pub fn coupled(&self, i: usize, j: usize) -> bool {
        i < self.num_qubits
            && j < self.num_qubits
            && self
                .graph
                .find_edge(NodeIndex::new(i), NodeIndex::new(j))
                .is_some()
    }

    /// Check whether `i` and `j` are coupled in either direction.
    pub fn coupled_either(&self, i: usize, j: usize) -> bool {
        self.coupled(i, j) || self.coupled(j, i)
    }

    /// Single-qubit fidelity.
    pub fn sq_fidelity(&self, i: usize) -> DeviceResult<f64> {
        self.sq_fidelity
            .get(i)
            .copied()
            .ok_or(DeviceError::OutOfRange {
                qubit: i,
                size: self.num_qubits,
            })
    }

    /// Two-qubit fidelity of the coupling `i → j`.
    pub fn tq_fidelity(&self, i: usize, j: usize) -> DeviceResult<f64> {
        if i >= self.num_qubits || j >= self.num_qubits {
            return Err(DeviceError::OutOfRange {
                qubit: i.max(j),
                size: self.num_qubits,
            });
        }
        self.graph
            .find_edge(NodeIndex::new(i), NodeIndex::new(j))
            .map(|edge| self.graph[edge])
            .ok_or(DeviceError::NotCoupled(i, j))
    }

    /// All couplings sorted by decreasing fidelity (index order on ties).
    pub fn couplings(&self) -> Vec<(usize, usize, f64)> {
        let mut out: Vec<(usize, usize, f64)> = self
            .graph
            .edge_indices()
            .map(|edge| {
                let (a, b) = self.graph.edge_endpoints(edge).expect("edge exists");
                (a.index(), b.index(), self.graph[edge])
            })
            .collect();
        out.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| (a.0, a.1).cmp(&(b.0, b.1)))
        });
        out
    }

    fn tables(&self) -> &PathTables {
        self.paths.get_or_init(|| self.compute_tables(0))
    }

    /// Floyd–Warshall over the subgraph of vertices `>= min_vertex`.
    ///
    /// Edge cost is `1 − fidelity`, symmetrised over the two directions; the
    /// direction of the underlying coupling is recovered at materialisation
    /// time by the mappers.
    fn compute_tables(&self, min_vertex: usize) -> PathTables {
        let n = self.num_qubits;
        let mut dist = vec![vec![f64::INFINITY; n]; n];
        let mut next = vec![vec![n; n]; n];

        for i in min_vertex..n {
            for j in min_vertex..n {
                if i == j {
                    dist[i][j] = 0.0;
                    next[i][j] = j;
                } else if self.coupled(i, j) || self.coupled(j, i) {
                    let forward = self.tq_fidelity(i, j).unwrap_or(0.0);
                    let backward = self.tq_fidelity(j, i).unwrap_or(0.0);
                    dist[i][j] = 1.0 - forward.max(backward);
                    next[i][j] = j;
                }
            }
        }

        for k in min_vertex..n {
            for i in min_vertex..n {
                for j in min_vertex..n {
                    if dist[i][k] + dist[k][j] < dist[i][j] {
                        dist[i][j] = dist[i][k] + dist[k][j];
                        next[i][j] = next[i][k];
                    }
                }
            }
        }

        PathTables { dist, next }
    }

    /// Shortest-path distance between two qubits.
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.tables().dist[i][j]
    }

    /// Shortest path from `i` to `j`, inclusive of both endpoints.
    ///
    /// Returns `None` when the qubits are disconnected.
    pub fn shortest_path(&self, i: usize, j: usize) -> Option<Vec<usize>> {
        Self::walk_path(self.tables(), self.num_qubits, i, j)
    }

    fn walk_path(tables: &PathTables, sentinel: usize, i: usize, j: usize) -> Option<Vec<usize>> {
        if i == j {
            return Some(vec![i]);
        }
        if tables.next[i][j] == sentinel {
            return None;
        }
        let mut path = vec![i];
        let mut current = i;
        while current != j {
            current = tables.next[current][j];
            path.push(current);
        }
        Some(path)
    }

    /// Approximate minimal Steiner tree spanning `terminals`, rooted at
    /// `root`.
    ///
    /// Returns directed edges `(parent, child)` in add-order from the root,
    /// so forward traversal visits parents before children and reverse
    /// traversal visits leaves first.
    pub fn steiner(&self, terminals: &[usize], root: usize) -> DeviceResult<Vec<(usize, usize)>> {
        self.steiner_in(terminals, root, 0)
    }

    /// [`Device::steiner`] restricted to the induced subgraph on vertices
    /// `>= min_vertex`. Used by elimination procedures that must not touch
    /// already-processed rows.
    pub fn steiner_in(
        &self,
        terminals: &[usize],
        root: usize,
        min_vertex: usize,
    ) -> DeviceResult<Vec<(usize, usize)>> {
        if root >= self.num_qubits {
            return Err(DeviceError::OutOfRange {
                qubit: root,
                size: self.num_qubits,
            });
        }
        let restricted;
        let tables = if min_vertex == 0 {
            self.tables()
        } else {
            restricted = self.compute_tables(min_vertex);
            &restricted
        };

        let mut tree: Vec<(usize, usize)> = vec![];
        let mut in_tree: FxHashSet<usize> = FxHashSet::default();
        in_tree.insert(root);

        let mut remaining: Vec<usize> = terminals
            .iter()
            .copied()
            .filter(|&t| t != root)
            .collect::<FxHashSet<_>>()
            .into_iter()
            .collect();
        remaining.sort_unstable();

        for &t in &remaining {
            if t >= self.num_qubits {
                return Err(DeviceError::OutOfRange {
                    qubit: t,
                    size: self.num_qubits,
                });
            }
            if tables.dist[root][t].is_infinite() {
                return Err(DeviceError::Disconnected(root, t));
            }
        }

        let mut cost: Vec<f64> = (0..self.num_qubits)
            .map(|v| tables.dist[root][v])
            .collect();
        let mut via: Vec<usize> = vec![root; self.num_qubits];

        while !remaining.is_empty() {
            // Closest remaining terminal to the current tree.
            let (pos, &u) = remaining
                .iter()
                .enumerate()
                .min_by(|&(_, &a), &(_, &b)| {
                    cost[a]
                        .partial_cmp(&cost[b])
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(a.cmp(&b))
                })
                .expect("remaining is non-empty");
            remaining.swap_remove(pos);

            let path = Self::walk_path(tables, self.num_qubits, via[u], u)
                .ok_or(DeviceError::Disconnected(via[u], u))?;
            let added = add_to_tree(&mut tree, &path, &in_tree);
            in_tree.extend(added.iter().copied());

            for &t in &remaining {
                for &v in &added {
                    if tables.dist[v][t] < cost[t] {
                        cost[t] = tables.dist[v][t];
                        via[t] = v;
                    }
                }
            }
        }

        Ok(tree)
    }

    // =========================================================================
    // Factory devices
    // =========================================================================

    /// Linear chain `0 - 1 - … - (n-1)`.
    pub fn line(n: usize) -> Self {
        let edges: Vec<(usize, usize)> = (0..n.saturating_sub(1))
            .flat_map(|i| [(i, i + 1), (i + 1, i)])
            .collect();
        Self::new(format!("line-{n}"), n, &edges)
    }

    /// Ring of `n` qubits.
    pub fn ring(n: usize) -> Self {
        let edges: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| {
                let j = (i + 1) % n;
                [(i, j), (j, i)]
            })
            .collect();
        Self::new(format!("ring-{n}"), n, &edges)
    }

    /// Rectangular grid in row-major order.
    pub fn grid(rows: usize, cols: usize) -> Self {
        let mut edges = vec![];
        for r in 0..rows {
            for c in 0..cols {
                let v = r * cols + c;
                if c + 1 < cols {
                    edges.push((v, v + 1));
                    edges.push((v + 1, v));
                }
                if r + 1 < rows {
                    edges.push((v, v + cols));
                    edges.push((v + cols, v));
                }
            }
        }
        Self::new(format!("grid-{rows}x{cols}"), rows * cols, &edges)
    }

    /// Fully connected device.
    pub fn full(n: usize) -> Self {
        let mut edges = vec![];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    edges.push((i, j));
                }
            }
        }
        Self::new(format!("full-{n}"), n, &edges)
    }

    /// The 8-qubit Rigetti ring with published fidelities.
    pub fn rigetti_8q() -> Self {
        let sq = vec![0.957, 0.951, 0.982, 0.970, 0.969, 0.962, 0.969, 0.932];
        let tq = [
            (0, 1, 0.92),
            (1, 0, 0.91),
            (1, 2, 0.91),
            (2, 1, 0.82),
            (2, 3, 0.82),
            (3, 2, 0.87),
            (3, 4, 0.87),
            (4, 3, 0.67),
            (4, 5, 0.67),
            (5, 4, 0.93),
            (5, 6, 0.93),
            (6, 5, 0.93),
            (6, 7, 0.93),
            (7, 6, 0.91),
            (7, 0, 0.91),
            (0, 7, 0.92),
        ];
        let mut device = Self::new("Rigetti 8Q", 8, &[]);
        device.sq_fidelity = sq;
        for (i, j, f) in tq {
            device.add_coupling(i, j, f);
        }
        device
    }

    /// A 9-qubit square lattice with unit fidelities.
    pub fn square_9q() -> Self {
        let mut device = Self::grid(3, 3);
        device.name = "9 qubit square lattice".into();
        device
    }
}

/// Splice a shortest path into a spanning tree, keeping the edge list in
/// topological (add) order. Returns the nodes newly reached, walking back
/// from the path's endpoint until an existing tree node is hit.
fn add_to_tree(
    tree: &mut Vec<(usize, usize)>,
    path: &[usize],
    in_tree: &FxHashSet<usize>,
) -> Vec<usize> {
    let mut added = vec![];
    let insert_at = tree.len();
    let mut next: Option<usize> = None;

    for &v in path.iter().rev() {
        if let Some(n) = next {
            // Inserting at a fixed index keeps parent edges before the child
            // edges spliced earlier in this walk.
            tree.insert(insert_at, (v, n));
        }
        next = Some(v);
        added.push(v);
        if in_tree.contains(&v) {
            break;
        }
    }

    added
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_adjacency() {
        let device = Device::line(5);
        assert!(device.coupled(0, 1));
        assert!(device.coupled(1, 0));
        assert!(!device.coupled(0, 2));
        assert_eq!(device.num_qubits(), 5);
    }

    #[test]
    fn test_shortest_path_on_line() {
        let device = Device::line(5);
        assert_eq!(device.shortest_path(0, 4).unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(device.shortest_path(2, 2).unwrap(), vec![2]);
    }

    #[test]
    fn test_disconnected_path() {
        let device = Device::new("split", 4, &[(0, 1), (1, 0), (2, 3), (3, 2)]);
        assert!(device.shortest_path(0, 3).is_none());
    }

    #[test]
    fn test_fidelity_weighted_path() {
        // Two routes from 0 to 3; the longer one has much better fidelity.
        let mut device = Device::new("weighted", 5, &[]);
        device.add_coupling(0, 1, 0.5);
        device.add_coupling(1, 3, 0.5);
        device.add_coupling(0, 2, 0.99);
        device.add_coupling(2, 4, 0.99);
        device.add_coupling(4, 3, 0.99);
        assert_eq!(device.shortest_path(0, 3).unwrap(), vec![0, 2, 4, 3]);
    }

    #[test]
    fn test_couplings_sorted_by_fidelity() {
        let device = Device::rigetti_8q();
        let couplings = device.couplings();
        for window in couplings.windows(2) {
            assert!(window[0].2 >= window[1].2);
        }
        assert_eq!(couplings.len(), 16);
    }

    #[test]
    fn test_steiner_spans_terminals() {
        let device = Device::square_9q();
        let tree = device.steiner(&[2, 6], 0).unwrap();

        // Every terminal is reachable from the root through tree edges.
        let mut reached: FxHashSet<usize> = FxHashSet::default();
        reached.insert(0);
        for &(parent, child) in &tree {
            assert!(reached.contains(&parent), "edge order must be topological");
            assert!(device.coupled_either(parent, child));
            reached.insert(child);
        }
        assert!(reached.contains(&2));
        assert!(reached.contains(&6));
    }

    #[test]
    fn test_steiner_restricted_avoids_low_vertices() {
        let device = Device::square_9q();
        let tree = device.steiner_in(&[5, 7], 4, 3).unwrap();
        for &(parent, child) in &tree {
            assert!(parent >= 3 && child >= 3, "tree must stay in the subgraph");
        }
    }

    #[test]
    fn test_descriptor_pairs() {
        let json = r#"{
            "name": "toy",
            "qubits": 3,
            "couplings": [[0, 1], [1, 0], [1, 2], [2, 1]],
            "single_qubit_fidelity": [0.99, 0.98, 0.97]
        }"#;
        let device = Device::from_json(json).unwrap();
        assert_eq!(device.name(), "toy");
        assert!(device.coupled(1, 2));
        assert!((device.sq_fidelity(1).unwrap() - 0.98).abs() < 1e-12);
    }

    #[test]
    fn test_descriptor_matrix() {
        let json = r#"{
            "name": "toy",
            "qubits": 2,
            "couplings": [[false, true], [true, false]]
        }"#;
        let device = Device::from_json(json).unwrap();
        assert!(device.coupled(0, 1));
        assert!((device.tq_fidelity(0, 1).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_descriptor_rejects_self_coupling() {
        let json = r#"{"name": "bad", "qubits": 2, "couplings": [[0, 0]]}"#;
        assert!(matches!(
            Device::from_json(json),
            Err(DeviceError::BadDescriptor(_))
        ));
    }

    #[test]
    fn test_descriptor_rejects_out_of_range() {
        let json = r#"{"name": "bad", "qubits": 2, "couplings": [[0, 5]]}"#;
        assert!(Device::from_json(json).is_err());
    }
}
