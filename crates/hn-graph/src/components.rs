//! Connected components over index-based edge lists.

/// Union-find with path halving and union by size.
#[derive(Debug, Clone)]
struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        let (big, small) = if self.size[ra] >= self.size[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[small] = big;
        self.size[big] += self.size[small];
    }
}

/// Partition `0..node_count` into connected components.
///
/// Members of each component are ascending and components are ordered by
/// their smallest member. Edges referring to indices `>= node_count` are
/// ignored.
pub fn connected_components<I>(node_count: usize, edges: I) -> Vec<Vec<usize>>
where
    I: IntoIterator<Item = (usize, usize)>,
{
    let mut set = DisjointSet::new(node_count);
    for (a, b) in edges {
        if a < node_count && b < node_count {
            set.union(a, b);
        }
    }

    let mut root_slot: Vec<Option<usize>> = vec![None; node_count];
    let mut components: Vec<Vec<usize>> = Vec::new();
    for node in 0..node_count {
        let root = set.find(node);
        match root_slot[root] {
            Some(slot) => components[slot].push(node),
            None => {
                root_slot[root] = Some(components.len());
                components.push(vec![node]);
            }
        }
    }
    components
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_graph_has_no_components() {
        assert!(connected_components(0, Vec::new()).is_empty());
    }

    #[test]
    fn isolated_nodes_are_singletons() {
        let comps = connected_components(3, Vec::new());
        assert_eq!(comps, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn two_trees_joined_by_one_edge() {
        // 0-1-2 and 3-4, then 2-3
        let mut edges = vec![(0, 1), (1, 2), (3, 4)];
        assert_eq!(connected_components(5, edges.clone()).len(), 2);
        edges.push((2, 3));
        assert_eq!(connected_components(5, edges), vec![vec![0, 1, 2, 3, 4]]);
    }

    #[test]
    fn out_of_range_edges_ignored() {
        let comps = connected_components(2, vec![(0, 7)]);
        assert_eq!(comps.len(), 2);
    }
}
