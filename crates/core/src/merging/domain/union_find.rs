use std::collections::HashMap;

/// Disjoint-set forest over the indices `0..len`.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Root of `i`, halving the path on the way up.
    pub fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    /// Joins the sets containing `a` and `b`. Returns `false` when they
    /// already shared a root.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        self.parent[ra] = rb;
        true
    }

    /// Partition of all indices. Members keep ascending order and groups are
    /// ordered by their smallest member.
    pub fn into_groups(mut self) -> Vec<Vec<usize>> {
        let mut by_root: HashMap<usize, Vec<usize>> = HashMap::new();
        for i in 0..self.parent.len() {
            let root = self.find(i);
            by_root.entry(root).or_default().push(i);
        }

        let mut groups: Vec<Vec<usize>> = by_root.into_values().collect();
        groups.sort_by_key(|g| g[0]);
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_is_transitive() {
        let mut uf = UnionFind::new(3);
        uf.union(0, 1);
        uf.union(1, 2);
        assert_eq!(uf.find(0), uf.find(2));
    }

    #[test]
    fn test_separate_sets_stay_apart() {
        let mut uf = UnionFind::new(4);
        uf.union(0, 1);
        uf.union(2, 3);
        assert_ne!(uf.find(0), uf.find(2));
    }

    #[test]
    fn test_union_reports_new_links_only() {
        let mut uf = UnionFind::new(2);
        assert!(uf.union(0, 1));
        assert!(!uf.union(1, 0));
    }

    #[test]
    fn test_groups_ordered_by_smallest_member() {
        let mut uf = UnionFind::new(5);
        uf.union(4, 1);
        uf.union(3, 0);
        let groups = uf.into_groups();
        assert_eq!(groups, vec![vec![0, 3], vec![1, 4], vec![2]]);
    }

    #[test]
    fn test_empty_forest() {
        let uf = UnionFind::new(0);
        assert!(uf.is_empty());
        assert!(uf.into_groups().is_empty());
    }
}
