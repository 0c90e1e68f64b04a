//! Dependency graph between named cells.
//!
//! An edge `(s, t)` means "t depends on s": s is a dependee of t and t is a
//! dependent of s. Both directions are indexed so either side can be listed
//! without scanning. Every mutation goes through `insert_edge` and
//! `remove_edge`, which keep the two indices mirrored.
//!
//! ```text
//! edges = {(a, b), (a, c), (b, d), (d, d)}
//!     dependents(a) = {b, c}     dependees(a) = {}
//!     dependents(b) = {d}        dependees(b) = {a}
//!     dependents(c) = {}         dependees(c) = {a}
//!     dependents(d) = {d}        dependees(d) = {b, d}
//! ```

use indexmap::{IndexMap, IndexSet};

type Index = IndexMap<String, IndexSet<String>>;

#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    /// source -> cells that depend on it
    dependents: Index,
    /// target -> cells it depends on
    dependees: Index,
    size: usize,
}

impl DependencyGraph {
    pub fn new() -> DependencyGraph {
        DependencyGraph::default()
    }

    /// Number of distinct ordered pairs in the graph.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn has_dependents(&self, s: &str) -> bool {
        self.dependents.get(s).is_some_and(|set| !set.is_empty())
    }

    pub fn has_dependees(&self, s: &str) -> bool {
        self.dependees.get(s).is_some_and(|set| !set.is_empty())
    }

    pub fn num_dependees(&self, s: &str) -> usize {
        self.dependees.get(s).map_or(0, IndexSet::len)
    }

    /// Cells that depend on `s`. Empty if `s` is unknown.
    pub fn dependents<'a>(&'a self, s: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        Self::members(&self.dependents, s)
    }

    /// Cells that `s` depends on. Empty if `s` is unknown.
    pub fn dependees<'a>(&'a self, s: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        Self::members(&self.dependees, s)
    }

    /// Add `(s, t)`. No-op if the pair is already present.
    pub fn add(&mut self, s: &str, t: &str) {
        self.insert_edge(s, t);
    }

    /// Remove `(s, t)`. No-op if the pair is absent.
    pub fn remove(&mut self, s: &str, t: &str) {
        self.remove_edge(s, t);
    }

    /// Replace every `(s, r)` with `(s, t)` for each `t` in `new_dependents`.
    pub fn replace_dependents<I, S>(&mut self, s: &str, new_dependents: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let old: Vec<String> = self.dependents(s).map(str::to_string).collect();
        for r in &old {
            self.remove_edge(s, r);
        }
        for t in new_dependents {
            self.insert_edge(s, t.as_ref());
        }
    }

    /// Replace every `(r, s)` with `(t, s)` for each `t` in `new_dependees`.
    pub fn replace_dependees<I, S>(&mut self, s: &str, new_dependees: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let old: Vec<String> = self.dependees(s).map(str::to_string).collect();
        for r in &old {
            self.remove_edge(r, s);
        }
        for t in new_dependees {
            self.insert_edge(t.as_ref(), s);
        }
    }

    fn members<'a>(index: &'a Index, s: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        index
            .get(s)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    fn insert_edge(&mut self, s: &str, t: &str) -> bool {
        let added = self
            .dependents
            .entry(s.to_string())
            .or_default()
            .insert(t.to_string());
        if added {
            self.dependees
                .entry(t.to_string())
                .or_default()
                .insert(s.to_string());
            self.size += 1;
        }
        added
    }

    fn remove_edge(&mut self, s: &str, t: &str) -> bool {
        let removed = Self::unlink(&mut self.dependents, s, t);
        if removed {
            Self::unlink(&mut self.dependees, t, s);
            self.size -= 1;
        }
        removed
    }

    /// Remove `value` from `index[key]`, dropping the entry once it is empty.
    fn unlink(index: &mut Index, key: &str, value: &str) -> bool {
        let Some(set) = index.get_mut(key) else {
            return false;
        };
        let removed = set.shift_remove(value);
        if set.is_empty() {
            index.shift_remove(key);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn sorted<'a>(it: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
        let mut v: Vec<&str> = it.collect();
        v.sort();
        v
    }

    /// The two indices must describe the same set of pairs.
    fn assert_mirrored(g: &DependencyGraph) {
        let forward: HashSet<(String, String)> = g
            .dependents
            .iter()
            .flat_map(|(s, ts)| ts.iter().map(move |t| (s.clone(), t.clone())))
            .collect();
        let reverse: HashSet<(String, String)> = g
            .dependees
            .iter()
            .flat_map(|(t, ss)| ss.iter().map(move |s| (s.clone(), t.clone())))
            .collect();
        assert_eq!(forward, reverse);
        assert_eq!(forward.len(), g.len());
    }

    #[test]
    fn test_empty_graph() {
        let g = DependencyGraph::new();
        assert_eq!(g.len(), 0);
        assert!(g.is_empty());
        assert_eq!(g.dependents("a").count(), 0);
        assert_eq!(g.dependees("a").count(), 0);
        assert!(!g.has_dependents("a"));
        assert!(!g.has_dependees("a"));
        assert_eq!(g.num_dependees("a"), 0);
    }

    #[test]
    fn test_example_graph() {
        let mut g = DependencyGraph::new();
        g.add("a", "b");
        g.add("a", "c");
        g.add("b", "d");
        g.add("d", "d");
        assert_eq!(g.len(), 4);
        assert_eq!(sorted(g.dependents("a")), vec!["b", "c"]);
        assert_eq!(sorted(g.dependents("b")), vec!["d"]);
        assert_eq!(g.dependents("c").count(), 0);
        assert_eq!(sorted(g.dependents("d")), vec!["d"]);
        assert_eq!(g.dependees("a").count(), 0);
        assert_eq!(sorted(g.dependees("b")), vec!["a"]);
        assert_eq!(sorted(g.dependees("c")), vec!["a"]);
        assert_eq!(sorted(g.dependees("d")), vec!["b", "d"]);
        assert_eq!(g.num_dependees("d"), 2);
        assert_mirrored(&g);
    }

    #[test]
    fn test_duplicate_add_counts_once() {
        let mut g = DependencyGraph::new();
        g.add("x", "y");
        g.add("x", "y");
        assert_eq!(g.len(), 1);
        g.remove("x", "y");
        assert_eq!(g.len(), 0);
        g.remove("x", "y");
        assert_eq!(g.len(), 0);
        assert!(!g.has_dependents("x"));
        assert!(!g.has_dependees("y"));
    }

    #[test]
    fn test_remove_missing_pair_is_noop() {
        let mut g = DependencyGraph::new();
        g.add("a", "b");
        g.remove("b", "a");
        g.remove("a", "z");
        g.remove("q", "r");
        assert_eq!(g.len(), 1);
        assert_mirrored(&g);
    }

    #[test]
    fn test_replace_dependents() {
        let mut g = DependencyGraph::new();
        g.add("a", "b");
        g.add("a", "c");
        g.add("x", "b");
        g.replace_dependents("a", ["c", "d", "e"]);
        assert_eq!(sorted(g.dependents("a")), vec!["c", "d", "e"]);
        assert_eq!(sorted(g.dependees("b")), vec!["x"]);
        assert_eq!(g.len(), 4);
        g.replace_dependents("a", Vec::<String>::new());
        assert!(!g.has_dependents("a"));
        assert_eq!(g.len(), 1);
        assert_mirrored(&g);
    }

    #[test]
    fn test_replace_dependees() {
        let mut g = DependencyGraph::new();
        g.add("b", "a");
        g.add("c", "a");
        g.add("b", "x");
        g.replace_dependees("a", vec!["c".to_string(), "d".to_string()]);
        assert_eq!(sorted(g.dependees("a")), vec!["c", "d"]);
        assert_eq!(sorted(g.dependents("b")), vec!["x"]);
        assert_eq!(g.len(), 3);
        g.replace_dependees("new", ["a"]);
        assert_eq!(sorted(g.dependents("a")), vec!["new"]);
        assert_eq!(g.len(), 4);
        assert_mirrored(&g);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut g = DependencyGraph::new();
        for t in ["z", "m", "a"] {
            g.add("s", t);
        }
        assert_eq!(g.dependents("s").collect::<Vec<_>>(), vec!["z", "m", "a"]);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Add(u8, u8),
        Remove(u8, u8),
        ReplaceDependents(u8, Vec<u8>),
        ReplaceDependees(u8, Vec<u8>),
    }

    fn op() -> impl Strategy<Value = Op> {
        let node = 0u8..6;
        prop_oneof![
            (node.clone(), node.clone()).prop_map(|(s, t)| Op::Add(s, t)),
            (node.clone(), node.clone()).prop_map(|(s, t)| Op::Remove(s, t)),
            (node.clone(), prop::collection::vec(node.clone(), 0..4))
                .prop_map(|(s, ts)| Op::ReplaceDependents(s, ts)),
            (node.clone(), prop::collection::vec(node, 0..4))
                .prop_map(|(s, ts)| Op::ReplaceDependees(s, ts)),
        ]
    }

    proptest! {
        #[test]
        fn prop_indices_stay_mirrored(ops in prop::collection::vec(op(), 0..40)) {
            let name = |n: u8| format!("n{n}");
            let mut g = DependencyGraph::new();
            let mut model: HashSet<(String, String)> = HashSet::new();
            for op in ops {
                match op {
                    Op::Add(s, t) => {
                        g.add(&name(s), &name(t));
                        model.insert((name(s), name(t)));
                        prop_assert!(g.dependents(&name(s)).any(|d| d == name(t)));
                        prop_assert!(g.dependees(&name(t)).any(|d| d == name(s)));
                    }
                    Op::Remove(s, t) => {
                        g.remove(&name(s), &name(t));
                        model.remove(&(name(s), name(t)));
                        prop_assert!(!g.dependents(&name(s)).any(|d| d == name(t)));
                        prop_assert!(!g.dependees(&name(t)).any(|d| d == name(s)));
                    }
                    Op::ReplaceDependents(s, ts) => {
                        let targets: Vec<String> = ts.iter().map(|t| name(*t)).collect();
                        g.replace_dependents(&name(s), &targets);
                        model.retain(|(a, _)| *a != name(s));
                        model.extend(targets.iter().map(|t| (name(s), t.clone())));
                    }
                    Op::ReplaceDependees(s, ts) => {
                        let sources: Vec<String> = ts.iter().map(|t| name(*t)).collect();
                        g.replace_dependees(&name(s), &sources);
                        model.retain(|(_, b)| *b != name(s));
                        model.extend(sources.iter().map(|t| (t.clone(), name(s))));
                    }
                }
                assert_mirrored(&g);
                prop_assert_eq!(g.len(), model.len());
            }
        }
    }
}
