//! Binary split tree of tiles
//!
//! A [`Mosaic`] is an immutable value: every operation returns a new tree
//! and leaves the receiver untouched. Requests that cannot be honoured
//! (unknown tile, invalid path, duplicate leaf) return an unchanged copy
//! instead of failing, so the layout can always be rendered.

use std::collections::HashSet;

use log::debug;

use super::id::TileId;

/// Ratio given to both children of a fresh split
pub const DEFAULT_RATIO: f64 = 50.0;
/// Smallest ratio a split may hold
pub const RATIO_MIN: f64 = 0.01;
/// Largest ratio a split may hold
pub const RATIO_MAX: f64 = 99.99;

/// How the two children of a split share their area
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Side by side, `first` on the left
    Row,
    /// Stacked, `first` on top
    Column,
}

impl Direction {
    pub fn flipped(self) -> Self {
        match self {
            Direction::Row => Direction::Column,
            Direction::Column => Direction::Row,
        }
    }
}

/// One step of a path from the root towards a leaf
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Branch {
    First,
    Second,
}

impl Branch {
    pub fn other(self) -> Self {
        match self {
            Branch::First => Branch::Second,
            Branch::Second => Branch::First,
        }
    }
}

pub type MosaicPath = Vec<Branch>;

#[derive(Clone, Debug, PartialEq)]
pub enum MosaicNode {
    Leaf(TileId),
    Split {
        direction: Direction,
        first: Box<MosaicNode>,
        second: Box<MosaicNode>,
        /// Share of the area given to `first`, in percent
        split_ratio: f64,
    },
}

impl MosaicNode {
    pub fn split(direction: Direction, first: MosaicNode, second: MosaicNode) -> Self {
        MosaicNode::Split {
            direction,
            first: Box::new(first),
            second: Box::new(second),
            split_ratio: DEFAULT_RATIO,
        }
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a TileId>) {
        match self {
            MosaicNode::Leaf(id) => out.push(id),
            MosaicNode::Split { first, second, .. } => {
                first.collect_leaves(out);
                second.collect_leaves(out);
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            MosaicNode::Leaf(_) => 0,
            MosaicNode::Split { first, second, .. } => 1 + first.depth().max(second.depth()),
        }
    }

    fn find_path(&self, target: &TileId, path: &mut MosaicPath) -> bool {
        match self {
            MosaicNode::Leaf(id) => id == target,
            MosaicNode::Split { first, second, .. } => {
                path.push(Branch::First);
                if first.find_path(target, path) {
                    return true;
                }
                path.pop();
                path.push(Branch::Second);
                if second.find_path(target, path) {
                    return true;
                }
                path.pop();
                false
            }
        }
    }

    fn node_at(&self, path: &[Branch]) -> Option<&MosaicNode> {
        match path.split_first() {
            None => Some(self),
            Some((branch, rest)) => match self {
                MosaicNode::Leaf(_) => None,
                MosaicNode::Split { first, second, .. } => match branch {
                    Branch::First => first.node_at(rest),
                    Branch::Second => second.node_at(rest),
                },
            },
        }
    }

    /// Copy with leaves `a` and `b` trading places
    fn swapped(&self, a: &TileId, b: &TileId) -> MosaicNode {
        match self {
            MosaicNode::Leaf(id) if id == a => MosaicNode::Leaf(b.clone()),
            MosaicNode::Leaf(id) if id == b => MosaicNode::Leaf(a.clone()),
            MosaicNode::Leaf(id) => MosaicNode::Leaf(id.clone()),
            MosaicNode::Split {
                direction,
                first,
                second,
                split_ratio,
            } => MosaicNode::Split {
                direction: *direction,
                first: Box::new(first.swapped(a, b)),
                second: Box::new(second.swapped(a, b)),
                split_ratio: *split_ratio,
            },
        }
    }

    /// Rebuild with the node at `path` passed through `edit`; `None` if the path is invalid
    fn edit_at(
        &self,
        path: &[Branch],
        edit: &mut dyn FnMut(&MosaicNode) -> Option<MosaicNode>,
    ) -> Option<MosaicNode> {
        match path.split_first() {
            None => edit(self),
            Some((branch, rest)) => match self {
                MosaicNode::Leaf(_) => None,
                MosaicNode::Split {
                    direction,
                    first,
                    second,
                    split_ratio,
                } => {
                    let (first, second) = match branch {
                        Branch::First => (first.edit_at(rest, edit)?, (**second).clone()),
                        Branch::Second => ((**first).clone(), second.edit_at(rest, edit)?),
                    };
                    Some(MosaicNode::Split {
                        direction: *direction,
                        first: Box::new(first),
                        second: Box::new(second),
                        split_ratio: *split_ratio,
                    })
                }
            },
        }
    }
}

/// The whole layout: possibly empty
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Mosaic {
    root: Option<MosaicNode>,
}

impl Mosaic {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap an externally built node, rejecting it if a leaf id repeats
    pub fn from_root(root: MosaicNode) -> Option<Self> {
        let mosaic = Self { root: Some(root) };
        if mosaic.has_unique_leaves() {
            Some(mosaic)
        } else {
            None
        }
    }

    /// Balanced tree over `ids` in order; depth is ⌈log2 n⌉.
    ///
    /// Directions alternate by depth starting with [`Direction::Row`]. Repeated
    /// ids are dropped after their first occurrence.
    pub fn balanced(ids: &[TileId]) -> Self {
        let mut seen = HashSet::new();
        let unique = ids
            .iter()
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect::<Vec<_>>();
        if unique.len() != ids.len() {
            debug!("Dropped {} duplicate seed ids", ids.len() - unique.len());
        }
        Self {
            root: build_balanced(&unique, Direction::Row),
        }
    }

    pub fn root(&self) -> Option<&MosaicNode> {
        self.root.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Leaf ids in traversal order (first before second)
    pub fn leaves(&self) -> Vec<TileId> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            root.collect_leaves(&mut out);
        }
        out.into_iter().cloned().collect()
    }

    pub fn leaf_count(&self) -> usize {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            root.collect_leaves(&mut out);
        }
        out.len()
    }

    pub fn contains(&self, id: &TileId) -> bool {
        self.find_path(id).is_some()
    }

    /// Number of splits on the longest root-to-leaf path; 0 for a single leaf or empty tree
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, MosaicNode::depth)
    }

    fn has_unique_leaves(&self) -> bool {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            root.collect_leaves(&mut out);
        }
        let mut seen = HashSet::new();
        out.into_iter().all(|id| seen.insert(id))
    }

    /// Path from the root to the leaf holding `id`, searching `first` before `second`
    pub fn find_path(&self, id: &TileId) -> Option<MosaicPath> {
        let root = self.root.as_ref()?;
        let mut path = Vec::new();
        if root.find_path(id, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    pub fn node_at(&self, path: &[Branch]) -> Option<&MosaicNode> {
        self.root.as_ref()?.node_at(path)
    }

    /// Ratio of the split addressed by `path`
    pub fn ratio_at(&self, path: &[Branch]) -> Option<f64> {
        match self.node_at(path)? {
            MosaicNode::Split { split_ratio, .. } => Some(*split_ratio),
            MosaicNode::Leaf(_) => None,
        }
    }

    /// Replace the leaf `target` with a split holding `target` then `new_id`
    pub fn split(&self, target: &TileId, new_id: TileId, direction: Direction) -> Mosaic {
        if self.contains(&new_id) {
            debug!("Split rejected: {} already in layout", new_id);
            return self.clone();
        }
        let Some(path) = self.find_path(target) else {
            debug!("Split rejected: {} not in layout", target);
            return self.clone();
        };
        let node = MosaicNode::Split {
            direction,
            first: Box::new(MosaicNode::Leaf(target.clone())),
            second: Box::new(MosaicNode::Leaf(new_id)),
            split_ratio: DEFAULT_RATIO,
        };
        self.replace_subtree_at(&path, node)
    }

    /// Drop the leaf `target`; its sibling takes the parent's place
    pub fn remove(&self, target: &TileId) -> Mosaic {
        let Some(path) = self.find_path(target) else {
            debug!("Remove ignored: {} not in layout", target);
            return self.clone();
        };
        let Some((last, parent)) = path.split_last() else {
            return Mosaic::empty();
        };
        let mut sibling_path = parent.to_vec();
        sibling_path.push(last.other());
        match self.node_at(&sibling_path) {
            Some(sibling) => self.replace_subtree_at(parent, sibling.clone()),
            None => self.clone(),
        }
    }

    /// Set the ratio of the split at `path`, clamped into [`RATIO_MIN`, `RATIO_MAX`]
    pub fn set_ratio(&self, path: &[Branch], ratio: f64) -> Mosaic {
        if !ratio.is_finite() {
            debug!("Ignoring non-finite ratio {}", ratio);
            return self.clone();
        }
        let ratio = clamp_ratio(ratio);
        self.edit(path, &mut |node| match node {
            MosaicNode::Split {
                direction,
                first,
                second,
                ..
            } => Some(MosaicNode::Split {
                direction: *direction,
                first: first.clone(),
                second: second.clone(),
                split_ratio: ratio,
            }),
            MosaicNode::Leaf(_) => None,
        })
    }

    /// Put `node` at `path`. Rejected if the path is invalid or leaf ids would repeat.
    pub fn replace_subtree_at(&self, path: &[Branch], node: MosaicNode) -> Mosaic {
        if self.root.is_none() {
            if path.is_empty() {
                return Mosaic::from_root(node).unwrap_or_default();
            }
            return self.clone();
        }
        let mut replacement = Some(node);
        let candidate = self.edit(path, &mut |_| replacement.take());
        if candidate.has_unique_leaves() {
            candidate
        } else {
            debug!("Replace rejected: duplicate leaf ids");
            self.clone()
        }
    }

    /// Grow the branch along `path` so it receives `percentage` at every split on the way
    pub fn expand(&self, path: &[Branch], percentage: f64) -> Mosaic {
        if !percentage.is_finite() {
            return self.clone();
        }
        let mut mosaic = self.clone();
        for depth in 0..path.len() {
            let ratio = match path[depth] {
                Branch::First => percentage,
                Branch::Second => 100.0 - percentage,
            };
            mosaic = mosaic.set_ratio(&path[..depth], ratio);
        }
        mosaic
    }

    /// Exchange the positions of two leaves; a no-op unless both are present
    pub fn swap_leaves(&self, a: &TileId, b: &TileId) -> Mosaic {
        if a == b || !self.contains(a) || !self.contains(b) {
            return self.clone();
        }
        Mosaic {
            root: self.root.as_ref().map(|root| root.swapped(a, b)),
        }
    }

    /// Adopt a layout produced elsewhere (e.g. a validated drag-and-drop result)
    pub fn replace_with(&self, other: Mosaic) -> Mosaic {
        if other.has_unique_leaves() {
            other
        } else {
            debug!("Rejected external layout with duplicate leaves");
            self.clone()
        }
    }

    fn edit(
        &self,
        path: &[Branch],
        edit: &mut dyn FnMut(&MosaicNode) -> Option<MosaicNode>,
    ) -> Mosaic {
        let Some(root) = &self.root else {
            return self.clone();
        };
        match root.edit_at(path, edit) {
            Some(root) => Mosaic { root: Some(root) },
            None => {
                debug!("Invalid mosaic path {:?}", path);
                self.clone()
            }
        }
    }
}

pub fn clamp_ratio(ratio: f64) -> f64 {
    ratio.clamp(RATIO_MIN, RATIO_MAX)
}

fn build_balanced(ids: &[TileId], direction: Direction) -> Option<MosaicNode> {
    match ids.len() {
        0 => None,
        1 => Some(MosaicNode::Leaf(ids[0].clone())),
        n => {
            let mid = (n + 1) / 2;
            let first = build_balanced(&ids[..mid], direction.flipped())?;
            let second = build_balanced(&ids[mid..], direction.flipped())?;
            Some(MosaicNode::split(direction, first, second))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<TileId> {
        names.iter().map(|n| TileId::from(*n)).collect()
    }

    fn sorted_leaves(m: &Mosaic) -> Vec<TileId> {
        let mut leaves = m.leaves();
        leaves.sort();
        leaves
    }

    fn ceil_log2(n: usize) -> usize {
        let mut depth = 0;
        while (1usize << depth) < n {
            depth += 1;
        }
        depth
    }

    #[test]
    fn test_balanced_tree_shape() {
        for n in 0..=17 {
            let names = (0..n).map(|i| TileId::new(format!("t{}", i))).collect::<Vec<_>>();
            let m = Mosaic::balanced(&names);
            assert_eq!(m.leaves(), names, "leaf order for n={}", n);
            assert!(m.depth() <= ceil_log2(n), "depth for n={}", n);
        }
        assert!(Mosaic::balanced(&[]).is_empty());
    }

    #[test]
    fn test_balanced_four_alternates_direction() {
        let m = Mosaic::balanced(&ids(&["a", "b", "c", "d"]));
        match m.root().unwrap() {
            MosaicNode::Split {
                direction,
                first,
                split_ratio,
                ..
            } => {
                assert_eq!(*direction, Direction::Row);
                assert_eq!(*split_ratio, DEFAULT_RATIO);
                assert!(matches!(
                    **first,
                    MosaicNode::Split {
                        direction: Direction::Column,
                        ..
                    }
                ));
            }
            MosaicNode::Leaf(_) => panic!("expected a split"),
        }
    }

    #[test]
    fn test_balanced_drops_duplicates() {
        let m = Mosaic::balanced(&ids(&["a", "b", "a"]));
        assert_eq!(m.leaves(), ids(&["a", "b"]));
    }

    #[test]
    fn test_find_path() {
        let m = Mosaic::balanced(&ids(&["a", "b", "c", "d"]));
        assert_eq!(m.find_path(&"a".into()), Some(vec![Branch::First, Branch::First]));
        assert_eq!(m.find_path(&"d".into()), Some(vec![Branch::Second, Branch::Second]));
        assert_eq!(m.find_path(&"z".into()), None);
        assert_eq!(Mosaic::empty().find_path(&"a".into()), None);
    }

    #[test]
    fn test_replace_round_trip() {
        let m = Mosaic::balanced(&ids(&["a", "b", "c", "d"]));
        let path = m.find_path(&"c".into()).unwrap();
        let node = MosaicNode::split(
            Direction::Column,
            MosaicNode::Leaf("x".into()),
            MosaicNode::Leaf("y".into()),
        );
        let replaced = m.replace_subtree_at(&path, node);
        let mut x_path = path.clone();
        x_path.push(Branch::First);
        let mut y_path = path.clone();
        y_path.push(Branch::Second);
        assert_eq!(replaced.find_path(&"x".into()), Some(x_path));
        assert_eq!(replaced.find_path(&"y".into()), Some(y_path));
        assert!(!replaced.contains(&"c".into()));
    }

    #[test]
    fn test_replace_rejects_duplicates_and_bad_paths() {
        let m = Mosaic::balanced(&ids(&["a", "b", "c", "d"]));
        let dup = m.replace_subtree_at(&[Branch::First, Branch::First], MosaicNode::Leaf("d".into()));
        assert_eq!(dup, m);
        let bad = m.replace_subtree_at(
            &[Branch::First, Branch::First, Branch::First],
            MosaicNode::Leaf("z".into()),
        );
        assert_eq!(bad, m);
        let seeded = Mosaic::empty().replace_subtree_at(&[], MosaicNode::Leaf("z".into()));
        assert_eq!(seeded.leaves(), ids(&["z"]));
    }

    #[test]
    fn test_split_then_remove_restores_leaves() {
        let m = Mosaic::balanced(&ids(&["a", "b", "c"]));
        for target in m.leaves() {
            let split = m.split(&target, "new-1".into(), Direction::Row);
            assert_eq!(split.leaf_count(), 4);
            let path = split.find_path(&target).unwrap();
            let parent = &path[..path.len() - 1];
            assert!(matches!(
                split.node_at(parent),
                Some(MosaicNode::Split {
                    direction: Direction::Row,
                    split_ratio,
                    ..
                }) if *split_ratio == DEFAULT_RATIO
            ));
            let restored = split.remove(&"new-1".into());
            assert_eq!(sorted_leaves(&restored), sorted_leaves(&m));
            assert_eq!(restored, m);
        }
    }

    #[test]
    fn test_split_noops() {
        let m = Mosaic::balanced(&ids(&["a", "b"]));
        assert_eq!(m.split(&"z".into(), "new-1".into(), Direction::Row), m);
        assert_eq!(m.split(&"a".into(), "b".into(), Direction::Row), m);
        assert!(Mosaic::empty()
            .split(&"a".into(), "new-1".into(), Direction::Column)
            .is_empty());
    }

    #[test]
    fn test_remove() {
        let single = Mosaic::balanced(&ids(&["a"]));
        assert!(single.remove(&"a".into()).is_empty());

        let m = Mosaic::balanced(&ids(&["a", "b", "c", "d"]));
        assert_eq!(m.remove(&"nope".into()), m);

        let removed = m.remove(&"b".into());
        assert_eq!(removed.leaves(), ids(&["a", "c", "d"]));
        // sibling "a" takes the place of the former [a|b] split
        assert_eq!(removed.find_path(&"a".into()), Some(vec![Branch::First]));

        let mut all = m.clone();
        for id in m.leaves() {
            all = all.remove(&id);
        }
        assert!(all.is_empty());
    }

    #[test]
    fn test_set_ratio_clamps() {
        let m = Mosaic::balanced(&ids(&["a", "b"]));
        assert_eq!(m.set_ratio(&[], 150.0).ratio_at(&[]), Some(RATIO_MAX));
        assert_eq!(m.set_ratio(&[], -5.0).ratio_at(&[]), Some(RATIO_MIN));
        assert_eq!(m.set_ratio(&[], 30.0).ratio_at(&[]), Some(30.0));
        assert_eq!(m.set_ratio(&[], f64::NAN), m);
        // a leaf has no ratio
        assert_eq!(m.set_ratio(&[Branch::First], 30.0), m);
    }

    #[test]
    fn test_expand() {
        let m = Mosaic::balanced(&ids(&["a", "b", "c", "d"]));
        let path = m.find_path(&"c".into()).unwrap();
        let expanded = m.expand(&path, 100.0);
        assert_eq!(expanded.ratio_at(&[]), Some(RATIO_MIN));
        assert_eq!(expanded.ratio_at(&[Branch::Second]), Some(RATIO_MAX));
        assert_eq!(expanded.ratio_at(&[Branch::First]), Some(DEFAULT_RATIO));
        assert_eq!(expanded.leaves(), m.leaves());
    }

    #[test]
    fn test_operations_do_not_alias() {
        let m = Mosaic::balanced(&ids(&["a", "b"]));
        let snapshot = m.clone();
        let _ = m.set_ratio(&[], 10.0).remove(&"a".into());
        assert_eq!(m, snapshot);
    }

    #[test]
    fn test_swap_leaves() {
        let m = Mosaic::balanced(&ids(&["a", "b", "c"])).set_ratio(&[], 70.0);
        let swapped = m.swap_leaves(&"a".into(), &"c".into());
        assert_eq!(swapped.leaves(), ids(&["c", "b", "a"]));
        assert_eq!(swapped.ratio_at(&[]), Some(70.0));
        assert_eq!(m.swap_leaves(&"a".into(), &"zz".into()), m);
    }

    #[test]
    fn test_replace_with_validates() {
        let m = Mosaic::balanced(&ids(&["a", "b"]));
        let bad = Mosaic {
            root: Some(MosaicNode::split(
                Direction::Row,
                MosaicNode::Leaf("a".into()),
                MosaicNode::Leaf("a".into()),
            )),
        };
        assert_eq!(m.replace_with(bad), m);
        let good = Mosaic::balanced(&ids(&["b", "a"]));
        assert_eq!(m.replace_with(good.clone()), good);
        assert!(Mosaic::from_root(MosaicNode::Leaf("q".into())).is_some());
    }
}
