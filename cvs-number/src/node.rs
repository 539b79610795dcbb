//! Interning of revision numbers and assembly of the trunk/branch
//! linkage over the interned set.
//!
//! Every number seen while reading a master file is interned to a
//! [`Node`]; once reading is complete, [`NodeStore::build_branches`]
//! sorts the nodes and stitches successor, sibling and child-branch
//! links by pairing adjacent numbers.

use std::collections::HashMap;

use derive_more::{Display, From, Into};

use crate::CvsNumber;

/// Handle to an interned node.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
pub struct NodeId(usize);

/// Opaque handle to a caller-side delta record (a version or a patch);
/// the store only keeps it to detect duplicate bindings.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, From, Into)]
pub struct DeltaId(usize);

#[derive(Debug)]
pub struct Node {
    pub number: CvsNumber,
    pub version: Option<DeltaId>,
    pub patch: Option<DeltaId>,

    /// Successor revision on the same line of development.
    pub next: Option<NodeId>,
    /// Neighbor on the same branch: the predecessor on the trunk, the
    /// successor on a branch.
    pub to: Option<NodeId>,
    /// First child branch forking off this revision.
    pub down: Option<NodeId>,
    /// Next sibling branch under the same fork point.
    pub sib: Option<NodeId>,
    /// Set on the first revision of a branch.
    pub starts: bool,
}

impl Node {
    fn new(number: CvsNumber) -> Self {
        Self {
            number,
            version: None,
            patch: None,
            next: None,
            to: None,
            down: None,
            sib: None,
            starts: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: Vec<Node>,
    index: HashMap<CvsNumber, NodeId>,
    head_node: Option<NodeId>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// The trunk tip, once [`build_branches`](Self::build_branches) has
    /// run.
    pub fn head_node(&self) -> Option<NodeId> {
        self.head_node
    }

    /// Returns the unique node for a number, creating it if absent.
    /// Interning always keys on the normalized form, so `1.2.0.3` and
    /// `1.2.3` share a node.
    pub fn intern(&mut self, number: &CvsNumber) -> NodeId {
        let key = number.normalize();
        if let Some(&id) = self.index.get(&key) {
            return id;
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(key.clone()));
        self.index.insert(key, id);
        id
    }

    /// Looks up the node for the number shortened by `depth` components,
    /// without creating it.
    pub fn find_parent(&self, number: &CvsNumber, depth: usize) -> Option<NodeId> {
        self.index
            .get(&number.normalize().prefix(depth)?)
            .copied()
    }

    /// Interns a version's number and binds the version to it. Duplicate
    /// bindings keep the first and are reported; so are versions with
    /// odd-depth numbers, which name branches rather than revisions.
    pub fn hash_version(&mut self, number: &CvsNumber, version: DeltaId) -> NodeId {
        let id = self.intern(number);
        let node = &mut self.nodes[id.0];
        if node.version.is_some() {
            log::warn!("more than one delta with number {}", node.number);
        } else {
            node.version = Some(version);
        }
        if node.number.is_branch() {
            log::warn!("revision with odd depth ({})", node.number);
        }
        id
    }

    /// Interns a patch's number and binds the patch to it, with the same
    /// duplicate and odd-depth reporting as [`hash_version`](Self::hash_version).
    pub fn hash_patch(&mut self, number: &CvsNumber, patch: DeltaId) -> NodeId {
        let id = self.intern(number);
        let node = &mut self.nodes[id.0];
        if node.patch.is_some() {
            log::warn!("more than one delta with number {}", node.number);
        } else {
            node.patch = Some(patch);
        }
        if node.number.is_branch() {
            log::warn!("patch with odd depth ({})", node.number);
        }
        id
    }

    /// Interns a branch number.
    pub fn hash_branch(&mut self, number: &CvsNumber) -> NodeId {
        self.intern(number)
    }

    /// Identifies the trunk head and builds all branch links.
    ///
    /// Nodes are sorted by (depth, components); adjacent pairs are then
    /// examined from the top of the order downward to stitch trunk and
    /// in-branch successor links, and a second pass splices every branch
    /// start into its fork point's child list.
    pub fn build_branches(&mut self) {
        if self.nodes.is_empty() {
            return;
        }

        let mut order: Vec<NodeId> = (0..self.nodes.len()).map(NodeId).collect();
        order.sort_by(|a, b| self.nodes[a.0].number.cmp(&self.nodes[b.0].number));

        // Only a trunk? Then the largest two-component number is the tip.
        let last = order[order.len() - 1];
        if self.nodes[last.0].number.depth() == 2 {
            self.head_node = Some(last);
        }

        for i in (0..order.len() - 1).rev() {
            self.try_pair(order[i], order[i + 1]);
        }

        for i in (0..order.len()).rev() {
            let a = order[i];
            if !self.nodes[a.0].starts {
                continue;
            }
            let number = self.nodes[a.0].number.clone();
            match self.find_parent(&number, 2) {
                Some(p) => {
                    self.nodes[a.0].sib = self.nodes[p.0].down;
                    self.nodes[p.0].down = Some(a);
                }
                None => log::warn!("no parent for {}", number),
            }
        }
    }

    fn try_pair(&mut self, a: NodeId, b: NodeId) {
        let n = self.nodes[a.0].number.depth();

        if n == self.nodes[b.0].number.depth() {
            if n == 2 {
                // Adjacent trunk revisions.
                self.nodes[a.0].next = Some(b);
                self.nodes[b.0].to = Some(a);
                return;
            }
            if self.nodes[a.0].number.components()[..n - 1]
                == self.nodes[b.0].number.components()[..n - 1]
            {
                // Adjacent revisions on the same branch.
                self.nodes[a.0].next = Some(b);
                self.nodes[a.0].to = Some(b);
                return;
            }
        } else if n == 2 {
            self.head_node = Some(a);
        }

        if !self.nodes[b.0].number.is_branch() {
            self.nodes[b.0].starts = true;
            // If the branch number itself was interned, lead it into
            // its first revision.
            let number = self.nodes[b.0].number.clone();
            if let Some(p) = self.find_parent(&number, 1) {
                self.nodes[p.0].next = Some(b);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_intern_normalizes() {
        let mut store = NodeStore::new();
        let a = store.intern(&num("1.2.0.3"));
        let b = store.intern(&num("1.2.3"));
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
        assert_eq!(store.node(a).number, num("1.2.3"));
    }

    #[test]
    fn test_duplicate_version_keeps_first() {
        let mut store = NodeStore::new();
        let id = store.hash_version(&num("1.1"), DeltaId::from(7));
        store.hash_version(&num("1.1"), DeltaId::from(8));
        assert_eq!(store.node(id).version, Some(DeltaId::from(7)));
    }

    #[test]
    fn test_find_parent() {
        let mut store = NodeStore::new();
        store.intern(&num("1.2"));
        store.intern(&num("1.2.2"));
        let n = num("1.2.2.1");

        assert_eq!(
            store.find_parent(&n, 1),
            Some(store.intern(&num("1.2.2")))
        );
        assert_eq!(store.find_parent(&n, 2), Some(store.intern(&num("1.2"))));
        assert_eq!(store.find_parent(&n, 3), None);
    }

    #[test]
    fn test_build_trunk_only() {
        let mut store = NodeStore::new();
        let r11 = store.intern(&num("1.1"));
        let r12 = store.intern(&num("1.2"));
        let r13 = store.intern(&num("1.3"));
        store.build_branches();

        assert_eq!(store.head_node(), Some(r13));
        assert_eq!(store.node(r11).next, Some(r12));
        assert_eq!(store.node(r12).next, Some(r13));
        assert_eq!(store.node(r13).to, Some(r12));
        assert_eq!(store.node(r12).to, Some(r11));
    }

    #[test]
    fn test_build_branches() {
        let mut store = NodeStore::new();
        let r11 = store.intern(&num("1.1"));
        let r12 = store.intern(&num("1.2"));
        let r13 = store.intern(&num("1.3"));
        let b122 = store.hash_branch(&num("1.2.0.2"));
        let b1221 = store.intern(&num("1.2.2.1"));
        let b1222 = store.intern(&num("1.2.2.2"));
        store.build_branches();

        // Trunk tip found even though deeper numbers sort after it.
        assert_eq!(store.head_node(), Some(r13));

        // Trunk chain.
        assert_eq!(store.node(r11).next, Some(r12));
        assert_eq!(store.node(r12).next, Some(r13));

        // Branch chain: successor links run forward on the branch.
        assert_eq!(store.node(b1221).next, Some(b1222));
        assert_eq!(store.node(b1221).to, Some(b1222));

        // The branch node leads into the branch's first revision.
        assert_eq!(store.node(b122).next, Some(b1221));

        // First branch revision is a start, spliced under 1.2.
        assert!(store.node(b1221).starts);
        assert_eq!(store.node(r12).down, Some(b1221));
        assert_eq!(store.node(b1221).sib, None);
    }

    #[test]
    fn test_sibling_branches() {
        let mut store = NodeStore::new();
        let r11 = store.intern(&num("1.1"));
        let b1121 = store.intern(&num("1.1.2.1"));
        let b1141 = store.intern(&num("1.1.4.1"));
        store.build_branches();

        // Later-numbered branch is spliced first in the second pass, so
        // the earlier branch heads the child list.
        assert_eq!(store.node(r11).down, Some(b1121));
        assert_eq!(store.node(b1121).sib, Some(b1141));
        assert_eq!(store.node(b1141).sib, None);
    }

    fn num(s: &str) -> CvsNumber {
        CvsNumber::from_str(s).unwrap()
    }
}
