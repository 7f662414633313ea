use md5::{Digest, Md5};
use std::collections::{BTreeMap, BTreeSet};

use crate::cluster::types::NodeId;

/// Position of a ring point or key on the ring: the MD5 digest of its label
/// read as a big-endian 128-bit integer.
pub fn ring_hash(label: &str) -> u128 {
    let digest = Md5::digest(label.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);
    u128::from_be_bytes(bytes)
}

/// Consistent hash ring with `replicas` virtual points per node.
///
/// Lookup returns the node owning the smallest point `>= hash(key)`,
/// wrapping to the smallest point on the ring. Two points landing on the
/// same hash are not deduplicated: the later insertion owns the position.
#[derive(Debug, Clone)]
pub struct HashRing {
    points: BTreeMap<u128, NodeId>,
    replicas: usize,
}

impl HashRing {
    pub fn new(replicas: usize) -> Self {
        Self {
            points: BTreeMap::new(),
            replicas,
        }
    }

    /// Builds the ring for a static membership. Every process calling this
    /// with the same nodes and replica count derives the same ring.
    pub fn build<'a, I>(nodes: I, replicas: usize) -> Self
    where
        I: IntoIterator<Item = &'a NodeId>,
    {
        let mut ring = Self::new(replicas);
        for node in nodes {
            ring.add_node(node);
        }
        ring
    }

    fn point_label(node: &NodeId, replica: usize) -> String {
        format!("{}:{}", node, replica)
    }

    pub(crate) fn insert_point(&mut self, hash: u128, node: NodeId) {
        self.points.insert(hash, node);
    }

    pub fn add_node(&mut self, node: &NodeId) {
        for replica in 0..self.replicas {
            let hash = ring_hash(&Self::point_label(node, replica));
            self.insert_point(hash, node.clone());
        }
    }

    /// Removes the node's virtual points and returns how many were dropped.
    /// A point that was overwritten by another node's colliding replica
    /// belongs to that node and stays.
    pub fn remove_node(&mut self, node: &NodeId) -> usize {
        let mut removed = 0;
        for replica in 0..self.replicas {
            let hash = ring_hash(&Self::point_label(node, replica));
            if self.points.get(&hash) == Some(node) {
                self.points.remove(&hash);
                removed += 1;
            }
        }
        removed
    }

    pub fn locate(&self, key: &str) -> Option<&NodeId> {
        self.locate_hash(ring_hash(key))
    }

    pub(crate) fn locate_hash(&self, hash: u128) -> Option<&NodeId> {
        self.points
            .range(hash..)
            .next()
            .or_else(|| self.points.iter().next())
            .map(|(_, node)| node)
    }

    pub fn replicas(&self) -> usize {
        self.replicas
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        self.points.values().any(|owner| owner == node)
    }

    pub fn nodes(&self) -> BTreeSet<&NodeId> {
        self.points.values().collect()
    }

    pub fn points_of(&self, node: &NodeId) -> usize {
        self.points.values().filter(|owner| *owner == node).count()
    }

    pub fn points(&self) -> impl Iterator<Item = (u128, &NodeId)> {
        self.points.iter().map(|(hash, node)| (*hash, node))
    }
}
