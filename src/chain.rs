//! Doubly-linked bucket chains stored in a node arena.
//!
//! Every entry of a [`HashMap`](crate::HashMap) lives in one [`Arena`] owned
//! by the map. A [`Chain`] is a lightweight `(head, len)` handle threading a
//! doubly-linked list through that arena by [`NodeId`]. Nodes never hold
//! references to each other, so splicing a node out is plain index
//! bookkeeping.
//!
//! Chains are unordered. [`Chain::push`] links new nodes at the head, so when
//! a key occurs more than once the most recent node is found first.

use alloc::vec::Vec;
use core::borrow::Borrow;
use core::fmt::Debug;
use core::ops::Index;
use core::ops::IndexMut;

/// Handle to a node slot in an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the slot inside the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A key/value entry linked into a [`Chain`].
#[derive(Debug, Clone)]
pub struct Node<K, V> {
    key: K,
    value: V,
    hash: u32,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

impl<K, V> Node<K, V> {
    /// The entry's key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The entry's value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Mutable access to the entry's value.
    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// The hash the entry was placed with.
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// The node closer to the head, `None` for the head itself.
    pub fn prev(&self) -> Option<NodeId> {
        self.prev
    }

    /// The node further from the head, `None` for the tail.
    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    /// Consumes the node, returning its key and value.
    pub fn into_entry(self) -> (K, V) {
        (self.key, self.value)
    }
}

#[derive(Debug, Clone)]
enum Slot<K, V> {
    Occupied(Node<K, V>),
    Vacant { next_free: Option<NodeId> },
}

/// Owner of every node of every chain in a map.
///
/// Freed slots are kept on an intrusive free list and reused by later
/// allocations.
#[derive(Clone)]
pub struct Arena<K, V> {
    slots: Vec<Slot<K, V>>,
    free: Option<NodeId>,
    len: usize,
}

impl<K, V> Debug for Arena<K, V>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Arena")
            .field("len", &self.len)
            .field("slots", &self.slots.len())
            .field("free", &self.free)
            .finish()
    }
}

impl<K, V> Default for Arena<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Arena<K, V> {
    /// Creates an empty arena.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: None,
            len: 0,
        }
    }

    /// Creates an empty arena with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: None,
            len: 0,
        }
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the arena holds no live nodes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the node behind `id`, or `None` if the slot is vacant or out of
    /// range.
    pub fn get(&self, id: NodeId) -> Option<&Node<K, V>> {
        match self.slots.get(id.0) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<K, V>> {
        match self.slots.get_mut(id.0) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    /// Drops every node and forgets the free list.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free = None;
        self.len = 0;
    }

    fn alloc(&mut self, node: Node<K, V>) -> NodeId {
        self.len += 1;
        match self.free {
            Some(id) => {
                let slot = core::mem::replace(&mut self.slots[id.0], Slot::Occupied(node));
                match slot {
                    Slot::Vacant { next_free } => self.free = next_free,
                    Slot::Occupied(_) => unreachable!("free list points at a live node"),
                }
                id
            }
            None => {
                self.slots.push(Slot::Occupied(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Frees the slot behind `id` and returns its node. Links held by other
    /// nodes are left untouched.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not refer to a live node.
    pub fn take(&mut self, id: NodeId) -> Node<K, V> {
        let vacant = Slot::Vacant {
            next_free: self.free,
        };
        match core::mem::replace(&mut self.slots[id.0], vacant) {
            Slot::Occupied(node) => {
                self.free = Some(id);
                self.len -= 1;
                node
            }
            Slot::Vacant { next_free } => {
                self.slots[id.0] = Slot::Vacant { next_free };
                panic!("node {id:?} is not live")
            }
        }
    }
}

impl<K, V> Index<NodeId> for Arena<K, V> {
    type Output = Node<K, V>;

    fn index(&self, id: NodeId) -> &Node<K, V> {
        match &self.slots[id.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("node {id:?} is not live"),
        }
    }
}

impl<K, V> IndexMut<NodeId> for Arena<K, V> {
    fn index_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        match &mut self.slots[id.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("node {id:?} is not live"),
        }
    }
}

/// A doubly-linked list of nodes sharing one bucket.
///
/// `len == 0` exactly when `head` is `None`; following `next` from the head
/// `len` times reaches the end, and the head's `prev` is always `None`.
///
/// A chain only stores handles. Every operation takes the [`Arena`] the nodes
/// live in, and mixing arenas is a logic error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chain {
    head: Option<NodeId>,
    len: usize,
}

impl Chain {
    /// Creates an empty chain.
    pub const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    /// Number of nodes in the chain.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the chain has no nodes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The first node, if any.
    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    /// The last node, found by walking the chain.
    pub fn tail<K, V>(&self, arena: &Arena<K, V>) -> Option<NodeId> {
        let mut cursor = self.head?;
        while let Some(next) = arena[cursor].next {
            cursor = next;
        }
        Some(cursor)
    }

    /// Finds the first node whose key equals `key`.
    pub fn find_node<K, V, Q>(&self, arena: &Arena<K, V>, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.iter(arena)
            .find(|(_, node)| node.key.borrow() == key)
            .map(|(id, _)| id)
    }

    /// Finds the first node whose value equals `value`.
    pub fn find_node_by_value<K, V>(&self, arena: &Arena<K, V>, value: &V) -> Option<NodeId>
    where
        V: PartialEq,
    {
        self.iter(arena)
            .find(|(_, node)| node.value == *value)
            .map(|(id, _)| id)
    }

    /// Allocates a node in `arena` and links it as the new head.
    pub fn push<K, V>(&mut self, arena: &mut Arena<K, V>, hash: u32, key: K, value: V) -> NodeId {
        let id = arena.alloc(Node {
            key,
            value,
            hash,
            prev: None,
            next: self.head,
        });
        if let Some(old_head) = self.head {
            arena[old_head].prev = Some(id);
        }
        self.head = Some(id);
        self.len += 1;
        id
    }

    /// Removes the first node whose key equals `key`, returning its entry.
    pub fn remove<K, V, Q>(&mut self, arena: &mut Arena<K, V>, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let id = self.find_node(arena, key)?;
        Some(self.unlink(arena, id).into_entry())
    }

    /// Splices `id` out of the chain and frees it.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a live node. Passing a live node of another chain
    /// corrupts both chains.
    pub fn unlink<K, V>(&mut self, arena: &mut Arena<K, V>, id: NodeId) -> Node<K, V> {
        let node = arena.take(id);
        match node.prev {
            Some(prev) => arena[prev].next = node.next,
            None => {
                debug_assert_eq!(self.head, Some(id));
                self.head = node.next;
            }
        }
        if let Some(next) = node.next {
            arena[next].prev = node.prev;
        }
        self.len -= 1;
        node
    }

    /// Iterates the chain from head to tail.
    pub fn iter<'a, K, V>(&self, arena: &'a Arena<K, V>) -> ChainIter<'a, K, V> {
        ChainIter {
            arena,
            cursor: self.head,
            remaining: self.len,
        }
    }
}

/// An iterator over the nodes of a [`Chain`], head first.
pub struct ChainIter<'a, K, V> {
    arena: &'a Arena<K, V>,
    cursor: Option<NodeId>,
    remaining: usize,
}

impl<'a, K, V> Iterator for ChainIter<'a, K, V> {
    type Item = (NodeId, &'a Node<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let node = &self.arena[id];
        self.cursor = node.next;
        self.remaining -= 1;
        Some((id, node))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for ChainIter<'_, K, V> {}

impl<K, V> core::iter::FusedIterator for ChainIter<'_, K, V> {}
