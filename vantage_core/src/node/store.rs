// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, and property management.

use core::cell::Cell;

use hashbrown::HashMap;
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::billboard::Billboard;
use crate::camera::Camera;
use crate::dirty;
use crate::error::HierarchyError;
use crate::geometry::Geometry;
use crate::math::{Matrix4, Quaternion, Vector3};
use crate::output::ViewPortId;

use super::id::{INVALID, NodeId, NodeKind, TouchTargetId};
use super::touch::{TouchAction, TouchTargets};
use super::traverse::{Children, Descendants};

/// Cached derived transforms of one node.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Derived {
    pub(crate) local: Matrix4,
    pub(crate) world: Matrix4,
    pub(crate) full: Matrix4,
    pub(crate) world_orientation: Quaternion,
    pub(crate) full_orientation: Quaternion,
}

impl Derived {
    const IDENTITY: Self = Self {
        local: Matrix4::IDENTITY,
        world: Matrix4::IDENTITY,
        full: Matrix4::IDENTITY,
        world_orientation: Quaternion::IDENTITY,
        full_orientation: Quaternion::IDENTITY,
    };
}

/// Struct-of-arrays storage for all nodes.
///
/// Nodes are addressed by [`NodeId`] handles. Internally, each node occupies
/// a slot in parallel arrays. Destroyed nodes are recycled via a free list,
/// and generation counters prevent stale handle access.
///
/// Derived transforms are cached per node behind [`Cell`]s so that reads take
/// `&self`. The store is therefore not `Sync`; it is meant to be owned by the
/// render thread.
#[derive(Debug)]
pub struct NodeStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,
    /// Nearest enclosing World (strict ancestor), or `INVALID`.
    pub(crate) world: Vec<u32>,

    // -- Identity --
    pub(crate) kind: Vec<NodeKind>,
    pub(crate) name: Vec<Option<String>>,
    pub(crate) geometry: Vec<Option<Geometry>>,
    pub(crate) cameras: HashMap<u32, Camera>,
    pub(crate) billboards: HashMap<u32, Billboard>,

    // -- Local properties (set by callers) --
    pub(crate) position: Vec<Vector3>,
    pub(crate) scale: Vec<Vector3>,
    pub(crate) orientation: Vec<Quaternion>,
    pub(crate) visible: Vec<bool>,

    // -- Derived properties (recomputed lazily on read) --
    pub(crate) derived: Vec<Cell<Derived>>,
    pub(crate) stale: Vec<Cell<bool>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Touch dispatch --
    pub(crate) touch: Vec<TouchTargets>,
    pub(crate) next_touch_id: u32,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore {
    /// Creates an empty node store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            world: Vec::new(),
            kind: Vec::new(),
            name: Vec::new(),
            geometry: Vec::new(),
            cameras: HashMap::new(),
            billboards: HashMap::new(),
            position: Vec::new(),
            scale: Vec::new(),
            orientation: Vec::new(),
            visible: Vec::new(),
            derived: Vec::new(),
            stale: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            touch: Vec::new(),
            next_touch_id: 0,
        }
    }

    // -- Allocation API --

    /// Creates an anonymous transform node.
    ///
    /// The node starts at the origin with unit scale, identity orientation,
    /// visible, and without a parent.
    pub fn create_node(&mut self) -> NodeId {
        self.allocate(NodeKind::Node)
    }

    /// Creates a transform node with a lookup name.
    pub fn create_named_node(&mut self, name: impl Into<String>) -> NodeId {
        let id = self.allocate(NodeKind::Node);
        self.name[id.idx as usize] = Some(name.into());
        id
    }

    /// Creates a World node: a coordinate-space root for world-relative
    /// queries of its descendants.
    pub fn create_world(&mut self) -> NodeId {
        self.allocate(NodeKind::World)
    }

    /// Creates a camera node carrying `camera`.
    pub fn create_camera(&mut self, camera: Camera) -> NodeId {
        let id = self.allocate(NodeKind::Camera);
        self.cameras.insert(id.idx, camera);
        id
    }

    /// Creates a billboard node that keeps `billboard.forward` aimed at its
    /// render root.
    pub fn create_billboard(&mut self, billboard: Billboard) -> NodeId {
        let id = self.allocate(NodeKind::Billboard);
        self.billboards.insert(id.idx, billboard);
        id
    }

    /// Creates a transform node with mesh geometry.
    pub fn create_mesh(&mut self, geometry: Geometry) -> NodeId {
        let id = self.allocate(NodeKind::Node);
        self.geometry[id.idx as usize] = Some(geometry);
        id
    }

    fn allocate(&mut self, kind: NodeKind) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let slot = idx as usize;
            self.generation[slot] += 1;
            self.parent[slot] = INVALID;
            self.first_child[slot] = INVALID;
            self.next_sibling[slot] = INVALID;
            self.prev_sibling[slot] = INVALID;
            self.world[slot] = INVALID;
            self.kind[slot] = kind;
            self.name[slot] = None;
            self.geometry[slot] = None;
            self.position[slot] = Vector3::ZERO;
            self.scale[slot] = Vector3::ONE;
            self.orientation[slot] = Quaternion::IDENTITY;
            self.visible[slot] = true;
            self.derived[slot].set(Derived::IDENTITY);
            self.stale[slot].set(true);
            self.touch[slot].clear();
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.world.push(INVALID);
            self.kind.push(kind);
            self.name.push(None);
            self.geometry.push(None);
            self.position.push(Vector3::ZERO);
            self.scale.push(Vector3::ONE);
            self.orientation.push(Quaternion::IDENTITY);
            self.visible.push(true);
            self.derived.push(Cell::new(Derived::IDENTITY));
            self.stale.push(Cell::new(true));
            self.touch.push(TouchTargets::default());
            self.generation.push(0);
            idx
        };

        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a leaf node, freeing its slot for reuse.
    ///
    /// The node is detached from its parent first. Its camera data, geometry,
    /// name, and touch targets are dropped.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy_node(&mut self, id: NodeId) -> Result<(), HierarchyError> {
        self.validate(id);
        let idx = id.idx;
        if self.first_child[idx as usize] != INVALID {
            return Err(HierarchyError::HasChildren(id));
        }

        if self.parent[idx as usize] != INVALID {
            let p = self.parent[idx as usize];
            self.unlink_from_parent(idx);
            self.dirty.remove_dependency(idx, p, dirty::TRANSFORM);
        }

        self.dirty.remove_key(idx);
        self.cameras.remove(&idx);
        self.billboards.remove(&idx);
        self.geometry[idx as usize] = None;
        self.name[idx as usize] = None;
        self.touch[idx as usize].clear();

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;
        self.free_list.push(idx);
        Ok(())
    }

    /// Destroys `id` and every node below it, children before parents.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy_subtree(&mut self, id: NodeId) {
        self.validate(id);
        let mut order: Vec<NodeId> = self.descendants(id).collect();
        order.insert(0, id);
        // Pre-order reversed puts every child before its parent.
        for node in order.into_iter().rev() {
            if let Err(err) = self.destroy_node(node) {
                log::warn!("destroy_subtree skipped {node:?}: {err}");
            }
        }
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    /// Returns `true` if the store holds no live nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -- Topology API --

    /// Appends `child` to `parent`'s children.
    ///
    /// If `child` already has a different parent it is detached from it
    /// first. The child's subtree inherits `parent`'s World (or `parent`
    /// itself when it is a World) and is marked transform-dirty.
    ///
    /// Attaching a node to itself, to one of its descendants, or to its
    /// current parent is rejected and leaves the graph untouched.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HierarchyError> {
        self.validate(parent);
        self.validate(child);
        if let Err(err) = self.check_attach(parent, child) {
            log::warn!("rejected add_child: {err}");
            return Err(err);
        }
        self.attach(parent.idx, child.idx);
        Ok(())
    }

    /// Appends several children at once.
    ///
    /// Every attachment is validated before any is performed, so either all
    /// children are attached or none is.
    ///
    /// # Panics
    ///
    /// Panics if any handle is stale.
    pub fn add_children(
        &mut self,
        parent: NodeId,
        children: &[NodeId],
    ) -> Result<(), HierarchyError> {
        self.validate(parent);
        for (i, &child) in children.iter().enumerate() {
            self.validate(child);
            let duplicate = children[..i].contains(&child);
            let checked = if duplicate {
                Err(HierarchyError::AlreadyChild { parent, child })
            } else {
                self.check_attach(parent, child)
            };
            if let Err(err) = checked {
                log::warn!("rejected add_children: {err}");
                return Err(err);
            }
        }
        for &child in children {
            self.attach(parent.idx, child.idx);
        }
        Ok(())
    }

    /// Detaches `child` from `parent`.
    ///
    /// The detached subtree is orphaned, not destroyed.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HierarchyError> {
        self.validate(parent);
        self.validate(child);
        if self.parent[child.idx as usize] != parent.idx {
            return Err(HierarchyError::NotAChild { parent, child });
        }
        self.detach(child.idx);
        Ok(())
    }

    /// Detaches every child of `parent` and returns them in former order.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn remove_all_children(&mut self, parent: NodeId) -> Vec<NodeId> {
        let removed: Vec<NodeId> = self.children(parent).collect();
        for child in &removed {
            self.detach(child.idx);
        }
        removed
    }

    /// Detaches `id` from its parent. Returns `false` if it was a root.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn remove(&mut self, id: NodeId) -> bool {
        self.validate(id);
        if self.parent[id.idx as usize] == INVALID {
            return false;
        }
        self.detach(id.idx);
        true
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.id_at(p))
    }

    /// Returns an iterator over the direct children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Number of direct children.
    #[must_use]
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// Depth-first, pre-order iterator over every strict descendant.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        self.validate(id);
        Descendants::new(self, id.idx, false)
    }

    /// Like [`descendants`](Self::descendants), but hidden nodes and their
    /// subtrees are skipped.
    #[must_use]
    pub fn visible_descendants(&self, id: NodeId) -> Descendants<'_> {
        self.validate(id);
        Descendants::new(self, id.idx, true)
    }

    /// First descendant (depth-first, pre-order) named `name`.
    ///
    /// Names are not unique; the first match wins.
    #[must_use]
    pub fn find_child_with_name(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(id)
            .find(|d| self.name[d.idx as usize].as_deref() == Some(name))
    }

    /// Returns the nodes that have no parent.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        (0..self.len)
            .filter(|&idx| self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx))
            .map(|idx| self.id_at(idx))
            .collect()
    }

    /// Returns `true` if `ancestor` is a strict ancestor of `id`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.validate(ancestor);
        self.validate(id);
        self.is_ancestor_idx(ancestor.idx, id.idx)
    }

    /// The nearest enclosing World, if any.
    #[must_use]
    pub fn world_of(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let w = self.world[id.idx as usize];
        (w != INVALID).then(|| self.id_at(w))
    }

    /// The nearest Camera at or above `id`: the render root it belongs to.
    #[must_use]
    pub fn camera_of(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let mut cur = id.idx;
        while cur != INVALID {
            if self.kind[cur as usize] == NodeKind::Camera {
                return Some(self.id_at(cur));
            }
            cur = self.parent[cur as usize];
        }
        None
    }

    // -- Property API --

    /// The node's role.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.validate(id);
        self.kind[id.idx as usize]
    }

    /// The node's lookup name.
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.validate(id);
        self.name[id.idx as usize].as_deref()
    }

    /// Sets or clears the node's lookup name.
    pub fn set_name(&mut self, id: NodeId, name: Option<String>) {
        self.validate(id);
        self.name[id.idx as usize] = name;
    }

    /// The node's mesh geometry.
    #[must_use]
    pub fn geometry(&self, id: NodeId) -> Option<Geometry> {
        self.validate(id);
        self.geometry[id.idx as usize]
    }

    /// Sets or clears the node's mesh geometry.
    pub fn set_geometry(&mut self, id: NodeId, geometry: Option<Geometry>) {
        self.validate(id);
        self.geometry[id.idx as usize] = geometry;
    }

    /// Camera parameters, if `id` is a camera node.
    #[must_use]
    pub fn camera(&self, id: NodeId) -> Option<&Camera> {
        self.validate(id);
        self.cameras.get(&id.idx)
    }

    /// Mutable camera parameters, if `id` is a camera node.
    #[must_use]
    pub fn camera_mut(&mut self, id: NodeId) -> Option<&mut Camera> {
        self.validate(id);
        self.cameras.get_mut(&id.idx)
    }

    /// Facing parameters, if `id` is a billboard node.
    #[must_use]
    pub fn billboard(&self, id: NodeId) -> Option<Billboard> {
        self.validate(id);
        self.billboards.get(&id.idx).copied()
    }

    /// Replaces the facing parameters of billboard `id`.
    ///
    /// Returns `false`, changing nothing, if `id` is not a billboard.
    pub fn set_billboard(&mut self, id: NodeId, billboard: Billboard) -> bool {
        self.validate(id);
        match self.billboards.get_mut(&id.idx) {
            Some(slot) => {
                *slot = billboard;
                self.mark_transform_dirty(id.idx);
                true
            }
            None => false,
        }
    }

    /// Records which viewport uses camera `id` as its render root.
    ///
    /// Render targets maintain this link when viewports are added, rebound,
    /// or removed. Returns `false` if `id` is not a camera.
    pub fn set_camera_viewport(&mut self, id: NodeId, viewport: Option<ViewPortId>) -> bool {
        match self.camera_mut(id) {
            Some(camera) => {
                camera.viewport = viewport;
                true
            }
            None => false,
        }
    }

    /// Local position.
    #[must_use]
    pub fn position(&self, id: NodeId) -> Vector3 {
        self.validate(id);
        self.position[id.idx as usize]
    }

    /// Local scale.
    #[must_use]
    pub fn scale(&self, id: NodeId) -> Vector3 {
        self.validate(id);
        self.scale[id.idx as usize]
    }

    /// Local orientation.
    #[must_use]
    pub fn orientation(&self, id: NodeId) -> Quaternion {
        self.validate(id);
        self.orientation[id.idx as usize]
    }

    /// Sets the local position and marks the subtree transform-dirty.
    pub fn set_position(&mut self, id: NodeId, position: Vector3) {
        self.validate(id);
        self.position[id.idx as usize] = position;
        self.mark_transform_dirty(id.idx);
    }

    /// Sets the local scale and marks the subtree transform-dirty.
    pub fn set_scale(&mut self, id: NodeId, scale: Vector3) {
        self.validate(id);
        self.scale[id.idx as usize] = scale;
        self.mark_transform_dirty(id.idx);
    }

    /// Sets the local orientation and marks the subtree transform-dirty.
    pub fn set_orientation(&mut self, id: NodeId, orientation: Quaternion) {
        self.validate(id);
        self.orientation[id.idx as usize] = orientation;
        self.mark_transform_dirty(id.idx);
    }

    /// The node's own visibility flag.
    #[must_use]
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.validate(id);
        self.visible[id.idx as usize]
    }

    /// Sets the node's own visibility flag.
    ///
    /// Hiding a node suppresses rendering of its entire subtree regardless of
    /// the descendants' own flags.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.validate(id);
        self.visible[id.idx as usize] = visible;
    }

    /// `true` if the node and every ancestor are visible.
    #[must_use]
    pub fn is_effectively_visible(&self, id: NodeId) -> bool {
        self.validate(id);
        let mut cur = id.idx;
        while cur != INVALID {
            if !self.visible[cur as usize] {
                return false;
            }
            cur = self.parent[cur as usize];
        }
        true
    }

    // -- Dirty tracking API --

    /// Marks the node's derived transforms stale, together with those of every
    /// descendant. Idempotent.
    pub fn mark_world_transform_as_dirty(&mut self, id: NodeId) {
        self.validate(id);
        self.mark_transform_dirty(id.idx);
    }

    /// `true` if the node's derived transforms will be recomputed on the next
    /// read.
    #[must_use]
    pub fn is_transform_dirty(&self, id: NodeId) -> bool {
        self.validate(id);
        self.stale[id.idx as usize].get()
    }

    // -- Touch API --

    /// Registers a callback run whenever the node is picked.
    ///
    /// Callbacks run in registration order and are not propagated to
    /// ancestors.
    pub fn add_touch_target(
        &mut self,
        id: NodeId,
        action: impl FnMut(NodeId) + 'static,
    ) -> TouchTargetId {
        self.validate(id);
        let handle = TouchTargetId(self.next_touch_id);
        self.next_touch_id = self.next_touch_id.wrapping_add(1);
        let boxed: TouchAction = Box::new(action);
        self.touch[id.idx as usize].push(handle, boxed);
        handle
    }

    /// Unregisters a callback. Returns `false` if it was not registered on
    /// this node.
    pub fn remove_touch_target(&mut self, id: NodeId, handle: TouchTargetId) -> bool {
        self.validate(id);
        self.touch[id.idx as usize].remove(handle)
    }

    /// Unregisters every callback on the node.
    pub fn clear_touch_targets(&mut self, id: NodeId) {
        self.validate(id);
        self.touch[id.idx as usize].clear();
    }

    /// Number of callbacks registered on the node.
    #[must_use]
    pub fn touch_target_count(&self, id: NodeId) -> usize {
        self.validate(id);
        self.touch[id.idx as usize].len()
    }

    /// Runs the node's touch callbacks and returns how many ran.
    pub fn did_receive_touch(&mut self, id: NodeId) -> usize {
        self.validate(id);
        self.touch[id.idx as usize].fire(id)
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Handle for a live slot.
    pub(crate) fn id_at(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    fn is_ancestor_idx(&self, ancestor: u32, idx: u32) -> bool {
        let mut cur = self.parent[idx as usize];
        while cur != INVALID {
            if cur == ancestor {
                return true;
            }
            cur = self.parent[cur as usize];
        }
        false
    }

    fn check_attach(&self, parent: NodeId, child: NodeId) -> Result<(), HierarchyError> {
        if parent == child {
            return Err(HierarchyError::SelfAttach(child));
        }
        if self.parent[child.idx as usize] == parent.idx {
            return Err(HierarchyError::AlreadyChild { parent, child });
        }
        if self.is_ancestor_idx(child.idx, parent.idx) {
            return Err(HierarchyError::Cycle { parent, child });
        }
        Ok(())
    }

    /// Links an already validated child under `p`.
    fn attach(&mut self, p: u32, c: u32) {
        if self.parent[c as usize] != INVALID {
            let old = self.parent[c as usize];
            self.unlink_from_parent(c);
            self.dirty.remove_dependency(c, old, dirty::TRANSFORM);
        }

        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            // Walk to last child.
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        // Child depends on parent for derived transforms.
        let _ = self.dirty.add_dependency(c, p, dirty::TRANSFORM);

        self.reassign_worlds(c);
        self.mark_transform_dirty(c);
    }

    fn detach(&mut self, c: u32) {
        let p = self.parent[c as usize];
        self.unlink_from_parent(c);
        self.dirty.remove_dependency(c, p, dirty::TRANSFORM);
        self.reassign_worlds(c);
        self.mark_transform_dirty(c);
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Recomputes the enclosing World of `idx` and its subtree.
    fn reassign_worlds(&mut self, idx: u32) {
        let root = self.id_at(idx);
        let subtree: Vec<u32> = core::iter::once(idx)
            .chain(self.descendants(root).map(|d| d.idx))
            .collect();
        // Pre-order: every parent is updated before its children.
        for i in subtree {
            let p = self.parent[i as usize];
            self.world[i as usize] = if p == INVALID {
                INVALID
            } else if self.kind[p as usize] == NodeKind::World {
                p
            } else {
                self.world[p as usize]
            };
        }
    }

    /// Marks `idx` and its subtree stale through the dirty tracker.
    pub(crate) fn mark_transform_dirty(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::TRANSFORM, &EagerPolicy);
        let affected: Vec<u32> = self
            .dirty
            .drain(dirty::TRANSFORM)
            .affected()
            .deterministic()
            .run()
            .collect();
        for i in affected {
            self.stale[i as usize].set(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn create_and_destroy() {
        let mut store = NodeStore::new();
        let id = store.create_node();
        assert!(store.is_alive(id));
        assert_eq!(store.len(), 1);
        store.destroy_node(id).unwrap();
        assert!(!store.is_alive(id));
        assert!(store.is_empty());
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut store = NodeStore::new();
        let id1 = store.create_node();
        store.destroy_node(id1).unwrap();
        let id2 = store.create_node();
        assert!(!store.is_alive(id1));
        assert!(store.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn add_child_and_query() {
        let mut store = NodeStore::new();
        let parent = store.create_node();
        let child1 = store.create_node();
        let child2 = store.create_node();

        store.add_child(parent, child1).unwrap();
        store.add_child(parent, child2).unwrap();

        assert_eq!(store.parent(child1), Some(parent));
        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![child1, child2]);
        assert_eq!(store.child_count(parent), 2);
    }

    #[test]
    fn reparenting_detaches_from_old_parent() {
        let mut store = NodeStore::new();
        let p1 = store.create_node();
        let p2 = store.create_node();
        let child = store.create_node();

        store.add_child(p1, child).unwrap();
        store.add_child(p2, child).unwrap();
        assert_eq!(store.parent(child), Some(p2));
        assert_eq!(store.child_count(p1), 0);
    }

    #[test]
    fn cyclic_attach_is_rejected_without_mutation() {
        let mut store = NodeStore::new();
        let x = store.create_node();
        let a = store.create_node();
        let b = store.create_node();
        store.add_child(x, a).unwrap();
        store.add_child(a, b).unwrap();

        let err = store.add_child(b, x).unwrap_err();
        assert_eq!(err, HierarchyError::Cycle {
            parent: b,
            child: x
        });
        assert_eq!(store.parent(x), None);
        assert_eq!(store.parent(a), Some(x));
        assert_eq!(store.parent(b), Some(a));
        assert_eq!(store.child_count(b), 0);
        assert_eq!(store.roots(), vec![x]);
    }

    #[test]
    fn self_and_duplicate_attach_are_rejected() {
        let mut store = NodeStore::new();
        let p = store.create_node();
        let c = store.create_node();
        assert_eq!(store.add_child(p, p), Err(HierarchyError::SelfAttach(p)));
        store.add_child(p, c).unwrap();
        assert_eq!(
            store.add_child(p, c),
            Err(HierarchyError::AlreadyChild {
                parent: p,
                child: c
            })
        );
        assert_eq!(store.child_count(p), 1);
    }

    #[test]
    fn add_children_is_all_or_nothing() {
        let mut store = NodeStore::new();
        let p = store.create_node();
        let a = store.create_node();
        let b = store.create_node();
        assert!(store.add_children(p, &[a, b, a]).is_err());
        assert_eq!(store.child_count(p), 0);
        store.add_children(p, &[a, b]).unwrap();
        assert_eq!(store.children(p).collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn remove_variants_orphan_subtrees() {
        let mut store = NodeStore::new();
        let p = store.create_node();
        let a = store.create_node();
        let b = store.create_node();
        let grandchild = store.create_node();
        store.add_children(p, &[a, b]).unwrap();
        store.add_child(a, grandchild).unwrap();

        assert_eq!(
            store.remove_child(b, a),
            Err(HierarchyError::NotAChild {
                parent: b,
                child: a
            })
        );
        store.remove_child(p, a).unwrap();
        assert_eq!(store.parent(a), None);
        // Detaching does not destroy.
        assert!(store.is_alive(grandchild));
        assert_eq!(store.parent(grandchild), Some(a));

        assert!(store.remove(b));
        assert!(!store.remove(b));

        store.add_children(p, &[a, b]).unwrap();
        assert_eq!(store.remove_all_children(p), vec![a, b]);
        assert_eq!(store.child_count(p), 0);
    }

    #[test]
    fn descendants_are_depth_first_pre_order() {
        let mut store = NodeStore::new();
        let root = store.create_node();
        let a = store.create_node();
        let a1 = store.create_node();
        let a2 = store.create_node();
        let b = store.create_node();
        store.add_children(root, &[a, b]).unwrap();
        store.add_children(a, &[a1, a2]).unwrap();
        let order: Vec<_> = store.descendants(root).collect();
        assert_eq!(order, vec![a, a1, a2, b]);
    }

    #[test]
    fn find_child_with_name_returns_first_depth_first_match() {
        let mut store = NodeStore::new();
        let root = store.create_named_node("target");
        let a = store.create_node();
        let deep = store.create_named_node("target");
        let shallow = store.create_named_node("target");
        store.add_children(root, &[a, shallow]).unwrap();
        store.add_child(a, deep).unwrap();
        // The root itself is not searched; depth-first reaches `deep` first.
        assert_eq!(store.find_child_with_name(root, "target"), Some(deep));
        assert_eq!(store.find_child_with_name(root, "missing"), None);
    }

    #[test]
    fn world_reference_follows_reparenting() {
        let mut store = NodeStore::new();
        let w1 = store.create_world();
        let w2 = store.create_world();
        let a = store.create_node();
        let b = store.create_node();
        store.add_child(a, b).unwrap();
        assert_eq!(store.world_of(b), None);

        store.add_child(w1, a).unwrap();
        assert_eq!(store.world_of(a), Some(w1));
        assert_eq!(store.world_of(b), Some(w1));

        store.add_child(w2, a).unwrap();
        assert_eq!(store.world_of(b), Some(w2));

        store.remove(a);
        assert_eq!(store.world_of(a), None);
        assert_eq!(store.world_of(b), None);
    }

    #[test]
    fn nested_world_inherits_outer_world() {
        let mut store = NodeStore::new();
        let outer = store.create_world();
        let inner = store.create_world();
        let leaf = store.create_node();
        store.add_child(outer, inner).unwrap();
        store.add_child(inner, leaf).unwrap();
        assert_eq!(store.world_of(inner), Some(outer));
        assert_eq!(store.world_of(leaf), Some(inner));
    }

    #[test]
    fn mark_dirty_reaches_every_descendant() {
        let mut store = NodeStore::new();
        let root = store.create_node();
        let a = store.create_node();
        let b = store.create_node();
        let c = store.create_node();
        store.add_child(root, a).unwrap();
        store.add_child(a, b).unwrap();
        store.add_child(root, c).unwrap();

        // Reading clears each node's own flag.
        for id in [root, a, b, c] {
            let _ = store.world_transform(id);
            assert!(!store.is_transform_dirty(id));
        }

        store.mark_world_transform_as_dirty(a);
        assert!(store.is_transform_dirty(a));
        assert!(store.is_transform_dirty(b));
        assert!(!store.is_transform_dirty(root));
        assert!(!store.is_transform_dirty(c));

        // A second mark is observably identical.
        store.mark_world_transform_as_dirty(a);
        assert!(store.is_transform_dirty(a));
        assert!(store.is_transform_dirty(b));
        assert!(!store.is_transform_dirty(c));
    }

    #[test]
    fn recompute_clears_only_the_read_node() {
        let mut store = NodeStore::new();
        let a = store.create_node();
        let b = store.create_node();
        store.add_child(a, b).unwrap();
        store.set_position(a, Vector3::X);

        let _ = store.world_transform(a);
        assert!(!store.is_transform_dirty(a));
        assert!(store.is_transform_dirty(b));
    }

    #[test]
    fn visibility_is_suppressed_by_ancestors() {
        let mut store = NodeStore::new();
        let root = store.create_node();
        let mid = store.create_node();
        let leaf = store.create_node();
        let other = store.create_node();
        store.add_child(root, mid).unwrap();
        store.add_child(mid, leaf).unwrap();
        store.add_child(root, other).unwrap();

        store.set_visible(mid, false);
        assert!(store.is_visible(leaf));
        assert!(!store.is_effectively_visible(leaf));
        let visible: Vec<_> = store.visible_descendants(root).collect();
        assert_eq!(visible, vec![other]);
    }

    #[test]
    fn touch_targets_run_in_registration_order() {
        let mut store = NodeStore::new();
        let parent = store.create_node();
        let node = store.create_node();
        store.add_child(parent, node).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        let first = Rc::clone(&log);
        let second = Rc::clone(&log);
        let parent_log = Rc::clone(&log);
        store.add_touch_target(node, move |_| first.borrow_mut().push("first"));
        let h = store.add_touch_target(node, move |_| second.borrow_mut().push("second"));
        store.add_touch_target(parent, move |_| parent_log.borrow_mut().push("parent"));

        assert_eq!(store.did_receive_touch(node), 2);
        // No bubbling to the parent.
        assert_eq!(*log.borrow(), vec!["first", "second"]);

        assert!(store.remove_touch_target(node, h));
        assert!(!store.remove_touch_target(node, h));
        assert_eq!(store.touch_target_count(node), 1);
        store.clear_touch_targets(node);
        assert_eq!(store.did_receive_touch(node), 0);
    }

    #[test]
    fn camera_of_finds_render_root() {
        let mut store = NodeStore::new();
        let cam = store.create_camera(Camera::default());
        let world = store.create_world();
        let leaf = store.create_node();
        store.add_child(cam, world).unwrap();
        store.add_child(world, leaf).unwrap();
        assert_eq!(store.camera_of(leaf), Some(cam));
        assert_eq!(store.camera_of(cam), Some(cam));
        assert!(store.camera(cam).is_some());
        assert!(store.camera(leaf).is_none());
    }

    #[test]
    fn destroy_requires_leaf_and_subtree_destroys_all() {
        let mut store = NodeStore::new();
        let root = store.create_node();
        let a = store.create_node();
        let b = store.create_node();
        store.add_child(root, a).unwrap();
        store.add_child(a, b).unwrap();
        assert_eq!(store.destroy_node(a), Err(HierarchyError::HasChildren(a)));
        store.destroy_subtree(a);
        assert!(!store.is_alive(a));
        assert!(!store.is_alive(b));
        assert!(store.is_alive(root));
        assert_eq!(store.child_count(root), 0);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_handle_panics_on_add_child() {
        let mut store = NodeStore::new();
        let root = store.create_node();
        let id = store.create_node();
        store.destroy_node(id).unwrap();
        let _ = store.add_child(root, id);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_handle_panics_on_world_transform() {
        let mut store = NodeStore::new();
        let id = store.create_node();
        store.destroy_node(id).unwrap();
        let _ = store.world_transform(id);
    }
}
