//! Scene graph: a generational arena of nodes with ordered components and
//! children, plus the update and draw traversals that drive each frame.

use glam::Vec3;

use crate::component::{Component, ComponentKind};
use crate::draw::{DrawItem, DrawQueue};

/// Handle to a node in a [`Scene`]. Stale handles (despawned nodes) resolve
/// to `None` everywhere instead of panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// A scene entity: transform, components, children.
#[derive(Debug, Default)]
pub struct Node {
    pub name: String,
    pub tag: String,
    /// Grid x/y plus height z.
    pub position: Vec3,
    pub scale: Vec3,
    pub visible: bool,
    /// Depth key handed to the renderer; larger draws later.
    pub draw_order: i32,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) components: Vec<Component>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scale: Vec3::ONE,
            visible: true,
            ..Default::default()
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_draw_order(mut self, order: i32) -> Self {
        self.draw_order = order;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Owns every node. The root node always exists and cannot be despawned.
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        let mut scene = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        };
        scene.root = scene.spawn(Node::new("root"));
        scene
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Insert a node with no parent and return its handle.
    pub fn spawn(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    /// Spawn a node directly under a parent.
    pub fn spawn_child(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.spawn(node);
        self.add_child(parent, id);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    /// Attach `child` under `parent`, detaching it from any prior parent
    /// first. Appends to the child list, so insertion order defines update
    /// and draw order. Attaching a node to one of its own descendants would
    /// cut the subtree loose, so it is refused.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        if self.get(parent).is_none() || self.get(child).is_none() || parent == child {
            return;
        }
        if self.is_ancestor(child, parent) {
            log::warn!("refusing add_child: would create a cycle");
            return;
        }
        self.detach(child);
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.get_mut(parent) {
            node.children.push(child);
        }
    }

    /// Remove `child` from its parent's child list. No-op when it has no
    /// parent.
    pub fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.get(child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.children.retain(|&c| c != child);
        }
        if let Some(node) = self.get_mut(child) {
            node.parent = None;
        }
    }

    /// Detach and free the node and its whole subtree. Stale ids are a no-op.
    pub fn despawn(&mut self, id: NodeId) {
        if id == self.root || self.get(id).is_none() {
            return;
        }
        self.detach(id);
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let Some(slot) = self.slots.get_mut(current.index as usize) else {
                continue;
            };
            if slot.generation != current.generation {
                continue;
            }
            if let Some(node) = slot.node.take() {
                pending.extend(node.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
            }
        }
    }

    /// True when `ancestor` is on `id`'s parent chain.
    fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.get(id).and_then(|n| n.parent);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.get(p).and_then(|n| n.parent);
        }
        false
    }

    /// World position: the node's local position summed with every ancestor's.
    pub fn global_position(&self, id: NodeId) -> Vec3 {
        let mut sum = Vec3::ZERO;
        let mut current = Some(id);
        while let Some(node) = current.and_then(|c| self.get(c)) {
            sum += node.position;
            current = node.parent;
        }
        sum
    }

    /// Append a component and fire its one-time `ready` hook.
    pub fn add_component(&mut self, id: NodeId, mut component: Component) {
        if self.get(id).is_none() {
            return;
        }
        component.ready(id);
        if let Some(node) = self.get_mut(id) {
            node.components.push(component);
        }
    }

    /// First component of the requested kind, or none.
    pub fn get_component(&self, id: NodeId, kind: ComponentKind) -> Option<&Component> {
        self.get(id)?.components.iter().find(|c| c.kind() == kind)
    }

    pub fn get_component_mut(&mut self, id: NodeId, kind: ComponentKind) -> Option<&mut Component> {
        self.get_mut(id)?
            .components
            .iter_mut()
            .find(|c| c.kind() == kind)
    }

    /// Per-frame update traversal: for each node in pre-order, run its own
    /// components in attachment order, then descend into children in child
    /// order. The closure gets the scene back so component logic can move
    /// nodes, request paths, spawn children. Components see the node's
    /// prior-frame position; children see whatever their parent's components
    /// left behind.
    pub fn update_subtree<F>(&mut self, id: NodeId, f: &mut F)
    where
        F: FnMut(&mut Scene, NodeId, &mut Component),
    {
        let Some(node) = self.get_mut(id) else {
            return;
        };
        // Take the components out so the closure may borrow the scene.
        let mut components = std::mem::take(&mut node.components);
        for component in components.iter_mut() {
            f(self, id, component);
        }
        if let Some(node) = self.get_mut(id) {
            // Components attached during the update land after the originals.
            let added = std::mem::replace(&mut node.components, components);
            node.components.extend(added);
        }
        let children: Vec<NodeId> = self
            .get(id)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        for child in children {
            self.update_subtree(child, f);
        }
    }

    /// Draw traversal: an invisible node hides its whole subtree; visible
    /// nodes submit themselves, then their children in order.
    pub fn visit_draw(&self, id: NodeId, queue: &mut dyn DrawQueue) {
        self.draw_node(id, Vec3::ZERO, queue);
    }

    fn draw_node(&self, id: NodeId, base: Vec3, queue: &mut dyn DrawQueue) {
        let Some(node) = self.get(id) else {
            return;
        };
        if !node.visible {
            return;
        }
        let position = base + node.position;
        queue.submit(DrawItem {
            node: id,
            position,
            draw_order: node.draw_order,
        });
        for &child in &node.children {
            self.draw_node(child, position, queue);
        }
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{AiBehavior, Appearance};

    fn appearance() -> Component {
        Component::Appearance(Appearance::new([200, 180, 150], [40, 40, 60]))
    }

    struct Recorder(Vec<(NodeId, i32)>);

    impl DrawQueue for Recorder {
        fn submit(&mut self, item: DrawItem) {
            self.0.push((item.node, item.draw_order));
        }
    }

    #[test]
    fn add_child_reparents() {
        let mut scene = Scene::new();
        let a = scene.spawn_child(scene.root(), Node::new("a"));
        let b = scene.spawn_child(scene.root(), Node::new("b"));
        let child = scene.spawn_child(a, Node::new("child"));

        assert_eq!(scene.get(child).unwrap().parent(), Some(a));

        scene.add_child(b, child);
        assert_eq!(scene.get(child).unwrap().parent(), Some(b));
        assert!(!scene.get(a).unwrap().children().contains(&child));
        assert!(scene.get(b).unwrap().children().contains(&child));
    }

    #[test]
    fn add_child_refuses_cycle() {
        let mut scene = Scene::new();
        let a = scene.spawn_child(scene.root(), Node::new("a"));
        let b = scene.spawn_child(a, Node::new("b"));

        scene.add_child(b, a);
        assert_eq!(scene.get(a).unwrap().parent(), Some(scene.root()));
    }

    #[test]
    fn detach_without_parent_is_noop() {
        let mut scene = Scene::new();
        let a = scene.spawn(Node::new("a"));
        scene.detach(a);
        assert_eq!(scene.get(a).unwrap().parent(), None);
    }

    #[test]
    fn despawn_frees_subtree_and_stales_ids() {
        let mut scene = Scene::new();
        let a = scene.spawn_child(scene.root(), Node::new("a"));
        let child = scene.spawn_child(a, Node::new("child"));

        scene.despawn(a);
        assert!(scene.get(a).is_none());
        assert!(scene.get(child).is_none());

        // The slot is reused with a bumped generation; the old id stays dead.
        let b = scene.spawn(Node::new("b"));
        assert!(scene.get(b).is_some());
        assert!(scene.get(a).is_none());
    }

    #[test]
    fn global_position_sums_ancestors() {
        let mut scene = Scene::new();
        let a = scene.spawn_child(
            scene.root(),
            Node::new("a").with_position(Vec3::new(2.0, 3.0, 0.0)),
        );
        let b = scene.spawn_child(a, Node::new("b").with_position(Vec3::new(1.0, -1.0, 0.5)));

        assert_eq!(scene.global_position(b), Vec3::new(3.0, 2.0, 0.5));
    }

    #[test]
    fn ready_hook_records_owner() {
        let mut scene = Scene::new();
        let a = scene.spawn_child(scene.root(), Node::new("a"));
        scene.add_component(a, Component::Ai(AiBehavior::new(2.0, 5.0)));

        let ai = scene
            .get_component(a, ComponentKind::Ai)
            .and_then(|c| c.as_ai())
            .unwrap();
        assert_eq!(ai.owner(), Some(a));
    }

    #[test]
    fn get_component_returns_first_match() {
        let mut scene = Scene::new();
        let a = scene.spawn_child(scene.root(), Node::new("a"));
        scene.add_component(a, appearance());
        scene.add_component(a, Component::Ai(AiBehavior::new(2.0, 5.0)));

        assert!(matches!(
            scene.get_component(a, ComponentKind::Ai),
            Some(Component::Ai(_))
        ));
        assert!(scene.get_component(a, ComponentKind::Projectiles).is_none());
    }

    #[test]
    fn update_visits_components_before_children() {
        let mut scene = Scene::new();
        let parent = scene.spawn_child(scene.root(), Node::new("parent"));
        let child = scene.spawn_child(parent, Node::new("child"));
        scene.add_component(parent, appearance());
        scene.add_component(child, appearance());

        let mut order = Vec::new();
        scene.update_subtree(scene.root(), &mut |_, id, _| order.push(id));
        assert_eq!(order, vec![parent, child]);
    }

    #[test]
    fn invisible_node_hides_subtree() {
        let mut scene = Scene::new();
        let a = scene.spawn_child(scene.root(), Node::new("a"));
        let hidden = scene.spawn_child(scene.root(), Node::new("hidden"));
        let under_hidden = scene.spawn_child(hidden, Node::new("under"));
        scene.get_mut(hidden).unwrap().visible = false;

        let mut recorder = Recorder(Vec::new());
        scene.visit_draw(scene.root(), &mut recorder);
        let drawn: Vec<NodeId> = recorder.0.iter().map(|(id, _)| *id).collect();
        assert!(drawn.contains(&a));
        assert!(!drawn.contains(&hidden));
        assert!(!drawn.contains(&under_hidden));
    }

    #[test]
    fn draw_positions_are_global() {
        let mut scene = Scene::new();
        let a = scene.spawn_child(
            scene.root(),
            Node::new("a").with_position(Vec3::new(4.0, 0.0, 0.0)),
        );
        let b = scene.spawn_child(a, Node::new("b").with_position(Vec3::new(0.0, 2.0, 0.0)));

        struct Positions(Vec<(NodeId, Vec3)>);
        impl DrawQueue for Positions {
            fn submit(&mut self, item: DrawItem) {
                self.0.push((item.node, item.position));
            }
        }
        let mut q = Positions(Vec::new());
        scene.visit_draw(scene.root(), &mut q);
        let found = q.0.iter().find(|(id, _)| *id == b).unwrap();
        assert_eq!(found.1, Vec3::new(4.0, 2.0, 0.0));
    }
}
