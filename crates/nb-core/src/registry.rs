//! Node/link registry.
//!
//! Nodes are graph vertices and links are graph edges of a
//! `StableDiGraph`, so the set of links that must re-route when a node moves
//! is simply the node's incident edges. Removing a vertex removes those edges
//! with it, which keeps "a link is valid only while both endpoints exist"
//! true by construction.
//!
//! Draw order is kept separately in `order` (oldest first) since graph
//! indices are recycled.

use crate::grid::GridSnapper;
use crate::id::{LinkId, NodeId};
use crate::model::{Entity, EntityRef, Link, Node, rect_encloses};
use crate::router::Router;
use kurbo::{Point, Rect, Size, Vec2};
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// `add` without `replace` on an id that is already present.
    DuplicateId(NodeId),
    UnknownNode(NodeId),
    DuplicateLink(LinkId),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateId(id) => write!(f, "node `{id}` already exists"),
            RegistryError::UnknownNode(id) => write!(f, "no node with id `{id}`"),
            RegistryError::DuplicateLink(id) => write!(f, "link `{id}` already exists"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Route cache counters, cumulative over the registry's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteStats {
    /// Accesses served from a clean cached route.
    pub hits: u64,
    /// Accesses that recomputed a dirty route.
    pub misses: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    graph: StableDiGraph<Node, Link>,
    node_index: HashMap<NodeId, NodeIndex>,
    link_index: HashMap<LinkId, EdgeIndex>,
    order: Vec<NodeId>,
    link_order: Vec<LinkId>,
    router: Router,
    stats: RouteStats,
}

impl Registry {
    pub fn new(router: Router) -> Self {
        Self {
            router,
            ..Self::default()
        }
    }

    pub fn router(&self) -> Router {
        self.router
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn link_count(&self) -> usize {
        self.link_order.len()
    }

    pub fn stats(&self) -> RouteStats {
        self.stats
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// Insert `node`. An existing id is rejected unless `replace` is set, in
    /// which case the node is overwritten in place and keeps its draw order,
    /// links and selected flag. Membership is owned by the selection.
    pub fn add(&mut self, mut node: Node, replace: bool) -> Result<(), RegistryError> {
        let id = node.id;
        if let Some(&idx) = self.node_index.get(&id) {
            if !replace {
                log::warn!("add: node {id} already exists");
                return Err(RegistryError::DuplicateId(id));
            }
            node.selected = self.graph[idx].selected;
            self.graph[idx] = node;
            self.mark_links_dirty(idx);
            log::debug!("replaced node {id}");
            return Ok(());
        }

        let idx = self.graph.add_node(node);
        self.node_index.insert(id, idx);
        self.order.push(id);
        log::debug!("added node {id}");
        Ok(())
    }

    /// Insert many nodes, optionally clearing first. Returns how many were stored.
    pub fn add_many(&mut self, nodes: impl IntoIterator<Item = Node>, replace: bool, clear: bool) -> usize {
        if clear {
            self.clear();
        }
        nodes
            .into_iter()
            .map(|n| self.add(n, replace))
            .filter(Result::is_ok)
            .count()
    }

    /// Drop every node and link.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.node_index.clear();
        self.link_index.clear();
        self.order.clear();
        self.link_order.clear();
    }

    /// Remove a node together with every link touching it. Containers that
    /// listed it as a child forget it.
    pub fn remove(&mut self, id: NodeId) -> Option<(Node, Vec<LinkId>)> {
        let idx = self.node_index.remove(&id)?;

        let links: Vec<LinkId> = self.incident_edges(idx).into_iter().map(|e| self.graph[e].id).collect();
        let node = self.graph.remove_node(idx)?;
        for link in &links {
            self.link_index.remove(link);
        }
        self.link_order.retain(|l| !links.contains(l));
        self.order.retain(|n| *n != id);

        for other in &self.order {
            if let Some(&ix) = self.node_index.get(other) {
                self.graph[ix].forget_child(id);
            }
        }

        log::debug!("removed node {id} and {} link(s)", links.len());
        Some((node, links))
    }

    /// Remove every node matching `pred`, cascading as [`Registry::remove`].
    pub fn remove_where(&mut self, pred: impl Fn(&Node) -> bool) -> Vec<(Node, Vec<LinkId>)> {
        let doomed: Vec<NodeId> = self.nodes().filter(|n| pred(n)).map(|n| n.id).collect();
        doomed.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node_index.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.node_index.get(&id).map(|idx| &self.graph[*idx])
    }

    /// Topmost node whose bounds contain `point` (world space).
    pub fn get_at(&self, point: Point) -> Option<&Node> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.get(*id))
            .find(|n| n.hit_test(point))
    }

    /// Nodes lying entirely inside `rect`, oldest first.
    pub fn contained_in(&self, rect: Rect) -> Vec<NodeId> {
        self.nodes()
            .filter(|n| rect_encloses(rect, n.bounds()))
            .map(|n| n.id)
            .collect()
    }

    /// Nodes in draw order, oldest (bottom) first.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.order.iter().filter_map(|id| self.get(*id))
    }

    /// Returns `true` if the flag changed.
    pub fn set_selected(&mut self, id: NodeId, selected: bool) -> bool {
        let Some(&idx) = self.node_index.get(&id) else {
            return false;
        };
        let node = &mut self.graph[idx];
        if node.selected == selected {
            return false;
        }
        node.selected = selected;
        true
    }

    /// Move a node (and any container children) so its origin is `origin`.
    pub fn set_origin(&mut self, id: NodeId, origin: Point) -> Result<bool, RegistryError> {
        let node = self.get(id).ok_or(RegistryError::UnknownNode(id))?;
        let delta = origin - node.origin();
        Ok(!self.translate_nodes(&[id], delta).is_empty())
    }

    pub fn set_size(&mut self, id: NodeId, size: Size) -> Result<bool, RegistryError> {
        let idx = *self.node_index.get(&id).ok_or(RegistryError::UnknownNode(id))?;
        if !self.graph[idx].set_size(size) {
            return Ok(false);
        }
        self.mark_links_dirty(idx);
        Ok(true)
    }

    /// Snap-drag a single node to the grid cell of `drag_origin + delta`,
    /// carrying container children along. Returns the applied displacement.
    pub fn drag_node(
        &mut self,
        id: NodeId,
        drag_origin: Point,
        delta: Vec2,
        snapper: &GridSnapper,
    ) -> Result<Vec2, RegistryError> {
        let idx = *self.node_index.get(&id).ok_or(RegistryError::UnknownNode(id))?;
        let moved = self.graph[idx].drag_to(drag_origin, delta, snapper);
        if moved == Vec2::ZERO {
            return Ok(moved);
        }
        self.mark_links_dirty(idx);
        let children: Vec<NodeId> = self.graph[idx].children().to_vec();
        self.translate_nodes(&children, moved);
        Ok(moved)
    }

    /// Translate `ids` and every container descendant by `delta`. Each node
    /// moves at most once even when listed alongside its container. Returns
    /// the ids actually moved.
    pub fn translate_nodes(&mut self, ids: &[NodeId], delta: Vec2) -> Vec<NodeId> {
        if delta == Vec2::ZERO {
            return Vec::new();
        }

        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut moved = Vec::new();
        let mut stack: Vec<NodeId> = ids.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            // The visited set also guards against container cycles.
            if !seen.insert(id) {
                continue;
            }
            let Some(&idx) = self.node_index.get(&id) else {
                continue;
            };
            self.graph[idx].translate(delta);
            self.mark_links_dirty(idx);
            moved.push(id);
            stack.extend(self.graph[idx].children().iter().rev().copied());
        }
        log::trace!("translated {} node(s) by {delta:?}", moved.len());
        moved
    }

    // ─── Links ───────────────────────────────────────────────────────────

    /// Connect `from` → `to`. Fails on an unknown endpoint or a taken link id.
    pub fn try_add_link(&mut self, from: NodeId, to: NodeId, id: Option<LinkId>) -> Result<LinkId, RegistryError> {
        let src = *self.node_index.get(&from).ok_or(RegistryError::UnknownNode(from))?;
        let dst = *self.node_index.get(&to).ok_or(RegistryError::UnknownNode(to))?;
        let id = id.unwrap_or_else(LinkId::generate);
        if self.link_index.contains_key(&id) {
            return Err(RegistryError::DuplicateLink(id));
        }

        let edge = self.graph.add_edge(src, dst, Link::new(id, from, to));
        self.link_index.insert(id, edge);
        self.link_order.push(id);
        log::debug!("added link {id}: {from} -> {to}");
        Ok(id)
    }

    /// Like [`Registry::try_add_link`], but rejections are logged and
    /// reported as `None`.
    pub fn add_link(&mut self, from: NodeId, to: NodeId, id: Option<LinkId>) -> Option<LinkId> {
        match self.try_add_link(from, to, id) {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("add_link ignored: {e}");
                None
            }
        }
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.link_index.get(&id).map(|e| &self.graph[*e])
    }

    pub fn remove_link(&mut self, id: LinkId) -> Option<Link> {
        let edge = self.link_index.remove(&id)?;
        self.link_order.retain(|l| *l != id);
        log::debug!("removed link {id}");
        self.graph.remove_edge(edge)
    }

    pub fn remove_links_where(&mut self, pred: impl Fn(&Link) -> bool) -> Vec<Link> {
        let doomed: Vec<LinkId> = self.links().filter(|l| pred(l)).map(|l| l.id).collect();
        doomed.into_iter().filter_map(|id| self.remove_link(id)).collect()
    }

    /// Links in creation order.
    pub fn links(&self) -> impl Iterator<Item = &Link> + '_ {
        self.link_order.iter().filter_map(|id| self.link(*id))
    }

    /// Nodes then links, in draw order.
    pub fn entities(&self) -> impl Iterator<Item = EntityRef<'_>> + '_ {
        self.nodes()
            .map(EntityRef::Node)
            .chain(self.links().map(EntityRef::Link))
    }

    // ─── Routes ──────────────────────────────────────────────────────────

    /// Mark every route stale (pan or zoom changed).
    pub fn invalidate_routes(&mut self) {
        for edge in self.link_index.values() {
            self.graph[*edge].mark_dirty();
        }
    }

    /// Recompute every dirty route. Returns how many were recomputed.
    pub fn refresh_routes(&mut self) -> usize {
        let edges: Vec<EdgeIndex> = self.link_order.iter().filter_map(|id| self.link_index.get(id).copied()).collect();
        edges.into_iter().filter(|e| self.refresh_edge(*e)).count()
    }

    /// Current route of `id`, recomputed first if stale.
    pub fn route(&mut self, id: LinkId) -> Option<&[Point]> {
        let edge = *self.link_index.get(&id)?;
        self.refresh_edge(edge);
        Some(self.graph[edge].path())
    }

    fn refresh_edge(&mut self, edge: EdgeIndex) -> bool {
        let (src, dst) = match self.graph.edge_endpoints(edge) {
            Some((a, b)) => (Some(self.graph[a].bounds()), Some(self.graph[b].bounds())),
            None => (None, None),
        };
        let router = self.router;
        let recomputed = self.graph[edge].refresh(&router, src, dst);
        if recomputed {
            self.stats.misses += 1;
        } else {
            self.stats.hits += 1;
        }
        recomputed
    }

    /// Outgoing and incoming edges of `idx`, each once (a self-link is
    /// reported by both directions).
    fn incident_edges(&self, idx: NodeIndex) -> Vec<EdgeIndex> {
        let mut edges: Vec<EdgeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| e.id())
            .collect();
        edges.sort();
        edges.dedup();
        edges
    }

    fn mark_links_dirty(&mut self, idx: NodeIndex) {
        for edge in self.incident_edges(idx) {
            self.graph[edge].mark_dirty();
        }
    }
}
