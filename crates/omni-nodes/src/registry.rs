//! The node directory.
//!
//! The [`Registry`] is the single owner of every live [`Node`]. It is an
//! explicit value held by the orchestrator, so tests can build as many
//! independent registries as they like. Lookups create nodes on demand:
//! first from the persistent store, then by classifying the world object.
//!
//! The registry also remembers the order nodes were first discovered in.
//! That order is the tie-breaker for sink and next-hop selection, so it is
//! persisted under [`REGISTRY_ORDER_KEY`] and restored by [`Registry::load`].

use std::collections::BTreeMap;

use omni_store::{KeyValueStore, NODE_KEY_PREFIX, node_key};
use omni_types::{NodeId, NodeKind, NodeRecord, ObjectId, RegionId};
use omni_world::{ConstructionService, WorldQuery, classify, owner_candidates};
use tracing::{debug, info, warn};

use crate::config::NetworkConfig;
use crate::error::NodeError;
use crate::network::Network;
use crate::node::Node;

/// Store key holding the first-discovered order of all registered nodes.
pub const REGISTRY_ORDER_KEY: &str = "registry:order";

/// Directory of live nodes, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    nodes: BTreeMap<NodeId, Node>,
    order: Vec<NodeId>,
    resolutions: u64,
}

impl Registry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            order: Vec::new(),
            resolutions: 0,
        }
    }

    /// Rebuild a registry from every node record in `store`.
    ///
    /// Nodes listed under [`REGISTRY_ORDER_KEY`] come first, in that order;
    /// any remaining records follow in key order. Unreadable records are
    /// skipped with a warning.
    pub fn load<S: KeyValueStore>(store: &S) -> Result<Self, NodeError> {
        let mut ids: Vec<NodeId> = store
            .get_json::<Vec<NodeId>>(REGISTRY_ORDER_KEY)?
            .unwrap_or_default();
        for key in store.keys_with_prefix(NODE_KEY_PREFIX) {
            if let Some(raw) = key.strip_prefix(NODE_KEY_PREFIX) {
                let id = NodeId::new(raw);
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }

        let mut registry = Self::new();
        for id in ids {
            match store.get_json::<NodeRecord>(&node_key(id.as_str())) {
                Ok(Some(record)) => {
                    let node = Node::from_record(id.clone(), record);
                    registry.nodes.insert(id.clone(), node);
                    registry.order.push(id);
                }
                Ok(None) => debug!(node = %id, "Ordered node has no record, skipping"),
                Err(err) => warn!(node = %id, %err, "Unreadable node record, skipping"),
            }
        }
        info!(nodes = registry.len(), "Registry loaded from store");
        Ok(registry)
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no node is registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if `id` is registered.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// A registered node, without creating it.
    pub fn peek(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub(crate) fn peek_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// All nodes in first-discovered order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Sink nodes in first-discovered order.
    pub fn sinks(&self) -> impl Iterator<Item = &Node> {
        self.iter().filter(|node| node.is_sink())
    }

    /// Ids of producer nodes in first-discovered order.
    pub fn producer_ids(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|node| node.kind() == NodeKind::Producer)
            .map(|node| node.id().clone())
            .collect()
    }

    /// Ids of producers whose resolved next hop is `id`.
    pub(crate) fn routed_through(&self, id: &NodeId) -> Vec<NodeId> {
        self.iter()
            .filter(|node| {
                node.downstream()
                    .as_resolved()
                    .is_some_and(|downstream| &downstream.next_hop_id == id)
            })
            .map(|node| node.id().clone())
            .collect()
    }

    /// How many downstream resolutions this registry has run.
    pub const fn resolutions(&self) -> u64 {
        self.resolutions
    }

    pub(crate) const fn note_resolution(&mut self) {
        self.resolutions = self.resolutions.saturating_add(1);
    }

    /// Look up a node, creating it on first use.
    ///
    /// An unregistered id is hydrated from its persisted record if one
    /// exists, or else classified from the live world object. Either way
    /// the node is written back to the store and registered, so repeated
    /// calls return the same instance.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::InvalidArgument`] if there is no record and the
    /// world object is missing or is not a resource or spawn.
    pub fn get<W, S>(&mut self, id: &NodeId, world: &W, store: &mut S) -> Result<&Node, NodeError>
    where
        W: WorldQuery + ?Sized,
        S: KeyValueStore,
    {
        self.ensure(id, world, store)?;
        self.nodes
            .get(id)
            .ok_or_else(|| NodeError::invalid(id.as_str(), "node vanished from registry"))
    }

    pub(crate) fn ensure<W, S>(&mut self, id: &NodeId, world: &W, store: &mut S) -> Result<(), NodeError>
    where
        W: WorldQuery + ?Sized,
        S: KeyValueStore,
    {
        if self.nodes.contains_key(id) {
            return Ok(());
        }

        let node = if let Some(record) = store.get_json::<NodeRecord>(&node_key(id.as_str()))? {
            debug!(node = %id, kind = ?record.kind, "Node hydrated from store");
            Node::from_record(id.clone(), record)
        } else {
            let object = world
                .object(&ObjectId::from(id))
                .ok_or_else(|| NodeError::invalid(id.as_str(), "object does not exist"))?;
            let kind = classify(&object)
                .ok_or_else(|| NodeError::invalid(id.as_str(), "object is not a resource or spawn"))?;
            info!(node = %id, ?kind, origin = %object.pos, "Node created");
            Node::new(id.clone(), kind, object.pos)
        };

        self.nodes.insert(id.clone(), node);
        self.order.push(id.clone());
        self.persist(id, store)?;
        store.set_json(REGISTRY_ORDER_KEY, &self.order)?;
        Ok(())
    }

    /// Write the current state of `id` to the store.
    pub(crate) fn persist<S: KeyValueStore>(&self, id: &NodeId, store: &mut S) -> Result<(), NodeError> {
        if let Some(node) = self.nodes.get(id) {
            store.set_json(&node_key(id.as_str()), &node.to_record())?;
        }
        Ok(())
    }

    /// The node `object_id` is or belongs to.
    ///
    /// Returns `Ok(None)` for objects that are not part of any node, such
    /// as roads or an unassigned transport unit. When several owners are
    /// possible, a registered one wins, then one with a persisted record,
    /// then the first candidate.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::InvalidArgument`] if the object no longer
    /// exists or its owner cannot be made into a node.
    pub fn node_for_object<W, S>(
        &mut self,
        object_id: &ObjectId,
        world: &W,
        store: &mut S,
    ) -> Result<Option<NodeId>, NodeError>
    where
        W: WorldQuery + ?Sized,
        S: KeyValueStore,
    {
        let object = world
            .object(object_id)
            .ok_or_else(|| NodeError::invalid(object_id.as_str(), "object does not exist"))?;
        let candidates: Vec<NodeId> = owner_candidates(world, &object)
            .iter()
            .map(NodeId::from)
            .collect();

        let mut owner = candidates.iter().find(|id| self.contains(id)).cloned();
        if owner.is_none() {
            for candidate in &candidates {
                if store.get_raw(&node_key(candidate.as_str()))?.is_some() {
                    owner = Some(candidate.clone());
                    break;
                }
            }
        }
        let Some(owner) = owner.or_else(|| candidates.first().cloned()) else {
            return Ok(None);
        };

        self.ensure(&owner, world, store)?;
        Ok(Some(owner))
    }

    /// Register every resource and spawn in `regions`.
    ///
    /// Regions are scanned in the order given and objects in world order,
    /// which fixes the first-discovered order for fresh registries.
    /// Returns the ids of newly registered nodes.
    pub fn discover<W, S>(&mut self, world: &W, store: &mut S, regions: &[RegionId]) -> Result<Vec<NodeId>, NodeError>
    where
        W: WorldQuery + ?Sized,
        S: KeyValueStore,
    {
        let mut added = Vec::new();
        for region in regions {
            for object in world.objects_in_region(region) {
                if classify(&object).is_none() {
                    continue;
                }
                let id = NodeId::from(&object.id);
                if self.contains(&id) {
                    continue;
                }
                self.ensure(&id, world, store)?;
                added.push(id);
            }
        }
        if !added.is_empty() {
            info!(added = added.len(), total = self.len(), "Nodes discovered");
        }
        Ok(added)
    }

    /// Open a per-tick session over this registry.
    pub const fn session<'a, W, S, B>(
        &'a mut self,
        world: &'a W,
        store: &'a mut S,
        builder: &'a mut B,
        config: &'a NetworkConfig,
        tick: u64,
    ) -> Network<'a, W, S, B>
    where
        W: WorldQuery + ?Sized,
        S: KeyValueStore,
        B: ConstructionService + ?Sized,
    {
        Network::new(self, world, store, builder, config, tick)
    }
}
