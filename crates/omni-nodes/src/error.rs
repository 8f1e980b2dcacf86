//! Error types for the node network.

use omni_store::StoreError;
use omni_types::NodeId;
use omni_world::WorldError;

/// Errors that can occur while looking up, resolving or persisting nodes.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// An identifier that does not name a node, or names an object that no
    /// longer exists. Nothing is registered when this is returned.
    #[error("invalid node identifier {id}: {reason}")]
    InvalidArgument {
        /// The offending identifier.
        id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No sink is reachable from a producer, or no eligible next hop could
    /// be pathed to. The producer's downstream group stays unresolved.
    #[error("no downstream route for node {node}: {reason}")]
    NoRouteFound {
        /// The producer being resolved.
        node: NodeId,
        /// What failed.
        reason: String,
    },

    /// A persisted cache group was absent or past its refresh interval.
    /// Signals fall-through to recomputation; never returned to callers.
    #[error("cached data for node {0} is missing or stale")]
    StaleData(NodeId),

    /// The persistent store failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// A world query or construction request failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}

impl NodeError {
    /// Shorthand for [`NodeError::InvalidArgument`].
    pub fn invalid(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`NodeError::NoRouteFound`].
    pub fn no_route(node: &NodeId, reason: impl Into<String>) -> Self {
        Self::NoRouteFound {
            node: node.clone(),
            reason: reason.into(),
        }
    }
}
