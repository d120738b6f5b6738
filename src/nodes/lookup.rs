//! Reverse lookups from a node candidate to the node it describes

use crate::domain::model::{ByonNode, EdgeNode, NodeCandidate};
use crate::domain::ports::PersistenceGateway;
use crate::error::Result;

/// BYON node whose candidate reference is `candidate`, if any
pub async fn byon_node_for_candidate(
    store: &dyn PersistenceGateway,
    candidate: &NodeCandidate,
) -> Result<Option<ByonNode>> {
    Ok(store
        .list_byon_nodes()
        .await?
        .into_iter()
        .find(|node| node.node_candidate_id == candidate.id))
}

/// Edge node whose candidate reference is `candidate`, if any
pub async fn edge_node_for_candidate(
    store: &dyn PersistenceGateway,
    candidate: &NodeCandidate,
) -> Result<Option<EdgeNode>> {
    Ok(store
        .list_edge_nodes()
        .await?
        .into_iter()
        .find(|node| node.node_candidate_id == candidate.id))
}
