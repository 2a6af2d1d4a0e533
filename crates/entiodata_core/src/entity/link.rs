//! Navigation links.

use super::WireEntity;
use serde::Serialize;

/// A navigation link of a wire entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireLink {
    /// Navigation property name.
    pub name: String,
    /// Link payload.
    #[serde(flatten)]
    pub kind: LinkKind,
}

/// Payload of a navigation link.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "link", rename_all = "snake_case")]
pub enum LinkKind {
    /// A reference with no target data.
    Deferred {
        /// Whether the far end is a collection.
        collection: bool,
    },
    /// An expanded single-valued navigation; `None` when nothing is related.
    InlineEntity {
        /// The related entity.
        entity: Option<Box<WireEntity>>,
    },
    /// An expanded collection-valued navigation.
    InlineEntities {
        /// The related entities.
        entities: Vec<WireEntity>,
    },
}

impl WireLink {
    /// Creates a deferred link.
    pub fn deferred(name: impl Into<String>, collection: bool) -> Self {
        Self {
            name: name.into(),
            kind: LinkKind::Deferred { collection },
        }
    }

    /// Creates an inline single-entity link.
    pub fn inline_entity(name: impl Into<String>, entity: Option<WireEntity>) -> Self {
        Self {
            name: name.into(),
            kind: LinkKind::InlineEntity {
                entity: entity.map(Box::new),
            },
        }
    }

    /// Creates an inline collection link.
    pub fn inline_entities(name: impl Into<String>, entities: Vec<WireEntity>) -> Self {
        Self {
            name: name.into(),
            kind: LinkKind::InlineEntities { entities },
        }
    }

    /// Whether the link carries target data.
    pub fn is_inline(&self) -> bool {
        !matches!(self.kind, LinkKind::Deferred { .. })
    }

    /// Whether the link points at a collection.
    pub fn is_collection(&self) -> bool {
        match self.kind {
            LinkKind::Deferred { collection } => collection,
            LinkKind::InlineEntity { .. } => false,
            LinkKind::InlineEntities { .. } => true,
        }
    }

    /// Related entities carried inline; empty for deferred links.
    pub fn related(&self) -> Vec<&WireEntity> {
        match &self.kind {
            LinkKind::Deferred { .. } => Vec::new(),
            LinkKind::InlineEntity { entity } => entity.iter().map(|e| &**e).collect(),
            LinkKind::InlineEntities { entities } => entities.iter().collect(),
        }
    }
}
