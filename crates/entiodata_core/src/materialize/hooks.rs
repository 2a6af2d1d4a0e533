//! Optional hooks around reverse materialization.

use crate::accessor::RecordData;
use crate::entity::{WireEntity, WireProperty};
use crate::error::CoreResult;

/// The wire value a record is being populated from.
#[derive(Debug, Clone, Copy)]
pub enum WireSource<'a> {
    /// A full entity.
    Entity(&'a WireEntity),
    /// The properties of a complex value.
    Complex(&'a [WireProperty]),
}

/// Extension points invoked around populating one record from wire data.
///
/// Both methods default to doing nothing. Typical implementations fill
/// derived fields in `after_materialize`.
pub trait MaterializeHooks: Send + Sync {
    /// Called on the freshly allocated record, before any field is set.
    fn before_materialize(&self, record: &mut RecordData, source: WireSource<'_>) -> CoreResult<()> {
        let _ = (record, source);
        Ok(())
    }

    /// Called once every field (and inline link) has been set.
    fn after_materialize(&self, record: &mut RecordData, source: WireSource<'_>) -> CoreResult<()> {
        let _ = (record, source);
        Ok(())
    }
}
