use carto_graph::{Graph, Primitive};
use carto_types::PrimitiveId;

use crate::error::MergeResult;

/// Overwrite the content of `id` in `target` with the content of `theirs`.
///
/// Identity is preserved. `modified` is cleared when `clear_modified` is set
/// and copied from `theirs` otherwise.
pub(crate) fn adopt(
    target: &mut Graph,
    id: &PrimitiveId,
    theirs: &Primitive,
    clear_modified: bool,
) -> MergeResult<()> {
    target.modify(id, |mine| {
        mine.data = theirs.data.clone();
        mine.tags = theirs.tags.clone();
        mine.version = theirs.version;
        mine.deleted = theirs.deleted;
        mine.incomplete = theirs.incomplete;
        mine.modified = !clear_modified && theirs.modified;
    })?;
    Ok(())
}
