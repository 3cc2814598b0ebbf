//! Stream selection: match a requested stream against remote variants.

use crate::model::MediaStream;
use crate::source::RemoteVariant;

/// Returns the first variant whose container, quality label and size all
/// equal the requested stream's. No nearest-match fallback.
pub fn select_variant<'a>(
    wanted: &MediaStream,
    candidates: &'a [RemoteVariant],
) -> Option<&'a RemoteVariant> {
    candidates.iter().find(|v| {
        v.container == wanted.container()
            && v.quality == wanted.quality()
            && v.size_in_bytes == wanted.size_in_bytes()
    })
}
