//! Non-destructive merge of derived attributes into a document section.
//!
//! Template-supplied values always win: an attribute is written only when the
//! object does not define it yet, and objects missing from the document are
//! created only when the caller's policy allows it.

use crate::document::Section;

/// Merges `attrs` into `section[key]`. Returns whether the object exists
/// after the call (false means the derived attributes were discarded because
/// the object was unknown and auto-creation is disabled).
pub fn merge_object(
    section: &mut Section,
    key: &str,
    attrs: &[(&str, String)],
    autocreate: bool,
) -> bool {
    if !section.contains(key) {
        if !autocreate {
            tracing::debug!(key, "skipping attributes for unknown object");
            return false;
        }
        section.entry(key);
    }
    let Some(block) = section.get_mut(key) else {
        return false;
    };
    for (name, value) in attrs {
        block.set_scalar_if_absent(name, value);
    }
    true
}
