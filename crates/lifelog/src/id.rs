//! Record identity.

use uuid::Uuid;

/// Generate a fresh record id: a random 128-bit UUID in canonical
/// lowercase hyphenated form.
///
/// No ordering is implied between ids.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
