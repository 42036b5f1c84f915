//! Identifiers shaped like document-database object ids: 24 lowercase
//! hex characters where the first 8 encode the creation time in Unix
//! seconds. The client relies on that prefix to render timestamps.

use uuid::Uuid;

pub fn object_id_at(unix_secs: i64) -> String {
    let random = Uuid::new_v4();
    let tail: String = random.as_bytes()[..8]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect();
    format!("{:08x}{}", unix_secs as u32, tail)
}
