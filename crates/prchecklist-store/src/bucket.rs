//! Named partitions of the key space.

use std::fmt;

/// A bucket: a named key/value partition inside the store file.
///
/// Keys are strings, values are encoded records. Each bucket is backed by its
/// own table with the same two-column shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    /// Key: decimal user id. Value: encoded `User`.
    Users,
    /// Key: canonical checklist reference. Value: encoded `CheckSet`.
    Checks,
}

impl Bucket {
    pub const ALL: [Bucket; 2] = [Bucket::Users, Bucket::Checks];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Checks => "checks",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
