//! Tag - port and side-parameter key.
//!
//! Tags are created once when a calculator registers its ports and cloned on
//! every wiring and lookup operation, so they wrap `Arc<str>` to make clones
//! a reference-count bump.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Reserved tag for the pipeline's external entry port.
pub const TAG_INPUT: &str = "input";

/// Reserved tag for the pipeline's external exit port.
pub const TAG_OUTPUT: &str = "output";

/// Name identifying a port or side parameter within a context.
///
/// Compares and hashes as its string content, and borrows as `&str`, so
/// tag-keyed maps can be queried with plain string literals.
///
/// # Examples
/// ```
/// use contracts::Tag;
///
/// let tag: Tag = "pixelated".into();
/// assert_eq!(tag.as_str(), "pixelated");
/// assert_eq!(tag.clone(), tag);
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Tag(Arc<str>);

impl Tag {
    /// Create a tag from a string slice.
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// The tag's string content.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Tag {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets HashMap<Tag, _> be queried with &str keys.
impl Borrow<str> for Tag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Tag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Tag {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({:?})", self.0)
    }
}

// serde cannot derive through Arc<str> without the `rc` feature, so tags
// serialize by hand as plain strings.
impl Serialize for Tag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Tag::from)
    }
}
