//! Identifier newtypes and small value types shared by every pipeline stage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Per-invocation build identifier. Appears in container and image names
    /// on a shared daemon, so it is a random UUID and never reused.
    BuildId
);

impl BuildId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// The closed set of supported language toolchains.
///
/// Declaration order is the detection order: when several markers are present
/// the earliest variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Dotnet,
    Go,
    Nodejs,
    Python,
    Ruby,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Dotnet,
        Language::Go,
        Language::Nodejs,
        Language::Python,
        Language::Ruby,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Language::Dotnet => "dotnet",
            Language::Go => "go",
            Language::Nodejs => "nodejs",
            Language::Python => "python",
            Language::Ruby => "ruby",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.name() == name.trim())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered mapping from a candidate source filename to the entrypoint it implies.
///
/// Insertion order is the priority order used during handler resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HandlerMap {
    entries: Vec<(String, String)>,
}

impl HandlerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry. Replacing keeps the original position.
    pub fn insert(&mut self, file: impl Into<String>, entrypoint: impl Into<String>) {
        let file = file.into();
        let entrypoint = entrypoint.into();
        if let Some(slot) = self.entries.iter_mut().find(|(f, _)| *f == file) {
            slot.1 = entrypoint;
        } else {
            self.entries.push((file, entrypoint));
        }
    }

    pub fn get(&self, file: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| f == file)
            .map(|(_, e)| e.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(f, e)| (f.as_str(), e.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<F: Into<String>, E: Into<String>> FromIterator<(F, E)> for HandlerMap {
    fn from_iter<I: IntoIterator<Item = (F, E)>>(iter: I) -> Self {
        let mut map = HandlerMap::new();
        for (file, entrypoint) in iter {
            map.insert(file, entrypoint);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_ids_are_unique() {
        let a = BuildId::generate();
        let b = BuildId::generate();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn build_id_serializes_as_plain_string() {
        let id = BuildId::new("abc-123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc-123\"");
    }

    #[test]
    fn language_names_round_trip() {
        for lang in Language::ALL {
            assert_eq!(Language::from_name(lang.name()), Some(lang));
        }
        assert_eq!(Language::from_name(" python "), Some(Language::Python));
        assert_eq!(Language::from_name("Python"), None);
        assert_eq!(Language::from_name("rust"), None);
    }

    #[test]
    fn language_order_is_detection_order() {
        let names: Vec<_> = Language::ALL.iter().map(|l| l.name()).collect();
        assert_eq!(names, ["dotnet", "go", "nodejs", "python", "ruby"]);
    }

    #[test]
    fn handler_map_preserves_insertion_order() {
        let map: HandlerMap = [("main.py", "main.handler"), ("app.py", "app.handler")]
            .into_iter()
            .collect();
        let files: Vec<_> = map.iter().map(|(f, _)| f).collect();
        assert_eq!(files, ["main.py", "app.py"]);
    }

    #[test]
    fn handler_map_replace_keeps_position() {
        let mut map = HandlerMap::new();
        map.insert("app.py", "app.handler");
        map.insert("main.py", "main.handler");
        map.insert("app.py", "app.lambda_handler");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("app.py"), Some("app.lambda_handler"));
        assert_eq!(map.iter().next(), Some(("app.py", "app.lambda_handler")));
    }
}
