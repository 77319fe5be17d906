use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Generate a session auth token: 32 random bytes, lower-hex encoded.
pub fn new_token() -> String {
    let bytes: [u8; 32] = rand::random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Opaque identifier for one live widget. Never reused after removal.
    WidgetHandle
);
string_id!(
    /// Identifier of a top-level window.
    WindowId
);
string_id!(
    /// Identifier the logic process uses to route a pushed callback event.
    CallbackId
);

/// Monotonic id source. Ids are `{prefix}_{n}` and `n` only ever grows,
/// so an id handed out once is never produced again by the same allocator.
#[derive(Debug, Default)]
pub struct HandleAllocator {
    next: AtomicU64,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_raw(&self, prefix: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}_{n}")
    }

    pub fn widget(&self, prefix: &str) -> WidgetHandle {
        WidgetHandle(self.next_raw(prefix))
    }

    pub fn callback(&self) -> CallbackId {
        CallbackId(self.next_raw("cb"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_64_hex_chars() {
        let token = new_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(new_token(), new_token());
    }

    #[test]
    fn allocator_never_repeats() {
        let alloc = HandleAllocator::new();
        let a = alloc.widget("label");
        let b = alloc.widget("label");
        let c = alloc.widget("button");
        assert_eq!(a.as_str(), "label_1");
        assert_eq!(b.as_str(), "label_2");
        assert_eq!(c.as_str(), "button_3");
    }

    #[test]
    fn callback_ids_share_the_counter() {
        let alloc = HandleAllocator::new();
        let _ = alloc.widget("vbox");
        assert_eq!(alloc.callback().as_str(), "cb_2");
    }

    #[test]
    fn widget_handle_serializes_as_plain_string() {
        let h = WidgetHandle::new("vbox_7");
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, "\"vbox_7\"");
        let back: WidgetHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }
}
