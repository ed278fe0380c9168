//! Shared utilities and strongly-typed common values for the brook workspace crates.
//!
//! ```rust
//! use bcommon::{GenerationOptions, MetadataMap, SessionId, TraceId};
//!
//! let conversation = SessionId::from("conversation-1");
//! let trace = TraceId::new("trace-1");
//! let mut metadata = MetadataMap::new();
//! metadata.insert("tenant".to_string(), "acme".to_string());
//!
//! let options = GenerationOptions::default().with_temperature(0.3).with_top_p(0.9);
//! assert_eq!(conversation.as_str(), "conversation-1");
//! assert_eq!(trace.to_string(), "trace-1");
//! assert_eq!(options.top_p, Some(0.9));
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use bcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Conversation and trace identifier newtypes plus free-form metadata.

    use std::collections::HashMap;
    use std::fmt::{Display, Formatter};

    pub type MetadataMap = HashMap<String, String>;

    macro_rules! string_id {
        ($(#[$meta:meta])* $name:ident) => {
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(String);

            impl $name {
                pub fn new(value: impl Into<String>) -> Self {
                    Self(value.into())
                }

                pub fn as_str(&self) -> &str {
                    &self.0
                }

                pub fn into_inner(self) -> String {
                    self.0
                }
            }

            impl Display for $name {
                fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl AsRef<str> for $name {
                fn as_ref(&self) -> &str {
                    &self.0
                }
            }

            impl From<String> for $name {
                fn from(value: String) -> Self {
                    Self(value)
                }
            }

            impl From<&str> for $name {
                fn from(value: &str) -> Self {
                    Self(value.to_string())
                }
            }
        };
    }

    string_id!(
        /// Identifies one conversation (the unit that owns a transcript, a title and usage rows).
        SessionId
    );

    string_id!(
        /// Correlates log lines and hook callbacks belonging to one turn.
        TraceId
    );
}

pub mod model {
    //! Decoding parameters shared by request builders and engine configuration.
    //!
    //! ```rust
    //! use bcommon::GenerationOptions;
    //!
    //! let options = GenerationOptions::standard();
    //! assert_eq!(options.temperature, Some(1.0));
    //! assert_eq!(options.top_p, Some(1.0));
    //! assert!(!options.stream);
    //! ```

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct GenerationOptions {
        pub temperature: Option<f32>,
        pub top_p: Option<f32>,
        pub max_tokens: Option<u32>,
        pub stream: bool,
    }

    impl GenerationOptions {
        pub const DEFAULT_TEMPERATURE: f32 = 1.0;
        pub const DEFAULT_TOP_P: f32 = 1.0;

        /// Parameters applied to new conversations when nothing else is configured.
        pub fn standard() -> Self {
            Self {
                temperature: Some(Self::DEFAULT_TEMPERATURE),
                top_p: Some(Self::DEFAULT_TOP_P),
                max_tokens: None,
                stream: false,
            }
        }

        pub fn with_temperature(mut self, temperature: f32) -> Self {
            self.temperature = Some(temperature);
            self
        }

        pub fn with_top_p(mut self, top_p: f32) -> Self {
            self.top_p = Some(top_p);
            self
        }

        pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
            self.max_tokens = Some(max_tokens);
            self
        }

        pub fn with_streaming(mut self, stream: bool) -> Self {
            self.stream = stream;
            self
        }

        pub fn enable_streaming(self) -> Self {
            self.with_streaming(true)
        }
    }
}

pub mod registry {
    //! Name-keyed map whose iteration order follows the keys, so anything rendered from it
    //! (tool schema lists in particular) is stable between requests.
    //!
    //! ```rust
    //! use bcommon::Registry;
    //!
    //! let mut registry = Registry::new();
    //! registry.insert("summarize".to_string(), 2_u32);
    //! registry.insert("get_file_text".to_string(), 1_u32);
    //!
    //! assert_eq!(registry.get("get_file_text"), Some(&1));
    //! assert_eq!(registry.values().copied().collect::<Vec<_>>(), vec![1, 2]);
    //! ```

    use std::borrow::Borrow;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone)]
    pub struct Registry<K, V> {
        entries: BTreeMap<K, V>,
    }

    impl<K: Ord, V> Default for Registry<K, V> {
        fn default() -> Self {
            Self {
                entries: BTreeMap::new(),
            }
        }
    }

    impl<K: Ord, V> Registry<K, V> {
        pub fn new() -> Self {
            Self::default()
        }

        /// Returns the entry that was replaced, if any.
        pub fn insert(&mut self, key: K, value: V) -> Option<V> {
            self.entries.insert(key, value)
        }

        pub fn get<Q>(&self, key: &Q) -> Option<&V>
        where
            K: Borrow<Q>,
            Q: Ord + ?Sized,
        {
            self.entries.get(key)
        }

        pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
        where
            K: Borrow<Q>,
            Q: Ord + ?Sized,
        {
            self.entries.remove(key)
        }

        pub fn contains_key<Q>(&self, key: &Q) -> bool
        where
            K: Borrow<Q>,
            Q: Ord + ?Sized,
        {
            self.entries.contains_key(key)
        }

        pub fn keys(&self) -> impl Iterator<Item = &K> {
            self.entries.keys()
        }

        /// Values in key order.
        pub fn values(&self) -> impl Iterator<Item = &V> {
            self.entries.values()
        }

        pub fn len(&self) -> usize {
            self.entries.len()
        }

        pub fn is_empty(&self) -> bool {
            self.entries.is_empty()
        }
    }
}

pub mod time {
    //! Deadline arithmetic that tolerates "effectively forever" timeouts.
    //!
    //! ```rust
    //! use std::time::Duration;
    //!
    //! use bcommon::deadline_after;
    //!
    //! assert!(deadline_after(Duration::from_secs(5)).is_some());
    //! assert!(deadline_after(Duration::MAX).is_none());
    //! ```

    use std::time::{Duration, Instant};

    /// `None` when `timeout` lands past what `Instant` can represent. Callers treat that as
    /// no deadline at all.
    pub fn deadline_after(timeout: Duration) -> Option<Instant> {
        Instant::now().checked_add(timeout)
    }

    /// `timeout` when a timer for it can be armed, `None` when it should be waited out
    /// without one.
    pub fn armable(timeout: Duration) -> Option<Duration> {
        deadline_after(timeout).map(|_| timeout)
    }
}

pub use context::{MetadataMap, SessionId, TraceId};
pub use future::BoxFuture;
pub use model::GenerationOptions;
pub use registry::Registry;
pub use time::{armable, deadline_after};
