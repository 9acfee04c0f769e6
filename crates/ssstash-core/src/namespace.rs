//! Namespaced object access
//!
//! Maps secret names to `prefix + name` within one bucket and reads and
//! writes serialized envelopes there.

use crate::backend::ObjectStore;
use crate::error::{Error, Result};
use crate::types::{EncryptedObject, Namespace};
use futures::Stream;
use tracing::debug;

/// Envelope storage scoped to a [`Namespace`]
pub struct ObjectNamespace<S> {
    store: S,
    namespace: Namespace,
}

/// Where the next listing request resumes
enum Cursor {
    Start,
    After(String),
    Exhausted,
}

struct ListState {
    buffered: std::vec::IntoIter<String>,
    cursor: Cursor,
}

impl<S: ObjectStore> ObjectNamespace<S> {
    pub fn new(store: S, namespace: Namespace) -> Self {
        Self { store, namespace }
    }

    /// Get the namespace
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Get the underlying object store
    pub fn store(&self) -> &S {
        &self.store
    }

    fn key_for(&self, name: &str) -> Result<String> {
        if name.is_empty() {
            return Err(Error::InvalidName);
        }
        Ok(self.namespace.storage_key(name))
    }

    /// Store an envelope under `name`, replacing any previous one
    pub async fn write(&self, name: &str, object: &EncryptedObject) -> Result<()> {
        let key = self.key_for(name)?;
        let body = object.to_bytes()?;
        self.store
            .put_object(self.namespace.bucket(), &key, body)
            .await
    }

    /// Fetch the envelope stored under `name`
    pub async fn read(&self, name: &str) -> Result<EncryptedObject> {
        let key = self.key_for(name)?;
        let body = self
            .store
            .get_object(self.namespace.bucket(), &key)
            .await?
            .ok_or_else(|| Error::not_found(name))?;
        EncryptedObject::from_bytes(&body)
    }

    /// Remove the envelope stored under `name`; absent names are not an error
    pub async fn delete(&self, name: &str) -> Result<()> {
        let key = self.key_for(name)?;
        self.store
            .delete_object(self.namespace.bucket(), &key)
            .await
    }

    /// Lazily enumerate secret names in this namespace
    ///
    /// Pages are fetched only when the buffered names run out, so dropping
    /// the stream stops further backend requests. A backend error is yielded
    /// once and ends the stream.
    pub fn list(&self) -> impl Stream<Item = Result<String>> + '_ {
        let state = ListState {
            buffered: Vec::new().into_iter(),
            cursor: Cursor::Start,
        };

        futures::stream::unfold(state, move |mut state| async move {
            loop {
                while let Some(key) = state.buffered.next() {
                    if let Some(name) = self.namespace.strip(&key).filter(|n| !n.is_empty()) {
                        let name = name.to_string();
                        return Some((Ok(name), state));
                    }
                    debug!("Skipping key outside namespace: {}", key);
                }

                let continuation = match std::mem::replace(&mut state.cursor, Cursor::Exhausted) {
                    Cursor::Exhausted => return None,
                    Cursor::Start => None,
                    Cursor::After(token) => Some(token),
                };

                match self
                    .store
                    .list_page(self.namespace.bucket(), self.namespace.prefix(), continuation)
                    .await
                {
                    Ok(page) => {
                        debug!("Fetched page of {} keys", page.keys.len());
                        state.buffered = page.keys.into_iter();
                        if let Some(next) = page.next {
                            state.cursor = Cursor::After(next);
                        }
                    }
                    Err(e) => return Some((Err(e), state)),
                }
            }
        })
    }
}

impl<S> std::fmt::Debug for ObjectNamespace<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectNamespace")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
