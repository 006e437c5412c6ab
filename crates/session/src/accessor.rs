//! Namespaced, reference-bound views over a [`SessionState`].

use crate::error::SessionError;
use crate::path::{self, ensure_object};
use crate::state::{Payload, SessionState};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::ops::{Deref, DerefMut};

/// Namespace an [`Accessor`] binds to when none is given.
pub const DEFAULT_NAMESPACE: &str = "app";

/// Which subtree of the payload a [`Binding`] addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The whole payload.
    Root,
    /// The top-level entry with this name.
    Namespace(String),
}

/// A reference to one subtree of a session payload.
///
/// Holds the shared [`SessionState`] handle and the [`Scope`] inside it. Bindings never copy
/// data, so two bindings with the same state and scope always see the same values.
#[derive(Debug, Clone)]
pub struct Binding {
    state: SessionState,
    scope: Scope,
}

impl Binding {
    #[must_use]
    pub fn root(state: &SessionState) -> Self {
        Self { state: state.clone(), scope: Scope::Root }
    }

    /// Binds namespace `name`, creating it as an empty mapping if absent.
    #[must_use]
    pub fn namespace(state: &SessionState, name: impl Into<String>) -> Self {
        let binding = Self { state: state.clone(), scope: Scope::Namespace(name.into()) };
        binding.read(|_| ());
        binding
    }

    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Returns `true` if both bindings address the same subtree of the same payload.
    #[must_use]
    pub fn same_target(&self, other: &Self) -> bool {
        self.scope == other.scope && self.state.same_state(&other.state)
    }

    /// Runs `f` over the bound subtree. A namespace holding a non-mapping reads as empty.
    fn read<R>(&self, f: impl FnOnce(&Payload) -> R) -> R {
        let mut payload = self.state.lock();
        match &self.scope {
            Scope::Root => f(&payload),
            Scope::Namespace(name) => match payload.entry(name.as_str()).or_insert_with(path::empty) {
                Value::Object(subtree) => f(subtree),
                _ => f(&Payload::new()),
            },
        }
    }

    /// Runs `f` over the bound subtree, replacing a non-mapping namespace with `{}` first.
    fn write<R>(&self, f: impl FnOnce(&mut Payload) -> R) -> R {
        let mut payload = self.state.lock();
        match &self.scope {
            Scope::Root => f(&mut payload),
            Scope::Namespace(name) => {
                f(ensure_object(payload.entry(name.as_str()).or_insert_with(path::empty)))
            },
        }
    }
}

/// A dotted-path key-value view bound to one subtree of a session payload.
///
/// The accessor owns no data. Every mutation lands in the shared payload immediately and is
/// visible to every other accessor bound to the same subtree.
///
/// Paths are dot separated (`user.profile.name`). Numeric segments index sequences; writing
/// one past the end appends. Reads through a scalar find nothing, writes through a scalar
/// replace it with a mapping. Writing a key a sequence cannot index turns the sequence into a
/// mapping that keeps each element under its position.
///
/// Namespace-scoped helpers ([`Accessor::set_to`], [`Accessor::get_from`], ...) rebind for
/// the duration of one call and restore the previous binding afterwards, also when the call
/// panics. One accessor is not meant to be shared between threads; clone it instead.
///
/// ### Example
/// ```rust
/// use keepsake_session::SessionState;
/// use serde_json::json;
///
/// let state = SessionState::new();
/// let mut session = state.accessor();
///
/// session.set("user.id", json!(42));
/// session.set_to("flash", "notice", json!("Saved"));
///
/// assert_eq!(session.get("user.id"), Some(json!(42)));
/// assert_eq!(session.namespace(), Some("app"));
/// assert_eq!(state.namespace("flash").get("notice"), Some(json!("Saved")));
/// ```
#[derive(Debug, Clone)]
pub struct Accessor {
    binding: Binding,
}

impl Accessor {
    /// Binds to [`DEFAULT_NAMESPACE`].
    #[must_use]
    pub fn new(state: &SessionState) -> Self {
        Self::with_namespace(state, DEFAULT_NAMESPACE)
    }

    #[must_use]
    pub fn with_namespace(state: &SessionState, name: impl Into<String>) -> Self {
        Self { binding: Binding::namespace(state, name) }
    }

    /// Binds to the whole payload; namespaces appear as top-level keys.
    #[must_use]
    pub fn root(state: &SessionState) -> Self {
        Self { binding: Binding::root(state) }
    }

    // --- Binding ---

    /// Rebinds to another subtree. Nothing is copied.
    pub fn bind(&mut self, binding: Binding) {
        self.binding = binding;
    }

    /// Rebinds to namespace `name` of the current payload, creating it if absent.
    pub fn bind_namespace(&mut self, name: impl Into<String>) {
        self.binding = Binding::namespace(&self.binding.state, name);
    }

    #[must_use]
    pub const fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Name of the bound namespace, `None` when bound to the root.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        match &self.binding.scope {
            Scope::Root => None,
            Scope::Namespace(name) => Some(name.as_str()),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.binding.state
    }

    /// Runs `f` with this accessor bound to `namespace`, then restores the prior binding.
    ///
    /// The binding is restored by a drop guard, so it survives early returns and panics
    /// inside `f`.
    pub fn within<R>(&mut self, namespace: impl Into<String>, f: impl FnOnce(&mut Self) -> R) -> R {
        let target = Binding::namespace(&self.binding.state, namespace);
        let mut guard = Rebound::new(self, target);
        f(&mut *guard)
    }

    // --- Reads ---

    /// Value at `path`, or `None` if any segment is missing or not traversable.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Value> {
        self.binding.read(|subtree| path::lookup(subtree, path).cloned())
    }

    #[must_use]
    pub fn get_or(&self, path: &str, default: Value) -> Value {
        self.get(path).unwrap_or(default)
    }

    /// Value at `path` deserialized into `T`.
    ///
    /// # Errors
    /// Returns [`SessionError::Serialization`] if the stored value does not fit `T`.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, SessionError> {
        self.get(path).map(serde_json::from_value::<T>).transpose().map_err(SessionError::from)
    }

    /// The whole bound subtree.
    #[must_use]
    pub fn all(&self) -> Payload {
        self.binding.read(Payload::clone)
    }

    /// `true` if `path` resolves to an entry, including a `null` one.
    #[must_use]
    pub fn has(&self, path: &str) -> bool {
        self.binding.read(|subtree| path::lookup(subtree, path).is_some())
    }

    // --- Writes ---

    /// Sets one dotted path, creating intermediate mappings.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        let value = value.into();
        self.binding.write(|subtree| path::assign(subtree, path, value));
    }

    /// Shallow-merges `entries` into the top level of the bound subtree.
    ///
    /// `entries` is drained before the payload is locked, so it may read the same session.
    pub fn merge(&mut self, entries: impl IntoIterator<Item = (String, Value)>) {
        let entries: Vec<_> = entries.into_iter().collect();
        self.binding.write(|subtree| subtree.extend(entries));
    }

    /// Appends to the sequence at `path`; anything else behaves like [`Accessor::set`].
    pub fn add(&mut self, path: &str, value: impl Into<Value>) {
        let value = value.into();
        self.binding.write(|subtree| path::append(subtree, path, value));
    }

    // --- Deletes ---

    /// Removes the entry at `path`. Absent paths are ignored.
    pub fn delete(&mut self, path: &str) {
        self.binding.write(|subtree| {
            path::remove(subtree, path);
        });
    }

    pub fn delete_many<'p>(&mut self, paths: impl IntoIterator<Item = &'p str>) {
        let paths: Vec<_> = paths.into_iter().collect();
        self.binding.write(|subtree| {
            for path in paths {
                path::remove(subtree, path);
            }
        });
    }

    /// Empties the bound subtree. The subtree itself stays.
    pub fn clear(&mut self) {
        self.binding.write(Payload::clear);
    }

    /// Removes the entry at `path`, or replaces it with `{}` when `reset_to_empty` is set.
    pub fn clear_path(&mut self, path: &str, reset_to_empty: bool) {
        self.binding.write(|subtree| {
            if reset_to_empty {
                path::assign(subtree, path, path::empty());
            } else {
                path::remove(subtree, path);
            }
        });
    }

    // --- Namespace-scoped ---

    pub fn set_to(&mut self, namespace: impl Into<String>, path: &str, value: impl Into<Value>) {
        self.within(namespace, |acc| acc.set(path, value));
    }

    pub fn merge_into(
        &mut self,
        namespace: impl Into<String>,
        entries: impl IntoIterator<Item = (String, Value)>,
    ) {
        self.within(namespace, |acc| acc.merge(entries));
    }

    pub fn add_to(&mut self, namespace: impl Into<String>, path: &str, value: impl Into<Value>) {
        self.within(namespace, |acc| acc.add(path, value));
    }

    pub fn get_from(&mut self, namespace: impl Into<String>, path: &str) -> Option<Value> {
        self.within(namespace, |acc| acc.get(path))
    }

    pub fn get_from_or(
        &mut self,
        namespace: impl Into<String>,
        path: &str,
        default: Value,
    ) -> Value {
        self.within(namespace, |acc| acc.get_or(path, default))
    }

    pub fn has_in(&mut self, namespace: impl Into<String>, path: &str) -> bool {
        self.within(namespace, |acc| acc.has(path))
    }

    pub fn delete_from(&mut self, namespace: impl Into<String>, path: &str) {
        self.within(namespace, |acc| acc.delete(path));
    }

    /// Empties namespace `namespace`, leaving it in place as `{}`.
    pub fn clear_from(&mut self, namespace: impl Into<String>) {
        self.within(namespace, Self::clear);
    }

    /// [`Accessor::clear_path`] inside `namespace`.
    pub fn clear_path_in(
        &mut self,
        namespace: impl Into<String>,
        path: &str,
        reset_to_empty: bool,
    ) {
        self.within(namespace, |acc| acc.clear_path(path, reset_to_empty));
    }
}

/// Holds an accessor rebound to another subtree and puts the saved binding back on drop.
struct Rebound<'a> {
    accessor: &'a mut Accessor,
    saved: Option<Binding>,
}

impl<'a> Rebound<'a> {
    fn new(accessor: &'a mut Accessor, target: Binding) -> Self {
        let saved = std::mem::replace(&mut accessor.binding, target);
        Self { accessor, saved: Some(saved) }
    }
}

impl Deref for Rebound<'_> {
    type Target = Accessor;

    fn deref(&self) -> &Accessor {
        self.accessor
    }
}

impl DerefMut for Rebound<'_> {
    fn deref_mut(&mut self) -> &mut Accessor {
        self.accessor
    }
}

impl Drop for Rebound<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.accessor.binding = saved;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn construction_creates_the_namespace() {
        let state = SessionState::new();
        let _acc = Accessor::new(&state);

        assert_eq!(Value::Object(state.snapshot()), json!({ "app": {} }));
    }

    #[test]
    fn root_binding_sees_namespaces_as_keys() {
        let state = SessionState::new();
        let mut app = state.accessor();
        app.set("theme", "dark");

        let root = Accessor::root(&state);
        assert_eq!(root.namespace(), None);
        assert_eq!(root.get("app.theme"), Some(json!("dark")));
    }

    #[test]
    fn within_restores_after_early_return_value() {
        let state = SessionState::new();
        let mut acc = state.accessor();

        let seen = acc.within("other", |inner| inner.namespace().map(str::to_owned));

        assert_eq!(seen.as_deref(), Some("other"));
        assert_eq!(acc.namespace(), Some(DEFAULT_NAMESPACE));
    }

    #[test]
    fn within_restores_even_if_inner_rebinds() {
        let state = SessionState::new();
        let mut acc = state.accessor();

        acc.within("one", |inner| inner.bind_namespace("two"));

        assert_eq!(acc.namespace(), Some(DEFAULT_NAMESPACE));
    }

    #[test]
    fn scalar_namespace_reads_empty_and_is_replaced_on_write() {
        let state = SessionState::new();
        Accessor::root(&state).set("ns", 7);

        let mut acc = state.namespace("ns");
        assert!(acc.all().is_empty());
        assert_eq!(Accessor::root(&state).get("ns"), Some(json!(7)));

        acc.set("k", true);
        assert_eq!(Accessor::root(&state).get("ns"), Some(json!({ "k": true })));
    }

    #[test]
    fn get_as_reports_type_mismatch() {
        let state = SessionState::new();
        let mut acc = state.accessor();
        acc.set("user.id", 42);
        acc.set("user.name", "ada");

        assert_eq!(acc.get_as::<u64>("user.id").unwrap(), Some(42));
        assert_eq!(acc.get_as::<u64>("user.missing").unwrap(), None);
        assert!(matches!(acc.get_as::<u64>("user.name"), Err(SessionError::Serialization { .. })));
    }
}
