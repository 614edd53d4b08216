//! # Interceptor Registry
//!
//! Global interceptors apply to every stanza; per-principal interceptors
//! only to stanzas of sessions bound to that principal.
//!
//! Lists are copy-on-write. Readers take the lock only long enough to clone
//! two `Arc`s, so a dispatch never holds it while calling interceptors and
//! an interceptor may itself mutate the registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use shared_types::{Principal, StanzaInterceptor};
use tracing::debug;

use super::errors::RegistryError;

type InterceptorList = Arc<Vec<Arc<dyn StanzaInterceptor>>>;

fn same(a: &Arc<dyn StanzaInterceptor>, b: &Arc<dyn StanzaInterceptor>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Insert `interceptor` at `index`, moving it if it is already listed.
fn insert_into(
    list: &[Arc<dyn StanzaInterceptor>],
    index: Option<usize>,
    interceptor: Arc<dyn StanzaInterceptor>,
) -> Result<Vec<Arc<dyn StanzaInterceptor>>, RegistryError> {
    let mut next: Vec<_> = list
        .iter()
        .filter(|existing| !same(existing, &interceptor))
        .cloned()
        .collect();
    let index = index.unwrap_or(next.len());
    if index > next.len() {
        return Err(RegistryError::IndexOutOfRange {
            index,
            len: next.len(),
        });
    }
    next.insert(index, interceptor);
    Ok(next)
}

#[derive(Default)]
struct RegistryState {
    global: InterceptorList,
    per_principal: HashMap<Principal, InterceptorList>,
}

/// Ordered interceptor collections.
#[derive(Default)]
pub struct InterceptorRegistry {
    state: RwLock<RegistryState>,
}

impl InterceptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // GLOBAL
    // =========================================================================

    /// Append a global interceptor. Adding one that is already registered
    /// moves it to the end.
    pub fn add_global(&self, interceptor: Arc<dyn StanzaInterceptor>) {
        let mut state = self.state.write();
        // Appending cannot be out of range.
        if let Ok(next) = insert_into(&state.global, None, interceptor) {
            state.global = Arc::new(next);
        }
        debug!(count = state.global.len(), "Global interceptor added");
    }

    /// Insert a global interceptor at `index`.
    pub fn add_global_at(
        &self,
        index: usize,
        interceptor: Arc<dyn StanzaInterceptor>,
    ) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        let next = insert_into(&state.global, Some(index), interceptor)?;
        state.global = Arc::new(next);
        Ok(())
    }

    /// Remove a global interceptor. Returns whether it was registered.
    pub fn remove_global(&self, interceptor: &Arc<dyn StanzaInterceptor>) -> bool {
        let mut state = self.state.write();
        if !state.global.iter().any(|i| same(i, interceptor)) {
            return false;
        }
        let next: Vec<_> = state
            .global
            .iter()
            .filter(|i| !same(i, interceptor))
            .cloned()
            .collect();
        state.global = Arc::new(next);
        true
    }

    pub fn global_interceptors(&self) -> Vec<Arc<dyn StanzaInterceptor>> {
        self.state.read().global.as_ref().clone()
    }

    // =========================================================================
    // PER PRINCIPAL
    // =========================================================================

    /// Append an interceptor for one principal. Adding one that is already
    /// registered for that principal moves it to the end.
    pub fn add_for_principal(&self, principal: &Principal, interceptor: Arc<dyn StanzaInterceptor>) {
        let mut state = self.state.write();
        let current = state
            .per_principal
            .get(principal)
            .cloned()
            .unwrap_or_default();
        if let Ok(next) = insert_into(&current, None, interceptor) {
            state.per_principal.insert(principal.clone(), Arc::new(next));
        }
        debug!(principal = %principal, "Principal interceptor added");
    }

    /// Insert an interceptor for one principal at `index`.
    pub fn add_for_principal_at(
        &self,
        principal: &Principal,
        index: usize,
        interceptor: Arc<dyn StanzaInterceptor>,
    ) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        let current = state
            .per_principal
            .get(principal)
            .cloned()
            .unwrap_or_default();
        let next = insert_into(&current, Some(index), interceptor)?;
        state.per_principal.insert(principal.clone(), Arc::new(next));
        Ok(())
    }

    /// Remove an interceptor for one principal. Returns whether it was
    /// registered.
    pub fn remove_for_principal(
        &self,
        principal: &Principal,
        interceptor: &Arc<dyn StanzaInterceptor>,
    ) -> bool {
        let mut state = self.state.write();
        let Some(current) = state.per_principal.get(principal) else {
            return false;
        };
        if !current.iter().any(|i| same(i, interceptor)) {
            return false;
        }
        let next: Vec<_> = current
            .iter()
            .filter(|i| !same(i, interceptor))
            .cloned()
            .collect();
        if next.is_empty() {
            state.per_principal.remove(principal);
        } else {
            state.per_principal.insert(principal.clone(), Arc::new(next));
        }
        true
    }

    pub fn principal_interceptors(&self, principal: &Principal) -> Vec<Arc<dyn StanzaInterceptor>> {
        self.state
            .read()
            .per_principal
            .get(principal)
            .map(|list| list.as_ref().clone())
            .unwrap_or_default()
    }

    // =========================================================================
    // RESOLUTION
    // =========================================================================

    /// The chain for a stanza of `principal`: global, then per-principal.
    ///
    /// The returned chain is unaffected by later mutations.
    pub fn resolve(&self, principal: &Principal) -> InterceptorChain {
        let state = self.state.read();
        InterceptorChain {
            global: state.global.clone(),
            principal: state.per_principal.get(principal).cloned(),
        }
    }
}

/// An immutable, ordered view of the interceptors for one dispatch.
#[derive(Clone)]
pub struct InterceptorChain {
    global: InterceptorList,
    principal: Option<InterceptorList>,
}

impl InterceptorChain {
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn StanzaInterceptor>> + '_ {
        self.global
            .iter()
            .chain(self.principal.iter().flat_map(|list| list.iter()))
    }

    pub fn len(&self) -> usize {
        self.global.len() + self.principal.as_ref().map_or(0, |list| list.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
