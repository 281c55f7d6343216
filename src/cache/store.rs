use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::RemoteResult;
use crate::gateway::{self, Gateway, Method};
use crate::models::Entity;

/// One server collection type: what it holds, how it is scoped and where it lives.
pub trait Resource: 'static {
    type Entity: Entity + Clone + DeserializeOwned + Send + Sync;
    type Scope: Copy + Eq + Hash + fmt::Debug + Send + Sync;
    type Draft: Serialize + Sync;
    type Patch: Serialize + Sync;

    const NAME: &'static str;

    fn collection_path(scope: Self::Scope) -> String;

    fn item_path(scope: Self::Scope, id: i32) -> String {
        format!("{}/{}", Self::collection_path(scope), id)
    }
}

/// Per-scope mirrors of one resource type.
///
/// A scope is absent from the map until its first successful `list`. Locks
/// are only taken after the network call has resolved, never across it.
pub struct EntityStore<R: Resource> {
    mirrors: RwLock<HashMap<R::Scope, Vec<R::Entity>>>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Default for EntityStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> EntityStore<R> {
    pub fn new() -> Self {
        Self {
            mirrors: RwLock::new(HashMap::new()),
            _resource: PhantomData,
        }
    }

    pub fn mirror(&self, scope: R::Scope) -> Option<Vec<R::Entity>> {
        self.mirrors.read().get(&scope).cloned()
    }

    pub fn is_loaded(&self, scope: R::Scope) -> bool {
        self.mirrors.read().contains_key(&scope)
    }

    pub fn find(&self, scope: R::Scope, id: i32) -> Option<R::Entity> {
        self.mirrors
            .read()
            .get(&scope)
            .and_then(|items| items.iter().find(|item| item.id() == id).cloned())
    }

    pub fn invalidate(&self, scope: R::Scope) {
        if self.mirrors.write().remove(&scope).is_some() {
            debug!(resource = R::NAME, ?scope, "mirror dropped");
        }
    }

    pub fn scopes(&self) -> Vec<R::Scope> {
        self.mirrors.read().keys().copied().collect()
    }

    pub(crate) fn replace(&self, scope: R::Scope, items: Vec<R::Entity>) {
        debug!(resource = R::NAME, ?scope, count = items.len(), "mirror replaced");
        self.mirrors.write().insert(scope, items);
    }

    /// Appends to a loaded mirror; an id already present is replaced in place.
    pub(crate) fn append(&self, scope: R::Scope, entity: R::Entity) -> bool {
        let mut mirrors = self.mirrors.write();
        let Some(items) = mirrors.get_mut(&scope) else {
            return false;
        };
        match items.iter_mut().find(|item| item.id() == entity.id()) {
            Some(existing) => *existing = entity,
            None => items.push(entity),
        }
        true
    }

    pub(crate) fn replace_by_id(&self, scope: R::Scope, entity: R::Entity) -> bool {
        let mut mirrors = self.mirrors.write();
        let Some(items) = mirrors.get_mut(&scope) else {
            return false;
        };
        match items.iter_mut().find(|item| item.id() == entity.id()) {
            Some(existing) => {
                *existing = entity;
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove_ids(&self, scope: R::Scope, ids: &[i32]) -> usize {
        let mut mirrors = self.mirrors.write();
        let Some(items) = mirrors.get_mut(&scope) else {
            return 0;
        };
        let before = items.len();
        items.retain(|item| !ids.contains(&item.id()));
        before - items.len()
    }

    pub(crate) fn update_all<F>(&self, mut f: F)
    where
        F: FnMut(&mut R::Entity),
    {
        let mut mirrors = self.mirrors.write();
        for items in mirrors.values_mut() {
            items.iter_mut().for_each(&mut f);
        }
    }

    pub async fn list<G: Gateway>(&self, gateway: &G, scope: R::Scope) -> RemoteResult<Vec<R::Entity>> {
        let path = R::collection_path(scope);
        match gateway::get::<_, Vec<R::Entity>>(gateway, &path).await {
            Ok(items) => {
                self.replace(scope, items.clone());
                Ok(items)
            }
            Err(err) => {
                warn!(resource = R::NAME, ?scope, error = %err, "list failed, keeping previous mirror");
                Err(err)
            }
        }
    }

    pub async fn create<G: Gateway>(
        &self,
        gateway: &G,
        scope: R::Scope,
        draft: &R::Draft,
    ) -> RemoteResult<R::Entity> {
        let path = R::collection_path(scope);
        let created: R::Entity = gateway::send(gateway, Method::Post, &path, draft)
            .await
            .inspect_err(|err| warn!(resource = R::NAME, ?scope, error = %err, "create failed"))?;
        if !self.append(scope, created.clone()) {
            debug!(resource = R::NAME, ?scope, id = created.id(), "created into unloaded scope");
        }
        Ok(created)
    }

    pub async fn update<G: Gateway>(
        &self,
        gateway: &G,
        scope: R::Scope,
        id: i32,
        patch: &R::Patch,
    ) -> RemoteResult<R::Entity> {
        let path = R::item_path(scope, id);
        let updated: R::Entity = gateway::send(gateway, Method::Put, &path, patch)
            .await
            .inspect_err(|err| warn!(resource = R::NAME, ?scope, id, error = %err, "update failed"))?;
        if !self.replace_by_id(scope, updated.clone()) {
            debug!(resource = R::NAME, ?scope, id, "updated entity not in mirror, left out until next list");
        }
        Ok(updated)
    }

    pub async fn delete<G: Gateway>(&self, gateway: &G, scope: R::Scope, id: i32) -> RemoteResult<()> {
        let path = R::item_path(scope, id);
        gateway::execute(gateway, Method::Delete, &path, None)
            .await
            .inspect_err(|err| warn!(resource = R::NAME, ?scope, id, error = %err, "delete failed"))?;
        self.remove_ids(scope, &[id]);
        Ok(())
    }
}
