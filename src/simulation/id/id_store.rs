use std::sync::Arc;

use ahash::{AHashMap, RandomState};
use dashmap::DashMap;
use tracing::debug;

use crate::simulation::id::serializable_type::StableTypeId;
use crate::simulation::id::Id;

#[derive(Debug)]
pub struct UntypedId {
    pub(crate) internal: u64,
    pub(crate) external: String,
}

impl UntypedId {
    pub(crate) fn new(internal: u64, external: String) -> Self {
        Self { internal, external }
    }
}

/// All ids of one type. Internal ids are the positions in `ids`.
#[derive(Debug)]
struct TypedIds {
    ids: Vec<Arc<UntypedId>>,
    mapping: AHashMap<String, u64>,
}

impl Default for TypedIds {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            mapping: AHashMap::with_hasher(RandomState::with_seed(42)),
        }
    }
}

/// Cache for ids. Each type lives in its own shard entry, so creating an id locks only the ids
/// of the same type. All methods are public, so that they can be used from mod.rs. The module
/// doesn't export this module, so that everything is kept package private
#[derive(Debug, Default)]
pub struct IdStore {
    types: DashMap<u64, TypedIds>,
}

impl IdStore {
    pub fn new() -> Self {
        Self {
            types: DashMap::default(),
        }
    }

    fn create_id_with_type_id(&self, id: &str, type_id: u64) -> Arc<UntypedId> {
        // the entry guard keeps the shard locked, which makes lookup and insert one step
        let mut typed = self.types.entry(type_id).or_default();

        if let Some(internal) = typed.mapping.get(id) {
            return typed.ids[*internal as usize].clone();
        }

        let next_internal = typed.ids.len() as u64;
        let next_id = Arc::new(UntypedId::new(next_internal, String::from(id)));
        typed.ids.push(next_id.clone());
        typed.mapping.insert(String::from(id), next_internal);

        next_id
    }

    pub(crate) fn create_id<T: StableTypeId + 'static>(&self, id: &str) -> Id<T> {
        let type_id = T::stable_type_id();
        Id::new(self.create_id_with_type_id(id, type_id))
    }

    pub(crate) fn get<T: StableTypeId + 'static>(&self, internal: u64) -> Id<T> {
        let type_id = T::stable_type_id();
        let typed = self.types.get(&type_id).unwrap_or_else(|| {
            panic!("No ids for type {type_id:?}. Use Id::create::<T>(...) to create ids")
        });

        let untyped_id = typed
            .ids
            .get(internal as usize)
            .unwrap_or_else(|| panic!("No id found for internal {internal}"))
            .clone();
        Id::new(untyped_id)
    }

    pub(crate) fn try_get_from_ext<T: StableTypeId + 'static>(
        &self,
        external: &str,
    ) -> Option<Id<T>> {
        let type_id = T::stable_type_id();
        let typed = self.types.get(&type_id)?;
        let internal = typed.mapping.get(external)?;
        Some(Id::new(typed.ids[*internal as usize].clone()))
    }

    pub(crate) fn get_from_ext<T: StableTypeId + 'static>(&self, external: &str) -> Id<T> {
        self.try_get_from_ext(external).unwrap_or_else(|| {
            panic!(
                "Could not find id for external id: {external}. Use Id::create::<T>(...) to create ids"
            )
        })
    }

    pub(crate) fn len<T: StableTypeId + 'static>(&self) -> usize {
        self.types
            .get(&T::stable_type_id())
            .map(|typed| typed.ids.len())
            .unwrap_or(0)
    }

    pub(crate) fn reset(&self) {
        debug!("Resetting id store.");
        self.types.clear();
    }
}
