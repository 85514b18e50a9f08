//! Registration seam to the host scheduler.

use serde::Serialize;
use std::collections::HashMap;

use super::types::{Placement, PlacementRecord, TypeHandle};

/// Receives every local entity exactly once during initialization.
///
/// Returning `Err` aborts placement; the message is carried in
/// `MappingError::Registration`.
pub trait EntityRegistrar {
    fn register(&mut self, placement: &Placement) -> Result<(), String>;
}

/// Any `FnMut(local_index, kernel_process_id, type_name)` is a registrar
impl<F> EntityRegistrar for F
where
    F: FnMut(u64, u64, &str) -> Result<(), String>,
{
    fn register(&mut self, placement: &Placement) -> Result<(), String> {
        self(
            placement.local_index,
            placement.kernel_process_id,
            &placement.identity.type_name,
        )
    }
}

/// In-memory entity table indexed by local index, with type names interned
/// into handles in first-seen order
#[derive(Debug, Default, Serialize)]
pub struct PlacementTable {
    /// Type name for each handle
    pub type_names: Vec<String>,
    pub records: Vec<PlacementRecord>,
    #[serde(skip)]
    handles: HashMap<String, TypeHandle>,
}

impl PlacementTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle bound to `type_name`, if any entity of that type was registered
    pub fn type_handle(&self, type_name: &str) -> Option<TypeHandle> {
        self.handles.get(type_name).copied()
    }

    /// Record at `local_index`
    pub fn get(&self, local_index: u64) -> Option<&PlacementRecord> {
        usize::try_from(local_index)
            .ok()
            .and_then(|i| self.records.get(i))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records scheduled on one kernel process, in local index order
    pub fn on_kernel_process(&self, kernel_process_id: u64) -> impl Iterator<Item = &PlacementRecord> {
        self.records
            .iter()
            .filter(move |r| r.kernel_process_id == kernel_process_id)
    }

    fn intern(&mut self, type_name: &str) -> TypeHandle {
        if let Some(handle) = self.handles.get(type_name) {
            return *handle;
        }
        let handle = self.type_names.len();
        self.type_names.push(type_name.to_string());
        self.handles.insert(type_name.to_string(), handle);
        handle
    }
}

impl EntityRegistrar for PlacementTable {
    fn register(&mut self, placement: &Placement) -> Result<(), String> {
        if placement.local_index != self.records.len() as u64 {
            return Err(format!(
                "expected local index {}, got {}",
                self.records.len(),
                placement.local_index
            ));
        }

        let type_handle = self.intern(&placement.identity.type_name);
        self.records.push(PlacementRecord {
            flat_id: placement.flat_id,
            local_index: placement.local_index,
            kernel_process_id: placement.kernel_process_id,
            worker_id: placement.worker_id,
            type_handle,
            identity: placement.identity.clone(),
        });
        Ok(())
    }
}
