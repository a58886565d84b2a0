//! Common context provider port

use serde_json::{Map, Value};

/// Port trait supplying ambient fields for diagnostic records
///
/// Called fresh for every record, so the returned mapping must reflect the
/// moment of the fault rather than a cached snapshot.
pub trait IContextProvider: Send + Sync {
    fn context(&self) -> Map<String, Value>;
}

impl<F> IContextProvider for F
where
    F: Fn() -> Map<String, Value> + Send + Sync,
{
    fn context(&self) -> Map<String, Value> {
        self()
    }
}
