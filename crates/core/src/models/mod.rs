//! Rows of the three remote collections.
//!
//! Every type here implements [`RemoteRow`], which ties it to its collection and validates
//! decoded rows before they reach view state.

pub mod clinic;
pub mod health_record;
pub mod profile;

pub use clinic::ClinicRecord;
pub use health_record::{HealthRecord, NewHealthRecord, RecordType};
pub use profile::{Gender, ProfileField, ProfilePatch, ProfileRecord};

use crate::gateway::Collection;

/// A typed row of a remote collection.
pub trait RemoteRow: serde::de::DeserializeOwned {
    const COLLECTION: Collection;

    /// Checks invariants serde cannot express. Rows failing this never reach view state.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}
