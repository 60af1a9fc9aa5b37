//! View state and the loaders and mutation handlers that drive it.
//!
//! A view owns its state exclusively; nothing is shared between views and there is no
//! cross-view cache. Loaders run only when asked (on activation or after a successful
//! mutation), replace state wholesale on success and leave it untouched on failure.
//!
//! Every async operation borrows its view mutably, so dropping a view drops any request
//! still in flight: a response can never land in a view that is gone. Loads are also
//! ticketed: when a surface splits a load into [`begin`](LoadSequence::issue) and apply, a
//! response older than the newest issued load is discarded.

pub mod clinics;
pub mod portal;
mod profile;
mod records;

pub use clinics::{ClinicCard, ClinicLocator, ListingStatus};
pub use portal::{Mount, Overview, PatientPortal, ProfileStatus, RecordForm};

/// Identifies one load request of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Monotonic counter of issued loads.
#[derive(Debug, Default, Clone)]
pub(crate) struct LoadSequence {
    issued: u64,
}

impl LoadSequence {
    pub(crate) fn issue(&mut self) -> LoadTicket {
        self.issued += 1;
        LoadTicket(self.issued)
    }

    pub(crate) fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.issued
    }
}
