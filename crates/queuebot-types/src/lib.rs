//! Shared type definitions for queuebot.
//!
//! This crate is the single source of truth for the persisted documents and
//! the snapshot pushed to display clients. Types flow downstream to
//! `TypeScript` via `ts-rs` for the overlay and admin pages.
//!
//! # Modules
//!
//! - [`ids`] -- Opaque string identifiers for announcements and commands
//! - [`enums`] -- Chat connection status
//! - [`structs`] -- Persisted documents (queue, stats, announcements, commands, settings)
//! - [`snapshot`] -- Full state snapshot broadcast to display clients

pub mod enums;
pub mod ids;
pub mod snapshot;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::ChatStatus;
pub use ids::{AnnouncementId, CommandId};
pub use snapshot::{AnnouncementView, CommandView, SettingsView, Snapshot};
pub use structs::{
    ChannelSettings, CustomCommand, DEFAULT_PORT, QueueDocument, ScheduledAnnouncement,
    StatsDocument, StatsRecord,
};

#[cfg(test)]
mod tests {
    //! Integration tests for type exports and `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings when types with
        // #[ts(export)] are used. The files are written to the
        // `bindings/` directory relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::AnnouncementId::export_all();
        let _ = crate::ids::CommandId::export_all();

        // Enums
        let _ = crate::enums::ChatStatus::export_all();

        // Documents
        let _ = crate::structs::StatsRecord::export_all();
        let _ = crate::structs::ScheduledAnnouncement::export_all();
        let _ = crate::structs::CustomCommand::export_all();
        let _ = crate::structs::QueueDocument::export_all();
        let _ = crate::structs::ChannelSettings::export_all();

        // Snapshot
        let _ = crate::snapshot::Snapshot::export_all();
        let _ = crate::snapshot::AnnouncementView::export_all();
        let _ = crate::snapshot::CommandView::export_all();
        let _ = crate::snapshot::SettingsView::export_all();
    }
}
