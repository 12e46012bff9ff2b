//! Versioned note geometry migrations.
//!
//! Each note carries a schema version. Migrations form a table keyed by the
//! version they upgrade from and are applied in sequence until the note
//! reaches [`NOTE_SCHEMA_VERSION`]. A note already at the current version is
//! never touched, which makes running the table twice a no-op.
//!
//! | from | to | change                                                   |
//! |------|----|----------------------------------------------------------|
//! | 1    | 2  | frame-relative geometry re-normalized to the image box    |

use crate::constants::NOTE_SCHEMA_VERSION;
use crate::geometry::{Rect, Size, legacy_to_pixels, to_normalized};
use crate::model::note::Note;

/// Viewport facts a migration may need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MigrationContext {
    /// Size of the frame the image is displayed in.
    pub frame: Size,
    /// Rectangle the displayed image occupies inside the frame.
    pub image_box: Rect,
}

/// One step in the migration table.
pub struct Migration {
    pub from: u32,
    pub to: u32,
    pub apply: fn(&mut Note, &MigrationContext),
}

impl std::fmt::Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

/// Notes written before the version tag existed are treated as version 1.
pub const LEGACY_SCHEMA_VERSION: u32 = 1;

/// All known migrations, ordered by `from`.
pub const MIGRATIONS: &[Migration] = &[Migration {
    from: 1,
    to: 2,
    apply: frame_to_image_box,
}];

/// v1 geometry was a fraction of the frame; v2 is a fraction of the image box.
fn frame_to_image_box(note: &mut Note, ctx: &MigrationContext) {
    let legacy_px = legacy_to_pixels(&note.geometry(), ctx.frame);
    note.set_geometry(to_normalized(&legacy_px, &ctx.image_box));
}

/// Bring one note up to the current schema. Returns whether it changed.
pub fn migrate_note(note: &mut Note, ctx: &MigrationContext) -> bool {
    if !note.needs_migration() {
        return false;
    }
    let mut version = note.schema_version.max(LEGACY_SCHEMA_VERSION);
    while version < NOTE_SCHEMA_VERSION {
        let Some(step) = MIGRATIONS.iter().find(|m| m.from == version) else {
            log::warn!(
                "No migration from note schema {}; stamping as {}",
                version,
                NOTE_SCHEMA_VERSION
            );
            break;
        };
        (step.apply)(note, ctx);
        version = step.to;
    }
    note.schema_version = NOTE_SCHEMA_VERSION;
    true
}

/// Migrate every stale note in `notes`. Returns how many were changed.
pub fn migrate_notes(notes: &mut [Note], ctx: &MigrationContext) -> usize {
    let changed = notes
        .iter_mut()
        .map(|n| migrate_note(n, ctx))
        .filter(|changed| *changed)
        .count();
    if changed > 0 {
        log::info!("Migrated {} note(s) to schema {}", changed, NOTE_SCHEMA_VERSION);
    }
    changed
}
