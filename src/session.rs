//! The top-level controller.
//!
//! A [`Session`] owns the document, the backing store, the save scheduler,
//! the gesture tracker and the viewport size. Every user-facing operation
//! goes through it, and the data always flows the same way: gesture, release,
//! normalize, mutate, schedule a debounced save, re-render.
//!
//! Store writes never roll back memory. A failed save leaves its channel
//! dirty for the next debounce; a failed image write is queued and retried
//! on the next save or flush.

use std::collections::BTreeSet;

use web_time::Instant;

use crate::config::Preferences;
use crate::geometry::{NormRect, Rect, Size, image_box, to_normalized};
use crate::interaction::{
    GestureOutput, GestureTracker, NoteGestureKind, NoteRelease, PointerEvent, PointerPhase,
    ReorderOutcome, ThumbLayout,
};
use crate::model::{
    Document, MigrationContext, Mode, NoteId, Page, PageId, StyleEdit, migrate_notes,
};
use crate::persist::{
    AutoSaveManager, BlobStore, Debouncer, ExportDocument, PersistError, SaveChannel, StoreError,
    delete_image, export_document, load, parse_import, put_image, replace_store, save_meta,
    sweep_orphan_images,
};
use crate::render::{NoteView, Presentation, PrintSheet, project_print, project_screen};

/// An image handed to [`Session::add_images`].
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingImage {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl IncomingImage {
    /// Wrap a dropped or picked file.
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }
}

pub struct Session<S: BlobStore> {
    doc: Document,
    store: S,
    prefs: Preferences,
    saves: AutoSaveManager,
    /// Re-render after the viewport settles.
    resize: Debouncer,
    gestures: GestureTracker,
    /// Size of the frame the current image is displayed in.
    frame: Size,
    /// Pages whose image payload has not reached the store yet.
    pending_images: BTreeSet<PageId>,
    /// A delete or import left payloads the document no longer references.
    sweep_pending: bool,
}

impl<S: BlobStore> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("pages", &self.doc.len())
            .field("index", &self.doc.index())
            .field("mode", &self.doc.mode())
            .field("frame", &self.frame)
            .field("dirty", &self.saves.is_dirty())
            .field("pending_images", &self.pending_images.len())
            .field("sweep_pending", &self.sweep_pending)
            .finish()
    }
}

impl<S: BlobStore> Session<S> {
    /// Empty session over `store`. Call [`Session::restore`] to load it.
    pub fn new(store: S, prefs: Preferences) -> Self {
        Self::with_document(store, prefs, Document::new())
    }

    /// Start from an in-memory document without touching the store.
    pub fn with_document(store: S, prefs: Preferences, doc: Document) -> Self {
        let saves = AutoSaveManager::with_delays(prefs.meta_debounce(), prefs.notes_debounce());
        let resize = Debouncer::new(prefs.resize_debounce());
        Self {
            doc,
            store,
            prefs,
            saves,
            resize,
            gestures: GestureTracker::new(),
            frame: Size::default(),
            pending_images: BTreeSet::new(),
            sweep_pending: false,
        }
    }

    /// The document as currently held in memory.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Preferences this session was opened with.
    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    /// Last frame size passed to [`Session::resize_viewport`].
    pub fn frame(&self) -> Size {
        self.frame
    }

    /// Gestures currently in flight.
    pub fn gestures(&self) -> &GestureTracker {
        &self.gestures
    }

    /// Whether unsaved metadata or image payloads remain.
    pub fn has_unsaved_changes(&self) -> bool {
        self.saves.is_dirty() || !self.pending_images.is_empty()
    }

    /// Image payloads queued for another write attempt.
    pub fn pending_image_count(&self) -> usize {
        self.pending_images.len()
    }

    /// Image box of the current page in the current frame.
    pub fn image_box(&self) -> Rect {
        image_box(self.frame, self.doc.current_page().and_then(Page::dimensions))
    }

    fn touch(&mut self, channel: SaveChannel) {
        self.saves.mark_dirty(channel);
    }

    // --- restore / ingest / delete ---

    /// Replace the in-memory document with what the store holds.
    pub async fn restore(&mut self) -> Result<(), PersistError> {
        let doc = load(&self.store).await?;
        self.gestures.cancel_all();
        self.doc = doc;
        self.saves.reset();
        self.pending_images.clear();
        self.migrate_current_page().await;
        Ok(())
    }

    /// Append pages for every image, store their payloads and the updated
    /// metadata, and show the first new page. Non-image files are skipped.
    pub async fn add_images(&mut self, files: Vec<IncomingImage>) -> Vec<PageId> {
        let was_empty = self.doc.is_empty();
        let first_new = self.doc.len();
        let mut added = Vec::new();

        for file in files {
            if !file.mime.starts_with("image/") {
                log::debug!("Skipping non-image file {} ({})", file.name, file.mime);
                continue;
            }
            let page = Page::new(file.name, file.mime, Some(file.bytes));
            if let Err(e) = put_image(&self.store, &page).await {
                log::warn!("Could not store image for page {}: {}", page.id, e);
                self.pending_images.insert(page.id.clone());
            }
            added.push(page.id.clone());
            self.doc.add_page(page);
        }
        if added.is_empty() {
            return added;
        }
        log::info!("Added {} image(s)", added.len());

        self.save_now().await;
        self.show_page(if was_empty { 0 } else { first_new }).await;
        added
    }

    /// Delete a page, its notes and its stored payload.
    pub async fn delete_page(&mut self, id: &str) -> bool {
        self.cancel_gestures();
        if self.doc.remove_page(id).is_none() {
            return false;
        }
        self.pending_images.remove(id);
        if let Err(e) = delete_image(&self.store, id).await {
            log::warn!("Could not delete stored image for page {}: {}", id, e);
            self.sweep_pending = true;
        }
        self.save_now().await;
        self.migrate_current_page().await;
        true
    }

    /// Drop every page and wipe the store.
    pub async fn delete_all(&mut self) -> Result<(), PersistError> {
        self.gestures.cancel_all();
        self.doc.clear();
        self.saves.reset();
        self.pending_images.clear();
        if let Err(e) = self.store.clear_all().await {
            self.sweep_pending = true;
            self.touch(SaveChannel::Meta);
            return Err(e.into());
        }
        self.sweep_pending = false;
        log::info!("Deleted all pages");
        Ok(())
    }

    // --- notes, styles, memos ---

    /// Add a note to the current page and select it.
    pub fn add_note(&mut self) -> Option<NoteId> {
        let id = self.doc.add_note()?;
        self.touch(SaveChannel::Notes);
        Some(id)
    }

    /// Delete a note from the current page.
    pub fn delete_note(&mut self, id: &str) -> bool {
        if self.doc.delete_note(id).is_none() {
            return false;
        }
        self.touch(SaveChannel::Notes);
        true
    }

    /// Make `id` the active note, or clear the selection.
    pub fn select_note(&mut self, id: Option<&str>) {
        self.doc.select_note(id);
    }

    /// Write a style-panel edit through to the active note.
    pub fn apply_style(&mut self, edit: StyleEdit) -> bool {
        let changed = self.doc.apply_style(edit);
        if changed {
            self.touch(SaveChannel::Notes);
        }
        changed
    }

    /// Replace a note's rich-text body.
    pub fn set_note_markup(&mut self, id: &str, markup: impl Into<String>) -> bool {
        let changed = self.doc.set_note_markup(id, markup);
        if changed {
            self.touch(SaveChannel::Notes);
        }
        changed
    }

    /// Replace the current page's memo. The memo is read-only in view mode.
    pub fn set_memo(&mut self, memo: impl Into<String>) -> bool {
        if self.doc.is_view() {
            return false;
        }
        let changed = self.doc.set_memo(memo);
        if changed {
            self.touch(SaveChannel::Meta);
        }
        changed
    }

    // --- navigation and modes ---

    /// Show the page at `index` (clamped). Running note gestures are
    /// committed against the page they started on first.
    pub async fn show_page(&mut self, index: usize) {
        self.cancel_gestures();
        self.doc.show_page(index);
        self.touch(SaveChannel::Meta);
        self.migrate_current_page().await;
    }

    /// Show the next page, wrapping to the first.
    pub async fn next_page(&mut self) {
        let len = self.doc.len();
        if len > 0 {
            self.show_page((self.doc.index() + 1) % len).await;
        }
    }

    /// Show the previous page, wrapping to the last.
    pub async fn prev_page(&mut self) {
        let len = self.doc.len();
        if len > 0 {
            self.show_page((self.doc.index() + len - 1) % len).await;
        }
    }

    /// Switch mode. Running gestures are committed first.
    pub fn set_mode(&mut self, mode: Mode) {
        self.cancel_gestures();
        self.doc.set_mode(mode);
        self.touch(SaveChannel::Meta);
    }

    /// Flip between edit and view mode.
    pub fn toggle_mode(&mut self) {
        self.set_mode(self.doc.mode().toggled());
    }

    /// Flip the view-mode "notes movable" toggle.
    pub fn toggle_view_move(&mut self) -> bool {
        self.doc.toggle_view_move()
    }

    // --- viewport ---

    /// Record a new frame size; the re-render is debounced.
    ///
    /// Stale notes on the current page are re-projected right away, so a
    /// gesture that starts before the re-render already sees current-schema
    /// geometry. Their save rides on the notes debounce.
    pub fn resize_viewport_at(&mut self, frame: Size, now: Instant) {
        self.frame = frame;
        self.resize.trigger_at(now);
        self.migrate_current_page_in_memory();
    }

    /// [`Session::resize_viewport_at`] with the current time.
    pub fn resize_viewport(&mut self, frame: Size) {
        self.resize_viewport_at(frame, Instant::now());
    }

    /// The host finished decoding a page's image.
    pub async fn image_loaded(&mut self, page_id: &str, dimensions: (u32, u32)) {
        let Some(page) = self.doc.page_mut(page_id) else {
            return;
        };
        page.set_dimensions(Some(dimensions));
        let is_current = self.doc.current_page().is_some_and(|p| p.id == page_id);
        if is_current {
            self.migrate_current_page().await;
        }
    }

    /// Re-project stale notes on the current page once a real image box is
    /// known. Returns whether any note changed; the change is marked dirty
    /// but not written.
    fn migrate_current_page_in_memory(&mut self) -> bool {
        if !self.frame.is_usable() {
            return false;
        }
        let frame = self.frame;
        let Some(page) = self.doc.current_page_mut() else {
            return false;
        };
        let Some(dims) = page.dimensions() else {
            return false;
        };
        if !page.notes.iter().any(|n| n.needs_migration()) {
            return false;
        }
        let ctx = MigrationContext {
            frame,
            image_box: image_box(frame, Some(dims)),
        };
        let changed = migrate_notes(&mut page.notes, &ctx) > 0;
        if changed {
            self.touch(SaveChannel::Notes);
        }
        changed
    }

    /// Migrate the current page and persist the result straight away.
    async fn migrate_current_page(&mut self) -> bool {
        let changed = self.migrate_current_page_in_memory();
        if changed {
            self.save_now().await;
        }
        changed
    }

    // --- gestures ---

    /// Press on a note's header (drag), body (view-mode drag) or corner
    /// handle (resize). Returns whether a session started.
    pub fn pointer_down_on_note(
        &mut self,
        event: &PointerEvent,
        note_id: &str,
        kind: NoteGestureKind,
    ) -> bool {
        let allowed = match (self.doc.mode(), kind) {
            (Mode::Edit, _) => true,
            (Mode::View, NoteGestureKind::Drag) => self.doc.view_move_enabled(),
            (Mode::View, NoteGestureKind::Resize) => false,
        };
        if !allowed {
            return false;
        }
        // Gestures work in current-schema pixels.
        self.migrate_current_page_in_memory();
        let Some(displayed) = self
            .render()
            .into_iter()
            .find(|v| v.id == note_id)
            .map(|v| v.rect)
        else {
            return false;
        };
        let header_offset = if self.doc.is_view() {
            self.prefs.note_header_px
        } else {
            0.0
        };
        if !self
            .gestures
            .begin_note(event, note_id, kind, displayed, header_offset)
        {
            return false;
        }

        if let Some(page) = self.doc.current_page_mut() {
            page.bring_to_front(note_id);
        }
        self.doc.select_note(Some(note_id));
        self.touch(SaveChannel::Notes);
        true
    }

    /// Press on a thumbnail. The host supplies the list layout at press time.
    pub fn pointer_down_on_thumb(
        &mut self,
        event: &PointerEvent,
        page_id: &str,
        layout: ThumbLayout,
    ) -> bool {
        self.gestures
            .begin_reorder(event, page_id, layout, self.prefs.reorder_threshold_px)
    }

    /// Route a move, release or cancel event and apply whatever it produced.
    pub async fn pointer_event(
        &mut self,
        phase: PointerPhase,
        event: &PointerEvent,
    ) -> Option<GestureOutput> {
        let output = self.gestures.handle(phase, event)?;
        match &output {
            GestureOutput::NoteMoved { .. } => {}
            GestureOutput::NoteReleased(release) => self.commit_release(release),
            GestureOutput::Reorder(ReorderOutcome::Select(page_id)) => {
                if let Some(index) = self.doc.page_index(page_id) {
                    self.show_page(index).await;
                }
            }
            GestureOutput::Reorder(ReorderOutcome::Reorder(order)) => {
                self.doc.reorder_pages(order);
                self.touch(SaveChannel::Meta);
            }
            GestureOutput::Reorder(ReorderOutcome::Cancelled) => {}
        }
        Some(output)
    }

    /// Force-end every gesture (window blur, page hidden). Notes keep the
    /// position they were dragged to; reorders are abandoned.
    pub fn cancel_gestures(&mut self) {
        for output in self.gestures.cancel_all() {
            if let GestureOutput::NoteReleased(release) = output {
                self.commit_release(&release);
            }
        }
    }

    /// Normalize a released rect against the current image box and store it.
    fn commit_release(&mut self, release: &NoteRelease) {
        let ib = self.image_box();
        let Some(note) = self
            .doc
            .current_page_mut()
            .and_then(|p| p.note_mut(&release.note_id))
        else {
            return;
        };
        let norm = to_normalized(&release.rect, &ib);
        let geometry = match release.kind {
            // A drag only moves; the size stays as stored.
            NoteGestureKind::Drag => {
                let old = note.geometry();
                NormRect::new(norm.nx, norm.ny, old.nw, old.nh)
            }
            NoteGestureKind::Resize => norm,
        };
        note.set_geometry(geometry);
        log::debug!("Note {} {:?} committed at {:?}", release.note_id, release.kind, geometry);
        self.touch(SaveChannel::Notes);
    }

    // --- saving ---

    /// Retry queued image writes. Returns whether the queue is now empty.
    async fn retry_pending_images(&mut self) -> bool {
        let ids: Vec<PageId> = self.pending_images.iter().cloned().collect();
        for id in ids {
            let Some(page) = self.doc.page(&id) else {
                self.pending_images.remove(&id);
                continue;
            };
            match put_image(&self.store, page).await {
                Ok(()) => {
                    self.pending_images.remove(&id);
                }
                Err(e) => log::warn!("Image for page {} still not stored: {}", id, e),
            }
        }
        self.pending_images.is_empty()
    }

    /// Remove payloads left behind by a failed delete or import. Runs only
    /// after meta has been written, so the stored pages match memory.
    async fn sweep_orphans(&mut self) {
        if !self.sweep_pending {
            return;
        }
        match sweep_orphan_images(&self.store, &self.doc).await {
            Ok(_) => self.sweep_pending = false,
            Err(e) => log::warn!("Could not remove orphaned images, will retry: {}", e),
        }
    }

    async fn save_channels(&mut self, channels: &[SaveChannel], now: Instant) -> bool {
        self.retry_pending_images().await;
        match save_meta(&self.store, &self.doc).await {
            Ok(()) => {
                self.saves.mark_saved_at(channels, now);
                self.sweep_orphans().await;
                true
            }
            Err(e) => {
                log::warn!("Save failed, will retry: {}", e);
                self.saves.mark_save_failed_at(channels, now);
                false
            }
        }
    }

    /// Write metadata immediately, covering every channel.
    async fn save_now(&mut self) -> bool {
        self.save_channels(&SaveChannel::ALL, Instant::now()).await
    }

    /// Drive timers. Saves whatever channels are due and reports whether the
    /// viewport settled and the host should re-render.
    pub async fn tick_at(&mut self, now: Instant) -> bool {
        let mut rerender = false;
        if self.resize.fire_at(now) {
            rerender = true;
            self.migrate_current_page().await;
        }
        let due = self.saves.due_at(now);
        if !due.is_empty() {
            self.save_channels(&due, now).await;
        }
        rerender
    }

    /// [`Session::tick_at`] with the current time.
    pub async fn tick(&mut self) -> bool {
        self.tick_at(Instant::now()).await
    }

    /// Write everything pending now, ignoring debounce deadlines.
    pub async fn flush(&mut self) -> Result<(), PersistError> {
        let images_ok = self.retry_pending_images().await;
        let channels = self.saves.pending();
        if !channels.is_empty() {
            if let Err(e) = save_meta(&self.store, &self.doc).await {
                self.saves.mark_save_failed(&channels);
                return Err(e);
            }
            self.saves.mark_saved(&channels);
        }
        self.sweep_orphans().await;
        if !images_ok {
            return Err(PersistError::Store(StoreError::unavailable(
                "img:*",
                format!("{} image(s) not stored", self.pending_images.len()),
            )));
        }
        Ok(())
    }

    // --- export / import ---

    /// Build the portable document, reading image payloads from the store.
    pub async fn export_document(&self) -> Result<ExportDocument, PersistError> {
        export_document(&self.doc, &self.store).await
    }

    /// Replace the whole document with an export.
    ///
    /// Validation and decoding happen first; a malformed document is
    /// rejected with memory and store untouched. Once accepted, memory is
    /// replaced even if the store then fails, and the writes are retried.
    pub async fn import_document(&mut self, bytes: &[u8]) -> Result<(), PersistError> {
        let imported = parse_import(bytes)?;
        let doc = imported.to_document();

        self.gestures.cancel_all();
        self.doc = doc;
        self.saves.reset();
        self.pending_images.clear();
        self.sweep_pending = false;

        if let Err(e) = replace_store(&self.store, &imported, &self.doc).await {
            log::warn!("Imported document not fully stored, will retry: {}", e);
            self.sweep_pending = true;
            self.pending_images = self
                .doc
                .pages()
                .iter()
                .filter(|p| p.image().is_some())
                .map(|p| p.id.clone())
                .collect();
            self.touch(SaveChannel::Meta);
        }
        self.migrate_current_page().await;
        Ok(())
    }

    // --- projection ---

    /// Notes of the current page as they should be drawn now.
    pub fn render(&self) -> Vec<NoteView> {
        let Some(page) = self.doc.current_page() else {
            return Vec::new();
        };
        let presentation = Presentation::from_document(&self.doc, self.prefs.note_header_px);
        project_screen(
            page,
            &self.image_box(),
            &presentation,
            &self.gestures.live_rects(),
        )
    }

    /// Every page laid out on the configured print sheet.
    pub fn print_layout(&self) -> Vec<PrintSheet> {
        project_print(&self.doc, self.prefs.print_sheet)
    }
}
