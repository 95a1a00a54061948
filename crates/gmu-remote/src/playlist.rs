//! Sparse playlist cache with on-demand windowing.
//!
//! The server never pushes the whole playlist; the client asks for exactly
//! the positions that are visible, one `playlist_get_item` per unknown row,
//! plus a bounded lookahead when an item arrives.  The cache is pure data:
//! every mutation returns the rows to repaint and the positions to fetch,
//! and the session turns those into view calls and wire messages.

use std::collections::HashSet;

/// What a playlist row should display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowContent {
    Known { position: usize, title: String },
    /// Position exists server-side but its title has not arrived yet.
    Placeholder { position: usize },
    /// Row lies past the end of the playlist.
    Blank,
}

/// Effects of a cache mutation.  `renders` pairs a window-relative row index
/// with its new content; `fetches` lists absolute positions to request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncEffects {
    pub renders: Vec<(usize, RowContent)>,
    pub fetches: Vec<usize>,
}

pub struct PlaylistCache {
    /// `None` means unknown.  A present empty string is a real (empty) title.
    entries: Vec<Option<String>>,
    /// Positions with an outstanding fetch.  Suppresses duplicate requests
    /// until the item arrives or the cache is reset.
    pending: HashSet<usize>,
    scroll_top: u32,
    row_height: u32,
    /// Row span of the window; rows `0..=visible_rows` are on screen.
    visible_rows: usize,
}

impl PlaylistCache {
    pub fn new(row_height: u32, viewport_height: u32) -> Self {
        let row_height = row_height.max(1);
        Self {
            entries: Vec::new(),
            pending: HashSet::new(),
            scroll_top: 0,
            row_height,
            visible_rows: (viewport_height / row_height) as usize + 1,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn known_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// First playlist position inside the window.
    pub fn first_visible(&self) -> usize {
        (self.scroll_top / self.row_height) as usize
    }

    pub fn title(&self, position: usize) -> Option<&str> {
        self.entries.get(position)?.as_deref()
    }

    /// Server announced a (possibly changed) playlist of `length` items.
    /// Drops everything, including outstanding fetches; callers resync the
    /// window afterwards.
    pub fn reset(&mut self, length: usize) {
        self.entries = vec![None; length];
        self.pending.clear();
    }

    /// One `playlist_item` arrived.  Positions outside `[0, length)` are
    /// never stored.  If the item is visible, its row is repainted and the
    /// window span after it is scanned for the first position still worth
    /// fetching — at most one request (lookahead prefetch, not a full scan).
    pub fn store_item(&mut self, position: usize, title: String) -> SyncEffects {
        let mut effects = SyncEffects::default();
        if position >= self.entries.len() {
            return effects;
        }
        self.entries[position] = Some(title.clone());
        self.pending.remove(&position);

        let first = self.first_visible();
        if (first..first + self.window_span()).contains(&position) {
            effects
                .renders
                .push((position - first, RowContent::Known { position, title }));
            for offset in 0..self.window_span() {
                let pos = position + 1 + offset;
                if pos >= self.entries.len() {
                    break;
                }
                if self.entries[pos].is_none() && !self.pending.contains(&pos) {
                    self.pending.insert(pos);
                    effects.fetches.push(pos);
                    break;
                }
            }
        }
        effects
    }

    /// Scroll to a new pixel offset and recompute the window.
    pub fn handle_scroll(&mut self, scroll_top: u32) -> SyncEffects {
        self.scroll_top = scroll_top;
        self.resync()
    }

    /// Viewport geometry changed (the original re-measured the table on
    /// every window resize).
    pub fn set_viewport(&mut self, viewport_height: u32) -> SyncEffects {
        self.visible_rows = (viewport_height / self.row_height) as usize + 1;
        self.resync()
    }

    /// Recompute every row of the current window: known entries repaint,
    /// unknown in-range entries repaint as placeholders and get fetched
    /// (unless already outstanding), rows past the end go blank and are
    /// never fetched.
    pub fn resync(&mut self) -> SyncEffects {
        let mut effects = SyncEffects::default();
        let first = self.first_visible();
        for row in 0..self.window_span() {
            let position = first + row;
            if position >= self.entries.len() {
                effects.renders.push((row, RowContent::Blank));
                continue;
            }
            match &self.entries[position] {
                Some(title) => effects.renders.push((
                    row,
                    RowContent::Known {
                        position,
                        title: title.clone(),
                    },
                )),
                None => {
                    effects
                        .renders
                        .push((row, RowContent::Placeholder { position }));
                    if self.pending.insert(position) {
                        effects.fetches.push(position);
                    }
                }
            }
        }
        effects
    }

    /// Number of rows in the window, `visible_rows + 1` (the window includes
    /// both boundary rows, matching `[floor(O/H), floor(O/H)+V]`).
    fn window_span(&self) -> usize {
        self.visible_rows + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetches(effects: &SyncEffects) -> Vec<usize> {
        effects.fetches.clone()
    }

    // 20 px rows, 120 px viewport: visible_rows = 7, window spans 8 rows.
    fn cache() -> PlaylistCache {
        PlaylistCache::new(20, 120)
    }

    #[test]
    fn test_out_of_range_items_never_stored() {
        let mut c = cache();
        c.reset(4);
        assert_eq!(c.store_item(4, "past end".into()), SyncEffects::default());
        assert_eq!(c.store_item(100, "way out".into()), SyncEffects::default());
        assert_eq!(c.known_count(), 0);
    }

    #[test]
    fn test_reset_clears_entries_and_window_fetches_below_length() {
        let mut c = cache();
        c.reset(20);
        c.resync();
        c.store_item(0, "a".into());
        assert_eq!(c.known_count(), 1);

        // New, shorter playlist: everything known is gone and only positions
        // < 3 are fetched even though the window has 8 rows.
        c.reset(3);
        assert_eq!(c.known_count(), 0);
        let effects = c.resync();
        assert_eq!(fetches(&effects), vec![0, 1, 2]);
        let blanks = effects
            .renders
            .iter()
            .filter(|(_, content)| *content == RowContent::Blank)
            .count();
        assert_eq!(blanks, 5);
    }

    #[test]
    fn test_window_math_from_scroll_offset() {
        let mut c = cache();
        c.reset(100);
        let effects = c.handle_scroll(45);
        // floor(45 / 20) = 2; window is [2, 9].
        assert_eq!(c.first_visible(), 2);
        assert_eq!(fetches(&effects), vec![2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_identical_scroll_is_idempotent() {
        let mut c = cache();
        c.reset(100);
        let first = c.handle_scroll(40);
        assert_eq!(fetches(&first).len(), 8);
        let second = c.handle_scroll(40);
        assert_eq!(fetches(&second), Vec::<usize>::new());
        // Rows still repaint as placeholders; only the fetch set is stable.
        assert_eq!(second.renders.len(), 8);
    }

    #[test]
    fn test_known_entries_not_refetched_after_scroll_away_and_back() {
        let mut c = cache();
        c.reset(100);
        c.handle_scroll(0);
        for pos in 0..8 {
            c.store_item(pos, format!("track {}", pos));
        }
        c.handle_scroll(400);
        let back = c.handle_scroll(0);
        assert_eq!(fetches(&back), Vec::<usize>::new());
        assert!(back
            .renders
            .iter()
            .all(|(_, content)| matches!(content, RowContent::Known { .. })));
    }

    #[test]
    fn test_item_arrival_renders_row_and_prefetches_next_unknown() {
        let mut c = cache();
        c.reset(10);
        // Window [0, 7], nothing requested yet (server pushed unprompted).
        let effects = c.store_item(5, "Song".into());
        assert_eq!(
            effects.renders,
            vec![(
                5,
                RowContent::Known {
                    position: 5,
                    title: "Song".into()
                }
            )]
        );
        assert_eq!(effects.fetches, vec![6]);
    }

    #[test]
    fn test_lookahead_skips_pending_and_known() {
        let mut c = cache();
        c.reset(20);
        c.handle_scroll(0); // positions 0..=7 now pending
        let effects = c.store_item(5, "Song".into());
        // 6 and 7 are pending, so the lookahead lands on 8.
        assert_eq!(effects.fetches, vec![8]);
    }

    #[test]
    fn test_lookahead_stops_at_playlist_end() {
        let mut c = cache();
        c.reset(6);
        let effects = c.store_item(5, "last".into());
        assert_eq!(effects.fetches, Vec::<usize>::new());
    }

    #[test]
    fn test_off_screen_item_stored_without_effects() {
        let mut c = cache();
        c.reset(100);
        c.handle_scroll(0);
        let effects = c.store_item(50, "later".into());
        assert_eq!(effects, SyncEffects::default());
        assert_eq!(c.title(50), Some("later"));
    }

    #[test]
    fn test_item_arrival_clears_pending_so_rescroll_refetches_nothing_extra() {
        let mut c = cache();
        c.reset(10);
        c.handle_scroll(0);
        c.store_item(3, "three".into());
        let again = c.handle_scroll(0);
        // 3 is known now, the rest are still pending from the first sync.
        assert_eq!(fetches(&again), Vec::<usize>::new());
    }

    #[test]
    fn test_empty_title_is_known() {
        let mut c = cache();
        c.reset(4);
        c.store_item(1, String::new());
        assert_eq!(c.title(1), Some(""));
        assert_eq!(c.known_count(), 1);
    }

    #[test]
    fn test_viewport_resize_recomputes_span() {
        let mut c = cache();
        c.reset(100);
        let effects = c.set_viewport(60); // 3 visible rows -> span 4
        assert_eq!(effects.renders.len(), 4);
        assert_eq!(fetches(&effects), vec![0, 1, 2, 3]);
    }
}
