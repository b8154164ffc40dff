#[cfg(test)]
#[path = "scroll_test.rs"]
mod tests;

use ratatui::widgets::ScrollbarState;

/// Scroll position of the transcript, in wrapped lines from the top.
///
/// While `follow` is set the view sticks to the bottom as answers stream in.
/// Scrolling up releases it, and scrolling back to the bottom restores it.
#[derive(Default)]
pub struct Scroll {
    content_length: u16,
    viewport_length: u16,
    follow: bool,
    pub position: u16,
    pub scrollbar_state: ScrollbarState,
}

impl Scroll {
    fn max_position(&self) -> u16 {
        return self.content_length.saturating_sub(self.viewport_length);
    }

    fn page(&self) -> u16 {
        return self.viewport_length.saturating_sub(1).max(1);
    }

    fn sync_scrollbar(&mut self) {
        self.scrollbar_state = self
            .scrollbar_state
            .content_length(self.content_length)
            .viewport_content_length(self.viewport_length)
            .position(self.position);
    }

    pub fn is_following(&self) -> bool {
        return self.follow;
    }

    pub fn up_by(&mut self, lines: u16) {
        self.position = self.position.saturating_sub(lines);
        self.follow = self.position >= self.max_position();
        self.sync_scrollbar();
    }

    pub fn down_by(&mut self, lines: u16) {
        self.position = self.position.saturating_add(lines).min(self.max_position());
        self.follow = self.position >= self.max_position();
        self.sync_scrollbar();
    }

    pub fn up(&mut self) {
        self.up_by(1);
    }

    pub fn up_page(&mut self) {
        self.up_by(self.page());
    }

    pub fn down(&mut self) {
        self.down_by(1);
    }

    pub fn down_page(&mut self) {
        self.down_by(self.page());
    }

    pub fn last(&mut self) {
        self.follow = true;
        self.position = self.max_position();
        self.sync_scrollbar();
    }

    /// Updates the measured sizes, keeping the view on the bottom when
    /// following and otherwise clamping to the new content.
    pub fn set_state(&mut self, content_length: u16, viewport_length: u16) {
        self.content_length = content_length;
        self.viewport_length = viewport_length;

        if self.follow {
            self.position = self.max_position();
        } else {
            self.position = self.position.min(self.max_position());
        }

        self.sync_scrollbar();
    }
}
