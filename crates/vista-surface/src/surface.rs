//! Render surface
//!
//! Wraps a host [`Viewport`] and owns the single pending "reveal" that a
//! load completion may trigger. The host reports completions through
//! [`RenderSurface::load_finished`].

use crate::state::SurfaceState;

pub const BLANK_URL: &str = "about:blank";

/// The host's embeddable view. Every method must be safe to repeat.
pub trait Viewport: Send {
    /// Point the view at `url`
    fn navigate(&mut self, url: &str);
    /// Replace the view's document with `content`
    fn write_document(&mut self, content: &str);
    fn set_visible(&mut self, visible: bool);
    fn set_loading(&mut self, loading: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reveal {
    Content,
    Url,
}

pub struct RenderSurface {
    viewport: Box<dyn Viewport>,
    state: SurfaceState,
    /// URL the view is pointed at, if any
    target: Option<String>,
    pending: Option<Reveal>,
    loading: bool,
}

impl RenderSurface {
    pub fn new(viewport: Box<dyn Viewport>) -> Self {
        Self {
            viewport,
            state: SurfaceState::Blank,
            target: None,
            pending: None,
            loading: false,
        }
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn current_target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Blank and hide the view and forget any pending reveal.
    ///
    /// A load completion arriving after this call does nothing.
    pub fn reset(&mut self) {
        self.pending = None;
        self.target = None;
        self.viewport.navigate(BLANK_URL);
        self.viewport.set_visible(false);
        self.transition(SurfaceState::Blank);
    }

    /// Blank the view and raise the loading indicator while something else
    /// (a server start) decides what to show.
    pub fn show_loading(&mut self) {
        self.reset();
        self.set_loading(true);
        self.transition(SurfaceState::Loading);
    }

    pub fn show_content(&mut self, content: &str) {
        self.reset();
        self.set_loading(true);
        self.transition(SurfaceState::Loading);
        self.viewport.write_document(content);
        self.pending = Some(Reveal::Content);
    }

    pub fn show_url(&mut self, url: &str) {
        self.reset();
        self.set_loading(true);
        self.transition(SurfaceState::Loading);
        self.viewport.navigate(url);
        self.target = Some(url.to_string());
        self.pending = Some(Reveal::Url);
    }

    /// The view finished loading. Reveals whatever is pending, if anything.
    pub fn load_finished(&mut self) -> bool {
        let Some(reveal) = self.pending.take() else {
            return false;
        };

        self.viewport.set_visible(true);
        self.set_loading(false);
        self.transition(match reveal {
            Reveal::Content => SurfaceState::ShowingContent,
            Reveal::Url => SurfaceState::ShowingUrl,
        });
        true
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
        self.viewport.set_loading(loading);
    }

    fn transition(&mut self, next: SurfaceState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "surface transition {} -> {}",
            self.state,
            next
        );

        if self.state != next {
            tracing::debug!(from = %self.state, to = %next, "Surface state transition");
        }
        self.state = next;
    }
}
