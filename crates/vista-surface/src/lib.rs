//! Vista Render Surface
//!
//! One embeddable viewport per tab, showing either nothing, a document
//! written straight into it, or a remote URL. Every mode change passes
//! through blank first so stale content never flashes and a live view is
//! never refreshed in place.

mod state;
mod surface;

pub use state::SurfaceState;
pub use surface::{RenderSurface, Viewport, BLANK_URL};
