//! Terminal UI rendering using ratatui.
//!
//! ## Submodules
//!
//! - [`monitor`]: Heart-rate number, smoothed chart, and the compact floating card
//! - [`settings`]: Overlay listing every configuration field
//! - [`common`]: Shared components (header, status bar, help overlay)
//! - [`theme`]: Light/dark palettes, terminal auto-detection, configured colours
//!
//! ## Rendering Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Number (monitor, if showNumber)      │
//! ├──────────────────────────────────────┤
//! │ Chart (monitor, if showChart)        │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlays rendered on top:
//!    - settings::render_overlay
//!    - common::render_help
//! ```
//!
//! In floating mode the whole layout is replaced by `monitor::render_floating`.

pub mod common;
pub mod monitor;
pub mod settings;
pub mod theme;

pub use theme::Theme;

use ratatui::{layout::Rect, Frame};

use crate::app::App;

/// Draw one frame of the application.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.config().floating_mode {
        monitor::render_floating(frame, app, area);
    } else {
        let [header, body, status] = common::main_layout(area);
        common::render_header(frame, app, header);
        monitor::render(frame, app, body);
        common::render_status_bar(frame, app, status);
    }

    if app.show_settings {
        settings::render_overlay(frame, app, area);
    }
    if app.show_help {
        common::render_help(frame, app, area);
    }
}

/// A rectangle of at most `width` x `height` centred in `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}
