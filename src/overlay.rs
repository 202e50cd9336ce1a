//! Pause overlay shown between blocks and after the last block.
//!
//! The overlay is toggled, never detached: hiding it makes it transparent,
//! non-interactive, zero-sized and parks it off-screen. Handles are resolved
//! in two tiers. The primary handle (looked up by id in the view) may have
//! gone stale; on any failure the statically-held fallback handle is used.

use crate::controller::RoundSnapshot;
use crate::error::TabletopResult;

pub const OFFSCREEN_POS: (f32, f32) = (-100_000.0, -100_000.0);

pub const SESSION_FINISHED_MESSAGE: &str = "Das Experiment ist beendet. Vielen Dank f\u{fc}r Ihre Teilnahme.";

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPresentation {
    pub opacity: f32,
    pub disabled: bool,
    /// `None` leaves sizing to the layout.
    pub size: Option<(f32, f32)>,
    /// `None` leaves positioning to the layout.
    pub pos: Option<(f32, f32)>,
    pub message: String,
}

impl OverlayPresentation {
    pub fn shown(message: &str) -> Self {
        OverlayPresentation {
            opacity: 1.0,
            disabled: false,
            size: None,
            pos: None,
            message: message.to_string(),
        }
    }

    pub fn hidden() -> Self {
        OverlayPresentation {
            opacity: 0.0,
            disabled: true,
            size: Some((0.0, 0.0)),
            pos: Some(OFFSCREEN_POS),
            message: String::new(),
        }
    }

    pub fn for_snapshot(snapshot: &RoundSnapshot) -> Self {
        if snapshot.in_block_pause {
            OverlayPresentation::shown(&snapshot.pause_message)
        } else if snapshot.session_finished {
            let message = if snapshot.pause_message.is_empty() {
                SESSION_FINISHED_MESSAGE
            } else {
                snapshot.pause_message.as_str()
            };
            OverlayPresentation::shown(message)
        } else {
            OverlayPresentation::hidden()
        }
    }

    pub fn is_visible(&self) -> bool {
        !self.disabled && self.opacity > 0.0
    }
}

pub trait OverlayHandle {
    /// Push the presentation to the widget behind this handle. Fails with
    /// `StaleOverlayHandle` when the widget can no longer be reached.
    fn apply(&mut self, presentation: &OverlayPresentation) -> TabletopResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleTier {
    Primary,
    Fallback,
}

pub fn apply_with_fallback(
    primary: Option<&mut dyn OverlayHandle>,
    fallback: &mut dyn OverlayHandle,
    presentation: &OverlayPresentation,
) -> TabletopResult<HandleTier> {
    if let Some(handle) = primary {
        match handle.apply(presentation) {
            Ok(()) => return Ok(HandleTier::Primary),
            Err(err) => log::warn!("pause overlay: {}, using fallback handle", err),
        }
    }
    fallback.apply(presentation)?;
    Ok(HandleTier::Fallback)
}

/// Keeps the overlay in step with the session.
#[derive(Debug, Default)]
pub struct PauseOverlay {
    raise_pending: bool,
    current: Option<OverlayPresentation>,
}

impl PauseOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(
        &mut self,
        snapshot: &RoundSnapshot,
        primary: Option<&mut dyn OverlayHandle>,
        fallback: &mut dyn OverlayHandle,
    ) -> TabletopResult<HandleTier> {
        let presentation = OverlayPresentation::for_snapshot(snapshot);
        let tier = apply_with_fallback(primary, fallback, &presentation)?;
        // A visible overlay must sit above its siblings; hiding it cancels
        // any raise that has not happened yet.
        self.raise_pending = presentation.is_visible();
        self.current = Some(presentation);
        Ok(tier)
    }

    pub fn is_visible(&self) -> bool {
        self.current.as_ref().map(|p| p.is_visible()).unwrap_or(false)
    }

    pub fn presentation(&self) -> Option<&OverlayPresentation> {
        self.current.as_ref()
    }

    pub fn raise_pending(&self) -> bool {
        self.raise_pending
    }

    /// Consume the pending raise request, if any.
    pub fn take_raise(&mut self) -> bool {
        std::mem::replace(&mut self.raise_pending, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_has_no_hitbox() {
        let hidden = OverlayPresentation::hidden();
        assert!(!hidden.is_visible());
        assert_eq!(hidden.size, Some((0.0, 0.0)));
        assert_eq!(hidden.pos, Some(OFFSCREEN_POS));
    }

    #[test]
    fn test_shown_is_visible() {
        let shown = OverlayPresentation::shown("Pause");
        assert!(shown.is_visible());
        assert_eq!(shown.message, "Pause");
        assert!(shown.size.is_none());
    }
}
