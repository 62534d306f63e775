//! Browser/driver session seam.
//!
//! The listener only needs two things from the active session: a screenshot,
//! or failing that, the rendered page markup. Drivers that cannot render
//! report [`CaptureResult::Unsupported`] instead of an error so the caller
//! can fall back without inspecting error types.

use crate::event::{ScenarioInfo, StepInfo};
use crate::framebuffer::Framebuffer;

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Outcome of a screenshot request
#[derive(Debug)]
pub enum CaptureResult {
    /// Encoded image bytes
    Screenshot(Vec<u8>),
    /// The active driver cannot take screenshots
    Unsupported(String),
    /// The driver tried and failed
    Failure(SessionError),
}

/// Errors reported by a session
#[derive(Debug)]
pub enum SessionError {
    /// The driver does not implement the requested operation
    Unsupported(String),
    /// Driver-level failure (lost connection, crashed browser, ...)
    Driver(String),
    /// I/O error talking to the driver
    Io(std::io::Error),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Unsupported(msg) => write!(f, "Unsupported operation: {}", msg),
            SessionError::Driver(msg) => write!(f, "Driver error: {}", msg),
            SessionError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Io(err)
    }
}

impl From<image::ImageError> for SessionError {
    fn from(err: image::ImageError) -> Self {
        SessionError::Driver(format!("Failed to encode PNG: {}", err))
    }
}

/// An active test session that can produce failure evidence
pub trait Session {
    /// Take a screenshot of the current page
    fn capture_screenshot(&mut self) -> CaptureResult;

    /// Rendered markup of the current page
    fn page_content(&mut self) -> SessionResult<String>;

    /// Short driver name for logs
    fn driver_name(&self) -> &str;
}

impl<S: Session + ?Sized> Session for Box<S> {
    fn capture_screenshot(&mut self) -> CaptureResult {
        (**self).capture_screenshot()
    }

    fn page_content(&mut self) -> SessionResult<String> {
        (**self).page_content()
    }

    fn driver_name(&self) -> &str {
        (**self).driver_name()
    }
}

/// Session backed by an in-memory framebuffer; always supports screenshots
#[derive(Debug, Clone)]
pub struct FramebufferSession {
    frame: Framebuffer,
    content: String,
}

impl FramebufferSession {
    const BACKGROUND: [u8; 3] = [32, 32, 32];
    const HEADER: [u8; 3] = [160, 32, 32];
    const TEXT: [u8; 3] = [230, 230, 230];

    /// Create a session with a blank frame of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frame: Framebuffer::with_color(width, height, Self::BACKGROUND),
            content: String::new(),
        }
    }

    pub fn frame(&self) -> &Framebuffer {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut Framebuffer {
        &mut self.frame
    }

    pub fn set_page_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Redraw the frame as a card describing the step being executed
    pub fn show_step(&mut self, scenario: &ScenarioInfo, step: &StepInfo) {
        let width = self.frame.width();
        self.frame.fill(Self::BACKGROUND);
        self.frame.draw_rect(0, 0, width, 24, Self::HEADER);
        self.frame.draw_text(8, 8, &scenario.feature_title, Self::TEXT, Self::HEADER);

        let y = self
            .frame
            .draw_wrapped_text(8, 36, &scenario.scenario_title, Self::TEXT, Self::BACKGROUND);
        self.frame
            .draw_wrapped_text(8, y + 12, &step.text, Self::TEXT, Self::BACKGROUND);

        self.content = format!(
            "<html><body><h1>{}</h1><h2>{}</h2><p>{}</p></body></html>",
            scenario.feature_title, scenario.scenario_title, step.text
        );
    }
}

impl Session for FramebufferSession {
    fn capture_screenshot(&mut self) -> CaptureResult {
        match self.frame.to_png() {
            Ok(bytes) => CaptureResult::Screenshot(bytes),
            Err(err) => CaptureResult::Failure(err.into()),
        }
    }

    fn page_content(&mut self) -> SessionResult<String> {
        Ok(self.content.clone())
    }

    fn driver_name(&self) -> &str {
        "framebuffer"
    }
}

/// Text-only session, like a headless HTTP driver: no screenshots, only markup
#[derive(Debug, Clone, Default)]
pub struct MarkupSession {
    content: String,
}

impl MarkupSession {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn set_page_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }
}

impl Session for MarkupSession {
    fn capture_screenshot(&mut self) -> CaptureResult {
        CaptureResult::Unsupported("markup driver cannot render screenshots".to_string())
    }

    fn page_content(&mut self) -> SessionResult<String> {
        Ok(self.content.clone())
    }

    fn driver_name(&self) -> &str {
        "markup"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framebuffer_session_produces_png() {
        let mut session = FramebufferSession::new(64, 48);
        match session.capture_screenshot() {
            CaptureResult::Screenshot(bytes) => {
                assert_eq!(&bytes[0..4], &[0x89, 0x50, 0x4E, 0x47]);
            }
            other => panic!("expected screenshot, got {:?}", other),
        }
    }

    #[test]
    fn test_show_step_updates_frame_and_content() {
        let mut session = FramebufferSession::new(320, 120);
        let before = session.frame().get_pixel(2, 2);
        session.show_step(
            &ScenarioInfo::new("Login Flow", "Invalid password"),
            &StepInfo::new("I see an error"),
        );
        assert_ne!(session.frame().get_pixel(2, 2), before);
        assert!(session.page_content().unwrap().contains("I see an error"));
    }

    #[test]
    fn test_markup_session_is_unsupported() {
        let mut session = MarkupSession::new("<p>hi</p>");
        assert!(matches!(session.capture_screenshot(), CaptureResult::Unsupported(_)));
        assert_eq!(session.page_content().unwrap(), "<p>hi</p>");
    }

    #[test]
    fn test_boxed_session_delegates() {
        let mut session: Box<dyn Session> = Box::new(MarkupSession::new("x"));
        assert_eq!(session.driver_name(), "markup");
        assert_eq!(session.page_content().unwrap(), "x");
    }
}
