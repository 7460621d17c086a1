use std::sync::{Mutex, MutexGuard};

/// Progress sink for the render pipeline. The CLI prints, library callers
/// collect or discard.
pub trait OutputHandler: Send + Sync {
    /// A target finished or the output was written
    fn success(&self, message: &str);

    /// Something was rendered but may not be what the user meant, such as a
    /// mark with no configured value
    fn warning(&self, message: &str);

    /// Start of a target
    fn heading(&self, message: &str);

    /// One produced artifact, e.g. `("Rendered", "setup.sql")`
    fn status(&self, action: &str, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLevel {
    Success,
    Warning,
    Heading,
    Status,
}

/// Collects every message in arrival order
#[derive(Debug, Default)]
pub struct LibraryOutputHandler {
    messages: Mutex<Vec<(OutputLevel, String)>>,
}

impl LibraryOutputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_messages(&self) -> Vec<(OutputLevel, String)> {
        self.lock().clone()
    }

    /// Messages of one level, without their level tag
    pub fn messages_at(&self, level: OutputLevel) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(OutputLevel, String)>> {
        self.messages.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, level: OutputLevel, message: String) {
        self.lock().push((level, message));
    }
}

impl OutputHandler for LibraryOutputHandler {
    fn success(&self, message: &str) {
        self.push(OutputLevel::Success, message.to_string());
    }

    fn warning(&self, message: &str) {
        self.push(OutputLevel::Warning, message.to_string());
    }

    fn heading(&self, message: &str) {
        self.push(OutputLevel::Heading, message.to_string());
    }

    fn status(&self, action: &str, message: &str) {
        self.push(OutputLevel::Status, format!("{} {}", action, message));
    }
}

/// Colored terminal output
#[cfg(feature = "cli")]
pub struct CliOutputHandler;

#[cfg(feature = "cli")]
impl OutputHandler for CliOutputHandler {
    fn success(&self, message: &str) {
        use owo_colors::OwoColorize;
        println!("{} {}", "✓".green(), message);
    }

    fn warning(&self, message: &str) {
        use owo_colors::OwoColorize;
        println!("{} {}", "⚠".yellow(), message);
    }

    fn heading(&self, message: &str) {
        use owo_colors::OwoColorize;
        println!("\n{}", message.bold());
    }

    fn status(&self, action: &str, message: &str) {
        use owo_colors::OwoColorize;
        println!("{:>12} {}", action.green().bold(), message);
    }
}

pub struct SilentOutputHandler;

impl OutputHandler for SilentOutputHandler {
    fn success(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}
    fn heading(&self, _message: &str) {}
    fn status(&self, _action: &str, _message: &str) {}
}
