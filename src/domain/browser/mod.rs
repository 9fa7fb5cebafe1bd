pub mod known_browser;
pub mod mode;

pub use known_browser::{KnownBrowser, KNOWN_BROWSERS};
pub use mode::{BrowserMode, InAppBrowserSettings};
