pub mod headless;

pub use headless::{HeadlessSession, LaunchOptions};
