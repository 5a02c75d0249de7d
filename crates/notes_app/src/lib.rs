//! Notes page session: keeps one notes control injected into a watch page and
//! drives it against the notes service.
pub mod platform;

pub use platform::browser::ConsoleBrowser;
pub use platform::config::{load_config, AppConfig, ConfigError, ControlSettings};
pub use platform::effects::{ControlContext, ControlDriver, DownloadOutcome};
pub use platform::injector::{Injector, Trigger};
pub use platform::page::{ContainerId, ControlId, Node, Page, VirtualPage};
pub use platform::session::{build_services, PageSession, Services};
