//! xl-com: the automation bridge used to drive Excel.
//!
//! [`Bridge`] creates application instances and manages per-thread setup;
//! [`Application`] is the handful of object-model calls the harness needs.
//! Application values are thread-affine: they must only be used on the
//! thread that called [`Bridge::enter_thread`] and [`Bridge::launch`], which
//! is why `Application` is deliberately not `Send`.
//!
//! [`ComBridge`] is the production implementation (COM `IDispatch` late
//! binding on Windows, unavailable elsewhere). A recording mock lives behind
//! the `test-utils` feature.

use std::path::Path;

mod com;
mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use com::{ComBridge, ExcelApp};
pub use error::{BridgeError, Result};

/// Platform mechanism for creating and driving the spreadsheet application.
pub trait Bridge: Send + 'static {
    /// Handle to one launched instance.
    type App: Application;

    /// One-time initialisation on the calling thread (COM apartment entry).
    fn enter_thread(&self) -> Result<()>;

    /// Undo [`Bridge::enter_thread`]. Called once, on the same thread.
    fn leave_thread(&self);

    /// Create an isolated application instance.
    fn launch(&self) -> Result<Self::App>;
}

/// Late-bound view of one running application instance.
pub trait Application {
    /// Main window handle of the instance.
    fn hwnd(&self) -> Result<isize>;
    /// `Application.DisplayAlerts`.
    fn set_display_alerts(&self, on: bool) -> Result<()>;
    /// `Application.AskToUpdateLinks`.
    fn set_ask_to_update_links(&self, on: bool) -> Result<()>;
    /// Object-model visibility (`Application.Visible`), independent of the OS window state.
    fn set_visible(&self, on: bool) -> Result<()>;
    /// Name of the already-open workbook whose full path is `path`.
    fn find_workbook(&self, path: &Path) -> Result<String>;
    /// Bring the named open workbook to the front.
    fn activate_workbook(&self, name: &str) -> Result<()>;
    /// Open `path`, passing `UpdateLinks:=0` when `suppress_links` is set. Returns the workbook name.
    fn open_workbook(&self, path: &Path, suppress_links: bool) -> Result<String>;
    /// `Application.Run(macro_name, args...)`.
    fn run(&self, macro_name: &str, args: &[String]) -> Result<()>;
    /// `Application.Quit`. The instance must not be used afterwards.
    fn quit(&self) -> Result<()>;
}
