//! Thin user32 bindings. Everything here is best-effort and side-effect only;
//! callers decide what a failure means.

pub use imp::*;

#[cfg(windows)]
mod imp {
    use std::ffi::c_void;

    use tracing::trace;
    use windows::Win32::{
        Foundation::{BOOL, HWND, LPARAM, TRUE},
        UI::WindowsAndMessaging::{
            EnumWindows, GetClassNameW, GetForegroundWindow, GetWindowThreadProcessId,
            HWND_NOTOPMOST, HWND_TOPMOST, IsIconic, IsWindow, IsWindowVisible, SW_HIDE,
            SW_MINIMIZE, SW_RESTORE, SW_SHOW, SWP_NOMOVE, SWP_NOSIZE, SWP_SHOWWINDOW,
            SetForegroundWindow, SetWindowPos, ShowWindow,
        },
    };

    use crate::{Error, Hwnd, Result, ShowCmd, WindowInfo};

    pub const AVAILABLE: bool = true;

    fn handle(h: Hwnd) -> HWND {
        HWND(h as *mut c_void)
    }

    fn os_err(op: &'static str, e: &windows::core::Error) -> Error {
        Error::Os {
            op,
            code: e.code().0,
        }
    }

    unsafe extern "system" fn collect(hwnd: HWND, lparam: LPARAM) -> BOOL {
        // SAFETY: lparam carries the `&mut Vec<Hwnd>` passed by `windows_for_pid`,
        // which outlives the synchronous EnumWindows call.
        let out = unsafe { &mut *(lparam.0 as *mut Vec<Hwnd>) };
        out.push(hwnd.0 as Hwnd);
        TRUE
    }

    fn class_name(h: HWND) -> String {
        let mut buf = [0u16; 256];
        // SAFETY: buffer is valid for its full length.
        let len = unsafe { GetClassNameW(h, &mut buf) };
        if len <= 0 {
            return String::new();
        }
        String::from_utf16_lossy(&buf[..len as usize])
    }

    pub fn window_pid(h: Hwnd) -> Result<u32> {
        let w = handle(h);
        // SAFETY: plain handle queries.
        if !unsafe { IsWindow(w) }.as_bool() {
            return Err(Error::WindowGone(h));
        }
        let mut pid = 0u32;
        unsafe { GetWindowThreadProcessId(w, Some(&mut pid)) };
        if pid == 0 {
            return Err(Error::WindowGone(h));
        }
        Ok(pid)
    }

    pub fn windows_for_pid(pid: u32) -> Result<Vec<WindowInfo>> {
        let mut raw: Vec<Hwnd> = Vec::new();
        // SAFETY: `collect` only writes into `raw` for the duration of the call.
        unsafe { EnumWindows(Some(collect), LPARAM(&mut raw as *mut Vec<Hwnd> as isize)) }
            .map_err(|e| os_err("EnumWindows", &e))?;
        let out: Vec<WindowInfo> = raw
            .into_iter()
            .filter_map(|h| {
                let w = handle(h);
                let mut owner = 0u32;
                unsafe { GetWindowThreadProcessId(w, Some(&mut owner)) };
                if owner != pid || !unsafe { IsWindow(w) }.as_bool() {
                    return None;
                }
                Some(WindowInfo::new(h, pid, class_name(w)))
            })
            .collect();
        trace!(pid, count = out.len(), "windows_for_pid");
        Ok(out)
    }

    pub fn is_visible(h: Hwnd) -> bool {
        unsafe { IsWindowVisible(handle(h)) }.as_bool()
    }

    pub fn is_minimized(h: Hwnd) -> bool {
        unsafe { IsIconic(handle(h)) }.as_bool()
    }

    pub fn show(h: Hwnd, cmd: ShowCmd) -> Result<()> {
        let sw = match cmd {
            ShowCmd::Hide => SW_HIDE,
            ShowCmd::Minimize => SW_MINIMIZE,
            ShowCmd::Restore => SW_RESTORE,
            ShowCmd::Show => SW_SHOW,
        };
        let w = handle(h);
        if !unsafe { IsWindow(w) }.as_bool() {
            return Err(Error::WindowGone(h));
        }
        // The return value reports the previous visibility, not success.
        let _ignored = unsafe { ShowWindow(w, sw) };
        Ok(())
    }

    pub fn set_foreground(h: Hwnd) -> Result<()> {
        if unsafe { SetForegroundWindow(handle(h)) }.as_bool() {
            Ok(())
        } else {
            Err(Error::NoEffect("SetForegroundWindow"))
        }
    }

    pub fn foreground() -> Option<Hwnd> {
        let w = unsafe { GetForegroundWindow() };
        if w.0.is_null() { None } else { Some(w.0 as Hwnd) }
    }

    pub fn set_topmost(h: Hwnd, topmost: bool) -> Result<()> {
        let after = if topmost { HWND_TOPMOST } else { HWND_NOTOPMOST };
        unsafe {
            SetWindowPos(
                handle(h),
                after,
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_SHOWWINDOW,
            )
        }
        .map_err(|e| os_err("SetWindowPos", &e))
    }
}

#[cfg(not(windows))]
mod imp {
    use crate::{Error, Hwnd, Result, ShowCmd, WindowInfo};

    pub const AVAILABLE: bool = false;

    pub fn window_pid(_h: Hwnd) -> Result<u32> {
        Err(Error::Unavailable)
    }

    pub fn windows_for_pid(_pid: u32) -> Result<Vec<WindowInfo>> {
        Err(Error::Unavailable)
    }

    pub fn is_visible(_h: Hwnd) -> bool {
        false
    }

    pub fn is_minimized(_h: Hwnd) -> bool {
        false
    }

    pub fn show(_h: Hwnd, _cmd: ShowCmd) -> Result<()> {
        Err(Error::Unavailable)
    }

    pub fn set_foreground(_h: Hwnd) -> Result<()> {
        Err(Error::Unavailable)
    }

    pub fn foreground() -> Option<Hwnd> {
        None
    }

    pub fn set_topmost(_h: Hwnd, _topmost: bool) -> Result<()> {
        Err(Error::Unavailable)
    }
}
