//! COM late-binding implementation of the bridge.

pub use imp::ExcelApp;

/// Production bridge: `Excel.Application` over COM.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComBridge;

#[cfg(windows)]
mod imp {
    use std::{path::Path, ptr};

    use tracing::{debug, trace};
    use windows::{
        Win32::System::{
            Com::{
                CLSCTX_LOCAL_SERVER, CLSIDFromProgID, COINIT_APARTMENTTHREADED, CoCreateInstance,
                CoInitializeEx, CoUninitialize, DISPATCH_FLAGS, DISPATCH_METHOD,
                DISPATCH_PROPERTYGET, DISPATCH_PROPERTYPUT, DISPPARAMS, EXCEPINFO, IDispatch,
            },
            Ole::DISPID_PROPERTYPUT,
        },
        core::{BSTR, GUID, HSTRING, IUnknown, Interface, PCWSTR, VARIANT, w},
    };

    use super::ComBridge;
    use crate::{Application, Bridge, BridgeError, Result};

    const LOCALE_USER_DEFAULT: u32 = 0x0400;

    fn com_err(op: &str, e: &windows::core::Error) -> BridgeError {
        BridgeError::Com {
            op: op.to_string(),
            code: e.code().0,
            message: e.message().to_string(),
        }
    }

    /// Owned `IDispatch` with name-based helpers.
    struct Dispatch(IDispatch);

    impl Dispatch {
        fn dispid(&self, name: &str) -> Result<i32> {
            let wide = HSTRING::from(name);
            let names = [PCWSTR(wide.as_ptr())];
            let mut id = 0i32;
            // SAFETY: one name in, one id out; both buffers live for the call.
            unsafe {
                self.0
                    .GetIDsOfNames(&GUID::zeroed(), names.as_ptr(), 1, LOCALE_USER_DEFAULT, &mut id)
            }
            .map_err(|e| com_err(name, &e))?;
            Ok(id)
        }

        fn invoke(&self, name: &str, flags: DISPATCH_FLAGS, args: &[VARIANT]) -> Result<VARIANT> {
            let id = self.dispid(name)?;
            // IDispatch expects arguments in reverse order.
            let mut rev: Vec<VARIANT> = args.iter().rev().cloned().collect();
            let mut put_id = DISPID_PROPERTYPUT;
            let mut params = DISPPARAMS {
                rgvarg: rev.as_mut_ptr(),
                rgdispidNamedArgs: ptr::null_mut(),
                cArgs: rev.len() as u32,
                cNamedArgs: 0,
            };
            if flags == DISPATCH_PROPERTYPUT {
                params.rgdispidNamedArgs = &mut put_id;
                params.cNamedArgs = 1;
            }
            let mut out = VARIANT::default();
            let mut excep = EXCEPINFO::default();
            trace!(member = name, argc = args.len(), "IDispatch::Invoke");
            // SAFETY: params/out/excep are valid for the duration of the call.
            let res = unsafe {
                self.0.Invoke(
                    id,
                    &GUID::zeroed(),
                    LOCALE_USER_DEFAULT,
                    flags,
                    &params,
                    Some(&mut out),
                    Some(&mut excep),
                    None,
                )
            };
            match res {
                Ok(()) => Ok(out),
                Err(e) => {
                    let desc = excep.bstrDescription.to_string();
                    if desc.is_empty() {
                        Err(com_err(name, &e))
                    } else {
                        Err(BridgeError::Com {
                            op: name.to_string(),
                            code: if excep.scode != 0 { excep.scode } else { e.code().0 },
                            message: desc,
                        })
                    }
                }
            }
        }

        fn get(&self, name: &str) -> Result<VARIANT> {
            self.invoke(name, DISPATCH_PROPERTYGET, &[])
        }

        fn put(&self, name: &str, value: VARIANT) -> Result<()> {
            self.invoke(name, DISPATCH_PROPERTYPUT, &[value]).map(|_| ())
        }

        fn call(&self, name: &str, args: &[VARIANT]) -> Result<VARIANT> {
            self.invoke(name, DISPATCH_METHOD, args)
        }

        fn child(&self, name: &str, args: &[VARIANT]) -> Result<Self> {
            let v = self.invoke(name, DISPATCH_PROPERTYGET, args)?;
            Self::from_variant(name, &v)
        }

        fn from_variant(name: &str, v: &VARIANT) -> Result<Self> {
            let unk = IUnknown::try_from(v).map_err(|e| com_err(name, &e))?;
            let disp: IDispatch = unk.cast().map_err(|e| com_err(name, &e))?;
            Ok(Self(disp))
        }

        fn string(&self, name: &str) -> Result<String> {
            let v = self.get(name)?;
            BSTR::try_from(&v)
                .map(|b| b.to_string())
                .map_err(|e| com_err(name, &e))
        }
    }

    /// A running `Excel.Application`.
    pub struct ExcelApp {
        app: Dispatch,
    }

    impl ExcelApp {
        fn workbooks(&self) -> Result<Dispatch> {
            self.app.child("Workbooks", &[])
        }
    }

    impl Bridge for ComBridge {
        type App = ExcelApp;

        fn enter_thread(&self) -> Result<()> {
            // SAFETY: paired with CoUninitialize in `leave_thread` on the same thread.
            unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }
                .ok()
                .map_err(|e| BridgeError::Unavailable(format!("CoInitializeEx: {}", e.message())))
        }

        fn leave_thread(&self) {
            unsafe { CoUninitialize() };
        }

        fn launch(&self) -> Result<ExcelApp> {
            let clsid = unsafe { CLSIDFromProgID(w!("Excel.Application")) }
                .map_err(|e| BridgeError::Unavailable(format!("Excel is not registered: {}", e.message())))?;
            let disp: IDispatch = unsafe { CoCreateInstance(&clsid, None, CLSCTX_LOCAL_SERVER) }
                .map_err(|e| BridgeError::Unavailable(format!("cannot start Excel: {}", e.message())))?;
            debug!("created Excel.Application instance");
            Ok(ExcelApp {
                app: Dispatch(disp),
            })
        }
    }

    impl Application for ExcelApp {
        fn hwnd(&self) -> Result<isize> {
            let v = self.app.get("Hwnd")?;
            i32::try_from(&v)
                .map(|h| h as isize)
                .map_err(|e| com_err("Hwnd", &e))
        }

        fn set_display_alerts(&self, on: bool) -> Result<()> {
            self.app.put("DisplayAlerts", VARIANT::from(on))
        }

        fn set_ask_to_update_links(&self, on: bool) -> Result<()> {
            self.app.put("AskToUpdateLinks", VARIANT::from(on))
        }

        fn set_visible(&self, on: bool) -> Result<()> {
            self.app.put("Visible", VARIANT::from(on))
        }

        fn find_workbook(&self, path: &Path) -> Result<String> {
            let wanted = path.to_string_lossy();
            let books = self.workbooks()?;
            let count = i32::try_from(&books.get("Count")?).map_err(|e| com_err("Count", &e))?;
            for i in 1..=count {
                let wb = books.child("Item", &[VARIANT::from(i)])?;
                if wb.string("FullName")?.eq_ignore_ascii_case(&wanted) {
                    return wb.string("Name");
                }
            }
            Err(BridgeError::other(format!("{wanted} is not open")))
        }

        fn activate_workbook(&self, name: &str) -> Result<()> {
            let wb = self
                .workbooks()?
                .child("Item", &[VARIANT::from(BSTR::from(name))])?;
            wb.call("Activate", &[]).map(|_| ())
        }

        fn open_workbook(&self, path: &Path, suppress_links: bool) -> Result<String> {
            let mut args = vec![VARIANT::from(BSTR::from(path.to_string_lossy().as_ref()))];
            if suppress_links {
                args.push(VARIANT::from(0i32));
            }
            let v = self.workbooks()?.call("Open", &args)?;
            Dispatch::from_variant("Open", &v)?.string("Name")
        }

        fn run(&self, macro_name: &str, args: &[String]) -> Result<()> {
            let mut argv = Vec::with_capacity(args.len() + 1);
            argv.push(VARIANT::from(BSTR::from(macro_name)));
            argv.extend(args.iter().map(|a| VARIANT::from(BSTR::from(a.as_str()))));
            self.app.call("Run", &argv).map(|_| ())
        }

        fn quit(&self) -> Result<()> {
            self.app.call("Quit", &[]).map(|_| ())
        }
    }
}

#[cfg(not(windows))]
mod imp {
    use std::path::Path;

    use super::ComBridge;
    use crate::{Application, Bridge, BridgeError, Result};

    /// Uninhabited off Windows: no instance can ever be created.
    pub enum ExcelApp {}

    fn unavailable() -> BridgeError {
        BridgeError::Unavailable("COM automation requires Windows".to_string())
    }

    impl Bridge for ComBridge {
        type App = ExcelApp;

        fn enter_thread(&self) -> Result<()> {
            Err(unavailable())
        }

        fn leave_thread(&self) {}

        fn launch(&self) -> Result<ExcelApp> {
            Err(unavailable())
        }
    }

    impl Application for ExcelApp {
        fn hwnd(&self) -> Result<isize> {
            match *self {}
        }
        fn set_display_alerts(&self, _on: bool) -> Result<()> {
            match *self {}
        }
        fn set_ask_to_update_links(&self, _on: bool) -> Result<()> {
            match *self {}
        }
        fn set_visible(&self, _on: bool) -> Result<()> {
            match *self {}
        }
        fn find_workbook(&self, _path: &Path) -> Result<String> {
            match *self {}
        }
        fn activate_workbook(&self, _name: &str) -> Result<()> {
            match *self {}
        }
        fn open_workbook(&self, _path: &Path, _suppress_links: bool) -> Result<String> {
            match *self {}
        }
        fn run(&self, _macro_name: &str, _args: &[String]) -> Result<()> {
            match *self {}
        }
        fn quit(&self) -> Result<()> {
            match *self {}
        }
    }

}
