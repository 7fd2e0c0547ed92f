use {
    anyhow::bail,
    std::ffi::c_void,
    windows_sys::Win32::UI::WindowsAndMessaging::{
        SetForegroundWindow, ShowWindow, SW_MAXIMIZE, SW_RESTORE,
    },
};

pub struct Context {}

// xcap returns HWND pointer as window id.
fn hwnd(window: &crate::Window) -> *mut c_void {
    window.id() as usize as *mut c_void
}

impl Context {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {})
    }

    pub fn activate_window(&self, window: &crate::Window) -> anyhow::Result<()> {
        if window.is_minimized()? {
            unsafe { ShowWindow(hwnd(window), SW_RESTORE) };
        }
        let ret = unsafe { SetForegroundWindow(hwnd(window)) };
        if ret == 0 {
            bail!("failed to activate window {}", window.id());
        }
        Ok(())
    }

    pub fn maximize_window(&self, window: &crate::Window) -> anyhow::Result<()> {
        // The return value is the previous visibility state, not an error code.
        unsafe { ShowWindow(hwnd(window), SW_MAXIMIZE) };
        Ok(())
    }
}
