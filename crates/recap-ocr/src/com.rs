use crate::ExtractError;

/// RAII guard for COM initialization on the current thread
pub struct ComGuard;

impl ComGuard {
    pub fn initialize() -> Result<Self, ExtractError> {
        unsafe {
            windows::Win32::System::Com::CoInitializeEx(
                Some(std::ptr::null()),
                windows::Win32::System::Com::COINIT_MULTITHREADED,
            )
            .ok()
            .map_err(|e| ExtractError::Engine(format!("Failed to initialize COM: {e}")))?;
        }
        Ok(ComGuard)
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        unsafe {
            windows::Win32::System::Com::CoUninitialize();
        }
    }
}
