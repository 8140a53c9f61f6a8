//! Raw ABI surface of the engine module.
//!
//! The module is not linked at build time — the host downloads it and this
//! crate loads it at runtime (`dlopen` on Unix, `LoadLibraryW` on Windows),
//! resolving each entry point by name into a typed function pointer.
//!
//! Signatures and constants follow `ttsapi.h` from the DECtalk sources.
//! Every call returns an `MMRESULT`-style status where 0 means success.

use std::ffi::{CStr, c_char, c_int, c_uint, c_void};
use std::path::Path;

use crate::error::LoadError;

/// Opaque per-instance engine handle (`LPTTS_HANDLE_T`).
pub(crate) type TtsHandle = *mut c_void;

/// Default wave-out device selector.
pub(crate) const WAVE_MAPPER: c_int = -1;
/// `GetStatus` identifier; a non-zero result means the instance is rendering.
pub(crate) const STATUS_SPEAKING: c_uint = 1;
/// `SetVolume` selector for the main output volume.
pub(crate) const VOLUME_MAIN: c_uint = 1;
/// Speak flag: preempt whatever the instance is currently rendering.
pub(crate) const SPEAK_FORCE: c_uint = 1;

type StartupFn = unsafe extern "system" fn(
    handle: *mut TtsHandle,
    device_number: c_int,
    device_options: c_uint,
    callback: *const c_void,
    callback_param: c_int,
    dictionary: *const c_char,
) -> c_uint;

type SpeakFn =
    unsafe extern "system" fn(handle: TtsHandle, text: *const c_char, flags: c_uint) -> c_uint;

type SetVolumeFn =
    unsafe extern "system" fn(handle: TtsHandle, kind: c_uint, volume: c_int) -> c_uint;

type GetStatusFn = unsafe extern "system" fn(
    handle: TtsHandle,
    identifiers: *const c_uint,
    statuses: *mut c_uint,
    count: c_uint,
) -> c_uint;

type ResetFn = unsafe extern "system" fn(handle: TtsHandle, discard: c_int) -> c_uint;

type ShutdownFn = unsafe extern "system" fn(handle: TtsHandle) -> c_uint;

// ── Resolved entry-point table ─────────────────────────────────────

/// Entry points of one loaded engine module.
///
/// The table is immutable after load, and the module stays mapped for as
/// long as the table lives.
pub(crate) struct Api {
    pub(crate) startup: StartupFn,
    pub(crate) speak: SpeakFn,
    pub(crate) set_volume: SetVolumeFn,
    pub(crate) get_status: GetStatusFn,
    pub(crate) reset: ResetFn,
    pub(crate) shutdown: ShutdownFn,
    _module: platform::Module,
}

impl Api {
    /// Load the module at `path` and resolve every entry point.
    pub(crate) fn load(path: &Path) -> Result<Self, LoadError> {
        let module = platform::Module::open(path)?;

        let startup = resolve(&module, c"TextToSpeechStartupExFonix")?;
        let speak = resolve(&module, c"TextToSpeechSpeak")?;
        let set_volume = resolve(&module, c"TextToSpeechSetVolume")?;
        let get_status = resolve(&module, c"TextToSpeechGetStatus")?;
        let reset = resolve(&module, c"TextToSpeechReset")?;
        let shutdown = resolve(&module, c"TextToSpeechShutdown")?;

        // Raw symbol addresses become typed entry points. The signatures are
        // fixed by ttsapi.h; a module exporting these names with different
        // shapes is out of contract.
        unsafe {
            Ok(Self {
                startup: std::mem::transmute::<*const c_void, StartupFn>(startup),
                speak: std::mem::transmute::<*const c_void, SpeakFn>(speak),
                set_volume: std::mem::transmute::<*const c_void, SetVolumeFn>(set_volume),
                get_status: std::mem::transmute::<*const c_void, GetStatusFn>(get_status),
                reset: std::mem::transmute::<*const c_void, ResetFn>(reset),
                shutdown: std::mem::transmute::<*const c_void, ShutdownFn>(shutdown),
                _module: module,
            })
        }
    }
}

fn resolve(module: &platform::Module, name: &'static CStr) -> Result<*const c_void, LoadError> {
    module.symbol(name).ok_or_else(|| LoadError::MissingSymbol {
        symbol: name.to_string_lossy().into_owned(),
    })
}

// ── Platform loaders ───────────────────────────────────────────────

#[cfg(unix)]
mod platform {
    use std::ffi::{CStr, CString, c_void};
    use std::os::unix::ffi::OsStrExt;
    use std::path::Path;

    use crate::error::LoadError;

    pub(crate) struct Module(*mut c_void);

    // The loader handle is a process-global token; dlsym/dlclose are safe to
    // call from any thread.
    unsafe impl Send for Module {}
    unsafe impl Sync for Module {}

    impl Module {
        pub(crate) fn open(path: &Path) -> Result<Self, LoadError> {
            let c_path =
                CString::new(path.as_os_str().as_bytes()).map_err(|_| LoadError::Module {
                    path: path.to_path_buf(),
                    reason: "path contains an interior NUL byte".into(),
                })?;

            let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_LAZY) };
            if handle.is_null() {
                return Err(LoadError::Module {
                    path: path.to_path_buf(),
                    reason: dlerror_string(),
                });
            }
            Ok(Self(handle))
        }

        pub(crate) fn symbol(&self, name: &'static CStr) -> Option<*const c_void> {
            let sym = unsafe { libc::dlsym(self.0, name.as_ptr()) };
            if sym.is_null() { None } else { Some(sym.cast_const()) }
        }
    }

    impl Drop for Module {
        fn drop(&mut self) {
            unsafe { libc::dlclose(self.0) };
        }
    }

    fn dlerror_string() -> String {
        let err = unsafe { libc::dlerror() };
        if err.is_null() {
            "unknown dlopen error".to_string()
        } else {
            unsafe { CStr::from_ptr(err) }.to_string_lossy().into_owned()
        }
    }
}

#[cfg(windows)]
mod platform {
    use std::ffi::{CStr, c_void};
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;

    use windows::Win32::Foundation::{FreeLibrary, HMODULE};
    use windows::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};
    use windows::core::{PCSTR, PCWSTR};

    use crate::error::LoadError;

    pub(crate) struct Module(HMODULE);

    // The loader handle is a process-global token; GetProcAddress and
    // FreeLibrary are safe to call from any thread.
    unsafe impl Send for Module {}
    unsafe impl Sync for Module {}

    impl Module {
        pub(crate) fn open(path: &Path) -> Result<Self, LoadError> {
            let wide: Vec<u16> = path
                .as_os_str()
                .encode_wide()
                .chain(std::iter::once(0))
                .collect();

            let handle =
                unsafe { LoadLibraryW(PCWSTR(wide.as_ptr())) }.map_err(|e| LoadError::Module {
                    path: path.to_path_buf(),
                    reason: e.message(),
                })?;
            Ok(Self(handle))
        }

        pub(crate) fn symbol(&self, name: &'static CStr) -> Option<*const c_void> {
            unsafe { GetProcAddress(self.0, PCSTR(name.as_ptr().cast())) }
                .map(|f| f as usize as *const c_void)
        }
    }

    impl Drop for Module {
        fn drop(&mut self) {
            let _ = unsafe { FreeLibrary(self.0) };
        }
    }
}
