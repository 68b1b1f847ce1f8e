//! Calling a built bridge library through its exports, the way a host does.
//!
//! Used by tooling that loads the shim by path and wants a safe surface over
//! the raw `T3Bridge_*` symbols.

use std::ffi::{c_char, c_int};
use std::path::{Path, PathBuf};

use libloading::Library;
use t3bridge_core::target::PanelExport;
use thiserror::Error;

type StatusFn = unsafe extern "C" fn() -> c_int;
type BufferFn = unsafe extern "C" fn(c_int, *mut c_char, c_int) -> c_int;
type ReportFn = unsafe extern "C" fn(*mut c_char, c_int) -> c_int;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to load {}: {source}", path.display())]
    Load {
        path: PathBuf,
        source: libloading::Error,
    },
    #[error("{name} is not exported by {}: {source}", path.display())]
    MissingExport {
        name: &'static str,
        path: PathBuf,
        source: libloading::Error,
    },
}

/// A loaded bridge library.
pub struct ShimLibrary {
    library: Library,
    path: PathBuf,
}

impl ShimLibrary {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref().to_path_buf();
        // SAFETY: the bridge's own initializers only touch process-local
        // state; loading it has no effect beyond mapping its code.
        let library = unsafe { Library::new(&path) }.map_err(|source| ClientError::Load {
            path: path.clone(),
            source,
        })?;
        Ok(Self { library, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn export<T: Copy>(&self, name: &'static str) -> Result<T, ClientError> {
        // SAFETY: every caller names a T3Bridge_* export together with its
        // declared signature.
        let symbol = unsafe { self.library.get::<T>(name.as_bytes()) }.map_err(|source| {
            ClientError::MissingExport {
                name,
                path: self.path.clone(),
                source,
            }
        })?;
        Ok(*symbol)
    }

    fn status(&self, name: &'static str) -> Result<i32, ClientError> {
        let f = self.export::<StatusFn>(name)?;
        // SAFETY: no arguments; the library stays loaded for the call.
        Ok(unsafe { f() })
    }

    pub fn initialize(&self) -> Result<i32, ClientError> {
        self.status("T3Bridge_Initialize")
    }

    pub fn force_resolve(&self) -> Result<i32, ClientError> {
        self.status("T3Bridge_ForceResolveAndReport")
    }

    pub fn is_available(&self) -> Result<i32, ClientError> {
        self.status("T3Bridge_IsTargetAvailable")
    }

    /// `T3Bridge_HandleWebViewMsg` over `buffer`, which is both the request
    /// and the reply.
    pub fn invoke(&self, action: i32, buffer: &mut [u8]) -> Result<i32, ClientError> {
        let f = self.export::<BufferFn>("T3Bridge_HandleWebViewMsg")?;
        // SAFETY: pointer and capacity describe `buffer` exactly.
        Ok(unsafe { f(action, buffer.as_mut_ptr().cast(), capacity_of(buffer)) })
    }

    pub fn panel(
        &self,
        export: PanelExport,
        panel_id: i32,
        buffer: &mut [u8],
    ) -> Result<i32, ClientError> {
        let f = self.export::<BufferFn>(export.entry_name())?;
        // SAFETY: as for `invoke`.
        Ok(unsafe { f(panel_id, buffer.as_mut_ptr().cast(), capacity_of(buffer)) })
    }

    pub fn report(&self, buffer: &mut [u8]) -> Result<i32, ClientError> {
        let f = self.export::<ReportFn>("T3Bridge_ResolutionReport")?;
        // SAFETY: as for `invoke`.
        Ok(unsafe { f(buffer.as_mut_ptr().cast(), capacity_of(buffer)) })
    }
}

fn capacity_of(buffer: &[u8]) -> c_int {
    c_int::try_from(buffer.len()).unwrap_or(c_int::MAX)
}
