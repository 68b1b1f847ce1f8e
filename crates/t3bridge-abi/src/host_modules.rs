//! Platform [`ModuleSource`]: the modules already mapped into this process.
//!
//! Every open here is "no load": a module that is not already resident is
//! reported as [`ModuleError::NotLoaded`] rather than pulled in from disk. The
//! module that supplies the winning target is pinned for the rest of the
//! process so the cached function pointers can never dangle.
//!
//! A symbol lookup on a Unix handle searches more than the object itself:
//! `dlopen(NULL)` covers every global library, and a named handle covers its
//! dependencies. Where the slot's object base is known, hits that the loader
//! attributes to a different object are rejected.

use std::sync::Arc;

use parking_lot::Mutex;
use t3bridge_core::candidates::SymbolCandidate;
use t3bridge_core::config::BridgeConfig;
use t3bridge_core::resolver::{ModuleError, ModuleProbe, ModuleSource, ProbeOutcome};
use t3bridge_core::target::{BridgeFn, DirectFn, PanelFn};
use t3bridge_core::{ModuleSlot, Shape, TargetFn};

#[cfg(unix)]
use libloading::os::unix::Library;
#[cfg(windows)]
use libloading::os::windows::Library;

/// Verdict attached to hits that point back into this shim.
pub const SELF_REFERENCE: &str = "self-reference";
/// Verdict attached to hits that live in another object than the slot's.
pub const OUTSIDE_MODULE: &str = "outside module";

pub struct HostModules {
    controls_module: String,
    #[cfg_attr(unix, allow(dead_code))]
    self_module: String,
    own_entries: Arc<[usize]>,
    pinned: Arc<Mutex<Vec<Library>>>,
}

impl HostModules {
    /// `own_entries` are the addresses of this shim's exports; any probe that
    /// lands on one of them is rejected.
    #[must_use]
    pub fn new(config: &BridgeConfig, own_entries: &[usize]) -> Self {
        Self {
            controls_module: config.controls_module.clone(),
            self_module: config.self_module.clone(),
            own_entries: own_entries.into(),
            pinned: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Modules kept mapped because they supplied a target.
    #[must_use]
    pub fn pinned_count(&self) -> usize {
        self.pinned.lock().len()
    }

    #[cfg(unix)]
    fn open_slot(&self, slot: ModuleSlot) -> Result<OpenedSlot, ModuleError> {
        match slot {
            ModuleSlot::Main => Ok(OpenedSlot {
                library: Library::this(),
                label: main_label(),
                object_base: unix_objects::main_program_base(),
            }),
            ModuleSlot::Controls => open_resident(&self.controls_module).map(|library| OpenedSlot {
                library,
                label: self.controls_module.clone(),
                object_base: None,
            }),
            ModuleSlot::Hosting => {
                let (path, base) = unix_objects::hosting_object()?;
                let label = path.display().to_string();
                open_resident(&path)
                    .map(|library| OpenedSlot {
                        library,
                        label: label.clone(),
                        object_base: Some(base),
                    })
                    .map_err(|_| ModuleError::Open {
                        module: label,
                        reason: "hosting module is not registered with the loader".to_string(),
                    })
            }
        }
    }

    // Module handles here already cover exactly one image.
    #[cfg(windows)]
    fn open_slot(&self, slot: ModuleSlot) -> Result<OpenedSlot, ModuleError> {
        let (library, label) = match slot {
            ModuleSlot::Main => Library::this()
                .map(|lib| (lib, main_label()))
                .map_err(|e| ModuleError::Open {
                    module: main_label(),
                    reason: e.to_string(),
                })?,
            ModuleSlot::Controls => {
                (open_resident(&self.controls_module)?, self.controls_module.clone())
            }
            ModuleSlot::Hosting => (open_resident(&self.self_module)?, self.self_module.clone()),
        };
        Ok(OpenedSlot {
            library,
            label,
            object_base: None,
        })
    }
}

struct OpenedSlot {
    library: Library,
    label: String,
    /// Load address of the object this slot stands for, when known.
    object_base: Option<usize>,
}

impl ModuleSource for HostModules {
    fn open(&self, slot: ModuleSlot) -> Result<Box<dyn ModuleProbe>, ModuleError> {
        let OpenedSlot {
            library,
            label,
            object_base,
        } = self.open_slot(slot)?;
        Ok(Box::new(HostModule {
            library,
            label,
            object_base,
            own_entries: Arc::clone(&self.own_entries),
            pinned: Arc::clone(&self.pinned),
        }))
    }
}

fn main_label() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "<main program>".to_string())
}

#[cfg(unix)]
fn open_resident(name: impl AsRef<std::ffi::OsStr>) -> Result<Library, ModuleError> {
    let name = name.as_ref();
    // SAFETY: RTLD_NOLOAD never maps new code, so no initializers run.
    unsafe { Library::open(Some(name), libc::RTLD_LAZY | libc::RTLD_NOLOAD) }.map_err(|_| {
        ModuleError::NotLoaded {
            module: name.to_string_lossy().into_owned(),
        }
    })
}

#[cfg(windows)]
fn open_resident(name: &str) -> Result<Library, ModuleError> {
    // Takes a reference on a module that is already mapped; never loads one.
    Library::open_already_loaded(name).map_err(|_| ModuleError::NotLoaded {
        module: name.to_string(),
    })
}

#[cfg(unix)]
mod unix_objects {
    use std::ffi::{CStr, OsStr, c_void};
    use std::mem::MaybeUninit;
    use std::os::unix::ffi::OsStrExt;
    use std::path::PathBuf;

    use t3bridge_core::resolver::ModuleError;

    fn lookup(addr: *const c_void) -> Option<libc::Dl_info> {
        let mut info = MaybeUninit::<libc::Dl_info>::zeroed();
        // SAFETY: dladdr only inspects `addr` and fills `info`.
        let rc = unsafe { libc::dladdr(addr, info.as_mut_ptr()) };
        // SAFETY: dladdr returned non-zero, so `info` is populated.
        (rc != 0).then(|| unsafe { info.assume_init() })
    }

    /// Load address of the object containing `addr`.
    pub(super) fn base_of(addr: *const c_void) -> Option<usize> {
        lookup(addr)
            .map(|info| info.dli_fbase as usize)
            .filter(|base| *base != 0)
    }

    /// The executable's program headers sit inside its first loaded segment.
    #[cfg(any(target_os = "linux", target_os = "android"))]
    pub(super) fn main_program_base() -> Option<usize> {
        // SAFETY: getauxval has no preconditions.
        let phdr = unsafe { libc::getauxval(libc::AT_PHDR) } as usize;
        if phdr == 0 {
            return None;
        }
        base_of(phdr as *const c_void)
    }

    /// Image 0 is always the main executable.
    #[cfg(target_vendor = "apple")]
    pub(super) fn main_program_base() -> Option<usize> {
        // SAFETY: index 0 exists for the whole life of the process.
        let header = unsafe { libc::_dyld_get_image_header(0) } as usize;
        (header != 0).then_some(header)
    }

    #[cfg(not(any(target_os = "linux", target_os = "android", target_vendor = "apple")))]
    pub(super) fn main_program_base() -> Option<usize> {
        None
    }

    /// File and load address of the object holding this shim's code.
    pub(super) fn hosting_object() -> Result<(PathBuf, usize), ModuleError> {
        let anchor = hosting_object as *const c_void;
        let info = lookup(anchor).ok_or_else(|| {
            ModuleError::Unlocatable("dladdr found no object for the bridge code".to_string())
        })?;
        if info.dli_fname.is_null() {
            return Err(ModuleError::Unlocatable(
                "dladdr returned no file name".to_string(),
            ));
        }
        // SAFETY: dli_fname is a NUL-terminated string owned by the loader.
        let name = unsafe { CStr::from_ptr(info.dli_fname) };
        let path = PathBuf::from(OsStr::from_bytes(name.to_bytes()));
        Ok((path, info.dli_fbase as usize))
    }
}

/// One opened module.
struct HostModule {
    library: Library,
    label: String,
    object_base: Option<usize>,
    own_entries: Arc<[usize]>,
    pinned: Arc<Mutex<Vec<Library>>>,
}

impl HostModule {
    fn address_of(&self, name: &str) -> Option<*const ()> {
        // SAFETY: the symbol value is only read as an address here; callers
        // decide which signature it carries.
        let symbol = unsafe { self.library.get::<*const ()>(name.as_bytes()) }.ok()?;
        let addr = *symbol;
        (!addr.is_null()).then_some(addr)
    }

    fn is_own_entry(&self, addr: *const ()) -> bool {
        self.own_entries.contains(&(addr as usize))
    }

    #[cfg_attr(windows, allow(unused_variables))]
    fn is_inside(&self, addr: *const ()) -> bool {
        match self.object_base {
            None => true,
            #[cfg(unix)]
            Some(base) => unix_objects::base_of(addr.cast()) == Some(base),
            #[cfg(windows)]
            Some(_) => true,
        }
    }
}

impl ModuleProbe for HostModule {
    fn label(&self) -> &str {
        &self.label
    }

    fn entry(&self, candidate: &SymbolCandidate) -> ProbeOutcome<TargetFn> {
        let Some(addr) = self.address_of(candidate.name) else {
            return ProbeOutcome::Miss;
        };
        if self.is_own_entry(addr) {
            return ProbeOutcome::Rejected(SELF_REFERENCE);
        }
        if !self.is_inside(addr) {
            return ProbeOutcome::Rejected(OUTSIDE_MODULE);
        }
        // SAFETY: each candidate name is published by the host with the
        // calling convention the candidate table declares for it.
        let entry = unsafe {
            match candidate.shape {
                Shape::Bridge => TargetFn::Bridge(std::mem::transmute::<*const (), BridgeFn>(addr)),
                Shape::Direct => TargetFn::Direct(std::mem::transmute::<*const (), DirectFn>(addr)),
            }
        };
        ProbeOutcome::Hit(entry)
    }

    fn panel_export(&self, name: &str) -> Option<PanelFn> {
        let addr = self.address_of(name)?;
        if self.is_own_entry(addr) || !self.is_inside(addr) {
            return None;
        }
        // SAFETY: panel exports share the (panel_id, buffer, size) signature.
        Some(unsafe { std::mem::transmute::<*const (), PanelFn>(addr) })
    }

    fn retain(self: Box<Self>) {
        let HostModule {
            library, pinned, ..
        } = *self;
        pinned.lock().push(library);
    }
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    fn modules() -> HostModules {
        HostModules::new(&BridgeConfig::default(), &[])
    }

    #[test]
    fn main_program_is_always_resident() {
        let module = modules().open(ModuleSlot::Main).unwrap();
        assert!(!module.label().is_empty());
        let probe = module.entry(&SymbolCandidate::direct("HandleWebViewMsg"));
        assert!(matches!(probe, ProbeOutcome::Miss));
    }

    #[test]
    fn main_slot_ignores_symbols_of_other_libraries() {
        // The main handle can see libc's getpid, but libc is not the program.
        let module = modules().open(ModuleSlot::Main).unwrap();
        let probe = module.entry(&SymbolCandidate::direct("getpid"));
        assert!(matches!(probe, ProbeOutcome::Rejected(OUTSIDE_MODULE)));
        assert!(module.panel_export("getpid").is_none());
    }

    #[test]
    fn main_program_base_is_known() {
        let base = unix_objects::main_program_base().unwrap();
        let own_code = main_program_base_is_known as *const std::ffi::c_void;
        assert_eq!(unix_objects::base_of(own_code), Some(base));
    }

    #[test]
    fn absent_controls_module_reports_not_loaded() {
        let config = BridgeConfig {
            controls_module: "libt3bridge-definitely-absent.so".to_string(),
            ..BridgeConfig::default()
        };
        let err = HostModules::new(&config, &[])
            .open(ModuleSlot::Controls)
            .err()
            .unwrap();
        assert!(matches!(err, ModuleError::NotLoaded { .. }));
    }

    #[test]
    fn resident_library_symbol_resolves_through_controls_slot() {
        // libc is mapped into every test process; use it as a stand-in
        // controls module and look up a symbol it is known to export.
        let config = BridgeConfig {
            controls_module: "libc.so.6".to_string(),
            ..BridgeConfig::default()
        };
        let modules = HostModules::new(&config, &[]);
        let module = modules.open(ModuleSlot::Controls).unwrap();
        assert_eq!(module.label(), "libc.so.6");
        let probe = module.entry(&SymbolCandidate::direct("getpid"));
        assert!(matches!(probe, ProbeOutcome::Hit(TargetFn::Direct(_))));
    }

    #[test]
    fn own_export_address_is_rejected() {
        let config = BridgeConfig {
            controls_module: "libc.so.6".to_string(),
            ..BridgeConfig::default()
        };
        let candidate = SymbolCandidate::direct("getpid");
        let first = HostModules::new(&config, &[]).open(ModuleSlot::Controls).unwrap();
        let ProbeOutcome::Hit(entry) = first.entry(&candidate) else {
            panic!("getpid not found in libc");
        };

        // Pretend that address is one of ours.
        let guarded = HostModules::new(&config, &[entry.addr()]);
        let module = guarded.open(ModuleSlot::Controls).unwrap();
        assert!(matches!(
            module.entry(&candidate),
            ProbeOutcome::Rejected(SELF_REFERENCE)
        ));
    }

    #[test]
    fn retained_module_is_pinned() {
        let modules = modules();
        let module = modules.open(ModuleSlot::Main).unwrap();
        assert_eq!(modules.pinned_count(), 0);
        module.retain();
        assert_eq!(modules.pinned_count(), 1);
    }
}
