//! Load-time resolution, for hosts that cannot call `T3Bridge_Initialize`.
//!
//! Runs inside the loader, so it only does what `T3Bridge_Initialize` does and
//! swallows any panic. ELF and Mach-O only: a Windows CRT initializer runs
//! under the loader lock, where building the bridge (module queries, file
//! I/O) is not allowed. Windows hosts call `T3Bridge_Initialize` instead.

extern "C" fn resolve_at_load() {
    let _ = std::panic::catch_unwind(|| crate::bridge::host_bridge().initialize());
}

#[used]
#[cfg_attr(
    any(target_os = "linux", target_os = "android", target_os = "freebsd"),
    unsafe(link_section = ".init_array")
)]
#[cfg_attr(target_vendor = "apple", unsafe(link_section = "__DATA,__mod_init_func"))]
static RESOLVE_AT_LOAD: extern "C" fn() = resolve_at_load;

#[cfg(test)]
mod tests {
    use t3bridge_core::ResolutionState;

    use crate::bridge::host_bridge;

    #[test]
    fn constructor_resolves_before_first_call() {
        let bridge = host_bridge();
        assert_ne!(bridge.cell().state(), ResolutionState::NotAttempted);
        assert!(bridge.cell().passes() >= 1);
    }
}
