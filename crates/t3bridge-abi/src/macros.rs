//! Helper macros for export generation.
//!
//! Provides the `abi_fn!` macro that generates `#[unsafe(no_mangle)] pub unsafe extern "C" fn`
//! wrappers with a panic boundary.

/// Generate an exported extern "C" function whose body runs under
/// `catch_unwind`.
///
/// # Usage
///
/// ```ignore
/// abi_fn! {
///     /// Doc comment for the function.
///     fn my_export(arg: c_int, buf: *mut c_char) -> c_int {
///         // implementation body
///     }
///     recover => fallback_expression
/// }
/// ```
///
/// A panic in the body is recorded on the trail under the export's name and
/// the `recover` expression is returned instead. The expression may use the
/// arguments; they are all `Copy`.
macro_rules! abi_fn {
    (
        $(#[$meta:meta])*
        fn $name:ident( $($arg:ident : $argty:ty),* $(,)? ) -> $ret:ty
        $body:block
        recover => $fallback:expr
    ) => {
        $(#[$meta])*
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name( $($arg : $argty),* ) -> $ret {
            match ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(|| -> $ret {
                #[allow(unused_unsafe)]
                let rc = unsafe { $body };
                rc
            })) {
                Ok(rc) => rc,
                Err(_) => {
                    $crate::bridge::record_panic(stringify!($name));
                    $fallback
                }
            }
        }
    };
}

pub(crate) use abi_fn;
