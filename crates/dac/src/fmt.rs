//! Logging shim.
//!
//! Routes `debug!`/`warn!` to defmt on target builds and to tracing on
//! hosted builds. With neither feature the arguments are still evaluated
//! by reference so call sites do not trip unused-variable lints.
#![macro_use]
#![allow(unused_macros)]

macro_rules! debug {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "defmt")]
            ::defmt::debug!($s $(, $x)*);
            #[cfg(all(feature = "tracing", not(feature = "defmt")))]
            ::tracing::debug!($s $(, $x)*);
            #[cfg(not(any(feature = "defmt", feature = "tracing")))]
            let _ = ($( & $x ),*);
        }
    };
}

macro_rules! warn {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "defmt")]
            ::defmt::warn!($s $(, $x)*);
            #[cfg(all(feature = "tracing", not(feature = "defmt")))]
            ::tracing::warn!($s $(, $x)*);
            #[cfg(not(any(feature = "defmt", feature = "tracing")))]
            let _ = ($( & $x ),*);
        }
    };
}
