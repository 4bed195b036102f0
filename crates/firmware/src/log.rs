//! Logging front-end.
//!
//! Forwards to `defmt` on hardware builds and to `tracing` on host builds.
//! With neither backend enabled the arguments are still type-checked but
//! nothing is emitted. Format strings use plain `{}` placeholders so they are
//! valid for every backend.

macro_rules! info {
    ( $($arg:tt)+ ) => {{
        #[cfg(feature = "defmt")]
        defmt::info!($($arg)+);
        #[cfg(all(feature = "tracing", not(feature = "defmt")))]
        tracing::info!($($arg)+);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        $crate::log::discard(core::format_args!($($arg)+));
    }};
}

macro_rules! debug {
    ( $($arg:tt)+ ) => {{
        #[cfg(feature = "defmt")]
        defmt::debug!($($arg)+);
        #[cfg(all(feature = "tracing", not(feature = "defmt")))]
        tracing::debug!($($arg)+);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        $crate::log::discard(core::format_args!($($arg)+));
    }};
}

macro_rules! error {
    ( $($arg:tt)+ ) => {{
        #[cfg(feature = "defmt")]
        defmt::error!($($arg)+);
        #[cfg(all(feature = "tracing", not(feature = "defmt")))]
        tracing::error!($($arg)+);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        $crate::log::discard(core::format_args!($($arg)+));
    }};
}

/// Sink for log arguments when no backend is enabled.
#[inline(always)]
#[allow(dead_code)] // unused when a backend is enabled
pub(crate) fn discard(_args: core::fmt::Arguments<'_>) {}

pub(crate) use debug;
pub(crate) use error;
pub(crate) use info;
