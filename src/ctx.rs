//! Attach context to errors on their way into `anyhow`.
//!
//! `.map_err(ctx!("reading {path:?}"))` is the short form of
//! `.with_context(|| format!("reading {path:?}"))` that also works
//! where the error type is not yet an `anyhow::Error`.

#[macro_export]
macro_rules! ctx {
    ($fmt:tt) => {
        |e| anyhow::Error::from(e).context(format!($fmt))
    };
    ($fmt:tt, $($arg:tt)*) => {
        |e| anyhow::Error::from(e).context(format!($fmt, $($arg)*))
    };
}
