//! Operation boundary events
//!
//! Each operation emits one `start` event and then exactly one `end` or
//! `end_error` event. The macros expand to blocks, so they are usable both
//! as statements and as match arms, and they reach `tracing` and the schema
//! constants through this crate.

#[doc(hidden)]
#[macro_export]
macro_rules! __log_op_event {
    ($level:ident, $op:expr, $event:ident $(, $($field:tt)*)?) => {{
        $crate::__private::tracing::$level!(
            component = module_path!(),
            op = $op,
            event = $crate::__private::schema::$event,
            $($($field)*)?
        );
    }};
}

/// `start` event for `op`, plus any extra tracing fields
///
/// ```
/// # use knowlex_core::log_op_start;
/// log_op_start!("package", artifact.id = "spec");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(info, $op, EVENT_START $(, $($field)*)?)
    };
}

/// `end` event for `op`
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(
            info,
            $op,
            EVENT_END,
            duration_ms = $duration
            $(, $($field)*)?
        )
    };
}

/// `end_error` event for `op`, tagged with the error's kind and code
///
/// `err` is anything convertible into `ExError`.
///
/// ```
/// # use knowlex_core::{log_op_error, errors::KnowlexError};
/// log_op_error!("release", KnowlexError::MissingVersionBehavior, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__log_op_event!(
            error,
            $op,
            EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code()
            $(, $($field)*)?
        )
    }};
}
