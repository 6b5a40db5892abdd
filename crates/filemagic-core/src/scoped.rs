//! Scoped sessions with guaranteed cleanup

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::error;

use crate::error::{MagicError, Result};
use crate::options::SessionOption;
use crate::session::Magic;

/// Run `f` against a freshly opened session and close it afterwards
///
/// The session is closed on every path. A panic inside `f` does not
/// propagate; it comes back as [`MagicError::Callback`] carrying the panic
/// message. Ordinary failures should be returned from `f`, not panicked.
///
/// ```no_run
/// use filemagic_core::{flags, with_session, SessionOption};
///
/// let mime = with_session([SessionOption::WithFlags(flags::MIME)], |magic| {
///     magic.file("/bin/sh")
/// });
/// ```
pub fn with_session<I, F, T>(options: I, f: F) -> Result<T>
where
    I: IntoIterator<Item = SessionOption>,
    F: FnOnce(&Magic) -> Result<T>,
{
    let magic = Magic::open(options)?;

    // The session lock recovers from poisoning, so observing it after an
    // unwind is sound.
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(&magic)));
    magic.close();

    match outcome {
        Ok(result) => result,
        Err(panic_info) => {
            let message = get_panic_message(&panic_info);
            error!(panic = %message, "session callback panicked");
            Err(MagicError::Callback { message })
        }
    }
}

/// Extract a message from panic info
fn get_panic_message(panic_info: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_extraction() {
        let boxed: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(get_panic_message(&boxed), "static message");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(get_panic_message(&boxed), "owned message");

        let boxed: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(get_panic_message(&boxed), "unknown panic");
    }

    #[test]
    fn test_callback_panic_becomes_error() {
        if crate::capabilities().is_err() {
            return;
        }

        let result: Result<()> = with_session([SessionOption::DisableAutoload], |_| {
            panic!("callback blew up");
        });

        assert_eq!(
            result,
            Err(MagicError::Callback {
                message: "callback blew up".to_string()
            })
        );
    }

    #[test]
    fn test_callback_error_is_returned_unchanged() {
        if crate::capabilities().is_err() {
            return;
        }

        let result: Result<String> =
            with_session([SessionOption::DisableAutoload], |magic| magic.buffer(b"data"));
        assert_eq!(result, Err(MagicError::NotLoaded));
    }
}
