/// Trait for error types that can be built from a plain message string.
///
/// Implement this for a crate's error type, then invoke [`impl_context!`]
/// in the same module to get `.context()` and `.with_context()` on `Result`
/// and `Option` without a `map_err` at every call site.
pub trait FromMessage: Sized {
    fn from_message(message: String) -> Self;
}

/// Generate a crate-local `Context` trait whose `.context()` and
/// `.with_context()` methods convert into the named error type.
///
/// ```ignore
/// // in crates/foo/src/error.rs
/// unfurl_common::impl_context!(FooError);
/// ```
#[macro_export]
macro_rules! impl_context {
    ($error:ty) => {
        pub trait Context<T> {
            fn context(self, context: impl Into<String>) -> std::result::Result<T, $error>;
            fn with_context<C, F>(self, f: F) -> std::result::Result<T, $error>
            where
                C: Into<String>,
                F: FnOnce() -> C;
        }

        impl<T, E: std::fmt::Display> Context<T> for std::result::Result<T, E> {
            fn context(self, context: impl Into<String>) -> std::result::Result<T, $error> {
                let ctx = context.into();
                self.map_err(|source| {
                    <$error as $crate::FromMessage>::from_message(format!("{ctx}: {source}"))
                })
            }

            fn with_context<C, F>(self, f: F) -> std::result::Result<T, $error>
            where
                C: Into<String>,
                F: FnOnce() -> C,
            {
                self.map_err(|source| {
                    let ctx = f().into();
                    <$error as $crate::FromMessage>::from_message(format!("{ctx}: {source}"))
                })
            }
        }

        impl<T> Context<T> for Option<T> {
            fn context(self, context: impl Into<String>) -> std::result::Result<T, $error> {
                self.ok_or_else(|| <$error as $crate::FromMessage>::from_message(context.into()))
            }

            fn with_context<C, F>(self, f: F) -> std::result::Result<T, $error>
            where
                C: Into<String>,
                F: FnOnce() -> C,
            {
                self.ok_or_else(|| <$error as $crate::FromMessage>::from_message(f().into()))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::FromMessage;

    #[derive(Debug, PartialEq)]
    struct ProbeError(String);

    impl std::fmt::Display for ProbeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl FromMessage for ProbeError {
        fn from_message(message: String) -> Self {
            Self(message)
        }
    }

    crate::impl_context!(ProbeError);

    #[test]
    fn result_context_prefixes_the_source() {
        let failed: Result<(), std::io::Error> = Err(std::io::Error::other("disk gone"));
        let err = failed.context("read state").unwrap_err();
        assert_eq!(err, ProbeError("read state: disk gone".to_string()));
    }

    #[test]
    fn with_context_formats_on_demand() {
        let port = 9222;
        let missing: Option<u32> = None;
        let err = missing
            .with_context(|| format!("no listener on port {port}"))
            .unwrap_err();
        assert_eq!(err, ProbeError("no listener on port 9222".to_string()));
    }

    #[test]
    fn ok_values_pass_through_untouched() {
        let fine: Result<u32, std::io::Error> = Ok(7);
        assert_eq!(fine.context("unused").unwrap(), 7);

        assert_eq!(Some("x").context("unused").unwrap(), "x");
    }
}
