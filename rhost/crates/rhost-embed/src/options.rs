//! Option Configuration
//!
//! Startup flags handed to the bootstrap entry point. Locked once the
//! runtime is initialized.

use crate::error::{EmbedError, Result};
use crate::status::StatusRegistry;
use libc::{c_char, c_int};
use parking_lot::RwLock;
use std::ffi::CString;

/// Default startup options: program name, no banner, no workspace save
pub const DEFAULT_OPTIONS: [&str; 3] = ["rhost", "--quiet", "--no-save"];

/// InitOptions - the option vector
#[derive(Debug)]
pub struct InitOptions {
    options: RwLock<Vec<String>>,
}

impl InitOptions {
    pub fn new() -> Self {
        Self::with_options(DEFAULT_OPTIONS.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_options(options: Vec<String>) -> Self {
        Self {
            options: RwLock::new(options),
        }
    }

    /// Current option vector
    pub fn get(&self) -> Vec<String> {
        self.options.read().clone()
    }

    /// Replace the option vector
    ///
    /// # Errors
    /// - `AlreadyInitialized` once `status` reports an initialized runtime
    /// - `InvalidOption` if any element cannot be marshaled
    pub fn set<I, S>(&self, status: &StatusRegistry, options: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if status.is_initialized() {
            return Err(EmbedError::AlreadyInitialized);
        }

        let options: Vec<String> = options.into_iter().map(Into::into).collect();
        validate_options(&options)?;

        *self.options.write() = options;
        Ok(())
    }

    /// Marshal into an `argc`/`argv` pair
    pub fn to_c_args(&self) -> Result<CArgs> {
        CArgs::new(&self.options.read())
    }
}

impl Default for InitOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Check that every option survives the trip to a C string
pub fn validate_options(options: &[String]) -> Result<()> {
    if options.is_empty() {
        return Err(EmbedError::InvalidOption {
            option: String::new(),
            reason: "at least the program name is required".to_string(),
        });
    }

    for option in options {
        if !option.is_ascii() {
            return Err(EmbedError::InvalidOption {
                option: option.clone(),
                reason: "options must be ASCII".to_string(),
            });
        }
        if option.contains('\0') {
            return Err(EmbedError::InvalidOption {
                option: option.clone(),
                reason: "options cannot contain NUL bytes".to_string(),
            });
        }
    }

    Ok(())
}

/// Owned C argument vector
///
/// Keeps the `CString`s alive for as long as `argv` is used. R copies what
/// it needs during bootstrap, so the vector is dropped afterwards.
#[derive(Debug)]
pub struct CArgs {
    strings: Vec<CString>,
    argv: Vec<*mut c_char>,
}

impl CArgs {
    pub fn new(options: &[String]) -> Result<Self> {
        validate_options(options)?;

        let strings = options
            .iter()
            .map(|option| {
                CString::new(option.as_bytes()).map_err(|e| EmbedError::InvalidOption {
                    option: option.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut argv: Vec<*mut c_char> = strings
            .iter()
            .map(|s| s.as_ptr() as *mut c_char)
            .collect();
        argv.push(std::ptr::null_mut());

        Ok(Self { strings, argv })
    }

    pub fn argc(&self) -> c_int {
        self.strings.len() as c_int
    }

    /// NULL-terminated argument vector
    pub fn argv(&mut self) -> *mut *mut c_char {
        self.argv.as_mut_ptr()
    }

    pub fn strings(&self) -> &[CString] {
        &self.strings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = InitOptions::new();
        assert_eq!(options.get(), vec!["rhost", "--quiet", "--no-save"]);
    }

    #[test]
    fn test_set_before_init() {
        let status = StatusRegistry::new();
        let options = InitOptions::new();
        options
            .set(&status, ["prog", "--vanilla"])
            .expect("options are mutable before init");
        assert_eq!(options.get(), vec!["prog", "--vanilla"]);
    }

    #[test]
    fn test_set_after_init_fails() {
        let status = StatusRegistry::new();
        status.mark_initialized();
        let options = InitOptions::new();
        let result = options.set(&status, ["prog"]);
        assert!(matches!(result, Err(EmbedError::AlreadyInitialized)));
        assert_eq!(options.get()[0], "rhost");
    }

    #[test]
    fn test_invalid_options_rejected() {
        let status = StatusRegistry::new();
        let options = InitOptions::new();
        assert!(options.set(&status, ["prog", "bad\0arg"]).is_err());
        assert!(options.set(&status, ["prog", "caf\u{e9}"]).is_err());
        assert!(options.set(&status, Vec::<String>::new()).is_err());
        assert_eq!(options.get().len(), 3, "failed set leaves options intact");
    }

    #[test]
    fn test_c_args_layout() {
        let options = InitOptions::new();
        let mut args = options.to_c_args().unwrap();
        assert_eq!(args.argc(), 3);
        assert_eq!(args.strings()[1].to_str().unwrap(), "--quiet");

        let argv = args.argv();
        unsafe {
            assert!(!(*argv).is_null());
            assert!((*argv.add(3)).is_null());
        }
    }
}
