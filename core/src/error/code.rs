/// Numeric error codes, one per error kind. The CLI uses them as exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    Success = 0,
    GeneralError = 1,
    ConfigurationError = 11,
    PhaseMismatch = 12,
    ValidationError = 13,
    StorageError = 20,
    StoreNotFound = 21,
    StoreExists = 22,
    UnsupportedCapability = 23,
    DomainError = 40,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Process exit code for this error kind.
    pub fn exit_code(self) -> i32 {
        i32::from(self.as_u16())
    }
}
