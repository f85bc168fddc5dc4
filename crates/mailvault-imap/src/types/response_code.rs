//! Bracketed response codes.

use super::{Capability, Flag, Uid, UidValidity};

/// Response code carried by a condition response, e.g. `[UIDVALIDITY 7]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// `ALERT`
    Alert,
    /// `CAPABILITY ...`
    Capability(Vec<Capability>),
    /// `PERMANENTFLAGS (...)`
    PermanentFlags(Vec<Flag>),
    /// `READ-ONLY`
    ReadOnly,
    /// `READ-WRITE`
    ReadWrite,
    /// `TRYCREATE`
    TryCreate,
    /// `UIDNEXT n`
    UidNext(Uid),
    /// `UIDVALIDITY n`
    UidValidity(UidValidity),
    /// `APPENDUID validity uid` (RFC 4315)
    AppendUid {
        /// UIDVALIDITY of the target mailbox.
        uid_validity: UidValidity,
        /// UID given to the appended message.
        uid: Uid,
    },
    /// `ALREADYEXISTS` (RFC 5530)
    AlreadyExists,
    /// `NONEXISTENT` (RFC 5530)
    NonExistent,
    /// `AUTHENTICATIONFAILED` (RFC 5530)
    AuthenticationFailed,
    /// Any other code, atom only.
    Unknown(String),
}
