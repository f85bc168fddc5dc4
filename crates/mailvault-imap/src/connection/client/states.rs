//! Connection states.
//!
//! `NotAuthenticated` and `Authenticated` are plain markers. `Selected`
//! remembers which mailbox is open and how.

use crate::types::{Mailbox, MailboxStatus, Uid, UidValidity};

/// Before LOGIN/AUTHENTICATE.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotAuthenticated;

/// Logged in, no mailbox open.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

/// A mailbox is open.
#[derive(Debug, Clone)]
pub struct Selected {
    pub(crate) mailbox: Mailbox,
    pub(crate) status: MailboxStatus,
}

impl Selected {
    /// Wire name of the open mailbox.
    #[must_use]
    pub const fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Status reported when the mailbox was opened.
    #[must_use]
    pub const fn status(&self) -> &MailboxStatus {
        &self.status
    }

    /// True when opened with EXAMINE.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.status.read_only
    }

    /// UIDVALIDITY of the open mailbox.
    #[must_use]
    pub const fn uid_validity(&self) -> Option<UidValidity> {
        self.status.uid_validity
    }

    /// UIDNEXT of the open mailbox.
    #[must_use]
    pub const fn uid_next(&self) -> Option<Uid> {
        self.status.uid_next
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Authenticated {}
    impl Sealed for super::Selected {}
}

/// States in which the user is logged in.
///
/// Mailbox-level commands (LIST, CREATE, APPEND, EXAMINE, ...) are valid in
/// both `Authenticated` and `Selected`.
pub trait LoggedIn: sealed::Sealed {}

impl LoggedIn for Authenticated {}
impl LoggedIn for Selected {}
