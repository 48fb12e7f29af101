use eventive_core::Email;

/// Identity of whoever invoked an operation.
///
/// Authentication happens outside the engine; the transport layer hands the
/// resolved identity in explicitly. A caller without an email is a guest.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Caller {
    email: Option<Email>,
}

impl Caller {
    pub fn guest() -> Self {
        Self { email: None }
    }

    pub fn user(email: Email) -> Self {
        Self { email: Some(email) }
    }

    pub fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    pub fn is_guest(&self) -> bool {
        self.email.is_none()
    }

    /// True when the caller is authenticated as `owner`.
    pub fn owns(&self, owner: &Email) -> bool {
        self.email.as_ref() == Some(owner)
    }
}
