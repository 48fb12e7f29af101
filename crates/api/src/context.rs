use eventive_booking::Caller;

/// Caller identity for a request.
///
/// Always present on API routes; a request without an identity header
/// carries a guest caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallerContext {
    caller: Caller,
}

impl CallerContext {
    pub fn new(caller: Caller) -> Self {
        Self { caller }
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }

    pub fn into_caller(self) -> Caller {
        self.caller
    }
}
