use tictac_protocol::authentication;


/// The final state of a session that ran to completion.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OutcomeStatus {
    /// The client's credentials were accepted.
    Pass,
    /// The client's credentials were rejected.
    Fail,
    /// The credential backend failed, and the client was sent an ERROR status.
    Error,
    /// The client aborted the session before a decision was reached.
    Aborted,
}

/// The result of a session, returned for logging/auditing by the host.
#[must_use = "Authentication failure is not reported as an error, so the status field must be checked."]
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct SessionOutcome {
    /// How the session ended.
    pub status: OutcomeStatus,

    /// The user the client authenticated as, which may be empty if the session ended early.
    pub user: Vec<u8>,
}

#[doc(hidden)]
pub struct NonTerminalStatus(pub(super) authentication::Status);

#[doc(hidden)]
impl TryFrom<authentication::Status> for OutcomeStatus {
    type Error = NonTerminalStatus;

    fn try_from(value: authentication::Status) -> Result<Self, NonTerminalStatus> {
        match value {
            authentication::Status::Pass => Ok(OutcomeStatus::Pass),
            authentication::Status::Fail => Ok(OutcomeStatus::Fail),
            authentication::Status::Error => Ok(OutcomeStatus::Error),

            // follow is treated as a failure like a client would
            // (see section 5.4.3 of RFC 8907: https://www.rfc-editor.org/rfc/rfc8907.html#section-5.4.3-3)
            #[allow(deprecated)]
            authentication::Status::Follow => Ok(OutcomeStatus::Fail),

            other => Err(NonTerminalStatus(other)),
        }
    }
}
