/// Failure of a single `giveio` request.
///
/// An unsupported CPU architecture is not represented here: it fails the
/// build in [`crate::layout`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GiveIoError {
    #[error("the caller does not hold {privilege}")]
    PrivilegeNotHeld { privilege: &'static str },
}
