use crate::registry::ResolvedId;
use crate::uri::ShellUri;

/// Recoverable failures of the resolve/register/connect machinery.
///
/// Only the two resolution variants are expected to reach an end user, as
/// "could not open X". The consistency variants indicate an integration
/// defect; callers are not expected to branch on them. Programming-contract
/// violations (re-entrant change blocks, a second `setup`, drag-bag access
/// outside a drag) panic instead of appearing here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    /// No module-item resolver registered for the URI's `(module, item)`.
    NoItemResolver { uri: ShellUri },
    /// No placement resolver produced a connector for the resolved object.
    NoPlacementResolver { uri: ShellUri },
    /// Every id in the bounded resolved-id space is in use.
    IdSpaceExhausted { capacity: usize },
    /// The object is already held by the registry.
    DuplicateObject,
    /// No live resolved object carries this id.
    UnknownId(ResolvedId),
    /// The object was never added to the registry.
    NotRegistered,
    /// The object has no owning connector in the disconnect table.
    NotConnected,
    /// The connector derives its order; user-driven moves are rejected.
    MoveUnsupported,
}

impl std::fmt::Display for ShellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShellError::NoItemResolver { uri } => {
                write!(
                    f,
                    "no module-item resolver registered for {}/{} (while opening {uri})",
                    uri.module(),
                    uri.item()
                )
            }
            ShellError::NoPlacementResolver { uri } => {
                write!(
                    f,
                    "no placement resolver accepted placement {:?} (while opening {uri})",
                    uri.placement()
                )
            }
            ShellError::IdSpaceExhausted { capacity } => {
                write!(f, "resolved id space exhausted ({capacity} ids in use)")
            }
            ShellError::DuplicateObject => {
                write!(f, "object is already registered as resolved")
            }
            ShellError::UnknownId(id) => {
                write!(f, "no resolved object holds id {id}")
            }
            ShellError::NotRegistered => {
                write!(f, "object is not registered as resolved")
            }
            ShellError::NotConnected => {
                write!(f, "object has no owning placement connector")
            }
            ShellError::MoveUnsupported => {
                write!(f, "connector derives its own order; moving items is unsupported")
            }
        }
    }
}

impl std::error::Error for ShellError {}
