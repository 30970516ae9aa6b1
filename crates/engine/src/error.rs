use switchboard_proto::SessionId;
use thiserror::Error;

/// Errors rejected at menu registration time.
///
/// Registration failures are never fatal: the menu is simply not added and
/// the error is logged at the call site.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
	/// Another menu with the same parent already uses this id.
	#[error("menu id {0} already registered under the same parent")]
	DuplicateId(i64),
	/// Ids 0 and 1 belong to the built-in aggregate views.
	#[error("menu id {0} is reserved for built-in views")]
	ReservedId(i64),
	/// Menu names must be non-empty.
	#[error("menu name cannot be empty")]
	EmptyName,
	/// Another menu already uses this name.
	#[error("duplicate menu name '{0}'")]
	DuplicateName(String),
	/// The declared parent menu type has not been registered.
	#[error("menu '{0}' references an unregistered parent menu")]
	UnknownParent(String),
}

/// Errors surfaced by the per-session menu load path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
	/// The session is not connected.
	#[error("session {0:?} is not connected")]
	UnknownSession(SessionId),
	/// The requested menu is no longer registered.
	#[error("menu is no longer registered")]
	UnknownMenu,
	/// The session failed the menu's access check.
	#[error("access denied to menu '{0}'")]
	AccessDenied(String),
}

/// Errors from the legacy single-list compatibility surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompatError {
	/// The producer was locked out after repeated name collisions.
	#[error("producer '{0}' is locked out of compatibility registration")]
	ProducerLocked(String),
	/// Both the declared name and the producer's own name are taken.
	#[error("no usable menu name for producer '{0}'")]
	NameExhausted(String),
	/// Registration of the synthetic menu failed.
	#[error(transparent)]
	Registry(#[from] RegistryError),
}

/// Failure raised by a control handler.
///
/// Caught at the dispatch boundary; the message may be shown to the client
/// subject to the configured error-visibility flags.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
	/// Convenience constructor from anything displayable.
	pub fn new(msg: impl std::fmt::Display) -> Self {
		Self(msg.to_string())
	}
}

/// The transport sink rejected a send because the peer is gone.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("session sink closed")]
pub struct SinkClosed;
