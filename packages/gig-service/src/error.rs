use std::fmt;

use gig_domain::validate::FieldErrors;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Could not find {kind} {id}.")]
	NotFound { kind: EntityKind, id: i64 },
	#[error("Could not delete venue {id} because it has one or more events.")]
	VenueHasEvents { id: i64 },
	#[error("Validation failed.")]
	Validation(FieldErrors),
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<gig_storage::Error> for Error {
	fn from(err: gig_storage::Error) -> Self {
		match err {
			gig_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			gig_storage::Error::InvalidArgument(message) => Self::Storage { message },
		}
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntityKind {
	Event,
	Venue,
}
impl fmt::Display for EntityKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Event => f.write_str("event"),
			Self::Venue => f.write_str("venue"),
		}
	}
}
