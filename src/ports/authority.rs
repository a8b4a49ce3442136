//! Remote ID authority port.

use crate::error::AuthorityError;

/// The cluster service that confirms or assigns identifiers.
///
/// Abstracting the authority keeps the generator independent of the HTTP
/// client and lets tests substitute in-memory or replayed authorities.
pub trait IdAuthority: Send + Sync {
    /// Confirms `candidate` if it is free, or suggests a free identifier when
    /// no candidate is given.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::AlreadyExists`] when the candidate is taken,
    /// and other variants for transport or protocol failures.
    fn reserve_or_suggest(&self, candidate: Option<u32>) -> Result<u32, AuthorityError>;
}

impl<T: IdAuthority + ?Sized> IdAuthority for std::sync::Arc<T> {
    fn reserve_or_suggest(&self, candidate: Option<u32>) -> Result<u32, AuthorityError> {
        (**self).reserve_or_suggest(candidate)
    }
}

impl<T: IdAuthority + ?Sized> IdAuthority for Box<T> {
    fn reserve_or_suggest(&self, candidate: Option<u32>) -> Result<u32, AuthorityError> {
        (**self).reserve_or_suggest(candidate)
    }
}
