//! Collaborator seams for checks the engine delegates.
//!
//! Cryptographic signature verification and hardware-device presence are
//! performed by external collaborators; the engine only folds their boolean
//! answers into context-aware scoring.

use async_trait::async_trait;

use trustgate_types::TrustContext;

use crate::Result;

/// Verifies a signature over some payload. Implementations wrap whatever
/// signer infrastructure the deployment uses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    /// Return whether `signature` over `data` verifies under `public_key`.
    async fn verify(
        &self,
        context: &TrustContext,
        data: &[u8],
        signature: &[u8],
        public_key: &str,
    ) -> Result<bool>;
}

/// Reports whether a hardware device is currently present and responsive.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceAttestor: Send + Sync {
    /// Return whether the device identified by `device_id` is present.
    async fn is_present(
        &self,
        context: &TrustContext,
        device_id: &str,
        wallet_type: &str,
    ) -> Result<bool>;
}

/// Collaborator that accepts every signature. For tests and demos only.
pub struct AcceptAllVerifier;

#[async_trait]
impl SignatureVerifier for AcceptAllVerifier {
    async fn verify(
        &self,
        _context: &TrustContext,
        _data: &[u8],
        _signature: &[u8],
        _public_key: &str,
    ) -> Result<bool> {
        Ok(true)
    }
}

/// Collaborator that rejects every signature.
pub struct RejectAllVerifier;

#[async_trait]
impl SignatureVerifier for RejectAllVerifier {
    async fn verify(
        &self,
        _context: &TrustContext,
        _data: &[u8],
        _signature: &[u8],
        _public_key: &str,
    ) -> Result<bool> {
        Ok(false)
    }
}

/// Attestor that reports every device present. For tests and demos only.
pub struct AcceptAllAttestor;

#[async_trait]
impl DeviceAttestor for AcceptAllAttestor {
    async fn is_present(
        &self,
        _context: &TrustContext,
        _device_id: &str,
        _wallet_type: &str,
    ) -> Result<bool> {
        Ok(true)
    }
}

/// Attestor that reports every device absent.
pub struct RejectAllAttestor;

#[async_trait]
impl DeviceAttestor for RejectAllAttestor {
    async fn is_present(
        &self,
        _context: &TrustContext,
        _device_id: &str,
        _wallet_type: &str,
    ) -> Result<bool> {
        Ok(false)
    }
}
