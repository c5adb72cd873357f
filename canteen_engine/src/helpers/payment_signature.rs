use canteen_common::Secret;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentSignatureError {
    #[error("The payment signature is not valid hex")]
    MalformedSignature,
    #[error("The payment signature does not match")]
    Mismatch,
    #[error("The signing key cannot be used. {0}")]
    InvalidKey(String),
}

/// Checks the signature that the payment gateway attaches to a payment callback.
///
/// The signature is `hex(HMAC-SHA256(secret, gateway_order_id + "|" + gateway_payment_id))`. Comparison is done in
/// constant time.
#[derive(Clone)]
pub struct PaymentVerifier {
    secret: Secret<String>,
}

impl PaymentVerifier {
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }

    fn mac(&self, gateway_order_id: &str, gateway_payment_id: &str) -> Result<HmacSha256, PaymentSignatureError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.reveal().as_bytes())
            .map_err(|e| PaymentSignatureError::InvalidKey(e.to_string()))?;
        mac.update(gateway_order_id.as_bytes());
        mac.update(b"|");
        mac.update(gateway_payment_id.as_bytes());
        Ok(mac)
    }

    /// Produces the signature the gateway would send for this pair of references.
    pub fn sign(&self, gateway_order_id: &str, gateway_payment_id: &str) -> Result<String, PaymentSignatureError> {
        let mac = self.mac(gateway_order_id, gateway_payment_id)?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    pub fn verify(
        &self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        signature: &str,
    ) -> Result<(), PaymentSignatureError> {
        let sig_bytes = hex::decode(signature.trim()).map_err(|_| PaymentSignatureError::MalformedSignature)?;
        let mac = self.mac(gateway_order_id, gateway_payment_id)?;
        mac.verify_slice(&sig_bytes).map_err(|_| PaymentSignatureError::Mismatch)
    }
}
