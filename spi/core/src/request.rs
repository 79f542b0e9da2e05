//! Transfer request validation

use crate::{SpiError, SpiResult};

/// Validate a transfer request and return its length in words
///
/// Exactly one of the buffers may be absent (transmit-only or receive-only)
/// but not both, the length must be non-zero, and a full-duplex request must
/// use equally sized buffers.
pub fn validate_request(tx: Option<&[u8]>, rx: Option<&[u8]>) -> SpiResult<usize> {
    let len = match (tx, rx) {
        (None, None) => return Err(SpiError::InvalidParameter),
        (Some(t), None) => t.len(),
        (None, Some(r)) => r.len(),
        (Some(t), Some(r)) => {
            if t.len() != r.len() {
                return Err(SpiError::InvalidParameter);
            }
            t.len()
        }
    };
    if len == 0 {
        return Err(SpiError::InvalidParameter);
    }
    Ok(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_at_least_one_buffer() {
        assert_eq!(validate_request(None, None), Err(SpiError::InvalidParameter));
    }

    #[test]
    fn test_rejects_empty_buffers() {
        let empty: [u8; 0] = [];
        assert_eq!(
            validate_request(Some(&empty), None),
            Err(SpiError::InvalidParameter)
        );
    }

    #[test]
    fn test_rejects_mismatched_lengths() {
        let tx = [0u8; 4];
        let rx = [0u8; 2];
        assert_eq!(
            validate_request(Some(&tx), Some(&rx)),
            Err(SpiError::InvalidParameter)
        );
    }

    #[test]
    fn test_accepts_half_and_full_duplex() {
        let tx = [0u8; 4];
        let rx = [0u8; 4];
        assert_eq!(validate_request(Some(&tx), None), Ok(4));
        assert_eq!(validate_request(None, Some(&rx)), Ok(4));
        assert_eq!(validate_request(Some(&tx), Some(&rx)), Ok(4));
    }
}
