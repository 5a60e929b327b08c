use gzqr_core::{GzqrError, GzqrResult};
use gzqr_crypto::Passphrase;
use secrecy::{ExposeSecret, SecretBox};
use zeroize::Zeroizing;

/// Shortest accepted password component, in bytes.
pub const MIN_COMPONENT_LEN: usize = 8;

/// Check every component and join them with a single NUL between each pair.
pub fn join_components(parts: &[Passphrase]) -> GzqrResult<Passphrase> {
    if parts.is_empty() {
        return Err(GzqrError::Secrets("no password components given".into()));
    }
    for (i, part) in parts.iter().enumerate() {
        let len = part.expose_secret().len();
        if len < MIN_COMPONENT_LEN {
            return Err(GzqrError::Secrets(format!(
                "password component {} is {len} bytes, minimum is {MIN_COMPONENT_LEN}",
                i + 1
            )));
        }
    }

    let capacity = parts.iter().map(|p| p.expose_secret().len()).sum::<usize>() + parts.len();
    let mut joined = Zeroizing::new(Vec::with_capacity(capacity));
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            joined.push(0u8);
        }
        joined.extend_from_slice(part.expose_secret());
    }
    Ok(SecretBox::new(Box::new(std::mem::take(&mut *joined))))
}
