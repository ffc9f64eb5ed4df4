// Segment decryption: AES-128-CBC followed by strict PKCS#7 unpadding.

use aes::Aes128;
use cipher::{BlockDecryptMut, KeyIvInit, block_padding::NoPadding};
use tracing::trace;

use crate::hls::HlsError;
use crate::hls::error::CryptoErrorKind;
use crate::hls::key::{IV_LEN, KEY_LEN};

const BLOCK_SIZE: usize = 16;

type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// Where the CBC initialization vector comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IvSource {
    /// IV declared on the key line of the playlist
    Declared([u8; IV_LEN]),
    /// No IV declared: the key bytes are reused as the IV. HLS itself would
    /// use an IV derived from the media sequence number here.
    KeyAsIv,
}

impl From<Option<[u8; IV_LEN]>> for IvSource {
    fn from(iv: Option<[u8; IV_LEN]>) -> Self {
        match iv {
            Some(iv) => IvSource::Declared(iv),
            None => IvSource::KeyAsIv,
        }
    }
}

/// Key material for one download session. Applies to every segment of the
/// media playlist it was resolved from and is never persisted.
#[derive(Clone)]
pub struct DecryptionContext {
    key: [u8; KEY_LEN],
    iv: IvSource,
}

impl std::fmt::Debug for DecryptionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptionContext")
            .field("key", &"<redacted>")
            .field("iv", &self.iv)
            .finish()
    }
}

impl DecryptionContext {
    pub fn new(key: [u8; KEY_LEN], iv: impl Into<IvSource>) -> Self {
        Self {
            key,
            iv: iv.into(),
        }
    }

    pub fn iv_source(&self) -> IvSource {
        self.iv
    }

    pub fn effective_iv(&self) -> [u8; IV_LEN] {
        match self.iv {
            IvSource::Declared(iv) => iv,
            IvSource::KeyAsIv => self.key,
        }
    }

    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, HlsError> {
        let iv = self.effective_iv();
        decrypt_segment(ciphertext, &self.key, Some(&iv))
    }
}

/// Decrypt one segment.
///
/// `iv` of `None` (or an empty slice) selects the key-as-IV fallback.
pub fn decrypt_segment(
    ciphertext: &[u8],
    key: &[u8],
    iv: Option<&[u8]>,
) -> Result<Vec<u8>, HlsError> {
    if key.len() != KEY_LEN {
        return Err(HlsError::Crypto(CryptoErrorKind::KeyLength));
    }
    if ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(HlsError::Crypto(CryptoErrorKind::CiphertextLength));
    }

    let iv = match iv {
        Some(iv) if !iv.is_empty() => iv,
        _ => key,
    };
    if iv.len() != IV_LEN {
        return Err(HlsError::Crypto(CryptoErrorKind::IvLength));
    }

    let mut buffer = ciphertext.to_vec();
    let cipher = Aes128CbcDec::new_from_slices(key, iv)
        .map_err(|e| HlsError::Internal(format!("Failed to initialize AES decryptor: {e}")))?;
    let decrypted_len = cipher
        .decrypt_padded_mut::<NoPadding>(&mut buffer)
        .map_err(|e| HlsError::Internal(format!("Decryption failed: {e}")))?
        .len();
    buffer.truncate(decrypted_len);

    strip_pkcs7(&mut buffer)?;
    trace!(
        ciphertext = ciphertext.len(),
        plaintext = buffer.len(),
        "Decrypted segment"
    );
    Ok(buffer)
}

/// Remove PKCS#7 padding in place. Every padding byte is checked.
pub fn strip_pkcs7(buffer: &mut Vec<u8>) -> Result<(), HlsError> {
    let Some(&last) = buffer.last() else {
        return Err(HlsError::Padding("plaintext is empty".to_string()));
    };
    let pad = last as usize;
    if pad == 0 || pad > BLOCK_SIZE {
        return Err(HlsError::Padding(format!(
            "padding length {pad} outside 1..={BLOCK_SIZE}"
        )));
    }
    if pad > buffer.len() {
        return Err(HlsError::Padding(format!(
            "padding length {pad} exceeds plaintext length {}",
            buffer.len()
        )));
    }
    let start = buffer.len() - pad;
    if buffer[start..].iter().any(|&b| b != last) {
        return Err(HlsError::Padding(format!(
            "trailing {pad} bytes are not all {pad:#04x}"
        )));
    }
    buffer.truncate(start);
    Ok(())
}
