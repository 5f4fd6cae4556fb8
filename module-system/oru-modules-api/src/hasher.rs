use sha2::Digest;

/// A 32-byte cryptographic hasher.
pub trait Hasher {
    fn new() -> Self;
    fn update(&mut self, data: impl AsRef<[u8]>);
    fn finalize(self) -> [u8; 32];

    /// Convenience for hashing a single buffer.
    fn digest(data: impl AsRef<[u8]>) -> [u8; 32]
    where
        Self: Sized,
    {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

impl Hasher for sha2::Sha256 {
    fn new() -> Self {
        <sha2::Sha256 as Digest>::new()
    }

    fn update(&mut self, data: impl AsRef<[u8]>) {
        Digest::update(self, data);
    }

    fn finalize(self) -> [u8; 32] {
        Digest::finalize(self).into()
    }
}
