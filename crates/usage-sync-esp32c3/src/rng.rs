use esp_hal::rng::Rng;

use rand_core::{Error, RngCore};

/// The hardware random number generator, exposed through [`RngCore`].
#[derive(Clone, Copy)]
pub struct HardwareRng(Rng);

impl HardwareRng {
    /// Creates a [`HardwareRng`].
    #[must_use]
    pub const fn new(rng: Rng) -> Self {
        Self(rng)
    }
}

impl RngCore for HardwareRng {
    fn next_u32(&mut self) -> u32 {
        self.0.random()
    }

    fn next_u64(&mut self) -> u64 {
        u64::from(self.0.random()) << 32 | u64::from(self.0.random())
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.read(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
