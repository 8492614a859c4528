//! Deterministic input data for round-trip runs.

/// Patient monitor samples from the device self-test.
pub const PATIENT_DATA: [u8; 256] = [
    238, 239, 239, 239, 240, 240, 240, 240, 240, 240, 240, 240, 240, 239, 238, 238,
    238, 238, 238, 238, 237, 237, 236, 235, 234, 233, 232, 232, 231, 231, 230, 230,
    230, 231, 231, 232, 233, 233, 234, 234, 234, 235, 235, 235, 236, 237, 238, 238,
    239, 240, 241, 242, 243, 243, 244, 244, 244, 244, 244, 244, 244, 243, 243, 244,
    244, 244, 244, 244, 244, 244, 244, 244, 245, 245, 245, 246, 246, 246, 247, 247,
    247, 248, 248, 248, 248, 248, 248, 247, 247, 247, 248, 248, 249, 249, 249, 249,
    249, 249, 249, 248, 248, 248, 248, 248, 248, 248, 248, 248, 249, 249, 249, 249,
    248, 248, 247, 247, 248, 248, 248, 248, 248, 248, 249, 249, 249, 249, 249, 248,
    248, 247, 246, 247, 247, 248, 249, 249, 250, 251, 251, 251, 250, 249, 249, 248,
    247, 246, 246, 245, 244, 244, 244, 244, 244, 244, 245, 246, 246, 246, 247, 246,
    246, 246, 245, 245, 246, 246, 246, 246, 246, 246, 246, 246, 247, 248, 248, 248,
    248, 248, 248, 249, 249, 250, 251, 250, 250, 249, 248, 246, 246, 246, 245, 246,
    246, 245, 244, 243, 243, 241, 240, 239, 237, 236, 235, 234, 234, 233, 233, 234,
    234, 234, 234, 234, 234, 234, 234, 234, 234, 234, 234, 234, 234, 233, 233, 233,
    233, 234, 234, 234, 235, 235, 235, 235, 235, 236, 236, 236, 236, 236, 236, 236,
    236, 236, 237, 237, 238, 238, 238, 237, 237, 236, 235, 235, 235, 235, 235, 236,
];

/// Build a fixture of `size` bytes from [`PATIENT_DATA`].
///
/// Sizes beyond the captured samples repeat them from the start.
pub fn patient_fixture(size: usize) -> Vec<u8> {
    PATIENT_DATA.iter().copied().cycle().take(size).collect()
}

/// Produces the input for one ladder step.
pub trait FixtureSource {
    /// Fixture bytes for a run of `size` bytes.
    fn fixture(&self, size: usize) -> Vec<u8>;
}

/// [`FixtureSource`] backed by [`PATIENT_DATA`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PatientData;

impl FixtureSource for PatientData {
    fn fixture(&self, size: usize) -> Vec<u8> {
        patient_fixture(size)
    }
}

impl<F: Fn(usize) -> Vec<u8>> FixtureSource for F {
    fn fixture(&self, size: usize) -> Vec<u8> {
        self(size)
    }
}
