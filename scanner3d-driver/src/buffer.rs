use scanner3d_data::ScanSample;

/// Samples produced since the last drain.
#[derive(Debug, Default)]
pub struct ScanPointBuffer {
    samples: Vec<ScanSample>,
}

impl ScanPointBuffer {
    pub fn new() -> ScanPointBuffer {
        ScanPointBuffer::default()
    }

    pub fn push(&mut self, sample: ScanSample) {
        self.samples.push(sample);
    }

    /// Returns every sample since the previous drain, oldest first, and
    /// leaves the buffer empty.
    pub fn drain(&mut self) -> Vec<ScanSample> {
        std::mem::take(&mut self.samples)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
