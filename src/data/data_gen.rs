/// A `DataGen` produces the initial gradient buffer of a worker.
pub trait DataGen {
    /// Should generate exactly `size` gradient elements.
    ///
    /// # Arguments
    /// * `size` - The length of the buffer to generate.
    ///
    /// # Returns
    /// The generated buffer.
    fn generate(&mut self, size: usize) -> Vec<f32>;
}
