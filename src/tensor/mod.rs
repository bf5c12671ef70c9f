//! Logical tensor shapes and device-buffer views
//!
//! Operators consume tensors through their logical (batch, height, width,
//! channel) shape; channels are packed into blocks of 4 for vectorized
//! device memory access.

use crate::backend::BufferHandle;

/// Logical NHWC shape of a tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TensorShape {
    pub batch: u32,
    pub height: u32,
    pub width: u32,
    pub channels: u32,
}

impl TensorShape {
    pub fn new(batch: u32, height: u32, width: u32, channels: u32) -> Self {
        TensorShape {
            batch,
            height,
            width,
            channels,
        }
    }

    /// Channel count rounded up to blocks of 4
    pub fn channel_blocks(&self) -> u32 {
        (self.channels + 3) / 4
    }

    /// Spatial extent as [height, width]
    pub fn spatial(&self) -> [i32; 2] {
        [self.height as i32, self.width as i32]
    }
}

/// A tensor as seen by an operator: a logical shape over a device buffer
#[derive(Debug, Clone, Copy)]
pub struct Tensor {
    pub shape: TensorShape,
    pub buffer: BufferHandle,
}

impl Tensor {
    pub fn new(shape: TensorShape, buffer: BufferHandle) -> Self {
        Tensor { shape, buffer }
    }
}

/// Device memory layout an operator implementation is specialized for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryLayout {
    /// Linear device buffer
    Buffer,
    /// 2D image object
    Image,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_blocks_round_up() {
        assert_eq!(TensorShape::new(1, 1, 1, 1).channel_blocks(), 1);
        assert_eq!(TensorShape::new(1, 1, 1, 4).channel_blocks(), 1);
        assert_eq!(TensorShape::new(1, 1, 1, 5).channel_blocks(), 2);
        assert_eq!(TensorShape::new(1, 1, 1, 64).channel_blocks(), 16);
    }

    #[test]
    fn test_spatial_order_is_height_then_width() {
        let shape = TensorShape::new(2, 7, 5, 3);
        assert_eq!(shape.spatial(), [7, 5]);
    }
}
