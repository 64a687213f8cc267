//! Bounded, snapshot-friendly storage primitives.

pub mod flex_array;
pub mod ring_buffer;

pub use flex_array::FlexArray;
pub use ring_buffer::RingBuffer;
