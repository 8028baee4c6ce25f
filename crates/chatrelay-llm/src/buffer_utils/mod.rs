mod buffering;

pub use buffering::LineBuffer;
