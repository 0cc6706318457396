pub mod decoder;
pub mod normalize;
pub mod region;
pub mod segment;

pub use decoder::decode;
pub use normalize::{normalize, NormalizedTensor, TensorShape};
pub use region::Region;
pub use segment::Segmenter;
