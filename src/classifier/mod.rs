pub mod impl_fake;
pub mod impl_network;
pub mod interface;

pub use impl_fake::{FixedClassifier, ShadeClassifier};
pub use impl_network::NetworkClassifier;
pub use interface::{DigitClassifier, Prediction, DIGIT_LABELS};
