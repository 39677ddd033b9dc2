mod paypal;

pub use paypal::*;
