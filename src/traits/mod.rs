mod to_tensor;

pub use to_tensor::{tensor_to_rows, ToTensor};
