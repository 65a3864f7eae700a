use burn::{
    prelude::*,
    tensor::{Data, Shape},
};

use crate::env::StateEncoding;

/// A trait for converting items to tensors
///
/// Implemented for slices of encodings and action-value rows to build `[batch, features]` tensors
pub trait ToTensor<B: Backend, const D: usize> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, D>;
}

/// Flatten equal-length rows into a `[rows, width]` tensor
fn rows_to_tensor<'a, B: Backend>(
    rows: impl ExactSizeIterator<Item = &'a [f32]>,
    width: usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    let len = rows.len();
    let mut values = Vec::with_capacity(len * width);
    for row in rows {
        assert_eq!(row.len(), width, "all rows in a batch share one width");
        values.extend_from_slice(row);
    }
    Tensor::from_floats(Data::new(values, Shape::new([len, width])), device)
}

impl<B: Backend> ToTensor<B, 2> for &[StateEncoding] {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 2> {
        let width = self.first().map_or(0, StateEncoding::len);
        rows_to_tensor(self.iter().map(StateEncoding::as_slice), width, device)
    }
}

impl<B: Backend> ToTensor<B, 2> for &[Vec<f32>] {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 2> {
        let width = self.first().map_or(0, Vec::len);
        rows_to_tensor(self.iter().map(Vec::as_slice), width, device)
    }
}

/// Read a `[rows, width]` tensor back into one `Vec` per row
pub fn tensor_to_rows<B: Backend>(tensor: Tensor<B, 2>) -> Vec<Vec<f32>> {
    let [_, width] = tensor.dims();
    let values = tensor.into_data().convert::<f32>().value;
    values.chunks(width.max(1)).map(<[f32]>::to_vec).collect()
}
