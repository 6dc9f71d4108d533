//! Augmentation operations: the operation enum, its pixel kernels, and the
//! factory that builds operations from config entries.

mod factory;
pub mod kernels;
mod operation;

pub use factory::{
    canonical_name, OperationFactory, MAX_BLUR_KERNEL, MAX_DIMENSION, MAX_RESIZE_SCALE, OPERATION_NAMES,
};
pub use kernels::RotateMode;
pub use operation::{CropRegion, Operation, ResizeRange};
