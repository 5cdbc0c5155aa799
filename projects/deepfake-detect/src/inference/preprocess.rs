use crate::config::TensorLayout;
use crate::error::{DetectError, Result};
use crate::pipeline::types::Frame;
use ndarray::Array4;
use opencv::core::{Size, CV_8UC3};
use opencv::imgproc;
use opencv::prelude::*;

/// A frame ready for the classifier: `1 x H x W x 3`, RGB, values in [0, 1].
#[derive(Debug, Clone)]
pub struct PreprocessedTensor {
    data: Array4<f32>,
}

impl PreprocessedTensor {
    /// (width, height)
    pub fn size(&self) -> (usize, usize) {
        let shape = self.data.shape();
        (shape[2], shape[1])
    }

    pub fn nhwc(&self) -> &Array4<f32> {
        &self.data
    }

    /// Owned, contiguous copy in the layout the model consumes.
    pub fn to_layout(&self, layout: TensorLayout) -> Array4<f32> {
        match layout {
            TensorLayout::Nhwc => self.data.clone(),
            TensorLayout::Nchw => self
                .data
                .view()
                .permuted_axes([0, 3, 1, 2])
                .as_standard_layout()
                .into_owned(),
        }
    }
}

/// Resize (bilinear) to `target_size` = (width, height), reorder BGR to RGB
/// and scale to [0, 1].
pub fn preprocess(frame: &Frame, target_size: (u32, u32)) -> Result<PreprocessedTensor> {
    let mat = &frame.mat;
    if mat.empty() || mat.typ() != CV_8UC3 {
        return Err(DetectError::MediaUnreadable(format!(
            "frame {} is not an 8-bit 3-channel image",
            frame.index
        )));
    }

    let (width, height) = (target_size.0 as usize, target_size.1 as usize);

    let mut resized = Mat::default();
    imgproc::resize(
        mat,
        &mut resized,
        Size::new(target_size.0 as i32, target_size.1 as i32),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;

    let mut rgb = Mat::default();
    imgproc::cvt_color_def(&resized, &mut rgb, imgproc::COLOR_BGR2RGB)?;

    if !rgb.is_continuous() {
        return Err(DetectError::MediaUnreadable("Mat is not continuous".to_string()));
    }

    let scaled: Vec<f32> = rgb
        .data_bytes()?
        .iter()
        .map(|&v| v as f32 / 255.0)
        .collect();
    let data = Array4::from_shape_vec((1, height, width, 3), scaled)
        .map_err(|e| DetectError::MediaUnreadable(format!("unexpected frame buffer: {}", e)))?;

    Ok(PreprocessedTensor { data })
}
