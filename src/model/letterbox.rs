// 该文件是 Shanan VIN （山南西风 · 车架号识别） 项目的一部分。
// src/model/letterbox.rs - 信箱填充逆变换
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use crate::geometry::Rect;

/// 图像等比缩放后居中填充到正方形模型输入的变换参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxTransform {
  pub scale_factor: f32,
  pub padded_width: i32,
  pub padded_height: i32,
  pub pad_left: f32,
  pub pad_top: f32,
}

impl LetterboxTransform {
  pub fn new(width: u32, height: u32, model_size: u32) -> Self {
    let size = model_size as f32;
    let scale_factor = (size / width as f32).min(size / height as f32);
    let padded_width = (width as f32 * scale_factor).round() as i32;
    let padded_height = (height as f32 * scale_factor).round() as i32;

    Self {
      scale_factor,
      padded_width,
      padded_height,
      pad_left: (model_size as i32 - padded_width) as f32 / 2.0,
      pad_top: (model_size as i32 - padded_height) as f32 / 2.0,
    }
  }

  /// 模型像素横坐标 → 原图归一化横坐标
  pub fn map_x(&self, x: f32) -> f32 {
    unpad(x, self.pad_left, self.padded_width)
  }

  /// 模型像素纵坐标 → 原图归一化纵坐标
  pub fn map_y(&self, y: f32) -> f32 {
    unpad(y, self.pad_top, self.padded_height)
  }

  pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
    (self.map_x(x), self.map_y(y))
  }

  /// 四个角点分别映射，可能得到退化矩形，由调用方丢弃
  pub fn map_rect(&self, rect: &Rect) -> Rect {
    [
      self.map_x(rect[0]),
      self.map_y(rect[1]),
      self.map_x(rect[2]),
      self.map_y(rect[3]),
    ]
  }
}

fn unpad(v: f32, pad: f32, extent: i32) -> f32 {
  if extent <= 0 {
    return 0.0;
  }
  let mapped = (v - pad) / extent as f32;
  if mapped.is_nan() {
    return 0.0;
  }
  mapped.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn landscape_image_pads_vertically() {
    let t = LetterboxTransform::new(1280, 960, 640);
    assert_eq!(t.scale_factor, 0.5);
    assert_eq!(t.padded_width, 640);
    assert_eq!(t.padded_height, 480);
    assert_eq!(t.pad_left, 0.0);
    assert_eq!(t.pad_top, 80.0);

    let (x, y) = t.map_point(320.0, 320.0);
    assert!((x - 0.5).abs() < 1e-6);
    assert!((y - 0.5).abs() < 1e-6);
  }

  #[test]
  fn portrait_image_pads_horizontally() {
    let t = LetterboxTransform::new(480, 640, 640);
    assert_eq!(t.scale_factor, 1.0);
    assert_eq!(t.padded_width, 480);
    assert_eq!(t.pad_left, 80.0);
    assert_eq!(t.pad_top, 0.0);
    assert!((t.map_x(80.0)).abs() < 1e-6);
    assert!((t.map_x(560.0) - 1.0).abs() < 1e-6);
  }

  #[test]
  fn points_in_padding_are_clamped() {
    let t = LetterboxTransform::new(1280, 960, 640);
    assert_eq!(t.map_y(10.0), 0.0);
    assert_eq!(t.map_y(630.0), 1.0);
    assert_eq!(t.map_x(-5.0), 0.0);
  }

  #[test]
  fn box_entirely_in_padding_collapses() {
    let t = LetterboxTransform::new(1280, 960, 640);
    let r = t.map_rect(&[100.0, 0.0, 200.0, 60.0]);
    assert_eq!(r[1], 0.0);
    assert_eq!(r[3], 0.0);
  }
}
