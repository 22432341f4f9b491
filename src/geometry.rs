// 该文件是 Shanan VIN （山南西风 · 车架号识别） 项目的一部分。
// src/geometry.rs - 矩形与 IoU 计算
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

/// 矩形，格式为 [x_min, y_min, x_max, y_max]
pub type Rect = [f32; 4];

/// 矩形面积，退化矩形面积为 0
pub fn area(rect: &Rect) -> f32 {
  (rect[2] - rect[0]).max(0.0) * (rect[3] - rect[1]).max(0.0)
}

/// 两个矩形的交集面积
pub fn intersection_area(a: &Rect, b: &Rect) -> f32 {
  let x1 = a[0].max(b[0]);
  let y1 = a[1].max(b[1]);
  let x2 = a[2].min(b[2]);
  let y2 = a[3].min(b[3]);

  (x2 - x1).max(0.0) * (y2 - y1).max(0.0)
}

/// 计算两个矩形的 IoU，并集面积不为正时返回 0
pub fn iou(a: &Rect, b: &Rect) -> f32 {
  let intersection = intersection_area(a, b);
  let union = area(a) + area(b) - intersection;

  if union > 0.0 {
    intersection / union
  } else {
    0.0
  }
}

/// 矩形是否非退化（x_min < x_max 且 y_min < y_max）
pub fn is_proper(rect: &Rect) -> bool {
  rect[0] < rect[2] && rect[1] < rect[3]
}

/// 由中心点形式 (cx, cy, w, h) 转换为角点形式
pub fn center_to_corners(cx: f32, cy: f32, w: f32, h: f32) -> Rect {
  let half_w = w / 2.0;
  let half_h = h / 2.0;
  [cx - half_w, cy - half_h, cx + half_w, cy + half_h]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn iou_of_identical_rects_is_one() {
    let r = [0.1, 0.1, 0.5, 0.5];
    assert!((iou(&r, &r) - 1.0).abs() < 1e-6);
  }

  #[test]
  fn iou_of_disjoint_rects_is_zero() {
    let a = [0.0, 0.0, 0.2, 0.2];
    let b = [0.5, 0.5, 0.7, 0.7];
    assert_eq!(intersection_area(&a, &b), 0.0);
    assert_eq!(iou(&a, &b), 0.0);
  }

  #[test]
  fn iou_with_zero_union_is_zero() {
    let a = [0.3, 0.3, 0.3, 0.3];
    assert_eq!(iou(&a, &a), 0.0);
  }

  #[test]
  fn iou_of_shifted_rects() {
    let a = [0.1, 0.1, 0.5, 0.5];
    let b = [0.12, 0.12, 0.52, 0.52];
    // 交集 0.38^2，并集 2 * 0.16 - 0.1444
    let expected = 0.1444 / (0.32 - 0.1444);
    assert!((iou(&a, &b) - expected).abs() < 1e-4);
    assert!(iou(&a, &b) > 0.45);
  }

  #[test]
  fn center_form_converts_to_corners() {
    assert_eq!(center_to_corners(10.0, 20.0, 4.0, 8.0), [8.0, 16.0, 12.0, 24.0]);
    assert!(is_proper(&[0.0, 0.0, 1.0, 1.0]));
    assert!(!is_proper(&[0.5, 0.0, 0.5, 1.0]));
  }
}
